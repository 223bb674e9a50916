//! The authority boundary
//!
//! [`Authority`] has one method per mutation kind. The engine goes through
//! [`AuthorityCall::dispatch`] so that every call site shares one path.

use crate::error::AuthorityError;
use crate::types::{
    AddCategory, AddItem, Assigned, ChecklistSaved, Delete, EditField, MoveAck, MoveItem,
    Redirect, ReplaceChecklist, SaveSchedule, SaveTemplate, SetChecked, ShareLink, SharePlan,
    ToggleAck,
};
use async_trait::async_trait;
use mochi_model::RequestToken;

/// Remote authoritative store
#[async_trait]
pub trait Authority: Send + Sync {
    async fn set_checked(&self, request: SetChecked) -> Result<ToggleAck, AuthorityError>;

    async fn move_item(&self, request: MoveItem) -> Result<MoveAck, AuthorityError>;

    async fn edit_field(&self, request: EditField) -> Result<(), AuthorityError>;

    async fn add_item(&self, request: AddItem) -> Result<Assigned, AuthorityError>;

    async fn add_category(&self, request: AddCategory) -> Result<Assigned, AuthorityError>;

    async fn delete(&self, request: Delete) -> Result<(), AuthorityError>;

    async fn replace_checklist(&self, request: ReplaceChecklist) -> Result<ChecklistSaved, AuthorityError>;

    async fn save_schedule(&self, request: SaveSchedule) -> Result<Redirect, AuthorityError>;

    async fn share_plan(&self, request: SharePlan) -> Result<ShareLink, AuthorityError>;

    async fn save_template(&self, request: SaveTemplate) -> Result<Redirect, AuthorityError>;
}

/// One outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityCall {
    SetChecked(SetChecked),
    MoveItem(MoveItem),
    EditField(EditField),
    AddItem(AddItem),
    AddCategory(AddCategory),
    Delete(Delete),
    ReplaceChecklist(ReplaceChecklist),
    SaveSchedule(SaveSchedule),
    SharePlan(SharePlan),
    SaveTemplate(SaveTemplate),
}

/// Successful answer to an [`AuthorityCall`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Toggled(ToggleAck),
    Moved(MoveAck),
    Edited,
    Assigned(Assigned),
    Deleted,
    ChecklistSaved(ChecklistSaved),
    Redirect(Redirect),
    Shared(ShareLink),
}

impl AuthorityCall {
    #[must_use]
    pub fn token(&self) -> RequestToken {
        match self {
            Self::SetChecked(r) => r.token,
            Self::MoveItem(r) => r.token,
            Self::EditField(r) => r.token,
            Self::AddItem(r) => r.token,
            Self::AddCategory(r) => r.token,
            Self::Delete(r) => r.token,
            Self::ReplaceChecklist(r) => r.token,
            Self::SaveSchedule(r) => r.token,
            Self::SharePlan(r) => r.token,
            Self::SaveTemplate(r) => r.token,
        }
    }

    /// Method name, for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetChecked(_) => "set_checked",
            Self::MoveItem(_) => "move_item",
            Self::EditField(_) => "edit_field",
            Self::AddItem(_) => "add_item",
            Self::AddCategory(_) => "add_category",
            Self::Delete(_) => "delete",
            Self::ReplaceChecklist(_) => "replace_checklist",
            Self::SaveSchedule(_) => "save_schedule",
            Self::SharePlan(_) => "share_plan",
            Self::SaveTemplate(_) => "save_template",
        }
    }

    /// Send this call to `authority`
    ///
    /// # Errors
    /// Whatever the authority reports.
    pub async fn dispatch(self, authority: &dyn Authority) -> Result<Confirmation, AuthorityError> {
        match self {
            Self::SetChecked(r) => authority.set_checked(r).await.map(Confirmation::Toggled),
            Self::MoveItem(r) => authority.move_item(r).await.map(Confirmation::Moved),
            Self::EditField(r) => authority.edit_field(r).await.map(|()| Confirmation::Edited),
            Self::AddItem(r) => authority.add_item(r).await.map(Confirmation::Assigned),
            Self::AddCategory(r) => authority.add_category(r).await.map(Confirmation::Assigned),
            Self::Delete(r) => authority.delete(r).await.map(|()| Confirmation::Deleted),
            Self::ReplaceChecklist(r) => {
                authority.replace_checklist(r).await.map(Confirmation::ChecklistSaved)
            }
            Self::SaveSchedule(r) => authority.save_schedule(r).await.map(Confirmation::Redirect),
            Self::SharePlan(r) => authority.share_plan(r).await.map(Confirmation::Shared),
            Self::SaveTemplate(r) => authority.save_template(r).await.map(Confirmation::Redirect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mochi_model::{EntityRef, ItemId, PlanId};

    /// Accepts everything and echoes fixed acknowledgements
    struct Accepting;

    #[async_trait]
    impl Authority for Accepting {
        async fn set_checked(&self, request: SetChecked) -> Result<ToggleAck, AuthorityError> {
            Ok(ToggleAck {
                checked: Some(request.checked),
            })
        }
        async fn move_item(&self, _: MoveItem) -> Result<MoveAck, AuthorityError> {
            Ok(MoveAck::default())
        }
        async fn edit_field(&self, _: EditField) -> Result<(), AuthorityError> {
            Ok(())
        }
        async fn add_item(&self, _: AddItem) -> Result<Assigned, AuthorityError> {
            Ok(Assigned { id: "7".into() })
        }
        async fn add_category(&self, _: AddCategory) -> Result<Assigned, AuthorityError> {
            Ok(Assigned { id: "8".into() })
        }
        async fn delete(&self, _: Delete) -> Result<(), AuthorityError> {
            Err(AuthorityError::rejected("locked"))
        }
        async fn replace_checklist(&self, _: ReplaceChecklist) -> Result<ChecklistSaved, AuthorityError> {
            Ok(ChecklistSaved::redirect("/plans/1"))
        }
        async fn save_schedule(&self, _: SaveSchedule) -> Result<Redirect, AuthorityError> {
            Ok(Redirect { target: "/plans/1".into() })
        }
        async fn share_plan(&self, request: SharePlan) -> Result<ShareLink, AuthorityError> {
            Ok(ShareLink {
                url: format!("https://mochi.example/s/{}", request.plan_id),
            })
        }
        async fn save_template(&self, _: SaveTemplate) -> Result<Redirect, AuthorityError> {
            Err(AuthorityError::Unauthorized)
        }
    }

    #[tokio::test]
    async fn dispatch_routes_to_method() {
        let call = AuthorityCall::SetChecked(SetChecked {
            token: RequestToken::new(),
            item_id: ItemId::new("a"),
            checked: true,
        });
        assert_eq!(call.name(), "set_checked");
        let confirmation = call.dispatch(&Accepting).await.unwrap();
        assert_eq!(
            confirmation,
            Confirmation::Toggled(ToggleAck { checked: Some(true) })
        );

        let add = AuthorityCall::AddCategory(AddCategory {
            token: RequestToken::new(),
            plan_id: PlanId::new("p"),
            title: "Gear".into(),
        });
        assert_eq!(
            add.dispatch(&Accepting).await.unwrap(),
            Confirmation::Assigned(Assigned { id: "8".into() })
        );
    }

    #[tokio::test]
    async fn dispatch_routes_plan_level_calls() {
        let share = AuthorityCall::SharePlan(SharePlan {
            token: RequestToken::new(),
            plan_id: PlanId::new("9"),
        });
        assert_eq!(share.name(), "share_plan");
        assert_eq!(
            share.dispatch(&Accepting).await.unwrap(),
            Confirmation::Shared(ShareLink {
                url: "https://mochi.example/s/9".into()
            })
        );

        let template = AuthorityCall::SaveTemplate(SaveTemplate {
            token: RequestToken::new(),
            plan_id: PlanId::new("9"),
            title: "Weekend in Nara".into(),
            description: String::new(),
            visibility: mochi_model::Visibility::Public,
        });
        assert_eq!(template.dispatch(&Accepting).await, Err(AuthorityError::Unauthorized));
    }

    #[tokio::test]
    async fn dispatch_propagates_errors() {
        let token = RequestToken::new();
        let call = AuthorityCall::Delete(Delete {
            token,
            target: EntityRef::Item(ItemId::new("a")),
        });
        assert_eq!(call.token(), token);
        assert_eq!(
            call.dispatch(&Accepting).await,
            Err(AuthorityError::rejected("locked"))
        );
    }
}
