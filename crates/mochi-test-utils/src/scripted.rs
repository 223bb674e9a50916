//! Scripted authority double
//!
//! Replies are consumed in call order; with no reply queued every call
//! succeeds with a plain echo. `hold` parks every call until `release`.

use async_trait::async_trait;
use mochi_authority::{
    AddCategory, AddItem, Assigned, Authority, AuthorityCall, AuthorityError, ChecklistSaved,
    Delete, EditField, MoveAck, MoveItem, Redirect, ReplaceChecklist, SaveSchedule, SaveTemplate,
    SetChecked, ShareLink, SharePlan, ToggleAck,
};
use mochi_model::{ChecklistCategory, ItemId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Toggle(Option<bool>),
    Order(Vec<ItemId>),
    Done,
    Assigned(String),
    Redirect(String),
    /// Checklist save answer echoing the stored checklist
    Saved {
        target: String,
        checklist: Vec<ChecklistCategory>,
    },
    Shared(String),
    Fail(AuthorityError),
}

#[derive(Debug, Default)]
pub struct ScriptedAuthority {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<AuthorityCall>>,
    held: Mutex<bool>,
    opened: Notify,
    next_id: AtomicU64,
}

impl ScriptedAuthority {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    /// Queue a reply for the next call
    pub fn push(&self, reply: Reply) -> &Self {
        self.replies.lock().push_back(reply);
        self
    }

    pub fn fail_next(&self, error: AuthorityError) -> &Self {
        self.push(Reply::Fail(error))
    }

    /// Park every call until [`release`](Self::release)
    pub fn hold(&self) {
        *self.held.lock() = true;
    }

    pub fn release(&self) {
        *self.held.lock() = false;
        self.opened.notify_waiters();
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<AuthorityCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Yield until at least `n` calls have arrived
    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    async fn receive(&self, call: AuthorityCall) -> Option<Reply> {
        self.calls.lock().push(call);
        let reply = self.replies.lock().pop_front();
        loop {
            let opened = self.opened.notified();
            if !*self.held.lock() {
                break;
            }
            opened.await;
        }
        reply
    }

    fn fresh_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

fn mismatch(reply: &Reply) -> AuthorityError {
    AuthorityError::Decode(format!("scripted reply {reply:?} does not fit the call"))
}

#[async_trait]
impl Authority for ScriptedAuthority {
    async fn set_checked(&self, request: SetChecked) -> Result<ToggleAck, AuthorityError> {
        let echo = request.checked;
        match self.receive(AuthorityCall::SetChecked(request)).await {
            None => Ok(ToggleAck { checked: Some(echo) }),
            Some(Reply::Toggle(checked)) => Ok(ToggleAck { checked }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn move_item(&self, request: MoveItem) -> Result<MoveAck, AuthorityError> {
        match self.receive(AuthorityCall::MoveItem(request)).await {
            None | Some(Reply::Done) => Ok(MoveAck::default()),
            Some(Reply::Order(order)) => Ok(MoveAck { order: Some(order) }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn edit_field(&self, request: EditField) -> Result<(), AuthorityError> {
        match self.receive(AuthorityCall::EditField(request)).await {
            None | Some(Reply::Done) => Ok(()),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn add_item(&self, request: AddItem) -> Result<Assigned, AuthorityError> {
        match self.receive(AuthorityCall::AddItem(request)).await {
            None => Ok(Assigned { id: self.fresh_id() }),
            Some(Reply::Assigned(id)) => Ok(Assigned { id }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn add_category(&self, request: AddCategory) -> Result<Assigned, AuthorityError> {
        match self.receive(AuthorityCall::AddCategory(request)).await {
            None => Ok(Assigned { id: self.fresh_id() }),
            Some(Reply::Assigned(id)) => Ok(Assigned { id }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn delete(&self, request: Delete) -> Result<(), AuthorityError> {
        match self.receive(AuthorityCall::Delete(request)).await {
            None | Some(Reply::Done) => Ok(()),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn replace_checklist(&self, request: ReplaceChecklist) -> Result<ChecklistSaved, AuthorityError> {
        let fallback = format!("/plans/{}", request.plan_id);
        match self.receive(AuthorityCall::ReplaceChecklist(request)).await {
            None => Ok(ChecklistSaved::redirect(fallback)),
            Some(Reply::Redirect(target)) => Ok(ChecklistSaved::redirect(target)),
            Some(Reply::Saved { target, checklist }) => Ok(ChecklistSaved {
                target,
                checklist: Some(checklist),
            }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn save_schedule(&self, request: SaveSchedule) -> Result<Redirect, AuthorityError> {
        let fallback = format!("/plans/{}", request.plan_id);
        match self.receive(AuthorityCall::SaveSchedule(request)).await {
            None => Ok(Redirect { target: fallback }),
            Some(Reply::Redirect(target)) => Ok(Redirect { target }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn share_plan(&self, request: SharePlan) -> Result<ShareLink, AuthorityError> {
        let fallback = format!("https://mochilist.example/share/{}", request.plan_id);
        match self.receive(AuthorityCall::SharePlan(request)).await {
            None => Ok(ShareLink { url: fallback }),
            Some(Reply::Shared(url)) => Ok(ShareLink { url }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }

    async fn save_template(&self, request: SaveTemplate) -> Result<Redirect, AuthorityError> {
        let fallback = format!("/plans/{}", request.plan_id);
        match self.receive(AuthorityCall::SaveTemplate(request)).await {
            None => Ok(Redirect { target: fallback }),
            Some(Reply::Redirect(target)) => Ok(Redirect { target }),
            Some(Reply::Fail(e)) => Err(e),
            Some(other) => Err(mismatch(&other)),
        }
    }
}
