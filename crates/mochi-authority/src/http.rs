//! JSON-over-HTTP authority
//!
//! Every endpoint answers with the same envelope:
//!
//! ```json
//! { "status": "success" | "error", "message": "...", "redirect_url": "...",
//!   "id": 17, "order": ["3", "1"], "is_checked": true, "url": "...",
//!   "checklist": [...] }
//! ```
//!
//! The template endpoint names its redirect `redirect`; both spellings are
//! accepted.
//!
//! Turning a status code plus body into an [`Envelope`] or an
//! [`AuthorityError`] is done by [`interpret`], which never touches the network.

use crate::client::Authority;
use crate::config::AuthorityConfig;
use crate::error::AuthorityError;
use crate::types::{
    AddCategory, AddItem, Assigned, ChecklistSaved, Delete, EditField, MoveAck, MoveItem,
    Redirect, ReplaceChecklist, SaveSchedule, SaveTemplate, SetChecked, ShareLink, SharePlan,
    ToggleAck,
};
use async_trait::async_trait;
use mochi_model::{ChecklistCategory, EntityRef, ItemId};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Response envelope shared by all endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "redirect")]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub order: Option<Vec<ItemId>>,
    #[serde(default)]
    pub is_checked: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub checklist: Option<Vec<ChecklistCategory>>,
}

impl Envelope {
    /// Assigned id as a string; numeric ids are accepted
    #[must_use]
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn assigned(&self) -> Result<Assigned, AuthorityError> {
        self.id_string()
            .map(|id| Assigned { id })
            .ok_or_else(|| AuthorityError::Decode("missing id".to_string()))
    }

    fn redirect(&self) -> Result<Redirect, AuthorityError> {
        self.redirect_url
            .clone()
            .filter(|t| !t.is_empty())
            .map(|target| Redirect { target })
            .ok_or_else(|| AuthorityError::Decode("missing redirect_url".to_string()))
    }

    fn share_link(&self) -> Result<ShareLink, AuthorityError> {
        self.url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .map(|url| ShareLink { url })
            .ok_or_else(|| AuthorityError::Decode("missing url".to_string()))
    }
}

/// Interpret a raw response
///
/// - 401 is [`AuthorityError::Unauthorized`]
/// - 409 is [`AuthorityError::Conflict`] carrying the envelope's redirect;
///   a 409 without one is a rejection, since there is nowhere to go
/// - other non-2xx, or a 2xx whose status is not `"success"`, is
///   [`AuthorityError::Rejected`]
/// - an unparsable 2xx body is [`AuthorityError::Decode`]
///
/// # Errors
/// As listed above.
pub fn interpret(status: u16, body: &str) -> Result<Envelope, AuthorityError> {
    let parsed = serde_json::from_str::<Envelope>(body);
    match status {
        401 => Err(AuthorityError::Unauthorized),
        409 => {
            let envelope = parsed.unwrap_or_default();
            match envelope.redirect_url.filter(|r| !r.trim().is_empty()) {
                Some(redirect) => Err(AuthorityError::Conflict { redirect }),
                None => Err(AuthorityError::rejected(
                    envelope.message.unwrap_or_else(|| "conflict".to_string()),
                )),
            }
        }
        200..=299 => {
            let envelope = parsed.map_err(|e| AuthorityError::Decode(e.to_string()))?;
            if envelope.status == "success" {
                Ok(envelope)
            } else {
                Err(AuthorityError::rejected(
                    envelope.message.unwrap_or_else(|| "rejected".to_string()),
                ))
            }
        }
        _ => {
            let reason = parsed
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(AuthorityError::rejected(reason))
        }
    }
}

/// Authority reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    /// # Errors
    /// [`AuthorityError::Unreachable`] if the HTTP client cannot be built
    pub fn new(config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AuthorityError::Unreachable(format!("client setup failed: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Envelope, AuthorityError> {
        let url = self.url(path);
        debug!(%method, %url, "authority request");
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        interpret(status, &text)
    }
}

/// Resource path of an entity
fn entity_path(target: &EntityRef) -> String {
    match target {
        EntityRef::Item(id) => format!("/plans/checklists/items/{id}"),
        EntityRef::Category(id) => format!("/plans/checklists/{id}"),
        EntityRef::Plan(id) => format!("/plans/{id}"),
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn set_checked(&self, request: SetChecked) -> Result<ToggleAck, AuthorityError> {
        let path = entity_path(&request.item_id.into());
        let envelope = self
            .send(Method::PATCH, &path, Some(json!({ "is_checked": request.checked })))
            .await?;
        Ok(ToggleAck {
            checked: envelope.is_checked,
        })
    }

    async fn move_item(&self, request: MoveItem) -> Result<MoveAck, AuthorityError> {
        let path = format!("{}/move", entity_path(&request.dragged_id.into()));
        let envelope = self
            .send(Method::POST, &path, Some(json!({ "target_id": request.target_id })))
            .await?;
        Ok(MoveAck {
            order: envelope.order,
        })
    }

    async fn edit_field(&self, request: EditField) -> Result<(), AuthorityError> {
        let mut body = serde_json::Map::new();
        body.insert(request.field.as_str().to_string(), Value::String(request.value));
        self.send(Method::PATCH, &entity_path(&request.target), Some(Value::Object(body)))
            .await?;
        Ok(())
    }

    async fn add_item(&self, request: AddItem) -> Result<Assigned, AuthorityError> {
        let path = format!("/plans/checklists/{}/items", request.category_id);
        let body = json!({
            "item_name": request.name,
            "quantity": request.quantity,
            "is_required": request.required,
        });
        self.send(Method::POST, &path, Some(body)).await?.assigned()
    }

    async fn add_category(&self, request: AddCategory) -> Result<Assigned, AuthorityError> {
        let path = format!("/plans/{}/checklists", request.plan_id);
        self.send(Method::POST, &path, Some(json!({ "title": request.title })))
            .await?
            .assigned()
    }

    async fn delete(&self, request: Delete) -> Result<(), AuthorityError> {
        self.send(Method::DELETE, &entity_path(&request.target), None)
            .await?;
        Ok(())
    }

    async fn replace_checklist(&self, request: ReplaceChecklist) -> Result<ChecklistSaved, AuthorityError> {
        let path = format!("/plans/{}/checklists/save_guest", request.plan_id);
        let body = json!({ "categories": request.categories });
        let envelope = self.send(Method::POST, &path, Some(body)).await?;
        let Redirect { target } = envelope.redirect()?;
        Ok(ChecklistSaved {
            target,
            checklist: envelope.checklist,
        })
    }

    async fn save_schedule(&self, request: SaveSchedule) -> Result<Redirect, AuthorityError> {
        let path = format!("/plans/{}/schedule/update", request.plan_id);
        let body = serde_json::to_value(&request.days)
            .map_err(|e| AuthorityError::Decode(e.to_string()))?;
        self.send(Method::POST, &path, Some(body)).await?.redirect()
    }

    async fn share_plan(&self, request: SharePlan) -> Result<ShareLink, AuthorityError> {
        let body = json!({ "plan_id": request.plan_id });
        self.send(Method::POST, "/plans/share", Some(body))
            .await?
            .share_link()
    }

    async fn save_template(&self, request: SaveTemplate) -> Result<Redirect, AuthorityError> {
        let body = json!({
            "plan_id": request.plan_id,
            "title": request.title,
            "description": request.description,
            "visibility": request.visibility,
        });
        let envelope = self.send(Method::POST, "/plans/save", Some(body)).await?;
        // No redirect means stay on the plan
        Ok(envelope.redirect().unwrap_or_else(|_| Redirect {
            target: entity_path(&request.plan_id.into()),
        }))
    }
}
