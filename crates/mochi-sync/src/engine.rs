//! Optimistic mutation engine
//!
//! Entry points are synchronous: validate, claim the guard, apply to the
//! store, spawn the authority call and hand back a [`MutationTicket`]. The
//! spawned task commits (applying canonical corrections) or restores the
//! snapshot, then releases the guard and resolves the ticket.
//!
//! Entities with guest ids, and every mutation of an engine without an
//! authority (draft mode), are applied locally and resolve immediately as
//! [`MutationOutcome::LocalOnly`]. A checklist save is the exception: it
//! sends guest plans too, and the authority's answer promotes them.
//!
//! The authority call runs in its own task. A call that panics or is
//! aborted still resolves the mutation as rolled back.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::guard::{GuardKey, GuardTable};
use crate::state_machine::MutationPhase;
use crate::surface::{ErrorSurface, Notice, SyncEvent};
use crate::ticket::{MutationOutcome, MutationTicket};
use mochi_authority::{
    AddCategory, AddItem, Assigned, Authority, AuthorityCall, ChecklistSaved, Confirmation,
    Delete, EditField, MoveAck, MoveItem, Redirect, ReplaceChecklist, SaveSchedule, SaveTemplate,
    SetChecked, ShareLink, SharePlan, ToggleAck,
};
use mochi_model::{
    validate_schedule, CategoryId, ChecklistCategory, ChecklistItem, EntityRef, Field,
    IntentPayload, ItemId, MutationIntent, MutationKind, Plan, PlanDraft, PlanId, ScheduleDay,
    Visibility, GUEST_PREFIX,
};
use mochi_store::{Entity, EntityStore, Session, SessionMode, Snapshot, StoreError};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

/// Store update to run once the authority confirms
enum OnCommit {
    Nothing,
    ReplaceSchedule { plan: PlanId, days: Vec<ScheduleDay> },
}

/// Everything needed to run one mutation
struct Launch {
    intent: MutationIntent,
    keys: Vec<GuardKey>,
    /// `None` keeps the mutation local
    call: Option<AuthorityCall>,
    on_commit: OnCommit,
}

impl Launch {
    fn new(intent: MutationIntent, keys: Vec<GuardKey>, call: Option<AuthorityCall>) -> Self {
        Self {
            intent,
            keys,
            call,
            on_commit: OnCommit::Nothing,
        }
    }
}

/// The optimistic mutation engine
pub struct SyncEngine {
    store: Arc<EntityStore>,
    authority: Option<Arc<dyn Authority>>,
    guards: GuardTable,
    surface: ErrorSurface,
    config: SyncConfig,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("store", &self.store)
            .field("synced", &self.authority.is_some())
            .field("pending", &self.guards.pending_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Engine that confirms every mutation with `authority`
    #[must_use]
    pub fn new(store: Arc<EntityStore>, authority: Arc<dyn Authority>, config: SyncConfig) -> Arc<Self> {
        if store.is_draft() {
            debug!("synced engine over a write-through store");
        }
        Arc::new(Self::build(store, Some(authority), config))
    }

    /// Draft-mode engine: every mutation is local
    #[must_use]
    pub fn local(store: Arc<EntityStore>, config: SyncConfig) -> Arc<Self> {
        Arc::new(Self::build(store, None, config))
    }

    fn build(store: Arc<EntityStore>, authority: Option<Arc<dyn Authority>>, config: SyncConfig) -> Self {
        Self {
            store,
            authority,
            guards: GuardTable::default(),
            surface: ErrorSurface::new(config.notice_capacity),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn surface(&self) -> &ErrorSurface {
        &self.surface
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.surface.subscribe()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// No authority attached
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.authority.is_none()
    }

    /// Phase of the (entity, kind) state machine
    #[must_use]
    pub fn phase(&self, entity: &EntityRef, kind: MutationKind) -> MutationPhase {
        self.guards.phase(entity, kind)
    }

    /// Any mutation pending on the entity
    #[must_use]
    pub fn is_busy(&self, entity: &EntityRef) -> bool {
        self.guards.is_busy(entity)
    }

    /// Number of claimed (entity, kind) keys
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.guards.pending_count()
    }

    // ---- checklist items ----

    /// Flip the checked flag of an item
    ///
    /// # Errors
    /// `NotFound`, `Busy`, or `Internal` without a runtime
    pub fn toggle(self: &Arc<Self>, item: &ItemId) -> Result<MutationTicket, SyncError> {
        let checked = !self.item(item)?.checked;
        let intent = MutationIntent::new(item.clone(), IntentPayload::SetChecked { checked });
        let call = self.syncs(&[&intent.target]).then(|| {
            AuthorityCall::SetChecked(SetChecked {
                token: intent.token,
                item_id: item.clone(),
                checked,
            })
        });
        let keys = vec![GuardKey::new(item.clone(), MutationKind::Toggle)];
        self.submit(Launch::new(intent, keys, call))
    }

    /// Move `dragged` next to `target` in their shared category
    ///
    /// # Errors
    /// - `ValidationFailed { field: "target" }` for self moves and moves across
    ///   categories
    /// - `NotFound`, `Busy`
    pub fn request_move(self: &Arc<Self>, dragged: &ItemId, target: &ItemId) -> Result<MutationTicket, SyncError> {
        if dragged == target {
            return Err(SyncError::ValidationFailed { field: "target" });
        }
        let (_, category) = self
            .store
            .item_location(dragged)
            .ok_or_else(|| SyncError::NotFound(dragged.clone().into()))?;
        let (_, target_category) = self
            .store
            .item_location(target)
            .ok_or_else(|| SyncError::NotFound(target.clone().into()))?;
        if category != target_category {
            return Err(SyncError::ValidationFailed { field: "target" });
        }

        let intent = MutationIntent::new(
            dragged.clone(),
            IntentPayload::Move {
                dragged: dragged.clone(),
                target: target.clone(),
            },
        );
        let target_ref = EntityRef::Item(target.clone());
        let call = self.syncs(&[&intent.target, &target_ref]).then(|| {
            AuthorityCall::MoveItem(MoveItem {
                token: intent.token,
                dragged_id: dragged.clone(),
                target_id: target.clone(),
            })
        });
        let keys = vec![
            GuardKey::new(dragged.clone(), MutationKind::Reorder),
            GuardKey::new(category, MutationKind::Reorder),
        ];
        self.submit(Launch::new(intent, keys, call))
    }

    /// Edit a scalar field of an item, category or plan
    ///
    /// `raw` is normalized first (trimmed, defaulted, parsed).
    ///
    /// # Errors
    /// - `ValidationFailed` for inapplicable fields and rejected values
    /// - `NotFound`, `Busy`
    pub fn edit_field(
        self: &Arc<Self>,
        target: impl Into<EntityRef>,
        field: Field,
        raw: &str,
    ) -> Result<MutationTicket, SyncError> {
        let target = target.into();
        if !field.applies_to(&target) {
            return Err(SyncError::ValidationFailed {
                field: field.as_str(),
            });
        }
        self.store.get(&target)?;
        let value = field.normalize(raw)?;

        let intent = MutationIntent::new(
            target.clone(),
            IntentPayload::SetField {
                field,
                value: value.clone(),
            },
        );
        let call = self.syncs(&[&target]).then(|| {
            AuthorityCall::EditField(EditField {
                token: intent.token,
                target: target.clone(),
                field,
                value,
            })
        });
        let keys = vec![GuardKey::new(target, MutationKind::EditField)];
        self.submit(Launch::new(intent, keys, call))
    }

    /// Append an item to a category of the session's plan
    ///
    /// The item gets a provisional id until the authority assigns one; the
    /// ticket's entity is the provisional reference.
    ///
    /// # Errors
    /// - `ValidationFailed` for a blank name or a category of another plan
    /// - `NotFound`, `Busy`
    pub fn add_item(
        self: &Arc<Self>,
        session: &Session,
        category: &CategoryId,
        name: &str,
        quantity: &str,
        required: bool,
    ) -> Result<MutationTicket, SyncError> {
        let name = Field::ItemName.normalize(name)?;
        let quantity = Field::Quantity.normalize(quantity)?;
        let plan = self
            .store
            .category_plan(category)
            .ok_or_else(|| SyncError::NotFound(category.clone().into()))?;
        if plan != session.plan_id {
            return Err(SyncError::ValidationFailed { field: "category" });
        }

        let remote = self.authority.is_some() && !session.is_local_only() && !category.is_guest();
        let id = if remote {
            ItemId::provisional()
        } else if self.authority.is_some() {
            ItemId::guest()
        } else {
            ItemId::generate()
        };
        let mut item = ChecklistItem::with_id(id.clone(), name.clone()).with_quantity(quantity.clone());
        if !required {
            item = item.optional();
        }

        let intent = MutationIntent::new(
            id.clone(),
            IntentPayload::InsertItem {
                category: category.clone(),
                item,
            },
        );
        let call = remote.then(|| {
            AuthorityCall::AddItem(AddItem {
                token: intent.token,
                category_id: category.clone(),
                name,
                quantity,
                required,
            })
        });
        let keys = vec![
            GuardKey::new(category.clone(), MutationKind::Add),
            GuardKey::new(id, MutationKind::Add),
        ];
        self.submit(Launch::new(intent, keys, call))
    }

    /// Append a category to the session's plan; a blank title gets the
    /// default new-category title
    ///
    /// # Errors
    /// `NotFound`, `Busy`
    pub fn add_category(self: &Arc<Self>, session: &Session, title: &str) -> Result<MutationTicket, SyncError> {
        let plan_id = &session.plan_id;
        self.store.plan(plan_id)?;

        let remote = self.authority.is_some() && !session.is_local_only() && !plan_id.is_guest();
        let id = if remote {
            CategoryId::provisional()
        } else if self.authority.is_some() {
            CategoryId::guest()
        } else {
            CategoryId::generate()
        };
        let category = ChecklistCategory::with_id(id.clone(), title);
        let title = category.title.clone();

        let intent = MutationIntent::new(
            id.clone(),
            IntentPayload::InsertCategory {
                plan: plan_id.clone(),
                category,
            },
        );
        let call = remote.then(|| {
            AuthorityCall::AddCategory(AddCategory {
                token: intent.token,
                plan_id: plan_id.clone(),
                title,
            })
        });
        let keys = vec![
            GuardKey::new(plan_id.clone(), MutationKind::Add),
            GuardKey::new(id, MutationKind::Add),
        ];
        self.submit(Launch::new(intent, keys, call))
    }

    /// Remove an item; claims its category too
    ///
    /// # Errors
    /// `NotFound`, `Busy`
    pub fn delete_item(self: &Arc<Self>, item: &ItemId) -> Result<MutationTicket, SyncError> {
        let (_, category) = self
            .store
            .item_location(item)
            .ok_or_else(|| SyncError::NotFound(item.clone().into()))?;
        let keys = vec![
            GuardKey::new(item.clone(), MutationKind::Delete),
            GuardKey::new(category, MutationKind::Delete),
        ];
        self.delete(item.clone().into(), keys)
    }

    /// Remove a category with its items
    ///
    /// # Errors
    /// `NotFound`, `Busy`
    pub fn delete_category(self: &Arc<Self>, category: &CategoryId) -> Result<MutationTicket, SyncError> {
        let found = self.category(category)?;
        let keys = category_keys(&found, MutationKind::Delete);
        self.delete(category.clone().into(), keys)
    }

    /// Remove a whole plan
    ///
    /// # Errors
    /// `NotFound`, `Busy`
    pub fn delete_plan(self: &Arc<Self>, plan: &PlanId) -> Result<MutationTicket, SyncError> {
        let found = self.store.plan(plan)?;
        let keys = plan_keys(&found, MutationKind::Delete);
        self.delete(plan.clone().into(), keys)
    }

    fn delete(self: &Arc<Self>, target: EntityRef, keys: Vec<GuardKey>) -> Result<MutationTicket, SyncError> {
        let intent = MutationIntent::new(target.clone(), IntentPayload::Remove);
        let remote = self.syncs(&[&target]);
        let call = remote.then(|| {
            AuthorityCall::Delete(Delete {
                token: intent.token,
                target,
            })
        });
        self.submit(Launch::new(intent, keys, call))
    }

    // ---- plan level ----

    /// Create a plan from the creation form, newest first
    ///
    /// Plans created on a synced engine are guest plans until a checklist
    /// save promotes them.
    ///
    /// # Errors
    /// `ValidationFailed` for a blank destination or zero days
    pub fn create_plan(&self, draft: PlanDraft) -> Result<PlanId, SyncError> {
        self.surface.clear();
        let id = if self.authority.is_some() {
            PlanId::guest()
        } else {
            PlanId::generate()
        };
        let plan = Plan::from_draft(id.clone(), draft)?;
        info!(plan = %id, title = %plan.title, "plan created");
        self.store.insert_plan(plan)?;
        Ok(id)
    }

    /// Submit the whole checklist of the session's plan
    ///
    /// Nothing is applied optimistically; on success the ticket resolves as
    /// `Redirected` and a navigation event is published. Guest plans are
    /// sent as well: the plan takes the id named by the redirect, and an
    /// echoed checklist replaces the local one. Draft sessions stay local.
    ///
    /// # Errors
    /// `NotFound`, `Busy`
    pub fn save_checklist(self: &Arc<Self>, session: &Session) -> Result<MutationTicket, SyncError> {
        let plan = self.store.plan(&session.plan_id)?;
        let intent = MutationIntent::new(plan.plan_id.clone(), IntentPayload::Submit);
        let remote = self.authority.is_some() && session.mode != SessionMode::Draft;
        let call = remote.then(|| {
            AuthorityCall::ReplaceChecklist(ReplaceChecklist::from_checklist(
                intent.token,
                plan.plan_id.clone(),
                &plan.checklist,
            ))
        });
        let keys = plan_keys(&plan, MutationKind::BulkSave);
        self.submit(Launch::new(intent, keys, call))
    }

    /// Submit the schedule of the session's plan; stored once confirmed
    ///
    /// # Errors
    /// - `ValidationFailed { field: "activity" }` for blank activities
    /// - `NotFound`, `Busy`
    pub fn save_schedule(
        self: &Arc<Self>,
        session: &Session,
        days: Vec<ScheduleDay>,
    ) -> Result<MutationTicket, SyncError> {
        validate_schedule(&days)?;
        let plan_id = session.plan_id.clone();
        self.store.plan(&plan_id)?;

        let intent = MutationIntent::new(plan_id.clone(), IntentPayload::Submit);
        let remote = self.authority.is_some() && !session.is_local_only() && !plan_id.is_guest();
        let call = remote.then(|| {
            AuthorityCall::SaveSchedule(SaveSchedule::from_days(intent.token, plan_id.clone(), &days))
        });
        let keys = vec![GuardKey::new(plan_id.clone(), MutationKind::BulkSave)];
        let mut launch = Launch::new(intent, keys, call);
        launch.on_commit = OnCommit::ReplaceSchedule {
            plan: plan_id,
            days,
        };
        self.submit(launch)
    }

    /// Ask the authority for a share link to the session's plan
    ///
    /// # Errors
    /// - `NotSynced` for local sessions, guest plans and draft engines
    /// - `NotFound`, `Busy`
    pub fn share_plan(self: &Arc<Self>, session: &Session) -> Result<MutationTicket, SyncError> {
        let plan_id = self.synced_plan(session)?;
        let intent = MutationIntent::new(plan_id.clone(), IntentPayload::Share);
        let call = AuthorityCall::SharePlan(SharePlan {
            token: intent.token,
            plan_id: plan_id.clone(),
        });
        let keys = vec![GuardKey::new(plan_id, MutationKind::Share)];
        self.submit(Launch::new(intent, keys, Some(call)))
    }

    /// Publish the session's plan as a reusable template
    ///
    /// Nothing changes locally; on success the ticket resolves as
    /// `Redirected` and a navigation event is published.
    ///
    /// # Errors
    /// - `ValidationFailed { field: "title" }` for a blank title
    /// - `NotSynced` for local sessions, guest plans and draft engines
    /// - `NotFound`, `Busy`
    pub fn save_template(
        self: &Arc<Self>,
        session: &Session,
        title: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<MutationTicket, SyncError> {
        let title = Field::PlanTitle.normalize(title)?;
        let plan_id = self.synced_plan(session)?;
        let intent = MutationIntent::new(plan_id.clone(), IntentPayload::Submit);
        let call = AuthorityCall::SaveTemplate(SaveTemplate {
            token: intent.token,
            plan_id: plan_id.clone(),
            title,
            description: description.trim().to_string(),
            visibility,
        });
        let keys = vec![GuardKey::new(plan_id, MutationKind::BulkSave)];
        self.submit(Launch::new(intent, keys, Some(call)))
    }

    // ---- protocol ----

    /// Idle -> Pending, or Idle -> Idle for local mutations
    fn submit(self: &Arc<Self>, launch: Launch) -> Result<MutationTicket, SyncError> {
        let Launch {
            intent,
            keys,
            call,
            on_commit,
        } = launch;
        self.surface.clear();
        let token = intent.token;
        let entity = intent.target.clone();

        let (Some(call), Some(authority)) = (call, self.authority.clone()) else {
            self.guards.check(&keys)?;
            self.store.apply(&intent)?;
            if let OnCommit::ReplaceSchedule { plan, days } = on_commit {
                self.store.replace_schedule(&plan, days)?;
            }
            debug!(%token, target = %entity, kind = %intent.kind, "applied locally");
            return Ok(MutationTicket::resolved(token, entity, MutationOutcome::LocalOnly));
        };

        let runtime = Handle::try_current()
            .map_err(|_| SyncError::Internal("no async runtime for authority calls".to_string()))?;
        self.guards.claim(token, &keys)?;
        let snapshot = match self.store.apply(&intent) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.guards.finish(token, &keys, MutationPhase::RolledBack);
                return Err(e.into());
            }
        };
        let name = call.name();
        info!(%token, target = %entity, kind = %intent.kind, call = name, "mutation pending");

        let (tx, rx) = oneshot::channel();
        let engine = Arc::clone(self);
        let timeout = self.config.request_timeout();
        let dispatch = runtime.spawn(async move {
            tokio::time::timeout(timeout, call.dispatch(authority.as_ref())).await
        });
        runtime.spawn(async move {
            let result = match dispatch.await {
                Ok(Ok(result)) => result.map_err(SyncError::from),
                Ok(Err(_)) => Err(SyncError::NetworkUnreachable("request timed out".to_string())),
                Err(e) => {
                    error!(%token, call = name, error = %e, "authority call did not finish");
                    Err(SyncError::Internal(format!("authority call failed: {e}")))
                }
            };
            let outcome = engine.resolve(&intent, snapshot, &keys, on_commit, result);
            let _ = tx.send(outcome);
        });

        Ok(MutationTicket::pending(token, entity, rx))
    }

    /// Pending -> Committed | RolledBack -> Idle
    fn resolve(
        &self,
        intent: &MutationIntent,
        snapshot: Snapshot,
        keys: &[GuardKey],
        on_commit: OnCommit,
        result: Result<Confirmation, SyncError>,
    ) -> MutationOutcome {
        let token = intent.token;
        match result {
            Ok(confirmation) => {
                let outcome = self.commit(intent, &snapshot, confirmation, on_commit);
                self.guards.finish(token, keys, MutationPhase::Committed);
                info!(%token, target = %intent.target, kind = %intent.kind, "mutation committed");
                outcome
            }
            Err(error) => {
                if let Err(e) = self.store.restore(snapshot) {
                    error!(%token, target = %intent.target, error = %e, "rollback failed");
                }
                match &error {
                    SyncError::Conflict { redirect_target } if !redirect_target.trim().is_empty() => {
                        self.surface.navigate(redirect_target.clone());
                    }
                    _ => self.surface.publish(Notice::new(intent.target.clone(), error.clone())),
                }
                self.guards.finish(token, keys, MutationPhase::RolledBack);
                warn!(%token, target = %intent.target, kind = %intent.kind, %error, "mutation rolled back");
                MutationOutcome::RolledBack(error)
            }
        }
    }

    /// Apply canonical corrections from the confirmation
    fn commit(
        &self,
        intent: &MutationIntent,
        snapshot: &Snapshot,
        confirmation: Confirmation,
        on_commit: OnCommit,
    ) -> MutationOutcome {
        let mut outcome = MutationOutcome::Committed {
            entity: intent.target.clone(),
        };
        let corrected: Result<(), StoreError> = match confirmation {
            Confirmation::Toggled(ToggleAck {
                checked: Some(canonical),
            }) => match (&intent.target, &intent.payload) {
                (EntityRef::Item(id), IntentPayload::SetChecked { checked }) if *checked != canonical => {
                    debug!(item = %id, canonical, "authority corrected checked flag");
                    self.store.set_checked(id, canonical)
                }
                _ => Ok(()),
            },
            Confirmation::Moved(MoveAck { order: Some(order) }) => match snapshot {
                Snapshot::Order { category, .. } => {
                    debug!(%category, "applying canonical order");
                    self.store.set_item_order(category, &order)
                }
                _ => Ok(()),
            },
            Confirmation::Assigned(Assigned { id }) => self
                .store
                .reassign_id(&intent.target, &id)
                .map(|entity| outcome = MutationOutcome::Committed { entity }),
            Confirmation::ChecklistSaved(ChecklistSaved { target, checklist }) => {
                let adopted = self.adopt_saved(&intent.target, &target, checklist);
                self.surface.navigate(target.clone());
                outcome = MutationOutcome::Redirected { target };
                adopted
            }
            Confirmation::Shared(ShareLink { url }) => {
                outcome = MutationOutcome::Shared { url };
                Ok(())
            }
            Confirmation::Redirect(Redirect { target }) => {
                let applied = match on_commit {
                    OnCommit::ReplaceSchedule { plan, days } => self.store.replace_schedule(&plan, days),
                    OnCommit::Nothing => Ok(()),
                };
                self.surface.navigate(target.clone());
                outcome = MutationOutcome::Redirected { target };
                applied
            }
            Confirmation::Toggled(_) | Confirmation::Moved(_) | Confirmation::Edited | Confirmation::Deleted => {
                Ok(())
            }
        };
        if let Err(e) = corrected {
            warn!(token = %intent.token, error = %e, "canonical correction ignored");
        }
        outcome
    }

    /// Take over what a checklist save stored: the assigned plan id for a
    /// guest plan, then the echoed checklist
    fn adopt_saved(
        &self,
        plan: &EntityRef,
        target: &str,
        checklist: Option<Vec<ChecklistCategory>>,
    ) -> Result<(), StoreError> {
        let EntityRef::Plan(plan_id) = plan else {
            return Ok(());
        };
        let plan_id = match plan_id_from_target(target) {
            Some(assigned) if plan_id.is_guest() => {
                self.store.reassign_id(plan, assigned.as_str())?;
                info!(guest = %plan_id, plan = %assigned, "guest plan promoted");
                assigned
            }
            _ => plan_id.clone(),
        };
        if let Some(checklist) = checklist {
            debug!(plan = %plan_id, categories = checklist.len(), "adopting saved checklist");
            self.store.replace_checklist(&plan_id, checklist)?;
        }
        Ok(())
    }

    // ---- helpers ----

    /// Plan of a session that can reach the authority
    fn synced_plan(&self, session: &Session) -> Result<PlanId, SyncError> {
        let plan_id = session.plan_id.clone();
        self.store.plan(&plan_id)?;
        let plan_ref = EntityRef::Plan(plan_id.clone());
        if session.is_local_only() || !self.syncs(&[&plan_ref]) {
            return Err(SyncError::NotSynced(plan_ref));
        }
        Ok(plan_id)
    }

    /// Whether a mutation touching `entities` goes to the authority
    fn syncs(&self, entities: &[&EntityRef]) -> bool {
        self.authority.is_some() && !entities.iter().any(|e| e.is_guest())
    }

    fn item(&self, id: &ItemId) -> Result<ChecklistItem, SyncError> {
        match self.store.get(&id.clone().into())? {
            Entity::Item(item) => Ok(item),
            other => Err(SyncError::Internal(format!("expected item, got {other:?}"))),
        }
    }

    fn category(&self, id: &CategoryId) -> Result<ChecklistCategory, SyncError> {
        match self.store.get(&id.clone().into())? {
            Entity::Category(category) => Ok(category),
            other => Err(SyncError::Internal(format!("expected category, got {other:?}"))),
        }
    }
}

/// Plan id at the end of a redirect path such as `/plans/42`
fn plan_id_from_target(target: &str) -> Option<PlanId> {
    let path = target.split(|c: char| c == '?' || c == '#').next()?;
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    (!last.is_empty() && !last.starts_with(GUEST_PREFIX)).then(|| PlanId::new(last))
}

fn category_keys(category: &ChecklistCategory, kind: MutationKind) -> Vec<GuardKey> {
    std::iter::once(GuardKey::new(category.checklist_id.clone(), kind))
        .chain(
            category
                .items
                .iter()
                .map(|i| GuardKey::new(i.checklist_item_id.clone(), kind)),
        )
        .collect()
}

fn plan_keys(plan: &Plan, kind: MutationKind) -> Vec<GuardKey> {
    std::iter::once(GuardKey::new(plan.plan_id.clone(), kind))
        .chain(plan.checklist.iter().flat_map(|c| category_keys(c, kind)))
        .collect()
}
