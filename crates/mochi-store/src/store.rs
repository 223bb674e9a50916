//! Entity store
//!
//! Single in-memory source of truth for plans. Every state change bumps the
//! revision and emits one [`StoreChange`] while the write lock is still held,
//! so notifications arrive in revision order.

use crate::error::StoreError;
use crate::persistence::{LocalPersistence, StoreState};
use crate::snapshot::{Entity, Snapshot};
use mochi_model::{
    move_relative, CategoryId, ChecklistCategory, ChecklistItem, EntityRef, IntentPayload,
    ItemId, MutationIntent, Plan, PlanId, ScheduleDay,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the change channel; slow subscribers see `Lagged`
pub const CHANGE_CAPACITY: usize = 256;

/// Change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub revision: u64,
    pub entity: EntityRef,
}

#[derive(Debug, Default)]
struct Inner {
    state: StoreState,
    revision: u64,
}

/// In-memory store of plans, categories and items
pub struct EntityStore {
    inner: RwLock<Inner>,
    changes: broadcast::Sender<StoreChange>,
    persistence: Option<Arc<dyn LocalPersistence>>,
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("revision", &self.revision())
            .field("draft", &self.is_draft())
            .finish_non_exhaustive()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Empty store without persistence
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(StoreState::default())
    }

    #[must_use]
    pub fn with_state(state: StoreState) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: RwLock::new(Inner { state, revision: 0 }),
            changes,
            persistence: None,
        }
    }

    /// Draft-mode store: load from `persistence` and write through on change
    ///
    /// # Errors
    /// [`StoreError::Persist`] if the saved state cannot be loaded
    pub fn open(persistence: Arc<dyn LocalPersistence>) -> Result<Self, StoreError> {
        let state = persistence.load_all()?;
        debug!(plans = state.plans.len(), "loaded draft state");
        let mut store = Self::with_state(state);
        store.persistence = Some(persistence);
        Ok(store)
    }

    /// Whether changes are written through to local persistence
    #[inline]
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.persistence.is_some()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.read().revision
    }

    /// Copy of the whole state
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.inner.read().state.clone()
    }

    // ---- reads ----

    /// Cloned view of one entity
    ///
    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn get(&self, entity: &EntityRef) -> Result<Entity, StoreError> {
        let inner = self.inner.read();
        let state = &inner.state;
        let found = match entity {
            EntityRef::Plan(id) => find_plan(state, id).cloned().map(Entity::Plan),
            EntityRef::Category(id) => find_category(state, id).cloned().map(Entity::Category),
            EntityRef::Item(id) => find_item(state, id).cloned().map(Entity::Item),
        };
        found.ok_or_else(|| StoreError::NotFound(entity.clone()))
    }

    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn plan(&self, id: &PlanId) -> Result<Plan, StoreError> {
        find_plan(&self.inner.read().state, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone().into()))
    }

    /// All plans, newest first
    #[must_use]
    pub fn plans(&self) -> Vec<Plan> {
        self.inner.read().state.plans.clone()
    }

    /// Plan and category holding an item
    #[must_use]
    pub fn item_location(&self, id: &ItemId) -> Option<(PlanId, CategoryId)> {
        let inner = self.inner.read();
        let (p, c, _) = locate_item(&inner.state, id)?;
        let plan = &inner.state.plans[p];
        Some((plan.plan_id.clone(), plan.checklist[c].checklist_id.clone()))
    }

    /// Plan holding a category
    #[must_use]
    pub fn category_plan(&self, id: &CategoryId) -> Option<PlanId> {
        let inner = self.inner.read();
        let (p, _) = locate_category(&inner.state, id)?;
        Some(inner.state.plans[p].plan_id.clone())
    }

    // ---- snapshots ----

    /// Capture an entity and its position
    ///
    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn snapshot(&self, entity: &EntityRef) -> Result<Snapshot, StoreError> {
        capture(&self.inner.read().state, entity)
    }

    // ---- mutation ----

    /// Apply an intent and return the pre-mutation snapshot
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if the target or a referenced parent is gone
    /// - [`StoreError::Mismatch`] if the payload does not fit the target
    /// - [`StoreError::Invalid`] for model rule violations
    pub fn apply(&self, intent: &MutationIntent) -> Result<Snapshot, StoreError> {
        let target = &intent.target;
        if intent.payload.is_submit_only() {
            return Ok(Snapshot::Unchanged);
        }

        let snapshot = self.write(|state| match &intent.payload {
            IntentPayload::SetChecked { checked } => {
                let EntityRef::Item(id) = target else {
                    return Err(StoreError::mismatch(target, "only items can be checked"));
                };
                let item = item_mut(state, id)?;
                let prior = item.checked;
                item.checked = *checked;
                Ok((
                    Snapshot::Checked {
                        item: id.clone(),
                        checked: prior,
                    },
                    target.clone(),
                ))
            }
            IntentPayload::Move { dragged, target: other } => {
                let (p, c, _) = locate_item(state, dragged)
                    .ok_or_else(|| StoreError::NotFound(dragged.clone().into()))?;
                let category = &mut state.plans[p].checklist[c];
                let order = category.item_ids();
                move_relative(&mut category.items, dragged, other, |i| &i.checklist_item_id)?;
                let id = category.checklist_id.clone();
                Ok((
                    Snapshot::Order {
                        category: id.clone(),
                        order,
                    },
                    id.into(),
                ))
            }
            IntentPayload::SetField { field, value } => {
                if !field.applies_to(target) {
                    return Err(StoreError::mismatch(
                        target,
                        format!("field {field} does not apply"),
                    ));
                }
                let prior = match target {
                    EntityRef::Item(id) => {
                        let item = item_mut(state, id)?;
                        let prior = item.field(*field).unwrap_or_default();
                        item.set_field(*field, value.clone())?;
                        prior
                    }
                    EntityRef::Category(id) => {
                        let category = category_mut(state, id)?;
                        let prior = category.field(*field).unwrap_or_default();
                        category.set_field(*field, value.clone())?;
                        prior
                    }
                    EntityRef::Plan(id) => {
                        let plan = plan_mut(state, id)?;
                        let prior = plan.field(*field).unwrap_or_default();
                        plan.set_field(*field, value.clone())?;
                        plan.touch();
                        prior
                    }
                };
                Ok((
                    Snapshot::Field {
                        target: target.clone(),
                        field: *field,
                        value: prior,
                    },
                    target.clone(),
                ))
            }
            IntentPayload::InsertItem { category, item } => {
                if locate_item(state, &item.checklist_item_id).is_some() {
                    return Err(StoreError::mismatch(target, "item already exists"));
                }
                category_mut(state, category)?.items.push(item.clone());
                let added = EntityRef::Item(item.checklist_item_id.clone());
                Ok((Snapshot::Absent(added.clone()), added))
            }
            IntentPayload::InsertCategory { plan, category } => {
                if locate_category(state, &category.checklist_id).is_some() {
                    return Err(StoreError::mismatch(target, "category already exists"));
                }
                plan_mut(state, plan)?.checklist.push(category.clone());
                let added = EntityRef::Category(category.checklist_id.clone());
                Ok((Snapshot::Absent(added.clone()), added))
            }
            IntentPayload::Remove => Ok((remove_entity(state, target)?, target.clone())),
            IntentPayload::Submit | IntentPayload::Share => Ok((Snapshot::Unchanged, target.clone())),
        })?;

        debug!(token = %intent.token, %target, kind = %intent.kind, "applied intent");
        Ok(snapshot)
    }

    /// Put back exactly what a snapshot captured
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the container the snapshot lived in is gone
    pub fn restore(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let Some(entity) = snapshot.entity() else {
            return Ok(());
        };
        debug!(%entity, "restoring snapshot");
        self.write(|state| {
            match snapshot {
                Snapshot::Item {
                    category,
                    index,
                    item,
                    ..
                } => {
                    let items = &mut category_mut(state, &category)?.items;
                    let index = index.min(items.len());
                    items.insert(index, item);
                }
                Snapshot::Category {
                    plan,
                    index,
                    category,
                } => {
                    let checklist = &mut plan_mut(state, &plan)?.checklist;
                    let index = index.min(checklist.len());
                    checklist.insert(index, category);
                }
                Snapshot::Plan { index, plan } => {
                    let index = index.min(state.plans.len());
                    state.plans.insert(index, *plan);
                }
                Snapshot::Order { category, order } => {
                    reorder_by(&mut category_mut(state, &category)?.items, &order);
                }
                Snapshot::Checked { item, checked } => {
                    item_mut(state, &item)?.checked = checked;
                }
                Snapshot::Field {
                    target,
                    field,
                    value,
                } => match &target {
                    EntityRef::Item(id) => item_mut(state, id)?.set_field(field, value)?,
                    EntityRef::Category(id) => category_mut(state, id)?.set_field(field, value)?,
                    EntityRef::Plan(id) => plan_mut(state, id)?.set_field(field, value)?,
                },
                Snapshot::Absent(target) => {
                    if let Err(StoreError::NotFound(_)) = remove_entity(state, &target) {
                        debug!(%target, "entity already absent");
                    }
                }
                Snapshot::Unchanged => {}
            }
            Ok(((), entity))
        })
    }

    // ---- canonical corrections ----

    /// Rename an entity (provisional id to assigned id)
    ///
    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn reassign_id(&self, from: &EntityRef, to: &str) -> Result<EntityRef, StoreError> {
        self.write(|state| {
            let renamed = match from {
                EntityRef::Item(id) => {
                    let new_id = ItemId::new(to);
                    item_mut(state, id)?.checklist_item_id = new_id.clone();
                    EntityRef::Item(new_id)
                }
                EntityRef::Category(id) => {
                    let new_id = CategoryId::new(to);
                    category_mut(state, id)?.checklist_id = new_id.clone();
                    EntityRef::Category(new_id)
                }
                EntityRef::Plan(id) => {
                    let new_id = PlanId::new(to);
                    plan_mut(state, id)?.plan_id = new_id.clone();
                    EntityRef::Plan(new_id)
                }
            };
            debug!(%from, to = %renamed, "reassigned id");
            Ok((renamed.clone(), renamed))
        })
    }

    /// Replace the item order of a category with a permutation of its items
    ///
    /// # Errors
    /// - [`StoreError::NotFound`]
    /// - [`StoreError::OrderMismatch`] if `order` is not a permutation
    pub fn set_item_order(&self, category: &CategoryId, order: &[ItemId]) -> Result<(), StoreError> {
        self.write(|state| {
            let items = &mut category_mut(state, category)?.items;
            if !is_permutation(items, order) {
                return Err(StoreError::OrderMismatch(category.clone()));
            }
            reorder_by(items, order);
            Ok(((), category.clone().into()))
        })
    }

    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn set_checked(&self, item: &ItemId, checked: bool) -> Result<(), StoreError> {
        self.write(|state| {
            item_mut(state, item)?.checked = checked;
            Ok(((), item.clone().into()))
        })
    }

    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn replace_checklist(
        &self,
        plan: &PlanId,
        checklist: Vec<ChecklistCategory>,
    ) -> Result<(), StoreError> {
        self.write(|state| {
            let found = plan_mut(state, plan)?;
            found.checklist = checklist;
            found.touch();
            Ok(((), plan.clone().into()))
        })
    }

    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn replace_schedule(&self, plan: &PlanId, schedule: Vec<ScheduleDay>) -> Result<(), StoreError> {
        self.write(|state| {
            let found = plan_mut(state, plan)?;
            found.schedule = schedule;
            found.touch();
            Ok(((), plan.clone().into()))
        })
    }

    // ---- plan lifecycle ----

    /// Insert a plan at the front (newest first)
    ///
    /// # Errors
    /// [`StoreError::Mismatch`] if a plan with the same id exists
    pub fn insert_plan(&self, plan: Plan) -> Result<(), StoreError> {
        self.write(|state| {
            let entity = EntityRef::Plan(plan.plan_id.clone());
            if plan_index(state, &plan.plan_id).is_some() {
                return Err(StoreError::mismatch(&entity, "plan already exists"));
            }
            state.plans.insert(0, plan);
            Ok(((), entity))
        })
    }

    /// # Errors
    /// [`StoreError::NotFound`]
    pub fn remove_plan(&self, id: &PlanId) -> Result<Plan, StoreError> {
        self.write(|state| {
            let index = plan_index(state, id).ok_or_else(|| StoreError::NotFound(id.clone().into()))?;
            Ok((state.plans.remove(index), id.clone().into()))
        })
    }

    /// Run a mutation under the write lock, then persist and notify
    ///
    /// `f` must not leave partial changes behind when it fails.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<(R, EntityRef), StoreError>,
    ) -> Result<R, StoreError> {
        let mut inner = self.inner.write();
        let (out, entity) = f(&mut inner.state)?;
        inner.revision += 1;
        let revision = inner.revision;
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save_all(&inner.state) {
                warn!(error = %e, revision, "draft write-through failed");
            }
        }
        // Under the lock; no subscribers is fine
        let _ = self.changes.send(StoreChange { revision, entity });
        Ok(out)
    }
}

fn plan_index(state: &StoreState, id: &PlanId) -> Option<usize> {
    state.plans.iter().position(|p| &p.plan_id == id)
}

fn locate_category(state: &StoreState, id: &CategoryId) -> Option<(usize, usize)> {
    state
        .plans
        .iter()
        .enumerate()
        .find_map(|(p, plan)| plan.category_position(id).map(|c| (p, c)))
}

fn locate_item(state: &StoreState, id: &ItemId) -> Option<(usize, usize, usize)> {
    state.plans.iter().enumerate().find_map(|(p, plan)| {
        plan.checklist
            .iter()
            .enumerate()
            .find_map(|(c, category)| category.position(id).map(|i| (p, c, i)))
    })
}

fn find_plan<'a>(state: &'a StoreState, id: &PlanId) -> Option<&'a Plan> {
    state.plans.iter().find(|p| &p.plan_id == id)
}

fn find_category<'a>(state: &'a StoreState, id: &CategoryId) -> Option<&'a ChecklistCategory> {
    state.plans.iter().find_map(|p| p.category(id))
}

fn find_item<'a>(state: &'a StoreState, id: &ItemId) -> Option<&'a ChecklistItem> {
    state.plans.iter().find_map(|p| p.item(id))
}

fn plan_mut<'a>(state: &'a mut StoreState, id: &PlanId) -> Result<&'a mut Plan, StoreError> {
    state
        .plans
        .iter_mut()
        .find(|p| &p.plan_id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone().into()))
}

fn category_mut<'a>(
    state: &'a mut StoreState,
    id: &CategoryId,
) -> Result<&'a mut ChecklistCategory, StoreError> {
    state
        .plans
        .iter_mut()
        .find_map(|p| p.category_mut(id))
        .ok_or_else(|| StoreError::NotFound(id.clone().into()))
}

fn item_mut<'a>(state: &'a mut StoreState, id: &ItemId) -> Result<&'a mut ChecklistItem, StoreError> {
    state
        .plans
        .iter_mut()
        .flat_map(|p| p.checklist.iter_mut())
        .find_map(|c| c.item_mut(id))
        .ok_or_else(|| StoreError::NotFound(id.clone().into()))
}

/// Copy of an entity and the position it lives at
fn capture(state: &StoreState, target: &EntityRef) -> Result<Snapshot, StoreError> {
    let not_found = || StoreError::NotFound(target.clone());
    match target {
        EntityRef::Item(id) => {
            let (p, c, i) = locate_item(state, id).ok_or_else(not_found)?;
            let plan = &state.plans[p];
            let category = &plan.checklist[c];
            Ok(Snapshot::Item {
                plan: plan.plan_id.clone(),
                category: category.checklist_id.clone(),
                index: i,
                item: category.items[i].clone(),
            })
        }
        EntityRef::Category(id) => {
            let (p, c) = locate_category(state, id).ok_or_else(not_found)?;
            let plan = &state.plans[p];
            Ok(Snapshot::Category {
                plan: plan.plan_id.clone(),
                index: c,
                category: plan.checklist[c].clone(),
            })
        }
        EntityRef::Plan(id) => {
            let index = plan_index(state, id).ok_or_else(not_found)?;
            Ok(Snapshot::Plan {
                index,
                plan: Box::new(state.plans[index].clone()),
            })
        }
    }
}

/// Remove an entity, returning the snapshot that reinserts it
fn remove_entity(state: &mut StoreState, target: &EntityRef) -> Result<Snapshot, StoreError> {
    let snapshot = capture(state, target)?;
    match &snapshot {
        Snapshot::Item { category, index, .. } => {
            category_mut(state, category)?.items.remove(*index);
        }
        Snapshot::Category { plan, index, .. } => {
            plan_mut(state, plan)?.checklist.remove(*index);
        }
        Snapshot::Plan { index, .. } => {
            state.plans.remove(*index);
        }
        _ => {}
    }
    Ok(snapshot)
}

fn is_permutation(items: &[ChecklistItem], order: &[ItemId]) -> bool {
    let mut current: Vec<&ItemId> = items.iter().map(|i| &i.checklist_item_id).collect();
    let mut proposed: Vec<&ItemId> = order.iter().collect();
    current.sort();
    proposed.sort();
    current == proposed
}

/// Sort items by `order`; ids missing from `order` keep their relative
/// position at the end. Item contents are untouched.
fn reorder_by(items: &mut Vec<ChecklistItem>, order: &[ItemId]) {
    let mut rest = std::mem::take(items);
    for id in order {
        if let Some(pos) = rest.iter().position(|i| &i.checklist_item_id == id) {
            items.push(rest.remove(pos));
        }
    }
    items.extend(rest);
}
