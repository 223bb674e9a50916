//! Testing utilities for the mochilist workspace
//!
//! Shared fixtures and a scripted authority double.

#![allow(missing_docs)]

mod scripted;

pub use scripted::{Reply, ScriptedAuthority};

use chrono::NaiveDate;
use mochi_model::{
    CategoryId, ChecklistCategory, ChecklistItem, ItemId, Plan, PlanDraft, PlanId,
};
use mochi_store::{Entity, EntityStore, StoreState};
use std::sync::Arc;

pub const PLAN_ID: &str = "p1";
pub const ESSENTIALS: &str = "c1";
pub const CLOTHING: &str = "c2";

pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 14).unwrap()
}

/// Item whose id is its lowercased name
pub fn item(name: &str) -> ChecklistItem {
    ChecklistItem::with_id(ItemId::new(name.to_lowercase()), name)
}

/// Plan `p1` with Essentials (`c1`) holding `names` and Clothing (`c2`)
/// holding Socks (`socks`)
pub fn plan_with(names: &[&str]) -> Plan {
    let mut plan = Plan::from_draft(PlanId::new(PLAN_ID), PlanDraft::new("Hakodate", fixed_date(), 3)).unwrap();
    plan.checklist = vec![
        ChecklistCategory::with_id(CategoryId::new(ESSENTIALS), "Essentials")
            .with_items(names.iter().map(|n| item(n)).collect()),
        ChecklistCategory::with_id(CategoryId::new(CLOTHING), "Clothing")
            .with_items(vec![item("Socks")]),
    ];
    plan
}

/// Essentials [A, B]
pub fn essentials_plan() -> Plan {
    plan_with(&["A", "B"])
}

pub fn store_with(plan: Plan) -> Arc<EntityStore> {
    Arc::new(EntityStore::with_state(StoreState { plans: vec![plan] }))
}

/// Item names of a category, in order
pub fn item_names(store: &EntityStore, category: &str) -> Vec<String> {
    match store.get(&CategoryId::new(category).into()).unwrap() {
        Entity::Category(c) => c.items.iter().map(|i| i.name.clone()).collect(),
        other => panic!("expected category, got {other:?}"),
    }
}

pub fn is_checked(store: &EntityStore, item: &str) -> bool {
    match store.get(&ItemId::new(item).into()).unwrap() {
        Entity::Item(i) => i.checked,
        other => panic!("expected item, got {other:?}"),
    }
}

pub fn category_titles(store: &EntityStore) -> Vec<String> {
    store
        .plan(&PlanId::new(PLAN_ID))
        .unwrap()
        .checklist
        .iter()
        .map(|c| c.title.clone())
        .collect()
}
