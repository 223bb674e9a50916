use mochi_authority::AuthorityError;
use mochi_model::{CategoryId, ItemId};
use mochi_sync::prelude::*;
use mochi_sync::NETWORK_ERROR;
use mochi_test_utils::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

fn synced(plan: mochi_model::Plan) -> (Arc<SyncEngine>, Arc<ScriptedAuthority>) {
    let authority = Arc::new(ScriptedAuthority::new());
    let engine = SyncEngine::new(store_with(plan), authority.clone(), SyncConfig::default());
    (engine, authority)
}

#[tokio::test]
async fn test_failed_toggle_flips_back_and_shows_notice() {
    let (engine, authority) = synced(essentials_plan());
    let mut changes = engine.store().subscribe();
    let mut events = engine.subscribe();
    authority.hold();
    authority.fail_next(AuthorityError::Unreachable("offline".into()));

    let ticket = engine.toggle(&ItemId::new("a")).unwrap();
    assert!(is_checked(engine.store(), "a"));
    assert!(engine.surface().current().is_none());

    authority.release();
    let outcome = ticket.outcome().await;

    assert_eq!(
        outcome.error(),
        Some(&SyncError::NetworkUnreachable("offline".into()))
    );
    assert!(!is_checked(engine.store(), "a"));
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B"]);

    let notice = engine.surface().current().unwrap();
    assert_eq!(notice.entity, ItemId::new("a").into());
    assert_eq!(notice.message, NETWORK_ERROR);
    assert_eq!(events.try_recv().unwrap(), SyncEvent::Notice(notice));

    // One change for the optimistic apply, one for the rollback
    assert_eq!(changes.try_recv().unwrap().entity, ItemId::new("a").into());
    assert_eq!(changes.try_recv().unwrap().entity, ItemId::new("a").into());
    assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_canonical_order_replaces_optimistic_order() {
    let (engine, authority) = synced(plan_with(&["A", "B", "C"]));
    authority.hold();
    authority.push(Reply::Order(vec![
        ItemId::new("a"),
        ItemId::new("c"),
        ItemId::new("b"),
    ]));

    let ticket = engine.request_move(&ItemId::new("c"), &ItemId::new("a")).unwrap();
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["C", "A", "B"]);

    authority.release();
    assert!(ticket.outcome().await.is_committed());
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "C", "B"]);

    match &authority.calls()[0] {
        mochi_authority::AuthorityCall::MoveItem(request) => {
            assert_eq!(request.dragged_id, ItemId::new("c"));
            assert_eq!(request.target_id, ItemId::new("a"));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_incomplete_canonical_order_is_ignored() {
    let (engine, authority) = synced(plan_with(&["A", "B", "C"]));
    authority.push(Reply::Order(vec![ItemId::new("a"), ItemId::new("b")]));

    let outcome = engine
        .request_move(&ItemId::new("c"), &ItemId::new("a"))
        .unwrap()
        .outcome()
        .await;

    assert!(outcome.is_committed());
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_canonical_checked_echo_wins() {
    let (engine, authority) = synced(essentials_plan());
    authority.push(Reply::Toggle(Some(false)));

    let outcome = engine.toggle(&ItemId::new("b")).unwrap().outcome().await;

    assert!(outcome.is_committed());
    assert!(!is_checked(engine.store(), "b"));
}

#[tokio::test]
async fn test_conflict_navigates_without_notice() {
    let (engine, authority) = synced(essentials_plan());
    let mut events = engine.subscribe();
    authority.fail_next(AuthorityError::Conflict {
        redirect: "/plans/88".into(),
    });
    let session = Session::authenticated(PlanId::new(PLAN_ID));

    let outcome = engine
        .add_item(&session, &CategoryId::new(ESSENTIALS), "Map", "", true)
        .unwrap()
        .outcome()
        .await;

    assert_eq!(
        outcome,
        MutationOutcome::RolledBack(SyncError::Conflict {
            redirect_target: "/plans/88".into()
        })
    );
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B"]);
    assert!(engine.surface().current().is_none());
    assert_eq!(
        events.try_recv().unwrap(),
        SyncEvent::Navigate {
            target: "/plans/88".into()
        }
    );
}

#[tokio::test]
async fn test_second_add_into_pending_category_is_busy() {
    let (engine, authority) = synced(essentials_plan());
    authority.hold();
    let session = Session::authenticated(PlanId::new(PLAN_ID));
    let essentials = CategoryId::new(ESSENTIALS);

    let first = engine.add_item(&session, &essentials, "Map", "", true).unwrap();
    let err = engine
        .add_item(&session, &essentials, "Torch", "", true)
        .unwrap_err();
    assert_eq!(
        err,
        SyncError::Busy {
            entity: essentials.clone().into(),
            kind: MutationKind::Add
        }
    );
    // Another category is free
    let other = engine
        .add_item(&session, &CategoryId::new(CLOTHING), "Scarf", "", true)
        .unwrap();

    authority.release();
    assert!(first.outcome().await.is_committed());
    assert!(other.outcome().await.is_committed());
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B", "Map"]);
    assert_eq!(item_names(engine.store(), CLOTHING), vec!["Socks", "Scarf"]);
}

#[tokio::test]
async fn test_guest_session_adds_stay_local() {
    let (engine, authority) = synced(essentials_plan());
    let session = Session::guest(PlanId::new(PLAN_ID));

    let ticket = engine
        .add_item(&session, &CategoryId::new(ESSENTIALS), "Map", "2", false)
        .unwrap();

    assert!(ticket.entity().is_guest());
    assert_eq!(ticket.outcome().await, MutationOutcome::LocalOnly);
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B", "Map"]);
    assert_eq!(authority.call_count(), 0);
}

#[tokio::test]
async fn test_delete_plan_rollback_restores_position() {
    let second = mochi_model::Plan::from_draft(
        PlanId::new("p2"),
        mochi_model::PlanDraft::new("Otaru", fixed_date(), 1),
    )
    .unwrap();
    let store = Arc::new(mochi_store::EntityStore::with_state(mochi_store::StoreState {
        plans: vec![essentials_plan(), second],
    }));
    let authority = Arc::new(ScriptedAuthority::new());
    let engine = SyncEngine::new(store, authority.clone(), SyncConfig::default());
    authority.fail_next(AuthorityError::rejected("locked"));

    let ticket = engine.delete_plan(&PlanId::new(PLAN_ID)).unwrap();
    assert_eq!(engine.store().plans().len(), 1);
    assert!(ticket.outcome().await.is_rolled_back());

    let ids: Vec<_> = engine.store().plans().into_iter().map(|p| p.plan_id).collect();
    assert_eq!(ids, vec![PlanId::new(PLAN_ID), PlanId::new("p2")]);
}
