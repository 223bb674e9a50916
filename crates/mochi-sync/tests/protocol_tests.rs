use mochi_authority::AuthorityError;
use mochi_model::{CategoryId, Field, ItemId, MutationKind, Plan};
use mochi_store::Entity;
use mochi_sync::prelude::*;
use mochi_sync::{NETWORK_ERROR, SAVE_FAILED};
use mochi_test_utils::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

fn engine_with(plan: Plan) -> (Arc<SyncEngine>, Arc<ScriptedAuthority>) {
    let authority = Arc::new(ScriptedAuthority::new());
    let engine = SyncEngine::new(store_with(plan), authority.clone(), SyncConfig::default());
    (engine, authority)
}

fn rejected() -> AuthorityError {
    AuthorityError::rejected("database locked")
}

#[tokio::test]
async fn test_toggle_twice_returns_to_original() {
    let (engine, authority) = engine_with(essentials_plan());
    let before = engine.store().state();
    let a = ItemId::new("a");

    assert!(engine.toggle(&a).unwrap().outcome().await.is_committed());
    assert!(is_checked(engine.store(), "a"));
    assert!(engine.toggle(&a).unwrap().outcome().await.is_committed());

    assert_eq!(engine.store().state(), before);
    assert_eq!(authority.call_count(), 2);
}

#[tokio::test]
async fn test_failed_toggle_restores_flag_and_releases_guard() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.fail_next(rejected());
    let a = ItemId::new("a");

    let outcome = engine.toggle(&a).unwrap().outcome().await;

    assert_eq!(
        outcome,
        MutationOutcome::RolledBack(SyncError::AuthorityRejected("database locked".into()))
    );
    assert!(!is_checked(engine.store(), "a"));
    assert_eq!(engine.phase(&a.clone().into(), MutationKind::Toggle), MutationPhase::Idle);
    assert!(!engine.is_busy(&a.into()));
    assert_eq!(engine.surface().current().unwrap().message, SAVE_FAILED);
}

#[tokio::test]
async fn test_reorder_places_dragged_after_later_target() {
    let (engine, authority) = engine_with(plan_with(&["A", "B", "C", "D"]));

    let ticket = engine.request_move(&ItemId::new("a"), &ItemId::new("b")).unwrap();
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["B", "A", "C", "D"]);
    assert!(ticket.outcome().await.is_committed());

    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["B", "A", "C", "D"]);
    assert_eq!(authority.call_count(), 1);
}

#[tokio::test]
async fn test_failed_reorder_restores_identical_sequence() {
    let (engine, authority) = engine_with(plan_with(&["A", "B", "C", "D"]));
    authority.fail_next(AuthorityError::Unreachable("connection reset".into()));

    let ticket = engine.request_move(&ItemId::new("d"), &ItemId::new("a")).unwrap();
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["D", "A", "B", "C"]);
    assert!(ticket.outcome().await.is_rolled_back());

    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B", "C", "D"]);
    assert_eq!(engine.surface().current().unwrap().message, NETWORK_ERROR);
}

#[tokio::test]
async fn test_second_toggle_while_pending_is_rejected() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.hold();
    let a = ItemId::new("a");

    let first = engine.toggle(&a).unwrap();
    authority.wait_for_calls(1).await;
    assert_eq!(engine.phase(&a.clone().into(), MutationKind::Toggle), MutationPhase::Pending);
    let revision = engine.store().revision();

    let err = engine.toggle(&a).unwrap_err();
    assert_eq!(
        err,
        SyncError::Busy {
            entity: a.clone().into(),
            kind: MutationKind::Toggle
        }
    );
    assert_eq!(engine.store().revision(), revision);
    assert!(is_checked(engine.store(), "a"));

    authority.release();
    assert!(first.outcome().await.is_committed());
    assert_eq!(authority.call_count(), 1);
    assert!(engine.toggle(&a).is_ok());
}

#[tokio::test]
async fn test_failed_category_delete_restores_original_index() {
    let (engine, authority) = engine_with(essentials_plan());
    let before = engine.store().state();
    authority.fail_next(rejected());

    let ticket = engine.delete_category(&CategoryId::new(ESSENTIALS)).unwrap();
    assert_eq!(category_titles(engine.store()), vec!["Clothing"]);
    assert!(ticket.outcome().await.is_rolled_back());

    assert_eq!(category_titles(engine.store()), vec!["Essentials", "Clothing"]);
    assert_eq!(engine.store().state(), before);
}

#[tokio::test]
async fn test_failed_item_delete_reinserts_in_place() {
    let (engine, authority) = engine_with(plan_with(&["A", "B", "C"]));
    authority.fail_next(rejected());

    let ticket = engine.delete_item(&ItemId::new("b")).unwrap();
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "C"]);
    assert!(ticket.outcome().await.is_rolled_back());
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_rolls_back_as_network_error() {
    let authority = Arc::new(ScriptedAuthority::new());
    authority.hold();
    let config = SyncConfig::default().with_request_timeout_ms(500);
    let engine = SyncEngine::new(store_with(essentials_plan()), authority.clone(), config);

    let outcome = engine.toggle(&ItemId::new("a")).unwrap().outcome().await;

    assert!(matches!(
        outcome,
        MutationOutcome::RolledBack(SyncError::NetworkUnreachable(_))
    ));
    assert!(!is_checked(engine.store(), "a"));
    assert_eq!(engine.surface().current().unwrap().message, NETWORK_ERROR);
    assert_eq!(engine.pending_count(), 0);
}

#[tokio::test]
async fn test_guest_items_bypass_authority() {
    let mut plan = essentials_plan();
    plan.checklist[0].items.push(item("guest_7"));
    let (engine, authority) = engine_with(plan);

    let toggle = engine.toggle(&ItemId::new("guest_7")).unwrap();
    assert_eq!(toggle.outcome().await, MutationOutcome::LocalOnly);
    let edit = engine
        .edit_field(ItemId::new("guest_7"), Field::Quantity, "4")
        .unwrap();
    assert_eq!(edit.outcome().await, MutationOutcome::LocalOnly);
    let drag = engine
        .request_move(&ItemId::new("guest_7"), &ItemId::new("a"))
        .unwrap();
    assert_eq!(drag.outcome().await, MutationOutcome::LocalOnly);

    assert!(is_checked(engine.store(), "guest_7"));
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["guest_7", "A", "B"]);
    assert_eq!(authority.call_count(), 0);
}

#[tokio::test]
async fn test_add_item_commits_assigned_id() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.push(Reply::Assigned("501".into()));
    let session = Session::authenticated(PlanId::new(PLAN_ID));

    let ticket = engine
        .add_item(&session, &CategoryId::new(ESSENTIALS), " Passport ", "1", true)
        .unwrap();
    let provisional = ticket.entity().clone();
    assert!(provisional.is_provisional());
    assert_eq!(item_names(engine.store(), ESSENTIALS), vec!["A", "B", "Passport"]);

    let outcome = ticket.outcome().await;
    assert_eq!(
        outcome,
        MutationOutcome::Committed {
            entity: ItemId::new("501").into()
        }
    );
    assert!(engine.store().get(&provisional).is_err());
    match engine.store().get(&ItemId::new("501").into()).unwrap() {
        Entity::Item(item) => {
            assert_eq!(item.name, "Passport");
            assert_eq!(item.quantity, "1");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_add_removes_provisional_item() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.fail_next(rejected());
    let session = Session::authenticated(PlanId::new(PLAN_ID));

    let ticket = engine
        .add_item(&session, &CategoryId::new(CLOTHING), "Hat", "", false)
        .unwrap();
    assert!(ticket.outcome().await.is_rolled_back());
    assert_eq!(item_names(engine.store(), CLOTHING), vec!["Socks"]);
}

#[tokio::test]
async fn test_add_category_defaults_blank_title() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.push(Reply::Assigned("77".into()));
    let session = Session::authenticated(PlanId::new(PLAN_ID));

    let outcome = engine.add_category(&session, "   ").unwrap().outcome().await;

    assert_eq!(
        outcome,
        MutationOutcome::Committed {
            entity: CategoryId::new("77").into()
        }
    );
    assert_eq!(
        category_titles(engine.store()),
        vec!["Essentials", "Clothing", "New category"]
    );
}

#[tokio::test]
async fn test_delete_while_edit_pending_is_rejected() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.hold();
    let a = ItemId::new("a");

    let edit = engine.edit_field(a.clone(), Field::Quantity, "2").unwrap();
    let err = engine.delete_item(&a).unwrap_err();
    assert_eq!(
        err,
        SyncError::Busy {
            entity: a.clone().into(),
            kind: MutationKind::EditField
        }
    );

    authority.release();
    assert!(edit.outcome().await.is_committed());
    match engine.store().get(&a.into()).unwrap() {
        Entity::Item(item) => assert_eq!(item.quantity, "2"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_category_delete_claims_its_items() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.hold();

    let delete = engine.delete_category(&CategoryId::new(CLOTHING)).unwrap();
    assert!(matches!(
        engine.toggle(&ItemId::new("socks")),
        Err(SyncError::NotFound(_))
    ));
    assert!(matches!(
        engine.add_item(
            &Session::authenticated(PlanId::new(PLAN_ID)),
            &CategoryId::new(CLOTHING),
            "Hat",
            "",
            true
        ),
        Err(SyncError::NotFound(_))
    ));
    assert!(engine.is_busy(&ItemId::new("socks").into()));

    authority.release();
    assert!(delete.outcome().await.is_committed());
    assert!(!engine.is_busy(&ItemId::new("socks").into()));
}

#[tokio::test]
async fn test_pending_reorder_blocks_delete_in_same_category() {
    let (engine, authority) = engine_with(plan_with(&["A", "B", "C"]));
    authority.hold();

    let drag = engine.request_move(&ItemId::new("c"), &ItemId::new("a")).unwrap();
    let err = engine.delete_item(&ItemId::new("b")).unwrap_err();
    assert_eq!(
        err,
        SyncError::Busy {
            entity: CategoryId::new(ESSENTIALS).into(),
            kind: MutationKind::Reorder
        }
    );
    // Toggles elsewhere in the category are independent
    let toggle = engine.toggle(&ItemId::new("b")).unwrap();

    authority.release();
    assert!(drag.outcome().await.is_committed());
    assert!(toggle.outcome().await.is_committed());
}

#[tokio::test]
async fn test_rollback_leaves_other_entities_alone() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.hold();
    authority.fail_next(rejected());

    let a = engine.toggle(&ItemId::new("a")).unwrap();
    let b = engine.toggle(&ItemId::new("b")).unwrap();
    authority.wait_for_calls(2).await;
    authority.release();

    assert!(a.outcome().await.is_rolled_back());
    assert!(b.outcome().await.is_committed());
    assert!(!is_checked(engine.store(), "a"));
    assert!(is_checked(engine.store(), "b"));
}

#[tokio::test]
async fn test_next_action_clears_notice() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.fail_next(rejected());

    let _ = engine.toggle(&ItemId::new("a")).unwrap().outcome().await;
    assert!(engine.surface().current().is_some());

    let ticket = engine.toggle(&ItemId::new("b")).unwrap();
    assert!(engine.surface().current().is_none());
    assert!(ticket.outcome().await.is_committed());
}

#[tokio::test]
async fn test_plan_field_edits() {
    let (engine, authority) = engine_with(essentials_plan());
    let plan = PlanId::new(PLAN_ID);

    assert_eq!(
        engine.edit_field(plan.clone(), Field::PlanTitle, " ").unwrap_err(),
        SyncError::ValidationFailed { field: "title" }
    );
    assert!(matches!(
        engine.edit_field(plan.clone(), Field::Visibility, "friends"),
        Err(SyncError::ValidationFailed { field: "visibility" })
    ));
    assert_eq!(authority.call_count(), 0);

    let ticket = engine.edit_field(plan.clone(), Field::Visibility, "Public").unwrap();
    assert!(ticket.outcome().await.is_committed());
    let stored = engine.store().plan(&plan).unwrap();
    assert_eq!(stored.options.visibility, mochi_model::Visibility::Public);
}

#[tokio::test]
async fn test_failed_field_edit_restores_prior_value() {
    let (engine, authority) = engine_with(essentials_plan());
    authority.fail_next(rejected());

    let outcome = engine
        .edit_field(CategoryId::new(ESSENTIALS), Field::CategoryTitle, "Papers")
        .unwrap()
        .outcome()
        .await;

    assert!(outcome.is_rolled_back());
    assert_eq!(category_titles(engine.store()), vec!["Essentials", "Clothing"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever fails, the final flag is the original flipped once per commit
    #[test]
    fn prop_toggle_sequence_matches_committed_flips(steps in proptest::collection::vec((0usize..2, any::<bool>()), 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let (engine, authority) = engine_with(essentials_plan());
            let ids = ["a", "b"];
            let mut expected = [false, false];

            for (idx, fail) in &steps {
                if *fail {
                    authority.fail_next(rejected());
                }
                let outcome = engine.toggle(&ItemId::new(ids[*idx])).unwrap().outcome().await;
                assert_eq!(outcome.is_committed(), !*fail);
                if !*fail {
                    expected[*idx] = !expected[*idx];
                }
            }

            assert_eq!(is_checked(engine.store(), "a"), expected[0]);
            assert_eq!(is_checked(engine.store(), "b"), expected[1]);
            assert_eq!(engine.pending_count(), 0);
        });
    }
}
