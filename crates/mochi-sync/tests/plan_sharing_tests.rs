use chrono::NaiveDate;
use mochi_authority::{AuthorityCall, AuthorityError};
use mochi_model::PlanDraft;
use mochi_sync::prelude::*;
use mochi_sync::{NETWORK_ERROR, SAVE_FAILED};
use mochi_test_utils::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn synced() -> (Arc<SyncEngine>, Arc<ScriptedAuthority>) {
    let authority = Arc::new(ScriptedAuthority::new());
    let engine = SyncEngine::new(store_with(essentials_plan()), authority.clone(), SyncConfig::default());
    (engine, authority)
}

fn session() -> Session {
    Session::authenticated(PlanId::new(PLAN_ID))
}

#[tokio::test]
async fn test_share_link_is_returned_without_touching_state() {
    let (engine, authority) = synced();
    authority.push(Reply::Shared("https://mochilist.example/s/Xk2".into()));
    let before = engine.store().state();

    let outcome = engine.share_plan(&session()).unwrap().outcome().await;

    assert_eq!(
        outcome,
        MutationOutcome::Shared {
            url: "https://mochilist.example/s/Xk2".into()
        }
    );
    assert!(outcome.is_committed());
    assert_eq!(engine.store().state(), before);
    match &authority.calls()[0] {
        AuthorityCall::SharePlan(request) => assert_eq!(request.plan_id, PlanId::new(PLAN_ID)),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_pending_share_rejects_second_share_only() {
    let (engine, authority) = synced();
    authority.hold();

    let share = engine.share_plan(&session()).unwrap();
    assert_eq!(
        engine.share_plan(&session()).unwrap_err(),
        SyncError::Busy {
            entity: PlanId::new(PLAN_ID).into(),
            kind: MutationKind::Share
        }
    );
    let rename = engine
        .edit_field(PlanId::new(PLAN_ID), Field::PlanTitle, "Winter Hakodate")
        .unwrap();

    authority.release();
    assert!(share.outcome().await.is_committed());
    assert!(rename.outcome().await.is_committed());
    assert_eq!(engine.pending_count(), 0);
}

#[tokio::test]
async fn test_failed_share_shows_notice() {
    let (engine, authority) = synced();
    authority.fail_next(AuthorityError::Unreachable("connection refused".into()));

    let outcome = engine.share_plan(&session()).unwrap().outcome().await;

    assert!(outcome.is_rolled_back());
    let notice = engine.surface().current().unwrap();
    assert_eq!(notice.message, NETWORK_ERROR);
    assert_eq!(notice.entity, EntityRef::Plan(PlanId::new(PLAN_ID)));
}

#[tokio::test]
async fn test_local_plans_cannot_be_shared() {
    let (engine, authority) = synced();
    let guest = engine
        .create_plan(PlanDraft::new("Kushiro", NaiveDate::from_ymd_opt(2027, 2, 1).unwrap(), 2))
        .unwrap();

    assert_eq!(
        engine.share_plan(&Session::guest(guest.clone())).unwrap_err(),
        SyncError::NotSynced(guest.clone().into())
    );
    assert_eq!(
        engine.share_plan(&Session::authenticated(guest.clone())).unwrap_err(),
        SyncError::NotSynced(guest.into())
    );
    assert!(matches!(
        engine.share_plan(&Session::guest(PlanId::new(PLAN_ID))),
        Err(SyncError::NotSynced(_))
    ));
    assert_eq!(authority.call_count(), 0);

    let local = SyncEngine::local(store_with(essentials_plan()), SyncConfig::default());
    assert!(matches!(
        local.share_plan(&session()),
        Err(SyncError::NotSynced(_))
    ));
}

#[tokio::test]
async fn test_template_save_redirects() {
    let (engine, authority) = synced();
    let mut events = engine.subscribe();
    authority.push(Reply::Redirect("/templates/12".into()));

    let outcome = engine
        .save_template(&session(), "  Hakodate in 3 days ", " squid and ropeway ", Visibility::Public)
        .unwrap()
        .outcome()
        .await;

    assert_eq!(
        outcome,
        MutationOutcome::Redirected {
            target: "/templates/12".into()
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        SyncEvent::Navigate {
            target: "/templates/12".into()
        }
    );
    match &authority.calls()[0] {
        AuthorityCall::SaveTemplate(request) => {
            assert_eq!(request.title, "Hakodate in 3 days");
            assert_eq!(request.description, "squid and ropeway");
            assert_eq!(request.visibility, Visibility::Public);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_template_needs_a_title() {
    let (engine, authority) = synced();

    let err = engine
        .save_template(&session(), "   ", "", Visibility::Private)
        .unwrap_err();

    assert_eq!(err, SyncError::ValidationFailed { field: "title" });
    assert_eq!(authority.call_count(), 0);
}

#[tokio::test]
async fn test_pending_template_save_blocks_plan_edits() {
    let (engine, authority) = synced();
    authority.hold();

    let save = engine
        .save_template(&session(), "Hakodate", "", Visibility::Private)
        .unwrap();
    assert!(matches!(
        engine.save_template(&session(), "Hakodate", "", Visibility::Private),
        Err(SyncError::Busy {
            kind: MutationKind::BulkSave,
            ..
        })
    ));
    assert!(matches!(
        engine.edit_field(PlanId::new(PLAN_ID), Field::Description, "x"),
        Err(SyncError::Busy { .. })
    ));

    authority.release();
    assert!(matches!(save.outcome().await, MutationOutcome::Redirected { .. }));
    assert!(!engine.is_busy(&PlanId::new(PLAN_ID).into()));
}

#[tokio::test]
async fn test_unauthorized_template_save_shows_notice() {
    let (engine, authority) = synced();
    authority.fail_next(AuthorityError::Unauthorized);
    let mut events = engine.subscribe();

    let outcome = engine
        .save_template(&session(), "Hakodate", "", Visibility::Private)
        .unwrap()
        .outcome()
        .await;

    assert_eq!(
        outcome,
        MutationOutcome::RolledBack(SyncError::AuthorityRejected("not authorized".into()))
    );
    assert!(matches!(events.try_recv().unwrap(), SyncEvent::Notice(_)));
    assert_eq!(engine.surface().current().unwrap().message, SAVE_FAILED);
}
