use super::common::*;
use crate::lifecycle::domain::{ApplicationId, ApplicationStatus, PaymentStatus, Role};
use crate::lifecycle::engine::{CheckoutInput, EngineError, LifecycleEngine, PaymentSettings};
use crate::lifecycle::domain::ScholarshipId;
use crate::lifecycle::store::{ApplicationStore, UserDirectory};
use std::sync::Arc;

fn checkout_input(email: &str, scholarship: &str, price: &str) -> CheckoutInput {
    CheckoutInput {
        title: "STEM Excellence Grant".to_string(),
        price: price.to_string(),
        student_email: email.to_string(),
        scholarship_id: ScholarshipId(scholarship.to_string()),
    }
}

#[tokio::test]
async fn create_inserts_pending_unpaid_record() {
    let (engine, _, _, _) = build_engine();

    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("first application succeeds");

    assert_eq!(record.status, ApplicationStatus::Pending);
    assert_eq!(record.payment, PaymentStatus::Unpaid);
    assert!(record.transaction_id.is_none());
    assert!(record.moderator_feedback.is_none());
}

#[tokio::test]
async fn duplicate_application_is_rejected() {
    let (engine, _, _, _) = build_engine();
    let subject = identity("a@x.com");

    engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("first application succeeds");

    match engine.create(&subject, submission("a@x.com", "S1")).await {
        Err(EngineError::Conflict(_)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_duplicate_creates_yield_one_success() {
    let (engine, _, _, _) = build_engine();
    let subject = identity("a@x.com");

    let (first, second) = tokio::join!(
        engine.create(&subject, submission("a@x.com", "S1")),
        engine.create(&subject, submission("a@x.com", "S1")),
    );

    let successes = [&first, &second]
        .iter()
        .filter(|outcome| outcome.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one create may win");
    let conflict = [first, second]
        .into_iter()
        .find(|outcome| outcome.is_err())
        .expect("one create loses");
    assert!(matches!(conflict, Err(EngineError::Conflict(_))));
}

#[tokio::test]
async fn creating_for_another_student_is_forbidden() {
    let (engine, store, _, _) = build_engine();

    match engine
        .create(&identity("b@x.com"), submission("a@x.com", "S1"))
        .await
    {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    assert!(store
        .list_all()
        .await
        .expect("list succeeds")
        .is_empty());
}

#[tokio::test]
async fn checkout_requires_an_existing_application() {
    let (engine, _, _, _) = build_engine();

    match engine
        .initiate_checkout(&identity("a@x.com"), checkout_input("a@x.com", "S9", "50"))
        .await
    {
        Err(EngineError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn checkout_rejects_malformed_price() {
    let (engine, _, _, _) = build_engine();
    let subject = identity("a@x.com");
    engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");

    match engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "49.999"))
        .await
    {
        Err(EngineError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn confirm_payment_records_transaction() {
    let (engine, store, _, gateway) = build_engine();
    let subject = identity("a@x.com");
    let record = engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");

    let session = engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "49.50"))
        .await
        .expect("checkout session opens");
    gateway.settle(&session.id, "pi_123");

    let receipt = engine
        .confirm_payment(&session.id)
        .await
        .expect("settled session confirms");
    assert_eq!(receipt.application_id, record.id);
    assert_eq!(receipt.transaction_id, "pi_123");

    let stored = store
        .find(&record.id)
        .await
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.payment, PaymentStatus::Paid);
    assert_eq!(stored.transaction_id.as_deref(), Some("pi_123"));
}

#[tokio::test]
async fn second_confirmation_is_a_conflict() {
    let (engine, _, _, gateway) = build_engine();
    let subject = identity("a@x.com");
    engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");
    let session = engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "49.50"))
        .await
        .expect("checkout session opens");
    gateway.settle(&session.id, "pi_123");

    engine
        .confirm_payment(&session.id)
        .await
        .expect("first confirmation succeeds");

    match engine.confirm_payment(&session.id).await {
        Err(EngineError::Conflict(_)) => {}
        other => panic!("expected conflict on re-confirmation, got {other:?}"),
    }
}

#[tokio::test]
async fn confirmation_after_admin_delete_reports_not_found() {
    let (engine, _, _, gateway) = build_engine();
    let subject = identity("a@x.com");
    let record = engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");
    let session = engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "25"))
        .await
        .expect("checkout session opens");
    gateway.settle(&session.id, "pi_777");

    engine
        .delete(&identity("admin@x.com"), &record.id)
        .await
        .expect("admin delete wins the race");

    match engine.confirm_payment(&session.id).await {
        Err(EngineError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn open_session_cannot_be_confirmed() {
    let (engine, _, _, _gateway) = build_engine();
    let subject = identity("a@x.com");
    engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");
    let session = engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "25"))
        .await
        .expect("checkout session opens");

    match engine.confirm_payment(&session.id).await {
        Err(EngineError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_gateway_surfaces_verification_failure() {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    directory.seed_role("a@x.com", Role::Student);
    let engine = LifecycleEngine::new(
        store,
        directory,
        Arc::new(UnreachableGateway),
        PaymentSettings {
            currency: "usd".to_string(),
            success_url: "https://portal.test/ok".to_string(),
            cancel_url: "https://portal.test/cancel".to_string(),
        },
    );

    match engine.confirm_payment("cs_missing").await {
        Err(EngineError::PaymentVerificationFailed(_)) => {}
        other => panic!("expected verification failure, got {other:?}"),
    }
}

#[tokio::test]
async fn moderator_updates_status_but_student_cannot() {
    let (engine, _, _, _) = build_engine();
    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    let updated = engine
        .set_status(
            &identity("mod@x.com"),
            &record.id,
            ApplicationStatus::Completed,
        )
        .await
        .expect("moderator may resolve");
    assert_eq!(updated.status, ApplicationStatus::Completed);

    match engine
        .set_status(&identity("a@x.com"), &record.id, ApplicationStatus::Completed)
        .await
    {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden for student, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_is_a_distinct_terminal_outcome() {
    let (engine, store, _, _) = build_engine();
    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    engine
        .set_status(
            &identity("mod@x.com"),
            &record.id,
            ApplicationStatus::Rejected,
        )
        .await
        .expect("moderator may reject");

    let stored = store
        .find(&record.id)
        .await
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn feedback_is_moderator_only() {
    let (engine, _, _, _) = build_engine();
    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    let updated = engine
        .set_feedback(
            &identity("mod@x.com"),
            &record.id,
            "missing transcript".to_string(),
        )
        .await
        .expect("moderator may leave feedback");
    assert_eq!(
        updated.moderator_feedback.as_deref(),
        Some("missing transcript")
    );

    for subject in ["a@x.com", "admin@x.com"] {
        match engine
            .set_feedback(&identity(subject), &record.id, "nope".to_string())
            .await
        {
            Err(EngineError::Forbidden(_)) => {}
            other => panic!("expected forbidden for {subject}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn status_update_on_missing_application_is_not_found() {
    let (engine, _, _, _) = build_engine();

    match engine
        .set_status(
            &identity("mod@x.com"),
            &ApplicationId("app-999999".to_string()),
            ApplicationStatus::Completed,
        )
        .await
    {
        Err(EngineError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn owner_deletes_own_unpaid_application() {
    let (engine, store, _, _) = build_engine();
    let subject = identity("a@x.com");
    let record = engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");

    engine
        .delete(&subject, &record.id)
        .await
        .expect("owner may delete while unpaid");
    assert!(store
        .find(&record.id)
        .await
        .expect("fetch succeeds")
        .is_none());
}

#[tokio::test]
async fn other_students_cannot_delete() {
    let (engine, _, _, _) = build_engine();
    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    match engine.delete(&identity("b@x.com"), &record.id).await {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn owner_cannot_delete_once_paid() {
    let (engine, _, _, gateway) = build_engine();
    let subject = identity("a@x.com");
    let record = engine
        .create(&subject, submission("a@x.com", "S1"))
        .await
        .expect("application created");
    let session = engine
        .initiate_checkout(&subject, checkout_input("a@x.com", "S1", "25"))
        .await
        .expect("checkout session opens");
    gateway.settle(&session.id, "pi_55");
    engine
        .confirm_payment(&session.id)
        .await
        .expect("payment confirms");

    match engine.delete(&subject, &record.id).await {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden after payment, got {other:?}"),
    }

    engine
        .delete(&identity("admin@x.com"), &record.id)
        .await
        .expect("admin may delete paid records");
}

#[tokio::test]
async fn role_change_takes_effect_without_reauthentication() {
    let (engine, _, _, _) = build_engine();
    let record = engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    let bob = identity("b@x.com");
    match engine
        .set_status(&bob, &record.id, ApplicationStatus::Completed)
        .await
    {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden before promotion, got {other:?}"),
    }

    engine
        .set_role(&identity("admin@x.com"), "b@x.com", Role::Moderator)
        .await
        .expect("admin promotes bob");

    engine
        .set_status(&bob, &record.id, ApplicationStatus::Completed)
        .await
        .expect("promotion is effective on the next request");
}

#[tokio::test]
async fn role_mutation_requires_admin_regardless_of_claim() {
    let (engine, _, directory, _) = build_engine();

    let mut pretender = identity("b@x.com");
    pretender.claimed_role = Some(Role::Admin);

    match engine.set_role(&pretender, "b@x.com", Role::Admin).await {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    let unchanged = directory
        .find("b@x.com")
        .await
        .expect("lookup succeeds")
        .expect("user present");
    assert_eq!(unchanged.role, Role::Student);
}

#[tokio::test]
async fn login_upsert_is_idempotent_on_email() {
    let (engine, _, _, _) = build_engine();

    let first = engine
        .login(crate::lifecycle::domain::LoginProfile {
            email: "new@x.com".to_string(),
            photo: None,
        })
        .await
        .expect("first login registers");
    assert_eq!(first.role, Role::Student);

    let second = engine
        .login(crate::lifecycle::domain::LoginProfile {
            email: "new@x.com".to_string(),
            photo: Some("https://cdn.test/p.png".to_string()),
        })
        .await
        .expect("second login refreshes");

    assert_eq!(second.created_at, first.created_at);
    assert!(second.last_login_at >= first.last_login_at);
    assert_eq!(second.photo.as_deref(), Some("https://cdn.test/p.png"));
}

#[tokio::test]
async fn listings_respect_role_boundaries() {
    let (engine, _, _, _) = build_engine();
    engine
        .create(&identity("a@x.com"), submission("a@x.com", "S1"))
        .await
        .expect("application created");

    let own = engine
        .list_for_student(&identity("a@x.com"), "a@x.com")
        .await
        .expect("owner may list their applications");
    assert_eq!(own.len(), 1);

    match engine
        .list_for_student(&identity("b@x.com"), "a@x.com")
        .await
    {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let all = engine
        .list_all(&identity("mod@x.com"))
        .await
        .expect("moderator sees everything");
    assert_eq!(all.len(), 1);

    match engine.list_all(&identity("a@x.com")).await {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn user_administration_is_admin_only() {
    let (engine, _, _, _) = build_engine();

    match engine.list_users(&identity("mod@x.com")).await {
        Err(EngineError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let users = engine
        .list_users(&identity("admin@x.com"))
        .await
        .expect("admin lists users");
    assert_eq!(users.len(), 4);

    engine
        .delete_user(&identity("admin@x.com"), "b@x.com")
        .await
        .expect("admin removes a user");
    match engine
        .delete_user(&identity("admin@x.com"), "b@x.com")
        .await
    {
        Err(EngineError::NotFound(_)) => {}
        other => panic!("expected not found on repeat delete, got {other:?}"),
    }
}
