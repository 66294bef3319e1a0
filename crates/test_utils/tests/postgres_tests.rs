//! PostgreSQL adapter tests
//!
//! These start a container and need Docker:
//! `cargo test -p test_utils --test postgres_tests -- --ignored`

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, ClaimId, Currency, HealthCheckable, Money, PortError};
use domain_claims::{
    ClaimQuery, ClaimStatus, ClaimStore, LecturerDirectory, UpdateLecturer, WorkflowConfig,
    WorkflowService, MAX_HOURLY_RATE, MAX_HOURS_WORKED,
};
use infra_db::{PostgresClaimStore, PostgresLecturerDirectory};
use test_utils::*;

async fn store() -> (PostgresClaimStore, TestDatabase) {
    let db = create_isolated_test_database()
        .await
        .expect("Failed to create test database");
    (PostgresClaimStore::new(db.pool().clone()), db)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_create_assigns_increasing_ids() {
    let (store, _db) = store().await;

    let first = store.create(NewClaimBuilder::new().build()).await.unwrap();
    let second = store
        .create(NewClaimBuilder::new().for_lecturer("L2").hours(dec!(7.5)).build())
        .await
        .unwrap();

    assert!(second.id > first.id);
    assert_eq!(first.version, 1);
    assert_status(&first, ClaimStatus::Pending);
    assert_history_consistent(&first);

    let fetched = store.get(second.id).await.unwrap();
    assert_eq!(fetched.hours_worked, dec!(7.5));
    assert_eq!(fetched.amount, second.amount);
    assert_eq!(fetched.claim_month, TemporalFixtures::march_2024());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_fine_grained_and_maximal_values_round_trip_exactly() {
    let (store, _db) = store().await;

    let fine = store
        .create(
            NewClaimBuilder::new()
                .hours(dec!(1.0001))
                .rate(Money::new(dec!(0.0003), Currency::ZAR))
                .build(),
        )
        .await
        .unwrap();
    let largest = store
        .create(
            NewClaimBuilder::new()
                .hours(MAX_HOURS_WORKED)
                .rate(Money::new(MAX_HOURLY_RATE, Currency::ZAR))
                .build(),
        )
        .await
        .unwrap();

    for created in [fine, largest] {
        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched.hours_worked, created.hours_worked);
        assert_eq!(fetched.amount, created.amount);
        assert!(fetched.check_invariants().is_ok());
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_claim_is_not_found() {
    let (store, _db) = store().await;
    let err = store.get(ClaimId::new(999)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_stale_update_conflicts_and_leaves_row() {
    let (store, _db) = store().await;
    let claim = store
        .create(NewClaimBuilder::new().attachment("a.pdf").build())
        .await
        .unwrap();

    let updated = store
        .update(
            claim.id,
            1,
            Box::new(|c| {
                domain_claims::lifecycle::apply_transition(
                    c,
                    ClaimStatus::Verified,
                    &CallerFixtures::coordinator(),
                    chrono::Utc::now(),
                )
            }),
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_history_consistent(&updated);

    let err = store
        .update(claim.id, 1, Box::new(|c| c.notes = Some("late".to_string())))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict { .. }));

    let stored = store.get(claim.id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.notes, None);
    assert_eq!(stored.history.len(), 2);
    assert_eq!(stored.attachments.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_list_filters_in_id_order() {
    let (store, _db) = store().await;
    for lecturer in ["L1", "L2", "L1"] {
        store
            .create(NewClaimBuilder::new().for_lecturer(lecturer).build())
            .await
            .unwrap();
    }

    let mine = store
        .list(ClaimQuery::by_lecturer(IdFixtures::lecturer_id("L1")))
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine[0].id < mine[1].id);

    let pending = store.list(ClaimQuery::by_status(ClaimStatus::Pending)).await.unwrap();
    assert_eq!(pending.len(), 3);
    let verified = store.list(ClaimQuery::by_status(ClaimStatus::Verified)).await.unwrap();
    assert!(verified.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_workflow_over_postgres() {
    let (store, db) = store().await;
    let service = WorkflowService::new(Arc::new(store.clone()), WorkflowConfig::default())
        .with_lecturer_directory(Arc::new(PostgresLecturerDirectory::new(db.pool().clone())));

    let claim = service
        .submit(&CallerFixtures::lecturer("L1"), NewClaimBuilder::new().into_command())
        .await
        .unwrap();
    service
        .verify(&CallerFixtures::coordinator(), claim.id, None)
        .await
        .unwrap();
    let report = service.batch_approve(&CallerFixtures::hr()).await.unwrap();
    assert_eq!(report.approved_count(), 1);

    let invoice = service.generate_invoice(&CallerFixtures::hr()).await.unwrap();
    assert_invoice_reconciles(&invoice);
    assert_eq!(invoice.total_payment.amount(), dec!(10000));

    assert_eq!(store.health_check().await.status, AdapterHealth::Healthy);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_lecturer_directory_round_trip() {
    let db = get_shared_test_database().await;
    db.clear_data().await.unwrap();
    let directory = PostgresLecturerDirectory::new(db.pool().clone());

    let registered = directory
        .register(LecturerBuilder::new("L1").name("T. Mokoena").build())
        .await
        .unwrap();
    assert_eq!(registered.name, "T. Mokoena");

    let duplicate = directory.register(LecturerBuilder::new("L1").build()).await;
    assert!(matches!(duplicate, Err(PortError::Conflict { .. })));

    let updated = directory
        .update(
            &registered.id,
            UpdateLecturer {
                email: None,
                phone: Some("+27 21 555 0100".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email, registered.email);
    assert_eq!(updated.phone.as_deref(), Some("+27 21 555 0100"));
    assert_eq!(directory.list().await.unwrap().len(), 1);
}
