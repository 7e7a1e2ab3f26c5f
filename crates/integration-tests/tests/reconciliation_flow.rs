//! End-to-end RTS/RTO detection and confirmation.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use codledger_engine::models::DateWindow;
use codledger_engine::models::reconciliation::{
    Confidence, NewReconciliation, ReconciliationStatus,
};
use codledger_engine::{EngineError, EngineSettings, SettlementService, StoreError};
use codledger_integration_tests::{MemoryStore, order_line, payout_entry};

fn march() -> DateWindow {
    DateWindow::new("2024-03-01".parse().unwrap(), "2024-03-31".parse().unwrap())
}

fn service(store: MemoryStore) -> SettlementService<MemoryStore> {
    SettlementService::new(store, EngineSettings::default())
}

#[tokio::test]
async fn delivered_then_rto_with_payout_yields_one_high_suggestion() {
    let store = MemoryStore::new()
        .with_orders(vec![
            order_line("A1", "Delivered", 1, Decimal::new(300, 0)),
            order_line("A1", "RTO", 2, Decimal::new(300, 0)),
        ])
        .with_payout_log(vec![payout_entry("A1", Decimal::new(300, 0))]);

    let suggestions = service(store)
        .auto_detect_reconciliations(&march(), None)
        .await
        .unwrap();

    assert_eq!(suggestions.len(), 1);
    let s = &suggestions[0];
    assert_eq!(s.order_ref.as_str(), "A1");
    assert_eq!(s.confidence, Confidence::High);
    assert_eq!(s.suggested_reversal, Decimal::new(300, 0));
    assert!(s.transition_detected);
}

#[tokio::test]
async fn confirmed_orders_are_never_resuggested() {
    let store = MemoryStore::new()
        .with_orders(vec![
            order_line("B1", "Delivered", 1, Decimal::new(1000, 0)),
            order_line("B1", "RTS in transit", 2, Decimal::new(1000, 0)),
        ])
        .with_payout_log(vec![payout_entry("B1", Decimal::new(650, 0))]);
    let service = service(store);

    let first = service
        .auto_detect_reconciliations(&march(), None)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let s = &first[0];
    service
        .confirm_reconciliation(NewReconciliation {
            order_ref: s.order_ref.clone(),
            product_uid: s.product_uid.clone(),
            dropshipper: s.dropshipper.clone(),
            original_paid_amount: s.prior_paid_amount,
            reversal_amount: s.suggested_reversal,
            status: ReconciliationStatus::Processed,
            notes: Some("carrier confirmed return receipt".to_owned()),
        })
        .await
        .unwrap();

    let second = service
        .auto_detect_reconciliations(&march(), None)
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn duplicate_confirmation_is_a_conflict() {
    let service = service(MemoryStore::new());

    let record = NewReconciliation {
        order_ref: "C1".into(),
        product_uid: codledger_integration_tests::belt(),
        dropshipper: codledger_integration_tests::seller(),
        original_paid_amount: None,
        reversal_amount: Decimal::new(120, 0),
        status: ReconciliationStatus::Processed,
        notes: None,
    };
    service.confirm_reconciliation(record.clone()).await.unwrap();

    let err = service.confirm_reconciliation(record).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Conflict(_))));
}

#[tokio::test]
async fn pending_returns_exclude_confirmed_orders() {
    let store = MemoryStore::new().with_orders(vec![
        order_line("D1", "RTO", 1, Decimal::new(400, 0)),
        order_line("D2", "RTS", 2, Decimal::new(500, 0)),
        order_line("D3", "Delivered", 3, Decimal::new(600, 0)),
    ]);
    let service = service(store);

    service
        .confirm_reconciliation(NewReconciliation {
            order_ref: "D2".into(),
            product_uid: codledger_integration_tests::belt(),
            dropshipper: codledger_integration_tests::seller(),
            original_paid_amount: None,
            reversal_amount: Decimal::new(350, 0),
            status: ReconciliationStatus::Processed,
            notes: None,
        })
        .await
        .unwrap();

    let pending = service.pending_returns(None).await.unwrap();
    let refs: Vec<&str> = pending.iter().map(|p| p.order_ref.as_str()).collect();
    assert_eq!(refs, vec!["D1"]);
}

#[tokio::test]
async fn suggestions_are_ranked_by_confidence_then_amount() {
    let store = MemoryStore::new()
        .with_orders(vec![
            // Low: returned with no history or payout.
            order_line("E1", "RTO", 1, Decimal::new(100, 0)),
            // High, estimated 650: transition without payout.
            order_line("E2", "Delivered", 2, Decimal::new(1000, 0)),
            order_line("E2", "RTO", 3, Decimal::new(1000, 0)),
            // Medium: payout without an observed transition.
            order_line("E3", "RTS", 4, Decimal::new(500, 0)),
        ])
        .with_payout_log(vec![payout_entry("E3", Decimal::new(420, 0))]);

    let suggestions = service(store)
        .auto_detect_reconciliations(&march(), None)
        .await
        .unwrap();

    let ranked: Vec<(&str, Confidence)> = suggestions
        .iter()
        .map(|s| (s.order_ref.as_str(), s.confidence))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("E2", Confidence::High),
            ("E3", Confidence::Medium),
            ("E1", Confidence::Low),
        ]
    );
    assert!(suggestions[1].needs_manual_review);
}
