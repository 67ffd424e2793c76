//! Concurrent writers against one on-disk SQLite database.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::TestEngine;
use torque_core::{PaymentStatus, WorkOrderSource, WorkOrderStatus, WorkOrderType};
use torque_engine::service::payment::ApplyPayment;
use torque_engine::service::shift::StartShift;
use torque_engine::service::work_order::CreateWorkOrder;
use torque_engine::{Deadline, EngineError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_unique_numbers() {
    let t = TestEngine::new(8).await;
    let wash = t.product("Exterior Wash", 5_000).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = t.engine.clone();
        let product_id = wash.id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .work_orders()
                .create(
                    CreateWorkOrder::new(WorkOrderSource::Kiosk, WorkOrderType::Service).item(product_id, 1),
                    Deadline::none(),
                )
                .await
        }));
    }

    let mut numbers = HashSet::new();
    let mut queue = HashSet::new();
    for handle in handles {
        let details = handle.await.unwrap().unwrap();
        numbers.insert(details.order.order_number);
        queue.insert(details.order.queue_number.unwrap());
    }

    assert_eq!(numbers.len(), 20);
    assert_eq!(queue, (1..=20).collect::<HashSet<i64>>());
    assert!(numbers.contains("WO-20250314-0001"));
    assert!(numbers.contains("WO-20250314-0020"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shift_starts_have_one_winner() {
    let t = TestEngine::new(8).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = t.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .shifts()
                .start(StartShift::new("cashier-1", 10_000), Deadline::none())
                .await
        }));
    }

    let mut started = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => started += 1,
            Err(EngineError::ShiftAlreadyActive { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(started, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_complete_once() {
    let t = TestEngine::new(8).await;
    let wash = t.product("Exterior Wash", 11_000).await;

    let order = t
        .engine
        .work_orders()
        .create(
            CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service).item(&wash.id, 1),
            Deadline::none(),
        )
        .await
        .unwrap()
        .order;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let engine = t.engine.clone();
        let order_id = order.id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .payments()
                .apply(ApplyPayment::cash(order_id, 11_000), Deadline::none())
                .await
        }));
    }

    let mut completions = 0;
    let mut numbers = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        if receipt.order_completed {
            completions += 1;
        }
        numbers.insert(receipt.payment.payment_number);
    }

    assert_eq!(completions, 1);
    assert_eq!(numbers.len(), 5);

    let paid = t
        .engine
        .payments()
        .total_completed_for_order(&order.id, Deadline::none())
        .await
        .unwrap();
    assert_eq!(paid.cents(), 55_000);

    let order = t
        .engine
        .work_orders()
        .get(&order.id, Deadline::none())
        .await
        .unwrap()
        .order;
    assert_eq!(order.status, WorkOrderStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deadline_while_locked_commits_nothing() {
    let t = TestEngine::with_busy_timeout(4, Duration::from_millis(500)).await;
    let wash = t.product("Exterior Wash", 5_000).await;
    let request = CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service).item(&wash.id, 1);

    // Another connection takes the write lock and sits on it.
    let mut blocker = t.engine.database().begin().await.unwrap();
    sqlx::query("UPDATE products SET updated_at = updated_at")
        .execute(&mut *blocker)
        .await
        .unwrap();

    let err = t
        .engine
        .work_orders()
        .create(request.clone(), Deadline::after(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DeadlineExceeded { operation: "work_order.create" }));

    blocker.rollback().await.unwrap();

    let page = t
        .engine
        .work_orders()
        .list(t.engine.page_request(1, None), Deadline::none())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    // The abandoned attempt consumed no number.
    let details = t
        .engine
        .work_orders()
        .create(request, Deadline::none())
        .await
        .unwrap();
    assert_eq!(details.order.order_number, "WO-20250314-0001");
}

#[tokio::test]
async fn test_expired_deadline_is_rejected_up_front() {
    let t = TestEngine::new(2).await;

    let err = t
        .engine
        .shifts()
        .start(
            StartShift::new("cashier-1", 0),
            Deadline::at(tokio::time::Instant::now()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DeadlineExceeded { .. }));

    let active = t
        .engine
        .shifts()
        .get_active_by_user("cashier-1", Deadline::none())
        .await
        .unwrap();
    assert!(active.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shift_details_are_one_snapshot() {
    let t = TestEngine::new(8).await;
    let wash = t.product("Exterior Wash", 5_000).await;
    let shift = t
        .engine
        .shifts()
        .start(StartShift::new("cashier-1", 0), Deadline::none())
        .await
        .unwrap();

    let mut order_ids = Vec::new();
    for _ in 0..10 {
        let details = t
            .engine
            .work_orders()
            .create(
                CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service)
                    .item(&wash.id, 1)
                    .shift(&shift.id),
                Deadline::none(),
            )
            .await
            .unwrap();
        order_ids.push(details.order.id);
    }

    let engine = t.engine.clone();
    let shift_id = shift.id.clone();
    let payer = tokio::spawn(async move {
        for order_id in order_ids {
            engine
                .payments()
                .apply(ApplyPayment::cash(order_id, 5_000).shift(&shift_id), Deadline::none())
                .await
                .unwrap();
        }
    });

    while !payer.is_finished() {
        let details = t
            .engine
            .shifts()
            .get_details(&shift.id, Deadline::none())
            .await
            .unwrap();
        let listed: i64 = details
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Completed)
            .map(|p| p.amount_paid_cents)
            .sum();
        assert_eq!(details.summary.total_sales_cents, listed);
        assert_eq!(details.summary.total_orders, details.work_orders.len() as i64);
    }
    payer.await.unwrap();

    let summary = t
        .engine
        .shifts()
        .get_summary(&shift.id, Deadline::none())
        .await
        .unwrap();
    assert_eq!(summary.total_sales_cents, 50_000);
    assert_eq!(summary.total_orders, 10);
}
