//! # Payment Service
//!
//! Records payments against work orders and completes orders once they
//! are fully paid.
//!
//! ## Apply
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    lock work order            (write lock; OrderNotFound if missing)    │
//! │    cancelled? ─────────────── OrderClosed                               │
//! │    shift given, not active? ─ ShiftNotActive                            │
//! │    next payment number        PAY-20250314-0003                         │
//! │    change = cash && paid > total ? paid - total : 0                     │
//! │    INSERT payment (completed, paid_at = now)                            │
//! │    Σ completed payments ≥ total?                                        │
//! │        └── UPDATE work_orders SET status = 'completed'                  │
//! │            WHERE status NOT IN ('completed', 'cancelled')               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The completion update is conditional, so an order is completed exactly
//! once no matter how many payments push it over its total.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info};
use uuid::Uuid;

use torque_core::ledger::{calculate_change, is_fully_paid};
use torque_core::validation::{validate_optional_text, validate_payment_amount, validate_reference};
use torque_core::{
    Money, Page, PageRequest, Payment, PaymentMethod, PaymentStatus, PaymentWithOrder,
    SequenceScope, ValidationError, WorkOrder, WorkOrderStatus,
};
use torque_db::{PaymentChanges, PaymentRepository, SequenceRepository, WorkOrderRepository};

use crate::deadline::Deadline;
use crate::error::{EngineError, EngineResult};
use crate::service::shift::require_active_shift;
use crate::service::ServiceContext;

// =============================================================================
// Requests
// =============================================================================

/// Request to record a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPayment {
    pub work_order_id: String,
    pub method: PaymentMethod,
    pub amount_paid_cents: i64,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Raw response from the payment rail, stored as JSON text.
    #[serde(default)]
    pub raw_payload: Option<serde_json::Value>,
}

impl ApplyPayment {
    pub fn new(work_order_id: impl Into<String>, method: PaymentMethod, amount_paid_cents: i64) -> Self {
        ApplyPayment {
            work_order_id: work_order_id.into(),
            method,
            amount_paid_cents,
            cashier_id: None,
            shift_id: None,
            reference_number: None,
            raw_payload: None,
        }
    }

    pub fn cash(work_order_id: impl Into<String>, amount_paid_cents: i64) -> Self {
        ApplyPayment::new(work_order_id, PaymentMethod::Cash, amount_paid_cents)
    }

    pub fn cashier(mut self, cashier_id: impl Into<String>) -> Self {
        self.cashier_id = Some(cashier_id.into());
        self
    }

    pub fn shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    pub fn reference(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.raw_payload = Some(payload);
        self
    }

    fn validate(&self) -> EngineResult<()> {
        validate_reference("work_order_id", &self.work_order_id)?;
        validate_payment_amount(self.amount_paid_cents)?;
        validate_optional_text("reference_number", self.reference_number.as_deref())?;
        Ok(())
    }
}

/// Mutable payment fields. Amount, method and order are fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayment {
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub raw_payload: Option<serde_json::Value>,
}

impl UpdatePayment {
    pub fn status(status: PaymentStatus) -> Self {
        UpdatePayment {
            status: Some(status),
            ..Default::default()
        }
    }

    fn into_changes(self) -> EngineResult<PaymentChanges> {
        validate_optional_text("reference_number", self.reference_number.as_deref())?;
        Ok(PaymentChanges {
            status: self.status,
            reference_number: self.reference_number,
            raw_payload: self.raw_payload.as_ref().map(encode_payload).transpose()?,
        })
    }
}

/// What the cashier sees after a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// The order after the payment, possibly now completed.
    pub order: WorkOrder,
    pub total_paid_cents: i64,
    /// Whether this payment moved the order to `completed`.
    pub order_completed: bool,
}

impl PaymentReceipt {
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }

    /// What is still owed, never below zero.
    pub fn balance_due(&self) -> Money {
        self.order.total().saturating_sub_floor_zero(self.total_paid())
    }
}

fn encode_payload(payload: &serde_json::Value) -> EngineResult<String> {
    serde_json::to_string(payload).map_err(|e| {
        EngineError::Validation(ValidationError::InvalidFormat {
            field: "raw_payload".to_string(),
            reason: e.to_string(),
        })
    })
}

// =============================================================================
// Service
// =============================================================================

/// The payment ledger.
#[derive(Debug, Clone)]
pub struct PaymentService {
    ctx: ServiceContext,
}

impl PaymentService {
    pub fn new(ctx: ServiceContext) -> Self {
        PaymentService { ctx }
    }

    /// Records a completed payment and auto-completes the order when the
    /// completed payments reach its total.
    pub async fn apply(&self, request: ApplyPayment, deadline: Deadline) -> EngineResult<PaymentReceipt> {
        request.validate()?;
        let raw_payload = request.raw_payload.as_ref().map(encode_payload).transpose()?;
        let request = &request;
        let raw_payload = raw_payload.as_deref();

        self.ctx
            .run("payment.apply", deadline, move || self.apply_once(request, raw_payload))
            .await
    }

    async fn apply_once(
        &self,
        request: &ApplyPayment,
        raw_payload: Option<&str>,
    ) -> EngineResult<PaymentReceipt> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        if !WorkOrderRepository::lock(&mut tx, &request.work_order_id).await? {
            return Err(EngineError::OrderNotFound(request.work_order_id.clone()));
        }
        let order = WorkOrderRepository::find(&mut tx, &request.work_order_id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(request.work_order_id.clone()))?;
        if order.status == WorkOrderStatus::Cancelled {
            return Err(EngineError::OrderClosed {
                id: order.id,
                status: order.status,
            });
        }
        if let Some(shift_id) = &request.shift_id {
            require_active_shift(&mut tx, shift_id).await?;
        }

        let payment_number =
            SequenceRepository::next_number(&mut tx, SequenceScope::Payment, self.ctx.clock.today()).await?;
        let amount_paid = Money::from_cents(request.amount_paid_cents);
        let change = calculate_change(request.method, amount_paid, order.total());

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            payment_number,
            work_order_id: order.id.clone(),
            cashier_id: request.cashier_id.clone(),
            shift_id: request.shift_id.clone(),
            method: request.method,
            status: PaymentStatus::Completed,
            amount_paid_cents: amount_paid.cents(),
            change_cents: change.cents(),
            reference_number: request.reference_number.clone(),
            raw_payload: raw_payload.map(str::to_string),
            paid_at: now,
            created_at: now,
            updated_at: now,
        };
        PaymentRepository::insert(&mut tx, &payment).await?;

        let (total_paid_cents, order_completed) = self.settle(&mut tx, &order, now).await?;
        let order = WorkOrderRepository::find(&mut tx, &order.id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(request.work_order_id.clone()))?;

        tx.commit().await?;

        info!(
            payment_number = %payment.payment_number,
            order_number = %order.order_number,
            method = %payment.method,
            amount = %payment.amount_paid(),
            change = %payment.change(),
            order_completed,
            "Payment applied"
        );

        Ok(PaymentReceipt {
            payment,
            order,
            total_paid_cents,
            order_completed,
        })
    }

    /// Completes `order` if its completed payments now cover the total.
    async fn settle(
        &self,
        conn: &mut SqliteConnection,
        order: &WorkOrder,
        now: chrono::DateTime<chrono::Utc>,
    ) -> EngineResult<(i64, bool)> {
        let paid = PaymentRepository::sum_completed_for_order(&mut *conn, &order.id).await?;
        if !is_fully_paid(Money::from_cents(paid), order.total()) {
            debug!(id = %order.id, paid, total = order.total_cents, "Order not yet fully paid");
            return Ok((paid, false));
        }

        let completed = WorkOrderRepository::complete_if_open(&mut *conn, &order.id, now).await?;
        if completed {
            info!(order_number = %order.order_number, paid, "Work order fully paid, completed");
        }
        Ok((paid, completed))
    }

    /// Updates status, reference or payload. A change to `completed` runs
    /// the fully-paid check for the order; refunds never reopen it.
    pub async fn update(&self, id: &str, changes: UpdatePayment, deadline: Deadline) -> EngineResult<Payment> {
        let changes = changes.into_changes()?;
        let changes = &changes;

        self.ctx
            .run("payment.update", deadline, move || self.update_once(id, changes))
            .await
    }

    async fn update_once(&self, id: &str, changes: &PaymentChanges) -> EngineResult<Payment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        if !PaymentRepository::lock(&mut tx, id).await? {
            return Err(EngineError::not_found("Payment", id));
        }
        let before = PaymentRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Payment", id))?;

        let completing =
            changes.status == Some(PaymentStatus::Completed) && before.status != PaymentStatus::Completed;
        if completing {
            // A late completion would move a closed shift's sales.
            if let Some(shift_id) = &before.shift_id {
                require_active_shift(&mut tx, shift_id).await?;
            }
        }

        PaymentRepository::update(&mut tx, id, changes, now).await?;

        if completing {
            if let Some(order) = WorkOrderRepository::find(&mut tx, &before.work_order_id).await? {
                self.settle(&mut tx, &order, now).await?;
            }
        }

        let payment = PaymentRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Payment", id))?;
        tx.commit().await?;

        if before.status != payment.status {
            info!(
                payment_number = %payment.payment_number,
                from = %before.status,
                to = %payment.status,
                "Payment status changed"
            );
        }

        Ok(payment)
    }

    /// Removes a payment that never settled.
    pub async fn delete(&self, id: &str, deadline: Deadline) -> EngineResult<()> {
        self.ctx
            .run("payment.delete", deadline, move || self.delete_once(id))
            .await
    }

    async fn delete_once(&self, id: &str) -> EngineResult<()> {
        let mut tx = self.ctx.db.begin().await?;

        if !PaymentRepository::lock(&mut tx, id).await? {
            return Err(EngineError::not_found("Payment", id));
        }
        let payment = PaymentRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Payment", id))?;
        if payment.status == PaymentStatus::Completed {
            return Err(EngineError::PaymentLocked(payment.payment_number));
        }

        PaymentRepository::delete(&mut tx, id).await?;
        tx.commit().await?;

        info!(payment_number = %payment.payment_number, "Payment deleted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, id: &str, deadline: Deadline) -> EngineResult<Payment> {
        let repo = self.ctx.db.payments();
        self.ctx
            .read("payment.get", deadline, repo.get_by_id(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Payment", id))
    }

    pub async fn list(&self, request: PageRequest, deadline: Deadline) -> EngineResult<Page<Payment>> {
        let request = self.ctx.check_page(request)?;
        let repo = self.ctx.db.payments();
        self.ctx.read("payment.list", deadline, repo.list(request)).await
    }

    /// Payments for one order, newest first.
    pub async fn list_by_work_order(&self, work_order_id: &str, deadline: Deadline) -> EngineResult<Vec<Payment>> {
        let repo = self.ctx.db.payments();
        self.ctx
            .read("payment.list_by_work_order", deadline, repo.list_by_work_order(work_order_id))
            .await
    }

    /// Payments attributed to a shift, each with its order's number,
    /// status and total.
    pub async fn list_by_shift(&self, shift_id: &str, deadline: Deadline) -> EngineResult<Vec<PaymentWithOrder>> {
        let repo = self.ctx.db.payments();
        self.ctx
            .read("payment.list_by_shift", deadline, repo.list_by_shift_with_order(shift_id))
            .await
    }

    /// Σ completed payments for an order.
    pub async fn total_completed_for_order(&self, work_order_id: &str, deadline: Deadline) -> EngineResult<Money> {
        let repo = self.ctx.db.payments();
        let cents = self
            .ctx
            .read(
                "payment.total_completed_for_order",
                deadline,
                repo.total_completed_for_order(work_order_id),
            )
            .await?;
        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::service::shift::{ShiftService, StartShift};
    use crate::service::testing::{fixture, product, Fixture};
    use crate::service::work_order::{CreateWorkOrder, UpdateWorkOrder, WorkOrderService};
    use torque_core::{Clock, ShiftStatus, WorkOrderSource, WorkOrderType};

    fn service(f: &Fixture) -> PaymentService {
        PaymentService::new(f.ctx.clone())
    }

    /// An order for 110.00 (wash 50.00 × 2 + vacuum 10.00).
    async fn order(f: &Fixture) -> WorkOrder {
        let wash = product(&f.ctx, "Exterior Wash", 5_000).await;
        let vacuum = product(&f.ctx, "Interior Vacuum", 1_000).await;
        WorkOrderService::new(f.ctx.clone())
            .create(
                CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service)
                    .item(&wash.id, 2)
                    .item(&vacuum.id, 1),
                Deadline::none(),
            )
            .await
            .unwrap()
            .order
    }

    async fn insert_pending(
        f: &Fixture,
        work_order_id: &str,
        amount_paid_cents: i64,
        shift_id: Option<&str>,
    ) -> Payment {
        let now = f.clock.now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            payment_number: "PAY-20250314-9001".to_string(),
            work_order_id: work_order_id.to_string(),
            cashier_id: None,
            shift_id: shift_id.map(str::to_string),
            method: PaymentMethod::Qris,
            status: PaymentStatus::Pending,
            amount_paid_cents,
            change_cents: 0,
            reference_number: None,
            raw_payload: None,
            paid_at: now,
            created_at: now,
            updated_at: now,
        };
        let mut conn = f.ctx.db.pool().acquire().await.unwrap();
        PaymentRepository::insert(&mut conn, &payment).await.unwrap();
        payment
    }

    #[tokio::test]
    async fn test_cash_overpayment_gives_change_and_completes() {
        let f = fixture().await;
        let order = order(&f).await;

        let receipt = service(&f)
            .apply(ApplyPayment::cash(&order.id, 15_000), Deadline::none())
            .await
            .unwrap();

        assert_eq!(receipt.payment.payment_number, "PAY-20250314-0001");
        assert_eq!(receipt.payment.status, PaymentStatus::Completed);
        assert_eq!(receipt.payment.change_cents, 4_000);
        assert_eq!(receipt.payment.paid_at, f.clock.now());
        assert!(receipt.order_completed);
        assert_eq!(receipt.order.status, WorkOrderStatus::Completed);
        assert_eq!(receipt.order.completed_at, Some(f.clock.now()));
        assert_eq!(receipt.balance_due(), Money::zero());
    }

    #[tokio::test]
    async fn test_non_cash_never_gives_change() {
        let f = fixture().await;
        let order = order(&f).await;

        let receipt = service(&f)
            .apply(
                ApplyPayment::new(&order.id, PaymentMethod::Qris, 20_000)
                    .reference("QR-8812")
                    .payload(serde_json::json!({ "rrn": "000123", "issuer": "bank" })),
                Deadline::none(),
            )
            .await
            .unwrap();

        assert_eq!(receipt.payment.change_cents, 0);
        assert!(receipt.order_completed);
        assert_eq!(
            receipt.payment.payload(),
            Some(serde_json::json!({ "rrn": "000123", "issuer": "bank" }))
        );
    }

    #[tokio::test]
    async fn test_split_payment_completes_once() {
        let f = fixture().await;
        let order = order(&f).await;
        let svc = service(&f);

        let first = svc
            .apply(ApplyPayment::cash(&order.id, 6_000), Deadline::none())
            .await
            .unwrap();
        assert!(!first.order_completed);
        assert_eq!(first.order.status, WorkOrderStatus::Pending);
        assert_eq!(first.balance_due().cents(), 5_000);
        assert_eq!(first.payment.change_cents, 0);

        f.clock.advance(chrono::Duration::minutes(2));
        let second = svc
            .apply(ApplyPayment::cash(&order.id, 5_000), Deadline::none())
            .await
            .unwrap();
        assert!(second.order_completed);
        assert_eq!(second.total_paid_cents, 11_000);
        let completed_at = second.order.completed_at;

        // Extra payments on a completed order are recorded but do not
        // complete it again.
        f.clock.advance(chrono::Duration::minutes(2));
        let third = svc
            .apply(ApplyPayment::cash(&order.id, 1_000), Deadline::none())
            .await
            .unwrap();
        assert!(!third.order_completed);
        assert_eq!(third.order.completed_at, completed_at);

        let total = svc
            .total_completed_for_order(&order.id, Deadline::none())
            .await
            .unwrap();
        assert_eq!(total.cents(), 12_000);

        let listed = svc.list_by_work_order(&order.id, Deadline::none()).await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|p| p.payment_number.as_str()).collect();
        assert_eq!(numbers, vec!["PAY-20250314-0003", "PAY-20250314-0002", "PAY-20250314-0001"]);
    }

    #[tokio::test]
    async fn test_missing_and_cancelled_orders() {
        let f = fixture().await;
        let order = order(&f).await;
        let svc = service(&f);

        let err = svc
            .apply(ApplyPayment::cash("missing-order", 1_000), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        WorkOrderService::new(f.ctx.clone())
            .update(&order.id, UpdateWorkOrder::status(WorkOrderStatus::Cancelled), Deadline::none())
            .await
            .unwrap();
        let err = svc
            .apply(ApplyPayment::cash(&order.id, 11_000), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderClosed { status: WorkOrderStatus::Cancelled, .. }));

        // Nothing was recorded, and no payment number was consumed.
        let page = svc.list(PageRequest::default(), Deadline::none()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_amount_must_be_positive() {
        let f = fixture().await;
        let order = order(&f).await;

        for amount in [0, -500] {
            let err = service(&f)
                .apply(ApplyPayment::cash(&order.id, amount), Deadline::none())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_update_to_completed_settles_order() {
        let f = fixture().await;
        let order = order(&f).await;
        let pending = insert_pending(&f, &order.id, 11_000, None).await;
        let svc = service(&f);

        // Pending payments do not count.
        let total = svc
            .total_completed_for_order(&order.id, Deadline::none())
            .await
            .unwrap();
        assert_eq!(total, Money::zero());

        let updated = svc
            .update(
                &pending.id,
                UpdatePayment {
                    status: Some(PaymentStatus::Completed),
                    reference_number: Some("QR-1".into()),
                    raw_payload: None,
                },
                Deadline::none(),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, PaymentStatus::Completed);
        assert_eq!(updated.reference_number.as_deref(), Some("QR-1"));
        assert_eq!(updated.amount_paid_cents, 11_000);

        let loaded = WorkOrderService::new(f.ctx.clone())
            .get(&order.id, Deadline::none())
            .await
            .unwrap();
        assert_eq!(loaded.order.status, WorkOrderStatus::Completed);

        // Refunding does not reopen the order.
        svc.update(&pending.id, UpdatePayment::status(PaymentStatus::Refunded), Deadline::none())
            .await
            .unwrap();
        let loaded = WorkOrderService::new(f.ctx.clone())
            .get(&order.id, Deadline::none())
            .await
            .unwrap();
        assert_eq!(loaded.order.status, WorkOrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let f = fixture().await;
        let order = order(&f).await;
        let pending = insert_pending(&f, &order.id, 5_000, None).await;
        let svc = service(&f);

        let completed = svc
            .apply(ApplyPayment::cash(&order.id, 1_000), Deadline::none())
            .await
            .unwrap()
            .payment;
        let err = svc.delete(&completed.id, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, EngineError::PaymentLocked(_)));
        assert_eq!(err.kind(), ErrorKind::State);

        svc.delete(&pending.id, Deadline::none()).await.unwrap();
        let err = svc.get(&pending.id, Deadline::none()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // An order with a completed payment cannot be deleted.
        let err = WorkOrderService::new(f.ctx.clone())
            .delete(&order.id, Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::OrderHasPayments(_)));
    }

    #[tokio::test]
    async fn test_closed_shift_takes_no_payments() {
        let f = fixture().await;
        let order = order(&f).await;
        let shifts = ShiftService::new(f.ctx.clone());
        let shift = shifts
            .start(StartShift::new("cashier-1", 10_000), Deadline::none())
            .await
            .unwrap();
        let pending = insert_pending(&f, &order.id, 11_000, Some(&shift.id)).await;
        let report = shifts.close(&shift.id, 10_000, Deadline::none()).await.unwrap();
        assert_eq!(report.shift.total_sales_cents, 0);
        let svc = service(&f);

        let err = svc
            .apply(ApplyPayment::cash(&order.id, 5_000).shift(&shift.id), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShiftNotActive { status: ShiftStatus::Closed, .. }));
        assert_eq!(err.kind(), ErrorKind::State);

        // Completing a payment that belongs to the closed shift is refused too.
        let err = svc
            .update(&pending.id, UpdatePayment::status(PaymentStatus::Completed), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShiftNotActive { .. }));
        let reloaded = svc.get(&pending.id, Deadline::none()).await.unwrap();
        assert_eq!(reloaded.status, PaymentStatus::Pending);

        // The stored close figures still match the live ones.
        let live = shifts.get_summary(&shift.id, Deadline::none()).await.unwrap();
        assert_eq!(live.total_sales_cents, 0);
        let page = svc.list(PageRequest::default(), Deadline::none()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_unknown_shift_is_an_invalid_reference() {
        let f = fixture().await;
        let order = order(&f).await;

        let err = service(&f)
            .apply(ApplyPayment::cash(&order.id, 11_000).shift("no-such-shift"), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReference(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
