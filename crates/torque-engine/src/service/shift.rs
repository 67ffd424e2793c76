//! # Shift Service
//!
//! Cashier shifts: start, close with reconciliation, cancel, and reports.
//!
//! ## Shift States
//! ```text
//!            start                close(final_cash)
//!   (none) ────────► active ─────────────────────► closed
//!                      │
//!                      │ cancel
//!                      ▼
//!                   canceled
//! ```
//!
//! At most one active shift per user. The partial unique index
//! `shifts(user_id) WHERE status = 'active'` enforces it; the insert is
//! the first write of its transaction, so two concurrent starts for the
//! same user produce exactly one winner and one `ShiftAlreadyActive`.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use torque_core::validation::{validate_non_negative_cents, validate_optional_text, validate_reference};
use torque_core::{Page, PageRequest, Shift, ShiftDetails, ShiftStatus, ShiftSummary};
use torque_db::{DbError, PaymentRepository, ShiftRepository, WorkOrderRepository};

use crate::deadline::Deadline;
use crate::error::{EngineError, EngineResult};
use crate::service::ServiceContext;

/// Request to open a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartShift {
    pub user_id: String,
    pub initial_cash_cents: i64,
    /// Who handed over the opening float.
    #[serde(default)]
    pub received_from: Option<String>,
}

impl StartShift {
    pub fn new(user_id: impl Into<String>, initial_cash_cents: i64) -> Self {
        StartShift {
            user_id: user_id.into(),
            initial_cash_cents,
            received_from: None,
        }
    }

    pub fn received_from(mut self, name: impl Into<String>) -> Self {
        self.received_from = Some(name.into());
        self
    }

    fn validate(&self) -> EngineResult<()> {
        validate_reference("user_id", &self.user_id)?;
        validate_non_negative_cents("initial_cash", self.initial_cash_cents)?;
        validate_optional_text("received_from", self.received_from.as_deref())?;
        Ok(())
    }
}

/// A closed shift and the figures it was closed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftReport {
    pub shift: Shift,
    pub summary: ShiftSummary,
}

/// The shift reconciler.
#[derive(Debug, Clone)]
pub struct ShiftService {
    ctx: ServiceContext,
}

impl ShiftService {
    pub fn new(ctx: ServiceContext) -> Self {
        ShiftService { ctx }
    }

    pub async fn start(&self, request: StartShift, deadline: Deadline) -> EngineResult<Shift> {
        request.validate()?;
        let request = &request;

        self.ctx
            .run("shift.start", deadline, move || self.start_once(request))
            .await
    }

    async fn start_once(&self, request: &StartShift) -> EngineResult<Shift> {
        let now = self.ctx.clock.now();
        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id.clone(),
            start_time: now,
            end_time: None,
            initial_cash_cents: request.initial_cash_cents,
            final_cash_cents: 0,
            total_sales_cents: 0,
            status: ShiftStatus::Active,
            received_from: request.received_from.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.ctx.db.begin().await?;
        ShiftRepository::insert(&mut tx, &shift)
            .await
            .map_err(|err| already_active(err, &shift.user_id))?;
        tx.commit().await?;

        info!(
            id = %shift.id,
            user_id = %shift.user_id,
            initial_cash_cents = shift.initial_cash_cents,
            "Shift started"
        );
        Ok(shift)
    }

    /// Closes an active shift, recording final cash and total sales.
    pub async fn close(&self, id: &str, final_cash_cents: i64, deadline: Deadline) -> EngineResult<ShiftReport> {
        validate_non_negative_cents("final_cash", final_cash_cents)?;

        self.ctx
            .run("shift.close", deadline, move || self.close_once(id, final_cash_cents))
            .await
    }

    async fn close_once(&self, id: &str, final_cash_cents: i64) -> EngineResult<ShiftReport> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        let shift = Self::lock_active(&mut tx, id).await?;
        let summary = ShiftRepository::compute_summary(&mut tx, id).await?;

        if !ShiftRepository::close(&mut tx, id, final_cash_cents, &summary, now).await? {
            return Err(EngineError::ShiftNotActive {
                id: id.to_string(),
                status: shift.status,
            });
        }
        let shift = ShiftRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Shift", id))?;

        tx.commit().await?;

        info!(
            id = %id,
            user_id = %shift.user_id,
            total_sales = %summary.total_sales(),
            total_orders = summary.total_orders,
            final_cash_cents,
            "Shift closed"
        );
        Ok(ShiftReport { shift, summary })
    }

    /// Cancels an active shift opened by mistake.
    pub async fn cancel(&self, id: &str, deadline: Deadline) -> EngineResult<Shift> {
        self.ctx
            .run("shift.cancel", deadline, move || self.cancel_once(id))
            .await
    }

    async fn cancel_once(&self, id: &str) -> EngineResult<Shift> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        let shift = Self::lock_active(&mut tx, id).await?;
        if !ShiftRepository::cancel(&mut tx, id, now).await? {
            return Err(EngineError::ShiftNotActive {
                id: id.to_string(),
                status: shift.status,
            });
        }
        let shift = ShiftRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Shift", id))?;

        tx.commit().await?;

        info!(id = %id, user_id = %shift.user_id, "Shift canceled");
        Ok(shift)
    }

    /// Takes the write lock on a shift and checks it is still active.
    async fn lock_active(conn: &mut SqliteConnection, id: &str) -> EngineResult<Shift> {
        if !ShiftRepository::lock(&mut *conn, id).await? {
            return Err(EngineError::not_found("Shift", id));
        }
        require_active_shift(conn, id).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, id: &str, deadline: Deadline) -> EngineResult<Shift> {
        let repo = self.ctx.db.shifts();
        self.ctx
            .read("shift.get", deadline, repo.get_by_id(id))
            .await?
            .ok_or_else(|| EngineError::not_found("Shift", id))
    }

    pub async fn get_active_by_user(&self, user_id: &str, deadline: Deadline) -> EngineResult<Option<Shift>> {
        let repo = self.ctx.db.shifts();
        self.ctx
            .read("shift.get_active_by_user", deadline, repo.get_active_by_user(user_id))
            .await
    }

    pub async fn list(&self, request: PageRequest, deadline: Deadline) -> EngineResult<Page<Shift>> {
        let request = self.ctx.check_page(request)?;
        let repo = self.ctx.db.shifts();
        self.ctx.read("shift.list", deadline, repo.list(request)).await
    }

    /// Live sales figures for a shift, computed the same way close does.
    pub async fn get_summary(&self, id: &str, deadline: Deadline) -> EngineResult<ShiftSummary> {
        let db = self.ctx.db.clone();
        self.ctx
            .read("shift.get_summary", deadline, async move {
                // One read transaction, so the sum and the count see the same snapshot.
                let mut tx = db.begin().await?;
                if ShiftRepository::find(&mut tx, id).await?.is_none() {
                    return Err(EngineError::not_found("Shift", id));
                }
                let summary = ShiftRepository::compute_summary(&mut tx, id).await?;
                tx.commit().await?;
                Ok::<ShiftSummary, EngineError>(summary)
            })
            .await
    }

    /// The shift with its summary, work orders and payments.
    pub async fn get_details(&self, id: &str, deadline: Deadline) -> EngineResult<ShiftDetails> {
        let db = self.ctx.db.clone();
        self.ctx
            .read("shift.get_details", deadline, async move {
                let mut tx = db.begin().await?;
                let shift = ShiftRepository::find(&mut tx, id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Shift", id))?;
                let summary = ShiftRepository::compute_summary(&mut tx, id).await?;
                let work_orders = WorkOrderRepository::find_by_shift(&mut tx, id).await?;
                let payments = PaymentRepository::find_by_shift(&mut tx, id).await?;
                tx.commit().await?;

                Ok::<ShiftDetails, EngineError>(ShiftDetails {
                    shift,
                    summary,
                    work_orders,
                    payments,
                })
            })
            .await
    }
}

/// Checks that orders and payments may still be attributed to `id`.
///
/// Call it once the transaction holds the write lock, so a concurrent
/// close cannot slip in between the check and the insert.
pub(crate) async fn require_active_shift(conn: &mut SqliteConnection, id: &str) -> EngineResult<Shift> {
    let shift = ShiftRepository::find(&mut *conn, id)
        .await?
        .ok_or_else(|| EngineError::InvalidReference(format!("shift {} does not exist", id)))?;
    if !shift.is_active() {
        return Err(EngineError::ShiftNotActive {
            id: shift.id,
            status: shift.status,
        });
    }
    Ok(shift)
}

fn already_active(err: DbError, user_id: &str) -> EngineError {
    if err.is_unique_violation_on("user_id") {
        EngineError::ShiftAlreadyActive {
            user_id: user_id.to_string(),
        }
    } else {
        err.into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::service::payment::{ApplyPayment, PaymentService, UpdatePayment};
    use crate::service::testing::{fixture, product, Fixture};
    use crate::service::work_order::{CreateWorkOrder, WorkOrderService};
    use torque_core::{Clock, PaymentStatus, WorkOrderSource, WorkOrderType};

    fn service(f: &Fixture) -> ShiftService {
        ShiftService::new(f.ctx.clone())
    }

    /// Creates an order on `shift_id` and pays `amount_cents` cash.
    async fn sale(f: &Fixture, shift_id: &str, price_cents: i64, amount_cents: i64) -> String {
        let item = product(&f.ctx, "Exterior Wash", price_cents).await;
        let order = WorkOrderService::new(f.ctx.clone())
            .create(
                CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service)
                    .item(&item.id, 1)
                    .shift(shift_id),
                Deadline::none(),
            )
            .await
            .unwrap()
            .order;
        PaymentService::new(f.ctx.clone())
            .apply(ApplyPayment::cash(&order.id, amount_cents).shift(shift_id), Deadline::none())
            .await
            .unwrap()
            .payment
            .id
    }

    #[tokio::test]
    async fn test_start_and_second_start_conflicts() {
        let f = fixture().await;
        let svc = service(&f);

        let shift = svc
            .start(StartShift::new("cashier-1", 20_000).received_from("Supervisor"), Deadline::none())
            .await
            .unwrap();
        assert_eq!(shift.status, ShiftStatus::Active);
        assert_eq!(shift.start_time, f.clock.now());
        assert_eq!(shift.received_from.as_deref(), Some("Supervisor"));

        let err = svc
            .start(StartShift::new("cashier-1", 0), Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ShiftAlreadyActive { ref user_id } if user_id == "cashier-1"));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Another user is unaffected.
        svc.start(StartShift::new("cashier-2", 0), Deadline::none())
            .await
            .unwrap();

        let active = svc
            .get_active_by_user("cashier-1", Deadline::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, shift.id);
    }

    #[tokio::test]
    async fn test_start_validation() {
        let f = fixture().await;
        let svc = service(&f);

        let err = svc
            .start(StartShift::new("cashier-1", -1), Deadline::none())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = svc
            .start(StartShift::new("  ", 0), Deadline::none())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_close_counts_only_completed_payments() {
        let f = fixture().await;
        let svc = service(&f);
        let shift = svc
            .start(StartShift::new("cashier-1", 10_000), Deadline::none())
            .await
            .unwrap();

        sale(&f, &shift.id, 5_000, 5_000).await;
        let refunded = sale(&f, &shift.id, 3_000, 3_000).await;
        PaymentService::new(f.ctx.clone())
            .update(&refunded, UpdatePayment::status(PaymentStatus::Refunded), Deadline::none())
            .await
            .unwrap();

        let summary = svc.get_summary(&shift.id, Deadline::none()).await.unwrap();
        assert_eq!(summary.total_sales_cents, 5_000);
        assert_eq!(summary.total_orders, 2);

        f.clock.advance(chrono::Duration::hours(8));
        let report = svc.close(&shift.id, 15_000, Deadline::none()).await.unwrap();
        assert_eq!(report.summary, summary);
        assert_eq!(report.shift.status, ShiftStatus::Closed);
        assert_eq!(report.shift.total_sales_cents, 5_000);
        assert_eq!(report.shift.final_cash_cents, 15_000);
        assert_eq!(report.shift.end_time, Some(f.clock.now()));

        let err = svc.close(&shift.id, 15_000, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, EngineError::ShiftNotActive { status: ShiftStatus::Closed, .. }));
        assert_eq!(err.kind(), ErrorKind::State);

        // The user can open a new shift once the old one is closed.
        svc.start(StartShift::new("cashier-1", 0), Deadline::none())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_details_and_empty_summary() {
        let f = fixture().await;
        let svc = service(&f);
        let shift = svc
            .start(StartShift::new("cashier-1", 0), Deadline::none())
            .await
            .unwrap();

        let empty = svc.get_summary(&shift.id, Deadline::none()).await.unwrap();
        assert_eq!(empty.total_sales_cents, 0);
        assert_eq!(empty.total_orders, 0);

        sale(&f, &shift.id, 4_000, 4_000).await;
        let details = svc.get_details(&shift.id, Deadline::none()).await.unwrap();
        assert_eq!(details.shift.id, shift.id);
        assert_eq!(details.work_orders.len(), 1);
        assert_eq!(details.payments.len(), 1);
        assert_eq!(details.summary.total_sales_cents, 4_000);
    }

    #[tokio::test]
    async fn test_missing_shift() {
        let f = fixture().await;
        let svc = service(&f);

        for err in [
            svc.close("nope", 0, Deadline::none()).await.unwrap_err(),
            svc.cancel("nope", Deadline::none()).await.unwrap_err(),
            svc.get("nope", Deadline::none()).await.unwrap_err(),
            svc.get_summary("nope", Deadline::none()).await.unwrap_err(),
            svc.get_details("nope", Deadline::none()).await.unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn test_cancel() {
        let f = fixture().await;
        let svc = service(&f);
        let shift = svc
            .start(StartShift::new("cashier-1", 0), Deadline::none())
            .await
            .unwrap();

        let canceled = svc.cancel(&shift.id, Deadline::none()).await.unwrap();
        assert_eq!(canceled.status, ShiftStatus::Canceled);
        assert!(svc
            .get_active_by_user("cashier-1", Deadline::none())
            .await
            .unwrap()
            .is_none());

        let err = svc.close(&shift.id, 0, Deadline::none()).await.unwrap_err();
        assert!(matches!(err, EngineError::ShiftNotActive { status: ShiftStatus::Canceled, .. }));

        let page = svc.list(PageRequest::default(), Deadline::none()).await.unwrap();
        assert_eq!(page.total, 1);
    }
}
