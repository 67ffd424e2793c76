//! # Work Order Service
//!
//! Creation, status changes, totals and removal of work orders.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (items 1..=100, qty 1..=999, text lengths)            │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       ├── next order number  WO-20250314-0007   (write lock taken)      │
//! │       ├── next queue number  7                                          │
//! │       ├── shift given? must be active, else ShiftNotActive              │
//! │       ├── for each item: resolve active product, snapshot name + price  │
//! │       ├── subtotal = Σ price × qty, total = subtotal                    │
//! │       ├── INSERT work_orders, INSERT work_order_items ...               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Unknown product → ProductNotFound, nothing written.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update
//! Strict lifecycle: `pending → confirmed → in_progress → ready → completed`,
//! `cancelled` from any open state. Re-submitting the current status is a
//! no-op. The total is recomputed on every update.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use torque_core::lifecycle::{apply_transition, validate_transition};
use torque_core::pricing::{compute_total, order_subtotal, price_line, PricedLine};
use torque_core::validation::{
    validate_item_count, validate_optional_text, validate_quantity,
};
use torque_core::{
    Money, Page, PageRequest, SequenceScope, ValidationError, WorkOrder, WorkOrderDetails,
    WorkOrderItem, WorkOrderSource, WorkOrderStatus, WorkOrderType,
};
use torque_db::{PaymentRepository, ProductRepository, SequenceRepository, WorkOrderRepository};

use crate::deadline::Deadline;
use crate::error::{EngineError, EngineResult};
use crate::service::shift::require_active_shift;
use crate::service::ServiceContext;

// =============================================================================
// Requests
// =============================================================================

/// One requested line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub assigned_staff_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        NewItem {
            product_id: product_id.into(),
            quantity,
            assigned_staff_id: None,
            note: None,
        }
    }
}

/// Request to open a work order.
///
/// ## Example
/// ```rust,ignore
/// let request = CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service)
///     .item(wash.id.clone(), 1)
///     .item(wax.id.clone(), 2)
///     .shift(shift.id.clone());
/// let details = engine.work_orders().create(request, Deadline::none()).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkOrder {
    pub source: WorkOrderSource,
    pub order_type: WorkOrderType,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub items: Vec<NewItem>,
}

impl CreateWorkOrder {
    pub fn new(source: WorkOrderSource, order_type: WorkOrderType) -> Self {
        CreateWorkOrder {
            source,
            order_type,
            customer_id: None,
            vehicle_id: None,
            cashier_id: None,
            shift_id: None,
            notes: None,
            special_instructions: None,
            items: Vec::new(),
        }
    }

    pub fn item(mut self, product_id: impl Into<String>, quantity: i64) -> Self {
        self.items.push(NewItem::new(product_id, quantity));
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn vehicle(mut self, vehicle_id: impl Into<String>) -> Self {
        self.vehicle_id = Some(vehicle_id.into());
        self
    }

    pub fn cashier(mut self, cashier_id: impl Into<String>) -> Self {
        self.cashier_id = Some(cashier_id.into());
        self
    }

    pub fn shift(mut self, shift_id: impl Into<String>) -> Self {
        self.shift_id = Some(shift_id.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn special_instructions(mut self, text: impl Into<String>) -> Self {
        self.special_instructions = Some(text.into());
        self
    }

    fn validate(&self) -> EngineResult<()> {
        validate_item_count(self.items.len())?;
        for item in &self.items {
            if item.product_id.trim().is_empty() {
                return Err(ValidationError::required("product_id").into());
            }
            validate_quantity(item.quantity)?;
            validate_optional_text("note", item.note.as_deref())?;
        }
        validate_optional_text("notes", self.notes.as_deref())?;
        validate_optional_text("special_instructions", self.special_instructions.as_deref())?;
        Ok(())
    }
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkOrder {
    #[serde(default)]
    pub status: Option<WorkOrderStatus>,
    #[serde(default)]
    pub discount_cents: Option<i64>,
    #[serde(default)]
    pub tax_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub shift_id: Option<String>,
}

impl UpdateWorkOrder {
    pub fn status(status: WorkOrderStatus) -> Self {
        UpdateWorkOrder {
            status: Some(status),
            ..Default::default()
        }
    }

    fn validate(&self) -> EngineResult<()> {
        validate_optional_text("notes", self.notes.as_deref())?;
        validate_optional_text("special_instructions", self.special_instructions.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Work order lifecycle operations.
#[derive(Debug, Clone)]
pub struct WorkOrderService {
    ctx: ServiceContext,
}

impl WorkOrderService {
    pub fn new(ctx: ServiceContext) -> Self {
        WorkOrderService { ctx }
    }

    /// Creates an order and its items atomically.
    pub async fn create(
        &self,
        request: CreateWorkOrder,
        deadline: Deadline,
    ) -> EngineResult<WorkOrderDetails> {
        request.validate()?;
        let request = &request;

        self.ctx
            .run("work_order.create", deadline, move || self.create_once(request))
            .await
    }

    async fn create_once(&self, request: &CreateWorkOrder) -> EngineResult<WorkOrderDetails> {
        let now = self.ctx.clock.now();
        let today = self.ctx.clock.today();

        let mut tx = self.ctx.db.begin().await?;

        let order_number = SequenceRepository::next_number(&mut tx, SequenceScope::Order, today).await?;
        let queue_number = SequenceRepository::next_queue_number(&mut tx, today).await?;
        if let Some(shift_id) = &request.shift_id {
            require_active_shift(&mut tx, shift_id).await?;
        }

        let mut lines: Vec<PricedLine> = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = ProductRepository::find_active(&mut tx, &item.product_id)
                .await?
                .ok_or_else(|| EngineError::ProductNotFound(item.product_id.clone()))?;
            lines.push(price_line(&product, item.quantity)?);
        }
        let subtotal = order_subtotal(&lines)?;

        let order = WorkOrder {
            id: Uuid::new_v4().to_string(),
            order_number,
            source: request.source,
            order_type: request.order_type,
            customer_id: request.customer_id.clone(),
            vehicle_id: request.vehicle_id.clone(),
            cashier_id: request.cashier_id.clone(),
            shift_id: request.shift_id.clone(),
            queue_number: Some(queue_number),
            status: WorkOrderStatus::Pending,
            notes: request.notes.clone(),
            special_instructions: request.special_instructions.clone(),
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            subtotal_cents: subtotal.cents(),
            discount_cents: 0,
            tax_cents: 0,
            total_cents: subtotal.cents(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        WorkOrderRepository::insert(&mut tx, &order).await?;

        let mut items = Vec::with_capacity(lines.len());
        for (line, requested) in lines.into_iter().zip(&request.items) {
            let item = WorkOrderItem {
                id: Uuid::new_v4().to_string(),
                work_order_id: order.id.clone(),
                product_id: line.product_id,
                product_name_snapshot: line.name,
                price_snapshot_cents: line.unit_price.cents(),
                quantity: line.quantity,
                subtotal_cents: line.subtotal.cents(),
                assigned_staff_id: requested.assigned_staff_id.clone(),
                note: requested.note.clone(),
                created_at: now,
            };
            WorkOrderRepository::insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        tx.commit().await?;

        info!(
            id = %order.id,
            order_number = %order.order_number,
            queue_number,
            items = items.len(),
            total = %order.total(),
            "Work order created"
        );

        Ok(WorkOrderDetails { order, items })
    }

    /// Applies a partial update under the strict lifecycle.
    pub async fn update(
        &self,
        id: &str,
        changes: UpdateWorkOrder,
        deadline: Deadline,
    ) -> EngineResult<WorkOrderDetails> {
        changes.validate()?;
        let changes = &changes;

        self.ctx
            .run("work_order.update", deadline, move || self.update_once(id, changes))
            .await
    }

    async fn update_once(&self, id: &str, changes: &UpdateWorkOrder) -> EngineResult<WorkOrderDetails> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        if !WorkOrderRepository::lock(&mut tx, id).await? {
            return Err(EngineError::not_found("WorkOrder", id));
        }
        let mut order = WorkOrderRepository::find(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("WorkOrder", id))?;
        let previous = order.status;

        if let Some(to) = changes.status {
            validate_transition(order.status, to)?;
            apply_transition(&mut order, to, now);
        }

        if let Some(discount) = changes.discount_cents {
            order.discount_cents = discount;
        }
        if let Some(tax) = changes.tax_cents {
            order.tax_cents = tax;
        }
        if let Some(notes) = &changes.notes {
            order.notes = Some(notes.clone());
        }
        if let Some(text) = &changes.special_instructions {
            order.special_instructions = Some(text.clone());
        }
        if let Some(cashier_id) = &changes.cashier_id {
            order.cashier_id = Some(cashier_id.clone());
        }
        if let Some(shift_id) = &changes.shift_id {
            if order.shift_id.as_deref() != Some(shift_id.as_str()) {
                require_active_shift(&mut tx, shift_id).await?;
            }
            order.shift_id = Some(shift_id.clone());
        }

        let total = compute_total(order.subtotal(), order.discount(), order.tax())?;
        order.total_cents = total.cents();
        order.updated_at = now;

        if !WorkOrderRepository::update(&mut tx, &order).await? {
            return Err(EngineError::not_found("WorkOrder", id));
        }
        let items = WorkOrderRepository::find_items(&mut tx, id).await?;

        tx.commit().await?;

        if previous != order.status {
            info!(id = %id, from = %previous, to = %order.status, "Work order status changed");
        } else {
            debug!(id = %id, total = %total, "Work order updated");
        }

        Ok(WorkOrderDetails { order, items })
    }

    /// Soft-deletes an order. Orders with completed payments are kept.
    pub async fn delete(&self, id: &str, deadline: Deadline) -> EngineResult<()> {
        self.ctx
            .run("work_order.delete", deadline, move || self.delete_once(id))
            .await
    }

    async fn delete_once(&self, id: &str) -> EngineResult<()> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.db.begin().await?;

        if !WorkOrderRepository::lock(&mut tx, id).await? {
            return Err(EngineError::not_found("WorkOrder", id));
        }

        let paid = PaymentRepository::sum_completed_for_order(&mut tx, id).await?;
        if paid > 0 {
            return Err(EngineError::OrderHasPayments(id.to_string()));
        }

        WorkOrderRepository::soft_delete(&mut tx, id, now).await?;
        tx.commit().await?;

        info!(id = %id, "Work order deleted");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, id: &str, deadline: Deadline) -> EngineResult<WorkOrderDetails> {
        let repo = self.ctx.db.work_orders();
        self.ctx
            .read("work_order.get", deadline, repo.get_details(id))
            .await?
            .ok_or_else(|| EngineError::not_found("WorkOrder", id))
    }

    /// Live orders, newest first.
    pub async fn list(&self, request: PageRequest, deadline: Deadline) -> EngineResult<Page<WorkOrder>> {
        let request = self.ctx.check_page(request)?;
        let repo = self.ctx.db.work_orders();
        self.ctx.read("work_order.list", deadline, repo.list(request)).await
    }

    /// Live orders in one status, newest first.
    pub async fn list_by_status(
        &self,
        status: WorkOrderStatus,
        request: PageRequest,
        deadline: Deadline,
    ) -> EngineResult<Page<WorkOrder>> {
        let request = self.ctx.check_page(request)?;
        let repo = self.ctx.db.work_orders();
        self.ctx
            .read("work_order.list_by_status", deadline, repo.list_by_status(status, request))
            .await
    }

    /// Orders attributed to a shift, each with its items.
    pub async fn list_by_shift(
        &self,
        shift_id: &str,
        deadline: Deadline,
    ) -> EngineResult<Vec<WorkOrderDetails>> {
        let repo = self.ctx.db.work_orders();
        self.ctx
            .read("work_order.list_by_shift", deadline, repo.list_by_shift(shift_id))
            .await
    }

    /// Σ completed payments against the order.
    pub async fn amount_paid(&self, id: &str, deadline: Deadline) -> EngineResult<Money> {
        let repo = self.ctx.db.payments();
        let cents = self
            .ctx
            .read("work_order.amount_paid", deadline, repo.total_completed_for_order(id))
            .await?;
        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
