//! # Work Order Lifecycle
//!
//! The status state machine and the timestamps it stamps.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pending ──► confirmed ──► in_progress ──► ready ──► completed         │
//! │     │            │              │            │        (terminal)        │
//! │     └────────────┴──────────────┴────────────┴──► cancelled            │
//! │                                                   (terminal)            │
//! │                                                                         │
//! │  Payment ledger: any non-terminal ──► completed  (fully paid)          │
//! │                                                                         │
//! │  Stamps:  confirmed → confirmed_at                                      │
//! │           in_progress → started_at                                      │
//! │           completed → completed_at                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{WorkOrder, WorkOrderStatus};

impl WorkOrderStatus {
    /// Completed and cancelled orders accept no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// The forward step in the fulfillment pipeline, if any.
    pub const fn next(&self) -> Option<WorkOrderStatus> {
        match self {
            WorkOrderStatus::Pending => Some(WorkOrderStatus::Confirmed),
            WorkOrderStatus::Confirmed => Some(WorkOrderStatus::InProgress),
            WorkOrderStatus::InProgress => Some(WorkOrderStatus::Ready),
            WorkOrderStatus::Ready => Some(WorkOrderStatus::Completed),
            WorkOrderStatus::Completed | WorkOrderStatus::Cancelled => None,
        }
    }

    /// Whether an explicit status update may move from `self` to `to`.
    pub fn can_transition_to(&self, to: WorkOrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == WorkOrderStatus::Cancelled || self.next() == Some(to)
    }
}

/// Checks an explicit status change requested by a caller.
///
/// Re-submitting the current status is accepted as a no-op.
pub fn validate_transition(from: WorkOrderStatus, to: WorkOrderStatus) -> CoreResult<()> {
    if from == to || from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidStatusTransition { from, to })
    }
}

/// Moves `order` to `to`, stamping the matching timestamp.
///
/// Does nothing if the order is already in `to`, so stamps are never
/// overwritten by a repeated update.
pub fn apply_transition(order: &mut WorkOrder, to: WorkOrderStatus, now: DateTime<Utc>) {
    if order.status == to {
        return;
    }

    match to {
        WorkOrderStatus::Confirmed => order.confirmed_at = Some(now),
        WorkOrderStatus::InProgress => order.started_at = Some(now),
        WorkOrderStatus::Completed => order.completed_at = Some(now),
        _ => {}
    }

    order.status = to;
    order.updated_at = now;
}

// =============================================================================
// Unit Tests
// =============================================================================
