//! Observation of engine-driven status transitions.
//!
//! The console never sets a work-order status. It only sees successive
//! snapshots of the list, and [`StatusTracker`] turns those into transitions.

use std::collections::HashMap;

use pflow_core::{WorkOrder, WorkOrderId, WorkOrderStatus};
use serde::Serialize;

/// A status observed to differ from the previous snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: WorkOrderId,
    /// `None` the first time the order is seen
    pub from: Option<WorkOrderStatus>,
    pub to: WorkOrderStatus,
}

#[derive(Debug, Default)]
pub struct StatusTracker {
    last_seen: HashMap<WorkOrderId, WorkOrderStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `orders` against the previous snapshot, in list order.
    ///
    /// Orders missing from `orders` are forgotten.
    pub fn observe(&mut self, orders: &[WorkOrder]) -> Vec<StatusChange> {
        let mut previous = std::mem::take(&mut self.last_seen);
        let mut changes = Vec::new();

        for order in orders {
            let from = previous.remove(&order.id);
            if from != Some(order.status) {
                changes.push(StatusChange {
                    id: order.id.clone(),
                    from,
                    to: order.status,
                });
            }
            self.last_seen.insert(order.id.clone(), order.status);
        }
        changes
    }

    /// Last observed status of `id`
    pub fn status(&self, id: &WorkOrderId) -> Option<WorkOrderStatus> {
        self.last_seen.get(id).copied()
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
