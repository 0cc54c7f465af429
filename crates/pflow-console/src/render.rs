//! Plain-text rendering of console output.

use std::fmt::Write;

use pflow_core::WorkOrder;
use pflow_queries::{FlowOption, StatusChange};

pub fn flow_table(options: &[FlowOption]) -> String {
    if options.is_empty() {
        return "No flows defined\n".to_string();
    }

    let mut out = String::new();
    for option in options {
        let _ = writeln!(out, "{:<24} {}", option.value.as_str(), option.label);
    }
    out
}

/// One line per order; failed orders are marked as retryable
pub fn work_order_table(orders: &[WorkOrder]) -> String {
    if orders.is_empty() {
        return "No work orders\n".to_string();
    }

    let mut out = String::new();
    for order in orders {
        let marker = if order.status.can_retry() { "  [retry available]" } else { "" };
        let assignee = if order.assignee.is_empty() { "-" } else { order.assignee.as_str() };
        let _ = writeln!(
            out,
            "{:<24} {:<9} {:<16} {:<12} {}{}",
            order.id.as_str(),
            order.status.as_str(),
            order.flow_id.as_str(),
            assignee,
            order.title,
            marker
        );
    }
    out
}

pub fn status_change(change: &StatusChange) -> String {
    match change.from {
        Some(from) => format!("{}: {} -> {}", change.id, from, change.to),
        None => format!("{}: {}", change.id, change.to),
    }
}
