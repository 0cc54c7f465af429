//! Shared helpers for the pflow end-to-end scenarios.

use std::time::Duration;

use serde_json::{json, Value};

/// How long a scenario waits for background fetches against a live server
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(5);

/// Polls `condition` on the tokio clock until it holds or [`SCENARIO_TIMEOUT`] elapses.
///
/// Returns whether the condition was met.
pub async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    tokio::time::timeout(SCENARIO_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// A work order as the engine serializes it, on flow `f1`
pub fn work_order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "flowId": "f1",
        "title": "demo",
        "assignee": "",
        "status": status,
        "payload": {},
        "metadata": {},
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-01T10:00:00Z"
    })
}
