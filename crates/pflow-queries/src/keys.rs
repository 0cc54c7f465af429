//! Cache keys owned by the query modules.

use pflow_cache::QueryKey;

pub const FLOWS: &str = "flows";
pub const WORK_ORDERS: &str = "workorders";

/// `["flows"]`
pub fn flows() -> QueryKey {
    QueryKey::new([FLOWS])
}

/// `["workorders"]`
pub fn work_orders() -> QueryKey {
    QueryKey::new([WORK_ORDERS])
}
