//! Entity types mirrored from the remote engine.
//!
//! The engine owns every entity; these are cached copies that the console
//! never writes locally.

use std::collections::BTreeMap;

pub mod flow;
pub mod work_order;

/// Free-form string metadata attached to flows and work orders
pub type Metadata = BTreeMap<String, String>;
