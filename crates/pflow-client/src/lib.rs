//! pflow Client
//!
//! Typed HTTP access to the remote engine's `/flows` and `/workorders`
//! resources. [`HttpRemoteClient`] implements the `pflow-core` API traits;
//! every non-2xx response becomes a [`ClientError::Status`](pflow_core::ClientError).

pub mod config;
pub mod http_client;

pub use config::HttpClientConfig;
pub use http_client::HttpRemoteClient;
