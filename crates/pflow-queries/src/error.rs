use pflow_core::{ClientError, ValidationError};
use thiserror::Error;

/// Why a form submission did not produce an entity
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Rejected at the form boundary; no request was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
