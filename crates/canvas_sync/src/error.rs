use thiserror::Error;

use canvas_common::{ApiId, EntityKind};

/// Error type for gateway operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The store has no entity of this kind with this id
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: ApiId },

    /// The store refused the request
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<bincode::error::EncodeError> for GatewayError {
    fn from(err: bincode::error::EncodeError) -> Self {
        GatewayError::Codec(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for GatewayError {
    fn from(err: bincode::error::DecodeError) -> Self {
        GatewayError::Codec(err.to_string())
    }
}
