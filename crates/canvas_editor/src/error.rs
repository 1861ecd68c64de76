use thiserror::Error;

use canvas_common::AttributeError;
use canvas_sync::GatewayError;

/// Error type for command execution and history operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// The command addressed an attribute that does not exist or cannot hold the value
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(#[from] AttributeError),

    /// The store rejected the change and the sync policy asked for it to be reported
    #[error("Persistence failed: {0}")]
    Persistence(#[from] GatewayError),

    /// Another history operation is still in flight
    #[error("Command history busy")]
    Busy,
}
