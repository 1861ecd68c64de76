use thiserror::Error;

use crate::{EntityKind, ValueKind};

/// Errors raised while resolving or writing an entity attribute.
///
/// These indicate a programming error in the caller (an attribute name that
/// is not part of the kind's table, or a value of the wrong shape) and are
/// never swallowed by the command layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    /// The attribute name is not part of the entity kind's table.
    #[error("invalid attribute '{name}' for {kind}")]
    Unknown { kind: EntityKind, name: String },

    /// The value does not have the shape the attribute stores.
    #[error("attribute '{attribute}' expects {expected}, got {found}")]
    TypeMismatch {
        attribute: &'static str,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The value has the right shape but cannot be stored (e.g. a negative count).
    #[error("value {value} is out of range for attribute '{attribute}'")]
    OutOfRange { attribute: &'static str, value: String },
}
