use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{AttributeError, Vec3};

/// A typed attribute value.
///
/// Values are always owned. Reading an attribute produces a fresh copy, so a
/// snapshot taken before a mutation never observes the mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Vector(Vec3),
    Text(String),
    /// Marks an optional attribute (name, curvature) as not set.
    Unset,
}

/// Shape of an [`AttributeValue`], used in error reports.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    Vector,
    Text,
    Unset,
    OptionalFloat,
    OptionalText,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Integer => "an integer",
            ValueKind::Float => "a number",
            ValueKind::Vector => "a vector",
            ValueKind::Text => "text",
            ValueKind::Unset => "nothing",
            ValueKind::OptionalFloat => "an optional number",
            ValueKind::OptionalText => "optional text",
        };
        f.write_str(name)
    }
}

impl AttributeValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Integer(_) => ValueKind::Integer,
            AttributeValue::Float(_) => ValueKind::Float,
            AttributeValue::Vector(_) => ValueKind::Vector,
            AttributeValue::Text(_) => ValueKind::Text,
            AttributeValue::Unset => ValueKind::Unset,
        }
    }

    /// Whether a value of this shape can be written to an attribute of `expected` shape.
    pub fn fits(&self, expected: ValueKind) -> bool {
        matches!(
            (expected, self),
            (ValueKind::Integer, AttributeValue::Integer(_))
                | (ValueKind::Float, AttributeValue::Float(_) | AttributeValue::Integer(_))
                | (ValueKind::Vector, AttributeValue::Vector(_))
                | (ValueKind::Text, AttributeValue::Text(_))
                | (ValueKind::Unset, AttributeValue::Unset)
                | (
                    ValueKind::OptionalFloat,
                    AttributeValue::Float(_) | AttributeValue::Integer(_) | AttributeValue::Unset
                )
                | (ValueKind::OptionalText, AttributeValue::Text(_) | AttributeValue::Unset)
        )
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            AttributeValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v),
            _ => None,
        }
    }

    fn mismatch(&self, attribute: &'static str, expected: ValueKind) -> AttributeError {
        AttributeError::TypeMismatch {
            attribute,
            expected,
            found: self.kind(),
        }
    }

    pub(crate) fn into_count(self, attribute: &'static str) -> Result<u32, AttributeError> {
        match self {
            AttributeValue::Integer(v) => u32::try_from(v).map_err(|_| AttributeError::OutOfRange {
                attribute,
                value: v.to_string(),
            }),
            other => Err(other.mismatch(attribute, ValueKind::Integer)),
        }
    }

    pub(crate) fn into_float(self, attribute: &'static str) -> Result<f64, AttributeError> {
        match self.as_float() {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(AttributeError::OutOfRange {
                attribute,
                value: v.to_string(),
            }),
            None => Err(self.mismatch(attribute, ValueKind::Float)),
        }
    }

    pub(crate) fn into_optional_float(
        self,
        attribute: &'static str,
    ) -> Result<Option<f64>, AttributeError> {
        match self {
            AttributeValue::Unset => Ok(None),
            AttributeValue::Float(_) | AttributeValue::Integer(_) => {
                self.into_float(attribute).map(Some)
            }
            other => Err(other.mismatch(attribute, ValueKind::OptionalFloat)),
        }
    }

    pub(crate) fn into_vector(self, attribute: &'static str) -> Result<Vec3, AttributeError> {
        match self {
            AttributeValue::Vector(v) => Ok(v),
            other => Err(other.mismatch(attribute, ValueKind::Vector)),
        }
    }

    pub(crate) fn into_text(self, attribute: &'static str) -> Result<String, AttributeError> {
        match self {
            AttributeValue::Text(v) => Ok(v),
            other => Err(other.mismatch(attribute, ValueKind::Text)),
        }
    }

    pub(crate) fn into_optional_text(
        self,
        attribute: &'static str,
    ) -> Result<Option<String>, AttributeError> {
        match self {
            AttributeValue::Text(v) => Ok(Some(v)),
            AttributeValue::Unset => Ok(None),
            other => Err(other.mismatch(attribute, ValueKind::OptionalText)),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Vector(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => write!(f, "{v:?}"),
            AttributeValue::Unset => f.write_str("<unset>"),
        }
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(value.into())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Integer(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<Vec3> for AttributeValue {
    fn from(value: Vec3) -> Self {
        AttributeValue::Vector(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<Option<f64>> for AttributeValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AttributeValue::Unset, AttributeValue::Float)
    }
}

impl From<Option<String>> for AttributeValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(AttributeValue::Unset, AttributeValue::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_literal_converts() {
        let value: AttributeValue = 8.into();
        assert_eq!(value, AttributeValue::Integer(8));
    }

    #[test]
    fn test_float_slot_accepts_integer() {
        let value = AttributeValue::Integer(3);
        assert!(value.fits(ValueKind::Float));
        assert_eq!(value.into_float("planeE").unwrap(), 3.0);
    }

    #[test]
    fn test_negative_count_is_out_of_range() {
        let err = AttributeValue::Integer(-1).into_count("numberOfFacets").unwrap_err();
        assert!(matches!(err, AttributeError::OutOfRange { attribute: "numberOfFacets", .. }));
    }

    #[test]
    fn test_optional_text_accepts_unset() {
        assert_eq!(AttributeValue::Unset.into_optional_text("heliostatName").unwrap(), None);
        let err = AttributeValue::Float(1.0).into_optional_text("heliostatName").unwrap_err();
        assert_eq!(
            err,
            AttributeError::TypeMismatch {
                attribute: "heliostatName",
                expected: ValueKind::OptionalText,
                found: ValueKind::Float,
            }
        );
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = AttributeValue::Float(f64::NAN).into_float("rotationY").unwrap_err();
        assert!(matches!(err, AttributeError::OutOfRange { .. }));
    }
}
