//! Closed attribute tables, one per entity kind.
//!
//! The tables are the only way to address an attribute by name. Anything
//! not listed here cannot be changed through the command layer.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::{AttributeError, AttributeValue, EntityKind, ValueKind};

/// Typed get/set access to an entity's attribute table.
///
/// Implementations dispatch through an exhaustive `match`, so adding a
/// variant to a table without handling it is a compile error.
pub trait Attributes {
    type Attribute: Copy;

    fn get(&self, attribute: Self::Attribute) -> AttributeValue;

    /// Writes `value`, leaving the entity untouched when it is rejected.
    fn set(&mut self, attribute: Self::Attribute, value: AttributeValue)
    -> Result<(), AttributeError>;
}

macro_rules! attribute_table {
    (
        $(#[$meta:meta])*
        $table:ident for $kind:ident {
            $($variant:ident => ($wire:literal, $shape:ident),)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Hash, PartialEq, Eq, Clone, Copy, Debug)]
        pub enum $table {
            $($variant,)+
        }

        impl $table {
            pub const KIND: EntityKind = EntityKind::$kind;

            pub const ALL: &'static [$table] = &[$($table::$variant,)+];

            /// Attribute name as used by the inspector and the command layer.
            pub fn name(&self) -> &'static str {
                match self {
                    $($table::$variant => $wire,)+
                }
            }

            pub fn value_kind(&self) -> ValueKind {
                match self {
                    $($table::$variant => ValueKind::$shape,)+
                }
            }
        }

        impl FromStr for $table {
            type Err = AttributeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($table::$variant),)+
                    other => Err(AttributeError::Unknown {
                        kind: EntityKind::$kind,
                        name: other.to_string(),
                    }),
                }
            }
        }

        impl Display for $table {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$table> for AttributeKey {
            fn from(attribute: $table) -> Self {
                AttributeKey::$kind(attribute)
            }
        }
    };
}

attribute_table! {
    /// Attributes of a [`Heliostat`](crate::Heliostat).
    HeliostatAttribute for Heliostat {
        Name => ("heliostatName", OptionalText),
        Position => ("position", Vector),
        AimPoint => ("aimPoint", Vector),
        NumberOfFacets => ("numberOfFacets", Integer),
        KinematicType => ("kinematicType", Text),
    }
}

attribute_table! {
    /// Attributes of a [`Receiver`](crate::Receiver).
    ReceiverAttribute for Receiver {
        Name => ("receiverName", OptionalText),
        Position => ("position", Vector),
        RotationY => ("rotationY", Float),
        NormalVector => ("normalVector", Vector),
        TowerType => ("towerType", Text),
        PlaneE => ("planeE", Float),
        PlaneU => ("planeU", Float),
        ResolutionE => ("resolutionE", Integer),
        ResolutionU => ("resolutionU", Integer),
        CurvatureE => ("curvatureE", OptionalFloat),
        CurvatureU => ("curvatureU", OptionalFloat),
    }
}

attribute_table! {
    /// Attributes of a [`LightSource`](crate::LightSource).
    LightSourceAttribute for LightSource {
        Name => ("lightsourceName", OptionalText),
        NumberOfRays => ("numberOfRays", Integer),
        LightSourceType => ("lightSourceType", Text),
        DistributionType => ("distributionType", Text),
        DistributionMean => ("distributionMean", Float),
        DistributionCovariance => ("distributionCovariance", Float),
    }
}

/// One attribute of any entity kind.
#[derive(Serialize, Deserialize, Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum AttributeKey {
    Heliostat(HeliostatAttribute),
    Receiver(ReceiverAttribute),
    LightSource(LightSourceAttribute),
}

impl AttributeKey {
    /// Looks `name` up in the table of `kind`.
    pub fn resolve(kind: EntityKind, name: &str) -> Result<Self, AttributeError> {
        Ok(match kind {
            EntityKind::Heliostat => AttributeKey::Heliostat(name.parse()?),
            EntityKind::Receiver => AttributeKey::Receiver(name.parse()?),
            EntityKind::LightSource => AttributeKey::LightSource(name.parse()?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            AttributeKey::Heliostat(_) => EntityKind::Heliostat,
            AttributeKey::Receiver(_) => EntityKind::Receiver,
            AttributeKey::LightSource(_) => EntityKind::LightSource,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeKey::Heliostat(a) => a.name(),
            AttributeKey::Receiver(a) => a.name(),
            AttributeKey::LightSource(a) => a.name(),
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            AttributeKey::Heliostat(a) => a.value_kind(),
            AttributeKey::Receiver(a) => a.value_kind(),
            AttributeKey::LightSource(a) => a.value_kind(),
        }
    }

    /// Rejects `value` early if it cannot be stored in this attribute.
    pub fn check(&self, value: &AttributeValue) -> Result<(), AttributeError> {
        if !value.fits(self.value_kind()) {
            return Err(AttributeError::TypeMismatch {
                attribute: self.name(),
                expected: self.value_kind(),
                found: value.kind(),
            });
        }
        let in_range = match (self.value_kind(), value) {
            // integer attributes are all counts
            (ValueKind::Integer, AttributeValue::Integer(v)) => u32::try_from(*v).is_ok(),
            (_, AttributeValue::Float(v)) => v.is_finite(),
            _ => true,
        };
        if in_range {
            Ok(())
        } else {
            Err(AttributeError::OutOfRange {
                attribute: self.name(),
                value: value.to_string(),
            })
        }
    }
}

impl Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.kind(), self.name())
    }
}
