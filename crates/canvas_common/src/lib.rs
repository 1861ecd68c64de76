//! Shared data model for the heliostat field editor.
//!
//! Everything the command layer and the persistence layer agree on lives
//! here: the three entity kinds, their closed attribute tables, typed
//! attribute values, the shared entity handle used by the scene, and the
//! serde records exchanged with the backing store.

pub mod attributes;
pub use attributes::*;

pub mod entities;
pub use entities::*;

pub mod error;
pub use error::AttributeError;

pub mod object;
pub use object::SceneObject;

pub mod records;
pub use records::*;

pub mod value;
pub use value::{AttributeValue, ValueKind};

use serde::{Deserialize, Serialize};

use std::fmt::Display;

#[derive(Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
#[serde(transparent)]
/// An [`ApiId`] is the identifier the remote store assigned to a persisted entity.
pub struct ApiId(pub u64);

impl Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plain three component vector used for positions, aim points and normals.
#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// The kinds of entity that can be placed in a scene.
#[derive(Serialize, Deserialize, Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum EntityKind {
    Heliostat,
    Receiver,
    LightSource,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Heliostat,
        EntityKind::Receiver,
        EntityKind::LightSource,
    ];

    /// Display name of the kind, also used as the base of generated copy names.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Heliostat => "Heliostat",
            EntityKind::Receiver => "Receiver",
            EntityKind::LightSource => "LightSource",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
