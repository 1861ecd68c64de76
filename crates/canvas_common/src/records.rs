//! Records exchanged with the backing store.
//!
//! Field names follow the store's models, so a record serializes straight
//! into a request body. Every record carries the full attribute set.

use serde::{Deserialize, Serialize};

use crate::{ApiId, EntityKind, Heliostat, LightSource, Receiver, SceneObject, Vec3};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HeliostatRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub aimpoint_x: f64,
    pub aimpoint_y: f64,
    pub aimpoint_z: f64,
    pub number_of_facets: u32,
    pub kinematic_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReceiverRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub position_z: f64,
    pub normal_x: f64,
    pub normal_y: f64,
    pub normal_z: f64,
    pub rotation_y: f64,
    #[serde(default)]
    pub curvature_e: Option<f64>,
    #[serde(default)]
    pub curvature_u: Option<f64>,
    pub plane_e: f64,
    pub plane_u: f64,
    pub resolution_e: u32,
    pub resolution_u: u32,
    pub tower_type: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LightSourceRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    pub number_of_rays: u32,
    pub lightsource_type: String,
    pub distribution_type: String,
    pub mean: f64,
    pub covariance: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SettingsRecord {
    pub shadows: bool,
    pub fog: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            shadows: true,
            fog: true,
        }
    }
}

/// A full project as served by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default)]
    pub heliostats: Vec<HeliostatRecord>,
    #[serde(default)]
    pub receivers: Vec<ReceiverRecord>,
    #[serde(default)]
    pub lightsources: Vec<LightSourceRecord>,
    #[serde(default)]
    pub settings: SettingsRecord,
}

/// A record of any entity kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum EntityRecord {
    Heliostat(HeliostatRecord),
    Receiver(ReceiverRecord),
    LightSource(LightSourceRecord),
}

impl EntityRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRecord::Heliostat(_) => EntityKind::Heliostat,
            EntityRecord::Receiver(_) => EntityKind::Receiver,
            EntityRecord::LightSource(_) => EntityKind::LightSource,
        }
    }

    pub fn id(&self) -> Option<ApiId> {
        let id = match self {
            EntityRecord::Heliostat(r) => r.id,
            EntityRecord::Receiver(r) => r.id,
            EntityRecord::LightSource(r) => r.id,
        };
        id.map(ApiId)
    }

    pub fn into_object(self) -> SceneObject {
        match self {
            EntityRecord::Heliostat(r) => Heliostat::from(r).into(),
            EntityRecord::Receiver(r) => Receiver::from(r).into(),
            EntityRecord::LightSource(r) => LightSource::from(r).into(),
        }
    }
}

// ============================================================================
// Entity <-> record conversions
// ============================================================================

impl From<&Heliostat> for HeliostatRecord {
    fn from(h: &Heliostat) -> Self {
        Self {
            id: h.api_id.map(|id| id.0),
            name: h.name.clone(),
            position_x: h.position.x,
            position_y: h.position.y,
            position_z: h.position.z,
            aimpoint_x: h.aim_point.x,
            aimpoint_y: h.aim_point.y,
            aimpoint_z: h.aim_point.z,
            number_of_facets: h.number_of_facets,
            kinematic_type: h.kinematic_type.clone(),
        }
    }
}

impl From<HeliostatRecord> for Heliostat {
    fn from(r: HeliostatRecord) -> Self {
        Self {
            name: r.name,
            api_id: r.id.map(ApiId),
            position: Vec3::new(r.position_x, r.position_y, r.position_z),
            aim_point: Vec3::new(r.aimpoint_x, r.aimpoint_y, r.aimpoint_z),
            number_of_facets: r.number_of_facets,
            kinematic_type: r.kinematic_type,
        }
    }
}

impl From<&Receiver> for ReceiverRecord {
    fn from(r: &Receiver) -> Self {
        Self {
            id: r.api_id.map(|id| id.0),
            name: r.name.clone(),
            position_x: r.position.x,
            position_y: r.position.y,
            position_z: r.position.z,
            normal_x: r.normal_vector.x,
            normal_y: r.normal_vector.y,
            normal_z: r.normal_vector.z,
            rotation_y: r.rotation_y,
            curvature_e: r.curvature_e,
            curvature_u: r.curvature_u,
            plane_e: r.plane_e,
            plane_u: r.plane_u,
            resolution_e: r.resolution_e,
            resolution_u: r.resolution_u,
            tower_type: r.tower_type.clone(),
        }
    }
}

impl From<ReceiverRecord> for Receiver {
    fn from(r: ReceiverRecord) -> Self {
        Self {
            name: r.name,
            api_id: r.id.map(ApiId),
            position: Vec3::new(r.position_x, r.position_y, r.position_z),
            rotation_y: r.rotation_y,
            normal_vector: Vec3::new(r.normal_x, r.normal_y, r.normal_z),
            tower_type: r.tower_type,
            plane_e: r.plane_e,
            plane_u: r.plane_u,
            resolution_e: r.resolution_e,
            resolution_u: r.resolution_u,
            curvature_e: r.curvature_e,
            curvature_u: r.curvature_u,
        }
    }
}

impl From<&LightSource> for LightSourceRecord {
    fn from(l: &LightSource) -> Self {
        Self {
            id: l.api_id.map(|id| id.0),
            name: l.name.clone(),
            number_of_rays: l.number_of_rays,
            lightsource_type: l.light_source_type.clone(),
            distribution_type: l.distribution_type.clone(),
            mean: l.distribution_mean,
            covariance: l.distribution_covariance,
        }
    }
}

impl From<LightSourceRecord> for LightSource {
    fn from(r: LightSourceRecord) -> Self {
        Self {
            name: r.name,
            api_id: r.id.map(ApiId),
            number_of_rays: r.number_of_rays,
            light_source_type: r.lightsource_type,
            distribution_type: r.distribution_type,
            distribution_mean: r.mean,
            distribution_covariance: r.covariance,
        }
    }
}
