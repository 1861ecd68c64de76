use serde::{Deserialize, Serialize};

use crate::{
    ApiId, AttributeError, AttributeValue, Attributes, EntityKind, HeliostatAttribute,
    LightSourceAttribute, ReceiverAttribute, SceneObject, Vec3,
};

/// Behaviour shared by every entity kind that can live in a scene.
pub trait Entity: Attributes + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn name(&self) -> Option<&str>;

    fn set_name(&mut self, name: Option<String>);

    fn api_id(&self) -> Option<ApiId>;

    fn set_api_id(&mut self, api_id: Option<ApiId>);

    /// Wraps the entity in a fresh shared handle.
    fn into_object(self) -> SceneObject;

    /// Copies every attribute except identity. The copy is unpersisted and
    /// named after the source (see [`copy_name`]).
    fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.set_api_id(None);
        copy.set_name(Some(copy_name(Self::KIND, self.name())));
        copy
    }
}

/// Name given to a duplicated entity: `<name>_Copy`, or `<Kind>_Copy` when
/// the source has no name.
pub fn copy_name(kind: EntityKind, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{name}_Copy"),
        _ => format!("{kind}_Copy"),
    }
}

// ============================================================================
// Heliostat
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Heliostat {
    pub name: Option<String>,
    pub api_id: Option<ApiId>,
    pub position: Vec3,
    pub aim_point: Vec3,
    pub number_of_facets: u32,
    pub kinematic_type: String,
}

impl Default for Heliostat {
    fn default() -> Self {
        Self {
            name: None,
            api_id: None,
            position: Vec3::ZERO,
            aim_point: Vec3::new(0.0, 50.0, 0.0),
            number_of_facets: 4,
            kinematic_type: "ideal".to_string(),
        }
    }
}

impl Heliostat {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Attributes for Heliostat {
    type Attribute = HeliostatAttribute;

    fn get(&self, attribute: HeliostatAttribute) -> AttributeValue {
        match attribute {
            HeliostatAttribute::Name => self.name.clone().into(),
            HeliostatAttribute::Position => self.position.into(),
            HeliostatAttribute::AimPoint => self.aim_point.into(),
            HeliostatAttribute::NumberOfFacets => self.number_of_facets.into(),
            HeliostatAttribute::KinematicType => self.kinematic_type.clone().into(),
        }
    }

    fn set(
        &mut self,
        attribute: HeliostatAttribute,
        value: AttributeValue,
    ) -> Result<(), AttributeError> {
        let name = attribute.name();
        match attribute {
            HeliostatAttribute::Name => self.name = value.into_optional_text(name)?,
            HeliostatAttribute::Position => self.position = value.into_vector(name)?,
            HeliostatAttribute::AimPoint => self.aim_point = value.into_vector(name)?,
            HeliostatAttribute::NumberOfFacets => self.number_of_facets = value.into_count(name)?,
            HeliostatAttribute::KinematicType => self.kinematic_type = value.into_text(name)?,
        }
        Ok(())
    }
}

impl Entity for Heliostat {
    const KIND: EntityKind = EntityKind::Heliostat;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    fn api_id(&self) -> Option<ApiId> {
        self.api_id
    }

    fn set_api_id(&mut self, api_id: Option<ApiId>) {
        self.api_id = api_id;
    }

    fn into_object(self) -> SceneObject {
        SceneObject::from(self)
    }
}

// ============================================================================
// Receiver
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Receiver {
    pub name: Option<String>,
    pub api_id: Option<ApiId>,
    pub position: Vec3,
    pub rotation_y: f64,
    pub normal_vector: Vec3,
    pub tower_type: String,
    pub plane_e: f64,
    pub plane_u: f64,
    pub resolution_e: u32,
    pub resolution_u: u32,
    pub curvature_e: Option<f64>,
    pub curvature_u: Option<f64>,
}

impl Default for Receiver {
    fn default() -> Self {
        Self {
            name: None,
            api_id: None,
            position: Vec3::ZERO,
            rotation_y: 0.0,
            normal_vector: Vec3::new(0.0, 1.0, 0.0),
            tower_type: "round".to_string(),
            plane_e: 8.629666667,
            plane_u: 7.0,
            resolution_e: 256,
            resolution_u: 256,
            curvature_e: None,
            curvature_u: None,
        }
    }
}

impl Receiver {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Attributes for Receiver {
    type Attribute = ReceiverAttribute;

    fn get(&self, attribute: ReceiverAttribute) -> AttributeValue {
        match attribute {
            ReceiverAttribute::Name => self.name.clone().into(),
            ReceiverAttribute::Position => self.position.into(),
            ReceiverAttribute::RotationY => self.rotation_y.into(),
            ReceiverAttribute::NormalVector => self.normal_vector.into(),
            ReceiverAttribute::TowerType => self.tower_type.clone().into(),
            ReceiverAttribute::PlaneE => self.plane_e.into(),
            ReceiverAttribute::PlaneU => self.plane_u.into(),
            ReceiverAttribute::ResolutionE => self.resolution_e.into(),
            ReceiverAttribute::ResolutionU => self.resolution_u.into(),
            ReceiverAttribute::CurvatureE => self.curvature_e.into(),
            ReceiverAttribute::CurvatureU => self.curvature_u.into(),
        }
    }

    fn set(
        &mut self,
        attribute: ReceiverAttribute,
        value: AttributeValue,
    ) -> Result<(), AttributeError> {
        let name = attribute.name();
        match attribute {
            ReceiverAttribute::Name => self.name = value.into_optional_text(name)?,
            ReceiverAttribute::Position => self.position = value.into_vector(name)?,
            ReceiverAttribute::RotationY => self.rotation_y = value.into_float(name)?,
            ReceiverAttribute::NormalVector => self.normal_vector = value.into_vector(name)?,
            ReceiverAttribute::TowerType => self.tower_type = value.into_text(name)?,
            ReceiverAttribute::PlaneE => self.plane_e = value.into_float(name)?,
            ReceiverAttribute::PlaneU => self.plane_u = value.into_float(name)?,
            ReceiverAttribute::ResolutionE => self.resolution_e = value.into_count(name)?,
            ReceiverAttribute::ResolutionU => self.resolution_u = value.into_count(name)?,
            ReceiverAttribute::CurvatureE => self.curvature_e = value.into_optional_float(name)?,
            ReceiverAttribute::CurvatureU => self.curvature_u = value.into_optional_float(name)?,
        }
        Ok(())
    }
}

impl Entity for Receiver {
    const KIND: EntityKind = EntityKind::Receiver;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    fn api_id(&self) -> Option<ApiId> {
        self.api_id
    }

    fn set_api_id(&mut self, api_id: Option<ApiId>) {
        self.api_id = api_id;
    }

    fn into_object(self) -> SceneObject {
        SceneObject::from(self)
    }
}

// ============================================================================
// LightSource
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LightSource {
    pub name: Option<String>,
    pub api_id: Option<ApiId>,
    pub number_of_rays: u32,
    pub light_source_type: String,
    pub distribution_type: String,
    pub distribution_mean: f64,
    pub distribution_covariance: f64,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            name: None,
            api_id: None,
            number_of_rays: 100,
            light_source_type: "sun".to_string(),
            distribution_type: "normal".to_string(),
            distribution_mean: 0.0,
            distribution_covariance: 4.3681e-06,
        }
    }
}

impl LightSource {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Attributes for LightSource {
    type Attribute = LightSourceAttribute;

    fn get(&self, attribute: LightSourceAttribute) -> AttributeValue {
        match attribute {
            LightSourceAttribute::Name => self.name.clone().into(),
            LightSourceAttribute::NumberOfRays => self.number_of_rays.into(),
            LightSourceAttribute::LightSourceType => self.light_source_type.clone().into(),
            LightSourceAttribute::DistributionType => self.distribution_type.clone().into(),
            LightSourceAttribute::DistributionMean => self.distribution_mean.into(),
            LightSourceAttribute::DistributionCovariance => self.distribution_covariance.into(),
        }
    }

    fn set(
        &mut self,
        attribute: LightSourceAttribute,
        value: AttributeValue,
    ) -> Result<(), AttributeError> {
        let name = attribute.name();
        match attribute {
            LightSourceAttribute::Name => self.name = value.into_optional_text(name)?,
            LightSourceAttribute::NumberOfRays => self.number_of_rays = value.into_count(name)?,
            LightSourceAttribute::LightSourceType => {
                self.light_source_type = value.into_text(name)?
            }
            LightSourceAttribute::DistributionType => {
                self.distribution_type = value.into_text(name)?
            }
            LightSourceAttribute::DistributionMean => {
                self.distribution_mean = value.into_float(name)?
            }
            LightSourceAttribute::DistributionCovariance => {
                self.distribution_covariance = value.into_float(name)?
            }
        }
        Ok(())
    }
}

impl Entity for LightSource {
    const KIND: EntityKind = EntityKind::LightSource;

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    fn api_id(&self) -> Option<ApiId> {
        self.api_id
    }

    fn set_api_id(&mut self, api_id: Option<ApiId>) {
        self.api_id = api_id;
    }

    fn into_object(self) -> SceneObject {
        SceneObject::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_store_model() {
        let heliostat = Heliostat::default();
        assert_eq!(heliostat.number_of_facets, 4);
        assert_eq!(heliostat.kinematic_type, "ideal");
        assert_eq!(heliostat.aim_point, Vec3::new(0.0, 50.0, 0.0));

        let receiver = Receiver::default();
        assert_eq!(receiver.normal_vector, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(receiver.resolution_e, 256);
        assert_eq!(receiver.curvature_e, None);

        let light = LightSource::default();
        assert_eq!(light.number_of_rays, 100);
        assert_eq!(light.distribution_covariance, 4.3681e-06);
    }

    #[test]
    fn test_every_attribute_reads_back_what_was_written() {
        let mut heliostat = Heliostat::default();
        for attribute in HeliostatAttribute::ALL {
            let value = heliostat.get(*attribute);
            heliostat.set(*attribute, value.clone()).unwrap();
            assert_eq!(heliostat.get(*attribute), value);
        }

        let mut receiver = Receiver::default();
        receiver.set(ReceiverAttribute::CurvatureE, 0.5.into()).unwrap();
        assert_eq!(receiver.get(ReceiverAttribute::CurvatureE), AttributeValue::Float(0.5));
        receiver.set(ReceiverAttribute::CurvatureE, AttributeValue::Unset).unwrap();
        assert_eq!(receiver.curvature_e, None);
    }

    #[test]
    fn test_rejected_write_leaves_entity_untouched() {
        let mut light = LightSource::default();
        let before = light.clone();
        assert!(light.set(LightSourceAttribute::NumberOfRays, (-5).into()).is_err());
        assert!(light.set(LightSourceAttribute::DistributionMean, "high".into()).is_err());
        assert_eq!(light, before);
    }

    #[test]
    fn test_read_value_does_not_alias_entity() {
        let mut heliostat = Heliostat::at(Vec3::new(1.0, 2.0, 3.0));
        let snapshot = heliostat.get(HeliostatAttribute::Position);
        heliostat.position.x = 99.0;
        assert_eq!(snapshot, AttributeValue::Vector(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_duplicate_names() {
        assert_eq!(Heliostat::default().duplicate().name(), Some("Heliostat_Copy"));
        assert_eq!(
            Heliostat::default().with_name("").duplicate().name(),
            Some("Heliostat_Copy")
        );
        assert_eq!(Heliostat::default().with_name("H1").duplicate().name(), Some("H1_Copy"));
        assert_eq!(Receiver::default().duplicate().name(), Some("Receiver_Copy"));
        assert_eq!(LightSource::default().duplicate().name(), Some("LightSource_Copy"));
    }

    #[test]
    fn test_duplicate_drops_identity_only() {
        let mut source = Receiver::at(Vec3::new(5.0, 10.0, 0.0)).with_name("R");
        source.api_id = Some(ApiId(7));
        source.plane_u = 3.5;
        let copy = source.duplicate();
        assert_eq!(copy.api_id, None);
        assert_eq!(copy.position, source.position);
        assert_eq!(copy.plane_u, 3.5);
    }
}
