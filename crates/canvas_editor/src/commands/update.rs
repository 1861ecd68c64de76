use async_trait::async_trait;

use canvas_common::{AttributeKey, AttributeValue, SceneObject};

use super::{Command, CommandContext};
use crate::{CommandError, SceneEvent};

/// Changes a single attribute of an object.
///
/// The attribute is resolved and the new value validated when the command is
/// built, so an invalid command never reaches the history. The previous
/// value is captured at the same time.
#[derive(Debug)]
pub struct UpdateAttributeCommand {
    target: SceneObject,
    attribute: AttributeKey,
    old_value: AttributeValue,
    new_value: AttributeValue,
}

impl UpdateAttributeCommand {
    /// Looks `attribute` up in the table of the target's kind.
    pub fn new(
        target: SceneObject,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, CommandError> {
        let attribute = target.resolve(attribute)?;
        Self::with_key(target, attribute, value)
    }

    pub fn with_key(
        target: SceneObject,
        attribute: impl Into<AttributeKey>,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, CommandError> {
        let attribute = attribute.into();
        let new_value = value.into();
        attribute.check(&new_value)?;
        let old_value = target.get(attribute)?;
        Ok(Self {
            target,
            attribute,
            old_value,
            new_value,
        })
    }

    pub fn target(&self) -> &SceneObject {
        &self.target
    }

    pub fn attribute(&self) -> AttributeKey {
        self.attribute
    }

    pub fn old_value(&self) -> &AttributeValue {
        &self.old_value
    }

    pub fn new_value(&self) -> &AttributeValue {
        &self.new_value
    }

    async fn apply(
        &self,
        ctx: &CommandContext<'_>,
        value: &AttributeValue,
        previous: &AttributeValue,
    ) -> Result<(), CommandError> {
        self.target.set(self.attribute, value.clone())?;
        if let Err(err) = ctx.persistence.update(&self.target).await {
            self.target.set(self.attribute, previous.clone())?;
            return Err(err.into());
        }
        ctx.events.publish(SceneEvent::ItemUpdated {
            item: self.target.clone(),
        });
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for UpdateAttributeCommand {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        self.apply(ctx, &self.new_value, &self.old_value).await
    }

    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        self.apply(ctx, &self.old_value, &self.new_value).await
    }

    fn label(&self) -> String {
        format!(
            "Set {} of '{}' to {}",
            self.attribute.name(),
            self.target.display_name(),
            self.new_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Fixture;
    use canvas_common::{
        AttributeError, EntityKind, Heliostat, HeliostatAttribute, Receiver, Vec3,
    };
    use canvas_sync::{GatewayError, GatewayOp, SyncPolicy};
    use futures_lite::future::block_on;

    #[test]
    fn test_unknown_attribute_fails_before_mutation() {
        let object = SceneObject::from(Heliostat::default());
        let before = object.to_record();
        let err = UpdateAttributeCommand::new(object.clone(), "bogusField", 1).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidAttribute(AttributeError::Unknown { kind: EntityKind::Heliostat, .. })
        ));
        assert_eq!(object.to_record(), before);
    }

    #[test]
    fn test_wrong_shape_fails_at_construction() {
        let object = SceneObject::from(Heliostat::default());
        let err = UpdateAttributeCommand::new(object, "position", "up").unwrap_err();
        assert!(matches!(err, CommandError::InvalidAttribute(AttributeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_old_value_is_a_snapshot() {
        let object = SceneObject::from(Receiver::at(Vec3::new(0.0, 50.0, 0.0)));
        let command =
            UpdateAttributeCommand::new(object.clone(), "position", Vec3::new(1.0, 1.0, 1.0))
                .unwrap();
        object.set(command.attribute(), Vec3::new(9.0, 9.0, 9.0).into()).unwrap();
        assert_eq!(command.old_value(), &AttributeValue::Vector(Vec3::new(0.0, 50.0, 0.0)));
    }

    #[test]
    fn test_execute_and_undo_send_full_records() {
        let fixture = Fixture::new(SyncPolicy::Optimistic);
        let object = SceneObject::from(Heliostat::default());
        block_on(fixture.persistence.create(&object)).unwrap();
        let id = object.api_id().unwrap();
        let mut command =
            UpdateAttributeCommand::with_key(object.clone(), HeliostatAttribute::NumberOfFacets, 8)
                .unwrap();

        block_on(command.execute(&fixture.ctx())).unwrap();
        assert_eq!(fixture.gateway.heliostat(id).unwrap().number_of_facets, 8);
        block_on(command.undo(&fixture.ctx())).unwrap();
        let stored = fixture.gateway.heliostat(id).unwrap();
        assert_eq!(stored.number_of_facets, 4);
        assert_eq!(stored.kinematic_type, "ideal");
        assert_eq!(fixture.gateway.call_count(EntityKind::Heliostat, GatewayOp::Update), 2);
    }

    #[test]
    fn test_optimistic_failure_keeps_local_change() {
        let fixture = Fixture::new(SyncPolicy::Optimistic);
        let object = SceneObject::from(Heliostat::default());
        block_on(fixture.persistence.create(&object)).unwrap();
        fixture.gateway.set_offline(true);
        let mut command = UpdateAttributeCommand::new(object.clone(), "kinematicType", "rigid").unwrap();

        block_on(command.execute(&fixture.ctx())).unwrap();
        assert_eq!(object.get_named("kinematicType").unwrap(), AttributeValue::from("rigid"));
    }

    #[test]
    fn test_write_through_failure_rolls_back() {
        let fixture = Fixture::new(SyncPolicy::WriteThrough);
        let events = fixture.events.subscribe();
        let object = SceneObject::from(Heliostat::default());
        block_on(fixture.persistence.create(&object)).unwrap();
        fixture.gateway.fail_next(GatewayError::Rejected {
            status: 400,
            message: "invalid".into(),
        });
        let mut command = UpdateAttributeCommand::new(object.clone(), "numberOfFacets", 8).unwrap();

        assert!(block_on(command.execute(&fixture.ctx())).is_err());
        assert_eq!(object.get_named("numberOfFacets").unwrap(), AttributeValue::Integer(4));
        assert!(events.try_next().is_none());
    }

    #[test]
    fn test_unpersisted_target_updates_locally_only() {
        let fixture = Fixture::new(SyncPolicy::WriteThrough);
        let object = SceneObject::from(Heliostat::default());
        let mut command = UpdateAttributeCommand::new(object.clone(), "heliostatName", "H7").unwrap();
        block_on(command.execute(&fixture.ctx())).unwrap();
        assert_eq!(object.name().as_deref(), Some("H7"));
        assert!(fixture.gateway.calls().is_empty());
    }
}
