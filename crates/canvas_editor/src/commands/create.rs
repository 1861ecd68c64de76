use async_trait::async_trait;
use tracing::debug;

use canvas_common::SceneObject;

use super::{Command, CommandContext, place, unplace};
use crate::CommandError;

/// Adds a new object to the scene and creates it in the store.
#[derive(Debug)]
pub struct CreateCommand {
    object: SceneObject,
}

impl CreateCommand {
    pub fn new(object: impl Into<SceneObject>) -> Self {
        Self {
            object: object.into(),
        }
    }

    pub fn object(&self) -> &SceneObject {
        &self.object
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for CreateCommand {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        place(ctx, &self.object, None).await?;
        debug!("[CreateCommand] Created {} {:?}", self.object.kind(), self.object.api_id());
        Ok(())
    }

    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        unplace(ctx, &self.object).await?;
        Ok(())
    }

    fn label(&self) -> String {
        format!("Create {} '{}'", self.object.kind(), self.object.display_name())
    }
}
