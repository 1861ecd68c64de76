use async_trait::async_trait;

use canvas_common::SceneObject;

use super::{Command, CommandContext, place, unplace};
use crate::CommandError;

/// Removes an object from the scene and deletes it from the store.
///
/// Undo puts the object back where it was and creates it again, so it comes
/// back with a new id.
#[derive(Debug)]
pub struct DeleteCommand {
    object: SceneObject,
    index: Option<usize>,
}

impl DeleteCommand {
    pub fn new(object: SceneObject) -> Self {
        Self {
            object,
            index: None,
        }
    }

    pub fn object(&self) -> &SceneObject {
        &self.object
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for DeleteCommand {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        self.index = unplace(ctx, &self.object).await?;
        Ok(())
    }

    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        place(ctx, &self.object, self.index).await
    }

    fn label(&self) -> String {
        format!("Delete {} '{}'", self.object.kind(), self.object.display_name())
    }
}
