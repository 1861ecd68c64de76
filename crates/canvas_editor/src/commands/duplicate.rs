use async_trait::async_trait;

use canvas_common::SceneObject;

use super::{Command, CommandContext, place, unplace};
use crate::CommandError;

/// Creates a copy of an object. Undo deletes the copy only.
///
/// The copy is built on first execution and reused on redo, so the same
/// object comes back every time.
#[derive(Debug)]
pub struct DuplicateCommand {
    source: SceneObject,
    copy: Option<SceneObject>,
}

impl DuplicateCommand {
    pub fn new(source: SceneObject) -> Self {
        Self { source, copy: None }
    }

    pub fn source(&self) -> &SceneObject {
        &self.source
    }

    /// The copy, once the command has run.
    pub fn copy(&self) -> Option<&SceneObject> {
        self.copy.as_ref()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for DuplicateCommand {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        let copy = self
            .copy
            .get_or_insert_with(|| self.source.duplicate())
            .clone();
        place(ctx, &copy, None).await
    }

    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        if let Some(copy) = &self.copy {
            unplace(ctx, copy).await?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        format!("Duplicate {} '{}'", self.source.kind(), self.source.display_name())
    }
}
