//! Reversible scene mutations.
//!
//! Every change to the scene is a [`Command`]. Commands are run by the
//! [`UndoRedoHandler`](crate::UndoRedoHandler), which calls
//! [`Command::execute`] once per push and [`Command::undo`] to reverse it.
//! After each change a command persists the full record of the touched
//! object and publishes a [`SceneEvent`].

use std::fmt::Debug;

use async_trait::async_trait;
use tracing::warn;

use canvas_common::SceneObject;
use canvas_sync::Persistence;

use crate::{CommandError, EventBus, Scene, SceneEvent};

mod batch;
mod create;
mod delete;
mod duplicate;
mod update;

pub use batch::BatchCommand;
pub use create::CreateCommand;
pub use delete::DeleteCommand;
pub use duplicate::DuplicateCommand;
pub use update::UpdateAttributeCommand;

/// The collaborators a command acts on.
#[derive(Clone, Copy, Debug)]
pub struct CommandContext<'a> {
    pub scene: &'a Scene,
    pub persistence: &'a Persistence,
    pub events: &'a EventBus,
}

/// A reversible unit of mutation.
///
/// `execute` and `undo` settle only once persistence has settled. When they
/// fail, the scene must be left as it was before the call.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Command: Send + Sync + Debug {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError>;

    /// Reverses the most recent `execute`.
    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError>;

    /// Human readable description for history menus and logs.
    fn label(&self) -> String;
}

/// Adds `object` to the scene at `index` (appending when `None`), creates
/// it in the store and announces it.
pub(crate) async fn place(
    ctx: &CommandContext<'_>,
    object: &SceneObject,
    index: Option<usize>,
) -> Result<(), CommandError> {
    match index {
        Some(index) => ctx.scene.insert(index, object.clone()),
        None => ctx.scene.add(object.clone()),
    };
    if let Err(err) = ctx.persistence.create(object).await {
        ctx.scene.remove(object);
        return Err(err.into());
    }
    ctx.events.publish(SceneEvent::ItemCreated {
        item: object.clone(),
    });
    Ok(())
}

/// Takes `object` out of the scene, deletes it from the store and announces
/// it. Returns the position the object had in the scene.
pub(crate) async fn unplace(
    ctx: &CommandContext<'_>,
    object: &SceneObject,
) -> Result<Option<usize>, CommandError> {
    let index = ctx.scene.remove(object);
    if let Err(err) = ctx.persistence.delete(object).await {
        if let Some(index) = index {
            ctx.scene.insert(index, object.clone());
        }
        return Err(err.into());
    }
    ctx.events.publish(SceneEvent::ItemDeleted {
        item: object.clone(),
    });
    Ok(index)
}

/// Best-effort reversal used while unwinding a failed multi-step operation.
pub(crate) async fn unwind(ctx: &CommandContext<'_>, command: &mut dyn Command) {
    if let Err(err) = command.undo(ctx).await {
        warn!("[Command] Could not unwind '{}': {}", command.label(), err);
    }
}
