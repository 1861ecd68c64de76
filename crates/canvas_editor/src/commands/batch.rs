use async_trait::async_trait;
use tracing::warn;

use super::{Command, CommandContext, unwind};
use crate::CommandError;

/// Several commands recorded as one history entry.
///
/// Children run in order and are undone in reverse order. If a child fails,
/// the children that already ran are reversed before the error is returned,
/// so the batch either applies completely or not at all.
#[derive(Debug)]
pub struct BatchCommand {
    label: String,
    commands: Vec<Box<dyn Command>>,
}

impl BatchCommand {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for BatchCommand {
    async fn execute(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        for index in 0..self.commands.len() {
            if let Err(err) = self.commands[index].execute(ctx).await {
                warn!(
                    "[BatchCommand] '{}' failed at step {}, reverting {} step(s)",
                    self.label, index, index
                );
                for done in self.commands[..index].iter_mut().rev() {
                    unwind(ctx, done.as_mut()).await;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn undo(&mut self, ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        for index in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[index].undo(ctx).await {
                warn!(
                    "[BatchCommand] Undo of '{}' failed at step {}, re-applying later steps",
                    self.label, index
                );
                for undone in self.commands[index + 1..].iter_mut() {
                    if let Err(err) = undone.execute(ctx).await {
                        warn!("[BatchCommand] Could not re-apply '{}': {}", undone.label(), err);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}
