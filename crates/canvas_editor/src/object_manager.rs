use tracing::debug;

use canvas_common::{
    AttributeValue, EntityKind, Heliostat, LightSource, Receiver, SceneObject,
};

use crate::commands::{
    BatchCommand, Command, CreateCommand, DeleteCommand, DuplicateCommand, UpdateAttributeCommand,
};
use crate::{CommandError, Editor, EventKind, SceneEvent};

/// The actions behind the editor's object controls.
///
/// Each action goes through the editor's history, so every one of them can
/// be undone.
#[derive(Debug, Clone, Copy)]
pub struct ObjectManager<'a> {
    editor: &'a Editor,
}

impl<'a> ObjectManager<'a> {
    pub fn new(editor: &'a Editor) -> Self {
        Self { editor }
    }

    /// Display name for the next new object of `kind`: its 1-based position
    /// among the objects of that kind.
    fn next_name(&self, kind: EntityKind) -> String {
        (self.editor.scene().count(kind) + 1).to_string()
    }

    pub async fn create_heliostat(&self) -> Result<SceneObject, CommandError> {
        let position = self.editor.settings().object_defaults.heliostat_position;
        let heliostat = Heliostat::at(position).with_name(self.next_name(EntityKind::Heliostat));
        self.create(heliostat.into()).await
    }

    pub async fn create_receiver(&self) -> Result<SceneObject, CommandError> {
        let position = self.editor.settings().object_defaults.receiver_position;
        let receiver = Receiver::at(position).with_name(self.next_name(EntityKind::Receiver));
        self.create(receiver.into()).await
    }

    pub async fn create_light_source(&self) -> Result<SceneObject, CommandError> {
        let light_source = LightSource::default().with_name(self.next_name(EntityKind::LightSource));
        self.create(light_source.into()).await
    }

    /// Creates `object` and makes it the selection.
    async fn create(&self, object: SceneObject) -> Result<SceneObject, CommandError> {
        self.editor.execute(CreateCommand::new(object.clone())).await?;
        self.editor.selection().set_selection(vec![object.clone()]);
        Ok(object)
    }

    /// Deletes the selected objects as one history entry. Returns how many
    /// were deleted.
    pub async fn delete_selected(&self) -> Result<usize, CommandError> {
        let selected = self.editor.selection().selected_objects();
        let count = selected.len();
        let command: Box<dyn Command> = match count {
            0 => return Ok(0),
            1 => Box::new(DeleteCommand::new(selected[0].clone())),
            _ => {
                let mut batch = BatchCommand::new(format!("Delete {count} objects"));
                for object in selected {
                    batch.push(Box::new(DeleteCommand::new(object)));
                }
                Box::new(batch)
            }
        };
        self.editor.execute_boxed(command).await?;
        debug!("[ObjectManager] Deleted {} selected object(s)", count);
        Ok(count)
    }

    /// Duplicates the selected objects as one history entry and selects the
    /// copies.
    pub async fn duplicate_selected(&self) -> Result<Vec<SceneObject>, CommandError> {
        let selected = self.editor.selection().selected_objects();
        let command: Box<dyn Command> = match selected.len() {
            0 => return Ok(Vec::new()),
            1 => Box::new(DuplicateCommand::new(selected[0].clone())),
            count => {
                let mut batch = BatchCommand::new(format!("Duplicate {count} objects"));
                for object in selected {
                    batch.push(Box::new(DuplicateCommand::new(object)));
                }
                Box::new(batch)
            }
        };

        // the copies only exist once the command has run, collect them from its events
        let created = self.editor.events().subscribe_to(&[EventKind::ItemCreated]);
        self.editor.execute_boxed(command).await?;
        let copies: Vec<SceneObject> = created
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                SceneEvent::ItemCreated { item } => Some(item),
                _ => None,
            })
            .collect();

        self.editor.selection().set_selection(copies.clone());
        Ok(copies)
    }

    /// Changes one attribute of `object` through the history.
    pub async fn update_attribute(
        &self,
        object: &SceneObject,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), CommandError> {
        let command = UpdateAttributeCommand::new(object.clone(), attribute, value)?;
        self.editor.execute(command).await
    }
}
