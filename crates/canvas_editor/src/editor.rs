use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use canvas_common::SettingsRecord;
use canvas_sync::{Persistence, PersistenceGateway};

use crate::commands::{Command, CommandContext};
use crate::{
    CommandError, EditorSettings, EventBus, ObjectManager, Scene, SceneEvent, Selection,
    UndoRedoHandler,
};

#[derive(Debug, Default)]
struct ProjectState {
    name: String,
    settings: SettingsRecord,
}

/// One editing session over a project.
///
/// Owns the scene, the selection, the event bus and the store connection,
/// and routes every change through its [`UndoRedoHandler`].
#[derive(Debug)]
pub struct Editor {
    scene: Scene,
    events: EventBus,
    selection: Selection,
    persistence: Persistence,
    handler: Arc<UndoRedoHandler>,
    settings: EditorSettings,
    project: Mutex<ProjectState>,
}

impl Editor {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, settings: EditorSettings) -> Self {
        let events = EventBus::new();
        Self {
            scene: Scene::new(),
            selection: Selection::new(events.clone()),
            events,
            persistence: Persistence::new(gateway).with_policy(settings.sync_policy),
            handler: Arc::new(UndoRedoHandler::new(settings.history_capacity)),
            settings,
            project: Mutex::new(ProjectState::default()),
        }
    }

    /// Uses `handler` instead of a private one, e.g. [`UndoRedoHandler::shared`].
    pub fn with_handler(mut self, handler: Arc<UndoRedoHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn handler(&self) -> &Arc<UndoRedoHandler> {
        &self.handler
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn objects(&self) -> ObjectManager<'_> {
        ObjectManager::new(self)
    }

    pub fn context(&self) -> CommandContext<'_> {
        CommandContext {
            scene: &self.scene,
            persistence: &self.persistence,
            events: &self.events,
        }
    }

    fn project(&self) -> MutexGuard<'_, ProjectState> {
        self.project.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn execute(&self, command: impl Command + 'static) -> Result<(), CommandError> {
        self.execute_boxed(Box::new(command)).await
    }

    pub async fn execute_boxed(&self, command: Box<dyn Command>) -> Result<(), CommandError> {
        self.handler.execute_command(&self.context(), command).await
    }

    pub async fn undo(&self) -> Result<bool, CommandError> {
        self.handler.undo(&self.context()).await
    }

    pub async fn redo(&self) -> Result<bool, CommandError> {
        self.handler.redo(&self.context()).await
    }

    /// Replaces the scene with the project held by the store.
    ///
    /// Loaded objects are announced with `ItemCreated` but are not part of
    /// the history, which starts out empty. The handler is held for the
    /// whole load, so commands, undo and redo issued meanwhile get
    /// [`CommandError::Busy`]. Returns the number of objects.
    pub async fn load_project(&self) -> Result<usize, CommandError> {
        let hold = self.handler.hold("load project")?;
        let project = self.persistence.load_project().await?;
        {
            let mut state = self.project();
            state.name = project.name.clone();
            state.settings = project.settings;
        }
        let name = project.name.clone();

        hold.reset();
        self.selection.clear();
        let loaded = self.scene.load_project(project);
        for item in &loaded {
            self.events.publish(SceneEvent::ItemCreated { item: item.clone() });
        }
        info!("[Editor] Loaded project '{}' with {} object(s)", name, loaded.len());
        Ok(loaded.len())
    }

    pub fn project_name(&self) -> String {
        self.project().name.clone()
    }

    pub fn project_settings(&self) -> SettingsRecord {
        self.project().settings
    }

    pub async fn set_shadows(&self, enabled: bool) -> Result<(), CommandError> {
        self.change_settings(|settings| settings.shadows = enabled).await
    }

    pub async fn set_fog(&self, enabled: bool) -> Result<(), CommandError> {
        self.change_settings(|settings| settings.fog = enabled).await
    }

    async fn change_settings(
        &self,
        change: impl FnOnce(&mut SettingsRecord),
    ) -> Result<(), CommandError> {
        let (previous, updated) = {
            let mut state = self.project();
            let previous = state.settings;
            change(&mut state.settings);
            (previous, state.settings)
        };
        if let Err(err) = self.persistence.update_settings(updated).await {
            self.project().settings = previous;
            return Err(err.into());
        }
        Ok(())
    }
}
