//! Command history for the heliostat field editor.
//!
//! Every change a user makes to the scene is a [`Command`]. An [`Editor`]
//! runs commands through its [`UndoRedoHandler`], which keeps a bounded
//! undo and redo history. Commands keep the remote store in sync through
//! [`canvas_sync::Persistence`] and announce their changes on the
//! [`EventBus`], where the [`Selection`] and any views pick them up.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use canvas_editor::{Editor, EditorSettings};
//! use canvas_sync::InMemoryGateway;
//!
//! # futures_lite::future::block_on(async {
//! let editor = Editor::new(Arc::new(InMemoryGateway::new()), EditorSettings::default());
//! let heliostat = editor.objects().create_heliostat().await?;
//! editor.objects().update_attribute(&heliostat, "numberOfFacets", 8).await?;
//! editor.undo().await?;
//! # Ok::<(), canvas_editor::CommandError>(())
//! # });
//! ```

pub mod commands;
pub use commands::{
    BatchCommand, Command, CommandContext, CreateCommand, DeleteCommand, DuplicateCommand,
    UpdateAttributeCommand,
};

pub mod editor;
pub use editor::Editor;

pub mod error;
pub use error::CommandError;

pub mod events;
pub use events::{EventBus, EventKind, EventSubscription, SceneEvent};

pub mod handler;
pub use handler::{HistoryHold, UndoRedoHandler};

pub mod object_manager;
pub use object_manager::ObjectManager;

pub mod scene;
pub use scene::Scene;

pub mod selection;
pub use selection::Selection;

pub mod settings;
pub use settings::{DEFAULT_HISTORY_CAPACITY, EditorSettings, ObjectDefaults};
