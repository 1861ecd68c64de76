use serde::{Deserialize, Serialize};

use canvas_common::Vec3;
use canvas_sync::SyncPolicy;

/// Default number of commands kept in each history stack.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Configuration for an editing session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Maximum length of the undo and of the redo stack. The oldest entry is
    /// dropped once a stack is full.
    pub history_capacity: usize,
    pub sync_policy: SyncPolicy,
    pub object_defaults: ObjectDefaults,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sync_policy: SyncPolicy::default(),
            object_defaults: ObjectDefaults::default(),
        }
    }
}

impl EditorSettings {
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn with_sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.sync_policy = policy;
        self
    }

    pub fn with_object_defaults(mut self, defaults: ObjectDefaults) -> Self {
        self.object_defaults = defaults;
        self
    }
}

/// Where newly created objects are placed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ObjectDefaults {
    pub heliostat_position: Vec3,
    pub receiver_position: Vec3,
}

impl Default for ObjectDefaults {
    fn default() -> Self {
        Self {
            heliostat_position: Vec3::new(-15.0, 0.0, -15.0),
            receiver_position: Vec3::new(0.0, 50.0, 0.0),
        }
    }
}

impl ObjectDefaults {
    pub fn with_heliostat_position(mut self, position: Vec3) -> Self {
        self.heliostat_position = position;
        self
    }

    pub fn with_receiver_position(mut self, position: Vec3) -> Self {
        self.receiver_position = position;
        self
    }
}
