use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    ApiId, AttributeError, AttributeKey, AttributeValue, Attributes, Entity, EntityKind,
    EntityRecord, Heliostat, HeliostatRecord, LightSource, LightSourceRecord, Receiver,
    ReceiverRecord,
};

/// Shared handle to an entity placed in a scene.
///
/// Cloning a `SceneObject` clones the handle, not the entity. The scene,
/// the selection and any number of commands can hold the same entity, and
/// identity is handle identity (see [`SceneObject::same`]).
#[derive(Clone, Debug)]
pub enum SceneObject {
    Heliostat(Arc<RwLock<Heliostat>>),
    Receiver(Arc<RwLock<Receiver>>),
    LightSource(Arc<RwLock<LightSource>>),
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

macro_rules! with_entity {
    ($object:expr, $entity:ident => $body:expr) => {
        match $object {
            SceneObject::Heliostat(lock) => {
                let $entity = read(lock);
                $body
            }
            SceneObject::Receiver(lock) => {
                let $entity = read(lock);
                $body
            }
            SceneObject::LightSource(lock) => {
                let $entity = read(lock);
                $body
            }
        }
    };
}

impl SceneObject {
    /// Whether both handles point at the same entity.
    pub fn same(&self, other: &SceneObject) -> bool {
        match (self, other) {
            (SceneObject::Heliostat(a), SceneObject::Heliostat(b)) => Arc::ptr_eq(a, b),
            (SceneObject::Receiver(a), SceneObject::Receiver(b)) => Arc::ptr_eq(a, b),
            (SceneObject::LightSource(a), SceneObject::LightSource(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SceneObject::Heliostat(_) => EntityKind::Heliostat,
            SceneObject::Receiver(_) => EntityKind::Receiver,
            SceneObject::LightSource(_) => EntityKind::LightSource,
        }
    }

    pub fn name(&self) -> Option<String> {
        with_entity!(self, e => e.name().map(str::to_string))
    }

    /// Name for logs and history labels, falling back to the kind.
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) if !name.is_empty() => name,
            _ => self.kind().to_string(),
        }
    }

    pub fn api_id(&self) -> Option<ApiId> {
        with_entity!(self, e => e.api_id())
    }

    pub fn set_api_id(&self, api_id: Option<ApiId>) {
        match self {
            SceneObject::Heliostat(lock) => write(lock).set_api_id(api_id),
            SceneObject::Receiver(lock) => write(lock).set_api_id(api_id),
            SceneObject::LightSource(lock) => write(lock).set_api_id(api_id),
        }
    }

    /// Resolves an attribute name against this object's kind.
    pub fn resolve(&self, name: &str) -> Result<AttributeKey, AttributeError> {
        AttributeKey::resolve(self.kind(), name)
    }

    /// Reads an attribute. The returned value is an owned copy.
    pub fn get(&self, key: AttributeKey) -> Result<AttributeValue, AttributeError> {
        match (self, key) {
            (SceneObject::Heliostat(lock), AttributeKey::Heliostat(a)) => Ok(read(lock).get(a)),
            (SceneObject::Receiver(lock), AttributeKey::Receiver(a)) => Ok(read(lock).get(a)),
            (SceneObject::LightSource(lock), AttributeKey::LightSource(a)) => {
                Ok(read(lock).get(a))
            }
            (_, key) => Err(self.foreign_key(key)),
        }
    }

    pub fn set(&self, key: AttributeKey, value: AttributeValue) -> Result<(), AttributeError> {
        match (self, key) {
            (SceneObject::Heliostat(lock), AttributeKey::Heliostat(a)) => write(lock).set(a, value),
            (SceneObject::Receiver(lock), AttributeKey::Receiver(a)) => write(lock).set(a, value),
            (SceneObject::LightSource(lock), AttributeKey::LightSource(a)) => {
                write(lock).set(a, value)
            }
            (_, key) => Err(self.foreign_key(key)),
        }
    }

    pub fn get_named(&self, name: &str) -> Result<AttributeValue, AttributeError> {
        self.get(self.resolve(name)?)
    }

    fn foreign_key(&self, key: AttributeKey) -> AttributeError {
        AttributeError::Unknown {
            kind: self.kind(),
            name: key.name().to_string(),
        }
    }

    /// A new, unpersisted object carrying a copy of every attribute except identity.
    pub fn duplicate(&self) -> SceneObject {
        with_entity!(self, e => e.duplicate().into_object())
    }

    /// Full attribute record of the entity as it is right now.
    pub fn to_record(&self) -> EntityRecord {
        match self {
            SceneObject::Heliostat(lock) => {
                EntityRecord::Heliostat(HeliostatRecord::from(&*read(lock)))
            }
            SceneObject::Receiver(lock) => EntityRecord::Receiver(ReceiverRecord::from(&*read(lock))),
            SceneObject::LightSource(lock) => {
                EntityRecord::LightSource(LightSourceRecord::from(&*read(lock)))
            }
        }
    }
}

impl From<Heliostat> for SceneObject {
    fn from(entity: Heliostat) -> Self {
        SceneObject::Heliostat(Arc::new(RwLock::new(entity)))
    }
}

impl From<Receiver> for SceneObject {
    fn from(entity: Receiver) -> Self {
        SceneObject::Receiver(Arc::new(RwLock::new(entity)))
    }
}

impl From<LightSource> for SceneObject {
    fn from(entity: LightSource) -> Self {
        SceneObject::LightSource(Arc::new(RwLock::new(entity)))
    }
}
