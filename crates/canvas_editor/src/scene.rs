use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use canvas_common::{
    ApiId, EntityKind, Heliostat, LightSource, ProjectRecord, Receiver, SceneObject,
};

/// The ordered collection of objects placed in the field.
#[derive(Debug, Default)]
pub struct Scene {
    objects: RwLock<Vec<SceneObject>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<SceneObject>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<SceneObject>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `object`. Returns false if it is already in the scene.
    pub fn add(&self, object: SceneObject) -> bool {
        let mut objects = self.write();
        if objects.iter().any(|o| o.same(&object)) {
            return false;
        }
        objects.push(object);
        true
    }

    /// Puts `object` back at `index`, clamped to the end.
    pub fn insert(&self, index: usize, object: SceneObject) -> bool {
        let mut objects = self.write();
        if objects.iter().any(|o| o.same(&object)) {
            return false;
        }
        let index = index.min(objects.len());
        objects.insert(index, object);
        true
    }

    /// Removes `object`, returning the position it had.
    pub fn remove(&self, object: &SceneObject) -> Option<usize> {
        let mut objects = self.write();
        let index = objects.iter().position(|o| o.same(object))?;
        objects.remove(index);
        Some(index)
    }

    pub fn contains(&self, object: &SceneObject) -> bool {
        self.read().iter().any(|o| o.same(object))
    }

    pub fn objects(&self) -> Vec<SceneObject> {
        self.read().clone()
    }

    pub fn of_kind(&self, kind: EntityKind) -> Vec<SceneObject> {
        self.read()
            .iter()
            .filter(|o| o.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn heliostats(&self) -> Vec<SceneObject> {
        self.of_kind(EntityKind::Heliostat)
    }

    pub fn receivers(&self) -> Vec<SceneObject> {
        self.of_kind(EntityKind::Receiver)
    }

    pub fn light_sources(&self) -> Vec<SceneObject> {
        self.of_kind(EntityKind::LightSource)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.read().iter().filter(|o| o.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn find_by_api_id(&self, kind: EntityKind, id: ApiId) -> Option<SceneObject> {
        self.read()
            .iter()
            .find(|o| o.kind() == kind && o.api_id() == Some(id))
            .cloned()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Replaces the content with the objects of `project`, all already persisted.
    pub fn load_project(&self, project: ProjectRecord) -> Vec<SceneObject> {
        let heliostats = project.heliostats.into_iter().map(Heliostat::from);
        let receivers = project.receivers.into_iter().map(Receiver::from);
        let light_sources = project.lightsources.into_iter().map(LightSource::from);
        let loaded: Vec<SceneObject> = heliostats
            .map(SceneObject::from)
            .chain(receivers.map(SceneObject::from))
            .chain(light_sources.map(SceneObject::from))
            .collect();
        *self.write() = loaded.clone();
        loaded
    }
}
