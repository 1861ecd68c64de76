use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use canvas_common::SceneObject;

use crate::events::{EventBus, EventKind, EventSubscription, SceneEvent};

/// The objects the user currently has selected.
///
/// Ordered and free of duplicates by handle identity. Deleted objects are
/// dropped as soon as their `ItemDeleted` event has been published.
#[derive(Debug)]
pub struct Selection {
    selected: Mutex<Vec<SceneObject>>,
    events: EventBus,
    deletions: EventSubscription,
}

impl Selection {
    pub fn new(events: EventBus) -> Self {
        let deletions = events.subscribe_to(&[EventKind::ItemDeleted]);
        Self {
            selected: Mutex::new(Vec::new()),
            events,
            deletions,
        }
    }

    /// Locks the selection after applying any pending deletions.
    fn current(&self) -> MutexGuard<'_, Vec<SceneObject>> {
        let mut selected = self.selected.lock().unwrap_or_else(PoisonError::into_inner);
        for event in self.deletions.drain() {
            if let SceneEvent::ItemDeleted { item } = event {
                let before = selected.len();
                selected.retain(|o| !o.same(&item));
                if selected.len() != before {
                    debug!("[Selection] Dropped deleted {} '{}'", item.kind(), item.display_name());
                }
            }
        }
        selected
    }

    pub fn selected_objects(&self) -> Vec<SceneObject> {
        self.current().clone()
    }

    pub fn is_selected(&self, object: &SceneObject) -> bool {
        self.current().iter().any(|o| o.same(object))
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Replaces the selection, keeping the first occurrence of each object.
    pub fn set_selection(&self, objects: Vec<SceneObject>) {
        let items = {
            let mut selected = self.current();
            selected.clear();
            for object in objects {
                if !selected.iter().any(|o| o.same(&object)) {
                    selected.push(object);
                }
            }
            selected.clone()
        };
        self.events.publish(SceneEvent::ItemSelected { items });
    }

    pub fn add_to_selection(&self, object: SceneObject) {
        let items = {
            let mut selected = self.current();
            if selected.iter().any(|o| o.same(&object)) {
                return;
            }
            selected.push(object);
            selected.clone()
        };
        self.events.publish(SceneEvent::ItemSelected { items });
    }

    pub fn deselect(&self, object: &SceneObject) {
        let items = {
            let mut selected = self.current();
            let before = selected.len();
            selected.retain(|o| !o.same(object));
            if selected.len() == before {
                return;
            }
            selected.clone()
        };
        self.events.publish(SceneEvent::ItemSelected { items });
    }

    pub fn clear(&self) {
        let was_empty = {
            let mut selected = self.current();
            let was_empty = selected.is_empty();
            selected.clear();
            was_empty
        };
        if !was_empty {
            self.events.publish(SceneEvent::ItemSelected { items: Vec::new() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_common::{Heliostat, Receiver};

    #[test]
    fn test_set_selection_deduplicates_and_publishes() {
        let bus = EventBus::new();
        let listener = bus.subscribe_to(&[EventKind::ItemSelected]);
        let selection = Selection::new(bus.clone());
        let a = SceneObject::from(Heliostat::default());
        let b = SceneObject::from(Receiver::default());

        selection.set_selection(vec![a.clone(), b.clone(), a.clone()]);

        let selected = selection.selected_objects();
        assert_eq!(selected.len(), 2);
        assert!(selected[0].same(&a) && selected[1].same(&b));
        match listener.try_next() {
            Some(SceneEvent::ItemSelected { items }) => assert_eq!(items.len(), 2),
            other => panic!("expected a selection event, got {other:?}"),
        }
    }

    #[test]
    fn test_deleted_objects_leave_the_selection() {
        let bus = EventBus::new();
        let selection = Selection::new(bus.clone());
        let a = SceneObject::from(Heliostat::default());
        let b = SceneObject::from(Heliostat::default());
        selection.set_selection(vec![a.clone(), b.clone()]);

        bus.publish(SceneEvent::ItemDeleted { item: a.clone() });

        assert!(!selection.is_selected(&a));
        assert!(selection.is_selected(&b));
    }

    #[test]
    fn test_reselecting_after_deletion_is_kept() {
        let bus = EventBus::new();
        let selection = Selection::new(bus.clone());
        let a = SceneObject::from(Heliostat::default());
        bus.publish(SceneEvent::ItemDeleted { item: a.clone() });
        // the stale deletion must not remove the new selection
        selection.set_selection(vec![a.clone()]);
        assert!(selection.is_selected(&a));
    }

    #[test]
    fn test_deselect_and_clear() {
        let bus = EventBus::new();
        let selection = Selection::new(bus.clone());
        let a = SceneObject::from(Heliostat::default());
        let b = SceneObject::from(Receiver::default());
        selection.add_to_selection(a.clone());
        selection.add_to_selection(b.clone());
        selection.add_to_selection(a.clone());
        assert_eq!(selection.len(), 2);
        selection.deselect(&a);
        assert_eq!(selection.selected_objects().len(), 1);
        selection.clear();
        assert!(selection.is_empty());
    }
}
