/// ObjectTable - generation-tagged arena of scene objects
///
/// Objects are addressed by `ObjectKey` (slot + generation). A key whose
/// object was removed resolves to `None` even after the slot is reused.
/// The object's own `ObjectId` can be mapped back to its key.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::scene::{ObjectId, SceneObject};

new_key_type! {
    /// Stable key of an object in an `ObjectTable`
    pub struct ObjectKey;
}

#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: SlotMap<ObjectKey, SceneObject>,
    keys_by_id: FxHashMap<ObjectId, ObjectKey>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SceneObject) -> ObjectKey {
        let id = object.id();
        let key = self.objects.insert(object);
        self.keys_by_id.insert(id, key);
        key
    }

    /// Remove an object, returning it if the key was live
    pub fn remove(&mut self, key: ObjectKey) -> Option<SceneObject> {
        let object = self.objects.remove(key)?;
        self.keys_by_id.remove(&object.id());
        Some(object)
    }

    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    /// Key of the object with the given id
    pub fn key_of(&self, id: ObjectId) -> Option<ObjectKey> {
        self.keys_by_id.get(&id).copied()
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<&SceneObject> {
        self.key_of(id).and_then(|key| self.objects.get(key))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectKey, &mut SceneObject)> {
        self.objects.iter_mut()
    }

    /// Objects carrying a point light payload
    pub fn point_lights(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values().filter(|object| object.point_light.is_some())
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.keys_by_id.clear();
    }
}

#[cfg(test)]
#[path = "object_table_tests.rs"]
mod tests;
