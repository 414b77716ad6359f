//! Resource dictionaries
//!
//! Every [`DependencyObject`](crate::DependencyObject) owns a keyed dictionary of
//! resources. Keys are only meaningful to the dictionary itself: name lookup
//! ([`DependencyObject::find_name`](crate::DependencyObject::find_name)) sees a
//! resource through its own name, never through the key it is stored under.

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::object::{DependencyObject, ObjectRef};

/// Something that can be stored in a [`ResourceDictionary`]
pub trait Resource: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// The name under which the resource is visible to name lookup
    fn resource_name(&self) -> Option<String> {
        None
    }

    /// The resource as an object, when it is one
    fn as_object(&self) -> Option<ObjectRef> {
        None
    }

    /// Called after the resource has been inserted into `owner`'s dictionary
    fn on_attached(&self, _owner: &ObjectRef) {}

    /// Called after the resource has left `owner`'s dictionary
    ///
    /// `owner` is `None` once the owning object has been dropped.
    fn on_detached(&self, _owner: Option<&ObjectRef>) {}
}

/// Ordered, keyed resource storage
pub struct ResourceDictionary {
    owner: Weak<DependencyObject>,
    entries: RwLock<IndexMap<String, Arc<dyn Resource>>>,
}

impl ResourceDictionary {
    pub(crate) fn new(owner: Weak<DependencyObject>) -> Self {
        Self {
            owner,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Insert a resource, returning the one previously stored under `key`
    pub fn insert(
        &self,
        key: impl Into<String>,
        resource: Arc<dyn Resource>,
    ) -> Option<Arc<dyn Resource>> {
        let key = key.into();
        let previous = self
            .entries
            .write()
            .unwrap()
            .insert(key.clone(), Arc::clone(&resource));

        let owner = self.owner.upgrade();
        if let Some(previous) = &previous {
            previous.on_detached(owner.as_ref());
        }
        if let Some(owner) = &owner {
            resource.on_attached(owner);
        }
        tracing::trace!(key = %key, "resource inserted");
        previous
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Resource>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().unwrap().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<dyn Resource>> {
        let removed = self.entries.write().unwrap().shift_remove(key);
        if let Some(resource) = &removed {
            resource.on_detached(self.owner.upgrade().as_ref());
        }
        removed
    }

    pub fn clear(&self) {
        let drained: Vec<_> = self.entries.write().unwrap().drain(..).collect();
        let owner = self.owner.upgrade();
        for (_, resource) in drained {
            resource.on_detached(owner.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().unwrap().keys().cloned().collect()
    }

    /// Snapshot of all stored resources, in insertion order
    pub fn values(&self) -> Vec<Arc<dyn Resource>> {
        self.entries.read().unwrap().values().cloned().collect()
    }

    /// First resource whose own name is `name`
    pub fn find_by_name(&self, name: &str) -> Option<Arc<dyn Resource>> {
        self.values()
            .into_iter()
            .find(|resource| resource.resource_name().as_deref() == Some(name))
    }
}

impl fmt::Debug for ResourceDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDictionary")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Probe {
        name: Option<String>,
        attached: AtomicUsize,
        detached: AtomicUsize,
    }

    impl Resource for Probe {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn resource_name(&self) -> Option<String> {
            self.name.clone()
        }

        fn on_attached(&self, _owner: &ObjectRef) {
            self.attached.fetch_add(1, Ordering::SeqCst);
        }

        fn on_detached(&self, _owner: Option<&ObjectRef>) {
            self.detached.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_insert_and_remove_notify() {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let probe = Arc::new(Probe::default());

        canvas.resources().insert("key", probe.clone());
        assert_eq!(probe.attached.load(Ordering::SeqCst), 1);
        assert!(canvas.resources().contains_key("key"));

        canvas.resources().remove("key");
        assert_eq!(probe.detached.load(Ordering::SeqCst), 1);
        assert!(canvas.resources().is_empty());
    }

    #[test]
    fn test_replacing_a_key_detaches_the_previous_resource() {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let first = Arc::new(Probe::default());
        let second = Arc::new(Probe::default());

        canvas.resources().insert("key", first.clone());
        let previous = canvas.resources().insert("key", second.clone());
        assert!(previous.is_some());
        assert_eq!(first.detached.load(Ordering::SeqCst), 1);
        assert_eq!(second.attached.load(Ordering::SeqCst), 1);
        assert_eq!(canvas.resources().len(), 1);
    }

    #[test]
    fn test_find_by_name_ignores_keys() {
        let canvas = DependencyObject::create("Canvas").unwrap();
        let probe = Arc::new(Probe {
            name: Some("Fade".into()),
            ..Default::default()
        });
        canvas.resources().insert("FadeKey", probe);

        assert!(canvas.resources().find_by_name("Fade").is_some());
        assert!(canvas.resources().find_by_name("FadeKey").is_none());
    }
}
