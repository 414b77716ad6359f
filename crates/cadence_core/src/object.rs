//! The object graph
//!
//! A [`DependencyObject`] is a typed bag of property values. Objects form a tree:
//! containers (panels, collections) own an ordered list of items, and
//! object-valued properties (a `Fill` brush, a `RenderTransform`) hang further
//! objects off their owner. Every object also carries a [`ResourceDictionary`].
//!
//! Objects are shared as [`ObjectRef`] (`Arc<DependencyObject>`) and all state
//! sits behind interior locks, so a graph can be read and written from an
//! animation scheduler while the application holds references to it.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use crate::error::{CoreError, Result};
use crate::resources::{Resource, ResourceDictionary};
use crate::types::{PropertyId, PropertyInfo, TypeRegistry};
use crate::value::Value;

/// Shared handle to an object
pub type ObjectRef = Arc<DependencyObject>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

/// An object in the graph
pub struct DependencyObject {
    id: ObjectId,
    type_name: String,
    registry: Arc<TypeRegistry>,
    this: Weak<DependencyObject>,
    name: RwLock<Option<String>>,
    values: RwLock<FxHashMap<PropertyId, Value>>,
    items: RwLock<Vec<ObjectRef>>,
    parent: RwLock<Weak<DependencyObject>>,
    resources: ResourceDictionary,
}

/// Result of a name lookup
#[derive(Clone)]
pub enum NamedItem {
    Object(ObjectRef),
    Resource(Arc<dyn Resource>),
}

impl NamedItem {
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            NamedItem::Object(obj) => Some(obj),
            NamedItem::Resource(_) => None,
        }
    }

    pub fn into_object(self) -> Option<ObjectRef> {
        match self {
            NamedItem::Object(obj) => Some(obj),
            NamedItem::Resource(_) => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Arc<dyn Resource>> {
        match self {
            NamedItem::Resource(resource) => Some(resource),
            NamedItem::Object(_) => None,
        }
    }
}

impl fmt::Debug for NamedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedItem::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
            NamedItem::Resource(resource) => f
                .debug_tuple("Resource")
                .field(&resource.resource_name())
                .finish(),
        }
    }
}

impl DependencyObject {
    /// Create an object of type `type_name` from `registry`
    ///
    /// Collection-valued properties are populated with fresh, empty collections.
    pub fn new(registry: Arc<TypeRegistry>, type_name: &str) -> Result<ObjectRef> {
        if !registry.has_type(type_name) {
            return Err(CoreError::UnknownType(type_name.to_string()));
        }
        let collections = registry.collection_properties(type_name);

        let obj = Arc::new_cyclic(|this| DependencyObject {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            type_name: type_name.to_string(),
            registry: Arc::clone(&registry),
            this: this.clone(),
            name: RwLock::new(None),
            values: RwLock::new(FxHashMap::default()),
            items: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
            resources: ResourceDictionary::new(this.clone()),
        });

        for (property, collection_type) in collections {
            let collection = DependencyObject::new(Arc::clone(&registry), &collection_type)?;
            obj.set_value(property, Value::Object(collection))?;
        }
        Ok(obj)
    }

    /// Create an object from the standard registry
    pub fn create(type_name: &str) -> Result<ObjectRef> {
        Self::new(TypeRegistry::standard(), type_name)
    }

    /// Builder-style [`set_name`](Self::set_name)
    pub fn with_name(self: Arc<Self>, name: impl Into<String>) -> ObjectRef {
        self.set_name(name);
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn is_a(&self, ty: &str) -> bool {
        self.registry.is_assignable(&self.type_name, ty)
    }

    pub fn name(&self) -> Option<String> {
        self.name.read().unwrap().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write().unwrap() = Some(name.into());
    }

    pub fn clear_name(&self) {
        *self.name.write().unwrap() = None;
    }

    pub fn resources(&self) -> &ResourceDictionary {
        &self.resources
    }

    pub fn parent(&self) -> Option<ObjectRef> {
        self.parent.read().unwrap().upgrade()
    }

    // =========================================================================
    // Property values
    // =========================================================================

    fn info(&self, property: PropertyId) -> Result<&PropertyInfo> {
        self.registry
            .property(property)
            .ok_or_else(|| CoreError::UnknownProperty {
                type_name: self.type_name.clone(),
                property: format!("#{}", property.index()),
            })
    }

    /// Resolve a property name: `Name` on this type, or `Owner.Name`
    pub fn property_id(&self, name: &str) -> Result<PropertyId> {
        let found = match name.split_once('.') {
            Some((owner, member)) => self.registry.lookup(owner, member),
            None => self.registry.find_property(&self.type_name, name),
        };
        found.ok_or_else(|| CoreError::UnknownProperty {
            type_name: self.type_name.clone(),
            property: name.to_string(),
        })
    }

    /// Current value, or the property's default when unset
    pub fn get_value(&self, property: PropertyId) -> Value {
        if let Some(value) = self.values.read().unwrap().get(&property) {
            return value.clone();
        }
        self.registry
            .property(property)
            .map(|info| info.default.clone())
            .unwrap_or_default()
    }

    /// Whether a local value is stored for `property`
    pub fn has_local_value(&self, property: PropertyId) -> bool {
        self.values.read().unwrap().contains_key(&property)
    }

    pub fn set_value(&self, property: PropertyId, value: Value) -> Result<()> {
        let info = self.info(property)?;
        if !self.registry.applies_to(property, &self.type_name) {
            return Err(CoreError::PropertyNotApplicable {
                type_name: self.type_name.clone(),
                property: info.qualified_name(),
            });
        }
        let accepted = match value.kind() {
            Some(kind) => kind == info.kind,
            None => info.kind.is_nullable(),
        };
        if !accepted {
            return Err(CoreError::ValueKindMismatch {
                property: info.qualified_name(),
                expected: info.kind,
                actual: value.kind(),
            });
        }

        if let Value::Object(child) = &value {
            child.adopt(&self.this);
        }
        let previous = self.values.write().unwrap().insert(property, value);
        if let Some(Value::Object(old)) = previous {
            old.release(self);
        }
        Ok(())
    }

    /// Remove the local value, reverting to the default
    pub fn clear_value(&self, property: PropertyId) {
        let previous = self.values.write().unwrap().remove(&property);
        if let Some(Value::Object(old)) = previous {
            old.release(self);
        }
    }

    /// [`get_value`](Self::get_value) by property name
    pub fn get(&self, name: &str) -> Result<Value> {
        Ok(self.get_value(self.property_id(name)?))
    }

    /// [`set_value`](Self::set_value) by property name
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set_value(self.property_id(name)?, value.into())
    }

    // Object-valued properties take ownership of unparented objects only, so a
    // shared brush keeps its first owner.
    fn adopt(&self, parent: &Weak<DependencyObject>) {
        let mut slot = self.parent.write().unwrap();
        if slot.upgrade().is_none() {
            *slot = parent.clone();
        }
    }

    fn release(&self, parent: &DependencyObject) {
        let mut slot = self.parent.write().unwrap();
        if slot.upgrade().map(|p| p.id) == Some(parent.id) {
            *slot = Weak::new();
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn is_container(&self) -> bool {
        self.registry.is_container(&self.type_name)
    }

    /// Append `child` to this container
    pub fn add_item(&self, child: ObjectRef) -> Result<()> {
        if !self.is_container() {
            return Err(CoreError::NotAContainer(self.type_name.clone()));
        }
        {
            let mut slot = child.parent.write().unwrap();
            if slot.upgrade().is_some() {
                return Err(CoreError::AlreadyParented);
            }
            *slot = self.this.clone();
        }
        self.items.write().unwrap().push(child);
        Ok(())
    }

    /// Remove `child` from this container, returning whether it was present
    pub fn remove_item(&self, child: &ObjectRef) -> bool {
        let removed = {
            let mut items = self.items.write().unwrap();
            match items.iter().position(|item| Arc::ptr_eq(item, child)) {
                Some(index) => {
                    items.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            child.release(self);
        }
        removed
    }

    pub fn item(&self, index: usize) -> Option<ObjectRef> {
        self.items.read().unwrap().get(index).cloned()
    }

    pub fn item_count(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn items(&self) -> Vec<ObjectRef> {
        self.items.read().unwrap().clone()
    }

    /// Items first, then object-valued properties
    fn children(&self) -> Vec<ObjectRef> {
        let mut children = self.items();
        let values = self.values.read().unwrap();
        let mut properties: Vec<_> = values
            .iter()
            .filter_map(|(id, value)| value.as_object().map(|obj| (*id, Arc::clone(obj))))
            .collect();
        properties.sort_by_key(|(id, _)| *id);
        children.extend(properties.into_iter().map(|(_, obj)| obj));
        children
    }

    // =========================================================================
    // Name lookup
    // =========================================================================

    /// Find a named object or resource
    ///
    /// The subtree rooted here is searched first, then each ancestor's subtree
    /// in turn. Resources match by their own name, never by dictionary key.
    pub fn find_name(&self, name: &str) -> Option<NamedItem> {
        let mut visited = FxHashSet::default();
        let mut current = self.this.upgrade()?;
        loop {
            if let Some(found) = current.search_subtree(name, &mut visited) {
                return Some(found);
            }
            current = current.parent()?;
        }
    }

    fn search_subtree(&self, name: &str, visited: &mut FxHashSet<ObjectId>) -> Option<NamedItem> {
        if !visited.insert(self.id) {
            return None;
        }
        if self.name.read().unwrap().as_deref() == Some(name) {
            return self.this.upgrade().map(NamedItem::Object);
        }
        if let Some(resource) = self.resources.find_by_name(name) {
            return Some(match resource.as_object() {
                Some(obj) => NamedItem::Object(obj),
                None => NamedItem::Resource(resource),
            });
        }
        self.children()
            .into_iter()
            .find_map(|child| child.search_subtree(name, visited))
    }
}

impl Resource for DependencyObject {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn resource_name(&self) -> Option<String> {
        self.name()
    }

    fn as_object(&self) -> Option<ObjectRef> {
        self.this.upgrade()
    }
}

impl fmt::Debug for DependencyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyObject")
            .field("type", &self.type_name)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
