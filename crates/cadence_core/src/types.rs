//! Type and property registry
//!
//! Types form a single-inheritance hierarchy rooted at `DependencyObject`.
//! Properties are declared on an owner type and are either ordinary (usable on
//! the owner and every subtype) or attached (usable on any object, typically to
//! carry layout data such as `Canvas.Left`).
//!
//! The registry is immutable once shared: build it with
//! [`TypeRegistry::standard_builder`] or [`TypeRegistry::new`], then wrap it in
//! an `Arc` and hand it to [`DependencyObject::new`](crate::DependencyObject::new).

use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock};

use crate::error::{CoreError, Result};
use crate::value::{Color, Point, Value, ValueKind};

/// Name of the root of the type hierarchy
pub const ROOT_TYPE: &str = "DependencyObject";

/// Handle to a registered property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Metadata for a registered property
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    pub id: PropertyId,
    pub name: String,
    /// Type that declares the property
    pub owner: String,
    pub kind: ValueKind,
    pub attached: bool,
    pub default: Value,
    /// Container type instantiated for every new object carrying this property
    pub collection_type: Option<String>,
}

impl PropertyInfo {
    /// `Owner.Name`, the form used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

/// Metadata for a registered type
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: String,
    pub base: Option<String>,
    /// Instances hold an ordered list of child objects
    pub container: bool,
    properties: FxHashMap<String, PropertyId>,
}

impl TypeInfo {
    /// Properties declared directly on this type (not inherited)
    pub fn declared_properties(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.properties.values().copied()
    }
}

/// Registry of types and their properties
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    types: FxHashMap<String, TypeInfo>,
    properties: Vec<PropertyInfo>,
}

static STANDARD: OnceLock<Arc<TypeRegistry>> = OnceLock::new();

impl TypeRegistry {
    /// An empty registry containing only the root type
    pub fn new() -> Self {
        let mut types = FxHashMap::default();
        types.insert(
            ROOT_TYPE.to_string(),
            TypeInfo {
                name: ROOT_TYPE.to_string(),
                base: None,
                container: false,
                properties: FxHashMap::default(),
            },
        );
        Self {
            types,
            properties: Vec::new(),
        }
    }

    /// The shared registry of standard UI types
    pub fn standard() -> Arc<TypeRegistry> {
        Arc::clone(STANDARD.get_or_init(|| Arc::new(Self::standard_builder())))
    }

    /// A fresh copy of the standard registry, for extension with custom types
    pub fn standard_builder() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_standard_types(&mut registry)
            .unwrap_or_else(|err| unreachable!("standard type table is consistent: {err}"));
        registry
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn define_type(&mut self, name: &str, base: &str) -> Result<()> {
        self.define(name, base, false)
    }

    /// Define a type whose instances are ordered, indexable containers
    pub fn define_container(&mut self, name: &str, base: &str) -> Result<()> {
        self.define(name, base, true)
    }

    fn define(&mut self, name: &str, base: &str, container: bool) -> Result<()> {
        if self.types.contains_key(name) {
            return Err(CoreError::DuplicateType(name.to_string()));
        }
        if !self.types.contains_key(base) {
            return Err(CoreError::UnknownType(base.to_string()));
        }
        self.types.insert(
            name.to_string(),
            TypeInfo {
                name: name.to_string(),
                base: Some(base.to_string()),
                container,
                properties: FxHashMap::default(),
            },
        );
        Ok(())
    }

    pub fn register_property(
        &mut self,
        owner: &str,
        name: &str,
        kind: ValueKind,
        default: Value,
    ) -> Result<PropertyId> {
        self.register(owner, name, kind, default, false, None)
    }

    pub fn register_attached(
        &mut self,
        owner: &str,
        name: &str,
        kind: ValueKind,
        default: Value,
    ) -> Result<PropertyId> {
        self.register(owner, name, kind, default, true, None)
    }

    /// Register an object-valued property that always holds a fresh instance
    /// of `collection_type`
    pub fn register_collection(
        &mut self,
        owner: &str,
        name: &str,
        collection_type: &str,
    ) -> Result<PropertyId> {
        if !self.types.contains_key(collection_type) {
            return Err(CoreError::UnknownType(collection_type.to_string()));
        }
        self.register(
            owner,
            name,
            ValueKind::Object,
            Value::Null,
            false,
            Some(collection_type.to_string()),
        )
    }

    fn register(
        &mut self,
        owner: &str,
        name: &str,
        kind: ValueKind,
        default: Value,
        attached: bool,
        collection_type: Option<String>,
    ) -> Result<PropertyId> {
        let id = PropertyId(self.properties.len() as u32);
        let info = self
            .types
            .get_mut(owner)
            .ok_or_else(|| CoreError::UnknownType(owner.to_string()))?;
        if info.properties.contains_key(name) {
            return Err(CoreError::DuplicateProperty {
                type_name: owner.to_string(),
                property: name.to_string(),
            });
        }
        info.properties.insert(name.to_string(), id);
        self.properties.push(PropertyInfo {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
            kind,
            attached,
            default,
            collection_type,
        });
        Ok(id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn property(&self, id: PropertyId) -> Option<&PropertyInfo> {
        self.properties.get(id.index())
    }

    /// Walk from `name` up to the root type
    pub fn ancestry<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a TypeInfo> + 'a {
        let mut current = self.types.get(name);
        std::iter::from_fn(move || {
            let info = current?;
            current = info.base.as_deref().and_then(|base| self.types.get(base));
            Some(info)
        })
    }

    /// Whether `ty` is `ancestor` or derives from it
    pub fn is_assignable(&self, ty: &str, ancestor: &str) -> bool {
        self.ancestry(ty).any(|info| info.name == ancestor)
    }

    pub fn is_container(&self, ty: &str) -> bool {
        self.types.get(ty).map(|info| info.container).unwrap_or(false)
    }

    /// Look up a non-attached property by name on `ty` or one of its bases
    pub fn find_property(&self, ty: &str, name: &str) -> Option<PropertyId> {
        self.ancestry(ty)
            .filter_map(|info| info.properties.get(name).copied())
            .find(|id| !self.properties[id.index()].attached)
    }

    /// Look up `Owner.Name`: a property declared on `owner` (attached or not)
    /// or inherited by it
    pub fn lookup(&self, owner: &str, name: &str) -> Option<PropertyId> {
        if let Some(id) = self.types.get(owner)?.properties.get(name) {
            return Some(*id);
        }
        self.find_property(owner, name)
    }

    /// Whether `property` may be stored on an object of type `ty`
    pub fn applies_to(&self, property: PropertyId, ty: &str) -> bool {
        match self.property(property) {
            Some(info) => info.attached || self.is_assignable(ty, &info.owner),
            None => false,
        }
    }

    /// Every property applicable to `ty` that needs a collection instance
    pub fn collection_properties(&self, ty: &str) -> Vec<(PropertyId, String)> {
        self.ancestry(ty)
            .flat_map(|info| info.declared_properties())
            .filter_map(|id| {
                let info = &self.properties[id.index()];
                info.collection_type.clone().map(|ty| (id, ty))
            })
            .collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn register_standard_types(r: &mut TypeRegistry) -> Result<()> {
    // Containers first, they are referenced by collection properties
    r.define_container("TransformCollection", ROOT_TYPE)?;
    r.define_container("GradientStopCollection", ROOT_TYPE)?;

    // Visual elements
    r.define_type("UIElement", ROOT_TYPE)?;
    r.register_property("UIElement", "Opacity", ValueKind::Double, Value::Double(1.0))?;
    r.register_property("UIElement", "RenderTransform", ValueKind::Object, Value::Null)?;

    r.define_type("FrameworkElement", "UIElement")?;
    r.register_property("FrameworkElement", "Width", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("FrameworkElement", "Height", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("FrameworkElement", "Tag", ValueKind::String, Value::Null)?;

    r.define_container("Panel", "FrameworkElement")?;
    r.register_property("Panel", "Background", ValueKind::Object, Value::Null)?;
    r.define_container("Canvas", "Panel")?;
    r.register_attached("Canvas", "Left", ValueKind::Double, Value::Double(0.0))?;
    r.register_attached("Canvas", "Top", ValueKind::Double, Value::Double(0.0))?;
    r.register_attached("Canvas", "ZIndex", ValueKind::Double, Value::Double(0.0))?;
    r.define_container("StackPanel", "Panel")?;

    r.define_type("Shape", "FrameworkElement")?;
    r.register_property("Shape", "Fill", ValueKind::Object, Value::Null)?;
    r.register_property("Shape", "Stroke", ValueKind::Object, Value::Null)?;
    r.register_property("Shape", "StrokeThickness", ValueKind::Double, Value::Double(1.0))?;
    r.define_type("Rectangle", "Shape")?;
    r.register_property("Rectangle", "RadiusX", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("Rectangle", "RadiusY", ValueKind::Double, Value::Double(0.0))?;
    r.define_type("Ellipse", "Shape")?;

    r.define_type("Control", "FrameworkElement")?;
    r.register_property("Control", "Background", ValueKind::Object, Value::Null)?;
    r.register_property("Control", "Foreground", ValueKind::Object, Value::Null)?;
    r.define_type("ContentControl", "Control")?;
    r.register_property("ContentControl", "Content", ValueKind::Object, Value::Null)?;
    r.define_type("Button", "ContentControl")?;

    // Brushes
    r.define_type("Brush", ROOT_TYPE)?;
    r.register_property("Brush", "Opacity", ValueKind::Double, Value::Double(1.0))?;
    r.define_type("SolidColorBrush", "Brush")?;
    r.register_property("SolidColorBrush", "Color", ValueKind::Color, Value::Color(Color::TRANSPARENT))?;
    r.define_type("GradientBrush", "Brush")?;
    r.register_collection("GradientBrush", "GradientStops", "GradientStopCollection")?;
    r.define_type("LinearGradientBrush", "GradientBrush")?;
    r.register_property("LinearGradientBrush", "StartPoint", ValueKind::Point, Value::Point(Point::new(0.0, 0.0)))?;
    r.register_property("LinearGradientBrush", "EndPoint", ValueKind::Point, Value::Point(Point::new(1.0, 1.0)))?;
    r.define_type("GradientStop", ROOT_TYPE)?;
    r.register_property("GradientStop", "Color", ValueKind::Color, Value::Color(Color::TRANSPARENT))?;
    r.register_property("GradientStop", "Offset", ValueKind::Double, Value::Double(0.0))?;

    // Transforms
    r.define_type("Transform", ROOT_TYPE)?;
    r.define_type("RotateTransform", "Transform")?;
    r.register_property("RotateTransform", "Angle", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("RotateTransform", "CenterX", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("RotateTransform", "CenterY", ValueKind::Double, Value::Double(0.0))?;
    r.define_type("TranslateTransform", "Transform")?;
    r.register_property("TranslateTransform", "X", ValueKind::Double, Value::Double(0.0))?;
    r.register_property("TranslateTransform", "Y", ValueKind::Double, Value::Double(0.0))?;
    r.define_type("ScaleTransform", "Transform")?;
    r.register_property("ScaleTransform", "ScaleX", ValueKind::Double, Value::Double(1.0))?;
    r.register_property("ScaleTransform", "ScaleY", ValueKind::Double, Value::Double(1.0))?;
    r.define_type("TransformGroup", "Transform")?;
    r.register_collection("TransformGroup", "Children", "TransformCollection")?;

    Ok(())
}
