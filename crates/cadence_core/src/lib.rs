//! Cadence Core
//!
//! The object model that animations run against:
//!
//! - **Values**: `Double`, `Color` and `Point` payloads plus strings and object references
//! - **Type Registry**: single-inheritance types, ordinary and attached properties
//! - **Object Graph**: thread-safe property bags with parents, ordered items and name lookup
//! - **Resources**: keyed dictionaries whose entries are visible to lookup by their own name
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{DependencyObject, Value};
//!
//! let canvas = DependencyObject::create("Canvas").unwrap();
//! let rect = DependencyObject::create("Rectangle").unwrap().with_name("A");
//! canvas.add_item(rect.clone()).unwrap();
//!
//! rect.set("Width", 40.0).unwrap();
//! let found = canvas.find_name("A").and_then(|item| item.into_object()).unwrap();
//! assert_eq!(found.get("Width").unwrap(), Value::Double(40.0));
//! ```

pub mod error;
pub mod object;
pub mod resources;
pub mod types;
pub mod value;

pub use error::{CoreError, Result};
pub use object::{DependencyObject, NamedItem, ObjectId, ObjectRef};
pub use resources::{Resource, ResourceDictionary};
pub use types::{PropertyId, PropertyInfo, TypeInfo, TypeRegistry, ROOT_TYPE};
pub use value::{Color, Point, Value, ValueKind};
