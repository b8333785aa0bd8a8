//! # Shape Descriptions
//!
//! The schema-authoring surface. A type implements [`Shape`] to describe its
//! fields: declared name, field type, naming overrides, and a tag vocabulary
//! of string annotations. [`crate::infer`] turns a description into a
//! [`crate::SchemaNode`].
//!
//! ```
//! use covenant_schema::{FieldDescriptor, FieldType, Shape, ShapeDescriptor};
//!
//! struct Payment;
//!
//! impl Shape for Payment {
//!     fn describe() -> ShapeDescriptor {
//!         ShapeDescriptor::new("Payment")
//!             .field(FieldDescriptor::new("amount", FieldType::Integer).tag("minimum", "1"))
//!             .field(
//!                 FieldDescriptor::new("credit_card", FieldType::String)
//!                     .rename("creditCard")
//!                     .omit_empty()
//!                     .tag("dependentRequired", "billingAddress"),
//!             )
//!             .field(
//!                 FieldDescriptor::new("billing_address", FieldType::String)
//!                     .rename("billingAddress")
//!                     .omit_empty(),
//!             )
//!     }
//! }
//! ```
//!
//! Container-level configuration (whole-object nullability, permissive
//! additional properties) is set on the [`ShapeDescriptor`] itself, never
//! through a property.

use std::any::TypeId;
use std::fmt;

/// A type with a describable data shape.
pub trait Shape: 'static {
    /// Describe the shape's fields and container configuration.
    fn describe() -> ShapeDescriptor;
}

/// A reference to a nested [`Shape`], identified by its `TypeId`.
#[derive(Clone, Copy)]
pub struct ShapeRef {
    id: TypeId,
    describe: fn() -> ShapeDescriptor,
}

impl ShapeRef {
    /// Reference the shape of `T`.
    pub fn of<T: Shape>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            describe: T::describe,
        }
    }

    /// Shape identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Produce the referenced description.
    pub fn describe(&self) -> ShapeDescriptor {
        (self.describe)()
    }
}

impl fmt::Debug for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeRef").field(&self.id).finish()
    }
}

impl PartialEq for ShapeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// `true` / `false`.
    Boolean,
    /// Whole numbers.
    Integer,
    /// Any number.
    Number,
    /// Unicode text.
    String,
    /// A sequence of the inner type.
    Array(Box<FieldType>),
    /// A nested shape.
    Object(ShapeRef),
    /// An optional reference slot holding the inner type.
    Optional(Box<FieldType>),
}

impl FieldType {
    /// A sequence of `inner`.
    pub fn array(inner: FieldType) -> Self {
        FieldType::Array(Box::new(inner))
    }

    /// A nested shape.
    pub fn object<T: Shape>() -> Self {
        FieldType::Object(ShapeRef::of::<T>())
    }

    /// An optional reference slot holding `inner`.
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }
}

/// One declared field of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Declared (source) name.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
    /// External name override.
    pub rename: Option<String>,
    /// Omit-when-empty marker: the field is optional unless tagged otherwise.
    pub omit_empty: bool,
    /// Excluded from the schema entirely.
    pub ignored: bool,
    /// Annotation tags in declaration order.
    pub tags: Vec<(String, String)>,
}

impl FieldDescriptor {
    /// Declare a field.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            rename: None,
            omit_empty: false,
            ignored: false,
            tags: Vec::new(),
        }
    }

    /// Use `external` as the field's name in payloads.
    pub fn rename(mut self, external: impl Into<String>) -> Self {
        self.rename = Some(external.into());
        self
    }

    /// Mark the field omit-when-empty.
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Exclude the field from the schema.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Attach an annotation tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// The name the field carries in payloads.
    pub fn external_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// The value of the last tag named `key`.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// The full description of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    /// Shape name, used in configuration errors.
    pub name: String,
    /// Documentation for the shape.
    pub doc: Option<String>,
    /// Declared fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Container configuration: the whole object may be `null`.
    pub nullable: bool,
    /// Container configuration: undeclared keys are accepted.
    pub additional_properties: bool,
}

impl ShapeDescriptor {
    /// Start describing a shape.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
            nullable: false,
            additional_properties: false,
        }
    }

    /// Attach documentation.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Set whole-object nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Accept (or reject) undeclared keys.
    pub fn additional_properties(mut self, allow: bool) -> Self {
        self.additional_properties = allow;
        self
    }
}
