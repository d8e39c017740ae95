//! Schema bindings for eventline producers and consumers.
//!
//! This crate covers the schema half of the integration layer: resolving
//! named schemas against the registry collaborator, serializing keys and
//! values under them, and the schema-id wire framing shared by both sides.
//!
//! # Example
//!
//! ```ignore
//! use eventline_schema::{HttpSchemaRegistry, SchemaBinding};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(HttpSchemaRegistry::new("http://localhost:8081")?);
//! let binding = SchemaBinding::new("weather", KEY_SCHEMA, Some(VALUE_SCHEMA.into()), registry);
//!
//! let key = binding.serialize_key(&"k1".into()).await?;
//! ```

pub mod binding;
pub mod error;
pub mod registry;
pub mod wire;

pub use binding::{ResolvedSchema, ResolvedSchemas, SchemaBinding};
pub use error::{Result, SchemaError};
pub use registry::{HttpSchemaRegistry, SchemaFormat, SchemaRegistry};
