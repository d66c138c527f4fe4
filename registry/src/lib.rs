//! Declarative schema definitions and a named registry of compiled schemas.
//!
//! Schemas are usually declared in code with
//! [`SchemaType::builder`](docshape_core::SchemaType::builder). This crate
//! adds a data-driven route: definitions written in YAML or JSON, compiled
//! together so they can refer to one another by name, plus the validator
//! configuration file used by the `docshape` binary.
//!
//! # Quick start
//!
//! ```no_run
//! use docshape_registry::{SchemaRegistry, ValidatorConfig};
//!
//! let registry = SchemaRegistry::from_dir("schemas/").unwrap();
//! if let Some(order) = registry.get("Order") {
//!     println!("Order has {} fields", order.fields().len());
//! }
//!
//! let config = ValidatorConfig::load("docshape.yml").unwrap();
//! let registry = config.registry().build().unwrap();
//! ```

mod config;
mod definition;
mod error;
mod loader;

pub use config::{LimitsConfig, OutputConfig, ReportFormat, ValidatorConfig};
pub use definition::{
    ArrayDefinition, CategoryDefinition, FieldDefinition, ItemDefinition, ObjectDefinition,
    ScalarDefinition, SchemaBundle, SchemaDefinition,
};
pub use error::{RegistryError, Result};
pub use loader::{RegistryBuilder, RegistrySource, SchemaRegistry};
