//! Schema model: property rules, schema nodes, and the version chain.

mod definition;
mod migration;
mod node;
mod property;

pub use definition::{ModelDefinition, VersionedSchema, validate_collection_name};
pub use migration::{Migration, MigrationStep};
pub use node::SchemaNode;
pub use property::{ComputedDefaultFn, CustomValidatorFn, DefaultValue, Kind, Property};
