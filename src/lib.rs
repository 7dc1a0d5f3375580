// ============================================================================
// safedoc: schema-enforced, versioned document persistence
// ============================================================================

//! Every document written through a [`Model`] is validated against the
//! model's current schema, stamped with its schema version and tracked by the
//! model that produced it. Documents stored under an older version are
//! upgraded lazily on read by running the pending migrations of the version
//! chain.
//!
//! ```ignore
//! use safedoc::prelude::app::*;
//!
//! let db = Database::in_memory();
//! let users = db.define_model(
//!     ModelDefinition::new("users").schema(
//!         SchemaNode::new()
//!             .field("name", Property::string().default("NONAME"))
//!             .field("age", Property::number()),
//!     ),
//! )?;
//! db.connect().await?;
//!
//! let mut user = users.create()?;
//! user.set("age", 5);
//! users.save(&mut user).await?;
//! ```

pub mod connection;
pub mod core;
pub mod facade;
pub mod migration;
pub mod model;
pub mod prelude;
pub mod schema;
pub mod store;
pub mod tracker;
pub mod validator;

// Re-export main types for convenience
pub use connection::{ConnectionGate, StoreConfig};
pub use crate::core::{DocError, DocId, Document, Fields, IdentityRef, Result, Value};
pub use facade::Database;
pub use migration::{MigrationOutcome, MigrationRunner};
pub use model::Model;
pub use schema::{
    DefaultValue, Kind, Migration, ModelDefinition, Property, SchemaNode, VersionedSchema,
};
pub use store::{DocumentStore, Filter, MemoryStore, StoreCollection};
pub use tracker::{DocRef, ModelKey, TrackState, TrackedDocument};
pub use validator::ValidationMode;
