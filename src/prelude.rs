//! Recommended API entrypoints grouped by abstraction level.
//!
//! `app` covers defining models and working with their documents.
//! `advanced` exposes the store boundary and the lower-level building blocks.

pub mod app {
    //! Everything needed to define models and persist documents.
    pub use crate::{
        Database, DocError, DocId, Document, Fields, Filter, Migration, Model, ModelDefinition,
        Property, Result, SchemaNode, StoreConfig, TrackedDocument, Value, VersionedSchema,
    };
}

pub mod advanced {
    //! Store backends, validation and migration internals.
    pub use crate::connection::ConnectionGate;
    pub use crate::migration::{MigrationOutcome, MigrationRunner};
    pub use crate::schema::{DefaultValue, Kind, MigrationStep};
    pub use crate::store::{DocumentStore, MemoryStore, StoreCollection};
    pub use crate::tracker::{DocRef, ModelKey, TrackState};
    pub use crate::validator::{ValidationMode, validate_document, validate_fields};
}
