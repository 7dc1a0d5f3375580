use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocError {
    #[error("Schema violation at '{path}': {message}")]
    SchemaViolation { path: String, message: String },

    #[error(
        "Document was not created by Model::create or fetched through collection '{collection}'"
    )]
    UnmanagedObject { collection: String },

    #[error(
        "Document {id} in '{collection}' has schema version {found}, but this application supports up to {supported}. Please upgrade!"
    )]
    VersionOverrun {
        collection: String,
        id: String,
        found: u32,
        supported: u32,
    },

    #[error("Migration of document {id} in '{collection}' to version {version} failed: {source}")]
    Migration {
        collection: String,
        id: String,
        version: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid model definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocError {
    pub fn violation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::SchemaViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, DocError>;

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
