use crate::core::{DocError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(Uuid);

impl DocId {
    /// Generates a fresh random identity. Stores call this on insert.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true when `candidate` parses as an identity.
    pub fn is_valid(candidate: &str) -> bool {
        Uuid::parse_str(candidate).is_ok()
    }
}

impl FromStr for DocId {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|err| DocError::InvalidIdentity(format!("'{}': {}", s, err)))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that names a stored document: an identity, its string form, or a
/// document carrying one.
pub trait IdentityRef {
    fn to_doc_id(&self) -> Result<DocId>;
}

impl IdentityRef for DocId {
    fn to_doc_id(&self) -> Result<DocId> {
        Ok(*self)
    }
}

impl IdentityRef for str {
    fn to_doc_id(&self) -> Result<DocId> {
        self.parse()
    }
}

impl IdentityRef for String {
    fn to_doc_id(&self) -> Result<DocId> {
        self.parse()
    }
}
