pub mod document;
pub mod error;
pub mod identity;
pub mod value;

pub use document::{Document, IDENTITY_FIELD, VERSION_FIELD, is_reserved};
pub use error::{DocError, Result};
pub use identity::{DocId, IdentityRef};
pub use value::{Fields, Value};
