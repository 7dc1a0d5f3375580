pub mod database;

pub use database::Database;
pub(crate) use database::DatabaseInner;
