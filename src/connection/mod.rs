pub mod config;
pub mod gate;

pub use config::StoreConfig;
pub use gate::ConnectionGate;
