use crate::connection::{ConnectionGate, StoreConfig};
use crate::core::Result;
use crate::model::Model;
use crate::schema::ModelDefinition;
use crate::store::{DocumentStore, MemoryStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Level, event};

/// State shared by a database handle and every model defined on it.
pub(crate) struct DatabaseInner {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) gate: ConnectionGate,
    pub(crate) config: StoreConfig,
    connect_lock: Mutex<()>,
}

/// Database handle
///
/// Owns the store connection and the gate every model operation waits on.
/// Cloning is cheap; clones share the same connection.
///
/// # Examples
///
/// ```ignore
/// let db = Database::in_memory();
/// let users = db.define_model(definition)?;
///
/// // Operations queue until the connection is up
/// db.connect().await?;
/// let mut alice = users.create_with(fields)?;
/// users.save(&mut alice).await?;
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn new(store: impl DocumentStore + 'static, config: StoreConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    pub fn from_shared(store: Arc<dyn DocumentStore>, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                store,
                gate: ConnectionGate::new(),
                config,
                connect_lock: Mutex::new(()),
            }),
        }
    }

    /// Embedded database backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), StoreConfig::default())
    }

    /// Connects the store and opens the gate. Connecting an already open
    /// database is a no-op; concurrent calls run the store hook once.
    pub async fn connect(&self) -> Result<()> {
        if self.inner.gate.is_open() {
            return Ok(());
        }

        let _guard = self.inner.connect_lock.lock().await;
        if self.inner.gate.is_open() {
            return Ok(());
        }

        self.inner.config.validate()?;
        if let Err(err) = self.inner.store.connect().await {
            event!(
                Level::ERROR,
                database = %self.inner.config.database,
                error = %err,
                "store connect failed"
            );
            return Err(err);
        }

        self.inner.gate.open();
        event!(
            Level::INFO,
            uri = %self.inner.config.uri,
            database = %self.inner.config.database,
            "database connected"
        );
        Ok(())
    }

    /// Waits until [`Database::connect`] has completed.
    pub async fn wait_connected(&self) {
        self.inner.gate.wait().await;
    }

    pub fn is_connected(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Closes the gate, then disconnects the store. Later operations wait for
    /// the next connect.
    pub async fn disconnect(&self) -> Result<()> {
        let _guard = self.inner.connect_lock.lock().await;
        self.inner.gate.close();
        self.inner.store.disconnect().await?;
        event!(Level::INFO, database = %self.inner.config.database, "database disconnected");
        Ok(())
    }

    /// Checks a model definition and binds it to this database.
    ///
    /// Every call yields an independent model: documents created or fetched
    /// through one are unmanaged for the other.
    pub fn define_model(&self, definition: ModelDefinition) -> Result<Model> {
        Model::new(self.inner.clone(), definition)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }
}
