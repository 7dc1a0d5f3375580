use crate::core::Document;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// One hand-authored upgrade step. Sync and async steps share this contract.
pub trait MigrationStep: Send + Sync {
    fn apply<'a>(&'a self, doc: &'a mut Document) -> BoxFuture<'a, anyhow::Result<()>>;
}

struct SyncStep<F>(F);

impl<F> MigrationStep for SyncStep<F>
where
    F: Fn(&mut Document) -> anyhow::Result<()> + Send + Sync,
{
    fn apply<'a>(&'a self, doc: &'a mut Document) -> BoxFuture<'a, anyhow::Result<()>> {
        let result = (self.0)(doc);
        Box::pin(async move { result })
    }
}

struct AsyncStep<F>(F);

impl<F> MigrationStep for AsyncStep<F>
where
    F: for<'a> Fn(&'a mut Document) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync,
{
    fn apply<'a>(&'a self, doc: &'a mut Document) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.0)(doc)
    }
}

/// Shared handle to a migration step attached to a schema version.
#[derive(Clone)]
pub struct Migration(Arc<dyn MigrationStep>);

impl Migration {
    /// Lifts a synchronous closure.
    pub fn sync<F>(migrate: F) -> Self
    where
        F: Fn(&mut Document) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(SyncStep(migrate)))
    }

    /// Wraps a closure returning a boxed future:
    /// `Migration::from_async(|doc| Box::pin(async move { ... }))`.
    pub fn from_async<F>(migrate: F) -> Self
    where
        F: for<'a> Fn(&'a mut Document) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(AsyncStep(migrate)))
    }

    pub fn from_step(step: impl MigrationStep + 'static) -> Self {
        Self(Arc::new(step))
    }

    pub async fn apply(&self, doc: &mut Document) -> anyhow::Result<()> {
        self.0.apply(doc).await
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Migration(..)")
    }
}
