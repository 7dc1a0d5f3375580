use crate::core::{DocError, Document, Result};
use crate::schema::ModelDefinition;
use tracing::{Level, event};

/// What the runner did to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Already at the current version; nothing ran.
    Current,
    Upgraded {
        from: u32,
        to: u32,
        steps_applied: u32,
    },
}

impl MigrationOutcome {
    pub fn is_upgraded(&self) -> bool {
        matches!(self, Self::Upgraded { .. })
    }
}

/// Applies the pending part of a model's version chain to a stale document.
pub struct MigrationRunner<'a> {
    definition: &'a ModelDefinition,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(definition: &'a ModelDefinition) -> Self {
        Self { definition }
    }

    /// Runs the migrations attached to versions `stored + 1 ..= current` in
    /// ascending order, one at a time, then stamps the current version.
    ///
    /// On error the document may be partially migrated; callers must discard
    /// it rather than hand it out or persist it.
    pub async fn run(&self, doc: &mut Document) -> Result<MigrationOutcome> {
        let collection = self.definition.collection_name();
        let current = self.definition.current_version().ok_or_else(|| {
            DocError::InvalidDefinition(format!(
                "Model '{}' has no schema versions",
                collection
            ))
        })?;
        let stored = doc.schema_version();

        if stored == current {
            return Ok(MigrationOutcome::Current);
        }

        if stored > current {
            event!(
                Level::ERROR,
                collection = %collection,
                found = stored,
                supported = current,
                "document schema version is ahead of this application"
            );
            return Err(DocError::VersionOverrun {
                collection: collection.to_string(),
                id: describe_id(doc),
                found: stored,
                supported: current,
            });
        }

        let pending = &self.definition.versions()[(stored as usize + 1)..];
        let mut steps_applied = 0;
        for (offset, version) in pending.iter().enumerate() {
            let target = stored + 1 + offset as u32;
            let Some(migration) = version.migration() else {
                continue;
            };

            if let Err(err) = migration.apply(doc).await {
                event!(
                    Level::ERROR,
                    collection = %collection,
                    version = target,
                    error = %err,
                    "migration step failed"
                );
                return Err(DocError::Migration {
                    collection: collection.to_string(),
                    id: describe_id(doc),
                    version: target,
                    source: err.into(),
                });
            }
            steps_applied += 1;
            event!(Level::DEBUG, collection = %collection, version = target, "migration step applied");
        }

        doc.set_schema_version(current);
        Ok(MigrationOutcome::Upgraded {
            from: stored,
            to: current,
            steps_applied,
        })
    }
}

fn describe_id(doc: &Document) -> String {
    doc.id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<unsaved>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fields, Value};
    use crate::schema::{Migration, Property, SchemaNode, VersionedSchema};
    use std::sync::{Arc, Mutex};

    fn recording_definition(log: Arc<Mutex<Vec<u32>>>) -> ModelDefinition {
        let step = |version: u32, log: Arc<Mutex<Vec<u32>>>| {
            Migration::sync(move |doc| {
                log.lock().unwrap().push(version);
                doc.set(format!("v{}", version), true);
                Ok(())
            })
        };

        ModelDefinition::new("items")
            .version(VersionedSchema::new(SchemaNode::new()).with_migration(step(0, log.clone())))
            .version(VersionedSchema::new(SchemaNode::new()).with_migration(step(1, log.clone())))
            .schema(SchemaNode::new())
            .version(VersionedSchema::new(SchemaNode::new()).with_migration(step(3, log)))
    }

    #[tokio::test]
    async fn test_runs_pending_steps_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = recording_definition(log.clone());
        let mut doc = Document::new(0, Fields::new());

        let outcome = MigrationRunner::new(&definition).run(&mut doc).await.unwrap();

        assert_eq!(
            outcome,
            MigrationOutcome::Upgraded {
                from: 0,
                to: 3,
                steps_applied: 2
            }
        );
        assert_eq!(*log.lock().unwrap(), vec![1, 3]);
        assert_eq!(doc.schema_version(), 3);
        assert!(!doc.contains("v0"));
    }

    #[tokio::test]
    async fn test_partial_chain_starts_after_stored_version() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = recording_definition(log.clone());
        let mut doc = Document::new(1, Fields::new());

        MigrationRunner::new(&definition).run(&mut doc).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_current_document_is_untouched() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = recording_definition(log.clone());
        let mut doc = Document::new(3, Fields::new());

        let outcome = MigrationRunner::new(&definition).run(&mut doc).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Current);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_newer_document_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = recording_definition(log.clone());
        let mut doc = Document::new(7, Fields::new());

        let err = MigrationRunner::new(&definition).run(&mut doc).await.unwrap_err();
        assert!(matches!(
            err,
            DocError::VersionOverrun {
                found: 7,
                supported: 3,
                ..
            }
        ));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(doc.schema_version(), 7);
    }

    #[tokio::test]
    async fn test_failing_step_reports_version_and_stops() {
        let definition = ModelDefinition::new("items")
            .schema(SchemaNode::new())
            .version(
                VersionedSchema::new(SchemaNode::new().field("age", Property::number()))
                    .with_migration(Migration::sync(|_| Err(anyhow::anyhow!("boom")))),
            )
            .version(VersionedSchema::new(SchemaNode::new()).with_migration(Migration::sync(
                |doc| {
                    doc.set("unreachable", Value::Bool(true));
                    Ok(())
                },
            )));
        let mut doc = Document::new(0, Fields::new());

        let err = MigrationRunner::new(&definition).run(&mut doc).await.unwrap_err();
        match err {
            DocError::Migration { version, source, .. } => {
                assert_eq!(version, 1);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!doc.contains("unreachable"));
        assert_eq!(doc.schema_version(), 0);
    }
}
