/// Model lifecycle tests
///
/// Create, save, reload, increment and delete through a model backed by the
/// in-memory store.
/// Run with: cargo test --test model_lifecycle_tests

use safedoc::{
    Database, DocError, DocId, DocumentStore, Filter, MemoryStore, Model, ModelDefinition,
    Property, SchemaNode, StoreConfig, Value,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn user_definition() -> ModelDefinition {
    ModelDefinition::new("users").schema(
        SchemaNode::new()
            .field("name", Property::string().default("NONAME"))
            .field("age", Property::number())
            .field("nick", Property::string().optional())
            .field("tags", Property::string().array()),
    )
}

async fn connected() -> (Database, Arc<MemoryStore>, Model) {
    let store = Arc::new(MemoryStore::new());
    let db = Database::from_shared(store.clone(), StoreConfig::default());
    let users = db.define_model(user_definition()).unwrap();
    db.connect().await.unwrap();
    (db, store, users)
}

async fn stored_count(store: &MemoryStore) -> usize {
    store
        .collection("users")
        .await
        .unwrap()
        .find(&Filter::new())
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_missing_required_field_fails_on_save() {
    let (_db, store, users) = connected().await;

    let mut doc = users.create().unwrap();
    assert_eq!(doc.get("name"), Some(&Value::from("NONAME")));

    let err = users.save(&mut doc).await.unwrap_err();
    match err {
        DocError::SchemaViolation { path, .. } => assert_eq!(path, "age"),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(doc.is_new());
    assert_eq!(stored_count(&store).await, 0);
}

#[tokio::test]
async fn test_save_new_assigns_identity_and_reloads_equal() {
    let (_db, _store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 5})).unwrap();
    users.save(&mut doc).await.unwrap();

    assert!(doc.is_fetched());
    let id = doc.id().expect("identity assigned on insert");
    assert_eq!(
        doc.to_json(),
        json!({"_id": id.to_string(), "_v": 0, "name": "NONAME", "age": 5, "tags": []})
    );

    let loaded = users.find_by_id(&id).await.unwrap().expect("document stored");
    assert_eq!(loaded.document(), doc.document());
    assert!(!loaded.is_modified());
}

#[tokio::test]
async fn test_second_save_replaces_instead_of_inserting() {
    let (_db, store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 20})).unwrap();
    users.save(&mut doc).await.unwrap();
    let id = doc.id().unwrap();

    doc.set("age", 21);
    users.save(&mut doc).await.unwrap();
    users.save(&mut doc).await.unwrap();

    assert_eq!(doc.id(), Some(id));
    assert_eq!(stored_count(&store).await, 1);
    let stored = users.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.get("age"), Some(&Value::from(21)));
}

#[tokio::test]
async fn test_caller_supplied_identity_is_discarded_on_insert() {
    let (_db, _store, users) = connected().await;

    let forged = DocId::generate();
    let mut doc = users.create_from_json(json!({"age": 1})).unwrap();
    doc.set_id(Some(forged));
    users.save(&mut doc).await.unwrap();

    assert_ne!(doc.id(), Some(forged));
    assert!(users.find_by_id(&forged).await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_fetched_replaces_fully() {
    let (_db, _store, users) = connected().await;

    let mut doc = users
        .create_from_json(json!({"age": 30, "nick": "al", "tags": ["a"]}))
        .unwrap();
    users.save(&mut doc).await.unwrap();
    let id = doc.id().unwrap();

    let mut fetched = users.find_by_id(&id).await.unwrap().unwrap();
    fetched.remove("nick");
    fetched.set("age", 31);
    fetched.set("tags", Value::Array(vec!["b".into(), "c".into()]));
    assert!(fetched.is_modified());
    users.save(&mut fetched).await.unwrap();

    let reloaded = users.find_by_id(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(reloaded.document(), fetched.document());
    assert!(!reloaded.contains("nick"));
}

#[tokio::test]
async fn test_invalid_fetched_document_is_not_saved() {
    let (_db, _store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 30})).unwrap();
    users.save(&mut doc).await.unwrap();

    doc.set("age", "thirty");
    assert!(users.save(&mut doc).await.unwrap_err().is_schema_violation());

    let stored = users.find_by_id(&*doc).await.unwrap().unwrap();
    assert_eq!(stored.get("age"), Some(&Value::from(30)));
}

#[tokio::test]
async fn test_documents_from_other_models_are_unmanaged() {
    let (db, store, users) = connected().await;
    let other = db.define_model(user_definition()).unwrap();

    let mut doc = other.create_from_json(json!({"age": 3})).unwrap();
    let err = users.save(&mut doc).await.unwrap_err();
    assert!(matches!(err, DocError::UnmanagedObject { .. }));
    assert_eq!(stored_count(&store).await, 0);

    other.save(&mut doc).await.unwrap();
    let err = users.increment(&mut doc, "age", 1.0).await.unwrap_err();
    assert!(matches!(err, DocError::UnmanagedObject { .. }));
}

#[tokio::test]
async fn test_fetched_baselines_are_independent() {
    let (_db, _store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 7})).unwrap();
    users.save(&mut doc).await.unwrap();

    let mut first = users.find(&Filter::new().eq("age", 7)).await.unwrap();
    let second = users.find_one(&Filter::new().eq("age", 7)).await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    first[0].set("age", 8);
    assert_eq!(first[0].baseline().unwrap().get("age"), Some(&Value::from(7)));
    assert_eq!(second.get("age"), Some(&Value::from(7)));
    assert!(!second.is_modified());
}

#[tokio::test]
async fn test_increment_by_identity_touches_only_that_field() {
    let (_db, store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 10, "nick": "n"})).unwrap();
    users.save(&mut doc).await.unwrap();
    let id = doc.id().unwrap();

    users.increment(id, "age", 5.0).await.unwrap();
    users.increment_by_one(&id.to_string(), "age").await.unwrap();

    let raw = store
        .collection("users")
        .await
        .unwrap()
        .find_one(&Filter::by_id(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw.get("age"), Some(&Value::from(16)));
    assert_eq!(raw.get("nick"), Some(&Value::from("n")));
    assert_eq!(raw.schema_version(), 0);

    // The live handle was not passed in, so it still holds the old value.
    assert_eq!(doc.get("age"), Some(&Value::from(10)));
}

#[tokio::test]
async fn test_increment_tracked_document_updates_memory_and_store() {
    let (_db, _store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 1})).unwrap();
    users.save(&mut doc).await.unwrap();

    users.increment(&mut doc, "age", 2.0).await.unwrap();
    assert_eq!(doc.get("age"), Some(&Value::from(3)));

    let stored = users.find_by_id(&*doc).await.unwrap().unwrap();
    assert_eq!(stored.get("age"), Some(&Value::from(3)));
}

#[tokio::test]
async fn test_increment_new_document_is_in_memory_only() {
    let (_db, store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 1})).unwrap();
    users.increment(&mut doc, "age", 4.0).await.unwrap();

    assert_eq!(doc.get("age"), Some(&Value::from(5)));
    assert!(doc.is_new());
    assert_eq!(stored_count(&store).await, 0);
}

#[tokio::test]
async fn test_increment_rejects_non_numeric_fields() {
    let (_db, _store, users) = connected().await;

    let mut doc = users.create_from_json(json!({"age": 1})).unwrap();
    users.save(&mut doc).await.unwrap();

    let err = users.increment(&mut doc, "name", 1.0).await.unwrap_err();
    assert!(err.is_schema_violation());
    let err = users.increment(&mut doc, "tags", 1.0).await.unwrap_err();
    assert!(err.is_schema_violation());

    let stored = users.find_by_id(&*doc).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&Value::from("NONAME")));
}

#[tokio::test]
async fn test_delete_by_identity_forms_and_filter() {
    let (_db, store, users) = connected().await;

    let mut ids = Vec::new();
    for age in [1, 2, 3, 3] {
        let mut doc = users.create_from_json(json!({"age": age})).unwrap();
        users.save(&mut doc).await.unwrap();
        ids.push(doc.id().unwrap());
    }

    assert!(users.delete(&ids[0]).await.unwrap());
    assert!(!users.delete(&ids[0]).await.unwrap());
    assert!(users.delete(ids[1].to_string().as_str()).await.unwrap());
    assert_eq!(users.delete_by_filter(&Filter::new().eq("age", 3)).await.unwrap(), 2);
    assert_eq!(stored_count(&store).await, 0);
}

#[tokio::test]
async fn test_invalid_identity_strings_are_rejected() {
    let (_db, _store, users) = connected().await;

    let err = users.find_by_id("not-an-id").await.unwrap_err();
    assert!(matches!(err, DocError::InvalidIdentity(_)));

    let doc = users.create_from_json(json!({"age": 1})).unwrap();
    let err = users.delete(&*doc).await.unwrap_err();
    assert!(matches!(err, DocError::InvalidIdentity(_)));
}

#[tokio::test]
async fn test_computed_defaults_run_per_create() {
    let counter = Arc::new(AtomicU64::new(0));
    let seq = counter.clone();
    let db = Database::in_memory();
    let model = db
        .define_model(ModelDefinition::new("tickets").schema(
            SchemaNode::new().field(
                "number",
                Property::number().default_with(move |_| {
                    Value::from(seq.fetch_add(1, Ordering::SeqCst) as f64)
                }),
            ),
        ))
        .unwrap();

    let a = model.create().unwrap();
    let b = model.create().unwrap();
    assert_eq!(a.get("number"), Some(&Value::from(0)));
    assert_eq!(b.get("number"), Some(&Value::from(1)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_operations_wait_for_connection() {
    let db = Database::in_memory();
    let users = db.define_model(user_definition()).unwrap();

    let pending = {
        let users = users.clone();
        tokio::spawn(async move {
            let mut doc = users.create_from_json(json!({"age": 2})).unwrap();
            users.save(&mut doc).await.map(|_| doc.id())
        })
    };

    tokio::task::yield_now().await;
    assert!(!pending.is_finished());

    db.connect().await.unwrap();
    let id = pending.await.unwrap().unwrap();
    assert!(id.is_some());
    assert!(users.find_by_id(&id.unwrap()).await.unwrap().is_some());
}
