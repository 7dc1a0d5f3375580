use crate::core::{DocError, DocId, Fields, IdentityRef, Result, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reserved key holding the store-assigned identity in the persisted layout.
pub const IDENTITY_FIELD: &str = "_id";

/// Reserved key holding the schema version in the persisted layout.
pub const VERSION_FIELD: &str = "_v";

pub fn is_reserved(key: &str) -> bool {
    key == IDENTITY_FIELD || key == VERSION_FIELD
}

/// A stored or storable document: reserved identity and schema version plus
/// the declared fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    id: Option<DocId>,
    schema_version: u32,
    fields: Fields,
}

impl Document {
    pub fn new(schema_version: u32, fields: Fields) -> Self {
        Self {
            id: None,
            schema_version,
            fields,
        }
    }

    pub fn with_id(mut self, id: DocId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<DocId> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<DocId>) {
        self.id = id;
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn set_schema_version(&mut self, schema_version: u32) {
        self.schema_version = schema_version;
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a declared field. Reserved keys are not fields; use `set_id` /
    /// `set_schema_version` for those.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Resolves a dotted path (`"meta.gender"`) through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Adds `amount` to the number at a dotted path and returns the new value.
    /// A missing leaf starts from zero; missing parents become empty objects.
    pub fn increment(&mut self, path: &str, amount: f64) -> Result<f64> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(leaf) = segments.pop() else {
            return Err(DocError::violation(path, "empty field path"));
        };

        let mut target = &mut self.fields;
        for segment in segments {
            target = target
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Fields::new()))
                .as_object_mut()
                .ok_or_else(|| {
                    DocError::violation(path, format!("'{}' is not an object", segment))
                })?;
        }

        match target.entry(leaf.to_string()).or_insert(Value::Number(0.0)) {
            Value::Number(n) => {
                *n += amount;
                Ok(*n)
            }
            other => Err(DocError::violation(
                path,
                format!("cannot increment a value of type {}", other.type_name()),
            )),
        }
    }

    /// Builds a document from a JSON object, lifting `_id` and `_v` out of the
    /// field map.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(DocError::Serialization(
                "Document JSON root must be an object".to_string(),
            ));
        };

        let mut document = Document::default();
        for (key, value) in map {
            match key.as_str() {
                IDENTITY_FIELD => {
                    document.id = match value {
                        serde_json::Value::Null => None,
                        serde_json::Value::String(s) => Some(s.parse()?),
                        other => {
                            return Err(DocError::InvalidIdentity(format!(
                                "'{}' must be a string, found {}",
                                IDENTITY_FIELD, other
                            )));
                        }
                    };
                }
                VERSION_FIELD => {
                    let version = value.as_u64().ok_or_else(|| {
                        DocError::Serialization(format!(
                            "'{}' must be a non-negative integer",
                            VERSION_FIELD
                        ))
                    })?;
                    document.schema_version = u32::try_from(version).map_err(|_| {
                        DocError::Serialization(format!(
                            "'{}' value {} is out of range",
                            VERSION_FIELD, version
                        ))
                    })?;
                }
                _ => {
                    document.fields.insert(key, Value::from_json(value));
                }
            }
        }
        Ok(document)
    }

    /// Renders the persisted layout: `_id` (when assigned), `_v`, then fields.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        if let Some(id) = self.id {
            map.insert(
                IDENTITY_FIELD.to_string(),
                serde_json::Value::String(id.to_string()),
            );
        }
        map.insert(
            VERSION_FIELD.to_string(),
            serde_json::Value::from(self.schema_version),
        );
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// Deserializes the persisted layout into an application type.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl IdentityRef for Document {
    fn to_doc_id(&self) -> Result<DocId> {
        self.id.ok_or_else(|| {
            DocError::InvalidIdentity("document has not been persisted yet".to_string())
        })
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Document::from_json(json).map_err(serde::de::Error::custom)
    }
}
