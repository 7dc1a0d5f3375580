use crate::core::{DocId, Document, IDENTITY_FIELD, VERSION_FIELD, Value};

/// Conjunction of equality conditions on dotted field paths.
///
/// The reserved keys `_id` and `_v` address the document identity and the
/// stored schema version. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: DocId) -> Self {
        Self::new().eq(IDENTITY_FIELD, id)
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| condition_holds(doc, path, expected))
    }
}

fn condition_holds(doc: &Document, path: &str, expected: &Value) -> bool {
    match path {
        IDENTITY_FIELD => match (doc.id(), expected) {
            (Some(id), Value::Id(other)) => id == *other,
            (Some(id), Value::String(other)) => other.parse::<DocId>().is_ok_and(|o| o == id),
            (None, Value::Null) => true,
            _ => false,
        },
        VERSION_FIELD => expected
            .as_f64()
            .is_some_and(|v| v == f64::from(doc.schema_version())),
        _ => match doc.get_path(path) {
            Some(actual) => actual == expected,
            None => matches!(expected, Value::Null),
        },
    }
}
