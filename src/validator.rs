//! Recursive schema validation with default filling.
//!
//! The walker visits every declared field plus any extraneous field of an
//! object, resolves its property (explicit first, then catch-all) and either
//! checks the present value or handles its absence. Absent containers are
//! auto-populated, absent scalars receive their default in creation mode, and
//! required scalars without a value fail in strict mode.
//!
//! The only mutations are insertions of defaults and empty containers.

use crate::core::{DocError, DocId, Document, Fields, Result, Value, is_reserved};
use crate::schema::{Kind, Property, SchemaNode};

/// How absent fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required field must be present; no defaults are filled.
    Strict,
    /// Defaults are filled; missing required fields are left for save to catch.
    Creation,
    /// Every field is optional; no defaults are filled.
    Partial,
}

impl ValidationMode {
    fn fills_defaults(self) -> bool {
        matches!(self, Self::Creation)
    }

    fn requires_all(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Validates a whole document. Strict mode also requires an identity.
pub fn validate_document(schema: &SchemaNode, doc: &mut Document, mode: ValidationMode) -> Result<()> {
    if mode == ValidationMode::Strict && doc.id().is_none() {
        return Err(DocError::violation("_id", "document identity is missing"));
    }
    validate_fields(schema, doc.fields_mut(), mode)
}

/// Validates a field map against a schema node, recursing into nested models.
pub fn validate_fields(schema: &SchemaNode, fields: &mut Fields, mode: ValidationMode) -> Result<()> {
    Walker::new(mode).check_node(schema, fields)
}

struct Walker {
    mode: ValidationMode,
    path: Vec<String>,
}

impl Walker {
    fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            path: Vec::new(),
        }
    }

    fn current_path(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }
        self.path.join(".").replace(".[", "[")
    }

    fn violation(&self, message: impl Into<String>) -> DocError {
        DocError::violation(self.current_path(), message)
    }

    fn check_node(&mut self, schema: &SchemaNode, obj: &mut Fields) -> Result<()> {
        let extraneous: Vec<String> = obj
            .keys()
            .filter(|key| !schema.declares(key) && !is_reserved(key))
            .cloned()
            .collect();

        if !extraneous.is_empty() && schema.catch_all_property().is_none() {
            return Err(self.violation(format!(
                "Invalid properties set: [{}]",
                extraneous.join(", ")
            )));
        }

        let keys: Vec<String> = schema.field_names().cloned().chain(extraneous).collect();
        for key in keys {
            let Some(property) = schema.resolve(&key) else {
                continue;
            };
            self.path.push(key.clone());
            self.check_field(property, obj, &key)?;
            self.path.pop();
        }
        Ok(())
    }

    fn check_field(&mut self, property: &Property, obj: &mut Fields, key: &str) -> Result<()> {
        match obj.get_mut(key) {
            Some(Value::Null) if property.allows_null() => Ok(()),
            Some(Value::Null) | None => self.fill_absent(property, obj, key),
            Some(value) => self.check_present(property, value),
        }
    }

    fn fill_absent(&mut self, property: &Property, obj: &mut Fields, key: &str) -> Result<()> {
        if property.is_array() {
            if !property.is_optional() {
                obj.insert(key.to_string(), Value::Array(Vec::new()));
            }
            return Ok(());
        }

        if let Kind::Model(node) = property.kind() {
            if !property.is_optional() {
                obj.insert(key.to_string(), Value::Object(Fields::new()));
            }
            if let Some(Value::Object(child)) = obj.get_mut(key) {
                self.check_node(node, child)?;
            }
            return Ok(());
        }

        if self.mode.fills_defaults() {
            if let Some(default) = property.default_value() {
                let value = default.resolve(obj);
                obj.insert(key.to_string(), value);
                return Ok(());
            }
        }

        if !property.is_optional() && self.mode.requires_all() {
            return Err(self.violation("should be defined"));
        }
        Ok(())
    }

    fn check_present(&mut self, property: &Property, value: &mut Value) -> Result<()> {
        if !property.is_array() {
            return self.check_element(property, value);
        }

        let Value::Array(items) = value else {
            return Err(self.violation(format!("should be an Array, found {}", value.type_name())));
        };
        for (index, item) in items.iter_mut().enumerate() {
            self.path.push(format!("[{}]", index));
            self.check_element(property, item)?;
            self.path.pop();
        }
        Ok(())
    }

    fn check_element(&mut self, property: &Property, value: &mut Value) -> Result<()> {
        let kind_matches = match property.kind() {
            Kind::Model(node) => {
                return match value {
                    Value::Object(child) => self.check_node(node, child),
                    other => Err(self.violation(format!(
                        "should be an Object, found {}",
                        other.type_name()
                    ))),
                };
            }
            Kind::String => matches!(value, Value::String(_)),
            Kind::Number => matches!(value, Value::Number(_)),
            Kind::Boolean => matches!(value, Value::Bool(_)),
            Kind::Date => matches!(value, Value::Date(_)),
            Kind::Identity => match value {
                Value::Id(_) => true,
                Value::String(s) => DocId::is_valid(s),
                _ => false,
            },
            Kind::List => matches!(value, Value::Array(_)),
            Kind::Map => matches!(value, Value::Object(_)),
            Kind::Any => true,
        };

        if !kind_matches {
            return Err(self.violation(format!(
                "should be of type {}, found {}",
                property.kind().name(),
                value.type_name()
            )));
        }

        if let Some(check) = &property.validator {
            if let Some(message) = check(value) {
                return Err(self.violation(message));
            }
        }
        Ok(())
    }
}
