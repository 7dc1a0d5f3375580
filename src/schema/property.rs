use crate::core::{Fields, Value};
use crate::schema::SchemaNode;
use std::fmt;
use std::sync::Arc;

/// The closed set of value kinds a property can require.
#[derive(Debug, Clone)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Date,
    /// Reference to another document's identity.
    Identity,
    /// Untyped sequence.
    List,
    /// Untyped map.
    Map,
    /// Wildcard, accepts anything.
    Any,
    /// Nested document validated against its own schema node.
    Model(SchemaNode),
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "Date",
            Self::Identity => "DocId",
            Self::List => "Array",
            Self::Map => "Object",
            Self::Any => "any",
            Self::Model(_) => "model",
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

pub type ComputedDefaultFn = Arc<dyn Fn(&Fields) -> Value + Send + Sync>;

/// Value filled in at creation time when a field is absent.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Computed per creation from the enclosing object.
    Computed(ComputedDefaultFn),
}

impl DefaultValue {
    pub fn resolve(&self, enclosing: &Fields) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(compute) => compute(enclosing),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Custom check run after the kind check; `Some(message)` rejects the value.
pub type CustomValidatorFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Per-field rule: kind, array-ness, optionality, nullability, default and an
/// optional custom check.
#[derive(Clone)]
pub struct Property {
    pub(crate) kind: Kind,
    pub(crate) array: bool,
    pub(crate) optional: bool,
    pub(crate) allow_null: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) validator: Option<CustomValidatorFn>,
}

impl Property {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            array: false,
            optional: false,
            allow_null: false,
            default: None,
            validator: None,
        }
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn number() -> Self {
        Self::new(Kind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(Kind::Date)
    }

    pub fn identity() -> Self {
        Self::new(Kind::Identity)
    }

    pub fn list() -> Self {
        Self::new(Kind::List)
    }

    pub fn map() -> Self {
        Self::new(Kind::Map)
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }

    pub fn model(node: SchemaNode) -> Self {
        Self::new(Kind::Model(node))
    }

    /// The field holds a sequence of values of this kind.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, compute: F) -> Self
    where
        F: Fn(&Fields) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(compute)));
        self
    }

    pub fn validate_with<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(check));
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn allows_null(&self) -> bool {
        self.allow_null
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("kind", &self.kind)
            .field("array", &self.array)
            .field("optional", &self.optional)
            .field("allow_null", &self.allow_null)
            .field("default", &self.default)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_flags() {
        let property = Property::string().array().optional().allow_null();
        assert!(property.is_array());
        assert!(property.is_optional());
        assert!(property.allows_null());
        assert!(property.default_value().is_none());
        assert_eq!(property.kind().name(), "string");
    }

    #[test]
    fn test_computed_default_sees_enclosing_object() {
        let property = Property::string().default_with(|enclosing| {
            let first = enclosing.get("first").and_then(|v| v.as_str()).unwrap_or("");
            Value::from(format!("{}!", first))
        });

        let mut enclosing = Fields::new();
        enclosing.insert("first".to_string(), Value::from("hey"));
        let resolved = property.default_value().unwrap().resolve(&enclosing);
        assert_eq!(resolved, Value::from("hey!"));
    }

    #[test]
    fn test_debug_hides_closures() {
        let property = Property::number().default_with(|_| Value::from(1)).validate_with(|_| None);
        let rendered = format!("{:?}", property);
        assert!(rendered.contains("Computed(..)"));
        assert!(rendered.contains("has_validator: true"));
    }
}
