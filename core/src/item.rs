//! Work items and their parameter assembly.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ItemErrorKind;
use crate::operations::{self, FieldDefault, FieldKind, FieldSpec, FreeText};
use crate::parser;

/// One unit of input: an operation, its free-text parameters and any
/// dedicated fields the operation defines.
///
/// Read as one JSON object per line, e.g.
/// `{"action": "TestCase.create", "summary": "Login", "text": "1. open\n2. log in"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub action: String,

    /// Free-text parameters. A string goes through the lenient parser; an
    /// already structured value is used as-is. Absent means `"{}"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WorkItem {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: None,
            fields: Map::new(),
        }
    }

    pub fn with_params(mut self, raw: impl Into<String>) -> Self {
        self.params = Some(Value::String(raw.into()));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    fn free_text(&self) -> Result<Value, ItemErrorKind> {
        match &self.params {
            None => Ok(Value::Object(Map::new())),
            Some(Value::String(raw)) => Ok(parser::parse(raw)?),
            Some(structured) => Ok(structured.clone()),
        }
    }

    /// Build the parameter value sent to the worker.
    pub fn assemble_parameters(&self) -> Result<Value, ItemErrorKind> {
        operations::validate_operation(&self.action).map_err(ItemErrorKind::InvalidItem)?;

        let Some(schema) = operations::schema_for(&self.action) else {
            return self.free_text();
        };

        let mut params = Map::new();
        for spec in schema.fields {
            params.insert(spec.name.to_string(), self.field_value(spec)?);
        }

        if schema.free_text == FreeText::MergedOver {
            match self.free_text()? {
                Value::Object(extra) => params.extend(extra),
                other => {
                    return Err(ItemErrorKind::InvalidItem(format!(
                        "params for {} must be a JSON object, got {}",
                        self.action,
                        short_type(&other)
                    )))
                }
            }
        }

        Ok(Value::Object(params))
    }

    fn field_value(&self, spec: &FieldSpec) -> Result<Value, ItemErrorKind> {
        let invalid = |detail: String| {
            ItemErrorKind::InvalidItem(format!("{}: field '{}' {detail}", self.action, spec.name))
        };

        let Some(raw) = self.fields.get(spec.name).filter(|v| !v.is_null()) else {
            return match spec.default {
                Some(FieldDefault::Number(n)) => Ok(Value::from(n)),
                Some(FieldDefault::Text(s)) => Ok(Value::from(s)),
                None => Err(invalid("is required".to_string())),
            };
        };

        match (spec.kind, raw) {
            (FieldKind::Number, Value::Number(_)) => Ok(raw.clone()),
            (FieldKind::Number, Value::String(s)) => parse_number(s.trim())
                .map(Value::Number)
                .ok_or_else(|| invalid(format!("expects a number, got '{s}'"))),
            (FieldKind::Number, other) => Err(invalid(format!(
                "expects a number, got {}",
                short_type(other)
            ))),
            (FieldKind::Text, Value::String(s)) if spec.default.is_none() && s.trim().is_empty() => {
                Err(invalid("is required".to_string()))
            }
            (FieldKind::Text, Value::String(_)) => Ok(raw.clone()),
            (FieldKind::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (FieldKind::Text, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (FieldKind::Text, other) => Err(invalid(format!(
                "expects text, got {}",
                short_type(other)
            ))),
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn short_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
