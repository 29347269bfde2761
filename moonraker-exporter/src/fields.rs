//! Tolerant projection of an untyped Moonraker field bag onto a typed shape.
//!
//! Moonraker only reports the fields that make sense for the current firmware state,
//! so every field is optional here: a missing or mistyped field falls back to the zero
//! value of its kind instead of failing the whole object.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Untyped status of a single printer object, as returned by the status query.
pub type FieldBag = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Bool,
    Text,
}

impl FieldKind {
    pub fn zero(self) -> FieldValue {
        match self {
            FieldKind::Float => FieldValue::Float(0.0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Text => FieldValue::Text(String::new()),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Float => "number",
            FieldKind::Bool => "bool",
            FieldKind::Text => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeFieldError {
    #[error("field `{field}` is missing")]
    Missing { field: &'static str },
    #[error("field `{field}` should be a {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Reads one field of the expected kind. Integers widen to `f64`.
pub fn project_field(bag: &FieldBag, field: &'static str, kind: FieldKind) -> Result<FieldValue, DecodeFieldError> {
    let value = bag.get(field).ok_or(DecodeFieldError::Missing { field })?;
    let projected = match (kind, value) {
        (FieldKind::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float),
        (FieldKind::Bool, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
        _ => None,
    };
    projected.ok_or(DecodeFieldError::WrongType {
        field,
        expected: kind.name(),
        found: json_kind(value),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field values projected for one shape, every declared field present.
#[derive(Debug, Default)]
pub struct Projected {
    values: HashMap<&'static str, FieldValue>,
}

impl Projected {
    pub fn float(&self, field: &str) -> f64 {
        match self.values.get(field) {
            Some(FieldValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    pub fn boolean(&self, field: &str) -> bool {
        matches!(self.values.get(field), Some(FieldValue::Bool(true)))
    }

    pub fn text(&self, field: &str) -> String {
        match self.values.get(field) {
            Some(FieldValue::Text(v)) => v.clone(),
            _ => String::new(),
        }
    }
}

/// A decoded shape: its field list plus a constructor from projected values.
pub trait Shape: Sized {
    const FIELDS: &'static [(&'static str, FieldKind)];

    fn from_projected(fields: &Projected) -> Self;
}

/// Projects `bag` onto `S`, returning the shape and every field that fell back to zero.
pub fn project_with_errors<S: Shape>(bag: &FieldBag) -> (S, Vec<DecodeFieldError>) {
    let mut projected = Projected::default();
    let mut errors = Vec::new();
    for &(field, kind) in S::FIELDS {
        let value = project_field(bag, field, kind).unwrap_or_else(|e| {
            errors.push(e);
            kind.zero()
        });
        projected.values.insert(field, value);
    }
    (S::from_projected(&projected), errors)
}

/// Projects `bag` onto `S`; field errors are logged and replaced with zero values.
pub fn project<S: Shape>(object: &str, bag: &FieldBag) -> S {
    let (shape, errors) = project_with_errors::<S>(bag);
    for e in errors {
        match e {
            DecodeFieldError::Missing { .. } => trace!(object, "{e}"),
            DecodeFieldError::WrongType { .. } => debug!(object, "{e}"),
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> FieldBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[derive(Debug, PartialEq)]
    struct Probe {
        temperature: f64,
        enabled: bool,
        label: String,
    }

    impl Shape for Probe {
        const FIELDS: &'static [(&'static str, FieldKind)] = &[
            ("temperature", FieldKind::Float),
            ("enabled", FieldKind::Bool),
            ("label", FieldKind::Text),
        ];

        fn from_projected(f: &Projected) -> Self {
            Self {
                temperature: f.float("temperature"),
                enabled: f.boolean("enabled"),
                label: f.text("label"),
            }
        }
    }

    #[test]
    fn test_project_full_bag() {
        let (probe, errors) =
            project_with_errors::<Probe>(&bag(json!({"temperature": 21.5, "enabled": true, "label": "x"})));
        assert!(errors.is_empty());
        assert_eq!(probe, Probe { temperature: 21.5, enabled: true, label: "x".into() });
    }

    #[test]
    fn test_integers_widen() {
        let (probe, _) = project_with_errors::<Probe>(&bag(json!({"temperature": 60})));
        assert_eq!(probe.temperature, 60.0);
    }

    #[test]
    fn test_missing_and_mistyped_fields_fall_back() {
        let (probe, errors) =
            project_with_errors::<Probe>(&bag(json!({"temperature": "hot", "enabled": null})));
        assert_eq!(probe, Probe { temperature: 0.0, enabled: false, label: String::new() });
        assert_eq!(
            errors,
            vec![
                DecodeFieldError::WrongType { field: "temperature", expected: "number", found: "string" },
                DecodeFieldError::WrongType { field: "enabled", expected: "bool", found: "null" },
                DecodeFieldError::Missing { field: "label" },
            ]
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        let probe: Probe = project("probe", &bag(json!({"temperature": 1.0, "position": [0, 1, 2]})));
        assert_eq!(probe.temperature, 1.0);
    }
}
