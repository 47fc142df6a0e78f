//! Typed element values.
//!
//! [`ElementValue`] is the value-only view of a [`SubmodelElement`]: what
//! asset connections read and write, what value-change events carry, and
//! what a raw client string is parsed into.
//!
//! Parsing is shape-driven. The element currently stored decides how a raw
//! string is interpreted: a property parses by its declared [`ValueType`],
//! blobs and collections parse a JSON document.

use crate::model::SubmodelElement;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use twin_types::ErrorCode;

/// Declared type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Integer,
    Double,
    Boolean,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Integer(i64),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl DataValue {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Double(_) => ValueType::Double,
            Self::Boolean(_) => ValueType::Boolean,
            Self::String(_) => ValueType::String,
        }
    }

    /// Parses `raw` as a value of type `value_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueParseError::InvalidLiteral`] if `raw` is not a valid
    /// literal of the requested type.
    pub fn parse(raw: &str, value_type: ValueType) -> Result<Self, ValueParseError> {
        let invalid = || ValueParseError::InvalidLiteral {
            raw: raw.to_string(),
            value_type,
        };
        match value_type {
            ValueType::Integer => raw.trim().parse().map(Self::Integer).map_err(|_| invalid()),
            ValueType::Double => raw.trim().parse().map(Self::Double).map_err(|_| invalid()),
            ValueType::Boolean => match raw.trim() {
                "true" | "1" => Ok(Self::Boolean(true)),
                "false" | "0" => Ok(Self::Boolean(false)),
                _ => Err(invalid()),
            },
            ValueType::String => Ok(Self::String(raw.to_string())),
        }
    }

    fn from_json(json: &serde_json::Value, value_type: ValueType) -> Result<Self, ValueParseError> {
        use serde_json::Value as Json;
        let invalid = || ValueParseError::InvalidLiteral {
            raw: json.to_string(),
            value_type,
        };
        match (value_type, json) {
            (_, Json::String(s)) => Self::parse(s, value_type),
            (ValueType::Integer, Json::Number(n)) => n.as_i64().map(Self::Integer).ok_or_else(invalid),
            (ValueType::Double, Json::Number(n)) => n.as_f64().map(Self::Double).ok_or_else(invalid),
            (ValueType::Boolean, Json::Bool(b)) => Ok(Self::Boolean(*b)),
            (ValueType::String, Json::Number(n)) => Ok(Self::String(n.to_string())),
            (ValueType::String, Json::Bool(b)) => Ok(Self::String(b.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// Value of one submodel element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementValue {
    Property(Option<DataValue>),
    Blob {
        content_type: String,
        value: Option<String>,
    },
    /// Child values in model order.
    Collection(Vec<(String, ElementValue)>),
    /// Operations carry no value.
    Operation,
}

#[derive(Deserialize)]
struct BlobDocument {
    #[serde(alias = "contentType")]
    content_type: Option<String>,
    value: Option<String>,
}

impl ElementValue {
    /// Parses a raw client string using the shape of `like`.
    ///
    /// # Errors
    ///
    /// - [`ValueParseError::InvalidLiteral`] for malformed property values
    /// - [`ValueParseError::InvalidJson`] for malformed blob/collection documents
    /// - [`ValueParseError::UnknownChild`] for collection keys `like` lacks
    /// - [`ValueParseError::NotSettable`] for operations
    ///
    /// # Example
    ///
    /// ```
    /// use twin_model::{DataValue, ElementValue, SubmodelElement, ValueType};
    ///
    /// let temp = SubmodelElement::property("Temperature", ValueType::Double, None);
    /// let parsed = ElementValue::parse("42.5", &temp).unwrap();
    /// assert_eq!(parsed, ElementValue::Property(Some(DataValue::Double(42.5))));
    /// ```
    pub fn parse(raw: &str, like: &SubmodelElement) -> Result<Self, ValueParseError> {
        match like {
            SubmodelElement::Property(p) => {
                if p.value_type != ValueType::String && raw.trim().is_empty() {
                    return Ok(Self::Property(None));
                }
                DataValue::parse(raw, p.value_type).map(|v| Self::Property(Some(v)))
            }
            SubmodelElement::Operation(op) => Err(ValueParseError::NotSettable {
                id_short: op.id_short.clone(),
            }),
            SubmodelElement::Blob(_) | SubmodelElement::Collection(_) => {
                let json: serde_json::Value = serde_json::from_str(raw)
                    .map_err(|e| ValueParseError::InvalidJson(e.to_string()))?;
                Self::from_json(&json, like)
            }
        }
    }

    /// Converts an already-decoded JSON document using the shape of `like`.
    ///
    /// # Errors
    ///
    /// Same as [`ElementValue::parse`].
    pub fn from_json(json: &serde_json::Value, like: &SubmodelElement) -> Result<Self, ValueParseError> {
        use serde_json::Value as Json;
        match like {
            SubmodelElement::Property(p) => match json {
                Json::Null => Ok(Self::Property(None)),
                other => DataValue::from_json(other, p.value_type).map(|v| Self::Property(Some(v))),
            },
            SubmodelElement::Blob(b) => {
                let doc: BlobDocument = serde_json::from_value(json.clone())
                    .map_err(|e| ValueParseError::InvalidJson(e.to_string()))?;
                Ok(Self::Blob {
                    content_type: doc.content_type.unwrap_or_else(|| b.content_type.clone()),
                    value: doc.value,
                })
            }
            SubmodelElement::Collection(c) => {
                let Json::Object(map) = json else {
                    return Err(ValueParseError::ShapeMismatch {
                        id_short: c.id_short.clone(),
                        expected: "collection",
                    });
                };
                if let Some(unknown) = map.keys().find(|k| c.child(k.as_str()).is_none()) {
                    return Err(ValueParseError::UnknownChild {
                        id_short: unknown.clone(),
                    });
                }
                let mut values = Vec::with_capacity(c.value.len());
                for child in &c.value {
                    let v = match map.get(child.id_short()) {
                        Some(j) => Self::from_json(j, child)?,
                        None => child.value(),
                    };
                    values.push((child.id_short().to_string(), v));
                }
                Ok(Self::Collection(values))
            }
            SubmodelElement::Operation(op) => Err(ValueParseError::NotSettable {
                id_short: op.id_short.clone(),
            }),
        }
    }

    /// Returns the property value, if this is a property.
    #[must_use]
    pub fn as_data(&self) -> Option<&DataValue> {
        match self {
            Self::Property(v) => v.as_ref(),
            _ => None,
        }
    }
}

/// Failure to parse or apply an element value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueParseError {
    #[error("'{raw}' is not a valid {value_type}")]
    InvalidLiteral { raw: String, value_type: ValueType },

    #[error("invalid JSON value: {0}")]
    InvalidJson(String),

    #[error("value for '{id_short}' must be a {expected}")]
    ShapeMismatch {
        id_short: String,
        expected: &'static str,
    },

    #[error("collection has no child '{id_short}'")]
    UnknownChild { id_short: String },

    #[error("element '{id_short}' has no settable value")]
    NotSettable { id_short: String },
}

impl ErrorCode for ValueParseError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidLiteral { .. } => "VALUE_INVALID_LITERAL",
            Self::InvalidJson(_) => "VALUE_INVALID_JSON",
            Self::ShapeMismatch { .. } => "VALUE_SHAPE_MISMATCH",
            Self::UnknownChild { .. } => "VALUE_UNKNOWN_CHILD",
            Self::NotSettable { .. } => "VALUE_NOT_SETTABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubmodelElement;
    use serde_json::json;
    use twin_types::assert_error_codes;

    fn motor() -> SubmodelElement {
        SubmodelElement::collection(
            "Motor1",
            vec![
                SubmodelElement::property("Temperature", ValueType::Double, Some(DataValue::Double(40.0))),
                SubmodelElement::property("Running", ValueType::Boolean, Some(DataValue::Boolean(false))),
            ],
        )
    }

    #[test]
    fn parse_property_by_declared_type() {
        let int = SubmodelElement::property("Count", ValueType::Integer, None);
        assert_eq!(
            ElementValue::parse(" 7 ", &int).unwrap(),
            ElementValue::Property(Some(DataValue::Integer(7)))
        );
        assert!(matches!(
            ElementValue::parse("7.5", &int),
            Err(ValueParseError::InvalidLiteral { value_type: ValueType::Integer, .. })
        ));

        let flag = SubmodelElement::property("On", ValueType::Boolean, None);
        assert_eq!(
            ElementValue::parse("true", &flag).unwrap().as_data(),
            Some(&DataValue::Boolean(true))
        );

        let name = SubmodelElement::property("Name", ValueType::String, None);
        assert_eq!(
            ElementValue::parse("", &name).unwrap(),
            ElementValue::Property(Some(DataValue::String(String::new())))
        );
    }

    #[test]
    fn parse_empty_non_string_clears_value() {
        let temp = SubmodelElement::property("T", ValueType::Double, Some(DataValue::Double(1.0)));
        assert_eq!(ElementValue::parse("", &temp).unwrap(), ElementValue::Property(None));
    }

    #[test]
    fn parse_collection_keeps_model_order_and_fills_missing() {
        let parsed = ElementValue::parse(r#"{"Temperature": 42.5}"#, &motor()).unwrap();
        assert_eq!(
            parsed,
            ElementValue::Collection(vec![
                ("Temperature".into(), ElementValue::Property(Some(DataValue::Double(42.5)))),
                ("Running".into(), ElementValue::Property(Some(DataValue::Boolean(false)))),
            ])
        );
    }

    #[test]
    fn parse_collection_rejects_unknown_child() {
        let err = ElementValue::parse(r#"{"Speed": 1}"#, &motor()).unwrap_err();
        assert_eq!(
            err,
            ValueParseError::UnknownChild {
                id_short: "Speed".into()
            }
        );
    }

    #[test]
    fn parse_collection_requires_object() {
        assert!(matches!(
            ElementValue::from_json(&json!([1, 2]), &motor()),
            Err(ValueParseError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            ElementValue::parse("{not json", &motor()),
            Err(ValueParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn parse_blob_defaults_content_type() {
        let blob = SubmodelElement::blob("Manual", "application/pdf", None);
        let parsed = ElementValue::parse(r#"{"value": "aGVsbG8="}"#, &blob).unwrap();
        assert_eq!(
            parsed,
            ElementValue::Blob {
                content_type: "application/pdf".into(),
                value: Some("aGVsbG8=".into()),
            }
        );
    }

    #[test]
    fn operation_is_not_settable() {
        let op = SubmodelElement::operation("Start", vec![], vec![], vec![]);
        assert!(matches!(
            ElementValue::parse("1", &op),
            Err(ValueParseError::NotSettable { .. })
        ));
    }

    #[test]
    fn data_value_json_is_untagged() {
        assert_eq!(serde_json::to_value(DataValue::Double(42.5)).unwrap(), json!(42.5));
        let back: DataValue = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(back, DataValue::Integer(3));
    }

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                ValueParseError::InvalidLiteral {
                    raw: "x".into(),
                    value_type: ValueType::Integer,
                },
                ValueParseError::InvalidJson("eof".into()),
                ValueParseError::ShapeMismatch {
                    id_short: "c".into(),
                    expected: "collection",
                },
                ValueParseError::UnknownChild { id_short: "c".into() },
                ValueParseError::NotSettable { id_short: "op".into() },
            ],
            "VALUE_",
        );
    }
}
