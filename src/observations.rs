//! The free-form `observaciones` column of a work order.
//!
//! Older rows hold plain text, newer ones a JSON object with structured
//! details. Both shapes are accepted; anything that is not a JSON object is
//! kept as text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Observations {
    StructuredDetails(Map<String, Value>),
    PlainText(String),
    Empty,
}

impl Observations {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Observations::Empty;
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Observations::Empty;
        }

        if trimmed.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
                return Observations::StructuredDetails(map);
            }
        }

        Observations::PlainText(trimmed.to_string())
    }

    /// Text suitable for a one-line listing.
    pub fn summary(&self) -> Option<String> {
        match self {
            Observations::Empty => None,
            Observations::PlainText(text) => Some(text.clone()),
            Observations::StructuredDetails(map) => {
                for key in ["descripcion", "notas", "detalle"] {
                    if let Some(Value::String(s)) = map.get(key) {
                        return Some(s.clone());
                    }
                }
                Some(Value::Object(map.clone()).to_string())
            }
        }
    }
}
