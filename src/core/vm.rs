use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One virtual machine as reported inside a cluster.
///
/// The info server is loose about types, so every field is optional on the
/// wire: absent or null text becomes an empty string, and memory/cpu values
/// are kept as whatever scalar the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default)]
    pub memory: DisplayValue,
    #[serde(default)]
    pub cpucores: DisplayValue,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vmtype: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: String,
}

impl Vm {
    pub fn indicator(&self) -> StatusIndicator {
        StatusIndicator::for_status(&self.status)
    }
}

/// Opaque scalar shown as-is; units are whatever the server uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(serde_json::Number),
    Text(String),
}

impl Default for DisplayValue {
    fn default() -> Self {
        DisplayValue::Text(String::new())
    }
}

impl From<u64> for DisplayValue {
    fn from(value: u64) -> Self {
        DisplayValue::Number(value.into())
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        DisplayValue::Text(value.to_string())
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Number(n) => write!(f, "{}", n),
            DisplayValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl<'de> Deserialize<'de> for DisplayValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => DisplayValue::Number(n),
            Value::String(s) => DisplayValue::Text(s),
            Value::Null => DisplayValue::default(),
            other => DisplayValue::Text(other.to_string()),
        })
    }
}

/// Background colour of a status cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusIndicator {
    Green,
    Yellow,
    Red,
}

impl StatusIndicator {
    /// Only `Running` and `Starting` are recognised; everything else,
    /// including an empty status, is shown as an error state.
    pub fn for_status(status: &str) -> Self {
        match status {
            "Running" => StatusIndicator::Green,
            "Starting" => StatusIndicator::Yellow,
            _ => StatusIndicator::Red,
        }
    }
}

/// Accepts any JSON scalar where a label is expected.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
