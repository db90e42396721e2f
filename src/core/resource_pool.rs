use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::vm::{lenient_text, Vm};
use crate::errors::DecodeError;

/// Snapshot of every monitored cluster, in display order.
///
/// A fresh pool is decoded on every successful cycle and dropped once it has
/// been rendered; nothing about it survives into the next cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    pub resources: Vec<Resource>,
}

/// One cluster and the VMs it currently hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cloud_type: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub vm_slots: i64,
    pub vms: Vec<Vm>,
}

impl ResourcePool {
    pub fn vm_count(&self) -> usize {
        self.resources.iter().map(|r| r.vms.len()).sum()
    }
}

/// Parses an extracted payload into a [`ResourcePool`].
///
/// Only the skeleton is mandatory: a top-level object with a `resources`
/// array whose entries each carry a `vms` array. Scalar fields that are
/// missing fall back to empty text or zero.
pub fn decode(payload: &str) -> Result<ResourcePool, DecodeError> {
    Ok(serde_json::from_str(payload)?)
}

// vm_slots arrives as a number most of the time, occasionally as a string
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}
