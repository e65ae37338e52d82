//! Typed records hydrated from runtime inspection output.
//!
//! Each entity declares which fields are required (missing → parse failure)
//! and which default to their zero value. `null` counts as absent for the
//! defaulted ones.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use cpcontainer_core::{Error, Result};

pub mod container;
pub mod network_settings;
pub mod pod;
pub mod state;

pub use container::Container;
pub use network_settings::{NetworkAttachment, NetworkSettings};
pub use pod::{Pod, PodMember};
pub use state::ContainerState;

/// A record the runtime reports through `inspect`.
pub trait InspectRecord: Serialize + DeserializeOwned {
    /// Entity name used in error messages.
    const KIND: &'static str;

    /// Hydrate from a parsed value, unwrapping a single-element list first.
    fn from_value(value: Value) -> Result<Self> {
        let value = match value {
            Value::Array(mut items) => {
                if items.len() != 1 {
                    return Err(Error::parse(
                        Self::KIND,
                        format!("expected exactly one inspect result, got {}", items.len()),
                    ));
                }
                items.remove(0)
            }
            other => other,
        };

        serde_json::from_value(value).map_err(|e| Error::parse(Self::KIND, e.to_string()))
    }

    /// Hydrate from JSON text.
    fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::parse(Self::KIND, e.to_string()))?;
        Self::from_value(value)
    }

    /// Export the declared output fields.
    fn to_record(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Deserialize `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
