//! Versioned state payload passed through the migration chain.
//!
//! The payload is an opaque JSON object. The only field the engine reads or
//! writes is `version`; everything else belongs to the step bodies.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version tag. Version 0 is the pre-migration legacy shape.
pub type SchemaVersion = u32;

/// Key holding the schema version inside the persisted object.
pub const VERSION_KEY: &str = "version";

/// Persisted state object plus its `version` tag.
///
/// Cloning is a deep structural copy: no part of the clone aliases the
/// original, so a step handed a clone cannot disturb the caller's value.
///
/// Deserialization goes through [`VersionedState::from_value`], so a malformed
/// `version` is rejected instead of being read as 0 later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct VersionedState(Map<String, Value>);

impl VersionedState {
    /// Empty legacy state (no `version`, treated as version 0).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON value into a state.
    ///
    /// Fails if the value is not an object, or if `version` is present and
    /// neither `null` nor a non-negative integer that fits a [`SchemaVersion`].
    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => bail!("state must be a JSON object, found {}", kind_of(&other)),
        };
        match map.get(VERSION_KEY) {
            None | Some(Value::Null) => {}
            Some(raw) => {
                parse_version(raw)?;
            }
        }
        Ok(Self(map))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Current schema version; absent, `null` or malformed tags read as 0.
    pub fn version(&self) -> SchemaVersion {
        self.0
            .get(VERSION_KEY)
            .and_then(|raw| parse_version(raw).ok())
            .unwrap_or(0)
    }

    /// Overwrite the `version` tag.
    pub fn set_version(&mut self, version: SchemaVersion) {
        self.0.insert(VERSION_KEY.to_string(), Value::from(version));
    }

    pub fn with_version(mut self, version: SchemaVersion) -> Self {
        self.set_version(version);
        self
    }
}

impl From<VersionedState> for Value {
    fn from(state: VersionedState) -> Self {
        state.into_value()
    }
}

impl TryFrom<Value> for VersionedState {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn parse_version(raw: &Value) -> Result<SchemaVersion> {
    raw.as_u64()
        .and_then(|v| SchemaVersion::try_from(v).ok())
        .ok_or_else(|| anyhow!("`{VERSION_KEY}` must be a non-negative integer, found {raw}"))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
