//! Preset document shape.
//!
//! The on-disk format is statically typed per bucket: one list per value
//! type, each entry a `{key, value}` pair keyed by address.

use serde::{Deserialize, Serialize};

use crate::{Color, GroupConfig, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue<T> {
    pub key: String,
    pub value: T,
}

impl<T> KeyValue<T> {
    pub fn new(key: &str, value: T) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDocument {
    #[serde(default)]
    pub string_parameters: Vec<KeyValue<String>>,
    #[serde(default)]
    pub int_parameters: Vec<KeyValue<i32>>,
    #[serde(default)]
    pub float_parameters: Vec<KeyValue<f32>>,
    #[serde(default)]
    pub bool_parameters: Vec<KeyValue<bool>>,
    #[serde(default)]
    pub color_parameters: Vec<KeyValue<Color>>,
    #[serde(default)]
    pub group_presets: Vec<GroupConfig>,
}

impl PresetDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a value into the bucket for its type. Enum ordinals share the int bucket.
    pub fn push(&mut self, key: &str, value: Value) {
        match value {
            Value::Float(v) => self.float_parameters.push(KeyValue::new(key, v)),
            Value::Int(v) | Value::Enum(v) => self.int_parameters.push(KeyValue::new(key, v)),
            Value::Bool(v) => self.bool_parameters.push(KeyValue::new(key, v)),
            Value::String(v) => self.string_parameters.push(KeyValue::new(key, v)),
            Value::Color(v) => self.color_parameters.push(KeyValue::new(key, v)),
        }
    }

    /// All bucketed parameter entries, flattened back into `(address, Value)` pairs.
    pub fn parameters(&self) -> Vec<(String, Value)> {
        let mut out = Vec::with_capacity(self.parameter_count());
        out.extend(
            self.string_parameters
                .iter()
                .map(|kv| (kv.key.clone(), Value::String(kv.value.clone()))),
        );
        out.extend(self.int_parameters.iter().map(|kv| (kv.key.clone(), Value::Int(kv.value))));
        out.extend(
            self.float_parameters
                .iter()
                .map(|kv| (kv.key.clone(), Value::Float(kv.value))),
        );
        out.extend(self.bool_parameters.iter().map(|kv| (kv.key.clone(), Value::Bool(kv.value))));
        out.extend(
            self.color_parameters
                .iter()
                .map(|kv| (kv.key.clone(), Value::Color(kv.value))),
        );
        out
    }

    pub fn parameter_count(&self) -> usize {
        self.string_parameters.len()
            + self.int_parameters.len()
            + self.float_parameters.len()
            + self.bool_parameters.len()
            + self.color_parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameter_count() == 0 && self.group_presets.is_empty()
    }
}
