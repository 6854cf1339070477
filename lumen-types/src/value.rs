use serde::{Deserialize, Serialize};

use crate::Color;

/// The runtime type of a [`Value`] or of a registered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    String,
    Color,
    Enum,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Color => "color",
            ValueKind::Enum => "enum",
        }
    }

    pub fn all() -> Vec<ValueKind> {
        vec![
            ValueKind::Float,
            ValueKind::Int,
            ValueKind::Bool,
            ValueKind::String,
            ValueKind::Color,
            ValueKind::Enum,
        ]
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed value travelling through the registry.
///
/// Everything that enters from the outside (OSC arguments, preset entries,
/// group fan-out) is expressed as a `Value` and coerced to the declared type
/// of the addressed element before it is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    String(String),
    Color(Color),
    /// Enum parameters carry their underlying ordinal.
    Enum(i32),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Color(_) => ValueKind::Color,
            Value::Enum(_) => ValueKind::Enum,
        }
    }

    /// Numeric view, used by meters and debugging output. Non-numeric values map to `None`.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) | Value::Enum(v) => Some(*v as f32),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::String(_) | Value::Color(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{:.3}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Color(c) => write!(f, "{}", c),
            Value::Enum(v) => write!(f, "#{}", v),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Color> for Value {
    fn from(value: Color) -> Self {
        Value::Color(value)
    }
}
