//! Argument coercion table.
//!
//! | target | accepted sources              |
//! |--------|-------------------------------|
//! | float  | float, int                    |
//! | int    | int, float (rounded up)       |
//! | bool   | bool, float (non-zero)        |
//! | string | string                        |
//! | color  | color                         |
//! | enum   | int or enum ordinal           |
//!
//! NaN and infinities are rejected for every target, including color
//! channels.
//!
//! Float to int uses `ceil` here. Scaled int interpolation rounds instead;
//! the two are intentionally different.

use lumen_types::{Value, ValueKind};

use crate::error::{CoerceError, DispatchError};

pub(crate) fn check_finite(value: &Value) -> Result<(), CoerceError> {
    let bad = match value {
        Value::Float(v) => (!v.is_finite()).then_some(*v),
        Value::Color(c) => [c.r, c.g, c.b, c.a].into_iter().find(|ch| !ch.is_finite()),
        _ => None,
    };
    match bad {
        Some(v) => Err(CoerceError::NonFinite(v)),
        None => Ok(()),
    }
}

pub fn coerce(value: &Value, target: ValueKind) -> Result<Value, CoerceError> {
    check_finite(value)?;
    let coerced = match (target, value) {
        (ValueKind::Float, Value::Float(v)) => Value::Float(*v),
        (ValueKind::Float, Value::Int(v)) => Value::Float(*v as f32),

        (ValueKind::Int, Value::Int(v)) => Value::Int(*v),
        (ValueKind::Int, Value::Float(v)) => Value::Int(v.ceil() as i32),

        (ValueKind::Bool, Value::Bool(v)) => Value::Bool(*v),
        (ValueKind::Bool, Value::Float(v)) => Value::Bool(*v != 0.0),

        (ValueKind::String, Value::String(v)) => Value::String(v.clone()),
        (ValueKind::Color, Value::Color(v)) => Value::Color(*v),

        (ValueKind::Enum, Value::Int(v)) | (ValueKind::Enum, Value::Enum(v)) => Value::Enum(*v),

        (expected, found) => {
            return Err(CoerceError::TypeMismatch {
                expected,
                found: found.kind(),
            })
        }
    };
    Ok(coerced)
}

/// Check arity and coerce every argument against a method signature.
///
/// Either every argument converts or nothing is returned, so a multi-argument
/// call is never partially applied.
pub fn coerce_args(
    address: &str,
    signature: &[ValueKind],
    args: &[Value],
) -> Result<Vec<Value>, DispatchError> {
    if signature.len() != args.len() {
        return Err(DispatchError::ArityMismatch {
            address: address.to_string(),
            expected: signature.len(),
            got: args.len(),
        });
    }
    signature
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (kind, arg))| {
            coerce(arg, *kind).map_err(|reason| DispatchError::TypeMismatch {
                address: address.to_string(),
                index,
                reason,
            })
        })
        .collect()
}
