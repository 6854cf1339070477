//! Conversion between OSC packets and registry values.

use std::net::SocketAddr;

use lumen_types::{Color, Value};
use rosc::{OscColor, OscMessage, OscPacket, OscType};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OscConvertError {
    #[error("{address}: argument {index} has unsupported OSC type {type_name}")]
    UnsupportedArgument {
        address: String,
        index: usize,
        type_name: &'static str,
    },
}

/// A decoded message, ready for dispatch on the tick thread.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub address: String,
    pub args: Vec<Value>,
    pub from: SocketAddr,
}

fn type_name(arg: &OscType) -> &'static str {
    match arg {
        OscType::Int(_) => "int",
        OscType::Float(_) => "float",
        OscType::String(_) => "string",
        OscType::Blob(_) => "blob",
        OscType::Time(_) => "time",
        OscType::Long(_) => "long",
        OscType::Double(_) => "double",
        OscType::Char(_) => "char",
        OscType::Color(_) => "color",
        OscType::Midi(_) => "midi",
        OscType::Bool(_) => "bool",
        OscType::Array(_) => "array",
        OscType::Nil => "nil",
        OscType::Inf => "inf",
    }
}

/// Doubles narrow to `f32`; longs saturate into `i32`.
pub fn to_value(arg: &OscType) -> Option<Value> {
    match arg {
        OscType::Float(v) => Some(Value::Float(*v)),
        OscType::Double(v) => Some(Value::Float(*v as f32)),
        OscType::Int(v) => Some(Value::Int(*v)),
        OscType::Long(v) => Some(Value::Int((*v).clamp(i32::MIN as i64, i32::MAX as i64) as i32)),
        OscType::Bool(v) => Some(Value::Bool(*v)),
        OscType::String(v) => Some(Value::String(v.clone())),
        OscType::Color(c) => Some(Value::Color(Color::from_rgba8(c.red, c.green, c.blue, c.alpha))),
        _ => None,
    }
}

/// Enums go out as their ordinal.
pub fn to_osc(value: &Value) -> OscType {
    match value {
        Value::Float(v) => OscType::Float(*v),
        Value::Int(v) | Value::Enum(v) => OscType::Int(*v),
        Value::Bool(v) => OscType::Bool(*v),
        Value::String(v) => OscType::String(v.clone()),
        Value::Color(c) => {
            let [red, green, blue, alpha] = c.to_rgba8();
            OscType::Color(OscColor {
                red,
                green,
                blue,
                alpha,
            })
        }
    }
}

pub fn decode_message(msg: OscMessage, from: SocketAddr) -> Result<InboundMessage, OscConvertError> {
    let args = msg
        .args
        .iter()
        .enumerate()
        .map(|(index, arg)| {
            to_value(arg).ok_or_else(|| OscConvertError::UnsupportedArgument {
                address: msg.addr.clone(),
                index,
                type_name: type_name(arg),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InboundMessage {
        address: msg.addr,
        args,
        from,
    })
}

/// Flatten bundles (recursively) into their messages, in order.
pub fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            for p in bundle.content {
                flatten(p, out);
            }
        }
    }
}

pub fn encode_message(address: &str, args: &[Value]) -> Result<Vec<u8>, rosc::OscError> {
    let packet = OscPacket::Message(OscMessage {
        addr: address.to_string(),
        args: args.iter().map(to_osc).collect(),
    });
    rosc::encoder::encode(&packet)
}
