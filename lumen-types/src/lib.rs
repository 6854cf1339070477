//! # lumen-types
//!
//! Shared data definitions for the Lumen show-control layer.
//! This crate contains the plain value types used by lumen-core and lumen-net:
//! the dynamically typed [`Value`], colors and vectors, address helpers,
//! group configuration enums, and the preset document shape.

pub mod address;
mod color;
mod group;
mod preset;
mod value;

pub use color::{Color, Vec3};
pub use group::{ArpDirection, AudioBand, GroupConfig, OscillatorShape, PatternKind, SignalSource};
pub use preset::{KeyValue, PresetDocument};
pub use value::{Value, ValueKind};
