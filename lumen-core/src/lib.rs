//! # lumen-core
//!
//! Parameter registry and dispatch engine for the Lumen show-control layer.
//! Effects declare typed parameters and methods, discovery registers them
//! under string addresses, and everything else (groups, presets, palette,
//! network input) reaches them through the registry.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lumen_core::config::Config;
//! use lumen_core::show::Show;
//!
//! let config = Config::load();
//! let mut show = Show::demo(&config);
//!
//! // Address any parameter or method by path
//! show.registry().set_fx_value("/Light1/FXLight/intensity", 0.75_f32);
//! show.registry().set_fx("/Groups/Master/trigger");
//!
//! // Advance one frame: audio, groups, effect transitions
//! show.tick(1.0 / 60.0);
//!
//! // Snapshot and restore
//! let doc = show.capture_preset();
//! show.restore_preset(&doc);
//! ```
//!
//! ## Module Overview
//!
//! - [`parameter`] — `Parameter<T>`, the observable value cell, and its type-erased view
//! - [`scaled`] — `ScaledParameter<T>`: normalized driver lerped into a domain
//! - [`method`] — triggerable methods with a declared signature
//! - [`registry`] — address map, type-checked dispatch, pattern dispatch, change bus
//! - [`coerce`] — argument coercion table
//! - [`discovery`] — `Addressable` self-description and `register_all`/`unregister_all`
//! - [`group`] — group controllers (manual, pattern or audio driven)
//! - [`patterns`] — tap, oscillator and arpeggiator generators
//! - [`audio`] — audio-level provider and hysteresis latches
//! - [`preset`] — capture/restore of presets; [`persistence`] reads and writes them
//! - [`palette`] — palette slots and color propagation
//! - [`effects`] — sample effect clients
//! - [`show`] — composition root and frame ordering
//! - [`config`] — TOML configuration (embedded defaults + user override)

pub mod audio;
pub mod capability;
pub mod coerce;
pub mod config;
pub mod discovery;
pub mod effects;
pub mod error;
pub mod group;
pub mod method;
pub mod palette;
pub mod parameter;
pub mod patterns;
pub mod persistence;
pub mod preset;
pub mod registry;
pub mod scaled;
pub mod show;
pub mod tempo;
pub mod transition;

pub use error::{CoerceError, DispatchError, RegistryError, SetupError};
pub use parameter::{ParamEnum, Parameter};
pub use registry::Registry;
pub use scaled::ScaledParameter;
