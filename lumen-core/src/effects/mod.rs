//! Sample registry clients.
//!
//! These are deliberately thin: they declare parameters and triggers,
//! advance their transitions on tick, and expose an output the renderer would
//! read. They exist to exercise the registry end to end.

mod bloom;
mod light;
mod strobe;

pub use bloom::{FxBloom, PostProcessTarget};
pub use light::FxLight;
pub use strobe::{FxStrobe, StrobeMode};

use crate::discovery::Addressable;

pub trait Effect: Addressable {
    /// Advance transitions and forward output. Called once per frame.
    fn tick(&self, dt: f32);

    fn as_addressable(&self) -> &dyn Addressable;
}
