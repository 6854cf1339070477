//! Optional behaviors an effect can opt into.
//!
//! Effects implement only the traits that apply to them; nothing here is a
//! base type.

use crate::parameter::Parameter;
use crate::scaled::{Lerp, ScaledParameter};

/// A single on/off switch for the whole effect.
pub trait HasEnabledFlag {
    fn enabled_param(&self) -> &Parameter<bool>;

    fn is_enabled(&self) -> bool {
        self.enabled_param().value()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled_param().set_value(enabled);
    }
}

pub trait Triggerable {
    fn trigger(&self);
}

/// Exposes the effect's main normalized driver so groups and UIs can reach it
/// without knowing the concrete effect.
pub trait HasScaledDriver {
    type Output: Lerp;

    fn scaled_driver(&self) -> &ScaledParameter<Self::Output>;
}
