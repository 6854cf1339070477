use std::rc::Rc;

use crate::capability::{HasEnabledFlag, HasScaledDriver};
use crate::discovery::{Addressable, MemberVisitor};
use crate::error::SetupError;
use crate::parameter::Parameter;
use crate::scaled::ScaledParameter;

use super::Effect;

/// The renderer's post-processing stack, as far as bloom is concerned.
pub trait PostProcessTarget {
    fn set_bloom_intensity(&self, intensity: f32);
}

/// Bloom driven by a normalized value. Without a post-process target the
/// effect still registers its members but forwards nothing.
pub struct FxBloom {
    instance: String,
    intensity: ScaledParameter<f32>,
    enabled: Parameter<bool>,
    target: Option<Rc<dyn PostProcessTarget>>,
}

impl FxBloom {
    pub const MAX_INTENSITY: f32 = 20.0;

    pub fn new(instance: &str, target: Option<Rc<dyn PostProcessTarget>>) -> Self {
        let bloom = Self {
            instance: instance.to_string(),
            intensity: ScaledParameter::new(0.0, Self::MAX_INTENSITY, 0.0),
            enabled: Parameter::new(true),
            target,
        };
        if let Err(e) = bloom.check_setup() {
            log::warn!(target: "registry", "{}", e);
        }
        bloom
    }

    pub fn check_setup(&self) -> Result<(), SetupError> {
        match self.target {
            Some(_) => Ok(()),
            None => Err(SetupError::MissingCollaborator {
                effect: format!("{}/{}", self.instance, self.type_name()),
                collaborator: "post-process target",
            }),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.target.is_none()
    }
}

impl HasEnabledFlag for FxBloom {
    fn enabled_param(&self) -> &Parameter<bool> {
        &self.enabled
    }
}

impl HasScaledDriver for FxBloom {
    type Output = f32;

    fn scaled_driver(&self) -> &ScaledParameter<f32> {
        &self.intensity
    }
}

impl Addressable for FxBloom {
    fn type_name(&self) -> &str {
        "FXBloom"
    }

    fn instance_name(&self) -> String {
        self.instance.clone()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        visitor.member("intensity", &self.intensity);
        visitor.member("enabled", &self.enabled);
    }
}

impl Effect for FxBloom {
    fn tick(&self, _dt: f32) {
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let intensity = if self.is_enabled() { self.intensity.value() } else { 0.0 };
        target.set_bloom_intensity(intensity);
    }

    fn as_addressable(&self) -> &dyn Addressable {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder(Cell<f32>);

    impl PostProcessTarget for Recorder {
        fn set_bloom_intensity(&self, intensity: f32) {
            self.0.set(intensity);
        }
    }

    #[test]
    fn forwards_scaled_intensity() {
        let recorder = Rc::new(Recorder::default());
        let bloom = FxBloom::new("Cam", Some(recorder.clone() as Rc<dyn PostProcessTarget>));
        assert!(bloom.check_setup().is_ok());
        bloom.scaled_driver().set_value(0.5);
        bloom.tick(0.016);
        assert_eq!(recorder.0.get(), 10.0);
        bloom.set_enabled(false);
        bloom.tick(0.016);
        assert_eq!(recorder.0.get(), 0.0);
    }

    #[test]
    fn missing_target_is_reported_and_inert() {
        let bloom = FxBloom::new("Cam", None);
        assert!(bloom.is_inert());
        assert_eq!(
            bloom.check_setup(),
            Err(SetupError::MissingCollaborator {
                effect: "Cam/FXBloom".into(),
                collaborator: "post-process target",
            })
        );
        bloom.tick(0.016);
    }
}
