use std::cell::RefCell;
use std::rc::Rc;

use lumen_types::Color;

use crate::capability::{HasEnabledFlag, Triggerable};
use crate::discovery::{Addressable, MemberVisitor};
use crate::method::Method;
use crate::parameter::Parameter;
use crate::transition::Transition;

use super::Effect;

/// A light with a base intensity, a palette-bound color and a flash trigger.
pub struct FxLight {
    instance: String,
    intensity: Parameter<f32>,
    color: Parameter<Color>,
    enabled: Parameter<bool>,
    flash_duration: Parameter<f32>,
    flash: Method,
    flash_level: Rc<RefCell<Transition<f32>>>,
}

impl FxLight {
    pub fn new(instance: &str, palette_slot: usize) -> Self {
        let flash_duration = Parameter::new(0.15_f32);
        let flash_level = Rc::new(RefCell::new(Transition::idle(0.0_f32)));
        let level = Rc::clone(&flash_level);
        let duration = flash_duration.clone();
        let flash = Method::trigger(move || {
            level.borrow_mut().start_ping_pong(0.0, 1.0, duration.value() * 0.5);
        });
        Self {
            instance: instance.to_string(),
            intensity: Parameter::new(1.0),
            color: Parameter::new(Color::WHITE).bind_palette(palette_slot),
            enabled: Parameter::new(true),
            flash_duration,
            flash,
            flash_level,
        }
    }

    pub fn intensity(&self) -> &Parameter<f32> {
        &self.intensity
    }

    pub fn color(&self) -> &Parameter<Color> {
        &self.color
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_level.borrow().is_active()
    }

    /// What the renderer would draw: base intensity, lifted by any flash.
    pub fn output(&self) -> f32 {
        if !self.is_enabled() {
            return 0.0;
        }
        self.intensity.value().max(self.flash_level.borrow().value())
    }
}

impl HasEnabledFlag for FxLight {
    fn enabled_param(&self) -> &Parameter<bool> {
        &self.enabled
    }
}

impl Triggerable for FxLight {
    fn trigger(&self) {
        if let Err(e) = self.flash.invoke(&[]) {
            log::warn!(target: "fx", "{}: {}", self.flash.address(), e);
        }
    }
}

impl Addressable for FxLight {
    fn type_name(&self) -> &str {
        "FXLight"
    }

    fn instance_name(&self) -> String {
        self.instance.clone()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        visitor.member("intensity", &self.intensity);
        visitor.member("color", &self.color);
        visitor.member("enabled", &self.enabled);
        visitor.member("flashDuration", &self.flash_duration);
        visitor.member("flash", &self.flash);
    }
}

impl Effect for FxLight {
    fn tick(&self, dt: f32) {
        self.flash_level.borrow_mut().tick(dt);
    }

    fn as_addressable(&self) -> &dyn Addressable {
        self
    }
}
