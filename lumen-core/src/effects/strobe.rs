use std::cell::RefCell;
use std::rc::Rc;

use lumen_types::{Value, ValueKind};

use crate::capability::HasEnabledFlag;
use crate::discovery::{Addressable, MemberVisitor};
use crate::method::Method;
use crate::parameter::{ParamEnum, Parameter};

use super::Effect;

/// Flashes per second.
pub const MAX_RATE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrobeMode {
    /// Dark except for bursts requested with `strobe`.
    #[default]
    Off,
    Steady,
    Random,
}

impl ParamEnum for StrobeMode {
    fn ordinal(&self) -> i32 {
        match self {
            StrobeMode::Off => 0,
            StrobeMode::Steady => 1,
            StrobeMode::Random => 2,
        }
    }

    fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(StrobeMode::Off),
            1 => Some(StrobeMode::Steady),
            2 => Some(StrobeMode::Random),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct StrobeState {
    phase: f32,
    pending_flashes: u32,
    burst_level: f32,
    random_gate: bool,
    rng_state: u64,
    level: f32,
}

impl StrobeState {
    fn next_random(&mut self) -> bool {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng_state >> 33) & 1 == 1
    }
}

/// Strobe with a steady or random pattern, plus on-demand bursts.
///
/// `strobe(count, level)` queues `count` flashes at `level`.
pub struct FxStrobe {
    instance: String,
    mode: Parameter<StrobeMode>,
    rate: Parameter<f32>,
    enabled: Parameter<bool>,
    strobe: Method,
    state: Rc<RefCell<StrobeState>>,
}

impl FxStrobe {
    pub fn new(instance: &str) -> Self {
        let state = Rc::new(RefCell::new(StrobeState {
            phase: 0.0,
            pending_flashes: 0,
            burst_level: 1.0,
            random_gate: false,
            rng_state: 0x9e37_79b9_7f4a_7c15,
            level: 0.0,
        }));
        let burst = Rc::clone(&state);
        let strobe = Method::new(&[ValueKind::Int, ValueKind::Float], move |args| {
            if let [Value::Int(count), Value::Float(level)] = args {
                let mut state = burst.borrow_mut();
                state.pending_flashes = (*count).max(0) as u32;
                state.burst_level = *level;
                state.phase = 0.0;
            }
        });
        Self {
            instance: instance.to_string(),
            mode: Parameter::new(StrobeMode::Off),
            rate: Parameter::new(8.0).with_range(0.0, MAX_RATE),
            enabled: Parameter::new(true),
            strobe,
            state,
        }
    }

    pub fn mode(&self) -> &Parameter<StrobeMode> {
        &self.mode
    }

    pub fn rate(&self) -> &Parameter<f32> {
        &self.rate
    }

    pub fn pending_flashes(&self) -> u32 {
        self.state.borrow().pending_flashes
    }

    /// Current light level in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.state.borrow().level
    }
}

impl HasEnabledFlag for FxStrobe {
    fn enabled_param(&self) -> &Parameter<bool> {
        &self.enabled
    }
}

impl Addressable for FxStrobe {
    fn type_name(&self) -> &str {
        "FXStrobe"
    }

    fn instance_name(&self) -> String {
        self.instance.clone()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        visitor.member("mode", &self.mode);
        visitor.member("rate", &self.rate);
        visitor.member("enabled", &self.enabled);
        visitor.member("strobe", &self.strobe);
    }
}

impl Effect for FxStrobe {
    fn tick(&self, dt: f32) {
        let mut state = self.state.borrow_mut();
        if !self.is_enabled() {
            state.level = 0.0;
            return;
        }
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        state.phase += dt * self.rate.value();
        let cycles = state.phase.floor();
        state.phase -= cycles;
        if cycles >= 1.0 {
            // Saturating float-to-int cast; one gate draw per frame is enough.
            state.pending_flashes = state.pending_flashes.saturating_sub(cycles as u32);
            state.random_gate = state.next_random();
        }
        let first_half = state.phase < 0.5;
        state.level = if state.pending_flashes > 0 {
            if first_half {
                state.burst_level
            } else {
                0.0
            }
        } else {
            let on = match self.mode.value() {
                StrobeMode::Off => false,
                StrobeMode::Steady => first_half,
                StrobeMode::Random => first_half && state.random_gate,
            };
            if on {
                1.0
            } else {
                0.0
            }
        };
    }

    fn as_addressable(&self) -> &dyn Addressable {
        self
    }
}
