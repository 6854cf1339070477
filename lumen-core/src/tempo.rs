//! Tap tempo: the shared BPM that pattern generators run at.

use std::cell::RefCell;
use std::rc::Rc;

use crate::discovery::{Addressable, MemberVisitor};
use crate::method::Method;
use crate::parameter::Parameter;

pub const DEFAULT_BPM: f32 = 120.0;
const MIN_BPM: f32 = 20.0;
const MAX_BPM: f32 = 300.0;
/// A gap longer than this starts a new tap sequence.
const TAP_TIMEOUT_SECS: f64 = 2.0;
const MAX_TAPS: usize = 5;

#[derive(Debug, Default)]
struct TapState {
    clock: f64,
    taps: Vec<f64>,
}

impl TapState {
    /// Record a tap. Returns the averaged BPM once two taps are close enough.
    fn tap(&mut self) -> Option<f32> {
        let now = self.clock;
        if let Some(last) = self.taps.last() {
            if now - last > TAP_TIMEOUT_SECS {
                self.taps.clear();
            }
        }
        self.taps.push(now);
        if self.taps.len() > MAX_TAPS {
            self.taps.remove(0);
        }
        if self.taps.len() < 2 {
            return None;
        }
        let span = self.taps[self.taps.len() - 1] - self.taps[0];
        let interval = span / (self.taps.len() - 1) as f64;
        if interval <= 0.0 {
            return None;
        }
        Some(((60.0 / interval) as f32).clamp(MIN_BPM, MAX_BPM))
    }
}

pub struct TapTempo {
    bpm: Parameter<f32>,
    tap: Method,
    state: Rc<RefCell<TapState>>,
}

impl TapTempo {
    pub fn new(bpm: f32) -> Self {
        let initial = if bpm.is_finite() { bpm.clamp(MIN_BPM, MAX_BPM) } else { DEFAULT_BPM };
        let bpm = Parameter::new(initial).with_range(MIN_BPM, MAX_BPM);
        let state = Rc::new(RefCell::new(TapState::default()));
        let tap_state = Rc::clone(&state);
        let tap_bpm = bpm.clone();
        let tap = Method::trigger(move || {
            let measured = tap_state.borrow_mut().tap();
            if let Some(measured) = measured {
                tap_bpm.set_value(measured);
            }
        });
        Self { bpm, tap, state }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm.value()
    }

    pub fn bpm_param(&self) -> &Parameter<f32> {
        &self.bpm
    }

    pub fn tap(&self) {
        if let Err(e) = self.tap.invoke(&[]) {
            log::warn!(target: "tempo", "tap: {}", e);
        }
    }

    /// Advance the tap clock.
    pub fn tick(&self, dt: f32) {
        self.state.borrow_mut().clock += dt as f64;
    }
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl Addressable for TapTempo {
    fn type_name(&self) -> &str {
        "Tempo"
    }

    fn instance_name(&self) -> String {
        "show".into()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        visitor.member("bpm", &self.bpm);
        visitor.member("tap", &self.tap);
    }
}
