//! Pattern generators that drive a group's value in Pattern mode.
//!
//! Each generator produces a `[0, 1]` signal and reports how many beat
//! boundaries it crossed during a tick; the group turns those into triggers.

mod arpeggiator;
mod oscillator;
mod tap;

pub use arpeggiator::ArpeggiatorPattern;
pub use oscillator::OscillatorPattern;
pub use tap::TapPattern;

use lumen_types::{GroupConfig, PatternKind};

pub trait PatternGenerator {
    fn kind(&self) -> PatternKind;

    /// Advance by `dt` seconds at `bpm`. Returns the number of beat
    /// boundaries crossed.
    fn tick(&mut self, dt: f32, bpm: f32) -> u32;

    /// Current output in `[0, 1]`.
    fn value(&self) -> f32;

    fn clock(&self) -> &BeatClock;
    fn clock_mut(&mut self) -> &mut BeatClock;

    /// Restore generator-specific fields. The beat count is common to all.
    fn apply_config(&mut self, config: &GroupConfig) {
        self.clock_mut().set_num_beats(config.num_beats);
    }

    fn write_config(&self, config: &mut GroupConfig) {
        config.num_beats = self.clock().num_beats();
    }
}

/// Build the generator for `kind`, configured from `config`.
pub fn create(kind: PatternKind, config: &GroupConfig) -> Box<dyn PatternGenerator> {
    let mut generator: Box<dyn PatternGenerator> = match kind {
        PatternKind::Tap => Box::new(TapPattern::new()),
        PatternKind::Oscillator => Box::new(OscillatorPattern::new(config.oscillator_shape)),
        PatternKind::Arpeggiator => Box::new(ArpeggiatorPattern::new(config.arp_direction, config.arp_steps.clone())),
    };
    generator.apply_config(config);
    generator
}

/// Shortest cycle a clock accepts, in beats.
pub const MIN_NUM_BEATS: f32 = 1.0 / 64.0;
/// Longest cycle a clock accepts, in beats.
pub const MAX_NUM_BEATS: f32 = 1024.0;
/// Wraps reported by one `advance`; a huge `dt` is not replayed beat by beat.
pub const MAX_WRAPS_PER_TICK: u32 = 64;

/// Clamp a beat count into the accepted range. Non-finite or non-positive
/// counts fall back to one beat.
pub fn sanitize_num_beats(beats: f32) -> f32 {
    if beats.is_finite() && beats > 0.0 {
        beats.clamp(MIN_NUM_BEATS, MAX_NUM_BEATS)
    } else {
        1.0
    }
}

/// Fractional beat accumulator. One cycle spans `num_beats` beats.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatClock {
    accumulator: f64,
    num_beats: f32,
}

impl Default for BeatClock {
    fn default() -> Self {
        Self {
            accumulator: 0.0,
            num_beats: 1.0,
        }
    }
}

impl BeatClock {
    pub fn num_beats(&self) -> f32 {
        self.num_beats
    }

    /// See [`sanitize_num_beats`].
    pub fn set_num_beats(&mut self, beats: f32) {
        self.num_beats = sanitize_num_beats(beats);
    }

    /// Position within the current cycle, `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.accumulator as f32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Advance and return the number of completed cycles.
    pub fn advance(&mut self, dt: f32, bpm: f32) -> u32 {
        if !(bpm.is_finite() && dt.is_finite()) || bpm <= 0.0 || dt <= 0.0 {
            return 0;
        }
        let cycles_per_second = (bpm as f64 / 60.0) / self.num_beats as f64;
        self.accumulator += dt as f64 * cycles_per_second;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole.min(MAX_WRAPS_PER_TICK as f64) as u32
    }
}
