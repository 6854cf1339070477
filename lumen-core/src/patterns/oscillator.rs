use lumen_types::{GroupConfig, OscillatorShape, PatternKind};

use super::{BeatClock, PatternGenerator};

/// Periodic waveform with one period per cycle.
#[derive(Debug)]
pub struct OscillatorPattern {
    clock: BeatClock,
    shape: OscillatorShape,
}

impl OscillatorPattern {
    pub fn new(shape: OscillatorShape) -> Self {
        Self {
            clock: BeatClock::default(),
            shape,
        }
    }

    pub fn shape(&self) -> OscillatorShape {
        self.shape
    }
}

impl PatternGenerator for OscillatorPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::Oscillator
    }

    fn tick(&mut self, dt: f32, bpm: f32) -> u32 {
        self.clock.advance(dt, bpm)
    }

    fn value(&self) -> f32 {
        self.shape.sample(self.clock.phase())
    }

    fn clock(&self) -> &BeatClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut BeatClock {
        &mut self.clock
    }

    fn apply_config(&mut self, config: &GroupConfig) {
        self.clock.set_num_beats(config.num_beats);
        self.shape = config.oscillator_shape;
    }

    fn write_config(&self, config: &mut GroupConfig) {
        config.num_beats = self.clock.num_beats();
        config.oscillator_shape = self.shape;
    }
}
