use lumen_types::PatternKind;

use super::{BeatClock, PatternGenerator};

/// Decaying envelope: jumps to 1 on every beat and falls linearly to 0.
#[derive(Debug, Default)]
pub struct TapPattern {
    clock: BeatClock,
}

impl TapPattern {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternGenerator for TapPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::Tap
    }

    fn tick(&mut self, dt: f32, bpm: f32) -> u32 {
        self.clock.advance(dt, bpm)
    }

    fn value(&self) -> f32 {
        1.0 - self.clock.phase()
    }

    fn clock(&self) -> &BeatClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut BeatClock {
        &mut self.clock
    }
}
