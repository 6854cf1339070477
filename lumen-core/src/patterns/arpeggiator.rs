use lumen_types::{ArpDirection, GroupConfig, PatternKind};

use super::{BeatClock, PatternGenerator};

/// Steps through a list of levels, one step per cycle.
#[derive(Debug)]
pub struct ArpeggiatorPattern {
    clock: BeatClock,
    direction: ArpDirection,
    steps: Vec<f32>,
    step_index: usize,
    ascending: bool,
    rng_state: u64,
}

fn next_random(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    *state >> 33
}

impl ArpeggiatorPattern {
    pub fn new(direction: ArpDirection, steps: Vec<f32>) -> Self {
        Self {
            clock: BeatClock::default(),
            direction,
            steps,
            step_index: 0,
            ascending: true,
            rng_state: 0x2545_f491_4f6c_dd1d,
        }
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    fn advance_step(&mut self) {
        let len = self.steps.len();
        if len <= 1 {
            self.step_index = 0;
            return;
        }
        self.step_index = match self.direction {
            ArpDirection::Up => (self.step_index + 1) % len,
            ArpDirection::Down => {
                if self.step_index == 0 {
                    len - 1
                } else {
                    self.step_index - 1
                }
            }
            ArpDirection::UpDown => {
                if self.ascending {
                    if self.step_index + 1 >= len {
                        self.ascending = false;
                        len - 2
                    } else {
                        self.step_index + 1
                    }
                } else if self.step_index == 0 {
                    self.ascending = true;
                    1
                } else {
                    self.step_index - 1
                }
            }
            ArpDirection::Random => (next_random(&mut self.rng_state) as usize) % len,
        };
    }
}

impl PatternGenerator for ArpeggiatorPattern {
    fn kind(&self) -> PatternKind {
        PatternKind::Arpeggiator
    }

    fn tick(&mut self, dt: f32, bpm: f32) -> u32 {
        let wraps = self.clock.advance(dt, bpm);
        for _ in 0..wraps {
            self.advance_step();
        }
        wraps
    }

    fn value(&self) -> f32 {
        self.steps.get(self.step_index).copied().unwrap_or(0.0)
    }

    fn clock(&self) -> &BeatClock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut BeatClock {
        &mut self.clock
    }

    fn apply_config(&mut self, config: &GroupConfig) {
        self.clock.set_num_beats(config.num_beats);
        self.direction = config.arp_direction;
        self.steps = config.arp_steps.clone();
        if self.step_index >= self.steps.len() {
            self.step_index = 0;
        }
    }

    fn write_config(&self, config: &mut GroupConfig) {
        config.num_beats = self.clock.num_beats();
        config.arp_direction = self.direction;
        config.arp_steps = self.steps.clone();
    }
}
