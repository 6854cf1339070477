//! Audio-level input for groups in Audio mode.
//!
//! Analysis itself happens elsewhere; this module only defines where band
//! levels come from and how threshold crossings are detected.

use lumen_types::AudioBand;

use crate::discovery::{Addressable, MemberVisitor};
use crate::parameter::Parameter;

/// Source of per-band levels, nominally `[0, 1]`.
pub trait AudioLevels {
    fn level(&self, band: AudioBand) -> f32;

    /// Called once per frame before any group reads a level.
    fn update(&mut self, _dt: f32) {}
}

/// Levels written from outside, typically by an analyzer over OSC at
/// `/audio/low`, `/audio/mid` and `/audio/high`.
pub struct ManualAudioLevels {
    low: Parameter<f32>,
    mid: Parameter<f32>,
    high: Parameter<f32>,
}

impl Default for ManualAudioLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualAudioLevels {
    pub fn new() -> Self {
        Self {
            low: Parameter::new(0.0).transient(),
            mid: Parameter::new(0.0).transient(),
            high: Parameter::new(0.0).transient(),
        }
    }

    pub fn band(&self, band: AudioBand) -> &Parameter<f32> {
        match band {
            AudioBand::Low => &self.low,
            AudioBand::Mid => &self.mid,
            AudioBand::High => &self.high,
        }
    }

    pub fn set_level(&self, band: AudioBand, level: f32) {
        self.band(band).set_value(level);
    }
}

impl AudioLevels for ManualAudioLevels {
    fn level(&self, band: AudioBand) -> f32 {
        self.band(band).value()
    }
}

impl Addressable for ManualAudioLevels {
    fn type_name(&self) -> &str {
        "AudioLevels"
    }

    fn instance_name(&self) -> String {
        "audio".into()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        visitor.member("low", &self.low);
        visitor.member("mid", &self.mid);
        visitor.member("high", &self.high);
    }
}

/// Hysteresis latch: fires once when the level rises above the threshold and
/// re-arms only after it falls back below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdLatch {
    threshold: f32,
    high: bool,
}

impl ThresholdLatch {
    pub fn new(threshold: f32) -> Self {
        Self { threshold, high: false }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Feed a level. Returns `true` on an upward crossing.
    pub fn update(&mut self, level: f32) -> bool {
        if !self.high && level > self.threshold {
            self.high = true;
            return true;
        }
        if self.high && level < self.threshold {
            self.high = false;
        }
        false
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

/// One independent latch per band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLatches {
    latches: [ThresholdLatch; 3],
}

impl BandLatches {
    pub fn new(threshold: f32) -> Self {
        Self {
            latches: [ThresholdLatch::new(threshold); 3],
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        for latch in &mut self.latches {
            latch.set_threshold(threshold);
        }
    }

    pub fn latch(&self, band: AudioBand) -> &ThresholdLatch {
        &self.latches[band.index()]
    }

    /// Feed every band from `levels`; returns the bands that crossed upward.
    pub fn update(&mut self, levels: &dyn AudioLevels) -> Vec<AudioBand> {
        AudioBand::all()
            .into_iter()
            .filter(|band| self.latches[band.index()].update(levels.level(*band)))
            .collect()
    }

    pub fn reset(&mut self) {
        for latch in &mut self.latches {
            latch.reset();
        }
    }
}
