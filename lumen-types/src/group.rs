//! Group controller configuration types.
//!
//! A group fans one driver value out to a list of addresses. What moves the
//! driver is its [`SignalSource`]: explicit sets, a pattern generator, or one
//! band of the audio analyser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalSource {
    #[default]
    Default,
    Pattern,
    Audio,
}

impl SignalSource {
    pub fn name(&self) -> &'static str {
        match self {
            SignalSource::Default => "Default",
            SignalSource::Pattern => "Pattern",
            SignalSource::Audio => "Audio",
        }
    }

    pub fn from_name(name: &str) -> Option<SignalSource> {
        match name {
            "Default" => Some(SignalSource::Default),
            "Pattern" => Some(SignalSource::Pattern),
            "Audio" => Some(SignalSource::Audio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[default]
    Tap,
    Oscillator,
    Arpeggiator,
}

impl PatternKind {
    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Tap => "Tap",
            PatternKind::Oscillator => "Oscillator",
            PatternKind::Arpeggiator => "Arpeggiator",
        }
    }

    pub fn index(&self) -> i32 {
        match self {
            PatternKind::Tap => 0,
            PatternKind::Oscillator => 1,
            PatternKind::Arpeggiator => 2,
        }
    }

    pub fn from_index(index: i32) -> Option<PatternKind> {
        match index {
            0 => Some(PatternKind::Tap),
            1 => Some(PatternKind::Oscillator),
            2 => Some(PatternKind::Arpeggiator),
            _ => None,
        }
    }

    pub fn all() -> Vec<PatternKind> {
        vec![PatternKind::Tap, PatternKind::Oscillator, PatternKind::Arpeggiator]
    }
}

/// Frequency band of the external audio-level provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioBand {
    #[default]
    Low,
    Mid,
    High,
}

impl AudioBand {
    pub fn name(&self) -> &'static str {
        match self {
            AudioBand::Low => "Low",
            AudioBand::Mid => "Mid",
            AudioBand::High => "High",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AudioBand::Low => 0,
            AudioBand::Mid => 1,
            AudioBand::High => 2,
        }
    }

    pub fn from_index(index: i32) -> Option<AudioBand> {
        match index {
            0 => Some(AudioBand::Low),
            1 => Some(AudioBand::Mid),
            2 => Some(AudioBand::High),
            _ => None,
        }
    }

    pub fn all() -> [AudioBand; 3] {
        [AudioBand::Low, AudioBand::Mid, AudioBand::High]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OscillatorShape {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl OscillatorShape {
    pub fn name(&self) -> &'static str {
        match self {
            OscillatorShape::Sine => "Sine",
            OscillatorShape::Square => "Square",
            OscillatorShape::Saw => "Saw",
            OscillatorShape::Triangle => "Triangle",
        }
    }

    pub fn next(&self) -> OscillatorShape {
        match self {
            OscillatorShape::Sine => OscillatorShape::Square,
            OscillatorShape::Square => OscillatorShape::Saw,
            OscillatorShape::Saw => OscillatorShape::Triangle,
            OscillatorShape::Triangle => OscillatorShape::Sine,
        }
    }

    /// Evaluate the shape at `phase` in 0.0..1.0, producing 0.0..=1.0.
    pub fn sample(&self, phase: f32) -> f32 {
        let p = phase.rem_euclid(1.0);
        match self {
            OscillatorShape::Sine => 0.5 - 0.5 * (p * std::f32::consts::TAU).cos(),
            OscillatorShape::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            OscillatorShape::Saw => p,
            OscillatorShape::Triangle => {
                if p < 0.5 {
                    p * 2.0
                } else {
                    2.0 - p * 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpDirection {
    #[default]
    Up,
    Down,
    UpDown,
    Random,
}

impl ArpDirection {
    pub fn name(&self) -> &'static str {
        match self {
            ArpDirection::Up => "Up",
            ArpDirection::Down => "Down",
            ArpDirection::UpDown => "Up/Down",
            ArpDirection::Random => "Random",
        }
    }

    pub fn next(&self) -> ArpDirection {
        match self {
            ArpDirection::Up => ArpDirection::Down,
            ArpDirection::Down => ArpDirection::UpDown,
            ArpDirection::UpDown => ArpDirection::Random,
            ArpDirection::Random => ArpDirection::Up,
        }
    }
}

fn default_num_beats() -> f32 {
    1.0
}

fn default_threshold() -> f32 {
    0.8
}

fn default_domain_max() -> f32 {
    1.0
}

fn default_arp_steps() -> Vec<f32> {
    vec![0.0, 0.33, 0.66, 1.0]
}

/// Serialized form of a group controller, as stored in `groupPresets`.
///
/// Target and trigger addresses are kept without a leading slash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    pub address: String,
    #[serde(default)]
    pub signal_source: SignalSource,
    #[serde(default)]
    pub pattern_type: PatternKind,
    #[serde(default)]
    pub audio_frequency: AudioBand,
    #[serde(default = "default_threshold")]
    pub audio_threshold: f32,
    #[serde(default = "default_num_beats")]
    pub num_beats: f32,
    #[serde(default)]
    pub oscillator_shape: OscillatorShape,
    #[serde(default)]
    pub arp_direction: ArpDirection,
    #[serde(default = "default_arp_steps")]
    pub arp_steps: Vec<f32>,
    #[serde(default)]
    pub domain_min: f32,
    #[serde(default = "default_domain_max")]
    pub domain_max: f32,
    #[serde(default)]
    pub target_addresses: Vec<String>,
    #[serde(default)]
    pub trigger_addresses: Vec<String>,
}

impl GroupConfig {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            signal_source: SignalSource::Default,
            pattern_type: PatternKind::Tap,
            audio_frequency: AudioBand::Low,
            audio_threshold: default_threshold(),
            num_beats: default_num_beats(),
            oscillator_shape: OscillatorShape::Sine,
            arp_direction: ArpDirection::Up,
            arp_steps: default_arp_steps(),
            domain_min: 0.0,
            domain_max: default_domain_max(),
            target_addresses: Vec::new(),
            trigger_addresses: Vec::new(),
        }
    }
}
