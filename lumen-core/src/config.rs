use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lumen_types::Color;
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    show: ShowConfig,
    #[serde(default)]
    osc: OscConfig,
    #[serde(default)]
    presets: PresetsConfig,
}

#[derive(Deserialize, Default)]
struct ShowConfig {
    frame_rate: Option<u32>,
    bpm: Option<f32>,
    audio_threshold: Option<f32>,
    palette: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct OscConfig {
    listen: Option<String>,
    feedback: Option<String>,
    max_messages: Option<usize>,
    flush_interval_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct PresetsConfig {
    directory: Option<PathBuf>,
}

pub struct Config {
    show: ShowConfig,
    osc: OscConfig,
    presets: PresetsConfig,
}

impl Config {
    /// Embedded defaults overlaid by `<config_dir>/lumen/config.toml`, if present.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });

        if let Some(path) = user_path.filter(|p| p.exists()) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                    Ok(user) => {
                        merge_show(&mut base.show, user.show);
                        merge_osc(&mut base.osc, user.osc);
                        if user.presets.directory.is_some() {
                            base.presets.directory = user.presets.directory;
                        }
                    }
                    Err(e) => {
                        log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                    }
                },
                Err(e) => {
                    log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                }
            }
        }

        Config {
            show: base.show,
            osc: base.osc,
            presets: base.presets,
        }
    }

    /// Frames per second of the show loop (clamped to 1..=240).
    pub fn frame_rate(&self) -> u32 {
        self.show.frame_rate.unwrap_or(60).clamp(1, 240)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate() as f64)
    }

    pub fn bpm(&self) -> f32 {
        self.show.bpm.unwrap_or(120.0)
    }

    /// Threshold new groups start with.
    pub fn audio_threshold(&self) -> f32 {
        self.show.audio_threshold.unwrap_or(0.8)
    }

    /// Palette colors. Entries that do not parse as `#rrggbb[aa]` are skipped.
    pub fn palette(&self) -> Vec<Color> {
        self.show
            .palette
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|s| {
                let color = parse_hex_color(s);
                if color.is_none() {
                    log::warn!(target: "config", "ignoring palette entry {:?}", s);
                }
                color
            })
            .collect()
    }

    pub fn osc_listen(&self) -> Option<SocketAddr> {
        parse_addr(self.osc.listen.as_deref()?)
    }

    pub fn osc_feedback(&self) -> Option<SocketAddr> {
        parse_addr(self.osc.feedback.as_deref()?)
    }

    /// Most outbound OSC messages sent per flush interval.
    pub fn osc_max_messages(&self) -> usize {
        self.osc.max_messages.unwrap_or(64).max(1)
    }

    pub fn osc_flush_interval(&self) -> Duration {
        Duration::from_millis(self.osc.flush_interval_ms.unwrap_or(20))
    }

    pub fn preset_dir(&self) -> Option<PathBuf> {
        self.presets
            .directory
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("lumen").join("presets")))
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lumen").join("config.toml"))
}

fn merge_show(base: &mut ShowConfig, user: ShowConfig) {
    if user.frame_rate.is_some() {
        base.frame_rate = user.frame_rate;
    }
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.audio_threshold.is_some() {
        base.audio_threshold = user.audio_threshold;
    }
    if user.palette.is_some() {
        base.palette = user.palette;
    }
}

fn merge_osc(base: &mut OscConfig, user: OscConfig) {
    if user.listen.is_some() {
        base.listen = user.listen;
    }
    if user.feedback.is_some() {
        base.feedback = user.feedback;
    }
    if user.max_messages.is_some() {
        base.max_messages = user.max_messages;
    }
    if user.flush_interval_ms.is_some() {
        base.flush_interval_ms = user.flush_interval_ms;
    }
}

fn parse_addr(s: &str) -> Option<SocketAddr> {
    match s.parse() {
        Ok(addr) => Some(addr),
        Err(e) => {
            log::warn!(target: "config", "invalid socket address {:?}: {}", s, e);
            None
        }
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, alpha))
}
