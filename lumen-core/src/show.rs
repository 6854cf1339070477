//! Composition root.
//!
//! `Show` owns the registry and everything that registers into it. It is the
//! only place that knows the per-frame ordering: audio levels, then the tap
//! clock and groups, then effect transitions. The OSC bridge drains after
//! `tick` returns.

use std::path::Path;
use std::rc::Rc;

use lumen_types::address::with_leading_slash;
use lumen_types::PresetDocument;

use crate::audio::{AudioLevels, ManualAudioLevels};
use crate::config::Config;
use crate::discovery::{register_all, unregister_all};
use crate::effects::{Effect, FxBloom, FxLight, FxStrobe};
use crate::group::GroupController;
use crate::palette::PaletteManager;
use crate::persistence::{self, PresetFileError};
use crate::preset::{self, RestoreReport};
use crate::registry::Registry;
use crate::tempo::TapTempo;

pub struct Show {
    registry: Rc<Registry>,
    tempo: TapTempo,
    audio: ManualAudioLevels,
    palette: PaletteManager,
    groups: Vec<Rc<GroupController>>,
    effects: Vec<Box<dyn Effect>>,
    audio_threshold: f32,
}

impl Show {
    pub fn new(config: &Config) -> Self {
        let registry = Registry::new();
        let tempo = TapTempo::new(config.bpm());
        register_all(&registry, &tempo, None);
        let audio = ManualAudioLevels::new();
        register_all(&registry, &audio, Some("/audio"));
        let palette = PaletteManager::new(&config.palette());
        register_all(&registry, &palette, Some("/palette"));
        palette.bind(&registry);
        Self {
            registry,
            tempo,
            audio,
            palette,
            groups: Vec::new(),
            effects: Vec::new(),
            audio_threshold: config.audio_threshold(),
        }
    }

    /// Two lights, a bloom without a post-process target, a strobe, and a
    /// master group driving both light intensities and flashes.
    pub fn demo(config: &Config) -> Self {
        let mut show = Self::new(config);
        show.add_effect(Box::new(FxLight::new("Light1", 1)));
        show.add_effect(Box::new(FxLight::new("Light2", 2)));
        show.add_effect(Box::new(FxBloom::new("Camera", None)));
        show.add_effect(Box::new(FxStrobe::new("Strobe1")));
        let master = show.add_group("/Groups/Master");
        master.add_target("Light1/FXLight/intensity");
        master.add_target("Light2/FXLight/intensity");
        master.add_trigger("Light1/FXLight/flash");
        master.add_trigger("Light2/FXLight/flash");
        show
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn tempo(&self) -> &TapTempo {
        &self.tempo
    }

    pub fn audio(&self) -> &ManualAudioLevels {
        &self.audio
    }

    pub fn palette(&self) -> &PaletteManager {
        &self.palette
    }

    pub fn groups(&self) -> &[Rc<GroupController>] {
        &self.groups
    }

    pub fn group(&self, address: &str) -> Option<Rc<GroupController>> {
        let address = with_leading_slash(address);
        self.groups.iter().find(|g| g.address() == address).cloned()
    }

    pub fn effects(&self) -> &[Box<dyn Effect>] {
        &self.effects
    }

    /// Register and take ownership of an effect. Returns its address prefix.
    pub fn add_effect(&mut self, effect: Box<dyn Effect>) -> String {
        let prefix = register_all(&self.registry, effect.as_addressable(), None);
        log::info!(target: "discovery", "added {}", prefix);
        self.effects.push(effect);
        prefix
    }

    /// Unregister and drop the effect with this instance and type name.
    pub fn remove_effect(&mut self, instance: &str, type_name: &str) -> bool {
        let Some(index) = self
            .effects
            .iter()
            .position(|e| e.instance_name() == instance && e.type_name() == type_name)
        else {
            return false;
        };
        let effect = self.effects.remove(index);
        unregister_all(&self.registry, effect.as_addressable());
        true
    }

    pub fn add_group(&mut self, address: &str) -> Rc<GroupController> {
        let group = GroupController::new(&self.registry, address);
        group.set_audio_threshold(self.audio_threshold);
        self.groups.push(Rc::clone(&group));
        group
    }

    /// Drop the show's handle; the group unregisters once the last handle goes.
    pub fn remove_group(&mut self, address: &str) -> bool {
        let address = with_leading_slash(address);
        let before = self.groups.len();
        self.groups.retain(|g| g.address() != address);
        before != self.groups.len()
    }

    /// One frame.
    pub fn tick(&mut self, dt: f32) {
        self.audio.update(dt);
        self.tempo.tick(dt);
        let bpm = self.tempo.bpm();
        for group in &self.groups {
            group.tick(dt, bpm, &self.audio);
        }
        for effect in &self.effects {
            effect.tick(dt);
        }
    }

    pub fn capture_preset(&self) -> PresetDocument {
        preset::capture(&self.registry, &self.groups)
    }

    pub fn restore_preset(&self, doc: &PresetDocument) -> RestoreReport {
        preset::restore(&self.registry, &self.groups, doc)
    }

    pub fn save_preset_file(&self, path: &Path) -> Result<(), PresetFileError> {
        persistence::save_preset(path, &self.capture_preset())
    }

    pub fn load_preset_file(&self, path: &Path) -> Result<RestoreReport, PresetFileError> {
        let doc = persistence::load_preset(path)?;
        Ok(self.restore_preset(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_types::{Color, Value};

    #[test]
    fn demo_registers_everything() {
        let show = Show::demo(&Config::load_from(None));
        let registry = show.registry();
        for address in [
            "/Light1/FXLight/intensity",
            "/Light2/FXLight/flash",
            "/Camera/FXBloom/intensity",
            "/Strobe1/FXStrobe/strobe",
            "/Groups/Master/value",
            "/audio/low",
            "/palette/color0",
            "/show/Tempo/bpm",
        ] {
            assert!(registry.contains(address), "{}", address);
        }
    }

    #[test]
    fn palette_reaches_bound_lights() {
        let show = Show::demo(&Config::load_from(None));
        let red = Color::rgb(1.0, 0.0, 0.0);
        show.registry().set_fx_value("/palette/color1", red);
        assert_eq!(show.registry().get_fx("/Light1/FXLight/color"), Some(Value::Color(red)));
        assert_ne!(show.registry().get_fx("/Light2/FXLight/color"), Some(Value::Color(red)));
    }

    #[test]
    fn remove_effect_unregisters() {
        let mut show = Show::demo(&Config::load_from(None));
        assert!(show.remove_effect("Strobe1", "FXStrobe"));
        assert!(!show.registry().contains("/Strobe1/FXStrobe/rate"));
        assert!(!show.remove_effect("Strobe1", "FXStrobe"));
    }

    #[test]
    fn remove_group_unregisters() {
        let mut show = Show::demo(&Config::load_from(None));
        assert!(show.remove_group("Groups/Master"));
        assert!(!show.registry().contains("/Groups/Master/value"));
    }
}
