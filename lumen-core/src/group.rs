//! Group controllers.
//!
//! A group owns one scaled driver and fans every driver change out to a list
//! of target addresses, in order. It can also fan a zero-argument trigger out
//! to a second list. The driver is set manually, by a pattern generator, or by
//! an audio band, depending on the signal source.
//!
//! Target and trigger addresses are stored without a leading slash and get
//! one added at dispatch time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lumen_types::address::{join, strip_leading_slash, with_leading_slash};
use lumen_types::{AudioBand, GroupConfig, PatternKind, SignalSource};

use crate::audio::{AudioLevels, BandLatches};
use crate::discovery::Member;
use crate::method::Method;
use crate::patterns::{self, PatternGenerator};
use crate::registry::Registry;
use crate::scaled::ScaledParameter;

struct GroupState {
    /// Everything but the live generator. Targets and triggers live here too.
    settings: GroupConfig,
    generator: Option<Box<dyn PatternGenerator>>,
    latches: BandLatches,
    /// Addresses this group successfully registered, removed again on drop.
    registered: Vec<String>,
}

pub struct GroupController {
    address: String,
    driver: ScaledParameter<f32>,
    trigger: Method,
    state: RefCell<GroupState>,
    triggered: RefCell<Vec<Rc<dyn Fn()>>>,
    registry: Weak<Registry>,
}

impl GroupController {
    /// Create a group and register `<address>/value` and `<address>/trigger`.
    pub fn new(registry: &Rc<Registry>, address: &str) -> Rc<Self> {
        let address = with_leading_slash(address);
        let settings = GroupConfig::new(&address);
        let group = Rc::new_cyclic(|weak: &Weak<GroupController>| {
            let driver = ScaledParameter::new(settings.domain_min, settings.domain_max, 0.0)
                .at(&join(&address, "value"));
            let fan_out = weak.clone();
            driver.on_driver_changed(move |_, scaled| {
                if let Some(group) = fan_out.upgrade() {
                    group.fan_out(*scaled);
                }
            });
            let fire = weak.clone();
            let trigger = Method::trigger(move || {
                if let Some(group) = fire.upgrade() {
                    group.fx_trigger();
                }
            })
            .at(&join(&address, "trigger"));
            GroupController {
                address: address.clone(),
                driver,
                trigger,
                state: RefCell::new(GroupState {
                    latches: BandLatches::new(settings.audio_threshold),
                    settings,
                    generator: None,
                    registered: Vec::new(),
                }),
                triggered: RefCell::new(Vec::new()),
                registry: Rc::downgrade(registry),
            }
        });
        group.register_members(registry);
        group
    }

    fn register_members(&self, registry: &Registry) {
        let owner = format!("group:{}", self.address);
        let members: [&dyn Member; 2] = [&self.driver, &self.trigger];
        let mut registered = Vec::new();
        for member in members {
            if registry.register(&member.address(), member.element(), &owner).is_ok() {
                registered.push(member.address());
            }
        }
        self.state.borrow_mut().registered = registered;
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn driver(&self) -> &ScaledParameter<f32> {
        &self.driver
    }

    /// Set the normalized driver. Fans out if it changed.
    pub fn set_value(&self, value: f32) {
        self.driver.set_value(value);
    }

    /// Current scaled value.
    pub fn value(&self) -> f32 {
        self.driver.value()
    }

    pub fn set_domain(&self, min: f32, max: f32) {
        {
            let mut state = self.state.borrow_mut();
            state.settings.domain_min = min;
            state.settings.domain_max = max;
        }
        self.driver.set_domain(min, max);
    }

    fn fan_out(&self, scaled: f32) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let targets = self.state.borrow().settings.target_addresses.clone();
        for target in targets {
            registry.set_fx_value(&with_leading_slash(&target), scaled);
        }
    }

    /// Zero-argument dispatch to every trigger address, then one "triggered"
    /// notification.
    pub fn fx_trigger(&self) {
        if let Some(registry) = self.registry.upgrade() {
            let triggers = self.state.borrow().settings.trigger_addresses.clone();
            for trigger in triggers {
                registry.set_fx(&with_leading_slash(&trigger));
            }
        }
        let listeners: Vec<Rc<dyn Fn()>> = self.triggered.borrow().iter().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn on_triggered(&self, listener: impl Fn() + 'static) {
        self.triggered.borrow_mut().push(Rc::new(listener));
    }

    pub fn targets(&self) -> Vec<String> {
        self.state.borrow().settings.target_addresses.clone()
    }

    pub fn triggers(&self) -> Vec<String> {
        self.state.borrow().settings.trigger_addresses.clone()
    }

    pub fn add_target(&self, address: &str) {
        self.state
            .borrow_mut()
            .settings
            .target_addresses
            .push(strip_leading_slash(address));
    }

    pub fn remove_target(&self, address: &str) {
        let address = strip_leading_slash(address);
        self.state
            .borrow_mut()
            .settings
            .target_addresses
            .retain(|t| *t != address);
    }

    pub fn add_trigger(&self, address: &str) {
        self.state
            .borrow_mut()
            .settings
            .trigger_addresses
            .push(strip_leading_slash(address));
    }

    pub fn remove_trigger(&self, address: &str) {
        let address = strip_leading_slash(address);
        self.state
            .borrow_mut()
            .settings
            .trigger_addresses
            .retain(|t| *t != address);
    }

    pub fn signal_source(&self) -> SignalSource {
        self.state.borrow().settings.signal_source
    }

    pub fn pattern_type(&self) -> PatternKind {
        self.state.borrow().settings.pattern_type
    }

    /// The live generator's kind, if one exists.
    pub fn active_pattern(&self) -> Option<PatternKind> {
        self.state.borrow().generator.as_ref().map(|g| g.kind())
    }

    pub fn audio_band(&self) -> AudioBand {
        self.state.borrow().settings.audio_frequency
    }

    pub fn set_signal_source(&self, source: SignalSource) {
        let mut state = self.state.borrow_mut();
        if state.settings.signal_source == source {
            return;
        }
        log::debug!(target: "group", "{}: signal source {}", self.address, source.name());
        state.settings.signal_source = source;
        rebuild_generator(&mut state);
        state.latches.reset();
    }

    /// Replace the pattern generator. Outside Pattern mode only the kind is
    /// recorded; the generator is built when Pattern mode is entered.
    pub fn set_pattern_type(&self, kind: PatternKind) {
        let mut state = self.state.borrow_mut();
        state.settings.pattern_type = kind;
        rebuild_generator(&mut state);
    }

    pub fn set_num_beats(&self, beats: f32) {
        let beats = patterns::sanitize_num_beats(beats);
        let mut state = self.state.borrow_mut();
        state.settings.num_beats = beats;
        if let Some(generator) = state.generator.as_mut() {
            generator.clock_mut().set_num_beats(beats);
        }
    }

    pub fn set_audio_band(&self, band: AudioBand) {
        self.state.borrow_mut().settings.audio_frequency = band;
    }

    pub fn set_audio_threshold(&self, threshold: f32) {
        let mut state = self.state.borrow_mut();
        state.settings.audio_threshold = threshold;
        state.latches.set_threshold(threshold);
    }

    /// Per-frame update. The driver is written first, then any triggers fire.
    pub fn tick(&self, dt: f32, bpm: f32, audio: &dyn AudioLevels) {
        match self.signal_source() {
            SignalSource::Default => {}
            SignalSource::Pattern => {
                let step = {
                    let mut state = self.state.borrow_mut();
                    state.generator.as_mut().map(|g| {
                        let beats = g.tick(dt, bpm);
                        (g.value(), beats)
                    })
                };
                if let Some((value, beats)) = step {
                    self.driver.set_value(value);
                    for _ in 0..beats {
                        self.fx_trigger();
                    }
                }
            }
            SignalSource::Audio => {
                let (band, crossed) = {
                    let mut state = self.state.borrow_mut();
                    let band = state.settings.audio_frequency;
                    (band, state.latches.update(audio))
                };
                self.driver.set_value(audio.level(band));
                if crossed.contains(&band) {
                    self.fx_trigger();
                }
            }
        }
    }

    /// Replace targets, triggers and signal settings from a stored config.
    pub fn load_config(&self, config: &GroupConfig) {
        {
            let mut state = self.state.borrow_mut();
            let settings = &mut state.settings;
            settings.target_addresses = config.target_addresses.iter().map(|a| strip_leading_slash(a)).collect();
            settings.trigger_addresses = config.trigger_addresses.iter().map(|a| strip_leading_slash(a)).collect();
            settings.signal_source = config.signal_source;
            settings.pattern_type = config.pattern_type;
            settings.audio_frequency = config.audio_frequency;
            settings.audio_threshold = config.audio_threshold;
            settings.num_beats = patterns::sanitize_num_beats(config.num_beats);
            settings.oscillator_shape = config.oscillator_shape;
            settings.arp_direction = config.arp_direction;
            settings.arp_steps = config.arp_steps.clone();
            settings.domain_min = config.domain_min;
            settings.domain_max = config.domain_max;
            let threshold = settings.audio_threshold;
            state.latches.set_threshold(threshold);
            state.latches.reset();
            state.generator = None;
            rebuild_generator(&mut state);
        }
        self.driver.set_domain(config.domain_min, config.domain_max);
        log::debug!(target: "group", "{}: loaded config", self.address);
    }

    /// Snapshot of the current configuration, as stored in presets.
    pub fn config(&self) -> GroupConfig {
        let state = self.state.borrow();
        let mut config = state.settings.clone();
        config.address = self.address.clone();
        if let Some(generator) = state.generator.as_ref() {
            generator.write_config(&mut config);
        }
        config
    }
}

/// Keep exactly one generator while in Pattern mode and none otherwise.
/// The old generator is dropped before the new one is built.
fn rebuild_generator(state: &mut GroupState) {
    if let Some(old) = state.generator.take() {
        old.write_config(&mut state.settings);
    }
    if state.settings.signal_source == SignalSource::Pattern {
        state.generator = Some(patterns::create(state.settings.pattern_type, &state.settings));
    }
}

impl Drop for GroupController {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            for address in &self.state.borrow().registered {
                registry.unregister(address);
            }
        }
    }
}
