//! Palette-driven color propagation.
//!
//! Color parameters bound to a palette slot follow that slot. The palette
//! slots are parameters themselves, so they can be set over OSC and are
//! stored in presets.

use std::rc::{Rc, Weak};

use lumen_types::{Color, Value, ValueKind};

use crate::discovery::{Addressable, MemberVisitor};
use crate::parameter::{AnyParameter, Parameter};
use crate::registry::{Element, Registry};

pub struct PaletteManager {
    slots: Vec<Parameter<Color>>,
    names: Vec<String>,
}

impl PaletteManager {
    pub fn new(colors: &[Color]) -> Self {
        Self {
            slots: colors.iter().map(|c| Parameter::new(*c)).collect(),
            names: (0..colors.len()).map(|i| format!("color{}", i)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn color(&self, slot: usize) -> Option<Color> {
        self.slots.get(slot).map(|p| p.value())
    }

    pub fn colors(&self) -> Vec<Color> {
        self.slots.iter().map(|p| p.value()).collect()
    }

    /// Change a slot. Bound parameters follow once `bind` has been called.
    pub fn set_color(&self, slot: usize, color: Color) -> bool {
        match self.slots.get(slot) {
            Some(p) => p.set_value(color),
            None => {
                log::warn!(target: "registry", "palette has no slot {}", slot);
                false
            }
        }
    }

    /// Push every slot to every bound color parameter. Returns how many were assigned.
    pub fn apply(&self, registry: &Registry) -> usize {
        let colors = self.colors();
        registry
            .entries_of_kind(ValueKind::Color)
            .into_iter()
            .filter(|(_, param)| apply_slot(param.as_ref(), &colors))
            .count()
    }

    /// Follow slot changes and newly registered bound parameters.
    pub fn bind(&self, registry: &Rc<Registry>) {
        for (slot, param) in self.slots.iter().enumerate() {
            let registry: Weak<Registry> = Rc::downgrade(registry);
            param.on_value_changed(move |color| {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                for (_, target) in registry.entries_of_kind(ValueKind::Color) {
                    if target.palette_slot() == Some(slot) {
                        if let Err(e) = target.assign(&Value::Color(*color)) {
                            log::warn!(target: "palette", "slot {} -> {}: {}", slot, target.address(), e);
                        }
                    }
                }
            });
        }

        let weak = Rc::downgrade(registry);
        let slots = self.slots.clone();
        registry.on_item_added(move |address| {
            let Some(registry) = weak.upgrade() else {
                return;
            };
            let Some(Element::Parameter(handle)) = registry.entry(address).map(|e| e.element) else {
                return;
            };
            if let Some(param) = handle.upgrade() {
                if param.kind() == ValueKind::Color {
                    let colors: Vec<Color> = slots.iter().map(|p| p.value()).collect();
                    apply_slot(param.as_ref(), &colors);
                }
            }
        });
    }
}

fn apply_slot(param: &dyn AnyParameter, colors: &[Color]) -> bool {
    match param.palette_slot().and_then(|slot| colors.get(slot)) {
        Some(color) => match param.assign(&Value::Color(*color)) {
            Ok(_) => true,
            Err(e) => {
                log::warn!(target: "palette", "{}: {}", param.address(), e);
                false
            }
        },
        None => false,
    }
}

impl Addressable for PaletteManager {
    fn type_name(&self) -> &str {
        "Palette"
    }

    fn instance_name(&self) -> String {
        "palette".into()
    }

    fn describe(&self, visitor: &mut dyn MemberVisitor) {
        for (name, slot) in self.names.iter().zip(&self.slots) {
            visitor.member(name, slot);
        }
    }
}
