//! Element discovery.
//!
//! Effects describe their addressable members by walking a visitor; there is
//! no reflection. `register_all` derives missing addresses from a prefix and
//! writes them back onto the members, so `unregister_all` later removes
//! exactly what was registered.

use lumen_types::address::{join, with_leading_slash};

use crate::method::Method;
use crate::parameter::{ParamType, Parameter};
use crate::registry::{Element, Registry};
use crate::scaled::{Lerp, ScaledParameter};

/// Something with an address that can live in the registry.
pub trait Member {
    fn address(&self) -> String;
    fn set_address(&self, address: &str);
    fn element(&self) -> Element;
}

impl<T: ParamType> Member for Parameter<T> {
    fn address(&self) -> String {
        Parameter::address(self)
    }
    fn set_address(&self, address: &str) {
        Parameter::set_address(self, address)
    }
    fn element(&self) -> Element {
        Element::Parameter(self.handle())
    }
}

/// A scaled parameter is addressed through its normalized driver.
impl<T: Lerp> Member for ScaledParameter<T> {
    fn address(&self) -> String {
        ScaledParameter::address(self)
    }
    fn set_address(&self, address: &str) {
        ScaledParameter::set_address(self, address)
    }
    fn element(&self) -> Element {
        Element::Parameter(self.driver().handle())
    }
}

impl Member for Method {
    fn address(&self) -> String {
        Method::address(self)
    }
    fn set_address(&self, address: &str) {
        Method::set_address(self, address)
    }
    fn element(&self) -> Element {
        Element::Method(self.handle())
    }
}

pub trait MemberVisitor {
    fn member(&mut self, name: &str, member: &dyn Member);
}

/// Self-description of an effect component.
pub trait Addressable {
    /// Type name used in derived addresses, e.g. `FXLight`.
    fn type_name(&self) -> &str;
    /// Scope name, e.g. the name of the scene object the effect is attached to.
    fn instance_name(&self) -> String;
    /// Visit every addressable member with its field name.
    fn describe(&self, visitor: &mut dyn MemberVisitor);
}

pub fn default_prefix(effect: &dyn Addressable) -> String {
    with_leading_slash(&format!("{}/{}", effect.instance_name(), effect.type_name()))
}

fn owner_name(effect: &dyn Addressable) -> String {
    format!("{}:{}", effect.instance_name(), effect.type_name())
}

struct Registrar<'a> {
    registry: &'a Registry,
    prefix: &'a str,
    owner: String,
    registered: usize,
    rejected: usize,
}

impl MemberVisitor for Registrar<'_> {
    fn member(&mut self, name: &str, member: &dyn Member) {
        if member.address().is_empty() {
            member.set_address(&join(self.prefix, name));
        }
        match self.registry.register(&member.address(), member.element(), &self.owner) {
            Ok(()) => self.registered += 1,
            // The registry already reported the duplicate.
            Err(_) => self.rejected += 1,
        }
    }
}

/// Register every member of `effect`. Returns the prefix used.
///
/// Members without an address get `<prefix>/<field>`; the default prefix is
/// `/<instance>/<Type>`.
pub fn register_all(registry: &Registry, effect: &dyn Addressable, prefix: Option<&str>) -> String {
    let prefix = match prefix {
        Some(p) => with_leading_slash(p),
        None => default_prefix(effect),
    };
    let mut registrar = Registrar {
        registry,
        prefix: &prefix,
        owner: owner_name(effect),
        registered: 0,
        rejected: 0,
    };
    effect.describe(&mut registrar);
    log::debug!(
        target: "discovery",
        "{}: registered {} member(s), {} rejected",
        registrar.owner,
        registrar.registered,
        registrar.rejected
    );
    prefix
}

struct Unregistrar<'a> {
    registry: &'a Registry,
    removed: usize,
}

impl MemberVisitor for Unregistrar<'_> {
    fn member(&mut self, _name: &str, member: &dyn Member) {
        let address = member.address();
        if !address.is_empty() && self.registry.unregister_element(&address, &member.element()) {
            self.removed += 1;
        }
    }
}

/// Remove every member of `effect`, by each member's current address.
/// Entries at those addresses that belong to another effect stay registered.
pub fn unregister_all(registry: &Registry, effect: &dyn Addressable) -> usize {
    let mut unregistrar = Unregistrar { registry, removed: 0 };
    effect.describe(&mut unregistrar);
    log::debug!(
        target: "discovery",
        "{}: unregistered {} member(s)",
        owner_name(effect),
        unregistrar.removed
    );
    unregistrar.removed
}

struct AddressCollector(Vec<String>);

impl MemberVisitor for AddressCollector {
    fn member(&mut self, _name: &str, member: &dyn Member) {
        self.0.push(member.address());
    }
}

/// Current addresses of every member, in description order. Unset ones are empty.
pub fn member_addresses(effect: &dyn Addressable) -> Vec<String> {
    let mut collector = AddressCollector(Vec::new());
    effect.describe(&mut collector);
    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_types::Value;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Dimmer {
        level: Parameter<f32>,
        label: Parameter<String>,
        fixed: Parameter<bool>,
        size: ScaledParameter<f32>,
        fire: Method,
        fired: Rc<Cell<u32>>,
    }

    impl Dimmer {
        fn new() -> Self {
            let fired = Rc::new(Cell::new(0));
            let f = Rc::clone(&fired);
            Self {
                level: Parameter::new(0.0),
                label: Parameter::new(String::new()),
                fixed: Parameter::new(false).at("/global/fixed"),
                size: ScaledParameter::new(1.0, 3.0, 0.0),
                fire: Method::trigger(move || f.set(f.get() + 1)),
                fired,
            }
        }
    }

    impl Addressable for Dimmer {
        fn type_name(&self) -> &str {
            "Dimmer"
        }
        fn instance_name(&self) -> String {
            "Stage Left".into()
        }
        fn describe(&self, v: &mut dyn MemberVisitor) {
            v.member("level", &self.level);
            v.member("label", &self.label);
            v.member("fixed", &self.fixed);
            v.member("size", &self.size);
            v.member("fire", &self.fire);
        }
    }

    #[test]
    fn derives_and_writes_back_addresses() {
        let registry = Registry::new();
        let dimmer = Dimmer::new();
        let prefix = register_all(&registry, &dimmer, None);
        assert_eq!(prefix, "/StageLeft/Dimmer");
        assert_eq!(dimmer.level.address(), "/StageLeft/Dimmer/level");
        assert_eq!(dimmer.fixed.address(), "/global/fixed");
        assert_eq!(dimmer.size.address(), "/StageLeft/Dimmer/size");
        assert_eq!(registry.len(), 5);

        registry.dispatch("/StageLeft/Dimmer/fire", &[]).unwrap();
        assert_eq!(dimmer.fired.get(), 1);
        registry.dispatch("/StageLeft/Dimmer/size", &[Value::Float(0.5)]).unwrap();
        assert_eq!(dimmer.size.value(), 2.0);
    }

    #[test]
    fn explicit_prefix_collapses_slashes() {
        let registry = Registry::new();
        let dimmer = Dimmer::new();
        let prefix = register_all(&registry, &dimmer, Some("//rig/"));
        assert_eq!(prefix, "/rig/");
        assert_eq!(dimmer.label.address(), "/rig/label");
    }

    #[test]
    fn unregister_is_symmetric() {
        let registry = Registry::new();
        let dimmer = Dimmer::new();
        register_all(&registry, &dimmer, None);
        let addresses = member_addresses(&dimmer);
        assert!(addresses.iter().all(|a| registry.contains(a)));
        assert_eq!(unregister_all(&registry, &dimmer), 5);
        assert!(registry.is_empty());
    }

    #[test]
    fn registering_twice_rejects_every_member() {
        let registry = Registry::new();
        let dimmer = Dimmer::new();
        register_all(&registry, &dimmer, None);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        registry.on_item_added(move |_| s.set(s.get() + 1));
        register_all(&registry, &dimmer, None);
        assert_eq!(seen.get(), 0);
        assert_eq!(registry.len(), 5);
    }
}
