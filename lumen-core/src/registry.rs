//! Address registry and dispatch.
//!
//! The registry maps normalized addresses to weakly held elements. Callers
//! reach parameters and methods only through string addresses, which is what
//! lets OSC input, groups, presets and palettes all write through one bus.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use lumen_types::address::normalize;
use lumen_types::{Value, ValueKind};
use regex::Regex;

use crate::error::{DispatchError, RegistryError};
use crate::method::{Method, MethodHandle};
use crate::parameter::{AnyParameter, ListenerId, ParamHandle, ParamType, Parameter};

/// What an address resolves to.
#[derive(Debug, Clone)]
pub enum Element {
    Parameter(ParamHandle),
    Method(MethodHandle),
}

impl Element {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Element::Parameter(_))
    }

    /// Whether both elements refer to the same parameter or method.
    pub fn same_as(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::Parameter(a), Element::Parameter(b)) => a.ptr_eq(b),
            (Element::Method(a), Element::Method(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Element::Parameter(h) => h.upgrade().is_some(),
            Element::Method(h) => h.upgrade().is_some(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub element: Element,
    pub owner: String,
}

type ItemAddedListener = Rc<dyn Fn(&str)>;
type ChangeListener = Rc<dyn Fn(&str, &Value)>;

pub struct Registry {
    entries: RefCell<BTreeMap<String, RegistryEntry>>,
    /// Listener id each registered parameter holds for the change bus.
    bus_links: RefCell<HashMap<String, ListenerId>>,
    item_added: RefCell<Vec<ItemAddedListener>>,
    change_listeners: RefCell<Vec<(ListenerId, ChangeListener)>>,
    next_listener: Cell<ListenerId>,
    self_ref: Weak<Registry>,
}

impl Registry {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak| Registry {
            entries: RefCell::new(BTreeMap::new()),
            bus_links: RefCell::new(HashMap::new()),
            item_added: RefCell::new(Vec::new()),
            change_listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            self_ref: weak.clone(),
        })
    }

    /// Add an element. The first registrant of an address wins.
    pub fn register(&self, address: &str, element: Element, owner: &str) -> Result<(), RegistryError> {
        let address = normalize(address);
        if address.is_empty() {
            log::error!(target: "registry", "refusing empty address (owner {})", owner);
            return Err(RegistryError::EmptyAddress);
        }
        {
            let mut entries = self.entries.borrow_mut();
            if let Some(existing) = entries.get(&address) {
                log::error!(
                    target: "registry",
                    "{} already registered by {}, ignoring registration from {}",
                    address,
                    existing.owner,
                    owner
                );
                return Err(RegistryError::DuplicateAddress(address));
            }
            entries.insert(
                address.clone(),
                RegistryEntry {
                    element: element.clone(),
                    owner: owner.to_string(),
                },
            );
        }
        if let Element::Parameter(handle) = &element {
            self.link_to_bus(&address, handle);
        }
        log::debug!(target: "registry", "registered {} ({})", address, owner);

        let listeners: Vec<ItemAddedListener> = self.item_added.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(&address);
        }
        Ok(())
    }

    pub fn register_parameter<T: ParamType>(&self, parameter: &Parameter<T>, owner: &str) -> Result<(), RegistryError> {
        self.register(&parameter.address(), Element::Parameter(parameter.handle()), owner)
    }

    pub fn register_method(&self, method: &Method, owner: &str) -> Result<(), RegistryError> {
        self.register(&method.address(), Element::Method(method.handle()), owner)
    }

    /// Remove an entry. Returns whether anything was removed.
    pub fn unregister(&self, address: &str) -> bool {
        let address = normalize(address);
        let removed = self.entries.borrow_mut().remove(&address);
        match removed {
            Some(entry) => {
                self.unlink_from_bus(&address, &entry.element);
                log::debug!(target: "registry", "unregistered {}", address);
                true
            }
            None => false,
        }
    }

    /// Remove the entry at `address` only if it holds `element`. An address
    /// claimed by someone else is left alone.
    pub fn unregister_element(&self, address: &str, element: &Element) -> bool {
        let address = normalize(address);
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let owned = entries.get(&address).is_some_and(|entry| entry.element.same_as(element));
            if owned {
                entries.remove(&address)
            } else {
                None
            }
        };
        match removed {
            Some(entry) => {
                self.unlink_from_bus(&address, &entry.element);
                log::debug!(target: "registry", "unregistered {}", address);
                true
            }
            None => false,
        }
    }

    fn link_to_bus(&self, address: &str, handle: &ParamHandle) {
        let Some(param) = handle.upgrade() else {
            return;
        };
        let registry = self.self_ref.clone();
        let bus_address = address.to_string();
        let id = param.subscribe(Rc::new(move |value: &Value| {
            if let Some(registry) = registry.upgrade() {
                registry.publish(&bus_address, value);
            }
        }));
        self.bus_links.borrow_mut().insert(address.to_string(), id);
    }

    fn unlink_from_bus(&self, address: &str, element: &Element) {
        let id = self.bus_links.borrow_mut().remove(address);
        if let (Some(id), Element::Parameter(handle)) = (id, element) {
            if let Some(param) = handle.upgrade() {
                param.unsubscribe(id);
            }
        }
    }

    fn publish(&self, address: &str, value: &Value) {
        let listeners: Vec<ChangeListener> = self
            .change_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(address, value);
        }
    }

    fn resolve(&self, address: &str) -> Result<Element, DispatchError> {
        let entries = self.entries.borrow();
        entries
            .get(address)
            .map(|entry| entry.element.clone())
            .ok_or_else(|| DispatchError::AddressNotFound(address.to_string()))
    }

    fn prune(&self, address: &str) -> DispatchError {
        if let Some(entry) = self.entries.borrow_mut().remove(address) {
            log::warn!(
                target: "registry",
                "{} (owner {}) was dropped without unregistering; entry pruned",
                address,
                entry.owner
            );
        }
        self.bus_links.borrow_mut().remove(address);
        DispatchError::DanglingEntry(address.to_string())
    }

    /// Type-checked invocation or assignment by address.
    ///
    /// Methods take exactly their signature; parameters take exactly one
    /// argument. Arguments are coerced before anything is touched.
    pub fn dispatch(&self, address: &str, args: &[Value]) -> Result<(), DispatchError> {
        let address = normalize(address);
        match self.resolve(&address)? {
            Element::Parameter(handle) => {
                let param = handle.upgrade().ok_or_else(|| self.prune(&address))?;
                if args.len() != 1 {
                    return Err(DispatchError::ArityMismatch {
                        address,
                        expected: 1,
                        got: args.len(),
                    });
                }
                param
                    .assign(&args[0])
                    .map(|_| ())
                    .map_err(|reason| DispatchError::TypeMismatch {
                        address,
                        index: 0,
                        reason,
                    })
            }
            Element::Method(handle) => {
                let method = handle.upgrade().ok_or_else(|| self.prune(&address))?;
                method.invoke(args)
            }
        }
    }

    /// Dispatch to every entry matching an OSC address pattern, in address
    /// order. Returns how many dispatches succeeded.
    pub fn dispatch_pattern(&self, pattern: &str, args: &[Value]) -> usize {
        let regex = match pattern_to_regex(&normalize(pattern)) {
            Ok(regex) => regex,
            Err(e) => {
                log::warn!(target: "registry", "bad address pattern {}: {}", pattern, e);
                return 0;
            }
        };
        let matching: Vec<String> = self
            .entries
            .borrow()
            .keys()
            .filter(|address| regex.is_match(address))
            .cloned()
            .collect();
        let mut delivered = 0;
        for address in matching {
            match self.dispatch(&address, args) {
                Ok(()) => delivered += 1,
                Err(e) => log::warn!(target: "registry", "{} (via {}): {}", address, pattern, e),
            }
        }
        delivered
    }

    /// Current value of a parameter. `None` for methods and unknown addresses.
    pub fn query(&self, address: &str) -> Option<Value> {
        let address = normalize(address);
        match self.resolve(&address).ok()? {
            Element::Parameter(handle) => match handle.upgrade() {
                Some(param) => Some(param.get()),
                None => {
                    self.prune(&address);
                    None
                }
            },
            Element::Method(_) => None,
        }
    }

    pub fn set_fx(&self, address: &str) {
        self.set_fx_args(address, &[]);
    }

    pub fn set_fx_value(&self, address: &str, value: impl Into<Value>) {
        self.set_fx_args(address, &[value.into()]);
    }

    /// Dispatch and report. Errors are logged, never returned.
    pub fn set_fx_args(&self, address: &str, args: &[Value]) {
        if let Err(e) = self.dispatch(address, args) {
            log::warn!(target: "registry", "set_fx {}: {}", address, e);
        }
    }

    pub fn get_fx(&self, address: &str) -> Option<Value> {
        let value = self.query(address);
        if value.is_none() {
            log::warn!(target: "registry", "get_fx {}: no parameter at this address", address);
        }
        value
    }

    pub fn on_item_added(&self, listener: impl Fn(&str) + 'static) {
        self.item_added.borrow_mut().push(Rc::new(listener));
    }

    /// Registry-wide change bus: every registered parameter reports here.
    pub fn subscribe_changes(&self, listener: impl Fn(&str, &Value) + 'static) -> ListenerId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.change_listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe_changes(&self, id: ListenerId) {
        self.change_listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.borrow().contains_key(&normalize(address))
    }

    pub fn entry(&self, address: &str) -> Option<RegistryEntry> {
        self.entries.borrow().get(&normalize(address)).cloned()
    }

    /// All addresses in sorted order.
    pub fn addresses(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Live parameters in address order.
    pub fn parameters(&self) -> Vec<(String, Rc<dyn AnyParameter>)> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|(address, entry)| match &entry.element {
                Element::Parameter(h) => h.upgrade().map(|p| (address.clone(), p)),
                Element::Method(_) => None,
            })
            .collect()
    }

    pub fn entries_of_kind(&self, kind: ValueKind) -> Vec<(String, Rc<dyn AnyParameter>)> {
        self.parameters()
            .into_iter()
            .filter(|(_, p)| p.kind() == kind)
            .collect()
    }

    /// Drop every entry whose element no longer exists. Returns how many went.
    pub fn prune_dangling(&self) -> usize {
        let dead: Vec<String> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, entry)| !entry.element.is_alive())
            .map(|(address, _)| address.clone())
            .collect();
        for address in &dead {
            self.prune(address);
        }
        dead.len()
    }
}

/// Whether an address contains OSC pattern characters.
pub fn is_pattern(address: &str) -> bool {
    address.contains(['*', '?', '[', ']', '{', '}'])
}

/// Translate an OSC 1.0 address pattern into an anchored regex.
///
/// `*` and `?` never cross a `/`, `[!a-c]` negates, `{a,b}` alternates.
pub fn pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');
    let mut in_brackets = false;
    let mut in_braces = false;
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if !in_brackets => re.push_str("[^/]*"),
            '?' if !in_brackets => re.push_str("[^/]"),
            '[' if !in_brackets => {
                in_brackets = true;
                re.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    re.push('^');
                }
            }
            ']' if in_brackets => {
                in_brackets = false;
                re.push(']');
            }
            '{' if !in_brackets => {
                in_braces = true;
                re.push_str("(?:");
            }
            '}' if in_braces => {
                in_braces = false;
                re.push(')');
            }
            ',' if in_braces => re.push('|'),
            c if in_brackets && (c.is_alphanumeric() || c == '-') => re.push(c),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoerceError;

    fn float_param(registry: &Registry, address: &str, value: f32) -> Parameter<f32> {
        let p = Parameter::new(value).at(address);
        registry.register_parameter(&p, "test").unwrap();
        p
    }

    #[test]
    fn duplicate_address_first_wins() {
        let registry = Registry::new();
        let first = float_param(&registry, "/a/x", 1.0);
        let second = Parameter::new(2.0_f32).at("/a/x");
        assert_eq!(
            registry.register_parameter(&second, "other"),
            Err(RegistryError::DuplicateAddress("/a/x".into()))
        );
        registry.dispatch("/a/x", &[Value::Float(5.0)]).unwrap();
        assert_eq!(first.value(), 5.0);
        assert_eq!(second.value(), 2.0);
        assert_eq!(registry.entry("/a/x").unwrap().owner, "test");
    }

    #[test]
    fn nan_dispatch_leaves_value_and_dedup_intact() {
        let registry = Registry::new();
        let p = float_param(&registry, "/a/x", 1.0);
        assert!(matches!(
            registry.dispatch("/a/x", &[Value::Float(f32::NAN)]),
            Err(DispatchError::TypeMismatch { reason: CoerceError::NonFinite(_), .. })
        ));
        assert_eq!(p.value(), 1.0);
        let events = Rc::new(std::cell::Cell::new(0));
        let e = Rc::clone(&events);
        p.on_value_changed(move |_| e.set(e.get() + 1));
        registry.dispatch("/a/x", &[Value::Float(1.0)]).unwrap();
        assert_eq!(events.get(), 0);
    }

    #[test]
    fn empty_address_rejected() {
        let registry = Registry::new();
        let p = Parameter::new(1.0_f32);
        assert_eq!(registry.register_parameter(&p, "t"), Err(RegistryError::EmptyAddress));
    }

    #[test]
    fn unknown_address() {
        let registry = Registry::new();
        assert_eq!(
            registry.dispatch("/nope", &[]),
            Err(DispatchError::AddressNotFound("/nope".into()))
        );
        assert!(!registry.unregister("/nope"));
    }

    #[test]
    fn parameter_requires_one_argument() {
        let registry = Registry::new();
        let _p = float_param(&registry, "/a/x", 1.0);
        assert!(matches!(
            registry.dispatch("/a/x", &[]),
            Err(DispatchError::ArityMismatch { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            registry.dispatch("/a/x", &[Value::Float(1.0), Value::Float(2.0)]),
            Err(DispatchError::ArityMismatch { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn int_parameter_rounds_up() {
        let registry = Registry::new();
        let p = Parameter::new(0_i32).at("/a/count");
        registry.register_parameter(&p, "t").unwrap();
        registry.dispatch("/a/count", &[Value::Float(3.2)]).unwrap();
        assert_eq!(p.value(), 4);
    }

    #[test]
    fn type_mismatch_leaves_value() {
        let registry = Registry::new();
        let p = float_param(&registry, "/a/x", 1.0);
        let err = registry.dispatch("/a/x", &[Value::from("loud")]).unwrap_err();
        assert_eq!(
            err,
            DispatchError::TypeMismatch {
                address: "/a/x".into(),
                index: 0,
                reason: CoerceError::TypeMismatch {
                    expected: ValueKind::Float,
                    found: ValueKind::String
                }
            }
        );
        assert_eq!(p.value(), 1.0);
    }

    #[test]
    fn dropped_owner_is_pruned() {
        let registry = Registry::new();
        let p = float_param(&registry, "/a/x", 1.0);
        drop(p);
        assert_eq!(
            registry.dispatch("/a/x", &[Value::Float(2.0)]),
            Err(DispatchError::DanglingEntry("/a/x".into()))
        );
        assert!(!registry.contains("/a/x"));
    }

    #[test]
    fn prune_dangling_sweeps_dead_entries() {
        let registry = Registry::new();
        let keep = float_param(&registry, "/a/keep", 1.0);
        let gone = float_param(&registry, "/a/gone", 1.0);
        drop(gone);
        assert_eq!(registry.prune_dangling(), 1);
        assert_eq!(registry.addresses(), vec!["/a/keep".to_string()]);
        drop(keep);
    }

    #[test]
    fn query_reads_parameters_only() {
        let registry = Registry::new();
        let _p = float_param(&registry, "/a/x", 0.5);
        let m = Method::trigger(|| {}).at("/a/go");
        registry.register_method(&m, "t").unwrap();
        assert_eq!(registry.query("/a/x"), Some(Value::Float(0.5)));
        assert_eq!(registry.query("/a/go"), None);
        assert_eq!(registry.get_fx("/missing"), None);
    }

    #[test]
    fn change_bus_reports_registered_parameters() {
        let registry = Registry::new();
        let p = float_param(&registry, "/a/x", 0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        registry.subscribe_changes(move |address, value| s.borrow_mut().push((address.to_string(), value.clone())));
        p.set_value(0.25);
        p.set_value(0.25);
        registry.unregister("/a/x");
        p.set_value(0.5);
        assert_eq!(*seen.borrow(), vec![("/a/x".to_string(), Value::Float(0.25))]);
    }

    #[test]
    fn item_added_fires_after_registration() {
        let registry = Registry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        registry.on_item_added(move |address| s.borrow_mut().push(address.to_string()));
        let _p = float_param(&registry, "/a/x", 0.0);
        let dup = Parameter::new(0.0_f32).at("/a/x");
        assert!(registry.register_parameter(&dup, "t").is_err());
        assert_eq!(*seen.borrow(), vec!["/a/x".to_string()]);
    }

    #[test]
    fn pattern_dispatch_counts_successes() {
        let registry = Registry::new();
        let a = float_param(&registry, "/Light1/FXLight/intensity", 0.0);
        let b = float_param(&registry, "/Light2/FXLight/intensity", 0.0);
        let c = float_param(&registry, "/Light2/FXLight/speed", 0.0);
        let n = registry.dispatch_pattern("/Light*/FXLight/intensity", &[Value::Float(1.0)]);
        assert_eq!(n, 2);
        assert_eq!((a.value(), b.value(), c.value()), (1.0, 1.0, 0.0));
        let n = registry.dispatch_pattern("/Light2/FXLight/{speed,intensity}", &[Value::Float(0.5)]);
        assert_eq!(n, 2);
        assert_eq!(c.value(), 0.5);
    }

    #[test]
    fn pattern_translation() {
        let re = pattern_to_regex("/Light[1-2]/*/x?").unwrap();
        assert!(re.is_match("/Light1/FX/xa"));
        assert!(!re.is_match("/Light3/FX/xa"));
        assert!(!re.is_match("/Light1/FX/deep/xa"));
        let neg = pattern_to_regex("/a[!b]").unwrap();
        assert!(neg.is_match("/ac"));
        assert!(!neg.is_match("/ab"));
        assert!(pattern_to_regex("/a.b").unwrap().is_match("/a.b"));
        assert!(!pattern_to_regex("/a.b").unwrap().is_match("/axb"));
        assert!(is_pattern("/a/*"));
        assert!(!is_pattern("/a/b"));
    }
}
