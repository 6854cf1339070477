//! Typed, observable parameter cells.
//!
//! A [`Parameter<T>`] is a cheap handle to a shared cell. The effect that
//! declares it owns the strong handles; the registry only keeps a weak
//! [`ParamHandle`], so dropping the effect invalidates the registry entry
//! instead of leaving a dangling pointer behind.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_types::{Color, Value, ValueKind};

use crate::coerce::coerce;
use crate::error::CoerceError;

pub type ListenerId = u64;

/// Change notifications nested deeper than this are dropped with a warning.
/// A listener that writes back into the parameter it observes would
/// otherwise recurse without bound.
pub const MAX_NOTIFY_DEPTH: u32 = 8;

/// A Rust type that can live in a parameter cell.
pub trait ParamType: Clone + PartialEq + fmt::Debug + 'static {
    fn kind() -> ValueKind;
    fn to_value(&self) -> Value;
    /// Convert an already-coerced value. Anything but the matching variant is a mismatch.
    fn from_value(value: Value) -> Result<Self, CoerceError>;
}

fn mismatch<T>(expected: ValueKind, found: &Value) -> Result<T, CoerceError> {
    Err(CoerceError::TypeMismatch {
        expected,
        found: found.kind(),
    })
}

impl ParamType for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(v) => Ok(v),
            other => mismatch(ValueKind::Float, &other),
        }
    }
}

impl ParamType for i32 {
    fn kind() -> ValueKind {
        ValueKind::Int
    }
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Int(v) => Ok(v),
            other => mismatch(ValueKind::Int, &other),
        }
    }
}

impl ParamType for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => mismatch(ValueKind::Bool, &other),
        }
    }
}

impl ParamType for String {
    fn kind() -> ValueKind {
        ValueKind::String
    }
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(v) => Ok(v),
            other => mismatch(ValueKind::String, &other),
        }
    }
}

impl ParamType for Color {
    fn kind() -> ValueKind {
        ValueKind::Color
    }
    fn to_value(&self) -> Value {
        Value::Color(*self)
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Color(v) => Ok(v),
            other => mismatch(ValueKind::Color, &other),
        }
    }
}

/// Implemented by fieldless enums that should be addressable by ordinal.
pub trait ParamEnum: Copy + PartialEq + fmt::Debug + 'static {
    fn ordinal(&self) -> i32;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
}

impl<E: ParamEnum> ParamType for E {
    fn kind() -> ValueKind {
        ValueKind::Enum
    }
    fn to_value(&self) -> Value {
        Value::Enum(self.ordinal())
    }
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Enum(o) => E::from_ordinal(o).ok_or(CoerceError::UnknownOrdinal(o)),
            other => mismatch(ValueKind::Enum, &other),
        }
    }
}

/// Type-erased view of a parameter, as seen by the registry.
pub trait AnyParameter {
    fn address(&self) -> String;
    fn kind(&self) -> ValueKind;
    fn get(&self) -> Value;
    /// Coerce and assign. Returns whether the value changed.
    fn assign(&self, value: &Value) -> Result<bool, CoerceError>;
    fn should_persist(&self) -> bool;
    fn palette_slot(&self) -> Option<usize>;
    fn subscribe(&self, listener: Rc<dyn Fn(&Value)>) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// Weak, type-erased reference to a parameter cell.
#[derive(Clone)]
pub struct ParamHandle(Weak<dyn AnyParameter>);

impl ParamHandle {
    pub fn upgrade(&self) -> Option<Rc<dyn AnyParameter>> {
        self.0.upgrade()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &ParamHandle) -> bool {
        // Compare data pointers only; vtable pointers are not unique.
        std::ptr::eq(self.0.as_ptr() as *const (), other.0.as_ptr() as *const ())
    }
}

impl fmt::Debug for ParamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(p) => write!(f, "ParamHandle({})", p.address()),
            None => f.write_str("ParamHandle(<dropped>)"),
        }
    }
}

type Listener<T> = Rc<dyn Fn(&T)>;
/// Maps an incoming value to the one stored, or rejects it with `None`.
type Filter<T> = Rc<dyn Fn(T) -> Option<T>>;

struct ParamCell<T: ParamType> {
    address: RefCell<String>,
    value: RefCell<T>,
    should_persist: Cell<bool>,
    palette_slot: Cell<Option<usize>>,
    filter: RefCell<Option<Filter<T>>>,
    derived: RefCell<Vec<Listener<T>>>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    next_listener: Cell<ListenerId>,
    depth: Cell<u32>,
}

impl<T: ParamType> ParamCell<T> {
    fn set(&self, value: T) -> bool {
        let filter = self.filter.borrow().clone();
        let value = match filter {
            Some(filter) => match filter(value) {
                Some(v) => v,
                None => {
                    log::debug!(target: "param", "{}: value rejected", self.address.borrow());
                    return false;
                }
            },
            None => value,
        };
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        // Derived state follows every write, however deep the nesting.
        let derived: Vec<Listener<T>> = self.derived.borrow().iter().map(Rc::clone).collect();
        for update in derived {
            update(&value);
        }
        self.notify(&value);
        true
    }

    fn notify(&self, value: &T) {
        let depth = self.depth.get();
        if depth >= MAX_NOTIFY_DEPTH {
            log::warn!(
                target: "param",
                "{}: change notification nested {} deep, dropping",
                self.address.borrow(),
                depth
            );
            return;
        }
        // Snapshot so listeners may subscribe, unsubscribe or set this parameter.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        self.depth.set(depth + 1);
        for listener in listeners {
            listener(value);
        }
        self.depth.set(depth);
    }

    fn add_listener(&self, listener: Listener<T>) -> ListenerId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }
}

impl<T: ParamType> AnyParameter for ParamCell<T> {
    fn address(&self) -> String {
        self.address.borrow().clone()
    }

    fn kind(&self) -> ValueKind {
        T::kind()
    }

    fn get(&self) -> Value {
        self.value.borrow().to_value()
    }

    fn assign(&self, value: &Value) -> Result<bool, CoerceError> {
        let typed = T::from_value(coerce(value, T::kind())?)?;
        Ok(self.set(typed))
    }

    fn should_persist(&self) -> bool {
        self.should_persist.get()
    }

    fn palette_slot(&self) -> Option<usize> {
        self.palette_slot.get()
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&Value)>) -> ListenerId {
        self.add_listener(Rc::new(move |v: &T| listener(&v.to_value())))
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.remove_listener(id)
    }
}

/// A typed, observable value with de-duplicated change events.
///
/// Setting a parameter to the value it already holds is a no-op: no event
/// fires. Clones share the same cell.
pub struct Parameter<T: ParamType> {
    cell: Rc<ParamCell<T>>,
}

impl<T: ParamType> Clone for Parameter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: ParamType> fmt::Debug for Parameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("address", &*self.cell.address.borrow())
            .field("value", &*self.cell.value.borrow())
            .finish()
    }
}

impl<T: ParamType + Default> Default for Parameter<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ParamType> Parameter<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(ParamCell {
                address: RefCell::new(String::new()),
                value: RefCell::new(value),
                should_persist: Cell::new(true),
                palette_slot: Cell::new(None),
                filter: RefCell::new(None),
                derived: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                depth: Cell::new(0),
            }),
        }
    }

    /// Give the parameter an explicit address; discovery will not derive one.
    pub fn at(self, address: &str) -> Self {
        self.set_address(address);
        self
    }

    /// Pass every incoming value through `filter`. Returning `None` rejects
    /// the write, which then reports no change.
    pub fn with_filter(self, filter: impl Fn(T) -> Option<T> + 'static) -> Self {
        *self.cell.filter.borrow_mut() = Some(Rc::new(filter));
        self
    }

    /// Exclude this parameter from preset capture.
    pub fn transient(self) -> Self {
        self.cell.should_persist.set(false);
        self
    }

    pub fn address(&self) -> String {
        self.cell.address.borrow().clone()
    }

    pub fn has_address(&self) -> bool {
        !self.cell.address.borrow().is_empty()
    }

    pub fn set_address(&self, address: &str) {
        *self.cell.address.borrow_mut() = lumen_types::address::normalize(address);
    }

    pub fn value(&self) -> T {
        self.cell.value.borrow().clone()
    }

    /// Set the value. Returns `true` (and notifies) only if it changed.
    pub fn set_value(&self, value: T) -> bool {
        self.cell.set(value)
    }

    pub fn should_persist(&self) -> bool {
        self.cell.should_persist.get()
    }

    pub fn set_should_persist(&self, persist: bool) {
        self.cell.should_persist.set(persist);
    }

    pub fn on_value_changed(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        self.cell.add_listener(Rc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.cell.remove_listener(id)
    }

    /// Keep derived state in step with this parameter. Runs before the
    /// ordinary listeners and is exempt from the nesting limit, so it must
    /// not write back into this parameter. Cannot be removed.
    pub(crate) fn on_value_derived(&self, update: impl Fn(&T) + 'static) {
        self.cell.derived.borrow_mut().push(Rc::new(update));
    }

    pub fn listener_count(&self) -> usize {
        self.cell.listeners.borrow().len()
    }

    pub fn handle(&self) -> ParamHandle {
        let erased: Rc<dyn AnyParameter> = self.cell.clone();
        ParamHandle(Rc::downgrade(&erased))
    }
}

impl Parameter<f32> {
    /// Clamp writes into `[min, max]` and reject non-finite values.
    pub fn with_range(self, min: f32, max: f32) -> Self {
        self.with_filter(move |v: f32| v.is_finite().then(|| v.clamp(min, max)))
    }
}

impl Parameter<Color> {
    /// Bind this color to a palette slot; palette changes will overwrite it.
    pub fn bind_palette(self, slot: usize) -> Self {
        self.cell.palette_slot.set(Some(slot));
        self
    }

    pub fn palette_slot(&self) -> Option<usize> {
        self.cell.palette_slot.get()
    }
}
