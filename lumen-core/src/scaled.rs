//! Normalized driver mapped into a typed domain.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use lumen_types::{Color, Vec3};

use crate::parameter::{ListenerId, Parameter};

/// Linear interpolation between two domain endpoints.
pub trait Lerp: Clone + PartialEq + fmt::Debug + 'static {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for i32 {
    /// Rounds to nearest, unlike dispatch coercion which rounds up.
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        (*a as f32 + (*b - *a) as f32 * t).round() as i32
    }
}

impl Lerp for Color {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Color::lerp(*a, *b, t)
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Vec3::lerp(*a, *b, t)
    }
}

type ScaledListener<T> = Rc<dyn Fn(&T)>;

struct ScaledState<T: Lerp> {
    min: T,
    max: T,
    scaled: T,
    /// Last value handed to scaled listeners.
    reported: T,
    listeners: Vec<(ListenerId, ScaledListener<T>)>,
    next_listener: ListenerId,
}

impl<T: Lerp> ScaledState<T> {
    fn recompute(&mut self, t: f32) {
        self.scaled = T::lerp(&self.min, &self.max, t);
    }

    /// Returns the listeners to notify if the scaled value moved since the last report.
    fn take_pending(&mut self) -> Option<(T, Vec<ScaledListener<T>>)> {
        if self.scaled == self.reported {
            return None;
        }
        self.reported = self.scaled.clone();
        let listeners = self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
        Some((self.scaled.clone(), listeners))
    }
}

fn notify_scaled<T: Lerp>(state: &RefCell<ScaledState<T>>) {
    let pending = state.borrow_mut().take_pending();
    if let Some((scaled, listeners)) = pending {
        for listener in listeners {
            listener(&scaled);
        }
    }
}

/// A `Parameter<f32>` driver plus a `[min, max]` domain.
///
/// The driver is not clamped; values outside `0..1` extrapolate. The scaled
/// value is recomputed synchronously on every driver change and on every
/// domain change, so it is never stale, even when nested change events are
/// dropped.
pub struct ScaledParameter<T: Lerp> {
    driver: Parameter<f32>,
    state: Rc<RefCell<ScaledState<T>>>,
}

impl<T: Lerp> Clone for ScaledParameter<T> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Lerp> fmt::Debug for ScaledParameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScaledParameter")
            .field("address", &self.driver.address())
            .field("driver", &self.driver.value())
            .field("min", &state.min)
            .field("max", &state.max)
            .field("scaled", &state.scaled)
            .finish()
    }
}

impl<T: Lerp> ScaledParameter<T> {
    pub fn new(min: T, max: T, driver: f32) -> Self {
        let scaled = T::lerp(&min, &max, driver);
        let state = Rc::new(RefCell::new(ScaledState {
            min,
            max,
            reported: scaled.clone(),
            scaled,
            listeners: Vec::new(),
            next_listener: 0,
        }));
        let driver = Parameter::new(driver);
        let recompute_state = Rc::clone(&state);
        driver.on_value_derived(move |t| recompute_state.borrow_mut().recompute(*t));
        // Registered first so scaled listeners fire before other driver listeners.
        let notify_state = Rc::clone(&state);
        driver.on_value_changed(move |_| notify_scaled(&notify_state));
        Self { driver, state }
    }

    pub fn at(self, address: &str) -> Self {
        self.driver.set_address(address);
        self
    }

    pub fn driver(&self) -> &Parameter<f32> {
        &self.driver
    }

    pub fn driver_value(&self) -> f32 {
        self.driver.value()
    }

    /// Set the normalized driver.
    pub fn set_value(&self, t: f32) -> bool {
        self.driver.set_value(t)
    }

    pub fn value(&self) -> T {
        self.state.borrow().scaled.clone()
    }

    pub fn domain(&self) -> (T, T) {
        let state = self.state.borrow();
        (state.min.clone(), state.max.clone())
    }

    pub fn set_domain(&self, min: T, max: T) {
        {
            let mut state = self.state.borrow_mut();
            state.min = min;
            state.max = max;
            state.recompute(self.driver.value());
        }
        notify_scaled(&self.state);
    }

    /// Fires on every driver change with the raw driver and the updated scaled value.
    pub fn on_driver_changed(&self, listener: impl Fn(f32, &T) + 'static) -> ListenerId {
        let state = Rc::clone(&self.state);
        self.driver.on_value_changed(move |t| {
            let scaled = state.borrow().scaled.clone();
            listener(*t, &scaled);
        })
    }

    /// Fires only when the scaled value actually changes.
    pub fn on_scaled_changed(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.push((id, Rc::new(listener)));
        id
    }

    pub fn remove_driver_listener(&self, id: ListenerId) {
        self.driver.remove_listener(id);
    }

    pub fn remove_scaled_listener(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
    }

    pub fn address(&self) -> String {
        self.driver.address()
    }

    pub fn set_address(&self, address: &str) {
        self.driver.set_address(address);
    }
}
