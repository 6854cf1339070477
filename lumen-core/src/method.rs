//! Triggerable methods with a declared signature.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use lumen_types::{Value, ValueKind};

use crate::coerce::coerce_args;
use crate::error::DispatchError;
use crate::parameter::MAX_NOTIFY_DEPTH;

type Callback = Box<dyn Fn(&[Value])>;

struct MethodCell {
    address: RefCell<String>,
    signature: Vec<ValueKind>,
    call: Callback,
    depth: Cell<u32>,
}

/// A callable element. The callback receives arguments already coerced to
/// the declared signature.
#[derive(Clone)]
pub struct Method {
    cell: Rc<MethodCell>,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("address", &*self.cell.address.borrow())
            .field("signature", &self.cell.signature)
            .finish()
    }
}

impl Method {
    pub fn new(signature: &[ValueKind], call: impl Fn(&[Value]) + 'static) -> Self {
        Self {
            cell: Rc::new(MethodCell {
                address: RefCell::new(String::new()),
                signature: signature.to_vec(),
                call: Box::new(call),
                depth: Cell::new(0),
            }),
        }
    }

    /// Zero-argument method.
    pub fn trigger(call: impl Fn() + 'static) -> Self {
        Self::new(&[], move |_| call())
    }

    pub fn at(self, address: &str) -> Self {
        self.set_address(address);
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

    pub fn signature(&self) -> &[ValueKind] {
        &self.cell.signature
    }

    /// Check arity, coerce every argument, then call. Nothing is called on error.
    pub fn invoke(&self, args: &[Value]) -> Result<(), DispatchError> {
        let address = self.address();
        let coerced = coerce_args(&address, &self.cell.signature, args)?;
        let depth = self.cell.depth.get();
        if depth >= MAX_NOTIFY_DEPTH {
            log::warn!(target: "registry", "{}: call nested {} deep, dropping", address, depth);
            return Err(DispatchError::Reentrant { address, depth });
        }
        self.cell.depth.set(depth + 1);
        (self.cell.call)(&coerced);
        self.cell.depth.set(depth);
        Ok(())
    }

    pub fn handle(&self) -> MethodHandle {
        MethodHandle(Rc::downgrade(&self.cell))
    }
}

/// Weak reference to a method, as held by the registry.
#[derive(Clone)]
pub struct MethodHandle(Weak<MethodCell>);

impl MethodHandle {
    pub fn upgrade(&self) -> Option<Method> {
        self.0.upgrade().map(|cell| Method { cell })
    }

    pub fn ptr_eq(&self, other: &MethodHandle) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(m) => write!(f, "MethodHandle({})", m.address()),
            None => f.write_str("MethodHandle(<dropped>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_runs_with_no_args() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let m = Method::trigger(move || h.set(h.get() + 1)).at("/a/fire");
        m.invoke(&[]).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(matches!(
            m.invoke(&[Value::Float(1.0)]),
            Err(DispatchError::ArityMismatch { expected: 0, got: 1, .. })
        ));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn args_arrive_coerced() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let m = Method::new(&[ValueKind::Int, ValueKind::Float], move |args| {
            s.borrow_mut().extend_from_slice(args)
        });
        m.invoke(&[Value::Float(3.2), Value::Int(2)]).unwrap();
        assert_eq!(*seen.borrow(), vec![Value::Int(4), Value::Float(2.0)]);
    }

    #[test]
    fn no_partial_application() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let m = Method::new(&[ValueKind::Float, ValueKind::Color], move |_| h.set(h.get() + 1));
        assert!(m.invoke(&[Value::Float(1.0), Value::Float(2.0)]).is_err());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn runaway_recursion_reports_error() {
        let calls = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Method>>> = Rc::new(RefCell::new(None));
        let (c, inner) = (Rc::clone(&calls), Rc::clone(&slot));
        let method = Method::trigger(move || {
            c.set(c.get() + 1);
            let again = inner.borrow().clone();
            if let Some(again) = again {
                if let Err(e) = again.invoke(&[]) {
                    assert!(matches!(e, DispatchError::Reentrant { depth: MAX_NOTIFY_DEPTH, .. }));
                }
            }
        })
        .at("/a/loop");
        *slot.borrow_mut() = Some(method.clone());
        assert_eq!(method.invoke(&[]), Ok(()));
        assert_eq!(calls.get(), MAX_NOTIFY_DEPTH as usize);
        slot.borrow_mut().take();
    }

    #[test]
    fn handle_dies_with_method() {
        let m = Method::trigger(|| {});
        let h = m.handle();
        drop(m);
        assert!(h.upgrade().is_none());
    }
}
