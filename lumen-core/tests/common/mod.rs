#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::config::Config;
use lumen_core::method::Method;
use lumen_core::registry::Registry;
use lumen_core::show::Show;

pub fn demo_show() -> Show {
    Show::demo(&Config::load_from(None))
}

/// A zero-argument method that appends `label` to a shared log when called.
pub fn logging_trigger(registry: &Registry, address: &str, label: &str, log: &Rc<RefCell<Vec<String>>>) -> Method {
    let log = Rc::clone(log);
    let label = label.to_string();
    let method = Method::trigger(move || log.borrow_mut().push(label.clone())).at(address);
    registry.register_method(&method, "test").unwrap();
    method
}
