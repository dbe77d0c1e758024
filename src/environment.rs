//! Chained mutable binding frames.
//!
//! Frames are shared by `Rc<RefCell<_>>` wherever they are captured — by a
//! class's lexical environment, a proc's closure, or an activation record —
//! so a `set` through any holder is observed by every later lookup that can
//! reach the same frame.  `define` always creates a binding in the innermost
//! frame; `assign` mutates the nearest existing binding, searching outward,
//! and reports failure without creating one.
//!
//! The `*_here` variants address exactly one frame without walking the
//! chain.  Per‑class static storage uses them: a static frame encloses its
//! class's lexical environment (so initializers can read captured names),
//! but `myclass`/`superclass` lookups must see one level only.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Convenience: a fresh shared frame chained above `enclosing`.
    pub fn nested(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Walk outward through the chain; `None` when the name is unbound
    /// everywhere.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Mutate the nearest existing binding.  Returns `false` when no frame
    /// in the chain binds `name`; a failed assign never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);

            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Read from this frame only, ignoring the enclosing chain.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Mutate a binding in this frame only.  Returns `false` if this frame
    /// does not bind `name`.
    pub fn assign_here(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);

            true
        } else {
            false
        }
    }
}
