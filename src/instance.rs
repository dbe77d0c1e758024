//! Runtime objects and their per‑level field storage.
//!
//! An [`Instance`] owns one [`FieldFrame`] per class level in its
//! inheritance chain, root ancestor first — exactly mirroring the class's
//! ancestor chain, one‑to‑one, in the same order.  Two levels may declare
//! the same field name with independent storage (shadowing, like statics);
//! which frame a read or write addresses is decided by the dispatch mode,
//! not by the name alone.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::class::{ClassDef, ClassObject, FieldDecl};
use crate::value::Value;

/// Field storage for one class level.  A slot exists for every declared
/// field; `None` means declared but not yet assigned — reading it is an
/// unbound‑identifier error, and the first `set` fills it in place.
#[derive(Debug)]
pub struct FieldFrame {
    slots: HashMap<String, Option<Value>>,
}

impl FieldFrame {
    /// Allocate one slot per declared field, all unbound.
    pub fn new(fields: &[FieldDecl]) -> Self {
        let slots = fields
            .iter()
            .map(|f| (f.name.clone(), None))
            .collect::<HashMap<_, _>>();

        FieldFrame { slots }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// `None` — not declared here; `Some(None)` — declared, never assigned.
    pub fn get(&self, name: &str) -> Option<Option<Value>> {
        self.slots.get(name).cloned()
    }

    /// Fill or overwrite a declared slot.  Returns `false` when this level
    /// does not declare `name`.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.slots.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);

                true
            }

            None => false,
        }
    }
}

/// The runtime value denoting an object.
///
/// Invariant: `chain` and `frames` are parallel — `frames[i]` is the storage
/// for the level described by `chain[i]`, with `chain[0]` the root ancestor
/// and the last entry the most‑derived class used at `new` time.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<ClassObject>,
    chain: Vec<Rc<ClassDef>>,
    frames: Vec<RefCell<FieldFrame>>,
}

impl Instance {
    pub fn new(
        class: Rc<ClassObject>,
        chain: Vec<Rc<ClassDef>>,
        frames: Vec<RefCell<FieldFrame>>,
    ) -> Self {
        debug_assert_eq!(chain.len(), frames.len());

        Instance {
            class,
            chain,
            frames,
        }
    }

    /// Index of the most‑derived level — where a `self` search starts.
    pub fn derived_index(&self) -> usize {
        self.chain.len() - 1
    }

    /// Position of `def` in this instance's chain, by identity.
    pub fn level_index(&self, def: &Rc<ClassDef>) -> Option<usize> {
        self.chain.iter().position(|level| Rc::ptr_eq(level, def))
    }

    /// Read a field, searching from `start` toward the root ancestor for
    /// the nearest level that declares the name.
    ///
    /// `None` — no level in the search path declares it;
    /// `Some(None)` — declared, but never assigned.
    pub fn read_field(&self, start: usize, name: &str) -> Option<Option<Value>> {
        for index in (0..=start).rev() {
            let frame = self.frames[index].borrow();

            if frame.declares(name) {
                return frame.get(name);
            }
        }

        None
    }

    /// Write a field, searching from `start` toward the root ancestor for
    /// the nearest declaring level.  Returns `false` when no level in the
    /// search path declares the name; a failed write never creates storage.
    pub fn write_field(&self, start: usize, name: &str, value: Value) -> bool {
        for index in (0..=start).rev() {
            let mut frame = self.frames[index].borrow_mut();

            if frame.declares(name) {
                return frame.set(name, value);
            }
        }

        false
    }
}
