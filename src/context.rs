//! The ambient bindings in effect while a body of code executes.
//!
//! A [`CallContext`] is built fresh for every call and passed by value —
//! never mutated in place — so dynamic dispatch state lives in explicit
//! values rather than interpreter fields.  `receiver` is the original
//! dynamically‑dispatched object and is never reassigned across nested
//! `this`/`super` hops: only `anchor` moves as control passes between class
//! levels.  `anchor` is absent at top level; `receiver` is additionally
//! absent inside static procs.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class::ClassDef;
use crate::environment::Environment;
use crate::instance::Instance;

#[derive(Debug, Clone)]
pub struct CallContext {
    /// The instance a method call dynamically targets; `None` at top level
    /// and in static‑proc context.
    pub receiver: Option<Rc<Instance>>,

    /// The class level whose code is currently executing; the base for
    /// `this`/`super`/`myclass`/`superclass` resolution.
    pub anchor: Option<Rc<ClassDef>>,

    /// Activation environment for locals and parameters.
    pub env: Rc<RefCell<Environment>>,
}

impl CallContext {
    /// The context of top‑level program code.
    pub fn top_level(env: Rc<RefCell<Environment>>) -> Self {
        CallContext {
            receiver: None,
            anchor: None,
            env,
        }
    }

    /// The context of a method body: the (unchanged) receiver, the level
    /// that defines the method, and its activation frame.
    pub fn in_method(
        receiver: Rc<Instance>,
        anchor: Rc<ClassDef>,
        env: Rc<RefCell<Environment>>,
    ) -> Self {
        CallContext {
            receiver: Some(receiver),
            anchor: Some(anchor),
            env,
        }
    }

    /// The context of a static proc body: anchored, but receiver‑less.
    pub fn in_static(anchor: Rc<ClassDef>, env: Rc<RefCell<Environment>>) -> Self {
        CallContext {
            receiver: None,
            anchor: Some(anchor),
            env,
        }
    }

    /// Same receiver and anchor, different environment.  Plain proc calls
    /// and local binding forms thread the dispatch state unchanged and only
    /// replace the frame their locals live in.
    pub fn with_env(&self, env: Rc<RefCell<Environment>>) -> Self {
        CallContext {
            receiver: self.receiver.clone(),
            anchor: self.anchor.clone(),
            env,
        }
    }
}
