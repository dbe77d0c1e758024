//! Static class descriptions and per‑class‑level static storage.
//!
//! A [`ClassDef`] is the immutable description of one class level: its
//! parent link, ordered field and static declarations, method tables, and
//! the environment captured by reference at the point the `class` form was
//! evaluated.  Method tables are built with [`Rc::new_cyclic`] so every
//! [`MethodDef`] carries a back‑reference to its defining level — the
//! static‑dispatch anchor for `this`, `super`, `myclass`, and `superclass`
//! while that code runs.
//!
//! A [`ClassObject`] is the runtime value for a class.  Each level owns one
//! static frame; parent levels are shared by reference with the parent's own
//! `ClassObject`, so `<Parent>count` and `<superclass>count` address the
//! same cell.  A child redeclaring a static name gets independent storage at
//! its own level — shadowing, not replacement.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{ObjError, Result};
use crate::expr::Expr;
use crate::stmt::{ClassDecl, MethodDecl};
use crate::token::Token;
use crate::value::Value;

/// A declared instance field: storage is allocated at the declaring level,
/// seeded by the initializer if present, otherwise unbound until first
/// `set`.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub init: Option<Expr>,
}

/// A method or static proc body together with its static‑dispatch anchor.
#[derive(Debug)]
pub struct MethodDef {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    defining: Weak<ClassDef>,
}

impl MethodDef {
    /// The class level that defines this code.  The registry keeps every
    /// `ClassDef` alive for the program lifetime, so the upgrade cannot
    /// fail while any dispatch is possible.
    pub fn defining_class(&self) -> Rc<ClassDef> {
        self.defining
            .upgrade()
            .expect("defining class outlives its methods")
    }
}

/// Immutable description of one class level.
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<Rc<ClassDef>>,
    pub fields: Vec<FieldDecl>,
    pub statics: Vec<(String, Expr)>,
    pub methods: HashMap<String, Rc<MethodDef>>,
    pub static_procs: HashMap<String, Rc<MethodDef>>,
    pub lexical_env: Rc<RefCell<Environment>>,
}

impl ClassDef {
    /// Build a `ClassDef` from its parsed declaration.  `lexical_env` is
    /// captured by reference: later mutation of that environment is visible
    /// to every `!@` lookup made from this class's code.
    pub fn from_decl(
        decl: &ClassDecl,
        parent: Option<Rc<ClassDef>>,
        lexical_env: Rc<RefCell<Environment>>,
    ) -> Rc<ClassDef> {
        Rc::new_cyclic(|weak: &Weak<ClassDef>| {
            let methods = Self::method_table(&decl.methods, weak);
            let static_procs = Self::method_table(&decl.static_methods, weak);

            ClassDef {
                name: decl.name.lexeme.clone(),
                parent,
                fields: decl
                    .fields
                    .iter()
                    .map(|(name, init)| FieldDecl {
                        name: name.lexeme.clone(),
                        init: init.clone(),
                    })
                    .collect(),
                statics: decl
                    .statics
                    .iter()
                    .map(|(name, init)| (name.lexeme.clone(), init.clone()))
                    .collect(),
                methods,
                static_procs,
                lexical_env,
            }
        })
    }

    fn method_table(
        decls: &[MethodDecl],
        defining: &Weak<ClassDef>,
    ) -> HashMap<String, Rc<MethodDef>> {
        decls
            .iter()
            .map(|m| {
                (
                    m.name.lexeme.clone(),
                    Rc::new(MethodDef {
                        params: m.params.iter().map(|p| p.lexeme.clone()).collect(),
                        body: Rc::new(m.body.clone()),
                        defining: defining.clone(),
                    }),
                )
            })
            .collect()
    }

    /// Search the method table at this level, then upward through ancestors.
    pub fn find_method(&self, name: &str) -> Option<Rc<MethodDef>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.parent.as_ref().and_then(|p| p.find_method(name))
    }

    /// Search the static proc table at this level, then upward through
    /// ancestors.  Used for explicit class‑valued qualifiers; the keyword
    /// modes `myclass`/`superclass` address exactly one level instead.
    pub fn find_static_proc(&self, name: &str) -> Option<Rc<MethodDef>> {
        if let Some(proc) = self.static_procs.get(name) {
            return Some(Rc::clone(proc));
        }

        self.parent.as_ref().and_then(|p| p.find_static_proc(name))
    }
}

/// The runtime value denoting a class.  `statics` is this level's storage
/// frame; it encloses the class's lexical environment so static
/// initializers can read captured names, while `myclass`/`superclass`
/// lookups address it with the exact‑frame accessors only.
#[derive(Debug)]
pub struct ClassObject {
    pub def: Rc<ClassDef>,
    pub parent: Option<Rc<ClassObject>>,
    pub statics: Rc<RefCell<Environment>>,
}

impl ClassObject {
    /// The runtime level chain, root ancestor first, this level last —
    /// the same order an instance's field frames are laid out in.
    pub fn levels(self: &Rc<Self>) -> Vec<Rc<ClassObject>> {
        let mut levels: Vec<Rc<ClassObject>> = Vec::new();
        let mut level: Option<Rc<ClassObject>> = Some(Rc::clone(self));

        while let Some(class) = level {
            level = class.parent.clone();
            levels.push(class);
        }

        levels.reverse();
        levels
    }

    /// Read a static, searching this level's frame then upward through
    /// ancestor levels.  Each frame is addressed exactly — the walk is over
    /// class levels, never the lexical chain behind them.
    pub fn find_static(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.statics.borrow().get_here(name) {
            return Some(value);
        }

        self.parent.as_ref().and_then(|p| p.find_static(name))
    }

    /// Mutate a static, searching this level then upward for the nearest
    /// level that declares the name.  Returns `false` when no level does.
    pub fn assign_static(&self, name: &str, value: Value) -> bool {
        if self.statics.borrow_mut().assign_here(name, value.clone()) {
            return true;
        }

        match &self.parent {
            Some(parent) => parent.assign_static(name, value),
            None => false,
        }
    }
}

/// Process‑wide class table, owned by the interpreter and passed explicitly
/// into registration and dispatch — its lifecycle is the program's.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Rc<ClassObject>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        info!("Class registry created");

        Self {
            classes: HashMap::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<ClassObject>> {
        self.classes.get(name).cloned()
    }

    /// Register a freshly built class.  A name can be bound exactly once
    /// per program run.
    pub fn register(&mut self, name: &Token, class: Rc<ClassObject>) -> Result<()> {
        if self.classes.contains_key(&name.lexeme) {
            return Err(ObjError::DuplicateDefinition {
                name: name.lexeme.clone(),
                line: name.line,
            });
        }

        debug!("Registering class '{}'", name.lexeme);

        self.classes.insert(name.lexeme.clone(), class);

        Ok(())
    }
}
