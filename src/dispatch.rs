//! The dispatcher: identifier and method resolution under every binding
//! context the language has.
//!
//! Given a call context and a qualifier, resolution picks a storage slot or
//! a method body and, for calls, builds the callee's activation context:
//!
//! | mode         | start level                   | direction          | receiver   |
//! |--------------|-------------------------------|--------------------|------------|
//! | `self`       | receiver's most-derived class | upward to root     | required   |
//! | `this`       | anchor level                  | upward to root     | required   |
//! | `super`      | parent of anchor              | upward to root     | required   |
//! | `myclass`    | anchor level statics          | exact level only   | n/a        |
//! | `superclass` | parent level statics          | exact level only   | n/a        |
//! | `!@`         | anchor's lexical environment  | env chain outward  | n/a        |
//! | `<expr>`     | the value's own level         | upward to root     | the value  |
//!
//! The callee's context keeps the original receiver unchanged and re-anchors
//! at the level where the body was found.  That one rule is what makes
//! `self` calls deep inside a `super` chain still dispatch against the
//! most-derived override, while `this`/`super` calls never jump back down.
//! Static procs execute with no receiver at all, so `self`/`this`/`super`
//! inside them fail rather than silently defaulting.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::class::{ClassDef, ClassObject, MethodDef};
use crate::context::CallContext;
use crate::environment::Environment;
use crate::error::{ObjError, Result};
use crate::expr::{Expr, Qualifier};
use crate::instance::Instance;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

impl Interpreter {
    // ───────────────────────────── calls ─────────────────────────────

    /// Entry point for every call form.  `qualifier` is `None` for a plain
    /// `.f(args)` proc call.  Arguments are evaluated in the caller's
    /// context, in program order, before the target is resolved.
    pub fn evaluate_call(
        &mut self,
        ctx: &CallContext,
        qualifier: Option<&Qualifier>,
        name: &Token,
        args: &[Expr],
    ) -> Result<Value> {
        debug!(
            "Dispatching call '{}' with qualifier {:?}",
            name.lexeme, qualifier
        );

        let mut arg_values: Vec<Value> = Vec::with_capacity(args.len());

        for arg in args {
            let value = self.evaluate(arg, ctx)?;

            debug!("Evaluated argument => {}", value);

            arg_values.push(value);
        }

        match qualifier {
            None => {
                let callee = ctx
                    .env
                    .borrow()
                    .get(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "variable"))?;

                self.invoke_value(&callee, ctx, arg_values, name)
            }

            Some(Qualifier::Lexical) => {
                let lexical = lexical_env(ctx, name)?;

                let callee = lexical
                    .borrow()
                    .get(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "lexical"))?;

                self.invoke_value(&callee, ctx, arg_values, name)
            }

            Some(Qualifier::SelfRef) => {
                let receiver = require_receiver(ctx, name.line, "self")?;

                let method = receiver
                    .class
                    .def
                    .find_method(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "method"))?;

                self.invoke_method(&method, receiver, arg_values, name)
            }

            Some(Qualifier::This) => {
                let receiver = require_receiver(ctx, name.line, "this")?;
                let anchor = require_anchor(ctx, name.line, "this")?;

                let method = anchor
                    .find_method(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "method"))?;

                self.invoke_method(&method, receiver, arg_values, name)
            }

            Some(Qualifier::Super) => {
                let receiver = require_receiver(ctx, name.line, "super")?;
                let anchor = require_anchor(ctx, name.line, "super")?;
                let parent = require_parent(&anchor, name.line)?;

                let method = parent
                    .find_method(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "method"))?;

                self.invoke_method(&method, receiver, arg_values, name)
            }

            Some(Qualifier::MyClass) => {
                let anchor = require_anchor(ctx, name.line, "myclass")?;

                // Statics are not implicitly inherited: exact level only.
                let proc = anchor
                    .static_procs
                    .get(&name.lexeme)
                    .cloned()
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "static method"))?;

                self.invoke_static_proc(&proc, arg_values, name)
            }

            Some(Qualifier::SuperClass) => {
                let anchor = require_anchor(ctx, name.line, "superclass")?;
                let parent = require_parent(&anchor, name.line)?;

                let proc = parent
                    .static_procs
                    .get(&name.lexeme)
                    .cloned()
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "static method"))?;

                self.invoke_static_proc(&proc, arg_values, name)
            }

            Some(Qualifier::Object(expr)) => match self.evaluate(expr, ctx)? {
                Value::Instance(object) => {
                    let method = object
                        .class
                        .def
                        .find_method(&name.lexeme)
                        .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "method"))?;

                    self.invoke_method(&method, object, arg_values, name)
                }

                Value::Class(class) => {
                    let proc = class.def.find_static_proc(&name.lexeme).ok_or_else(|| {
                        ObjError::unbound(name.line, &name.lexeme, "static method")
                    })?;

                    self.invoke_static_proc(&proc, arg_values, name)
                }

                other => Err(ObjError::runtime(format!(
                    "Can only dispatch on objects and classes, got {} at line {}",
                    other, name.line
                ))),
            },
        }
    }

    /// Run a method body.  The callee's context keeps `receiver` unchanged
    /// and re-anchors at the method's defining level; its activation frame
    /// sits over that level's lexical environment.
    fn invoke_method(
        &mut self,
        method: &Rc<MethodDef>,
        receiver: Rc<Instance>,
        args: Vec<Value>,
        name: &Token,
    ) -> Result<Value> {
        check_arity(method.params.len(), args.len(), name)?;

        let anchor: Rc<ClassDef> = method.defining_class();

        debug!(
            "Invoking method '{}' anchored at '{}'",
            name.lexeme, anchor.name
        );

        let env = Environment::nested(&anchor.lexical_env);

        for (param, value) in method.params.iter().zip(args) {
            env.borrow_mut().define(param, value);
        }

        let callee_ctx = CallContext::in_method(receiver, anchor, env);
        let body = Rc::clone(&method.body);

        self.evaluate(body.as_ref(), &callee_ctx)
    }

    /// Run a static proc body: anchored at its defining level, but with no
    /// receiver.
    fn invoke_static_proc(
        &mut self,
        proc: &Rc<MethodDef>,
        args: Vec<Value>,
        name: &Token,
    ) -> Result<Value> {
        check_arity(proc.params.len(), args.len(), name)?;

        let anchor: Rc<ClassDef> = proc.defining_class();

        debug!(
            "Invoking static proc '{}' anchored at '{}'",
            name.lexeme, anchor.name
        );

        let env = Environment::nested(&anchor.lexical_env);

        for (param, value) in proc.params.iter().zip(args) {
            env.borrow_mut().define(param, value);
        }

        let callee_ctx = CallContext::in_static(anchor, env);
        let body = Rc::clone(&proc.body);

        self.evaluate(body.as_ref(), &callee_ctx)
    }

    /// Invoke a first-class callable (a proc value or a native).  Plain
    /// proc calls are not dispatch: the caller's receiver and anchor are
    /// threaded through unchanged, and only the environment is replaced
    /// with a fresh activation frame over the proc's closure.
    fn invoke_value(
        &mut self,
        callee: &Value,
        ctx: &CallContext,
        args: Vec<Value>,
        name: &Token,
    ) -> Result<Value> {
        match callee {
            Value::Proc(proc) => {
                check_arity(proc.params.len(), args.len(), name)?;

                debug!("Invoking proc '{}'", name.lexeme);

                let env = Environment::nested(&proc.closure);

                for (param, value) in proc.params.iter().zip(args) {
                    env.borrow_mut().define(param, value);
                }

                let callee_ctx = ctx.with_env(env);
                let body = Rc::clone(&proc.body);

                self.evaluate(body.as_ref(), &callee_ctx)
            }

            Value::NativeFunction { name: nname, arity, func } => {
                debug!("Calling native proc '{}'", nname);

                check_arity(*arity, args.len(), name)?;

                func(&args).map_err(ObjError::Runtime)
            }

            other => Err(ObjError::runtime(format!(
                "Can only call procs, got {} at line {}",
                other, name.line
            ))),
        }
    }

    // ─────────────────────────── reads ───────────────────────────

    /// Entry point for bare qualified reads: `<qualifier>name`.
    pub fn resolve_qualified(
        &mut self,
        ctx: &CallContext,
        qualifier: &Qualifier,
        name: &Token,
    ) -> Result<Value> {
        debug!(
            "Resolving '{}' with qualifier {:?}",
            name.lexeme, qualifier
        );

        match qualifier {
            Qualifier::Lexical => {
                let lexical = lexical_env(ctx, name)?;

                let result = lexical
                    .borrow()
                    .get(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "lexical"));
                result
            }

            Qualifier::SelfRef => {
                let receiver = require_receiver(ctx, name.line, "self")?;
                let start = receiver.derived_index();

                read_field(&receiver, start, name)
            }

            Qualifier::This => {
                let receiver = require_receiver(ctx, name.line, "this")?;
                let start = anchor_index(&receiver, ctx, name)?;

                read_field(&receiver, start, name)
            }

            Qualifier::Super => {
                let receiver = require_receiver(ctx, name.line, "super")?;
                let anchor_at = anchor_index(&receiver, ctx, name)?;

                if anchor_at == 0 {
                    let anchor = require_anchor(ctx, name.line, "super")?;

                    return Err(no_parent_error(&anchor, name.line));
                }

                read_field(&receiver, anchor_at - 1, name)
            }

            Qualifier::MyClass => {
                let anchor = require_anchor(ctx, name.line, "myclass")?;
                let level = self.level_object(&anchor)?;

                // Exact level only; statics are not implicitly inherited.
                let result = level
                    .statics
                    .borrow()
                    .get_here(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "static"));
                result
            }

            Qualifier::SuperClass => {
                let anchor = require_anchor(ctx, name.line, "superclass")?;
                let parent = require_parent(&anchor, name.line)?;
                let level = self.level_object(&parent)?;

                let result = level
                    .statics
                    .borrow()
                    .get_here(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "static"));
                result
            }

            Qualifier::Object(expr) => match self.evaluate(expr, ctx)? {
                Value::Instance(object) => {
                    let start = object.derived_index();

                    read_field(&object, start, name)
                }

                Value::Class(class) => class
                    .find_static(&name.lexeme)
                    .ok_or_else(|| ObjError::unbound(name.line, &name.lexeme, "static")),

                other => Err(ObjError::runtime(format!(
                    "Can only read members of objects and classes, got {} at line {}",
                    other, name.line
                ))),
            },
        }
    }

    // ─────────────────────────── writes ───────────────────────────

    /// Entry point for `set` forms.  `qualifier` is `None` for a plain
    /// `set x = v`, which mutates the nearest enclosing environment binding.
    pub fn assign_qualified(
        &mut self,
        ctx: &CallContext,
        qualifier: Option<&Qualifier>,
        name: &Token,
        value: Value,
    ) -> Result<()> {
        debug!(
            "Assigning '{}' with qualifier {:?}",
            name.lexeme, qualifier
        );

        match qualifier {
            None => {
                if ctx.env.borrow_mut().assign(&name.lexeme, value) {
                    Ok(())
                } else {
                    Err(ObjError::unbound(name.line, &name.lexeme, "variable"))
                }
            }

            Some(Qualifier::Lexical) => {
                let lexical = lexical_env(ctx, name)?;

                if lexical.borrow_mut().assign(&name.lexeme, value) {
                    Ok(())
                } else {
                    Err(ObjError::unbound(name.line, &name.lexeme, "lexical"))
                }
            }

            Some(Qualifier::SelfRef) => {
                let receiver = require_receiver(ctx, name.line, "self")?;
                let start = receiver.derived_index();

                write_field(&receiver, start, name, value)
            }

            Some(Qualifier::This) => {
                let receiver = require_receiver(ctx, name.line, "this")?;
                let start = anchor_index(&receiver, ctx, name)?;

                write_field(&receiver, start, name, value)
            }

            Some(Qualifier::Super) => {
                let receiver = require_receiver(ctx, name.line, "super")?;
                let anchor_at = anchor_index(&receiver, ctx, name)?;

                if anchor_at == 0 {
                    let anchor = require_anchor(ctx, name.line, "super")?;

                    return Err(no_parent_error(&anchor, name.line));
                }

                write_field(&receiver, anchor_at - 1, name, value)
            }

            Some(Qualifier::MyClass) => {
                let anchor = require_anchor(ctx, name.line, "myclass")?;
                let level = self.level_object(&anchor)?;

                if level.statics.borrow_mut().assign_here(&name.lexeme, value) {
                    Ok(())
                } else {
                    Err(ObjError::unbound(name.line, &name.lexeme, "static"))
                }
            }

            Some(Qualifier::SuperClass) => {
                let anchor = require_anchor(ctx, name.line, "superclass")?;
                let parent = require_parent(&anchor, name.line)?;
                let level = self.level_object(&parent)?;

                if level.statics.borrow_mut().assign_here(&name.lexeme, value) {
                    Ok(())
                } else {
                    Err(ObjError::unbound(name.line, &name.lexeme, "static"))
                }
            }

            Some(Qualifier::Object(expr)) => match self.evaluate(expr, ctx)? {
                Value::Instance(object) => {
                    let start = object.derived_index();

                    write_field(&object, start, name, value)
                }

                Value::Class(class) => {
                    if class.assign_static(&name.lexeme, value) {
                        Ok(())
                    } else {
                        Err(ObjError::unbound(name.line, &name.lexeme, "static"))
                    }
                }

                other => Err(ObjError::runtime(format!(
                    "Can only assign members of objects and classes, got {} at line {}",
                    other, name.line
                ))),
            },
        }
    }

    // ─────────────────────────── helpers ───────────────────────────

    /// The runtime level (static storage) for a class definition.  Every
    /// level reachable from an anchor was registered when its class was
    /// defined.
    fn level_object(&self, def: &Rc<ClassDef>) -> Result<Rc<ClassObject>> {
        self.registry
            .lookup(&def.name)
            .ok_or_else(|| {
                ObjError::runtime(format!("Class '{}' is not registered", def.name))
            })
    }
}

fn check_arity(expected: usize, got: usize, name: &Token) -> Result<()> {
    if expected != got {
        return Err(ObjError::runtime(format!(
            "Expected {} arguments but got {} at line {}",
            expected, got, name.line
        )));
    }

    Ok(())
}

/// `self`/`this`/`super` need an instance; static procs and top-level code
/// have none.
fn require_receiver(
    ctx: &CallContext,
    line: usize,
    keyword: &'static str,
) -> Result<Rc<Instance>> {
    ctx.receiver
        .clone()
        .ok_or_else(|| ObjError::no_receiver(line, keyword))
}

/// Every anchored mode needs class code to be executing.
fn require_anchor(ctx: &CallContext, line: usize, keyword: &'static str) -> Result<Rc<ClassDef>> {
    ctx.anchor.clone().ok_or_else(|| {
        ObjError::runtime(format!(
            "'{}' used outside of class code at line {}",
            keyword, line
        ))
    })
}

fn require_parent(anchor: &Rc<ClassDef>, line: usize) -> Result<Rc<ClassDef>> {
    anchor
        .parent
        .clone()
        .ok_or_else(|| no_parent_error(anchor, line))
}

fn no_parent_error(anchor: &Rc<ClassDef>, line: usize) -> ObjError {
    ObjError::runtime(format!(
        "Class '{}' has no parent class at line {}",
        anchor.name, line
    ))
}

/// The lexical environment a `!@` reference addresses: the one captured
/// when the anchor class was defined.  Inside a static proc the anchor is
/// the proc's defining class, so the same rule covers both contexts.
fn lexical_env(ctx: &CallContext, name: &Token) -> Result<Rc<RefCell<Environment>>> {
    match &ctx.anchor {
        Some(anchor) => Ok(Rc::clone(&anchor.lexical_env)),
        None => Err(ObjError::runtime(format!(
            "'!@' used outside of class code at line {}",
            name.line
        ))),
    }
}

/// Position of the anchor level within the receiver's chain.  Dispatch
/// only ever anchors at a level the receiver actually has, so a miss is a
/// broken invariant, not a user error.
fn anchor_index(receiver: &Rc<Instance>, ctx: &CallContext, name: &Token) -> Result<usize> {
    let anchor = ctx.anchor.clone().ok_or_else(|| {
        ObjError::runtime(format!(
            "'this' used outside of class code at line {}",
            name.line
        ))
    })?;

    receiver.level_index(&anchor).ok_or_else(|| {
        ObjError::runtime(format!(
            "Receiver is not an instance of '{}' at line {}",
            anchor.name, name.line
        ))
    })
}

fn read_field(receiver: &Rc<Instance>, start: usize, name: &Token) -> Result<Value> {
    match receiver.read_field(start, &name.lexeme) {
        Some(Some(value)) => Ok(value),
        Some(None) => Err(ObjError::unbound(name.line, &name.lexeme, "unassigned field")),
        None => Err(ObjError::unbound(name.line, &name.lexeme, "field")),
    }
}

fn write_field(
    receiver: &Rc<Instance>,
    start: usize,
    name: &Token,
    value: Value,
) -> Result<()> {
    if receiver.write_field(start, &name.lexeme, value) {
        Ok(())
    } else {
        Err(ObjError::unbound(name.line, &name.lexeme, "field"))
    }
}
