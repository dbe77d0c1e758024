use std::cell::RefCell;
use std::rc::Rc;

use crate::class::ClassObject;
use crate::environment::Environment;
use crate::expr::Expr;
use crate::instance::Instance;

/// A user‑defined proc value: a parameter list, a body, and the environment
/// frame captured by reference at the point the `proc` literal was
/// evaluated.  Mutations to that frame after capture are observed on the
/// next lookup — the closure sees live state, not a snapshot.
#[derive(Debug)]
pub struct ProcValue {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub closure: Rc<RefCell<Environment>>,
}

#[derive(Debug, Clone)]
pub enum Value {
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },
    Proc(Rc<ProcValue>),
    Class(Rc<ClassObject>),
    Instance(Rc<Instance>),
    Number(i64),
    String(String),
    Nil,
}

impl PartialEq for Value {
    /// Numbers and strings compare structurally; procs, classes, and
    /// instances compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Proc(a), Value::Proc(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (
                Value::NativeFunction { name: a, .. },
                Value::NativeFunction { name: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Proc(p) => write!(f, "<proc/{}>", p.params.len()),

            Value::Class(c) => write!(f, "<class {}>", c.def.name),

            Value::Instance(i) => write!(f, "<object {}>", i.class.def.name),

            Value::Number(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();

                write!(f, "{}", buf.format(*n))
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Nil => write!(f, "nil"),
        }
    }
}
