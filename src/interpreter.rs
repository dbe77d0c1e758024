//! The outer evaluator for OBJ programs.
//!
//! Owns the global environment and the class registry, and evaluates
//! expressions against an explicit [`CallContext`] — the receiver, the
//! anchor class level, and the activation environment are threaded by value
//! through every call rather than kept in interpreter fields.  All
//! qualified reads, writes, and calls are delegated to the dispatcher (see
//! `dispatch.rs`); this module interprets the expression forms themselves.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::class::{ClassDef, ClassObject, ClassRegistry};
use crate::context::CallContext;
use crate::environment::Environment;
use crate::error::{ObjError, Result};
use crate::expr::Expr;
use crate::instance::{FieldFrame, Instance};
use crate::parser::Parser;
use crate::stmt::{ClassDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{ProcValue, Value};

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    pub(crate) registry: ClassRegistry,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter and defines the native procs `add1` and
    /// `sub1`.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native procs 'add1' and 'sub1'");

        globals.borrow_mut().define(
            "add1",
            Value::NativeFunction {
                name: "add1".to_string(),
                arity: 1,
                func: |args: &[Value]| match args {
                    [Value::Number(n)] => Ok(Value::Number(n + 1)),
                    _ => Err("add1 expects one number".to_string()),
                },
            },
        );

        globals.borrow_mut().define(
            "sub1",
            Value::NativeFunction {
                name: "sub1".to_string(),
                arity: 1,
                func: |args: &[Value]| match args {
                    [Value::Number(n)] => Ok(Value::Number(n - 1)),
                    _ => Err("sub1 expects one number".to_string()),
                },
            },
        );

        Self {
            globals,
            registry: ClassRegistry::new(),
        }
    }

    /// The context of top-level program code.
    pub fn global_context(&self) -> CallContext {
        CallContext::top_level(Rc::clone(&self.globals))
    }

    /// Scan, parse, and interpret `src` in one step.  Returns the values of
    /// the top-level expression statements in program order.
    pub fn run(&mut self, src: &[u8]) -> Result<Vec<Value>> {
        let statements: Vec<Stmt> = Parser::from_source(src)?.parse()?;

        self.interpret(&statements)
    }

    /// Interprets a list of statements (a "program").  Returns the value of
    /// each top-level expression statement, in program order — the driver
    /// prints these.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Vec<Value>> {
        debug!("Interpreting {} statements", statements.len());

        let ctx: CallContext = self.global_context();
        let mut printed: Vec<Value> = Vec::new();

        for stmt in statements {
            debug!("Executing statement: {:?}", stmt);

            if let Some(value) = self.execute(stmt, &ctx)? {
                printed.push(value);
            }
        }

        info!("Interpretation completed successfully");

        Ok(printed)
    }

    /// Executes a single statement.  `Some(value)` for expression
    /// statements, `None` for declarations.
    pub fn execute(&mut self, stmt: &Stmt, ctx: &CallContext) -> Result<Option<Value>> {
        match stmt {
            Stmt::Define(name, initializer) => {
                debug!("Defining '{}'", name.lexeme);

                let value = self.evaluate(initializer, ctx)?;

                ctx.env.borrow_mut().define(&name.lexeme, value.clone());

                info!("'{}' defined with value: {}", name.lexeme, value);

                Ok(None)
            }

            Stmt::Class(decl) => {
                self.define_class(decl, ctx)?;

                Ok(None)
            }

            Stmt::Expression(expr) => {
                debug!("Evaluating expression statement");

                let value = self.evaluate(expr, ctx)?;

                Ok(Some(value))
            }
        }
    }

    /// Evaluates an expression in the given call context and returns a
    /// Value.
    pub fn evaluate(&mut self, expr: &Expr, ctx: &CallContext) -> Result<Value> {
        debug!("Evaluating expression: {:?}", expr);

        let value = match expr {
            Expr::Literal(token) => self.evaluate_literal(token)?,

            Expr::Variable(token) => self.evaluate_variable(token, ctx)?,

            Expr::Receiver(token) => self.evaluate_receiver(token, ctx)?,

            Expr::Prim(op, args) => self.evaluate_prim(op, args, ctx)?,

            Expr::If(condition, then_branch, else_branch) => {
                let cond_value = self.evaluate(condition, ctx)?;

                if is_truthy(&cond_value) {
                    self.evaluate(then_branch, ctx)?
                } else {
                    self.evaluate(else_branch, ctx)?
                }
            }

            Expr::Let(bindings, body) => {
                // Sequential binding: each initializer sees the ones before
                // it, all in a fresh frame over the current environment.
                let env = Environment::nested(&ctx.env);
                let inner = ctx.with_env(Rc::clone(&env));

                for (name, initializer) in bindings {
                    let value = self.evaluate(initializer, &inner)?;

                    env.borrow_mut().define(&name.lexeme, value);
                }

                self.evaluate(body, &inner)?
            }

            Expr::Proc(params, body) => {
                // The current frame is captured by reference as the
                // closure; later mutation through any holder is visible.
                Value::Proc(Rc::new(ProcValue {
                    params: params.iter().map(|p| p.lexeme.clone()).collect(),
                    body: Rc::new((**body).clone()),
                    closure: Rc::clone(&ctx.env),
                }))
            }

            Expr::Seq(exprs) => {
                let mut last = Value::Nil;

                for e in exprs {
                    last = self.evaluate(e, ctx)?;
                }

                last
            }

            Expr::New(keyword, class_expr) => {
                let class = match self.evaluate(class_expr, ctx)? {
                    Value::Class(class) => class,

                    other => {
                        return Err(ObjError::runtime(format!(
                            "'new' expects a class, got {} at line {}",
                            other, keyword.line
                        )));
                    }
                };

                Value::Instance(self.instantiate(&class)?)
            }

            Expr::Get { qualifier, name } => self.resolve_qualified(ctx, qualifier, name)?,

            Expr::Set {
                qualifier,
                name,
                value,
            } => {
                let val = self.evaluate(value, ctx)?;

                self.assign_qualified(ctx, qualifier.as_ref(), name, val.clone())?;

                val
            }

            Expr::Call {
                qualifier,
                name,
                args,
            } => self.evaluate_call(ctx, qualifier.as_ref(), name, args)?,
        };

        debug!("Expression evaluated to: {}", value);

        Ok(value)
    }

    /// Evaluates a literal token.
    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        let val = match &token.token_type {
            TokenType::NUMBER(n) => Value::Number(*n),
            TokenType::STRING(s) => Value::String(s.clone()),
            TokenType::NIL => Value::Nil,
            _ => {
                return Err(ObjError::runtime(format!(
                    "Invalid literal on line {}",
                    token.line
                )));
            }
        };

        Ok(val)
    }

    /// Evaluates a bare identifier through the environment chain.
    fn evaluate_variable(&self, token: &Token, ctx: &CallContext) -> Result<Value> {
        debug!("Looking up variable '{}'", token.lexeme);

        ctx.env
            .borrow()
            .get(&token.lexeme)
            .ok_or_else(|| ObjError::unbound(token.line, &token.lexeme, "variable"))
    }

    /// `self` / `this` in expression position: both denote the current
    /// receiver.  The distinction between them only exists in dispatch
    /// qualifiers.
    fn evaluate_receiver(&self, token: &Token, ctx: &CallContext) -> Result<Value> {
        let keyword: &'static str = match token.token_type {
            TokenType::SELF => "self",
            _ => "this",
        };

        match &ctx.receiver {
            Some(receiver) => Ok(Value::Instance(Rc::clone(receiver))),
            None => Err(ObjError::no_receiver(token.line, keyword)),
        }
    }

    /// Evaluates a prefix prim application: `+(a, b)`, `*(x, y)`, ...
    fn evaluate_prim(&mut self, op: &Token, args: &[Expr], ctx: &CallContext) -> Result<Value> {
        debug!("Evaluating prim '{}'", op.lexeme);

        if args.len() != 2 {
            return Err(ObjError::runtime(format!(
                "Prim '{}' expects 2 operands but got {} on line {}",
                op.lexeme,
                args.len(),
                op.line
            )));
        }

        let left = self.evaluate(&args[0], ctx)?;
        let right = self.evaluate(&args[1], ctx)?;

        let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
            return Err(ObjError::runtime(format!(
                "Operands of '{}' must be numbers on line {}",
                op.lexeme, op.line
            )));
        };

        let result = match op.token_type {
            TokenType::PLUS => a + b,
            TokenType::MINUS => a - b,
            TokenType::STAR => a * b,
            TokenType::SLASH => {
                if *b == 0 {
                    return Err(ObjError::runtime(format!(
                        "Division by zero on line {}",
                        op.line
                    )));
                }

                a / b
            }
            _ => {
                return Err(ObjError::runtime(format!(
                    "Invalid prim operator on line {}",
                    op.line
                )));
            }
        };

        Ok(Value::Number(result))
    }

    // ───────────────────────── class machinery ─────────────────────────

    /// Process a `class ... end` declaration: build the immutable
    /// [`ClassDef`] (capturing the current environment by reference as its
    /// lexical closure), allocate this level's static frame, register the
    /// class, bind it as a first-class value, and seed the statics eagerly
    /// in declaration order.
    pub fn define_class(&mut self, decl: &ClassDecl, ctx: &CallContext) -> Result<Rc<ClassObject>> {
        info!("Defining class '{}'", decl.name.lexeme);

        let parent_object: Option<Rc<ClassObject>> = match &decl.parent {
            Some(parent_name) => Some(self.registry.lookup(&parent_name.lexeme).ok_or_else(
                || ObjError::UnknownParent {
                    class: decl.name.lexeme.clone(),
                    parent: parent_name.lexeme.clone(),
                    line: parent_name.line,
                },
            )?),
            None => None,
        };

        let parent_def: Option<Rc<ClassDef>> =
            parent_object.as_ref().map(|p| Rc::clone(&p.def));

        let def: Rc<ClassDef> = ClassDef::from_decl(decl, parent_def, Rc::clone(&ctx.env));

        // This level's static frame encloses the lexical environment so the
        // initializers below can read captured names.
        let statics = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &def.lexical_env,
        ))));

        let class = Rc::new(ClassObject {
            def: Rc::clone(&def),
            parent: parent_object,
            statics: Rc::clone(&statics),
        });

        self.registry.register(&decl.name, Rc::clone(&class))?;

        ctx.env
            .borrow_mut()
            .define(&decl.name.lexeme, Value::Class(Rc::clone(&class)));

        // Statics are seeded once, eagerly, in declaration order; each
        // initializer runs anchored at this level with no receiver, in the
        // static frame itself, so earlier statics and `myclass` are visible.
        let init_ctx = CallContext::in_static(Rc::clone(&def), Rc::clone(&statics));

        for (name, initializer) in &def.statics {
            let value = self.evaluate(initializer, &init_ctx)?;

            debug!("Seeded static '{}.{}' = {}", def.name, name, value);

            statics.borrow_mut().define(name, value);
        }

        Ok(class)
    }

    /// Allocate an instance of `class`: one field frame per level, root
    /// ancestor first, each seeded by running its initializers in a fresh
    /// frame over that level's lexical environment.  Uninitialized fields
    /// stay unbound until first `set`.  No `init` method is invoked here —
    /// construction is explicit in OBJ.
    pub fn instantiate(&mut self, class: &Rc<ClassObject>) -> Result<Rc<Instance>> {
        debug!("Instantiating class '{}'", class.def.name);

        let levels: Vec<Rc<ClassObject>> = class.levels();

        let mut chain: Vec<Rc<ClassDef>> = Vec::with_capacity(levels.len());
        let mut frames: Vec<RefCell<FieldFrame>> = Vec::with_capacity(levels.len());

        for level in &levels {
            let def = Rc::clone(&level.def);
            let mut frame = FieldFrame::new(&def.fields);

            for field in &def.fields {
                if let Some(initializer) = &field.init {
                    let env = Environment::nested(&def.lexical_env);
                    let init_ctx = CallContext::in_static(Rc::clone(&def), env);

                    let value = self.evaluate(initializer, &init_ctx)?;

                    frame.set(&field.name, value);
                }
            }

            chain.push(def);
            frames.push(RefCell::new(frame));
        }

        let instance = Rc::new(Instance::new(Rc::clone(class), chain, frames));

        info!("Instantiated {}", Value::Instance(Rc::clone(&instance)));

        Ok(instance)
    }
}

/// OBJ truthiness: `nil` and `0` are false, everything else is true.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Number(n) => *n != 0,
        _ => true,
    }
}
