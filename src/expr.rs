use serde::Serialize;

use crate::token::Token;

/// The resolution mode attached to a qualified read, write, or call.
///
/// The five keyword modes plus `!@` come straight from the language; the
/// `Object` variant carries an arbitrary expression whose value (an instance
/// or a class) becomes the dispatch target, as in `.<p>init(3, 4)` or
/// `<Counter>count`.
#[derive(Debug, Clone, Serialize)]
pub enum Qualifier {
    /// `<self>` — dynamic receiver, search from its most‑derived class.
    SelfRef,

    /// `<this>` — search from the class level whose code is executing.
    This,

    /// `<super>` — search from the parent of the executing level.
    Super,

    /// `<myclass>` — statics of the executing level, exact level only.
    MyClass,

    /// `<superclass>` — statics of the parent level, exact level only.
    SuperClass,

    /// `<!@>` — the lexical environment captured at class definition.
    Lexical,

    /// `<expr>` — an explicit instance or class value.
    Object(Box<Expr>),
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    // Integer, string, and nil literals
    Literal(Token),

    // A bare identifier, resolved through the environment chain
    Variable(Token),

    // 'self' / 'this' in expression position: the current receiver
    Receiver(Token),

    // Prefix prim application: +(a, b), *(x, y), ...
    Prim(Token, Vec<Expr>),

    // if cond then e1 else e2
    If(Box<Expr>, Box<Expr>, Box<Expr>),

    // let x = e1 y = e2 in body
    Let(Vec<(Token, Expr)>, Box<Expr>),

    // proc(params) body
    Proc(Vec<Token>, Box<Expr>),

    // { e1 ; e2 ; ... } — value is the last expression's
    Seq(Vec<Expr>),

    // new <class-valued expression>
    New(Token, Box<Expr>),

    // <qualifier>name — qualified field/static/lexical read
    Get {
        qualifier: Qualifier,
        name: Token,
    },

    // set name = e  /  set <qualifier>name = e
    Set {
        qualifier: Option<Qualifier>,
        name: Token,
        value: Box<Expr>,
    },

    // .name(args)  /  .<qualifier>name(args)
    Call {
        qualifier: Option<Qualifier>,
        name: Token,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(token) => token.line,

            Expr::Variable(token) => token.line,

            Expr::Receiver(token) => token.line,

            Expr::Prim(token, _) => token.line,

            Expr::If(cond, _, _) => cond.line(),

            Expr::Let(_, body) => body.line(),

            Expr::Proc(_, body) => body.line(),

            Expr::Seq(exprs) => exprs.first().map_or(0, Expr::line),

            Expr::New(token, _) => token.line,

            Expr::Get { name, .. } => name.line,

            Expr::Set { name, .. } => name.line,

            Expr::Call { name, .. } => name.line,
        }
    }
}
