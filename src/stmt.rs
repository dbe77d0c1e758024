use serde::Serialize;

use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    // define name = expr
    Define(Token, Expr),

    // class Name [extends Parent] member* end
    Class(ClassDecl),

    // A top-level expression; the driver prints its value
    Expression(Expr),
}

/// Parsed form of a `class ... end` declaration.  Field order is preserved:
/// field and static initializers run in declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub name: Token,

    pub parent: Option<Token>,

    // field x  /  field x = expr
    pub fields: Vec<(Token, Option<Expr>)>,

    // static x = expr
    pub statics: Vec<(Token, Expr)>,

    // method name = proc(params) body
    pub methods: Vec<MethodDecl>,

    // static method name = proc(params) body
    pub static_methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: Token,

    pub params: Vec<Token>,

    pub body: Expr,
}
