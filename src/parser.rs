//! Recursive‑descent parser for the OBJ language.
//!
//! OBJ expressions are fully prefix (prim operators are written `+(a, b)`),
//! so every expression is self‑delimiting and the grammar needs no infix
//! precedence climbing: top‑level statements and `let` bindings are plain
//! juxtaposition, and `;` appears only inside `{ … }` sequences.
//!
//! ```text
//! program     → stmt* EOF
//! stmt        → "define" IDENT "=" expr
//!             | "class" IDENT ("extends" IDENT)? member* "end"
//!             | expr
//! member      → "field" IDENT ("=" expr)?
//!             | "static" IDENT "=" expr
//!             | "method" IDENT "=" procLit
//!             | "static" "method" IDENT "=" procLit
//! procLit     → "proc" "(" (IDENT ("," IDENT)*)? ")" expr
//! expr        → NUMBER | STRING | "nil" | IDENT | "self" | "this"
//!             | ("+" | "-" | "*" | "/") "(" expr ("," expr)* ")"
//!             | "if" expr "then" expr "else" expr
//!             | "let" (IDENT "=" expr)+ "in" expr
//!             | procLit
//!             | "{" expr (";" expr)* "}"
//!             | "new" expr
//!             | "<" qualifier ">" IDENT
//!             | "set" ("<" qualifier ">")? IDENT "=" expr
//!             | "." ("<" qualifier ">")? IDENT "(" (expr ("," expr)*)? ")"
//! qualifier   → "self" | "this" | "super" | "myclass" | "superclass"
//!             | "!@" | expr
//! ```
//!
//! The parser is an `Iterator<Item = Result<Stmt>>` so the driver can stream
//! statements; [`Parser::parse_expression`] parses a single expression for
//! the `evaluate` subcommand.  On a syntax error the parser synchronizes to
//! the next plausible statement boundary (`define` / `class`) so that later
//! errors are still reported.

use log::{debug, info};

use crate::error::{ObjError, Result};
use crate::expr::{Expr, Qualifier};
use crate::stmt::{ClassDecl, MethodDecl, Stmt};
use crate::token::{Token, TokenType};

/// Maximum number of parameters or call arguments, as a sanity bound.
const MAX_ARITY: usize = 255;

/// Top‑level parser over an owned vector of tokens.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Construct a new parser over a pre‑scanned token stream.
    pub fn new(tokens: Vec<Token>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    /// Scan `src` and construct a parser in one step, failing on the first
    /// lexical error.
    pub fn from_source(src: &[u8]) -> Result<Self> {
        let tokens: Vec<Token> = crate::scanner::Scanner::new(src).collect::<Result<Vec<_>>>()?;

        Ok(Self::new(tokens))
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    /// Parse a single expression (the `evaluate` subcommand's entry point).
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let expr: Expr = self.expression()?;

        if !self.is_at_end() {
            return Err(ObjError::parse(
                self.peek().line,
                "Unexpected input after expression",
            ));
        }

        Ok(expr)
    }

    // ──────────────────────── statement rules ─────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement");

        let result = if self.matches(&TokenType::DEFINE) {
            self.define_statement()
        } else if self.matches(&TokenType::CLASS) {
            self.class_declaration()
        } else {
            Ok(Stmt::Expression(self.expression()?))
        };

        if result.is_err() {
            self.synchronize();
        }

        result
    }

    /// `define IDENT = expr`
    fn define_statement(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(&TokenType::IDENTIFIER, "Expected name after 'define'")?
            .clone();

        self.consume(&TokenType::EQUAL, "Expected '=' after define name")?;

        let value: Expr = self.expression()?;

        debug!("Parsed define for '{}'", name.lexeme);

        Ok(Stmt::Define(name, value))
    }

    /// `class IDENT (extends IDENT)? member* end`
    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(&TokenType::IDENTIFIER, "Expected class name")?
            .clone();

        let parent: Option<Token> = if self.matches(&TokenType::EXTENDS) {
            Some(
                self.consume(&TokenType::IDENTIFIER, "Expected parent class name")?
                    .clone(),
            )
        } else {
            None
        };

        let mut decl = ClassDecl {
            name,
            parent,
            fields: Vec::new(),
            statics: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
        };

        while !self.check(&TokenType::END) && !self.is_at_end() {
            self.class_member(&mut decl)?;
        }

        self.consume(&TokenType::END, "Expected 'end' after class body")?;

        info!(
            "Parsed class '{}' ({} fields, {} statics, {} methods, {} static methods)",
            decl.name.lexeme,
            decl.fields.len(),
            decl.statics.len(),
            decl.methods.len(),
            decl.static_methods.len()
        );

        Ok(Stmt::Class(decl))
    }

    fn class_member(&mut self, decl: &mut ClassDecl) -> Result<()> {
        if self.matches(&TokenType::FIELD) {
            let name: Token = self
                .consume(&TokenType::IDENTIFIER, "Expected field name")?
                .clone();

            let init: Option<Expr> = if self.matches(&TokenType::EQUAL) {
                Some(self.expression()?)
            } else {
                None
            };

            decl.fields.push((name, init));

            return Ok(());
        }

        if self.matches(&TokenType::STATIC) {
            if self.matches(&TokenType::METHOD) {
                let method: MethodDecl = self.method_declaration()?;
                decl.static_methods.push(method);
            } else {
                let name: Token = self
                    .consume(&TokenType::IDENTIFIER, "Expected static field name")?
                    .clone();

                self.consume(&TokenType::EQUAL, "Expected '=' after static field name")?;

                let init: Expr = self.expression()?;

                decl.statics.push((name, init));
            }

            return Ok(());
        }

        if self.matches(&TokenType::METHOD) {
            let method: MethodDecl = self.method_declaration()?;
            decl.methods.push(method);

            return Ok(());
        }

        Err(ObjError::parse(
            self.peek().line,
            "Expected 'field', 'static', 'method', or 'end' in class body",
        ))
    }

    /// `IDENT = proc ( params? ) expr`
    fn method_declaration(&mut self) -> Result<MethodDecl> {
        let name: Token = self
            .consume(&TokenType::IDENTIFIER, "Expected method name")?
            .clone();

        self.consume(&TokenType::EQUAL, "Expected '=' after method name")?;

        self.consume(&TokenType::PROC, "Expected 'proc' in method definition")?;

        let (params, body) = self.proc_tail()?;

        Ok(MethodDecl { name, params, body })
    }

    // ──────────────────────── expression rules ────────────────────

    fn expression(&mut self) -> Result<Expr> {
        debug!("Entering expression at token {:?}", self.peek().token_type);

        match self.peek().token_type {
            TokenType::NUMBER(_) | TokenType::STRING(_) | TokenType::NIL => {
                let token: Token = self.advance().clone();

                Ok(Expr::Literal(token))
            }

            TokenType::IDENTIFIER => {
                let token: Token = self.advance().clone();

                Ok(Expr::Variable(token))
            }

            TokenType::SELF | TokenType::THIS => {
                let token: Token = self.advance().clone();

                Ok(Expr::Receiver(token))
            }

            TokenType::PLUS | TokenType::MINUS | TokenType::STAR | TokenType::SLASH => {
                let op: Token = self.advance().clone();

                self.consume(&TokenType::LEFT_PAREN, "Expected '(' after prim operator")?;

                let args: Vec<Expr> = self.arguments()?;

                Ok(Expr::Prim(op, args))
            }

            TokenType::IF => {
                self.advance();

                let cond: Expr = self.expression()?;

                self.consume(&TokenType::THEN, "Expected 'then' after if condition")?;

                let then_branch: Expr = self.expression()?;

                self.consume(&TokenType::ELSE, "Expected 'else' after then branch")?;

                let else_branch: Expr = self.expression()?;

                Ok(Expr::If(
                    Box::new(cond),
                    Box::new(then_branch),
                    Box::new(else_branch),
                ))
            }

            TokenType::LET => {
                self.advance();

                let mut bindings: Vec<(Token, Expr)> = Vec::new();

                while self.check(&TokenType::IDENTIFIER) {
                    let name: Token = self.advance().clone();

                    self.consume(&TokenType::EQUAL, "Expected '=' after let binding name")?;

                    let value: Expr = self.expression()?;

                    bindings.push((name, value));
                }

                if bindings.is_empty() {
                    return Err(ObjError::parse(
                        self.peek().line,
                        "Expected at least one binding after 'let'",
                    ));
                }

                self.consume(&TokenType::IN, "Expected 'in' after let bindings")?;

                let body: Expr = self.expression()?;

                Ok(Expr::Let(bindings, Box::new(body)))
            }

            TokenType::PROC => {
                self.advance();

                let (params, body) = self.proc_tail()?;

                Ok(Expr::Proc(params, Box::new(body)))
            }

            TokenType::LEFT_BRACE => {
                self.advance();

                let mut exprs: Vec<Expr> = vec![self.expression()?];

                while self.matches(&TokenType::SEMICOLON) {
                    exprs.push(self.expression()?);
                }

                self.consume(&TokenType::RIGHT_BRACE, "Expected '}' after sequence")?;

                Ok(Expr::Seq(exprs))
            }

            TokenType::NEW => {
                let keyword: Token = self.advance().clone();

                let class_expr: Expr = self.expression()?;

                Ok(Expr::New(keyword, Box::new(class_expr)))
            }

            TokenType::LESS => {
                self.advance();

                let qualifier: Qualifier = self.qualifier()?;

                self.consume(&TokenType::GREATER, "Expected '>' after qualifier")?;

                let name: Token = self
                    .consume(&TokenType::IDENTIFIER, "Expected name after qualifier")?
                    .clone();

                Ok(Expr::Get { qualifier, name })
            }

            TokenType::SET => {
                self.advance();

                let qualifier: Option<Qualifier> = if self.matches(&TokenType::LESS) {
                    let q: Qualifier = self.qualifier()?;

                    self.consume(&TokenType::GREATER, "Expected '>' after qualifier")?;

                    Some(q)
                } else {
                    None
                };

                let name: Token = self
                    .consume(&TokenType::IDENTIFIER, "Expected name after 'set'")?
                    .clone();

                self.consume(&TokenType::EQUAL, "Expected '=' in set expression")?;

                let value: Expr = self.expression()?;

                Ok(Expr::Set {
                    qualifier,
                    name,
                    value: Box::new(value),
                })
            }

            TokenType::DOT => {
                self.advance();

                let qualifier: Option<Qualifier> = if self.matches(&TokenType::LESS) {
                    let q: Qualifier = self.qualifier()?;

                    self.consume(&TokenType::GREATER, "Expected '>' after qualifier")?;

                    Some(q)
                } else {
                    None
                };

                let name: Token = self
                    .consume(&TokenType::IDENTIFIER, "Expected name in call")?
                    .clone();

                self.consume(&TokenType::LEFT_PAREN, "Expected '(' after call name")?;

                let args: Vec<Expr> = self.arguments()?;

                Ok(Expr::Call {
                    qualifier,
                    name,
                    args,
                })
            }

            _ => Err(ObjError::parse(
                self.peek().line,
                format!("Expected expression, found '{}'", self.peek().lexeme),
            )),
        }
    }

    /// Parse a dispatch qualifier, with the opening `<` already consumed.
    /// The five keyword modes and `!@` take precedence; anything else is an
    /// arbitrary expression naming an explicit object or class.
    fn qualifier(&mut self) -> Result<Qualifier> {
        let q: Qualifier = match self.peek().token_type {
            TokenType::SELF => {
                self.advance();
                Qualifier::SelfRef
            }

            TokenType::THIS => {
                self.advance();
                Qualifier::This
            }

            TokenType::SUPER => {
                self.advance();
                Qualifier::Super
            }

            TokenType::MYCLASS => {
                self.advance();
                Qualifier::MyClass
            }

            TokenType::SUPERCLASS => {
                self.advance();
                Qualifier::SuperClass
            }

            TokenType::BANG_AT => {
                self.advance();
                Qualifier::Lexical
            }

            _ => Qualifier::Object(Box::new(self.expression()?)),
        };

        debug!("Parsed qualifier {:?}", q);

        Ok(q)
    }

    /// Parse `( params? ) expr` after a consumed `proc` keyword.
    fn proc_tail(&mut self) -> Result<(Vec<Token>, Expr)> {
        self.consume(&TokenType::LEFT_PAREN, "Expected '(' after 'proc'")?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(ObjError::parse(
                        self.peek().line,
                        "Cannot have more than 255 parameters",
                    ));
                }

                params.push(
                    self.consume(&TokenType::IDENTIFIER, "Expected parameter name")?
                        .clone(),
                );

                if !self.matches(&TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;

        let body: Expr = self.expression()?;

        Ok((params, body))
    }

    /// Parse `expr ("," expr)* ")"` with the opening `(` already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args: Vec<Expr> = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if args.len() >= MAX_ARITY {
                    return Err(ObjError::parse(
                        self.peek().line,
                        "Cannot have more than 255 arguments",
                    ));
                }

                args.push(self.expression()?);

                if !self.matches(&TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(args)
    }

    // ───────────────────────── token helpers ──────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: &TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: &TokenType, message: &str) -> Result<&Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(ObjError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == *ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            match self.peek().token_type {
                TokenType::DEFINE | TokenType::CLASS => return,

                _ => {
                    self.advance();
                }
            }
        }
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl Iterator for Parser {
    type Item = Result<Stmt>;

    /// Yields one top‑level statement per call, `None` at EOF.  After a
    /// syntax error the parser has already synchronized, so iteration can
    /// continue and surface later errors too.
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_at_end() {
            return None;
        }

        Some(self.statement())
    }
}
