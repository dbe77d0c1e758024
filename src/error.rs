//! Centralised error hierarchy for the **OBJ interpreter**.
//!
//! All subsystems (scanner, parser, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! Runtime failures mirror the language's resolution model: an exhausted
//! lookup (`UnboundIdentifier`), instance keywords used where no receiver
//! exists (`NoReceiverInStaticContext`), and the two class-registration
//! failures (`UnknownParent`, `DuplicateDefinition`).  All of them are fatal
//! to the enclosing evaluation — there is no recovery or retry.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ObjError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// A lookup (lexical, field, static, or method) exhausted its search
    /// path without finding the name.
    #[error("[line {line}] Unbound identifier '{name}' ({context})")]
    UnboundIdentifier {
        name: String,
        /// Which search path failed: "variable", "field", "static",
        /// "method", "static method", or "lexical".
        context: &'static str,
        line: usize,
    },

    /// `self`, `this`, or `super` resolved where no instance exists.
    #[error("[line {line}] '{keyword}' used in a static context with no receiver")]
    NoReceiverInStaticContext { keyword: &'static str, line: usize },

    /// `extends` named a class that has not been defined.
    #[error("[line {line}] Unknown parent class '{parent}' for class '{class}'")]
    UnknownParent {
        class: String,
        parent: String,
        line: usize,
    },

    /// A class name was registered twice.
    #[error("[line {line}] Class '{name}' is already defined")]
    DuplicateDefinition { name: String, line: usize },

    /// Any other runtime evaluation error (arity mismatch, calling a
    /// non‑proc, `new` applied to a non‑class, prim on non‑numbers, ...).
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ObjError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        ObjError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        ObjError::Parse { message, line }
    }

    /// Helper constructor for an exhausted lookup.
    pub fn unbound<S: Into<String>>(line: usize, name: S, context: &'static str) -> Self {
        let name: String = name.into();

        info!(
            "Creating UnboundIdentifier error: line={}, name={}, context={}",
            line, name, context
        );

        ObjError::UnboundIdentifier {
            name,
            context,
            line,
        }
    }

    /// Helper constructor for instance keywords in static context.
    pub fn no_receiver(line: usize, keyword: &'static str) -> Self {
        info!(
            "Creating NoReceiverInStaticContext error: line={}, keyword={}",
            line, keyword
        );

        ObjError::NoReceiverInStaticContext { keyword, line }
    }

    /// Helper constructor for general runtime misuse.
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        ObjError::Runtime(msg.into())
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, ObjError>;
