use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the OBJ scanner.
///
/// Variants without data represent single‑character or keyword tokens.
/// `STRING(String)` and `NUMBER(i64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `BANG_AT` is the `!@` lexical‑scope qualifier.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '<' — opens a dispatch qualifier
    LESS,

    /// '>' — closes a dispatch qualifier
    GREATER,

    /// ','
    COMMA,

    /// ';'
    SEMICOLON,

    /// '.' — starts a call form
    DOT,

    /// '='
    EQUAL,

    /// '+' — prefix arithmetic prim
    PLUS,

    /// '-' — prefix arithmetic prim
    MINUS,

    /// '*' — prefix arithmetic prim
    STAR,

    /// '/' — prefix arithmetic prim
    SLASH,

    /// '!@' — definition‑site lexical qualifier
    BANG_AT,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// An integer literal
    #[serde(rename = "NUMBER")]
    NUMBER(i64),

    /// 'class'
    CLASS,

    /// 'extends'
    EXTENDS,

    /// 'field'
    FIELD,

    /// 'static'
    STATIC,

    /// 'method'
    METHOD,

    /// 'end'
    END,

    /// 'define'
    DEFINE,

    /// 'new'
    NEW,

    /// 'proc'
    PROC,

    /// 'let'
    LET,

    /// 'in'
    IN,

    /// 'set'
    SET,

    /// 'if'
    IF,

    /// 'then'
    THEN,

    /// 'else'
    ELSE,

    /// 'self'
    SELF,

    /// 'this'
    THIS,

    /// 'super'
    SUPER,

    /// 'myclass'
    MYCLASS,

    /// 'superclass'
    SUPERCLASS,

    /// 'nil'
    NIL,

    /// End‑of‑file marker
    EOF,
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact source text that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ── 1. decide literal string (may borrow or inline‑format) ──────────
        let literal: String = match &self.token_type {
            TokenType::STRING(s) => s.clone(),
            TokenType::NUMBER(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                buf.format(*n).to_string()
            }
            _ => "null".to_string(),
        };

        // ── 2. variant name without payloads ───────────────────────────────
        let variant: &'static str = match self.token_type {
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LESS => "LESS",
            TokenType::GREATER => "GREATER",
            TokenType::COMMA => "COMMA",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::DOT => "DOT",
            TokenType::EQUAL => "EQUAL",
            TokenType::PLUS => "PLUS",
            TokenType::MINUS => "MINUS",
            TokenType::STAR => "STAR",
            TokenType::SLASH => "SLASH",
            TokenType::BANG_AT => "BANG_AT",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::CLASS => "CLASS",
            TokenType::EXTENDS => "EXTENDS",
            TokenType::FIELD => "FIELD",
            TokenType::STATIC => "STATIC",
            TokenType::METHOD => "METHOD",
            TokenType::END => "END",
            TokenType::DEFINE => "DEFINE",
            TokenType::NEW => "NEW",
            TokenType::PROC => "PROC",
            TokenType::LET => "LET",
            TokenType::IN => "IN",
            TokenType::SET => "SET",
            TokenType::IF => "IF",
            TokenType::THEN => "THEN",
            TokenType::ELSE => "ELSE",
            TokenType::SELF => "SELF",
            TokenType::THIS => "THIS",
            TokenType::SUPER => "SUPER",
            TokenType::MYCLASS => "MYCLASS",
            TokenType::SUPERCLASS => "SUPERCLASS",
            TokenType::NIL => "NIL",
            TokenType::EOF => "EOF",
        };

        write!(f, "{} {} {}", variant, self.lexeme, literal)
    }
}
