//! Module `scanner` implements a one‑pass, streaming lexer for the OBJ
//! language.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of [`Token`]s,
//! skipping whitespace and `%` line comments, and emitting exactly one `EOF`
//! token at the end.  Designed as a `FusedIterator`, it can be chained safely
//! with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a [u8]) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token>` on each `.next()`, where `Ok(token)` is a scanned
//!   token and `Err` reports a lexing error with line information.
//!
//! # Token inventory
//!
//! - Punctuators: `( ) { } < > , ; . =` and the prim operators `+ - * /`.
//! - `!@` — the definition‑site lexical qualifier (a lone `!` is an error).
//! - Integer literals, double‑quoted strings, identifiers.
//! - Keywords resolved through a perfect‑hash `KEYWORDS` map: the class
//!   syntax (`class`, `extends`, `field`, `static`, `method`, `end`), the
//!   binders (`define`, `let`, `in`, `set`, `proc`), `new`, `if`/`then`/
//!   `else`, `nil`, and the dispatch keywords (`self`, `this`, `super`,
//!   `myclass`, `superclass`).
//!
//! # Performance notes
//!
//! - Bulk comment skipping via `memchr` for rapid new‑line search.
//! - `#[inline(always)]` on hot path helpers.

use crate::error::{ObjError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"class"      => TokenType::CLASS,
    b"extends"    => TokenType::EXTENDS,
    b"field"      => TokenType::FIELD,
    b"static"     => TokenType::STATIC,
    b"method"     => TokenType::METHOD,
    b"end"        => TokenType::END,
    b"define"     => TokenType::DEFINE,
    b"new"        => TokenType::NEW,
    b"proc"       => TokenType::PROC,
    b"let"        => TokenType::LET,
    b"in"         => TokenType::IN,
    b"set"        => TokenType::SET,
    b"if"         => TokenType::IF,
    b"then"       => TokenType::THEN,
    b"else"       => TokenType::ELSE,
    b"self"       => TokenType::SELF,
    b"this"       => TokenType::THIS,
    b"super"      => TokenType::SUPER,
    b"myclass"    => TokenType::MYCLASS,
    b"superclass" => TokenType::SUPERCLASS,
    b"nil"        => TokenType::NIL,
};

/// A single pass **scanner / lexer** that converts raw source bytes into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a [u8],              // entire source buffer
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  *Panics* if called at EOF – higher‑level
    /// code always guards with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past EOF
    /// to avoid branching at call‑site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    /// Returns `true` on success so callers can branch inline without an else.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces
    /// an actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b'<' => self.pending = Some(TokenType::LESS),
            b'>' => self.pending = Some(TokenType::GREATER),
            b',' => self.pending = Some(TokenType::COMMA),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'.' => self.pending = Some(TokenType::DOT),
            b'=' => self.pending = Some(TokenType::EQUAL),
            b'+' => self.pending = Some(TokenType::PLUS),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'*' => self.pending = Some(TokenType::STAR),
            b'/' => self.pending = Some(TokenType::SLASH),

            // ── '!@' lexical qualifier (lone '!' is invalid) ─────────────
            b'!' => {
                if self.match_byte(b'@') {
                    self.pending = Some(TokenType::BANG_AT);
                } else {
                    return Err(ObjError::lex(
                        self.line,
                        "Unexpected character: ! (expected !@)",
                    ));
                }
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(()); // skip insignificants
            }

            b'\n' => {
                self.line += 1; // track for diagnostics

                return Ok(());
            }

            // ── comments (% … until newline) ─────────────────────────────
            b'%' => {
                // Fast‑forward to next newline using `memchr`.  If none
                // found, skip to EOF.
                if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                    self.curr += pos;
                } else {
                    self.curr = self.len();
                }

                return Ok(());
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                return self.parse_string();
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                return self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                return Err(ObjError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        }

        Ok(())
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1; // multi‑line strings are permitted
            }
        }

        if self.is_at_end() {
            return Err(ObjError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let slice: &[u8] = &self.src[self.start + 1..self.curr - 1];
        let s: String = String::from_utf8(slice.to_vec())?;

        self.pending = Some(TokenType::STRING(s));

        Ok(())
    }

    /// Parse an integer literal.  OBJ numbers are 64‑bit signed integers;
    /// there is no fractional form.
    fn parse_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        // Digits are ASCII by construction.
        let s: &str = std::str::from_utf8(slice).expect("digits are valid UTF-8");

        let n: i64 = s
            .parse::<i64>()
            .map_err(|_| ObjError::lex(self.line, format!("Integer literal too large: {}", s)))?;

        self.pending = Some(TokenType::NUMBER(n));

        Ok(())
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let slice: &[u8] = &self.src[self.start..self.curr];
                let lex: String = String::from_utf8_lossy(slice).into_owned();
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
