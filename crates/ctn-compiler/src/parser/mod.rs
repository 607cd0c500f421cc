//! ctn source parser.
//!
//! Transforms raw source text into a [`ScopeNode`] through lexing and a
//! family of recursive-descent grammar parsers, one per construct. A
//! parent parser hands a bracketed sub-slice to a child parser through
//! [`TokenCursor::take_scoped`] and [`TokenCursor::delegate`], then
//! continues after the closing bracket.

pub mod action;
pub mod ast;
pub mod definition;
pub mod lexer;
pub mod literal;
pub mod scope;

use ctn_common::config::CtnConfig;
use ctn_common::error::{CtnError, Result};

use self::ast::ScopeNode;
use self::lexer::{Lexer, Token, TokenKind};

/// Cursor into a token slice for recursive-descent parsing.
#[derive(Debug, Clone)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    last_line: usize,
}

impl<'t> TokenCursor<'t> {
    /// Creates a cursor at the start of `tokens`.
    #[must_use]
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            last_line: tokens.last().map_or(1, Token::line),
        }
    }

    /// Runs `parse` over `tokens` and requires it to consume all of them.
    ///
    /// # Errors
    ///
    /// Returns the child parser's error, or a syntax error on the first
    /// token it left unconsumed.
    pub fn delegate<T>(
        tokens: &'t [Token],
        parse: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let mut child = Self::new(tokens);
        let node = parse(&mut child)?;
        if child.at_end() {
            Ok(node)
        } else {
            Err(child.unexpected("end of the enclosed list"))
        }
    }

    /// The current token.
    #[must_use]
    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    /// Kind of the current token.
    #[must_use]
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(Token::kind)
    }

    /// Kind of the token `n` positions ahead of the current one.
    #[must_use]
    pub fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(Token::kind)
    }

    /// Whether the current token is of `kind`.
    #[must_use]
    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Consumes and returns the current token.
    pub fn advance(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Number of tokens consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.pos
    }

    /// Whether every token has been consumed.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consumes the current token if it is of `kind`.
    pub fn skip(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes any line breaks at the cursor.
    pub fn skip_line_breaks(&mut self) {
        while self.skip(TokenKind::LineBreak) {}
    }

    /// Consumes a token of `kind` or fails.
    ///
    /// # Errors
    ///
    /// Returns a syntax error naming `expected` if the current token is of
    /// another kind or the input is exhausted.
    pub fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'t Token> {
        if self.at(kind) {
            self.advance().ok_or_else(|| self.unexpected(expected))
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Consumes a bare word, keywords included, or fails.
    ///
    /// # Errors
    ///
    /// Returns a syntax error naming `expected` if the current token is not
    /// a word.
    pub fn expect_word(&mut self, expected: &str) -> Result<&'t Token> {
        match self.peek() {
            Some(token) if token.kind().is_word() => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Requires a statement to end here: a line break or the end of input.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if anything else follows.
    pub fn expect_end_of_statement(&mut self) -> Result<()> {
        if self.at_end() || self.skip(TokenKind::LineBreak) {
            Ok(())
        } else {
            Err(self.unexpected("end of line"))
        }
    }

    /// Consumes a bracketed group and returns the tokens between the
    /// brackets, leaving the cursor after the closing bracket.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the current token is not `open` or the
    /// group is never closed.
    pub fn take_scoped(&mut self, open: TokenKind, close: TokenKind) -> Result<&'t [Token]> {
        let opening = self.expect(open, &open.to_string())?;
        let tokens = self.tokens;
        let start = self.pos;
        let mut depth = 1_usize;
        for (offset, token) in tokens[start..].iter().enumerate() {
            if token.kind() == open {
                depth += 1;
            } else if token.kind() == close {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset;
                    self.pos = end + 1;
                    return Ok(&tokens[start..end]);
                }
            }
        }
        Err(CtnError::Syntax {
            token: "end of input".into(),
            line: opening.line(),
            message: format!("{open} is never closed by {close}"),
        })
    }

    /// Consumes the rest of the current line, leaving the line break.
    ///
    /// Line breaks nested inside brackets do not end the line.
    pub fn take_line(&mut self) -> &'t [Token] {
        let tokens = self.tokens;
        let start = self.pos;
        let mut depth = 0_usize;
        while let Some(token) = tokens.get(self.pos) {
            match token.kind() {
                TokenKind::LineBreak if depth == 0 => break,
                TokenKind::BraceOpen | TokenKind::ScopeOpen => depth += 1,
                TokenKind::BraceClose | TokenKind::ScopeClose => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }
        &tokens[start..self.pos]
    }

    /// Syntax error for the current token.
    #[must_use]
    pub fn unexpected(&self, expected: &str) -> CtnError {
        match self.peek() {
            Some(token) => CtnError::Syntax {
                token: format!("{} \"{}\"", token.kind(), token.text()),
                line: token.line(),
                message: format!("expected {expected}"),
            },
            None => CtnError::Syntax {
                token: "end of input".into(),
                line: self.last_line,
                message: format!("expected {expected}"),
            },
        }
    }
}

/// Drops whitespace and comments, collapses runs of line breaks and trims
/// line breaks from both ends.
#[must_use]
pub fn significant(tokens: &[Token]) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens.iter().filter(|t| !t.kind().is_insignificant()) {
        let is_break = token.kind() == TokenKind::LineBreak;
        let last_is_break = result
            .last()
            .is_none_or(|t| t.kind() == TokenKind::LineBreak);
        if !(is_break && last_is_break) {
            result.push(token.clone());
        }
    }
    if result.last().is_some_and(|t| t.kind() == TokenKind::LineBreak) {
        let _ = result.pop();
    }
    result
}

/// Parses an already lexed token list.
///
/// # Errors
///
/// Returns a syntax error on the first token the grammar does not allow.
pub fn parse(tokens: &[Token]) -> Result<ScopeNode> {
    let tokens = significant(tokens);
    let mut cursor = TokenCursor::new(&tokens);
    let scope = scope::parse_scope(&mut cursor)?;
    tracing::debug!(statements = scope.statements.len(), "parsed ctn scope");
    Ok(scope)
}

/// Lexes and parses ctn source text.
///
/// # Errors
///
/// Returns a lexical or syntax error on the first problem found.
pub fn parse_source(source: &str, config: &CtnConfig) -> Result<ScopeNode> {
    let tokens = Lexer::new(config.boolean_literals).tokenize(source)?;
    parse(&tokens)
}
