//! Tokenization of ctn source text using `nom`.
//!
//! Produces the full list of [`Token`]s up front since the grammar parsers
//! need arbitrary lookahead. Whitespace, comments and line breaks are kept
//! as tokens; the parser strips the insignificant ones before running.

use ctn_common::config::BooleanLiterals;
use ctn_common::error::{CtnError, Result};
use ctn_common::types::Value;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, not_line_ending, one_of, satisfy},
    combinator::{opt, recognize, value},
    sequence::pair,
};

/// Token categories of the ctn language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Single- or double-quoted string literal.
    String,
    /// Integer, decimal or exponent literal, optionally signed.
    Number,
    /// `yes` (or `true`).
    BoolTrue,
    /// `no` (or `false`).
    BoolFalse,
    /// `null`.
    Null,
    /// `@name` service reference.
    Dependency,
    /// `:name` parameter reference.
    Parameter,
    /// Class names, method names and bare keys.
    Identifier,
    /// `import` or `use`.
    Import,
    /// `override`.
    Override,
    /// `:` between a name and its value.
    Assign,
    /// `,`
    Separator,
    /// `(`
    BraceOpen,
    /// `)`
    BraceClose,
    /// `{`
    ScopeOpen,
    /// `}`
    ScopeClose,
    /// `-` introducing a construction action.
    Minus,
    /// `=` introducing a metadata assignment.
    Equal,
    /// End of a source line.
    LineBreak,
    /// A run of spaces or tabs.
    Whitespace,
    /// `// ...` or `# ...` up to the end of the line.
    Comment,
}

impl TokenKind {
    /// Whether a `:` written directly after a token of this kind is an
    /// assignment rather than the start of a parameter reference.
    const fn binds_colon(self) -> bool {
        self.is_word()
            || matches!(
                self,
                Self::String | Self::Number | Self::Dependency | Self::Parameter
            )
    }

    /// Whether the token was lexed from a bare word: an identifier, a
    /// keyword or a word literal.
    #[must_use]
    pub const fn is_word(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::Import
                | Self::Override
                | Self::Null
                | Self::BoolTrue
                | Self::BoolFalse
        )
    }

    /// Whether the token carries no grammatical meaning.
    #[must_use]
    pub const fn is_insignificant(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string literal",
            Self::Number => "number",
            Self::BoolTrue | Self::BoolFalse => "boolean",
            Self::Null => "null",
            Self::Dependency => "service reference",
            Self::Parameter => "parameter reference",
            Self::Identifier => "identifier",
            Self::Import => "import keyword",
            Self::Override => "override keyword",
            Self::Assign => "':'",
            Self::Separator => "','",
            Self::BraceOpen => "'('",
            Self::BraceClose => "')'",
            Self::ScopeOpen => "'{'",
            Self::ScopeClose => "'}'",
            Self::Minus => "'-'",
            Self::Equal => "'='",
            Self::LineBreak => "line break",
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// A lexed token: its kind, the exact source text and its one-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    line: usize,
}

impl Token {
    /// Creates a token.
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    /// The token kind.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The literal source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// One-based source line.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Whether the token is a scalar literal.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::String
                | TokenKind::Number
                | TokenKind::BoolTrue
                | TokenKind::BoolFalse
                | TokenKind::Null
        )
    }

    /// Decodes the literal carried by a value token.
    ///
    /// # Errors
    ///
    /// Returns a logic error if the token is not a value token.
    pub fn value(&self) -> Result<Value> {
        match self.kind {
            TokenKind::String => Ok(Value::String(unescape(&self.text))),
            TokenKind::Number => decode_number(&self.text).ok_or_else(|| {
                CtnError::logic(format!(
                    "malformed number {} on line {}",
                    self.text, self.line
                ))
            }),
            TokenKind::BoolTrue => Ok(Value::Bool(true)),
            TokenKind::BoolFalse => Ok(Value::Bool(false)),
            TokenKind::Null => Ok(Value::Null),
            other => Err(CtnError::logic(format!(
                "{other} on line {} is not a value",
                self.line
            ))),
        }
    }

    /// Name carried by the token, without any sigil.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.kind {
            TokenKind::Dependency | TokenKind::Parameter => self.text.get(1..).unwrap_or_default(),
            _ => &self.text,
        }
    }
}

/// Strips the surrounding quotes and decodes backslash escapes.
fn unescape(text: &str) -> String {
    let mut chars = text.chars();
    let _ = chars.next();
    let _ = chars.next_back();
    let mut result = String::with_capacity(text.len());
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(c @ ('\\' | '"' | '\'')) => result.push(c),
            Some(c) => {
                result.push('\\');
                result.push(c);
            }
            None => result.push('\\'),
        }
    }
    result
}

fn decode_number(text: &str) -> Option<Value> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Value::Int(n));
        }
    }
    text.parse::<f64>().ok().map(Value::Float)
}

const fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-')
}

const fn is_ident_start(c: char) -> bool {
    is_name_start(c) || c == '\\'
}

const fn is_ident_continue(c: char) -> bool {
    is_name_continue(c) || c == '\\'
}

fn spacing(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_whitespace() && c != '\n')(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(alt((tag("//"), tag("#"))), not_line_ending)).parse(input)
}

/// Recognizes a quoted string, leaving escapes undecoded.
fn quoted(input: &str) -> IResult<&str, &str> {
    let quote = match input.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Char,
            )));
        }
    };
    let mut chars = input.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            let _ = chars.next();
        } else if c == quote {
            let end = idx + c.len_utf8();
            return Ok((&input[end..], &input[..end]));
        }
    }
    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// Recognizes a sigil followed by a greedily captured name.
fn sigiled(input: &str, sigil: char) -> IResult<&str, &str> {
    recognize((char(sigil), satisfy(is_name_start), take_while(is_name_continue))).parse(input)
}

fn colon(input: &str, assign_follows: bool) -> IResult<&str, TokenKind> {
    if !assign_follows {
        if let Ok((rest, _)) = sigiled(input, ':') {
            return Ok((rest, TokenKind::Parameter));
        }
    }
    value(TokenKind::Assign, char(':')).parse(input)
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::BraceOpen, char('(')),
        value(TokenKind::BraceClose, char(')')),
        value(TokenKind::ScopeOpen, char('{')),
        value(TokenKind::ScopeClose, char('}')),
        value(TokenKind::Separator, char(',')),
        value(TokenKind::Minus, char('-')),
        value(TokenKind::Equal, char('=')),
    ))
    .parse(input)
}

/// Identifiers, keywords and the word literals.
fn word(input: &str, booleans: BooleanLiterals) -> IResult<&str, TokenKind> {
    let (rest, text) =
        recognize(pair(satisfy(is_ident_start), take_while(is_ident_continue))).parse(input)?;
    let kind = match text {
        "import" | "use" => TokenKind::Import,
        "override" => TokenKind::Override,
        "null" => TokenKind::Null,
        other => match booleans.decode(other) {
            Some(true) => TokenKind::BoolTrue,
            Some(false) => TokenKind::BoolFalse,
            None => TokenKind::Identifier,
        },
    };
    Ok((rest, kind))
}

/// Tokenizer configured with the accepted boolean spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer {
    booleans: BooleanLiterals,
}

impl Lexer {
    /// Creates a lexer accepting the given boolean literals.
    #[must_use]
    pub const fn new(booleans: BooleanLiterals) -> Self {
        Self { booleans }
    }

    /// Tokenizes a ctn source string.
    ///
    /// Leading and trailing whitespace is trimmed, runs of line breaks
    /// collapse into one token and indentation after a line break is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns a lexical error naming the first character no pattern
    /// matches, together with its line.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>> {
        let trimmed = input.trim_start();
        let mut line = 1 + input[..input.len() - trimmed.len()].matches('\n').count();
        let mut remaining = trimmed.trim_end();
        let mut tokens: Vec<Token> = Vec::new();

        while !remaining.is_empty() {
            let (rest, kind) = self
                .single_token(remaining, tokens.last())
                .map_err(|_| CtnError::Lexical {
                    character: remaining.chars().next().unwrap_or_default(),
                    line,
                })?;
            let text = &remaining[..remaining.len() - rest.len()];
            remaining = rest;

            let previous = tokens.last().map(Token::kind);
            match kind {
                TokenKind::LineBreak => {
                    if previous != Some(TokenKind::LineBreak) {
                        tokens.push(Token::new(kind, text, line));
                    }
                    line += 1;
                }
                TokenKind::Whitespace if previous == Some(TokenKind::LineBreak) => {}
                TokenKind::String => {
                    tokens.push(Token::new(kind, text, line));
                    // a string may span lines; it keeps the line it starts on
                    line += text.matches('\n').count();
                }
                _ => tokens.push(Token::new(kind, text, line)),
            }
        }

        tracing::debug!(tokens = tokens.len(), "tokenized ctn source");
        Ok(tokens)
    }

    fn single_token<'a>(
        &self,
        input: &'a str,
        previous: Option<&Token>,
    ) -> IResult<&'a str, TokenKind> {
        let assign_follows = previous.is_some_and(|t| t.kind.binds_colon());
        let booleans = self.booleans;
        alt((
            value(TokenKind::LineBreak, char('\n')),
            value(TokenKind::Whitespace, spacing),
            value(TokenKind::Comment, line_comment),
            value(TokenKind::String, quoted),
            value(TokenKind::Number, number),
            value(TokenKind::Dependency, |i: &'a str| sigiled(i, '@')),
            |i: &'a str| colon(i, assign_follows),
            punctuation,
            |i: &'a str| word(i, booleans),
        ))
        .parse(input)
    }
}

/// Tokenizes with the default boolean spellings.
///
/// # Errors
///
/// Returns a lexical error if the input contains a character that cannot
/// be tokenized.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::default().tokenize(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("should tokenize")
            .iter()
            .map(Token::kind)
            .filter(|k| !k.is_insignificant())
            .collect()
    }

    #[test]
    fn tokenize_parameter_definition() {
        let tokens = tokenize(":name: \"Edgar Wasser\"").expect("should tokenize");
        assert_eq!(tokens[0].kind(), TokenKind::Parameter);
        assert_eq!(tokens[0].name(), "name");
        assert_eq!(tokens[1].kind(), TokenKind::Assign);
        assert_eq!(tokens[3].kind(), TokenKind::String);
        assert_eq!(
            tokens[3].value().expect("value"),
            Value::from("Edgar Wasser")
        );
    }

    #[test]
    fn tokenize_service_definition() {
        assert_eq!(
            kinds("@logger: Acme\\Log(@log.handler, :path)"),
            vec![
                TokenKind::Dependency,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::BraceOpen,
                TokenKind::Dependency,
                TokenKind::Separator,
                TokenKind::Parameter,
                TokenKind::BraceClose,
            ]
        );
    }

    #[test]
    fn sigil_names_capture_dots_slashes_and_dashes() {
        let tokens = tokenize("@app.log/main-handler").expect("should tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name(), "app.log/main-handler");
    }

    #[test]
    fn adjacent_colon_is_an_assignment() {
        assert_eq!(
            kinds("{a:b}"),
            vec![
                TokenKind::ScopeOpen,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Identifier,
                TokenKind::ScopeClose,
            ]
        );
        assert_eq!(
            kinds("{a: :b}"),
            vec![
                TokenKind::ScopeOpen,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Parameter,
                TokenKind::ScopeClose,
            ]
        );
    }

    #[test]
    fn line_breaks_collapse() {
        let tokens = tokenize("a\n\n   \n  b").expect("should tokenize");
        let kinds: Vec<TokenKind> = tokens.iter().map(Token::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::LineBreak,
                TokenKind::Identifier
            ]
        );
        assert_eq!(tokens[2].line(), 4);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_but_lines_are_counted() {
        let tokens = tokenize("\n\n  x  \n").expect("should tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].line(), 3);
    }

    #[test]
    fn both_comment_styles() {
        let tokens = tokenize("// one\n# two\nx").expect("should tokenize");
        let comments = tokens
            .iter()
            .filter(|t| t.kind() == TokenKind::Comment)
            .count();
        assert_eq!(comments, 2);
    }

    #[test]
    fn numbers_signed_decimal_and_exponent() {
        let tokens = tokenize("42 -7 3.5 1e3 -2.5E-2").expect("should tokenize");
        let values: Vec<Value> = tokens
            .iter()
            .filter(|t| t.is_value())
            .map(|t| t.value().expect("value"))
            .collect();
        assert_eq!(
            values,
            vec![
                Value::Int(42),
                Value::Int(-7),
                Value::Float(3.5),
                Value::Float(1000.0),
                Value::Float(-0.025),
            ]
        );
    }

    #[test]
    fn minus_before_a_name_is_an_action_marker() {
        assert_eq!(
            kinds("- setLevel"),
            vec![TokenKind::Minus, TokenKind::Identifier]
        );
    }

    #[test]
    fn keywords_and_word_literals() {
        assert_eq!(
            kinds("import use override null yes no true false"),
            vec![
                TokenKind::Import,
                TokenKind::Import,
                TokenKind::Override,
                TokenKind::Null,
                TokenKind::BoolTrue,
                TokenKind::BoolFalse,
                TokenKind::BoolTrue,
                TokenKind::BoolFalse,
            ]
        );
    }

    #[test]
    fn boolean_spelling_is_configurable() {
        let tokens = Lexer::new(BooleanLiterals::TrueFalse)
            .tokenize("yes true")
            .expect("should tokenize");
        assert_eq!(tokens[0].kind(), TokenKind::Identifier);
        assert_eq!(tokens[2].kind(), TokenKind::BoolTrue);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = tokenize(r#"'it\'s' "a\tb\\c" "\d""#).expect("should tokenize");
        let values: Vec<Value> = tokens
            .iter()
            .filter(|t| t.is_value())
            .map(|t| t.value().expect("value"))
            .collect();
        assert_eq!(
            values,
            vec![
                Value::from("it's"),
                Value::from("a\tb\\c"),
                Value::from("\\d")
            ]
        );
    }

    #[test]
    fn value_of_identifier_is_a_logic_error() {
        let tokens = tokenize("Acme").expect("should tokenize");
        let err = tokens[0].value().unwrap_err();
        assert!(matches!(err, CtnError::Logic { .. }));
    }

    #[test]
    fn unknown_character_reports_line() {
        let err = tokenize("a\nb\n  %").unwrap_err();
        assert!(matches!(
            err,
            CtnError::Lexical {
                character: '%',
                line: 3
            }
        ));
    }

    #[test]
    fn multi_line_string_advances_the_line_count() {
        let tokens = tokenize(":a: \"x\ny\"\n:b: 2").expect("should tokenize");
        let string = tokens
            .iter()
            .find(|t| t.kind() == TokenKind::String)
            .expect("string token");
        assert_eq!(string.line(), 1);
        let b = tokens.iter().find(|t| t.name() == "b").expect("b token");
        assert_eq!(b.line(), 3);
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        let err = tokenize("\"open").unwrap_err();
        assert!(matches!(err, CtnError::Lexical { character: '"', .. }));
    }
}
