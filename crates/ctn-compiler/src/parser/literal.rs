//! Argument lists, array literals, references and scalars.

use ctn_common::error::Result;
use ctn_common::types::{Key, Value};

use super::TokenCursor;
use super::ast::{
    ArgumentArrayNode, ArrayElementNode, ArrayNode, AssignableNode, ParameterReferenceNode,
    ServiceReferenceNode, ValueKind, ValueNode,
};
use super::lexer::{Token, TokenKind};

/// Parses a parenthesized argument list.
///
/// # Errors
///
/// Returns a syntax error on a malformed list or an unclosed parenthesis.
pub fn parse_arguments(cursor: &mut TokenCursor<'_>) -> Result<ArgumentArrayNode> {
    let inner = cursor.take_scoped(TokenKind::BraceOpen, TokenKind::BraceClose)?;
    TokenCursor::delegate(inner, parse_argument_list)
}

/// Parses comma-separated assignables up to the end of the cursor.
///
/// # Errors
///
/// Returns a syntax error if an argument is malformed or two arguments are
/// not separated by a comma.
pub fn parse_argument_list(cursor: &mut TokenCursor<'_>) -> Result<ArgumentArrayNode> {
    let mut node = ArgumentArrayNode::default();
    cursor.skip_line_breaks();
    while !cursor.at_end() {
        node.arguments.push(parse_assignable(cursor)?);
        if !separated(cursor, "',' between arguments")? {
            break;
        }
    }
    Ok(node)
}

/// Parses a `{ ... }` array literal.
///
/// # Errors
///
/// Returns a syntax error on a malformed element or an unclosed brace.
pub fn parse_array(cursor: &mut TokenCursor<'_>) -> Result<ArrayNode> {
    let inner = cursor.take_scoped(TokenKind::ScopeOpen, TokenKind::ScopeClose)?;
    TokenCursor::delegate(inner, parse_array_elements)
}

/// Parses comma-separated array elements up to the end of the cursor.
///
/// # Errors
///
/// Returns a syntax error if an element or key is malformed.
pub fn parse_array_elements(cursor: &mut TokenCursor<'_>) -> Result<ArrayNode> {
    let mut node = ArrayNode::new();
    cursor.skip_line_breaks();
    while !cursor.at_end() {
        node.add(parse_array_element(cursor)?);
        if !separated(cursor, "',' between array elements")? {
            break;
        }
    }
    Ok(node)
}

/// Consumes the separator after a list item. Returns `false` once the list
/// is exhausted.
fn separated(cursor: &mut TokenCursor<'_>, expected: &str) -> Result<bool> {
    cursor.skip_line_breaks();
    if cursor.at_end() {
        return Ok(false);
    }
    let _ = cursor.expect(TokenKind::Separator, expected)?;
    cursor.skip_line_breaks();
    Ok(true)
}

/// Parses one array element, associative when its first token is directly
/// followed by `:`.
///
/// # Errors
///
/// Returns a syntax error for a key that is not an identifier, a string or
/// an integer, or for a malformed value.
pub fn parse_array_element(cursor: &mut TokenCursor<'_>) -> Result<ArrayElementNode> {
    let key = if cursor.peek_nth_kind(1) == Some(TokenKind::Assign) {
        Some(parse_key(cursor)?)
    } else {
        None
    };
    let value = parse_assignable(cursor)?;
    Ok(ArrayElementNode { key, value })
}

fn parse_key(cursor: &mut TokenCursor<'_>) -> Result<Key> {
    let token = cursor
        .peek()
        .ok_or_else(|| cursor.unexpected("an array key"))?;
    let key = match token.kind() {
        TokenKind::Identifier => Some(Key::Name(token.text().to_string())),
        TokenKind::String | TokenKind::Number => match token.value()? {
            Value::String(s) => Some(Key::Name(s)),
            Value::Int(i) => Some(Key::Index(i)),
            _ => None,
        },
        _ => None,
    };
    let key = key.ok_or_else(|| cursor.unexpected("an identifier, string or integer key"))?;
    let _ = cursor.advance();
    let _ = cursor.expect(TokenKind::Assign, "':' after the key")?;
    Ok(key)
}

/// Parses a scalar, a nested array or a reference.
///
/// # Errors
///
/// Returns a syntax error if the current token starts none of them.
pub fn parse_assignable(cursor: &mut TokenCursor<'_>) -> Result<AssignableNode> {
    match cursor.peek() {
        Some(t) if t.kind() == TokenKind::ScopeOpen => {
            parse_array(cursor).map(AssignableNode::Array)
        }
        Some(t) if matches!(t.kind(), TokenKind::Dependency | TokenKind::Parameter) => {
            parse_reference(cursor)
        }
        Some(t) if t.is_value() => parse_value(cursor).map(AssignableNode::Value),
        _ => Err(cursor.unexpected("a value, array or reference")),
    }
}

/// Parses `@name` or `:name`, selecting the node by sigil.
///
/// # Errors
///
/// Returns a syntax error if the current token is not a reference.
pub fn parse_reference(cursor: &mut TokenCursor<'_>) -> Result<AssignableNode> {
    let node = match cursor.peek() {
        Some(t) if t.kind() == TokenKind::Dependency => {
            AssignableNode::ServiceReference(ServiceReferenceNode {
                name: t.name().to_string(),
            })
        }
        Some(t) if t.kind() == TokenKind::Parameter => {
            AssignableNode::ParameterReference(ParameterReferenceNode {
                name: t.name().to_string(),
            })
        }
        _ => return Err(cursor.unexpected("a service or parameter reference")),
    };
    let _ = cursor.advance();
    Ok(node)
}

/// Parses a scalar literal.
///
/// # Errors
///
/// Returns a syntax error if the current token is not a literal.
pub fn parse_value(cursor: &mut TokenCursor<'_>) -> Result<ValueNode> {
    let token = cursor
        .peek()
        .filter(|t| t.is_value())
        .ok_or_else(|| cursor.unexpected("a literal value"))?;
    let node = ValueNode {
        kind: value_kind(token),
        value: token.value()?,
    };
    let _ = cursor.advance();
    Ok(node)
}

const fn value_kind(token: &Token) -> ValueKind {
    match token.kind() {
        TokenKind::String => ValueKind::String,
        TokenKind::Number => ValueKind::Number,
        TokenKind::BoolTrue => ValueKind::BoolTrue,
        TokenKind::BoolFalse => ValueKind::BoolFalse,
        _ => ValueKind::Null,
    }
}

#[cfg(test)]
mod tests {
    use ctn_common::error::CtnError;

    use super::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::significant;

    fn tokens(source: &str) -> Vec<Token> {
        significant(&tokenize(source).expect("should tokenize"))
    }

    fn array(source: &str) -> Result<ArrayNode> {
        let tokens = tokens(source);
        let mut cursor = TokenCursor::new(&tokens);
        parse_array(&mut cursor)
    }

    #[test]
    fn arguments_keep_order_and_kind() {
        let tokens = tokens("(@log.handler, :path, \"x\", 4, {1, 2})");
        let mut cursor = TokenCursor::new(&tokens);
        let node = parse_arguments(&mut cursor).expect("should parse");
        assert!(cursor.at_end());
        assert_eq!(node.arguments.len(), 5);
        assert!(matches!(
            &node.arguments[0],
            AssignableNode::ServiceReference(r) if r.name == "log.handler"
        ));
        assert!(matches!(
            &node.arguments[1],
            AssignableNode::ParameterReference(r) if r.name == "path"
        ));
        assert!(matches!(
            &node.arguments[2],
            AssignableNode::Value(ValueNode { kind: ValueKind::String, .. })
        ));
        assert!(matches!(&node.arguments[4], AssignableNode::Array(_)));
    }

    #[test]
    fn empty_argument_list() {
        let tokens = tokens("()");
        let mut cursor = TokenCursor::new(&tokens);
        let node = parse_arguments(&mut cursor).expect("should parse");
        assert!(node.arguments.is_empty());
    }

    #[test]
    fn trailing_comma_and_line_breaks_are_allowed() {
        let node = array("{\n  1,\n  2,\n}").expect("should parse");
        assert_eq!(node.elements().len(), 2);
    }

    #[test]
    fn missing_separator_fails() {
        let tokens = tokens("(1 2)");
        let mut cursor = TokenCursor::new(&tokens);
        let err = parse_arguments(&mut cursor).unwrap_err();
        assert!(matches!(err, CtnError::Syntax { .. }));
        assert!(err.to_string().contains("','"), "got: {err}");
    }

    #[test]
    fn associative_keys() {
        let node = array("{name: 'a', \"quoted key\": 'b', 7: 'c'}").expect("should parse");
        let keys: Vec<Key> = node.elements().keys().cloned().collect();
        assert_eq!(
            keys,
            vec![Key::from("name"), Key::from("quoted key"), Key::Index(7)]
        );
    }

    #[test]
    fn anonymous_elements_skip_explicit_keys() {
        let node = array("{3: 'x', 'a', 'b', 'c', 'd'}").expect("should parse");
        let keys: Vec<Key> = node.elements().keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Key::Index(3),
                Key::Index(0),
                Key::Index(1),
                Key::Index(2),
                Key::Index(4)
            ]
        );
    }

    #[test]
    fn repeated_explicit_key_replaces_in_place() {
        let node = array("{a: 1, b: 2, a: 3}").expect("should parse");
        let value = node.to_value().expect("plain");
        let flat = value.as_array().expect("array");
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get(&Key::from("a")), Some(&Value::Int(3)));
    }

    #[test]
    fn float_key_is_rejected() {
        let err = array("{1.5: 'x'}").unwrap_err();
        assert!(matches!(err, CtnError::Syntax { .. }));
    }

    #[test]
    fn nested_arrays_with_references() {
        let node = array("{handlers: {@a, @b}, level: :lvl}").expect("should parse");
        assert!(node.contains_reference());
        assert!(node.to_value().is_err());
    }

    #[test]
    fn unclosed_array_fails() {
        let err = array("{1, 2").unwrap_err();
        assert!(err.to_string().contains("never closed"), "got: {err}");
    }

    #[test]
    fn bare_identifier_is_not_assignable() {
        let err = array("{Acme}").unwrap_err();
        assert!(matches!(err, CtnError::Syntax { .. }));
    }
}
