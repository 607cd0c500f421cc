//! Construction actions and metadata lines following a service statement.

use ctn_common::error::Result;

use super::TokenCursor;
use super::ast::{ArrayNode, MetaDataAssignmentNode, ServiceMethodCallNode};
use super::lexer::TokenKind;
use super::literal::{parse_arguments, parse_array, parse_array_elements};

/// Parses `- method` or `- method(args)`.
///
/// Any bare word names the method, so `- use(@mw)` calls `use`.
///
/// # Errors
///
/// Returns a syntax error if the method name is missing or anything but a
/// line break follows the call.
pub fn parse_method_call(cursor: &mut TokenCursor<'_>) -> Result<ServiceMethodCallNode> {
    let minus = cursor.expect(TokenKind::Minus, "'-' before a method call")?;
    let name = cursor.expect_word("a method name")?;
    let arguments = if cursor.at(TokenKind::BraceOpen) {
        Some(parse_arguments(cursor)?)
    } else {
        None
    };
    cursor.expect_end_of_statement()?;
    Ok(ServiceMethodCallNode {
        name: name.text().to_string(),
        arguments,
        line: minus.line(),
    })
}

/// Parses `= key`, `= key: {array}` or `= key: elements...`.
///
/// As with method names, keywords are accepted as keys by their text.
///
/// # Errors
///
/// Returns a syntax error if the key is missing or the data is malformed.
pub fn parse_metadata(cursor: &mut TokenCursor<'_>) -> Result<MetaDataAssignmentNode> {
    let equal = cursor.expect(TokenKind::Equal, "'=' before a metadata key")?;
    let key = cursor.expect_word("a metadata key")?;
    let data = if cursor.skip(TokenKind::Assign) {
        let line = cursor.take_line();
        Some(TokenCursor::delegate(line, parse_metadata_data)?)
    } else {
        None
    };
    cursor.expect_end_of_statement()?;
    Ok(MetaDataAssignmentNode {
        key: key.text().to_string(),
        data,
        line: equal.line(),
    })
}

/// A single `{ ... }` literal spanning the line is the data itself; anything
/// else is read as the elements of an implicit array.
fn parse_metadata_data(cursor: &mut TokenCursor<'_>) -> Result<ArrayNode> {
    let mut probe = cursor.clone();
    let whole_line_array = probe.at(TokenKind::ScopeOpen)
        && probe
            .take_scoped(TokenKind::ScopeOpen, TokenKind::ScopeClose)
            .is_ok()
        && probe.at_end();
    if whole_line_array {
        parse_array(cursor)
    } else {
        parse_array_elements(cursor)
    }
}

#[cfg(test)]
mod tests {
    use ctn_common::error::CtnError;
    use ctn_common::types::{Key, Value};

    use super::*;
    use crate::parser::lexer::{Token, tokenize};
    use crate::parser::significant;

    fn tokens(source: &str) -> Vec<Token> {
        significant(&tokenize(source).expect("should tokenize"))
    }

    #[test]
    fn method_call_with_arguments() {
        let tokens = tokens("- setLevel(3, :name)\n");
        let mut cursor = TokenCursor::new(&tokens);
        let call = parse_method_call(&mut cursor).expect("should parse");
        assert_eq!(call.name, "setLevel");
        assert_eq!(call.arguments().expect("args").arguments.len(), 2);
        assert!(cursor.at_end());
    }

    #[test]
    fn method_call_without_arguments() {
        let tokens = tokens("- boot");
        let mut cursor = TokenCursor::new(&tokens);
        let call = parse_method_call(&mut cursor).expect("should parse");
        assert!(!call.has_arguments());
    }

    #[test]
    fn method_call_requires_a_name() {
        let tokens = tokens("- (1)");
        let mut cursor = TokenCursor::new(&tokens);
        let err = parse_method_call(&mut cursor).unwrap_err();
        assert!(matches!(err, CtnError::Syntax { .. }));
    }

    #[test]
    fn keywords_name_methods_and_metadata_keys() {
        let call_tokens = tokens("- use(@mw)");
        let mut cursor = TokenCursor::new(&call_tokens);
        let call = parse_method_call(&mut cursor).expect("should parse");
        assert_eq!(call.name, "use");

        let bare_tokens = tokens("= null");
        let mut cursor = TokenCursor::new(&bare_tokens);
        assert_eq!(parse_metadata(&mut cursor).expect("should parse").key, "null");

        let data_tokens = tokens("= override: {on: yes}");
        let mut cursor = TokenCursor::new(&data_tokens);
        let meta = parse_metadata(&mut cursor).expect("should parse");
        assert_eq!(meta.key, "override");
        assert!(meta.has_data());
    }

    #[test]
    fn trailing_garbage_after_call_fails() {
        let tokens = tokens("- boot(1) 2");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(parse_method_call(&mut cursor).is_err());
    }

    #[test]
    fn metadata_with_array_literal() {
        let tokens = tokens("= command: {name: 'app:clear'}");
        let mut cursor = TokenCursor::new(&tokens);
        let meta = parse_metadata(&mut cursor).expect("should parse");
        assert_eq!(meta.key, "command");
        let data = meta.data().expect("data").to_value().expect("plain");
        assert_eq!(
            data.as_array().expect("array").get(&Key::from("name")),
            Some(&Value::from("app:clear"))
        );
    }

    #[test]
    fn metadata_with_inline_elements() {
        let tokens = tokens("= on: 'kernel.boot', priority: 10\n");
        let mut cursor = TokenCursor::new(&tokens);
        let meta = parse_metadata(&mut cursor).expect("should parse");
        let data = meta.data().expect("data");
        assert_eq!(data.elements().len(), 2);
        assert!(data.has(&Key::Index(0)));
        assert!(data.has(&Key::from("priority")));
    }

    #[test]
    fn bare_metadata_has_no_data() {
        let tokens = tokens("= listener");
        let mut cursor = TokenCursor::new(&tokens);
        let meta = parse_metadata(&mut cursor).expect("should parse");
        assert!(!meta.has_data());
    }
}
