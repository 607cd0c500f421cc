//! Top-level statements of a compilation unit.

use ctn_common::error::Result;

use super::TokenCursor;
use super::ast::{ScopeImportNode, ScopeNode, Statement};
use super::definition::{parse_parameter_definition, parse_service_definition};
use super::lexer::TokenKind;

/// Parses statements until the cursor is exhausted.
///
/// # Errors
///
/// Returns a syntax error on the first token that cannot start a statement
/// or on any error raised by a statement parser.
pub fn parse_scope(cursor: &mut TokenCursor<'_>) -> Result<ScopeNode> {
    let mut scope = ScopeNode::default();
    loop {
        cursor.skip_line_breaks();
        let statement = match (cursor.peek_kind(), cursor.peek_nth_kind(1)) {
            (None, _) => break,
            (Some(TokenKind::Import), _) => Statement::Import(parse_import(cursor)?),
            (Some(TokenKind::Parameter), _)
            | (Some(TokenKind::Override), Some(TokenKind::Parameter)) => {
                Statement::Parameter(parse_parameter_definition(cursor)?)
            }
            (Some(TokenKind::Dependency), _)
            | (Some(TokenKind::Override), Some(TokenKind::Dependency)) => {
                Statement::Service(parse_service_definition(cursor)?)
            }
            (Some(TokenKind::Override), _) => {
                let _ = cursor.advance();
                return Err(cursor.unexpected("a parameter or service after override"));
            }
            _ => {
                return Err(cursor.unexpected(
                    "an import, a parameter definition or a service definition",
                ));
            }
        };
        scope.statements.push(statement);
    }
    Ok(scope)
}

/// Parses `import path` where the path is a bare name or a quoted string.
///
/// # Errors
///
/// Returns a syntax error if no path follows the keyword.
pub fn parse_import(cursor: &mut TokenCursor<'_>) -> Result<ScopeImportNode> {
    let keyword = cursor.expect(TokenKind::Import, "import")?;
    let path = match cursor.peek() {
        Some(t) if t.kind() == TokenKind::Identifier => t.text().to_string(),
        Some(t) if t.kind() == TokenKind::String => {
            t.value()?.as_str().unwrap_or_default().to_string()
        }
        _ => return Err(cursor.unexpected("an import path")),
    };
    let _ = cursor.advance();
    cursor.expect_end_of_statement()?;
    Ok(ScopeImportNode {
        path,
        line: keyword.line(),
    })
}
