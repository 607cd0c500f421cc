//! Parameter and service statements.

use ctn_common::error::Result;

use super::TokenCursor;
use super::action::{parse_metadata, parse_method_call};
use super::ast::{
    AssignableNode, ParameterDefinitionNode, ServiceDefinitionNode, ServiceKind,
    ServiceReferenceNode,
};
use super::lexer::TokenKind;
use super::literal::{parse_arguments, parse_array, parse_value};

/// Parses `[override] :name: <scalar | {array}>`.
///
/// # Errors
///
/// Returns a syntax error if the value is not a literal; references are not
/// allowed as parameter values.
pub fn parse_parameter_definition(
    cursor: &mut TokenCursor<'_>,
) -> Result<ParameterDefinitionNode> {
    let is_override = cursor.skip(TokenKind::Override);
    let name = cursor.expect(TokenKind::Parameter, "a parameter name")?;
    let _ = cursor.expect(TokenKind::Assign, "':' after the parameter name")?;
    let value = if cursor.at(TokenKind::ScopeOpen) {
        AssignableNode::Array(parse_array(cursor)?)
    } else if cursor.peek().is_some_and(|t| t.is_value()) {
        AssignableNode::Value(parse_value(cursor)?)
    } else {
        return Err(cursor.unexpected("a scalar or array literal"));
    };
    cursor.expect_end_of_statement()?;
    Ok(ParameterDefinitionNode {
        name: name.name().to_string(),
        value,
        is_override,
        line: name.line(),
    })
}

/// Parses a service statement and the action lines that follow it.
///
/// ```text
/// [override] @name: Class(args)   concrete definition
/// [override] @name: @target       alias
/// @name [(args)]                  update of an earlier definition
///   - method(args)
///   = key: {data}
/// ```
///
/// # Errors
///
/// Returns a syntax error for arguments on an alias, a missing class name,
/// `override` on an update, or a malformed action line.
pub fn parse_service_definition(cursor: &mut TokenCursor<'_>) -> Result<ServiceDefinitionNode> {
    let is_override = cursor.skip(TokenKind::Override);
    let name = cursor.expect(TokenKind::Dependency, "a service name")?;

    let kind = if cursor.skip(TokenKind::Assign) {
        parse_right_hand_side(cursor)?
    } else if is_override {
        return Err(cursor.unexpected("':' after an overridden service name"));
    } else {
        let arguments = if cursor.at(TokenKind::BraceOpen) {
            Some(parse_arguments(cursor)?)
        } else {
            None
        };
        ServiceKind::Update { arguments }
    };
    cursor.expect_end_of_statement()?;

    let mut node = ServiceDefinitionNode {
        name: name.name().to_string(),
        kind,
        is_override,
        actions: Vec::new(),
        metadata: Vec::new(),
        line: name.line(),
    };
    loop {
        match cursor.peek_kind() {
            Some(TokenKind::Minus) => node.actions.push(parse_method_call(cursor)?),
            Some(TokenKind::Equal) => node.metadata.push(parse_metadata(cursor)?),
            _ => break,
        }
    }
    Ok(node)
}

fn parse_right_hand_side(cursor: &mut TokenCursor<'_>) -> Result<ServiceKind> {
    match cursor.peek() {
        Some(t) if t.kind() == TokenKind::Dependency => {
            let _ = cursor.advance();
            if cursor.at(TokenKind::BraceOpen) {
                return Err(cursor.unexpected("end of line, an alias takes no arguments"));
            }
            Ok(ServiceKind::Alias {
                target: ServiceReferenceNode {
                    name: t.name().to_string(),
                },
            })
        }
        Some(t) if t.kind() == TokenKind::Identifier => {
            let _ = cursor.advance();
            let arguments = if cursor.at(TokenKind::BraceOpen) {
                Some(parse_arguments(cursor)?)
            } else {
                None
            };
            Ok(ServiceKind::Concrete {
                class: t.text().to_string(),
                arguments,
            })
        }
        _ => Err(cursor.unexpected("a class name or a service reference")),
    }
}
