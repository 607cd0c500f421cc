//! Abstract syntax tree for ctn source.
//!
//! Nodes are plain data carriers produced by the grammar parsers and
//! consumed once by the interpreter.

use ctn_common::error::{CtnError, Result};
use ctn_common::types::{Key, KeyedArray, Value};
use serde::Serialize;

/// Root of a parsed compilation unit: top-level statements in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScopeNode {
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// `import some/path`
    Import(ScopeImportNode),
    /// `:name: value`
    Parameter(ParameterDefinitionNode),
    /// `@name ...`
    Service(ServiceDefinitionNode),
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeImportNode {
    /// Name looked up in the namespace's import table.
    pub path: String,
    /// Source line of the statement.
    pub line: usize,
}

/// A parameter definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDefinitionNode {
    /// Parameter name without sigil.
    pub name: String,
    /// Scalar or array literal.
    pub value: AssignableNode,
    /// Whether the statement was marked `override`.
    pub is_override: bool,
    /// Source line of the statement.
    pub line: usize,
}

/// What a service statement does with its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceKind {
    /// `@name: Class(args)`
    Concrete {
        /// Logical class name.
        class: String,
        /// Constructor arguments, absent when no parentheses were written.
        arguments: Option<ArgumentArrayNode>,
    },
    /// `@name: @target`
    Alias {
        /// The aliased service.
        target: ServiceReferenceNode,
    },
    /// `@name` or `@name(args)` reopening an existing definition.
    Update {
        /// Replacement constructor arguments.
        arguments: Option<ArgumentArrayNode>,
    },
}

/// A service definition, alias or update with its trailing action lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDefinitionNode {
    /// Service name without sigil.
    pub name: String,
    /// Definition shape.
    pub kind: ServiceKind,
    /// Whether the statement was marked `override`.
    pub is_override: bool,
    /// `- method(args)` lines in order.
    pub actions: Vec<ServiceMethodCallNode>,
    /// `= key: data` lines in order.
    pub metadata: Vec<MetaDataAssignmentNode>,
    /// Source line of the statement.
    pub line: usize,
}

impl ServiceDefinitionNode {
    /// Whether the statement defines an alias.
    #[must_use]
    pub const fn is_alias(&self) -> bool {
        matches!(self.kind, ServiceKind::Alias { .. })
    }

    /// Whether the statement reopens an existing definition.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self.kind, ServiceKind::Update { .. })
    }
}

/// A `- method(args)` construction action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMethodCallNode {
    /// Method name.
    pub name: String,
    /// Call arguments, absent for `- method`.
    pub arguments: Option<ArgumentArrayNode>,
    /// Source line of the action.
    pub line: usize,
}

impl ServiceMethodCallNode {
    /// Whether the call was written with parentheses.
    #[must_use]
    pub const fn has_arguments(&self) -> bool {
        self.arguments.is_some()
    }

    /// The call arguments.
    ///
    /// # Errors
    ///
    /// Returns a logic error if the call was written without arguments.
    pub fn arguments(&self) -> Result<&ArgumentArrayNode> {
        self.arguments.as_ref().ok_or_else(|| {
            CtnError::logic(format!(
                "method call \"{}\" on line {} has no arguments",
                self.name, self.line
            ))
        })
    }
}

/// A `= key: data` metadata assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaDataAssignmentNode {
    /// Metadata key.
    pub key: String,
    /// Attached data, absent for a bare `= key`.
    pub data: Option<ArrayNode>,
    /// Source line of the assignment.
    pub line: usize,
}

impl MetaDataAssignmentNode {
    /// Whether a data array was given.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// The attached data.
    ///
    /// # Errors
    ///
    /// Returns a logic error for a bare `= key` assignment.
    pub fn data(&self) -> Result<&ArrayNode> {
        self.data.as_ref().ok_or_else(|| {
            CtnError::logic(format!(
                "metadata \"{}\" on line {} has no data",
                self.key, self.line
            ))
        })
    }
}

/// Parenthesized argument list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArgumentArrayNode {
    /// Arguments in declaration order.
    pub arguments: Vec<AssignableNode>,
}

/// One element of an array literal before it is keyed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayElementNode {
    /// Explicit key, or `None` for the next free index.
    pub key: Option<Key>,
    /// Element value.
    pub value: AssignableNode,
}

/// `{ ... }` array literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArrayNode {
    elements: KeyedArray<AssignableNode>,
}

impl ArrayNode {
    /// Creates an empty array literal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: KeyedArray::new(),
        }
    }

    /// Adds an element, replacing an earlier one with the same explicit key.
    pub fn add(&mut self, element: ArrayElementNode) {
        match element.key {
            Some(key) => {
                let _ = self.elements.insert(key, element.value);
            }
            None => {
                let _ = self.elements.push(element.value);
            }
        }
    }

    /// Appends under the next free integer index.
    pub fn push(&mut self, value: AssignableNode) -> Key {
        self.elements.push(value)
    }

    /// Stores under an explicit key.
    pub fn set(&mut self, key: impl Into<Key>, value: AssignableNode) {
        let _ = self.elements.insert(key.into(), value);
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn has(&self, key: &Key) -> bool {
        self.elements.contains_key(key)
    }

    /// Keyed elements in insertion order.
    #[must_use]
    pub const fn elements(&self) -> &KeyedArray<AssignableNode> {
        &self.elements
    }

    /// Whether any element, at any depth, is a reference.
    #[must_use]
    pub fn contains_reference(&self) -> bool {
        self.elements.values().any(AssignableNode::contains_reference)
    }

    /// Flattens the literal into a plain array value.
    ///
    /// # Errors
    ///
    /// Returns a logic error if any element is a reference.
    pub fn to_value(&self) -> Result<Value> {
        self.elements
            .try_map(AssignableNode::to_value)
            .map(Value::Array)
    }
}

/// A scalar literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueNode {
    /// Literal category.
    pub kind: ValueKind,
    /// Decoded value.
    pub value: Value,
}

/// Scalar literal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Quoted string.
    String,
    /// Integer or float.
    Number,
    /// `yes`/`true`.
    BoolTrue,
    /// `no`/`false`.
    BoolFalse,
    /// `null`.
    Null,
}

/// `@name` inside an argument list or array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReferenceNode {
    /// Referenced service name.
    pub name: String,
}

/// `:name` inside an argument list or array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterReferenceNode {
    /// Referenced parameter name.
    pub name: String,
}

/// Anything allowed as an argument or array element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignableNode {
    /// Scalar literal.
    Value(ValueNode),
    /// Nested array literal.
    Array(ArrayNode),
    /// Service reference.
    ServiceReference(ServiceReferenceNode),
    /// Parameter reference.
    ParameterReference(ParameterReferenceNode),
}

impl AssignableNode {
    /// Whether this node is, or transitively contains, a reference.
    #[must_use]
    pub fn contains_reference(&self) -> bool {
        match self {
            Self::Value(_) => false,
            Self::Array(array) => array.contains_reference(),
            Self::ServiceReference(_) | Self::ParameterReference(_) => true,
        }
    }

    /// Converts a literal into a plain value.
    ///
    /// # Errors
    ///
    /// Returns a logic error for references, including references nested
    /// in arrays.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            Self::Value(node) => Ok(node.value.clone()),
            Self::Array(array) => array.to_value(),
            Self::ServiceReference(r) => Err(CtnError::logic(format!(
                "service reference @{} cannot be converted into a plain value",
                r.name
            ))),
            Self::ParameterReference(r) => Err(CtnError::logic(format!(
                "parameter reference :{} cannot be converted into a plain value",
                r.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(value: impl Into<Value>) -> AssignableNode {
        let value = value.into();
        let kind = match value {
            Value::String(_) => ValueKind::String,
            Value::Null => ValueKind::Null,
            _ => ValueKind::Number,
        };
        AssignableNode::Value(ValueNode { kind, value })
    }

    #[test]
    fn push_skips_explicit_keys() {
        let mut array = ArrayNode::new();
        array.set(3_i64, scalar("three"));
        for i in 0..4_i64 {
            let _ = array.push(scalar(i));
        }
        let keys: Vec<Key> = array.elements().keys().cloned().collect();
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
    fn array_of_literals_flattens() {
        let mut array = ArrayNode::new();
        let _ = array.push(scalar("a"));
        array.set("k", scalar(1_i64));
        let value = array.to_value().expect("should flatten");
        let flat = value.as_array().expect("array");
        assert_eq!(flat.get(&Key::Index(0)), Some(&Value::from("a")));
        assert_eq!(flat.get(&Key::from("k")), Some(&Value::Int(1)));
    }

    #[test]
    fn nested_reference_prevents_flattening() {
        let mut inner = ArrayNode::new();
        let _ = inner.push(AssignableNode::ServiceReference(ServiceReferenceNode {
            name: "db".into(),
        }));
        let mut outer = ArrayNode::new();
        let _ = outer.push(AssignableNode::Array(inner));
        assert!(outer.contains_reference());
        let err = outer.to_value().unwrap_err();
        assert!(matches!(err, CtnError::Logic { .. }));
    }

    #[test]
    fn missing_arguments_and_data_are_logic_errors() {
        let call = ServiceMethodCallNode {
            name: "boot".into(),
            arguments: None,
            line: 2,
        };
        assert!(!call.has_arguments());
        assert!(matches!(call.arguments(), Err(CtnError::Logic { .. })));

        let meta = MetaDataAssignmentNode {
            key: "tag".into(),
            data: None,
            line: 3,
        };
        assert!(!meta.has_data());
        assert!(matches!(meta.data(), Err(CtnError::Logic { .. })));
    }
}
