//! Folding a parsed scope into a [`Namespace`].
//!
//! Statements apply in order. Imports are lexed, parsed and interpreted
//! into the same namespace, so imported and local definitions share one
//! override space. Each statement applies entirely or not at all.

use ctn_common::constants::SELF_SERVICE;
use ctn_common::error::{CtnError, Result};
use ctn_common::types::KeyedArray;
use ctn_container::{Argument, ServiceArguments, ServiceDefinition};

use crate::namespace::Namespace;
use crate::parser::ast::{
    ArgumentArrayNode, AssignableNode, ParameterDefinitionNode, ScopeImportNode, ScopeNode,
    ServiceDefinitionNode, ServiceKind, Statement,
};
use crate::parser::parse_source;

/// Applies parsed statements to a namespace.
#[derive(Debug)]
pub struct Interpreter<'ns> {
    namespace: &'ns mut Namespace,
    import_stack: Vec<String>,
}

impl<'ns> Interpreter<'ns> {
    /// Creates an interpreter writing into `namespace`.
    pub const fn new(namespace: &'ns mut Namespace) -> Self {
        Self {
            namespace,
            import_stack: Vec::new(),
        }
    }

    /// Applies every statement of `scope` in order, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns a semantic error for a duplicate name without `override`, an
    /// update of an unknown service, an alias cycle, an unknown or circular
    /// import, or any error raised while compiling an imported unit.
    pub fn interpret(&mut self, scope: &ScopeNode) -> Result<()> {
        for statement in &scope.statements {
            match statement {
                Statement::Import(node) => self.import(node)?,
                Statement::Parameter(node) => self.define_parameter(node)?,
                Statement::Service(node) => self.define_service(node)?,
            }
        }
        Ok(())
    }

    fn import(&mut self, node: &ScopeImportNode) -> Result<()> {
        if self.import_stack.contains(&node.path) {
            let mut chain = self.import_stack.clone();
            chain.push(node.path.clone());
            return Err(CtnError::semantic(format!(
                "circular import on line {}: {}",
                node.line,
                chain.join(" -> ")
            )));
        }
        let max_depth = self.namespace.config().max_import_depth;
        if self.import_stack.len() >= max_depth {
            return Err(CtnError::semantic(format!(
                "import of \"{}\" on line {} exceeds the maximum depth of {max_depth}",
                node.path, node.line
            )));
        }

        let code = self.namespace.code(&node.path)?;
        let scope = parse_source(&code, self.namespace.config())?;
        tracing::debug!(path = %node.path, statements = scope.statements.len(), "importing");

        self.import_stack.push(node.path.clone());
        let result = self.interpret(&scope);
        let _ = self.import_stack.pop();
        result
    }

    fn define_parameter(&mut self, node: &ParameterDefinitionNode) -> Result<()> {
        if !node.is_override && self.namespace.has_parameter(&node.name) {
            return Err(CtnError::semantic(format!(
                "parameter \"{}\" on line {} is already defined, mark it override to replace it",
                node.name, node.line
            )));
        }
        let value = node.value.to_value()?;
        self.namespace.set_parameter(node.name.clone(), value);
        Ok(())
    }

    fn define_service(&mut self, node: &ServiceDefinitionNode) -> Result<()> {
        if node.name == SELF_SERVICE {
            return Err(CtnError::semantic(format!(
                "\"{SELF_SERVICE}\" on line {} is reserved for the container itself",
                node.line
            )));
        }
        match &node.kind {
            ServiceKind::Update { arguments } => {
                let mut definition =
                    self.namespace.service(&node.name).cloned().ok_or_else(|| {
                        CtnError::semantic(format!(
                            "cannot update undefined service \"{}\" on line {}",
                            node.name, node.line
                        ))
                    })?;
                if let Some(arguments) = arguments {
                    definition.set_arguments(service_arguments(arguments)?);
                }
                apply_actions(&mut definition, node)?;
                self.namespace.set_service(node.name.clone(), definition);
            }
            ServiceKind::Alias { target } => {
                self.ensure_free(node)?;
                self.namespace.set_alias(node.name.clone(), target.name.clone())?;
                if !node.actions.is_empty() || !node.metadata.is_empty() {
                    tracing::warn!(
                        alias = %node.name,
                        line = node.line,
                        "construction actions and metadata on an alias are ignored"
                    );
                }
            }
            ServiceKind::Concrete { class, arguments } => {
                self.ensure_free(node)?;
                let mut definition = ServiceDefinition::for_class(class.clone());
                if let Some(arguments) = arguments {
                    definition.set_arguments(service_arguments(arguments)?);
                }
                apply_actions(&mut definition, node)?;
                self.namespace.set_service(node.name.clone(), definition);
            }
        }
        Ok(())
    }

    fn ensure_free(&self, node: &ServiceDefinitionNode) -> Result<()> {
        if !node.is_override && self.namespace.has_service(&node.name) {
            return Err(CtnError::semantic(format!(
                "service \"{}\" on line {} is already defined, mark it override to replace it",
                node.name, node.line
            )));
        }
        Ok(())
    }
}

/// Appends the node's construction actions and metadata to `definition`.
fn apply_actions(definition: &mut ServiceDefinition, node: &ServiceDefinitionNode) -> Result<()> {
    for call in &node.actions {
        let arguments = match &call.arguments {
            Some(arguments) => service_arguments(arguments)?,
            None => ServiceArguments::new(),
        };
        definition.add_call(call.name.clone(), arguments);
    }
    for meta in &node.metadata {
        let data = match &meta.data {
            Some(data) => data.elements().try_map(AssignableNode::to_value)?,
            None => KeyedArray::new(),
        };
        definition.add_metadata(meta.key.clone(), data);
    }
    Ok(())
}

fn service_arguments(node: &ArgumentArrayNode) -> Result<ServiceArguments> {
    let mut arguments = ServiceArguments::new();
    for assignable in &node.arguments {
        arguments.push(argument(assignable)?);
    }
    Ok(arguments)
}

/// Classifies an argument by node type.
fn argument(node: &AssignableNode) -> Result<Argument> {
    Ok(match node {
        AssignableNode::Value(value) => Argument::Raw(value.value.clone()),
        AssignableNode::Array(array) => Argument::Raw(array.to_value()?),
        AssignableNode::ServiceReference(r) => Argument::Dependency(r.name.clone()),
        AssignableNode::ParameterReference(r) => Argument::Parameter(r.name.clone()),
    })
}
