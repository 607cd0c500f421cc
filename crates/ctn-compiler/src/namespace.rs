//! The compiled result of one or more ctn units.
//!
//! A [`Namespace`] owns the parameters, aliases and service definitions
//! produced by the interpreter together with the sources used to satisfy
//! `import` statements. Imports interpret into the same namespace as the
//! importing unit, so both share one duplicate-definition space.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ctn_common::config::CtnConfig;
use ctn_common::error::{CtnError, Result};
use ctn_common::types::Value;
use ctn_container::ServiceDefinition;
use serde::Serialize;

use crate::import::{CodeSource, ImportTable};
use crate::interpreter::Interpreter;
use crate::parser::{self, ast::ScopeNode};

/// Parameters, aliases and service definitions of a compilation.
#[derive(Debug, Default)]
pub struct Namespace {
    parameters: BTreeMap<String, Value>,
    aliases: BTreeMap<String, String>,
    services: BTreeMap<String, ServiceDefinition>,
    imports: ImportTable,
    sources: Vec<Box<dyn CodeSource>>,
    config: CtnConfig,
}

/// Read-only view of a namespace for code generators and tooling.
#[derive(Debug, Serialize)]
pub struct NamespaceSnapshot<'a> {
    /// Parameter values by name.
    pub parameters: &'a BTreeMap<String, Value>,
    /// Alias targets by alias name.
    pub aliases: &'a BTreeMap<String, String>,
    /// Service definitions by name.
    pub services: &'a BTreeMap<String, ServiceDefinition>,
    /// Names available to `import` from the namespace's own table.
    pub imports: Vec<&'a str>,
}

impl Namespace {
    /// Creates an empty namespace with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty namespace using `config`.
    #[must_use]
    pub fn with_config(config: CtnConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The compiler configuration.
    #[must_use]
    pub const fn config(&self) -> &CtnConfig {
        &self.config
    }

    // ── Compilation ─────────────────────────────────────────────────

    /// Lexes, parses and interprets `code` into this namespace.
    ///
    /// Statements before a failing one stay applied; nothing after it is.
    ///
    /// # Errors
    ///
    /// Returns the first lexical, syntax or semantic error.
    pub fn parse(&mut self, code: &str) -> Result<()> {
        let scope = parser::parse_source(code, &self.config)?;
        self.interpret(&scope)
    }

    /// Interprets an already parsed scope into this namespace.
    ///
    /// # Errors
    ///
    /// Returns the first semantic error, including failures of imports.
    pub fn interpret(&mut self, scope: &ScopeNode) -> Result<()> {
        Interpreter::new(self).interpret(scope)
    }

    /// Reads the file at `path` and compiles it into this namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to compile.
    pub fn parse_file(&mut self, path: &Path) -> Result<()> {
        let code = std::fs::read_to_string(path).map_err(|e| CtnError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "compiling ctn file");
        self.parse(&code)
    }

    // ── Parameters ──────────────────────────────────────────────────

    /// Whether a parameter named `name` exists.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// The parameter `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Every parameter by name.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Stores a parameter, replacing any previous value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let _ = self.parameters.insert(name.into(), value.into());
    }

    // ── Services and aliases ────────────────────────────────────────

    /// Whether `name` is taken by a service definition or an alias.
    #[must_use]
    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name) || self.aliases.contains_key(name)
    }

    /// The service definition `name`; aliases are not followed.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.get(name)
    }

    /// Every service definition by name.
    #[must_use]
    pub const fn services(&self) -> &BTreeMap<String, ServiceDefinition> {
        &self.services
    }

    /// Stores a service definition, replacing any definition or alias of
    /// the same name.
    pub fn set_service(&mut self, name: impl Into<String>, definition: ServiceDefinition) {
        let name = name.into();
        let _ = self.aliases.remove(&name);
        let _ = self.services.insert(name, definition);
    }

    /// Whether `name` is an alias.
    #[must_use]
    pub fn has_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Target of the alias `name`.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Every alias by name.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Stores an alias, replacing any definition or alias of the same name.
    ///
    /// # Errors
    ///
    /// Returns a semantic error if following `target` through existing
    /// aliases leads back to `name`.
    pub fn set_alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let name = name.into();
        let target = target.into();
        let mut chain = vec![name.as_str()];
        let mut current = target.as_str();
        loop {
            chain.push(current);
            if current == name {
                return Err(CtnError::semantic(format!(
                    "alias cycle: {}",
                    chain.join(" -> ")
                )));
            }
            match self.aliases.get(current) {
                Some(next) => current = next.as_str(),
                None => break,
            }
        }
        let _ = self.services.remove(&name);
        let _ = self.aliases.insert(name, target);
        Ok(())
    }

    // ── Imports ─────────────────────────────────────────────────────

    /// The namespace's own import table.
    #[must_use]
    pub const fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Makes `name` importable from the file at `path`.
    pub fn register_import(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.imports.insert_path(name, path);
    }

    /// Makes `name` importable from in-memory source text.
    pub fn register_code(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.imports.insert_code(name, code);
    }

    /// Registers every source file under `dir`, named by relative path
    /// without extension and prefixed with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn import_directory(&mut self, dir: &Path, prefix: &str) -> Result<usize> {
        let count = self
            .imports
            .scan_directory(dir, prefix, &self.config.extension)?;
        tracing::info!(dir = %dir.display(), count, "registered import directory");
        Ok(count)
    }

    /// Adds a fallback source consulted after the import table.
    pub fn add_source(&mut self, source: Box<dyn CodeSource>) {
        self.sources.push(source);
    }

    /// Whether `name` can be imported.
    #[must_use]
    pub fn has_import(&self, name: &str) -> bool {
        self.imports.has(name) || self.sources.iter().any(|s| s.has(name))
    }

    /// Source text for the import `name`.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unknown name, or the source's own
    /// error if the text cannot be read.
    pub fn code(&self, name: &str) -> Result<String> {
        if self.imports.has(name) {
            return self.imports.code(name);
        }
        self.sources
            .iter()
            .find(|s| s.has(name))
            .ok_or_else(|| CtnError::NotFound {
                kind: "import",
                id: name.to_string(),
            })?
            .code(name)
    }

    /// Borrowed snapshot of the compiled maps.
    #[must_use]
    pub fn snapshot(&self) -> NamespaceSnapshot<'_> {
        NamespaceSnapshot {
            parameters: &self.parameters,
            aliases: &self.aliases,
            services: &self.services,
            imports: self.imports.names().collect(),
        }
    }
}
