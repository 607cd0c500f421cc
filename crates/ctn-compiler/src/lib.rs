//! # ctn-compiler
//!
//! Compiler for the ctn service definition language.
//!
//! Handles:
//! - **Lexer**: tokenization of ctn source text.
//! - **Parser**: recursive-descent grammar producing the AST.
//! - **Interpreter**: folding a parsed scope into a [`Namespace`](namespace::Namespace).
//! - **Namespace**: the compiled parameters, aliases and service definitions.
//! - **Import**: source providers that satisfy `import` statements.
//! - **Graph**: service dependency graph, cycle detection and instantiation order.

pub mod graph;
pub mod import;
pub mod interpreter;
pub mod namespace;
pub mod parser;

pub use namespace::Namespace;
