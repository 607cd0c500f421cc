//! `ctn check`: Compile a file and report unresolved references.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ctn_compiler::graph::ServiceGraph;
use ctn_sdk::builder::parameter_references;
use ctn_sdk::loader::Loader;

use crate::output;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the ctn file.
    #[arg(default_value = "app.ctn")]
    pub file: PathBuf,

    /// Treat references to undefined services or parameters as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Executes the `check` command.
///
/// Compiles the file, builds the service graph and lists every reference
/// the file does not define. A dependency cycle always fails.
///
/// # Errors
///
/// Returns an error if compilation fails, the services form a cycle, or
/// `--strict` is set and a reference is unresolved.
pub fn execute(args: &CheckArgs, loader: &Loader, out: &mut dyn Write) -> anyhow::Result<()> {
    let namespace = loader
        .load(&args.file)
        .with_context(|| format!("failed to compile {}", args.file.display()))?;
    let graph = ServiceGraph::from_namespace(&namespace);
    let _ = graph.resolve_order()?;

    let mut unresolved = BTreeSet::new();
    for (dependent, dependency) in graph.missing() {
        let _ = unresolved.insert(format!("@{dependent} -> undefined service @{dependency}"));
    }
    for (name, definition) in namespace.services() {
        for parameter in parameter_references(definition) {
            if !namespace.has_parameter(parameter) {
                let _ = unresolved.insert(format!("@{name} -> undefined parameter :{parameter}"));
            }
        }
    }

    for line in &unresolved {
        tracing::warn!("{line}");
        writeln!(out, "  ! {line}")?;
    }
    if args.strict && !unresolved.is_empty() {
        anyhow::bail!(
            "{} has {}",
            args.file.display(),
            output::count(unresolved.len(), "unresolved reference", "unresolved references")
        );
    }

    writeln!(
        out,
        "ok: {} ({}, {}, {})",
        args.file.display(),
        output::count(namespace.parameters().len(), "parameter", "parameters"),
        output::count(namespace.services().len(), "service", "services"),
        output::count(namespace.aliases().len(), "alias", "aliases"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str, strict: bool) -> (anyhow::Result<()>, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("app.ctn");
        std::fs::write(&file, source).expect("write");
        let mut out = Vec::new();
        let result = execute(&CheckArgs { file, strict }, &Loader::new(), &mut out);
        (result, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn clean_file_reports_counts() {
        let (result, out) = run(":a: 1\n@x: App\\X(:a)\n@y: @x", false);
        assert!(result.is_ok());
        assert!(out.contains("(1 parameter, 1 service, 1 alias)"), "got: {out}");
    }

    #[test]
    fn unresolved_references_are_listed() {
        let (result, out) = run("@x: App\\X(@db, :dsn)", false);
        assert!(result.is_ok());
        assert!(out.contains("@x -> undefined service @db"), "got: {out}");
        assert!(out.contains("@x -> undefined parameter :dsn"), "got: {out}");
    }

    #[test]
    fn strict_mode_fails_on_unresolved() {
        let (result, _) = run("@x: App\\X(@db)", true);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 unresolved reference"), "got: {err}");
    }

    #[test]
    fn repeated_reference_is_listed_once() {
        let (result, out) = run("@x: App\\X(:a, :b)\n  - m(:a)", true);
        assert_eq!(out.matches("undefined parameter :a").count(), 1, "got: {out}");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("has 2 unresolved references"), "got: {err}");
    }

    #[test]
    fn cycle_fails() {
        let (result, _) = run("@a: App\\A(@b)\n@b: App\\B(@a)", false);
        assert!(result.is_err());
    }

    #[test]
    fn compile_error_names_the_file() {
        let (result, _) = run(":a: 1\n:a: 2", false);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to compile"), "got: {err}");
    }
}
