//! `ctn plan`: Display the order in which services would be instantiated.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ctn_compiler::graph::ServiceGraph;
use ctn_sdk::loader::Loader;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the ctn file.
    #[arg(default_value = "app.ctn")]
    pub file: PathBuf,
}

/// Executes the `plan` command.
///
/// Compiles the file, builds the dependency graph, resolves a
/// topological order and displays each service with its construction.
///
/// # Errors
///
/// Returns an error if compilation or graph resolution fails.
pub fn execute(args: &PlanArgs, loader: &Loader, out: &mut dyn Write) -> anyhow::Result<()> {
    let namespace = loader
        .load(&args.file)
        .with_context(|| format!("failed to compile {}", args.file.display()))?;
    let graph = ServiceGraph::from_namespace(&namespace);
    let order = graph.resolve_order()?;

    output::heading(out, &format!("Instantiation Plan for: {}", args.file.display()))?;
    for name in &order {
        if let Some(definition) = namespace.service(name) {
            writeln!(
                out,
                "  + {name}: {}{}",
                definition.class(),
                output::format_arguments(definition.arguments())
            )?;
            for (method, arguments) in definition.calls() {
                writeln!(out, "      - {method}{}", output::format_arguments(arguments))?;
            }
        } else if let Some(target) = namespace.alias(name) {
            writeln!(out, "  ~ {name} -> {target}")?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {} and {} in order.",
        output::count(namespace.services().len(), "service", "services"),
        output::count(namespace.aliases().len(), "alias", "aliases"),
    )?;

    if !graph.missing().is_empty() {
        writeln!(out)?;
        writeln!(out, "  Expected from the host:")?;
        for (dependent, dependency) in graph.missing() {
            writeln!(out, "    {dependency} (needed by {dependent})")?;
        }
    }
    Ok(())
}
