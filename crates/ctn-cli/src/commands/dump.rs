//! `ctn dump`: Print the compiled namespace as JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ctn_sdk::loader::Loader;

/// Arguments for the `dump` command.
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Path to the ctn file.
    #[arg(default_value = "app.ctn")]
    pub file: PathBuf,

    /// Print on a single line instead of indented.
    #[arg(long)]
    pub compact: bool,
}

/// Executes the `dump` command.
///
/// # Errors
///
/// Returns an error if compilation or serialization fails.
pub fn execute(args: &DumpArgs, loader: &Loader, out: &mut dyn Write) -> anyhow::Result<()> {
    let namespace = loader
        .load(&args.file)
        .with_context(|| format!("failed to compile {}", args.file.display()))?;
    let snapshot = namespace.snapshot();
    let json = if args.compact {
        serde_json::to_string(&snapshot)?
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    writeln!(out, "{json}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_prints_snapshot_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("app.ctn");
        std::fs::write(&file, ":name: 'Edgar Wasser'\n@log: Acme\\Log(:name)").expect("write");

        let mut out = Vec::new();
        execute(
            &DumpArgs {
                file,
                compact: true,
            },
            &Loader::new(),
            &mut out,
        )
        .expect("should dump");
        let json: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
        assert_eq!(json["parameters"]["name"], "Edgar Wasser");
        assert_eq!(json["services"]["log"]["class"], "Acme\\Log");
        assert_eq!(json["services"]["log"]["shared"], true);
    }
}
