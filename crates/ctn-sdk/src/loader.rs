//! Compiles ctn files together with the directories they import from.

use std::path::{Path, PathBuf};

use ctn_common::config::CtnConfig;
use ctn_common::error::Result;
use ctn_compiler::Namespace;

/// Builder for compiling a root ctn file into a [`Namespace`].
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: CtnConfig,
    import_dirs: Vec<(PathBuf, String)>,
}

impl Loader {
    /// Creates a loader with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compiler configuration.
    #[must_use]
    pub fn config(mut self, config: CtnConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a directory whose files are importable by relative name.
    #[must_use]
    pub fn import_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.import_dir_prefixed(dir, "")
    }

    /// Adds a directory whose files are importable as `{prefix}{relative name}`.
    #[must_use]
    pub fn import_dir_prefixed(
        mut self,
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        self.import_dirs.push((dir.into(), prefix.into()));
        self
    }

    /// Compiles the file at `path`.
    ///
    /// The file's own directory is registered first, so sibling files can
    /// be imported by name; explicitly added directories take precedence
    /// over it for names present in both.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be scanned or compilation
    /// of the file or one of its imports fails.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Namespace> {
        let path = path.as_ref();
        let mut namespace = Namespace::with_config(self.config.clone());
        if let Some(parent) = path.parent().filter(|p| p.is_dir()) {
            let _ = namespace.import_directory(parent, "")?;
        }
        for (dir, prefix) in &self.import_dirs {
            let _ = namespace.import_directory(dir, prefix)?;
        }
        namespace.parse_file(path)?;
        tracing::info!(
            path = %path.display(),
            parameters = namespace.parameters().len(),
            services = namespace.services().len(),
            aliases = namespace.aliases().len(),
            "loaded ctn file"
        );
        Ok(namespace)
    }

    /// Compiles in-memory source text with the configured import directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be scanned or compilation fails.
    pub fn load_str(&self, code: &str) -> Result<Namespace> {
        let mut namespace = Namespace::with_config(self.config.clone());
        for (dir, prefix) in &self.import_dirs {
            let _ = namespace.import_directory(dir, prefix)?;
        }
        namespace.parse(code)?;
        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use ctn_common::error::CtnError;
    use ctn_common::types::Value;

    use super::*;

    #[test]
    fn sibling_files_are_importable() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("params.ctn"), ":env: 'prod'").expect("write");
        std::fs::write(dir.path().join("app.ctn"), "import params\n@app: App\\App(:env)")
            .expect("write");

        let ns = Loader::new()
            .load(dir.path().join("app.ctn"))
            .expect("should load");
        assert_eq!(ns.parameter("env"), Some(&Value::from("prod")));
        assert!(ns.service("app").is_some());
    }

    #[test]
    fn prefixed_directories_namespace_imports() {
        let vendor = tempfile::tempdir().expect("tempdir");
        std::fs::write(vendor.path().join("log.ctn"), "@logger: Vendor\\Log").expect("write");

        let ns = Loader::new()
            .import_dir_prefixed(vendor.path(), "vendor/")
            .load_str("import vendor/log\n@log: @logger")
            .expect("should load");
        assert_eq!(ns.alias("log"), Some("logger"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Loader::new()
            .load("/nonexistent/ctn/app.ctn")
            .unwrap_err();
        assert!(matches!(err, CtnError::Io { .. }));
    }
}
