//! Sources that satisfy `import` statements.
//!
//! The compiler never reads files on its own initiative: an import name is
//! looked up through a [`CodeSource`], and the built-in [`ImportTable`] maps
//! names either to files on disk or to source text held in memory.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ctn_common::error::{CtnError, Result};

/// Supplies source text by import name.
pub trait CodeSource: fmt::Debug {
    /// Whether `name` can be imported from this source.
    fn has(&self, name: &str) -> bool;

    /// Source text for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or its text cannot be read.
    fn code(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportEntry {
    Path(PathBuf),
    Inline(String),
}

/// Import name → file path or inline source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    entries: BTreeMap<String, ImportEntry>,
}

impl ImportTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Maps `name` to a file read lazily on import.
    pub fn insert_path(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let _ = self
            .entries
            .insert(name.into(), ImportEntry::Path(path.into()));
    }

    /// Maps `name` to source text held in memory.
    pub fn insert_code(&mut self, name: impl Into<String>, code: impl Into<String>) {
        let _ = self
            .entries
            .insert(name.into(), ImportEntry::Inline(code.into()));
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registered file paths by name; inline entries are skipped.
    #[must_use]
    pub fn paths(&self) -> BTreeMap<&str, &Path> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                ImportEntry::Path(path) => Some((name.as_str(), path.as_path())),
                ImportEntry::Inline(_) => None,
            })
            .collect()
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every file under `dir` ending in `extension`.
    ///
    /// A file `dir/app/log.ctn` is registered as `{prefix}app/log`: the
    /// path relative to `dir` with `/` separators and the extension
    /// removed. Returns how many files were registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read.
    pub fn scan_directory(&mut self, dir: &Path, prefix: &str, extension: &str) -> Result<usize> {
        let mut files = Vec::new();
        collect_files(dir, extension, &mut files)?;
        files.sort();
        let count = files.len();
        for file in files {
            let Ok(relative) = file.strip_prefix(dir) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let joined = relative.join("/");
            let stem = joined.strip_suffix(extension).unwrap_or(&joined);
            let name = format!("{prefix}{stem}");
            tracing::debug!(name = %name, path = %file.display(), "registered import");
            self.insert_path(name, file);
        }
        Ok(count)
    }
}

fn collect_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    let io_err = |source| CtnError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_files(&path, extension, files)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(extension) && n.len() > extension.len())
        {
            files.push(path);
        }
    }
    Ok(())
}

impl CodeSource for ImportTable {
    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn code(&self, name: &str) -> Result<String> {
        match self.entries.get(name) {
            Some(ImportEntry::Inline(code)) => Ok(code.clone()),
            Some(ImportEntry::Path(path)) => {
                std::fs::read_to_string(path).map_err(|e| CtnError::Io {
                    path: path.clone(),
                    source: e,
                })
            }
            None => Err(CtnError::NotFound {
                kind: "import",
                id: name.to_string(),
            }),
        }
    }
}
