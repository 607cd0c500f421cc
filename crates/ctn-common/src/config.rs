//! Compiler configuration model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CtnError, Result};

/// Which keywords the lexer accepts as boolean literals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanLiterals {
    /// Only `yes` and `no`.
    YesNo,
    /// Only `true` and `false`.
    TrueFalse,
    /// Both spellings.
    #[default]
    Both,
}

impl BooleanLiterals {
    /// Maps a bare word to a boolean if it is an accepted literal.
    #[must_use]
    pub fn decode(self, word: &str) -> Option<bool> {
        match (self, word) {
            (Self::YesNo | Self::Both, "yes") | (Self::TrueFalse | Self::Both, "true") => {
                Some(true)
            }
            (Self::YesNo | Self::Both, "no") | (Self::TrueFalse | Self::Both, "false") => {
                Some(false)
            }
            _ => None,
        }
    }
}

/// Root configuration for compiling ctn sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtnConfig {
    /// Extension recognised when scanning directories for sources.
    pub extension: String,
    /// Accepted boolean spellings.
    pub boolean_literals: BooleanLiterals,
    /// Maximum nesting of `import` statements.
    pub max_import_depth: usize,
}

impl CtnConfig {
    /// Loads a JSON configuration file; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CtnError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        if config.max_import_depth == 0 {
            return Err(CtnError::Config {
                message: "max_import_depth must be at least 1".into(),
            });
        }
        Ok(config)
    }
}

impl Default for CtnConfig {
    fn default() -> Self {
        Self {
            extension: crate::constants::CTN_EXTENSION.to_string(),
            boolean_literals: BooleanLiterals::default(),
            max_import_depth: crate::constants::DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}
