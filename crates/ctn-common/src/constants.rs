//! Language-wide constants.

/// Reserved service name that always resolves to the container itself.
pub const SELF_SERVICE: &str = "container";

/// Sigil marking a service (dependency) reference.
pub const DEPENDENCY_SIGIL: char = '@';

/// Sigil marking a parameter reference.
pub const PARAMETER_SIGIL: char = ':';

/// File extension for ctn source files.
pub const CTN_EXTENSION: &str = ".ctn";

/// Default bound on nested `import` statements.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 32;

/// Binary name for the CLI.
pub const BIN_NAME: &str = "ctn";
