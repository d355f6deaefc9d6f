//! System-wide constants and default paths.

/// Application name used in CLI output and report headers.
pub const APP_NAME: &str = "Universum";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "universum";

/// Default project root, relative to the working directory.
pub const DEFAULT_PROJECT_ROOT: &str = "temp";

/// Separator between a namespace and an option destination in argument ids.
pub const NAMESPACE_SEPARATOR: char = '.';

/// Name of the repository state report written after sources are prepared.
pub const REPOSITORY_STATE_FILE: &str = "REPOSITORY_STATE.txt";

/// Environment variable holding the `tracing` filter directives.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";
