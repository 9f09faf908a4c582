//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("module root '{root}' does not occur in path '{path}'")]
    RootNotFound { path: String, root: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown target '{0}'")]
    UnknownTarget(String),
    #[error("invalid variable name '{0}': expected a JavaScript identifier")]
    InvalidVarName(String),
    #[error("definition token must not be empty")]
    EmptyDefinitionToken,
    #[error("compress targets requested but no [compress] section is configured")]
    MissingCompressSection,
    #[error("[compress] command is empty")]
    EmptyCompressCommand,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("target '{0}' has no dest path")]
    MissingDestination(String),
    #[error("cannot name module {file}")]
    Identifier {
        file: PathBuf,
        #[source]
        source: NormalizeError,
    },
}
