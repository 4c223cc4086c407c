//! Domain-specific error types for the scaffolding engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library functions return [`GitemplateError`] while the binary converts
//! it to [`anyhow::Error`] at the CLI boundary via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! GitemplateError
//! ├── CommandFailed              : an external command exited nonzero
//! ├── Precondition(PreconditionError): destination exists, tool missing
//! ├── Config(ConfigError)        : invalid CLI / JSON input
//! └── Internal(String)           : unexpected command output, broken invariants
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the scaffolding engine.
#[derive(Error, Debug)]
pub enum GitemplateError {
    /// An external command returned a nonzero status.
    #[error("command `{command}` failed (exit {code}): {output}")]
    CommandFailed {
        /// Rendered command line (or method and arguments for filesystem calls).
        command: String,
        /// Exit status reported by the executor.
        code: i32,
        /// Captured stdout and stderr.
        output: String,
    },

    /// A precondition checked before running a step did not hold.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The configuration supplied by the caller is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An internal invariant was violated (e.g. unparseable command output).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Conditions that must hold before a pipeline step may run.
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// The clone destination is already present on disk.
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// A program required by the pipeline is not on `PATH`.
    #[error("Required program '{0}' not found on PATH")]
    MissingTool(String),
}

/// Errors that arise from validating caller-supplied configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field is missing or blank.
    #[error("Missing required option: {0}")]
    MissingField(&'static str),

    /// The custom variables blob is not valid JSON.
    #[error("Invalid custom variables JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The custom variables JSON is valid but not an object.
    #[error("Custom variables must be a JSON object")]
    NotAnObject,

    /// A custom variable key cannot be used in a macro token.
    #[error("Invalid custom variable key '{0}': use letters, digits, '_' or '-'")]
    InvalidKey(String),

    /// A custom variable value is not a scalar.
    #[error("Invalid value for custom variable '{0}': expected string, number, boolean or null")]
    InvalidValue(String),

    /// The repository slug is not of the form `owner/project`.
    #[error("Invalid repo '{0}': expected <owner>/<project>")]
    InvalidRepo(String),

    /// A file referenced by the configuration could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Broad category of a failure, used to pick the message shown on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An external command failed; carries a status code and output.
    ExternalCommand,
    /// A typed engine error other than a command failure.
    Internal,
    /// Anything that did not originate from the engine.
    Unknown,
}

/// Classify an error that reached the CLI boundary.
#[must_use]
pub fn classify(err: &anyhow::Error) -> FailureKind {
    match err.downcast_ref::<GitemplateError>() {
        Some(GitemplateError::CommandFailed { .. }) => FailureKind::ExternalCommand,
        Some(_) => FailureKind::Internal,
        None => FailureKind::Unknown,
    }
}

/// Render the message printed before exiting with a failure status.
///
/// The wording depends on the [`FailureKind`] reported by [`classify`].
#[must_use]
pub fn describe_failure(err: &anyhow::Error) -> String {
    let engine = err.downcast_ref::<GitemplateError>();
    match (classify(err), engine) {
        (
            FailureKind::ExternalCommand,
            Some(GitemplateError::CommandFailed {
                command,
                code,
                output,
            }),
        ) => format!(
            "external command failed (exit {code}): {command}\n{}",
            output.trim_end()
        ),
        (FailureKind::Internal, Some(e)) => e.to_string(),
        _ => format!("fatal: {err:#}"),
    }
}
