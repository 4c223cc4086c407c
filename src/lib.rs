//! Project scaffolding from git template repositories.
//!
//! Clones a template repository, replaces `gitemplate_<key>` macros in file
//! contents and path names, runs the template's optional post-replace hook,
//! and re-initialises git history with an optional GitHub remote.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: validated run configuration and custom variables
//! - **[`exec`]**: observable wrapper around external commands
//! - **[`template`]**: content and pathname macro substitution
//! - **[`repo`]**: clone, origin metadata and git re-initialisation
//! - **[`pipeline`]**: the ordered step sequence
//! - **[`commands`]**: CLI-facing orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

/// Command-line argument definitions.
pub mod cli;
/// Top-level command orchestration.
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod repo;
pub mod template;
