//! Macro substitution over a cloned tree.
//!
//! Two passes run in order: [`replace_content`] rewrites file contents, then
//! [`replace_paths`] renames files and directories. Content substitution never
//! changes a path, so it is safe to run first; the pathname pass renames
//! directories before it looks at any file.
mod content;
mod escape;
mod paths;

pub use content::{content_command, replace_content};
pub use escape::escape_substitution;
pub use paths::{Rename, RenamePolicy, RenameReport, replace_paths};

use crate::config::Config;

/// Prefix shared by every macro token.
pub const TOKEN_PREFIX: &str = "gitemplate_";

/// Built-in keys in the order the content pass visits them.
pub const BUILTIN_KEYS: [&str; 6] = ["name", "desc", "repo", "year", "originSha", "originUrl"];

/// The literal token for `key`, e.g. `gitemplate_name`.
#[must_use]
pub fn token(key: &str) -> String {
    format!("{TOKEN_PREFIX}{key}")
}

/// A macro key paired with its current replacement value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Macro key without the token prefix.
    pub key: String,
    /// Replacement value.
    pub value: String,
}

impl Binding {
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// The literal token this binding replaces.
    #[must_use]
    pub fn token(&self) -> String {
        token(&self.key)
    }
}

/// Bindings for the content pass: built-ins, then custom keys, empty values dropped.
#[must_use]
pub fn content_bindings(config: &Config) -> Vec<Binding> {
    let builtins = BUILTIN_KEYS
        .iter()
        .filter_map(|key| config.builtin_value(key).map(|v| Binding::new(key, &v)));
    let custom = config.vars.iter().map(|(k, v)| Binding::new(k, v));
    builtins
        .chain(custom)
        .filter(|b| !b.value.is_empty())
        .collect()
}

/// Bindings for the pathname pass: `name`, then custom keys, empty values dropped.
#[must_use]
pub fn path_bindings(config: &Config) -> Vec<Binding> {
    std::iter::once(Binding::new("name", &config.name))
        .chain(config.vars.iter().map(|(k, v)| Binding::new(k, v)))
        .filter(|b| !b.value.is_empty())
        .collect()
}
