use std::path::Path;

use super::{Binding, content_bindings, escape_substitution};
use crate::config::Config;
use crate::error::GitemplateError;
use crate::exec::{Shell, shell_quote};
use crate::logging::Log;

/// The command that replaces `binding`'s token in every file under `dst`.
///
/// Matching is case-insensitive and global per line. Files are batched into
/// `perl` with `{} +`, so a failing `perl` makes `find` exit nonzero.
#[must_use]
pub fn content_command(dst: &Path, binding: &Binding) -> String {
    format!(
        "find {} -type f -exec perl -p -i -e 's/{}/{}/gi' {{}} +",
        shell_quote(&dst.display().to_string()),
        escape_substitution(&binding.token()),
        escape_substitution(&binding.value),
    )
}

/// Replace every macro token found in file contents under `config.dst`.
///
/// Issues one command per non-empty binding, built-ins first in their fixed
/// order and custom keys in mapping order.
///
/// # Errors
///
/// Returns the first failing command; remaining keys are not attempted.
pub fn replace_content(config: &Config, shell: &Shell, log: &dyn Log) -> Result<(), GitemplateError> {
    for binding in content_bindings(config) {
        log.debug(&format!("replacing {} in file contents", binding.token()));
        shell.exec(None, &content_command(&config.dst, &binding))?;
    }
    Ok(())
}
