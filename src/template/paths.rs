use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use regex::{NoExpand, Regex};

use super::{Binding, path_bindings};
use crate::config::Config;
use crate::error::GitemplateError;
use crate::exec::Shell;
use crate::logging::Log;

/// What to do when a rename fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenamePolicy {
    /// Warn, record the failure in the [`RenameReport`] and carry on.
    #[default]
    Lenient,
    /// Abort the pass with [`GitemplateError::CommandFailed`].
    Strict,
}

/// A single path rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    /// Original path.
    pub from: PathBuf,
    /// New path.
    pub to: PathBuf,
}

/// Outcome of a pathname pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// Renames that succeeded, in the order they were issued.
    pub renamed: Vec<Rename>,
    /// Renames that failed under [`RenamePolicy::Lenient`], with the error output.
    pub failed: Vec<(Rename, String)>,
}

/// Rename every file and directory under `config.dst` whose name contains a token.
///
/// For each binding (`name`, then custom keys in mapping order) all matching
/// directories are renamed first, deepest first, so that no pending path is
/// invalidated by an earlier rename. The tree is then enumerated again and
/// matching files are renamed. Only the final path component is matched, case
/// insensitively, and every occurrence in it is replaced with the literal value.
///
/// # Errors
///
/// Returns an error if the tree cannot be enumerated, or if a rename fails
/// under [`RenamePolicy::Strict`].
pub fn replace_paths(
    config: &Config,
    shell: &Shell,
    log: &dyn Log,
) -> Result<RenameReport, GitemplateError> {
    let mut report = RenameReport::default();
    for binding in path_bindings(config) {
        let pattern = token_pattern(&binding)?;

        let mut dirs = matching_paths(shell, &config.dst, &pattern, true)?;
        dirs.sort_by_key(|p| Reverse(p.components().count()));
        for dir in dirs {
            rename(shell, log, config.rename_policy, &pattern, &binding, &dir, &mut report)?;
        }

        let files = matching_paths(shell, &config.dst, &pattern, false)?;
        for file in files {
            rename(shell, log, config.rename_policy, &pattern, &binding, &file, &mut report)?;
        }
    }
    Ok(report)
}

fn token_pattern(binding: &Binding) -> Result<Regex, GitemplateError> {
    Regex::new(&format!("(?i){}", regex::escape(&binding.token())))
        .map_err(|e| GitemplateError::Internal(format!("bad token pattern: {e}")))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn matching_paths(
    shell: &Shell,
    root: &Path,
    pattern: &Regex,
    want_dirs: bool,
) -> Result<Vec<PathBuf>, GitemplateError> {
    Ok(shell
        .find(root)?
        .into_iter()
        .filter(|p| p != root)
        .filter(|p| file_name(p).is_some_and(|n| pattern.is_match(n)))
        .filter(|p| {
            if want_dirs {
                shell.is_dir(p)
            } else {
                shell.is_file(p)
            }
        })
        .collect())
}

fn rename(
    shell: &Shell,
    log: &dyn Log,
    policy: RenamePolicy,
    pattern: &Regex,
    binding: &Binding,
    from: &Path,
    report: &mut RenameReport,
) -> Result<(), GitemplateError> {
    let Some(name) = file_name(from) else {
        return Ok(());
    };
    let replaced = pattern.replace_all(name, NoExpand(binding.value.as_str()));
    let to = from.with_file_name(replaced.as_ref());
    let result = shell.mv(from, &to);
    let entry = Rename {
        from: from.to_path_buf(),
        to,
    };

    if result.is_success() {
        log.debug(&format!(
            "renamed {} -> {}",
            entry.from.display(),
            entry.to.display()
        ));
        report.renamed.push(entry);
        return Ok(());
    }

    match policy {
        RenamePolicy::Strict => Err(GitemplateError::CommandFailed {
            command: format!("mv {} {}", entry.from.display(), entry.to.display()),
            code: result.code,
            output: result.output,
        }),
        RenamePolicy::Lenient => {
            log.warn(&format!(
                "could not rename {}: {}",
                entry.from.display(),
                result.output.trim()
            ));
            report.failed.push((entry, result.output));
            Ok(())
        }
    }
}
