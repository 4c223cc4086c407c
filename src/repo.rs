//! Repository lifecycle: clone, capture origin metadata, re-initialise.
//!
//! Every git invocation goes through [`Shell::exec`], so a nonzero exit from
//! any of them aborts the run with [`GitemplateError::CommandFailed`].
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{GitemplateError, PreconditionError};
use crate::exec::{Shell, shell_quote};
use crate::logging::Log;

/// Name of the optional hook script at the root of a template.
pub const POST_REPLACE_SCRIPT: &str = ".gitemplate.postreplace";

/// Number of characters of the HEAD commit kept as `originSha`.
pub const SHORT_SHA_LEN: usize = 10;

static FETCH_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Fetch\s+URL:\s*(\S+)").ok());

static UNSAFE_MESSAGE_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9@#:./ -]").ok());

/// Whether the post-replace hook was found and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostReplace {
    /// The template has no hook script.
    NotPresent,
    /// The hook ran successfully and was deleted.
    Ran,
}

/// Clone `config.src` into `config.dst` and record its origin metadata.
///
/// After cloning (and checking out `config.commit` when set), fills in
/// `config.origin_sha` and `config.origin_url`, then removes the cloned
/// `.git` directory.
///
/// # Errors
///
/// Returns [`PreconditionError::DestinationExists`] before running anything
/// if the destination already exists, [`GitemplateError::CommandFailed`] if
/// any git call or the `.git` removal fails, and
/// [`GitemplateError::Internal`] if the remote has no fetch URL.
pub fn clone_repo(
    config: &mut Config,
    shell: &Shell,
    log: &dyn Log,
) -> Result<(), GitemplateError> {
    let dst = config.dst.clone();
    if shell.exists(&dst) {
        return Err(PreconditionError::DestinationExists(dst).into());
    }

    log.info(&format!("cloning {} into {}", config.src, dst.display()));
    shell.exec(
        None,
        &format!(
            "git clone {} {}",
            shell_quote(&config.src),
            shell_quote(&dst.display().to_string())
        ),
    )?;

    if let Some(commit) = &config.commit {
        log.info(&format!("checking out {commit}"));
        shell.exec(Some(&dst), &format!("git checkout {}", shell_quote(commit)))?;
    }

    let head = shell.exec(Some(&dst), "git rev-parse HEAD")?;
    config.origin_sha = head.trim().chars().take(SHORT_SHA_LEN).collect();

    let remote = shell.exec(Some(&dst), "git remote show origin")?;
    config.origin_url = parse_fetch_url(&remote).ok_or_else(|| {
        GitemplateError::Internal(format!(
            "no fetch URL in `git remote show origin` output:\n{}",
            remote.trim()
        ))
    })?;
    log.debug(&format!(
        "origin {} at {}",
        config.origin_url, config.origin_sha
    ));

    shell.rm(&dst.join(".git"), true)
}

/// Extract the URL from the `Fetch URL:` line of `git remote show` output.
#[must_use]
pub fn parse_fetch_url(output: &str) -> Option<String> {
    FETCH_URL
        .as_ref()?
        .captures(output)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Message for the initial commit of a new project.
///
/// Characters outside a conservative set are replaced with `_` so the
/// message can be embedded in a double-quoted shell argument.
#[must_use]
pub fn commit_message(origin_url: &str, origin_sha: &str) -> String {
    let raw = format!("Initial commit from gitemplate: {origin_url}#{origin_sha}");
    match UNSAFE_MESSAGE_CHARS.as_ref() {
        Some(re) => re.replace_all(&raw, "_").into_owned(),
        None => raw,
    }
}

/// Start a fresh repository in `config.dst` and commit the whole tree.
///
/// # Errors
///
/// Returns [`GitemplateError::CommandFailed`] if `git init`, `git add` or
/// `git commit` fails.
pub fn init_repo(config: &Config, shell: &Shell, log: &dyn Log) -> Result<(), GitemplateError> {
    let dst = config.dst.as_path();
    let message = commit_message(&config.origin_url, &config.origin_sha);
    log.info(&format!("initialising repository in {}", dst.display()));
    shell.exec(Some(dst), "git init")?;
    shell.exec(Some(dst), "git add .")?;
    shell.exec(Some(dst), &format!("git commit -m \"{message}\""))?;
    Ok(())
}

/// SSH remote URL for an `owner/project` slug on GitHub.
#[must_use]
pub fn github_remote(repo: &str) -> String {
    format!("git@github.com:{repo}.git")
}

/// Point the new repository's `origin` at GitHub.
///
/// # Errors
///
/// Returns [`GitemplateError::Internal`] if no repo slug is configured and
/// [`GitemplateError::CommandFailed`] if `git remote add` fails.
pub fn set_github_origin(
    config: &Config,
    shell: &Shell,
    log: &dyn Log,
) -> Result<(), GitemplateError> {
    let repo = config
        .repo
        .as_deref()
        .ok_or_else(|| GitemplateError::Internal("no repo configured for origin".to_string()))?;
    let url = github_remote(repo);
    log.info(&format!("setting origin to {url}"));
    shell.exec(
        Some(&config.dst),
        &format!("git remote add origin {}", shell_quote(&url)),
    )?;
    Ok(())
}

/// Run the template's post-replace hook, if any, then delete it.
///
/// The script runs with the destination as its working directory.
///
/// # Errors
///
/// Returns [`GitemplateError::CommandFailed`] if the script exits nonzero
/// (the script is then left in place) or cannot be removed.
pub fn run_post_replace(
    config: &Config,
    shell: &Shell,
    log: &dyn Log,
) -> Result<PostReplace, GitemplateError> {
    let dst: &Path = &config.dst;
    let script = dst.join(POST_REPLACE_SCRIPT);
    if !shell.exists(&script) {
        log.debug(&format!("no {POST_REPLACE_SCRIPT} in template"));
        return Ok(PostReplace::NotPresent);
    }

    log.info(&format!("running {POST_REPLACE_SCRIPT}"));
    let output = shell.exec(Some(dst), &shell_quote(&script.display().to_string()))?;
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        log.debug(line);
    }
    shell.rm(&script, false)?;
    Ok(PostReplace::Ran)
}
