//! The fixed sequence of steps that turns a template into a new project.
//!
//! ```text
//! preflight → clone → content → paths → post-replace → init → origin
//! ```
//!
//! Steps run strictly in order. The first failing step is recorded as
//! [`StepStatus::Failed`] and aborts the run; later steps are not attempted.
use crate::config::Config;
use crate::error::{GitemplateError, PreconditionError};
use crate::exec::Shell;
use crate::logging::{Log, StepStatus};
use crate::repo::{self, PostReplace};
use crate::template::{self, RenameReport};

/// Programs the pipeline shells out to.
pub const REQUIRED_TOOLS: [&str; 4] = ["git", "perl", "find", "sh"];

/// Step names, in execution order, as they appear in the summary.
pub mod steps {
    /// Clone the template and capture its origin metadata.
    pub const CLONE: &str = "Clone template";
    /// Replace tokens in file contents.
    pub const CONTENT: &str = "Replace file contents";
    /// Replace tokens in file and directory names.
    pub const PATHS: &str = "Rename paths";
    /// Run the template's post-replace hook.
    pub const POST_REPLACE: &str = "Run post-replace script";
    /// Re-initialise git and commit.
    pub const INIT: &str = "Initialize repository";
    /// Add the GitHub remote.
    pub const ORIGIN: &str = "Set GitHub origin";

    /// Every step name in execution order.
    pub const ALL: [&str; 6] = [CLONE, CONTENT, PATHS, POST_REPLACE, INIT, ORIGIN];
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Result of the pathname pass.
    pub renames: RenameReport,
    /// Whether a post-replace hook ran.
    pub post_replace: PostReplace,
    /// Short HEAD commit of the template.
    pub origin_sha: String,
    /// Fetch URL of the template.
    pub origin_url: String,
}

/// Check that every program in [`REQUIRED_TOOLS`] is on `PATH`.
///
/// # Errors
///
/// Returns [`PreconditionError::MissingTool`] naming the first missing program.
pub fn preflight(shell: &Shell) -> Result<(), GitemplateError> {
    REQUIRED_TOOLS
        .iter()
        .find(|tool| !shell.which(tool))
        .map_or(Ok(()), |tool| {
            Err(PreconditionError::MissingTool((*tool).to_string()).into())
        })
}

/// Record `result` under `name`, passing it through unchanged.
fn record<T>(
    log: &dyn Log,
    name: &str,
    result: Result<T, GitemplateError>,
) -> Result<T, GitemplateError> {
    match &result {
        Ok(_) => log.record_step(name, StepStatus::Ok, None),
        Err(e) => log.record_step(name, StepStatus::Failed, Some(&e.to_string())),
    }
    result
}

/// Run every step against `config`.
///
/// `config` is updated in place with the origin metadata captured during the
/// clone, so later steps (and the caller) see it.
///
/// # Errors
///
/// Returns the error of the first step that fails.
pub fn run(config: &mut Config, shell: &Shell, log: &dyn Log) -> Result<Outcome, GitemplateError> {
    preflight(shell)?;

    log.stage("Cloning template");
    record(log, steps::CLONE, repo::clone_repo(config, shell, log))?;
    log.info(&format!(
        "template {} at {}",
        config.origin_url, config.origin_sha
    ));

    log.stage("Replacing macros");
    record(
        log,
        steps::CONTENT,
        template::replace_content(config, shell, log),
    )?;
    let renames = record(log, steps::PATHS, template::replace_paths(config, shell, log))?;
    if !renames.failed.is_empty() {
        log.warn(&format!(
            "{} path(s) could not be renamed",
            renames.failed.len()
        ));
    }

    let post_replace = record(
        log,
        steps::POST_REPLACE,
        repo::run_post_replace(config, shell, log),
    )?;

    log.stage("Finalizing repository");
    if config.no_init {
        log.record_step(steps::INIT, StepStatus::Skipped, Some("--no-init"));
        log.record_step(steps::ORIGIN, StepStatus::Skipped, Some("--no-init"));
    } else {
        record(log, steps::INIT, repo::init_repo(config, shell, log))?;
        if config.repo.is_some() {
            record(log, steps::ORIGIN, repo::set_github_origin(config, shell, log))?;
        } else {
            log.record_step(steps::ORIGIN, StepStatus::Skipped, Some("no --repo"));
        }
    }

    Ok(Outcome {
        renames,
        post_replace,
        origin_sha: config.origin_sha.clone(),
        origin_url: config.origin_url.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::CommandResult;
    use crate::exec::test_helpers::MockExecutor;
    use crate::logging::test_helpers::RecordingLog;
    use std::path::Path;
    use std::sync::Arc;

    const SHA: &str = "7858ada150cf927d6d8a6b3a7f8b63d9917d4185";
    const REMOTE: &str = "  Fetch URL: git@github.com:user/tpl.git\n";

    fn config() -> Config {
        Config::new("my-new-proj", "/src", Path::new("/dst"))
            .unwrap()
            .with_year(1970)
    }

    /// Responses for clone, then `n` successful commands.
    fn responses(n: usize) -> Vec<CommandResult> {
        let mut r = vec![
            CommandResult::ok(""),
            CommandResult::ok(SHA),
            CommandResult::ok(REMOTE),
        ];
        r.extend(std::iter::repeat_n(CommandResult::ok(""), n));
        r
    }

    fn statuses(log: &RecordingLog) -> Vec<(String, StepStatus)> {
        log.steps()
            .into_iter()
            .map(|s| (s.name, s.status))
            .collect()
    }

    #[test]
    fn preflight_reports_missing_tool() {
        let shell = Shell::new(Arc::new(MockExecutor::ok_times(0).with_which(false)));
        let err = preflight(&shell).unwrap_err();
        assert!(matches!(
            err,
            GitemplateError::Precondition(PreconditionError::MissingTool(ref t)) if t == "git"
        ));
    }

    #[test]
    fn full_run_records_every_step() {
        // content: name, repo, year, originSha, originUrl; init: 3; origin: 1
        let mock = Arc::new(MockExecutor::with_responses(responses(9)));
        let log = RecordingLog::default();
        let mut config = config().with_repo("user/proj").unwrap();

        let outcome = run(&mut config, &Shell::new(mock.clone()), &log).unwrap();

        assert_eq!(outcome.origin_sha, "7858ada150");
        assert_eq!(outcome.origin_url, "git@github.com:user/tpl.git");
        assert_eq!(outcome.post_replace, PostReplace::NotPresent);
        assert_eq!(
            statuses(&log),
            steps::ALL
                .iter()
                .map(|n| ((*n).to_string(), StepStatus::Ok))
                .collect::<Vec<_>>()
        );
        assert_eq!(
            mock.exec_commands().last().map(String::as_str),
            Some("git remote add origin git@github.com:user/proj.git")
        );
    }

    #[test]
    fn existing_destination_fails_before_anything_runs() {
        let mock = Arc::new(MockExecutor::with_responses(responses(9)).with_existing("/dst"));
        let log = RecordingLog::default();
        let err = run(&mut config(), &Shell::new(mock.clone()), &log).unwrap_err();

        assert!(matches!(err, GitemplateError::Precondition(_)));
        assert!(mock.exec_commands().is_empty());
        assert_eq!(
            statuses(&log),
            vec![(steps::CLONE.to_string(), StepStatus::Failed)]
        );
    }

    #[test]
    fn content_failure_stops_later_steps() {
        let mut r = responses(0);
        r.push(CommandResult::failure(2, "perl: died"));
        let mock = Arc::new(MockExecutor::with_responses(r));
        let log = RecordingLog::default();
        let err = run(&mut config(), &Shell::new(mock.clone()), &log).unwrap_err();

        assert!(matches!(err, GitemplateError::CommandFailed { code: 2, .. }));
        assert_eq!(
            statuses(&log),
            vec![
                (steps::CLONE.to_string(), StepStatus::Ok),
                (steps::CONTENT.to_string(), StepStatus::Failed),
            ]
        );
        assert!(
            !mock.exec_commands().iter().any(|c| c.starts_with("git init")),
            "init must not run after a failed step"
        );
    }

    #[test]
    fn no_init_skips_git_steps() {
        let mock = Arc::new(MockExecutor::with_responses(responses(4)));
        let log = RecordingLog::default();
        let mut config = config().with_no_init(true);
        run(&mut config, &Shell::new(mock.clone()), &log).unwrap();

        let steps = log.steps();
        assert_eq!(steps[4].status, StepStatus::Skipped);
        assert_eq!(steps[5].status, StepStatus::Skipped);
        assert!(
            !mock
                .exec_commands()
                .iter()
                .any(|c| c.starts_with("git init") || c.starts_with("git remote add")),
        );
    }

    #[test]
    fn origin_skipped_without_repo() {
        let mock = Arc::new(MockExecutor::with_responses(responses(7)));
        let log = RecordingLog::default();
        run(&mut config(), &Shell::new(mock.clone()), &log).unwrap();

        let steps = log.steps();
        assert_eq!(steps[4].status, StepStatus::Ok);
        assert_eq!(steps[5].name, steps::ORIGIN);
        assert_eq!(steps[5].status, StepStatus::Skipped);
        assert_eq!(
            mock.exec_commands().last().map(String::as_str),
            Some("git commit -m \"Initial commit from gitemplate: git@github.com:user/tpl.git#7858ada150\"")
        );
    }
}
