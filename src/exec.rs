//! Observable wrapper around external commands and filesystem calls.
//!
//! Every call goes through [`Shell::run`], which hands a [`ShellCommand`] to
//! an [`Executor`] and then emits an [`ExecEvent`] to the optional observer.
//! Nonzero codes are not interpreted here: [`Shell::exec`] is the strict form
//! used where a failure must abort, [`Shell::run`] leaves the decision to the
//! caller.
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use serde::Serialize;

use crate::error::GitemplateError;

/// A single operation the executor knows how to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `test -e <path>`
    TestExists(PathBuf),
    /// `test -d <path>`
    TestIsDir(PathBuf),
    /// `test -f <path>`
    TestIsFile(PathBuf),
    /// List `root` and all of its descendants, NUL-separated.
    ///
    /// Names that are not valid UTF-8 are listed lossily and will not
    /// resolve back to the file on disk.
    Find(PathBuf),
    /// Run a command line through `sh -c`, optionally inside `cwd`.
    Exec {
        /// Shell command line.
        command: String,
        /// Working directory for the command.
        cwd: Option<PathBuf>,
    },
    /// `mv <from> <to>`
    Move {
        /// Current path.
        from: PathBuf,
        /// New path.
        to: PathBuf,
    },
    /// `rm -f <path>` or `rm -rf <path>`
    Remove {
        /// Path to delete.
        path: PathBuf,
        /// Delete directories and their contents.
        recursive: bool,
    },
}

impl ShellCommand {
    /// Shorthand for an [`Exec`](Self::Exec) inside `cwd`.
    #[must_use]
    pub fn exec_in(cwd: &Path, command: impl Into<String>) -> Self {
        Self::Exec {
            command: command.into(),
            cwd: Some(cwd.to_path_buf()),
        }
    }

    /// Name of the shell method this command corresponds to.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::TestExists(_) | Self::TestIsDir(_) | Self::TestIsFile(_) => "test",
            Self::Find(_) => "find",
            Self::Exec { .. } => "exec",
            Self::Move { .. } => "mv",
            Self::Remove { .. } => "rm",
        }
    }

    /// Arguments as they would appear on the equivalent shell call.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        let show = |p: &Path| p.display().to_string();
        match self {
            Self::TestExists(p) => vec!["-e".to_string(), show(p)],
            Self::TestIsDir(p) => vec!["-d".to_string(), show(p)],
            Self::TestIsFile(p) => vec!["-f".to_string(), show(p)],
            Self::Find(root) => vec![show(root)],
            Self::Exec { command, .. } => vec![command.clone()],
            Self::Move { from, to } => vec![show(from), show(to)],
            Self::Remove { path, recursive } => {
                let flag = if *recursive { "-rf" } else { "-f" };
                vec![flag.to_string(), show(path)]
            }
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec { command, .. } => f.write_str(command),
            _ => write!(f, "{} {}", self.method(), self.arguments().join(" ")),
        }
    }
}

/// Uniform result of any [`ShellCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Exit status; `0` means success.
    pub code: i32,
    /// Captured output (stdout and stderr merged).
    pub output: String,
}

impl CommandResult {
    /// A successful result carrying `output`.
    #[must_use]
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            code: 0,
            output: output.into(),
        }
    }

    /// A failed result with the given status and diagnostic text.
    #[must_use]
    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
        }
    }

    /// Status `0` for true, `1` for false, as `test` reports it.
    #[must_use]
    pub fn from_test(value: bool) -> Self {
        Self {
            code: i32::from(!value),
            output: String::new(),
        }
    }

    /// Whether the command exited with status `0`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Emitted once per [`Shell::run`] call, after the command has returned.
#[derive(Debug, Clone, Serialize)]
pub struct ExecEvent {
    /// Shell method name (`exec`, `test`, `find`, `mv`, `rm`).
    pub method: &'static str,
    /// Arguments in shell order.
    pub arguments: Vec<String>,
    /// What the command returned.
    pub result: CommandResult,
}

/// Callback that receives every [`ExecEvent`].
pub type Observer = Arc<dyn Fn(&ExecEvent) + Send + Sync>;

/// Backend that actually performs a [`ShellCommand`].
///
/// Implement this trait to swap in a mock during unit tests. The production
/// implementation is [`SystemExecutor`].
pub trait Executor: Send + Sync + fmt::Debug {
    /// Perform `command` and report its status and output.
    ///
    /// Must not panic or return early on failure: problems are reported
    /// through a nonzero [`CommandResult::code`].
    fn execute(&self, command: &ShellCommand) -> CommandResult;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by `sh`, [`std::fs`] and `walkdir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

/// Exit status used when a process cannot be spawned at all.
const SPAWN_FAILURE_CODE: i32 = 127;

impl SystemExecutor {
    fn exec(command: &str, cwd: Option<&Path>) -> CommandResult {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).stdin(Stdio::null());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        match cmd.output() {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).to_string();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                CommandResult {
                    code: output.status.code().unwrap_or(-1),
                    output: text,
                }
            }
            Err(e) => CommandResult::failure(
                SPAWN_FAILURE_CODE,
                format!("failed to execute `{command}`: {e}"),
            ),
        }
    }

    fn find(root: &Path) -> CommandResult {
        let mut paths = Vec::new();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) => paths.push(entry.path().to_string_lossy().into_owned()),
                Err(e) => return CommandResult::failure(1, format!("find: {e}")),
            }
        }
        CommandResult::ok(paths.join("\0"))
    }

    fn remove(path: &Path, recursive: bool) -> CommandResult {
        let Ok(meta) = std::fs::symlink_metadata(path) else {
            return CommandResult::ok("");
        };
        let removed = if meta.is_dir() {
            if recursive {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_dir(path)
            }
        } else {
            std::fs::remove_file(path)
        };
        removed.map_or_else(
            |e| CommandResult::failure(1, format!("rm: {}: {e}", path.display())),
            |()| CommandResult::ok(""),
        )
    }
}

impl Executor for SystemExecutor {
    fn execute(&self, command: &ShellCommand) -> CommandResult {
        match command {
            ShellCommand::TestExists(p) => {
                CommandResult::from_test(std::fs::symlink_metadata(p).is_ok())
            }
            ShellCommand::TestIsDir(p) => CommandResult::from_test(p.is_dir()),
            ShellCommand::TestIsFile(p) => CommandResult::from_test(p.is_file()),
            ShellCommand::Find(root) => Self::find(root),
            ShellCommand::Exec { command, cwd } => Self::exec(command, cwd.as_deref()),
            ShellCommand::Move { from, to } => std::fs::rename(from, to).map_or_else(
                |e| {
                    CommandResult::failure(
                        1,
                        format!("mv: {} -> {}: {e}", from.display(), to.display()),
                    )
                },
                |()| CommandResult::ok(""),
            ),
            ShellCommand::Remove { path, recursive } => Self::remove(path, *recursive),
        }
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Observable front end over an [`Executor`].
#[derive(Clone)]
pub struct Shell {
    executor: Arc<dyn Executor>,
    observer: Option<Observer>,
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("executor", &self.executor)
            .field("observer", &self.observer.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Shell {
    /// Wrap `executor` with no observer attached.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            observer: None,
        }
    }

    /// Shell backed by the real system.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemExecutor))
    }

    /// Attach a callback that receives every [`ExecEvent`].
    #[must_use]
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Perform `command` and emit an event, whatever the outcome.
    pub fn run(&self, command: &ShellCommand) -> CommandResult {
        let result = self.executor.execute(command);
        if let Some(observer) = &self.observer {
            observer(&ExecEvent {
                method: command.method(),
                arguments: command.arguments(),
                result: result.clone(),
            });
        }
        result
    }

    /// Perform `command`, turning a nonzero code into an error.
    ///
    /// # Errors
    ///
    /// Returns [`GitemplateError::CommandFailed`] if the command exits nonzero.
    pub fn run_checked(&self, command: &ShellCommand) -> Result<CommandResult, GitemplateError> {
        let result = self.run(command);
        if result.is_success() {
            Ok(result)
        } else {
            Err(GitemplateError::CommandFailed {
                command: command.to_string(),
                code: result.code,
                output: result.output,
            })
        }
    }

    /// Run `command` through the shell inside `cwd`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`GitemplateError::CommandFailed`] if the command exits nonzero.
    pub fn exec(&self, cwd: Option<&Path>, command: &str) -> Result<String, GitemplateError> {
        let cmd = ShellCommand::Exec {
            command: command.to_string(),
            cwd: cwd.map(Path::to_path_buf),
        };
        self.run_checked(&cmd).map(|r| r.output)
    }

    /// `test -e`
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.run(&ShellCommand::TestExists(path.to_path_buf()))
            .is_success()
    }

    /// `test -d`
    #[must_use]
    pub fn is_dir(&self, path: &Path) -> bool {
        self.run(&ShellCommand::TestIsDir(path.to_path_buf()))
            .is_success()
    }

    /// `test -f`
    #[must_use]
    pub fn is_file(&self, path: &Path) -> bool {
        self.run(&ShellCommand::TestIsFile(path.to_path_buf()))
            .is_success()
    }

    /// Every path under `root`, `root` included.
    ///
    /// Names may contain newlines; only NUL separates entries.
    ///
    /// # Errors
    ///
    /// Returns [`GitemplateError::CommandFailed`] if the tree cannot be walked.
    pub fn find(&self, root: &Path) -> Result<Vec<PathBuf>, GitemplateError> {
        let result = self.run_checked(&ShellCommand::Find(root.to_path_buf()))?;
        Ok(result
            .output
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// `mv`, leaving the status for the caller to judge.
    pub fn mv(&self, from: &Path, to: &Path) -> CommandResult {
        self.run(&ShellCommand::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
    }

    /// `rm -f` / `rm -rf`, strictly.
    ///
    /// # Errors
    ///
    /// Returns [`GitemplateError::CommandFailed`] if the path cannot be removed.
    pub fn rm(&self, path: &Path, recursive: bool) -> Result<(), GitemplateError> {
        self.run_checked(&ShellCommand::Remove {
            path: path.to_path_buf(),
            recursive,
        })
        .map(|_| ())
    }

    /// Check if a program is available on `PATH`.
    #[must_use]
    pub fn which(&self, program: &str) -> bool {
        self.executor.which(program)
    }
}

/// Quote `s` for use as a single POSIX shell word.
///
/// Strings made only of unambiguous characters are returned unchanged.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
