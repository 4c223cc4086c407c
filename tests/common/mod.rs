// Shared helpers for integration tests.
//
// Provides a scripted executor that answers git commands from a fixture
// template while performing real filesystem operations, plus a recording
// `Log` so each test can inspect the steps a run produced.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gitemplate::config::Config;
use gitemplate::exec::{CommandResult, Executor, Shell, ShellCommand, SystemExecutor};
use gitemplate::logging::{Log, StepEntry, StepStatus};

/// HEAD commit reported for every scripted clone.
pub const SHA: &str = "7858ada150cf927d6d8a6b3a7f8b63d9917d4185";

/// Executor that fakes `git` and `perl` but touches the real filesystem.
///
/// - `git clone <src> <dst>` copies the fixture template into `dst` and adds
///   a `.git` directory.
/// - `git rev-parse HEAD` prints [`SHA`].
/// - `git remote show origin` prints a `Fetch URL:` line for the source.
/// - Any other `git` or `find … perl` command succeeds without effect.
/// - Everything else (post-replace scripts, `test`, `find`, `mv`, `rm`) is
///   handed to [`SystemExecutor`].
#[derive(Debug)]
pub struct ScriptedExecutor {
    template: PathBuf,
    src_url: String,
    calls: Mutex<Vec<ShellCommand>>,
}

impl ScriptedExecutor {
    /// Script clones of `template`, reported as coming from `src_url`.
    pub fn new(template: &Path, src_url: &str) -> Self {
        Self {
            template: template.to_path_buf(),
            src_url: src_url.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command received so far.
    pub fn calls(&self) -> Vec<ShellCommand> {
        self.calls.lock().expect("calls poisoned").clone()
    }

    /// Command lines of every `Exec` received so far.
    pub fn exec_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ShellCommand::Exec { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    fn clone_into(&self, command: &str) -> CommandResult {
        let Some(dst) = command.split_whitespace().last() else {
            return CommandResult::failure(2, "usage: git clone <src> <dst>");
        };
        let dst = Path::new(dst);
        copy_tree(&self.template, dst);
        std::fs::create_dir_all(dst.join(".git").join("refs")).expect("create .git");
        std::fs::write(dst.join(".git").join("HEAD"), "ref: refs/heads/main\n")
            .expect("write HEAD");
        CommandResult::ok(format!("Cloning into '{}'...\n", dst.display()))
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, command: &ShellCommand) -> CommandResult {
        self.calls
            .lock()
            .expect("calls poisoned")
            .push(command.clone());
        match command {
            ShellCommand::Exec { command: line, .. } if line.starts_with("git clone ") => {
                self.clone_into(line)
            }
            ShellCommand::Exec { command: line, .. } if line == "git rev-parse HEAD" => {
                CommandResult::ok(format!("{SHA}\n"))
            }
            ShellCommand::Exec { command: line, .. } if line == "git remote show origin" => {
                CommandResult::ok(format!(
                    "* remote origin\n  Fetch URL: {0}\n  Push  URL: {0}\n",
                    self.src_url
                ))
            }
            ShellCommand::Exec { command: line, .. }
                if line.starts_with("git ") || line.starts_with("find ") =>
            {
                CommandResult::ok("")
            }
            other => SystemExecutor.execute(other),
        }
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// Recursively copy `from` into `to`.
pub fn copy_tree(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.expect("walk template");
        let rel = entry.path().strip_prefix(from).expect("strip prefix");
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).expect("create dir");
        } else {
            std::fs::copy(entry.path(), &target).expect("copy file");
            #[cfg(unix)]
            {
                let perms = std::fs::metadata(entry.path())
                    .expect("stat file")
                    .permissions();
                std::fs::set_permissions(&target, perms).expect("chmod file");
            }
        }
    }
}

/// A template tree and an empty workspace for the destination.
pub struct Fixture {
    /// Holds the template and the destination parent.
    pub root: tempfile::TempDir,
    /// Scripted executor shared with the [`Shell`].
    pub executor: Arc<ScriptedExecutor>,
}

impl Fixture {
    /// Create a template containing `files` (relative paths, written with
    /// their own path as content).
    pub fn new(files: &[&str]) -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let template = root.path().join("template");
        std::fs::create_dir_all(&template).expect("create template dir");
        for file in files {
            let path = template.join(file);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
            std::fs::write(&path, file).expect("write template file");
        }
        let executor = Arc::new(ScriptedExecutor::new(
            &template,
            "git@github.com:user/tpl.git",
        ));
        Self { root, executor }
    }

    /// Path of the template directory.
    pub fn template(&self) -> PathBuf {
        self.root.path().join("template")
    }

    /// Write an executable post-replace hook with `body` into the template.
    pub fn with_post_replace(self, body: &str) -> Self {
        let script = self.template().join(".gitemplate.postreplace");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write hook");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
                .expect("chmod hook");
        }
        self
    }

    /// Destination for the new project (does not exist yet).
    pub fn dst(&self) -> PathBuf {
        self.root.path().join("my-new-proj")
    }

    /// A [`Shell`] backed by the scripted executor.
    pub fn shell(&self) -> Shell {
        Shell::new(self.executor.clone())
    }

    /// A configuration targeting [`dst`](Self::dst).
    pub fn config(&self) -> Config {
        Config::new("my-new-proj", "git@github.com:user/tpl.git", &self.dst())
            .expect("valid config")
            .with_year(1970)
    }
}

/// [`Log`] that keeps recorded steps in memory.
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Mutex<Vec<StepEntry>>,
}

impl StepLog {
    /// Steps recorded so far.
    pub fn steps(&self) -> Vec<StepEntry> {
        self.steps.lock().expect("steps poisoned").clone()
    }

    /// `(name, status)` for every recorded step.
    pub fn statuses(&self) -> Vec<(String, StepStatus)> {
        self.steps()
            .into_iter()
            .map(|s| (s.name, s.status))
            .collect()
    }
}

impl Log for StepLog {
    fn stage(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn debug(&self, _: &str) {}
    fn warn(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.steps.lock().expect("steps poisoned").push(StepEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}
