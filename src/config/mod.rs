//! Validated run configuration.
//!
//! A [`Config`] is built once from CLI arguments, validated, and then passed
//! by reference to every pipeline step. The only fields written after
//! construction are the origin metadata captured by the clone step.
pub mod vars;

use std::path::{Path, PathBuf};

use chrono::Datelike as _;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::template::RenamePolicy;

pub use vars::CustomVars;

/// Everything a run needs, after validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// `gitemplate_name` replacement value.
    pub name: String,
    /// Source repository URL or path.
    pub src: String,
    /// Clone destination (absolute).
    pub dst: PathBuf,
    /// `gitemplate_desc` replacement value.
    pub desc: String,
    /// `owner/project` slug used for `gitemplate_repo` and the GitHub remote.
    pub repo: Option<String>,
    /// Revision to check out after cloning.
    pub commit: Option<String>,
    /// Custom variables in mapping order.
    pub vars: CustomVars,
    /// Trace every executor call.
    pub verbose: bool,
    /// Skip `git init` / commit / remote setup.
    pub no_init: bool,
    /// How failed pathname renames are handled.
    pub rename_policy: RenamePolicy,
    /// `gitemplate_year` replacement value.
    pub year: i32,
    /// First 10 characters of the cloned HEAD commit.
    pub origin_sha: String,
    /// Fetch URL of the cloned repository's `origin` remote.
    pub origin_url: String,
}

impl Config {
    /// Create a configuration with the three required values.
    ///
    /// `dst` is made absolute against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if any required value is blank.
    pub fn new(name: &str, src: &str, dst: &Path) -> Result<Self, ConfigError> {
        let name = required("name", name)?;
        let src = required("src", src)?;
        if dst.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("dst"));
        }

        Ok(Self {
            name,
            src,
            dst: absolute(dst)?,
            desc: String::new(),
            repo: None,
            commit: None,
            vars: CustomVars::default(),
            verbose: false,
            no_init: false,
            rename_policy: RenamePolicy::default(),
            year: chrono::Utc::now().year(),
            origin_sha: String::new(),
            origin_url: String::new(),
        })
    }

    /// Build and validate a configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a required value is blank, the repo slug is
    /// malformed, or the custom variables cannot be read or parsed.
    pub fn from_cli(args: &Cli) -> Result<Self, ConfigError> {
        let vars = match &args.json_file {
            Some(path) => CustomVars::from_file(path)?,
            None => CustomVars::parse(&args.json)?,
        };

        let mut config = Self::new(&args.name, &args.src, &args.dst)?
            .with_desc(&args.desc)
            .with_vars(vars)
            .with_no_init(args.no_init)
            .with_verbose(args.verbose)
            .with_rename_policy(if args.strict_renames {
                RenamePolicy::Strict
            } else {
                RenamePolicy::Lenient
            });
        if let Some(repo) = args.repo.as_deref().filter(|r| !r.is_empty()) {
            config = config.with_repo(repo)?;
        }
        if let Some(commit) = args.commit.as_deref().filter(|c| !c.is_empty()) {
            config = config.with_commit(commit);
        }
        Ok(config)
    }

    /// Set the project description.
    #[must_use]
    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    /// Set and validate the `owner/project` slug.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo` is not of the form `owner/project`.
    pub fn with_repo(mut self, repo: &str) -> Result<Self, ConfigError> {
        if !is_valid_repo(repo) {
            return Err(ConfigError::InvalidRepo(repo.to_string()));
        }
        self.repo = Some(repo.to_string());
        Ok(self)
    }

    /// Check out `commit` after cloning.
    #[must_use]
    pub fn with_commit(mut self, commit: &str) -> Self {
        self.commit = Some(commit.to_string());
        self
    }

    /// Set the custom variables.
    #[must_use]
    pub fn with_vars(mut self, vars: CustomVars) -> Self {
        self.vars = vars;
        self
    }

    /// Skip repository re-initialisation.
    #[must_use]
    pub const fn with_no_init(mut self, no_init: bool) -> Self {
        self.no_init = no_init;
        self
    }

    /// Enable verbose command tracing.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Choose how failed renames are handled.
    #[must_use]
    pub const fn with_rename_policy(mut self, policy: RenamePolicy) -> Self {
        self.rename_policy = policy;
        self
    }

    /// Override the year used for `gitemplate_year`.
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Current value of a built-in macro key, or `None` for unknown keys.
    #[must_use]
    pub fn builtin_value(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "desc" => Some(self.desc.clone()),
            "repo" => Some(self.repo.clone().unwrap_or_default()),
            "year" => Some(self.year.to_string()),
            "originSha" => Some(self.origin_sha.clone()),
            "originUrl" => Some(self.origin_url.clone()),
            _ => None,
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    let abs = std::path::absolute(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(dunce::simplified(&abs).to_path_buf())
}

fn is_valid_repo(repo: &str) -> bool {
    let part_ok = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    };
    repo.split_once('/')
        .is_some_and(|(owner, project)| part_ok(owner) && part_ok(project))
}
