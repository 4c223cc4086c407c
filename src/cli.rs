use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "gitemplate",
    about = "Create a new git repository from a template repository",
    version
)]
pub struct Cli {
    /// Project name (`gitemplate_name`)
    #[arg(short, long, value_name = "PROJECT NAME")]
    pub name: String,

    /// Source repository URL or path
    #[arg(short, long, value_name = "SOURCE REPO")]
    pub src: String,

    /// Destination directory (must not exist)
    #[arg(short, long, value_name = "DESTINATION DIR")]
    pub dst: PathBuf,

    /// Project description (`gitemplate_desc`)
    #[arg(short = 'D', long, default_value = "", value_name = "DESCRIPTION")]
    pub desc: String,

    /// GitHub `owner/project`; sets `gitemplate_repo` and the origin remote
    #[arg(short, long, value_name = "OWNER/PROJECT")]
    pub repo: Option<String>,

    /// Revision to check out after cloning
    #[arg(short, long, value_name = "COMMIT")]
    pub commit: Option<String>,

    /// Custom template variables as a JSON object, e.g. '{"k1":"v1"}'
    #[arg(short, long, default_value = "{}", value_name = "JSON")]
    pub json: String,

    /// Read custom template variables from a JSON file
    #[arg(long, conflicts_with = "json", value_name = "PATH")]
    pub json_file: Option<PathBuf>,

    /// Skip `git init`, the initial commit and remote setup
    #[arg(short = 'I', long = "no-init")]
    pub no_init: bool,

    /// Abort when a file or directory rename fails
    #[arg(long)]
    pub strict_renames: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
