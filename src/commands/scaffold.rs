use std::sync::Arc;

use anyhow::Result;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::GitemplateError;
use crate::exec::{ExecEvent, Shell};
use crate::logging::Logger;
use crate::pipeline;

/// Run the scaffold command.
///
/// The summary is printed whether or not the pipeline succeeds.
///
/// # Errors
///
/// Returns an error if the arguments fail validation or any pipeline step fails.
pub fn run(args: &Cli, log: &Logger) -> Result<()> {
    let version = option_env!("GITEMPLATE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.debug(&format!("gitemplate {version}"));

    let mut config = Config::from_cli(args).map_err(GitemplateError::from)?;
    log.debug(&format!(
        "{} custom variable(s), rename policy {:?}",
        config.vars.len(),
        config.rename_policy
    ));

    let shell = system_shell(&config);
    let result = pipeline::run(&mut config, &shell, log);

    log.print_summary();

    result?;
    log.info(&format!("created {}", config.dst.display()));
    Ok(())
}

/// The system shell, traced through [`trace_event`] when `config.verbose`.
fn system_shell(config: &Config) -> Shell {
    let shell = Shell::system();
    if config.verbose {
        shell.with_observer(Arc::new(trace_event))
    } else {
        shell
    }
}

/// Emit `event` at debug level.
fn trace_event(event: &ExecEvent) {
    tracing::debug!("{}", format_event(event));
}

/// Render an [`ExecEvent`] as `method(["args"]) -> code`, followed by the
/// command's output when there is any.
#[must_use]
pub fn format_event(event: &ExecEvent) -> String {
    let args = serde_json::to_string(&event.arguments).unwrap_or_default();
    let header = format!("{}({args}) -> {}", event.method, event.result.code);
    let output = event.result.output.replace('\0', "\n");
    let output = output.trim_end();
    if output.is_empty() {
        header
    } else {
        format!("{header}\n{output}")
    }
}
