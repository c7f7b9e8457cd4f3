//! CLI entry for cmdtree: resolves configuration, builds the command tree and
//! feeds command lines from `-c` flags or stdin through the dispatcher.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;

use crate::builtin::{self, Session};
use crate::config::{DispatcherConfig, load_config};
use crate::manager::CommandManager;
use crate::source::ConsoleSource;

#[derive(Parser, Debug)]
#[command(
    name = "cmdtree",
    about = "Dispatch `/command arg1 arg2` lines against a command tree",
    version
)]
pub struct Cli {
    /// Config file to use instead of the project/user lookup
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the command prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Override the console source name
    #[arg(long)]
    name: Option<String>,

    /// Grant a permission to the console source (repeatable, `*` grants all)
    #[arg(long = "grant", value_name = "PERMISSION")]
    grants: Vec<String>,

    /// Run a command line and exit (repeatable)
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,

    /// Print completion candidates for a partial line and exit
    #[arg(long, value_name = "PARTIAL")]
    complete: Option<String>,
}

/// Parse process (or given) arguments and run against stdio.
pub fn parse(args: Option<&[&str]>) -> anyhow::Result<()> {
    let cli = match args {
        Some(args) => Cli::try_parse_from(args)?,
        None => Cli::parse(),
    };
    let stdin = std::io::stdin();
    run(cli, stdin.lock(), std::io::stdout(), std::io::stderr())
}

/// Merge the config file with command line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<DispatcherConfig> {
    let mut config = match &cli.config {
        Some(path) => DispatcherConfig::from_path(path)?,
        None => {
            let cwd = std::env::current_dir().context("failed to resolve working directory")?;
            load_config(&cwd)
        }
    };
    if let Some(prefix) = &cli.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(name) = &cli.name {
        config.console.name = name.clone();
    }
    config.console.permissions.extend(cli.grants.iter().cloned());
    Ok(config)
}

/// Execute one line, echoing the outcome while `/debug` is on.
fn dispatch<O: Write, E: Write>(
    manager: &CommandManager,
    session: &Session,
    source: &mut ConsoleSource<O, E>,
    line: &str,
) -> bool {
    let handled = manager.execute(source, line);
    if session.debug() {
        let outcome = if handled { "handled" } else { "rejected" };
        source.note(&format!("[debug] {line} -> {outcome}"));
    }
    handled
}

/// Run the console: `-c` lines if any were given, otherwise every non-empty
/// line of `input` until EOF or `/stop`.
pub fn run<R: BufRead, O: Write, E: Write>(
    cli: Cli,
    input: R,
    out: O,
    err: E,
) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(prefix = %config.prefix, console = %config.console.name, "starting console");

    let session = Session::new();
    let mut manager = CommandManager::with_config(&config);
    builtin::register(&mut manager, Arc::clone(&session));
    session.publish_usages(manager.usage_index());

    let mut source = ConsoleSource::new(config.console.name.clone(), out, err);
    source.grant_all(config.console.permissions.iter().cloned());

    if let Some(partial) = &cli.complete {
        let candidates = manager.complete(&source, partial);
        let (mut out, _) = source.into_streams();
        for candidate in candidates {
            writeln!(out, "{candidate}")?;
        }
        return Ok(());
    }

    if !cli.commands.is_empty() {
        let mut failed = 0;
        for line in &cli.commands {
            if !dispatch(&manager, &session, &mut source, line) {
                failed += 1;
            }
            if session.stopped() {
                break;
            }
        }
        if failed > 0 {
            bail!("{failed} command(s) failed");
        }
        return Ok(());
    }

    for line in input.lines() {
        let line = line.context("failed to read command line")?;
        if line.is_empty() {
            continue;
        }
        dispatch(&manager, &session, &mut source, &line);
        if session.stopped() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Run with `args`, pinning an empty config file unless `--config` is
    /// given so the user's own config never leaks in.
    fn run_with(args: &[&str], input: &str) -> (anyhow::Result<()>, String, String) {
        colored::control::set_override(false);
        let tmp = tempfile::TempDir::new().unwrap();
        let empty = tmp.path().join("empty.toml");
        std::fs::write(&empty, "").unwrap();

        let mut argv = args.to_vec();
        if !argv.contains(&"--config") {
            argv.extend(["--config", empty.to_str().unwrap()]);
        }
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = run(cli, Cursor::new(input.to_string()), &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_commands_from_flags() {
        let (result, out, err) = run_with(
            &["cmdtree", "--name", "alex", "-c", "/ping", "-c", "/tp 1 2"],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(out, "Pong\nTeleported alex to 1 2\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_failed_command_is_an_error() {
        let (result, _, err) = run_with(&["cmdtree", "-c", "/nope"], "");
        assert_eq!(result.unwrap_err().to_string(), "1 command(s) failed");
        assert_eq!(err, "Invalid command\n");
    }

    #[test]
    fn test_repl_stops_on_stop() {
        let (result, out, _) = run_with(
            &["cmdtree", "--grant", "*"],
            "/echo hi\n\n/stop\n/echo unreachable\n",
        );
        assert!(result.is_ok());
        assert_eq!(out, "hi\nStopping\n");
    }

    #[test]
    fn test_prefix_override() {
        let (result, out, err) = run_with(&["cmdtree", "--prefix", "!"], "!ping\n/ping\n");
        assert!(result.is_ok());
        assert_eq!(out, "Pong\n");
        assert_eq!(err, "Invalid command\n");
    }

    #[test]
    fn test_debug_mode_echoes_outcomes() {
        let (result, out, err) = run_with(&["cmdtree"], "/ping\n/debug true\n/ping\n/nope\n");
        assert!(result.is_ok());
        assert_eq!(
            out,
            "Pong\nDebug mode enabled\n[debug] /debug true -> handled\nPong\n\
             [debug] /ping -> handled\n[debug] /nope -> rejected\n"
        );
        assert_eq!(err, "Invalid command\n");
    }

    #[test]
    fn test_complete_flag() {
        let (result, out, _) = run_with(&["cmdtree", "--complete", "/t"], "");
        assert!(result.is_ok());
        assert_eq!(out, "tp\n");
    }

    #[test]
    fn test_explicit_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cmdtree.toml");
        std::fs::write(&path, "prefix = \"$\"\n[console]\nname = \"ops\"\n").unwrap();

        let (result, out, _) = run_with(
            &["cmdtree", "--config", path.to_str().unwrap(), "-c", "$tp 3 4"],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(out, "Teleported ops to 3 4\n");
    }
}
