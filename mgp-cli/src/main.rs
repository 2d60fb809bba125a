use anyhow::{Context, Result};
use clap::Parser;
use mgp_core::{
    config::{split_exclusions, CliOverrides},
    CancellationController, ScanConfig, StopCondition, TerminalReporter,
};
use std::ffi::OsString;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PROG_NAME: &str = "mgp";
const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Flags spelled with a single dash that clap only knows as long options
const SINGLE_DASH_LONG_FLAGS: &[&str] = &["raw", "exc", "lim", "ctx", "config", "help"];

const AFTER_HELP: &str = "\
Long flags take a single dash (-raw, -exc, -lim, -ctx, -config) and are rewritten
before parsing, wherever they appear. To search for a pattern spelled like one of
them, put it after `--`:  mgp -raw -- -ctx src";

/// Recursively lists files whose content matches a pattern, in parallel.
///
/// Equivalent to `grep -E -r -l pattern path`.
#[derive(Parser, Debug)]
#[command(name = PROG_NAME, disable_version_flag = true, after_help = AFTER_HELP)]
struct Cli {
    /// Regular expression to search for
    pattern: Option<String>,

    /// Directory (or file) to start from
    path: Option<PathBuf>,

    /// Number of worker threads [default: 100]
    #[arg(short = 'w', value_name = "N")]
    workers: Option<NonZeroUsize>,

    /// Case insensitive matching
    #[arg(short = 'i')]
    ignore_case: bool,

    /// Disable colored output
    #[arg(long = "raw")]
    raw: bool,

    /// Excluded paths, comma separated globs like "path1,path2"
    #[arg(long = "exc", value_name = "CSV")]
    exclude: Option<String>,

    /// File size limit in megabytes [default: 100]
    #[arg(long = "lim", value_name = "MB")]
    limit_mb: Option<u64>,

    /// Print every matching line of a file
    #[arg(long = "ctx")]
    context: bool,

    /// Print the version
    #[arg(short = 'v')]
    version: bool,

    /// Configuration file, layered over ~/.config/mgp/config.yaml and .mgp.yaml
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let (pattern, root) = match (cli.pattern.clone(), cli.path.clone()) {
        (Some(pattern), Some(root)) if !cli.version => (pattern, root),
        _ => {
            print_brief_help();
            return Ok(());
        }
    };

    let config = ScanConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(CliOverrides {
            pattern,
            root_path: root,
            worker_count: cli.workers,
            size_limit_mb: cli.limit_mb,
            exclude_patterns: cli
                .exclude
                .as_deref()
                .map(split_exclusions)
                .unwrap_or_default(),
            ignore_case: cli.ignore_case,
            match_context: cli.context,
            raw_output: cli.raw,
        });

    init_logging(&config.log_level);
    match config.to_yaml() {
        Ok(yaml) => debug!("Effective configuration:\n{}", yaml),
        Err(e) => debug!("Cannot render effective configuration: {}", e),
    }

    let controller = Arc::new(CancellationController::new(
        StopCondition::new(),
        config.worker_count.get(),
    ));
    controller
        .arm()
        .context("Failed to set signal handler")?;

    let reporter = TerminalReporter::new(io::stdout(), !config.raw_output);
    mgp_core::run(&config, &controller, &reporter)
        .with_context(|| format!("Cannot scan {}", config.root_path.display()))?;
    Ok(())
}

fn print_brief_help() {
    println!("{} {}", PROG_NAME, VERSION);
    println!("Usage: {} [options] pattern starting/path", PROG_NAME);
    println!("Run {} -h for more information", PROG_NAME);
}

/// Logs go to stderr so they never mix with results on stdout
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mgp_core={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Rewrites `-raw`, `-lim=5` and friends to their `--` form.
///
/// Everything after a bare `--` is passed through untouched.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(|arg| {
            if positional_only {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                positional_only = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
