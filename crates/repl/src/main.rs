//! tether-repl - interactive session for Tether bindings
//!
//! Usage:
//!   tether-repl app.tether            # Browse and evaluate app.tether
//!   cat app.tether | tether-repl -    # Read the program from stdin
//!
//! Inside the session, `:` switches to command mode (help, list, edit,
//! clear, quit).

use clap::Parser as ClapParser;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tether_repl::config::default_history_path;
use tether_repl::{Config, SourceSpec};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tether_repl=info";

#[derive(ClapParser)]
#[command(name = "tether-repl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive session for Tether bindings", long_about = None)]
struct Args {
    /// Tether source file, or `-` for stdin
    file: Option<PathBuf>,

    /// History file (defaults to the platform data directory)
    #[arg(long, env = "TETHER_HISTORY", value_name = "PATH")]
    history: Option<PathBuf>,

    /// Keep history in memory only
    #[arg(long, conflicts_with = "history")]
    no_history: bool,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Send tracing output to `path`; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file
        && let Err(e) = init_logging(path)
    {
        eprintln!("tether-repl: cannot open log file {}: {}", path.display(), e);
        std::process::exit(1);
    }

    let history = if args.no_history {
        None
    } else {
        args.history.or_else(default_history_path)
    };
    let config =
        Config::new(args.file.as_deref().map(SourceSpec::from_arg)).history_path(history);

    if let Err(e) = tether_repl::run(config) {
        eprintln!("tether-repl: {}", e);
        std::process::exit(1);
    }
}
