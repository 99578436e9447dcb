//! livecanvas - build live previews of in-memory React projects

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use livecanvas::cli::{self, Repl};
use livecanvas::config::Config;
use livecanvas::session::Session;

#[derive(Parser)]
#[command(name = "livecanvas")]
#[command(author, version, about = "Link and package in-memory React projects for live preview")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a snapshot and print its bootstrap document
    Build {
        /// Snapshot file
        snapshot: PathBuf,
        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply tool calls to a snapshot
    Apply {
        /// Snapshot file
        snapshot: PathBuf,
        /// JSON file holding one tool call or an array of them
        calls: PathBuf,
        /// Write the new snapshot here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start an interactive session shell
    Repl {
        /// Snapshot to start from
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(file) => Config::load(file).into_diagnostic()?,
        None => Config::default(),
    };

    match cli.command {
        Some(Commands::Build { snapshot, output }) => {
            build(&config, &snapshot, output.as_deref())?;
        }
        Some(Commands::Apply {
            snapshot,
            calls,
            output,
        }) => {
            apply(&config, &snapshot, &calls, output.as_deref())?;
        }
        Some(Commands::Repl { snapshot }) => {
            run_repl(&config, snapshot.as_deref())?;
        }
        None => {
            run_repl(&config, None)?;
        }
    }

    Ok(())
}

fn open_session(config: &Config, snapshot: &Path) -> Result<Session> {
    let snapshot = cli::read_snapshot(snapshot).into_diagnostic()?;
    Session::from_snapshot(&snapshot, config).into_diagnostic()
}

/// Link a snapshot and emit its bootstrap document
fn build(config: &Config, snapshot: &Path, output: Option<&Path>) -> Result<()> {
    let mut session = open_session(config, snapshot)?;
    let document = session.build().into_diagnostic()?;

    for diagnostic in &document.diagnostics {
        eprintln!(
            "{}: {}: {}",
            cli::severity_label(diagnostic.severity),
            diagnostic.path,
            diagnostic.message
        );
    }

    let json = document.to_json();
    match output {
        Some(file) => {
            std::fs::write(file, &json).into_diagnostic()?;
            eprintln!(
                "{}: Bootstrap document written to {}",
                "Success".green(),
                file.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Apply a file of tool calls and store the resulting snapshot
fn apply(config: &Config, snapshot: &Path, calls: &Path, output: Option<&Path>) -> Result<()> {
    let mut session = open_session(config, snapshot)?;
    let calls = cli::read_tool_calls(calls).into_diagnostic()?;

    let mut failures = 0;
    for call in &calls {
        match session.execute(call) {
            Ok(message) => println!("{} {}", "=>".green(), message),
            Err(e) => {
                failures += 1;
                eprintln!("{}: {}", "Error".red(), e);
            }
        }
    }

    let target = output.unwrap_or(snapshot);
    cli::write_snapshot(target, &session.snapshot()).into_diagnostic()?;

    println!(
        "{}: {} of {} calls applied, snapshot written to {}",
        "Info".cyan(),
        calls.len() - failures,
        calls.len(),
        target.display()
    );

    Ok(())
}

fn run_repl(config: &Config, snapshot: Option<&Path>) -> Result<()> {
    let session = match snapshot {
        Some(file) => open_session(config, file)?,
        None => Session::new(config),
    };

    let mut repl = Repl::new(session);
    repl.run().into_diagnostic()?;
    Ok(())
}
