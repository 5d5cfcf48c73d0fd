//! `hps-accel`: runs host command scripts against the accelerator model.
//!
//! ```text
//! USAGE:
//!   hps-accel run <script> [--config <toml>]   Execute a script and check its expectations
//!   hps-accel registers                        List the register map
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hps_accel::constants::register_listing;
use hps_accel::script::run_script_file;
use hps_accel::CfuConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hps-accel", about = "HPS multiply-accumulate accelerator model", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Execute a command script and check its expected results.
    Run {
        /// Script file, one `set`/`get`/`ping`/`post_process` command per line.
        script: PathBuf,
        /// TOML file overriding the store depths.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the register map.
    Registers,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Run { script, config } => cmd_run(&script, config.as_deref()),
        Cmd::Registers => {
            println!("{}", register_listing());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_run(script: &Path, config: Option<&Path>) -> Result<ExitCode> {
    let config = match config {
        Some(path) => CfuConfig::from_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => CfuConfig::default(),
    };
    let report = run_script_file(script, config).with_context(|| format!("running {}", script.display()))?;
    println!("{}", script.display());
    println!("{report}");
    Ok(report.exit_code())
}
