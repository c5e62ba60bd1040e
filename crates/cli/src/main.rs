//! jsbuild - build pipeline for compile-to-JavaScript targets.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jsbuild_lib::config::resolve_config_path;

use crate::output::{OutputFormat, print_error};

#[derive(Parser)]
#[command(name = "jsbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Build description to use (default: $JSBUILD_CONFIG or jsbuild.toml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Watch sources and recompile on every change until interrupted
  Auto {
    /// Build ids to watch (all builds when omitted)
    ids: Vec<String>,
  },

  /// Compile once and exit
  Once {
    /// Build ids to compile (all builds when omitted)
    ids: Vec<String>,
  },

  /// Remove every build's artifact, source map, and output directory
  Clean,

  /// Compile all builds once, then run test commands
  Test {
    /// Test commands to run (all when omitted)
    names: Vec<String>,
  },

  /// List the builds of the description
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = resolve_config_path(cli.config.as_deref());

  let result = match cli.command {
    Commands::Auto { ids } => cmd::cmd_auto(&config, &ids, cli.output),
    Commands::Once { ids } => cmd::cmd_once(&config, &ids, cli.output),
    Commands::Clean => cmd::cmd_clean(&config, cli.output),
    Commands::Test { names } => cmd::cmd_test(&config, &names, cli.output),
    Commands::Info => cmd::cmd_info(&config, cli.output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
