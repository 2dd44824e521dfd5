//! `registry-bundler` command line entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use registry_bundler::cli::{self, Cli};

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(&cli);

  match cli::run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("{err:#}");
      tracing::debug!("{err:?}");
      if cli.quiet {
        eprintln!("error: {err:#}");
      }
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(cli: &Cli) {
  if cli.quiet {
    return;
  }

  let filter = match cli.verbose {
    0 => "warn,registry_bundler=info",
    1 => "info,registry_bundler=debug",
    _ => "trace",
  };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .init();
}
