use anyhow::Result;
use clap::Parser;

use ferret_scan_core::cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = cli.run()?;
    std::process::exit(exit_code);
}
