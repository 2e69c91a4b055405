use std::path::PathBuf;

use clap::Parser;

mod commands;
mod config;
mod progress;
mod prompt;

use config::{Config, DEFAULT_CONFIG_PATH};

#[derive(Parser, Clone, Debug)]
#[clap(name = "aulas", version, about)]
struct AulasArgs {
    /// Debug output
    #[clap(long, alias = "debug", global = true)]
    verbose: bool,

    /// Configuration file, ignored when missing
    #[clap(short, long, env = "AULAS_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[clap(subcommand)]
    command: commands::AulasCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AulasArgs::parse();

    let level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&args.config)?;
    args.command.run(config).await
}
