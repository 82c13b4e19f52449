mod commands;
mod core;
mod search;

use std::path::PathBuf;

use clap::Parser;

use crate::core::config::DEFAULT_CONFIG_PATH;
use crate::search::{DEFAULT_CACHE_PATH, DEFAULT_PAGE_SIZE};

#[derive(Parser)]
#[command(name = "docsim")]
#[command(about = "Local semantic search over your documents", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(
        long,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Pattern file listing one glob per line"
    )]
    config: PathBuf,

    #[arg(long, default_value = DEFAULT_CACHE_PATH, help = "Embedding cache file")]
    cache: PathBuf,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, help = "Results shown per page")]
    page_size: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::interactive::run(cli.config, cli.cache, cli.page_size)
}
