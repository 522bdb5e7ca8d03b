//! Binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use orchestrate_rs::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "orchestrate_rs=debug"
    } else {
        "orchestrate_rs=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = cli::execute(&cli).await?;

    #[allow(clippy::print_stdout)]
    {
        print!("{output}");
    }
    Ok(())
}
