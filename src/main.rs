//! vitalwatch: Binary Entrypoint
//! Loads `.env`, initialises tracing, parses arguments and dispatches.

use clap::Parser;

use vitalwatch::cli::{self, Cli};
use vitalwatch::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; absent file is fine.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    telemetry::init(args.verbose);

    cli::run(args).await
}
