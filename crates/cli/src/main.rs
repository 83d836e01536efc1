mod config;
mod error;
mod report;

use std::path::PathBuf;

use clap::Parser;
use runtime::{ComparisonResult, McpToolChannel, OpenAiBackend};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const DEFAULT_QUERY: &str = "深圳的天气怎么样";

#[derive(Parser)]
#[command(name = "mcp-compare")]
#[command(about = "Compare model answers with and without MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Question to ask the model
    #[arg(default_value = DEFAULT_QUERY)]
    query: String,

    /// Path to a TOML config file (default: ./mcp-compare.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;

    let backend = OpenAiBackend::new(config.endpoint()?);
    tracing::info!(%backend, "using completion endpoint");

    let result = compare(&config, &cli.query, &backend).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::render(&result, &mut std::io::stdout().lock())?;
    }
    Ok(())
}

/// Run the comparison with a provider that lives exactly as long as the run.
async fn compare(config: &Config, query: &str, backend: &OpenAiBackend) -> Result<ComparisonResult> {
    let channel = McpToolChannel::connect(config.server_config()).await?;

    let outcome = config.runner().run(query, &channel, backend).await;
    let shutdown = channel.shutdown().await;

    let result = outcome?;
    shutdown?;
    Ok(result)
}
