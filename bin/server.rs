// Sales Bot - Web Server
// Server-rendered chat page and JSON API over the CSV ledger

use anyhow::{Context, Result};
use clap::Parser;
use sales_bot::{logging, web, ConfigArgs, Ledger};
use tracing::info;

#[derive(Parser)]
#[command(name = "sales-server", version, about = "Web chat for the sales ledger")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Address to listen on
    #[arg(long, env = "SALES_BOT_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stderr();
    let cli = Cli::parse();
    let config = cli.config.into_config();

    info!(data_dir = ?config.data_dir, "opening ledger");
    let ledger = Ledger::open(config).context("Failed to open ledger")?;
    let app = web::app(ledger).context("Failed to load tables")?;

    let listener = tokio::net::TcpListener::bind(&cli.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.addr))?;

    info!(addr = %cli.addr, "server running; chat at http://{}/ , API under /api", cli.addr);

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
