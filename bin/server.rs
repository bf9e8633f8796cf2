// Loan Risk Dashboard - Web Server
// Loads the loan data once, then serves the dashboard with Axum

use anyhow::{Context, Result};
use clap::Parser;
use loan_risk::server::{create_app, Dashboard};
use loan_risk::{init_logging, load_and_summarize, DashboardConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loan-risk-server")]
#[command(about = "Loan Default Risk Dashboard Server")]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Loan data file (.csv, .xlsx, .xls, .ods), e.g. data/sample_loans.csv
    #[arg(long)]
    data: Option<PathBuf>,

    /// Server bind address
    #[arg(long)]
    addr: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = DashboardConfig::load(cli.config.as_deref())?
        .with_env()
        .with_overrides(cli.data, cli.addr);

    println!("🌐 Loan Default Risk Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (table, dataset, summary) = match load_and_summarize(&config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "failed to load loan data");
            println!(
                "Error loading loan data: {:#}. Please ensure {} exists and has the expected columns \
                 (or pass --data data/sample_loans.csv).",
                e,
                config.data_path.display()
            );
            std::process::exit(1);
        }
    };
    println!("✓ Loaded {} loans from {}", table.len(), dataset.source_path);

    let addr = config.bind_addr.clone();
    let app = create_app(Dashboard::new(table, summary, dataset, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(addr = %addr, "dashboard server listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/summary", addr);
    println!("   UI:  http://{}", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
