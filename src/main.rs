use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use loan_risk::{
    format_percent, init_logging, load_and_summarize, render_dashboard, save_dashboard,
    DashboardConfig, DashboardView, DatasetInfo, LoanTable, RiskSummary,
};

#[derive(Parser)]
#[command(name = "loan-risk", about = "Loan default risk summary and dashboard export")]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Loan data file (.csv, .xlsx, .xls, .ods), e.g. data/sample_loans.csv
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default rate and driver tables
    Summary,

    /// Write the dashboard as a static HTML file
    Export {
        /// Output HTML file
        #[arg(long, default_value = "output/dashboard.html")]
        out: PathBuf,
    },

    /// Interactive terminal dashboard
    Tui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = DashboardConfig::load(cli.config.as_deref())?
        .with_env()
        .with_overrides(cli.data, None);

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Summary => run_summary(&config),
        Commands::Export { out } => run_export(&config, out),
        Commands::Tui => run_ui_mode(&config),
    }
}

/// Load data or end the process with the loader's message
fn load_or_exit(config: &DashboardConfig) -> (LoanTable, DatasetInfo, RiskSummary) {
    match load_and_summarize(config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "failed to load loan data");
            println!("Error loading loan data: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_summary(config: &DashboardConfig) -> Result<()> {
    println!("📊 Loan Default Risk Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\n📂 Loading {}...", config.data_path.display());

    let (_, _, summary) = load_or_exit(config);

    println!(
        "✓ Overall default rate: {} ({} of {} loans, {} risk)",
        format_percent(summary.overall_default_rate, 1),
        summary.total_defaults,
        summary.total_loans,
        summary.band.name()
    );

    for table in &summary.drivers {
        println!("\n🔍 Risk by {}", config.label_for(&table.feature));
        println!("   {:<24} {:>7} {:>9} {:>8}", "Category", "Loans", "Defaults", "Rate");
        for row in &table.rows {
            println!(
                "   {:<24} {:>7} {:>9} {:>8}",
                row.category,
                row.loans,
                row.defaults,
                format_percent(row.default_rate, 1)
            );
        }
    }

    println!("\n📈 Model Evaluation");
    for insight in config.metrics.insights() {
        println!("   • {}: {}", insight.label, insight.text);
    }

    Ok(())
}

fn run_export(config: &DashboardConfig, out: PathBuf) -> Result<()> {
    let (_, dataset, summary) = load_or_exit(config);

    let html = render_dashboard(&DashboardView {
        summary: &summary,
        metrics: &config.metrics,
        config,
        dataset: Some(&dataset),
    });
    save_dashboard(&html, &out)?;

    println!("✓ Dashboard written to {}", out.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig) -> Result<()> {
    println!("🖥️  Loading Loan Risk Dashboard...\n");

    let (_, _, summary) = load_or_exit(config);

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = loan_risk::ui::App::new(summary, config.clone());
    loan_risk::ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: loan-risk summary / loan-risk export");
    std::process::exit(1);
}
