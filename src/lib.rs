// Loan Risk Dashboard - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod dashboard;
pub mod loans;
pub mod metrics;
pub mod risk;

#[cfg(feature = "server")]
pub mod server;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{DashboardConfig, DriverFeature, LoanSchema};
pub use dashboard::{render_dashboard, save_dashboard, DashboardView};
pub use loans::{load_loans, DatasetInfo, LoanTable, SourceFormat};
pub use metrics::{format_percent, AucQuality, MetricInsight, ModelMetrics};
pub use risk::{
    overall_default_rate, risk_by_feature, summarize,
    RiskBand, RiskRow, RiskSummary, RiskTable,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt subscriber; `RUST_LOG` wins over the debug flag
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("loan_risk={}", level))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Load the configured data file and compute the risk summary
///
/// This is the whole startup computation shared by the CLI and the server.
pub fn load_and_summarize(config: &DashboardConfig) -> anyhow::Result<(LoanTable, DatasetInfo, RiskSummary)> {
    let (table, dataset) = load_loans(&config.data_path, &config.schema)?;
    let summary = summarize(&table, &config.driver_columns())?;

    tracing::info!(
        loans = summary.total_loans,
        defaults = summary.total_defaults,
        overall = summary.overall_default_rate,
        "risk summary ready"
    );

    Ok((table, dataset, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_summarize() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Employment_Type,Credit_History,Default").unwrap();
        writeln!(file, "Salaried,Good,No").unwrap();
        writeln!(file, "Unemployed,Poor,Yes").unwrap();

        let config = DashboardConfig::default().with_overrides(Some(file.path().to_path_buf()), None);
        let (table, dataset, summary) = load_and_summarize(&config).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(dataset.format, SourceFormat::Csv);
        assert_eq!(summary.overall_default_rate, 0.5);
        assert_eq!(summary.drivers.len(), 2);
    }

    #[test]
    fn test_missing_driver_column_aborts() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Employment_Type,Default").unwrap();
        writeln!(file, "Salaried,No").unwrap();

        let config = DashboardConfig::default().with_overrides(Some(file.path().to_path_buf()), None);
        let err = load_and_summarize(&config).unwrap_err();

        assert!(err.to_string().contains("Credit_History"));
    }
}
