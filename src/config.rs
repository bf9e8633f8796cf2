// ⚙️ Dashboard Configuration
// Defaults mirror the hardcoded constants of the original dashboard;
// a JSON file, the environment and CLI flags can override them.

use crate::metrics::ModelMetrics;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "data/loan_default.xlsx";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8050";
pub const DEFAULT_CONFUSION_MATRIX_URL: &str =
    "https://i.postimg.cc/nc23w0G9/Whats-App-Image-2025-11-22-at-15-31-16-35e51d99.jpg";

/// Environment variable overriding `data_path`
pub const ENV_DATA_PATH: &str = "LOAN_RISK_DATA";
/// Environment variable overriding `bind_addr`
pub const ENV_BIND_ADDR: &str = "LOAN_RISK_ADDR";

/// Which column carries the outcome, and which label counts as a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanSchema {
    pub default_column: String,
    pub positive_label: String,
}

impl Default for LoanSchema {
    fn default() -> Self {
        LoanSchema {
            default_column: "Default".to_string(),
            positive_label: "Yes".to_string(),
        }
    }
}

/// A categorical column charted as a risk driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverFeature {
    pub column: String,
    pub label: String,
}

impl DriverFeature {
    pub fn new(column: &str, label: &str) -> Self {
        DriverFeature {
            column: column.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub bind_addr: String,
    pub confusion_matrix_url: String,
    pub schema: LoanSchema,
    pub driver_features: Vec<DriverFeature>,
    pub metrics: ModelMetrics,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            confusion_matrix_url: DEFAULT_CONFUSION_MATRIX_URL.to_string(),
            schema: LoanSchema::default(),
            driver_features: vec![
                DriverFeature::new("Employment_Type", "Employment Type"),
                DriverFeature::new("Credit_History", "Credit History"),
            ],
            metrics: ModelMetrics::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file; missing fields fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, or the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply `LOAN_RISK_DATA` / `LOAN_RISK_ADDR` when set and non-empty
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_DATA_PATH).ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            std::env::var(ENV_BIND_ADDR).ok().filter(|v| !v.is_empty()),
        )
    }

    pub fn with_overrides(mut self, data_path: Option<PathBuf>, bind_addr: Option<String>) -> Self {
        if let Some(path) = data_path {
            self.data_path = path;
        }
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        self
    }

    /// Column names of the driver features, in display order
    pub fn driver_columns(&self) -> Vec<&str> {
        self.driver_features.iter().map(|f| f.column.as_str()).collect()
    }

    /// Display label for a column, falling back to the column name
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.driver_features
            .iter()
            .find(|f| f.column == column)
            .map(|f| f.label.as_str())
            .unwrap_or(column)
    }
}
