// 📊 Default Risk Aggregation
// Overall default rate and default rate grouped by a categorical feature

use crate::loans::LoanTable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// RISK BAND
// ============================================================================

/// Colour band of a default rate on the dashboard gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,      // below 20%
    Elevated, // 20% to 40%
    High,     // 40% and above
}

impl RiskBand {
    pub const ELEVATED_FROM: f64 = 0.2;
    pub const HIGH_FROM: f64 = 0.4;

    pub fn from_rate(rate: f64) -> Self {
        if rate < Self::ELEVATED_FROM {
            RiskBand::Low
        } else if rate < Self::HIGH_FROM {
            RiskBand::Elevated
        } else {
            RiskBand::High
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Elevated => "Elevated",
            RiskBand::High => "High",
        }
    }

    /// Gauge step colour
    pub fn color(&self) -> &str {
        match self {
            RiskBand::Low => "lightgreen",
            RiskBand::Elevated => "yellow",
            RiskBand::High => "salmon",
        }
    }
}

// ============================================================================
// RISK TABLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    pub category: String,
    pub loans: usize,
    pub defaults: usize,
    pub default_rate: f64,
}

/// Default rate per category of one feature, highest rate first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTable {
    pub feature: String,
    pub rows: Vec<RiskRow>,
}

impl RiskTable {
    /// Gap between the riskiest and safest category
    pub fn spread(&self) -> f64 {
        match (self.rows.first(), self.rows.last()) {
            (Some(top), Some(bottom)) => top.default_rate - bottom.default_rate,
            _ => 0.0,
        }
    }

    pub fn riskiest(&self) -> Option<&RiskRow> {
        self.rows.first()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.category.as_str()).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.default_rate).collect()
    }
}

/// Mean of the default indicator over all records; 0.0 when empty
pub fn overall_default_rate(table: &LoanTable) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    table.default_count() as f64 / table.len() as f64
}

/// Default rate within each distinct value of `feature`
///
/// Rows with an empty feature cell are left out. Result is ordered by
/// descending rate, ties by category name.
pub fn risk_by_feature(table: &LoanTable, feature: &str) -> Result<RiskTable> {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for (category, &flag) in table.column(feature)?.zip(table.defaults()) {
        if category.is_empty() {
            continue;
        }
        let entry = groups.entry(category).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += flag as usize;
    }

    let mut rows: Vec<RiskRow> = groups
        .into_iter()
        .map(|(category, (loans, defaults))| RiskRow {
            category: category.to_string(),
            loans,
            defaults,
            default_rate: defaults as f64 / loans as f64,
        })
        .collect();

    // Stable: equal rates keep the BTreeMap's alphabetical order
    rows.sort_by(|a, b| b.default_rate.total_cmp(&a.default_rate));

    tracing::debug!(feature, categories = rows.len(), "computed risk by feature");

    Ok(RiskTable {
        feature: feature.to_string(),
        rows,
    })
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_loans: usize,
    pub total_defaults: usize,
    pub overall_default_rate: f64,
    pub band: RiskBand,
    pub drivers: Vec<RiskTable>,
}

impl RiskSummary {
    pub fn driver(&self, feature: &str) -> Option<&RiskTable> {
        self.drivers.iter().find(|t| t.feature == feature)
    }

    /// Driver features ordered by spread, widest first
    pub fn ranked_drivers(&self) -> Vec<&RiskTable> {
        let mut ranked: Vec<&RiskTable> = self.drivers.iter().collect();
        ranked.sort_by(|a, b| b.spread().total_cmp(&a.spread()));
        ranked
    }
}

/// Overall rate plus one risk table per driver feature
pub fn summarize(table: &LoanTable, features: &[&str]) -> Result<RiskSummary> {
    let overall = overall_default_rate(table);

    let drivers = features
        .iter()
        .map(|feature| risk_by_feature(table, feature))
        .collect::<Result<Vec<_>>>()?;

    Ok(RiskSummary {
        total_loans: table.len(),
        total_defaults: table.default_count(),
        overall_default_rate: overall,
        band: RiskBand::from_rate(overall),
        drivers,
    })
}
