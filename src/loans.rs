// 📂 Loan Data Loader
// Reads a CSV or spreadsheet of loan records into an in-memory table
// and derives the binary default indicator.

use crate::config::LoanSchema;
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Reader};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

// ============================================================================
// SOURCE FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| anyhow!("No file extension on {}", path.display()))?;

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            other => bail!("Unsupported loan data format: .{}", other),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Workbook => "Workbook",
        }
    }
}

/// Provenance of the loaded table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub source_path: String,
    pub format: SourceFormat,
    /// SHA-256 of the file bytes
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

// ============================================================================
// LOAN TABLE
// ============================================================================

/// Loan records held read-only for the lifetime of the process
#[derive(Debug, Clone)]
pub struct LoanTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// 1 when the default column equals the positive label, else 0
    defaults: Vec<u8>,
}

impl LoanTable {
    /// Build a table from a header row and data rows
    ///
    /// Header names are trimmed, cells are kept verbatim. Short rows are
    /// padded with empty cells; the default column must exist.
    pub fn from_rows(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        schema: &LoanSchema,
    ) -> Result<Self> {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

        let default_idx = headers
            .iter()
            .position(|h| *h == schema.default_column)
            .ok_or_else(|| anyhow!("Missing expected column '{}'", schema.default_column))?;

        let width = headers.len();
        let mut padded = 0;
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    padded += 1;
                    row.resize(width, String::new());
                }
                row.truncate(width);
                row
            })
            .collect();

        if padded > 0 {
            tracing::warn!(padded, "rows shorter than the header were padded with empty cells");
        }

        let defaults = rows
            .iter()
            .map(|row| u8::from(row[default_idx] == schema.positive_label))
            .collect();

        Ok(LoanTable {
            headers,
            rows,
            defaults,
        })
    }

    /// Parse CSV text with a header row
    pub fn from_csv_reader<R: Read>(reader: R, schema: &LoanSchema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.context("Failed to read CSV record")?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::from_rows(headers, rows, schema)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &str> + '_> {
        let idx = self
            .headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Missing expected column '{}'", name))?;
        Ok(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Binary default indicator per row
    pub fn defaults(&self) -> &[u8] {
        &self.defaults
    }

    pub fn default_count(&self) -> usize {
        self.defaults.iter().filter(|&&d| d == 1).count()
    }
}

// ============================================================================
// FILE LOADING
// ============================================================================

/// Load loan records from a CSV or workbook file
pub fn load_loans(path: &Path, schema: &LoanSchema) -> Result<(LoanTable, DatasetInfo)> {
    let format = SourceFormat::detect(path)?;

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to open loan data file {}", path.display()))?;
    let fingerprint = format!("{:x}", Sha256::digest(&bytes));

    let table = match format {
        SourceFormat::Csv => LoanTable::from_csv_reader(bytes.as_slice(), schema)?,
        SourceFormat::Workbook => load_workbook(path, schema)?,
    };

    if table.is_empty() {
        bail!("No loan records in {}", path.display());
    }

    tracing::info!(
        path = %path.display(),
        format = format.name(),
        records = table.len(),
        defaults = table.default_count(),
        "loaded loan data"
    );

    let info = DatasetInfo {
        source_path: path.display().to_string(),
        format,
        fingerprint,
        loaded_at: Utc::now(),
    };

    Ok((table, info))
}

/// First worksheet; first row is the header
fn load_workbook(path: &Path, schema: &LoanSchema) -> Result<LoanTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("Workbook {} has no sheets", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read sheet '{}'", sheet))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());

    let headers = rows
        .next()
        .ok_or_else(|| anyhow!("Sheet '{}' is empty", sheet))?;

    tracing::debug!(sheet = %sheet, columns = headers.len(), "reading worksheet");

    LoanTable::from_rows(headers, rows.collect(), schema)
}
