// 🖼️ Dashboard Page
// Gauge, driver bar charts, confusion matrix and model insights
// assembled into a single self-contained HTML page.
//
// Figures are Plotly specs built as JSON and drawn client-side.

use crate::config::DashboardConfig;
use crate::loans::DatasetInfo;
use crate::metrics::{format_percent, ModelMetrics};
use crate::risk::{RiskBand, RiskSummary, RiskTable};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::Path;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Sequential yellow-orange-red scale, low rates yellow
pub const YLORRD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

/// Everything the page needs, borrowed from the running process
pub struct DashboardView<'a> {
    pub summary: &'a RiskSummary,
    pub metrics: &'a ModelMetrics,
    pub config: &'a DashboardConfig,
    pub dataset: Option<&'a DatasetInfo>,
}

// ═══════════════════════════════════════════════════════════════════════
// Figures
// ═══════════════════════════════════════════════════════════════════════

/// Overall default rate gauge
pub fn gauge_figure(rate: f64) -> Value {
    let steps: Vec<Value> = [
        (0.0, RiskBand::ELEVATED_FROM, RiskBand::Low),
        (RiskBand::ELEVATED_FROM, RiskBand::HIGH_FROM, RiskBand::Elevated),
        (RiskBand::HIGH_FROM, 1.0, RiskBand::High),
    ]
    .iter()
    .map(|(lo, hi, band)| json!({"range": [lo, hi], "color": band.color()}))
    .collect();

    json!({
        "data": [{
            "type": "indicator",
            "mode": "gauge+number",
            "value": rate,
            "title": {"text": "Overall Loan Default Rate"},
            "gauge": {
                "axis": {"range": [0, 1]},
                "bar": {"color": "#1E90FF"},
                "steps": steps,
                "threshold": {
                    "line": {"color": "red", "width": 4},
                    "thickness": 0.75,
                    "value": rate
                }
            },
            "number": {"valueformat": ".1%"}
        }],
        "layout": {
            "height": 300,
            "margin": {"t": 10, "b": 10, "l": 10, "r": 10}
        }
    })
}

/// Bar chart of default rate per category
pub fn risk_bar_figure(table: &RiskTable, label: &str) -> Value {
    let rates = table.rates();
    let text: Vec<String> = rates.iter().map(|r| format_percent(*r, 1)).collect();
    let colorscale: Vec<Value> = YLORRD
        .iter()
        .enumerate()
        .map(|(i, color)| json!([i as f64 / (YLORRD.len() - 1) as f64, color]))
        .collect();

    json!({
        "data": [{
            "type": "bar",
            "x": table.categories(),
            "y": rates,
            "text": text,
            "textposition": "auto",
            "marker": {
                "color": rates,
                "colorscale": colorscale,
                "showscale": true,
                "colorbar": {"title": {"text": "Default_Rate"}}
            },
            "hovertemplate": "%{x}<br>Default rate: %{y:.1%}<extra></extra>"
        }],
        "layout": {
            "title": {"text": format!("Risk by {} (The Driver)", label)},
            "xaxis": {"title": {"text": table.feature}},
            "yaxis": {"title": {"text": "Default_Rate"}, "tickformat": ".0%"},
            "uniformtext": {"minsize": 8, "mode": "hide"}
        }
    })
}

// ═══════════════════════════════════════════════════════════════════════
// HTML helpers
// ═══════════════════════════════════════════════════════════════════════

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to embed inside a <script> element
fn script_json(value: &Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

fn render_confusion_matrix(image_url: &str) -> String {
    format!(
        r#"<div class="card">
 <h3>Model Performance: Confusion Matrix</h3>
 <img class="matrix" src="{url}" alt="Confusion matrix">
 <p class="note"><strong>Purpose:</strong> The Confusion Matrix helps us evaluate the model's classifications. Rows show the actual class, and columns show the predicted class. The main diagonal represents correct predictions.<br>
 The critical area is <strong>False Negatives</strong> (Actual Default, Predicted No-Default), which represent defaults the model failed to flag and pose a financial risk.</p>
</div>"#,
        url = escape_html(image_url),
    )
}

fn render_insights(view: &DashboardView) -> String {
    let items: Vec<String> = view
        .metrics
        .insights()
        .iter()
        .map(|i| {
            format!(
                "  <li><strong>{}:</strong> {}</li>",
                escape_html(&i.label),
                escape_html(&i.text)
            )
        })
        .collect();

    let drivers: Vec<String> = view
        .summary
        .ranked_drivers()
        .iter()
        .map(|t| format!("<strong>{}</strong>", escape_html(&t.feature)))
        .collect();

    let key_drivers = if drivers.is_empty() {
        "No driver features are configured.".to_string()
    } else {
        format!(
            "Analysis confirms that {} {} the primary {} driving loan risk, which should guide your initial screening process.",
            drivers.join(" and "),
            if drivers.len() == 1 { "is" } else { "are" },
            if drivers.len() == 1 { "factor" } else { "factors" },
        )
    };

    format!(
        r#"<div class="card">
 <h4>Model Performance Metrics &amp; Interpretation</h4>
 <ul>
{items}
 </ul>
 <p class="note"><strong>Key Drivers:</strong> {key_drivers}</p>
</div>"#,
        items = items.join("\n"),
        key_drivers = key_drivers,
    )
}

fn render_footer(dataset: Option<&DatasetInfo>) -> String {
    match dataset {
        Some(info) => format!(
            "<footer>{} ({}) · sha256 {} · loaded {}</footer>",
            escape_html(&info.source_path),
            info.format.name(),
            &info.fingerprint[..info.fingerprint.len().min(12)],
            info.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ),
        None => "<footer>Generated by loan-risk</footer>".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Page
// ═══════════════════════════════════════════════════════════════════════

pub fn render_dashboard(view: &DashboardView) -> String {
    let summary = view.summary;

    let mut figures = vec![("gauge".to_string(), gauge_figure(summary.overall_default_rate))];
    let mut driver_boxes = Vec::new();
    for (i, table) in summary.drivers.iter().enumerate() {
        let id = format!("driver{}", i);
        driver_boxes.push(format!(r#"  <div class="chart" id="{}"></div>"#, id));
        figures.push((id, risk_bar_figure(table, view.config.label_for(&table.feature))));
    }

    let scripts: Vec<String> = figures
        .iter()
        .map(|(id, fig)| {
            format!(
                "{{const f={};Plotly.newPlot('{}',f.data,f.layout,{{responsive:true}});}}",
                script_json(fig),
                id
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Loan Default Risk Dashboard</title>
<script src="{plotly}"></script>
<style>
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f9f9f9;padding:20px;margin:0}}
h1{{text-align:center;color:#333}}
h2{{text-align:center;color:#555}}
h3,h4{{text-align:center}}
.gauge{{width:50%;margin:0 auto 20px auto}}
.row{{display:flex;flex-direction:row;align-items:flex-start;margin-bottom:20px}}
.row>div{{flex:1;padding:10px;min-width:0}}
.band{{text-align:center;color:#555}}
.matrix{{width:95%;height:auto;display:block;margin:10px auto;border:1px solid #ccc}}
.note{{padding:10px;border:1px solid #ccc;border-radius:5px;background:#F0F8FF}}
ul{{padding-left:20px}}
footer{{text-align:center;padding:16px;color:#999;font-size:0.8em}}
</style>
</head>
<body>
<h1>Loan Default Risk Dashboard</h1>
<hr>

<div class="gauge" id="gauge"></div>
<p class="band">{loans} loans · {defaults} defaults · {band} risk</p>
<hr>

<h2>The Drivers: Feature-Specific Risk</h2>
<div class="row">
{driver_boxes}
</div>
<hr>

<h2>Model Evaluation &amp; Insights</h2>
<div class="row">
 <div>{confusion}</div>
 <div>{insights}</div>
</div>
{footer}

<script>
{scripts}
</script>
</body>
</html>
"#,
        plotly = PLOTLY_CDN,
        loans = summary.total_loans,
        defaults = summary.total_defaults,
        band = summary.band.name(),
        driver_boxes = driver_boxes.join("\n"),
        confusion = render_confusion_matrix(&view.config.confusion_matrix_url),
        insights = render_insights(view),
        footer = render_footer(view.dataset),
        scripts = scripts.join("\n"),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// File I/O
// ═══════════════════════════════════════════════════════════════════════

/// Write a static copy of the page
pub fn save_dashboard(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskRow;

    fn create_test_summary() -> RiskSummary {
        let table = |feature: &str, rows: &[(&str, f64)]| RiskTable {
            feature: feature.to_string(),
            rows: rows
                .iter()
                .map(|(category, rate)| RiskRow {
                    category: category.to_string(),
                    loans: 10,
                    defaults: (rate * 10.0).round() as usize,
                    default_rate: *rate,
                })
                .collect(),
        };

        RiskSummary {
            total_loans: 20,
            total_defaults: 7,
            overall_default_rate: 0.35,
            band: RiskBand::Elevated,
            drivers: vec![
                table("Employment_Type", &[("Unemployed", 0.5), ("Salaried", 0.4)]),
                table("Credit_History", &[("Poor <bad>", 0.6), ("Good", 0.1)]),
            ],
        }
    }

    #[test]
    fn test_gauge_figure() {
        let fig = gauge_figure(0.35);

        assert_eq!(fig["data"][0]["value"], 0.35);
        assert_eq!(fig["data"][0]["gauge"]["threshold"]["value"], 0.35);
        assert_eq!(fig["data"][0]["gauge"]["steps"][1]["color"], "yellow");
        assert_eq!(fig["data"][0]["number"]["valueformat"], ".1%");
    }

    #[test]
    fn test_bar_figure_labels() {
        let summary = create_test_summary();
        let fig = risk_bar_figure(&summary.drivers[0], "Employment Type");

        assert_eq!(fig["data"][0]["x"][0], "Unemployed");
        assert_eq!(fig["data"][0]["text"][0], "50.0%");
        assert_eq!(fig["layout"]["title"]["text"], "Risk by Employment Type (The Driver)");
        assert_eq!(fig["layout"]["yaxis"]["tickformat"], ".0%");
        assert_eq!(fig["data"][0]["marker"]["colorscale"][8][1], "#800026");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_dashboard() {
        let summary = create_test_summary();
        let metrics = ModelMetrics::default();
        let config = DashboardConfig::default();
        let view = DashboardView {
            summary: &summary,
            metrics: &metrics,
            config: &config,
            dataset: None,
        };

        let html = render_dashboard(&view);

        assert!(html.contains("<h1>Loan Default Risk Dashboard</h1>"));
        assert!(html.contains(r#"id="driver0""#));
        assert!(html.contains(r#"id="driver1""#));
        assert!(html.contains(&config.confusion_matrix_url));
        assert!(html.contains("Risk by Credit History (The Driver)"));
        assert!(html.contains("Elevated risk"));
        // Credit_History has the wider spread, so it is named first
        assert!(html.contains("<strong>Credit_History</strong> and <strong>Employment_Type</strong>"));
        // Category names never break out of the script element
        assert!(!html.contains("Poor <bad>"));
    }

    #[test]
    fn test_save_dashboard_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("dashboard.html");

        save_dashboard("<html></html>", &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
