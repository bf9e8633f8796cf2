// 📈 Model Evaluation Metrics
// Scores from the model's test-and-score run, plus the plain-language
// reading shown next to the confusion matrix.

use serde::{Deserialize, Serialize};

/// Classification scores of the default-prediction model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetrics {
    pub auc: f64,
    /// Classification accuracy
    pub ca: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl Default for ModelMetrics {
    fn default() -> Self {
        ModelMetrics {
            auc: 0.655,
            ca: 0.670,
            f1: 0.569,
            precision: 0.536,
            recall: 0.607,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AucQuality {
    Weak,
    Moderate,
    Good,
    Strong,
}

impl AucQuality {
    pub fn from_auc(auc: f64) -> Self {
        if auc < 0.6 {
            AucQuality::Weak
        } else if auc < 0.7 {
            AucQuality::Moderate
        } else if auc < 0.8 {
            AucQuality::Good
        } else {
            AucQuality::Strong
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AucQuality::Weak => "weak",
            AucQuality::Moderate => "moderate",
            AucQuality::Good => "good",
            AucQuality::Strong => "strong",
        }
    }
}

/// One labelled line of the interpretation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricInsight {
    pub label: String,
    pub text: String,
}

impl MetricInsight {
    fn new(label: &str, text: String) -> Self {
        MetricInsight {
            label: label.to_string(),
            text,
        }
    }
}

/// Format a ratio as a percentage with the given decimals ("66.7%")
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

impl ModelMetrics {
    pub fn auc_quality(&self) -> AucQuality {
        AucQuality::from_auc(self.auc)
    }

    /// Precision below this means most default flags are false alarms
    pub const LOW_PRECISION: f64 = 0.6;

    pub fn insights(&self) -> Vec<MetricInsight> {
        let quality = self.auc_quality();
        let auc_text = match quality {
            AucQuality::Weak => format!(
                "{:.3}. This is a weak score, barely better than random (0.5).",
                self.auc
            ),
            AucQuality::Moderate => format!(
                "{:.3}. This is a moderate score, indicating the model is better than random (0.5) but not highly accurate.",
                self.auc
            ),
            AucQuality::Good | AucQuality::Strong => format!(
                "{:.3}. This is a {} score, the model separates defaulters from non-defaulters well.",
                self.auc,
                quality.name()
            ),
        };

        let mut precision_text = format!(
            "{}. When the model predicts default, it is correct {} of the time.",
            format_percent(self.precision, 1),
            format_percent(self.precision, 1)
        );
        if self.precision < Self::LOW_PRECISION {
            precision_text
                .push_str(" This suggests a high rate of False Positives (false alarms).");
        }

        vec![
            MetricInsight::new("AUC (Area Under Curve)", auc_text),
            MetricInsight::new(
                "CA (Accuracy)",
                format!("{} of all cases were classified correctly.", format_percent(self.ca, 1)),
            ),
            MetricInsight::new("Precision", precision_text),
            MetricInsight::new(
                "Recall",
                format!(
                    "{}. The model successfully identifies {} of actual defaulters. This is the critical measure for risk managers, it shows the model's ability to catch true risks.",
                    format_percent(self.recall, 1),
                    format_percent(self.recall, 1)
                ),
            ),
            MetricInsight::new(
                "F1",
                format!("{:.3}, the balance between precision and recall.", self.f1),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.607, 1), "60.7%");
        assert_eq!(format_percent(2.0 / 3.0, 1), "66.7%");
        assert_eq!(format_percent(0.5, 0), "50%");
    }

    #[test]
    fn test_auc_quality_bands() {
        assert_eq!(AucQuality::from_auc(0.55), AucQuality::Weak);
        assert_eq!(AucQuality::from_auc(0.655), AucQuality::Moderate);
        assert_eq!(AucQuality::from_auc(0.75), AucQuality::Good);
        assert_eq!(AucQuality::from_auc(0.91), AucQuality::Strong);
    }

    #[test]
    fn test_default_insights() {
        let insights = ModelMetrics::default().insights();

        assert_eq!(insights.len(), 5);
        assert!(insights[0].text.starts_with("0.655. This is a moderate score"));
        assert!(insights[1].text.starts_with("67.0% of all cases"));
        assert!(insights[2].text.contains("False Positives"));
        assert!(insights[3].text.contains("identifies 60.7% of actual defaulters"));
    }

    #[test]
    fn test_high_precision_has_no_false_alarm_note() {
        let metrics = ModelMetrics {
            precision: 0.82,
            ..ModelMetrics::default()
        };

        let precision = &metrics.insights()[2];
        assert_eq!(precision.label, "Precision");
        assert!(!precision.text.contains("False Positives"));
    }
}
