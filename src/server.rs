// 🌐 Dashboard HTTP API
// Serves the pre-rendered page and the computed risk tables with Axum

use crate::config::DashboardConfig;
use crate::dashboard::{render_dashboard, DashboardView};
use crate::loans::{DatasetInfo, LoanTable};
use crate::risk::{risk_by_feature, RiskSummary, RiskTable};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Read-only state computed once at startup
pub struct Dashboard {
    pub table: LoanTable,
    pub summary: RiskSummary,
    pub dataset: DatasetInfo,
    pub config: DashboardConfig,
    page: String,
}

impl Dashboard {
    pub fn new(
        table: LoanTable,
        summary: RiskSummary,
        dataset: DatasetInfo,
        config: DashboardConfig,
    ) -> Self {
        let page = render_dashboard(&DashboardView {
            summary: &summary,
            metrics: &config.metrics,
            config: &config,
            dataset: Some(&dataset),
        });

        Dashboard {
            table,
            summary,
            dataset,
            config,
            page,
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Dashboard>,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Summary response
#[derive(Serialize)]
struct SummaryResponse<'a> {
    #[serde(flatten)]
    summary: &'a RiskSummary,
    dataset: &'a DatasetInfo,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/summary - Overall rate and driver tables
async fn get_summary(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = &state.dashboard;
    Json(ApiResponse::ok(SummaryResponse {
        summary: &dashboard.summary,
        dataset: &dashboard.dataset,
    }))
    .into_response()
}

/// GET /api/metrics - Model evaluation metrics
async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.dashboard.config.metrics))
}

/// GET /api/risk/:feature - Default rate by any column
async fn get_feature_risk(
    State(state): State<AppState>,
    Path(feature): Path<String>,
) -> Response {
    // Path has already percent-decoded the column name
    let table = &state.dashboard.table;
    if !table.has_column(&feature) {
        tracing::warn!(feature = %feature, "risk requested for unknown column");
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<RiskTable>::err(format!("Unknown column '{}'", feature))),
        )
            .into_response();
    }

    match risk_by_feature(table, &feature) {
        Ok(risk) => (StatusCode::OK, Json(ApiResponse::ok(risk))).into_response(),
        Err(e) => {
            tracing::error!(feature = %feature, error = %e, "risk by feature failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<RiskTable>::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET / - Serve the dashboard page
async fn serve_index(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.dashboard.page().to_string())
}

// ============================================================================
// Router
// ============================================================================

pub fn create_app(dashboard: Dashboard) -> Router {
    let state = AppState {
        dashboard: Arc::new(dashboard),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/summary", get(get_summary))
        .route("/metrics", get(get_metrics))
        .route("/risk/:feature", get(get_feature_risk))
        .with_state(state.clone());

    Router::new()
        .route("/", get(serve_index))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanSchema;
    use crate::loans::SourceFormat;
    use crate::risk::summarize;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    const SAMPLE: &str = "\
Employment_Type,Credit_History,Default
Salaried,Good,No
Salaried,Poor,Yes
Self-employed,Poor,Yes
Unemployed,Good,No
";

    fn create_test_app() -> Router {
        create_test_app_from(SAMPLE)
    }

    fn create_test_app_from(csv: &str) -> Router {
        let config = DashboardConfig::default();
        let table = LoanTable::from_csv_reader(csv.as_bytes(), &LoanSchema::default()).unwrap();
        let summary = summarize(&table, &config.driver_columns()).unwrap();
        let dataset = DatasetInfo {
            source_path: "loans.csv".to_string(),
            format: SourceFormat::Csv,
            fingerprint: "0".repeat(64),
            loaded_at: Utc::now(),
        };

        create_app(Dashboard::new(table, summary, dataset, config))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(create_test_app(), "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_summary() {
        let (status, body) = get_json(create_test_app(), "/api/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_loans"], 4);
        assert_eq!(body["data"]["overall_default_rate"], 0.5);
        assert_eq!(body["data"]["band"], "High");
        assert_eq!(body["data"]["drivers"][1]["feature"], "Credit_History");
        assert_eq!(body["data"]["drivers"][1]["rows"][0]["category"], "Poor");
        assert_eq!(body["data"]["dataset"]["format"], "Csv");
    }

    #[tokio::test]
    async fn test_metrics() {
        let (_, body) = get_json(create_test_app(), "/api/metrics").await;

        assert_eq!(body["data"]["auc"], 0.655);
    }

    #[tokio::test]
    async fn test_feature_risk() {
        let (status, body) = get_json(create_test_app(), "/api/risk/Employment_Type").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rows"][0]["category"], "Self-employed");
        assert_eq!(body["data"]["rows"][0]["default_rate"], 1.0);
    }

    #[tokio::test]
    async fn test_unknown_feature_is_not_found() {
        let (status, body) = get_json(create_test_app(), "/api/risk/Loan%20Purpose").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unknown column 'Loan Purpose'");
    }

    #[tokio::test]
    async fn test_feature_with_percent_sign() {
        let app = create_test_app_from(
            "Employment_Type,Credit_History,Share%41,ShareA,Default\n\
             Salaried,Good,high,x,Yes\n\
             Salaried,Poor,low,x,No\n",
        );

        let (status, body) = get_json(app, "/api/risk/Share%2541").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["feature"], "Share%41");
        assert_eq!(body["data"]["rows"][0]["category"], "high");
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = create_test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Loan Default Risk Dashboard"));
        assert!(html.contains("loans.csv"));
    }
}
