use crate::error::CommandError;
use crate::ingest::{CapturedFlow, IngestReport};
use crate::models::{ConfigUpdate, DashboardSummary, Incident, SessionState};
use crate::service::{DashboardService, ModelReport};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    success: bool,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn rejected(error: CommandError) -> (StatusCode, Json<ApiResponse<()>>) {
    let status = match error {
        CommandError::MonitoringPaused => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiResponse {
            success: false,
            message: error.to_string(),
            data: None,
        }),
    )
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeRequest {
    avg_response_time: f64,
}

/// Lot posté par un capteur (`timestamp` éventuel ignoré)
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureRequest {
    flows: Vec<CapturedFlow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    width: Option<f64>,
    height: Option<f64>,
}

pub fn create_router(service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/v1/state", get(get_state))
        .route("/api/v1/summary", get(get_summary))
        .route("/api/v1/incidents", get(list_incidents))
        .route("/api/v1/incidents/:id/resolve", post(resolve_incident))
        .route("/api/v1/incidents/:id/investigate", post(investigate_incident))
        .route("/api/v1/config", post(update_config))
        .route("/api/v1/pause", post(pause))
        .route("/api/v1/resume", post(resume))
        .route("/api/v1/simulate/:scenario", post(simulate))
        .route("/api/v1/flows", post(ingest_flows))
        .route("/api/v1/metrics/response-time", put(set_response_time))
        .route("/api/v1/model/status", get(model_status))
        .route("/api/v1/export", get(export))
        .route("/api/v1/timeline.svg", get(timeline_svg))
        .with_state(service)
}

/// Sert l'API de contrôle jusqu'à l'arrêt du processus
pub async fn serve(service: Arc<DashboardService>, listen_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_address)
        .await
        .with_context(|| format!("Impossible d'écouter sur {}", listen_address))?;
    info!("API de contrôle disponible sur http://{}", listen_address);

    axum::serve(listener, create_router(service))
        .await
        .context("Arrêt inattendu de l'API")?;
    Ok(())
}

async fn get_state(State(service): State<Arc<DashboardService>>) -> Json<ApiResponse<SessionState>> {
    let snapshot = service.snapshot();
    ApiResponse::ok("État courant", (*snapshot).clone())
}

async fn get_summary(
    State(service): State<Arc<DashboardService>>,
) -> Json<ApiResponse<DashboardSummary>> {
    ApiResponse::ok("Résumé du tableau de bord", service.summary())
}

async fn list_incidents(
    State(service): State<Arc<DashboardService>>,
) -> Json<ApiResponse<Vec<Incident>>> {
    let incidents = service.snapshot().incidents.clone();
    ApiResponse::ok(format!("{} incidents actifs", incidents.len()), incidents)
}

async fn resolve_incident(
    State(service): State<Arc<DashboardService>>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Vec<Incident>>> {
    let snapshot = service.resolve_incident(&id);
    ApiResponse::ok(format!("Incident {} résolu", id), snapshot.incidents.clone())
}

async fn investigate_incident(
    State(service): State<Arc<DashboardService>>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Vec<Incident>>> {
    let snapshot = service.investigate_incident(&id);
    ApiResponse::ok(
        format!("Incident {} en cours d'investigation", id),
        snapshot.incidents.clone(),
    )
}

async fn update_config(
    State(service): State<Arc<DashboardService>>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<SessionState> {
    let snapshot = service.update_config(update).map_err(rejected)?;
    Ok(ApiResponse::ok(
        format!("Configuration mise à jour (seuil {:.2})", snapshot.config.threshold),
        (*snapshot).clone(),
    ))
}

async fn pause(State(service): State<Arc<DashboardService>>) -> Json<ApiResponse<bool>> {
    let snapshot = service.pause();
    ApiResponse::ok("Surveillance en pause", snapshot.is_live)
}

async fn resume(State(service): State<Arc<DashboardService>>) -> Json<ApiResponse<bool>> {
    let snapshot = service.resume();
    ApiResponse::ok("Surveillance reprise", snapshot.is_live)
}

async fn simulate(
    State(service): State<Arc<DashboardService>>,
    Path(scenario): Path<String>,
) -> ApiResult<IngestReport> {
    let report = service.simulate_named(&scenario).await.map_err(rejected)?;
    Ok(ApiResponse::ok(
        format!(
            "Simulation {} injectée: {} incidents",
            scenario,
            report.incidents.len()
        ),
        report,
    ))
}

async fn ingest_flows(
    State(service): State<Arc<DashboardService>>,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<IngestReport> {
    let report = service
        .ingest_captured(request.flows)
        .await
        .map_err(rejected)?;
    Ok(ApiResponse::ok(
        format!(
            "{} flux capturés ingérés: {} anomalies",
            report.flows, report.anomalies
        ),
        report,
    ))
}

async fn set_response_time(
    State(service): State<Arc<DashboardService>>,
    Json(request): Json<ResponseTimeRequest>,
) -> ApiResult<f64> {
    let snapshot = service
        .set_response_time(request.avg_response_time)
        .map_err(rejected)?;
    Ok(ApiResponse::ok(
        "Temps de réponse enregistré",
        snapshot.metrics.avg_response_time,
    ))
}

async fn model_status(State(service): State<Arc<DashboardService>>) -> Json<ApiResponse<ModelReport>> {
    let report = service.model_status().await;
    let message = if report.status.model_loaded {
        "Modèle chargé"
    } else {
        "Modèle non chargé"
    };
    ApiResponse::ok(message, report)
}

/// Document brut proposé en téléchargement
async fn export(State(service): State<Arc<DashboardService>>) -> impl IntoResponse {
    let document = service.export();
    let disposition = format!("attachment; filename=\"{}\"", document.file_name());
    ([(header::CONTENT_DISPOSITION, disposition)], Json(document))
}

async fn timeline_svg(
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<TimelineQuery>,
) -> impl IntoResponse {
    let svg = service.render_svg(query.width, query.height);
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
