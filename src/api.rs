use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::Config;
use crate::export::{ExportError, ExportedFile, XLSX_CONTENT_TYPE};
use crate::pipeline::{ProductionReport, ProductionRow};
use crate::services::export_service::{self, production_report};
use crate::services::ingest_service::SkippedFile;
use crate::services::{ingest_batch, BatchReport, DatasetKind, UploadedFile};
use crate::session::{Session, SharedSession, StatusSnapshot};

pub const MISSING_CALIBRATION_HEADER: &str = "x-missing-calibration";

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::shared(),
            config: Arc::new(config),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Multipart upload: every part carrying a file name is ingested, in order
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
}

type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_status,
        upload_yield,
        upload_calibration,
        export_template,
        get_production,
        export_production,
        export_slopes
    ),
    components(schemas(
        HealthResponse,
        MessageResponse,
        UploadForm,
        StatusSnapshot,
        BatchReport,
        SkippedFile,
        DatasetKind,
        ProductionReport,
        ProductionRow
    )),
    tags((name = "forage", description = "Comparative Yield templates and forage production estimates"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/yield", post(upload_yield))
        .route("/calibration", post(upload_calibration))
        .route("/template/export", get(export_template))
        .route("/production", get(get_production))
        .route("/production/export", get(export_production))
        .route("/slopes/export", get(export_slopes))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

/// Run `f` against the session on the blocking pool, holding the lock throughout
async fn with_session<T, F>(session: &SharedSession, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Session) -> T + Send + 'static,
    T: Send + 'static,
{
    let mut guard = session.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut *guard))
        .await
        .map_err(|e| {
            error!("Session task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "forage",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "forage",
    responses((status = 200, description = "Outcome of the last operation", body = StatusSnapshot))
)]
#[instrument(skip(state))]
async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    let session = state.session.lock().await;
    Json(session.snapshot())
}

#[utoipa::path(
    post,
    path = "/api/v1/yield",
    tag = "forage",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch ingested (skipped files are listed)", body = BatchReport),
        (status = 422, description = "A file could not be decoded; the batch was aborted", body = BatchReport),
        (status = 400, description = "No file in the request", body = MessageResponse)
    )
)]
#[instrument(skip(state, multipart))]
async fn upload_yield(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), ApiError> {
    upload(state, DatasetKind::Yield, multipart).await
}

#[utoipa::path(
    post,
    path = "/api/v1/calibration",
    tag = "forage",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch ingested", body = BatchReport),
        (status = 422, description = "A file could not be decoded; the batch was aborted", body = BatchReport),
        (status = 400, description = "No file in the request", body = MessageResponse)
    )
)]
#[instrument(skip(state, multipart))]
async fn upload_calibration(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), ApiError> {
    upload(state, DatasetKind::Calibration, multipart).await
}

async fn upload(
    state: AppState,
    kind: DatasetKind,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed {} upload: {}", kind, e);
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Ignoring non-file form field {:?}", field.name());
            continue;
        };
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload {}: {}", file_name, e);
            api_error(StatusCode::BAD_REQUEST, format!("Error reading {file_name}: {e}"))
        })?;
        debug!("Received {} ({} bytes)", file_name, bytes.len());
        files.push(UploadedFile::new(file_name, bytes.to_vec()));
    }

    if files.is_empty() {
        warn!("{} upload contained no files", kind);
        return Err(api_error(StatusCode::BAD_REQUEST, "No files uploaded"));
    }

    info!("Ingesting {} {} file(s)", files.len(), kind);
    let report = with_session(&state.session, move |session| {
        ingest_batch(session, kind, files)
    })
    .await?;

    let status = if report.is_aborted() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/template/export",
    tag = "forage",
    responses(
        (status = 200, description = "Biomass sampling template", body = Vec<u8>,
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "Nothing to export", body = MessageResponse)
    )
)]
#[instrument(skip(state))]
async fn export_template(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (result, status) = with_session(&state.session, |session| {
        let result = export_service::export_template(session);
        (result, session.status().to_string())
    })
    .await?;

    let file = result.map_err(|e| export_failure(e, status))?;
    Ok(xlsx_response(file, None))
}

#[utoipa::path(
    get,
    path = "/api/v1/production",
    tag = "forage",
    responses((status = 200, description = "Production estimates, missing calibration and slopes", body = ProductionReport))
)]
#[instrument(skip(state))]
async fn get_production(State(state): State<AppState>) -> Result<Json<ProductionReport>, ApiError> {
    let column = state.config.yield_value_column.clone();
    let report = with_session(&state.session, move |session| {
        production_report(session, &column)
    })
    .await?;

    info!(
        "Computed {} production rows, {} KA(s) missing calibration",
        report.rows.len(),
        report.missing_calibration.len()
    );
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/production/export",
    tag = "forage",
    responses(
        (status = 200, description = "Production workbook; missing KAs listed in the x-missing-calibration header", body = Vec<u8>,
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "No data loaded, or no rows computed", body = MessageResponse)
    )
)]
#[instrument(skip(state))]
async fn export_production(State(state): State<AppState>) -> Result<Response, ApiError> {
    let column = state.config.yield_value_column.clone();
    let (result, status) = with_session(&state.session, move |session| {
        let result = export_service::export_production(session, &column);
        (result, session.status().to_string())
    })
    .await?;

    let export = result.map_err(|e| export_failure(e, status))?;

    let missing = if export.missing_calibration.is_empty() {
        None
    } else {
        match HeaderValue::from_str(&export.missing_calibration.join(",")) {
            Ok(value) => Some((HeaderName::from_static(MISSING_CALIBRATION_HEADER), value)),
            Err(e) => {
                warn!("Missing calibration list is not a valid header value: {}", e);
                None
            }
        }
    };

    Ok(xlsx_response(export.file, missing))
}

#[utoipa::path(
    get,
    path = "/api/v1/slopes/export",
    tag = "forage",
    responses(
        (status = 200, description = "Fitted slope per KA", body = Vec<u8>,
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 404, description = "No calibration data loaded", body = MessageResponse)
    )
)]
#[instrument(skip(state))]
async fn export_slopes(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (result, status) = with_session(&state.session, |session| {
        let result = export_service::export_slopes(session);
        (result, session.status().to_string())
    })
    .await?;

    let file = result.map_err(|e| export_failure(e, status))?;
    Ok(xlsx_response(file, None))
}

fn export_failure(error: ExportError, status_message: String) -> ApiError {
    match error {
        ExportError::Codec(e) => {
            error!("Failed to write workbook: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, status_message)
        }
        other => {
            warn!("Export refused: {}", other);
            api_error(StatusCode::NOT_FOUND, status_message)
        }
    }
}

fn xlsx_response(file: ExportedFile, extra_header: Option<(HeaderName, HeaderValue)>) -> Response {
    info!("Sending {} ({} rows)", file.file_name, file.row_count);

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    let mut response = file.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some((name, value)) = extra_header {
        headers.insert(name, value);
    }
    response
}
