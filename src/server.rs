use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::catalog::store::CatalogDocument;
use crate::catalog::{CatalogHandle, GeoPoint};
use crate::config::Config;
use crate::cost::fee::{quote_fee, FeeQuote, FeeRequest};
use crate::engine::{EngineError, FulfillmentEngine, FulfillmentRequest, FulfillmentResponse};

#[derive(Clone)]
pub struct ApiState {
    config: Arc<Config>,
    engine: FulfillmentEngine,
    catalog: CatalogHandle,
}

impl ApiState {
    pub fn new(config: Config, catalog: CatalogHandle) -> Self {
        Self {
            engine: FulfillmentEngine::new(config.engine_settings()),
            config: Arc::new(config),
            catalog,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    kind: &'static str,
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "validation",
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        error!("request failed: {error}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: "internal computation error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        let status = match &value {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFulfillable { .. } => StatusCode::NOT_FOUND,
            EngineError::BudgetExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            EngineError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        warn!(status = %value.status(), "malformed request body: {}", value.body_text());
        Self::bad_request(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            kind: self.kind,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SupplierSummary {
    id: String,
    name: String,
    base_cost: f64,
    location: GeoPoint,
    items: usize,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    version: u64,
    suppliers: Vec<SupplierSummary>,
}

#[derive(Debug, Serialize)]
pub struct CatalogReplaced {
    version: u64,
    suppliers: usize,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/fulfillment", post(fulfillment))
        .route("/v1/catalog", get(show_catalog).put(replace_catalog))
        .route("/v1/delivery/quote", post(delivery_quote))
        .route("/v1/config", get(show_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, catalog: CatalogHandle, bind: SocketAddr) -> Result<()> {
    let app = router(ApiState::new(config, catalog));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config.as_ref().clone())
}

async fn fulfillment(
    State(state): State<ApiState>,
    payload: Result<Json<FulfillmentRequest>, JsonRejection>,
) -> ApiResult<FulfillmentResponse> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let catalog = state.catalog.snapshot().map_err(ApiError::internal)?;
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.run(&catalog, &request))
        .await
        .map_err(ApiError::internal)?;
    match outcome {
        Ok(response) => Ok(ok(response)),
        Err(EngineError::Internal) => Err(EngineError::Internal.into()),
        Err(err) => {
            warn!(kind = err.kind(), "fulfillment rejected: {err}");
            Err(err.into())
        }
    }
}

async fn show_catalog(State(state): State<ApiState>) -> ApiResult<CatalogResponse> {
    let catalog = state.catalog.snapshot().map_err(ApiError::internal)?;
    let suppliers = catalog
        .suppliers()
        .iter()
        .map(|s| SupplierSummary {
            id: s.id().to_string(),
            name: s.name().to_string(),
            base_cost: s.base_cost(),
            location: s.location(),
            items: s.inventory().len(),
        })
        .collect();
    Ok(ok(CatalogResponse {
        version: catalog.version(),
        suppliers,
    }))
}

async fn replace_catalog(
    State(state): State<ApiState>,
    payload: Result<Json<CatalogDocument>, JsonRejection>,
) -> ApiResult<CatalogReplaced> {
    let Json(document) = payload.map_err(ApiError::from)?;
    let catalog = document
        .into_catalog()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    let suppliers = catalog.len();
    let version = state.catalog.replace(catalog).map_err(ApiError::internal)?;
    Ok(ok(CatalogReplaced { version, suppliers }))
}

async fn delivery_quote(
    State(state): State<ApiState>,
    payload: Result<Json<FeeRequest>, JsonRejection>,
) -> ApiResult<FeeQuote> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let quote = quote_fee(&state.config.delivery_fee, &request)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(ok(quote))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}
