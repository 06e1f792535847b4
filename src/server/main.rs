//! HTTP API for address-based property analysis.
//!
//! Partial results return HTTP 200 with `success=true`; only a total failure
//! (no address, building or land info at all) returns 206 with
//! `success=false`. Callers judge data quality from the `errors` array and
//! the completeness score, not the top-level flag alone.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use zelkova::aggregate::AnalysisService;
use zelkova::config::Config;
use zelkova::models::{AdminCodes, AnalysisResult, AnalysisSummary, BuildingRecord, ResolvedCoordinate};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Property analysis API server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Path to the provider-key config file
    #[arg(short, long, default_value = "zelkova.toml")]
    config: PathBuf,
}

/// Application state shared across handlers
struct AppState {
    service: AnalysisService,
    config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Zelkova Analysis Server");

    let config = Config::load_or_default(&args.config)?;
    let service = AnalysisService::new(&config);

    let state = Arc::new(AppState { service, config });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/analyze", get(analyze_handler))
        .route("/v1/resolve", get(resolve_handler))
        .route("/v1/building/{sigungu}/{bdong}/{bun}", get(building_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check: reports which provider keys are configured and which
/// features that enables.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let providers = &state.config.providers;
    let vworld = providers.vworld_key.is_some();
    let building = providers.building_key.is_some();
    let land = providers.land_key.is_some();
    let regulation = providers.land_regulation_key.is_some();

    Json(HealthResponse {
        status: "ok",
        api_keys: ApiKeyStatus {
            vworld,
            building,
            land,
            land_regulation: regulation,
        },
        features: FeatureStatus {
            address_search: vworld,
            building_ledger: building,
            land_ledger: land,
            land_regulation: regulation,
            land_forest_search: vworld,
        },
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    api_keys: ApiKeyStatus,
    features: FeatureStatus,
}

#[derive(Serialize)]
struct ApiKeyStatus {
    vworld: bool,
    building: bool,
    land: bool,
    land_regulation: bool,
}

#[derive(Serialize)]
struct FeatureStatus {
    address_search: bool,
    building_ledger: bool,
    land_ledger: bool,
    land_regulation: bool,
    land_forest_search: bool,
}

/// Full address-based analysis
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressParams>,
) -> Result<(StatusCode, Json<AnalyzeResponse>), (StatusCode, String)> {
    let address = params.address.trim();
    if address.chars().count() < 5 {
        return Err((
            StatusCode::BAD_REQUEST,
            "address must be at least 5 characters".to_string(),
        ));
    }

    let result = state.service.analyze(address).await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::PARTIAL_CONTENT
    };

    Ok((
        status,
        Json(AnalyzeResponse {
            success: result.success,
            message: result.message.clone(),
            analysis_summary: result.summary(),
            data: result,
        }),
    ))
}

/// Address resolution only (no registry lookups)
async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressParams>,
) -> Result<Json<ResolvedCoordinate>, (StatusCode, String)> {
    let address = params.address.trim();
    if address.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "address must not be empty".to_string()));
    }

    Ok(Json(state.service.resolver().resolve(address).await))
}

/// Direct building-ledger lookup by explicit code tuple
async fn building_handler(
    State(state): State<Arc<AppState>>,
    Path((sigungu, bdong, bun)): Path<(String, String, String)>,
    Query(params): Query<BuildingParams>,
) -> Json<BuildingResponse> {
    let codes = AdminCodes {
        sigungu,
        bdong,
        bun: format!("{:0>4}", bun),
        ji: format!("{:0>4}", params.ji.unwrap_or_else(|| "0".to_string())),
    };
    let address = format!("code lookup {}", codes);

    match state.service.building().lookup_codes(&address, codes).await {
        Ok(record) => Json(BuildingResponse {
            success: true,
            message: "building ledger lookup complete".to_string(),
            data: Some(record),
        }),
        Err(e) => Json(BuildingResponse {
            success: false,
            message: e.to_string(),
            data: None,
        }),
    }
}

#[derive(Deserialize)]
struct AddressParams {
    /// Address to analyze
    address: String,
}

#[derive(Deserialize)]
struct BuildingParams {
    /// Sub lot number, zero-padded to 4 digits
    ji: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    message: String,
    analysis_summary: AnalysisSummary,
    data: AnalysisResult,
}

#[derive(Serialize)]
struct BuildingResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<BuildingRecord>,
}
