//! # API REST
//!
//! REST API for MedLedger.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Every request is one ledger invocation. Writes are submitted and committed against the shared
//! [`InMemoryLedger`] before the response is sent; reads are evaluated without committing.

#![warn(rust_2018_idioms)]

mod error;
mod invoke;
mod records;

pub use error::{ApiError, ApiResult, ErrorRes};

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use medledger_core::{
    Collection, CollectionRegistry, CoreConfig, Dispatcher, InMemoryLedger, Insurance,
    InsuranceClaim, LedgerResult, Patient, Transaction, Treatment,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    ledger: InMemoryLedger,
    registry: Arc<CollectionRegistry>,
    dispatcher: Arc<Dispatcher<Transaction>>,
}

impl AppState {
    /// Builds the state, validating the dispatch table.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::DispatchTable` if the dispatch table is inconsistent.
    pub fn new(cfg: Arc<CoreConfig>, ledger: InMemoryLedger) -> LedgerResult<Self> {
        Ok(Self {
            registry: Arc::new(CollectionRegistry::new(cfg.clone())),
            dispatcher: Arc::new(Dispatcher::new()?),
            cfg,
            ledger,
        })
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Runs `invocation` in `collection` and commits it.
    fn submit<T>(
        &self,
        collection: Collection,
        invocation: impl FnOnce(&mut Transaction) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let submitted = self.ledger.submit(collection.namespace(), invocation)?;
        tracing::info!(
            tx_id = %submitted.receipt.tx_id,
            block_num = submitted.receipt.block_num,
            %collection,
            "invocation committed"
        );
        Ok(submitted.value)
    }

    /// Runs `invocation` in `collection` without committing it.
    fn evaluate<T>(
        &self,
        collection: Collection,
        invocation: impl FnOnce(&mut Transaction) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        self.ledger.evaluate(collection.namespace(), invocation)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    pub ledger: String,
    /// Number of committed blocks.
    pub height: u64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        invoke::list_functions,
        invoke::invoke,
        records::list_records,
        records::create_record,
        records::read_record,
        records::update_record,
        records::delete_record,
        records::record_exists,
        records::initialise_collection,
        records::update_claim_status,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        Patient,
        Treatment,
        Insurance,
        InsuranceClaim,
        records::CreateRecordReq,
        records::ExistsRes,
        records::UpdateStatusReq,
        invoke::FunctionRes,
        invoke::InvokeReq,
        invoke::InvokeRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/functions", get(invoke::list_functions))
        .route("/invoke/:collection/:function", post(invoke::invoke))
        .route(
            "/:collection",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/:collection/initialise",
            post(records::initialise_collection),
        )
        .route(
            "/:collection/:id",
            get(records::read_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/:collection/:id/exists", get(records::record_exists))
        .route("/:collection/:id/status", put(records::update_claim_status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes),
        (status = 503, description = "Ledger unavailable", body = ErrorRes)
    )
)]
/// Health check endpoint.
///
/// Reports the ledger name and its current block height.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthRes>> {
    let height = state.ledger.height().map_err(medledger_core::LedgerError::from)?;
    Ok(Json(HealthRes {
        ok: true,
        message: "MedLedger REST API is alive".into(),
        ledger: state.cfg.ledger_name().to_owned(),
        height,
    }))
}
