//! Collection endpoints.
//!
//! Routes take the collection from the path (`/patients`, `/treatments`, `/insurances`,
//! `/claims`) and hand the request to the typed [`RecordService`] for that collection.
//!
//! [`RecordService`]: medledger_core::RecordService

use crate::error::{ApiError, ApiResult, ErrorRes};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use medledger_core::{Collection, Insurance, InsuranceClaim, Patient, Record, Treatment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Runs `$body` with `$r` aliased to the record type stored in `$collection`.
macro_rules! with_record_type {
    ($collection:expr, $r:ident => $body:expr) => {
        match $collection {
            Collection::Patient => {
                type $r = Patient;
                $body
            }
            Collection::Treatment => {
                type $r = Treatment;
                $body
            }
            Collection::Insurance => {
                type $r = Insurance;
                $body
            }
            Collection::InsuranceClaim => {
                type $r = InsuranceClaim;
                $body
            }
        }
    };
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct CreateRecordReq {
    /// Business key to store the record under, e.g. `PATIENT3`.
    pub id: String,
    /// The record, in the collection's schema.
    #[schema(value_type = Object)]
    pub record: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ExistsRes {
    pub exists: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct UpdateStatusReq {
    pub status: String,
}

pub(crate) fn parse_collection(raw: &str) -> ApiResult<Collection> {
    raw.parse()
        .map_err(|err: medledger_core::UnknownCollection| ApiError::NotFound(err.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|err| ApiError::Internal(err.to_string()))
}

fn from_body<R: Record>(body: Value) -> ApiResult<R> {
    serde_json::from_value(body)
        .map_err(|err| ApiError::BadRequest(format!("invalid {} body: {err}", R::COLLECTION)))
}

fn list<R: Record>(state: &AppState) -> ApiResult<Value> {
    let service = state.registry.service::<R>();
    let entries = state.evaluate(R::COLLECTION, |tx| service.list_entries(tx))?;
    to_json(&entries)
}

fn create<R: Record>(state: &AppState, key: &str, body: Value) -> ApiResult<Value> {
    let record = from_body::<R>(body)?;
    let service = state.registry.service::<R>();
    let record = state.submit(R::COLLECTION, |tx| service.create(tx, key, record))?;
    to_json(&record)
}

fn read<R: Record>(state: &AppState, key: &str) -> ApiResult<Value> {
    let service = state.registry.service::<R>();
    let record = state.evaluate(R::COLLECTION, |tx| service.read(tx, key))?;
    to_json(&record)
}

fn update<R: Record>(state: &AppState, key: &str, body: Value) -> ApiResult<Value> {
    let record = from_body::<R>(body)?;
    let service = state.registry.service::<R>();
    let record = state.submit(R::COLLECTION, |tx| service.update(tx, key, record))?;
    to_json(&record)
}

fn delete<R: Record>(state: &AppState, key: &str) -> ApiResult<()> {
    let service = state.registry.service::<R>();
    state.submit(R::COLLECTION, |tx| service.delete(tx, key))?;
    Ok(())
}

fn exists<R: Record>(state: &AppState, key: &str) -> ApiResult<bool> {
    let service = state.registry.service::<R>();
    Ok(state.evaluate(R::COLLECTION, |tx| service.exists(tx, key))?)
}

fn initialise<R: Record>(state: &AppState) -> ApiResult<Value> {
    let service = state.registry.service::<R>();
    let seeded = state.submit(R::COLLECTION, |tx| service.initialise(tx))?;
    to_json(&seeded)
}

#[utoipa::path(
    get,
    path = "/{collection}",
    params(("collection" = String, Path, description = "patients, treatments, insurances or claims")),
    responses(
        (status = 200, description = "Every record in the collection as {key, record}, in key order"),
        (status = 404, description = "Unknown collection", body = ErrorRes),
        (status = 500, description = "A stored record failed to decode", body = ErrorRes)
    )
)]
/// List every record in a collection.
///
/// A single record that fails to decode fails the whole listing.
#[axum::debug_handler]
pub(crate) async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> ApiResult<Json<Value>> {
    let collection = parse_collection(&collection)?;
    let entries = with_record_type!(collection, R => list::<R>(&state))?;
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/{collection}",
    params(("collection" = String, Path, description = "patients, treatments, insurances or claims")),
    request_body = CreateRecordReq,
    responses(
        (status = 201, description = "Record created"),
        (status = 400, description = "Invalid key or record", body = ErrorRes),
        (status = 409, description = "A record already exists under the key", body = ErrorRes),
        (status = 422, description = "A soft reference does not resolve", body = ErrorRes)
    )
)]
/// Create a record under a new key.
#[axum::debug_handler]
pub(crate) async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<CreateRecordReq>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let collection = parse_collection(&collection)?;
    let record = with_record_type!(collection, R => create::<R>(&state, &req.id, req.record))?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "patients, treatments, insurances or claims"),
        ("id" = String, Path, description = "Record key")
    ),
    responses(
        (status = 200, description = "The record"),
        (status = 404, description = "No record under the key", body = ErrorRes)
    )
)]
/// Read one record.
#[axum::debug_handler]
pub(crate) async fn read_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let collection = parse_collection(&collection)?;
    let record = with_record_type!(collection, R => read::<R>(&state, &id))?;
    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "patients, treatments, insurances or claims"),
        ("id" = String, Path, description = "Record key")
    ),
    responses(
        (status = 200, description = "The record as written"),
        (status = 400, description = "Invalid record", body = ErrorRes),
        (status = 404, description = "No record under the key", body = ErrorRes)
    )
)]
/// Replace a record wholesale.
///
/// The body is the replacement record in the collection's schema.
#[axum::debug_handler]
pub(crate) async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let collection = parse_collection(&collection)?;
    let record = with_record_type!(collection, R => update::<R>(&state, &id, body))?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "patients, treatments, insurances or claims"),
        ("id" = String, Path, description = "Record key")
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "No record under the key", body = ErrorRes)
    )
)]
/// Delete a record.
#[axum::debug_handler]
pub(crate) async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let collection = parse_collection(&collection)?;
    with_record_type!(collection, R => delete::<R>(&state, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{collection}/{id}/exists",
    params(
        ("collection" = String, Path, description = "patients, treatments, insurances or claims"),
        ("id" = String, Path, description = "Record key")
    ),
    responses(
        (status = 200, description = "Whether a record is stored under the key", body = ExistsRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn record_exists(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<ExistsRes>> {
    let collection = parse_collection(&collection)?;
    let exists = with_record_type!(collection, R => exists::<R>(&state, &id))?;
    Ok(Json(ExistsRes { exists }))
}

#[utoipa::path(
    post,
    path = "/{collection}/initialise",
    params(("collection" = String, Path, description = "patients, treatments, insurances or claims")),
    responses(
        (status = 201, description = "Sample records seeded"),
        (status = 409, description = "The collection was already seeded", body = ErrorRes)
    )
)]
/// Seed a collection with its sample records.
#[axum::debug_handler]
pub(crate) async fn initialise_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let collection = parse_collection(&collection)?;
    let seeded = with_record_type!(collection, R => initialise::<R>(&state))?;
    Ok((StatusCode::CREATED, Json(seeded)))
}

#[utoipa::path(
    put,
    path = "/{collection}/{id}/status",
    params(
        ("collection" = String, Path, description = "Must be claims"),
        ("id" = String, Path, description = "Claim key")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "The claim with its new status", body = InsuranceClaim),
        (status = 404, description = "No such claim, or not the claims collection", body = ErrorRes)
    )
)]
/// Change a claim's status, leaving its other fields unchanged.
#[axum::debug_handler]
pub(crate) async fn update_claim_status(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(req): Json<UpdateStatusReq>,
) -> ApiResult<Json<InsuranceClaim>> {
    if parse_collection(&collection)? != Collection::InsuranceClaim {
        return Err(ApiError::NotFound(format!(
            "{collection} records have no status"
        )));
    }

    let claims = state.registry.service::<InsuranceClaim>();
    let claim = state.submit(Collection::InsuranceClaim, |tx| {
        claims.update_status(tx, &id, &req.status)
    })?;
    Ok(Json(claim))
}
