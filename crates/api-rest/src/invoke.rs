//! Raw ledger invocations through the dispatch table.
//!
//! `POST /invoke/{collection}/{function}` takes the same positional string arguments a ledger
//! client would send (`["CLAIM1", "TREATMENT1", ...]`). Read-only functions are evaluated;
//! everything else is submitted and committed.

use crate::error::{ApiResult, ErrorRes};
use crate::records::parse_collection;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FunctionRes {
    pub collection: String,
    pub function: String,
    /// Argument names in order, key first where the function takes one.
    pub params: Vec<String>,
    pub read_only: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub(crate) struct InvokeReq {
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct InvokeRes {
    pub function: String,
    #[schema(value_type = Object)]
    pub result: Value,
    /// Set when the invocation was committed.
    pub tx_id: Option<String>,
    pub block_num: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/functions",
    responses(
        (status = 200, description = "Every function in the dispatch table", body = [FunctionRes])
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_functions(State(state): State<AppState>) -> Json<Vec<FunctionRes>> {
    let functions = state
        .dispatcher
        .functions()
        .into_iter()
        .map(|f| FunctionRes {
            collection: f.collection,
            function: f.function,
            params: f.params.into_iter().map(str::to_owned).collect(),
            read_only: f.read_only,
        })
        .collect();
    Json(functions)
}

#[utoipa::path(
    post,
    path = "/invoke/{collection}/{function}",
    params(
        ("collection" = String, Path, description = "patients, treatments, insurances or claims"),
        ("function" = String, Path, description = "Ledger function name, e.g. CreateClaim")
    ),
    request_body = InvokeReq,
    responses(
        (status = 200, description = "Function result", body = InvokeRes),
        (status = 400, description = "Unknown function or bad arguments", body = ErrorRes),
        (status = 404, description = "Unknown collection or missing record", body = ErrorRes),
        (status = 409, description = "Key conflict or commit invalidated", body = ErrorRes)
    )
)]
/// Invoke a ledger function by name with positional arguments.
#[axum::debug_handler]
pub(crate) async fn invoke(
    State(state): State<AppState>,
    Path((collection, function)): Path<(String, String)>,
    Json(req): Json<InvokeReq>,
) -> ApiResult<Json<InvokeRes>> {
    let collection = parse_collection(&collection)?;
    let registration = state.dispatcher.resolve(collection, &function)?;
    let registry = &state.registry;
    let dispatcher = &state.dispatcher;

    if registration.operation.is_read_only() {
        let result = state.evaluate(collection, |tx| {
            dispatcher.invoke(registry, tx, collection, &function, &req.args)
        })?;
        return Ok(Json(InvokeRes {
            function,
            result,
            tx_id: None,
            block_num: None,
        }));
    }

    let submitted = state.ledger.submit(collection.namespace(), |tx| {
        dispatcher.invoke(registry, tx, collection, &function, &req.args)
    })?;
    tracing::info!(
        tx_id = %submitted.receipt.tx_id,
        block_num = submitted.receipt.block_num,
        %collection,
        function = %function,
        "invocation committed"
    );

    Ok(Json(InvokeRes {
        function,
        result: submitted.value,
        tx_id: Some(submitted.receipt.tx_id),
        block_num: Some(submitted.receipt.block_num),
    }))
}
