//! Invoice processing endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::{Credential, RunState};

#[derive(Deserialize)]
pub struct ProcessInvoiceRequest {
    #[serde(default)]
    pub invoice_content: Option<String>,
    #[serde(default, alias = "openai_api_key")]
    pub credential: Option<String>,
}

/// `POST /process_invoice`: run one document through the pipeline.
///
/// Responds with the complete run state. Skill failures are part of that
/// state; only bad input (400) and internal faults (500) become errors.
pub async fn process(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ProcessInvoiceRequest>, JsonRejection>,
) -> Result<Json<RunState>, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let document_text = req
        .invoice_content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("No 'invoice_content' provided in the request body.".into())
        })?;
    let credential = req
        .credential
        .map(Credential::new)
        .filter(|credential| !credential.is_blank())
        .ok_or_else(|| ApiError::BadRequest("No 'credential' provided in the request body.".into()))?;

    let orchestrator = ctx.orchestrator.clone();
    let state = tokio::task::spawn_blocking(move || orchestrator.run(document_text, credential))
        .await
        .map_err(|e| ApiError::Internal(format!("Invoice run aborted: {e}")))??;

    Ok(Json(state))
}
