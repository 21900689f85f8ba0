use axum::{extract::rejection::JsonRejection, extract::State, Json};
use service_core::error::AppError;

use crate::dtos::{GenerateRequest, GenerateResponse};
use crate::startup::AppState;

/// `POST /generate-response`
///
/// A body that does not decode is a server error, never "Missing query".
pub async fn generate_response(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected request body");
        AppError::InternalError(anyhow::anyhow!(
            "Invalid request body: {}",
            rejection.body_text()
        ))
    })?;

    let Some(prompt) = request.prompt()? else {
        return Err(AppError::BadRequest(anyhow::anyhow!("Missing query")));
    };

    let response = state.model.generate(prompt).await?;

    Ok(Json(GenerateResponse { response }))
}
