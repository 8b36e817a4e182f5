use std::sync::Arc;

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::analysisdb::AnalysisExt,
    dtos::analysisdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    models::analysismodel::AnalysisStatus,
    AppState,
};

const UPLOAD_FOLDER: &str = "roof_analysis";

pub fn analysis_handler() -> Router {
    Router::new()
        .route("/submit", post(submit_analysis))
        .route("/latest", get(get_latest_analysis))
}

/// Accepts the survey form, uploads the roof photo, persists the request
/// with a PENDING result, and enqueues the background job. Must return
/// quickly: nothing here waits on an AI call.
pub async fn submit_analysis(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let (form, image) = read_submission_form(multipart).await?;

    form.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (image_bytes, image_filename) =
        image.ok_or_else(|| HttpError::bad_request("Roof image is required"))?;

    // Upload before touching the database so a failed upload leaves no
    // partial state behind.
    let image_url = app_state
        .storage
        .upload_image(image_bytes, &image_filename, UPLOAD_FOLDER)
        .await
        .map_err(|e| HttpError::server_error(format!("Image upload failed: {}", e)))?;

    let request = app_state
        .db_client
        .create_analysis_request(
            user.user.id,
            &form.address,
            form.latitude,
            form.longitude,
            form.energy_consumption,
            &form.roof_type,
            &image_url,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let queued = app_state
        .analysis_worker
        .enqueue(request.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !queued {
        // No Redis configured: run the job on a detached task instead
        let worker = app_state.analysis_worker.clone();
        let request_id = request.id;
        tokio::spawn(async move {
            if let Err(e) = worker.process(request_id).await {
                tracing::error!("In-process analysis {} failed: {}", request_id, e);
            }
        });
    }

    let response = SubmitAnalysisResponseDto {
        message: "Analysis submitted successfully".to_string(),
        analysis_id: request.id,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Status polling for the caller's most recent submission. Response shape
/// depends on where the background job is: 404 none, 202 pending, 500
/// failed, 200 with the full payload once completed.
pub async fn get_latest_analysis(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .db_client
        .get_latest_request_for_user(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("No analysis found"))?;

    let result = app_state
        .db_client
        .get_result_for_request(request.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let result = match result {
        Some(result) => result,
        // Should not happen (the rows are created together), but treat a
        // missing result like one still in flight
        None => {
            return Ok((
                StatusCode::ACCEPTED,
                Json(serde_json::to_value(AnalysisStatusDto {
                    status: AnalysisStatus::Pending.to_str().to_string(),
                    message: "Your analysis is still processing.".to_string(),
                })
                .unwrap_or_default()),
            )
                .into_response())
        }
    };

    match result.status {
        AnalysisStatus::Pending => Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::to_value(AnalysisStatusDto {
                status: AnalysisStatus::Pending.to_str().to_string(),
                message: "Your analysis is still processing.".to_string(),
            })
            .unwrap_or_default()),
        )
            .into_response()),
        AnalysisStatus::Failed => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::to_value(AnalysisStatusDto {
                status: AnalysisStatus::Failed.to_str().to_string(),
                message: "The analysis could not be completed.".to_string(),
            })
            .unwrap_or_default()),
        )
            .into_response()),
        AnalysisStatus::Completed => {
            let payload = CompletedAnalysisDto::from_records(&request, &result);
            Ok(Json(payload).into_response())
        }
    }
}

/// Pulls the text fields and the image file out of the multipart body.
async fn read_submission_form(
    mut multipart: Multipart,
) -> Result<(SubmitAnalysisDto, Option<(Vec<u8>, String)>), HttpError> {
    let mut form = SubmitAnalysisDto::default();
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "address" => {
                form.address = read_text_field(field, &name).await?;
            }
            "latitude" => {
                form.latitude = parse_field(&read_text_field(field, &name).await?, &name)?;
            }
            "longitude" => {
                form.longitude = parse_field(&read_text_field(field, &name).await?, &name)?;
            }
            "energyConsumption" => {
                form.energy_consumption =
                    parse_field(&read_text_field(field, &name).await?, &name)?;
            }
            "roofType" => {
                form.roof_type = read_text_field(field, &name).await?;
            }
            "roofImage" => {
                let filename = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "roof.jpg".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(format!("Could not read image: {}", e)))?;
                image = Some((bytes.to_vec(), filename));
            }
            _ => {
                // Unknown parts are ignored
            }
        }
    }

    Ok((form, image))
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, HttpError> {
    field
        .text()
        .await
        .map_err(|e| HttpError::bad_request(format!("Could not read field {}: {}", name, e)))
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, HttpError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| HttpError::bad_request(format!("Invalid value for {}", name)))
}
