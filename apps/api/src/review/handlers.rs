use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::Blob;
use crate::review::{ResumeRecord, ResumeUpload};
use crate::state::AppState;

fn require_session(state: &AppState) -> Result<(), AppError> {
    if state.platform.auth.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Reads the `companyName`, `jobTitle`, `jobDescription` and `file` parts.
async fn read_upload(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut company_name = String::new();
    let mut job_title = None;
    let mut job_description = String::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                let blob = match content_type {
                    Some(content_type) => Blob::new(data, content_type),
                    None => Blob::octets(data),
                };
                file = Some(match file_name {
                    Some(n) => blob.with_name(n),
                    None => blob,
                });
            }
            "companyName" | "jobTitle" | "jobDescription" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                match name.as_str() {
                    "companyName" => company_name = value,
                    "jobTitle" => job_title = Some(value),
                    _ => job_description = value,
                }
            }
            other => tracing::debug!("Ignoring multipart field {other}"),
        }
    }

    let job_title = job_title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("jobTitle is required".to_string()))?;
    let file = file.ok_or_else(|| AppError::Validation("file is required".to_string()))?;

    Ok(ResumeUpload {
        company_name,
        job_title,
        job_description,
        file,
    })
}

/// POST /api/v1/resumes
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRecord>), AppError> {
    require_session(&state)?;
    let upload = read_upload(multipart).await?;
    let record = state.review.analyze(upload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    require_session(&state)?;
    Ok(Json(state.review.list().await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    require_session(&state)?;
    state
        .review
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_session(&state)?;
    if state.review.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Resume {id} not found")))
    }
}
