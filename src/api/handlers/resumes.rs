use crate::api::error::AppError;
use crate::entities::resumes;
use crate::models::{AtsReport, DashboardStats, ExtractedResumeData, FilledTemplate, SuggestionsReport};
use crate::services::resume_service::ResumeUpdate;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateResumeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateResumeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub ats_score: Option<i32>,
    pub thumbnail_color: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ResumeResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub extracted_data_path: Option<String>,
    pub ats_score: i32,
    pub thumbnail_color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<resumes::Model> for ResumeResponse {
    fn from(resume: resumes::Model) -> Self {
        Self {
            id: resume.id,
            user_id: resume.user_id,
            title: resume.title,
            file_path: resume.file_path,
            file_type: resume.file_type,
            file_size: resume.file_size,
            extracted_data_path: resume.extracted_data_path,
            ats_score: resume.ats_score,
            thumbnail_color: resume.thumbnail_color,
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeResponse>,
    pub total: usize,
}

/// Ownership-scoped fetch shared by every per-resume route; a resume owned
/// by someone else is reported exactly like a missing one.
async fn find_owned(
    state: &crate::AppState,
    resume_id: &str,
    claims: &Claims,
) -> Result<resumes::Model, AppError> {
    state
        .resumes
        .find(resume_id, &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/resumes",
    responses(
        (status = 200, description = "All resumes owned by the caller", body = ResumeListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = []))
)]
pub async fn list_resumes(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes: Vec<ResumeResponse> = state
        .resumes
        .list(&claims.sub)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = resumes.len();
    Ok(Json(ResumeListResponse { resumes, total }))
}

#[utoipa::path(
    get,
    path = "/resumes/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = []))
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.resumes.dashboard_stats(&claims.sub).await?))
}

#[utoipa::path(
    post,
    path = "/resumes",
    request_body = CreateResumeRequest,
    responses(
        (status = 201, description = "Resume created", body = ResumeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = []))
)]
pub async fn create_resume(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let resume = state.resumes.create(&claims.sub, &payload.title).await?;
    Ok((StatusCode::CREATED, Json(resume.into())))
}

#[utoipa::path(
    get,
    path = "/resumes/{id}",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Resume", body = ResumeResponse),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn get_resume(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;
    Ok(Json(resume.into()))
}

#[utoipa::path(
    patch,
    path = "/resumes/{id}",
    params(("id" = String, Path, description = "Resume id")),
    request_body = UpdateResumeRequest,
    responses(
        (status = 200, description = "Updated resume", body = ResumeResponse),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn update_resume(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
    Json(payload): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let update = ResumeUpdate {
        title: payload.title,
        ats_score: payload.ats_score,
        thumbnail_color: payload.thumbnail_color,
    };

    let resume = state
        .resumes
        .update(&resume_id, &claims.sub, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

    Ok(Json(resume.into()))
}

#[utoipa::path(
    delete,
    path = "/resumes/{id}",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 204, description = "Resume deleted"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn delete_resume(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = state.resumes.delete(&resume_id, &claims.sub).await?;
    if !deleted {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/resumes/{id}/upload",
    params(("id" = String, Path, description = "Resume id")),
    request_body(content = String, content_type = "multipart/form-data", description = "Resume file (pdf, png or jpeg, under 10 MiB)"),
    responses(
        (status = 200, description = "File attached, analysis attempted", body = ResumeResponse),
        (status = 400, description = "Unsupported type or oversize file"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn upload_resume_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if content.len() >= state.config.max_file_size {
            return Err(AppError::BadRequest(
                "File too large. Maximum size is 10MB".to_string(),
            ));
        }

        let resume = state
            .resumes
            .attach_file(resume, content.to_vec(), &content_type)
            .await?;
        return Ok(Json(resume.into()));
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}

#[utoipa::path(
    get,
    path = "/resumes/{id}/download",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Raw file bytes"),
        (status = 404, description = "Resume or file not found")
    ),
    security(("jwt" = []))
)]
pub async fn download_resume_file(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;

    let (Some(file_path), Some(file_type)) = (&resume.file_path, &resume.file_type) else {
        return Err(AppError::NotFound(
            "No file uploaded for this resume".to_string(),
        ));
    };

    let bytes = tokio::fs::read(file_path)
        .await
        .map_err(|_| AppError::NotFound("File is missing from storage".to_string()))?;

    let media_type = match file_type.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        _ => "image/jpeg",
    };

    let filename = format!("{}.{}", resume.title, file_type);
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(&filename, NON_ALPHANUMERIC)
    );

    Ok((
        [
            (header::CONTENT_TYPE, media_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/resumes/{id}/ats",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "ATS analysis, cached when available"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn get_ats_analysis(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<AtsReport>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;
    Ok(Json(state.resumes.ats_analysis(&resume).await))
}

#[utoipa::path(
    post,
    path = "/resumes/{id}/ats/reanalyze",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Resume with refreshed score", body = ResumeResponse),
        (status = 400, description = "No file uploaded"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn reanalyze_ats(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;

    if resume.file_path.is_none() {
        return Err(AppError::BadRequest(
            "No file uploaded for this resume".to_string(),
        ));
    }

    let resume = state.resumes.reanalyze_ats(resume).await?;
    Ok(Json(resume.into()))
}

#[utoipa::path(
    get,
    path = "/resumes/{id}/suggestions",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Improvement suggestions"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn get_suggestions(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<SuggestionsReport>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;
    Ok(Json(state.resumes.suggestions(&resume).await))
}

#[utoipa::path(
    get,
    path = "/resumes/{id}/extracted",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Extracted structured data"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn get_extracted_data(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<ExtractedResumeData>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;
    Ok(Json(state.resumes.extracted_data(&resume).await?))
}

#[utoipa::path(
    post,
    path = "/resumes/{id}/extracted/reextract",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Freshly extracted data"),
        (status = 400, description = "No file uploaded"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn reextract_data(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
) -> Result<Json<ExtractedResumeData>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;

    if resume.file_path.is_none() {
        return Err(AppError::BadRequest(
            "No file uploaded for this resume".to_string(),
        ));
    }

    Ok(Json(state.resumes.reextract_data(resume).await?))
}

#[utoipa::path(
    post,
    path = "/resumes/{id}/fill-template",
    params(("id" = String, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Template filled from extracted data"),
        (status = 400, description = "Extraction unavailable"),
        (status = 404, description = "Resume not found")
    ),
    security(("jwt" = []))
)]
pub async fn fill_template(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(resume_id): Path<String>,
    Json(template_schema): Json<Value>,
) -> Result<Json<FilledTemplate>, AppError> {
    let resume = find_owned(&state, &resume_id, &claims).await?;

    let filled = state.resumes.fill_template(&resume, &template_schema).await?;
    if let Some(err) = &filled.error {
        return Err(AppError::BadRequest(err.clone()));
    }

    Ok(Json(filled))
}
