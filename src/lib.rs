pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::resume_service::ResumeService;
use crate::services::user_service::UserService;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::health::health_check,
        api::handlers::resumes::list_resumes,
        api::handlers::resumes::get_stats,
        api::handlers::resumes::create_resume,
        api::handlers::resumes::get_resume,
        api::handlers::resumes::update_resume,
        api::handlers::resumes::delete_resume,
        api::handlers::resumes::upload_resume_file,
        api::handlers::resumes::download_resume_file,
        api::handlers::resumes::get_ats_analysis,
        api::handlers::resumes::reanalyze_ats,
        api::handlers::resumes::get_suggestions,
        api::handlers::resumes::get_extracted_data,
        api::handlers::resumes::reextract_data,
        api::handlers::resumes::fill_template,
    ),
    components(
        schemas(
            api::handlers::auth::SignupRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::TokenResponse,
            api::handlers::auth::UserResponse,
            api::handlers::health::HealthResponse,
            api::handlers::resumes::CreateResumeRequest,
            api::handlers::resumes::UpdateResumeRequest,
            api::handlers::resumes::ResumeResponse,
            api::handlers::resumes::ResumeListResponse,
            models::DashboardStats,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "resumes", description = "Resume management and analysis endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub users: Arc<UserService>,
    pub resumes: Arc<ResumeService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/auth/me", get(api::handlers::auth::me))
        .route(
            "/resumes",
            get(api::handlers::resumes::list_resumes).post(api::handlers::resumes::create_resume),
        )
        .route("/resumes/stats", get(api::handlers::resumes::get_stats))
        .route(
            "/resumes/:id",
            get(api::handlers::resumes::get_resume)
                .patch(api::handlers::resumes::update_resume)
                .delete(api::handlers::resumes::delete_resume),
        )
        .route(
            "/resumes/:id/upload",
            post(api::handlers::resumes::upload_resume_file),
        )
        .route(
            "/resumes/:id/download",
            get(api::handlers::resumes::download_resume_file),
        )
        .route(
            "/resumes/:id/ats",
            get(api::handlers::resumes::get_ats_analysis),
        )
        .route(
            "/resumes/:id/ats/reanalyze",
            post(api::handlers::resumes::reanalyze_ats),
        )
        .route(
            "/resumes/:id/suggestions",
            get(api::handlers::resumes::get_suggestions),
        )
        .route(
            "/resumes/:id/extracted",
            get(api::handlers::resumes::get_extracted_data),
        )
        .route(
            "/resumes/:id/extracted/reextract",
            post(api::handlers::resumes::reextract_data),
        )
        .route(
            "/resumes/:id/fill-template",
            post(api::handlers::resumes::fill_template),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    // Body limit leaves room for multipart framing around a max-size file;
    // oversize files themselves are rejected by the upload handler.
    let body_limit = axum::extract::DefaultBodyLimit::max(state.config.max_file_size + 1024 * 1024);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/login", post(api::handlers::auth::login))
        .merge(protected)
        .layer(cors)
        .layer(body_limit)
        .with_state(state)
}
