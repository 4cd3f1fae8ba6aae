pub mod ai_service;
pub mod artifact_store;
pub mod resume_service;
pub mod user_service;
