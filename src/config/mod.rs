use std::env;

/// Application configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT signing secret (HS256)
    pub jwt_secret: String,

    /// Access token lifetime in minutes (default: 24 hours)
    pub access_token_expire_minutes: i64,

    /// Extended "remember me" token lifetime in minutes (default: 30 days)
    pub remember_me_expire_minutes: i64,

    /// Directory for uploaded resume files
    pub upload_dir: String,

    /// Directory for extracted-data JSON documents
    pub extracted_dir: String,

    /// Maximum upload size in bytes (default: 10 MiB); uploads at or above
    /// this size are rejected before any storage write
    pub max_file_size: usize,

    /// Nebius API key; when unset the analysis provider is a no-op
    pub nebius_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible Nebius endpoint
    pub nebius_base_url: String,

    /// Vision model used for scoring, suggestions and extraction
    pub nebius_vlm_model: String,

    /// Text model used for template filling
    pub nebius_llm_model: String,

    /// Allowed CORS origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            access_token_expire_minutes: 1440,
            remember_me_expire_minutes: 43200,
            upload_dir: "uploads/resumes".to_string(),
            extracted_dir: "uploads/extracted".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10 MiB
            nebius_api_key: None,
            nebius_base_url: "https://api.tokenfactory.nebius.com/v1".to_string(),
            nebius_vlm_model: "google/gemma-3-27b-it-fast".to_string(),
            nebius_llm_model: "moonshotai/Kimi-K2-Instruct".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.access_token_expire_minutes),

            remember_me_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES_REMEMBER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.remember_me_expire_minutes),

            upload_dir: env::var("UPLOAD_DIR").unwrap_or(default.upload_dir),

            extracted_dir: env::var("EXTRACTED_DIR").unwrap_or(default.extracted_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            nebius_api_key: env::var("NEBIUS_API_KEY").ok().filter(|v| !v.is_empty()),

            nebius_base_url: env::var("NEBIUS_BASE_URL").unwrap_or(default.nebius_base_url),

            nebius_vlm_model: env::var("NEBIUS_VLM_MODEL").unwrap_or(default.nebius_vlm_model),

            nebius_llm_model: env::var("NEBIUS_LLM_MODEL").unwrap_or(default.nebius_llm_model),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_origins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.access_token_expire_minutes, 1440);
        assert_eq!(config.remember_me_expire_minutes, 43200);
        assert!(config.nebius_api_key.is_none());
    }

    #[test]
    fn test_default_directories() {
        let config = AppConfig::default();
        assert_eq!(config.upload_dir, "uploads/resumes");
        assert_eq!(config.extracted_dir, "uploads/extracted");
    }
}
