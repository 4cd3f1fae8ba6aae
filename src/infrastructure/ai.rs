use crate::config::AppConfig;
use crate::services::ai_service::{AnalysisProvider, NebiusProvider, NullProvider};
use std::sync::Arc;
use tracing::info;

pub fn setup_analysis(config: &AppConfig) -> Arc<dyn AnalysisProvider> {
    match &config.nebius_api_key {
        Some(api_key) => {
            info!(
                "🤖 Analysis provider: Nebius (vision={}, text={})",
                config.nebius_vlm_model, config.nebius_llm_model
            );
            Arc::new(NebiusProvider::new(
                api_key.clone(),
                config.nebius_base_url.clone(),
                config.nebius_vlm_model.clone(),
                config.nebius_llm_model.clone(),
            ))
        }
        None => {
            info!("🤖 Analysis provider: disabled (NEBIUS_API_KEY not set)");
            Arc::new(NullProvider)
        }
    }
}
