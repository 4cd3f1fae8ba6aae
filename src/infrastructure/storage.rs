use crate::config::AppConfig;
use crate::services::artifact_store::ArtifactStore;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<ArtifactStore>> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.extracted_dir).await?;

    info!(
        "🗄️  Artifact store: uploads={}, extracted={}",
        config.upload_dir, config.extracted_dir
    );

    Ok(Arc::new(ArtifactStore::new(
        &config.upload_dir,
        &config.extracted_dir,
    )))
}
