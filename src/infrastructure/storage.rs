use crate::config::StoreConfig;
use crate::services::storage::LocalVideoStorage;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StoreConfig) -> anyhow::Result<Arc<LocalVideoStorage>> {
    let storage = LocalVideoStorage::new(&config.upload_folder)
        .await
        .with_context(|| {
            format!(
                "Failed to prepare upload folder {}",
                config.upload_folder.display()
            )
        })?;

    info!(
        "📁 Video storage: {} (extensions: {})",
        storage.root().display(),
        config.allowed_extensions.join(", ")
    );

    Ok(Arc::new(storage))
}
