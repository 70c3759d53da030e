//! Media service commands.

use std::path::Path;

use anyhow::{Context, Result};
use eduflow_frontend::{api::MediaApi, MediaClient};
use eduflow_media_types::UploadedImage;

use super::{explain, print_json};
use crate::cli::MediaCommands;

/// Uploads the file at `path` under its own file name.
pub async fn upload_file(media: &MediaClient, path: &Path) -> Result<UploadedImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    media.upload(&file_name, bytes).await.map_err(explain)
}

/// Runs a media action.
pub async fn run(media: &MediaClient, action: MediaCommands) -> Result<()> {
    match action {
        MediaCommands::Upload {
            file,
        } => print_json(&upload_file(media, &file).await?),
        MediaCommands::Delete {
            key,
        } => print_json(&media.delete(&key).await.map_err(explain)?),
    }
}
