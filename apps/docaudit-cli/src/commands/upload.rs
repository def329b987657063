//! Upload local files into the blob store

use anyhow::{Context, Result};
use docaudit_conversation::presign_upload;
use docaudit_infra::FsBlobStore;
use std::path::PathBuf;
use std::time::Duration;

use crate::app;
use crate::output;
use crate::StoreArgs;

const UPLOAD_URL_TTL: Duration = Duration::from_secs(3600);

pub async fn run(store_args: &StoreArgs, files: &[PathBuf]) -> Result<()> {
    let store = FsBlobStore::new(&store_args.store);

    for path in files {
        let name = app::file_name(path);
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let upload = presign_upload(
            &store,
            &store_args.user,
            &name,
            "application/octet-stream",
            UPLOAD_URL_TTL,
        )
        .await?;
        store.put(&upload.file_key, &bytes).await?;

        output::success(&format!("Uploaded {} as {}", name, upload.file_key));
    }
    Ok(())
}
