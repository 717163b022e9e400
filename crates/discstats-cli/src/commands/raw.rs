use anyhow::Result;
use discstats_storage::UploadStore;
use std::io::Write;

use super::lookup_error;

pub async fn handle(store: &UploadStore, id: i64) -> Result<()> {
    let bytes = store.load_raw(id).await.map_err(lookup_error)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;

    Ok(())
}
