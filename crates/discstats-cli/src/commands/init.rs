use anyhow::Result;
use discstats_storage::UploadStore;

pub async fn handle(store: &UploadStore) -> Result<()> {
    store.initialize().await?;

    let layout = store.layout();
    println!("✓ Initialized store at {}", layout.root().display());
    println!("  Catalog: {}", layout.catalog_path().display());
    println!("  Uploads: {}", layout.uploads_dir().display());

    Ok(())
}
