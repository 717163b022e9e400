use anyhow::Result;
use discstats_storage::UploadStore;

pub async fn handle(store: &UploadStore, json: bool) -> Result<()> {
    let records = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No uploads found.");
        return Ok(());
    }

    println!("Uploads:");
    for record in records {
        println!("  {}", record.label());
    }

    Ok(())
}
