pub mod import;
pub mod init;
pub mod list;
pub mod raw;
pub mod show;

use anyhow::anyhow;
use discstats_storage::StorageError;

/// Turn a failed lookup into a message for the terminal
pub fn lookup_error(err: StorageError) -> anyhow::Error {
    match err {
        StorageError::NotFound(id) => anyhow!(
            "No upload found with id {}. Run 'discstats list' to see stored uploads.",
            id
        ),
        StorageError::MissingArtifact { id, path } => anyhow!(
            "Upload {} is recorded but its data file {} is missing. \
             Import the original CSV again to restore it.",
            id,
            path.display()
        ),
        other => other.into(),
    }
}
