//! Backend collaborators consumed by the engine

use crate::change::ChangeSignature;
use crate::error::AppError;
use crate::media::MediaItem;
use async_trait::async_trait;

/// Folder listing, change metadata and deletion, all remote.
///
/// Failures of any kind are reported as [`AppError`]; the engine never retries.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Entries of `path` in display order. `size_hint` is the thumbnail edge in pixels.
    async fn list_folder(&self, path: &str, size_hint: u32) -> Result<Vec<MediaItem>, AppError>;

    async fn change_signature(&self, path: &str) -> Result<ChangeSignature, AppError>;

    async fn delete_item(&self, path: &str) -> Result<(), AppError>;
}
