//! Media items as returned by the folder listing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entry in a folder listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Folder,
    Image,
    Video,
}

impl MediaKind {
    /// Images and videos can be shown in the viewer; folders cannot.
    pub fn is_navigable(self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Folder => "folder",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        };
        f.write_str(s)
    }
}

/// One entry of the current folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Unique within a listing
    pub path: String,
    /// Folders are listed with `name`, media with `filename`
    #[serde(alias = "name")]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, rename = "preview", skip_serializing_if = "Option::is_none")]
    pub preview_thumbnail: Option<String>,
}

impl MediaItem {
    pub fn new(kind: MediaKind, path: &str) -> Self {
        let filename = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            kind,
            path: path.to_string(),
            filename,
            thumbnail: None,
            preview_thumbnail: None,
        }
    }

    pub fn folder(path: &str) -> Self {
        Self::new(MediaKind::Folder, path)
    }

    pub fn image(path: &str) -> Self {
        Self::new(MediaKind::Image, path)
    }

    pub fn video(path: &str) -> Self {
        Self::new(MediaKind::Video, path)
    }

    /// Identity is `(kind, path)`
    pub fn is(&self, kind: MediaKind, path: &str) -> bool {
        self.kind == kind && self.path == path
    }

    pub fn same_identity(&self, other: &MediaItem) -> bool {
        self.is(other.kind, &other.path)
    }

    pub fn is_navigable(&self) -> bool {
        self.kind.is_navigable()
    }

    pub fn display_name(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_entries_deserialize() {
        let json = r#"[
            {"type": "folder", "path": "trips", "name": "trips", "preview": "/thumb/trips.jpg"},
            {"type": "image", "path": "a.jpg", "filename": "a.jpg", "thumbnail": "data:image/jpeg;base64,AAAA"},
            {"type": "video", "path": "clip.mp4", "filename": "clip.mp4"}
        ]"#;

        let items: Vec<MediaItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].kind, MediaKind::Folder);
        assert_eq!(items[0].filename, "trips");
        assert_eq!(items[0].preview_thumbnail.as_deref(), Some("/thumb/trips.jpg"));
        assert!(items[1].thumbnail.is_some());
        assert_eq!(items[2].kind, MediaKind::Video);
        assert!(items[2].thumbnail.is_none());
    }

    #[test]
    fn test_identity() {
        let item = MediaItem::image("x/y.png");
        assert_eq!(item.filename, "y.png");
        assert!(item.is(MediaKind::Image, "x/y.png"));
        assert!(!item.is(MediaKind::Video, "x/y.png"));
        assert!(!MediaItem::folder("x").is_navigable());
    }
}
