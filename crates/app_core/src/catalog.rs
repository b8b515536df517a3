//! Ordered catalog of the current folder's entries

use crate::media::{MediaItem, MediaKind};

/// Result of removing an item from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Show the item now at this index
    Show(usize),
    /// Nothing left to display
    Exhausted,
}

/// Items of the current folder, in the order the data provider returned them.
///
/// Folders stay in the sequence but never take part in navigation. The
/// catalog is only ever replaced wholesale, never merged.
#[derive(Debug, Clone, Default)]
pub struct MediaCatalog {
    items: Vec<MediaItem>,
}

impl MediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<MediaItem>) -> Self {
        Self { items }
    }

    /// Replace the whole sequence. Indices held elsewhere must be re-resolved.
    pub fn load(&mut self, items: Vec<MediaItem>) {
        tracing::debug!("Catalog replaced: {} -> {} items", self.items.len(), items.len());
        self.items = items;
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Exact position of `(kind, path)`, if present
    pub fn find(&self, kind: MediaKind, path: &str) -> Option<usize> {
        self.items.iter().position(|item| item.is(kind, path))
    }

    /// Resolve `(kind, path)` to an index.
    ///
    /// Falls back to the first item of the same kind, then to `0`, even when
    /// item 0 is of a different kind. The viewer is opened from a rendered
    /// thumbnail that may be stale by the time it is clicked.
    pub fn index_of(&self, kind: MediaKind, path: &str) -> usize {
        if let Some(index) = self.find(kind, path) {
            return index;
        }

        let fallback = self.items.iter().position(|item| item.kind == kind);
        match fallback {
            Some(index) => {
                tracing::debug!("No {} at {:?}, falling back to first {} at {}", kind, path, kind, index);
                index
            }
            None => {
                tracing::debug!("No {} in catalog for {:?}, falling back to index 0", kind, path);
                0
            }
        }
    }

    /// Delete the item at `index` and pick what to show next.
    ///
    /// The item that followed takes the freed slot; removing the last slot
    /// clamps to the new end. `Exhausted` when no media remains there.
    pub fn remove(&mut self, index: usize) -> Removal {
        if index < self.items.len() {
            self.items.remove(index);
        } else {
            tracing::warn!("Remove index {} out of range (len {})", index, self.items.len());
        }

        if self.items.is_empty() {
            return Removal::Exhausted;
        }

        let next = index.min(self.items.len() - 1);
        if self.items[next].is_navigable() {
            Removal::Show(next)
        } else {
            Removal::Exhausted
        }
    }

    /// Image and video items, order preserved
    pub fn media_only(&self) -> Vec<&MediaItem> {
        self.items.iter().filter(|item| item.is_navigable()).collect()
    }

    /// Image items only, as used for slideshows
    pub fn images_only(&self) -> Vec<MediaItem> {
        self.items
            .iter()
            .filter(|item| item.kind == MediaKind::Image)
            .cloned()
            .collect()
    }
}
