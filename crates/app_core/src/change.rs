//! Polling-based detection of out-of-band folder changes

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Last known backend state of a folder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeSignature {
    #[serde(rename = "last_modified")]
    pub last_modified_epoch: f64,
    pub item_count: u64,
}

impl ChangeSignature {
    pub fn new(last_modified_epoch: f64, item_count: u64) -> Self {
        Self {
            last_modified_epoch,
            item_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Unchanged,
    Changed,
}

/// Diffs polled signatures against a per-folder baseline
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    folder: String,
    baseline: Option<ChangeSignature>,
}

impl ChangeDetector {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.to_string(),
            baseline: None,
        }
    }

    /// Switch folders. The baseline becomes unseeded.
    pub fn reset(&mut self, folder: &str) {
        self.folder = folder.to_string();
        self.baseline = None;
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn baseline(&self) -> Option<ChangeSignature> {
        self.baseline
    }

    /// Feed one poll result.
    ///
    /// The first successful poll only seeds the baseline. Failures and polls
    /// for a folder other than the current one leave everything untouched.
    pub fn observe(&mut self, folder: &str, observed: Result<ChangeSignature, AppError>) -> ChangeStatus {
        if folder != self.folder {
            tracing::debug!("Discarding poll for {:?}, now watching {:?}", folder, self.folder);
            return ChangeStatus::Unchanged;
        }

        let observed = match observed {
            Ok(signature) => signature,
            Err(e) => {
                tracing::warn!("Change check failed for {:?}: {}", folder, e);
                return ChangeStatus::Unchanged;
            }
        };

        let Some(baseline) = self.baseline else {
            tracing::info!(
                "Change detection initialized for {:?}: modified={} items={}",
                folder, observed.last_modified_epoch, observed.item_count
            );
            self.baseline = Some(observed);
            return ChangeStatus::Unchanged;
        };

        if baseline == observed {
            return ChangeStatus::Unchanged;
        }

        tracing::info!(
            "Folder {:?} changed: modified {} -> {}, items {} -> {}",
            folder,
            baseline.last_modified_epoch,
            observed.last_modified_epoch,
            baseline.item_count,
            observed.item_count
        );
        self.baseline = Some(observed);
        ChangeStatus::Changed
    }
}
