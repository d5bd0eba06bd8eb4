//! Monotonic usage counters

use serde::{Deserialize, Serialize};

use super::ClipType;

/// Lifetime counters; deleting clips never decrements them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub total_clips_saved: u64,
    pub total_copies_from_history: u64,
    pub total_images_saved: u64,
}

impl Stats {
    /// Count a newly created clip
    pub fn record_save(&mut self, clip_type: ClipType) {
        self.total_clips_saved += 1;
        if clip_type == ClipType::Image {
            self.total_images_saved += 1;
        }
    }

    /// Count a copy-back from history
    pub fn record_copy(&mut self) {
        self.total_copies_from_history += 1;
    }
}
