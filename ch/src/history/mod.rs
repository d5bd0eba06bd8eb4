//! The clip history: ordered, most-recently-touched first
//!
//! Pure list operations with no I/O. The state actor composes these into
//! full transactions and persists the result.

mod eviction;
mod filter;

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

pub use eviction::{evict_by_age, evict_by_size};
pub use filter::HistoryFilter;

use crate::domain::{Clip, Settings, Source};

/// Ordered clip list, head = most recently touched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    clips: Vec<Clip>,
}

impl History {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self { clips }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Position of a non-image clip with exactly this content
    pub fn find_duplicate(&self, content: &str) -> Option<usize> {
        self.clips.iter().position(|c| !c.is_image() && c.content == content)
    }

    /// Move the clip at `index` to the head, refreshing its touch time and source
    pub fn promote(&mut self, index: usize, source: Source, now: i64) -> Option<&Clip> {
        if index >= self.clips.len() {
            return None;
        }
        let mut clip = self.clips.remove(index);
        clip.timestamp = now;
        clip.source = source;
        self.clips.insert(0, clip);
        self.clips.first()
    }

    pub fn push_front(&mut self, clip: Clip) {
        self.clips.insert(0, clip);
    }

    pub fn remove(&mut self, id: &str) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(index))
    }

    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Size eviction followed by age eviction; returns the number dropped
    pub fn evict(&mut self, settings: &Settings, now: i64) -> usize {
        let by_size = evict_by_size(&mut self.clips, settings.max_history_size);
        let by_age = evict_by_age(&mut self.clips, settings.auto_delete_days, now);
        by_size + by_age
    }

    pub fn query(&self, filter: &HistoryFilter) -> Vec<Clip> {
        filter.apply(&self.clips)
    }

    /// Distinct non-empty categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.clips
            .iter()
            .filter_map(|c| c.category.as_deref())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First id that occurs more than once, if any
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.clips
            .iter()
            .map(|c| c.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClipType, DAY_MS};

    fn clip(content: &str, clip_type: ClipType, timestamp: i64) -> Clip {
        Clip::new(content, clip_type, Source::default(), "default", timestamp)
    }

    #[test]
    fn test_find_duplicate_ignores_images() {
        let history = History::new(vec![
            clip("data:image/png;base64,AA", ClipType::Image, 2),
            clip("hello", ClipType::Text, 1),
        ]);
        assert_eq!(history.find_duplicate("hello"), Some(1));
        assert_eq!(history.find_duplicate("data:image/png;base64,AA"), None);
    }

    #[test]
    fn test_promote_moves_to_head_and_refreshes() {
        let mut history = History::new(vec![clip("a", ClipType::Text, 3), clip("b", ClipType::Text, 2)]);
        let promoted = history.promote(1, Source::hostname("new.example"), 10).unwrap();
        assert_eq!(promoted.content, "b");
        assert_eq!(promoted.timestamp, 10);
        assert_eq!(promoted.source.hostname, "new.example");
        assert_eq!(history.len(), 2);
        assert_eq!(history.clips()[1].content, "a");
    }

    #[test]
    fn test_evict_by_size_runs_before_age() {
        let now = 10 * DAY_MS;
        // An imported stale clip sitting ahead of fresh ones
        let mut history = History::new(vec![
            clip("stale", ClipType::Text, now - 3 * DAY_MS),
            clip("fresh-a", ClipType::Text, now - 1000),
            clip("fresh-b", ClipType::Text, now - 2000),
        ]);
        let settings = Settings {
            max_history_size: 2,
            auto_delete_days: 1,
            ..Settings::default()
        };

        assert_eq!(history.evict(&settings, now), 2);
        let kept: Vec<_> = history.clips().iter().map(|c| c.content.as_str()).collect();
        assert_eq!(kept, vec!["fresh-a"]);
    }

    #[test]
    fn test_categories_sorted_and_distinct() {
        let mut a = clip("a", ClipType::Text, 1);
        a.category = Some("work".to_string());
        let mut b = clip("b", ClipType::Text, 1);
        b.category = Some("api".to_string());
        let mut c = clip("c", ClipType::Text, 1);
        c.category = Some("work".to_string());
        let mut d = clip("d", ClipType::Text, 1);
        d.category = Some(String::new());
        let history = History::new(vec![a, b, c, d]);
        assert_eq!(history.categories(), vec!["api", "work"]);
    }

    #[test]
    fn test_duplicate_id_detection() {
        let a = clip("a", ClipType::Text, 1);
        let mut b = clip("b", ClipType::Text, 1);
        assert!(History::new(vec![a.clone(), b.clone()]).duplicate_id().is_none());
        b.id = a.id.clone();
        assert_eq!(History::new(vec![a.clone(), b]).duplicate_id(), Some(a.id.as_str()));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let history = History::new(vec![clip("a", ClipType::Text, 1)]);
        let value = serde_json::to_value(&history).unwrap();
        assert!(value.is_array());
    }
}
