//! Query filters over the history

use serde::{Deserialize, Serialize};

use crate::domain::{ALL_WORKSPACES, Clip, ClipType};

/// AND-combined, optional query filters
///
/// Empty strings are treated the same as absent filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryFilter {
    /// Workspace id, or `"all"` to disable workspace filtering
    pub workspace: Option<String>,
    #[serde(rename = "type")]
    pub clip_type: Option<ClipType>,
    pub category: Option<String>,
    /// `Some(true)` keeps only pinned clips; otherwise no constraint
    pub pinned: Option<bool>,
    /// Source hostname, exact match
    pub source: Option<String>,
    /// Case-insensitive substring of the content; never matches images
    pub search: Option<String>,
    /// Inclusive lower timestamp bound (Unix ms)
    pub start_date: Option<i64>,
    /// Inclusive upper timestamp bound (Unix ms)
    pub end_date: Option<i64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl HistoryFilter {
    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn pinned_only(mut self) -> Self {
        self.pinned = Some(true);
        self
    }

    /// Select matching clips, preserving input order
    pub fn apply<'a>(&self, clips: impl IntoIterator<Item = &'a Clip>) -> Vec<Clip> {
        let needle = non_empty(&self.search).map(str::to_lowercase);
        clips
            .into_iter()
            .filter(|clip| self.matches(clip, needle.as_deref()))
            .cloned()
            .collect()
    }

    fn matches(&self, clip: &Clip, needle: Option<&str>) -> bool {
        if let Some(workspace) = non_empty(&self.workspace)
            && workspace != ALL_WORKSPACES
            && clip.workspace.as_deref().is_some_and(|w| w != workspace)
        {
            return false;
        }
        if let Some(clip_type) = self.clip_type
            && clip.clip_type != clip_type
        {
            return false;
        }
        if let Some(category) = non_empty(&self.category)
            && clip.category.as_deref() != Some(category)
        {
            return false;
        }
        if self.pinned == Some(true) && !clip.pinned {
            return false;
        }
        if let Some(source) = non_empty(&self.source)
            && clip.source.hostname != source
        {
            return false;
        }
        if let Some(needle) = needle
            && (clip.is_image() || !clip.content.to_lowercase().contains(needle))
        {
            return false;
        }
        if self.start_date.is_some_and(|start| clip.timestamp < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| clip.timestamp > end) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;

    fn clip(content: &str, workspace: Option<&str>, timestamp: i64) -> Clip {
        let mut clip = Clip::new(content, ClipType::Text, Source::hostname("docs.example"), "default", timestamp);
        clip.workspace = workspace.map(str::to_string);
        clip
    }

    #[test]
    fn test_empty_filter_keeps_everything_in_order() {
        let clips = vec![clip("b", None, 2), clip("a", Some("w"), 1)];
        let result = HistoryFilter::default().apply(&clips);
        assert_eq!(result, clips);
    }

    #[test]
    fn test_workspace_filter_includes_untagged_clips() {
        let clips = vec![
            clip("work", Some("work"), 3),
            clip("home", Some("home"), 2),
            clip("legacy", None, 1),
        ];
        let result = HistoryFilter::default().workspace("work").apply(&clips);
        let contents: Vec<_> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["work", "legacy"]);

        let all = HistoryFilter::default().workspace("all").apply(&clips);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_and_skips_images() {
        let mut image = clip("data:image/png;base64,SEARCHME", None, 2);
        image.clip_type = ClipType::Image;
        let clips = vec![image, clip("Please SearchMe here", None, 1)];

        let result = HistoryFilter::default().search("searchme").apply(&clips);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].content, "Please SearchMe here");
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let clips = vec![clip("c", None, 30), clip("b", None, 20), clip("a", None, 10)];
        let filter = HistoryFilter {
            start_date: Some(10),
            end_date: Some(20),
            ..Default::default()
        };
        let contents: Vec<_> = filter.apply(&clips).into_iter().map(|c| c.content).collect();
        assert_eq!(contents, vec!["b", "a"]);
    }

    #[test]
    fn test_pinned_false_does_not_constrain() {
        let mut pinned = clip("p", None, 2);
        pinned.pinned = true;
        let clips = vec![pinned, clip("u", None, 1)];

        let only_pinned = HistoryFilter::default().pinned_only().apply(&clips);
        assert_eq!(only_pinned.len(), 1);

        let unconstrained = HistoryFilter {
            pinned: Some(false),
            ..Default::default()
        };
        assert_eq!(unconstrained.apply(&clips).len(), 2);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let mut a = clip("alpha", Some("w"), 2);
        a.category = Some("keys".to_string());
        let mut b = clip("alpha beta", Some("w"), 1);
        b.source = Source::hostname("other.example");
        b.category = Some("keys".to_string());
        let clips = vec![a, b];

        let filter = HistoryFilter {
            category: Some("keys".to_string()),
            source: Some("docs.example".to_string()),
            search: Some("ALPHA".to_string()),
            ..Default::default()
        };
        let result = filter.apply(&clips);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].content, "alpha");
    }

    #[test]
    fn test_deserializes_from_camel_case() {
        let filter: HistoryFilter =
            serde_json::from_str(r#"{"type":"url","startDate":5,"workspace":"all"}"#).unwrap();
        assert_eq!(filter.clip_type, Some(ClipType::Url));
        assert_eq!(filter.start_date, Some(5));
    }
}
