//! Capacity and age eviction
//!
//! Both passes only ever drop unpinned clips and keep the relative order of
//! the survivors.

use crate::domain::{Clip, DAY_MS};

/// Keep every pinned clip plus the first `max` unpinned clips
///
/// Returns the number of clips dropped.
pub fn evict_by_size(clips: &mut Vec<Clip>, max: usize) -> usize {
    let before = clips.len();
    let mut unpinned_seen = 0usize;
    clips.retain(|clip| {
        if clip.pinned {
            return true;
        }
        unpinned_seen += 1;
        unpinned_seen <= max
    });
    before - clips.len()
}

/// Drop unpinned clips last touched more than `days` days before `now`
///
/// `days == 0` disables age eviction. Returns the number of clips dropped.
pub fn evict_by_age(clips: &mut Vec<Clip>, days: u32, now: i64) -> usize {
    if days == 0 {
        return 0;
    }
    let cutoff = now - i64::from(days) * DAY_MS;
    let before = clips.len();
    clips.retain(|clip| clip.pinned || clip.timestamp >= cutoff);
    before - clips.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClipType, Source};
    use proptest::prelude::*;

    fn clip(n: usize, pinned: bool, timestamp: i64) -> Clip {
        let mut clip = Clip::new(format!("clip {n}"), ClipType::Text, Source::default(), "default", timestamp);
        clip.pinned = pinned;
        clip
    }

    #[test]
    fn test_size_eviction_drops_oldest_unpinned() {
        let mut clips = vec![clip(0, false, 5), clip(1, true, 4), clip(2, false, 3), clip(3, false, 2)];
        let dropped = evict_by_size(&mut clips, 2);

        assert_eq!(dropped, 1);
        let contents: Vec<_> = clips.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["clip 0", "clip 1", "clip 2"]);
    }

    #[test]
    fn test_size_eviction_never_drops_pinned() {
        let mut clips = vec![clip(0, true, 3), clip(1, true, 2), clip(2, true, 1)];
        assert_eq!(evict_by_size(&mut clips, 1), 0);
        assert_eq!(clips.len(), 3);
    }

    #[test]
    fn test_age_eviction() {
        let now = 10 * DAY_MS;
        let mut clips = vec![
            clip(0, false, now),
            clip(1, false, now - 3 * DAY_MS),
            clip(2, true, now - 9 * DAY_MS),
            clip(3, false, now - 8 * DAY_MS),
        ];
        let dropped = evict_by_age(&mut clips, 7, now);

        assert_eq!(dropped, 1);
        assert!(clips.iter().all(|c| c.content != "clip 3"));
        assert!(clips.iter().any(|c| c.content == "clip 2"));
    }

    #[test]
    fn test_age_eviction_disabled_at_zero() {
        let mut clips = vec![clip(0, false, 0)];
        assert_eq!(evict_by_age(&mut clips, 0, 1000 * DAY_MS), 0);
        assert_eq!(clips.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_size_eviction_preserves_pinned(pins in proptest::collection::vec(any::<bool>(), 0..60), max in 1usize..20) {
            let original: Vec<Clip> = pins.iter().enumerate().map(|(i, p)| clip(i, *p, 0)).collect();
            let mut clips = original.clone();
            evict_by_size(&mut clips, max);

            let unpinned = clips.iter().filter(|c| !c.pinned).count();
            prop_assert!(unpinned <= max);

            let pinned_before: Vec<_> = original.iter().filter(|c| c.pinned).map(|c| c.id.clone()).collect();
            let pinned_after: Vec<_> = clips.iter().filter(|c| c.pinned).map(|c| c.id.clone()).collect();
            prop_assert_eq!(pinned_before, pinned_after);

            // Survivors keep their relative order
            let positions: Vec<usize> = clips
                .iter()
                .map(|c| original.iter().position(|o| o.id == c.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

            // Deterministic: running it again is a no-op
            let mut again = clips.clone();
            prop_assert_eq!(evict_by_size(&mut again, max), 0);
        }
    }
}
