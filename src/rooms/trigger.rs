//! Enter/exit deduplication for volumes made of several colliders
//!
//! A room area is usually built from many trigger colliders. A body crossing
//! from one sub-collider into the next produces an enter before the matching
//! exit, which must not look like leaving and re-entering the area.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerPhase {
    Enter,
    Exit,
}

/// Overlap count per body; fires on 0 → 1 and 1 → 0 only
#[derive(Debug, Clone)]
pub struct CompoundTriggerCounter<K> {
    counts: HashMap<K, u32>,
}

impl<K> Default for CompoundTriggerCounter<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> CompoundTriggerCounter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sub-collider started overlapping `key`. True if the whole volume was entered.
    pub fn on_enter(&mut self, key: K) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// A sub-collider stopped overlapping `key`. True if the whole volume was left.
    pub fn on_exit(&mut self, key: K) -> bool {
        match self.counts.get_mut(&key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(&key);
                true
            }
            None => {
                log::debug!("Ignoring exit of {key:?} without a matching enter");
                false
            }
        }
    }

    /// Feed a raw sub-collider event; returns the volume-level event, if any
    pub fn apply(&mut self, key: K, phase: TriggerPhase) -> Option<TriggerPhase> {
        let fired = match phase {
            TriggerPhase::Enter => self.on_enter(key),
            TriggerPhase::Exit => self.on_exit(key),
        };
        fired.then_some(phase)
    }

    pub fn count(&self, key: K) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: K) -> bool {
        self.count(key) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_two_sub_colliders_fire_once() {
        let mut counter = CompoundTriggerCounter::new();
        assert!(counter.on_enter(1u32));
        assert!(!counter.on_enter(1));
        assert!(!counter.on_exit(1));
        assert!(counter.on_exit(1));
        assert!(counter.is_empty());
    }

    #[test]
    fn test_bodies_are_counted_separately() {
        let mut counter = CompoundTriggerCounter::new();
        assert!(counter.on_enter('a'));
        assert!(counter.on_enter('b'));
        assert_eq!(counter.count('a'), 1);
        assert!(counter.on_exit('a'));
        assert!(counter.contains('b'));
    }

    #[test]
    fn test_unmatched_exit_is_ignored() {
        let mut counter = CompoundTriggerCounter::new();
        assert!(!counter.on_exit(9u8));
        assert_eq!(counter.count(9), 0);
        // A later enter still fires normally
        assert!(counter.on_enter(9));
    }

    #[test]
    fn test_apply_maps_phases() {
        let mut counter = CompoundTriggerCounter::new();
        assert_eq!(counter.apply(1u8, TriggerPhase::Enter), Some(TriggerPhase::Enter));
        assert_eq!(counter.apply(1, TriggerPhase::Enter), None);
        assert_eq!(counter.apply(1, TriggerPhase::Exit), None);
        assert_eq!(counter.apply(1, TriggerPhase::Exit), Some(TriggerPhase::Exit));
    }

    #[test]
    fn test_every_overlapping_interleaving_fires_one_pair() {
        use TriggerPhase::{Enter, Exit};
        let orders = [
            [(0, Enter), (1, Enter), (0, Exit), (1, Exit)],
            [(0, Enter), (1, Enter), (1, Exit), (0, Exit)],
            [(1, Enter), (0, Enter), (0, Exit), (1, Exit)],
            [(1, Enter), (0, Enter), (1, Exit), (0, Exit)],
        ];
        for order in orders {
            let mut counter = CompoundTriggerCounter::new();
            let fired: Vec<_> = order
                .iter()
                .filter_map(|&(_sub, phase)| counter.apply("crate", phase))
                .collect();
            assert_eq!(fired, vec![Enter, Exit]);
        }
    }

    proptest! {
        /// Volume events alternate and mirror whether any sub-collider overlaps
        #[test]
        fn prop_volume_events_follow_overlap(
            ops in prop::collection::vec((0u8..4, any::<bool>()), 0..64)
        ) {
            let mut overlapping = std::collections::HashSet::new();
            let mut counter = CompoundTriggerCounter::new();
            let mut inside = false;

            for (sub, enter) in ops {
                // Only physically possible events: enter when apart, exit when overlapping
                let phase = if enter && !overlapping.contains(&sub) {
                    overlapping.insert(sub);
                    TriggerPhase::Enter
                } else if !enter && overlapping.contains(&sub) {
                    overlapping.remove(&sub);
                    TriggerPhase::Exit
                } else {
                    continue;
                };

                match counter.apply(7u32, phase) {
                    Some(TriggerPhase::Enter) => {
                        prop_assert!(!inside);
                        inside = true;
                    }
                    Some(TriggerPhase::Exit) => {
                        prop_assert!(inside);
                        inside = false;
                    }
                    None => {}
                }
                prop_assert_eq!(inside, !overlapping.is_empty());
                prop_assert_eq!(counter.count(7) as usize, overlapping.len());
            }
        }
    }
}
