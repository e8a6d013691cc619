//! Merging algebra over closed integer line ranges.
//!
//! An [`IntervalSet`] holds pairwise disjoint, non-adjacent `(start, end)`
//! ranges. Adjacent inserts coalesce, so `[(1,5),(10,12)]` plus `(6,9)`
//! collapses to `[(1,12)]`. Used both for reporting which contiguous line
//! ranges of a file correlate with a change elsewhere and for building the
//! merged line ranges fed into merge simulation.

use serde::{Deserialize, Serialize};

/// A closed integer range. `start <= end` always holds.
pub type Interval = (u32, u32);

/// A list of disjoint, non-adjacent intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from arbitrary single line numbers, collapsing runs of
    /// consecutive lines into intervals.
    pub fn from_lines(mut lines: Vec<u32>) -> Self {
        let mut set = Self::new();
        if lines.is_empty() {
            return set;
        }
        lines.sort_unstable();
        lines.dedup();

        let mut start = lines[0];
        let mut end = lines[0];
        for &line in &lines[1..] {
            if line == end + 1 {
                end = line;
            } else {
                set.intervals.push((start, end));
                start = line;
                end = line;
            }
        }
        set.intervals.push((start, end));
        set
    }

    /// True iff some existing interval fully covers `(a, b)`.
    pub fn contains(&self, interval: Interval) -> bool {
        self.intervals
            .iter()
            .any(|&(a, b)| a <= interval.0 && interval.1 <= b)
    }

    /// Inserts `(a, b)`, merging with the interval ending at `a - 1`
    /// (merge-left) and/or the one starting at `b + 1` (merge-right) into a
    /// single combined interval. The disjoint/non-adjacent invariant
    /// guarantees at most one candidate on each side; intervals overlapping
    /// the insert are absorbed the same way, so the invariant is
    /// re-established for any insertion sequence.
    pub fn insert(&mut self, interval: Interval) {
        debug_assert!(interval.0 <= interval.1);

        let (mut start, mut end) = interval;
        let mut kept = Vec::with_capacity(self.intervals.len() + 1);
        for &(a, b) in &self.intervals {
            let adjacent_or_overlapping =
                a <= end.saturating_add(1) && start <= b.saturating_add(1);
            if adjacent_or_overlapping {
                start = start.min(a);
                end = end.max(b);
            } else {
                kept.push((a, b));
            }
        }
        kept.push((start, end));
        self.intervals = kept;
    }

    /// Intervals in ascending order of start line.
    pub fn sorted(&self) -> Vec<Interval> {
        let mut out = self.intervals.clone();
        out.sort_unstable();
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        let mut set = Self::new();
        for interval in iter {
            set.insert(interval);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contains_covered_interval() {
        let set: IntervalSet = [(1, 5), (10, 12)].into_iter().collect();
        assert!(set.contains((2, 4)));
        assert!(set.contains((1, 5)));
        assert!(set.contains((10, 10)));
        assert!(!set.contains((4, 11)));
        assert!(!set.contains((6, 9)));
    }

    #[test]
    fn insert_without_neighbors_appends() {
        let mut set = IntervalSet::new();
        set.insert((3, 7));
        set.insert((20, 25));
        assert_eq!(set.sorted(), vec![(3, 7), (20, 25)]);
    }

    #[test]
    fn insert_merges_left() {
        let mut set: IntervalSet = [(1, 5)].into_iter().collect();
        set.insert((6, 9));
        assert_eq!(set.sorted(), vec![(1, 9)]);
    }

    #[test]
    fn insert_merges_right() {
        let mut set: IntervalSet = [(10, 12)].into_iter().collect();
        set.insert((6, 9));
        assert_eq!(set.sorted(), vec![(6, 12)]);
    }

    #[test]
    fn insert_merges_both_sides_in_one_call() {
        let mut set: IntervalSet = [(1, 5), (10, 12)].into_iter().collect();
        set.insert((6, 9));
        assert_eq!(set.sorted(), vec![(1, 12)]);
    }

    #[test]
    fn insert_at_line_zero_does_not_underflow() {
        let mut set: IntervalSet = [(5, 8)].into_iter().collect();
        set.insert((0, 2));
        assert_eq!(set.sorted(), vec![(0, 2), (5, 8)]);
    }

    #[test]
    fn from_lines_collapses_runs() {
        let set = IntervalSet::from_lines(vec![4, 1, 2, 3, 9, 8, 15]);
        assert_eq!(set.sorted(), vec![(1, 4), (8, 9), (15, 15)]);
    }

    #[test]
    fn from_lines_empty() {
        assert!(IntervalSet::from_lines(vec![]).is_empty());
    }

    fn invariant_holds(set: &IntervalSet) -> bool {
        let sorted = set.sorted();
        sorted.windows(2).all(|w| {
            let (_, end_a) = w[0];
            let (start_b, _) = w[1];
            // Disjoint and non-adjacent: a gap of at least one line.
            start_b > end_a + 1
        })
    }

    proptest! {
        #[test]
        fn insert_preserves_disjoint_non_adjacent(
            points in proptest::collection::vec((0u32..200, 0u32..20), 0..40)
        ) {
            let mut set = IntervalSet::new();
            for (start, width) in points {
                set.insert((start, start + width));
            }
            prop_assert!(invariant_holds(&set));
        }

        #[test]
        fn contains_after_insert(
            points in proptest::collection::vec((0u32..200, 0u32..20), 1..40)
        ) {
            let mut set = IntervalSet::new();
            for &(start, width) in &points {
                set.insert((start, start + width));
            }
            for (start, width) in points {
                prop_assert!(set.contains((start, start + width)));
            }
        }
    }
}
