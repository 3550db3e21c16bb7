//! Run-length encoded map over a contiguous index range.
//!
//! ## Design
//!
//! Stores `(value, length)` pairs in order. Terminal rows compress extremely
//! well under this scheme: a plain ASCII line is a single run, and a line
//! with `k` glyph-width transitions needs `k` runs, so lookups and rewrites
//! cost O(runs touched) rather than O(columns).
//!
//! The map is kept in canonical form at all times: no zero-length runs, and
//! no two adjacent runs with the same value. [`Rle::replace`] and
//! [`Rle::resize_trailing_extent`] restore canonical form on every call, so
//! structural equality over the runs is meaningful.
//!
//! Run lengths are 16-bit. An operation that would need a longer single run
//! fails with [`RowError::CapacityExceeded`] before any state is modified.

use smallvec::SmallVec;

use crate::error::RowError;

/// A single `(value, length)` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<T> {
    /// The value repeated across the run.
    pub value: T,
    /// Number of indices the run covers. Never zero in a stored run.
    pub length: u16,
}

impl<T> Run<T> {
    /// Create a new run.
    #[must_use]
    #[inline]
    pub const fn new(value: T, length: u16) -> Self {
        Self { value, length }
    }
}

/// Run-length encoded map from index to value.
///
/// Most rows need only a handful of runs, so a small inline buffer keeps the
/// common case off the heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle<T: Copy + Eq> {
    runs: SmallVec<[Run<T>; 4]>,
    total: usize,
}

impl<T: Copy + Eq> Default for Rle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq> Rle<T> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: SmallVec::new(),
            total: 0,
        }
    }

    /// Create a map consisting of a single run.
    #[must_use]
    pub fn from_run(value: T, length: u16) -> Self {
        let mut rle = Self::new();
        if length > 0 {
            rle.runs.push(Run::new(value, length));
            rle.total = usize::from(length);
        }
        rle
    }

    /// Total number of indices covered.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.total
    }

    /// Check if the map covers no indices.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of stored runs.
    #[must_use]
    #[inline]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// The runs, in index order.
    #[must_use]
    #[inline]
    pub fn runs(&self) -> &[Run<T>] {
        &self.runs
    }

    /// Value at `idx`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<T> {
        if idx >= self.total {
            return None;
        }
        let mut start = 0usize;
        for run in &self.runs {
            let end = start + usize::from(run.length);
            if idx < end {
                return Some(run.value);
            }
            start = end;
        }
        None
    }

    /// Append a single index with the given value.
    pub fn push(&mut self, value: T) -> Result<(), RowError> {
        self.extend_with(value, 1)
    }

    /// Append `length` indices with the given value, merging into the final
    /// run when the values match.
    pub fn extend_with(&mut self, value: T, length: u16) -> Result<(), RowError> {
        if length == 0 {
            return Ok(());
        }
        if let Some(last) = self.runs.last_mut() {
            if last.value == value {
                let merged = usize::from(last.length) + usize::from(length);
                last.length = u16::try_from(merged)
                    .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
                self.total += usize::from(length);
                return Ok(());
            }
        }
        self.runs.push(Run::new(value, length));
        self.total += usize::from(length);
        Ok(())
    }

    /// Substitute the index range `[begin, end)` with the concatenation of
    /// `new_runs`.
    ///
    /// Zero-length input runs are skipped. The result is coalesced with the
    /// surviving neighbors on both sides, restoring canonical form. The
    /// replacement segment is fully built and validated before the stored
    /// runs are touched, so a failed call changes nothing.
    pub fn replace(&mut self, begin: usize, end: usize, new_runs: &[Run<T>]) -> Result<(), RowError> {
        if begin > end || end > self.total {
            return Err(RowError::InvalidArgument("replace range out of bounds"));
        }
        let inserted: usize = new_runs.iter().map(|r| usize::from(r.length)).sum();
        if begin == end && inserted == 0 {
            return Ok(());
        }

        // Locate the run containing `begin` (or the append position).
        let mut i0 = 0usize;
        let mut i0_start = 0usize;
        while i0 < self.runs.len() && i0_start + usize::from(self.runs[i0].length) <= begin {
            i0_start += usize::from(self.runs[i0].length);
            i0 += 1;
        }
        // Locate the run whose end reaches `end`.
        let mut i1 = i0;
        let mut i1_start = i0_start;
        while i1 < self.runs.len() && i1_start + usize::from(self.runs[i1].length) < end {
            i1_start += usize::from(self.runs[i1].length);
            i1 += 1;
        }

        let mut seg: SmallVec<[Run<T>; 6]> = SmallVec::new();

        // Left fragment of the run containing `begin`.
        if i0 < self.runs.len() {
            let left = begin - i0_start;
            if left > 0 {
                // left < runs[i0].length, so the cast cannot lose bits
                seg.push(Run::new(self.runs[i0].value, left as u16));
            }
        }
        for run in new_runs {
            if run.length == 0 {
                continue;
            }
            push_coalesced(&mut seg, *run)?;
        }
        // Right fragment of the run containing `end`.
        if i1 < self.runs.len() {
            let run_end = i1_start + usize::from(self.runs[i1].length);
            let right = run_end - end;
            if right > 0 {
                push_coalesced(&mut seg, Run::new(self.runs[i1].value, right as u16))?;
            }
        }

        let mut remove = if i0 < self.runs.len() { i0..(i1 + 1) } else { i0..i0 };

        // Merge with the untouched neighbors when values line up.
        if seg.is_empty() {
            // Pure deletion: the runs on either side may now meet.
            if remove.start > 0
                && remove.end < self.runs.len()
                && self.runs[remove.start - 1].value == self.runs[remove.end].value
            {
                let value = self.runs[remove.start - 1].value;
                let merged = usize::from(self.runs[remove.start - 1].length)
                    + usize::from(self.runs[remove.end].length);
                let length = u16::try_from(merged)
                    .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
                seg.push(Run::new(value, length));
                remove = (remove.start - 1)..(remove.end + 1);
            }
        } else {
            if remove.start > 0 && self.runs[remove.start - 1].value == seg[0].value {
                let merged =
                    usize::from(self.runs[remove.start - 1].length) + usize::from(seg[0].length);
                seg[0].length = u16::try_from(merged)
                    .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
                remove.start -= 1;
            }
            if remove.end < self.runs.len() {
                let last = seg.len() - 1;
                if self.runs[remove.end].value == seg[last].value {
                    let merged =
                        usize::from(self.runs[remove.end].length) + usize::from(seg[last].length);
                    seg[last].length = u16::try_from(merged)
                        .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
                    remove.end += 1;
                }
            }
        }

        self.runs.drain(remove.clone());
        self.runs.insert_many(remove.start, seg);
        self.total = self.total - (end - begin) + inserted;
        Ok(())
    }

    /// Grow or shrink the map so `size()` equals `new_total`.
    ///
    /// Shrinking truncates runs from the back. Growing extends the final run,
    /// reusing its value.
    pub fn resize_trailing_extent(&mut self, new_total: usize) -> Result<(), RowError> {
        if new_total == self.total {
            return Ok(());
        }
        if new_total < self.total {
            let mut excess = self.total - new_total;
            while excess > 0 {
                match self.runs.last_mut() {
                    None => break,
                    Some(last) => {
                        let len = usize::from(last.length);
                        if len <= excess {
                            excess -= len;
                            self.runs.pop();
                        } else {
                            // len - excess fits because len <= u16::MAX
                            last.length = (len - excess) as u16;
                            excess = 0;
                        }
                    }
                }
            }
            self.total = new_total;
            return Ok(());
        }
        let delta = new_total - self.total;
        match self.runs.last_mut() {
            None => Err(RowError::InvalidArgument("cannot extend an empty map")),
            Some(last) => {
                let merged = usize::from(last.length) + delta;
                last.length = u16::try_from(merged)
                    .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
                self.total = new_total;
                Ok(())
            }
        }
    }
}

/// Append `run` to `seg`, merging with the final run when the values match.
fn push_coalesced<T: Copy + Eq>(seg: &mut SmallVec<[Run<T>; 6]>, run: Run<T>) -> Result<(), RowError> {
    if let Some(last) = seg.last_mut() {
        if last.value == run.value {
            let merged = usize::from(last.length) + usize::from(run.length);
            last.length = u16::try_from(merged)
                .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
            return Ok(());
        }
    }
    seg.push(run);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs_of(rle: &Rle<u8>) -> Vec<(u8, u16)> {
        rle.runs().iter().map(|r| (r.value, r.length)).collect()
    }

    #[test]
    fn from_run() {
        let rle = Rle::from_run(1u8, 10);
        assert_eq!(rle.size(), 10);
        assert_eq!(rle.run_count(), 1);
        assert_eq!(rle.get(0), Some(1));
        assert_eq!(rle.get(9), Some(1));
        assert_eq!(rle.get(10), None);
    }

    #[test]
    fn extend_with_merges_equal_values() {
        let mut rle = Rle::from_run(1u8, 4);
        rle.extend_with(1, 2).unwrap();
        rle.extend_with(2, 3).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 6), (2, 3)]);
        assert_eq!(rle.size(), 9);
    }

    #[test]
    fn replace_middle_splits_run() {
        let mut rle = Rle::from_run(1u8, 10);
        rle.replace(3, 5, &[Run::new(2, 1), Run::new(0, 1)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 3), (2, 1), (0, 1), (1, 5)]);
        assert_eq!(rle.size(), 10);
    }

    #[test]
    fn replace_coalesces_both_neighbors() {
        let mut rle = Rle::from_run(1u8, 10);
        rle.replace(3, 5, &[Run::new(2, 2)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 3), (2, 2), (1, 5)]);
        // Writing 1s back over the 2s must collapse to a single run again.
        rle.replace(3, 5, &[Run::new(1, 2)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 10)]);
    }

    #[test]
    fn replace_with_different_length() {
        let mut rle = Rle::from_run(1u8, 10);
        // Two indices become three (a glyph gained a trailer).
        rle.replace(4, 6, &[Run::new(1, 1), Run::new(0, 2)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 5), (0, 2), (1, 4)]);
        assert_eq!(rle.size(), 11);
    }

    #[test]
    fn replace_skips_empty_input_runs() {
        let mut rle = Rle::from_run(1u8, 6);
        rle.replace(2, 3, &[Run::new(2, 0), Run::new(3, 1), Run::new(1, 0)])
            .unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 2), (3, 1), (1, 3)]);
    }

    #[test]
    fn replace_pure_deletion_merges_neighbors() {
        let mut rle = Rle::from_run(1u8, 4);
        rle.replace(2, 2, &[Run::new(2, 2)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 2), (2, 2), (1, 2)]);
        rle.replace(2, 4, &[]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 4)]);
        assert_eq!(rle.size(), 4);
    }

    #[test]
    fn replace_at_the_very_end_appends() {
        let mut rle = Rle::from_run(1u8, 4);
        rle.replace(4, 4, &[Run::new(2, 2)]).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 4), (2, 2)]);
    }

    #[test]
    fn replace_out_of_bounds_is_rejected() {
        let mut rle = Rle::from_run(1u8, 4);
        let err = rle.replace(3, 6, &[]).unwrap_err();
        assert_eq!(err, RowError::InvalidArgument("replace range out of bounds"));
        assert_eq!(runs_of(&rle), vec![(1, 4)]);
    }

    #[test]
    fn resize_trailing_extent_shrinks_across_runs() {
        let mut rle = Rle::from_run(1u8, 4);
        rle.extend_with(2, 4).unwrap();
        rle.resize_trailing_extent(2).unwrap();
        assert_eq!(runs_of(&rle), vec![(1, 2)]);
        assert_eq!(rle.size(), 2);
    }

    #[test]
    fn resize_trailing_extent_grows_last_run() {
        let mut rle = Rle::from_run(2u8, 3);
        rle.resize_trailing_extent(8).unwrap();
        assert_eq!(runs_of(&rle), vec![(2, 8)]);
    }

    #[test]
    fn resize_trailing_extent_rejects_growing_empty() {
        let mut rle: Rle<u8> = Rle::new();
        assert!(rle.resize_trailing_extent(4).is_err());
    }

    #[test]
    fn overlong_merge_is_capacity_exceeded() {
        let mut rle = Rle::from_run(1u8, u16::MAX);
        let err = rle.extend_with(1, 1).unwrap_err();
        assert_eq!(err, RowError::CapacityExceeded("run length overflows u16"));
        // A different value still fits as its own run.
        rle.extend_with(2, 1).unwrap();
        assert_eq!(rle.size(), usize::from(u16::MAX) + 1);
    }

    #[test]
    fn structural_equality_over_canonical_form() {
        let mut a = Rle::from_run(1u8, 10);
        a.replace(2, 4, &[Run::new(2, 2)]).unwrap();
        a.replace(2, 4, &[Run::new(1, 2)]).unwrap();
        let b = Rle::from_run(1u8, 10);
        assert_eq!(a, b);
    }
}
