//! A sparse vector over a strongly-typed index domain, tracking dense
//! columns of the constraint matrix and intermediate simplex vectors
//! (`a_q`, `rho`, `d`).
//!
//! Mirrors `SparseVector<IndexType>` in OR-Tools' `sparse_vector.h`: entries
//! may be appended out of order and with duplicate indices; `clean_up`
//! collapses duplicates (last write wins, matching `std::stable_sort` +
//! fold), drops exact zeros, and leaves entries sorted ascending by index.
//! Every read-oriented method other than `set_coefficient`/`clean_up` itself
//! assumes the vector is already clean; this is checked with `debug_assert!`
//! rather than at runtime, matching the header's zero-overhead-in-release
//! stance.

use crate::types::{EPSILON, Fractional};
use std::cell::Cell;
use std::collections::HashSet;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry<Idx> {
    index: Idx,
    coefficient: Fractional,
}

/// A sparse vector indexed by `Idx` (typically `RowIndex` or `ColIndex`).
#[derive(Debug, Clone)]
pub struct SparseVector<Idx> {
    entries: Vec<Entry<Idx>>,
    cleaned_up: bool,
    /// Caches a confirmed "no duplicate indices" result from
    /// `check_no_duplicates`, mirroring `may_contain_duplicates_` in
    /// `sparse_vector.h`: any mutation that could introduce a duplicate
    /// (`set_coefficient`, a permutation) clears it, so a caller that calls
    /// `check_no_duplicates` repeatedly between mutations only pays for the
    /// O(num_entries) scan once.
    no_duplicates_confirmed: Cell<bool>,
    _marker: PhantomData<Idx>,
}

impl<Idx> Default for SparseVector<Idx> {
    fn default() -> Self {
        SparseVector { entries: Vec::new(), cleaned_up: true, no_duplicates_confirmed: Cell::new(true), _marker: PhantomData }
    }
}

impl<Idx> SparseVector<Idx>
where
    Idx: Copy + PartialEq + PartialOrd + Ord + Into<usize>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SparseVector {
            entries: Vec::with_capacity(capacity),
            cleaned_up: true,
            no_duplicates_confirmed: Cell::new(true),
            _marker: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn is_clean(&self) -> bool {
        self.cleaned_up
    }

    /// Appends `(index, coefficient)` without maintaining sortedness or
    /// uniqueness — the caller must `clean_up` before relying on either.
    pub fn set_coefficient(&mut self, index: Idx, coefficient: Fractional) {
        self.entries.push(Entry { index, coefficient });
        self.cleaned_up = false;
        self.no_duplicates_confirmed.set(false);
    }

    /// Sorts by index (stable, so the last `set_coefficient` for a repeated
    /// index wins after folding), merges duplicate indices by keeping the
    /// last value written, and drops exact zeros.
    pub fn clean_up(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.entries.sort_by(|a, b| a.index.cmp(&b.index));
        let mut merged: Vec<Entry<Idx>> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.index == entry.index {
                    last.coefficient = entry.coefficient;
                    continue;
                }
            }
            merged.push(entry);
        }
        merged.retain(|e| e.coefficient != 0.0);
        self.entries = merged;
        self.cleaned_up = true;
        self.no_duplicates_confirmed.set(true);
    }

    /// Confirms the vector holds no two entries with the same index,
    /// regardless of entry order. The result is cached in
    /// `no_duplicates_confirmed`: once a scan comes back clean, repeat calls
    /// are O(1) until the next mutation that could introduce a duplicate.
    pub fn check_no_duplicates(&self) -> bool {
        if self.no_duplicates_confirmed.get() {
            return true;
        }
        let mut seen: HashSet<usize> = HashSet::with_capacity(self.entries.len());
        let no_duplicates = self.entries.iter().all(|e| seen.insert(e.index.into()));
        if no_duplicates {
            self.no_duplicates_confirmed.set(true);
        }
        no_duplicates
    }

    pub fn iter(&self) -> impl Iterator<Item = (Idx, Fractional)> + '_ {
        self.entries.iter().map(|e| (e.index, e.coefficient))
    }

    pub fn look_up_coefficient(&self, index: Idx) -> Fractional {
        debug_assert!(self.cleaned_up, "look_up_coefficient requires a clean vector");
        match self.entries.binary_search_by(|e| e.index.cmp(&index)) {
            Ok(pos) => self.entries[pos].coefficient,
            Err(_) => 0.0,
        }
    }

    pub fn multiply_by_constant(&mut self, factor: Fractional) {
        for entry in &mut self.entries {
            entry.coefficient *= factor;
        }
        if factor == 0.0 {
            self.entries.clear();
        }
    }

    /// Copies entries into a dense slice indexed by `Into<usize>`.
    pub fn copy_to_dense(&self, dense: &mut [Fractional]) {
        for value in dense.iter_mut() {
            *value = 0.0;
        }
        for entry in &self.entries {
            dense[entry.index.into()] = entry.coefficient;
        }
    }

    /// `dense += multiplier * self`, without touching entries of `dense`
    /// that this vector has no entry for.
    pub fn add_multiple_to_dense_vector(&self, multiplier: Fractional, dense: &mut [Fractional]) {
        if multiplier == 0.0 {
            return;
        }
        for entry in &self.entries {
            dense[entry.index.into()] += multiplier * entry.coefficient;
        }
    }

    /// `self := self + multiplier * other`, deleting entries whose summed
    /// magnitude falls under the compensated-cancellation threshold.
    ///
    /// This is the two-pointer merge from
    /// `AddMultipleToSparseVectorAndDeleteCommonIndex` in `sparse_vector.h`:
    /// an entry surviving in both operands is dropped when
    /// `|sum| <= 2 * epsilon * max(|multiplier * other_coeff|, |self_coeff|)`,
    /// the same rule used there to avoid keeping near-cancellation noise.
    pub fn add_multiple_and_delete_common_index(&mut self, multiplier: Fractional, other: &SparseVector<Idx>) {
        debug_assert!(self.cleaned_up && other.cleaned_up);
        if multiplier == 0.0 {
            return;
        }
        let mut merged: Vec<Entry<Idx>> = Vec::with_capacity(self.entries.len() + other.entries.len());
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.entries.len() && j < other.entries.len() {
            let a = self.entries[i];
            let b = other.entries[j];
            if a.index < b.index {
                merged.push(a);
                i += 1;
            } else if b.index < a.index {
                let scaled = multiplier * b.coefficient;
                merged.push(Entry { index: b.index, coefficient: scaled });
                j += 1;
            } else {
                let scaled = multiplier * b.coefficient;
                let sum = a.coefficient + scaled;
                let threshold = 2.0 * EPSILON * scaled.abs().max(a.coefficient.abs());
                if sum.abs() > threshold {
                    merged.push(Entry { index: a.index, coefficient: sum });
                }
                i += 1;
                j += 1;
            }
        }
        while i < self.entries.len() {
            merged.push(self.entries[i]);
            i += 1;
        }
        while j < other.entries.len() {
            let b = other.entries[j];
            merged.push(Entry { index: b.index, coefficient: multiplier * b.coefficient });
            j += 1;
        }
        self.entries = merged;
        self.cleaned_up = true;
        self.no_duplicates_confirmed.set(true);
    }

    /// Same merge but keeps no entry at a shared index at all, matching
    /// `AddMultipleToSparseVectorAndIgnoreCommonIndex` — used when the caller
    /// knows the common indices are meant to cancel exactly (e.g. the
    /// pivot column against itself during an eta update).
    pub fn add_multiple_and_ignore_common_index(&mut self, multiplier: Fractional, other: &SparseVector<Idx>) {
        debug_assert!(self.cleaned_up && other.cleaned_up);
        if multiplier == 0.0 {
            return;
        }
        let mut merged: Vec<Entry<Idx>> = Vec::with_capacity(self.entries.len() + other.entries.len());
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.entries.len() && j < other.entries.len() {
            let a = self.entries[i];
            let b = other.entries[j];
            if a.index < b.index {
                merged.push(a);
                i += 1;
            } else if b.index < a.index {
                merged.push(Entry { index: b.index, coefficient: multiplier * b.coefficient });
                j += 1;
            } else {
                i += 1;
                j += 1;
            }
        }
        while i < self.entries.len() {
            merged.push(self.entries[i]);
            i += 1;
        }
        while j < other.entries.len() {
            let b = other.entries[j];
            merged.push(Entry { index: b.index, coefficient: multiplier * b.coefficient });
            j += 1;
        }
        self.entries = merged;
        self.cleaned_up = true;
        self.no_duplicates_confirmed.set(true);
    }

    pub fn remove_near_zero_entries(&mut self, threshold: Fractional) {
        self.entries.retain(|e| e.coefficient.abs() > threshold);
    }

    /// Same as `remove_near_zero_entries`, but each entry's magnitude is
    /// scaled by `weights[index]` before the comparison, matching
    /// `RemoveNearZeroEntriesWithWeights` — used where a per-index scale (a
    /// column norm, a row weight) should factor into what counts as
    /// negligible rather than the raw coefficient.
    pub fn remove_near_zero_entries_with_weights(&mut self, threshold: Fractional, weights: &[Fractional]) {
        self.entries.retain(|e| e.coefficient.abs() * weights[e.index.into()] > threshold);
    }

    /// Swaps the entry at `index` (if present) into the first storage slot.
    /// Requires no duplicate indices; breaks index-sorted order, so
    /// `is_clean` no longer holds afterward.
    pub fn move_to_first_position(&mut self, index: Idx) {
        debug_assert!(self.check_no_duplicates());
        if let Some(pos) = self.entries.iter().position(|e| e.index == index) {
            self.entries.swap(0, pos);
            self.cleaned_up = false;
        }
    }

    /// Swaps the entry at `index` (if present) into the last storage slot.
    /// Same caveats as `move_to_first_position`.
    pub fn move_to_last_position(&mut self, index: Idx) {
        debug_assert!(self.check_no_duplicates());
        if let Some(pos) = self.entries.iter().position(|e| e.index == index) {
            let last = self.entries.len() - 1;
            self.entries.swap(last, pos);
            self.cleaned_up = false;
        }
    }

    /// `entry.coefficient *= factors[entry.index]` for every entry
    /// (`ComponentWiseMultiply`). A factor of zero can introduce a zero
    /// entry, so the vector is marked dirty until the next `clean_up`.
    pub fn component_wise_multiply(&mut self, factors: &[Fractional]) {
        for entry in &mut self.entries {
            entry.coefficient *= factors[entry.index.into()];
        }
        self.cleaned_up = false;
    }

    /// `entry.coefficient /= factors[entry.index]` for every entry
    /// (`ComponentWiseDivide`).
    pub fn component_wise_divide(&mut self, factors: &[Fractional]) {
        for entry in &mut self.entries {
            entry.coefficient /= factors[entry.index.into()];
        }
        self.cleaned_up = false;
    }

    /// Relabels every entry's index through a dense total permutation:
    /// `new_index_of[old_index]` gives the index the entry moves to
    /// (`ApplyIndexPermutation`). The result is no longer assumed sorted or
    /// duplicate-free, since an arbitrary permutation can collide two
    /// indices together.
    pub fn permute(&mut self, new_index_of: &[Idx]) {
        for entry in &mut self.entries {
            entry.index = new_index_of[entry.index.into()];
        }
        self.cleaned_up = false;
        self.no_duplicates_confirmed.set(false);
    }

    /// Same as `permute`, but an entry whose mapping is `None` is dropped
    /// instead of relabeled (`ApplyPartialIndexPermutation`) — used when a
    /// permutation only covers a subset of indices (e.g. the structural
    /// columns surviving a basis change) and the rest should vanish.
    pub fn permute_partial(&mut self, new_index_of: &[Option<Idx>]) {
        let mut kept: Vec<Entry<Idx>> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if let Some(new_index) = new_index_of[entry.index.into()] {
                kept.push(Entry { index: new_index, coefficient: entry.coefficient });
            }
        }
        self.entries = kept;
        self.cleaned_up = false;
        self.no_duplicates_confirmed.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowIndex;

    #[test]
    fn clean_up_sorts_merges_and_drops_zeros() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(3), 1.0);
        v.set_coefficient(RowIndex(1), 2.0);
        v.set_coefficient(RowIndex(3), 5.0); // overwrite: last write wins
        v.set_coefficient(RowIndex(2), 0.0); // dropped as zero
        v.clean_up();
        assert!(v.is_clean());
        let entries: Vec<_> = v.iter().collect();
        assert_eq!(entries, vec![(RowIndex(1), 2.0), (RowIndex(3), 5.0)]);
    }

    #[test]
    fn look_up_missing_index_is_zero() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 4.0);
        v.clean_up();
        assert_eq!(v.look_up_coefficient(RowIndex(0)), 4.0);
        assert_eq!(v.look_up_coefficient(RowIndex(9)), 0.0);
    }

    #[test]
    fn add_multiple_merges_sorted_vectors() {
        let mut a: SparseVector<RowIndex> = SparseVector::new();
        a.set_coefficient(RowIndex(0), 1.0);
        a.set_coefficient(RowIndex(2), 3.0);
        a.clean_up();

        let mut b: SparseVector<RowIndex> = SparseVector::new();
        b.set_coefficient(RowIndex(1), 10.0);
        b.set_coefficient(RowIndex(2), 1.0);
        b.clean_up();

        a.add_multiple_and_delete_common_index(2.0, &b);
        let entries: Vec<_> = a.iter().collect();
        // row 0: unchanged 1.0; row 1: 0 + 2*10 = 20; row 2: 3 + 2*1 = 5
        assert_eq!(entries, vec![(RowIndex(0), 1.0), (RowIndex(1), 20.0), (RowIndex(2), 5.0)]);
    }

    #[test]
    fn add_multiple_prunes_near_cancellation() {
        let mut a: SparseVector<RowIndex> = SparseVector::new();
        a.set_coefficient(RowIndex(0), 1.0);
        a.clean_up();
        let mut b: SparseVector<RowIndex> = SparseVector::new();
        b.set_coefficient(RowIndex(0), 0.5);
        b.clean_up();
        // -2.0 * 0.5 + 1.0 = 0.0 exactly -> pruned.
        a.add_multiple_and_delete_common_index(-2.0, &b);
        assert!(a.is_empty());
    }

    #[test]
    fn multiply_by_zero_clears_the_vector() {
        let mut a: SparseVector<RowIndex> = SparseVector::new();
        a.set_coefficient(RowIndex(0), 3.0);
        a.clean_up();
        a.multiply_by_constant(0.0);
        assert!(a.is_empty());
    }

    #[test]
    fn copy_to_dense_zeros_untouched_slots() {
        let mut a: SparseVector<RowIndex> = SparseVector::new();
        a.set_coefficient(RowIndex(2), 7.0);
        a.clean_up();
        let mut dense = vec![9.0, 9.0, 9.0];
        a.copy_to_dense(&mut dense);
        assert_eq!(dense, vec![0.0, 0.0, 7.0]);
    }

    #[test]
    fn check_no_duplicates_catches_unsorted_repeats() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(2), 1.0);
        v.set_coefficient(RowIndex(0), 1.0);
        v.set_coefficient(RowIndex(2), 2.0); // duplicate of the first entry, not adjacent
        assert!(!v.check_no_duplicates());
    }

    #[test]
    fn check_no_duplicates_result_is_cached_until_the_next_mutation() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 1.0);
        v.set_coefficient(RowIndex(1), 2.0);
        assert!(v.check_no_duplicates());
        assert!(v.no_duplicates_confirmed.get());
        v.set_coefficient(RowIndex(2), 3.0);
        assert!(!v.no_duplicates_confirmed.get());
        assert!(v.check_no_duplicates());
    }

    #[test]
    fn move_to_first_and_last_position_swap_entries() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 1.0);
        v.set_coefficient(RowIndex(1), 2.0);
        v.set_coefficient(RowIndex(2), 3.0);
        v.clean_up();
        v.move_to_last_position(RowIndex(0));
        v.move_to_first_position(RowIndex(2));
        let entries: Vec<_> = v.iter().collect();
        assert_eq!(entries[0], (RowIndex(2), 3.0));
        assert_eq!(entries[entries.len() - 1], (RowIndex(0), 1.0));
        assert!(!v.is_clean());
    }

    #[test]
    fn component_wise_multiply_and_divide_scale_each_entry_by_its_own_factor() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 2.0);
        v.set_coefficient(RowIndex(1), 4.0);
        v.clean_up();
        v.component_wise_multiply(&[3.0, 5.0]);
        v.clean_up();
        assert_eq!(v.look_up_coefficient(RowIndex(0)), 6.0);
        assert_eq!(v.look_up_coefficient(RowIndex(1)), 20.0);
        v.component_wise_divide(&[3.0, 5.0]);
        v.clean_up();
        assert_eq!(v.look_up_coefficient(RowIndex(0)), 2.0);
        assert_eq!(v.look_up_coefficient(RowIndex(1)), 4.0);
    }

    #[test]
    fn remove_near_zero_entries_with_weights_uses_a_per_index_scale() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 1.0); // weight 10 -> scaled 10, survives
        v.set_coefficient(RowIndex(1), 1.0); // weight 0.1 -> scaled 0.1, pruned
        v.clean_up();
        v.remove_near_zero_entries_with_weights(1.0, &[10.0, 0.1]);
        let entries: Vec<_> = v.iter().collect();
        assert_eq!(entries, vec![(RowIndex(0), 1.0)]);
    }

    #[test]
    fn permute_relabels_every_entry() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 1.0);
        v.set_coefficient(RowIndex(1), 2.0);
        v.clean_up();
        v.permute(&[RowIndex(1), RowIndex(0)]);
        v.clean_up();
        assert_eq!(v.look_up_coefficient(RowIndex(0)), 2.0);
        assert_eq!(v.look_up_coefficient(RowIndex(1)), 1.0);
    }

    #[test]
    fn permute_partial_drops_unmapped_entries() {
        let mut v: SparseVector<RowIndex> = SparseVector::new();
        v.set_coefficient(RowIndex(0), 1.0);
        v.set_coefficient(RowIndex(1), 2.0);
        v.clean_up();
        v.permute_partial(&[Some(RowIndex(5)), None]);
        v.clean_up();
        let entries: Vec<_> = v.iter().collect();
        assert_eq!(entries, vec![(RowIndex(5), 1.0)]);
    }
}
