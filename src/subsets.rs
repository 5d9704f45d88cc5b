//! Lazy fixed-size subset enumeration.
//!
//! Subsets come out in the order of include-first branching over the input
//! (take element 0, recurse on the rest; then skip element 0, recurse),
//! which is lexicographic order over index positions:
//!
//! ```text
//! [a, b, c, d], k = 2  ->  ab ac ad bc bd cd
//! ```
//!
//! Only one index vector is live at a time, so windows of any width can be
//! walked without recursion or materializing the whole family.

use crate::window::binomial;

/// Iterator over every `k`-element subset of a slice.
///
/// Elements within a yielded subset keep their relative order from the
/// input slice.
#[derive(Debug, Clone)]
pub struct Subsets<'a, T> {
    items: &'a [T],
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
    remaining: u128,
}

/// Enumerate every `target_size`-subset of `items`.
///
/// `target_size == 0` yields exactly one empty subset;
/// `target_size > items.len()` yields nothing.
///
/// ```
/// use pmu_partition::enumerate_subsets;
/// let subsets: Vec<Vec<char>> = enumerate_subsets(&['a', 'b', 'c'], 2).collect();
/// assert_eq!(subsets, vec![vec!['a', 'b'], vec!['a', 'c'], vec!['b', 'c']]);
/// ```
pub fn enumerate_subsets<T: Clone>(items: &[T], target_size: usize) -> Subsets<'_, T> {
    let exhausted = target_size > items.len();
    Subsets {
        items,
        indices: (0..target_size).collect(),
        started: false,
        exhausted,
        remaining: binomial(items.len(), target_size),
    }
}

impl<'a, T: Clone> Subsets<'a, T> {
    /// Subsets not yet yielded, saturating at `u128::MAX`.
    pub fn remaining(&self) -> u128 {
        self.remaining
    }

    /// Move to the next index combination. Returns false when none is left.
    fn advance(&mut self) -> bool {
        let n = self.items.len();
        let k = self.indices.len();
        // rightmost index that can still move right
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < n - k + i) else {
            return false;
        };
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        true
    }

    fn current(&self) -> Vec<T> {
        self.indices.iter().map(|&i| self.items[i].clone()).collect()
    }
}

impl<'a, T: Clone> Iterator for Subsets<'a, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
        } else if !self.advance() {
            self.exhausted = true;
            self.remaining = 0;
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        Some(self.current())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        match usize::try_from(self.remaining) {
            Ok(n) if self.remaining != u128::MAX => (n, Some(n)),
            _ => (usize::MAX, None),
        }
    }
}

impl<'a, T: Clone> std::iter::FusedIterator for Subsets<'a, T> {}
