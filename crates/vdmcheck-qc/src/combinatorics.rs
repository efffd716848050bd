//! Type-agnostic enumeration helpers: k-combinations, k-permutations, the
//! Cartesian selector and least-power sizing.
//!
//! All iterators yield index vectors into caller-owned slices, in
//! lexicographic order.

use smallvec::SmallVec;

/// Index tuple for one Cartesian candidate. Most products have few dimensions.
pub type Selection = SmallVec<[usize; 8]>;

/// Smallest `p >= 1` with `p^dimensions >= target`.
///
/// With one dimension this is `target` itself; with none, any `p` works and
/// the answer is 1.
pub fn least_power(dimensions: usize, target: usize) -> usize {
    if dimensions == 0 || target <= 1 {
        return 1;
    }
    if dimensions == 1 {
        return target;
    }
    let exp = u32::try_from(dimensions).unwrap_or(u32::MAX);
    let reaches = |p: usize| p.checked_pow(exp).map_or(true, |v| v >= target);
    // Float estimate, then correct for rounding in either direction.
    let mut p = ((target as f64).powf(1.0 / dimensions as f64).floor() as usize).max(1);
    while p > 1 && reaches(p - 1) {
        p -= 1;
    }
    while !reaches(p) {
        p += 1;
    }
    p
}

// === k-combinations ===

/// Lexicographic `k`-subsets of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();
        let k = self.indices.len();
        // Rightmost index that can still move right.
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}

// === k-permutations ===

/// Lexicographic ordered `k`-tuples of distinct indices from `0..n`.
#[derive(Debug, Clone)]
pub struct Permutations {
    k: usize,
    /// A full permutation of `0..n`; the first `k` entries are the current tuple.
    perm: Vec<usize>,
    done: bool,
}

impl Permutations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            k,
            perm: (0..n).collect(),
            done: k > n,
        }
    }
}

/// Standard next-permutation step. Returns false after the last permutation.
fn next_permutation(a: &mut [usize]) -> bool {
    let Some(i) = (1..a.len()).rev().find(|&i| a[i - 1] < a[i]) else {
        return false;
    };
    let pivot = i - 1;
    let Some(j) = (i..a.len()).rev().find(|&j| a[j] > a[pivot]) else {
        return false;
    };
    a.swap(pivot, j);
    a[i..].reverse();
    true
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.perm[..self.k].to_vec();
        // Reversing the tail makes next_permutation advance the prefix.
        self.perm[self.k..].reverse();
        if !next_permutation(&mut self.perm) {
            self.done = true;
        }
        Some(current)
    }
}

/// Lexicographic `k`-tuples over `0..n` with repetition allowed.
#[derive(Debug, Clone)]
pub struct PermutationsWithRepetition {
    n: usize,
    digits: Vec<usize>,
    done: bool,
}

impl PermutationsWithRepetition {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            digits: vec![0; k],
            done: n == 0 && k > 0,
        }
    }
}

impl Iterator for PermutationsWithRepetition {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.digits.clone();
        self.done = !odometer_step(&mut self.digits, |_| self.n);
        Some(current)
    }
}

/// Advance a mixed-radix counter, last digit fastest. Returns false on wrap.
fn odometer_step(digits: &mut [usize], radix: impl Fn(usize) -> usize) -> bool {
    for i in (0..digits.len()).rev() {
        digits[i] += 1;
        if digits[i] < radix(i) {
            return true;
        }
        digits[i] = 0;
    }
    false
}

// === Cartesian selector ===

/// Enumerates the Cartesian product of `sizes`, one index per dimension,
/// last dimension fastest. Any zero size makes the product empty; no
/// dimensions at all yields a single empty selection.
#[derive(Debug, Clone)]
pub struct Selector {
    sizes: Selection,
    current: Selection,
    done: bool,
}

impl Selector {
    pub fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.iter().copied().collect(),
            current: sizes.iter().map(|_| 0).collect(),
            done: sizes.contains(&0),
        }
    }

    /// Total number of selections, saturating.
    pub fn len_hint(&self) -> usize {
        self.sizes
            .iter()
            .try_fold(1usize, |acc, &s| acc.checked_mul(s))
            .unwrap_or(usize::MAX)
    }
}

impl Iterator for Selector {
    type Item = Selection;

    fn next(&mut self) -> Option<Selection> {
        if self.done {
            return None;
        }
        let current = self.current.clone();
        let sizes = &self.sizes;
        self.done = !odometer_step(&mut self.current, |i| sizes[i]);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_least_power() {
        assert_eq!(least_power(1, 10), 10);
        assert_eq!(least_power(2, 10), 4);
        assert_eq!(least_power(2, 9), 3);
        assert_eq!(least_power(3, 1000), 10);
        assert_eq!(least_power(3, 1001), 11);
        assert_eq!(least_power(0, 50), 1);
        assert_eq!(least_power(4, 1), 1);
        assert_eq!(least_power(64, usize::MAX), 2);
    }

    #[test]
    fn test_combinations() {
        let all: Vec<_> = Combinations::new(4, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![vec![]]);
        assert_eq!(Combinations::new(2, 3).count(), 0);
        assert_eq!(Combinations::new(10, 3).count(), 120);
    }

    #[test]
    fn test_permutations() {
        let all: Vec<_> = Permutations::new(3, 2).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1]
            ]
        );
        assert_eq!(Permutations::new(4, 4).count(), 24);
        assert_eq!(Permutations::new(2, 3).count(), 0);
        assert_eq!(Permutations::new(3, 0).count(), 1);
    }

    #[test]
    fn test_permutations_with_repetition() {
        let all: Vec<_> = PermutationsWithRepetition::new(2, 2).collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert_eq!(PermutationsWithRepetition::new(3, 3).count(), 27);
        assert_eq!(PermutationsWithRepetition::new(0, 2).count(), 0);
    }

    #[test]
    fn test_selector() {
        let all: Vec<Vec<usize>> = Selector::new(&[2, 3]).map(|s| s.to_vec()).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 0]);
        assert_eq!(all[1], vec![0, 1]);
        assert_eq!(all[5], vec![1, 2]);

        assert_eq!(Selector::new(&[3, 0, 2]).count(), 0);
        assert_eq!(Selector::new(&[]).count(), 1);
        assert_eq!(Selector::new(&[4, 5]).len_hint(), 20);
    }
}
