//! Residue-to-residue correspondence between two chains
//!
//! A correspondence is two parallel index arrays: position `i` pairs residue
//! `first[i]` of chain 0 with residue `second[i]` of chain 1. Indices are
//! expected to increase along each chain; a jump of more than one between
//! consecutive positions marks an insertion or deletion.

use crate::error::{ScoreError, ScoreResult};

/// Ordered residue correspondence between two chains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correspondence {
    first: Vec<usize>,
    second: Vec<usize>,
}

impl Correspondence {
    /// Build from two parallel index arrays of equal length.
    pub fn new(first: Vec<usize>, second: Vec<usize>) -> ScoreResult<Self> {
        if first.len() != second.len() {
            return Err(ScoreError::LengthMismatch(first.len(), second.len()));
        }
        Ok(Self { first, second })
    }

    /// Build from `(chain0_index, chain1_index)` pairs.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        let (first, second) = pairs.iter().copied().unzip();
        Self { first, second }
    }

    /// Map residue `i` to residue `i` for `i` in `0..n`.
    pub fn identity(n: usize) -> Self {
        Self {
            first: (0..n).collect(),
            second: (0..n).collect(),
        }
    }

    /// Number of aligned pairs (`L_aligned`)
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Chain 0 residue indices
    pub fn first(&self) -> &[usize] {
        &self.first
    }

    /// Chain 1 residue indices
    pub fn second(&self) -> &[usize] {
        &self.second
    }

    /// Residue pair at `position`
    pub fn pair(&self, position: usize) -> (usize, usize) {
        (self.first[position], self.second[position])
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.first.iter().copied().zip(self.second.iter().copied())
    }

    /// Check every index against the lengths of the two chains.
    pub fn validate(&self, len_first: usize, len_second: usize) -> ScoreResult<()> {
        for (position, (a, b)) in self.pairs().enumerate() {
            if a >= len_first {
                return Err(ScoreError::PairOutOfBounds {
                    position,
                    chain: 0,
                    index: a,
                    len: len_first,
                });
            }
            if b >= len_second {
                return Err(ScoreError::PairOutOfBounds {
                    position,
                    chain: 1,
                    index: b,
                    len: len_second,
                });
            }
        }
        Ok(())
    }

    /// True when either chain's index jumps by more than one going from
    /// position `from` to position `to`.
    pub fn has_gap(&self, from: usize, to: usize) -> bool {
        let jump = |v: &[usize]| v[to] as i64 - v[from] as i64 > 1;
        jump(&self.first) || jump(&self.second)
    }

    /// Gather the chain 0 and chain 1 coordinates for every position.
    pub(crate) fn gather(
        &self,
        first: &[[f64; 3]],
        second: &[[f64; 3]],
    ) -> (Vec<[f64; 3]>, Vec<[f64; 3]>) {
        (
            self.first.iter().map(|&i| first[i]).collect(),
            self.second.iter().map(|&i| second[i]).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_uneven_arrays() {
        let err = Correspondence::new(vec![0, 1, 2], vec![0, 1]).unwrap_err();
        assert_eq!(err, ScoreError::LengthMismatch(3, 2));
    }

    #[test]
    fn test_from_pairs_round_trip() {
        let corr = Correspondence::from_pairs(&[(0, 2), (1, 3), (4, 5)]);
        assert_eq!(corr.len(), 3);
        assert_eq!(corr.first(), &[0, 1, 4]);
        assert_eq!(corr.second(), &[2, 3, 5]);
        assert_eq!(corr.pair(2), (4, 5));
    }

    #[test]
    fn test_validate_reports_offending_chain() {
        let corr = Correspondence::from_pairs(&[(0, 0), (1, 9)]);
        assert!(corr.validate(5, 10).is_ok());
        match corr.validate(5, 9) {
            Err(ScoreError::PairOutOfBounds { position, chain, index, len }) => {
                assert_eq!((position, chain, index, len), (1, 1, 9, 9));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_has_gap_in_either_chain() {
        let corr = Correspondence::from_pairs(&[(0, 0), (1, 1), (2, 5), (6, 6), (7, 7)]);
        assert!(!corr.has_gap(0, 1));
        assert!(corr.has_gap(1, 2)); // chain 1 jumps 1 -> 5
        assert!(corr.has_gap(2, 3)); // chain 0 jumps 2 -> 6
        assert!(!corr.has_gap(3, 4));
        // non-adjacent positions of a contiguous stretch
        assert!(corr.has_gap(0, 2));
    }

    #[test]
    fn test_gather_follows_indices() {
        let a = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let b = vec![[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]];
        let corr = Correspondence::from_pairs(&[(2, 0), (0, 1)]);
        let (ga, gb) = corr.gather(&a, &b);
        assert_eq!(ga, vec![[2.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        assert_eq!(gb, vec![[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]]);
    }
}
