//! Best-so-far bookkeeping for the MaxSub/TM search
//!
//! Every candidate produced by the search is offered to a [`SearchState`],
//! which replaces its slots only through the acceptance predicates below.

use serde::{Deserialize, Serialize};

use crate::align::Transform;

/// Longer alignments may cost up to 3% of TM-score
const LONGER_TOLERANCE: f64 = 0.97;
/// Shorter alignments must gain at least 2% of TM-score
const SHORTER_PREMIUM: f64 = 1.02;

/// A scored sub-alignment and the superposition that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// TM-score, or the residue count for MaxSub candidates
    pub score: f64,
    /// Superposition fitted on `alignment`
    pub transform: Transform,
    /// Positions into the correspondence used for the fit, ascending
    pub alignment: Vec<usize>,
    /// RMSD over `alignment` under `transform`
    pub rmsd: f64,
}

impl ScoredCandidate {
    /// Number of correspondence positions in the sub-alignment
    pub fn len(&self) -> usize {
        self.alignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignment.is_empty()
    }
}

/// MaxSub rule: more residues within tolerance, or as many with lower RMSD.
pub fn improves_maxsub(
    current: Option<&ScoredCandidate>,
    count: usize,
    rmsd: f64,
    rmsd_tol: f64,
) -> bool {
    match current {
        None => rmsd <= rmsd_tol,
        Some(best) => {
            (count > best.len() && rmsd <= rmsd_tol) || (count == best.len() && rmsd < best.rmsd)
        }
    }
}

/// TM rule: strictly higher TM-score regardless of size.
pub fn improves_tm(current: Option<&ScoredCandidate>, score: f64) -> bool {
    current.map_or(true, |best| score > best.score)
}

/// Length-biased TM rule.
///
/// A longer candidate wins with at least 97% of the best score, a shorter
/// one needs at least 102%, an equally long one must be strictly better.
pub fn improves_longest(current: Option<&ScoredCandidate>, count: usize, score: f64) -> bool {
    let Some(best) = current else {
        return true;
    };
    match count.cmp(&best.len()) {
        std::cmp::Ordering::Greater => score >= LONGER_TOLERANCE * best.score,
        std::cmp::Ordering::Less => score >= SHORTER_PREMIUM * best.score,
        std::cmp::Ordering::Equal => score > best.score,
    }
}

/// Swap in the length-biased winner when it is longer and scores within 3%.
pub fn prefer_longer(tm: ScoredCandidate, longest: Option<ScoredCandidate>) -> ScoredCandidate {
    match longest {
        Some(longest)
            if longest.len() > tm.len() && longest.score >= LONGER_TOLERANCE * tm.score =>
        {
            longest
        }
        _ => tm,
    }
}

/// Running winners of the search
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    /// Best seed-only fit by TM-score
    pub raw: Option<ScoredCandidate>,
    /// Best fit by TM-score over seeds and extensions
    pub tm: Option<ScoredCandidate>,
    /// Best fit by the length-biased TM rule
    pub longest: Option<ScoredCandidate>,
    /// Most residues under tolerance
    pub most: Option<ScoredCandidate>,
}

/// Final winners once every seed has been searched
#[derive(Debug, Clone)]
pub struct Winners {
    pub best: ScoredCandidate,
    pub raw: ScoredCandidate,
    pub most: Option<ScoredCandidate>,
}

impl SearchState {
    /// Offer the fit of a bare seed fragment.
    pub fn offer_seed(&mut self, candidate: ScoredCandidate) {
        if self.raw.as_ref().map_or(true, |best| candidate.score > best.score) {
            self.raw = Some(candidate.clone());
        }
        if improves_tm(self.tm.as_ref(), candidate.score) {
            self.tm = Some(candidate);
        }
    }

    /// Offer a fit on a grown sub-alignment.
    ///
    /// `candidate.score` is the TM-score; the MaxSub slot stores the residue
    /// count as its score instead.
    pub fn offer_extension(&mut self, candidate: ScoredCandidate, rmsd_tol: f64) {
        let count = candidate.len();
        if improves_maxsub(self.most.as_ref(), count, candidate.rmsd, rmsd_tol) {
            self.most = Some(ScoredCandidate {
                score: count as f64,
                ..candidate.clone()
            });
        }
        if improves_longest(self.longest.as_ref(), count, candidate.score) {
            self.longest = Some(candidate.clone());
        }
        if improves_tm(self.tm.as_ref(), candidate.score) {
            self.tm = Some(candidate);
        }
    }

    /// Resolve the final winners; `None` when no seed was ever accepted.
    pub fn finish(self) -> Option<Winners> {
        let raw = self.raw?;
        let tm = self.tm?;
        Some(Winners {
            best: prefer_longer(tm, self.longest),
            raw,
            most: self.most,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(score: f64, len: usize, rmsd: f64) -> ScoredCandidate {
        ScoredCandidate {
            score,
            transform: Transform::identity(),
            alignment: (0..len).collect(),
            rmsd,
        }
    }

    #[test]
    fn test_maxsub_prefers_more_residues_within_tolerance() {
        let best = candidate(10.0, 10, 2.0);
        assert!(improves_maxsub(Some(&best), 11, 6.5, 7.0));
        assert!(!improves_maxsub(Some(&best), 11, 7.5, 7.0), "over tolerance");
        assert!(!improves_maxsub(Some(&best), 9, 0.1, 7.0), "fewer residues");
    }

    #[test]
    fn test_maxsub_tie_broken_by_rmsd() {
        let best = candidate(10.0, 10, 2.0);
        assert!(improves_maxsub(Some(&best), 10, 1.9, 7.0));
        assert!(!improves_maxsub(Some(&best), 10, 2.0, 7.0));
    }

    #[test]
    fn test_maxsub_first_candidate_needs_tolerance() {
        assert!(improves_maxsub(None, 4, 3.0, 7.0));
        assert!(!improves_maxsub(None, 4, 8.0, 7.0));
    }

    #[test]
    fn test_tm_requires_strict_improvement() {
        let best = candidate(0.5, 10, 1.0);
        assert!(improves_tm(None, 0.0));
        assert!(improves_tm(Some(&best), 0.51));
        assert!(!improves_tm(Some(&best), 0.5));
    }

    #[test]
    fn test_longest_acceptance_band() {
        let best = candidate(0.5, 20, 1.0);
        // Longer: tolerate up to 3% loss
        assert!(improves_longest(Some(&best), 21, 0.4851));
        assert!(!improves_longest(Some(&best), 21, 0.48));
        // Shorter: demand at least 2% gain
        assert!(improves_longest(Some(&best), 19, 0.511));
        assert!(!improves_longest(Some(&best), 19, 0.505));
        // Equal length: strictly better
        assert!(improves_longest(Some(&best), 20, 0.5001));
        assert!(!improves_longest(Some(&best), 20, 0.5));
        assert!(improves_longest(None, 1, 0.0));
    }

    #[test]
    fn test_prefer_longer_promotion() {
        let tm = candidate(0.60, 20, 1.0);
        let close = candidate(0.59, 30, 1.5);
        assert_eq!(prefer_longer(tm.clone(), Some(close)).len(), 30);

        let too_weak = candidate(0.50, 30, 1.5);
        assert_eq!(prefer_longer(tm.clone(), Some(too_weak)).len(), 20);

        let shorter = candidate(0.70, 10, 0.5);
        assert_eq!(prefer_longer(tm.clone(), Some(shorter)).len(), 20);
        assert_eq!(prefer_longer(tm, None).len(), 20);
    }

    #[test]
    fn test_search_state_tracks_slots_independently() {
        let mut state = SearchState::default();
        state.offer_seed(candidate(0.3, 7, 0.5));
        state.offer_seed(candidate(0.2, 7, 0.4));
        assert_eq!(state.raw.as_ref().unwrap().score, 0.3);

        // Larger but lower-scoring extension: MaxSub and longest take it, TM does not
        state.offer_extension(candidate(0.29, 15, 2.0), 7.0);
        assert_eq!(state.most.as_ref().unwrap().score, 15.0);
        assert_eq!(state.longest.as_ref().unwrap().len(), 15);
        assert_eq!(state.tm.as_ref().unwrap().score, 0.3);

        // Raw never sees extensions
        state.offer_extension(candidate(0.9, 16, 1.0), 7.0);
        assert_eq!(state.raw.as_ref().unwrap().score, 0.3);
        assert_eq!(state.tm.as_ref().unwrap().score, 0.9);

        let winners = state.finish().unwrap();
        assert_eq!(winners.best.len(), 16);
        assert_eq!(winners.most.unwrap().len(), 16);
    }

    #[test]
    fn test_finish_without_seed() {
        assert!(SearchState::default().finish().is_none());
    }

    #[test]
    fn test_maxsub_rmsd_matches_its_subset() {
        let mut state = SearchState::default();
        let ext = candidate(0.4, 12, 1.25);
        state.offer_extension(ext, 7.0);
        let most = state.most.unwrap();
        assert_eq!(most.len(), 12);
        assert_eq!(most.rmsd, 1.25);
    }
}
