//! Seed-and-extend MaxSub / TM-score refinement
//!
//! Every window of `fragment_size` consecutive correspondence positions
//! seeds a superposition. The seed is grown by admitting pairs whose
//! deviation under the current fit falls below a radius that is relaxed in
//! steps of `0.1 · unit` up to the tolerance, re-fitting whenever the
//! admitted set grows. Three winners are tracked along the way: the best
//! TM-score, the best bare seed, and the MaxSub set (most pairs under
//! tolerance, ties broken by RMSD).

mod tracker;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use tracker::{
    improves_longest, improves_maxsub, improves_tm, prefer_longer, ScoredCandidate, SearchState,
    Winners,
};

use crate::align::{fit_on_subset, subset_rmsd, TemplateAlignment};
use crate::correspondence::Correspondence;
use crate::error::{ScoreError, ScoreResult};

/// Shortest chain length for which the TM-score scale is defined (exclusive)
pub const MIN_CHAIN_LENGTH: usize = 9;

/// Largest relative gap tolerated between the tracked and re-fitted TM-score
const CONSISTENCY_TOLERANCE: f64 = 0.05;
/// Ratio to the naive full fit above which the search result is flagged
const BETTER_THAN_FULL: f64 = 1.05;
/// Ratio to the naive full fit below which the search result is flagged
const WORSE_THAN_FULL: f64 = 0.94;

/// Parameters for the MaxSub/TM search
#[derive(Debug, Clone)]
pub struct RefineParams {
    /// Number of consecutive correspondence positions in a seed fragment
    pub fragment_size: usize,
    /// Distance tolerance, in `unit`s
    pub tol: f64,
    /// Length unit (1.0 for Ångström coordinates)
    pub unit: f64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            fragment_size: 7,
            tol: 7.0,
            unit: 1.0,
        }
    }
}

impl RefineParams {
    /// Fragment size chosen from the shorter chain length: 8 below 100
    /// residues, 12 otherwise. The default uses a fixed 7 instead.
    pub fn for_chain_length(l_min: usize) -> Self {
        Self {
            fragment_size: if l_min < 100 { 8 } else { 12 },
            ..Self::default()
        }
    }

    /// Tolerance in coordinate units
    pub fn rmsd_tolerance(&self) -> f64 {
        self.tol * self.unit
    }

    pub fn validate(&self) -> ScoreResult<()> {
        if self.fragment_size < 3 {
            return Err(ScoreError::InvalidParams(format!(
                "fragment_size must be at least 3, got {}",
                self.fragment_size
            )));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ScoreError::InvalidParams(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        if !(self.unit.is_finite() && self.unit > 0.0) {
            return Err(ScoreError::InvalidParams(format!(
                "unit must be positive, got {}",
                self.unit
            )));
        }
        Ok(())
    }
}

/// Non-fatal disagreement between the search and a plain full-length fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Advisory {
    /// The search beat the full fit by more than 5%
    BetterThanFull {
        residues: usize,
        score: f64,
        full_length: usize,
        full_score: f64,
    },
    /// The search fell short of the full fit by more than 6%
    WorseThanFull {
        residues: usize,
        score: f64,
        full_length: usize,
        full_score: f64,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::BetterThanFull { residues, score, full_length, full_score } => write!(
                f,
                "sub-alignment of {} residues scores TM {:.4}, better than {:.4} for all {} pairs",
                residues, score, full_score, full_length
            ),
            Advisory::WorseThanFull { residues, score, full_length, full_score } => write!(
                f,
                "sub-alignment of {} residues scores TM {:.4}, worse than {:.4} for all {} pairs",
                residues, score, full_score, full_length
            ),
        }
    }
}

/// Outcome of [`refine`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refinement {
    /// Best TM-score sub-alignment
    pub best: ScoredCandidate,
    /// Best bare seed fragment by TM-score
    pub raw: ScoredCandidate,
    /// MaxSub: most pairs within tolerance; `None` if no grown set stayed
    /// within tolerance
    pub most: Option<ScoredCandidate>,
    /// TM-score of superposing every correspondence pair at once
    pub full_score: f64,
    /// Set when `best` deviates notably from `full_score`
    pub advisory: Option<Advisory>,
}

/// TM-score distance scale `1.24·(L−15)^(1/3) − 1.8`, using the real cube root
pub fn tm_d0(l_min: usize) -> f64 {
    1.24 * (l_min as f64 - 15.0).cbrt() - 1.8
}

/// Σ 1/(1 + d²/d0²) over all pairs, normalised by `l_min`
pub fn tm_score(deviations: &[f64], d0_squared: f64, l_min: usize) -> f64 {
    let sum: f64 = deviations.iter().map(|d2| 1.0 / (1.0 + d2 / d0_squared)).sum();
    sum / l_min as f64
}

/// Fixed quantities shared by every seed of one search
struct SearchContext<'a> {
    first: &'a [[f64; 3]],
    second: &'a [[f64; 3]],
    fragment_size: usize,
    rmsd_tol: f64,
    step: f64,
    unit: f64,
    d0_squared: f64,
    l_min: usize,
}

impl SearchContext<'_> {
    fn score(&self, aligned: &TemplateAlignment, subset: Vec<usize>) -> (ScoredCandidate, Vec<f64>) {
        let deviations = aligned.squared_deviations();
        let candidate = ScoredCandidate {
            score: tm_score(&deviations, self.d0_squared, self.l_min),
            transform: aligned.transform,
            rmsd: subset_rmsd(&deviations, &subset),
            alignment: subset,
        };
        (candidate, deviations)
    }
}

/// Search for the best sub-alignments of a correspondence.
///
/// `first` and `second` are the full chains; `correspondence` pairs their
/// residues. Fails before any computation when the shorter chain has 9 or
/// fewer residues, and aborts if the winning TM-score cannot be reproduced
/// by re-fitting its sub-alignment.
pub fn refine(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    correspondence: &Correspondence,
    params: &RefineParams,
) -> ScoreResult<Refinement> {
    params.validate()?;
    let l_min = first.len().min(second.len());
    if l_min <= MIN_CHAIN_LENGTH {
        return Err(ScoreError::ChainTooShort { l_min });
    }
    correspondence.validate(first.len(), second.len())?;

    let n = correspondence.len();
    let fragment_size = params.fragment_size;
    if n <= fragment_size {
        return Err(ScoreError::NoSeedWindows {
            pairs: n,
            fragment_size,
        });
    }

    let d0 = tm_d0(l_min);
    let (p0, p1) = correspondence.gather(first, second);
    let ctx = SearchContext {
        first: &p0,
        second: &p1,
        fragment_size,
        rmsd_tol: params.rmsd_tolerance(),
        step: 0.1 * params.unit,
        unit: params.unit,
        d0_squared: d0 * d0,
        l_min,
    };

    let windows = n - fragment_size;
    log::debug!(
        "refine: {} pairs, L_min {}, {} seed windows of {}, d0 = {:.3}",
        n, l_min, windows, fragment_size, d0
    );

    let mut state = SearchState::default();
    let mut abandoned = 0usize;
    for start in 0..windows {
        let seed: Vec<usize> = (start..start + fragment_size).collect();
        let aligned = fit_on_subset(ctx.first, ctx.second, &seed)?;
        let (candidate, deviations) = ctx.score(&aligned, seed);

        // A seed that cannot even fit itself is not worth growing
        if candidate.rmsd > ctx.rmsd_tol {
            abandoned += 1;
            continue;
        }

        state.offer_seed(candidate);
        extend_seed(&ctx, start, deviations, &mut state)?;
    }

    if abandoned > 0 {
        log::debug!("refine: abandoned {} of {} seeds over tolerance", abandoned, windows);
    }

    let Winners { best, raw, most } = state.finish().ok_or(ScoreError::NoAcceptedSeed {
        tolerance: ctx.rmsd_tol,
    })?;

    // Re-fit the winner on its own subset; the score must come back unchanged
    let check = fit_on_subset(ctx.first, ctx.second, &best.alignment)?;
    let recomputed = tm_score(&check.squared_deviations(), ctx.d0_squared, l_min);
    check_consistency(best.score, recomputed)?;

    let all: Vec<usize> = (0..n).collect();
    let full = fit_on_subset(ctx.first, ctx.second, &all)?;
    let full_score = tm_score(&full.squared_deviations(), ctx.d0_squared, l_min);
    let advisory = compare_with_full(best.len(), best.score, n, full_score);
    if let Some(advisory) = &advisory {
        log::warn!("refine: {}", advisory);
    }

    log::debug!(
        "refine: best TM {:.4} over {} pairs, MaxSub {} pairs",
        best.score,
        best.len(),
        most.as_ref().map_or(0, |m| m.len())
    );

    Ok(Refinement {
        best,
        raw,
        most,
        full_score,
        advisory,
    })
}

/// Grow one seed, offering every re-fitted sub-alignment to `state`.
fn extend_seed(
    ctx: &SearchContext<'_>,
    start: usize,
    mut deviations: Vec<f64>,
    state: &mut SearchState,
) -> ScoreResult<()> {
    let n = deviations.len();
    let seed = start..start + ctx.fragment_size;
    let mut accepted = vec![false; n];
    let mut count = 0usize;
    let mut last_count = 0usize;
    let mut radius = 0.0f64;

    while radius < ctx.rmsd_tol {
        radius = (radius + ctx.step).min(ctx.rmsd_tol);
        let radius_squared = radius * radius;
        let mut min_excluded = (ctx.rmsd_tol + ctx.unit).powi(2);

        for (j, &d2) in deviations.iter().enumerate() {
            if accepted[j] {
                continue;
            }
            if d2 < radius_squared || seed.contains(&j) {
                accepted[j] = true;
                count += 1;
            } else {
                min_excluded = min_excluded.min(d2);
            }
        }

        if count > last_count && count > 3 {
            last_count = count;
            let subset: Vec<usize> = (0..n).filter(|&j| accepted[j]).collect();
            let aligned = fit_on_subset(ctx.first, ctx.second, &subset)?;
            let (candidate, refreshed) = ctx.score(&aligned, subset);
            deviations = refreshed;
            state.offer_extension(candidate, ctx.rmsd_tol);
        } else {
            // Nothing new at this radius: jump to the closest excluded pair
            radius = min_excluded.sqrt();
        }
    }
    Ok(())
}

/// Fail when a tracked TM-score and its re-fitted value differ by more than 5%.
pub fn check_consistency(tracked: f64, recomputed: f64) -> ScoreResult<()> {
    if (1.0 - tracked / recomputed).abs() > CONSISTENCY_TOLERANCE {
        return Err(ScoreError::InconsistentScore {
            tracked,
            recomputed,
        });
    }
    Ok(())
}

/// Flag a search result that beats the full fit by > 5% or trails it by > 6%.
pub fn compare_with_full(
    residues: usize,
    score: f64,
    full_length: usize,
    full_score: f64,
) -> Option<Advisory> {
    let ratio = score / full_score;
    if ratio > BETTER_THAN_FULL {
        Some(Advisory::BetterThanFull {
            residues,
            score,
            full_length,
            full_score,
        })
    } else if ratio < WORSE_THAN_FULL {
        Some(Advisory::WorseThanFull {
            residues,
            score,
            full_length,
            full_score,
        })
    } else {
        None
    }
}
