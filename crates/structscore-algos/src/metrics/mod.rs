//! Alignment quality metrics
//!
//! Superposes two chains on a chosen subset of correspondence positions (the
//! "orientable" residues) and reports TM-score, PSI and its run-filtered
//! variants, RMSDs over three residue sets and sequence identities.
//!
//! - aRMS / aPSI / aSeq: every aligned pair
//! - oRMS / oPSI / oSeq: the orientable subset
//! - cRMS / rPSI / cSeq: pairs closer than the PSI cutoff after superposition

mod runs;

use serde::{Deserialize, Serialize};

pub use runs::{long_run_positions, run_length_psi};

use crate::align::{fit_on_subset, subset_rmsd};
use crate::correspondence::Correspondence;
use crate::error::{ScoreError, ScoreResult};
use crate::maxsub::{tm_d0, tm_score, ScoredCandidate, MIN_CHAIN_LENGTH};

/// Unlabelled chains: no sequence identities are computed
pub const NO_LABELS: Option<(&[u8], &[u8])> = None;

/// Parameters for metric computation
#[derive(Debug, Clone)]
pub struct MetricsParams {
    /// PSI distance cutoff, in `unit`s
    pub psi_cutoff: f64,
    /// Length unit (1.0 for Ångström coordinates)
    pub unit: f64,
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self {
            psi_cutoff: 4.0,
            unit: 1.0,
        }
    }
}

impl MetricsParams {
    pub fn validate(&self) -> ScoreResult<()> {
        if !(self.psi_cutoff.is_finite() && self.psi_cutoff > 0.0) {
            return Err(ScoreError::InvalidParams(format!(
                "psi_cutoff must be positive, got {}",
                self.psi_cutoff
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

/// Alignment quality metrics for one superposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// TM-score over all aligned pairs
    pub tm: f64,
    /// Fraction of `l_min` closer than the PSI cutoff
    pub psi: f64,
    /// Run-filtered PSI over all aligned pairs
    pub a_psi: f64,
    /// Run-filtered PSI over the orientable subset
    pub o_psi: f64,
    /// Run-filtered PSI over the PSI pairs
    pub r_psi: f64,
    /// RMSD over the PSI pairs; NaN when `l_psi <= 2`
    #[serde(with = "crate::serde_helpers::nan_as_null")]
    pub c_rms: f64,
    /// RMSD over all aligned pairs
    pub a_rms: f64,
    /// RMSD over the orientable subset
    pub o_rms: f64,
    /// Label identity over all aligned pairs
    #[serde(with = "crate::serde_helpers::nan_as_null")]
    pub a_seq_identity: f64,
    /// Label identity over the orientable subset
    #[serde(with = "crate::serde_helpers::nan_as_null")]
    pub o_seq_identity: f64,
    /// Label identity over the PSI pairs; NaN when labelled and `l_psi == 0`
    #[serde(with = "crate::serde_helpers::nan_as_null")]
    pub c_seq_identity: f64,
    /// Length of the shorter chain
    pub l_min: usize,
    /// Number of correspondence pairs
    pub l_aligned: usize,
    /// Number of pairs the superposition was fitted on
    pub l_orientable: usize,
    /// Number of pairs closer than the PSI cutoff
    pub l_psi: usize,
}

/// Compute the metric bundle for a superposition fitted on `subset`.
///
/// `subset` holds positions into `correspondence` (all positions when
/// `None`). `labels` are per-residue category values for the two chains,
/// e.g. one-letter amino acids; identities are zero without them. Pass
/// [`NO_LABELS`] when there are none.
pub fn standard_metrics<T: PartialEq>(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    correspondence: &Correspondence,
    subset: Option<&[usize]>,
    labels: Option<(&[T], &[T])>,
    params: &MetricsParams,
) -> ScoreResult<MetricsRecord> {
    params.validate()?;
    let l_min = first.len().min(second.len());
    if l_min <= MIN_CHAIN_LENGTH {
        return Err(ScoreError::ChainTooShort { l_min });
    }
    correspondence.validate(first.len(), second.len())?;
    if let Some((seq0, seq1)) = labels {
        check_labels(0, first.len(), seq0.len())?;
        check_labels(1, second.len(), seq1.len())?;
    }

    let l_aligned = correspondence.len();
    let all: Vec<usize> = (0..l_aligned).collect();
    let orientable = subset.unwrap_or(&all[..]);

    let (p0, p1) = correspondence.gather(first, second);
    let aligned = fit_on_subset(&p0, &p1, orientable)?;
    let deviations = aligned.squared_deviations();

    let d0 = tm_d0(l_min);
    let tm = tm_score(&deviations, d0 * d0, l_min);
    let a_rms = subset_rmsd(&deviations, &all);
    let o_rms = subset_rmsd(&deviations, orientable);

    let cutoff = params.psi_cutoff * params.unit;
    let psi_positions: Vec<usize> = (0..l_aligned)
        .filter(|&i| deviations[i].sqrt() < cutoff)
        .collect();
    let l_psi = psi_positions.len();
    let c_rms = if l_psi > 2 {
        subset_rmsd(&deviations, &psi_positions)
    } else {
        f64::NAN
    };

    let (a_seq_identity, o_seq_identity, c_seq_identity) = match labels {
        Some((seq0, seq1)) => {
            let same: Vec<bool> = correspondence.pairs().map(|(a, b)| seq0[a] == seq1[b]).collect();
            (
                identity_fraction(&same, &all),
                identity_fraction(&same, orientable),
                identity_fraction(&same, &psi_positions),
            )
        }
        None => (0.0, 0.0, 0.0),
    };

    let norm = l_min as f64;
    let record = MetricsRecord {
        tm,
        psi: l_psi as f64 / norm,
        a_psi: run_length_psi(correspondence, &all) as f64 / norm,
        o_psi: run_length_psi(correspondence, orientable) as f64 / norm,
        r_psi: run_length_psi(correspondence, &psi_positions) as f64 / norm,
        c_rms,
        a_rms,
        o_rms,
        a_seq_identity,
        o_seq_identity,
        c_seq_identity,
        l_min,
        l_aligned,
        l_orientable: orientable.len(),
        l_psi,
    };

    log::debug!(
        "metrics: TM {:.4}, PSI {:.3} ({} of {}), aRMS {:.3}",
        record.tm, record.psi, l_psi, l_aligned, record.a_rms
    );
    Ok(record)
}

/// Metrics for a candidate returned by [`crate::refine`], fitted on its
/// sub-alignment.
pub fn metrics_for_candidate<T: PartialEq>(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    correspondence: &Correspondence,
    candidate: &ScoredCandidate,
    labels: Option<(&[T], &[T])>,
    params: &MetricsParams,
) -> ScoreResult<MetricsRecord> {
    standard_metrics(
        first,
        second,
        correspondence,
        Some(candidate.alignment.as_slice()),
        labels,
        params,
    )
}

fn check_labels(chain: usize, expected: usize, actual: usize) -> ScoreResult<()> {
    if expected != actual {
        return Err(ScoreError::LabelLengthMismatch {
            chain,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Fraction of identical labels among `positions`; NaN for an empty set
fn identity_fraction(same: &[bool], positions: &[usize]) -> f64 {
    if positions.is_empty() {
        return f64::NAN;
    }
    let hits = positions.iter().filter(|&&i| same[i]).count();
    hits as f64 / positions.len() as f64
}
