//! Template superposition
//!
//! The rigid-body fit is computed on a template (a subset of matched
//! points) and then applied to the full point sets, so residues outside the
//! template can be scored under the template's superposition.

use super::kabsch::{kabsch, Transform};
use crate::error::{ScoreError, ScoreResult};
use crate::linalg::distance_squared;

/// Full point sets moved into the frame of a template fit
#[derive(Debug, Clone)]
pub struct TemplateAlignment {
    /// First set, translated by its template centroid
    pub first: Vec<[f64; 3]>,
    /// Second set, translated by its template centroid and rotated
    pub second: Vec<[f64; 3]>,
    /// Superposition fitted on the template
    pub transform: Transform,
}

impl TemplateAlignment {
    /// Squared distance between each matched pair of the full sets
    pub fn squared_deviations(&self) -> Vec<f64> {
        squared_deviations(&self.first, &self.second)
    }
}

/// Fit on `template_first`/`template_second` and apply the fit to the full
/// `first`/`second` sets. None of the inputs are modified.
pub fn template_alignment(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    template_first: &[[f64; 3]],
    template_second: &[[f64; 3]],
) -> ScoreResult<TemplateAlignment> {
    let transform = kabsch(template_first, template_second)?;
    Ok(TemplateAlignment {
        first: first.iter().map(|&p| transform.apply_first(p)).collect(),
        second: second.iter().map(|&p| transform.apply_second(p)).collect(),
        transform,
    })
}

/// Template alignment where the template is `subset` of the matched sets.
///
/// `first[i]` pairs with `second[i]`; `subset` holds positions into both.
pub fn fit_on_subset(
    first: &[[f64; 3]],
    second: &[[f64; 3]],
    subset: &[usize],
) -> ScoreResult<TemplateAlignment> {
    if first.len() != second.len() {
        return Err(ScoreError::LengthMismatch(first.len(), second.len()));
    }
    if let Some(&index) = subset.iter().find(|&&i| i >= first.len()) {
        return Err(ScoreError::SubsetOutOfBounds {
            index,
            len: first.len(),
        });
    }
    let template_first: Vec<[f64; 3]> = subset.iter().map(|&i| first[i]).collect();
    let template_second: Vec<[f64; 3]> = subset.iter().map(|&i| second[i]).collect();
    template_alignment(first, second, &template_first, &template_second)
}

/// Squared distance between each matched pair
pub fn squared_deviations(first: &[[f64; 3]], second: &[[f64; 3]]) -> Vec<f64> {
    first
        .iter()
        .zip(second.iter())
        .map(|(a, b)| distance_squared(a, b))
        .collect()
}

/// RMSD over the listed positions of a squared-deviation array
pub fn subset_rmsd(deviations: &[f64], subset: &[usize]) -> f64 {
    if subset.is_empty() {
        return 0.0;
    }
    let sum: f64 = subset.iter().map(|&i| deviations[i]).sum();
    (sum / subset.len() as f64).sqrt()
}

/// RMSD over every entry of a squared-deviation array
pub fn full_rmsd(deviations: &[f64]) -> f64 {
    if deviations.is_empty() {
        return 0.0;
    }
    (deviations.iter().sum::<f64>() / deviations.len() as f64).sqrt()
}
