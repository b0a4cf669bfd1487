//! Run-length filtering for PSI
//!
//! Scans an ordered set of correspondence positions and keeps only the
//! contiguous runs longer than three pairs. A run ends at a gap (either
//! chain's residue index jumps by more than one between consecutive scanned
//! positions) or at the end of the set.

use crate::correspondence::Correspondence;

/// Runs must be longer than this to count
const MAX_SHORT_RUN: usize = 3;

/// Positions belonging to runs longer than three pairs, in scan order.
pub fn long_run_positions(correspondence: &Correspondence, positions: &[usize]) -> Vec<usize> {
    let mut kept = Vec::with_capacity(positions.len());
    let mut run_start = 0usize;
    for (k, &position) in positions.iter().enumerate() {
        let run_ends = match positions.get(k + 1) {
            Some(&next) => correspondence.has_gap(position, next),
            None => true,
        };
        if run_ends {
            let run = &positions[run_start..=k];
            if run.len() > MAX_SHORT_RUN {
                kept.extend_from_slice(run);
            }
            run_start = k + 1;
        }
    }
    kept
}

/// Total length of the runs longer than three pairs.
pub fn run_length_psi(correspondence: &Correspondence, positions: &[usize]) -> usize {
    long_run_positions(correspondence, positions).len()
}
