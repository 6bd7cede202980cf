//! Floor-height estimation from the planar grid.
//!
//! Every node's mean height is dropped into a fixed-width histogram; the
//! modal bucket is the per-round floor candidate. Candidates from
//! successive rounds feed a dedicated [`CyclicStat`]; the floor is accepted
//! once enough rounds agree within a deviation threshold. Until then the
//! estimator reports no floor and segmentation is skipped entirely.

use log::{debug, info};

use footmetry_core::{fold_balanced, CyclicStat, PlanarGrid};

use crate::config::ScanParams;

/// Histogram buckets carried as (bucket index, node count), in first-seen
/// order so that the modal pick is deterministic under ties.
type Histogram = Vec<(i64, usize)>;

fn add_sample(mut hist: Histogram, bucket: i64) -> Histogram {
    match hist.iter_mut().find(|(b, _)| *b == bucket) {
        Some((_, count)) => *count += 1,
        None => hist.push((bucket, 1)),
    }
    hist
}

/// Merge preserving the left operand's first-seen order. Associative, so it
/// is safe for balanced (or parallel) reduction.
fn merge(left: Histogram, right: Histogram) -> Histogram {
    right.into_iter().fold(left, |mut acc, (bucket, count)| {
        match acc.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, existing)) => *existing += count,
            None => acc.push((bucket, count)),
        }
        acc
    })
}

#[derive(Clone, Debug)]
pub struct FloorEstimator {
    bin_width: f32,
    min_rounds: usize,
    deviation_threshold: f32,
    rounds: CyclicStat,
    accepted: Option<f32>,
}

impl FloorEstimator {
    pub fn new(params: &ScanParams) -> Self {
        Self {
            bin_width: params.bin_width,
            min_rounds: params.convergence_rounds,
            deviation_threshold: params.convergence_deviation,
            rounds: CyclicStat::new(params.convergence_rounds),
            accepted: None,
        }
    }

    /// The converged floor height. Immutable once set, until [`reset`].
    ///
    /// [`reset`]: FloorEstimator::reset
    #[inline]
    pub fn accepted(&self) -> Option<f32> {
        self.accepted
    }

    /// One pure estimation round: the modal height bucket over all nodes
    /// with data, or `None` when the grid holds no samples yet.
    ///
    /// Ties keep the first bucket encountered in node iteration order,
    /// which makes re-running on an unchanged grid idempotent.
    pub fn estimate(&self, grid: &PlanarGrid) -> Option<f32> {
        const CHUNK: usize = 1024;

        let buckets: Vec<i64> = grid
            .cells()
            .filter(|(_, node)| node.has_data())
            .map(|(_, node)| (node.mean() / self.bin_width).floor() as i64)
            .collect();
        if buckets.is_empty() {
            return None;
        }

        let partials: Vec<Histogram> = buckets
            .chunks(CHUNK)
            .map(|chunk| {
                chunk
                    .iter()
                    .fold(Histogram::new(), |hist, &b| add_sample(hist, b))
            })
            .collect();
        let hist = fold_balanced(partials, Histogram::new(), merge);

        let mut best = hist[0];
        for &(bucket, count) in &hist[1..] {
            if count > best.1 {
                best = (bucket, count);
            }
        }
        Some(best.0 as f32 * self.bin_width)
    }

    /// Run one round and fold the candidate into the convergence window.
    /// Returns the accepted floor height once both the round-count and the
    /// deviation condition hold.
    pub fn observe(&mut self, grid: &PlanarGrid) -> Option<f32> {
        if self.accepted.is_some() {
            return self.accepted;
        }
        let candidate = self.estimate(grid)?;
        let mean = self.rounds.update(candidate);
        let deviation = self.rounds.deviation();
        debug!(
            "floor candidate {candidate:.4} m, window mean {mean:.4} m, deviation {deviation:.5}"
        );
        if self.rounds.len() >= self.min_rounds && deviation < self.deviation_threshold {
            info!("floor accepted at {mean:.4} m after {} rounds", self.rounds.total_seen());
            self.accepted = Some(mean);
        }
        self.accepted
    }

    /// Forget the accepted floor and all convergence history.
    pub fn reset(&mut self) {
        self.rounds.reset();
        self.accepted = None;
    }
}
