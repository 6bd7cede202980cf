//! Engine configuration.

use footmetry_core::Confidence;
use serde::{Deserialize, Serialize};

/// Configuration for a scan session.
///
/// Defaults reproduce the tuning of the original scanner: a 0.5 m
/// half-extent floor-search patch, 11-sample node histories, 2 mm floor
/// histogram bins and millimetre-scale convergence and segmentation
/// thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanParams {
    /// Rows of the planar floor-search grid.
    pub planar_rows: usize,
    /// Columns of the planar floor-search grid.
    pub planar_cols: usize,
    /// Half extent of the square floor-search patch, metres.
    pub half_extent: f32,
    /// Height bands of the curved scan grid.
    pub u_count: usize,
    /// Angular sectors of the curved scan grid.
    pub phi_count: usize,
    /// Height of one curved-grid band, metres.
    pub u_step: f32,
    /// Ring-buffer depth of every grid node.
    pub history_capacity: usize,
    /// Floor histogram bucket width, metres.
    pub bin_width: f32,
    /// Frames accumulated before the first floor estimate.
    pub warmup_frames: u64,
    /// Frames between successive floor estimates; 0 estimates every frame.
    pub estimate_interval: u64,
    /// Estimation rounds the floor candidate must survive before
    /// acceptance.
    pub convergence_rounds: usize,
    /// Maximum deviation of the candidate across those rounds, metres.
    pub convergence_deviation: f32,
    /// Band half-width around the floor height classified as Floor.
    pub floor_epsilon: f32,
    /// Minimum height above the floor classified as Foot.
    pub riser_height: f32,
    /// Points below this confidence are dropped before projection.
    pub min_confidence: Confidence,
    /// Early-exit tolerance of the heel arc scan, metres.
    pub heel_tolerance: f32,
    /// Window length of border-point and landmark smoothing.
    pub smoothing_window: usize,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            planar_rows: 500,
            planar_cols: 500,
            half_extent: 0.5,
            u_count: 100,
            phi_count: 240,
            u_step: 2e-3,
            history_capacity: 11,
            bin_width: 2e-3,
            warmup_frames: 10,
            estimate_interval: 10,
            convergence_rounds: 5,
            convergence_deviation: 1e-3,
            floor_epsilon: 3e-3,
            riser_height: 27e-3,
            min_confidence: Confidence::High,
            heel_tolerance: 2e-3,
            smoothing_window: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let params = ScanParams {
            planar_rows: 64,
            min_confidence: Confidence::Medium,
            ..ScanParams::default()
        };
        let text = serde_json::to_string(&params).unwrap();
        let back: ScanParams = serde_json::from_str(&text).unwrap();
        assert_eq!(back.planar_rows, 64);
        assert_eq!(back.min_confidence, Confidence::Medium);
        assert_eq!(back.history_capacity, 11);
    }

    #[test]
    fn default_thresholds_are_ordered() {
        let params = ScanParams::default();
        assert!(params.floor_epsilon < params.riser_height);
        assert!(params.bin_width > 0.0);
    }
}
