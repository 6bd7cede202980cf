//! Node classification against the accepted floor height.
//!
//! The exact thresholding of the original lived in a GPU kernel; this is
//! the documented, configurable policy replacing it: a node whose mean
//! height falls within `floor_epsilon` of the floor is Floor, a node at
//! least `riser_height` above it is Foot, everything else stays Unknown.
//! Only invoked after floor convergence — nodes without data are skipped.

use footmetry_core::{Classification, CurvedGrid, PlanarGrid};

use crate::config::ScanParams;

#[derive(Clone, Copy, Debug)]
pub struct Segmenter {
    floor_epsilon: f32,
    riser_height: f32,
}

impl Segmenter {
    pub fn new(params: &ScanParams) -> Self {
        Self {
            floor_epsilon: params.floor_epsilon,
            riser_height: params.riser_height,
        }
    }

    /// Classify a single aggregated height against the floor height.
    pub fn classify(&self, height: f32, floor_height: f32) -> Classification {
        let rise = height - floor_height;
        if rise.abs() <= self.floor_epsilon {
            Classification::Floor
        } else if rise >= self.riser_height {
            Classification::Foot
        } else {
            Classification::Unknown
        }
    }

    /// Re-classify every planar node with data.
    pub fn apply_planar(&self, grid: &mut PlanarGrid, floor_height: f32) {
        for (_, node) in grid.cells_mut() {
            if node.has_data() {
                node.set_classification(self.classify(node.mean(), floor_height));
            }
        }
    }

    /// Re-classify every curved node with data. Curved-grid heights are
    /// floor-relative, so the floor sits at z = 0 and a cell's height is
    /// the centre of its u band.
    pub fn apply_curved(&self, grid: &mut CurvedGrid, u_step: f32) {
        for (cell, node) in grid.cells_mut() {
            if node.has_data() {
                let height = (cell.u as f32 + 0.5) * u_step;
                node.set_classification(self.classify(height, 0.0));
            }
        }
    }
}
