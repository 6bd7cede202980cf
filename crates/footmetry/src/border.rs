//! Border extraction over the curved grid.
//!
//! For every angular sector the outermost node with data marks the
//! silhouette of the scanned object; its reconstructed 3D position feeds
//! that sector's inertial average. Sectors without valid data this frame
//! leave their accumulator untouched, so a partial view never erodes the
//! smoothed contour.

use nalgebra::Vector3;

use footmetry_core::{CurvedCell, CurvedGrid, InertialAverage};

#[derive(Clone, Debug)]
pub struct BorderExtractor {
    sectors: Vec<InertialAverage<Vector3<f32>>>,
}

impl BorderExtractor {
    pub fn new(phi_count: usize, smoothing_window: usize) -> Self {
        Self {
            sectors: vec![InertialAverage::new(smoothing_window); phi_count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Fold the current frame's outer boundary into the per-sector
    /// accumulators.
    pub fn update(&mut self, grid: &CurvedGrid) {
        debug_assert_eq!(self.sectors.len(), grid.phi_count());
        for phi in 0..grid.phi_count() {
            let mut outer: Option<(f32, CurvedCell)> = None;
            for u in 0..grid.u_count() {
                let cell = CurvedCell { u, phi };
                let node = grid.node(cell);
                if !node.has_data() {
                    continue;
                }
                let rho = node.mean();
                if outer.is_none_or(|(best, _)| rho > best) {
                    outer = Some((rho, cell));
                }
            }
            if let Some((_, cell)) = outer {
                if let Some(position) = grid.position_of(cell) {
                    self.sectors[phi].push(position.coords);
                }
            }
        }
    }

    /// Smoothed border point of one sector, `None` while it has no history.
    #[inline]
    pub fn point(&self, phi: usize) -> Option<Vector3<f32>> {
        self.sectors[phi].mean()
    }

    /// Smoothed border points for all sectors in φ order.
    pub fn points(&self) -> Vec<Option<Vector3<f32>>> {
        self.sectors.iter().map(InertialAverage::mean).collect()
    }

    pub fn reset(&mut self) {
        for sector in &mut self.sectors {
            sector.reset();
        }
    }
}
