//! Point-to-cell addressing over the two scan grids.
//!
//! Coordinates are right-handed with z up: the floor plane is z = const and
//! heights are measured along z. During floor search points land in a planar
//! (row, col) grid over a square patch; during the object scan they land in
//! a curved (u, φ) grid that wraps cyclically in φ around the scan axis.
//!
//! The two addressing modes are mutually exclusive per session phase and are
//! therefore separate types; the index function of each is a bijection over
//! its valid cell domain.

use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::node::GridNode;

/// Per-point confidence level reported by the depth collaborator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Camera-to-world transform valid for one captured frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub camera_to_world: Matrix4<f32>,
}

impl CameraPose {
    pub fn new(camera_to_world: Matrix4<f32>) -> Self {
        Self { camera_to_world }
    }

    /// Identity pose: camera space coincides with world space.
    pub fn identity() -> Self {
        Self {
            camera_to_world: Matrix4::identity(),
        }
    }

    /// Map a camera-space point into world space.
    #[inline]
    pub fn to_world(&self, p: &Point3<f32>) -> Point3<f32> {
        self.camera_to_world.transform_point(p)
    }
}

/// Cell address in the planar floor-search grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PlanarCell {
    pub row: usize,
    pub col: usize,
}

/// Planar (row, col) grid over a square patch centred on the world origin.
///
/// Rows index x, columns index y; every node accumulates the z (height)
/// samples of the points that project into its cell.
#[derive(Clone, Debug)]
pub struct PlanarGrid {
    rows: usize,
    cols: usize,
    half_extent: f32,
    min_confidence: Confidence,
    nodes: Vec<GridNode>,
}

impl PlanarGrid {
    pub fn new(
        rows: usize,
        cols: usize,
        half_extent: f32,
        history_capacity: usize,
        min_confidence: Confidence,
    ) -> Self {
        assert!(rows > 0 && cols > 0, "grid dimensions must be positive");
        assert!(half_extent > 0.0, "grid half extent must be positive");
        Self {
            rows,
            cols,
            half_extent,
            min_confidence,
            nodes: vec![GridNode::new(history_capacity); rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, cell: PlanarCell) -> usize {
        cell.row * self.cols + cell.col
    }

    /// Resolve a camera-space point to a cell, or `None` when the point is
    /// below the confidence gate or projects outside the patch.
    pub fn resolve(
        &self,
        camera_point: &Point3<f32>,
        pose: &CameraPose,
        confidence: Confidence,
    ) -> Option<PlanarCell> {
        if confidence < self.min_confidence {
            return None;
        }
        let world = pose.to_world(camera_point);
        let step_x = 2.0 * self.half_extent / self.rows as f32;
        let step_y = 2.0 * self.half_extent / self.cols as f32;
        let row = ((world.x + self.half_extent) / step_x).floor();
        let col = ((world.y + self.half_extent) / step_y).floor();
        if row < 0.0 || col < 0.0 || row >= self.rows as f32 || col >= self.cols as f32 {
            return None;
        }
        Some(PlanarCell {
            row: row as usize,
            col: col as usize,
        })
    }

    /// Resolve and fold one point into the grid. Returns the cell hit, or
    /// `None` when the point was gated or out of domain.
    pub fn ingest(
        &mut self,
        camera_point: &Point3<f32>,
        pose: &CameraPose,
        confidence: Confidence,
    ) -> Option<PlanarCell> {
        let cell = self.resolve(camera_point, pose, confidence)?;
        let height = pose.to_world(camera_point).z;
        let idx = self.index(cell);
        self.nodes[idx].update(height);
        Some(cell)
    }

    #[inline]
    pub fn node(&self, cell: PlanarCell) -> &GridNode {
        &self.nodes[self.index(cell)]
    }

    #[inline]
    pub fn node_mut(&mut self, cell: PlanarCell) -> &mut GridNode {
        let idx = self.index(cell);
        &mut self.nodes[idx]
    }

    /// All nodes in index order together with their cell addresses.
    pub fn cells(&self) -> impl Iterator<Item = (PlanarCell, &GridNode)> {
        let cols = self.cols;
        self.nodes.iter().enumerate().map(move |(i, node)| {
            (
                PlanarCell {
                    row: i / cols,
                    col: i % cols,
                },
                node,
            )
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (PlanarCell, &mut GridNode)> {
        let cols = self.cols;
        self.nodes.iter_mut().enumerate().map(move |(i, node)| {
            (
                PlanarCell {
                    row: i / cols,
                    col: i % cols,
                },
                node,
            )
        })
    }
}

/// Cell address in the curved scan grid: `u` indexes height bands, `phi`
/// indexes angular sectors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CurvedCell {
    pub u: usize,
    pub phi: usize,
}

/// Cylindrical (u, φ) grid around the vertical axis through the origin.
///
/// φ wraps cyclically with period 2π (handled by modulo, never clamped);
/// u is bounded: points outside `u_count` height bands or beyond the radial
/// bound do not resolve. Every node accumulates the radial distance ρ of
/// its points, so a node's mean reconstructs a 3D surface position.
#[derive(Clone, Debug)]
pub struct CurvedGrid {
    u_count: usize,
    phi_count: usize,
    u_step: f32,
    max_radius: f32,
    min_confidence: Confidence,
    nodes: Vec<GridNode>,
}

impl CurvedGrid {
    pub fn new(
        u_count: usize,
        phi_count: usize,
        u_step: f32,
        max_radius: f32,
        history_capacity: usize,
        min_confidence: Confidence,
    ) -> Self {
        assert!(u_count > 0 && phi_count > 0, "grid dimensions must be positive");
        assert!(u_step > 0.0 && max_radius > 0.0, "grid extents must be positive");
        Self {
            u_count,
            phi_count,
            u_step,
            max_radius,
            min_confidence,
            nodes: vec![GridNode::new(history_capacity); u_count * phi_count],
        }
    }

    #[inline]
    pub fn u_count(&self) -> usize {
        self.u_count
    }

    #[inline]
    pub fn phi_count(&self) -> usize {
        self.phi_count
    }

    #[inline]
    pub fn phi_step(&self) -> f32 {
        TAU / self.phi_count as f32
    }

    #[inline]
    fn index(&self, cell: CurvedCell) -> usize {
        cell.u * self.phi_count + cell.phi
    }

    /// Angular sector index for an angle in radians, wrapped modulo 2π.
    pub fn sector_of_angle(&self, phi: f32) -> usize {
        let wrapped = phi.rem_euclid(TAU);
        ((wrapped / self.phi_step()) as usize) % self.phi_count
    }

    /// Resolve a camera-space point to a (u, φ) cell. The point must
    /// already be expressed relative to the accepted floor plane, i.e.
    /// z = 0 on the floor. Returns `None` below the confidence gate, above
    /// the top height band, below the floor, or beyond the radial bound.
    pub fn resolve(
        &self,
        camera_point: &Point3<f32>,
        pose: &CameraPose,
        confidence: Confidence,
    ) -> Option<CurvedCell> {
        if confidence < self.min_confidence {
            return None;
        }
        let world = pose.to_world(camera_point);
        if world.z < 0.0 {
            return None;
        }
        let u = (world.z / self.u_step).floor() as usize;
        if u >= self.u_count {
            return None;
        }
        let rho = world.x.hypot(world.y);
        if rho > self.max_radius {
            return None;
        }
        let phi = self.sector_of_angle(world.y.atan2(world.x));
        Some(CurvedCell { u, phi })
    }

    /// Resolve and fold one point into the grid, accumulating its radial
    /// distance ρ.
    pub fn ingest(
        &mut self,
        camera_point: &Point3<f32>,
        pose: &CameraPose,
        confidence: Confidence,
    ) -> Option<CurvedCell> {
        let cell = self.resolve(camera_point, pose, confidence)?;
        let world = pose.to_world(camera_point);
        let rho = world.x.hypot(world.y);
        let idx = self.index(cell);
        self.nodes[idx].update(rho);
        Some(cell)
    }

    #[inline]
    pub fn node(&self, cell: CurvedCell) -> &GridNode {
        &self.nodes[self.index(cell)]
    }

    #[inline]
    pub fn node_mut(&mut self, cell: CurvedCell) -> &mut GridNode {
        let idx = self.index(cell);
        &mut self.nodes[idx]
    }

    /// Reconstruct the 3D surface position represented by a cell from its
    /// accumulated mean radius. `None` for nodes without data.
    pub fn position_of(&self, cell: CurvedCell) -> Option<Point3<f32>> {
        let node = self.node(cell);
        if !node.has_data() {
            return None;
        }
        let rho = node.mean();
        let phi = (cell.phi as f32 + 0.5) * self.phi_step();
        let z = (cell.u as f32 + 0.5) * self.u_step;
        Some(Point3::new(rho * phi.cos(), rho * phi.sin(), z))
    }

    /// All nodes in index order together with their cell addresses.
    pub fn cells(&self) -> impl Iterator<Item = (CurvedCell, &GridNode)> {
        let phi_count = self.phi_count;
        self.nodes.iter().enumerate().map(move |(i, node)| {
            (
                CurvedCell {
                    u: i / phi_count,
                    phi: i % phi_count,
                },
                node,
            )
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (CurvedCell, &mut GridNode)> {
        let phi_count = self.phi_count;
        self.nodes.iter_mut().enumerate().map(move |(i, node)| {
            (
                CurvedCell {
                    u: i / phi_count,
                    phi: i % phi_count,
                },
                node,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn planar_resolve_is_bounded() {
        let grid = PlanarGrid::new(10, 10, 0.5, 4, Confidence::Low);
        let pose = CameraPose::identity();
        let inside = grid
            .resolve(&Point3::new(0.0, 0.0, 0.8), &pose, Confidence::High)
            .unwrap();
        assert_eq!(inside, PlanarCell { row: 5, col: 5 });
        assert!(grid
            .resolve(&Point3::new(0.6, 0.0, 0.8), &pose, Confidence::High)
            .is_none());
        assert!(grid
            .resolve(&Point3::new(-0.51, 0.0, 0.8), &pose, Confidence::High)
            .is_none());
    }

    #[test]
    fn confidence_gate_drops_points_silently() {
        let mut grid = PlanarGrid::new(4, 4, 0.5, 4, Confidence::High);
        let pose = CameraPose::identity();
        assert!(grid
            .ingest(&Point3::new(0.0, 0.0, 0.8), &pose, Confidence::Medium)
            .is_none());
        let cell = grid
            .ingest(&Point3::new(0.0, 0.0, 0.8), &pose, Confidence::High)
            .unwrap();
        assert!(grid.node(cell).has_data());
    }

    #[test]
    fn pose_transform_applies_before_addressing() {
        let mut grid = PlanarGrid::new(10, 10, 0.5, 4, Confidence::Low);
        let pose = CameraPose::new(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 0.8)));
        let cell = grid
            .ingest(&Point3::new(0.1, -0.1, 0.0), &pose, Confidence::High)
            .unwrap();
        assert_relative_eq!(grid.node(cell).mean(), 0.8, epsilon = 1e-6);
    }

    #[test]
    fn curved_phi_wraps_by_modulo() {
        let grid = CurvedGrid::new(10, 36, 0.02, 0.5, 4, Confidence::Low);
        let pose = CameraPose::identity();
        // just below the positive x axis: φ = -ε ≡ 2π - ε, last sector
        let below = grid
            .resolve(&Point3::new(0.2, -1e-4, 0.05), &pose, Confidence::High)
            .unwrap();
        assert_eq!(below.phi, 35);
        // just above: first sector
        let above = grid
            .resolve(&Point3::new(0.2, 1e-4, 0.05), &pose, Confidence::High)
            .unwrap();
        assert_eq!(above.phi, 0);
        assert_eq!(below.u, above.u);
    }

    #[test]
    fn curved_u_is_bounded_not_wrapped() {
        let grid = CurvedGrid::new(10, 36, 0.02, 0.5, 4, Confidence::Low);
        let pose = CameraPose::identity();
        assert!(grid
            .resolve(&Point3::new(0.2, 0.0, 0.25), &pose, Confidence::High)
            .is_none());
        assert!(grid
            .resolve(&Point3::new(0.2, 0.0, -0.01), &pose, Confidence::High)
            .is_none());
    }

    #[test]
    fn curved_index_is_bijective() {
        let grid = CurvedGrid::new(7, 13, 0.02, 0.5, 4, Confidence::Low);
        let mut seen = std::collections::HashSet::new();
        for (cell, _) in grid.cells() {
            assert!(cell.u < 7 && cell.phi < 13);
            assert!(seen.insert(grid.index(cell)));
        }
        assert_eq!(seen.len(), 7 * 13);
    }

    #[test]
    fn position_reconstructs_from_mean_radius() {
        let mut grid = CurvedGrid::new(10, 36, 0.02, 0.5, 8, Confidence::Low);
        let pose = CameraPose::identity();
        let p = Point3::new(0.1, 0.1, 0.03);
        let cell = grid.ingest(&p, &pose, Confidence::High).unwrap();
        let pos = grid.position_of(cell).unwrap();
        let rho = (p.x * p.x + p.y * p.y).sqrt();
        assert_relative_eq!(pos.coords.xy().norm(), rho, epsilon = 1e-5);
        assert!(grid.position_of(CurvedCell { u: 9, phi: 0 }).is_none());
    }
}
