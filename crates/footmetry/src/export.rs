//! Grouped node queries for external mesh and line writers.
//!
//! Consumers receive every node with data as an `(a, b, value)` triple
//! keyed by classification; the triple is (row, col, mean height) for the
//! planar grid and (u, φ, mean radius) for the curved one. Serpentine
//! strip indices provide the matching mesh connectivity.

use std::collections::BTreeMap;

use serde::Serialize;

use footmetry_core::{strip_indices, Classification, CurvedGrid, PlanarGrid};

/// One exported node: cell address plus its aggregated value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NodeSample {
    pub a: usize,
    pub b: usize,
    pub value: f32,
}

/// Nodes of the planar grid with data, grouped by classification, in node
/// index order within each group.
pub fn grouped_planar(grid: &PlanarGrid) -> BTreeMap<Classification, Vec<NodeSample>> {
    let mut groups: BTreeMap<Classification, Vec<NodeSample>> = BTreeMap::new();
    for (cell, node) in grid.cells() {
        if node.has_data() {
            groups.entry(node.classification()).or_default().push(NodeSample {
                a: cell.row,
                b: cell.col,
                value: node.mean(),
            });
        }
    }
    groups
}

/// Nodes of the curved grid with data, grouped by classification.
pub fn grouped_curved(grid: &CurvedGrid) -> BTreeMap<Classification, Vec<NodeSample>> {
    let mut groups: BTreeMap<Classification, Vec<NodeSample>> = BTreeMap::new();
    for (cell, node) in grid.cells() {
        if node.has_data() {
            groups.entry(node.classification()).or_default().push(NodeSample {
                a: cell.u,
                b: cell.phi,
                value: node.mean(),
            });
        }
    }
    groups
}

/// Triangle-strip connectivity of the planar grid.
pub fn planar_strip(grid: &PlanarGrid) -> Vec<u32> {
    strip_indices(grid.rows(), grid.cols(), false)
}

/// Triangle-strip connectivity of the curved grid, closing the φ loop.
pub fn curved_strip(grid: &CurvedGrid) -> Vec<u32> {
    strip_indices(grid.u_count(), grid.phi_count(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use footmetry_core::{CameraPose, Confidence};
    use nalgebra::Point3;

    #[test]
    fn groups_follow_node_classification() {
        let mut grid = PlanarGrid::new(4, 4, 0.5, 4, Confidence::Low);
        let pose = CameraPose::identity();
        let floor_cell = grid
            .ingest(&Point3::new(-0.4, -0.4, 0.0), &pose, Confidence::High)
            .unwrap();
        let foot_cell = grid
            .ingest(&Point3::new(0.3, 0.3, 0.05), &pose, Confidence::High)
            .unwrap();
        grid.node_mut(floor_cell).set_classification(Classification::Floor);
        grid.node_mut(foot_cell).set_classification(Classification::Foot);

        let groups = grouped_planar(&grid);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Classification::Floor].len(), 1);
        let foot = &groups[&Classification::Foot][0];
        assert_eq!((foot.a, foot.b), (foot_cell.row, foot_cell.col));
        assert!((foot.value - 0.05).abs() < 1e-6);
    }

    #[test]
    fn nodes_without_data_are_not_exported() {
        let grid = PlanarGrid::new(4, 4, 0.5, 4, Confidence::Low);
        assert!(grouped_planar(&grid).is_empty());
    }

    #[test]
    fn curved_strip_closes_the_loop() {
        let grid = CurvedGrid::new(3, 4, 0.02, 0.5, 4, Confidence::Low);
        let strip = curved_strip(&grid);
        let planar_len = strip_indices(3, 4, false).len();
        assert!(strip.len() > planar_len);
    }
}
