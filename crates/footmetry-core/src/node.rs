//! Per-cell accumulator and segmentation tags.

use serde::{Deserialize, Serialize};

use crate::stats::CyclicStat;

/// Segmentation group assigned to a grid node.
///
/// Stored as an explicit tagged variant; downstream consumers match on it
/// exhaustively instead of doing arithmetic on raw layer ids. `Layer` is
/// reserved for export consumers that slice the foot into extra bands.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Default,
)]
pub enum Classification {
    #[default]
    Unknown,
    Floor,
    Foot,
    Layer(u32),
}

/// Running statistics for a single grid cell.
///
/// `update` only touches the sample history; the classification is owned by
/// the segmenter and never changes as a side effect of aggregation.
#[derive(Clone, Debug)]
pub struct GridNode {
    history: CyclicStat,
    classification: Classification,
}

impl GridNode {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: CyclicStat::new(history_capacity),
            classification: Classification::Unknown,
        }
    }

    /// Append one observed height sample.
    pub fn update(&mut self, height: f32) {
        self.history.update(height);
    }

    /// A node without samples carries no information and is excluded from
    /// floor and segmentation computations.
    #[inline]
    pub fn has_data(&self) -> bool {
        !self.history.is_empty()
    }

    /// Mean over the retained sample window.
    #[inline]
    pub fn mean(&self) -> f32 {
        self.history.mean()
    }

    #[inline]
    pub fn deviation(&self) -> f32 {
        self.history.deviation()
    }

    /// Total samples ever folded into this node.
    #[inline]
    pub fn total_samples(&self) -> u64 {
        self.history.total_seen()
    }

    #[inline]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Assigned exclusively by the segmenter.
    #[inline]
    pub fn set_classification(&mut self, classification: Classification) {
        self.classification = classification;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn update_leaves_classification_alone() {
        let mut node = GridNode::new(4);
        assert!(!node.has_data());
        node.update(0.8);
        node.update(0.82);
        assert!(node.has_data());
        assert_relative_eq!(node.mean(), 0.81, epsilon = 1e-6);
        assert_eq!(node.classification(), Classification::Unknown);

        node.set_classification(Classification::Foot);
        node.update(0.79);
        assert_eq!(node.classification(), Classification::Foot);
    }

    #[test]
    fn history_is_bounded_by_capacity() {
        let mut node = GridNode::new(3);
        for i in 0..10 {
            node.update(i as f32);
        }
        assert_eq!(node.total_samples(), 10);
        // only 7, 8, 9 remain
        assert_relative_eq!(node.mean(), 8.0, epsilon = 1e-5);
    }
}
