//! Core numeric and grid primitives for depth-scan foot metrology.
//!
//! This crate is intentionally small and policy-free. It knows nothing about
//! floors, feet or landmarks: it provides running statistics, the point-to-cell
//! addressing schemes, and the mesh traversal order that the `footmetry`
//! engine builds on.

mod grid;
mod logger;
mod node;
mod reduce;
mod stats;
mod traversal;

pub use grid::{CameraPose, Confidence, CurvedCell, CurvedGrid, PlanarCell, PlanarGrid};
pub use node::{Classification, GridNode};
pub use reduce::fold_balanced;
pub use stats::{CyclicStat, InertialAverage};
pub use traversal::strip_indices;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
