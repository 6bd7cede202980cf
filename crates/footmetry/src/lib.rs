//! Depth-scan foot metrology engine.
//!
//! This crate turns a stream of depth-camera frames (per-point position,
//! confidence and camera pose) into foot measurements:
//! - floor-height detection over a planar grid, by histogram mode-finding
//!   with a convergence criterion
//! - per-node statistical aggregation and floor/foot segmentation
//! - border extraction over a cylindrical grid, with temporal smoothing
//! - anatomical landmarks (toe, heel, bunch width, instep height) via arc
//!   scans and quadratic regression
//!
//! ## Quickstart
//!
//! ```
//! use footmetry::{Frame, ScanParams, ScanSession};
//!
//! let mut session = ScanSession::new(ScanParams::default());
//! // feed frames until the floor converges...
//! # let frame = Frame { points: Vec::new(), pose: footmetry::core::CameraPose::identity() };
//! session.process_frame(&frame);
//! if session.floor_height().is_some() {
//!     session.begin_scan().unwrap();
//!     // ...then scan frames produce landmarks
//!     let snapshot = session.landmarks().unwrap();
//!     println!("length: {:?} mm", snapshot.length_mm);
//! }
//! ```
//!
//! ## API map
//! - [`ScanSession`]: the phase machine and frame-ingestion surface.
//! - [`FloorEstimator`], [`Segmenter`], [`BorderExtractor`]: the pipeline
//!   stages, usable standalone.
//! - [`landmark`]: regression, arc scans and the landmark mode machine.
//! - [`footmetry::core`](core): grids, per-node statistics, traversal
//!   order and reductions.

pub use footmetry_core as core;

pub mod border;
pub mod config;
pub mod error;
pub mod export;
pub mod floor;
pub mod landmark;
pub mod segment;
pub mod session;

pub use border::BorderExtractor;
pub use config::ScanParams;
pub use error::{DegenerateFit, MetricsError};
pub use export::NodeSample;
pub use floor::FloorEstimator;
pub use landmark::{
    active_accumulators, AccumulatorId, FootMetricProps, LandmarkMode, LandmarkRegressor,
};
pub use segment::Segmenter;
pub use session::{Frame, FramePoint, LandmarkSnapshot, Phase, ScanSession};
