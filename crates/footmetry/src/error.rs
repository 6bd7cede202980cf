//! Errors returned by the metrology engine.

/// Quadratic regression could not produce a usable extremum: fewer than
/// three distinct abscissae, or a singular normal-equations matrix.
///
/// Callers keep the previous smoothed landmark value when they see this;
/// it is a per-frame condition, never fatal.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("degenerate quadratic fit over {points} points")]
pub struct DegenerateFit {
    pub points: usize,
}

/// Why landmark values are not available right now.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    #[error("floor height has not converged yet")]
    FloorNotReady,
    #[error("landmarks are only produced in the scan and measure phases")]
    NotScanning,
}
