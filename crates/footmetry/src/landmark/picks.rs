//! Arc scans over the smoothed border contour.
//!
//! Landmark picks walk a contiguous run of angular sectors and select one
//! border point by an extremal criterion. Sectors whose accumulator is
//! still empty are skipped, never treated as the origin.

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;

/// Half-open run of angular sectors, `start..end` in sector indices.
///
/// `end` may be smaller than `start` for arcs crossing the φ = 0 seam; the
/// wrap-around is handled by the scan itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectorArc {
    pub start: usize,
    pub end: usize,
}

impl SectorArc {
    /// Arc around φ = π where the toe of a heel-towards-+x foot sits:
    /// [11π/12, 13π/12].
    pub fn toe(phi_count: usize) -> Self {
        Self {
            start: sector_of(11.0 * PI / 12.0, phi_count),
            end: sector_of(13.0 * PI / 12.0, phi_count),
        }
    }

    /// Arc around φ = 0 (crossing the seam) where the heel sits:
    /// [3π/2, 2π) ∪ [0, π/2].
    pub fn heel(phi_count: usize) -> Self {
        Self {
            start: sector_of(3.0 * FRAC_PI_2, phi_count),
            end: sector_of(FRAC_PI_2, phi_count),
        }
    }

    /// Sector indices of the arc, in scan order, wrapping modulo
    /// `phi_count` when the arc crosses the seam.
    pub fn indices(&self, phi_count: usize) -> Vec<usize> {
        if self.start <= self.end {
            (self.start..self.end).collect()
        } else {
            (self.start..phi_count).chain(0..self.end).collect()
        }
    }
}

fn sector_of(angle: f32, phi_count: usize) -> usize {
    let step = std::f32::consts::TAU / phi_count as f32;
    ((angle / step).floor() as usize).min(phi_count - 1)
}

/// Extremal criterion of an arc scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExtremeMode {
    /// The point with the largest distance from the grid axis origin.
    Farthest,
    /// Running-maximum scan of the x coordinate with early exit: the scan
    /// stops as soon as a point falls more than `tolerance` behind the
    /// running maximum, so a single pass over the heel arc settles on the
    /// back of the heel without walking the whole contour.
    HeelScan { tolerance: f32 },
}

/// Select one border point of `arc` by `mode`. Returns its sector index,
/// or `None` when the arc holds no data at all.
pub fn nearest_or_farthest(
    points: &[Option<Vector3<f32>>],
    arc: SectorArc,
    mode: ExtremeMode,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for phi in arc.indices(points.len()) {
        let Some(p) = points[phi] else { continue };
        match mode {
            ExtremeMode::Farthest => {
                let d = p.norm_squared();
                if best.is_none_or(|(_, b)| d > b) {
                    best = Some((phi, d));
                }
            }
            ExtremeMode::HeelScan { tolerance } => {
                match best {
                    Some((_, max_x)) if p.x < max_x - tolerance => break,
                    Some((_, max_x)) if p.x > max_x => best = Some((phi, p.x)),
                    Some(_) => {}
                    None => best = Some((phi, p.x)),
                }
            }
        }
    }
    best.map(|(phi, _)| phi)
}
