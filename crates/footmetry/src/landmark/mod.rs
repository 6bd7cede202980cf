//! Landmark extraction over the smoothed border contour.
//!
//! One landmark is refined at a time. A five-state mode machine walks the
//! cycle toe length → heel length → bunch outer → bunch inner → instep
//! height and back; each mode feeds a small set of inertial accumulators
//! listed by [`active_accumulators`], and a mode transition resets exactly
//! the accumulators the new mode activates. Landmarks finished in earlier
//! modes keep their smoothed values, which the bunch and instep picks
//! depend on through the derived foot basis.

mod picks;
mod regression;

pub use picks::{nearest_or_farthest, ExtremeMode, SectorArc};
pub use regression::{fit_extremum, QuadraticFit};

use log::debug;
use nalgebra::Vector3;

use footmetry_core::InertialAverage;

use crate::config::ScanParams;

/// Which landmark the regressor is currently refining.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LandmarkMode {
    #[default]
    ToeLength,
    HeelLength,
    BunchOuter,
    BunchInner,
    InstepHeight,
}

impl LandmarkMode {
    /// Successor in the fixed refinement cycle.
    pub fn next(self) -> Self {
        match self {
            Self::ToeLength => Self::HeelLength,
            Self::HeelLength => Self::BunchOuter,
            Self::BunchOuter => Self::BunchInner,
            Self::BunchInner => Self::InstepHeight,
            Self::InstepHeight => Self::ToeLength,
        }
    }
}

/// The individually resettable accumulators of [`FootMetricProps`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccumulatorId {
    Toe,
    Heel,
    BunchOuter,
    BunchInner,
    BunchToeRef,
    IntervalStart,
    IntervalEnd,
    InstepHeight,
}

/// The accumulators a mode writes to. Pure; applied atomically on every
/// transition.
pub fn active_accumulators(mode: LandmarkMode) -> &'static [AccumulatorId] {
    use AccumulatorId::*;
    match mode {
        LandmarkMode::ToeLength => &[Toe],
        LandmarkMode::HeelLength => &[Heel],
        LandmarkMode::BunchOuter => &[BunchToeRef, IntervalStart, IntervalEnd, BunchOuter],
        LandmarkMode::BunchInner => &[BunchToeRef, IntervalStart, IntervalEnd, BunchInner],
        LandmarkMode::InstepHeight => &[InstepHeight],
    }
}

/// Orientation basis of the scanned foot, derived from the smoothed toe
/// and heel landmarks. `along` points from toe towards heel in the floor
/// plane; `across` is its in-plane normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootBasis {
    pub along: Vector3<f32>,
    pub across: Vector3<f32>,
}

impl FootBasis {
    /// `None` when toe and heel coincide in the floor plane.
    pub fn from_landmarks(toe: Vector3<f32>, heel: Vector3<f32>) -> Option<Self> {
        let mut along = heel - toe;
        along.z = 0.0;
        let norm = along.norm();
        if norm < 1e-6 {
            return None;
        }
        along /= norm;
        let across = Vector3::new(-along.y, along.x, 0.0);
        Some(Self { along, across })
    }

    /// Coordinates of `p` in the foot frame: (along, across, height).
    #[inline]
    pub fn to_basis(&self, p: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(self.along.dot(&p), self.across.dot(&p), p.z)
    }
}

/// Point on the heel→toe axis: `fraction` 0 is the heel, 1 the toe.
#[inline]
pub fn point_on_axis(heel: Vector3<f32>, toe: Vector3<f32>, fraction: f32) -> Vector3<f32> {
    heel + (toe - heel) * fraction
}

/// The inertial accumulators of one scan session's landmarks.
#[derive(Clone, Debug)]
pub struct FootMetricProps {
    toe: InertialAverage<Vector3<f32>>,
    heel: InertialAverage<Vector3<f32>>,
    bunch_outer: InertialAverage<Vector3<f32>>,
    bunch_inner: InertialAverage<Vector3<f32>>,
    bunch_toe_ref: InertialAverage<Vector3<f32>>,
    interval_start: InertialAverage<Vector3<f32>>,
    interval_end: InertialAverage<Vector3<f32>>,
    instep_height: InertialAverage<f32>,
}

impl FootMetricProps {
    pub fn new(window: usize) -> Self {
        Self {
            toe: InertialAverage::new(window),
            heel: InertialAverage::new(window),
            bunch_outer: InertialAverage::new(window),
            bunch_inner: InertialAverage::new(window),
            bunch_toe_ref: InertialAverage::new(window),
            interval_start: InertialAverage::new(window),
            interval_end: InertialAverage::new(window),
            instep_height: InertialAverage::new(window),
        }
    }

    pub fn reset(&mut self, id: AccumulatorId) {
        match id {
            AccumulatorId::Toe => self.toe.reset(),
            AccumulatorId::Heel => self.heel.reset(),
            AccumulatorId::BunchOuter => self.bunch_outer.reset(),
            AccumulatorId::BunchInner => self.bunch_inner.reset(),
            AccumulatorId::BunchToeRef => self.bunch_toe_ref.reset(),
            AccumulatorId::IntervalStart => self.interval_start.reset(),
            AccumulatorId::IntervalEnd => self.interval_end.reset(),
            AccumulatorId::InstepHeight => self.instep_height.reset(),
        }
    }

    pub fn reset_all(&mut self) {
        use AccumulatorId::*;
        for id in [
            Toe,
            Heel,
            BunchOuter,
            BunchInner,
            BunchToeRef,
            IntervalStart,
            IntervalEnd,
            InstepHeight,
        ] {
            self.reset(id);
        }
    }

    #[inline]
    pub fn toe(&self) -> Option<Vector3<f32>> {
        self.toe.mean()
    }

    #[inline]
    pub fn heel(&self) -> Option<Vector3<f32>> {
        self.heel.mean()
    }

    #[inline]
    pub fn bunch_outer(&self) -> Option<Vector3<f32>> {
        self.bunch_outer.mean()
    }

    #[inline]
    pub fn bunch_inner(&self) -> Option<Vector3<f32>> {
        self.bunch_inner.mean()
    }

    #[inline]
    pub fn instep_height(&self) -> Option<f32> {
        self.instep_height.mean()
    }

    /// Orientation basis from the current toe and heel means.
    pub fn basis(&self) -> Option<FootBasis> {
        FootBasis::from_landmarks(self.toe()?, self.heel()?)
    }
}

/// Fraction interval of the heel→toe axis searched for the outer bunch
/// point, heel side first.
const BUNCH_OUTER_SPAN: (f32, f32) = (0.55, 0.85);
/// Fraction interval searched for the inner bunch point.
const BUNCH_INNER_SPAN: (f32, f32) = (0.60, 0.90);
/// Fraction of the axis probed for the instep crest.
const INSTEP_FRACTION: f32 = 0.5;
/// Half-width of the instep fit window, as a fraction of the axis.
const INSTEP_WINDOW: f32 = 0.25;

/// Refines one landmark per frame from the smoothed border contour.
#[derive(Clone, Debug)]
pub struct LandmarkRegressor {
    mode: LandmarkMode,
    props: FootMetricProps,
    toe_arc: SectorArc,
    heel_arc: SectorArc,
    heel_tolerance: f32,
}

impl LandmarkRegressor {
    pub fn new(params: &ScanParams) -> Self {
        Self {
            mode: LandmarkMode::default(),
            props: FootMetricProps::new(params.smoothing_window),
            toe_arc: SectorArc::toe(params.phi_count),
            heel_arc: SectorArc::heel(params.phi_count),
            heel_tolerance: params.heel_tolerance,
        }
    }

    #[inline]
    pub fn mode(&self) -> LandmarkMode {
        self.mode
    }

    #[inline]
    pub fn props(&self) -> &FootMetricProps {
        &self.props
    }

    /// Step the mode machine, resetting exactly the accumulators the new
    /// mode activates. Accumulators shared with the old mode and finished
    /// landmarks keep their history.
    pub fn advance_mode(&mut self) {
        let next = self.mode.next();
        let previous = active_accumulators(self.mode);
        for &id in active_accumulators(next) {
            if !previous.contains(&id) {
                self.props.reset(id);
            }
        }
        debug!("landmark mode {:?} -> {next:?}", self.mode);
        self.mode = next;
    }

    /// Back to the initial mode with empty accumulators.
    pub fn reset(&mut self) {
        self.mode = LandmarkMode::default();
        self.props.reset_all();
    }

    /// Fold one frame's border contour into the active accumulators.
    /// Frames without enough data for the active pick change nothing.
    pub fn update(&mut self, border: &[Option<Vector3<f32>>]) {
        match self.mode {
            LandmarkMode::ToeLength => {
                if let Some(idx) = nearest_or_farthest(border, self.toe_arc, ExtremeMode::Farthest)
                {
                    if let Some(p) = border[idx] {
                        self.props.toe.push(p);
                    }
                }
            }
            LandmarkMode::HeelLength => {
                let mode = ExtremeMode::HeelScan {
                    tolerance: self.heel_tolerance,
                };
                if let Some(idx) = nearest_or_farthest(border, self.heel_arc, mode) {
                    if let Some(p) = border[idx] {
                        self.props.heel.push(p);
                    }
                }
            }
            LandmarkMode::BunchOuter => self.pick_bunch(border, BUNCH_OUTER_SPAN, true),
            LandmarkMode::BunchInner => self.pick_bunch(border, BUNCH_INNER_SPAN, false),
            LandmarkMode::InstepHeight => self.pick_instep(border),
        }
    }

    /// Bunch-width pick: find the border indices where the contour crosses
    /// the axis-interval endpoints (by sign change of the basis-x
    /// coordinate), then take the point farthest from the foot axis within
    /// that stretch. The outer side of the contour runs from sector 0 to
    /// the toe sector, the inner side from the toe sector onward.
    fn pick_bunch(&mut self, border: &[Option<Vector3<f32>>], span: (f32, f32), outer: bool) {
        let Some(toe_idx) = nearest_or_farthest(border, self.toe_arc, ExtremeMode::Farthest)
        else {
            return;
        };
        let Some(toe_ref) = border[toe_idx] else { return };
        self.props.bunch_toe_ref.push(toe_ref);

        let Some(basis) = self.props.basis() else { return };
        let (Some(toe), Some(heel)) = (self.props.toe(), self.props.heel()) else {
            return;
        };

        let side: Vec<usize> = if outer {
            (0..toe_idx).collect()
        } else {
            (toe_idx..border.len()).collect()
        };
        let x_lo = basis.to_basis(point_on_axis(heel, toe, span.0)).x;
        let x_hi = basis.to_basis(point_on_axis(heel, toe, span.1)).x;
        let (Some(i_lo), Some(i_hi)) = (
            find_crossing(border, &side, &basis, x_lo),
            find_crossing(border, &side, &basis, x_hi),
        ) else {
            return;
        };
        if let Some(p) = border[side[i_lo]] {
            self.props.interval_start.push(p);
        }
        if let Some(p) = border[side[i_hi]] {
            self.props.interval_end.push(p);
        }

        let (lo, hi) = if i_lo <= i_hi { (i_lo, i_hi) } else { (i_hi, i_lo) };
        let mut best: Option<(Vector3<f32>, f32)> = None;
        for &phi in &side[lo..=hi] {
            let Some(p) = border[phi] else { continue };
            let width = basis.to_basis(p - toe_ref).y.abs();
            if best.is_none_or(|(_, w)| width > w) {
                best = Some((p, width));
            }
        }
        if let Some((p, _)) = best {
            if outer {
                self.props.bunch_outer.push(p);
            } else {
                self.props.bunch_inner.push(p);
            }
        }
    }

    /// Instep-height pick: quadratic fit of border height against the
    /// basis-x coordinate over a window around the mid-axis probe; the
    /// fitted crest height feeds the accumulator. A degenerate fit keeps
    /// the previous smoothed value.
    fn pick_instep(&mut self, border: &[Option<Vector3<f32>>]) {
        let Some(basis) = self.props.basis() else { return };
        let (Some(toe), Some(heel)) = (self.props.toe(), self.props.heel()) else {
            return;
        };
        let x_mid = basis
            .to_basis(point_on_axis(heel, toe, INSTEP_FRACTION))
            .x;
        let x_lo = basis
            .to_basis(point_on_axis(heel, toe, INSTEP_FRACTION - INSTEP_WINDOW))
            .x;
        let x_hi = basis
            .to_basis(point_on_axis(heel, toe, INSTEP_FRACTION + INSTEP_WINDOW))
            .x;
        let (x_lo, x_hi) = (x_lo.min(x_hi), x_lo.max(x_hi));

        let profile: Vec<(f32, f32)> = border
            .iter()
            .flatten()
            .map(|p| (basis.to_basis(*p).x, p.z))
            .filter(|&(t, _)| t >= x_lo && t <= x_hi)
            .collect();
        match fit_extremum(&profile) {
            Ok(fit) => {
                debug!(
                    "instep crest at basis-x {:.3} (probe {x_mid:.3}), height {:.4}",
                    fit.extremum.0, fit.extremum.1
                );
                self.props.instep_height.push(fit.extremum.1);
            }
            Err(err) => debug!("instep fit skipped: {err}"),
        }
    }
}

/// First index pair of `side` where the contour's basis-x coordinate
/// crosses `target`, skipping empty sectors.
fn find_crossing(
    border: &[Option<Vector3<f32>>],
    side: &[usize],
    basis: &FootBasis,
    target: f32,
) -> Option<usize> {
    let mut previous: Option<(usize, f32)> = None;
    for (i, &phi) in side.iter().enumerate() {
        let Some(p) = border[phi] else { continue };
        let x = basis.to_basis(p).x;
        if let Some((j, x_prev)) = previous {
            if (x_prev - target) * (x - target) <= 0.0 {
                return Some(j);
            }
        }
        previous = Some((i, x));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::TAU;

    fn params(phi_count: usize) -> ScanParams {
        ScanParams {
            phi_count,
            smoothing_window: 4,
            ..ScanParams::default()
        }
    }

    /// Elliptical foot contour: toe at φ = π (along −x), heel at φ = 0.
    fn foot_contour(phi_count: usize) -> Vec<Option<Vector3<f32>>> {
        let half_length = 0.13;
        let half_width = 0.05;
        (0..phi_count)
            .map(|phi| {
                let a = (phi as f32 + 0.5) * TAU / phi_count as f32;
                // polar form of an axis-aligned ellipse centred on origin
                let r = half_length * half_width
                    / ((half_width * a.cos()).powi(2) + (half_length * a.sin()).powi(2)).sqrt();
                let z = 0.02 + 0.01 * (2.0 * a).sin().abs();
                Some(Vector3::new(r * a.cos(), r * a.sin(), z))
            })
            .collect()
    }

    #[test]
    fn mode_cycle_closes() {
        let mut mode = LandmarkMode::default();
        for _ in 0..5 {
            mode = mode.next();
        }
        assert_eq!(mode, LandmarkMode::ToeLength);
    }

    #[test]
    fn active_sets_cover_every_accumulator_once_per_cycle() {
        use AccumulatorId::*;
        let mut seen = Vec::new();
        let mut mode = LandmarkMode::default();
        for _ in 0..5 {
            for &id in active_accumulators(mode) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
            mode = mode.next();
        }
        for id in [
            Toe,
            Heel,
            BunchOuter,
            BunchInner,
            BunchToeRef,
            IntervalStart,
            IntervalEnd,
            InstepHeight,
        ] {
            assert!(seen.contains(&id), "{id:?} never active");
        }
    }

    #[test]
    fn basis_is_orthonormal_and_planar() {
        let toe = Vector3::new(-0.12, 0.01, 0.02);
        let heel = Vector3::new(0.11, -0.02, 0.03);
        let basis = FootBasis::from_landmarks(toe, heel).unwrap();
        assert_relative_eq!(basis.along.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(basis.across.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(basis.along.dot(&basis.across), 0.0, epsilon = 1e-6);
        assert_relative_eq!(basis.along.z, 0.0);
    }

    #[test]
    fn coincident_landmarks_have_no_basis() {
        let p = Vector3::new(0.1, 0.0, 0.05);
        assert!(FootBasis::from_landmarks(p, p + Vector3::new(0.0, 0.0, 0.3)).is_none());
    }

    #[test]
    fn axis_point_interpolates_heel_to_toe() {
        let toe = Vector3::new(-0.12, 0.0, 0.0);
        let heel = Vector3::new(0.12, 0.0, 0.0);
        assert_relative_eq!(point_on_axis(heel, toe, 0.0).x, 0.12);
        assert_relative_eq!(point_on_axis(heel, toe, 1.0).x, -0.12);
        assert_relative_eq!(point_on_axis(heel, toe, 0.5).x, 0.0);
    }

    #[test]
    fn toe_mode_accumulates_the_farthest_arc_point() {
        let p = params(48);
        let mut regressor = LandmarkRegressor::new(&p);
        let border = foot_contour(48);
        regressor.update(&border);
        let toe = regressor.props().toe().expect("toe accumulated");
        // toe of the ellipse sits near (−0.13, 0)
        assert_relative_eq!(toe.x, -0.13, epsilon = 0.01);
        assert!(toe.y.abs() < 0.02);
    }

    #[test]
    fn heel_mode_accumulates_the_back_of_the_heel() {
        let p = params(48);
        let mut regressor = LandmarkRegressor::new(&p);
        let border = foot_contour(48);
        regressor.advance_mode();
        assert_eq!(regressor.mode(), LandmarkMode::HeelLength);
        regressor.update(&border);
        let heel = regressor.props().heel().expect("heel accumulated");
        assert_relative_eq!(heel.x, 0.13, epsilon = 0.01);
    }

    #[test]
    fn bunch_modes_need_both_length_landmarks() {
        let p = params(48);
        let mut regressor = LandmarkRegressor::new(&p);
        let border = foot_contour(48);
        regressor.update(&border);
        regressor.advance_mode();
        regressor.advance_mode();
        assert_eq!(regressor.mode(), LandmarkMode::BunchOuter);
        // heel was never accumulated, so no basis and no bunch point
        regressor.update(&border);
        assert!(regressor.props().bunch_outer().is_none());
    }

    #[test]
    fn full_cycle_measures_an_elliptical_contour() {
        let p = params(96);
        let mut regressor = LandmarkRegressor::new(&p);
        let border = foot_contour(96);
        for step in 0..5 {
            for _ in 0..4 {
                regressor.update(&border);
            }
            // wrapping back to toe mode would reset the toe accumulator
            if step < 4 {
                regressor.advance_mode();
            }
        }
        let props = regressor.props();
        let toe = props.toe().unwrap();
        let heel = props.heel().unwrap();
        assert_relative_eq!((heel - toe).xy().norm(), 0.26, epsilon = 0.02);
        let outer = props.bunch_outer().expect("outer bunch accumulated");
        let inner = props.bunch_inner().expect("inner bunch accumulated");
        // bunch points sit on opposite sides of the foot axis
        let basis = props.basis().unwrap();
        let w_outer = basis.to_basis(outer - toe).y;
        let w_inner = basis.to_basis(inner - toe).y;
        assert!(w_outer * w_inner < 0.0);
        assert!(props.instep_height().is_some());
    }

    #[test]
    fn advancing_resets_only_newly_activated_accumulators() {
        let p = params(48);
        let mut regressor = LandmarkRegressor::new(&p);
        let border = foot_contour(48);
        regressor.update(&border);
        assert!(regressor.props().toe().is_some());
        regressor.advance_mode();
        // toe survives the transition into heel mode
        assert!(regressor.props().toe().is_some());
        assert!(regressor.props().heel().is_none());
    }

    #[test]
    fn reset_returns_to_the_initial_mode() {
        let p = params(48);
        let mut regressor = LandmarkRegressor::new(&p);
        regressor.update(&foot_contour(48));
        regressor.advance_mode();
        regressor.reset();
        assert_eq!(regressor.mode(), LandmarkMode::ToeLength);
        assert!(regressor.props().toe().is_none());
    }
}
