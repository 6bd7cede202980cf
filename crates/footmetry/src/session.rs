//! Scan session: phase machine and frame ingestion.
//!
//! A session moves through `FindFloor → Scan → Measure`; scan and measure
//! return to floor search only through an explicit reset. Every transition
//! reinitializes the buffers the new phase writes to, so stale grid data
//! never survives a phase change. Frames are processed synchronously on
//! the caller's thread; the per-node ring buffers make ingestion
//! order-sensitive and must not be fed concurrently.

use std::collections::BTreeMap;

use log::info;
use nalgebra::{Matrix4, Point3, Vector3};

use footmetry_core::{CameraPose, Classification, Confidence, CurvedGrid, PlanarGrid};

use crate::border::BorderExtractor;
use crate::config::ScanParams;
use crate::error::MetricsError;
use crate::export::{curved_strip, grouped_curved, grouped_planar, planar_strip, NodeSample};
use crate::floor::FloorEstimator;
use crate::landmark::{LandmarkMode, LandmarkRegressor};
use crate::segment::Segmenter;

/// Session phase. Floor search uses the planar grid; scan and measure
/// share the curved grid and the landmark machinery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    FindFloor,
    Scan,
    Measure,
}

/// One depth point of a captured frame, in camera space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramePoint {
    pub position: Point3<f32>,
    pub confidence: Confidence,
}

/// One captured depth frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub points: Vec<FramePoint>,
    pub pose: CameraPose,
}

/// Landmark readout at one instant. Raw points are world-space and
/// floor-relative; derived magnitudes are rounded to millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkSnapshot {
    pub mode: LandmarkMode,
    pub toe: Option<Vector3<f32>>,
    pub heel: Option<Vector3<f32>>,
    pub bunch_outer: Option<Vector3<f32>>,
    pub bunch_inner: Option<Vector3<f32>>,
    pub instep_height: Option<f32>,
    /// Toe-to-heel length in the floor plane, millimetres.
    pub length_mm: Option<i32>,
    /// Outer-to-inner bunch width in the floor plane, millimetres.
    pub bunch_width_mm: Option<i32>,
    pub instep_height_mm: Option<i32>,
}

fn to_mm(metres: f32) -> i32 {
    (metres * 1000.0).round() as i32
}

/// The scanning engine. Owns every buffer of the pipeline; the phase
/// control surface is the only way to mutate its state from outside.
#[derive(Clone, Debug)]
pub struct ScanSession {
    params: ScanParams,
    phase: Phase,
    frames: u64,
    planar: PlanarGrid,
    curved: CurvedGrid,
    floor: FloorEstimator,
    segmenter: Segmenter,
    border: BorderExtractor,
    landmarks: LandmarkRegressor,
}

impl ScanSession {
    pub fn new(params: ScanParams) -> Self {
        let planar = Self::fresh_planar(&params);
        let curved = Self::fresh_curved(&params);
        let floor = FloorEstimator::new(&params);
        let segmenter = Segmenter::new(&params);
        let border = BorderExtractor::new(params.phi_count, params.smoothing_window);
        let landmarks = LandmarkRegressor::new(&params);
        Self {
            params,
            phase: Phase::default(),
            frames: 0,
            planar,
            curved,
            floor,
            segmenter,
            border,
            landmarks,
        }
    }

    fn fresh_planar(params: &ScanParams) -> PlanarGrid {
        PlanarGrid::new(
            params.planar_rows,
            params.planar_cols,
            params.half_extent,
            params.history_capacity,
            params.min_confidence,
        )
    }

    fn fresh_curved(params: &ScanParams) -> CurvedGrid {
        CurvedGrid::new(
            params.u_count,
            params.phi_count,
            params.u_step,
            params.half_extent,
            params.history_capacity,
            params.min_confidence,
        )
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Converged floor height, `None` while floor search is still running.
    #[inline]
    pub fn floor_height(&self) -> Option<f32> {
        self.floor.accepted()
    }

    /// Frames ingested since the current phase began.
    #[inline]
    pub fn frames_seen(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Restart floor search from scratch: fresh planar grid, fresh
    /// convergence window, frame counter at zero.
    pub fn begin_floor_search(&mut self) {
        info!("entering floor search");
        self.phase = Phase::FindFloor;
        self.frames = 0;
        self.planar = Self::fresh_planar(&self.params);
        self.floor.reset();
    }

    /// Enter the scan phase. Fails until the floor height has converged.
    pub fn begin_scan(&mut self) -> Result<(), MetricsError> {
        self.enter_curved_phase(Phase::Scan)
    }

    /// Enter the measure phase. Fails until the floor height has converged.
    pub fn begin_measure(&mut self) -> Result<(), MetricsError> {
        self.enter_curved_phase(Phase::Measure)
    }

    fn enter_curved_phase(&mut self, phase: Phase) -> Result<(), MetricsError> {
        let floor = self.floor.accepted().ok_or(MetricsError::FloorNotReady)?;
        info!("entering {phase:?} over floor at {floor:.4} m");
        self.phase = phase;
        self.frames = 0;
        self.curved = Self::fresh_curved(&self.params);
        self.border.reset();
        self.landmarks.reset();
        Ok(())
    }

    /// Back to a pristine session in floor search.
    pub fn reset(&mut self) {
        self.begin_floor_search();
        self.curved = Self::fresh_curved(&self.params);
        self.border.reset();
        self.landmarks.reset();
    }

    /// Step the landmark mode machine. Only meaningful while scanning or
    /// measuring.
    pub fn advance_landmark_mode(&mut self) -> Result<(), MetricsError> {
        if self.phase == Phase::FindFloor {
            return Err(MetricsError::NotScanning);
        }
        self.landmarks.advance_mode();
        Ok(())
    }

    /// Ingest one captured frame. Empty frames are skipped without
    /// advancing the frame counter.
    pub fn process_frame(&mut self, frame: &Frame) {
        if frame.points.is_empty() {
            return;
        }
        match self.phase {
            Phase::FindFloor => self.process_floor_frame(frame),
            Phase::Scan | Phase::Measure => self.process_curved_frame(frame),
        }
    }

    fn process_floor_frame(&mut self, frame: &Frame) {
        for point in &frame.points {
            self.planar.ingest(&point.position, &frame.pose, point.confidence);
        }
        self.frames += 1;
        // an interval of 0 means estimate on every frame
        let interval = self.params.estimate_interval.max(1);
        if self.frames >= self.params.warmup_frames && self.frames % interval == 0 {
            if let Some(floor) = self.floor.observe(&self.planar) {
                self.segmenter.apply_planar(&mut self.planar, floor);
            }
        }
    }

    fn process_curved_frame(&mut self, frame: &Frame) {
        // transitions are gated on acceptance, so the floor is present
        let Some(floor) = self.floor.accepted() else { return };
        // express the frame relative to the floor plane: z = 0 on the floor
        let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -floor));
        let pose = CameraPose::new(lift * frame.pose.camera_to_world);
        for point in &frame.points {
            self.curved.ingest(&point.position, &pose, point.confidence);
        }
        self.frames += 1;
        self.segmenter.apply_curved(&mut self.curved, self.params.u_step);
        self.border.update(&self.curved);
        let contour = self.border.points();
        self.landmarks.update(&contour);
    }

    /// Current landmark readout. `NotScanning` during floor search.
    pub fn landmarks(&self) -> Result<LandmarkSnapshot, MetricsError> {
        if self.phase == Phase::FindFloor {
            return Err(MetricsError::NotScanning);
        }
        let props = self.landmarks.props();
        let (toe, heel) = (props.toe(), props.heel());
        let (outer, inner) = (props.bunch_outer(), props.bunch_inner());
        let instep = props.instep_height();
        Ok(LandmarkSnapshot {
            mode: self.landmarks.mode(),
            toe,
            heel,
            bunch_outer: outer,
            bunch_inner: inner,
            instep_height: instep,
            length_mm: toe.zip(heel).map(|(t, h)| to_mm((h - t).xy().norm())),
            bunch_width_mm: outer.zip(inner).map(|(o, i)| to_mm((o - i).xy().norm())),
            instep_height_mm: instep.map(to_mm),
        })
    }

    /// Nodes of the active grid with data, grouped by classification.
    pub fn grouped_nodes(&self) -> BTreeMap<Classification, Vec<NodeSample>> {
        match self.phase {
            Phase::FindFloor => grouped_planar(&self.planar),
            Phase::Scan | Phase::Measure => grouped_curved(&self.curved),
        }
    }

    /// Serpentine strip connectivity of the active grid.
    pub fn mesh_strip(&self) -> Vec<u32> {
        match self.phase {
            Phase::FindFloor => planar_strip(&self.planar),
            Phase::Scan | Phase::Measure => curved_strip(&self.curved),
        }
    }

    /// Smoothed border contour, one optional point per φ sector.
    pub fn border_points(&self) -> Vec<Option<Vector3<f32>>> {
        self.border.points()
    }
}
