//! Simulated scan: a flat floor, then an elliptical foot, printed as
//! millimetre readouts.
//!
//! Run with `cargo run --example simulated_scan`.

use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use footmetry::core::{init_with_level, CameraPose, Confidence};
use footmetry::{Frame, FramePoint, ScanParams, ScanSession};

const FLOOR: f32 = 0.801;

fn floor_frame(rng: &mut StdRng) -> Frame {
    let mut points = Vec::new();
    for i in 0..50 {
        for j in 0..50 {
            let noise: f32 = rng.gen_range(-1e-3..1e-3);
            points.push(FramePoint {
                position: Point3::new(
                    -0.5 + (i as f32 + 0.5) * 0.02,
                    -0.5 + (j as f32 + 0.5) * 0.02,
                    FLOOR + noise,
                ),
                confidence: Confidence::High,
            });
        }
    }
    Frame {
        points,
        pose: CameraPose::identity(),
    }
}

fn foot_frame(params: &ScanParams, rng: &mut StdRng) -> Frame {
    let (half_length, half_width) = (0.13, 0.05);
    let mut points = Vec::new();
    for phi in 0..params.phi_count {
        let a = (phi as f32 + 0.5) * std::f32::consts::TAU / params.phi_count as f32;
        let r = half_length * half_width
            / ((half_width * a.cos()).powi(2) + (half_length * a.sin()).powi(2)).sqrt();
        for u in 0..20 {
            let noise: f32 = rng.gen_range(-5e-4..5e-4);
            let z = FLOOR + (u as f32 + 0.5) * params.u_step;
            points.push(FramePoint {
                position: Point3::new((r + noise) * a.cos(), (r + noise) * a.sin(), z),
                confidence: Confidence::High,
            });
        }
    }
    Frame {
        points,
        pose: CameraPose::identity(),
    }
}

fn main() {
    let _ = init_with_level(log::LevelFilter::Info);
    let mut rng = StdRng::seed_from_u64(42);

    let params = ScanParams {
        planar_rows: 50,
        planar_cols: 50,
        u_count: 40,
        phi_count: 96,
        u_step: 5e-3,
        warmup_frames: 2,
        estimate_interval: 1,
        convergence_rounds: 3,
        smoothing_window: 4,
        ..ScanParams::default()
    };
    let mut session = ScanSession::new(params.clone());

    let mut frames = 0;
    while session.floor_height().is_none() {
        let frame = floor_frame(&mut rng);
        session.process_frame(&frame);
        frames += 1;
        if frames > 50 {
            eprintln!("floor never converged");
            return;
        }
    }
    println!(
        "floor accepted at {:.3} m after {frames} frames",
        session.floor_height().unwrap_or_default()
    );

    if session.begin_measure().is_err() {
        return;
    }
    for step in 0..5 {
        for _ in 0..4 {
            let frame = foot_frame(&params, &mut rng);
            session.process_frame(&frame);
        }
        if step < 4 && session.advance_landmark_mode().is_err() {
            return;
        }
    }

    match session.landmarks() {
        Ok(snapshot) => {
            println!("length:       {:?} mm", snapshot.length_mm);
            println!("bunch width:  {:?} mm", snapshot.bunch_width_mm);
            println!("instep:       {:?} mm", snapshot.instep_height_mm);
            for (class, nodes) in session.grouped_nodes() {
                println!("{class:?}: {} nodes", nodes.len());
            }
        }
        Err(err) => eprintln!("no landmarks: {err}"),
    }
}
