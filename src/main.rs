use depth_rgb_calib::config::load_config;
use depth_rgb_calib::diagnostics::{CalibrationOutcome, DiagnosticEvent};
use depth_rgb_calib::dump::load_dump;
use depth_rgb_calib::image::io::write_json_file;
use depth_rgb_calib::CalibrationSession;
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage() -> String {
    "Usage: depth_rgb_calib <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    outcome: &'a CalibrationOutcome,
    edge_count: usize,
    events: &'a [DiagnosticEvent],
}

fn run() -> Result<(), String> {
    env_logger::init();
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let snapshot = load_dump(&config.input_dir).map_err(|e| e.to_string())?;
    let session = CalibrationSession::new(
        config.params.clone(),
        snapshot.depth,
        snapshot.ir,
        snapshot.color,
        snapshot.calibration,
    )
    .map_err(|e| e.to_string())?;

    let mut events = Vec::new();
    let outcome = session
        .optimize(|event| events.push(event.clone()))
        .map_err(|e| e.to_string())?;

    print_text_summary(&session, &outcome);

    if let Some(path) = &config.output.json_out {
        let report = RunReport {
            outcome: &outcome,
            edge_count: session.features().len(),
            events: &events,
        };
        write_json_file(path, &report).map_err(|e| e.to_string())?;
        println!("\nJSON report written to {}", path.display());
    }

    if let Some(dir) = &config.output.debug_dir {
        session.save_debug_images(dir);
        session.write_data_to(&dir.join("dump"));
        println!("Debug artifacts written to {}", dir.display());
    }

    Ok(())
}

fn print_text_summary(session: &CalibrationSession, outcome: &CalibrationOutcome) {
    let k = &outcome.calibration.intrinsics;
    let r = &outcome.calibration.extrinsics.rotation;
    let t = &outcome.calibration.extrinsics.translation;
    let device = session.calibration();
    println!("Calibration summary");
    println!("  edges: {}", session.features().len());
    println!(
        "  cost: {:.4} -> {:.4} (iterations={} cycles={})",
        outcome.initial_cost, outcome.cost, outcome.iterations, outcome.cycles
    );
    println!(
        "  principal point: ({:.3}, {:.3}) -> ({:.3}, {:.3})",
        device.intrinsics.ppx, device.intrinsics.ppy, k.ppx, k.ppy
    );
    println!(
        "  rotation change: {:.4} deg",
        device.extrinsics.rotation_error_deg(&outcome.calibration.extrinsics)
    );
    println!(
        "  rotation:\n    [{:.6} {:.6} {:.6}]\n    [{:.6} {:.6} {:.6}]\n    [{:.6} {:.6} {:.6}]",
        r[(0, 0)],
        r[(0, 1)],
        r[(0, 2)],
        r[(1, 0)],
        r[(1, 1)],
        r[(1, 2)],
        r[(2, 0)],
        r[(2, 1)],
        r[(2, 2)]
    );
    println!("  translation: [{:.3}, {:.3}, {:.3}]", t.x, t.y, t.z);
    let s = &outcome.secondary;
    println!(
        "  secondary: h_scale={:.5} v_scale={:.5} h_offset={:.3} v_offset={:.3} rtd_offset={:.3}",
        s.h_scale, s.v_scale, s.h_offset, s.v_offset, s.rtd_offset
    );
    println!(
        "  depth focal: fx={:.3} fy={:.3}",
        outcome.depth_intrinsics.fx, outcome.depth_intrinsics.fy
    );
    println!("  section weights: {:?}", outcome.section_weights);

    println!("\nTimings (ms): total={:.3}", outcome.timing.total_ms);
    for stage in &outcome.timing.stages {
        println!("  {}: {:.3}", stage.label, stage.elapsed_ms);
    }
}
