//! Diagnostic dump of a calibration session.
//!
//! Flat little-endian files in one directory:
//!
//! | file               | contents                                              |
//! |--------------------|-------------------------------------------------------|
//! | `rgb.raw`          | current colour frame as received (YUY2 or luma bytes) |
//! | `rgb_prev.raw`     | previous colour frame                                 |
//! | `ir.raw`           | IR samples, `u8`                                      |
//! | `depth.raw`        | depth samples, `u16`                                  |
//! | `dsm.params`       | secondary model, 5 × `f64`                            |
//! | `rgb.calib`        | `w, h, fx, fy, ppx, ppy, coeffs[5], R[9], t[3]` (`f64`) |
//! | `cal.info`         | opaque calibration info blob                          |
//! | `cal.registers`    | opaque calibration register blob                      |
//! | `depth.intrinsics` | `w, h, fx, fy, ppx, ppy, coeffs[5]` (`f64`)           |
//! | `depth.units`      | `f32`                                                 |
//! | `camera_params`    | depth `w, h, units`, `K_depth[9]`, colour `w, h`, `K_rgb[9]`, `coeffs[5]`, `R[9]`, `t[3]` (`f64`) |
//!
//! Matrices are row-major. Write failures are logged and never reach the
//! calibration result.
use crate::camera::{CalibrationModel, Extrinsics, Intrinsics};
use crate::error::{CalibError, Result};
use crate::image::io::{
    read_bytes, save_mask_png, save_normalized_png, write_bytes, LeReader, LeWriter,
};
use crate::image::RawFrame;
use crate::secondary::{CalibrationMetadata, SecondaryModel};
use crate::session::{CalibrationSession, ColorFrame, ColorInput, DepthInput};
use nalgebra::{Matrix3, Vector3};
use std::path::Path;

/// Snapshot read back from a dump directory.
#[derive(Clone, Debug)]
pub struct DumpedSnapshot {
    pub depth: DepthInput,
    pub ir: RawFrame<u8>,
    pub color: ColorInput,
    pub calibration: CalibrationModel,
}

fn write_intrinsics(w: &mut LeWriter, k: &Intrinsics) {
    w.f64(k.width as f64)
        .f64(k.height as f64)
        .f64s(&[k.fx, k.fy, k.ppx, k.ppy])
        .f64s(&k.coeffs);
}

fn write_mat3(w: &mut LeWriter, r: &Matrix3<f64>) {
    for row in 0..3 {
        for col in 0..3 {
            w.f64(r[(row, col)]);
        }
    }
}

fn calibration_bytes(model: &CalibrationModel) -> Vec<u8> {
    let mut w = LeWriter::new();
    write_intrinsics(&mut w, &model.intrinsics);
    write_mat3(&mut w, &model.extrinsics.rotation);
    w.f64s(model.extrinsics.translation.as_slice());
    w.into_bytes()
}

/// Interoperability record for external analysis tools.
fn camera_params_bytes(depth_k: &Intrinsics, depth_units: f32, model: &CalibrationModel) -> Vec<u8> {
    let mut w = LeWriter::new();
    w.f64(depth_k.width as f64)
        .f64(depth_k.height as f64)
        .f64(depth_units as f64);
    write_mat3(&mut w, &depth_k.k_matrix());
    let ck = &model.intrinsics;
    w.f64(ck.width as f64).f64(ck.height as f64);
    write_mat3(&mut w, &ck.k_matrix());
    w.f64s(&ck.coeffs);
    write_mat3(&mut w, &model.extrinsics.rotation);
    w.f64s(model.extrinsics.translation.as_slice());
    w.into_bytes()
}

fn write_all(session: &CalibrationSession, dir: &Path) -> Result<()> {
    let color = session.color_input();
    let depth = session.depth_data();
    write_bytes(&dir.join("rgb.raw"), color.current.raw_bytes())?;
    write_bytes(&dir.join("rgb_prev.raw"), color.previous.raw_bytes())?;
    write_bytes(&dir.join("ir.raw"), &session.ir_data().frame.data)?;

    let mut w = LeWriter::new();
    w.u16s(&depth.frame.data);
    write_bytes(&dir.join("depth.raw"), &w.into_bytes())?;

    let mut w = LeWriter::new();
    w.f64s(&session.secondary().to_array());
    write_bytes(&dir.join("dsm.params"), &w.into_bytes())?;

    write_bytes(&dir.join("rgb.calib"), &calibration_bytes(session.calibration()))?;
    write_bytes(&dir.join("cal.info"), &session.metadata().info)?;
    write_bytes(&dir.join("cal.registers"), &session.metadata().registers)?;

    let mut w = LeWriter::new();
    write_intrinsics(&mut w, &depth.intrinsics);
    write_bytes(&dir.join("depth.intrinsics"), &w.into_bytes())?;

    let mut w = LeWriter::new();
    w.f32(depth.depth_units);
    write_bytes(&dir.join("depth.units"), &w.into_bytes())?;

    write_bytes(
        &dir.join("camera_params"),
        &camera_params_bytes(&depth.intrinsics, depth.depth_units, session.calibration()),
    )
}

/// Write the session inputs into `dir`, logging any failure.
pub fn write_data_to(session: &CalibrationSession, dir: &Path) {
    log::debug!("writing calibration data to {}", dir.display());
    if let Err(err) = write_all(session, dir) {
        log::error!("failed to write calibration data to {}: {err}", dir.display());
    }
}

fn read_intrinsics(r: &mut LeReader<'_>) -> Result<Intrinsics> {
    let [w, h, fx, fy, ppx, ppy] = r.f64_array::<6>()?;
    Ok(Intrinsics {
        width: w as usize,
        height: h as usize,
        fx,
        fy,
        ppx,
        ppy,
        coeffs: r.f64_array::<5>()?,
    })
}

fn read_calibration(r: &mut LeReader<'_>) -> Result<CalibrationModel> {
    let intrinsics = read_intrinsics(r)?;
    let rot = r.f64_array::<9>()?;
    let t = r.f64_array::<3>()?;
    Ok(CalibrationModel {
        intrinsics,
        extrinsics: Extrinsics {
            rotation: Matrix3::from_row_slice(&rot),
            translation: Vector3::from_column_slice(&t),
        },
    })
}

fn color_frame(bytes: Vec<u8>, width: usize, height: usize, path: &Path) -> Result<ColorFrame> {
    if bytes.len() == 2 * width * height {
        Ok(ColorFrame::Yuy2 {
            width,
            height,
            bytes,
        })
    } else if bytes.len() == width * height {
        Ok(ColorFrame::Luma(RawFrame::new(width, height, bytes)?))
    } else {
        Err(CalibError::malformed(format!(
            "{} holds {} bytes, neither YUY2 nor luma for {width}x{height}",
            path.display(),
            bytes.len()
        )))
    }
}

/// Read a dump written by [`write_data_to`].
pub fn load_dump(dir: &Path) -> Result<DumpedSnapshot> {
    let path = dir.join("depth.intrinsics");
    let bytes = read_bytes(&path)?;
    let depth_k = read_intrinsics(&mut LeReader::new(&bytes, &path))?;
    let (dw, dh) = (depth_k.width, depth_k.height);

    let path = dir.join("depth.units");
    let bytes = read_bytes(&path)?;
    let depth_units = LeReader::new(&bytes, &path).f32()?;

    let path = dir.join("depth.raw");
    let bytes = read_bytes(&path)?;
    let depth_samples = LeReader::new(&bytes, &path).u16s(dw * dh)?;

    let path = dir.join("dsm.params");
    let bytes = read_bytes(&path)?;
    let secondary = SecondaryModel::from_array(LeReader::new(&bytes, &path).f64_array::<5>()?);

    let path = dir.join("rgb.calib");
    let bytes = read_bytes(&path)?;
    let calibration = read_calibration(&mut LeReader::new(&bytes, &path))?;
    let (cw, ch) = (calibration.intrinsics.width, calibration.intrinsics.height);

    let metadata = CalibrationMetadata {
        info: read_bytes(&dir.join("cal.info"))?,
        registers: read_bytes(&dir.join("cal.registers"))?,
    };

    let ir = RawFrame::new(dw, dh, read_bytes(&dir.join("ir.raw"))?)?;
    let path = dir.join("rgb.raw");
    let current = color_frame(read_bytes(&path)?, cw, ch, &path)?;
    let path = dir.join("rgb_prev.raw");
    let previous = color_frame(read_bytes(&path)?, cw, ch, &path)?;

    Ok(DumpedSnapshot {
        depth: DepthInput {
            frame: RawFrame::new(dw, dh, depth_samples)?,
            intrinsics: depth_k,
            depth_units,
            secondary,
            metadata,
        },
        ir,
        color: ColorInput { current, previous },
        calibration,
    })
}

fn save_images(session: &CalibrationSession, dir: &Path) -> Result<()> {
    let depth = session.depth_data();
    let color = session.color_data();
    save_normalized_png(&session.ir_data().grad.mag, &dir.join("ir_edges.png"))?;
    save_mask_png(
        &session.ir_data().valid,
        depth.frame.width,
        depth.frame.height,
        &dir.join("ir_valid.png"),
    )?;
    save_normalized_png(&depth.grad.mag, &dir.join("depth_edges.png"))?;
    save_normalized_png(&color.edges, &dir.join("rgb_edges.png"))?;
    save_normalized_png(&color.prev_edges, &dir.join("rgb_prev_edges.png"))?;
    save_normalized_png(&color.idt.field, &dir.join("rgb_idt.png"))?;
    save_mask_png(
        &depth.relevant,
        depth.frame.width,
        depth.frame.height,
        &dir.join("relevant_pixels.png"),
    )
}

/// Save the debug PNGs of a session into `dir`, logging any failure.
pub fn save_debug_images(session: &CalibrationSession, dir: &Path) {
    if let Err(err) = save_images(session, dir) {
        log::error!("failed to save debug images to {}: {err}", dir.display());
    }
}
