//! Rendered depth/IR/colour snapshot of fronto-parallel blocks floating in
//! front of a flat background.
//!
//! Block silhouettes are the only edges in every stream, so the depth
//! features, IR edges and colour edges of the ground-truth calibration line
//! up exactly.
use depth_rgb_calib::camera::{CalibrationModel, Extrinsics, Intrinsics};
use depth_rgb_calib::image::RawFrame;
use depth_rgb_calib::secondary::{CalibrationMetadata, SecondaryModel};
use depth_rgb_calib::session::{ColorFrame, ColorInput, DepthInput};
use nalgebra::{Matrix3, Rotation3, Vector3};

pub const DEPTH_W: usize = 320;
pub const DEPTH_H: usize = 240;
pub const COLOR_W: usize = 320;
pub const COLOR_H: usize = 240;
/// Raw depth units per millimetre.
pub const Z_SUB_MM: f64 = 4.0;
pub const BACKGROUND_MM: f64 = 1500.0;
pub const BRIGHT: u8 = 200;
pub const DARK: u8 = 50;

/// Depth pixels `[x0, x1) × [y0, y1)` covered by a plane at `z_mm`.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
    pub z_mm: f64,
}

pub const BLOCKS: [Block; 2] = [
    Block {
        x0: 60,
        x1: 140,
        y0: 50,
        y1: 130,
        z_mm: 1000.0,
    },
    Block {
        x0: 180,
        x1: 260,
        y0: 110,
        y1: 190,
        z_mm: 1200.0,
    },
];

impl Block {
    fn contains_pixel(&self, x: usize, y: usize) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }

    /// Whether the depth-camera point lies on the block face.
    fn contains_point(&self, k: &Intrinsics, p: &Vector3<f64>) -> bool {
        let x = p.x / p.z * k.fx + k.ppx;
        let y = p.y / p.z * k.fy + k.ppy;
        x >= self.x0 as f64 - 0.5
            && x < self.x1 as f64 - 0.5
            && y >= self.y0 as f64 - 0.5
            && y < self.y1 as f64 - 0.5
    }
}

pub fn depth_intrinsics() -> Intrinsics {
    Intrinsics {
        width: DEPTH_W,
        height: DEPTH_H,
        fx: 190.0,
        fy: 190.0,
        ppx: 159.5,
        ppy: 119.5,
        coeffs: [0.0; 5],
    }
}

pub fn color_intrinsics() -> Intrinsics {
    Intrinsics {
        width: COLOR_W,
        height: COLOR_H,
        fx: 240.0,
        fy: 240.0,
        ppx: 160.0,
        ppy: 120.0,
        coeffs: [0.0; 5],
    }
}

pub fn true_calibration() -> CalibrationModel {
    CalibrationModel {
        intrinsics: color_intrinsics(),
        extrinsics: Extrinsics {
            rotation: Matrix3::identity(),
            translation: Vector3::new(20.0, 0.0, 0.0),
        },
    }
}

/// `model` with its rotation turned by `angle_deg` about the optical axis.
pub fn rolled(model: &CalibrationModel, angle_deg: f64) -> CalibrationModel {
    let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), angle_deg.to_radians());
    let mut out = *model;
    out.extrinsics.rotation = roll.into_inner() * model.extrinsics.rotation;
    out
}

fn depth_mm_at(x: usize, y: usize) -> f64 {
    BLOCKS
        .iter()
        .filter(|b| b.contains_pixel(x, y))
        .map(|b| b.z_mm)
        .fold(BACKGROUND_MM, f64::min)
}

pub fn render_depth() -> RawFrame<u16> {
    let data = (0..DEPTH_W * DEPTH_H)
        .map(|i| (depth_mm_at(i % DEPTH_W, i / DEPTH_W) * Z_SUB_MM) as u16)
        .collect();
    RawFrame::new(DEPTH_W, DEPTH_H, data).unwrap()
}

pub fn render_ir() -> RawFrame<u8> {
    let data = (0..DEPTH_W * DEPTH_H)
        .map(|i| {
            if depth_mm_at(i % DEPTH_W, i / DEPTH_W) < BACKGROUND_MM {
                BRIGHT
            } else {
                DARK
            }
        })
        .collect();
    RawFrame::new(DEPTH_W, DEPTH_H, data).unwrap()
}

/// Intensity seen along the colour ray through pixel `(u, v)`.
fn trace(model: &CalibrationModel, depth_k: &Intrinsics, u: f64, v: f64) -> f64 {
    let k = &model.intrinsics;
    let dir = Vector3::new((u - k.ppx) / k.fx, (v - k.ppy) / k.fy, 1.0);
    let rt = model.extrinsics.rotation.transpose();
    let a = rt * dir;
    let b = rt * model.extrinsics.translation;
    let mut hit: Option<f64> = None;
    for block in &BLOCKS {
        // Depth-frame point on the ray: s·a − b, with z = block depth.
        let s = (block.z_mm + b.z) / a.z;
        let p = a * s - b;
        if block.contains_point(depth_k, &p) && hit.map_or(true, |z| block.z_mm < z) {
            hit = Some(block.z_mm);
        }
    }
    if hit.is_some() {
        BRIGHT as f64
    } else {
        DARK as f64
    }
}

/// Colour luma rendered under `model` with 2×2 supersampling.
pub fn render_color(model: &CalibrationModel) -> RawFrame<u8> {
    let depth_k = depth_intrinsics();
    let offsets = [-0.25, 0.25];
    let mut data = Vec::with_capacity(COLOR_W * COLOR_H);
    for v in 0..COLOR_H {
        for u in 0..COLOR_W {
            let mut acc = 0.0;
            for dy in offsets {
                for dx in offsets {
                    acc += trace(model, &depth_k, u as f64 + dx, v as f64 + dy);
                }
            }
            data.push((acc / 4.0).round() as u8);
        }
    }
    RawFrame::new(COLOR_W, COLOR_H, data).unwrap()
}

/// Pack a luma frame as YUY2 with neutral chroma.
pub fn to_yuy2(luma: &RawFrame<u8>) -> ColorFrame {
    let bytes = luma.data.iter().flat_map(|&y| [y, 128]).collect();
    ColorFrame::Yuy2 {
        width: luma.width,
        height: luma.height,
        bytes,
    }
}

/// One snapshot as handed to a calibration session.
pub struct Scene {
    pub depth: DepthInput,
    pub ir: RawFrame<u8>,
    pub color: ColorInput,
    pub truth: CalibrationModel,
}

/// Snapshot rendered with the ground-truth calibration.
pub fn render_scene() -> Scene {
    let truth = true_calibration();
    let luma = render_color(&truth);
    Scene {
        depth: DepthInput {
            frame: render_depth(),
            intrinsics: depth_intrinsics(),
            depth_units: (1.0 / Z_SUB_MM) as f32,
            secondary: SecondaryModel::default(),
            metadata: CalibrationMetadata::default(),
        },
        ir: render_ir(),
        color: ColorInput {
            current: ColorFrame::Luma(luma.clone()),
            previous: ColorFrame::Luma(luma),
        },
        truth,
    }
}
