//! Per-stream frame data owned by a calibration session.
use crate::camera::Intrinsics;
use crate::edges::{sobel_gradients, DiffusedField, Grad};
use crate::error::{CalibError, Result};
use crate::features::{threshold_mask, EdgeFeatures};
use crate::image::{luminance_from_yuy2, ImageF64, RawFrame};
use crate::secondary::{CalibrationMetadata, SecondaryModel};
use crate::session::params::DiffusionParams;

/// Colour frame as delivered by the sensor.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFrame {
    /// Packed YUY2, `2 · width · height` bytes.
    Yuy2 {
        width: usize,
        height: usize,
        bytes: Vec<u8>,
    },
    /// Luminance plane.
    Luma(RawFrame<u8>),
}

impl ColorFrame {
    pub fn width(&self) -> usize {
        match self {
            ColorFrame::Yuy2 { width, .. } => *width,
            ColorFrame::Luma(f) => f.width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            ColorFrame::Yuy2 { height, .. } => *height,
            ColorFrame::Luma(f) => f.height,
        }
    }

    pub fn luminance(&self) -> Result<RawFrame<u8>> {
        match self {
            ColorFrame::Yuy2 {
                width,
                height,
                bytes,
            } => luminance_from_yuy2(*width, *height, bytes),
            ColorFrame::Luma(f) => RawFrame::new(f.width, f.height, f.data.clone()),
        }
    }

    /// Bytes as stored in a dump.
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            ColorFrame::Yuy2 { bytes, .. } => bytes,
            ColorFrame::Luma(f) => &f.data,
        }
    }
}

/// Depth stream inputs.
#[derive(Clone, Debug)]
pub struct DepthInput {
    /// Raw depth samples (`z_max_sub_mm` units per millimetre).
    pub frame: RawFrame<u16>,
    pub intrinsics: Intrinsics,
    /// Millimetres per raw depth unit as reported by the device (dump only;
    /// vertices use `z_max_sub_mm`).
    pub depth_units: f32,
    /// Device-asserted secondary model.
    pub secondary: SecondaryModel,
    pub metadata: CalibrationMetadata,
}

/// Two consecutive colour frames.
#[derive(Clone, Debug)]
pub struct ColorInput {
    pub current: ColorFrame,
    pub previous: ColorFrame,
}

/// IR frame with its gradients and threshold mask. Only needed while the
/// depth features are extracted.
#[derive(Clone, Debug)]
pub struct IrFrameData {
    pub frame: RawFrame<u8>,
    /// Sobel gradients with the 2-pixel margin cleared; `mag` is the edge map.
    pub grad: Grad,
    /// Pixels whose edge magnitude exceeds the IR threshold; the candidate
    /// source of the feature pipeline.
    pub valid: Vec<bool>,
}

impl IrFrameData {
    pub fn build(frame: RawFrame<u8>, threshold: f64) -> Self {
        let grad = sobel_gradients(&frame).with_margin();
        let valid = threshold_mask(&grad.mag, threshold);
        Self { frame, grad, valid }
    }
}

/// Depth frame, its derivatives and the final edge features.
#[derive(Clone, Debug)]
pub struct DepthFrameData {
    pub frame: RawFrame<u16>,
    pub depth: ImageF64,
    pub intrinsics: Intrinsics,
    pub depth_units: f32,
    /// Sobel gradients with the 2-pixel margin cleared.
    pub grad: Grad,
    /// Section id per pixel.
    pub sections: Vec<usize>,
    pub features: EdgeFeatures,
    /// Pixels carrying a retained edge.
    pub relevant: Vec<bool>,
}

/// Colour frames with their edge maps and the diffused target field.
#[derive(Clone, Debug)]
pub struct ColorFrameData {
    pub luma: RawFrame<u8>,
    pub prev_luma: RawFrame<u8>,
    pub edges: ImageF64,
    pub prev_edges: ImageF64,
    /// Diffused edge field of the current frame and its derivatives.
    pub idt: DiffusedField,
}

impl ColorFrameData {
    pub fn build(input: &ColorInput, diffusion: &DiffusionParams) -> Result<Self> {
        let luma = input.current.luminance()?;
        let prev_luma = input.previous.luminance()?;
        if (luma.width, luma.height) != (prev_luma.width, prev_luma.height) {
            return Err(CalibError::malformed(format!(
                "colour frames differ in size: {}x{} vs {}x{}",
                luma.width, luma.height, prev_luma.width, prev_luma.height
            )));
        }
        let edges = sobel_gradients(&luma).mag;
        let prev_edges = sobel_gradients(&prev_luma).mag;
        let idt = DiffusedField::build(&edges, diffusion.gamma, diffusion.alpha);
        Ok(Self {
            luma,
            prev_luma,
            edges,
            prev_edges,
            idt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuy2_and_luma_frames_agree() {
        let luma = RawFrame::new(2, 1, vec![10u8, 20]).unwrap();
        let yuy2 = ColorFrame::Yuy2 {
            width: 2,
            height: 1,
            bytes: vec![10, 128, 20, 128],
        };
        assert_eq!(yuy2.luminance().unwrap(), luma);
        assert_eq!(ColorFrame::Luma(luma.clone()).luminance().unwrap(), luma);
        assert_eq!(yuy2.raw_bytes().len(), 4);
    }

    #[test]
    fn ir_mask_follows_threshold() {
        let (w, h) = (8usize, 8usize);
        let data: Vec<u8> = (0..w * h).map(|i| if i % w >= 4 { 200 } else { 20 }).collect();
        let ir = IrFrameData::build(RawFrame::new(w, h, data).unwrap(), 3.5);
        assert!(ir.valid[3 * w + 3]);
        assert!(ir.valid[3 * w + 4]);
        assert!(!ir.valid[3 * w + 1]);
        assert!(!ir.valid[w + 3]);
    }
}
