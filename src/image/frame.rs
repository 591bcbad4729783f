//! Raw sensor frames: depth, IR and luminance samples of any numeric type.
use super::traits::ImageView;
use super::ImageF64;
use crate::error::{CalibError, Result};
use serde::{Deserialize, Serialize};

/// Owned `width × height` sample buffer as delivered by a sensor stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFrame<T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

impl<T: Copy> RawFrame<T> {
    /// Wrap `data`, failing when its length is not `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CalibError::malformed(format!(
                "frame buffer holds {} samples, expected {}x{}={}",
                data.len(),
                width,
                height,
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }
}

impl<T: Copy + Into<f64>> RawFrame<T> {
    /// Widen every sample to f64.
    pub fn to_f64(&self) -> ImageF64 {
        ImageF64::from_vec(
            self.width,
            self.height,
            self.data.iter().map(|&v| v.into()).collect(),
        )
    }
}

impl<T: Copy> ImageView for RawFrame<T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.width
    }
    #[inline]
    fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
}

/// Extract the luma plane from a packed YUY2 buffer (Y at every even byte).
pub fn luminance_from_yuy2(width: usize, height: usize, yuy2: &[u8]) -> Result<RawFrame<u8>> {
    if yuy2.len() != width * height * 2 {
        return Err(CalibError::malformed(format!(
            "YUY2 buffer holds {} bytes, expected {}",
            yuy2.len(),
            width * height * 2
        )));
    }
    let luma = yuy2.iter().step_by(2).copied().collect();
    RawFrame::new(width, height, luma)
}
