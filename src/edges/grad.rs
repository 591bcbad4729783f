//! Sobel image derivatives with edge magnitude.
//!
//! - Direct 3×3 correlation, normalized by 1/8, written to the kernel centre.
//! - No border handling: the outermost rows/columns stay zero.
//! - `with_margin` additionally zeroes the second and second-to-last
//!   row/column so downstream stages never see values derived from the
//!   unconvolved frame border.
//!
//! Complexity: O(W·H); memory: three f64 buffers.
use crate::image::{ImageF64, ImageView, ImageViewMut};

type Kernel3 = [[f64; 3]; 3];

/// Derivative along x (columns).
const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
/// Derivative along y (rows).
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];
const SOBEL_NORM: f64 = 1.0 / 8.0;

/// Per‑pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative
    pub gx: ImageF64,
    /// Vertical derivative
    pub gy: ImageF64,
    /// Euclidean magnitude per pixel: `sqrt(gx^2 + gy^2)`
    pub mag: ImageF64,
}

impl Grad {
    /// Zero the 2-pixel margin of both derivatives and recompute the magnitude.
    pub fn with_margin(mut self) -> Self {
        set_margin(&mut self.gx);
        set_margin(&mut self.gy);
        self.mag = magnitude(&self.gx, &self.gy);
        self
    }
}

fn correlate<I>(img: &I, kernel: &Kernel3) -> ImageF64
where
    I: ImageView,
    I::Pixel: Into<f64>,
{
    let w = img.width();
    let h = img.height();
    let mut out = ImageF64::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        let rows = [img.row(y - 1), img.row(y), img.row(y + 1)];
        let out_row = out.row_mut(y);
        for x in 1..w - 1 {
            let mut sum = 0.0f64;
            for (k_row, src) in kernel.iter().zip(rows.iter()) {
                let (l, c, r): (f64, f64, f64) =
                    (src[x - 1].into(), src[x].into(), src[x + 1].into());
                sum += l * k_row[0] + c * k_row[1] + r * k_row[2];
            }
            out_row[x] = sum * SOBEL_NORM;
        }
    }
    out
}

/// Euclidean norm of two equally sized derivative images.
pub fn magnitude(gx: &ImageF64, gy: &ImageF64) -> ImageF64 {
    let data = gx
        .data
        .iter()
        .zip(gy.data.iter())
        .map(|(&x, &y)| (x * x + y * y).sqrt())
        .collect();
    ImageF64::from_vec(gx.w, gx.h, data)
}

/// Zero the second and second-to-last row and column.
///
/// Frames narrower or shorter than 4 pixels have no interior margin to
/// protect and are left untouched.
pub fn set_margin(img: &mut ImageF64) {
    let (w, h) = (img.w, img.h);
    if w < 4 || h < 4 {
        return;
    }
    for y in [1, h - 2] {
        img.row_mut(y).fill(0.0);
    }
    for y in 0..h {
        let row = img.row_mut(y);
        row[1] = 0.0;
        row[w - 2] = 0.0;
    }
}

/// Compute Sobel gradients on any numeric single‑channel frame.
pub fn sobel_gradients<I>(img: &I) -> Grad
where
    I: ImageView,
    I::Pixel: Into<f64>,
{
    let gx = correlate(img, &SOBEL_KERNEL_X);
    let gy = correlate(img, &SOBEL_KERNEL_Y);
    let mag = magnitude(&gx, &gy);
    Grad { gx, gy, mag }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::RawFrame;

    #[test]
    fn flat_image_has_no_gradient() {
        let frame = RawFrame::new(8, 6, vec![77u8; 48]).unwrap();
        let grad = sobel_gradients(&frame).with_margin();
        assert!(grad.gx.data.iter().all(|&v| v == 0.0));
        assert!(grad.gy.data.iter().all(|&v| v == 0.0));
        assert!(grad.mag.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn vertical_step_responds_in_x() {
        let (w, h) = (8usize, 6usize);
        let data: Vec<u16> = (0..w * h)
            .map(|i| if i % w >= 4 { 80 } else { 0 })
            .collect();
        let frame = RawFrame::new(w, h, data).unwrap();
        let grad = sobel_gradients(&frame);
        // Both columns adjacent to the step see (1+2+1)*80/8.
        assert!((grad.gx.get(3, 2) - 40.0).abs() < 1e-12);
        assert!((grad.gx.get(4, 2) - 40.0).abs() < 1e-12);
        assert_eq!(grad.gy.get(3, 2), 0.0);
        // Frame border is never written.
        assert_eq!(grad.gx.get(3, 0), 0.0);
        assert_eq!(grad.gx.get(0, 2), 0.0);
    }

    #[test]
    fn margin_zeroes_second_ring() {
        let mut img = ImageF64::from_vec(6, 5, vec![1.0; 30]);
        set_margin(&mut img);
        for x in 0..6 {
            assert_eq!(img.get(x, 1), 0.0);
            assert_eq!(img.get(x, 3), 0.0);
        }
        for y in 0..5 {
            assert_eq!(img.get(1, y), 0.0);
            assert_eq!(img.get(4, y), 0.0);
        }
        assert_eq!(img.get(2, 2), 1.0);
        assert_eq!(img.get(0, 0), 1.0);
    }
}
