//! Directional max-propagation of edge magnitude ("inverse distance
//! transform") used as the optimization target field.
//!
//! A forward raster pass lets every pixel inherit `γ·max(left, up)` and a
//! backward pass `γ·max(right, down)`, so strong edges bleed a geometrically
//! decaying response into their neighbourhood. The result is blended with
//! the original magnitude as `α·original + (1-α)·diffused`.
use super::grad::{sobel_gradients, Grad};
use crate::image::ImageF64;

/// Diffuse `edges` with decay `gamma` and blend factor `alpha`.
pub fn diffuse_edges(edges: &ImageF64, gamma: f64, alpha: f64) -> ImageF64 {
    let (w, h) = (edges.w, edges.h);
    let mut res = edges.clone();
    if w == 0 || h == 0 {
        return res;
    }

    for y in 0..h {
        for x in 0..w {
            let mut best = res.get(x, y);
            if x > 0 {
                best = best.max(res.get(x - 1, y) * gamma);
            }
            if y > 0 {
                best = best.max(res.get(x, y - 1) * gamma);
            }
            res.set(x, y, best);
        }
    }

    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let mut best = res.get(x, y);
            if x + 1 < w {
                best = best.max(res.get(x + 1, y) * gamma);
            }
            if y + 1 < h {
                best = best.max(res.get(x, y + 1) * gamma);
            }
            res.set(x, y, best);
        }
    }

    for (out, &orig) in res.data.iter_mut().zip(edges.data.iter()) {
        *out = alpha * orig + (1.0 - alpha) * *out;
    }
    res
}

/// Diffused field together with its own Sobel derivatives.
#[derive(Clone, Debug)]
pub struct DiffusedField {
    pub field: ImageF64,
    pub grad: Grad,
}

impl DiffusedField {
    pub fn build(edges: &ImageF64, gamma: f64, alpha: f64) -> Self {
        let field = diffuse_edges(edges, gamma, alpha);
        let grad = sobel_gradients(&field);
        Self { field, grad }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(w: usize, h: usize, x: usize, y: usize, v: f64) -> ImageF64 {
        let mut img = ImageF64::new(w, h);
        img.set(x, y, v);
        img
    }

    #[test]
    fn zero_decay_is_identity() {
        let mut img = impulse(7, 5, 3, 2, 10.0);
        img.set(0, 4, 3.0);
        let out = diffuse_edges(&img, 0.0, 0.4);
        for (a, b) in out.data.iter().zip(img.data.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn impulse_spreads_geometrically() {
        let img = impulse(9, 9, 4, 4, 100.0);
        let out = diffuse_edges(&img, 0.5, 0.0);
        assert!((out.get(4, 4) - 100.0).abs() < 1e-12);
        assert!((out.get(5, 4) - 50.0).abs() < 1e-12);
        assert!((out.get(3, 4) - 50.0).abs() < 1e-12);
        assert!((out.get(4, 2) - 25.0).abs() < 1e-12);
        // Diagonal neighbours are reached in two 4-connected hops.
        assert!((out.get(5, 5) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn blend_keeps_original_share() {
        let img = impulse(5, 5, 2, 2, 90.0);
        let out = diffuse_edges(&img, 0.5, 1.0 / 3.0);
        assert!((out.get(2, 2) - 90.0).abs() < 1e-9);
        assert!((out.get(3, 2) - 30.0).abs() < 1e-9);
    }
}
