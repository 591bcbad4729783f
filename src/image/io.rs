//! File helpers shared by the diagnostic dump and the binary.
//!
//! - `save_normalized_png`: write an `ImageF64` as 8-bit grayscale, scaled by its maximum.
//! - `save_mask_png`: write a boolean mask as a black/white PNG.
//! - `write_json_file`: pretty JSON of serde types.
//! - `write_bytes` / `read_bytes`: flat binary files.
//! - `LeWriter` / `LeReader`: little-endian packing of fixed-layout numeric records.
use super::{ImageF64, ImageView};
use crate::error::{CalibError, Result};
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Save a float image to a grayscale PNG, mapping `[0, max]` onto `[0, 255]`.
pub fn save_normalized_png(img: &ImageF64, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let max = img.max_value();
    let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
    let mut out = GrayImage::new(img.w as u32, img.h as u32);
    for (y, row) in img.rows().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            let v = (px * scale).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| CalibError::io(path, std::io::Error::other(e)))
}

/// Save a row-major boolean mask as a PNG (set pixels are white).
pub fn save_mask_png(mask: &[bool], width: usize, height: usize, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(width as u32, height as u32);
    for (i, &on) in mask.iter().enumerate().take(width * height) {
        let v = if on { 255u8 } else { 0u8 };
        out.put_pixel((i % width) as u32, (i / width) as u32, Luma([v]));
    }
    out.save(path)
        .map_err(|e| CalibError::io(path, std::io::Error::other(e)))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CalibError::io(path, std::io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| CalibError::io(path, e))
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, bytes).map_err(|e| CalibError::io(path, e))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CalibError::io(path, e))
}

/// Appends little-endian scalars to a byte buffer.
#[derive(Default)]
pub struct LeWriter {
    buf: Vec<u8>,
}

impl LeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64s(&mut self, vs: &[f64]) -> &mut Self {
        for &v in vs {
            self.f64(v);
        }
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16s(&mut self, vs: &[u16]) -> &mut Self {
        for &v in vs {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads little-endian scalars from a byte slice, failing on truncation.
pub struct LeReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    source: &'a Path,
}

impl<'a> LeReader<'a> {
    pub fn new(bytes: &'a [u8], source: &'a Path) -> Self {
        Self {
            bytes,
            pos: 0,
            source,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            CalibError::malformed(format!(
                "{} is truncated at byte {}",
                self.source.display(),
                self.pos
            ))
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    pub fn f64_array<const N: usize>(&mut self) -> Result<[f64; N]> {
        let mut out = [0.0; N];
        for v in out.iter_mut() {
            *v = self.f64()?;
        }
        Ok(out)
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take::<4>()?))
    }

    pub fn u16s(&mut self, count: usize) -> Result<Vec<u16>> {
        (0..count)
            .map(|_| self.take::<2>().map(u16::from_le_bytes))
            .collect()
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CalibError::io(parent, e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_round_trip_reports_truncation() {
        let mut w = LeWriter::new();
        w.f64(1.5).f32(2.5).u16s(&[7, 9]);
        let bytes = w.into_bytes();
        let path = Path::new("mem");
        let mut r = LeReader::new(&bytes, path);
        assert_eq!(r.f64().unwrap(), 1.5);
        assert_eq!(r.f32().unwrap(), 2.5);
        assert_eq!(r.u16s(2).unwrap(), vec![7, 9]);
        assert!(r.f64().is_err());
    }
}
