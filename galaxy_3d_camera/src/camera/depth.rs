//! Depth buffers and linearization.
//!
//! Depth is stored reverse-Z in `[0, 1]`: 1 at the near plane, 0 at the far
//! plane, cleared to `CLEAR_DEPTH` (0). Linearization turns a stored value back
//! into metric distance along the camera's viewing axis.

use std::path::Path;
use image::{GrayImage, ImageFormat, Rgb32FImage};
use crate::error::{Error, Result};

/// Linear depth reported for pixels where nothing was rendered.
pub const BACKGROUND_DEPTH: f32 = f32::INFINITY;

/// Value a depth buffer holds before anything is drawn (the far plane).
pub const CLEAR_DEPTH: f32 = 0.0;

/// Convert a reverse-Z NDC depth to metric depth along the viewing axis.
///
/// `1` maps to `near`, `0` maps to `far`, and the mapping is monotonically
/// decreasing in between. Non-finite or out-of-range values map to
/// `BACKGROUND_DEPTH`.
pub fn depth_linearize(ndc: f32, near: f32, far: f32) -> f32 {
    if !ndc.is_finite() || !(0.0..=1.0).contains(&ndc) {
        return BACKGROUND_DEPTH;
    }
    near * far / (ndc * (far - near) + near)
}

/// Inverse of `depth_linearize` for metric depths inside `[near, far]`.
pub fn depth_to_ndc(linear: f32, near: f32, far: f32) -> f32 {
    near * (far - linear) / (linear * (far - near))
}

/// Raw reverse-Z depth samples of one rendered frame.
///
/// Samples are stored row by row, top row first, with `sample_count`
/// consecutive samples per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    sample_count: u32,
    near: f32,
    far: f32,
    samples: Vec<f32>,
}

impl DepthBuffer {
    /// Cleared buffer recording the clip planes it is rendered with.
    pub fn new(width: u32, height: u32, sample_count: u32, near: f32, far: f32) -> Self {
        let len = width as usize * height as usize * sample_count.max(1) as usize;
        Self {
            width,
            height,
            sample_count: sample_count.max(1),
            near,
            far,
            samples: vec![CLEAR_DEPTH; len],
        }
    }

    /// Wrap existing single-sample data (row-major, top row first).
    pub fn from_samples(width: u32, height: u32, near: f32, far: f32, samples: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(Error::InvalidResolution(format!(
                "{}x{} depth buffer needs {} samples, got {}",
                width, height, expected, samples.len()
            )));
        }
        Ok(Self { width, height, sample_count: 1, near, far, samples })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Clip planes in effect when the frame was rendered.
    pub fn near_far(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    fn index(&self, x: u32, y: u32, sample: u32) -> usize {
        ((y as usize * self.width as usize + x as usize) * self.sample_count as usize) + sample as usize
    }

    /// Stored NDC depth of one sample.
    pub fn get(&self, x: u32, y: u32, sample: u32) -> f32 {
        self.samples[self.index(x, y, sample)]
    }

    /// Reverse-Z depth test (GREATER): keep `ndc` if it is closer than the
    /// stored value. Returns whether the sample was written.
    pub fn test_and_set(&mut self, x: u32, y: u32, sample: u32, ndc: f32) -> bool {
        let idx = self.index(x, y, sample);
        if ndc > self.samples[idx] {
            self.samples[idx] = ndc;
            true
        } else {
            false
        }
    }

    /// Metric depth image using the given clip planes.
    ///
    /// Samples still holding the clear value become `BACKGROUND_DEPTH`.
    ///
    /// # Errors
    ///
    /// `UnsupportedSampleCount` unless the buffer has exactly one sample per
    /// pixel. Nothing is read in that case.
    pub fn depth_linearize(&self, near: f32, far: f32) -> Result<DepthImage> {
        if self.sample_count != 1 {
            return Err(Error::UnsupportedSampleCount(self.sample_count));
        }

        let data = self.samples
            .iter()
            .map(|&ndc| {
                if ndc <= CLEAR_DEPTH {
                    BACKGROUND_DEPTH
                } else {
                    depth_linearize(ndc, near, far)
                }
            })
            .collect();

        Ok(DepthImage { width: self.width, height: self.height, data })
    }
}

/// Metric depth per pixel, `BACKGROUND_DEPTH` where nothing was hit.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthImage {
    /// Wrap row-major metric depths (top row first).
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidResolution(format!(
                "{}x{} depth image needs {} values, got {}",
                width, height, expected, data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Whether anything was rendered at this pixel.
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.get(x, y).is_finite()
    }

    /// Per-pixel mask of rendered pixels.
    pub fn silhouette(&self) -> Vec<bool> {
        self.data.iter().map(|d| d.is_finite()).collect()
    }

    /// Largest finite depth, `None` if the image is all background.
    pub fn max_finite(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f32| m.max(d))))
    }

    /// 8-bit visualization: depth scaled by the largest finite depth,
    /// background written as 0.
    pub fn to_normalized_u8(&self) -> Vec<u8> {
        let max = self.max_finite().unwrap_or(1.0).max(f32::MIN_POSITIVE);
        self.data
            .iter()
            .map(|&d| {
                if d.is_finite() {
                    ((d / max) * 255.0).clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect()
    }

    /// 8-bit grayscale visualization (see `to_normalized_u8`).
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.to_normalized_u8())
            .ok_or_else(|| Error::InvalidResolution(format!("{}x{} gray image", self.width, self.height)))
    }

    /// Save the 8-bit visualization as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_gray_image()?.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }

    /// Save metric depth as 32-bit float OpenEXR, the depth repeated in
    /// every channel. Background pixels keep `BACKGROUND_DEPTH`.
    pub fn save_exr<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let rgb: Vec<f32> = self.data.iter().flat_map(|&d| [d, d, d]).collect();
        let buffer = Rgb32FImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| Error::InvalidResolution(format!("{}x{} float image", self.width, self.height)))?;
        buffer.save_with_format(path.as_ref(), ImageFormat::OpenExr)?;
        Ok(())
    }

    /// Load metric depth from a float image (OpenEXR, float TIFF). The first
    /// channel is the depth; non-finite and non-positive values become
    /// `BACKGROUND_DEPTH`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = image::open(path.as_ref())?.into_rgb32f();
        let (width, height) = buffer.dimensions();
        let data = buffer
            .pixels()
            .map(|p| {
                let d = p.0[0];
                if d.is_finite() && d > 0.0 { d } else { BACKGROUND_DEPTH }
            })
            .collect();
        Self::from_data(width, height, data)
    }
}

#[cfg(test)]
#[path = "depth_tests.rs"]
mod tests;
