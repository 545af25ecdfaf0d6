//! Reference cameras and depth comparison.
//!
//! A reference camera record is the JSON object
//!
//! ```json
//! { "extrinsics": [[...], [...], [...], [0, 0, 0, 1]],
//!   "intrinsics": [fx, fy, cx, cy], "width": 2048, "height": 2048, "id": 0 }
//! ```
//!
//! `extrinsics` is row-major world → camera (x right, y down, z forward),
//! either nested 4x4 or flat with 16 values. A file holds a JSON array of
//! records.
//!
//! Externally generated references live in a directory next to the records:
//! `<id>.exr` (or `<id>.tiff`) holds float metric depth, `<id>.png` an
//! optional 8-bit silhouette (nonzero = foreground).

use std::path::{Path, PathBuf};
use glam::{Mat4, Vec3};
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use crate::camera::{mat4_from_rows, mat4_to_rows, Camera, DepthImage, PosLookat, BACKGROUND_DEPTH};
use crate::error::{Error, Result};
use crate::geom::AABB;
use crate::camera_bail;

const SOURCE: &str = "galaxy3d::Reference";

/// Extensions tried, in order, for a reference depth map.
pub const REFERENCE_DEPTH_EXTENSIONS: [&str; 3] = ["exr", "tiff", "tif"];

/// Largest mean absolute depth error accepted against a reference render.
pub const DEPTH_TOLERANCE: f32 = 1e-2;

/// Extrinsics as stored in JSON: nested rows or 16 flat row-major values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtrinsicsData {
    Nested([[f32; 4]; 4]),
    Flat([f32; 16]),
}

impl ExtrinsicsData {
    pub fn rows(&self) -> [[f32; 4]; 4] {
        match self {
            ExtrinsicsData::Nested(rows) => *rows,
            ExtrinsicsData::Flat(values) => {
                let mut rows = [[0.0; 4]; 4];
                for (i, value) in values.iter().enumerate() {
                    rows[i / 4][i % 4] = *value;
                }
                rows
            }
        }
    }

    pub fn matrix(&self) -> Mat4 {
        mat4_from_rows(self.rows())
    }
}

/// One reference camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub extrinsics: ExtrinsicsData,
    /// `[fx, fy, cx, cy]` in pixels
    pub intrinsics: [f32; 4],
    pub width: u32,
    pub height: u32,
    pub id: u32,
}

impl CameraRecord {
    /// Configure `camera` from this record: resolution, extrinsics and
    /// intrinsics. Either all three are applied or the camera is untouched.
    pub fn apply_to(&self, camera: &mut Camera) -> Result<()> {
        let [fx, fy, cx, cy] = self.intrinsics;
        let mut candidate = camera.clone();
        candidate.set_width_height(self.width, self.height)?;
        candidate.set_extrinsics(&self.extrinsics.matrix())?;
        candidate.set_intrinsics(fx, fy, cx, cy)?;
        *camera = candidate;
        Ok(())
    }

    /// Record for a camera at `position` looking at `lookat` with world up Y.
    pub fn looking_at(
        id: u32,
        position: Vec3,
        lookat: Vec3,
        intrinsics: [f32; 4],
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let pose = PosLookat::new(position, lookat)?;
        Ok(Self {
            extrinsics: ExtrinsicsData::Nested(mat4_to_rows(&pose.extrinsics())),
            intrinsics,
            width,
            height,
            id,
        })
    }
}

/// Parse a JSON array of camera records.
pub fn parse_camera_records(json: &str) -> Result<Vec<CameraRecord>> {
    serde_json::from_str(json).map_err(|e| Error::InvalidReference(e.to_string()))
}

/// Read a JSON file of camera records.
pub fn load_camera_records<P: AsRef<Path>>(path: P) -> Result<Vec<CameraRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_camera_records(&text)
}

/// Write camera records as pretty-printed JSON.
pub fn save_camera_records<P: AsRef<Path>>(path: P, records: &[CameraRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|e| Error::InvalidReference(e.to_string()))?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Cameras evenly spaced on a circle of `radius` around `lookat`, at
/// `height` above the ground, all looking at `lookat`.
pub fn orbit_camera_records(
    count: u32,
    lookat: Vec3,
    radius: f32,
    height: f32,
    intrinsics: [f32; 4],
    width: u32,
    image_height: u32,
) -> Result<Vec<CameraRecord>> {
    (0..count)
        .map(|i| {
            let theta = i as f32 / count as f32 * std::f32::consts::TAU;
            let position = Vec3::new(radius * theta.cos(), height, radius * theta.sin());
            CameraRecord::looking_at(i, position, lookat, intrinsics, width, image_height)
        })
        .collect()
}

/// Error statistics of a rendered depth map against a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthErrorStats {
    pub mean_abs: f32,
    pub max_abs: f32,
    /// Pixels compared (foreground in both maps and in the mask)
    pub pixel_count: usize,
}

impl DepthErrorStats {
    pub fn within(&self, tolerance: f32) -> bool {
        self.mean_abs < tolerance
    }
}

/// Compare two depth maps over the pixels where `mask` is set and both maps
/// have a finite depth.
///
/// # Errors
///
/// `InvalidReference` if the sizes differ or no pixel is left to compare.
pub fn compare_depth(rendered: &DepthImage, reference: &DepthImage, mask: &[bool]) -> Result<DepthErrorStats> {
    if rendered.width() != reference.width() || rendered.height() != reference.height() {
        camera_bail!(
            SOURCE,
            Error::InvalidReference,
            "rendered depth is {}x{}, reference is {}x{}",
            rendered.width(), rendered.height(), reference.width(), reference.height()
        );
    }
    if mask.len() != rendered.data().len() {
        camera_bail!(
            SOURCE,
            Error::InvalidReference,
            "mask has {} entries for {} pixels",
            mask.len(), rendered.data().len()
        );
    }

    let mut sum = 0.0f64;
    let mut max_abs = 0.0f32;
    let mut pixel_count = 0usize;
    for ((&a, &b), &keep) in rendered.data().iter().zip(reference.data()).zip(mask) {
        if !keep || !a.is_finite() || !b.is_finite() {
            continue;
        }
        let diff = (a - b).abs();
        sum += diff as f64;
        max_abs = max_abs.max(diff);
        pixel_count += 1;
    }

    if pixel_count == 0 {
        return Err(Error::InvalidReference("no overlapping foreground pixels".to_string()));
    }

    Ok(DepthErrorStats {
        mean_abs: (sum / pixel_count as f64) as f32,
        max_abs,
        pixel_count,
    })
}

/// Float metric depth map of an external reference render.
pub fn load_reference_depth<P: AsRef<Path>>(path: P) -> Result<DepthImage> {
    DepthImage::load(path)
}

/// First existing `<dir>/<id>.<ext>` among `REFERENCE_DEPTH_EXTENSIONS`.
pub fn find_reference_depth<P: AsRef<Path>>(dir: P, id: u32) -> Option<PathBuf> {
    REFERENCE_DEPTH_EXTENSIONS
        .iter()
        .map(|ext| dir.as_ref().join(format!("{}.{}", id, ext)))
        .find(|path| path.is_file())
}

/// Silhouette mask from an 8-bit image: any nonzero luma is foreground.
/// Returns the image size with the row-major mask.
pub fn load_silhouette<P: AsRef<Path>>(path: P) -> Result<(u32, u32, Vec<bool>)> {
    let luma = image::open(path.as_ref())?.to_luma8();
    let (width, height) = luma.dimensions();
    let mask = luma.pixels().map(|p| p.0[0] > 0).collect();
    Ok((width, height, mask))
}

/// Save a silhouette mask as an 8-bit PNG (255 = foreground).
pub fn save_silhouette<P: AsRef<Path>>(path: P, width: u32, height: u32, mask: &[bool]) -> Result<()> {
    let pixels = mask.iter().map(|&hit| if hit { 255 } else { 0 }).collect();
    let Some(image) = GrayImage::from_raw(width, height, pixels) else {
        camera_bail!(
            SOURCE,
            Error::InvalidReference,
            "silhouette has {} entries for {}x{} pixels",
            mask.len(), width, height
        );
    };
    image.save_with_format(path.as_ref(), ImageFormat::Png)?;
    Ok(())
}

/// Element-wise AND of two masks of the same length.
pub fn mask_and(a: &[bool], b: &[bool]) -> Result<Vec<bool>> {
    if a.len() != b.len() {
        camera_bail!(SOURCE, Error::InvalidReference, "mask sizes differ: {} vs {}", a.len(), b.len());
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| x && y).collect())
}

/// Intersection of the silhouettes of two depth maps of the same size.
pub fn silhouette_intersection(a: &DepthImage, b: &DepthImage) -> Vec<bool> {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

/// Analytic depth of an axis-aligned box as seen by `camera`.
///
/// One ray per pixel centre through the pinhole model; the stored value is
/// the camera-frame z of the first hit, `BACKGROUND_DEPTH` on a miss or
/// outside the clip planes.
pub fn raycast_aabb_depth(camera: &Camera, aabb: &AABB) -> Result<DepthImage> {
    let k = camera.effective_intrinsics();
    let (near, far) = camera.get_near_far();
    let (width, height) = (camera.width(), camera.height());

    // Camera → world rotation: transpose of the extrinsics rotation block
    let extrinsics = camera.extrinsics();
    let cam_to_world = glam::Mat3::from_mat4(extrinsics).transpose();
    let origin = camera.position();

    let mut data = Vec::with_capacity(width as usize * height as usize);
    for v in 0..height {
        for u in 0..width {
            let ray_cam = Vec3::new(
                (u as f32 + 0.5 - k.cx) / k.fx,
                (v as f32 + 0.5 - k.cy) / k.fy,
                1.0,
            );
            // Unit z in the camera frame, so the ray parameter is the depth
            let depth = aabb
                .ray_intersect(origin, cam_to_world * ray_cam)
                .filter(|&t| t >= near && t <= far)
                .unwrap_or(BACKGROUND_DEPTH);
            data.push(depth);
        }
    }

    DepthImage::from_data(width, height, data)
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
