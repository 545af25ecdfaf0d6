//! Projection models: vertical field of view or pinhole intrinsics.
//!
//! Both produce a right-handed projection for a camera looking down -z with
//! depth in `[0, 1]`. `reverse_z()` turns it into the reverse-Z matrix the
//! rasterizer uses (1 at the near plane, 0 at the far plane).

use glam::{Mat4, Vec4};
use crate::error::{Error, Result};

pub const DEFAULT_NEAR: f32 = 0.01;
pub const DEFAULT_FAR: f32 = 100.0;
pub const DEFAULT_FOVY: f32 = 0.7;

/// Pinhole camera parameters in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Focal lengths must be finite and positive, principal point finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.fx.is_finite() && self.fx > 0.0 && self.fy.is_finite() && self.fy > 0.0) {
            return Err(Error::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        if !(self.cx.is_finite() && self.cy.is_finite()) {
            return Err(Error::InvalidIntrinsics(format!(
                "principal point must be finite, got cx={} cy={}",
                self.cx, self.cy
            )));
        }
        Ok(())
    }

    /// Whether the principal point lies inside a `width` x `height` image.
    pub fn principal_point_inside(&self, width: u32, height: u32) -> bool {
        (0.0..=width as f32).contains(&self.cx) && (0.0..=height as f32).contains(&self.cy)
    }
}

/// Check that `0 < near < far`, both finite.
pub fn validate_near_far(near: f32, far: f32) -> Result<()> {
    if !(near.is_finite() && far.is_finite() && near > 0.0 && near < far) {
        return Err(Error::InvalidClipPlanes(format!(
            "need 0 < near < far, got near={} far={}",
            near, far
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionWithFov {
    /// Vertical field of view in radians
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionWithIntrinsics {
    pub intrinsics: Intrinsics,
    pub near: f32,
    pub far: f32,
}

/// The active projection model of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    WithFov(ProjectionWithFov),
    WithIntrinsics(ProjectionWithIntrinsics),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::WithFov(ProjectionWithFov {
            fovy: DEFAULT_FOVY,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        })
    }
}

impl Projection {
    pub fn near_far(&self) -> (f32, f32) {
        match self {
            Projection::WithFov(p) => (p.near, p.far),
            Projection::WithIntrinsics(p) => (p.near, p.far),
        }
    }

    pub(crate) fn set_near_far(&mut self, near: f32, far: f32) {
        match self {
            Projection::WithFov(p) => {
                p.near = near;
                p.far = far;
            }
            Projection::WithIntrinsics(p) => {
                p.near = near;
                p.far = far;
            }
        }
    }

    /// Projection matrix with forward depth in `[0, 1]` (0 near, 1 far).
    pub fn proj_matrix(&self, width: u32, height: u32) -> Mat4 {
        match self {
            Projection::WithFov(p) => {
                let aspect = width as f32 / height as f32;
                Mat4::perspective_rh(p.fovy, aspect, p.near, p.far)
            }
            Projection::WithIntrinsics(p) => intrinsics_proj(&p.intrinsics, width, height, p.near, p.far),
        }
    }

    /// Projection matrix with reversed depth (1 near, 0 far).
    pub fn proj_matrix_reverse_z(&self, width: u32, height: u32) -> Mat4 {
        reverse_z() * self.proj_matrix(width, height)
    }

    /// Pinhole parameters equivalent to this projection at the given resolution.
    ///
    /// For a field-of-view projection the principal point is the image centre
    /// and pixels are square.
    pub fn intrinsics(&self, width: u32, height: u32) -> Intrinsics {
        match self {
            Projection::WithFov(p) => {
                let f = height as f32 / (2.0 * (p.fovy * 0.5).tan());
                Intrinsics::new(f, f, width as f32 * 0.5, height as f32 * 0.5)
            }
            Projection::WithIntrinsics(p) => p.intrinsics,
        }
    }
}

/// Depth remap taking a `[0, 1]` forward-Z matrix to reverse-Z (`z' = w - z`).
pub fn reverse_z() -> Mat4 {
    Mat4::from_cols(
        Vec4::X,
        Vec4::Y,
        Vec4::new(0.0, 0.0, -1.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 1.0),
    )
}

/// Projection built directly from the pinhole parameters.
///
/// Pixel rows grow downwards, so a point with camera-frame coordinates
/// (X right, Y down, Z forward) lands at `u = fx X/Z + cx`, `v = fy Y/Z + cy`
/// once the NDC result is mapped to the viewport.
fn intrinsics_proj(k: &Intrinsics, width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    let w = width as f32;
    let h = height as f32;

    // Row-major entries; the view frame looks down -z with y up
    let rows = [
        [2.0 * k.fx / w, 0.0, 1.0 - 2.0 * k.cx / w, 0.0],
        [0.0, 2.0 * k.fy / h, 2.0 * k.cy / h - 1.0, 0.0],
        [0.0, 0.0, -far / (far - near), -far * near / (far - near)],
        [0.0, 0.0, -1.0, 0.0],
    ];
    Mat4::from_cols_array_2d(&rows).transpose()
}

#[cfg(test)]
#[path = "projection_tests.rs"]
mod tests;
