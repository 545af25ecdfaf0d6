//! Camera: pose, projection model and output resolution.
//!
//! Every setter validates its input before touching any state. A rejected
//! call returns an error and leaves the camera exactly as it was.

use glam::{Mat4, Quat, Vec3};
use crate::error::{Error, Result};
use crate::{camera_bail, camera_debug, camera_error, camera_warn};
use super::depth::DepthBuffer;
use super::frustum::Frustum;
use super::pose::{mat4_from_rows, PosLookat, WORLD_UP};
use super::projection::{
    validate_near_far, Intrinsics, Projection, ProjectionWithFov, ProjectionWithIntrinsics,
};

const SOURCE: &str = "galaxy3d::Camera";

/// Scene camera used by the headless viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pose: PosLookat,
    projection: Projection,
    width: u32,
    height: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pose: PosLookat::default(),
            projection: Projection::default(),
            width: 800,
            height: 600,
        }
    }
}

impl Camera {
    /// Default pose and projection at the given resolution.
    pub fn with_resolution(width: u32, height: u32) -> Result<Self> {
        validate_resolution(width, height)?;
        Ok(Self { width, height, ..Self::default() })
    }

    // ===== POSE =====

    /// Set the pose from a world → camera extrinsics matrix
    /// (x right, y down, z forward).
    pub fn set_extrinsics(&mut self, extrinsics: &Mat4) -> Result<()> {
        let pose = PosLookat::from_extrinsics(extrinsics).map_err(|e| {
            camera_warn!(SOURCE, "set_extrinsics rejected: {}", e);
            e
        })?;
        self.pose = pose;
        camera_debug!(SOURCE, "extrinsics set, position {:?}", self.pose.position);
        Ok(())
    }

    /// `set_extrinsics` from row-major rows.
    pub fn set_extrinsics_rows(&mut self, rows: [[f32; 4]; 4]) -> Result<()> {
        self.set_extrinsics(&mat4_from_rows(rows))
    }

    /// Current world → camera extrinsics (x right, y down, z forward).
    pub fn extrinsics(&self) -> Mat4 {
        self.pose.extrinsics()
    }

    /// Move the camera, keeping the look-at target. Resets up to world Y.
    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.set_pose(position, self.pose.lookat)
    }

    /// Aim the camera at a new target, keeping its position. Resets up to world Y.
    pub fn set_lookat(&mut self, lookat: Vec3) -> Result<()> {
        self.set_pose(self.pose.position, lookat)
    }

    /// Set position and target together. Resets up to world Y.
    pub fn set_position_lookat(&mut self, position: Vec3, lookat: Vec3) -> Result<()> {
        self.set_pose(position, lookat)
    }

    fn set_pose(&mut self, position: Vec3, lookat: Vec3) -> Result<()> {
        self.commit_pose(PosLookat { position, lookat, up: WORLD_UP })
    }

    fn commit_pose(&mut self, candidate: PosLookat) -> Result<()> {
        if let Err(e) = candidate.validate() {
            camera_warn!(SOURCE, "pose rejected: {}", e);
            return Err(e);
        }
        self.pose = candidate;
        Ok(())
    }

    pub fn pose(&self) -> &PosLookat {
        &self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn lookat(&self) -> Vec3 {
        self.pose.lookat
    }

    pub fn up(&self) -> Vec3 {
        self.pose.up
    }

    /// Orbit around the look-at point about the world Y axis.
    pub fn orbit_y(&mut self, degrees: f32) {
        self.pose.orbit_y(degrees);
    }

    /// Orbit around the look-at point by an arbitrary rotation.
    ///
    /// Fails with `DegenerateLookAt` (camera unchanged) if the rotation
    /// lines the view direction up with `up`.
    pub fn orbit(&mut self, rot: Quat) -> Result<()> {
        let mut candidate = self.pose;
        candidate.orbit(rot);
        self.commit_pose(candidate)
    }

    /// Move towards the look-at point by a fraction `s` of the distance.
    ///
    /// Fails with `DegenerateLookAt` (camera unchanged) if the camera would
    /// land on the look-at point.
    pub fn dolly(&mut self, s: f32) -> Result<()> {
        let mut candidate = self.pose;
        candidate.dolly(s);
        self.commit_pose(candidate)
    }

    // ===== PROJECTION =====

    /// Switch to a pinhole projection, keeping the current clip planes.
    pub fn set_intrinsics(&mut self, fx: f32, fy: f32, cx: f32, cy: f32) -> Result<()> {
        let (near, far) = self.get_near_far();
        self.set_intrinsics_with_near_far(fx, fy, cx, cy, near, far)
    }

    /// Switch to a pinhole projection with explicit clip planes.
    pub fn set_intrinsics_with_near_far(
        &mut self,
        fx: f32,
        fy: f32,
        cx: f32,
        cy: f32,
        near: f32,
        far: f32,
    ) -> Result<()> {
        let intrinsics = Intrinsics::new(fx, fy, cx, cy);
        intrinsics.validate()?;
        validate_near_far(near, far)?;

        if !intrinsics.principal_point_inside(self.width, self.height) {
            camera_warn!(
                SOURCE,
                "principal point ({}, {}) lies outside the {}x{} image",
                cx, cy, self.width, self.height
            );
        }

        self.projection = Projection::WithIntrinsics(ProjectionWithIntrinsics { intrinsics, near, far });
        Ok(())
    }

    /// Switch to a field-of-view projection (vertical FOV in radians),
    /// keeping the current clip planes.
    pub fn set_fovy(&mut self, fovy: f32) -> Result<()> {
        if !(fovy.is_finite() && fovy > 0.0 && fovy < std::f32::consts::PI) {
            return Err(Error::InvalidIntrinsics(format!(
                "vertical field of view must be in (0, pi), got {}",
                fovy
            )));
        }
        let (near, far) = self.get_near_far();
        self.projection = Projection::WithFov(ProjectionWithFov { fovy, near, far });
        Ok(())
    }

    /// Pinhole intrinsics if the camera uses them.
    pub fn intrinsics(&self) -> Option<Intrinsics> {
        match self.projection {
            Projection::WithIntrinsics(p) => Some(p.intrinsics),
            Projection::WithFov(_) => None,
        }
    }

    /// Pinhole parameters matching the current projection at this resolution.
    pub fn effective_intrinsics(&self) -> Intrinsics {
        self.projection.intrinsics(self.width, self.height)
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_near_far(&mut self, near: f32, far: f32) -> Result<()> {
        validate_near_far(near, far)?;
        self.projection.set_near_far(near, far);
        Ok(())
    }

    pub fn get_near_far(&self) -> (f32, f32) {
        self.projection.near_far()
    }

    // ===== RESOLUTION =====

    pub fn set_width_height(&mut self, width: u32, height: u32) -> Result<()> {
        validate_resolution(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    // ===== MATRICES =====

    /// World → view (y up, looking down -z).
    pub fn view_matrix(&self) -> Mat4 {
        self.pose.view_matrix()
    }

    /// Projection with forward depth (0 near, 1 far).
    pub fn proj_matrix(&self) -> Mat4 {
        self.projection.proj_matrix(self.width, self.height)
    }

    /// Projection with reverse-Z depth (1 near, 0 far).
    pub fn proj_matrix_reverse_z(&self) -> Mat4 {
        self.projection.proj_matrix_reverse_z(self.width, self.height)
    }

    /// Reverse-Z view-projection used for rasterization and culling.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.proj_matrix_reverse_z() * self.view_matrix()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// Project a world point to pixel coordinates (row 0 at the top) and
    /// reverse-Z NDC depth. `None` for points at or behind the camera plane.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (0.5 - ndc.y * 0.5) * self.height as f32,
            ndc.z,
        ))
    }

    /// Inverse of `project`: pixel coordinates plus NDC depth back to world space.
    pub fn unproject(&self, pixel_x: f32, pixel_y: f32, ndc_depth: f32) -> Vec3 {
        let ndc_x = pixel_x / self.width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - pixel_y / self.height as f32 * 2.0;
        self.view_projection_matrix()
            .inverse()
            .project_point3(Vec3::new(ndc_x, ndc_y, ndc_depth))
    }

    /// Check that depth rendered with `sample_count` samples per pixel can
    /// be linearized.
    pub fn validate_depth_readback(&self, sample_count: u32) -> Result<()> {
        if sample_count != 1 {
            camera_error!(SOURCE, "depth readback needs 1 sample per pixel, got {}", sample_count);
            return Err(Error::UnsupportedSampleCount(sample_count));
        }
        Ok(())
    }

    /// Cleared depth target matching this camera's resolution and clip planes.
    pub fn create_depth_buffer(&self, sample_count: u32) -> DepthBuffer {
        let (near, far) = self.get_near_far();
        DepthBuffer::new(self.width, self.height, sample_count, near, far)
    }
}

fn validate_resolution(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        camera_bail!(
            SOURCE,
            Error::InvalidResolution,
            "resolution must be non-zero, got {}x{}",
            width, height
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
