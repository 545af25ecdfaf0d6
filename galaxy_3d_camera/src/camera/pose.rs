//! Camera pose as position, look-at point and up vector.
//!
//! This is the canonical pose representation. The 4x4 extrinsics matrix
//! (world → camera, computer-vision frame: x right, y down, z forward) and
//! the rasterization view matrix (world → camera, y up, looking down -z)
//! are both derived from it.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use crate::error::{Error, Result};

/// World up vector used by the position/look-at setters.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Tolerance on the rotation block of an extrinsics matrix
/// (orthonormality and determinant).
pub const RIGID_TOLERANCE: f32 = 1e-3;

/// Minimum |normalize(direction) x up| before the look-at is degenerate.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Camera pose: position, look-at target and up vector (world coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosLookat {
    pub position: Vec3,
    pub lookat: Vec3,
    pub up: Vec3,
}

impl Default for PosLookat {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 3.0),
            lookat: Vec3::ZERO,
            up: WORLD_UP,
        }
    }
}

impl PosLookat {
    /// Pose looking from `position` at `lookat` with the world up vector.
    ///
    /// # Errors
    ///
    /// `DegenerateLookAt` if the direction is zero-length or parallel to up.
    pub fn new(position: Vec3, lookat: Vec3) -> Result<Self> {
        let pose = Self { position, lookat, up: WORLD_UP };
        pose.validate()?;
        Ok(pose)
    }

    /// Recover a pose from a world → camera extrinsics matrix.
    ///
    /// The matrix is expected in computer-vision convention: rotation rows
    /// are (right, -up, forward), translation is `-R * position`.
    ///
    /// # Errors
    ///
    /// `InvalidCameraMatrix` if any entry is non-finite, the bottom row is
    /// not `[0, 0, 0, 1]`, or the rotation block is not a proper rotation.
    pub fn from_extrinsics(extrinsics: &Mat4) -> Result<Self> {
        validate_rigid(extrinsics)?;

        let rot = Mat3::from_mat4(*extrinsics);
        let trans = extrinsics.col(3).truncate();
        let center = -(rot.transpose() * trans);

        // Rows of the rotation block
        let row_down = rot.row(1);
        let row_forward = rot.row(2);

        Ok(Self {
            position: center,
            lookat: center + row_forward,
            up: -row_down,
        })
    }

    /// Check that the look-at direction is usable with the current up vector.
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.lookat.is_finite() || !self.up.is_finite() {
            return Err(Error::DegenerateLookAt(format!(
                "non-finite pose: position {:?}, lookat {:?}, up {:?}",
                self.position, self.lookat, self.up
            )));
        }
        let direction = self.lookat - self.position;
        if direction.length_squared() <= f32::EPSILON * f32::EPSILON {
            return Err(Error::DegenerateLookAt(format!(
                "position and lookat coincide at {:?}",
                self.position
            )));
        }
        if direction.normalize().cross(self.up).length() < PARALLEL_EPSILON {
            return Err(Error::DegenerateLookAt(format!(
                "direction {:?} is parallel to up {:?}",
                direction, self.up
            )));
        }
        Ok(())
    }

    /// Direction in which we are looking, in world coordinates (unit length)
    pub fn direction(&self) -> Vec3 {
        (self.lookat - self.position).normalize()
    }

    /// Distance from camera position to the look-at point
    pub fn dist_lookat(&self) -> f32 {
        (self.position - self.lookat).length()
    }

    /// Camera basis in world coordinates: (right, up, forward), orthonormal.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.direction();
        let right = forward.cross(self.up).normalize();
        let true_up = right.cross(forward);
        (right, true_up, forward)
    }

    /// World → camera extrinsics (x right, y down, z forward).
    pub fn extrinsics(&self) -> Mat4 {
        let (right, true_up, forward) = self.basis();
        let down = -true_up;
        Mat4::from_cols(
            Vec4::new(right.x, down.x, forward.x, 0.0),
            Vec4::new(right.y, down.y, forward.y, 0.0),
            Vec4::new(right.z, down.z, forward.z, 0.0),
            Vec4::new(
                -right.dot(self.position),
                -down.dot(self.position),
                -forward.dot(self.position),
                1.0,
            ),
        )
    }

    /// World → camera view matrix used for rasterization (y up, looking down -z).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.lookat, self.up)
    }

    /// Camera → world transform (inverse of the view matrix).
    pub fn model_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Camera axes as columns: x right, y up, z backwards (out of the screen).
    pub fn cam_axes(&self) -> Mat3 {
        let (right, true_up, forward) = self.basis();
        Mat3::from_cols(right, true_up, -forward)
    }

    /// Moves the camera along the direction of the look-at point.
    ///
    /// `s = 0.1` covers a tenth of the remaining distance.
    pub fn dolly(&mut self, s: f32) {
        let eye_look_vec = self.lookat - self.position;
        self.position += eye_look_vec * s;
    }

    /// Rotates the camera position around the look-at point.
    ///
    /// When the rotation carries the camera over the pole, `up` is flipped
    /// so the view does not snap upside down.
    pub fn orbit(&mut self, rot: Quat) {
        let cam_up_before = self.basis().1;

        self.position = self.lookat + rot * (self.position - self.lookat);

        let cam_up_after = rot * cam_up_before;
        if self.up.dot(cam_up_after) < 0.0 {
            self.up = -self.up;
        }
    }

    /// Rotates around the world Y axis through the look-at point by `degrees`.
    pub fn orbit_y(&mut self, degrees: f32) {
        self.orbit(Quat::from_rotation_y(degrees.to_radians()));
    }

    /// Moves the camera to `pos` and shifts the look-at point by the same
    /// displacement, without rotating the camera.
    pub fn shift_cam(&mut self, pos: Vec3) {
        let displacement = pos - self.position;
        self.position += displacement;
        self.lookat += displacement;
    }

    /// Moves the look-at point to `pos` and shifts the camera rigidly with it.
    pub fn shift_lookat(&mut self, pos: Vec3) {
        let displacement = pos - self.lookat;
        self.position += displacement;
        self.lookat += displacement;
    }
}

/// Build a glam matrix from row-major rows (`rows[i][j]` = row i, column j).
pub fn mat4_from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&rows).transpose()
}

/// Row-major rows of a glam matrix.
pub fn mat4_to_rows(m: &Mat4) -> [[f32; 4]; 4] {
    m.transpose().to_cols_array_2d()
}

/// Reject non-finite entries and anything that is not a proper rigid transform.
fn validate_rigid(m: &Mat4) -> Result<()> {
    let rows = mat4_to_rows(m);
    for (i, row) in rows.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            if !value.is_finite() {
                return Err(Error::InvalidCameraMatrix(format!(
                    "entry ({}, {}) is not finite ({})",
                    i, j, value
                )));
            }
        }
    }

    let bottom = m.row(3);
    if !bottom.abs_diff_eq(Vec4::W, 1e-6) {
        return Err(Error::InvalidCameraMatrix(format!(
            "bottom row must be [0, 0, 0, 1], got {:?}",
            bottom
        )));
    }

    let rot = Mat3::from_mat4(*m);
    let should_be_identity = rot * rot.transpose();
    if !should_be_identity.abs_diff_eq(Mat3::IDENTITY, RIGID_TOLERANCE) {
        return Err(Error::InvalidCameraMatrix(
            "rotation block is not orthonormal".to_string(),
        ));
    }

    let det = rot.determinant();
    if (det - 1.0).abs() > RIGID_TOLERANCE {
        return Err(Error::InvalidCameraMatrix(format!(
            "rotation block must have determinant +1, got {}",
            det
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "pose_tests.rs"]
mod tests;
