//! Camera module: pose, projection, depth linearization and frustum.
//!
//! The pose is stored once as position / look-at / up. Extrinsics, view and
//! projection matrices are derived on demand.

mod camera;
pub mod depth;
mod frustum;
pub mod pose;
pub mod projection;

pub use camera::Camera;
pub use depth::{
    depth_linearize, depth_to_ndc, DepthBuffer, DepthImage, BACKGROUND_DEPTH, CLEAR_DEPTH,
};
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use pose::{mat4_from_rows, mat4_to_rows, PosLookat, WORLD_UP};
pub use projection::{
    Intrinsics, Projection, ProjectionWithFov, ProjectionWithIntrinsics,
    DEFAULT_FAR, DEFAULT_FOVY, DEFAULT_NEAR,
};
