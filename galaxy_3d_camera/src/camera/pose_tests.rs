use glam::{Mat4, Quat, Vec3, Vec4};
use approx::assert_relative_eq;
use crate::error::Error;
use super::*;

/// Extrinsics used by the depth-map scenario (row-major, world → camera).
fn scenario_rows() -> [[f32; 4]; 4] {
    [
        [-0.19913687965295618, -0.47458859076048726, 0.8573856615794662, 0.7913859597626586],
        [0.0, -0.8749086068608676, -0.48428806473087466, 1.3802989124878067],
        [0.9799716848777235, -0.09643961406367524, 0.17422656995178815, 1.689456300513285],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

fn assert_mat4_near(a: &Mat4, b: &Mat4, eps: f32) {
    let a = a.to_cols_array();
    let b = b.to_cols_array();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() < eps, "{:?}\n!=\n{:?}", a, b);
    }
}

// ============================================================================
// Construction and validation
// ============================================================================

#[test]
fn test_default_pose_is_valid() {
    let pose = PosLookat::default();
    assert!(pose.validate().is_ok());
    assert_eq!(pose.up, WORLD_UP);
}

#[test]
fn test_new_rejects_coincident_points() {
    let result = PosLookat::new(Vec3::ONE, Vec3::ONE);
    assert!(matches!(result, Err(Error::DegenerateLookAt(_))));
}

#[test]
fn test_new_rejects_direction_parallel_to_up() {
    let result = PosLookat::new(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
    assert!(matches!(result, Err(Error::DegenerateLookAt(_))));
}

#[test]
fn test_new_rejects_non_finite() {
    let result = PosLookat::new(Vec3::new(f32::NAN, 0.0, 1.0), Vec3::ZERO);
    assert!(matches!(result, Err(Error::DegenerateLookAt(_))));
}

#[test]
fn test_direction_and_distance() {
    let pose = PosLookat::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO).unwrap();
    assert_relative_eq!(pose.dist_lookat(), 4.0);
    assert!(pose.direction().abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
}

// ============================================================================
// Extrinsics conversions
// ============================================================================

#[test]
fn test_extrinsics_round_trip_scenario_matrix() {
    let m = mat4_from_rows(scenario_rows());
    let pose = PosLookat::from_extrinsics(&m).unwrap();
    assert_mat4_near(&pose.extrinsics(), &m, 1e-5);
}

#[test]
fn test_from_extrinsics_recovers_camera_center() {
    let pose = PosLookat::from_extrinsics(&mat4_from_rows(scenario_rows())).unwrap();
    assert!(pose.position.abs_diff_eq(Vec3::new(-1.498, 1.746, -0.304), 2e-3));
    assert!(pose.direction().abs_diff_eq(Vec3::new(0.980, -0.096, 0.174), 1e-3));
    assert_relative_eq!(pose.dist_lookat(), 1.0, epsilon = 1e-5);
}

#[test]
fn test_extrinsics_maps_lookat_onto_optical_axis() {
    let pose = PosLookat::new(Vec3::new(1.0, 2.5, 5.0), Vec3::new(0.0, 1.0, 0.0)).unwrap();
    let cam = pose.extrinsics() * pose.lookat.extend(1.0);
    assert_relative_eq!(cam.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(cam.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(cam.z, pose.dist_lookat(), epsilon = 1e-5);
}

#[test]
fn test_extrinsics_y_axis_points_down() {
    let pose = PosLookat::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO).unwrap();
    // A point above the optical axis has negative camera y
    let above = pose.extrinsics() * Vec4::new(0.0, 1.0, 0.0, 1.0);
    assert!(above.y < 0.0);
}

#[test]
fn test_view_matrix_is_flipped_extrinsics() {
    let pose = PosLookat::new(Vec3::new(1.0, 2.5, 5.0), Vec3::new(0.0, 1.0, 0.0)).unwrap();
    let flip = Mat4::from_diagonal(Vec4::new(1.0, -1.0, -1.0, 1.0));
    assert_mat4_near(&pose.view_matrix(), &(flip * pose.extrinsics()), 1e-5);
}

#[test]
fn test_model_matrix_inverts_view() {
    let pose = PosLookat::new(Vec3::new(3.0, 1.0, -2.0), Vec3::new(0.5, 0.0, 0.0)).unwrap();
    let product = pose.model_matrix() * pose.view_matrix();
    assert_mat4_near(&product, &Mat4::IDENTITY, 1e-5);
    assert!(pose.model_matrix().col(3).truncate().abs_diff_eq(pose.position, 1e-5));
}

#[test]
fn test_cam_axes_orthonormal() {
    let pose = PosLookat::new(Vec3::new(3.0, 1.0, -2.0), Vec3::ZERO).unwrap();
    let axes = pose.cam_axes();
    assert_relative_eq!(axes.determinant(), 1.0, epsilon = 1e-5);
    assert!(axes.z_axis.abs_diff_eq(-pose.direction(), 1e-6));
}

#[test]
fn test_from_extrinsics_rejects_non_finite() {
    let mut rows = scenario_rows();
    rows[1][2] = f32::INFINITY;
    let result = PosLookat::from_extrinsics(&mat4_from_rows(rows));
    assert!(matches!(result, Err(Error::InvalidCameraMatrix(_))));
}

#[test]
fn test_from_extrinsics_rejects_bad_bottom_row() {
    let mut rows = scenario_rows();
    rows[3] = [0.0, 0.0, 1.0, 1.0];
    let result = PosLookat::from_extrinsics(&mat4_from_rows(rows));
    assert!(matches!(result, Err(Error::InvalidCameraMatrix(_))));
}

#[test]
fn test_from_extrinsics_rejects_scaled_rotation() {
    let m = Mat4::from_scale(Vec3::splat(2.0));
    let result = PosLookat::from_extrinsics(&m);
    assert!(matches!(result, Err(Error::InvalidCameraMatrix(_))));
}

#[test]
fn test_from_extrinsics_rejects_reflection() {
    let m = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
    let result = PosLookat::from_extrinsics(&m);
    assert!(matches!(result, Err(Error::InvalidCameraMatrix(_))));
}

#[test]
fn test_row_helpers_are_inverse() {
    let rows = scenario_rows();
    assert_eq!(mat4_to_rows(&mat4_from_rows(rows)), rows);
    // Translation lands in the last column
    let m = mat4_from_rows(rows);
    assert_relative_eq!(m.col(3).z, rows[2][3]);
}

// ============================================================================
// Movement
// ============================================================================

#[test]
fn test_orbit_y_preserves_distance() {
    let mut pose = PosLookat::new(Vec3::new(1.0, 2.5, 5.0), Vec3::new(0.0, 1.0, 0.0)).unwrap();
    let dist = pose.dist_lookat();
    for step in 0..500 {
        pose.orbit_y(10.0 / 60.0 * (1.0 + step as f32 * 0.01));
        assert_relative_eq!(pose.dist_lookat(), dist, epsilon = 1e-3);
    }
    assert_eq!(pose.lookat, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(pose.up, WORLD_UP);
}

#[test]
fn test_orbit_y_quarter_turn() {
    let mut pose = PosLookat::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO).unwrap();
    pose.orbit_y(90.0);
    assert!(pose.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
}

#[test]
fn test_orbit_over_the_pole_flips_up() {
    let mut pose = PosLookat::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO).unwrap();
    pose.orbit(Quat::from_rotation_x(-150f32.to_radians()));
    assert_eq!(pose.up, -WORLD_UP);
    assert!(pose.validate().is_ok());
}

#[test]
fn test_dolly_moves_toward_lookat() {
    let mut pose = PosLookat::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO).unwrap();
    pose.dolly(0.1);
    assert_relative_eq!(pose.dist_lookat(), 9.0, epsilon = 1e-5);
}

#[test]
fn test_shift_keeps_direction() {
    let mut pose = PosLookat::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO).unwrap();
    let direction = pose.direction();

    pose.shift_cam(Vec3::new(1.0, 1.0, 10.0));
    assert_eq!(pose.position, Vec3::new(1.0, 1.0, 10.0));
    assert!(pose.direction().abs_diff_eq(direction, 1e-6));

    pose.shift_lookat(Vec3::new(-3.0, 0.0, 0.0));
    assert_eq!(pose.lookat, Vec3::new(-3.0, 0.0, 0.0));
    assert!(pose.direction().abs_diff_eq(direction, 1e-6));
}
