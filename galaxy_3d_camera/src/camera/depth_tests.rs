use approx::assert_relative_eq;
use crate::error::Error;
use super::*;

const NEAR: f32 = 0.01;
const FAR: f32 = 100.0;

// ============================================================================
// Scalar mapping
// ============================================================================

#[test]
fn test_linearize_boundaries() {
    assert_relative_eq!(depth_linearize(1.0, NEAR, FAR), NEAR, max_relative = 1e-5);
    assert_relative_eq!(depth_linearize(0.0, NEAR, FAR), FAR, max_relative = 1e-5);
}

#[test]
fn test_linearize_is_monotonically_decreasing() {
    let mut previous = f32::INFINITY;
    for i in 0..=1000 {
        let ndc = i as f32 / 1000.0;
        let linear = depth_linearize(ndc, NEAR, FAR);
        assert!(linear < previous, "not decreasing at ndc={}", ndc);
        assert!(linear >= NEAR * 0.9999 && linear <= FAR * 1.0001);
        previous = linear;
    }
}

#[test]
fn test_linearize_inverts_forward_mapping() {
    for d in [0.02, 0.5, 1.0, 1.57, 3.0, 42.0, 99.0] {
        let ndc = depth_to_ndc(d, NEAR, FAR);
        assert!((0.0..=1.0).contains(&ndc));
        assert_relative_eq!(depth_linearize(ndc, NEAR, FAR), d, max_relative = 1e-4);
    }
}

#[test]
fn test_linearize_invalid_input_is_background() {
    assert_eq!(depth_linearize(f32::NAN, NEAR, FAR), BACKGROUND_DEPTH);
    assert_eq!(depth_linearize(f32::INFINITY, NEAR, FAR), BACKGROUND_DEPTH);
    assert_eq!(depth_linearize(-0.1, NEAR, FAR), BACKGROUND_DEPTH);
    assert_eq!(depth_linearize(1.5, NEAR, FAR), BACKGROUND_DEPTH);
}

// ============================================================================
// DepthBuffer
// ============================================================================

#[test]
fn test_new_buffer_is_cleared() {
    let buffer = DepthBuffer::new(4, 3, 1, NEAR, FAR);
    assert_eq!(buffer.samples().len(), 12);
    assert!(buffer.samples().iter().all(|&s| s == CLEAR_DEPTH));
    assert_eq!(buffer.near_far(), (NEAR, FAR));
}

#[test]
fn test_multisample_buffer_layout() {
    let mut buffer = DepthBuffer::new(2, 2, 4, NEAR, FAR);
    assert_eq!(buffer.samples().len(), 16);
    assert!(buffer.test_and_set(1, 1, 3, 0.5));
    assert_eq!(buffer.samples()[15], 0.5);
    assert_eq!(buffer.get(1, 1, 2), CLEAR_DEPTH);
}

#[test]
fn test_depth_test_keeps_closest() {
    let mut buffer = DepthBuffer::new(1, 1, 1, NEAR, FAR);
    assert!(buffer.test_and_set(0, 0, 0, 0.3));
    // Farther (smaller in reverse-Z) is rejected
    assert!(!buffer.test_and_set(0, 0, 0, 0.2));
    assert!(buffer.test_and_set(0, 0, 0, 0.8));
    assert_eq!(buffer.get(0, 0, 0), 0.8);
}

#[test]
fn test_buffer_linearize_maps_background() {
    let ndc = depth_to_ndc(2.0, NEAR, FAR);
    let buffer = DepthBuffer::from_samples(2, 1, NEAR, FAR, vec![CLEAR_DEPTH, ndc]).unwrap();
    let image = buffer.depth_linearize(NEAR, FAR).unwrap();

    assert_eq!(image.get(0, 0), BACKGROUND_DEPTH);
    assert!(!image.is_foreground(0, 0));
    assert_relative_eq!(image.get(1, 0), 2.0, max_relative = 1e-4);
    assert_eq!(image.silhouette(), vec![false, true]);
}

#[test]
fn test_buffer_linearize_rejects_multisample() {
    let buffer = DepthBuffer::new(8, 8, 4, NEAR, FAR);
    assert_eq!(buffer.depth_linearize(NEAR, FAR), Err(Error::UnsupportedSampleCount(4)));
}

#[test]
fn test_from_samples_size_mismatch() {
    let result = DepthBuffer::from_samples(3, 3, NEAR, FAR, vec![0.0; 8]);
    assert!(matches!(result, Err(Error::InvalidResolution(_))));
}

// ============================================================================
// DepthImage
// ============================================================================

#[test]
fn test_max_finite_ignores_background() {
    let image = DepthImage::from_data(3, 1, vec![1.0, BACKGROUND_DEPTH, 4.0]).unwrap();
    assert_eq!(image.max_finite(), Some(4.0));

    let empty = DepthImage::from_data(2, 1, vec![BACKGROUND_DEPTH; 2]).unwrap();
    assert_eq!(empty.max_finite(), None);
}

#[test]
fn test_to_normalized_u8() {
    let image = DepthImage::from_data(3, 1, vec![2.0, BACKGROUND_DEPTH, 4.0]).unwrap();
    assert_eq!(image.to_normalized_u8(), vec![127, 0, 255]);
}

#[test]
fn test_save_png_visualization() {
    let image = DepthImage::from_data(2, 2, vec![1.0, 2.0, BACKGROUND_DEPTH, 2.0]).unwrap();
    let path = std::env::temp_dir().join(format!("galaxy3d_depth_{}.png", std::process::id()));
    image.save_png(&path).unwrap();

    let loaded = image::open(&path).map(|img| img.to_luma8());
    std::fs::remove_file(&path).ok();
    let loaded = loaded.unwrap();

    assert_eq!(loaded.dimensions(), (2, 2));
    assert_eq!(loaded.as_raw(), &vec![127, 255, 0, 255]);
}

#[test]
fn test_save_and_load_exr_keeps_metric_depth() {
    let image = DepthImage::from_data(3, 1, vec![0.75, BACKGROUND_DEPTH, 12.5]).unwrap();
    let path = std::env::temp_dir().join(format!("galaxy3d_depth_{}.exr", std::process::id()));
    image.save_exr(&path).unwrap();

    let loaded = DepthImage::load(&path);
    std::fs::remove_file(&path).ok();
    let loaded = loaded.unwrap();

    assert_eq!((loaded.width(), loaded.height()), (3, 1));
    assert_relative_eq!(loaded.get(0, 0), 0.75);
    assert_eq!(loaded.get(1, 0), BACKGROUND_DEPTH);
    assert_relative_eq!(loaded.get(2, 0), 12.5);
}

#[test]
fn test_load_missing_depth_file() {
    assert!(matches!(DepthImage::load("/nonexistent/galaxy3d/0.exr"), Err(Error::Image(_))));
}

#[test]
fn test_from_data_size_mismatch() {
    assert!(matches!(DepthImage::from_data(2, 2, vec![1.0]), Err(Error::InvalidResolution(_))));
}
