//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_camera_matrix_display() {
    let err = Error::InvalidCameraMatrix("entry (0, 3) is NaN".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid camera matrix"));
    assert!(display.contains("entry (0, 3) is NaN"));
}

#[test]
fn test_degenerate_lookat_display() {
    let err = Error::DegenerateLookAt("direction parallel to up".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Degenerate look-at"));
    assert!(display.contains("parallel"));
}

#[test]
fn test_invalid_intrinsics_display() {
    let err = Error::InvalidIntrinsics("fx = 0".to_string());
    assert_eq!(format!("{}", err), "Invalid intrinsics: fx = 0");
}

#[test]
fn test_invalid_resolution_display() {
    let err = Error::InvalidResolution("0x600".to_string());
    assert_eq!(format!("{}", err), "Invalid resolution: 0x600");
}

#[test]
fn test_unsupported_sample_count_display() {
    let err = Error::UnsupportedSampleCount(4);
    let display = format!("{}", err);
    assert!(display.contains("Unsupported sample count"));
    assert!(display.contains("got 4"));
}

#[test]
fn test_no_frame_rendered_display() {
    assert_eq!(format!("{}", Error::NoFrameRendered), "No frame rendered yet");
}

#[test]
fn test_remaining_variants_display() {
    assert!(format!("{}", Error::InvalidClipPlanes("near >= far".into())).contains("Invalid clip planes"));
    assert!(format!("{}", Error::InvalidConfig("bad toml".into())).contains("Invalid config"));
    assert!(format!("{}", Error::InvalidReference("size".into())).contains("Invalid reference"));
    assert!(format!("{}", Error::InvalidMesh("index".into())).contains("Invalid mesh"));
    assert!(format!("{}", Error::Io("missing".into())).contains("I/O error"));
    assert!(format!("{}", Error::Image("bad exr".into())).contains("Image error"));
    assert!(format!("{}", Error::InitializationFailed("twice".into())).contains("Initialization failed"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::NoFrameRendered;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::UnsupportedSampleCount(8));
    assert!(debug.contains("UnsupportedSampleCount"));

    let debug = format!("{:?}", Error::DegenerateLookAt("x".to_string()));
    assert!(debug.contains("DegenerateLookAt"));
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidIntrinsics("fy < 0".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
    assert_ne!(err1, Error::NoFrameRendered);
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "cameras.json not found");
    let err: Error = io.into();
    match err {
        Error::Io(msg) => assert!(msg.contains("cameras.json")),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_image_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "0.exr not found");
    let err: Error = image::ImageError::IoError(io).into();
    match err {
        Error::Image(msg) => assert!(msg.contains("0.exr")),
        other => panic!("unexpected variant: {:?}", other),
    }
}

// ============================================================================
// RESULT TYPE
// ============================================================================

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::NoFrameRendered)
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::NoFrameRendered));
}
