/*!
# Galaxy 3D Camera

Camera model and headless depth viewer of the Galaxy 3D engine.

A camera is configured either from a position / look-at pair or from an
OpenCV-style extrinsics matrix, with a field-of-view or pinhole-intrinsics
projection. The headless viewer rasterizes triangle meshes on the CPU into a
reverse-Z depth buffer that can be read back as metric depth.

## Architecture

- **Camera**: pose (`PosLookat`), projection, resolution, derived matrices
- **Depth**: reverse-Z buffers and linearization to metric depth
- **HeadlessViewer**: named meshes, frame timing, depth rendering
- **Reference**: JSON camera records and depth-map comparison
- **Config**: TOML configuration (log level, resolution, sample count, camera)
- **Engine**: process-wide logging state, initialized once at startup
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod config;
pub mod geom;
pub mod reference;
pub mod viewer;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Most used types at the namespace root
    pub use crate::camera::{Camera, DepthBuffer, DepthImage, Intrinsics, PosLookat};
    pub use crate::config::Config;
    pub use crate::viewer::HeadlessViewer;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, LogLevel, DefaultLogger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod geom {
        pub use crate::geom::*;
    }

    pub mod reference {
        pub use crate::reference::*;
    }

    pub mod viewer {
        pub use crate::viewer::*;
    }

    pub use glam;
}

// Re-export math library at crate root
pub use glam;
