//! Headless viewer and the CPU depth rasterizer behind it.

mod headless_viewer;
mod raster;

pub use headless_viewer::{HeadlessViewer, MeshKey};
