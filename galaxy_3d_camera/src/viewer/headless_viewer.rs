//! Off-screen viewer: a camera, a set of named meshes and the depth buffer
//! of the last rendered frame.

use std::time::Instant;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::camera::{Camera, DepthBuffer, DepthImage};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geom::Mesh;
use crate::{camera_debug, camera_info, camera_trace};
use super::raster::rasterize_mesh;

const SOURCE: &str = "galaxy3d::HeadlessViewer";

new_key_type! {
    /// Stable handle to a mesh inside a `HeadlessViewer`.
    pub struct MeshKey;
}

/// Renders depth for its meshes as seen from its camera.
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_camera::galaxy3d::{config::Config, geom, glam::Vec3, viewer::HeadlessViewer};
///
/// let mut config = Config::default();
/// config.render.msaa_nr_samples = 1;
///
/// let mut viewer = HeadlessViewer::new(2048, 2048, config)?;
/// viewer.insert_mesh("cube", geom::build_cube(Vec3::ZERO)?);
/// viewer.get_camera_mut().set_position(Vec3::new(0.0, 3.0, 4.0))?;
/// viewer.render_next_frame()?;
/// let depth = viewer.get_linearised_depth()?;
/// # Ok::<(), galaxy_3d_camera::galaxy3d::Error>(())
/// ```
pub struct HeadlessViewer {
    config: Config,
    camera: Camera,
    meshes: SlotMap<MeshKey, Mesh>,
    mesh_names: FxHashMap<String, MeshKey>,
    depth: Option<DepthBuffer>,
    last_frame: Option<Instant>,
    frame_count: u64,
}

impl HeadlessViewer {
    /// Viewer rendering at `width` x `height`. The initial camera comes from
    /// `config.scene.cam`; the resolution arguments take precedence over
    /// `config.render`.
    pub fn new(width: u32, height: u32, config: Config) -> Result<Self> {
        config.validate()?;

        let cam_config = &config.scene.cam;
        let mut camera = Camera::with_resolution(width, height)?;
        camera.set_position_lookat(cam_config.position, cam_config.lookat)?;
        camera.set_near_far(cam_config.near, cam_config.far)?;
        camera.set_fovy(cam_config.fovy)?;

        camera_info!(
            SOURCE,
            "headless viewer {}x{}, {} sample(s) per pixel",
            width, height, config.render.msaa_nr_samples
        );

        Ok(Self {
            config,
            camera,
            meshes: SlotMap::with_key(),
            mesh_names: FxHashMap::default(),
            depth: None,
            last_frame: None,
            frame_count: 0,
        })
    }

    /// Viewer at the resolution given by `config.render`.
    pub fn from_config(config: Config) -> Result<Self> {
        let (width, height) = (config.render.width, config.render.height);
        Self::new(width, height, config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_camera(&self) -> &Camera {
        &self.camera
    }

    pub fn get_camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Samples per pixel of the depth buffer.
    pub fn sample_count(&self) -> u32 {
        self.config.render.msaa_nr_samples
    }

    // ===== MESHES =====

    /// Add a mesh under `name`, replacing any mesh already using that name.
    pub fn insert_mesh(&mut self, name: &str, mesh: Mesh) -> MeshKey {
        if let Some(&key) = self.mesh_names.get(name) {
            if let Some(slot) = self.meshes.get_mut(key) {
                *slot = mesh;
                return key;
            }
        }
        let key = self.meshes.insert(mesh);
        self.mesh_names.insert(name.to_string(), key);
        key
    }

    pub fn remove_mesh(&mut self, name: &str) -> Option<Mesh> {
        let key = self.mesh_names.remove(name)?;
        self.meshes.remove(key)
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.mesh_names.get(name).and_then(|&key| self.meshes.get(key))
    }

    pub fn mesh_by_key(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    // ===== FRAMES =====

    /// Mark the start of a frame. Returns seconds since the previous call
    /// (0 on the first call).
    pub fn start_frame(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(0.0, |previous| now.duration_since(previous).as_secs_f32());
        self.last_frame = Some(now);
        dt
    }

    /// Rasterize all meshes into a fresh depth buffer.
    pub fn render_next_frame(&mut self) -> Result<()> {
        self.camera.pose().validate()?;

        let view_proj = self.camera.view_projection_matrix();
        let frustum = self.camera.frustum();
        let mut buffer = self.camera.create_depth_buffer(self.sample_count());

        let mut drawn = 0;
        let mut written = 0;
        for (_, mesh) in &self.meshes {
            if !frustum.intersects_aabb(mesh.aabb()) {
                continue;
            }
            written += rasterize_mesh(mesh, &view_proj, &mut buffer);
            drawn += 1;
        }

        self.frame_count += 1;
        camera_trace!(
            SOURCE,
            "frame {}: {}/{} meshes drawn, {} samples written",
            self.frame_count, drawn, self.meshes.len(), written
        );

        self.depth = Some(buffer);
        Ok(())
    }

    /// Same as `render_next_frame`.
    pub fn update(&mut self) -> Result<()> {
        self.render_next_frame()
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Raw reverse-Z depth of the last rendered frame.
    pub fn get_final_depth(&self) -> Option<&DepthBuffer> {
        self.depth.as_ref()
    }

    /// Metric depth of the last rendered frame.
    ///
    /// # Errors
    ///
    /// `UnsupportedSampleCount` when the viewer renders with more than one
    /// sample per pixel (checked first), `NoFrameRendered` before the first
    /// `render_next_frame`.
    pub fn get_linearised_depth(&self) -> Result<DepthImage> {
        self.camera.validate_depth_readback(self.sample_count())?;
        let buffer = self.depth.as_ref().ok_or(Error::NoFrameRendered)?;

        // Clip planes of the frame, not of the camera's current state
        let (near, far) = buffer.near_far();
        let image = buffer.depth_linearize(near, far)?;
        camera_debug!(
            SOURCE,
            "linearised depth {}x{}, max {:?}",
            image.width(), image.height(), image.max_finite()
        );
        Ok(image)
    }
}

#[cfg(test)]
#[path = "headless_viewer_tests.rs"]
mod tests;
