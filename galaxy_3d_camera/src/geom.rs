//! Triangle meshes for the headless viewer.
//!
//! Meshes are plain world-space vertex positions plus triangle indices.
//! Builders cover the simple primitives and Wavefront OBJ files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use glam::{Mat4, Quat, Vec3};
use crate::error::{Error, Result};
use crate::camera_info;

const SOURCE: &str = "galaxy3d::Geom";

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    /// Smallest box containing all points. `None` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Test if a point lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Ray/box slab test. Returns the entry parameter `t >= 0` of the ray
    /// `origin + t * dir`, or `None` if the ray misses.
    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let inv = dir.recip();
        let t0 = (self.min - origin) * inv;
        let t1 = (self.max - origin) * inv;
        let t_min = t0.min(t1).max_element();
        let t_max = t0.max(t1).min_element();
        if t_max < t_min.max(0.0) {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Indexed triangle mesh in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    aabb: AABB,
}

impl Mesh {
    /// # Errors
    ///
    /// `InvalidMesh` when there are no vertices, a position is not finite,
    /// or a triangle references a missing vertex.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let aabb = AABB::from_points(&positions)
            .ok_or_else(|| Error::InvalidMesh("mesh has no vertices".to_string()))?;

        if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidMesh(format!("vertex {} is not finite", i)));
        }

        let count = positions.len() as u32;
        if let Some((i, tri)) = triangles.iter().enumerate().find(|(_, t)| t.iter().any(|&idx| idx >= count)) {
            return Err(Error::InvalidMesh(format!(
                "triangle {} references {:?} but the mesh has {} vertices",
                i, tri, count
            )));
        }

        Ok(Self { positions, triangles, aabb })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Triangle corners in world space.
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [self.positions[a as usize], self.positions[b as usize], self.positions[c as usize]]
    }

    /// Copy of the mesh with every vertex transformed by `model`.
    pub fn transformed(&self, model: &Mat4) -> Result<Mesh> {
        let positions = self.positions.iter().map(|p| model.transform_point3(*p)).collect();
        Mesh::new(positions, self.triangles.clone())
    }
}

/// Axis-aligned box centred at `center`.
pub fn build_box(center: Vec3, half_extents: Vec3) -> Result<Mesh> {
    let corners = [
        // back face (z = -1)
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        // front face (z = +1)
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    let positions = corners.iter().map(|c| center + *c * half_extents).collect();

    // 2 triangles per face, 6 faces
    let triangles = vec![
        [2, 1, 0], [2, 0, 3],
        [4, 5, 6], [7, 4, 6],
        [5, 0, 1], [4, 0, 5],
        [7, 6, 3], [3, 6, 2],
        [3, 0, 4], [3, 4, 7],
        [6, 5, 1], [6, 1, 2],
    ];
    Mesh::new(positions, triangles)
}

/// Cube spanning `center ± 1` on every axis.
pub fn build_cube(center: Vec3) -> Result<Mesh> {
    build_box(center, Vec3::ONE)
}

/// Rectangle of half-size `size_x` x `size_y` through `center`, facing `normal`.
pub fn build_plane(center: Vec3, normal: Vec3, size_x: f32, size_y: f32) -> Result<Mesh> {
    if normal.length_squared() == 0.0 || !normal.is_finite() {
        return Err(Error::InvalidMesh(format!("plane normal {:?} is not usable", normal)));
    }
    let rotation = Quat::from_rotation_arc(Vec3::Y, normal.normalize());
    let positions = [
        Vec3::new(-size_x, 0.0, -size_y),
        Vec3::new(size_x, 0.0, -size_y),
        Vec3::new(size_x, 0.0, size_y),
        Vec3::new(-size_x, 0.0, size_y),
    ]
    .iter()
    .map(|v| center + rotation * *v)
    .collect();

    Mesh::new(positions, vec![[2, 1, 0], [3, 2, 0]])
}

/// Floor plane: 2x2 square at y = 0.
pub fn build_floor() -> Result<Mesh> {
    build_plane(Vec3::ZERO, Vec3::Y, 1.0, 1.0)
}

/// Load a mesh from a file. Only Wavefront OBJ is supported.
pub fn build_from_file<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let is_obj = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("obj"));
    if !is_obj {
        return Err(Error::InvalidMesh(format!("unsupported mesh file {:?}", path)));
    }

    let file = File::open(path)?;
    let mesh = build_from_obj_buf(BufReader::new(file))?;
    camera_info!(
        SOURCE,
        "loaded {:?}: {} vertices, {} triangles",
        path,
        mesh.positions().len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse OBJ data. Polygons with more than three corners are fan-triangulated.
pub fn build_from_obj_buf<R: Read>(reader: R) -> Result<Mesh> {
    let data = obj::ObjData::load_buf(reader)
        .map_err(|e| Error::InvalidMesh(format!("OBJ parse error: {:?}", e)))?;

    let positions: Vec<Vec3> = data.position.iter().map(|p| Vec3::from_array(*p)).collect();

    let mut triangles = Vec::new();
    for object in &data.objects {
        for group in &object.groups {
            for poly in &group.polys {
                let corners = &poly.0;
                for i in 1..corners.len().saturating_sub(1) {
                    triangles.push([
                        corners[0].0 as u32,
                        corners[i].0 as u32,
                        corners[i + 1].0 as u32,
                    ]);
                }
            }
        }
    }

    Mesh::new(positions, triangles)
}

#[cfg(test)]
#[path = "geom_tests.rs"]
mod tests;
