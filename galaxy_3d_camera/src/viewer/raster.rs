//! CPU depth rasterizer.
//!
//! Triangles are clipped against the near plane in clip space, projected,
//! and scan-converted with edge functions. Each covered sample receives the
//! screen-space interpolated reverse-Z NDC depth, kept if it passes the
//! GREATER depth test. Both windings are drawn.

use glam::{Mat4, Vec4};
use crate::camera::DepthBuffer;
use crate::geom::Mesh;

/// Sub-pixel sample offsets for the supported sample counts.
pub(crate) fn sample_offsets(sample_count: u32) -> &'static [(f64, f64)] {
    match sample_count {
        2 => &[(0.75, 0.75), (0.25, 0.25)],
        4 => &[(0.375, 0.125), (0.875, 0.375), (0.125, 0.625), (0.625, 0.875)],
        8 => &[
            (0.5625, 0.3125),
            (0.4375, 0.6875),
            (0.8125, 0.5625),
            (0.3125, 0.1875),
            (0.1875, 0.8125),
            (0.0625, 0.4375),
            (0.6875, 0.9375),
            (0.9375, 0.0625),
        ],
        _ => &[(0.5, 0.5)],
    }
}

/// Screen-space vertex: pixel x, pixel y (row 0 at the top), NDC depth.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f64,
    y: f64,
    z: f64,
}

/// Rasterize every triangle of `mesh`. Returns the number of samples written.
pub(crate) fn rasterize_mesh(mesh: &Mesh, view_proj: &Mat4, target: &mut DepthBuffer) -> usize {
    let clip: Vec<Vec4> = mesh
        .positions()
        .iter()
        .map(|p| *view_proj * p.extend(1.0))
        .collect();

    let mut written = 0;
    for tri in mesh.triangles() {
        let corners = [clip[tri[0] as usize], clip[tri[1] as usize], clip[tri[2] as usize]];
        let polygon = clip_near(&corners);
        if polygon.len() < 3 {
            continue;
        }

        let screen: Vec<ScreenVertex> = polygon
            .iter()
            .map(|c| to_screen(*c, target.width(), target.height()))
            .collect();

        for i in 1..screen.len() - 1 {
            written += rasterize_triangle(screen[0], screen[i], screen[i + 1], target);
        }
    }
    written
}

/// Sutherland-Hodgman against the reverse-Z near plane `z <= w`.
fn clip_near(corners: &[Vec4; 3]) -> Vec<Vec4> {
    let inside = |v: &Vec4| v.w - v.z >= 0.0;
    let mut out = Vec::with_capacity(4);

    for i in 0..3 {
        let current = corners[i];
        let next = corners[(i + 1) % 3];
        let d_current = current.w - current.z;
        let d_next = next.w - next.z;

        if inside(&current) {
            out.push(current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            let t = d_current / (d_current - d_next);
            out.push(current.lerp(next, t));
        }
    }
    out
}

fn to_screen(clip: Vec4, width: u32, height: u32) -> ScreenVertex {
    let inv_w = 1.0 / clip.w as f64;
    let ndc_x = clip.x as f64 * inv_w;
    let ndc_y = clip.y as f64 * inv_w;
    ScreenVertex {
        x: (ndc_x * 0.5 + 0.5) * width as f64,
        y: (0.5 - ndc_y * 0.5) * height as f64,
        z: clip.z as f64 * inv_w,
    }
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f64, py: f64) -> f64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn rasterize_triangle(v0: ScreenVertex, v1: ScreenVertex, v2: ScreenVertex, target: &mut DepthBuffer) -> usize {
    let area = edge(&v0, &v1, v2.x, v2.y);
    if area == 0.0 || !area.is_finite() {
        return 0;
    }

    let width = target.width() as i64;
    let height = target.height() as i64;
    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as i64;
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(width - 1);
    let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as i64;
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(height - 1);
    if min_x > max_x || min_y > max_y {
        return 0;
    }

    let offsets = sample_offsets(target.sample_count());
    let mut written = 0;

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            for (sample, (ox, oy)) in offsets.iter().enumerate() {
                let sx = px as f64 + ox;
                let sy = py as f64 + oy;

                // Barycentric weights, normalized so that the sign of `area` cancels
                let w0 = edge(&v1, &v2, sx, sy) / area;
                let w1 = edge(&v2, &v0, sx, sy) / area;
                let w2 = edge(&v0, &v1, sx, sy) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * v0.z + w1 * v1.z + w2 * v2.z;
                if z > 1.0 {
                    continue;
                }
                if target.test_and_set(px as u32, py as u32, sample as u32, z as f32) {
                    written += 1;
                }
            }
        }
    }
    written
}

#[cfg(test)]
#[path = "raster_tests.rs"]
mod tests;
