//! Indexed triangle meshes

use log::warn;
use crate::rasterizer::{Color, Vec2, Vec4, Vertex};

/// Indexed mesh with one attribute per vertex in each array.
///
/// All attribute arrays must have the same length; triangles index into
/// them. Winding is not used (no culling).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec4>,
    pub normals: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Color>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Flat `width` x `height` plane in z = 0, centered on the origin,
    /// facing +z.
    ///
    /// Corner `i * 2 + j` sits at `((2j - 1) w/2, (2i - 1) h/2)` with uv
    /// `(j, i)` and color `(0.5 + 0.5i, 1 - 0.5j, 0.5)`.
    pub fn plane(width: f32, height: f32) -> Self {
        let mut mesh = Mesh::default();
        for i in 0..2 {
            for j in 0..2 {
                let (fi, fj) = (i as f32, j as f32);
                mesh.positions.push(Vec4::point(
                    (fj * 2.0 - 1.0) * width / 2.0,
                    (fi * 2.0 - 1.0) * height / 2.0,
                    0.0,
                ));
                mesh.normals.push(Vec4::direction(0.0, 0.0, 1.0));
                mesh.uvs.push(Vec2::new(fj, fi));
                mesh.colors.push(Color::new(0.5 + 0.5 * fi, 1.0 - 0.5 * fj, 0.5));
            }
        }
        mesh.triangles = vec![[0, 3, 1], [0, 2, 3]];
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Zip the attribute arrays into pipeline vertices.
    ///
    /// Panics if the arrays differ in length.
    pub fn assemble_vertices(&self) -> Vec<Vertex> {
        let n = self.positions.len();
        assert!(
            self.normals.len() == n && self.uvs.len() == n && self.colors.len() == n,
            "mesh attribute arrays differ in length: {} positions, {} normals, {} uvs, {} colors",
            n,
            self.normals.len(),
            self.uvs.len(),
            self.colors.len()
        );
        if n == 0 {
            warn!("assembling an empty mesh");
        }

        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .zip(&self.colors)
            .map(|(((&p, &n), &uv), &c)| Vertex::new(p, n, uv, c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_corners() {
        let mesh = Mesh::plane(20.0, 10.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.positions[0], Vec4::point(-10.0, -5.0, 0.0));
        assert_eq!(mesh.positions[3], Vec4::point(10.0, 5.0, 0.0));
        assert_eq!(mesh.uvs[1], Vec2::new(1.0, 0.0));
        assert_eq!(mesh.colors[2], Color::new(1.0, 1.0, 0.5));
        assert_eq!(mesh.colors[1], Color::new(0.5, 0.5, 0.5));
        assert_eq!(mesh.triangles, vec![[0, 3, 1], [0, 2, 3]]);
    }

    #[test]
    fn test_assemble_vertices() {
        let mesh = Mesh::plane(2.0, 2.0);
        let verts = mesh.assemble_vertices();
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[3].pos, mesh.positions[3]);
        assert_eq!(verts[3].normal, Vec4::direction(0.0, 0.0, 1.0));
        assert_eq!(verts[3].uv, Vec2::new(1.0, 1.0));
        assert_eq!(verts[3].rhw, 0.0);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn test_unequal_attributes_panic() {
        let mut mesh = Mesh::plane(2.0, 2.0);
        mesh.uvs.pop();
        mesh.assemble_vertices();
    }
}
