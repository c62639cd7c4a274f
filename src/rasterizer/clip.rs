//! Near-plane clipping in homogeneous clip space
//!
//! Only the near plane (clip z = 0) is clipped geometrically. The remaining
//! frustum planes are classified for diagnostics, and geometry outside them
//! is discarded pixel by pixel during scan conversion.

use bitflags::bitflags;
use log::trace;
use super::math::Vec4;
use super::types::Vertex;

bitflags! {
    /// Which clip volume boundaries a clip-space point lies outside of
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Outcode: u8 {
        const NEAR = 1 << 0;
        const FAR = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const BOTTOM = 1 << 4;
        const TOP = 1 << 5;
    }
}

impl Outcode {
    pub fn classify(p: Vec4) -> Self {
        let w = p.w;
        let mut code = Outcode::empty();
        code.set(Outcode::NEAR, p.z < 0.0);
        code.set(Outcode::FAR, p.z > w);
        code.set(Outcode::LEFT, p.x < -w);
        code.set(Outcode::RIGHT, p.x > w);
        code.set(Outcode::BOTTOM, p.y < -w);
        code.set(Outcode::TOP, p.y > w);
        code
    }
}

/// Signed distance to the near plane; >= 0 is inside
#[inline]
fn near_distance(p: Vec4) -> f32 {
    p.z
}

/// Intersection ratio along an edge whose endpoints straddle the plane.
///
/// Panics if the ratio leaves [0, 1]: the endpoints were not on opposite
/// sides.
pub(crate) fn edge_ratio(dist_a: f32, dist_b: f32) -> f32 {
    let t = dist_a / (dist_a - dist_b);
    assert!(
        (0.0..=1.0).contains(&t),
        "clip ratio {} outside [0, 1] (distances {}, {})",
        t,
        dist_a,
        dist_b
    );
    t
}

/// A triangle after near-plane clipping: 0, 3 or 4 vertices
#[derive(Debug, Clone, Copy)]
pub struct ClippedPolygon {
    verts: [Vertex; 4],
    len: usize,
}

impl ClippedPolygon {
    fn new() -> Self {
        Self {
            verts: [Vertex::default(); 4],
            len: 0,
        }
    }

    fn push(&mut self, v: Vertex) {
        assert!(
            self.len < self.verts.len(),
            "clipped polygon exceeds 4 vertices"
        );
        self.verts[self.len] = v;
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.verts[..self.len]
    }

    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.verts[..self.len]
    }

    /// Fan triangulation around the first vertex.
    ///
    /// Fewer than three vertices produce nothing.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        let v = self.vertices();
        (1..v.len().saturating_sub(1)).map(move |i| [v[0], v[i], v[i + 1]])
    }
}

/// Clip one clip-space triangle against the near plane.
///
/// Walks the directed edges a->b, b->c, c->a, emitting each inside vertex
/// and an interpolated vertex wherever an edge crosses the plane, so the
/// output keeps the input winding.
pub fn clip_triangle(a: &Vertex, b: &Vertex, c: &Vertex) -> ClippedPolygon {
    let tri = [a, b, c];
    let mut out = ClippedPolygon::new();

    if log::log_enabled!(log::Level::Trace) {
        let codes: Vec<Outcode> = tri.iter().map(|v| Outcode::classify(v.pos_h)).collect();
        trace!("triangle outcodes: {:?}", codes);
    }

    for i in 0..3 {
        let from = tri[i];
        let to = tri[(i + 1) % 3];
        let d_from = near_distance(from.pos_h);
        let d_to = near_distance(to.pos_h);
        let from_inside = d_from >= 0.0;
        let to_inside = d_to >= 0.0;

        if from_inside {
            out.push(*from);
        }
        if from_inside != to_inside {
            let t = edge_ratio(d_from, d_to);
            out.push(from.lerp(to, t));
        }
    }

    trace!("near clip produced {} vertices", out.len());
    out
}
