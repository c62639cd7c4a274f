//! Triangle scan conversion
//!
//! A screen-space triangle is sorted by y and split into at most two
//! y-monotonic trapezoids (flat top / flat bottom). Each trapezoid is walked
//! one integer scanline at a time; each span steps the rhw-premultiplied
//! attributes linearly in x, depth tests every pixel, and records the
//! perspective-corrected attributes of the winners.
//!
//! Input vertices must already be homogenized (`pos_h` in screen space,
//! `rhw` set) and have their attributes premultiplied by rhw.

use super::buffer::FrameBuffers;
use super::types::{FragmentCell, Vertex};

/// Two edges sharing a vertical extent `[top, bottom)`
#[derive(Debug, Clone, Copy)]
pub struct Trapezoid {
    /// Left edge, top to bottom
    pub left: (Vertex, Vertex),
    /// Right edge, top to bottom
    pub right: (Vertex, Vertex),
    pub top: f32,
    pub bottom: f32,
}

/// One horizontal run of pixels
#[derive(Debug, Clone, Copy)]
struct Span {
    /// Attributes at the first pixel
    start: Vertex,
    /// Per-pixel attribute delta
    step: Vertex,
    x: usize,
    y: usize,
    width: usize,
}

/// Sort by ascending y, exact-y ties by ascending x
fn sort_vertices(v1: &Vertex, v2: &Vertex, v3: &Vertex) -> [Vertex; 3] {
    let mut v = [*v1, *v2, *v3];
    v.sort_by(|a, b| {
        a.pos_h
            .y
            .total_cmp(&b.pos_h.y)
            .then(a.pos_h.x.total_cmp(&b.pos_h.x))
    });
    v
}

/// Split a triangle into one or two trapezoids.
///
/// Degenerate triangles with no vertical extent produce none.
pub fn split_trapezoids(v1: &Vertex, v2: &Vertex, v3: &Vertex) -> Vec<Trapezoid> {
    let [top, mid, bottom] = sort_vertices(v1, v2, v3);
    let (y_top, y_mid, y_bottom) = (top.pos_h.y, mid.pos_h.y, bottom.pos_h.y);

    if y_top == y_bottom {
        return Vec::new();
    }

    if y_top == y_mid {
        // Flat top: ties were ordered by x, so `top` is the left vertex
        return vec![Trapezoid {
            left: (top, bottom),
            right: (mid, bottom),
            top: y_top,
            bottom: y_bottom,
        }];
    }

    if y_mid == y_bottom {
        return vec![Trapezoid {
            left: (top, mid),
            right: (top, bottom),
            top: y_top,
            bottom: y_bottom,
        }];
    }

    // Point on the long edge at the middle vertex's height
    let ratio = (y_mid - y_top) / (y_bottom - y_top);
    let split = top.lerp(&bottom, ratio);
    let (left_mid, right_mid) = if mid.pos_h.x > split.pos_h.x {
        (split, mid)
    } else {
        (mid, split)
    };

    vec![
        Trapezoid {
            left: (top, left_mid),
            right: (top, right_mid),
            top: y_top,
            bottom: y_mid,
        },
        Trapezoid {
            left: (left_mid, bottom),
            right: (right_mid, bottom),
            top: y_mid,
            bottom: y_bottom,
        },
    ]
}

/// Edge endpoints interpolated at scanline `y` of the trapezoid
fn edge_at(edge: &(Vertex, Vertex), top: f32, bottom: f32, y: f32) -> Vertex {
    let (a, b) = edge;
    let (ya, yb) = (a.pos_h.y, b.pos_h.y);
    let t = if yb != ya { (y - ya) / (yb - ya) } else { (y - top) / (bottom - top) };
    a.lerp(b, t)
}

impl Trapezoid {
    /// Scan this trapezoid into `frame`, returning the number of pixels
    /// that passed the depth test.
    ///
    /// Rows and columns are clamped to the frame while still in float, so
    /// geometry arbitrarily far off-screen is skipped without overflow.
    pub fn draw(&self, frame: &mut FrameBuffers) -> usize {
        let y_start = self.top.ceil().max(0.0);
        let y_end = self.bottom.min(frame.height as f32);
        if y_start >= y_end {
            return 0;
        }

        let mut written = 0;
        let mut y = y_start as usize;
        while (y as f32) < y_end {
            let yf = y as f32;
            let l = edge_at(&self.left, self.top, self.bottom, yf);
            let r = edge_at(&self.right, self.top, self.bottom, yf);
            if let Some(span) = Span::between(&l, &r, y, frame.width) {
                written += span.draw(frame);
            }
            y += 1;
        }
        written
    }
}

impl Span {
    /// Span from `l` to `r` on row `y`, clipped to `[0, frame_width)`
    fn between(l: &Vertex, r: &Vertex, y: usize, frame_width: usize) -> Option<Span> {
        let max_x = frame_width as f32;
        let x0 = l.pos_h.x.ceil().max(0.0).min(max_x);
        let x1 = r.pos_h.x.ceil().min(max_x).max(x0);
        if x1 <= x0 {
            return None;
        }
        let step = Vertex::step(l, r);
        let start = *l + step * (x0 - l.pos_h.x);
        Some(Span {
            start,
            step,
            x: x0 as usize,
            y,
            width: (x1 - x0) as usize,
        })
    }

    fn draw(&self, frame: &mut FrameBuffers) -> usize {
        let mut v = self.start;
        let mut written = 0;
        for x in self.x..self.x + self.width {
            if let Some(cell) = frame.test_and_set_depth(x, self.y, v.pos_h.z) {
                *cell = FragmentCell::from_interpolated(&v);
                written += 1;
            }
            v = v + self.step;
        }
        written
    }
}

/// Rasterize one screen-space triangle into `frame`.
///
/// Returns the number of pixels that passed the depth test.
pub fn draw_triangle(frame: &mut FrameBuffers, v1: &Vertex, v2: &Vertex, v3: &Vertex) -> usize {
    split_trapezoids(v1, v2, v3)
        .iter()
        .map(|t| t.draw(frame))
        .sum()
}
