//! Per-pixel frame buffers
//!
//! Separate buffers for hit flags, depth, packed color and attribute cells,
//! each addressed by (x, y) with bounds-checked access.

use std::ops::{Index, IndexMut};
use super::types::FragmentCell;

/// Depth value a cleared buffer holds; lower depth wins
pub const FAR_DEPTH: f32 = 1.0;

/// Row-major 2D buffer of per-pixel values
#[derive(Debug, Clone)]
pub struct PixelBuffer<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> PixelBuffer<T> {
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Reset every pixel
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> PixelBuffer<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.offset(x, y).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        self.offset(x, y).map(move |i| &mut self.data[i])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// One row of pixels
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {} out of bounds (height {})", y, self.height);
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

impl<T> Index<(usize, usize)> for PixelBuffer<T> {
    type Output = T;
    fn index(&self, (x, y): (usize, usize)) -> &T {
        match self.offset(x, y) {
            Some(i) => &self.data[i],
            None => panic!("pixel ({}, {}) out of bounds ({}x{})", x, y, self.width, self.height),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for PixelBuffer<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let (w, h) = (self.width, self.height);
        match self.offset(x, y) {
            Some(i) => &mut self.data[i],
            None => panic!("pixel ({}, {}) out of bounds ({}x{})", x, y, w, h),
        }
    }
}

/// The frame-scoped buffers the rasterizer writes.
///
/// Contents from one frame are invalid in the next until `clear` runs.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub width: usize,
    pub height: usize,
    /// 1 where rasterization wrote this frame
    pub hit: PixelBuffer<u8>,
    pub depth: PixelBuffer<f32>,
    /// Packed 0x00BBGGRR output
    pub color: PixelBuffer<u32>,
    pub cells: PixelBuffer<FragmentCell>,
}

impl FrameBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            hit: PixelBuffer::new(width, height, 0),
            depth: PixelBuffer::new(width, height, FAR_DEPTH),
            color: PixelBuffer::new(width, height, 0),
            cells: PixelBuffer::new(width, height, FragmentCell::default()),
        }
    }

    /// Per-frame reset: hit 0, depth far, color 0, cells empty
    pub fn clear(&mut self) {
        self.hit.fill(0);
        self.depth.fill(FAR_DEPTH);
        self.color.fill(0);
        self.cells.fill(FragmentCell::default());
    }

    /// Depth test at (x, y). On a win, records depth and the hit flag and
    /// returns the cell to fill in.
    #[inline]
    pub fn test_and_set_depth(&mut self, x: usize, y: usize, z: f32) -> Option<&mut FragmentCell> {
        let depth = self.depth.get_mut(x, y)?;
        if z < *depth {
            *depth = z;
            self.hit[(x, y)] = 1;
            self.cells.get_mut(x, y)
        } else {
            None
        }
    }

    pub fn hit_count(&self) -> usize {
        self.hit.as_slice().iter().filter(|&&h| h != 0).count()
    }
}
