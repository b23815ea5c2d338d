//! Vertex builders for the built-in shapes

use crate::render::vertex::{Color, Vertex};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Corners clockwise from the top-left (y pointing down)
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            [self.x, self.y],
            [self.x + self.w, self.y],
            [self.x + self.w, self.y + self.h],
            [self.x, self.y + self.h],
        ]
    }
}

/// Single point
pub fn point(x: f32, y: f32, color: Color) -> [Vertex; 1] {
    [Vertex::solid(x, y, color)]
}

/// Segment between two points
pub fn line(ax: f32, ay: f32, bx: f32, by: f32, color: Color) -> [Vertex; 2] {
    [Vertex::solid(ax, ay, color), Vertex::solid(bx, by, color)]
}

/// Three corners, usable as a filled triangle or a closed outline
pub fn triangle(points: [[f32; 2]; 3], color: Color) -> [Vertex; 3] {
    points.map(|[x, y]| Vertex::solid(x, y, color))
}

/// Two triangles covering `rect`
pub fn rectangle_fill(rect: &Rect, color: Color) -> [Vertex; 6] {
    let [a, b, c, d] = rect.corners();
    [a, b, c, a, c, d].map(|[x, y]| Vertex::solid(x, y, color))
}

/// Four corners of `rect` for a line loop
pub fn rectangle_outline(rect: &Rect, color: Color) -> [Vertex; 4] {
    rect.corners().map(|[x, y]| Vertex::solid(x, y, color))
}

/// Two textured triangles covering `rect` and sampling `uv`
///
/// `uv` is given in normalized texture space with V pointing down the image.
pub fn textured_quad(rect: &Rect, uv: &Rect) -> [Vertex; 6] {
    let [a, b, c, d] = rect.corners();
    let [ta, tb, tc, td] = uv.corners();
    [(a, ta), (b, tb), (c, tc), (a, ta), (c, tc), (d, td)].map(|([x, y], [u, v])| Vertex::textured(x, y, u, v))
}
