//! Vertex layout and color types
//!
//! The pipeline has exactly one vertex layout. Draw calls build [`Vertex`]
//! records with 8-bit colors; at flush time they are packed into
//! [`PackedVertex`] with normalized float colors and a flipped V axis.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color {
    /// Opaque white
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Opaque black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque red
    pub const RED: Color = Color::rgb(255, 0, 0);
    /// Opaque green
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    /// Opaque blue
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    /// Fully transparent black; used to mean "not drawn" for outlines and fills
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with alpha
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAARRGGBB` value
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Pack into `0xAARRGGBB`
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Whether the color is fully transparent
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Channels normalized to 0.0..=1.0
    pub fn to_normalized(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

/// Vertex as built by draw calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in view space
    pub position: [f32; 2],
    /// Color, 0-255 per channel
    pub color: Color,
    /// Texture coordinate, V pointing down the image
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// Untextured vertex
    pub const fn solid(x: f32, y: f32, color: Color) -> Self {
        Self {
            position: [x, y],
            color,
            texcoord: [0.0, 0.0],
        }
    }

    /// Textured vertex with white modulation
    pub const fn textured(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            color: Color::WHITE,
            texcoord: [u, v],
        }
    }

    /// Convert into the GPU layout
    pub fn pack(&self) -> PackedVertex {
        PackedVertex {
            position: self.position,
            color: self.color.to_normalized(),
            // Texture rows are stored bottom-up
            texcoord: [self.texcoord[0], 1.0 - self.texcoord[1]],
        }
    }
}

/// Vertex in the layout uploaded to the graphics backend
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PackedVertex {
    /// Position in view space
    pub position: [f32; 2],
    /// Color, 0.0-1.0 per channel
    pub color: [f32; 4],
    /// Texture coordinate in texture space
    pub texcoord: [f32; 2],
}

/// Primitive topology of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Independent points
    Points,
    /// Independent line segments, two vertices each
    Lines,
    /// Closed polyline through every vertex
    LineLoop,
    /// Independent triangles, three vertices each
    Triangles,
}

impl PrimitiveKind {
    /// Whether two consecutive runs of this kind can be drawn as one
    pub const fn is_batchable(self) -> bool {
        !matches!(self, PrimitiveKind::LineLoop)
    }
}

/// Shader program used by a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Vertex color only
    Solid,
    /// Vertex color modulated by the bound texture
    Textured,
}

impl ProgramKind {
    /// Number of programs
    pub const COUNT: usize = 2;

    /// Every program in index order
    pub const ALL: [ProgramKind; Self::COUNT] = [ProgramKind::Solid, ProgramKind::Textured];

    /// Dense index, `0..COUNT`
    pub const fn index(self) -> usize {
        self as usize
    }
}
