//! Blend modes
//!
//! A [`BlendMode`] describes blending symbolically, separately for the color
//! and alpha channels. Backends receive the translated [`ConcreteBlend`],
//! which carries GL enum values and is applied as a single separate-channel
//! blend state change.

use serde::{Deserialize, Serialize};

/// GL enum values used by [`ConcreteBlend`]
pub mod gl {
    /// `GL_ZERO`
    pub const ZERO: u32 = 0;
    /// `GL_ONE`
    pub const ONE: u32 = 1;
    /// `GL_SRC_COLOR`
    pub const SRC_COLOR: u32 = 0x0300;
    /// `GL_ONE_MINUS_SRC_COLOR`
    pub const ONE_MINUS_SRC_COLOR: u32 = 0x0301;
    /// `GL_SRC_ALPHA`
    pub const SRC_ALPHA: u32 = 0x0302;
    /// `GL_ONE_MINUS_SRC_ALPHA`
    pub const ONE_MINUS_SRC_ALPHA: u32 = 0x0303;
    /// `GL_DST_ALPHA`
    pub const DST_ALPHA: u32 = 0x0304;
    /// `GL_ONE_MINUS_DST_ALPHA`
    pub const ONE_MINUS_DST_ALPHA: u32 = 0x0305;
    /// `GL_DST_COLOR`
    pub const DST_COLOR: u32 = 0x0306;
    /// `GL_ONE_MINUS_DST_COLOR`
    pub const ONE_MINUS_DST_COLOR: u32 = 0x0307;
    /// `GL_FUNC_ADD`
    pub const FUNC_ADD: u32 = 0x8006;
    /// `GL_FUNC_SUBTRACT`
    pub const FUNC_SUBTRACT: u32 = 0x800A;
    /// `GL_FUNC_REVERSE_SUBTRACT`
    pub const FUNC_REVERSE_SUBTRACT: u32 = 0x800B;
}

/// Symbolic blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// Source color
    SrcColor,
    /// 1 - source color
    OneMinusSrcColor,
    /// Destination color
    DstColor,
    /// 1 - destination color
    OneMinusDstColor,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
}

impl BlendFactor {
    /// GL enum value
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Zero => gl::ZERO,
            Self::One => gl::ONE,
            Self::SrcColor => gl::SRC_COLOR,
            Self::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
            Self::DstColor => gl::DST_COLOR,
            Self::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
            Self::SrcAlpha => gl::SRC_ALPHA,
            Self::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            Self::DstAlpha => gl::DST_ALPHA,
            Self::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        }
    }

    /// Symbolic factor for a GL enum value
    pub const fn from_gl(value: u32) -> Option<Self> {
        Some(match value {
            gl::ZERO => Self::Zero,
            gl::ONE => Self::One,
            gl::SRC_COLOR => Self::SrcColor,
            gl::ONE_MINUS_SRC_COLOR => Self::OneMinusSrcColor,
            gl::DST_COLOR => Self::DstColor,
            gl::ONE_MINUS_DST_COLOR => Self::OneMinusDstColor,
            gl::SRC_ALPHA => Self::SrcAlpha,
            gl::ONE_MINUS_SRC_ALPHA => Self::OneMinusSrcAlpha,
            gl::DST_ALPHA => Self::DstAlpha,
            gl::ONE_MINUS_DST_ALPHA => Self::OneMinusDstAlpha,
            _ => return None,
        })
    }
}

/// Symbolic combine equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendEquation {
    /// `src * sf + dst * df`
    Add,
    /// `src * sf - dst * df`
    Subtract,
    /// `dst * df - src * sf`
    ReverseSubtract,
}

impl BlendEquation {
    /// GL enum value
    pub const fn to_gl(self) -> u32 {
        match self {
            Self::Add => gl::FUNC_ADD,
            Self::Subtract => gl::FUNC_SUBTRACT,
            Self::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        }
    }

    /// Symbolic equation for a GL enum value
    pub const fn from_gl(value: u32) -> Option<Self> {
        Some(match value {
            gl::FUNC_ADD => Self::Add,
            gl::FUNC_SUBTRACT => Self::Subtract,
            gl::FUNC_REVERSE_SUBTRACT => Self::ReverseSubtract,
            _ => return None,
        })
    }
}

/// Abstract blend mode, color and alpha described independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendMode {
    /// Source factor for RGB
    pub color_src: BlendFactor,
    /// Destination factor for RGB
    pub color_dst: BlendFactor,
    /// Equation for RGB
    pub color_eq: BlendEquation,
    /// Source factor for alpha
    pub alpha_src: BlendFactor,
    /// Destination factor for alpha
    pub alpha_dst: BlendFactor,
    /// Equation for alpha
    pub alpha_eq: BlendEquation,
}

impl BlendMode {
    /// Standard "over" alpha blending
    pub const ALPHA: BlendMode = BlendMode::separate(
        (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha, BlendEquation::Add),
        (BlendFactor::One, BlendFactor::OneMinusSrcAlpha, BlendEquation::Add),
    );

    /// Additive blending weighted by source alpha
    pub const ADD: BlendMode = BlendMode::separate(
        (BlendFactor::SrcAlpha, BlendFactor::One, BlendEquation::Add),
        (BlendFactor::Zero, BlendFactor::One, BlendEquation::Add),
    );

    /// Multiply source and destination
    pub const MULTIPLY: BlendMode = BlendMode::separate(
        (BlendFactor::DstColor, BlendFactor::Zero, BlendEquation::Add),
        (BlendFactor::DstAlpha, BlendFactor::Zero, BlendEquation::Add),
    );

    /// Replace the destination
    pub const NONE: BlendMode = BlendMode::uniform(BlendFactor::One, BlendFactor::Zero, BlendEquation::Add);

    /// Same factors and equation for color and alpha
    pub const fn uniform(src: BlendFactor, dst: BlendFactor, eq: BlendEquation) -> Self {
        Self::separate((src, dst, eq), (src, dst, eq))
    }

    /// Separate `(src, dst, equation)` for color and alpha
    pub const fn separate(
        color: (BlendFactor, BlendFactor, BlendEquation),
        alpha: (BlendFactor, BlendFactor, BlendEquation),
    ) -> Self {
        Self {
            color_src: color.0,
            color_dst: color.1,
            color_eq: color.2,
            alpha_src: alpha.0,
            alpha_dst: alpha.1,
            alpha_eq: alpha.2,
        }
    }

    /// Translate into backend blend state
    pub const fn to_concrete(&self) -> ConcreteBlend {
        ConcreteBlend {
            color: BlendTriple {
                src: self.color_src.to_gl(),
                dst: self.color_dst.to_gl(),
                equation: self.color_eq.to_gl(),
            },
            alpha: BlendTriple {
                src: self.alpha_src.to_gl(),
                dst: self.alpha_dst.to_gl(),
                equation: self.alpha_eq.to_gl(),
            },
        }
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::ALPHA
    }
}

/// One channel group of concrete blend state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendTriple {
    /// Source factor (GL enum)
    pub src: u32,
    /// Destination factor (GL enum)
    pub dst: u32,
    /// Equation (GL enum)
    pub equation: u32,
}

/// Separate-channel blend state as applied by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConcreteBlend {
    /// RGB channels
    pub color: BlendTriple,
    /// Alpha channel
    pub alpha: BlendTriple,
}
