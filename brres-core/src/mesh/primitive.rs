//! The indexed GPU draw stream: a vertex's 21 per-attribute indices, the
//! primitive types the GX draw opcodes carry, and the matrix-indexed
//! grouping a mesh is built from.

use smallvec::SmallVec;

use super::vcd::NUM_VERTEX_ATTRIBUTES;

/// One vertex's per-attribute indices, in [`VertexAttribute`](super::VertexAttribute)
/// slot order. An attribute the descriptor doesn't carry reads as `0`.
pub type IndexedVertex = [u16; NUM_VERTEX_ATTRIBUTES];

/// The GX primitive opcodes a draw command selects between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GxPrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl GxPrimitiveType {
    /// The hardware draw-command opcode byte (`GX_DRAW_*`), used as the
    /// leading byte of an inline geometry command.
    pub fn opcode(self) -> u8 {
        match self {
            GxPrimitiveType::Quads => 0x80,
            GxPrimitiveType::Triangles => 0x90,
            GxPrimitiveType::TriangleStrip => 0x98,
            GxPrimitiveType::TriangleFan => 0xa0,
            GxPrimitiveType::Lines => 0xa8,
            GxPrimitiveType::LineStrip => 0xb0,
            GxPrimitiveType::Points => 0xb8,
        }
    }

    pub fn from_opcode(op: u8) -> Option<Self> {
        match op {
            0x80 => Some(GxPrimitiveType::Quads),
            0x90 => Some(GxPrimitiveType::Triangles),
            0x98 => Some(GxPrimitiveType::TriangleStrip),
            0xa0 => Some(GxPrimitiveType::TriangleFan),
            0xa8 => Some(GxPrimitiveType::Lines),
            0xb0 => Some(GxPrimitiveType::LineStrip),
            0xb8 => Some(GxPrimitiveType::Points),
            _ => None,
        }
    }
}

/// Most meshes stay under a few dozen vertices per primitive run; inlining
/// that many avoids a heap allocation for the common case.
const INLINE_VERTICES: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: GxPrimitiveType,
    pub vertices: SmallVec<[IndexedVertex; INLINE_VERTICES]>,
}

impl Primitive {
    pub fn new(kind: GxPrimitiveType) -> Self {
        Primitive {
            kind,
            vertices: SmallVec::new(),
        }
    }
}

/// A run of primitives sharing one current matrix binding (the position-
/// normal matrix an unweighted vertex in the run is transformed by).
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPrimitive {
    pub current_matrix: u32,
    pub primitives: Vec<Primitive>,
}
