//! Mesh codec (C8): the vertex descriptor, the indexed GPU primitive
//! stream it describes, and the `propagate` operation that resolves an
//! indexed mesh against shared model buffers into fully-unpacked vertices.

mod codec;
mod primitive;
mod propagate;
mod vcd;

use thiserror::Error;

pub use codec::{decode_matrix_primitives, encode_matrix_primitives};
pub use primitive::{GxPrimitiveType, IndexedVertex, MatrixPrimitive, Primitive};
pub use propagate::{ModelBuffers, UnpackedVertex, VertexSink};
pub use vcd::{EncodingType, VertexAttribute, VertexDescriptor, NUM_VERTEX_ATTRIBUTES};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no vertex attributes besides the position-normal-matrix-index, and is degenerate")]
    DegenerateMesh,

    #[error("{attr:?} index {index} is out of bounds for a buffer of {len} element(s)")]
    IndexOutOfBounds {
        attr: VertexAttribute,
        index: u16,
        len: usize,
    },

    #[error("unrecognized GX draw opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error(transparent)]
    Reader(#[from] crate::io::ReaderError),
}
