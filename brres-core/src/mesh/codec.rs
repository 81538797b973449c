//! Encode/decode of the indexed GPU draw stream a [`VertexDescriptor`]
//! describes: a sequence of `GX_DRAW_*` commands, each followed by a
//! 16-bit vertex count and, per vertex, one index per attribute the
//! descriptor enables, in attribute slot order, at the width
//! [`VertexDescriptor::encoding`] records for that attribute
//! ([`EncodingType::Index8`] as a byte, [`EncodingType::Index16`] and
//! [`EncodingType::Direct`] as a 16-bit word — this pipeline never needs an
//! attribute value wider than a u16 slot, so `Direct` and `Index16` share a
//! wire width here and differ only in how a consumer is meant to interpret
//! the slot).

use crate::io::{Reader, Writer};

use super::primitive::{GxPrimitiveType, IndexedVertex, MatrixPrimitive, Primitive};
use super::vcd::{EncodingType, VertexDescriptor};
use super::MeshError;

pub fn encode_matrix_primitives(vcd: &VertexDescriptor, mps: &[MatrixPrimitive], writer: &mut Writer) {
    writer.u32(mps.len() as u32);
    for mp in mps {
        writer.u32(mp.current_matrix);
        writer.u32(mp.primitives.len() as u32);
        for prim in &mp.primitives {
            writer.u8(prim.kind.opcode());
            writer.u16(prim.vertices.len() as u16);
            for vertex in &prim.vertices {
                for attr in vcd.enabled_attrs() {
                    match vcd.encoding(attr) {
                        EncodingType::Index8 => writer.u8(vertex[attr.slot()] as u8),
                        _ => writer.u16(vertex[attr.slot()]),
                    }
                }
            }
        }
    }
}

pub fn decode_matrix_primitives(vcd: &VertexDescriptor, reader: &mut Reader) -> Result<Vec<MatrixPrimitive>, MeshError> {
    let mp_count = reader.u32()?;
    let mut out = Vec::with_capacity(mp_count as usize);
    for _ in 0..mp_count {
        let current_matrix = reader.u32()?;
        let prim_count = reader.u32()?;
        let mut primitives = Vec::with_capacity(prim_count as usize);
        for _ in 0..prim_count {
            let opcode = reader.u8()?;
            let kind = GxPrimitiveType::from_opcode(opcode).ok_or(MeshError::UnknownOpcode(opcode))?;
            let vertex_count = reader.u16()?;
            let mut prim = Primitive::new(kind);
            for _ in 0..vertex_count {
                let mut vertex: IndexedVertex = [0; super::vcd::NUM_VERTEX_ATTRIBUTES];
                for attr in vcd.enabled_attrs() {
                    vertex[attr.slot()] = match vcd.encoding(attr) {
                        EncodingType::Index8 => reader.u8()? as u16,
                        _ => reader.u16()?,
                    };
                }
                prim.vertices.push(vertex);
            }
            primitives.push(prim);
        }
        out.push(MatrixPrimitive { current_matrix, primitives });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexAttribute;

    fn sample_vcd() -> VertexDescriptor {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::PositionNormalMatrixIndex);
        vcd.enable(VertexAttribute::Position);
        vcd.enable(VertexAttribute::TexCoord0);
        vcd
    }

    fn iv(pos: u16, uv: u16) -> IndexedVertex {
        let mut v: IndexedVertex = [0; super::super::vcd::NUM_VERTEX_ATTRIBUTES];
        v[VertexAttribute::Position.slot()] = pos;
        v[VertexAttribute::TexCoord0.slot()] = uv;
        v
    }

    #[test]
    fn round_trips_a_strip_and_a_fan() {
        let vcd = sample_vcd();
        let mps = vec![MatrixPrimitive {
            current_matrix: 3,
            primitives: vec![
                Primitive {
                    kind: GxPrimitiveType::TriangleStrip,
                    vertices: vec![iv(0, 0), iv(1, 1), iv(2, 2), iv(3, 3)].into(),
                },
                Primitive {
                    kind: GxPrimitiveType::TriangleFan,
                    vertices: vec![iv(4, 4), iv(5, 5), iv(6, 6)].into(),
                },
            ],
        }];

        let mut writer = Writer::new();
        encode_matrix_primitives(&vcd, &mps, &mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let decoded = decode_matrix_primitives(&vcd, &mut reader).unwrap();
        assert_eq!(decoded, mps);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn index8_attributes_are_packed_one_byte_wide() {
        let mut vcd = sample_vcd();
        vcd.set_encoding(VertexAttribute::TexCoord0, EncodingType::Index8);

        let mps = vec![MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::Triangles,
                vertices: vec![iv(0, 9), iv(1, 200), iv(2, 255)].into(),
            }],
        }];

        let mut writer = Writer::new();
        encode_matrix_primitives(&vcd, &mps, &mut writer);
        let bytes = writer.into_vec();
        // current_matrix (4) + prim_count (4) + opcode (1) + vertex_count (2)
        // + 3 vertices * (2-byte Position + 1-byte TexCoord0) = 11 + 9 = 20.
        assert_eq!(bytes.len(), 20);

        let mut reader = Reader::new(&bytes);
        let decoded = decode_matrix_primitives(&vcd, &mut reader).unwrap();
        assert_eq!(decoded, mps);
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let vcd = sample_vcd();
        let mut writer = Writer::new();
        writer.u32(1);
        writer.u32(0);
        writer.u32(1);
        writer.u8(0xff);
        writer.u16(0);
        let bytes = writer.into_vec();
        let mut reader = Reader::new(&bytes);
        assert!(matches!(decode_matrix_primitives(&vcd, &mut reader), Err(MeshError::UnknownOpcode(0xff))));
    }
}
