//! `propagate`: walks a mesh's indexed GPU draw stream and resolves each
//! vertex's per-attribute indices against the shared model-level buffers,
//! re-triangulating strips and fans on the way out.

use super::primitive::{GxPrimitiveType, IndexedVertex, MatrixPrimitive};
use super::vcd::{VertexAttribute, VertexDescriptor};
use super::MeshError;

/// The model-level attribute buffers a mesh's per-vertex indices are
/// resolved against. Borrowed, not owned: a model shares one copy of each
/// buffer across every mesh that indexes into it.
pub struct ModelBuffers<'a> {
    pub positions: &'a [[f32; 3]],
    pub normals: &'a [[f32; 3]],
    pub colors: [&'a [[u8; 4]]; 2],
    pub uvs: [&'a [[f32; 2]]; 8],
}

/// A fully-resolved vertex: every attribute the descriptor carries, looked
/// up from [`ModelBuffers`]. Fields the mesh's descriptor doesn't enable
/// are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnpackedVertex {
    pub position_normal_matrix_index: u16,
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub colors: [Option<[u8; 4]>; 2],
    pub uvs: [Option<[f32; 2]>; 8],
}

/// Receives the triangles `propagate` re-triangulates a primitive run
/// into, one already-unpacked vertex triple at a time.
pub trait VertexSink {
    fn push_triangle(&mut self, a: UnpackedVertex, b: UnpackedVertex, c: UnpackedVertex);
}

fn lookup<'a, T>(buf: &'a [T], attr: VertexAttribute, index: u16) -> Result<&'a T, MeshError> {
    buf.get(index as usize).ok_or(MeshError::IndexOutOfBounds {
        attr,
        index,
        len: buf.len(),
    })
}

fn resolve_vertex(
    iv: &IndexedVertex,
    vcd: &VertexDescriptor,
    buffers: &ModelBuffers,
) -> Result<UnpackedVertex, MeshError> {
    let position = if vcd.has(VertexAttribute::Position) {
        *lookup(buffers.positions, VertexAttribute::Position, iv[VertexAttribute::Position.slot()])?
    } else {
        [0.0, 0.0, 0.0]
    };

    let normal = if vcd.has(VertexAttribute::Normal) {
        Some(*lookup(buffers.normals, VertexAttribute::Normal, iv[VertexAttribute::Normal.slot()])?)
    } else {
        None
    };

    let mut colors = [None, None];
    for (i, attr) in [VertexAttribute::Color0, VertexAttribute::Color1].into_iter().enumerate() {
        if vcd.has(attr) {
            colors[i] = Some(*lookup(buffers.colors[i], attr, iv[attr.slot()])?);
        }
    }

    let mut uvs = [None; 8];
    let tex_coord_attrs = [
        VertexAttribute::TexCoord0,
        VertexAttribute::TexCoord1,
        VertexAttribute::TexCoord2,
        VertexAttribute::TexCoord3,
        VertexAttribute::TexCoord4,
        VertexAttribute::TexCoord5,
        VertexAttribute::TexCoord6,
        VertexAttribute::TexCoord7,
    ];
    for (i, attr) in tex_coord_attrs.into_iter().enumerate() {
        if vcd.has(attr) {
            uvs[i] = Some(*lookup(buffers.uvs[i], attr, iv[attr.slot()])?);
        }
    }

    Ok(UnpackedVertex {
        position_normal_matrix_index: iv[VertexAttribute::PositionNormalMatrixIndex.slot()],
        position,
        normal,
        colors,
        uvs,
    })
}

/// Resolves every primitive in `mp` against `buffers` and pushes each
/// resulting triangle into `sink`. Triangle strips use the standard
/// strip-walk rule (odd `v`: `(v-1, v-2, v)`; even: `(v-2, v-1, v)`); fans
/// use `(0, v-1, v)`. Point/line primitives carry no faces and are
/// skipped.
pub fn propagate(
    mp: &MatrixPrimitive,
    vcd: &VertexDescriptor,
    buffers: &ModelBuffers,
    sink: &mut dyn VertexSink,
) -> Result<(), MeshError> {
    if vcd.is_degenerate() {
        return Err(MeshError::DegenerateMesh);
    }

    for prim in &mp.primitives {
        let verts = &prim.vertices;
        let mut emit = |a: usize, b: usize, c: usize| -> Result<(), MeshError> {
            let ua = resolve_vertex(&verts[a], vcd, buffers)?;
            let ub = resolve_vertex(&verts[b], vcd, buffers)?;
            let uc = resolve_vertex(&verts[c], vcd, buffers)?;
            sink.push_triangle(ua, ub, uc);
            Ok(())
        };

        match prim.kind {
            GxPrimitiveType::Triangles => {
                for tri in 0..verts.len() / 3 {
                    emit(tri * 3, tri * 3 + 1, tri * 3 + 2)?;
                }
            }
            GxPrimitiveType::TriangleStrip => {
                for v in 2..verts.len() {
                    if v % 2 == 1 {
                        emit(v - 1, v - 2, v)?;
                    } else {
                        emit(v - 2, v - 1, v)?;
                    }
                }
            }
            GxPrimitiveType::TriangleFan => {
                for v in 2..verts.len() {
                    emit(0, v - 1, v)?;
                }
            }
            GxPrimitiveType::Quads => {
                for quad in 0..verts.len() / 4 {
                    let base = quad * 4;
                    emit(base, base + 1, base + 2)?;
                    emit(base, base + 2, base + 3)?;
                }
            }
            GxPrimitiveType::Points | GxPrimitiveType::Lines | GxPrimitiveType::LineStrip => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{GxPrimitiveType, Primitive};

    struct CollectingSink {
        triangles: Vec<(UnpackedVertex, UnpackedVertex, UnpackedVertex)>,
    }

    impl VertexSink for CollectingSink {
        fn push_triangle(&mut self, a: UnpackedVertex, b: UnpackedVertex, c: UnpackedVertex) {
            self.triangles.push((a, b, c));
        }
    }

    fn iv(pos_idx: u16) -> IndexedVertex {
        let mut v: IndexedVertex = [0; super::super::vcd::NUM_VERTEX_ATTRIBUTES];
        v[VertexAttribute::Position.slot()] = pos_idx;
        v
    }

    #[test]
    fn strip_re_triangulates_with_alternating_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        let buffers = ModelBuffers {
            positions: &positions,
            normals: &[],
            colors: [&[], &[]],
            uvs: [&[], &[], &[], &[], &[], &[], &[], &[]],
        };
        let mp = MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::TriangleStrip,
                vertices: (0..4u16).map(iv).collect(),
            }],
        };
        let mut sink = CollectingSink { triangles: Vec::new() };
        propagate(&mp, &vcd, &buffers, &mut sink).unwrap();
        assert_eq!(sink.triangles.len(), 2);
        assert_eq!(sink.triangles[0].0.position, positions[1]);
        assert_eq!(sink.triangles[0].1.position, positions[0]);
        assert_eq!(sink.triangles[0].2.position, positions[2]);
        assert_eq!(sink.triangles[1].0.position, positions[1]);
        assert_eq!(sink.triangles[1].1.position, positions[2]);
        assert_eq!(sink.triangles[1].2.position, positions[3]);
    }

    #[test]
    fn fan_shares_the_first_vertex() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        let buffers = ModelBuffers {
            positions: &positions,
            normals: &[],
            colors: [&[], &[]],
            uvs: [&[], &[], &[], &[], &[], &[], &[], &[]],
        };
        let mp = MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::TriangleFan,
                vertices: (0..4u16).map(iv).collect(),
            }],
        };
        let mut sink = CollectingSink { triangles: Vec::new() };
        propagate(&mp, &vcd, &buffers, &mut sink).unwrap();
        assert_eq!(sink.triangles.len(), 2);
        assert_eq!(sink.triangles[0].0.position, positions[0]);
        assert_eq!(sink.triangles[1].0.position, positions[0]);
    }

    #[test]
    fn degenerate_vcd_is_rejected() {
        let vcd = VertexDescriptor::new();
        let buffers = ModelBuffers {
            positions: &[],
            normals: &[],
            colors: [&[], &[]],
            uvs: [&[], &[], &[], &[], &[], &[], &[], &[]],
        };
        let mp = MatrixPrimitive {
            current_matrix: 0,
            primitives: Vec::new(),
        };
        let mut sink = CollectingSink { triangles: Vec::new() };
        assert!(propagate(&mp, &vcd, &buffers, &mut sink).is_err());
    }

    #[test]
    fn out_of_bounds_position_index_is_rejected() {
        let positions = [[0.0, 0.0, 0.0]];
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        let buffers = ModelBuffers {
            positions: &positions,
            normals: &[],
            colors: [&[], &[]],
            uvs: [&[], &[], &[], &[], &[], &[], &[], &[]],
        };
        let mp = MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::Triangles,
                vertices: vec![iv(0), iv(1), iv(2)].into(),
            }],
        };
        let mut sink = CollectingSink { triangles: Vec::new() };
        assert!(propagate(&mp, &vcd, &buffers, &mut sink).is_err());
    }
}
