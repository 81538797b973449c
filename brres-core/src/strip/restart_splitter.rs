//! Converts a flat index buffer punctuated by a restart marker into a list
//! of GX primitives, collapsing any run of exactly three indices (too
//! short to bother keeping as a strip or fan) into one trailing
//! `Triangles` batch.

use crate::mesh::{GxPrimitiveType, IndexedVertex, MatrixPrimitive, Primitive};

pub struct PrimitiveRestartSplitter {
    restart_index: u32,
}

impl PrimitiveRestartSplitter {
    pub fn new(restart_index: u32) -> Self {
        PrimitiveRestartSplitter { restart_index }
    }

    /// Splits `indices` on `self.restart_index`, resolving each index
    /// against `vertex_table`. Runs of exactly three indices become loose
    /// triangles merged into a single trailing `Triangles` primitive; every
    /// longer run becomes its own primitive of `topology`.
    pub fn split(&self, indices: &[u32], vertex_table: &[IndexedVertex], topology: GxPrimitiveType) -> Vec<Primitive> {
        let mut primitives = Vec::new();
        let mut triangles = Primitive::new(GxPrimitiveType::Triangles);

        for run in indices.split(|&i| i == self.restart_index) {
            if run.is_empty() {
                continue;
            }
            debug_assert!(run.len() >= 3, "a strip/fan run must carry at least one triangle");
            if run.len() == 3 {
                for &i in run {
                    triangles.vertices.push(vertex_table[i as usize]);
                }
            } else {
                let mut prim = Primitive::new(topology);
                for &i in run {
                    prim.vertices.push(vertex_table[i as usize]);
                }
                primitives.push(prim);
            }
        }

        if !triangles.vertices.is_empty() {
            primitives.push(triangles);
        }
        primitives
    }
}

/// Convenience wrapper producing a full `MatrixPrimitive` rather than a
/// bare primitive list, reusing `mp`'s current-matrix binding.
pub fn split_into_matrix_primitive(
    splitter: &PrimitiveRestartSplitter,
    indices: &[u32],
    vertex_table: &[IndexedVertex],
    topology: GxPrimitiveType,
    mp: &MatrixPrimitive,
) -> MatrixPrimitive {
    MatrixPrimitive {
        current_matrix: mp.current_matrix,
        primitives: splitter.split(indices, vertex_table, topology),
    }
}
