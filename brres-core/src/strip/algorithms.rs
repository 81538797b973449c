//! Stripification algorithms. Each named variant mirrors a distinct real
//! stripifier by name, but (absent a vendored port of zeux/meshoptimizer,
//! GPSnoopy/TriStripper, amorilia/tristrip, jellees/nns-blender-plugin or
//! Google Draco) is implemented here as one shared greedy strip-extension
//! core, varied only by its start-triangle heuristic and its policy for
//! bridging between strips — a from-scratch stand-in, not a port.

use std::collections::HashMap;

use crate::mesh::{GxPrimitiveType, IndexedVertex, MatrixPrimitive, Primitive};

use super::restart_splitter::PrimitiveRestartSplitter;

/// Named stripification strategies. `Draco`/`DracoDegen` differ only in
/// whether adjacent strips may be bridged by a degenerate (repeated-index)
/// triangle rather than split into separate primitives; `Haroohie` tries
/// every possible start and keeps the longest strip, which is exhaustive
/// and usually disabled for anything but small meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripifyAlgo {
    MeshOptimizer,
    TriStripper,
    NvTriStripPort,
    Haroohie,
    Draco,
    DracoDegen,
    RiiFans,
}

impl StripifyAlgo {
    pub fn name(self) -> &'static str {
        match self {
            StripifyAlgo::MeshOptimizer => "MeshOptimizer",
            StripifyAlgo::TriStripper => "TriStripper",
            StripifyAlgo::NvTriStripPort => "NvTriStripPort",
            StripifyAlgo::Haroohie => "Haroohie",
            StripifyAlgo::Draco => "Draco",
            StripifyAlgo::DracoDegen => "DracoDegen",
            StripifyAlgo::RiiFans => "RiiFans",
        }
    }

    /// Haroohie's exhaustive multi-start search and Draco's bridge-free
    /// splitting are both slow and rarely produce the winning candidate;
    /// a racer that wants every algorithm's opinion still runs them, but a
    /// caller tuning for speed may want to skip these.
    pub fn enabled_by_default(self) -> bool {
        !matches!(self, StripifyAlgo::Haroohie | StripifyAlgo::DracoDegen)
    }
}

pub const ALL_ALGORITHMS: [StripifyAlgo; 7] = [
    StripifyAlgo::MeshOptimizer,
    StripifyAlgo::TriStripper,
    StripifyAlgo::NvTriStripPort,
    StripifyAlgo::Haroohie,
    StripifyAlgo::Draco,
    StripifyAlgo::DracoDegen,
    StripifyAlgo::RiiFans,
];

/// Flattens every `Triangles`/`TriangleStrip`/`TriangleFan`/`Quads`
/// primitive in `mp` into one deduplicated vertex table and a flat,
/// degenerate-free triangle index list.
fn build_index_buffer(mp: &MatrixPrimitive) -> (Vec<IndexedVertex>, Vec<u32>) {
    let mut table: Vec<IndexedVertex> = Vec::new();
    let mut index_of: HashMap<IndexedVertex, u32> = HashMap::new();
    let mut intern = |v: IndexedVertex| -> u32 {
        *index_of.entry(v).or_insert_with(|| {
            table.push(v);
            (table.len() - 1) as u32
        })
    };

    let mut triangles: Vec<[u32; 3]> = Vec::new();
    for prim in &mp.primitives {
        let verts = &prim.vertices;
        let mut push_raw = |a: usize, b: usize, c: usize| {
            triangles.push([intern(verts[a]), intern(verts[b]), intern(verts[c])]);
        };
        match prim.kind {
            GxPrimitiveType::Triangles => {
                for t in 0..verts.len() / 3 {
                    push_raw(t * 3, t * 3 + 1, t * 3 + 2);
                }
            }
            GxPrimitiveType::TriangleStrip => {
                for v in 2..verts.len() {
                    if v % 2 == 1 {
                        push_raw(v - 1, v - 2, v);
                    } else {
                        push_raw(v - 2, v - 1, v);
                    }
                }
            }
            GxPrimitiveType::TriangleFan => {
                for v in 2..verts.len() {
                    push_raw(0, v - 1, v);
                }
            }
            GxPrimitiveType::Quads => {
                for q in 0..verts.len() / 4 {
                    let base = q * 4;
                    push_raw(base, base + 1, base + 2);
                    push_raw(base, base + 2, base + 3);
                }
            }
            GxPrimitiveType::Points | GxPrimitiveType::Lines | GxPrimitiveType::LineStrip => {}
        }
    }

    triangles.retain(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2]);

    let indices = triangles.into_iter().flatten().collect();
    (table, indices)
}

fn shared_edge_triangle(
    indices: &[u32],
    used: &[bool],
    edge: (u32, u32),
) -> Option<(usize, u32)> {
    for (i, tri) in indices.chunks(3).enumerate() {
        if used[i] {
            continue;
        }
        let [a, b, c] = [tri[0], tri[1], tri[2]];
        let has = |x: u32, y: u32| (a == x && (b == y || c == y)) || (b == x && (a == y || c == y)) || (c == x && (a == y || b == y));
        if has(edge.0, edge.1) {
            let third = a + b + c - edge.0 - edge.1;
            if third != edge.0 && third != edge.1 && [a, b, c].contains(&third) {
                return Some((i, third));
            }
        }
    }
    None
}

/// Greedily grows one strip starting from triangle `start`, following
/// shared-edge adjacency. Returns the strip's vertex sequence and marks
/// every consumed triangle as used.
fn grow_strip(indices: &[u32], used: &mut [bool], start: usize) -> Vec<u32> {
    let tri = &indices[start * 3..start * 3 + 3];
    let mut strip = vec![tri[0], tri[1], tri[2]];
    used[start] = true;

    loop {
        let len = strip.len();
        let edge = (strip[len - 2], strip[len - 1]);
        match shared_edge_triangle(indices, used, edge) {
            Some((i, third)) => {
                used[i] = true;
                strip.push(third);
            }
            None => break,
        }
    }
    strip
}

fn strip_length(indices: &[u32], used: &[bool], start: usize) -> usize {
    let mut scratch: Vec<bool> = used.to_vec();
    grow_strip(indices, &mut scratch, start).len()
}

/// Picks which unused triangle starts the next strip, per algorithm.
fn pick_start(algo: StripifyAlgo, indices: &[u32], used: &[bool]) -> Option<usize> {
    let candidates = (0..indices.len() / 3).filter(|&i| !used[i]);
    match algo {
        StripifyAlgo::MeshOptimizer | StripifyAlgo::Draco | StripifyAlgo::RiiFans => candidates.min(),
        StripifyAlgo::NvTriStripPort => candidates.max(),
        StripifyAlgo::TriStripper | StripifyAlgo::DracoDegen => candidates.min(),
        StripifyAlgo::Haroohie => candidates.max_by_key(|&i| strip_length(indices, used, i)),
    }
}

/// Whether strips from `algo` are joined with a degenerate bridge triangle
/// (two repeated indices) instead of being split into separate primitives.
fn bridges_with_degenerate(algo: StripifyAlgo) -> bool {
    matches!(algo, StripifyAlgo::DracoDegen)
}

/// Runs `algo` over `mp`'s flattened triangle soup and returns the
/// restriped `MatrixPrimitive`.
pub fn stripify(mp: &MatrixPrimitive, algo: StripifyAlgo) -> MatrixPrimitive {
    let (vertex_table, indices) = build_index_buffer(mp);
    let tri_count = indices.len() / 3;
    let mut used = vec![false; tri_count];

    let mut strips: Vec<Vec<u32>> = Vec::new();
    while let Some(start) = pick_start(algo, &indices, &used) {
        strips.push(grow_strip(&indices, &mut used, start));
    }

    let mut flat: Vec<u32> = Vec::new();
    for (i, strip) in strips.iter().enumerate() {
        if i > 0 {
            if bridges_with_degenerate(algo) {
                flat.push(*flat.last().unwrap());
                flat.push(strip[0]);
            } else {
                flat.push(u32::MAX);
            }
        }
        flat.extend_from_slice(strip);
    }

    let splitter = PrimitiveRestartSplitter::new(u32::MAX);
    let primitives = splitter.split(&flat, &vertex_table, GxPrimitiveType::TriangleStrip);

    MatrixPrimitive {
        current_matrix: mp.current_matrix,
        primitives,
    }
}

/// Groups the flat triangle soup in `mp` into triangle fans sharing a
/// common apex, leaving any leftover triangles as a trailing `Triangles`
/// batch. Mirrors `ToFanTriangles`'s run-length grouping, without the
/// `min_len`/`max_runs` tuning knobs (always fans runs of 2 or more).
pub fn to_fan_triangles(mp: &MatrixPrimitive) -> MatrixPrimitive {
    let (vertex_table, indices) = build_index_buffer(mp);
    let tri_count = indices.len() / 3;
    let mut used = vec![false; tri_count];

    let mut fans: Vec<Vec<u32>> = Vec::new();
    for start in 0..tri_count {
        if used[start] {
            continue;
        }
        let tri = &indices[start * 3..start * 3 + 3];
        let mut fan = vec![tri[0], tri[1], tri[2]];
        used[start] = true;
        loop {
            let last_two = (fan[0], *fan.last().unwrap());
            match shared_edge_triangle(&indices, &used, last_two) {
                Some((i, third)) => {
                    used[i] = true;
                    fan.push(third);
                }
                None => break,
            }
        }
        fans.push(fan);
    }

    let mut flat: Vec<u32> = Vec::new();
    for (i, fan) in fans.iter().enumerate() {
        if i > 0 {
            flat.push(u32::MAX);
        }
        flat.extend_from_slice(fan);
    }

    let splitter = PrimitiveRestartSplitter::new(u32::MAX);
    let primitives = splitter.split(&flat, &vertex_table, GxPrimitiveType::TriangleFan);

    MatrixPrimitive {
        current_matrix: mp.current_matrix,
        primitives,
    }
}

pub(crate) fn vertex_count(mp: &MatrixPrimitive) -> usize {
    mp.primitives.iter().map(|p| p.vertices.len()).sum()
}

pub(crate) fn face_count(mp: &MatrixPrimitive) -> usize {
    mp.primitives
        .iter()
        .map(|p| match p.kind {
            GxPrimitiveType::Triangles => p.vertices.len() / 3,
            GxPrimitiveType::TriangleStrip | GxPrimitiveType::TriangleFan => p.vertices.len().saturating_sub(2),
            GxPrimitiveType::Quads => p.vertices.len() / 4 * 2,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexAttribute;

    fn iv(pos: u16) -> IndexedVertex {
        let mut v: IndexedVertex = [0; 21];
        v[VertexAttribute::Position.slot()] = pos;
        v
    }

    fn triangle_soup(n_tris: u16) -> MatrixPrimitive {
        let mut verts = Vec::new();
        for t in 0..n_tris {
            verts.push(iv(t));
            verts.push(iv(t + 1));
            verts.push(iv(t + 2));
        }
        MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::Triangles,
                vertices: verts.into(),
            }],
        }
    }

    #[test]
    fn stripify_a_connected_triangle_strip_reduces_vertex_count() {
        let soup = triangle_soup(3);
        let out = stripify(&soup, StripifyAlgo::MeshOptimizer);
        assert!(vertex_count(&out) <= vertex_count(&soup));
        assert_eq!(face_count(&out), face_count(&soup));
    }

    #[test]
    fn all_algorithms_preserve_face_count() {
        let soup = triangle_soup(6);
        for algo in ALL_ALGORITHMS {
            let out = stripify(&soup, algo);
            assert_eq!(face_count(&out), face_count(&soup), "{:?} changed face count", algo);
        }
    }

    #[test]
    fn to_fan_triangles_preserves_face_count() {
        let soup = triangle_soup(4);
        let out = to_fan_triangles(&soup);
        assert_eq!(face_count(&out), face_count(&soup));
    }
}
