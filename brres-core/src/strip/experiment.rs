//! The experiment harness: an immutable baseline, a set of named candidate
//! re-encodings, scoring by vertex count, and a validator that a candidate
//! still draws the same multiset of triangles as the baseline.

use crate::mesh::{GxPrimitiveType, IndexedVertex, MatrixPrimitive};

use super::StripifyError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshOptimizerStats {
    pub before_indices: u32,
    pub after_indices: u32,
    pub before_faces: u32,
    pub after_faces: u32,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score<Key> {
    pub key: Key,
    pub score: u32,
    pub stats: Option<MeshOptimizerStats>,
}

fn flatten_triangles(mp: &MatrixPrimitive) -> Vec<[IndexedVertex; 3]> {
    let mut tris = Vec::new();
    for prim in &mp.primitives {
        let v = &prim.vertices;
        let mut push = |a: usize, b: usize, c: usize| {
            let t = [v[a], v[b], v[c]];
            if t[0] != t[1] && t[1] != t[2] && t[0] != t[2] {
                tris.push(t);
            }
        };
        match prim.kind {
            GxPrimitiveType::Triangles => {
                for t in 0..v.len() / 3 {
                    push(t * 3, t * 3 + 1, t * 3 + 2);
                }
            }
            GxPrimitiveType::TriangleStrip => {
                for i in 2..v.len() {
                    if i % 2 == 1 {
                        push(i - 1, i - 2, i);
                    } else {
                        push(i - 2, i - 1, i);
                    }
                }
            }
            GxPrimitiveType::TriangleFan => {
                for i in 2..v.len() {
                    push(0, i - 1, i);
                }
            }
            GxPrimitiveType::Quads => {
                for q in 0..v.len() / 4 {
                    let base = q * 4;
                    push(base, base + 1, base + 2);
                    push(base, base + 2, base + 3);
                }
            }
            GxPrimitiveType::Points | GxPrimitiveType::Lines | GxPrimitiveType::LineStrip => {}
        }
    }
    tris
}

/// Rotates `tri` so its lexicographically smallest vertex comes first,
/// preserving winding (cyclic rotation only, never a reversal).
fn normalize_tri(tri: [IndexedVertex; 3]) -> [IndexedVertex; 3] {
    let min_pos = (0..3).min_by_key(|&i| tri[i]).unwrap();
    [tri[min_pos], tri[(min_pos + 1) % 3], tri[(min_pos + 2) % 3]]
}

/// A sorted multiset of normalized triangles, used to check that a
/// stripification pass changed only the encoding and not the mesh.
pub struct TriList(Vec<[IndexedVertex; 3]>);

impl TriList {
    pub fn from_matrix_primitive(mp: &MatrixPrimitive) -> Self {
        let mut tris: Vec<[IndexedVertex; 3]> = flatten_triangles(mp).into_iter().map(normalize_tri).collect();
        tris.sort();
        TriList(tris)
    }

    pub fn validate_same_as(&self, other: &TriList) -> Result<(), StripifyError> {
        if self.0.len() != other.0.len() {
            return Err(StripifyError::TriangleCountMismatch {
                before: self.0.len(),
                after: other.0.len(),
            });
        }
        for (i, (a, b)) in self.0.iter().zip(other.0.iter()).enumerate() {
            if a != b {
                return Err(StripifyError::TriangleSetMismatch { index: i });
            }
        }
        Ok(())
    }
}

fn vertex_count(mp: &MatrixPrimitive) -> u32 {
    mp.primitives.iter().map(|p| p.vertices.len() as u32).sum()
}

/// Races named candidate re-encodings of a baseline `MatrixPrimitive`,
/// scoring each by resulting vertex count.
pub struct MeshOptimizerExperimentHolder<Key> {
    baseline: MatrixPrimitive,
    baseline_list: TriList,
    experiments: Vec<(Key, MatrixPrimitive)>,
    stats: Vec<(Key, MeshOptimizerStats)>,
}

impl<Key: Copy + Eq + std::fmt::Debug> MeshOptimizerExperimentHolder<Key> {
    pub fn new(baseline: MatrixPrimitive) -> Self {
        let baseline_list = TriList::from_matrix_primitive(&baseline);
        MeshOptimizerExperimentHolder {
            baseline,
            baseline_list,
            experiments: Vec::new(),
            stats: Vec::new(),
        }
    }

    pub fn baseline(&self) -> &MatrixPrimitive {
        &self.baseline
    }

    pub fn baseline_score(&self) -> u32 {
        vertex_count(&self.baseline)
    }

    /// Registers `encoded` as the candidate for `key`, replacing any prior
    /// candidate under the same key (insertion order is otherwise
    /// preserved, which is what makes tie-breaking "first enumerated
    /// wins" deterministic).
    pub fn add_experiment(&mut self, key: Key, encoded: MatrixPrimitive) {
        if let Some(slot) = self.experiments.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = encoded;
        } else {
            self.experiments.push((key, encoded));
        }
    }

    pub fn get_experiment(&self, key: Key) -> Option<&MatrixPrimitive> {
        self.experiments.iter().find(|(k, _)| *k == key).map(|(_, p)| p)
    }

    pub fn validate_experiment_with_baseline(&self, key: Key) -> Result<(), StripifyError> {
        let candidate = self.get_experiment(key).ok_or(StripifyError::NoExperiments)?;
        let candidate_list = TriList::from_matrix_primitive(candidate);
        self.baseline_list.validate_same_as(&candidate_list)
    }

    pub fn validate_all_with_baseline(&self) -> Result<(), StripifyError> {
        for (key, _) in &self.experiments {
            self.validate_experiment_with_baseline(*key)?;
        }
        Ok(())
    }

    pub fn set_stats(&mut self, key: Key, stats: MeshOptimizerStats) {
        if let Some(slot) = self.stats.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = stats;
        } else {
            self.stats.push((key, stats));
        }
    }

    pub fn get_stats(&self, key: Key) -> Option<&MeshOptimizerStats> {
        self.stats.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    pub fn scores(&self) -> Vec<Score<Key>> {
        self.experiments
            .iter()
            .map(|(key, prim)| Score {
                key: *key,
                score: vertex_count(prim),
                stats: self.get_stats(*key).cloned(),
            })
            .collect()
    }

    /// The keys achieving the lowest vertex count, in enumeration order.
    pub fn calc_winners(&self) -> Vec<Key> {
        let best = self.experiments.iter().map(|(_, p)| vertex_count(p)).min();
        match best {
            Some(best) => self
                .experiments
                .iter()
                .filter(|(_, p)| vertex_count(p) == best)
                .map(|(k, _)| *k)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn first_winner_algo(&self) -> Result<Key, StripifyError> {
        self.calc_winners().into_iter().next().ok_or(StripifyError::NoExperiments)
    }

    pub fn first_winner(&self) -> Result<&MatrixPrimitive, StripifyError> {
        let key = self.first_winner_algo()?;
        self.get_experiment(key).ok_or(StripifyError::NoExperiments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Primitive, VertexAttribute};

    fn iv(pos: u16) -> IndexedVertex {
        let mut v: IndexedVertex = [0; 21];
        v[VertexAttribute::Position.slot()] = pos;
        v
    }

    fn triangles_mp(verts: &[u16]) -> MatrixPrimitive {
        MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::Triangles,
                vertices: verts.iter().copied().map(iv).collect(),
            }],
        }
    }

    fn strip_mp(verts: &[u16]) -> MatrixPrimitive {
        MatrixPrimitive {
            current_matrix: 0,
            primitives: vec![Primitive {
                kind: GxPrimitiveType::TriangleStrip,
                vertices: verts.iter().copied().map(iv).collect(),
            }],
        }
    }

    #[test]
    fn strip_and_triangle_soup_validate_as_equivalent() {
        let soup = triangles_mp(&[0, 1, 2, 1, 2, 3]);
        let strip = strip_mp(&[0, 1, 2, 3]);
        let a = TriList::from_matrix_primitive(&soup);
        let b = TriList::from_matrix_primitive(&strip);
        assert!(a.validate_same_as(&b).is_ok());
    }

    #[test]
    fn smaller_candidate_wins_and_earlier_key_wins_ties() {
        let baseline = triangles_mp(&[0, 1, 2, 1, 2, 3]);
        let mut holder = MeshOptimizerExperimentHolder::new(baseline.clone());
        holder.add_experiment("a", baseline.clone());
        holder.add_experiment("b", strip_mp(&[0, 1, 2, 3]));
        assert!(holder.validate_all_with_baseline().is_ok());
        assert_eq!(holder.first_winner_algo().unwrap(), "b");
    }

    #[test]
    fn mismatched_candidate_fails_validation() {
        let baseline = triangles_mp(&[0, 1, 2, 1, 2, 3]);
        let mut holder = MeshOptimizerExperimentHolder::new(baseline);
        holder.add_experiment("bad", triangles_mp(&[0, 1, 2]));
        assert!(holder.validate_experiment_with_baseline("bad").is_err());
    }
}
