//! Animation node framing and the archive-level `BinaryAnim` that owns a
//! deduplicated track pool.

use super::track::Track;

/// How a node's animation extrapolates past the end of its keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Clamp,
    Repeat,
}

/// Matches the SRT0-family "scale rule" flag selecting how a texture
/// matrix's scale/rotate/translate triple is recombined after interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRule {
    Standard,
    Maya,
    Xsi,
}

/// A node's reference to one animated channel: either an index into the
/// archive's deduplicated track pool, or an inline constant that never
/// occupies a pool slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackRef {
    Pooled(usize),
    Const(f32),
}

/// A single animation target: the path it drives (e.g. a material/sampler
/// pair or a bone name) and one track reference per animated component.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimNode {
    pub target_path: String,
    pub tracks: Vec<TrackRef>,
}

/// The on-disk archive: identity, timing, a node list, and the pool every
/// [`TrackRef::Pooled`] indexes into.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryAnim {
    pub name: String,
    pub source_path: String,
    pub frame_duration: f32,
    pub wrap_mode: WrapMode,
    pub scale_rule: ScaleRule,
    pub nodes: Vec<AnimNode>,
    pub track_pool: Vec<Track>,
}

impl BinaryAnim {
    /// True once every [`TrackRef::Pooled`] index across all nodes falls
    /// within `track_pool` — the invariant [`super::merge_identical_tracks`]
    /// must preserve.
    pub fn references_are_in_bounds(&self) -> bool {
        self.nodes.iter().all(|n| {
            n.tracks.iter().all(|t| match t {
                TrackRef::Pooled(i) => *i < self.track_pool.len(),
                TrackRef::Const(_) => true,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::track::{Keyframe, TrackTag};

    fn sample_track() -> Track {
        Track::new(
            TrackTag::Track96,
            1.0,
            0.0,
            vec![Keyframe {
                frame: 0.0,
                value: 1.0,
                slope: 0.0,
            }],
        )
        .unwrap()
    }

    #[test]
    fn detects_out_of_bounds_reference() {
        let anim = BinaryAnim {
            name: "walk".to_owned(),
            source_path: String::new(),
            frame_duration: 30.0,
            wrap_mode: WrapMode::Repeat,
            scale_rule: ScaleRule::Standard,
            nodes: vec![AnimNode {
                target_path: "arm".to_owned(),
                tracks: vec![TrackRef::Pooled(3)],
            }],
            track_pool: vec![sample_track()],
        };
        assert!(!anim.references_are_in_bounds());
    }

    #[test]
    fn in_bounds_reference_passes() {
        let anim = BinaryAnim {
            name: "walk".to_owned(),
            source_path: String::new(),
            frame_duration: 30.0,
            wrap_mode: WrapMode::Clamp,
            scale_rule: ScaleRule::Standard,
            nodes: vec![AnimNode {
                target_path: "arm".to_owned(),
                tracks: vec![TrackRef::Pooled(0), TrackRef::Const(0.0)],
            }],
            track_pool: vec![sample_track()],
        };
        assert!(anim.references_are_in_bounds());
    }
}
