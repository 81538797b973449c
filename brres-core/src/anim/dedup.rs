//! Track pool deduplication: identical tracks collapse to one pool entry,
//! `Const`-tagged tracks sort after every non-`Const` entry, and every
//! node's pooled reference is rewritten through the resulting remap.

use super::node::{AnimNode, TrackRef};
use super::track::{Track, TrackTag};

/// Collapses `pool` to its distinct tracks (non-`Const` first, `Const`
/// last, each group in first-seen order) and rewrites every
/// [`TrackRef::Pooled`] reference in `nodes` through the old→new remap.
/// Returns the deduplicated pool.
///
/// Running this twice on its own output is a no-op: the second pass finds
/// every entry already distinct and already in canonical order, so the
/// remap it computes is the identity.
pub fn merge_identical_tracks(pool: Vec<Track>, nodes: &mut [AnimNode]) -> Vec<Track> {
    let order: Vec<usize> = {
        let mut non_const: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].tag != TrackTag::Const).collect();
        let consts: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].tag == TrackTag::Const).collect();
        non_const.extend(consts);
        non_const
    };

    let mut deduped: Vec<Track> = Vec::new();
    let mut remap = vec![0usize; pool.len()];
    for &orig_index in &order {
        let candidate = &pool[orig_index];
        let existing = deduped.iter().position(|t| t == candidate);
        let new_index = match existing {
            Some(i) => i,
            None => {
                deduped.push(candidate.clone());
                deduped.len() - 1
            }
        };
        remap[orig_index] = new_index;
    }

    for node in nodes.iter_mut() {
        for track_ref in node.tracks.iter_mut() {
            if let TrackRef::Pooled(i) = track_ref {
                *i = remap[*i];
            }
        }
    }

    deduped
}
