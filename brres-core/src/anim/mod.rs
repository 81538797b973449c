//! Animation track codec (C7): six quantized keyframe encodings, the
//! high-level [`Track`](track::Track) they round-trip through, node/archive
//! framing, and track-pool deduplication.

mod dedup;
mod node;
mod track;

use thiserror::Error;

pub use dedup::merge_identical_tracks;
pub use node::{AnimNode, BinaryAnim, ScaleRule, TrackRef, WrapMode};
pub use track::{Keyframe, Track, TrackTag};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    #[error("track has no keyframes")]
    EmptyKeyframes,

    #[error("keyframe {index} has frame {frame} which is not strictly greater than the previous keyframe's frame")]
    NonMonotonicFrames { index: usize, frame: f64 },

    #[error("Const track must carry exactly one keyframe, found {0}")]
    ConstTrackWrongLength(usize),

    #[error("value {value} does not fit the {bits}-bit range of tag {tag:?} after quantization")]
    QuantizationOverflow { tag: TrackTag, value: f64, bits: u32 },

    #[error("track data of {len} byte(s) is not a multiple of the {tag:?} per-frame size of {per_frame} byte(s)")]
    TruncatedData {
        tag: TrackTag,
        len: usize,
        per_frame: usize,
    },

    #[error(transparent)]
    Reader(#[from] crate::io::ReaderError),
}
