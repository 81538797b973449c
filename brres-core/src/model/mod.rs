//! Archive assemblers (C9): bones, the model/archive container that bundles
//! the other codecs into one byte stream with a stable section order, and
//! the single-material `.rspreset` crate-preset assembler built on top of it.

mod archive;
mod bone;
mod rspreset;

use thiserror::Error;

pub use archive::{Archive, MeshEntry, Model, TextureSamplerMappingManager};
pub use bone::{recompute_children, Billboard, Bone};
pub use rspreset::{
    content_hash, format_metadata_header, parse_metadata_header, validate_single_material_target, CrateAnimation,
    PresetMetadataJson,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArchiveError {
    #[error("bone {bone} has parent index {parent}, out of bounds for {len} bone(s)")]
    BoneParentOutOfBounds { bone: usize, parent: usize, len: usize },

    #[error("bone graph has a cycle reachable from bone {0}")]
    BoneCycle(usize),

    #[error("archive has no models; at least one is required")]
    NoModels,

    #[error("preset has {0} materials, a crate preset carries exactly one")]
    NotASingleMaterialPreset(usize),

    #[error("Extraneous SRT0 animations included: expected target {expected:?}, found {found:?}")]
    ExtraneousSrt0 { expected: String, found: Vec<String> },

    #[error("Extraneous CLR0 animations included: expected target {expected:?}, found {found:?}")]
    ExtraneousClr0 { expected: String, found: Vec<String> },

    #[error("Extraneous PAT0 animations included: expected target {expected:?}, found {found:?}")]
    ExtraneousPat0 { expected: String, found: Vec<String> },

    #[error("texture {0:?} referenced by a sampler was never added to the archive")]
    UnknownTexture(String),

    #[error("unrecognized archive magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("texture {name:?} has unrecognized format tag {tag:#04x}")]
    UnknownTextureFormat { name: String, tag: u8 },

    #[error("malformed preset metadata header: {0}")]
    InvalidMetadataHeader(String),

    #[error("preset checksum does not match its trailer")]
    ChecksumMismatch,

    #[error(transparent)]
    Material(#[from] crate::material::MaterialError),

    #[error(transparent)]
    Mesh(#[from] crate::mesh::MeshError),

    #[error(transparent)]
    Texture(#[from] crate::texture::TextureError),

    #[error(transparent)]
    Track(#[from] crate::anim::TrackError),

    #[error(transparent)]
    Reader(#[from] crate::io::ReaderError),
}
