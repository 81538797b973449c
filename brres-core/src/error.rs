//! Crate-wide error aggregate.
//!
//! Each component owns its own `thiserror` enum (`SzsError`, `ReaderError`,
//! `GxDlError`, `MaterialError`, `TrackError`, `StripifyError`, `MeshError`,
//! `TextureError`, `ArchiveError`); this one wraps them for operations that
//! cross component boundaries, such as assembling a full archive out of a
//! material, a mesh and an SZS-compressed byte stream.

use thiserror::Error;

use crate::anim::TrackError;
use crate::gx::GxDlError;
use crate::io::ReaderError;
use crate::material::MaterialError;
use crate::mesh::MeshError;
use crate::model::ArchiveError;
use crate::strip::StripifyError;
use crate::szs::SzsError;
use crate::texture::TextureError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Szs(#[from] SzsError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    GxDl(#[from] GxDlError),

    #[error(transparent)]
    Material(#[from] MaterialError),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Stripify(#[from] StripifyError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
