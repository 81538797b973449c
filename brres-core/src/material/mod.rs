//! Material codec (C6): the three-layer ladder from a high-level material
//! description down to the fixed-size GPU display list every material
//! carries in the archive.
//!
//! - [`high_level`] — [`G3dMaterialData`], the editable, semantic view.
//! - [`binary`] — [`BinaryMaterial`], the on-disk field layout.
//! - [`mat_dl`] — [`MatDl`], the fixed-size pixel/uniform/indirect/texgen
//!   display list embedded in every binary material.
//! - [`convert`] — `to_bin_mat`/`from_bin_mat`, the lossy-in-one-direction
//!   bridge between the two (a binary material always round-trips through
//!   the high-level form, but not every high-level value survives
//!   hardware quantization unchanged).

mod binary;
mod convert;
mod high_level;
mod mat_dl;

use thiserror::Error;

pub use binary::BinaryMaterial;
pub use convert::{from_bin_mat, to_bin_mat};
pub use high_level::{
    ChannelControl, G3dMaterialData, IndirectTextureScalePair, MapMode, SamplerConfig, TexMatrix,
};
pub use mat_dl::{AlphaCompare, BlendMode, DstAlpha, MatDl, ZMode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("material has {0} tex gens, the hardware maximum is 8")]
    TooManyTexGens(usize),

    #[error("material has {0} indirect matrices, the hardware maximum is 3")]
    TooManyIndMatrices(usize),

    #[error("material references {0} distinct target material name(s) across its channel controls, expected a contiguous enabled prefix")]
    NonContiguousChannelControls(usize),

    #[error(transparent)]
    GxDl(#[from] crate::gx::GxDlError),

    #[error(transparent)]
    Reader(#[from] crate::io::ReaderError),
}
