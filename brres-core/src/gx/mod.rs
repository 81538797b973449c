//! GameCube GPU (Flipper) display-list codec (C4): the inline
//! BP/XF/CP register-write opcode stream embedded in every material and
//! shape, the TEV stage configuration it carries, and the indirect-texture
//! matrix quantization used to write one back out.

pub(crate) mod dl;
mod indirect;
mod register_state;
pub mod tev;

use thiserror::Error;

pub use dl::{RegKind, RegisterWrite};
pub use indirect::{quantize_ind_tex_mtx, IndMtx};
pub use register_state::GpuRegisterState;
pub use tev::{
    decode_tev_dl, encode_tev_dl, shader_dl_size, TevAlphaArg, TevBias, TevColorArg,
    TevCompareMode, TevOp, TevRegId, TevScale, TevStageConfig, SwapTableEntry, TEV_DL_LEN,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GxDlError {
    #[error("display list of {len} byte(s) is not a multiple of the 32-byte GX command alignment")]
    Unaligned { len: usize },

    #[error("unknown display-list opcode {opcode:#04x} at byte {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("stage count {0} exceeds the hardware maximum of 16")]
    TooManyStages(usize),

    #[error("coord-to-map lookup table has no entry for tex coord {0}")]
    UnmappedTexCoord(u8),
}
