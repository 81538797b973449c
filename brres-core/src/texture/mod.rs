//! TEX0 texture container and GameCube/Wii (Flipper) pixel format decode.

mod formats;
mod tex0;

use thiserror::Error;

pub use formats::TexFormat;
pub use tex0::Tex0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("unrecognized GX texture format tag {0:#04x}")]
    UnknownFormat(u8),

    #[error("texture data of {len} byte(s) is too short to decode a {width}x{height} image in format {format:?}")]
    TruncatedData {
        format: TexFormat,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("compressed texture encoding is not supported for format {0:?}")]
    EncodingUnsupported(TexFormat),
}
