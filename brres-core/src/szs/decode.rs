//! Yaz0 decode: the group/chunk bit stream described in the module header.
//!
//! The reference decoder indexes `src`/`dst` without bounds checks and
//! trusts the header's declared size; this one checks every read and
//! every back-reference distance and reports [`SzsError`] instead of
//! reading or writing out of bounds on a corrupt stream.

use super::{SzsError, MAX_WINDOW};

pub fn is_compressed(src: &[u8]) -> bool {
    src.len() >= 8 && &src[0..4] == super::YAZ0_MAGIC
}

pub fn get_expanded_size(src: &[u8]) -> Result<u32, SzsError> {
    if src.len() < 8 {
        return Err(SzsError::TooSmallForHeader { len: src.len() });
    }
    if &src[0..4] != super::YAZ0_MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(&src[0..4]);
        return Err(SzsError::BadMagic { found });
    }
    Ok(u32::from_be_bytes([src[4], src[5], src[6], src[7]]))
}

/// Decodes the Yaz0 stream `src` into `dst`, which must be at least as
/// large as the declared expanded size. Extra trailing space in `dst` is
/// left untouched.
pub fn decode(dst: &mut [u8], src: &[u8]) -> Result<(), SzsError> {
    let expanded = get_expanded_size(src)? as usize;
    if dst.len() < expanded {
        return Err(SzsError::DestinationTooSmall {
            have: dst.len(),
            want: expanded,
        });
    }
    log::debug!("szs decode: {} byte(s) compressed -> {expanded} byte(s) expanded", src.len());

    let mut in_pos = 0x10usize;
    let mut out_pos = 0usize;

    let take8 = |src: &[u8], in_pos: &mut usize| -> Result<u8, SzsError> {
        let b = *src
            .get(*in_pos)
            .ok_or(SzsError::TruncatedStream { offset: *in_pos })?;
        *in_pos += 1;
        Ok(b)
    };

    while in_pos < src.len() && out_pos < expanded {
        let header = take8(src, &mut in_pos)?;

        for i in 0..8 {
            if in_pos >= src.len() || out_pos >= expanded {
                break;
            }
            let raw = header & (1 << (7 - i)) != 0;

            if raw {
                let byte = take8(src, &mut in_pos)?;
                dst[out_pos] = byte;
                out_pos += 1;
                continue;
            }

            let hi = take8(src, &mut in_pos)? as u16;
            let lo = take8(src, &mut in_pos)? as u16;
            let group = (hi << 8) | lo;
            let reverse = (group & 0xfff) as usize + 1;
            let g_size = (group >> 12) as usize;
            let size = if g_size != 0 {
                g_size + 2
            } else {
                take8(src, &mut in_pos)? as usize + 18
            };

            if reverse > out_pos {
                return Err(SzsError::BackReferenceUnderflow { out_pos, reverse });
            }
            let _ = MAX_WINDOW; // window bound is enforced by the encoders, not the decoder.

            for _ in 0..size {
                if out_pos >= expanded {
                    break;
                }
                dst[out_pos] = dst[out_pos - reverse];
                out_pos += 1;
            }
        }
    }

    Ok(())
}
