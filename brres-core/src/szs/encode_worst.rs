//! `encodeFast`: the no-search encoder. Every input byte is emitted as a
//! literal; used only as a cheap upper bound on compressed size or when
//! compression quality genuinely doesn't matter.

/// Upper bound on the size of a Yaz0 stream that encodes every byte of a
/// `src.len()`-byte input as a literal: a 16-byte header plus one 0xFF
/// group header per 8 literal bytes. Mirrors `getWorstEncodingSize`
/// exactly, including its `- 1` (the final partial group's header is
/// folded into the preceding arithmetic rather than rounded up again).
pub fn worst_encoding_size(src_len: usize) -> usize {
    let round_up_8 = (src_len + 7) / 8 * 8;
    16 + round_up_8 / 8 * 9 - 1
}

/// Encodes `src` as an all-literal Yaz0 stream: one group header byte of
/// `0xff` (all eight groups are literals) per 8 source bytes, trailing
/// groups in a short final chunk padded with zero bytes that are never
/// read back (their group bits are unset).
pub fn encode_worst_case(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + src.len() + src.len() / 8 + 8);
    out.extend_from_slice(super::YAZ0_MAGIC);
    out.extend_from_slice(&(src.len() as u32).to_be_bytes());
    out.extend_from_slice(&[0u8; 8]);

    for chunk in src.chunks(8) {
        out.push(0xff);
        out.extend_from_slice(chunk);
    }

    out
}
