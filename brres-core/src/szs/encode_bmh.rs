//! `encodeBoyerMooreHorspool`: the matcher Nintendo's own tools use. A
//! Boyer-Moore-Horspool search over a 4096-byte trailing window, with a
//! one-byte lookahead to prefer a longer match starting one byte later.

use super::bitstream::{write_header, BitWriter};
use super::{MAX_MATCH_LEN, MAX_WINDOW};

struct Match {
    /// Absolute position in `src` the match was copied from.
    offset: usize,
    len: usize,
}

/// Builds a 256-entry skip table for a Boyer-Moore-Horspool search of
/// `needle` inside a haystack: for each byte value, how far the window can
/// advance when that byte is seen at the haystack's last-compared position.
fn skip_table(needle: &[u8]) -> [usize; 256] {
    let mut table = [needle.len(); 256];
    for (i, &b) in needle.iter().enumerate() {
        table[b as usize] = needle.len() - i - 1;
    }
    table
}

/// Finds the earliest occurrence of `needle` within `haystack`, BMH-style.
/// Returns `haystack.len()` (a sentinel "not found before the end") when
/// there is no occurrence, matching the reference searcher's convention of
/// returning how far it got.
fn search_window(needle: &[u8], haystack: &[u8]) -> usize {
    if needle.is_empty() || needle.len() > haystack.len() {
        return haystack.len();
    }
    let skip = skip_table(needle);
    let last = needle.len() - 1;
    let mut pos = 0usize;
    while pos + needle.len() <= haystack.len() {
        let end = pos + last;
        if haystack[end] == needle[last] {
            if haystack[pos..pos + needle.len()] == *needle {
                return pos;
            }
        }
        pos += skip[haystack[end] as usize].max(1);
    }
    haystack.len()
}

/// Finds the longest match for `src[pos..]` among bytes already emitted
/// (i.e. `src[window_start..pos]`), extending a Boyer-Moore-Horspool hit on
/// the first 3 bytes as far as it will go.
fn find_match(src: &[u8], pos: usize) -> Option<Match> {
    let window_start = pos.saturating_sub(MAX_WINDOW);
    let max_len = (src.len() - pos).min(MAX_MATCH_LEN);
    if max_len < 3 {
        return None;
    }

    let needle = &src[pos..pos + 3];
    let mut search_from = window_start;
    let mut best: Option<Match> = None;

    loop {
        let haystack = &src[search_from..pos];
        let found = search_window(needle, haystack);
        if found >= haystack.len() {
            break;
        }
        let cand_offset = search_from + found;
        let mut len = 3;
        while len < max_len && src[cand_offset + len] == src[pos + len] {
            len += 1;
        }
        let improved = best.as_ref().map_or(true, |b| len > b.len);
        if improved {
            best = Some(Match {
                offset: cand_offset,
                len,
            });
        }
        if len >= max_len {
            break;
        }
        search_from = cand_offset + 1;
        if search_from >= pos {
            break;
        }
    }

    best.filter(|m| m.len >= 3)
}

pub fn encode_boyer_moore_horspool(src: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(16 + src.len());
    write_header(&mut dst, src.len());
    let mut bits = BitWriter::new();

    let mut pos = 0usize;
    while pos < src.len() {
        let first = find_match(src, pos);
        match first {
            Some(m) if m.len > 2 => {
                let second = find_match(src, pos + 1);
                let (use_len, use_offset) = match second {
                    Some(ref s) if m.len + 1 < s.len => {
                        bits.literal(&mut dst, src[pos]);
                        pos += 1;
                        (s.len, s.offset)
                    }
                    _ => (m.len, m.offset),
                };
                let distance = pos - use_offset;
                bits.reference(&mut dst, distance, use_len);
                pos += use_len;
            }
            _ => {
                bits.literal(&mut dst, src[pos]);
                pos += 1;
            }
        }
    }

    dst
}
