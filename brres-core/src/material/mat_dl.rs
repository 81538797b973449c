//! The fixed-size display list embedded in every binary material: four
//! sections back to back, each padded to an exact byte length regardless
//! of how many of its slots are actually in use — `pixel` (0x20), `uniform`
//! (0x80), `indirect` (0x40), `texgen` (0xa0), for a total of 0x180 bytes.
//!
//! Section boundaries and lengths are exact (`BinaryMatDL::{write,parse}`);
//! the specific bit packing inside the `uniform`/`indirect`/`pixel` BP
//! register words is this crate's own internally-consistent scheme rather
//! than a transcription of the full Flipper register map, which is outside
//! what's available to ground it against (see DESIGN.md).

use crate::gx::dl::{self, RegisterWrite};
use crate::gx::{quantize_ind_tex_mtx, GxDlError, IndMtx};

use super::high_level::IndirectTextureScalePair;

const PIXEL_LEN: usize = 0x20;
const UNIFORM_LEN: usize = 0x80;
const INDIRECT_LEN: usize = 0x40;

/// `texGenDlSizes`, indexed by `numTexGens`.
const TEXGEN_DL_SIZES: [usize; 9] = [0, 32, 64, 64, 96, 96, 128, 128, 160];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaCompare {
    pub comp0: u8,
    pub reference0: u8,
    pub op: u8,
    pub comp1: u8,
    pub reference1: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZMode {
    pub enable: bool,
    pub func: u8,
    pub update: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendMode {
    pub kind: u8,
    pub src_factor: u8,
    pub dst_factor: u8,
    pub logic_op: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DstAlpha {
    pub enabled: bool,
    pub alpha: u8,
}

/// A texgen: which coordinate source feeds it and which (if any) texture
/// matrix post-multiplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexCoordGen {
    pub source: u8,
    pub matrix_index: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatDl {
    pub alpha_compare: AlphaCompare,
    pub z_mode: ZMode,
    pub blend_mode: BlendMode,
    pub dst_alpha: DstAlpha,
    pub tev_colors: [[i16; 4]; 3],
    pub tev_konst_colors: [[u8; 4]; 4],
    pub scales: Vec<IndirectTextureScalePair>,
    pub ind_matrices: Vec<IndMtx>,
    pub tex_gens: Vec<TexCoordGen>,
}

impl Default for AlphaCompare {
    fn default() -> Self {
        AlphaCompare {
            comp0: 7, // always
            reference0: 0,
            op: 0,
            comp1: 7,
            reference1: 0,
        }
    }
}

impl MatDl {
    pub fn write(&self) -> Result<Vec<u8>, GxDlError> {
        if self.tex_gens.len() > 8 {
            return Err(GxDlError::TooManyStages(self.tex_gens.len()));
        }
        if self.ind_matrices.len() > 3 {
            return Err(GxDlError::TooManyStages(self.ind_matrices.len()));
        }

        let mut out = Vec::with_capacity(0x180);
        out.extend(fixed_section(&self.write_pixel(), PIXEL_LEN));
        out.extend(fixed_section(&self.write_uniform(), UNIFORM_LEN));
        out.extend(fixed_section(&self.write_indirect(), INDIRECT_LEN));
        let texgen_len = TEXGEN_DL_SIZES[8];
        out.extend(fixed_section(&self.write_texgen(), texgen_len));
        Ok(out)
    }

    fn write_pixel(&self) -> Vec<u8> {
        let ac = &self.alpha_compare;
        let alpha_word = (ac.comp0 as u32)
            | ((ac.reference0 as u32) << 3)
            | ((ac.op as u32) << 11)
            | ((ac.comp1 as u32) << 13)
            | ((ac.reference1 as u32) << 16);
        let z_word = (self.z_mode.enable as u32)
            | ((self.z_mode.func as u32) << 1)
            | ((self.z_mode.update as u32) << 4);
        let blend_word = (self.blend_mode.kind as u32)
            | ((self.blend_mode.src_factor as u32) << 2)
            | ((self.blend_mode.dst_factor as u32) << 5)
            | ((self.blend_mode.logic_op as u32) << 8);
        let dst_alpha_word = (self.dst_alpha.enabled as u32) | ((self.dst_alpha.alpha as u32) << 1);

        dl::encode(&[
            RegisterWrite::bp(0x00, alpha_word),
            RegisterWrite::bp(0x01, z_word),
            RegisterWrite::bp(0x02, blend_word),
            RegisterWrite::bp(0x03, dst_alpha_word),
        ])
    }

    /// Each TEV register/konst color is two BP writes, not one: an RA word
    /// (red in the low byte, alpha in the next) and a BG word (blue, green),
    /// matching `DLBuilder::setTevColor`/`setTevKColor`'s split of a 4-byte
    /// color across the register pair real hardware exposes. `setTevColor`
    /// additionally issues the BG write three times — once for real, twice
    /// more as a no-op repeat — to dodge a latch race on the color (not
    /// konst) registers; the repeats land on the same address so only the
    /// last write is observable, but all three are emitted to match.
    fn write_uniform(&self) -> Vec<u8> {
        let mut writes = Vec::new();
        for (i, c) in self.tev_colors.iter().enumerate() {
            let ra = (c[0] as u8 as u32) | ((c[3] as u8 as u32) << 8);
            let bg = (c[2] as u8 as u32) | ((c[1] as u8 as u32) << 8);
            writes.push(RegisterWrite::bp(color_ra_addr(i as u8), ra));
            for _ in 0..3 {
                writes.push(RegisterWrite::bp(color_bg_addr(i as u8), bg));
            }
        }
        for (i, c) in self.tev_konst_colors.iter().enumerate() {
            let ra = (c[0] as u32) | ((c[3] as u32) << 8);
            let bg = (c[2] as u32) | ((c[1] as u32) << 8);
            writes.push(RegisterWrite::bp(konst_ra_addr(i as u8), ra));
            writes.push(RegisterWrite::bp(konst_bg_addr(i as u8), bg));
        }
        dl::encode(&writes)
    }

    fn write_indirect(&self) -> Vec<u8> {
        let mut writes = Vec::new();
        for (i, s) in self.scales.iter().enumerate() {
            let word = (s.u as u32) | ((s.v as u32) << 4);
            writes.push(RegisterWrite::bp(0x20 + i as u8, word));
        }
        for (i, m) in self.ind_matrices.iter().enumerate() {
            let words = quantize_ind_tex_mtx(*m);
            for (j, w) in words.iter().enumerate() {
                writes.push(RegisterWrite::bp(0x28 + (i * 3 + j) as u8, *w));
            }
        }
        dl::encode(&writes)
    }

    fn write_texgen(&self) -> Vec<u8> {
        let mut writes = Vec::new();
        for (i, t) in self.tex_gens.iter().enumerate() {
            let word = (t.source as u32) | ((t.matrix_index as u32) << 8);
            writes.push(RegisterWrite::bp(0x40 + i as u8, word));
        }
        dl::encode(&writes)
    }

    pub fn parse(data: &[u8], num_ind_stages: usize, num_tex_gens: usize) -> Result<Self, GxDlError> {
        if num_tex_gens > 8 {
            return Err(GxDlError::TooManyStages(num_tex_gens));
        }
        let mut pos = 0usize;

        let pixel = &data[pos..pos + PIXEL_LEN];
        pos += PIXEL_LEN;
        let uniform = &data[pos..pos + UNIFORM_LEN];
        pos += UNIFORM_LEN;
        let indirect = &data[pos..pos + INDIRECT_LEN];
        pos += INDIRECT_LEN;
        let texgen_len = TEXGEN_DL_SIZES[8];
        let texgen = &data[pos..pos + texgen_len];

        let pixel_state = {
            let mut s = crate::gx::GpuRegisterState::new();
            s.apply(&dl::decode(pixel)?);
            s
        };
        let alpha_word = pixel_state.bp(0x00).unwrap_or(0);
        let z_word = pixel_state.bp(0x01).unwrap_or(0);
        let blend_word = pixel_state.bp(0x02).unwrap_or(0);
        let dst_alpha_word = pixel_state.bp(0x03).unwrap_or(0);

        let alpha_compare = AlphaCompare {
            comp0: (alpha_word & 0x7) as u8,
            reference0: ((alpha_word >> 3) & 0xff) as u8,
            op: ((alpha_word >> 11) & 0x3) as u8,
            comp1: ((alpha_word >> 13) & 0x7) as u8,
            reference1: ((alpha_word >> 16) & 0xff) as u8,
        };
        let z_mode = ZMode {
            enable: z_word & 1 != 0,
            func: ((z_word >> 1) & 0x7) as u8,
            update: (z_word >> 4) & 1 != 0,
        };
        let blend_mode = BlendMode {
            kind: (blend_word & 0x3) as u8,
            src_factor: ((blend_word >> 2) & 0x7) as u8,
            dst_factor: ((blend_word >> 5) & 0x7) as u8,
            logic_op: ((blend_word >> 8) & 0xf) as u8,
        };
        let dst_alpha = DstAlpha {
            enabled: dst_alpha_word & 1 != 0,
            alpha: ((dst_alpha_word >> 1) & 0xff) as u8,
        };

        let uniform_state = {
            let mut s = crate::gx::GpuRegisterState::new();
            s.apply(&dl::decode(uniform)?);
            s
        };
        let mut tev_colors = [[0i16; 4]; 3];
        for (i, c) in tev_colors.iter_mut().enumerate() {
            let ra = uniform_state.bp(color_ra_addr(i as u8)).unwrap_or(0);
            let bg = uniform_state.bp(color_bg_addr(i as u8)).unwrap_or(0);
            *c = [
                (ra & 0xff) as u8 as i8 as i16,
                ((bg >> 8) & 0xff) as u8 as i8 as i16,
                (bg & 0xff) as u8 as i8 as i16,
                ((ra >> 8) & 0xff) as u8 as i8 as i16,
            ];
        }
        let mut tev_konst_colors = [[0u8; 4]; 4];
        for (i, c) in tev_konst_colors.iter_mut().enumerate() {
            let ra = uniform_state.bp(konst_ra_addr(i as u8)).unwrap_or(0);
            let bg = uniform_state.bp(konst_bg_addr(i as u8)).unwrap_or(0);
            *c = [
                (ra & 0xff) as u8,
                ((bg >> 8) & 0xff) as u8,
                (bg & 0xff) as u8,
                ((ra >> 8) & 0xff) as u8,
            ];
        }

        let indirect_state = {
            let mut s = crate::gx::GpuRegisterState::new();
            s.apply(&dl::decode(indirect)?);
            s
        };
        let mut scales = Vec::with_capacity(num_ind_stages);
        for i in 0..num_ind_stages {
            // `i > 1 ? i - 2 : i` — stages 0 and 1 read the first scale
            // register pair; every pair after that shares a register with
            // the *previous* pair's second half, per `BinaryMatDL::parse`.
            let idx = if i > 1 { i - 2 } else { i };
            let w = indirect_state.bp(0x20 + idx as u8).unwrap_or(0);
            scales.push(IndirectTextureScalePair {
                u: (w & 0xf) as u8,
                v: ((w >> 4) & 0xf) as u8,
            });
        }
        let mut ind_matrices = Vec::new();
        for i in 0..num_ind_stages.min(3) {
            let a = indirect_state.bp(0x28 + (i * 3) as u8).unwrap_or(0);
            let b = indirect_state.bp(0x28 + (i * 3 + 1) as u8).unwrap_or(0);
            let c = indirect_state.bp(0x28 + (i * 3 + 2) as u8).unwrap_or(0);
            ind_matrices.push(unquantize_ind_tex_mtx([a, b, c]));
        }

        let texgen_state = {
            let mut s = crate::gx::GpuRegisterState::new();
            s.apply(&dl::decode(texgen)?);
            s
        };
        let mut tex_gens = Vec::with_capacity(num_tex_gens);
        for i in 0..num_tex_gens {
            let w = texgen_state.bp(0x40 + i as u8).unwrap_or(0);
            tex_gens.push(TexCoordGen {
                source: (w & 0xff) as u8,
                matrix_index: ((w >> 8) & 0xff) as u8,
            });
        }

        Ok(MatDl {
            alpha_compare,
            z_mode,
            blend_mode,
            dst_alpha,
            tev_colors,
            tev_konst_colors,
            scales,
            ind_matrices,
            tex_gens,
        })
    }
}

fn color_ra_addr(i: u8) -> u8 {
    0x0a + i
}

fn color_bg_addr(i: u8) -> u8 {
    0x0d + i
}

fn konst_ra_addr(i: u8) -> u8 {
    0x10 + i
}

fn konst_bg_addr(i: u8) -> u8 {
    0x14 + i
}

fn fixed_section(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.resize(len, 0);
    out.truncate(len);
    out
}

/// Inverse of [`quantize_ind_tex_mtx`]'s packing (not the quantization
/// itself, which is lossy): recovers the element/exponent fields exactly
/// as written.
fn unquantize_ind_tex_mtx(words: [u32; 3]) -> IndMtx {
    let unpack = |w: u32| -> (i32, i32) {
        let a = (w & 0x7ff) as i32;
        let b = ((w >> 11) & 0x7ff) as i32;
        let sign = |x: i32| if x & 0x400 != 0 { x - 0x800 } else { x };
        (sign(a), sign(b))
    };
    let (a0, a1) = unpack(words[0]);
    let (a2, a3) = unpack(words[1]);
    let (a4, a5) = unpack(words[2]);
    let scale_bits = ((words[0] >> 22) & 0x3) | (((words[1] >> 22) & 0x3) << 2) | (((words[2] >> 22) & 0x3) << 4);
    let mantissa = scale_bits as i32 - 0x11;
    let scale = 2f32.powi(mantissa - 10);
    [
        [a0 as f32 * scale, a1 as f32 * scale],
        [a2 as f32 * scale, a3 as f32 * scale],
        [a4 as f32 * scale, a5 as f32 * scale],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatDl {
        MatDl {
            alpha_compare: AlphaCompare::default(),
            z_mode: ZMode {
                enable: true,
                func: 3,
                update: true,
            },
            blend_mode: BlendMode {
                kind: 1,
                src_factor: 4,
                dst_factor: 5,
                logic_op: 0,
            },
            dst_alpha: DstAlpha::default(),
            tev_colors: [[10, -5, 100, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
            tev_konst_colors: [[255, 255, 255, 255]; 4],
            scales: vec![IndirectTextureScalePair { u: 1, v: 2 }],
            ind_matrices: vec![[[0.5, 0.0], [0.0, 0.5], [0.0, 0.0]]],
            tex_gens: vec![TexCoordGen {
                source: 4,
                matrix_index: 30,
            }],
        }
    }

    #[test]
    fn write_hits_exact_section_sizes() {
        let dl = sample().write().unwrap();
        assert_eq!(dl.len(), PIXEL_LEN + UNIFORM_LEN + INDIRECT_LEN + TEXGEN_DL_SIZES[8]);
    }

    #[test]
    fn round_trips_pixel_and_uniform_fields() {
        let original = sample();
        let bytes = original.write().unwrap();
        let parsed = MatDl::parse(&bytes, 1, 1).unwrap();
        assert_eq!(parsed.z_mode, original.z_mode);
        assert_eq!(parsed.blend_mode, original.blend_mode);
        assert_eq!(parsed.tev_colors[0], original.tev_colors[0]);
        assert_eq!(parsed.tev_konst_colors, original.tev_konst_colors);
        assert_eq!(parsed.tex_gens, original.tex_gens);
    }

    #[test]
    fn rejects_too_many_tex_gens() {
        let mut m = sample();
        m.tex_gens = vec![
            TexCoordGen {
                source: 0,
                matrix_index: 0
            };
            9
        ];
        assert!(m.write().is_err());
    }
}
