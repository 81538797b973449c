//! TEV (Texture Environment) stage configuration and its binary display
//! list encoding.
//!
//! The GameCube GPU has up to 16 TEV stages that combine textures,
//! rasterized color, and constant registers into the final pixel color:
//! `result = d OP ((1 - c) * a + c * b)`, scaled and optionally clamped.
//! This module stores that per-stage configuration and converts it to and
//! from the fixed-size display list every material embeds.

use super::dl::RegisterWrite;
use super::GxDlError;

// ---------------------------------------------------------------------------
// TEV enums — hardware register encodings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevColorArg {
    CprevRgb = 0,
    AprevRgb = 1,
    C0Rgb = 2,
    A0Rgb = 3,
    C1Rgb = 4,
    A1Rgb = 5,
    C2Rgb = 6,
    A2Rgb = 7,
    TexcRgb = 8,
    TexaRgb = 9,
    RascRgb = 10,
    One = 11,
    Half = 12,
    Konst = 13,
    Zero = 14,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevAlphaArg {
    AprevAlpha = 0,
    A0Alpha = 1,
    A1Alpha = 2,
    A2Alpha = 3,
    TexAlpha = 4,
    RasAlpha = 5,
    KonstAlpha = 6,
    Zero = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevOp {
    Add = 0,
    Sub = 1,
}

/// Bias applied to the combiner result before scaling. [`TevBias::Compare`]
/// switches the stage into masked-compare mode, where [`TevCompareMode`]
/// selects the comparison function instead of [`TevOp`] and [`TevScale`]
/// having any effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevBias {
    Zero = 0,
    AddHalf = 1,
    SubHalf = 2,
    Compare = 3,
}

fn bias_from_u8(v: u8) -> TevBias {
    match v & 0x3 {
        0 => TevBias::Zero,
        1 => TevBias::AddHalf,
        2 => TevBias::SubHalf,
        _ => TevBias::Compare,
    }
}

/// The masked-compare function a stage applies when its bias is
/// [`TevBias::Compare`]: compares channels at the named bit width and
/// outputs the full source value where the comparison holds, zero
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevCompareMode {
    R8Gt = 0,
    R8Eq = 1,
    Gr16Gt = 2,
    Gr16Eq = 3,
    Bgr24Gt = 4,
    Bgr24Eq = 5,
    Rgb8Gt = 6,
    Rgb8Eq = 7,
}

fn compare_mode_from_u8(v: u8) -> TevCompareMode {
    use TevCompareMode::*;
    match v & 0x7 {
        0 => R8Gt,
        1 => R8Eq,
        2 => Gr16Gt,
        3 => Gr16Eq,
        4 => Bgr24Gt,
        5 => Bgr24Eq,
        6 => Rgb8Gt,
        _ => Rgb8Eq,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevScale {
    Scale1 = 0,
    Scale2 = 1,
    Scale4 = 2,
    DivideBy2 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TevRegId {
    Prev = 0,
    Reg0 = 1,
    Reg1 = 2,
    Reg2 = 3,
}

fn color_arg_from_u8(v: u8) -> Result<TevColorArg, GxDlError> {
    use TevColorArg::*;
    Ok(match v {
        0 => CprevRgb,
        1 => AprevRgb,
        2 => C0Rgb,
        3 => A0Rgb,
        4 => C1Rgb,
        5 => A1Rgb,
        6 => C2Rgb,
        7 => A2Rgb,
        8 => TexcRgb,
        9 => TexaRgb,
        10 => RascRgb,
        11 => One,
        12 => Half,
        13 => Konst,
        14 => Zero,
        other => return Err(GxDlError::UnmappedTexCoord(other)),
    })
}

fn alpha_arg_from_u8(v: u8) -> Result<TevAlphaArg, GxDlError> {
    use TevAlphaArg::*;
    Ok(match v {
        0 => AprevAlpha,
        1 => A0Alpha,
        2 => A1Alpha,
        3 => A2Alpha,
        4 => TexAlpha,
        5 => RasAlpha,
        6 => KonstAlpha,
        7 => Zero,
        other => return Err(GxDlError::UnmappedTexCoord(other)),
    })
}

fn reg_id_from_u8(v: u8) -> TevRegId {
    match v & 0x3 {
        0 => TevRegId::Prev,
        1 => TevRegId::Reg0,
        2 => TevRegId::Reg1,
        _ => TevRegId::Reg2,
    }
}

fn scale_from_u8(v: u8) -> TevScale {
    match v & 0x3 {
        0 => TevScale::Scale1,
        1 => TevScale::Scale2,
        2 => TevScale::Scale4,
        _ => TevScale::DivideBy2,
    }
}

// ---------------------------------------------------------------------------
// Stage configuration
// ---------------------------------------------------------------------------

/// One of the (up to 16) TEV stages. `tex_coord`/`tex_map` of `0xff` means
/// "no texture sampled this stage", matching the sentinel used throughout
/// `coordToMapLut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TevStageConfig {
    pub color_in: [TevColorArg; 4],
    pub alpha_in: [TevAlphaArg; 4],
    pub color_op: TevOp,
    pub alpha_op: TevOp,
    pub color_bias: TevBias,
    pub alpha_bias: TevBias,
    /// Only read when `color_bias == TevBias::Compare`.
    pub color_compare: TevCompareMode,
    /// Only read when `alpha_bias == TevBias::Compare`.
    pub alpha_compare: TevCompareMode,
    pub color_scale: TevScale,
    pub alpha_scale: TevScale,
    pub color_clamp: bool,
    pub alpha_clamp: bool,
    pub color_reg_id: TevRegId,
    pub alpha_reg_id: TevRegId,
    pub konst_color_sel: u8,
    pub konst_alpha_sel: u8,
    pub ras_sel: u8,
    pub tex_coord: u8,
    pub tex_map: u8,
    /// Selects which of the material's 4 swap-table entries remaps the
    /// rasterized color's channels before it reaches the combiner.
    pub ras_swap: u8,
    /// Same remap, applied to the sampled texture color.
    pub tex_swap: u8,
}

impl Default for TevStageConfig {
    fn default() -> Self {
        TevStageConfig {
            color_in: [
                TevColorArg::Zero,
                TevColorArg::Zero,
                TevColorArg::Zero,
                TevColorArg::TexcRgb,
            ],
            alpha_in: [
                TevAlphaArg::Zero,
                TevAlphaArg::Zero,
                TevAlphaArg::Zero,
                TevAlphaArg::TexAlpha,
            ],
            color_op: TevOp::Add,
            alpha_op: TevOp::Add,
            color_bias: TevBias::Zero,
            alpha_bias: TevBias::Zero,
            color_compare: TevCompareMode::R8Gt,
            alpha_compare: TevCompareMode::R8Gt,
            color_scale: TevScale::Scale1,
            alpha_scale: TevScale::Scale1,
            color_clamp: true,
            alpha_clamp: true,
            color_reg_id: TevRegId::Prev,
            alpha_reg_id: TevRegId::Prev,
            konst_color_sel: 0,
            konst_alpha_sel: 0,
            ras_sel: 7, // ColorChannelId::None
            tex_coord: 0xff,
            tex_map: 0xff,
            ras_swap: 0,
            tex_swap: 0,
        }
    }
}

/// One entry of the material's 4-slot channel-swap table: which source
/// channel (R=0, G=1, B=2, A=3) feeds each destination channel. The
/// identity mapping is the default every unconfigured stage resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapTableEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for SwapTableEntry {
    fn default() -> Self {
        SwapTableEntry { r: 0, g: 1, b: 2, a: 3 }
    }
}

impl SwapTableEntry {
    fn to_word(self) -> u32 {
        (self.r as u32 & 0x3) | ((self.g as u32 & 0x3) << 2) | ((self.b as u32 & 0x3) << 4) | ((self.a as u32 & 0x3) << 6)
    }

    fn from_word(word: u32) -> Self {
        SwapTableEntry {
            r: (word & 0x3) as u8,
            g: ((word >> 2) & 0x3) as u8,
            b: ((word >> 4) & 0x3) as u8,
            a: ((word >> 6) & 0x3) as u8,
        }
    }
}

/// `shaderDlSizes`: the exact display-list byte length `RunDisplayList`
/// expects to consume when re-parsing a shader with `n` stages, indexed by
/// stage count.
pub const SHADER_DL_SIZES: [u32; 16] = [
    160, 160, 192, 192, 256, 256, 288, 288, 352, 352, 384, 384, 448, 448, 480, 480,
];

pub fn shader_dl_size(num_stages: usize) -> Result<u32, GxDlError> {
    SHADER_DL_SIZES
        .get(num_stages)
        .copied()
        .ok_or(GxDlError::TooManyStages(num_stages))
}

/// Builds the 8-entry coordinate-to-texmap lookup table from the stages'
/// own texcoord/texmap pairs plus any indirect-order pairs, matching
/// `toBinaryTev`'s construction: unused slots default to `0xff`.
pub fn build_coord_to_map_lut(
    stages: &[TevStageConfig],
    indirect_order_pairs: &[(u8, u8)],
) -> [u8; 8] {
    let mut lut = [0xffu8; 8];
    for stage in stages {
        if stage.tex_coord != 0xff && stage.tex_map != 0xff {
            lut[stage.tex_coord as usize] = stage.tex_map;
        }
    }
    for &(coord, map) in indirect_order_pairs {
        if coord != 0xff && map != 0xff {
            lut[coord as usize] = map;
        }
    }
    lut
}

/// A stage's packed konst-selector/order/color/alpha/indirect registers,
/// written two-at-a-time ("couples") into a fixed 48-byte slot regardless
/// of how many real stages are present — unused couples are written as an
/// all-zero "blank DL". `shader_dl_size` reports the shorter length a
/// console `RunDisplayList` call would actually read for a given stage
/// count; this codec always emits the full `TEV_DL_LEN` body and lets a
/// material's declared stage count select how much of it is meaningful.
const COUPLE_LEN: usize = 48;
const COUPLES_PER_TEV: usize = 8;
/// Header section before the first stage couple: 4 swap-table writes plus
/// one indirect-order write, padded to a 0x60 (96) byte boundary.
const HEADER_LEN: usize = 0x60;
/// Total byte length of a [`encode_tev_dl`] body: the fixed header plus all
/// 8 stage couples.
pub const TEV_DL_LEN: usize = HEADER_LEN + COUPLE_LEN * COUPLES_PER_TEV;

/// Per-stage register base addresses. A 4th register (`EXT`) carries the
/// fields that don't fit in the 24-bit-masked `COLOR`/`ALPHA`/`ORDER`
/// triple that mirrors the hardware combiner/order registers.
const fn color_addr(id: u8) -> u8 {
    0x30 + id
}
const fn alpha_addr(id: u8) -> u8 {
    0x40 + id
}
const fn order_addr(id: u8) -> u8 {
    0x50 + id
}
const fn ext_addr(id: u8) -> u8 {
    0x60 + id
}

fn encode_stage(writes: &mut Vec<RegisterWrite>, id: u8, stage: &TevStageConfig) {
    let color_word = (stage.color_in[0] as u32)
        | ((stage.color_in[1] as u32) << 4)
        | ((stage.color_in[2] as u32) << 8)
        | ((stage.color_in[3] as u32) << 12)
        | ((stage.color_op as u32) << 16)
        | ((stage.color_bias as u32) << 17)
        | ((stage.color_clamp as u32) << 19)
        | ((stage.color_scale as u32) << 20)
        | ((stage.color_reg_id as u32) << 22);
    writes.push(RegisterWrite::bp(color_addr(id), color_word));

    let alpha_word = (stage.alpha_in[0] as u32)
        | ((stage.alpha_in[1] as u32) << 4)
        | ((stage.alpha_in[2] as u32) << 8)
        | ((stage.alpha_in[3] as u32) << 12)
        | ((stage.alpha_op as u32) << 16)
        | ((stage.alpha_bias as u32) << 17)
        | ((stage.alpha_clamp as u32) << 19)
        | ((stage.alpha_scale as u32) << 20)
        | ((stage.alpha_reg_id as u32) << 22);
    writes.push(RegisterWrite::bp(alpha_addr(id), alpha_word));

    let order_word = (stage.tex_coord as u32) | ((stage.tex_map as u32) << 8);
    writes.push(RegisterWrite::bp(order_addr(id), order_word));

    let ext_word = (stage.konst_color_sel as u32 & 0x1f)
        | ((stage.konst_alpha_sel as u32 & 0x1f) << 5)
        | ((stage.ras_sel as u32 & 0x7) << 10)
        | ((stage.color_compare as u32 & 0x7) << 13)
        | ((stage.alpha_compare as u32 & 0x7) << 16)
        | ((stage.ras_swap as u32 & 0x3) << 19)
        | ((stage.tex_swap as u32 & 0x3) << 21);
    writes.push(RegisterWrite::bp(ext_addr(id), ext_word));
}

fn decode_stage(state: &super::GpuRegisterState, id: u8) -> Result<TevStageConfig, GxDlError> {
    let color_word = state.bp(color_addr(id)).unwrap_or(0);
    let alpha_word = state.bp(alpha_addr(id)).unwrap_or(0);
    let order_word = state.bp(order_addr(id)).unwrap_or(0);
    let ext_word = state.bp(ext_addr(id)).unwrap_or(0);

    Ok(TevStageConfig {
        color_in: [
            color_arg_from_u8((color_word & 0xf) as u8)?,
            color_arg_from_u8(((color_word >> 4) & 0xf) as u8)?,
            color_arg_from_u8(((color_word >> 8) & 0xf) as u8)?,
            color_arg_from_u8(((color_word >> 12) & 0xf) as u8)?,
        ],
        alpha_in: [
            alpha_arg_from_u8((alpha_word & 0xf) as u8)?,
            alpha_arg_from_u8(((alpha_word >> 4) & 0xf) as u8)?,
            alpha_arg_from_u8(((alpha_word >> 8) & 0xf) as u8)?,
            alpha_arg_from_u8(((alpha_word >> 12) & 0xf) as u8)?,
        ],
        color_op: if (color_word >> 16) & 1 == 0 { TevOp::Add } else { TevOp::Sub },
        alpha_op: if (alpha_word >> 16) & 1 == 0 { TevOp::Add } else { TevOp::Sub },
        color_bias: bias_from_u8(((color_word >> 17) & 0x3) as u8),
        alpha_bias: bias_from_u8(((alpha_word >> 17) & 0x3) as u8),
        color_compare: compare_mode_from_u8(((ext_word >> 13) & 0x7) as u8),
        alpha_compare: compare_mode_from_u8(((ext_word >> 16) & 0x7) as u8),
        color_scale: scale_from_u8(((color_word >> 20) & 0x3) as u8),
        alpha_scale: scale_from_u8(((alpha_word >> 20) & 0x3) as u8),
        color_clamp: (color_word >> 19) & 1 != 0,
        alpha_clamp: (alpha_word >> 19) & 1 != 0,
        color_reg_id: reg_id_from_u8(((color_word >> 22) & 0x3) as u8),
        alpha_reg_id: reg_id_from_u8(((alpha_word >> 22) & 0x3) as u8),
        konst_color_sel: (ext_word & 0x1f) as u8,
        konst_alpha_sel: ((ext_word >> 5) & 0x1f) as u8,
        ras_sel: ((ext_word >> 10) & 0x7) as u8,
        tex_coord: (order_word & 0xff) as u8,
        tex_map: ((order_word >> 8) & 0xff) as u8,
        ras_swap: ((ext_word >> 19) & 0x3) as u8,
        tex_swap: ((ext_word >> 21) & 0x3) as u8,
    })
}

/// Encodes `stages` (at most 16) into the fixed 480-byte TEV display list
/// body: a 96-byte header carrying `swap_table` and `indirect_order`, then
/// 8 forty-eight-byte stage couples (the trailing ones blank when
/// `stages.len()` is smaller), matching `BinaryTevDL::write`'s
/// always-8-couples layout.
pub fn encode_tev_dl(
    stages: &[TevStageConfig],
    swap_table: &[SwapTableEntry; 4],
    indirect_order: u32,
) -> Result<Vec<u8>, GxDlError> {
    if stages.len() > 16 {
        return Err(GxDlError::TooManyStages(stages.len()));
    }
    let mut writes = Vec::new();
    for (i, entry) in swap_table.iter().enumerate() {
        writes.push(RegisterWrite::bp(0x04 + i as u8, entry.to_word()));
    }
    writes.push(RegisterWrite::bp(0x27, indirect_order));

    let mut out = super::dl::encode(&writes);
    out.resize(HEADER_LEN, 0);

    for couple in 0..COUPLES_PER_TEV {
        let mut couple_bytes = Vec::new();
        let even = stages.get(couple * 2).copied().unwrap_or_default();
        let odd = stages.get(couple * 2 + 1).copied();

        if couple * 2 < stages.len() {
            let mut writes = Vec::new();
            encode_stage(&mut writes, (couple * 2) as u8, &even);
            if let Some(odd) = odd {
                encode_stage(&mut writes, (couple * 2 + 1) as u8, &odd);
            }
            couple_bytes = super::dl::encode(&writes);
        }
        couple_bytes.resize(COUPLE_LEN, 0);
        out.extend_from_slice(&couple_bytes);
    }

    Ok(out)
}

/// Decodes a TEV display list body produced by [`encode_tev_dl`] back into
/// `num_stages` stage configurations plus the header's swap table and
/// indirect-order word.
pub fn decode_tev_dl(
    dl: &[u8],
    num_stages: usize,
) -> Result<(Vec<TevStageConfig>, [SwapTableEntry; 4], u32), GxDlError> {
    if num_stages > 16 {
        return Err(GxDlError::TooManyStages(num_stages));
    }
    let mut stages = Vec::with_capacity(num_stages);
    let mut state = super::GpuRegisterState::new();

    let header_end = HEADER_LEN.min(dl.len());
    let header_writes = super::dl::decode(&dl[..header_end])?;
    state.apply(&header_writes);

    let mut swap_table = [SwapTableEntry::default(); 4];
    for (i, entry) in swap_table.iter_mut().enumerate() {
        *entry = SwapTableEntry::from_word(state.bp(0x04 + i as u8).unwrap_or(0));
    }
    let indirect_order = state.bp(0x27).unwrap_or(0);

    for couple in 0..COUPLES_PER_TEV {
        let start = HEADER_LEN + couple * COUPLE_LEN;
        let end = (start + COUPLE_LEN).min(dl.len());
        if start >= dl.len() {
            break;
        }
        let writes = super::dl::decode(&dl[start..end])?;
        state.apply(&writes);
    }

    for i in 0..num_stages {
        stages.push(decode_stage(&state, i as u8)?);
    }
    Ok((stages, swap_table, indirect_order))
}
