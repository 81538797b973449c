//! The editable, semantic view of a material: the form a caller
//! constructs or inspects, independent of how the hardware register state
//! happens to be packed.

use crate::gx::TevStageConfig;

use super::mat_dl::{AlphaCompare, BlendMode, DstAlpha, ZMode};

/// Scale/rotate/translate transform applied to a texture coordinate before
/// sampling. `TexMatrix::build_flags` encodes which parts are the
/// identity, matching `BuildTexMatrixFlags`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexMatrix {
    pub scale: [f32; 2],
    pub rotate: f32,
    pub translate: [f32; 2],
}

impl Default for TexMatrix {
    fn default() -> Self {
        TexMatrix {
            scale: [1.0, 1.0],
            rotate: 0.0,
            translate: [0.0, 0.0],
        }
    }
}

impl TexMatrix {
    /// Bit 0 is always set; bits 1-3 flag each component as being the
    /// identity transform, letting a reader skip recomputing it.
    pub fn build_flags(&self) -> u32 {
        let identity_scale = (self.scale == [1.0, 1.0]) as u32;
        let identity_rotate = (self.rotate == 0.0) as u32;
        let identity_translate = (self.translate == [0.0, 0.0]) as u32;
        1 | (identity_scale << 1) | (identity_rotate << 2) | (identity_translate << 3)
    }
}

/// One color channel's lighting control word. Channels are written in
/// pairs; a material with an odd number of real channels gets a disabled
/// placeholder appended so the pair count stays even (see
/// [`crate::material::convert`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelControl {
    pub enabled: bool,
    pub material_source: u8,
    pub ambient_source: u8,
    pub lit_mask: u8,
    pub diffuse_fn: u8,
    pub attenuation_fn: u8,
}

/// The six-way indirect texture mapping mode table, the "EGG extension"
/// entries (`envlight`/`envspec`) included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MapMode {
    Standard = 0,
    Env = 1,
    ViewProj = 2,
    EnvLight = 3,
    EnvSpec = 4,
    Proj = 5,
}

/// Selects which of an indirect stage's two scale-exponent fields feeds
/// the `U`/`V` texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndirectTextureScalePair {
    pub u: u8,
    pub v: u8,
}

/// A sampler's texture binding plus the GX wrap/filter/LOD/lookup state that
/// `BinaryMaterial::write`'s sampler entries carry alongside the texture
/// name (`binary::Sampler` only keeps the four fields the old high-level
/// view tracked; this is the full editable form of the same binding).
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub texture_name: String,
    pub wrap_u: u8,
    pub wrap_v: u8,
    pub min_filter: u8,
    pub mag_filter: u8,
    pub lod_bias: f32,
    pub max_aniso: u8,
    /// Indirect-lookup mode for this sampler, mirroring [`MapMode`] at the
    /// sampler rather than the indirect-stage level.
    pub lookup_mode: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            texture_name: String::new(),
            wrap_u: 1,
            wrap_v: 1,
            min_filter: 1,
            mag_filter: 1,
            lod_bias: 0.0,
            max_aniso: 0,
            lookup_mode: MapMode::Standard as u8,
        }
    }
}

/// A complete material: channel lighting, up to 8 texture matrices and
/// samplers, up to 3 indirect matrices, and the TEV shader stages that
/// combine it all into a pixel color, plus the render-state fields
/// (translucency, early depth test, lighting/fog references, alpha
/// compare, blend, depth, and destination-alpha) that drive how the
/// shader's output is actually composited.
#[derive(Debug, Clone, PartialEq)]
pub struct G3dMaterialData {
    pub name: String,
    pub flag: u32,
    pub cull_mode: u32,
    /// Translucent draw pass. Mirrors `xlu` on the binary material flag
    /// word but kept as its own field since callers toggle it far more
    /// often than the rest of `flag`.
    pub xlu: bool,
    /// Early depth test: run the Z test before the TEV shader rather than
    /// after, so occluded pixels skip shading entirely.
    pub early_z: bool,
    /// Index into the model's lighting array, or `None` for no lightset.
    pub light_set: Option<u8>,
    /// Index into the model's fog array, or `None` for no fog.
    pub fog_index: Option<u8>,
    pub channel_controls: Vec<ChannelControl>,
    pub tex_matrices: Vec<TexMatrix>,
    pub samplers: Vec<SamplerConfig>,
    pub ind_scales: Vec<IndirectTextureScalePair>,
    pub ind_matrices: Vec<crate::gx::IndMtx>,
    pub stages: Vec<TevStageConfig>,
    pub tev_colors: [[i16; 4]; 3],
    pub tev_konst_colors: [[u8; 4]; 4],
    pub alpha_compare: AlphaCompare,
    pub blend_mode: BlendMode,
    pub z_mode: ZMode,
    pub dst_alpha: DstAlpha,
}

impl Default for G3dMaterialData {
    fn default() -> Self {
        G3dMaterialData {
            name: String::new(),
            flag: 0,
            cull_mode: 0,
            xlu: false,
            early_z: true,
            light_set: None,
            fog_index: None,
            channel_controls: Vec::new(),
            tex_matrices: Vec::new(),
            samplers: Vec::new(),
            ind_scales: Vec::new(),
            ind_matrices: Vec::new(),
            stages: vec![TevStageConfig::default()],
            tev_colors: [[0, 0, 0, 0]; 3],
            tev_konst_colors: [[255, 255, 255, 255]; 4],
            alpha_compare: AlphaCompare::default(),
            blend_mode: BlendMode::default(),
            z_mode: ZMode::default(),
            dst_alpha: DstAlpha::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tex_matrix_flags_all_set() {
        let m = TexMatrix::default();
        assert_eq!(m.build_flags(), 1 | 0b1110);
    }

    #[test]
    fn non_identity_scale_clears_its_bit() {
        let m = TexMatrix {
            scale: [2.0, 1.0],
            ..TexMatrix::default()
        };
        assert_eq!(m.build_flags() & 0b10, 0);
        assert_eq!(m.build_flags() & 0b1, 1);
    }
}
