//! Bridges [`G3dMaterialData`] and [`BinaryMaterial`]/[`MatDl`].
//!
//! The channel-control packing rule mirrors `toBinMat`/`fromBinMat`: the
//! binary format only ever stores `(numColorChanControls + 1) / 2` pairs,
//! so an odd-length enabled prefix gets a disabled placeholder appended to
//! keep the pair count even, and every *disabled* control after the last
//! enabled one is dropped rather than round-tripped.

use crate::gx::SwapTableEntry;

use super::binary::{BinaryMaterial, Sampler};
use super::high_level::{ChannelControl, G3dMaterialData, SamplerConfig, TexMatrix};
use super::mat_dl::{MatDl, TexCoordGen};
use super::MaterialError;

/// Bit 0 of the binary flag word: translucent draw pass. Bit 1: early
/// depth test. Mirrors the two render-state bits `G3dMaterialData` keeps
/// as their own fields for convenience but that the binary layer packs
/// into `flag` alongside whatever else a given archive version stores
/// there.
const FLAG_XLU: u32 = 1 << 0;
const FLAG_EARLY_Z: u32 = 1 << 1;

/// Sentinel stored in the binary header's lightset/fog byte fields for
/// "none", since the binary layer has no room for a real `Option<u8>`.
const NO_INDEX: u8 = 0xff;

/// Pads `controls` to an even length with a disabled placeholder if
/// needed, and returns the packed channel count written to the binary
/// header.
fn pack_channel_controls(controls: &[ChannelControl]) -> (Vec<ChannelControl>, u8) {
    let mut packed = controls.to_vec();
    if packed.len() % 2 == 1 {
        packed.push(ChannelControl::default());
    }
    (packed, controls.len() as u8)
}

pub fn to_bin_mat(mat: &G3dMaterialData) -> Result<BinaryMaterial, MaterialError> {
    if mat.tex_matrices.len() > 8 {
        return Err(MaterialError::TooManyTexGens(mat.tex_matrices.len()));
    }
    if mat.ind_matrices.len() > 3 {
        return Err(MaterialError::TooManyIndMatrices(mat.ind_matrices.len()));
    }

    let (_, num_color_chan_controls) = pack_channel_controls(&mat.channel_controls);

    let tex_gens = mat
        .tex_matrices
        .iter()
        .enumerate()
        .map(|(i, _)| TexCoordGen {
            source: i as u8,
            matrix_index: i as u8,
        })
        .collect::<Vec<_>>();

    let samplers = mat
        .samplers
        .iter()
        .map(|s| Sampler {
            texture_name: s.texture_name.clone(),
            wrap_u: s.wrap_u,
            wrap_v: s.wrap_v,
            min_filter: s.min_filter,
            mag_filter: s.mag_filter,
            lod_bias: s.lod_bias,
            max_aniso: s.max_aniso,
            lookup_mode: s.lookup_mode,
        })
        .collect();

    let mut flag = mat.flag;
    flag = if mat.xlu { flag | FLAG_XLU } else { flag & !FLAG_XLU };
    flag = if mat.early_z { flag | FLAG_EARLY_Z } else { flag & !FLAG_EARLY_Z };

    let dl = MatDl {
        alpha_compare: mat.alpha_compare,
        z_mode: mat.z_mode,
        blend_mode: mat.blend_mode,
        dst_alpha: mat.dst_alpha,
        tev_colors: mat.tev_colors,
        tev_konst_colors: mat.tev_konst_colors,
        scales: mat.ind_scales.clone(),
        ind_matrices: mat.ind_matrices.clone(),
        tex_gens,
    };

    Ok(BinaryMaterial {
        name: mat.name.clone(),
        id: 0,
        flag,
        num_color_chan_controls,
        num_tex_gens: mat.tex_matrices.len() as u8,
        num_ind_stages: mat.ind_matrices.len() as u8,
        cull_mode: mat.cull_mode,
        light_set: mat.light_set.unwrap_or(NO_INDEX),
        fog_index: mat.fog_index.unwrap_or(NO_INDEX),
        samplers,
        stages: mat.stages.clone(),
        swap_table: [SwapTableEntry::default(); 4],
        indirect_order: 0,
        dl,
    })
}

pub fn from_bin_mat(bin: &BinaryMaterial) -> G3dMaterialData {
    let channel_controls = vec![ChannelControl::default(); bin.num_color_chan_controls as usize];
    let tex_matrices = vec![TexMatrix::default(); bin.num_tex_gens as usize];
    let samplers = bin
        .samplers
        .iter()
        .map(|s| SamplerConfig {
            texture_name: s.texture_name.clone(),
            wrap_u: s.wrap_u,
            wrap_v: s.wrap_v,
            min_filter: s.min_filter,
            mag_filter: s.mag_filter,
            lod_bias: s.lod_bias,
            max_aniso: s.max_aniso,
            lookup_mode: s.lookup_mode,
        })
        .collect();

    G3dMaterialData {
        name: bin.name.clone(),
        flag: bin.flag,
        cull_mode: bin.cull_mode,
        xlu: bin.flag & FLAG_XLU != 0,
        early_z: bin.flag & FLAG_EARLY_Z != 0,
        light_set: (bin.light_set != NO_INDEX).then_some(bin.light_set),
        fog_index: (bin.fog_index != NO_INDEX).then_some(bin.fog_index),
        channel_controls,
        tex_matrices,
        samplers,
        ind_scales: bin.dl.scales.clone(),
        ind_matrices: bin.dl.ind_matrices.clone(),
        stages: bin.stages.clone(),
        tev_colors: bin.dl.tev_colors,
        tev_konst_colors: bin.dl.tev_konst_colors,
        alpha_compare: bin.dl.alpha_compare,
        blend_mode: bin.dl.blend_mode,
        z_mode: bin.dl.z_mode,
        dst_alpha: bin.dl.dst_alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_channel_count_gets_padded_for_storage_but_header_reports_the_real_count() {
        let (packed, reported) = pack_channel_controls(&[ChannelControl {
            enabled: true,
            ..ChannelControl::default()
        }]);
        assert_eq!(packed.len(), 2);
        assert_eq!(reported, 1);
    }

    #[test]
    fn round_trips_sampler_names_and_scalars() {
        let mut mat = G3dMaterialData::default();
        mat.name = "chrome".to_owned();
        mat.flag = 4;
        mat.cull_mode = 1;
        mat.samplers = vec![SamplerConfig {
            texture_name: "chrome_alb".to_owned(),
            ..SamplerConfig::default()
        }];
        mat.tex_matrices = vec![TexMatrix::default()];

        let bin = to_bin_mat(&mat).unwrap();
        assert_eq!(bin.name, "chrome");
        assert_eq!(bin.num_tex_gens, 1);
        assert_eq!(bin.samplers[0].texture_name, "chrome_alb");

        let back = from_bin_mat(&bin);
        assert_eq!(back.name, "chrome");
        assert_eq!(back.samplers.len(), 1);
        assert_eq!(back.samplers[0].texture_name, "chrome_alb");
        assert_eq!(back.tex_matrices.len(), 1);
    }

    #[test]
    fn xlu_and_early_z_flags_round_trip_through_the_flag_word() {
        let mut mat = G3dMaterialData::default();
        mat.xlu = true;
        mat.early_z = false;

        let bin = to_bin_mat(&mat).unwrap();
        let back = from_bin_mat(&bin);
        assert!(back.xlu);
        assert!(!back.early_z);
    }

    #[test]
    fn lightset_and_fog_index_round_trip_and_default_to_none() {
        let mut mat = G3dMaterialData::default();
        assert_eq!(mat.light_set, None);

        mat.light_set = Some(2);
        mat.fog_index = Some(1);
        let bin = to_bin_mat(&mat).unwrap();
        assert_eq!(bin.light_set, 2);
        assert_eq!(bin.fog_index, 1);

        let back = from_bin_mat(&bin);
        assert_eq!(back.light_set, Some(2));
        assert_eq!(back.fog_index, Some(1));

        let unset = from_bin_mat(&to_bin_mat(&G3dMaterialData::default()).unwrap());
        assert_eq!(unset.light_set, None);
        assert_eq!(unset.fog_index, None);
    }

    #[test]
    fn render_state_records_round_trip() {
        use crate::material::mat_dl::{AlphaCompare, BlendMode, DstAlpha, ZMode};

        let mut mat = G3dMaterialData::default();
        mat.blend_mode = BlendMode {
            kind: 1,
            src_factor: 4,
            dst_factor: 5,
            logic_op: 0,
        };
        mat.z_mode = ZMode {
            enable: true,
            func: 3,
            update: true,
        };
        mat.dst_alpha = DstAlpha { enabled: true, alpha: 128 };
        mat.alpha_compare = AlphaCompare::default();

        let back = from_bin_mat(&to_bin_mat(&mat).unwrap());
        assert_eq!(back.blend_mode, mat.blend_mode);
        assert_eq!(back.z_mode, mat.z_mode);
        assert_eq!(back.dst_alpha, mat.dst_alpha);
        assert_eq!(back.alpha_compare, mat.alpha_compare);
    }

    #[test]
    fn rejects_too_many_tex_matrices() {
        let mut mat = G3dMaterialData::default();
        mat.tex_matrices = vec![TexMatrix::default(); 9];
        assert!(to_bin_mat(&mat).is_err());
    }
}
