//! On-disk material layout: header scalars, the TEV shader reference, the
//! sampler list, and the fixed-size [`MatDl`] display list, in the field
//! order `BinaryMaterial::read`/`writeBody` walk.

use crate::diagnostics::{Diagnostics, IoMessageClass, NullDiagnostics};
use crate::gx::{decode_tev_dl, encode_tev_dl, SwapTableEntry, TevStageConfig, TEV_DL_LEN};
use crate::io::{NameTable, Reader, RelocWriter};

use super::mat_dl::MatDl;
use super::MaterialError;

#[derive(Debug, Clone, PartialEq)]
pub struct Sampler {
    pub texture_name: String,
    pub wrap_u: u8,
    pub wrap_v: u8,
    pub min_filter: u8,
    pub mag_filter: u8,
    pub lod_bias: f32,
    pub max_aniso: u8,
    pub lookup_mode: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMaterial {
    pub name: String,
    pub id: u32,
    pub flag: u32,
    pub num_color_chan_controls: u8,
    pub num_tex_gens: u8,
    pub num_ind_stages: u8,
    pub cull_mode: u32,
    /// Index into the model's lighting array, `0xff` for none.
    pub light_set: u8,
    /// Index into the model's fog array, `0xff` for none.
    pub fog_index: u8,
    pub samplers: Vec<Sampler>,
    pub stages: Vec<TevStageConfig>,
    pub swap_table: [SwapTableEntry; 4],
    pub indirect_order: u32,
    pub dl: MatDl,
}

impl BinaryMaterial {
    /// Writes the header scalars and sampler list, then the fixed
    /// [`MatDl`] display list followed by the TEV shader's own display
    /// list, matching `toBinaryTev`'s placement of the shader body
    /// immediately after the material's pixel/uniform/indirect/texgen DL.
    /// `names` collects the material's own name and each sampler's
    /// texture name for later pooling.
    pub fn write(&self, writer: &mut RelocWriter, names: &mut NameTable) -> Result<(), MaterialError> {
        let mat_start = writer.position();
        names.write_name_forward(writer, mat_start, &self.name);
        writer.inner_mut().u32(self.id);
        writer.inner_mut().u32(self.flag);
        writer.inner_mut().u8(self.num_color_chan_controls);
        writer.inner_mut().u8(self.num_tex_gens);
        writer.inner_mut().u8(self.num_ind_stages);
        writer.inner_mut().u8(self.stages.len() as u8);
        writer.inner_mut().u32(self.cull_mode);
        writer.inner_mut().u8(self.light_set);
        writer.inner_mut().u8(self.fog_index);
        writer.inner_mut().u32(self.samplers.len() as u32);

        for s in &self.samplers {
            names.write_name_forward(writer, mat_start, &s.texture_name);
            writer.inner_mut().u8(s.wrap_u);
            writer.inner_mut().u8(s.wrap_v);
            writer.inner_mut().u8(s.min_filter);
            writer.inner_mut().u8(s.mag_filter);
            writer.inner_mut().f32(s.lod_bias);
            writer.inner_mut().u8(s.max_aniso);
            writer.inner_mut().u8(s.lookup_mode);
        }

        let dl_bytes = self.dl.write()?;
        writer.inner_mut().align(32, 0);
        writer.inner_mut().bytes(&dl_bytes);

        let tev_bytes = encode_tev_dl(&self.stages, &self.swap_table, self.indirect_order)?;
        writer.inner_mut().bytes(&tev_bytes);
        Ok(())
    }

    /// Parses a material with no interest in its non-fatal oddities.
    /// Equivalent to [`Self::read_with_diagnostics`] with [`NullDiagnostics`].
    pub fn read(reader: &mut Reader, num_samplers: usize) -> Result<Self, MaterialError> {
        Self::read_with_diagnostics(reader, num_samplers, &mut NullDiagnostics)
    }

    /// Parses a material, reporting recoverable oddities to `diag` instead
    /// of silently accepting them: a stage whose `tex_coord` reaches past
    /// the header's declared `num_tex_gens`, and a coord-to-map LUT (the
    /// stages' `tex_map` values, in stage order, sentinel `0xff` entries
    /// skipped) that isn't strictly increasing, which `build_coord_to_map_lut`
    /// assumes real content always is.
    pub fn read_with_diagnostics(reader: &mut Reader, num_samplers: usize, diag: &mut dyn Diagnostics) -> Result<Self, MaterialError> {
        let name_offset = reader.u32()? as usize;
        let name = reader.cstr_at(name_offset, 256)?;
        let id = reader.u32()?;
        let flag = reader.u32()?;
        let num_color_chan_controls = reader.u8()?;
        let num_tex_gens = reader.u8()?;
        let num_ind_stages = reader.u8()?;
        let num_tev_stages = reader.u8()?;
        let cull_mode = reader.u32()?;
        let light_set = reader.u8()?;
        let fog_index = reader.u8()?;
        let sampler_count = reader.u32()? as usize;

        let mut samplers = Vec::with_capacity(sampler_count.min(num_samplers));
        for _ in 0..sampler_count {
            let tex_name_offset = reader.u32()? as usize;
            let texture_name = reader.cstr_at(tex_name_offset, 256)?;
            let wrap_u = reader.u8()?;
            let wrap_v = reader.u8()?;
            let min_filter = reader.u8()?;
            let mag_filter = reader.u8()?;
            let lod_bias = reader.f32()?;
            let max_aniso = reader.u8()?;
            let lookup_mode = reader.u8()?;
            samplers.push(Sampler {
                texture_name,
                wrap_u,
                wrap_v,
                min_filter,
                mag_filter,
                lod_bias,
                max_aniso,
                lookup_mode,
            });
        }

        reader.skip((32 - reader.position() % 32) % 32)?;
        let dl_bytes = reader.bytes(0x180)?;
        let dl = MatDl::parse(dl_bytes, num_ind_stages as usize, num_tex_gens as usize)?;

        let tev_bytes = reader.bytes(TEV_DL_LEN)?;
        let (stages, swap_table, indirect_order) = decode_tev_dl(tev_bytes, num_tev_stages as usize)?;

        for (i, stage) in stages.iter().enumerate() {
            if stage.tex_coord != 0xff && stage.tex_coord as usize >= num_tex_gens as usize {
                diag.report(
                    IoMessageClass::Warning,
                    "mat",
                    &format!("material {name:?} stage {i} reads tex_coord {}, past its declared {num_tex_gens} tex gen(s)", stage.tex_coord),
                );
            }
        }

        let mut last_tex_map = None;
        for (i, stage) in stages.iter().enumerate() {
            if stage.tex_map == 0xff {
                continue;
            }
            if let Some(prev) = last_tex_map {
                if stage.tex_map <= prev {
                    diag.report(
                        IoMessageClass::Warning,
                        "mat",
                        &format!("material {name:?} stage {i} samples tex_map {}, not strictly after the previous stage's {prev}", stage.tex_map),
                    );
                }
            }
            last_tex_map = Some(stage.tex_map);
        }

        Ok(BinaryMaterial {
            name,
            id,
            flag,
            num_color_chan_controls,
            num_tex_gens,
            num_ind_stages,
            cull_mode,
            light_set,
            fog_index,
            samplers,
            stages,
            swap_table,
            indirect_order,
            dl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::mat_dl::{AlphaCompare, BlendMode, DstAlpha, ZMode};

    fn sample_dl() -> MatDl {
        MatDl {
            alpha_compare: AlphaCompare::default(),
            z_mode: ZMode::default(),
            blend_mode: BlendMode::default(),
            dst_alpha: DstAlpha::default(),
            tev_colors: [[0, 0, 0, 0]; 3],
            tev_konst_colors: [[255, 255, 255, 255]; 4],
            scales: Vec::new(),
            ind_matrices: Vec::new(),
            tex_gens: Vec::new(),
        }
    }

    #[test]
    fn round_trips_header_and_samplers() {
        let mat = BinaryMaterial {
            name: "metal_mat".to_owned(),
            id: 3,
            flag: 0x20,
            num_color_chan_controls: 1,
            num_tex_gens: 0,
            num_ind_stages: 0,
            cull_mode: 2,
            light_set: 0xff,
            fog_index: 0xff,
            samplers: vec![Sampler {
                texture_name: "metal_diffuse".to_owned(),
                wrap_u: 1,
                wrap_v: 1,
                min_filter: 4,
                mag_filter: 1,
                lod_bias: 0.0,
                max_aniso: 0,
                lookup_mode: 0,
            }],
            stages: Vec::new(),
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };

        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let parsed = BinaryMaterial::read(&mut reader, 1).unwrap();
        assert_eq!(parsed.name, "metal_mat");
        assert_eq!(parsed.id, 3);
        assert_eq!(parsed.cull_mode, 2);
        assert_eq!(parsed.samplers.len(), 1);
        assert_eq!(parsed.samplers[0].texture_name, "metal_diffuse");
        assert_eq!(parsed.samplers[0].min_filter, 4);
        assert_eq!(parsed.light_set, 0xff);
        assert_eq!(parsed.fog_index, 0xff);
        assert!(parsed.stages.is_empty());
    }

    #[test]
    fn round_trips_light_set_and_fog_index() {
        let mut mat = BinaryMaterial {
            name: "lit_mat".to_owned(),
            id: 0,
            flag: 0,
            num_color_chan_controls: 1,
            num_tex_gens: 0,
            num_ind_stages: 0,
            cull_mode: 0,
            light_set: 2,
            fog_index: 1,
            samplers: Vec::new(),
            stages: Vec::new(),
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };
        mat.light_set = 2;
        mat.fog_index = 1;

        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let parsed = BinaryMaterial::read(&mut reader, 0).unwrap();
        assert_eq!(parsed.light_set, 2);
        assert_eq!(parsed.fog_index, 1);
    }

    #[test]
    fn round_trips_tev_stages() {
        use crate::gx::{TevOp, TevStageConfig};

        let mut stage0 = TevStageConfig::default();
        stage0.tex_coord = 0;
        stage0.tex_map = 0;
        let mut stage1 = TevStageConfig::default();
        stage1.tex_coord = 1;
        stage1.tex_map = 1;
        stage1.color_op = TevOp::Sub;
        stage1.konst_color_sel = 5;

        let mat = BinaryMaterial {
            name: "two_stage_mat".to_owned(),
            id: 0,
            flag: 0,
            num_color_chan_controls: 1,
            num_tex_gens: 2,
            num_ind_stages: 0,
            cull_mode: 0,
            light_set: 0xff,
            fog_index: 0xff,
            samplers: Vec::new(),
            stages: vec![stage0, stage1],
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };

        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let parsed = BinaryMaterial::read(&mut reader, 0).unwrap();
        assert_eq!(parsed.stages.len(), 2);
        assert_eq!(parsed.stages[1].color_op, TevOp::Sub);
        assert_eq!(parsed.stages[1].konst_color_sel, 5);
        assert_eq!(parsed.stages[1].tex_map, 1);
    }

    struct Collector(Vec<(IoMessageClass, String)>);

    impl Diagnostics for Collector {
        fn report(&mut self, level: IoMessageClass, domain: &str, body: &str) {
            self.0.push((level, format!("[{domain}] {body}")));
        }
    }

    #[test]
    fn warns_when_a_stage_reads_past_the_declared_tex_gen_count() {
        let mut stage = TevStageConfig::default();
        stage.tex_coord = 2;
        stage.tex_map = 0;

        let mat = BinaryMaterial {
            name: "stale_gen_info".to_owned(),
            id: 0,
            flag: 0,
            num_color_chan_controls: 1,
            num_tex_gens: 1,
            num_ind_stages: 0,
            cull_mode: 0,
            light_set: 0xff,
            fog_index: 0xff,
            samplers: Vec::new(),
            stages: vec![stage],
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };

        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let mut collector = Collector(Vec::new());
        BinaryMaterial::read_with_diagnostics(&mut reader, 0, &mut collector).unwrap();
        assert_eq!(collector.0.len(), 1);
        assert_eq!(collector.0[0].0, IoMessageClass::Warning);
        assert!(collector.0[0].1.contains("tex_coord 2"));
    }

    #[test]
    fn warns_when_the_sampler_lut_is_not_strictly_increasing() {
        let mut stage0 = TevStageConfig::default();
        stage0.tex_coord = 0;
        stage0.tex_map = 2;
        let mut stage1 = TevStageConfig::default();
        stage1.tex_coord = 1;
        stage1.tex_map = 1;

        let mat = BinaryMaterial {
            name: "out_of_order_lut".to_owned(),
            id: 0,
            flag: 0,
            num_color_chan_controls: 1,
            num_tex_gens: 2,
            num_ind_stages: 0,
            cull_mode: 0,
            light_set: 0xff,
            fog_index: 0xff,
            samplers: Vec::new(),
            stages: vec![stage0, stage1],
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };

        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let mut collector = Collector(Vec::new());
        BinaryMaterial::read_with_diagnostics(&mut reader, 0, &mut collector).unwrap();
        assert_eq!(collector.0.len(), 1);
        assert!(collector.0[0].1.contains("tex_map 1"));
    }

    #[test]
    fn well_formed_stages_report_nothing() {
        let mut stage0 = TevStageConfig::default();
        stage0.tex_coord = 0;
        stage0.tex_map = 0;
        let mut stage1 = TevStageConfig::default();
        stage1.tex_coord = 1;
        stage1.tex_map = 1;

        let mat = BinaryMaterial {
            name: "well_formed".to_owned(),
            id: 0,
            flag: 0,
            num_color_chan_controls: 1,
            num_tex_gens: 2,
            num_ind_stages: 0,
            cull_mode: 0,
            light_set: 0xff,
            fog_index: 0xff,
            samplers: Vec::new(),
            stages: vec![stage0, stage1],
            swap_table: [SwapTableEntry::default(); 4],
            indirect_order: 0,
            dl: sample_dl(),
        };
        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();
        mat.write(&mut writer, &mut names).unwrap();
        names.resolve(&mut writer);
        let bytes = writer.into_vec();

        let mut reader = Reader::new(&bytes);
        let mut collector = Collector(Vec::new());
        BinaryMaterial::read_with_diagnostics(&mut reader, 0, &mut collector).unwrap();
        assert!(collector.0.is_empty());
    }
}
