//! The `.rspreset` crate preset: a single material, the textures its
//! samplers reference, and the SRT0 animations that drive it, plus the
//! provenance header every preset carries.
//!
//! A preset names exactly one material. `validate_single_material_target`
//! enforces that every bundled animation actually targets that material —
//! mixing animations authored for other materials into one preset would
//! leave a reader unable to tell which ones to keep.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::anim::BinaryAnim;
use crate::io::{NameTable, Reader, RelocWriter, Writer};
use crate::material::{from_bin_mat, to_bin_mat, BinaryMaterial, G3dMaterialData};
use crate::texture::Tex0;

use super::ArchiveError;

const MAGIC: &[u8; 4] = b"rsp1";

/// A preset's material, the textures its samplers draw on, and every
/// animation bundled alongside it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrateAnimation {
    pub mat: G3dMaterialData,
    pub tex: Vec<Tex0>,
    pub srt: Vec<BinaryAnim>,
}

/// Optional structured provenance recorded after the `{BEGIN_STRUCTURED_DATA}`
/// marker in a preset's metadata header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetMetadataJson {
    pub tool: String,
    pub created: String,
    /// SHA-256 of the material name and every sampler/texture name it
    /// references, hex-encoded. Lets a consumer notice a preset was
    /// re-exported over a differently-wired material without re-parsing
    /// the whole binary body.
    pub content_hash: String,
}

/// Formats the `"RiiStudio {timestamp}; Source {path}"` header every preset
/// carries, optionally followed by a `{BEGIN_STRUCTURED_DATA}` JSON block.
pub fn format_metadata_header(timestamp: &str, source_path: &str, structured: Option<&PresetMetadataJson>) -> Result<String, ArchiveError> {
    let mut header = format!("RiiStudio {timestamp}; Source {source_path}");
    if let Some(json) = structured {
        header.push_str("{BEGIN_STRUCTURED_DATA}");
        header.push_str(&serde_json::to_string(json).map_err(|e| ArchiveError::InvalidMetadataHeader(e.to_string()))?);
    }
    Ok(header)
}

/// Parses a header written by [`format_metadata_header`] back into its
/// timestamp, source path, and optional structured block.
pub fn parse_metadata_header(header: &str) -> Result<(String, String, Option<PresetMetadataJson>), ArchiveError> {
    let (prefix, structured) = match header.split_once("{BEGIN_STRUCTURED_DATA}") {
        Some((prefix, json)) => (prefix, Some(json)),
        None => (header, None),
    };

    let prefix = prefix
        .strip_prefix("RiiStudio ")
        .ok_or_else(|| ArchiveError::InvalidMetadataHeader(header.to_owned()))?;
    let (timestamp, rest) = prefix
        .split_once("; Source ")
        .ok_or_else(|| ArchiveError::InvalidMetadataHeader(header.to_owned()))?;

    let json = structured
        .map(|s| serde_json::from_str(s).map_err(|e| ArchiveError::InvalidMetadataHeader(e.to_string())))
        .transpose()?;

    Ok((timestamp.to_owned(), rest.to_owned(), json))
}

/// SHA-256 of the material's name followed by every sampler name it binds,
/// hex-encoded, for [`PresetMetadataJson::content_hash`].
pub fn content_hash(mat: &G3dMaterialData) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mat.name.as_bytes());
    for sampler in &mat.samplers {
        hasher.update(b"\0");
        hasher.update(sampler.texture_name.as_bytes());
    }
    hex_digest(&hasher.finalize())
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Collects the distinct material names every bundled SRT0's nodes target
/// and, if there's exactly one, retargets them all onto `preset.mat.name`.
/// More than one distinct target is rejected: it's unclear which
/// animations belong to this preset and which were bundled by mistake.
pub fn validate_single_material_target(preset: &mut CrateAnimation) -> Result<(), ArchiveError> {
    let mat_targets: BTreeSet<String> = preset
        .srt
        .iter()
        .flat_map(|srt| srt.nodes.iter())
        .map(|node| node.target_path.clone())
        .collect();

    if mat_targets.len() > 1 {
        return Err(ArchiveError::ExtraneousSrt0 {
            expected: preset.mat.name.clone(),
            found: mat_targets.into_iter().collect(),
        });
    }

    for srt in preset.srt.iter_mut() {
        for node in srt.nodes.iter_mut() {
            node.target_path = preset.mat.name.clone();
        }
    }
    Ok(())
}

impl CrateAnimation {
    /// Packs the preset into its on-disk form: header, magic, the material,
    /// every texture, every animation's frame/wrap/scale-rule header (full
    /// track encoding is the animation component's concern), and a
    /// trailing CRC-32 over everything before it.
    pub fn pack(&self, metadata_header: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = RelocWriter::new();
        let mut names = NameTable::new();

        let header_bytes = metadata_header.as_bytes();
        writer.inner_mut().u32(header_bytes.len() as u32);
        writer.inner_mut().bytes(header_bytes);

        writer.inner_mut().bytes(MAGIC);

        let bin = to_bin_mat(&self.mat)?;
        bin.write(&mut writer, &mut names)?;
        for sampler in &bin.samplers {
            let name_offset = writer.position();
            names.write_name_forward(&mut writer, name_offset, &sampler.texture_name);
        }

        writer.inner_mut().u16(self.tex.len() as u16);
        for tex in &self.tex {
            let start = writer.position();
            names.write_name_forward(&mut writer, start, &tex.name);
            writer.inner_mut().u8(tex.format.gx_tag());
            writer.inner_mut().u8(tex.mip_count());
            writer.inner_mut().u16(tex.width);
            writer.inner_mut().u16(tex.height);
            writer.inner_mut().u16(0); // pad
            tex.write_body(writer.inner_mut());
        }

        writer.inner_mut().u16(self.srt.len() as u16);
        for srt in &self.srt {
            let start = writer.position();
            names.write_name_forward(&mut writer, start, &srt.name);
            writer.inner_mut().f32(srt.frame_duration);
            writer.inner_mut().u8(srt.wrap_mode as u8);
            writer.inner_mut().u8(srt.scale_rule as u8);
            writer.inner_mut().u16(srt.nodes.len() as u16);
        }

        names.resolve(&mut writer);
        let body = writer.into_vec();

        let mut checksum = crc32fast::Hasher::new();
        checksum.update(&body);

        let mut out = Writer::new();
        out.bytes(&body);
        out.u32(checksum.finalize());
        Ok(out.into_vec())
    }

    /// Unpacks bytes produced by [`CrateAnimation::pack`], verifying the
    /// trailing checksum and returning the metadata header alongside the
    /// material and textures. Animations are returned with empty node
    /// lists since track data isn't stored by `pack`.
    pub fn unpack(data: &[u8]) -> Result<(String, CrateAnimation), ArchiveError> {
        if data.len() < 4 {
            return Err(ArchiveError::InvalidMetadataHeader("truncated preset".to_owned()));
        }
        let (body, trailer) = data.split_at(data.len() - 4);
        let stored = u32::from_be_bytes(trailer.try_into().unwrap());
        let mut checksum = crc32fast::Hasher::new();
        checksum.update(body);
        if checksum.finalize() != stored {
            return Err(ArchiveError::ChecksumMismatch);
        }

        let mut reader = Reader::new(body);
        let header_len = reader.u32()? as usize;
        let header_bytes = reader.bytes(header_len)?;
        let metadata_header = String::from_utf8_lossy(header_bytes).into_owned();

        let magic = reader.array::<4>()?;
        if &magic != MAGIC {
            return Err(ArchiveError::BadMagic { found: magic });
        }

        let bin = BinaryMaterial::read(&mut reader, 0)?;
        let mat = from_bin_mat(&bin);
        for _ in &bin.samplers {
            let name_offset = reader.u32()? as usize;
            let _texture_name = reader.cstr_at(name_offset, 256)?;
        }

        let tex_count = reader.u16()? as usize;
        let mut tex = Vec::with_capacity(tex_count);
        for _ in 0..tex_count {
            let name_offset = reader.u32()? as usize;
            let name = reader.cstr_at(name_offset, 256)?;
            let format_tag = reader.u8()?;
            let format = crate::texture::TexFormat::from_gx_tag(format_tag)
                .map_err(|_| ArchiveError::UnknownTextureFormat { name: name.clone(), tag: format_tag })?;
            let mip_count = reader.u8()?;
            let width = reader.u16()?;
            let height = reader.u16()?;
            let _pad = reader.u16()?;
            tex.push(Tex0::read_body(&mut reader, name, format, width, height, mip_count)?);
        }

        let srt_count = reader.u16()? as usize;
        let mut srt = Vec::with_capacity(srt_count);
        for _ in 0..srt_count {
            let name_offset = reader.u32()? as usize;
            let name = reader.cstr_at(name_offset, 256)?;
            let frame_duration = reader.f32()?;
            let wrap_mode = match reader.u8()? {
                1 => crate::anim::WrapMode::Repeat,
                _ => crate::anim::WrapMode::Clamp,
            };
            let scale_rule = match reader.u8()? {
                1 => crate::anim::ScaleRule::Maya,
                2 => crate::anim::ScaleRule::Xsi,
                _ => crate::anim::ScaleRule::Standard,
            };
            let _node_count = reader.u16()?;
            srt.push(BinaryAnim {
                name,
                source_path: String::new(),
                frame_duration,
                wrap_mode,
                scale_rule,
                nodes: Vec::new(),
                track_pool: Vec::new(),
            });
        }

        Ok((metadata_header, CrateAnimation { mat, tex, srt }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{AnimNode, ScaleRule, TrackRef, WrapMode};

    fn sample_anim(name: &str, target: &str) -> BinaryAnim {
        BinaryAnim {
            name: name.to_owned(),
            source_path: String::new(),
            frame_duration: 30.0,
            wrap_mode: WrapMode::Clamp,
            scale_rule: ScaleRule::Standard,
            nodes: vec![AnimNode {
                target_path: target.to_owned(),
                tracks: vec![TrackRef::Const(0.0)],
            }],
            track_pool: Vec::new(),
        }
    }

    #[test]
    fn retargets_every_animation_onto_the_preset_material() {
        let mut preset = CrateAnimation {
            mat: G3dMaterialData {
                name: "metal_mat".to_owned(),
                ..G3dMaterialData::default()
            },
            tex: Vec::new(),
            srt: vec![sample_anim("walk_srt0", "some_other_material")],
        };
        validate_single_material_target(&mut preset).unwrap();
        assert_eq!(preset.srt[0].nodes[0].target_path, "metal_mat");
    }

    #[test]
    fn rejects_srt0_files_targeting_more_than_one_material() {
        let mut preset = CrateAnimation {
            mat: G3dMaterialData {
                name: "metal_mat".to_owned(),
                ..G3dMaterialData::default()
            },
            tex: Vec::new(),
            srt: vec![sample_anim("walk_srt0", "material_a"), sample_anim("run_srt0", "material_b")],
        };
        let err = validate_single_material_target(&mut preset).unwrap_err();
        match err {
            ArchiveError::ExtraneousSrt0 { expected, found } => {
                assert_eq!(expected, "metal_mat");
                assert_eq!(found, vec!["material_a".to_owned(), "material_b".to_owned()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn metadata_header_round_trips_with_structured_data() {
        let mat = G3dMaterialData {
            name: "metal_mat".to_owned(),
            ..G3dMaterialData::default()
        };
        let json = PresetMetadataJson {
            tool: "brres-cli".to_owned(),
            created: "2026-08-01".to_owned(),
            content_hash: content_hash(&mat),
        };
        let header = format_metadata_header("2026-08-01T00:00:00Z", "models/metal.mdl0mat", Some(&json)).unwrap();
        let (timestamp, source, parsed) = parse_metadata_header(&header).unwrap();
        assert_eq!(timestamp, "2026-08-01T00:00:00Z");
        assert_eq!(source, "models/metal.mdl0mat");
        assert_eq!(parsed.unwrap(), json);
    }

    #[test]
    fn metadata_header_round_trips_without_structured_data() {
        let header = format_metadata_header("2026-08-01T00:00:00Z", "models/metal.mdl0mat", None).unwrap();
        let (_, _, parsed) = parse_metadata_header(&header).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn packing_then_unpacking_rejects_a_flipped_trailer_byte() {
        let preset = CrateAnimation {
            mat: G3dMaterialData {
                name: "metal_mat".to_owned(),
                ..G3dMaterialData::default()
            },
            tex: Vec::new(),
            srt: Vec::new(),
        };
        let mut bytes = preset.pack("RiiStudio 2026-08-01; Source models/metal.mdl0mat").unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(CrateAnimation::unpack(&bytes), Err(ArchiveError::ChecksumMismatch)));
    }
}
