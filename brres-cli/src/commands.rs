//! CLI command handlers: each wraps a `brres-core` operation with the file
//! I/O the library itself deliberately stays out of.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brres_core::model::{format_metadata_header, validate_single_material_target, Archive, CrateAnimation};
use brres_core::szs::{self, Algo};

pub fn szs_decode(input: &Path, output: &Path) -> Result<()> {
    let packed = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let expanded_size = szs::get_expanded_size(&packed)
        .with_context(|| format!("{} is not a valid Yaz0 stream", input.display()))?;

    let mut expanded = vec![0u8; expanded_size as usize];
    szs::decode(&mut expanded, &packed).context("Yaz0 decode failed")?;

    fs::write(output, &expanded).with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{} -> {}: {} bytes compressed, {} bytes expanded",
        input.display(),
        output.display(),
        packed.len(),
        expanded.len()
    );
    Ok(())
}

pub fn szs_encode(input: &Path, output: &Path, algo: Algo) -> Result<()> {
    let raw = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let packed = szs::encode(&raw, algo);
    fs::write(output, &packed).with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{} -> {}: {} bytes -> {} bytes ({algo:?})",
        input.display(),
        output.display(),
        raw.len(),
        packed.len()
    );
    Ok(())
}

pub fn brres_info(input: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let archive = Archive::read(&data).context("failed to parse archive")?;

    println!("{}", input.display());
    println!("  {} texture(s)", archive.textures.len());
    for tex in &archive.textures {
        println!("    {} ({:?}, {}x{}, {} mip level(s))", tex.name, tex.format, tex.width, tex.height, tex.mip_count());
    }
    println!("  {} model(s)", archive.models.len());
    for model in &archive.models {
        println!("    {}", model.name);
        println!("      {} material(s), {} mesh(es), {} bone(s)", model.materials.len(), model.meshes.len(), model.bones.len());
        for mat in &model.materials {
            println!("        material {:?}, {} sampler(s)", mat.name, mat.samplers.len());
        }
    }
    println!("  {} animation(s)", archive.animations.len());
    Ok(())
}

/// Extracts `material_name` out of `model_name` in the archive at `input`,
/// pulls in every texture its samplers reference, and packs the result as
/// a `.rspreset` with the given provenance header.
pub fn preset_pack(input: &Path, model_name: &str, material_name: &str, output: &Path, timestamp: &str) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let archive = Archive::read(&data).context("failed to parse archive")?;

    let model = archive
        .models
        .iter()
        .find(|m| m.name == model_name)
        .with_context(|| format!("no model named {model_name:?} in {}", input.display()))?;

    let mat = model
        .materials
        .iter()
        .find(|m| m.name == material_name)
        .with_context(|| format!("no material named {material_name:?} in model {model_name:?}"))?
        .clone();

    let tex = mat
        .samplers
        .iter()
        .map(|sampler| {
            archive
                .textures
                .iter()
                .find(|t| t.name == sampler.texture_name)
                .cloned()
                .with_context(|| format!("sampler references unknown texture {:?}", sampler.texture_name))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut preset = CrateAnimation { mat, tex, srt: Vec::new() };
    validate_single_material_target(&mut preset).context("preset rejected")?;

    let metadata = format_metadata_header(timestamp, &input.display().to_string(), None).context("failed to format metadata header")?;
    let bytes = preset.pack(&metadata).context("failed to pack preset")?;
    fs::write(output, &bytes).with_context(|| format!("failed to write {}", output.display()))?;

    println!("packed {} ({} texture(s)) -> {}", material_name, preset.tex.len(), output.display());
    Ok(())
}

/// Unpacks a `.rspreset`, prints its provenance header and material, and
/// writes every bundled texture out as a PNG next to `output_dir`.
pub fn preset_unpack(input: &Path, output_dir: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let (metadata, preset) = CrateAnimation::unpack(&data).context("failed to unpack preset")?;

    println!("{metadata}");
    println!("material: {}", preset.mat.name);
    println!("{} sampler(s), {} texture(s), {} SRT0 animation(s)", preset.mat.samplers.len(), preset.tex.len(), preset.srt.len());

    fs::create_dir_all(output_dir).with_context(|| format!("failed to create {}", output_dir.display()))?;
    for tex in &preset.tex {
        let image = tex.decode().with_context(|| format!("failed to decode texture {}", tex.name))?;
        let path: PathBuf = output_dir.join(format!("{}.png", tex.name));
        image.save(&path).with_context(|| format!("failed to write {}", path.display()))?;
        println!("  wrote {}", path.display());
    }
    Ok(())
}
