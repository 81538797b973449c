//! `Tex0`: a named, GX-format-tagged texture with its mipmap chain.
//!
//! This carries only the image payload a BRRES archive stores per texture —
//! name resolution against the archive's pooled name table and placement in
//! the section layout are an archive-assembly concern, not this one.

use image::RgbaImage;

use crate::io::{Reader, ReaderError, Writer};

use super::{TexFormat, TextureError};

#[derive(Debug, Clone, PartialEq)]
pub struct Tex0 {
    pub name: String,
    pub format: TexFormat,
    pub width: u16,
    pub height: u16,
    /// Mip level 0 (full resolution) first, each already encoded in `format`.
    pub mip_levels: Vec<Vec<u8>>,
}

impl Tex0 {
    pub fn new(name: impl Into<String>, format: TexFormat, width: u16, height: u16, base_level: Vec<u8>) -> Self {
        Tex0 {
            name: name.into(),
            format,
            width,
            height,
            mip_levels: vec![base_level],
        }
    }

    pub fn mip_count(&self) -> u8 {
        self.mip_levels.len() as u8
    }

    /// Encodes `image` as the sole (level 0) mip of a new texture in `format`.
    pub fn from_image(name: impl Into<String>, format: TexFormat, image: &RgbaImage) -> Result<Self, TextureError> {
        let (width, height) = image.dimensions();
        let encoded = format.encode(image)?;
        Ok(Tex0::new(name, format, width as u16, height as u16, encoded))
    }

    /// Dimensions of mip `level`, halving (never below 1px) per level.
    pub fn level_dimensions(&self, level: usize) -> (u32, u32) {
        let w = (self.width as u32 >> level).max(1);
        let h = (self.height as u32 >> level).max(1);
        (w, h)
    }

    pub fn decode_level(&self, level: usize) -> Result<RgbaImage, TextureError> {
        let data = self
            .mip_levels
            .get(level)
            .ok_or(TextureError::TruncatedData {
                format: self.format,
                width: self.width as u32,
                height: self.height as u32,
                len: 0,
            })?;
        let (w, h) = self.level_dimensions(level);
        self.format.decode(data, w, h)
    }

    pub fn decode(&self) -> Result<RgbaImage, TextureError> {
        self.decode_level(0)
    }

    /// Appends a mip level encoded from `image`, which must be the correctly
    /// halved dimensions for `self.mip_levels.len()`.
    pub fn push_mip(&mut self, image: &RgbaImage) -> Result<(), TextureError> {
        let encoded = self.format.encode(image)?;
        self.mip_levels.push(encoded);
        Ok(())
    }

    /// Reads a texture's encoded body. The caller supplies `format`/`width`/
    /// `height`/`mip_count` and `name`, as read from the archive's TEX0 block
    /// header and name table; this reads only the pixel payload that follows.
    pub fn read_body(
        reader: &mut Reader,
        name: impl Into<String>,
        format: TexFormat,
        width: u16,
        height: u16,
        mip_count: u8,
    ) -> Result<Self, ReaderError> {
        let mut tex = Tex0::new(name, format, width, height, Vec::new());
        tex.mip_levels.clear();
        for level in 0..mip_count.max(1) as usize {
            let (w, h) = tex.level_dimensions(level);
            let len = encoded_len(format, w, h);
            tex.mip_levels.push(reader.bytes(len)?.to_vec());
        }
        Ok(tex)
    }

    pub fn write_body(&self, writer: &mut Writer) {
        for level in &self.mip_levels {
            writer.bytes(level);
        }
    }
}

/// Byte length of one mip level's encoded payload for the uncompressed
/// formats and CMPR's fixed 4-bits-per-pixel rate.
fn encoded_len(format: TexFormat, width: u32, height: u32) -> usize {
    let pixels = width as usize * height as usize;
    match format {
        TexFormat::I4 => pixels / 2,
        TexFormat::I8 | TexFormat::IA4 => pixels,
        TexFormat::IA8 | TexFormat::Rgb565 | TexFormat::Rgb5A3 => pixels * 2,
        TexFormat::Rgba8 => pixels * 4,
        TexFormat::Cmpr => pixels / 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn from_image_round_trips_through_decode() {
        let image = RgbaImage::from_fn(8, 4, |_, _| Rgba([10, 20, 30, 255]));
        let tex = Tex0::from_image("tex_diffuse", TexFormat::I8, &image).unwrap();
        assert_eq!(tex.mip_count(), 1);
        let decoded = tex.decode().unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
    }

    #[test]
    fn level_dimensions_halve_and_floor_at_one() {
        let tex = Tex0::new("t", TexFormat::Rgba8, 8, 4, Vec::new());
        assert_eq!(tex.level_dimensions(0), (8, 4));
        assert_eq!(tex.level_dimensions(1), (4, 2));
        assert_eq!(tex.level_dimensions(2), (2, 1));
        assert_eq!(tex.level_dimensions(3), (1, 1));
    }

    #[test]
    fn read_body_reads_exactly_the_encoded_payload_per_level() {
        let image = RgbaImage::from_fn(4, 4, |_, _| Rgba([1, 2, 3, 255]));
        let tex = Tex0::from_image("t", TexFormat::Rgba8, &image).unwrap();
        let mut writer = Writer::new();
        tex.write_body(&mut writer);
        let buf = writer.into_vec();

        let mut reader = Reader::new(&buf);
        let read_back = Tex0::read_body(&mut reader, "t", TexFormat::Rgba8, 4, 4, 1).unwrap();
        assert_eq!(read_back.mip_levels, tex.mip_levels);
        assert_eq!(reader.remaining(), 0);
    }
}
