//! Pixel format decode (and, for the uncompressed formats, encode) for the
//! eight GX texture formats a TEX0 can carry.
//!
//! CMPR is DXT1-compatible S3TC stored in the console's 8x8 macro-tile
//! layout (four 4x4 sub-blocks in Z-order); the intensity/color formats
//! tile at 8x4 or 4x4 depending on their per-pixel bit depth. Only decode
//! is provided for CMPR — encoding it well needs a real block-compressor
//! and is out of scope here.

use image::{Rgba, RgbaImage};

use super::TextureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexFormat {
    Cmpr,
    I4,
    I8,
    IA4,
    IA8,
    Rgb565,
    Rgb5A3,
    Rgba8,
}

impl TexFormat {
    pub fn from_gx_tag(tag: u8) -> Result<Self, TextureError> {
        match tag {
            0x00 => Ok(Self::I4),
            0x01 => Ok(Self::I8),
            0x02 => Ok(Self::IA4),
            0x03 => Ok(Self::IA8),
            0x04 => Ok(Self::Rgb565),
            0x05 => Ok(Self::Rgb5A3),
            0x06 => Ok(Self::Rgba8),
            0x08 => Ok(Self::Cmpr),
            other => Err(TextureError::UnknownFormat(other)),
        }
    }

    pub fn gx_tag(self) -> u8 {
        match self {
            Self::I4 => 0x00,
            Self::I8 => 0x01,
            Self::IA4 => 0x02,
            Self::IA8 => 0x03,
            Self::Rgb565 => 0x04,
            Self::Rgb5A3 => 0x05,
            Self::Rgba8 => 0x06,
            Self::Cmpr => 0x08,
        }
    }

    /// Tile dimensions the format is stored in, `None` for CMPR's 8x8
    /// macro-tile-of-sub-blocks layout which doesn't fit this shape.
    fn tile_size(self) -> (u32, u32) {
        match self {
            Self::I4 => (8, 8),
            Self::I8 | Self::IA4 => (8, 4),
            Self::IA8 | Self::Rgb565 | Self::Rgb5A3 | Self::Rgba8 => (4, 4),
            Self::Cmpr => (8, 8),
        }
    }

    pub fn decode(self, data: &[u8], width: u32, height: u32) -> Result<RgbaImage, TextureError> {
        match self {
            Self::Cmpr => decode_cmpr(data, width, height),
            Self::I4 => decode_i4(data, width, height),
            Self::I8 => decode_i8(data, width, height),
            Self::IA4 => decode_ia4(data, width, height),
            Self::IA8 => decode_ia8(data, width, height),
            Self::Rgb565 => decode_rgb565(data, width, height),
            Self::Rgb5A3 => decode_rgb5a3(data, width, height),
            Self::Rgba8 => decode_rgba8(data, width, height),
        }
    }

    pub fn encode(self, image: &RgbaImage) -> Result<Vec<u8>, TextureError> {
        match self {
            Self::Cmpr => Err(TextureError::EncodingUnsupported(self)),
            Self::I4 => Ok(encode_i4(image)),
            Self::I8 => Ok(encode_i8(image)),
            Self::IA4 => Ok(encode_ia4(image)),
            Self::IA8 => Ok(encode_ia8(image)),
            Self::Rgb565 => Ok(encode_rgb565(image)),
            Self::Rgb5A3 => Ok(encode_rgb5a3(image)),
            Self::Rgba8 => Ok(encode_rgba8(image)),
        }
    }
}

fn expand5(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

fn expand6(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

fn require(data: &[u8], len: usize, format: TexFormat, width: u32, height: u32) -> Result<(), TextureError> {
    if data.len() < len {
        Err(TextureError::TruncatedData {
            format,
            width,
            height,
            len: data.len(),
        })
    } else {
        Ok(())
    }
}

fn decode_cmpr(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, TextureError> {
    let mut image = RgbaImage::new(width, height);
    let (tile_w, tile_h) = TexFormat::Cmpr.tile_size();
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);
    let mut offset = 0usize;

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            for sub in 0..4u32 {
                let sub_x = (sub % 2) * 4;
                let sub_y = (sub / 2) * 4;
                if offset + 8 > data.len() {
                    return Err(TextureError::TruncatedData {
                        format: TexFormat::Cmpr,
                        width,
                        height,
                        len: data.len(),
                    });
                }
                let block = &data[offset..offset + 8];
                offset += 8;

                let c0 = u16::from_be_bytes([block[0], block[1]]);
                let c1 = u16::from_be_bytes([block[2], block[3]]);
                let palette = dxt1_palette(c0, c1);

                for row in 0..4u32 {
                    let bits = block[4 + row as usize];
                    for col in 0..4u32 {
                        let idx = ((bits >> (6 - col * 2)) & 0x03) as usize;
                        let px = tx * tile_w + sub_x + col;
                        let py = ty * tile_h + sub_y + row;
                        if px < width && py < height {
                            image.put_pixel(px, py, Rgba(palette[idx]));
                        }
                    }
                }
            }
        }
    }
    Ok(image)
}

fn dxt1_palette(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let r0 = expand5(((c0 >> 11) & 0x1f) as u8);
    let g0 = expand6(((c0 >> 5) & 0x3f) as u8);
    let b0 = expand5((c0 & 0x1f) as u8);
    let r1 = expand5(((c1 >> 11) & 0x1f) as u8);
    let g1 = expand6(((c1 >> 5) & 0x3f) as u8);
    let b1 = expand5((c1 & 0x1f) as u8);

    if c0 > c1 {
        [
            [r0, g0, b0, 255],
            [r1, g1, b1, 255],
            [
                ((2 * r0 as u16 + r1 as u16) / 3) as u8,
                ((2 * g0 as u16 + g1 as u16) / 3) as u8,
                ((2 * b0 as u16 + b1 as u16) / 3) as u8,
                255,
            ],
            [
                ((r0 as u16 + 2 * r1 as u16) / 3) as u8,
                ((g0 as u16 + 2 * g1 as u16) / 3) as u8,
                ((b0 as u16 + 2 * b1 as u16) / 3) as u8,
                255,
            ],
        ]
    } else {
        [
            [r0, g0, b0, 255],
            [r1, g1, b1, 255],
            [
                ((r0 as u16 + r1 as u16) / 2) as u8,
                ((g0 as u16 + g1 as u16) / 2) as u8,
                ((b0 as u16 + b1 as u16) / 2) as u8,
                255,
            ],
            [0, 0, 0, 0],
        ]
    }
}

macro_rules! tile_decode {
    ($name:ident, $tile_w:expr, $tile_h:expr, $per_pixel:expr, $read:expr) => {
        fn $name(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, TextureError> {
            let mut image = RgbaImage::new(width, height);
            let tiles_x = width.div_ceil($tile_w);
            let tiles_y = height.div_ceil($tile_h);
            let mut offset = 0usize;
            for ty in 0..tiles_y {
                for tx in 0..tiles_x {
                    for row in 0..$tile_h {
                        for col in 0..$tile_w {
                            if offset + $per_pixel > data.len() {
                                continue;
                            }
                            let px = tx * $tile_w + col;
                            let py = ty * $tile_h + row;
                            let pixel: [u8; 4] = $read(&data[offset..offset + $per_pixel]);
                            offset += $per_pixel;
                            if px < width && py < height {
                                image.put_pixel(px, py, Rgba(pixel));
                            }
                        }
                    }
                }
            }
            Ok(image)
        }
    };
}

tile_decode!(decode_i8, 8, 4, 1, |b: &[u8]| { let i = b[0]; [i, i, i, 255] });
tile_decode!(decode_ia4, 8, 4, 1, |b: &[u8]| {
    let a = ((b[0] >> 4) & 0xf) * 17;
    let i = (b[0] & 0xf) * 17;
    [i, i, i, a]
});
tile_decode!(decode_ia8, 4, 4, 2, |b: &[u8]| { let a = b[0]; let i = b[1]; [i, i, i, a] });
tile_decode!(decode_rgb565, 4, 4, 2, |b: &[u8]| {
    let w = u16::from_be_bytes([b[0], b[1]]);
    [
        expand5(((w >> 11) & 0x1f) as u8),
        expand6(((w >> 5) & 0x3f) as u8),
        expand5((w & 0x1f) as u8),
        255,
    ]
});
tile_decode!(decode_rgb5a3, 4, 4, 2, |b: &[u8]| {
    let w = u16::from_be_bytes([b[0], b[1]]);
    if w & 0x8000 != 0 {
        [
            expand5(((w >> 10) & 0x1f) as u8),
            expand5(((w >> 5) & 0x1f) as u8),
            expand5((w & 0x1f) as u8),
            255,
        ]
    } else {
        let a3 = ((w >> 12) & 0x7) as u8;
        [
            ((w >> 8) & 0xf) as u8 * 17,
            ((w >> 4) & 0xf) as u8 * 17,
            (w & 0xf) as u8 * 17,
            (a3 << 5) | (a3 << 2) | (a3 >> 1),
        ]
    }
});

fn decode_i4(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, TextureError> {
    let mut image = RgbaImage::new(width, height);
    let (tile_w, tile_h) = TexFormat::I4.tile_size();
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);
    let mut offset = 0usize;
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            for row in 0..tile_h {
                for col in (0..tile_w).step_by(2) {
                    if offset >= data.len() {
                        continue;
                    }
                    let byte = data[offset];
                    offset += 1;
                    let hi = ((byte >> 4) & 0xf) * 17;
                    let lo = (byte & 0xf) * 17;
                    let px = tx * tile_w + col;
                    let py = ty * tile_h + row;
                    if px < width && py < height {
                        image.put_pixel(px, py, Rgba([hi, hi, hi, 255]));
                    }
                    if px + 1 < width && py < height {
                        image.put_pixel(px + 1, py, Rgba([lo, lo, lo, 255]));
                    }
                }
            }
        }
    }
    Ok(image)
}

fn decode_rgba8(data: &[u8], width: u32, height: u32) -> Result<RgbaImage, TextureError> {
    let mut image = RgbaImage::new(width, height);
    let (tile_w, tile_h) = TexFormat::Rgba8.tile_size();
    let tile_size = 64usize;
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);
    let mut offset = 0usize;
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            require(data, offset + tile_size, TexFormat::Rgba8, width, height)?;
            let ar = &data[offset..offset + 32];
            let gb = &data[offset + 32..offset + 64];
            offset += tile_size;
            for row in 0..tile_h {
                for col in 0..tile_w {
                    let i = (row * tile_w + col) as usize;
                    let px = tx * tile_w + col;
                    let py = ty * tile_h + row;
                    if px < width && py < height {
                        image.put_pixel(px, py, Rgba([ar[i * 2 + 1], gb[i * 2], gb[i * 2 + 1], ar[i * 2]]));
                    }
                }
            }
        }
    }
    Ok(image)
}

fn quantize5(v: u8) -> u8 {
    v >> 3
}

fn quantize6(v: u8) -> u8 {
    v >> 2
}

fn encode_i4(image: &RgbaImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let (tile_w, tile_h) = TexFormat::I4.tile_size();
    let mut out = Vec::new();
    for ty in (0..height.max(1)).step_by(tile_h as usize).take(height.div_ceil(tile_h).max(1) as usize) {
        for tx in (0..width.max(1)).step_by(tile_w as usize).take(width.div_ceil(tile_w).max(1) as usize) {
            for row in 0..tile_h {
                for col in (0..tile_w).step_by(2) {
                    let hi = sample_intensity(image, tx + col, ty + row, width, height);
                    let lo = sample_intensity(image, tx + col + 1, ty + row, width, height);
                    out.push(((hi / 17) << 4) | (lo / 17));
                }
            }
        }
    }
    out
}

fn sample_intensity(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> u8 {
    if x < width && y < height {
        image.get_pixel(x, y).0[0]
    } else {
        0
    }
}

fn encode_i8(image: &RgbaImage) -> Vec<u8> {
    tile_encode(image, TexFormat::I8.tile_size(), |image, x, y, w, h| {
        vec![if x < w && y < h { image.get_pixel(x, y).0[0] } else { 0 }]
    })
}

fn encode_ia4(image: &RgbaImage) -> Vec<u8> {
    tile_encode(image, TexFormat::IA4.tile_size(), |image, x, y, w, h| {
        if x < w && y < h {
            let p = image.get_pixel(x, y).0;
            vec![((p[3] / 17) << 4) | (p[0] / 17)]
        } else {
            vec![0]
        }
    })
}

fn encode_ia8(image: &RgbaImage) -> Vec<u8> {
    tile_encode(image, TexFormat::IA8.tile_size(), |image, x, y, w, h| {
        if x < w && y < h {
            let p = image.get_pixel(x, y).0;
            vec![p[3], p[0]]
        } else {
            vec![0, 0]
        }
    })
}

fn encode_rgb565(image: &RgbaImage) -> Vec<u8> {
    tile_encode(image, TexFormat::Rgb565.tile_size(), |image, x, y, w, h| {
        let p = if x < w && y < h { image.get_pixel(x, y).0 } else { [0; 4] };
        let word = ((quantize5(p[0]) as u16) << 11) | ((quantize6(p[1]) as u16) << 5) | quantize5(p[2]) as u16;
        word.to_be_bytes().to_vec()
    })
}

fn encode_rgb5a3(image: &RgbaImage) -> Vec<u8> {
    tile_encode(image, TexFormat::Rgb5A3.tile_size(), |image, x, y, w, h| {
        let p = if x < w && y < h { image.get_pixel(x, y).0 } else { [0; 4] };
        let word = if p[3] == 255 {
            0x8000 | ((quantize5(p[0]) as u16) << 10) | ((quantize5(p[1]) as u16) << 5) | quantize5(p[2]) as u16
        } else {
            let a3 = (p[3] >> 5) as u16;
            (a3 << 12) | (((p[0] / 17) as u16) << 8) | (((p[1] / 17) as u16) << 4) | (p[2] / 17) as u16
        };
        word.to_be_bytes().to_vec()
    })
}

fn encode_rgba8(image: &RgbaImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let (tile_w, tile_h) = TexFormat::Rgba8.tile_size();
    let mut out = Vec::new();
    for ty in (0..height.max(1)).step_by(tile_h as usize).take(height.div_ceil(tile_h).max(1) as usize) {
        for tx in (0..width.max(1)).step_by(tile_w as usize).take(width.div_ceil(tile_w).max(1) as usize) {
            let mut ar = Vec::with_capacity(32);
            let mut gb = Vec::with_capacity(32);
            for row in 0..tile_h {
                for col in 0..tile_w {
                    let (x, y) = (tx + col, ty + row);
                    let p = if x < width && y < height { image.get_pixel(x, y).0 } else { [0; 4] };
                    ar.push(p[3]);
                    ar.push(p[0]);
                    gb.push(p[1]);
                    gb.push(p[2]);
                }
            }
            out.extend_from_slice(&ar);
            out.extend_from_slice(&gb);
        }
    }
    out
}

fn tile_encode(
    image: &RgbaImage,
    (tile_w, tile_h): (u32, u32),
    mut pixel: impl FnMut(&RgbaImage, u32, u32, u32, u32) -> Vec<u8>,
) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let mut out = Vec::new();
    for ty in (0..height.max(1)).step_by(tile_h as usize).take(height.div_ceil(tile_h).max(1) as usize) {
        for tx in (0..width.max(1)).step_by(tile_w as usize).take(width.div_ceil(tile_w).max(1) as usize) {
            for row in 0..tile_h {
                for col in 0..tile_w {
                    out.extend(pixel(image, tx + col, ty + row, width, height));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba as ImgRgba;

    fn solid_image(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_fn(w, h, |_, _| ImgRgba(color))
    }

    #[test]
    fn i8_round_trips_intensity() {
        let img = solid_image(8, 4, [200, 200, 200, 255]);
        let bytes = TexFormat::I8.encode(&img).unwrap();
        let decoded = TexFormat::I8.decode(&bytes, 8, 4).unwrap();
        assert_eq!(decoded.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn rgb565_round_trips_within_quantization() {
        let img = solid_image(4, 4, [0x20, 0x40, 0x20, 255]);
        let bytes = TexFormat::Rgb565.encode(&img).unwrap();
        let decoded = TexFormat::Rgb565.decode(&bytes, 4, 4).unwrap();
        let p = decoded.get_pixel(0, 0).0;
        assert!((p[0] as i32 - 0x20).abs() <= 8);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn cmpr_decode_reports_truncated_input() {
        let err = TexFormat::Cmpr.decode(&[0u8; 4], 8, 8);
        assert!(err.is_err());
    }

    #[test]
    fn cmpr_encode_is_unsupported() {
        let img = solid_image(8, 8, [1, 2, 3, 255]);
        assert!(TexFormat::Cmpr.encode(&img).is_err());
    }

    #[test]
    fn gx_tag_round_trips() {
        for fmt in [
            TexFormat::I4,
            TexFormat::I8,
            TexFormat::IA4,
            TexFormat::IA8,
            TexFormat::Rgb565,
            TexFormat::Rgb5A3,
            TexFormat::Rgba8,
            TexFormat::Cmpr,
        ] {
            assert_eq!(TexFormat::from_gx_tag(fmt.gx_tag()).unwrap(), fmt);
        }
    }
}
