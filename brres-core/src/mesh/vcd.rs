//! Vertex descriptor: which of the 21 GX vertex attribute slots a draw
//! stream carries, stored as a compact bitset.

use bitvec::prelude::*;

pub const NUM_VERTEX_ATTRIBUTES: usize = 21;

/// The fixed GX attribute slot order: the position/normal matrix index,
/// eight texture matrix indices, position, normal, two color channels and
/// eight texture coordinate channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexAttribute {
    PositionNormalMatrixIndex = 0,
    TexMatrixIndex0 = 1,
    TexMatrixIndex1 = 2,
    TexMatrixIndex2 = 3,
    TexMatrixIndex3 = 4,
    TexMatrixIndex4 = 5,
    TexMatrixIndex5 = 6,
    TexMatrixIndex6 = 7,
    TexMatrixIndex7 = 8,
    Position = 9,
    Normal = 10,
    Color0 = 11,
    Color1 = 12,
    TexCoord0 = 13,
    TexCoord1 = 14,
    TexCoord2 = 15,
    TexCoord3 = 16,
    TexCoord4 = 17,
    TexCoord5 = 18,
    TexCoord6 = 19,
    TexCoord7 = 20,
}

impl VertexAttribute {
    pub const ALL: [VertexAttribute; NUM_VERTEX_ATTRIBUTES] = [
        VertexAttribute::PositionNormalMatrixIndex,
        VertexAttribute::TexMatrixIndex0,
        VertexAttribute::TexMatrixIndex1,
        VertexAttribute::TexMatrixIndex2,
        VertexAttribute::TexMatrixIndex3,
        VertexAttribute::TexMatrixIndex4,
        VertexAttribute::TexMatrixIndex5,
        VertexAttribute::TexMatrixIndex6,
        VertexAttribute::TexMatrixIndex7,
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Color0,
        VertexAttribute::Color1,
        VertexAttribute::TexCoord0,
        VertexAttribute::TexCoord1,
        VertexAttribute::TexCoord2,
        VertexAttribute::TexCoord3,
        VertexAttribute::TexCoord4,
        VertexAttribute::TexCoord5,
        VertexAttribute::TexCoord6,
        VertexAttribute::TexCoord7,
    ];

    pub fn slot(self) -> usize {
        self as u8 as usize
    }
}

/// How an enabled attribute's per-vertex value is carried in the draw
/// stream, mirroring the GX vertex attribute table's 2-bit-per-attribute
/// `NONE`/`DIRECT`/`INDEX8`/`INDEX16` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncodingType {
    /// Attribute not present in the stream at all.
    None = 0,
    /// The value itself is embedded in the stream, not an index into a
    /// separate attribute array.
    Direct = 1,
    /// An 8-bit index into the attribute's data array.
    Index8 = 2,
    /// A 16-bit index into the attribute's data array.
    Index16 = 3,
}

impl EncodingType {
    fn from_u8(v: u8) -> EncodingType {
        match v & 0x3 {
            0 => EncodingType::None,
            1 => EncodingType::Direct,
            2 => EncodingType::Index8,
            _ => EncodingType::Index16,
        }
    }
}

/// Which of the 21 attribute slots are present on a mesh, as a bitset, plus
/// each enabled slot's index width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexDescriptor {
    present: BitVec<u32>,
    attr_types: [EncodingType; NUM_VERTEX_ATTRIBUTES],
}

impl Default for VertexDescriptor {
    fn default() -> Self {
        VertexDescriptor {
            present: bitvec![u32, Lsb0; 0; NUM_VERTEX_ATTRIBUTES],
            attr_types: [EncodingType::None; NUM_VERTEX_ATTRIBUTES],
        }
    }
}

impl VertexDescriptor {
    pub fn new() -> Self {
        VertexDescriptor::default()
    }

    /// Enables `attr` with the default [`EncodingType::Index16`] this
    /// pipeline always writes; call [`Self::set_encoding`] afterward for a
    /// narrower width.
    pub fn enable(&mut self, attr: VertexAttribute) -> &mut Self {
        self.present.set(attr.slot(), true);
        self.attr_types[attr.slot()] = EncodingType::Index16;
        self
    }

    pub fn has(&self, attr: VertexAttribute) -> bool {
        self.present[attr.slot()]
    }

    pub fn encoding(&self, attr: VertexAttribute) -> EncodingType {
        self.attr_types[attr.slot()]
    }

    /// Overrides an already-enabled attribute's encoding width. A no-op
    /// setting to [`EncodingType::None`] without also disabling the
    /// attribute would desync `present`/`attr_types`, so this only accepts
    /// the three widths that keep an attribute enabled.
    pub fn set_encoding(&mut self, attr: VertexAttribute, ty: EncodingType) {
        if self.has(attr) && ty != EncodingType::None {
            self.attr_types[attr.slot()] = ty;
        }
    }

    pub fn enabled_attrs(&self) -> impl Iterator<Item = VertexAttribute> + '_ {
        VertexAttribute::ALL.into_iter().filter(move |a| self.has(*a))
    }

    /// A mesh with no attributes beyond the position-normal-matrix-index is
    /// degenerate: it carries a matrix index but nothing to transform.
    pub fn is_degenerate(&self) -> bool {
        self.enabled_attrs()
            .all(|a| a == VertexAttribute::PositionNormalMatrixIndex)
    }

    pub fn as_u32(&self) -> u32 {
        self.present.as_raw_slice()[0]
    }

    pub fn from_u32(bits: u32) -> Self {
        let mut present = bitvec![u32, Lsb0; 0; NUM_VERTEX_ATTRIBUTES];
        present.as_raw_mut_slice()[0] = bits;
        let mut attr_types = [EncodingType::None; NUM_VERTEX_ATTRIBUTES];
        for attr in VertexAttribute::ALL {
            if present[attr.slot()] {
                attr_types[attr.slot()] = EncodingType::Index16;
            }
        }
        VertexDescriptor { present, attr_types }
    }

    /// Packs every slot's encoding type two bits at a time, low slot first,
    /// for the fixed 6-byte (21 slots * 2 bits, rounded up) on-disk field
    /// that rides alongside the presence word.
    pub fn encoding_bytes(&self) -> [u8; 6] {
        let mut bits: u64 = 0;
        for (i, ty) in self.attr_types.iter().enumerate() {
            bits |= (*ty as u64) << (i * 2);
        }
        let le = bits.to_le_bytes();
        [le[0], le[1], le[2], le[3], le[4], le[5]]
    }

    pub fn from_parts(present_bits: u32, encoding: [u8; 6]) -> Self {
        let mut descriptor = VertexDescriptor::from_u32(present_bits);
        let mut bits: u64 = 0;
        for (i, b) in encoding.iter().enumerate() {
            bits |= (*b as u64) << (i * 8);
        }
        for attr in VertexAttribute::ALL {
            if descriptor.has(attr) {
                let ty = EncodingType::from_u8(((bits >> (attr.slot() * 2)) & 0x3) as u8);
                descriptor.attr_types[attr.slot()] = if ty == EncodingType::None { EncodingType::Index16 } else { ty };
            }
        }
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_descriptor_is_degenerate() {
        let vcd = VertexDescriptor::new();
        assert!(vcd.is_degenerate());
    }

    #[test]
    fn position_only_is_not_degenerate() {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::PositionNormalMatrixIndex);
        vcd.enable(VertexAttribute::Position);
        assert!(!vcd.is_degenerate());
        assert!(vcd.has(VertexAttribute::Position));
        assert!(!vcd.has(VertexAttribute::Normal));
    }

    #[test]
    fn round_trips_through_u32() {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        vcd.enable(VertexAttribute::TexCoord0);
        let bits = vcd.as_u32();
        let back = VertexDescriptor::from_u32(bits);
        assert_eq!(vcd, back);
    }

    #[test]
    fn enabling_an_attribute_defaults_it_to_16_bit_indices() {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        assert_eq!(vcd.encoding(VertexAttribute::Position), EncodingType::Index16);
        assert_eq!(vcd.encoding(VertexAttribute::Normal), EncodingType::None);
    }

    #[test]
    fn set_encoding_narrows_an_enabled_attribute() {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Color0);
        vcd.set_encoding(VertexAttribute::Color0, EncodingType::Index8);
        assert_eq!(vcd.encoding(VertexAttribute::Color0), EncodingType::Index8);
    }

    #[test]
    fn set_encoding_ignores_disabled_attributes() {
        let mut vcd = VertexDescriptor::new();
        vcd.set_encoding(VertexAttribute::Position, EncodingType::Direct);
        assert_eq!(vcd.encoding(VertexAttribute::Position), EncodingType::None);
    }

    #[test]
    fn round_trips_encoding_types_through_parts() {
        let mut vcd = VertexDescriptor::new();
        vcd.enable(VertexAttribute::Position);
        vcd.enable(VertexAttribute::TexCoord0);
        vcd.set_encoding(VertexAttribute::TexCoord0, EncodingType::Direct);

        let back = VertexDescriptor::from_parts(vcd.as_u32(), vcd.encoding_bytes());
        assert_eq!(back.encoding(VertexAttribute::Position), EncodingType::Index16);
        assert_eq!(back.encoding(VertexAttribute::TexCoord0), EncodingType::Direct);
    }
}
