//! Deduplicating name pool (C2).
//!
//! BRRES/BMD archives reference names (bones, materials, textures, anim
//! nodes) through relative offsets into a shared string pool rather than
//! storing each name inline. Writers don't know where that pool will end up
//! until every other section has been laid out, so name references are
//! registered as they're encountered and only resolved once, at the end.

use std::collections::HashMap;

use super::{RelocSlot, RelocWriter};

/// Collects name references during a forward pass over a body and resolves
/// them into a single appended, deduplicated string pool.
#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<String>,
    index_of: HashMap<String, usize>,
    pending: Vec<(RelocSlot, usize, usize)>,
}

impl NameTable {
    pub fn new() -> Self {
        NameTable::default()
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index_of.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_owned());
        self.index_of.insert(name.to_owned(), idx);
        idx
    }

    /// Reserves a u32 placeholder at the writer's current position for a
    /// name reference, relative to `base`, and records `name` for later
    /// pooling. Can be called before the pool's final layout is known —
    /// hence "forward".
    pub fn write_name_forward(&mut self, writer: &mut RelocWriter, base: usize, name: &str) {
        let slot = writer.reserve_u32();
        let idx = self.intern(name);
        self.pending.push((slot, base, idx));
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Appends the pooled, deduplicated strings to `writer` (each as a
    /// 4-byte length prefix, the bytes, a NUL terminator, and padding to a
    /// 4-byte boundary) and patches every registered reference to point at
    /// its entry. Consumes the table: each name reference resolves exactly
    /// once.
    pub fn resolve(self, writer: &mut RelocWriter) {
        let mut offsets = Vec::with_capacity(self.names.len());
        for name in &self.names {
            offsets.push(writer.position());
            writer.inner_mut().u32(name.len() as u32);
            writer.inner_mut().bytes(name.as_bytes());
            writer.inner_mut().u8(0);
            writer.inner_mut().align(4, 0);
        }
        for (slot, base, idx) in self.pending {
            writer.resolve_from(slot, base, offsets[idx]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_shares_one_pool_entry() {
        let mut table = NameTable::new();
        let mut writer = RelocWriter::new();
        let base_a = writer.position();
        table.write_name_forward(&mut writer, base_a, "Bone0");
        let base_b = writer.position();
        table.write_name_forward(&mut writer, base_b, "Bone0");
        assert_eq!(table.len(), 1);
        table.resolve(&mut writer);
        let bytes = writer.into_vec();
        let off_a = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let off_b = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        // Both references point at the same pool entry, just from different bases.
        assert_eq!(base_a as u32 + off_a, base_b as u32 + off_b);
    }

    #[test]
    fn distinct_names_get_distinct_entries() {
        let mut table = NameTable::new();
        let mut writer = RelocWriter::new();
        let base = writer.position();
        table.write_name_forward(&mut writer, base, "a");
        let base2 = writer.position();
        table.write_name_forward(&mut writer, base2, "bb");
        assert_eq!(table.len(), 2);
        table.resolve(&mut writer);
    }
}
