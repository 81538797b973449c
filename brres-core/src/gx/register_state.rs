//! Transient decode target: the flattened register state produced by
//! executing a display list, before it's interpreted into a high-level
//! material or mesh attribute description.

use std::collections::HashMap;

use super::dl::{RegKind, RegisterWrite};

/// The last-written value of every BP/XF/CP register touched while
/// decoding one display list. Later writes to the same register overwrite
/// earlier ones, matching hardware semantics (a display list is replayed
/// in order; only the final value of each register matters downstream).
#[derive(Debug, Default, Clone)]
pub struct GpuRegisterState {
    bp: HashMap<u8, u32>,
    xf: HashMap<u16, u32>,
    cp: HashMap<u8, u32>,
}

impl GpuRegisterState {
    pub fn new() -> Self {
        GpuRegisterState::default()
    }

    /// Replays `writes` into this state in order.
    pub fn apply(&mut self, writes: &[RegisterWrite]) {
        for w in writes {
            match w.kind {
                RegKind::Bp => {
                    self.bp.insert(w.reg as u8, w.value);
                }
                RegKind::Xf => {
                    self.xf.insert(w.reg, w.value);
                }
                RegKind::Cp => {
                    self.cp.insert(w.reg as u8, w.value);
                }
            }
        }
    }

    pub fn bp(&self, reg: u8) -> Option<u32> {
        self.bp.get(&reg).copied()
    }

    pub fn xf(&self, reg: u16) -> Option<u32> {
        self.xf.get(&reg).copied()
    }

    pub fn cp(&self, reg: u8) -> Option<u32> {
        self.cp.get(&reg).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_wins() {
        let mut state = GpuRegisterState::new();
        state.apply(&[RegisterWrite::bp(0x10, 1), RegisterWrite::bp(0x10, 2)]);
        assert_eq!(state.bp(0x10), Some(2));
    }

    #[test]
    fn unwritten_register_is_none() {
        let state = GpuRegisterState::new();
        assert_eq!(state.xf(0x1000), None);
    }
}
