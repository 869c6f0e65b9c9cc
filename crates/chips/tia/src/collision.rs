//! Sticky collision latch for the fifteen object pairs.
//!
//! Bits are set whenever a catch-up pass finds both objects of a pair
//! opaque at the same column, and stay set until the CXCLR strobe. The
//! eight read registers each expose one or two pair bits in bits 7-6.

use crate::renderer::{LineBuffers, TRANSPARENT};
use serde::{Deserialize, Serialize};

pub const M0_P1: u16 = 1 << 0;
pub const M0_P0: u16 = 1 << 1;
pub const M1_P0: u16 = 1 << 2;
pub const M1_P1: u16 = 1 << 3;
pub const P0_PF: u16 = 1 << 4;
pub const P0_BL: u16 = 1 << 5;
pub const P1_PF: u16 = 1 << 6;
pub const P1_BL: u16 = 1 << 7;
pub const M0_PF: u16 = 1 << 8;
pub const M0_BL: u16 = 1 << 9;
pub const M1_PF: u16 = 1 << 10;
pub const M1_BL: u16 = 1 << 11;
pub const BL_PF: u16 = 1 << 12;
pub const P0_P1: u16 = 1 << 13;
pub const M0_M1: u16 = 1 << 14;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionLatch {
    bits: u16,
}

impl CollisionLatch {
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn is_set(&self, pair: u16) -> bool {
        self.bits & pair != 0
    }

    /// Scan the rendered span and OR in every pair that overlaps.
    pub fn scan(&mut self, bufs: &LineBuffers, start: usize, end: usize) {
        let pairs: [(&[u8], &[u8], u16); 15] = [
            (&bufs.m0, &bufs.p1, M0_P1),
            (&bufs.m0, &bufs.p0, M0_P0),
            (&bufs.m1, &bufs.p0, M1_P0),
            (&bufs.m1, &bufs.p1, M1_P1),
            (&bufs.p0, &bufs.pf, P0_PF),
            (&bufs.p0, &bufs.bl, P0_BL),
            (&bufs.p1, &bufs.pf, P1_PF),
            (&bufs.p1, &bufs.bl, P1_BL),
            (&bufs.m0, &bufs.pf, M0_PF),
            (&bufs.m0, &bufs.bl, M0_BL),
            (&bufs.m1, &bufs.pf, M1_PF),
            (&bufs.m1, &bufs.bl, M1_BL),
            (&bufs.bl, &bufs.pf, BL_PF),
            (&bufs.p0, &bufs.p1, P0_P1),
            (&bufs.m0, &bufs.m1, M0_M1),
        ];
        for (a, b, bit) in pairs {
            if self.bits & bit != 0 {
                continue;
            }
            if (start..end).any(|x| a[x] != TRANSPARENT && b[x] != TRANSPARENT) {
                self.bits |= bit;
            }
        }
    }

    /// Bits 7-6 of collision read register `reg` (0x0-0x7).
    pub fn register_bits(&self, reg: u16) -> u8 {
        let (bit7, bit6) = match reg & 0x07 {
            0x00 => (M0_P1, M0_P0),
            0x01 => (M1_P0, M1_P1),
            0x02 => (P0_PF, P0_BL),
            0x03 => (P1_PF, P1_BL),
            0x04 => (M0_PF, M0_BL),
            0x05 => (M1_PF, M1_BL),
            0x06 => (BL_PF, 0),
            _ => (P0_P1, M0_M1),
        };
        let mut value = 0;
        if self.is_set(bit7) {
            value |= 0x80;
        }
        if bit6 != 0 && self.is_set(bit6) {
            value |= 0x40;
        }
        value
    }
}
