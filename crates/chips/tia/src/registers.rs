//! TIA register map and the per-register catch-up delay table.

// Write registers
pub const VSYNC: u16 = 0x00;
pub const VBLANK: u16 = 0x01;
pub const WSYNC: u16 = 0x02;
pub const RSYNC: u16 = 0x03;
pub const NUSIZ0: u16 = 0x04;
pub const NUSIZ1: u16 = 0x05;
pub const COLUP0: u16 = 0x06;
pub const COLUP1: u16 = 0x07;
pub const COLUPF: u16 = 0x08;
pub const COLUBK: u16 = 0x09;
pub const CTRLPF: u16 = 0x0A;
pub const REFP0: u16 = 0x0B;
pub const REFP1: u16 = 0x0C;
pub const PF0: u16 = 0x0D;
pub const PF1: u16 = 0x0E;
pub const PF2: u16 = 0x0F;
pub const RESP0: u16 = 0x10;
pub const RESP1: u16 = 0x11;
pub const RESM0: u16 = 0x12;
pub const RESM1: u16 = 0x13;
pub const RESBL: u16 = 0x14;
pub const AUDC0: u16 = 0x15;
pub const AUDC1: u16 = 0x16;
pub const AUDF0: u16 = 0x17;
pub const AUDF1: u16 = 0x18;
pub const AUDV0: u16 = 0x19;
pub const AUDV1: u16 = 0x1A;
pub const GRP0: u16 = 0x1B;
pub const GRP1: u16 = 0x1C;
pub const ENAM0: u16 = 0x1D;
pub const ENAM1: u16 = 0x1E;
pub const ENABL: u16 = 0x1F;
pub const HMP0: u16 = 0x20;
pub const HMP1: u16 = 0x21;
pub const HMM0: u16 = 0x22;
pub const HMM1: u16 = 0x23;
pub const HMBL: u16 = 0x24;
pub const VDELP0: u16 = 0x25;
pub const VDELP1: u16 = 0x26;
pub const VDELBL: u16 = 0x27;
pub const RESMP0: u16 = 0x28;
pub const RESMP1: u16 = 0x29;
pub const HMOVE: u16 = 0x2A;
pub const HMCLR: u16 = 0x2B;
pub const CXCLR: u16 = 0x2C;

// Read registers (offset & 0x0F)
pub const CXM0P: u16 = 0x00;
pub const CXM1P: u16 = 0x01;
pub const CXP0FB: u16 = 0x02;
pub const CXP1FB: u16 = 0x03;
pub const CXM0FB: u16 = 0x04;
pub const CXM1FB: u16 = 0x05;
pub const CXBLPF: u16 = 0x06;
pub const CXPPMM: u16 = 0x07;
pub const INPT0: u16 = 0x08;
pub const INPT5: u16 = 0x0D;

/// How far past the current beam column a register write becomes visible.
///
/// Graphics latches take effect one pixel late; playfield data four pixels
/// late and only on a 4-pixel grid. Audio registers never touch pixels,
/// so writing them skips the catch-up render entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUp {
    /// No visible-pixel effect; do not render.
    None,
    /// Render up to `current_x + n` with the old value first.
    AfterPixels(u8),
    /// Mask the beam column down to a 4-pixel boundary, then add `n`.
    Aligned4AfterPixels(u8),
}

impl CatchUp {
    /// The beam column at which a write to this register becomes visible.
    pub fn target_x(self, beam_x: i32) -> Option<i32> {
        match self {
            CatchUp::None => None,
            CatchUp::AfterPixels(n) => Some(beam_x + n as i32),
            CatchUp::Aligned4AfterPixels(n) => Some((beam_x & !3) + n as i32),
        }
    }
}

/// Delay for each write register. Offsets past the register space fall
/// through to `None` (writes there are no-ops anyway).
pub fn catch_up_for(offset: u16) -> CatchUp {
    match offset {
        GRP0 | GRP1 | ENAM0 | ENAM1 | ENABL | REFP0 | REFP1 => CatchUp::AfterPixels(1),
        PF0 | PF1 | PF2 => CatchUp::Aligned4AfterPixels(4),
        AUDC0 | AUDC1 | AUDF0 | AUDF1 | AUDV0 | AUDV1 => CatchUp::None,
        VSYNC..=RESBL | HMP0..=HMBL | VDELP0..=CXCLR => CatchUp::AfterPixels(0),
        _ => CatchUp::None,
    }
}

/// Copies, width multiplier, and gap-skip for the low 3 bits of NUSIZx.
///
/// Gap-skip counts 8-pixel groups between copies: copy n starts at
/// `pos + n * (8 + 8 * skip)`.
pub const NUSIZ_TABLE: [(i32, i32, i32); 8] = [
    (1, 1, 0), // one copy
    (2, 1, 1), // two copies, close
    (2, 1, 3), // two copies, medium
    (3, 1, 1), // three copies, close
    (2, 1, 7), // two copies, wide
    (1, 2, 0), // one copy, double width
    (3, 1, 3), // three copies, medium
    (1, 4, 0), // one copy, quad width
];
