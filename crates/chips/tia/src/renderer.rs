//! Scanline compositor: renders each object into its own scratch line
//! buffer, then merges them by priority into a composite line.
//!
//! Scratch buffers hold palette indices with 0xFF marking transparency;
//! palette indices are 7 bits, so the sentinel can never collide with a
//! real color. The buffers are rebuilt from register state at the start
//! of every catch-up pass and never escape the renderer.

use crate::registers::NUSIZ_TABLE;

pub const LINE_WIDTH: usize = 160;
pub const TRANSPARENT: u8 = 0xFF;

/// Per-object scratch lines plus the priority-merged composite.
#[derive(Debug, Clone)]
pub struct LineBuffers {
    pub p0: [u8; LINE_WIDTH],
    pub p1: [u8; LINE_WIDTH],
    pub m0: [u8; LINE_WIDTH],
    pub m1: [u8; LINE_WIDTH],
    pub bl: [u8; LINE_WIDTH],
    pub pf: [u8; LINE_WIDTH],
    pub composite: [u8; LINE_WIDTH],
}

impl Default for LineBuffers {
    fn default() -> Self {
        Self {
            p0: [TRANSPARENT; LINE_WIDTH],
            p1: [TRANSPARENT; LINE_WIDTH],
            m0: [TRANSPARENT; LINE_WIDTH],
            m1: [TRANSPARENT; LINE_WIDTH],
            bl: [TRANSPARENT; LINE_WIDTH],
            pf: [TRANSPARENT; LINE_WIDTH],
            composite: [0; LINE_WIDTH],
        }
    }
}

impl LineBuffers {
    pub fn clear(&mut self) {
        self.p0.fill(TRANSPARENT);
        self.p1.fill(TRANSPARENT);
        self.m0.fill(TRANSPARENT);
        self.m1.fill(TRANSPARENT);
        self.bl.fill(TRANSPARENT);
        self.pf.fill(TRANSPARENT);
        self.composite.fill(0);
    }

    /// Merge the object buffers front-to-back. With the playfield
    /// priority bit clear, players and missiles sit in front of the
    /// playfield and ball; with it set, the playfield and ball win.
    pub fn merge(&mut self, playfield_priority: bool, background: u8) {
        for x in 0..LINE_WIDTH {
            let order = if playfield_priority {
                [self.pf[x], self.bl[x], self.p0[x], self.m0[x], self.p1[x], self.m1[x]]
            } else {
                [self.p0[x], self.m0[x], self.p1[x], self.m1[x], self.bl[x], self.pf[x]]
            };
            self.composite[x] = order
                .into_iter()
                .find(|&c| c != TRANSPARENT)
                .unwrap_or(background);
        }
    }
}

fn plot(buf: &mut [u8; LINE_WIDTH], x: i32, color: u8) {
    buf[x.rem_euclid(LINE_WIDTH as i32) as usize] = color;
}

/// Draw one player: 8 pattern bits, replicated and widened per NUSIZ.
///
/// Double and quad width shift the whole sprite right by one pixel, a
/// hardware oddity (see the bridges in River Raid) that software relies
/// on.
pub fn draw_player(buf: &mut [u8; LINE_WIDTH], pos: i32, grp: u8, nusiz: u8, reflect: bool, color: u8) {
    if grp == 0 {
        return;
    }
    let (copies, width, skip) = NUSIZ_TABLE[(nusiz & 0x07) as usize];
    let pattern = if reflect { grp.reverse_bits() } else { grp };
    let quirk = if width >= 2 { 1 } else { 0 };

    for copy in 0..copies {
        let start = pos + quirk + copy * (8 + 8 * skip);
        for bit in 0..8 {
            if pattern & (0x80 >> bit) != 0 {
                for w in 0..width {
                    plot(buf, start + bit * width + w, color);
                }
            }
        }
    }
}

/// Draw one missile. Copy count and spacing follow the owning player's
/// NUSIZ; width comes from bits 4-5 of the same register.
pub fn draw_missile(buf: &mut [u8; LINE_WIDTH], pos: i32, nusiz: u8, enabled: bool, color: u8) {
    if !enabled {
        return;
    }
    let (copies, _, skip) = NUSIZ_TABLE[(nusiz & 0x07) as usize];
    let width = 1 << ((nusiz >> 4) & 0x03);

    for copy in 0..copies {
        let start = pos + copy * (8 + 8 * skip);
        for w in 0..width {
            plot(buf, start + w, color);
        }
    }
}

/// Draw the ball: a single run of 1/2/4/8 pixels from CTRLPF bits 4-5.
pub fn draw_ball(buf: &mut [u8; LINE_WIDTH], pos: i32, ctrlpf: u8, enabled: bool, color: u8) {
    if !enabled {
        return;
    }
    let width = 1 << ((ctrlpf >> 4) & 0x03);
    for w in 0..width {
        plot(buf, pos + w, color);
    }
}

/// Expand PF0/PF1/PF2 into the 20-bit half-line pattern. Bit n of the
/// result covers columns 4n..4n+4 of the left half. PF0 contributes its
/// high nibble low-bit-first, PF1 is high-bit-first, PF2 low-bit-first.
fn playfield_bits(pf0: u8, pf1: u8, pf2: u8) -> u32 {
    let mut bits = 0u32;
    for i in 0..4 {
        if pf0 & (0x10 << i) != 0 {
            bits |= 1 << i;
        }
    }
    for i in 0..8 {
        if pf1 & (0x80 >> i) != 0 {
            bits |= 1 << (4 + i);
        }
    }
    for i in 0..8 {
        if pf2 & (0x01 << i) != 0 {
            bits |= 1 << (12 + i);
        }
    }
    bits
}

/// Draw both playfield halves. The right half repeats or mirrors the
/// left per the reflect bit; score mode colors each half with its
/// player's color instead of COLUPF.
#[allow(clippy::too_many_arguments)]
pub fn draw_playfield(
    buf: &mut [u8; LINE_WIDTH],
    pf0: u8,
    pf1: u8,
    pf2: u8,
    ctrlpf: u8,
    colupf: u8,
    colup0: u8,
    colup1: u8,
) {
    let bits = playfield_bits(pf0, pf1, pf2);
    let reflect = ctrlpf & 0x01 != 0;
    let score = ctrlpf & 0x02 != 0;

    let (left_color, right_color) = if score {
        (colup0, colup1)
    } else {
        (colupf, colupf)
    };

    for x in 0..LINE_WIDTH {
        let bit = if x < 80 {
            x / 4
        } else if reflect {
            19 - (x - 80) / 4
        } else {
            (x - 80) / 4
        };
        if bits & (1 << bit) != 0 {
            buf[x] = if x < 80 { left_color } else { right_color };
        }
    }
}
