//! TIA (Television Interface Adapter) video core.
//!
//! The TIA has no framebuffer of its own; the 2600's CPU races the beam,
//! reprogramming the chip mid-scanline. This core reconstructs that by
//! deferring all pixel output: the chip only tracks a cycle counter, and
//! each register access first renders the span the beam covered since the
//! last access, using the register values that were live during it.

use crate::collision::CollisionLatch;
use crate::palette;
use crate::registers as reg;
use crate::registers::catch_up_for;
use crate::renderer::{self, LineBuffers, LINE_WIDTH};
use raster_core::logging::{log, LogCategory, LogLevel};
use raster_core::{state, BeamClock, FrameBuffers, IndexedFrame, RasterTiming, StateError, VideoChip};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CHIP_NAME: &str = "tia";
const STATE_VERSION: u32 = 1;

/// Video standard the console was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standard {
    Ntsc,
    Pal,
}

impl Standard {
    pub fn timing(self) -> RasterTiming {
        let lines = match self {
            Standard::Ntsc => 262,
            Standard::Pal => 312,
        };
        RasterTiming {
            cycles_per_line: 76,
            pixels_per_cycle: 3,
            hblank_bias: 68,
            lines,
        }
    }

    fn palette(self) -> &'static [u32; 128] {
        match self {
            Standard::Ntsc => palette::ntsc(),
            Standard::Pal => palette::pal(),
        }
    }
}

/// Color registers carry the palette index in bits 1-7.
fn color_index(color_reg: u8) -> u8 {
    color_reg >> 1
}

/// Signed motion delta from an HMxx register's high nibble.
fn motion(hm: u8) -> i32 {
    ((hm as i8) >> 4) as i32
}

/// Position snapped by a player reset strobe at beam column `x`.
fn player_reset_pos(x: i32) -> i32 {
    if x < 0 {
        3
    } else {
        (x + 5) % LINE_WIDTH as i32
    }
}

/// Position snapped by a missile or ball reset strobe.
fn missile_reset_pos(x: i32) -> i32 {
    if x < 0 {
        2
    } else {
        (x + 4) % LINE_WIDTH as i32
    }
}

/// TIA chip state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tia {
    standard: Standard,
    clock: BeamClock,

    // last rendered beam position
    prev_x: i32,
    prev_y: u32,

    frames: FrameBuffers,
    collisions: CollisionLatch,

    // cycles the CPU must forfeit after a WSYNC strobe
    pending_stall: u64,
    // row carrying the HMOVE left-edge blank, if any
    hmove_blank_row: Option<u32>,

    vsync: bool,
    vblank: bool,

    // Playfield
    pf0: u8,
    pf1: u8,
    pf2: u8,
    ctrlpf: u8,

    // Colors
    colup0: u8,
    colup1: u8,
    colupf: u8,
    colubk: u8,

    // Players
    nusiz0: u8,
    nusiz1: u8,
    grp0: u8,
    grp1: u8,
    grp0_prev: u8,
    grp1_prev: u8,
    refp0: bool,
    refp1: bool,
    vdelp0: bool,
    vdelp1: bool,
    p0_pos: i32,
    p1_pos: i32,

    // Missiles
    enam0: bool,
    enam1: bool,
    resmp0: bool,
    resmp1: bool,
    m0_pos: i32,
    m1_pos: i32,

    // Ball
    enabl: bool,
    enabl_prev: bool,
    vdelbl: bool,
    bl_pos: i32,

    // Horizontal motion (raw register bytes, nibble in bits 4-7)
    hmp0: u8,
    hmp1: u8,
    hmm0: u8,
    hmm1: u8,
    hmbl: u8,

    // Audio (register storage only; synthesis is the sound chip's job)
    audc0: u8,
    audc1: u8,
    audf0: u8,
    audf1: u8,
    audv0: u8,
    audv1: u8,

    // INPT0-5, latched by the input collaborator
    inputs: [u8; 6],

    #[serde(skip)]
    scratch: LineBuffers,
}

impl Default for Tia {
    fn default() -> Self {
        Self::new(Standard::Ntsc)
    }
}

impl Tia {
    pub fn new(standard: Standard) -> Self {
        let timing = standard.timing();
        Self {
            standard,
            clock: BeamClock::new(timing),
            prev_x: -timing.hblank_bias,
            prev_y: 0,
            frames: FrameBuffers::new(LINE_WIDTH as u32, timing.lines),
            collisions: CollisionLatch::default(),
            pending_stall: 0,
            hmove_blank_row: None,
            vsync: false,
            vblank: false,
            pf0: 0,
            pf1: 0,
            pf2: 0,
            ctrlpf: 0,
            colup0: 0,
            colup1: 0,
            colupf: 0,
            colubk: 0,
            nusiz0: 0,
            nusiz1: 0,
            grp0: 0,
            grp1: 0,
            grp0_prev: 0,
            grp1_prev: 0,
            refp0: false,
            refp1: false,
            vdelp0: false,
            vdelp1: false,
            p0_pos: 0,
            p1_pos: 0,
            enam0: false,
            enam1: false,
            resmp0: false,
            resmp1: false,
            m0_pos: 0,
            m1_pos: 0,
            enabl: false,
            enabl_prev: false,
            vdelbl: false,
            bl_pos: 0,
            hmp0: 0,
            hmp1: 0,
            hmm0: 0,
            hmm1: 0,
            hmbl: 0,
            audc0: 0,
            audc1: 0,
            audf0: 0,
            audf1: 0,
            audv0: 0,
            audv1: 0,
            inputs: [0; 6],
            scratch: LineBuffers::default(),
        }
    }

    /// Reset TIA to power-on state
    pub fn reset(&mut self) {
        *self = Self::new(self.standard);
    }

    /// Advance the shared cycle counter. No pixels are produced here;
    /// rendering happens lazily on the next register access.
    pub fn advance(&mut self, cpu_cycles: u64) {
        self.clock.advance(cpu_cycles);
    }

    /// Latch an input port value (INPT0-5, value in bit 7).
    pub fn set_input_port(&mut self, port: usize, value: u8) {
        if let Some(slot) = self.inputs.get_mut(port) {
            *slot = value;
        }
    }

    /// Cycles the CPU must forfeit for a pending WSYNC, clearing the
    /// request.
    pub fn take_stall(&mut self) -> u64 {
        std::mem::take(&mut self.pending_stall)
    }

    /// The most recently completed frame.
    pub fn frame(&self) -> &IndexedFrame {
        self.frames.front()
    }

    pub fn palette_rgb(&self, index: u8) -> u32 {
        self.standard.palette()[(index & 0x7F) as usize]
    }

    /// Write to TIA register. Renders up to the write's effective pixel
    /// with the old value first, so the new value is never retroactive.
    pub fn write(&mut self, offset: u16, val: u8) {
        let offset = offset & 0x3F;
        let beam = self.clock.beam();
        if let Some(target_x) = catch_up_for(offset).target_x(beam.x) {
            self.update_bitmap(target_x, beam.y);
        }

        match offset {
            reg::VSYNC => {
                let active = val & 0x02 != 0;
                if active && !self.vsync {
                    self.start_frame();
                }
                self.vsync = active;
            }
            reg::VBLANK => self.vblank = val & 0x02 != 0,
            reg::WSYNC => {
                let rem = self.clock.line_cycles();
                if rem != 0 {
                    self.pending_stall = self.clock.timing().cycles_per_line - rem;
                }
            }
            reg::RSYNC => {
                // only meaningful on real hardware's reset/test path
                log(LogCategory::Stubs, LogLevel::Debug, || "RSYNC strobe ignored".to_string());
            }
            reg::NUSIZ0 => self.nusiz0 = val,
            reg::NUSIZ1 => self.nusiz1 = val,
            reg::COLUP0 => self.colup0 = val,
            reg::COLUP1 => self.colup1 = val,
            reg::COLUPF => self.colupf = val,
            reg::COLUBK => self.colubk = val,
            reg::CTRLPF => self.ctrlpf = val,
            reg::REFP0 => self.refp0 = val & 0x08 != 0,
            reg::REFP1 => self.refp1 = val & 0x08 != 0,
            reg::PF0 => self.pf0 = val,
            reg::PF1 => self.pf1 = val,
            reg::PF2 => self.pf2 = val,
            reg::RESP0 => self.p0_pos = player_reset_pos(beam.x),
            reg::RESP1 => self.p1_pos = player_reset_pos(beam.x),
            reg::RESM0 => self.m0_pos = missile_reset_pos(beam.x),
            reg::RESM1 => self.m1_pos = missile_reset_pos(beam.x),
            reg::RESBL => self.bl_pos = missile_reset_pos(beam.x),
            reg::AUDC0 => self.audc0 = val & 0x0F,
            reg::AUDC1 => self.audc1 = val & 0x0F,
            reg::AUDF0 => self.audf0 = val & 0x1F,
            reg::AUDF1 => self.audf1 = val & 0x1F,
            reg::AUDV0 => self.audv0 = val & 0x0F,
            reg::AUDV1 => self.audv1 = val & 0x0F,
            // Writing one player's graphics promotes the other's shadow;
            // the ping-pong latch cycle-exact software depends on.
            reg::GRP0 => {
                self.grp1_prev = self.grp1;
                self.grp0 = val;
            }
            reg::GRP1 => {
                self.grp0_prev = self.grp0;
                self.grp1 = val;
            }
            reg::ENAM0 => self.enam0 = val & 0x02 != 0,
            reg::ENAM1 => self.enam1 = val & 0x02 != 0,
            reg::ENABL => {
                self.enabl_prev = self.enabl;
                self.enabl = val & 0x02 != 0;
            }
            reg::HMP0 => self.hmp0 = val,
            reg::HMP1 => self.hmp1 = val,
            reg::HMM0 => self.hmm0 = val,
            reg::HMM1 => self.hmm1 = val,
            reg::HMBL => self.hmbl = val,
            reg::VDELP0 => self.vdelp0 = val & 0x01 != 0,
            reg::VDELP1 => self.vdelp1 = val & 0x01 != 0,
            reg::VDELBL => self.vdelbl = val & 0x01 != 0,
            reg::RESMP0 => {
                let pinned = val & 0x02 != 0;
                if self.resmp0 && !pinned {
                    self.m0_pos = (self.p0_pos + 4) % LINE_WIDTH as i32;
                }
                self.resmp0 = pinned;
            }
            reg::RESMP1 => {
                let pinned = val & 0x02 != 0;
                if self.resmp1 && !pinned {
                    self.m1_pos = (self.p1_pos + 4) % LINE_WIDTH as i32;
                }
                self.resmp1 = pinned;
            }
            reg::HMOVE => self.apply_hmove(beam.x, beam.y),
            reg::HMCLR => {
                self.hmp0 = 0;
                self.hmp1 = 0;
                self.hmm0 = 0;
                self.hmm1 = 0;
                self.hmbl = 0;
            }
            reg::CXCLR => self.collisions.clear(),
            _ => {
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("write to unmapped TIA register {:02X} <- {:02X}", offset, val)
                });
            }
        }
    }

    /// Read from TIA register. Collision registers render to "now"
    /// first so they never report stale overlap data; input ports skip
    /// the catch-up since pixels cannot affect them.
    pub fn read(&mut self, offset: u16) -> u8 {
        if offset & 0x08 == 0 {
            let beam = self.clock.beam();
            self.update_bitmap(beam.x, beam.y);
        }
        self.peek(offset)
    }

    /// Side-effect-free register read.
    pub fn peek(&self, offset: u16) -> u8 {
        let masked = offset & 0x0F;
        let high = match masked {
            0x00..=0x07 => self.collisions.register_bits(masked),
            0x08..=0x0D => self.inputs[(masked - 8) as usize] & 0x80,
            _ => 0,
        };
        // Bits 0-5 float on the real data bus; echoing the address is a
        // close-enough cheat that some software checks for.
        high | (offset as u8 & 0x3F)
    }

    /// Vertical sync went active: rebase the cycle counter so Y restarts
    /// at 0 without losing horizontal phase, and present the finished
    /// frame.
    fn start_frame(&mut self) {
        let beam = self.clock.beam();
        self.clock.rebase_frame(beam.y);
        self.frames.swap();
        self.prev_x = beam.x;
        self.prev_y = 0;
        self.hmove_blank_row = None;
        log(LogCategory::Timing, LogLevel::Trace, || {
            format!("vsync after {} lines", beam.y)
        });
    }

    fn apply_hmove(&mut self, beam_x: i32, beam_y: u32) {
        let width = LINE_WIDTH as i32;
        self.p0_pos = (self.p0_pos + motion(self.hmp0)).rem_euclid(width);
        self.p1_pos = (self.p1_pos + motion(self.hmp1)).rem_euclid(width);
        self.m0_pos = (self.m0_pos + motion(self.hmm0)).rem_euclid(width);
        self.m1_pos = (self.m1_pos + motion(self.hmm1)).rem_euclid(width);
        self.bl_pos = (self.bl_pos + motion(self.hmbl)).rem_euclid(width);
        // Strobing inside the horizontal-blank window extends the blank
        // 8 pixels into the visible line, doubling the comb to 16.
        if beam_x <= -8 {
            self.hmove_blank_row = Some(beam_y);
        }
    }

    /// Rebuild the per-object scratch lines and the priority composite
    /// from current register state.
    fn render_line_objects(&mut self) {
        self.scratch.clear();
        if self.vblank {
            // composite stays at the blank value
            return;
        }

        renderer::draw_playfield(
            &mut self.scratch.pf,
            self.pf0,
            self.pf1,
            self.pf2,
            self.ctrlpf,
            color_index(self.colupf),
            color_index(self.colup0),
            color_index(self.colup1),
        );

        let grp0 = if self.vdelp0 { self.grp0_prev } else { self.grp0 };
        let grp1 = if self.vdelp1 { self.grp1_prev } else { self.grp1 };
        renderer::draw_player(
            &mut self.scratch.p0,
            self.p0_pos,
            grp0,
            self.nusiz0,
            self.refp0,
            color_index(self.colup0),
        );
        renderer::draw_player(
            &mut self.scratch.p1,
            self.p1_pos,
            grp1,
            self.nusiz1,
            self.refp1,
            color_index(self.colup1),
        );

        renderer::draw_missile(
            &mut self.scratch.m0,
            self.m0_pos,
            self.nusiz0,
            self.enam0 && !self.resmp0,
            color_index(self.colup0),
        );
        renderer::draw_missile(
            &mut self.scratch.m1,
            self.m1_pos,
            self.nusiz1,
            self.enam1 && !self.resmp1,
            color_index(self.colup1),
        );

        let ball = if self.vdelbl { self.enabl_prev } else { self.enabl };
        renderer::draw_ball(
            &mut self.scratch.bl,
            self.bl_pos,
            self.ctrlpf,
            ball,
            color_index(self.colupf),
        );

        self.scratch
            .merge(self.ctrlpf & 0x04 != 0, color_index(self.colubk));
    }

    /// Catch-up renderer: draw every raster position from the last
    /// rendered one up to (not including) `(next_x, next_y)`.
    fn update_bitmap(&mut self, next_x: i32, next_y: u32) {
        if next_y < self.prev_y || (next_y == self.prev_y && next_x <= self.prev_x) {
            return;
        }

        self.render_line_objects();

        let width = LINE_WIDTH as i32;
        let hblank_start = -self.clock.timing().hblank_bias;
        for y in self.prev_y..=next_y {
            let span_start = if y == self.prev_y { self.prev_x } else { hblank_start };
            let span_end = if y == next_y { next_x } else { width };
            let start = span_start.max(0) as usize;
            let end = span_end.min(width).max(0) as usize;
            if start >= end {
                continue;
            }

            if !self.vblank {
                self.collisions.scan(&self.scratch, start, end);
            }

            // rows past the allocated height are skipped, not an error
            if let Some(row) = self.frames.back_mut().row_mut(y) {
                row[start..end].copy_from_slice(&self.scratch.composite[start..end]);
                if self.hmove_blank_row == Some(y) {
                    let blank_end = end.min(16);
                    if start < blank_end {
                        row[start..blank_end].fill(0);
                    }
                }
            }
        }

        self.prev_x = next_x;
        self.prev_y = next_y;
        if self.hmove_blank_row.is_some_and(|row| self.prev_y > row) {
            self.hmove_blank_row = None;
        }
    }
}

impl VideoChip for Tia {
    fn reset(&mut self) {
        Tia::reset(self);
    }

    fn advance(&mut self, cpu_cycles: u64) {
        Tia::advance(self, cpu_cycles);
    }

    fn write(&mut self, offset: u16, value: u8) {
        Tia::write(self, offset, value);
    }

    fn read(&mut self, offset: u16) -> u8 {
        Tia::read(self, offset)
    }

    fn peek(&self, offset: u16) -> u8 {
        Tia::peek(self, offset)
    }

    fn take_stall(&mut self) -> u64 {
        Tia::take_stall(self)
    }

    fn frame(&self) -> &IndexedFrame {
        Tia::frame(self)
    }

    fn palette_rgb(&self, index: u8) -> u32 {
        Tia::palette_rgb(self, index)
    }

    fn save_state(&self) -> Result<Value, StateError> {
        state::save(CHIP_NAME, STATE_VERSION, self)
    }

    fn load_state(&mut self, value: &Value) -> Result<(), StateError> {
        *self = state::load(CHIP_NAME, STATE_VERSION, value)?;
        Ok(())
    }
}
