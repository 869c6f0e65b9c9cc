//! TED 7360 (Commodore 16/Plus4) video and timing core.
//!
//! The TED is the C16's whole support chip: video, three count-down
//! timers, the interrupt controller, the keyboard latch and the memory
//! banking status all live in one 32-byte register file. Video output
//! follows the same catch-up discipline as the other chips here, at
//! scanline granularity: any access that can change the picture first
//! renders every raster line since the last rendered one.
//!
//! Character, attribute and bitmap data are fetched over the shared bus,
//! so register access and `advance` thread a [`TedBus`] implementation.

use crate::palette;
use raster_core::logging::{log, LogCategory, LogLevel};
use raster_core::{state, BeamClock, FrameBuffers, IndexedFrame, RasterTiming, StateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CHIP_NAME: &str = "ted7360";
const STATE_VERSION: u32 = 1;

/// Raster lines above the first bitmap line.
pub(crate) const RASTER_TOP: i32 = 40;
/// Border thickness around the 320x200 character window.
pub(crate) const BORDER: i32 = 8;
/// Offset between hardware raster counting and the register encoding.
const RASTER_REGISTER_BIAS: u32 = RASTER_TOP as u32 + 5;

pub(crate) const FRAME_WIDTH: u32 = 336;
pub(crate) const FRAME_HEIGHT: u32 = 216;

const CYCLES_PER_LINE: u64 = 57;
const PIXELS_PER_CYCLE: i32 = 8;

// interrupt request bits in register 0x09
pub const IRQ_RASTER: u8 = 0x02;
pub const IRQ_LIGHTPEN: u8 = 0x04;
pub const IRQ_TIMER1: u8 = 0x08;
pub const IRQ_TIMER2: u8 = 0x10;
pub const IRQ_TIMER3: u8 = 0x40;

/// Memory the TED fetches display data through.
pub trait TedBus {
    fn dma_read(&mut self, addr: u16) -> u8;
    fn dma_read_rom(&mut self, addr: u16) -> u8;
    /// Scan the keyboard matrix rows selected by `select` (low bits
    /// select, 0 = row active).
    fn keyboard_row(&mut self, select: u8) -> u8;
}

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
            cycles_per_line: CYCLES_PER_LINE,
            pixels_per_cycle: PIXELS_PER_CYCLE,
            hblank_bias: 0,
            lines,
        }
    }
}

/// One count-down timer. Underflow raises its interrupt bit and
/// reloads: timer 1 from its register pair, 2 and 3 from 0x10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Timer {
    pub remaining: u32,
    pub active: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            remaining: 0x10000,
            active: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ted {
    standard: Standard,
    pub(crate) regs: [u8; 0x20],
    pub(crate) clock: BeamClock,
    pub(crate) frames: FrameBuffers,

    /// Current raster line within the frame.
    pub(crate) rasterline: u32,
    /// First raster line not yet rendered.
    pub(crate) lastline: u32,
    /// Hardware cursor blink phase, toggled every 16 frames.
    pub(crate) cursor_blink: bool,
    /// ROM banked in at the top of memory (reflected in reg 0x13 bit 0).
    rom_enabled: bool,

    timers: [Timer; 3],
}

impl Ted {
    pub fn new(standard: Standard) -> Self {
        Self {
            standard,
            regs: [0; 0x20],
            clock: BeamClock::new(standard.timing()),
            frames: FrameBuffers::new(FRAME_WIDTH, FRAME_HEIGHT),
            rasterline: 0,
            lastline: 0,
            cursor_blink: false,
            rom_enabled: true,
            timers: [Timer::default(); 3],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.standard);
    }

    pub fn lines(&self) -> u32 {
        self.clock.timing().lines
    }

    /// The most recently completed frame of palette indices.
    pub fn frame(&self) -> &IndexedFrame {
        self.frames.front()
    }

    pub fn palette_rgb(&self, index: u8) -> u32 {
        palette::rgb(index)
    }

    /// Interrupt line to the CPU.
    pub fn irq(&self) -> bool {
        self.regs[0x09] & 0x80 != 0
    }

    pub fn set_rom_enabled(&mut self, enabled: bool) {
        self.rom_enabled = enabled;
    }

    // register decode helpers

    pub(crate) fn screen_on(&self) -> bool {
        self.regs[0x06] & 0x10 != 0
    }

    pub(crate) fn ecm_on(&self) -> bool {
        self.regs[0x06] & 0x40 != 0
    }

    pub(crate) fn hires_on(&self) -> bool {
        self.regs[0x06] & 0x20 != 0
    }

    pub(crate) fn multicolor_on(&self) -> bool {
        self.regs[0x07] & 0x10 != 0
    }

    pub(crate) fn reverse_on(&self) -> bool {
        self.regs[0x07] & 0x80 == 0
    }

    pub(crate) fn lines_25(&self) -> bool {
        self.regs[0x06] & 0x08 != 0
    }

    pub(crate) fn columns_40(&self) -> bool {
        self.regs[0x07] & 0x08 != 0
    }

    pub(crate) fn vertical_pos(&self) -> i32 {
        (self.regs[0x06] & 0x07) as i32
    }

    pub(crate) fn horizontal_pos(&self) -> i32 {
        (self.regs[0x07] & 0x07) as i32
    }

    pub(crate) fn in_rom(&self) -> bool {
        self.regs[0x12] & 0x04 != 0
    }

    pub(crate) fn chargen_addr(&self) -> u32 {
        // bit 10 of the base only decodes with hardware reverse on
        if self.reverse_on() && !self.hires_on() && !self.multicolor_on() {
            ((self.regs[0x13] & 0xFC) as u32) << 8
        } else {
            ((self.regs[0x13] & 0xF8) as u32) << 8
        }
    }

    pub(crate) fn bitmap_addr(&self) -> u32 {
        ((self.regs[0x12] & 0x38) as u32) << 10
    }

    pub(crate) fn video_addr(&self) -> u32 {
        ((self.regs[0x14] & 0xF8) as u32) << 8
    }

    pub(crate) fn cursor_pos(&self) -> u16 {
        self.regs[0x0D] as u16 | (((self.regs[0x0C] & 0x03) as u16) << 8)
    }

    pub(crate) fn background_color(&self) -> u8 {
        self.regs[0x15] & 0x7F
    }

    pub(crate) fn color1(&self) -> u8 {
        self.regs[0x16] & 0x7F
    }

    pub(crate) fn color2(&self) -> u8 {
        self.regs[0x17] & 0x7F
    }

    pub(crate) fn color3(&self) -> u8 {
        self.regs[0x18] & 0x7F
    }

    pub(crate) fn frame_color(&self) -> u8 {
        self.regs[0x19] & 0x7F
    }

    fn raster_compare(&self) -> u32 {
        ((self.regs[0x0A] & 0x01) as u32) << 8 | self.regs[0x0B] as u32
    }

    /// Hardware raster line for a register-encoded line number.
    fn compare_to_rasterline(&self, value: u32) -> u32 {
        (value + RASTER_REGISTER_BIAS) % self.lines()
    }

    /// Register encoding of the current hardware raster line.
    pub(crate) fn rasterline_register(&self) -> u32 {
        (self.rasterline + self.lines() - RASTER_REGISTER_BIAS) % self.lines()
    }

    fn timer_reload(&self, index: usize) -> u32 {
        if index == 0 {
            let value = self.regs[0] as u32 | (self.regs[1] as u32) << 8;
            if value != 0 {
                value
            } else {
                0x10000
            }
        } else {
            // timers 2 and 3 always restart from a full count
            let value = self.regs[2 * index] as u32 | (self.regs[2 * index + 1] as u32) << 8;
            if value != 0 {
                value
            } else {
                0x10000
            }
        }
    }

    // interrupt controller

    pub(crate) fn set_interrupt(&mut self, mask: u8) {
        self.regs[0x09] |= mask;
        if self.regs[0x0A] & self.regs[0x09] & 0x5E != 0 && self.regs[0x09] & 0x80 == 0 {
            self.regs[0x09] |= 0x80;
            log(LogCategory::Interrupts, LogLevel::Debug, || {
                format!("irq start {:02x}", mask)
            });
        }
    }

    fn clear_interrupt(&mut self, mask: u8) {
        self.regs[0x09] &= !mask;
        if self.regs[0x09] & 0x80 != 0 && self.regs[0x09] & self.regs[0x0A] & 0x5E == 0 {
            self.regs[0x09] &= !0x80;
            log(LogCategory::Interrupts, LogLevel::Debug, || {
                format!("irq end {:02x}", mask)
            });
        }
    }

    fn tick_timers(&mut self, cycles: u64) {
        const MASKS: [u8; 3] = [IRQ_TIMER1, IRQ_TIMER2, IRQ_TIMER3];
        for index in 0..3 {
            if !self.timers[index].active {
                continue;
            }
            let mut left = cycles;
            while left >= self.timers[index].remaining as u64 {
                left -= self.timers[index].remaining as u64;
                self.timers[index].remaining = match index {
                    0 => self.timer_reload(0),
                    _ => 0x10000,
                };
                self.set_interrupt(MASKS[index]);
            }
            self.timers[index].remaining -= left as u32;
        }
    }

    /// Advance the chip by `cycles` single-clock CPU cycles: count the
    /// timers down, track the raster, fire the raster interrupt, and
    /// close out the frame when the beam wraps.
    pub fn advance<B: TedBus>(&mut self, bus: &mut B, cycles: u64) {
        self.tick_timers(cycles);
        self.clock.advance(cycles);

        loop {
            let lines = self.lines();
            let reached = self.clock.beam().y.min(lines);
            let irq_line = self.compare_to_rasterline(self.raster_compare());
            if self.rasterline < irq_line && irq_line <= reached {
                self.draw_lines(bus, irq_line);
                self.set_interrupt(IRQ_RASTER);
            }
            if self.clock.beam().y >= lines {
                self.end_frame(bus);
                continue;
            }
            self.rasterline = self.clock.beam().y;
            break;
        }
    }

    fn end_frame<B: TedBus>(&mut self, bus: &mut B) {
        let lines = self.lines();
        self.draw_lines(bus, lines);
        self.lastline = 0;
        self.rasterline = 0;
        self.clock.rebase_frame(lines);
        self.frames.swap();

        // cursor blink runs off the frame counter in reg 0x1f
        if self.regs[0x1F] & 0x0F >= 0x0F {
            self.cursor_blink = !self.cursor_blink;
            self.regs[0x1F] &= 0xF0;
        } else {
            self.regs[0x1F] = self.regs[0x1F].wrapping_add(1);
        }

        // raster compare of zero fires at the wrap itself
        if self.compare_to_rasterline(self.raster_compare()) == 0 {
            self.set_interrupt(IRQ_RASTER);
        }
    }

    /// Catch up and store for registers whose value changes the picture.
    fn write_display_reg<B: TedBus>(&mut self, bus: &mut B, offset: usize, data: u8) {
        if self.regs[offset] != data {
            let upto = self.rasterline;
            self.draw_lines(bus, upto);
            self.regs[offset] = data;
        }
    }

    pub fn write<B: TedBus>(&mut self, bus: &mut B, offset: u16, data: u8) {
        let offset = (offset & 0x1F) as usize;
        match offset {
            // writing a timer's low byte stops it, the high byte restarts it
            0x00 | 0x02 | 0x04 => {
                let index = offset / 2;
                self.regs[offset] = data;
                if self.timers[index].active {
                    self.regs[offset + 1] = (self.timers[index].remaining >> 8) as u8;
                    self.timers[index].active = false;
                }
            }
            0x01 | 0x03 | 0x05 => {
                let index = offset / 2;
                self.regs[offset] = data;
                self.timers[index].remaining = self.timer_reload(index);
                self.timers[index].active = true;
            }
            0x06 | 0x07 | 0x0B | 0x0C | 0x0D | 0x12 | 0x13 | 0x14 | 0x15..=0x19 => {
                self.write_display_reg(bus, offset, data);
            }
            // the input latch reads the keyboard matrix on write
            0x08 => self.regs[0x08] = bus.keyboard_row(data),
            // write-1-to-clear interrupt requests
            0x09 => {
                for mask in [IRQ_TIMER1, IRQ_TIMER2, IRQ_TIMER3, IRQ_RASTER] {
                    if data & mask != 0 {
                        self.clear_interrupt(mask);
                    }
                }
            }
            0x0A => self.regs[0x0A] = data | 0xA0,
            0x0E..=0x11 => {
                // sound registers; synthesis is the audio collaborator's job
                self.regs[offset] = data;
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("sound register {:02x} <- {:02x}", offset, data)
                });
            }
            0x1C => {
                self.regs[offset] = data;
                log(LogCategory::Registers, LogLevel::Debug, || {
                    format!("write to rasterline high {:02x}", data)
                });
            }
            0x1F => {
                self.regs[offset] = data;
                log(LogCategory::Registers, LogLevel::Debug, || {
                    format!("write to cursorblink {:02x}", data)
                });
            }
            _ => self.regs[offset] = data,
        }
    }

    pub fn read<B: TedBus>(&mut self, bus: &mut B, offset: u16) -> u8 {
        let offset = (offset & 0x1F) as usize;
        match offset {
            // the rasterline registers render to "now" before reporting
            0x1C => {
                let upto = self.rasterline;
                self.draw_lines(bus, upto);
                (((self.rasterline_register() & 0x100) >> 8) as u8) | 0xFE
            }
            0x1D => {
                let upto = self.rasterline;
                self.draw_lines(bus, upto);
                (self.rasterline_register() & 0xFF) as u8
            }
            // reg 0x0c reads back with the unused bits latched high
            0x0C => {
                self.regs[0x0C] |= 0xFC;
                self.regs[0x0C]
            }
            _ => self.peek(offset as u16),
        }
    }

    /// Side-effect-free register read.
    pub fn peek(&self, offset: u16) -> u8 {
        let offset = (offset & 0x1F) as usize;
        match offset {
            0x00 | 0x02 | 0x04 => {
                let timer = &self.timers[offset / 2];
                if timer.active {
                    (timer.remaining & 0xFF) as u8
                } else {
                    self.regs[offset]
                }
            }
            0x01 | 0x03 | 0x05 => {
                let timer = &self.timers[offset / 2];
                if timer.active {
                    (timer.remaining >> 8) as u8
                } else {
                    self.regs[offset]
                }
            }
            0x07 => {
                let mut value = self.regs[0x07] & !0x40;
                if self.standard == Standard::Ntsc {
                    value |= 0x40;
                }
                value
            }
            // bit 0 always reads set
            0x09 => self.regs[0x09] | 0x01,
            0x0C => self.regs[0x0C] | 0xFC,
            0x13 => {
                let mut value = self.regs[0x13] & !0x01;
                if self.rom_enabled {
                    value |= 0x01;
                }
                value
            }
            0x1C => (((self.rasterline_register() & 0x100) >> 8) as u8) | 0xFE,
            0x1D => (self.rasterline_register() & 0xFF) as u8,
            0x1E => {
                let column = self.clock.line_cycles() as u32 * PIXELS_PER_CYCLE as u32;
                (column / 2) as u8
            }
            0x1F => (((self.rasterline & 7) as u8) << 4) | (self.regs[0x1F] & 0x0F),
            _ => self.regs[offset],
        }
    }

    pub fn save_state(&self) -> Result<Value, StateError> {
        state::save(CHIP_NAME, STATE_VERSION, self)
    }

    pub fn load_state(&mut self, value: &Value) -> Result<(), StateError> {
        *self = state::load(CHIP_NAME, STATE_VERSION, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        ram: Vec<u8>,
        rom: Vec<u8>,
        keyboard: u8,
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
                rom: vec![0; 0x10000],
                keyboard: 0xFF,
            }
        }
    }

    impl TedBus for TestBus {
        fn dma_read(&mut self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn dma_read_rom(&mut self, addr: u16) -> u8 {
            self.rom[addr as usize]
        }

        fn keyboard_row(&mut self, _select: u8) -> u8 {
            self.keyboard
        }
    }

    fn pal_ted() -> (Ted, TestBus) {
        (Ted::new(Standard::Pal), TestBus::new())
    }

    #[test]
    fn test_timer1_counts_down_and_reloads() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x00, 100); // low byte stops the timer
        ted.write(&mut bus, 0x01, 0); // high byte starts it at 100
        assert!(ted.timers[0].active);

        ted.advance(&mut bus, 99);
        assert_eq!(ted.peek(0x09) & IRQ_TIMER1, 0);

        ted.advance(&mut bus, 1);
        assert_ne!(ted.peek(0x09) & IRQ_TIMER1, 0);
        // reload comes from the register pair, not 0x10000
        assert_eq!(ted.timers[0].remaining, 100);
    }

    #[test]
    fn test_timer_write_low_stops_and_captures() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x02, 0x00);
        ted.write(&mut bus, 0x03, 0x02); // timer 2 at 0x200
        ted.advance(&mut bus, 0x80);
        ted.write(&mut bus, 0x02, 0x34); // stop
        assert!(!ted.timers[1].active);
        assert_eq!(ted.regs[0x03], 0x01); // remaining 0x180 captured high
    }

    #[test]
    fn test_irq_line_needs_enable() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x00, 10);
        ted.write(&mut bus, 0x01, 0);
        ted.advance(&mut bus, 10);
        // request latched but not enabled: no interrupt output
        assert_ne!(ted.peek(0x09) & IRQ_TIMER1, 0);
        assert!(!ted.irq());

        ted.write(&mut bus, 0x0A, IRQ_TIMER1);
        ted.advance(&mut bus, 10);
        assert!(ted.irq());
    }

    #[test]
    fn test_irq_acknowledge_write_one_to_clear() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x0A, IRQ_TIMER1);
        ted.write(&mut bus, 0x00, 10);
        ted.write(&mut bus, 0x01, 0);
        ted.advance(&mut bus, 10);
        assert!(ted.irq());

        ted.write(&mut bus, 0x09, IRQ_TIMER1);
        assert!(!ted.irq());
        assert_eq!(ted.peek(0x09) & IRQ_TIMER1, 0);
    }

    #[test]
    fn test_raster_interrupt_fires_at_compare_line() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x0A, IRQ_RASTER);
        ted.write(&mut bus, 0x0B, 100); // compare line 100 -> raster 145

        ted.advance(&mut bus, 57 * 144);
        assert!(!ted.irq());

        ted.advance(&mut bus, 57);
        assert!(ted.irq());
        assert_eq!(ted.rasterline, 145);
    }

    #[test]
    fn test_rasterline_read_uses_register_encoding() {
        let (mut ted, mut bus) = pal_ted();
        ted.advance(&mut bus, 57 * 145);
        assert_eq!(ted.read(&mut bus, 0x1D), 100);
        assert_eq!(ted.read(&mut bus, 0x1C), 0xFE);
    }

    #[test]
    fn test_rastercolumn_read() {
        let (mut ted, mut bus) = pal_ted();
        ted.advance(&mut bus, 57 * 3 + 20);
        // 20 cycles into the line, 8 pixels per cycle, halved
        assert_eq!(ted.read(&mut bus, 0x1E), 80);
    }

    #[test]
    fn test_read_quirks() {
        let (mut ted, mut bus) = pal_ted();
        assert_eq!(ted.read(&mut bus, 0x09) & 0x01, 0x01);
        assert_eq!(ted.read(&mut bus, 0x0C), 0xFC);

        // NTSC flag in reg 7 reads from the chip variant
        assert_eq!(ted.read(&mut bus, 0x07) & 0x40, 0);
        let mut ntsc = Ted::new(Standard::Ntsc);
        assert_eq!(ntsc.read(&mut bus, 0x07) & 0x40, 0x40);

        // ROM banking status in reg 0x13 bit 0
        assert_eq!(ted.read(&mut bus, 0x13) & 0x01, 0x01);
        ted.set_rom_enabled(false);
        assert_eq!(ted.read(&mut bus, 0x13) & 0x01, 0x00);
    }

    #[test]
    fn test_keyboard_latch_on_write() {
        let (mut ted, mut bus) = pal_ted();
        bus.keyboard = 0xBD;
        ted.write(&mut bus, 0x08, 0xFE);
        assert_eq!(ted.read(&mut bus, 0x08), 0xBD);
    }

    #[test]
    fn test_screen_off_renders_black() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x19, 0x6E); // frame color, must not appear
        ted.advance(&mut bus, 57 * 312);
        assert!(ted.frame().pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_border_uses_frame_color() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18); // screen on, 25 lines
        ted.write(&mut bus, 0x07, 0x08); // 40 columns
        ted.write(&mut bus, 0x19, 0x6E);
        ted.advance(&mut bus, 57 * 312);

        let frame = ted.frame();
        assert_eq!(frame.row(0).unwrap()[0], 0x6E);
        assert_eq!(frame.row(4).unwrap()[100], 0x6E);
        // left and right borders of a text row
        assert_eq!(frame.row(20).unwrap()[0], 0x6E);
        assert_eq!(frame.row(20).unwrap()[330], 0x6E);
    }

    #[test]
    fn test_normal_text_mode_cell() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x15, 0x11); // background
        bus.ram[0x0400] = 2; // character pointer for cell 0
        bus.ram[0x0000] = 0x66; // attribute color
        bus.ram[2 * 8] = 0xAA; // chargen row 0 of character 2
        ted.advance(&mut bus, 57 * 312);

        let row = ted.frame().row(8).unwrap();
        assert_eq!(&row[8..16], &[0x66, 0x11, 0x66, 0x11, 0x66, 0x11, 0x66, 0x11]);
    }

    #[test]
    fn test_reverse_text_swaps_colors() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08); // bit 7 clear: hardware reverse on
        ted.write(&mut bus, 0x15, 0x11);
        bus.ram[0x0400] = 0x82; // bit 7 selects reverse video
        bus.ram[0x0000] = 0x66;
        bus.ram[2 * 8] = 0xF0;
        ted.advance(&mut bus, 57 * 312);

        let row = ted.frame().row(8).unwrap();
        // lit bits show background, unlit show the attribute color
        assert_eq!(&row[8..16], &[0x11, 0x11, 0x11, 0x11, 0x66, 0x66, 0x66, 0x66]);
    }

    #[test]
    fn test_multicolor_text_cell() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x18); // 40 columns + multicolor
        ted.write(&mut bus, 0x15, 0x01);
        ted.write(&mut bus, 0x16, 0x02);
        ted.write(&mut bus, 0x17, 0x03);
        bus.ram[0x0400] = 1;
        bus.ram[0x0000] = 0x0F; // bit 3: multicolor character, color 7
        bus.ram[1 * 8] = 0b0001_1011; // pixel pairs 00 01 10 11
        ted.advance(&mut bus, 57 * 312);

        let row = ted.frame().row(8).unwrap();
        assert_eq!(&row[8..16], &[0x01, 0x01, 0x02, 0x02, 0x03, 0x03, 0x07, 0x07]);
    }

    #[test]
    fn test_ecm_text_selects_off_color() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x58); // screen on, 25 lines, ecm
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x15, 0x01);
        ted.write(&mut bus, 0x17, 0x33); // color2: off-color bank 2
        bus.ram[0x0400] = 0x81; // bank 2 (bits 7-6), character 1
        bus.ram[0x0000] = 0x55;
        bus.ram[1 * 8] = 0xF0;
        ted.advance(&mut bus, 57 * 312);

        let row = ted.frame().row(8).unwrap();
        assert_eq!(&row[8..16], &[0x55, 0x55, 0x55, 0x55, 0x33, 0x33, 0x33, 0x33]);
    }

    #[test]
    fn test_hires_bitmap_cell() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x38); // screen on, 25 lines, hires
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x12, 0x08); // bitmap at 0x2000
        bus.ram[0x0400] = 0x12; // color nibbles
        bus.ram[0x0000] = 0x34; // luminance nibbles
        bus.ram[0x2000] = 0xF0;
        ted.advance(&mut bus, 57 * 312);

        let row = ted.frame().row(8).unwrap();
        let on = (0x1 | (0x34 << 4)) as u16 as u8 & 0x7F; // 0x41
        let off = 0x2 | (0x34 & 0x70); // 0x32
        assert_eq!(&row[8..16], &[on, on, on, on, off, off, off, off]);
    }

    #[test]
    fn test_cursor_blink_toggles_every_16_frames() {
        let (mut ted, mut bus) = pal_ted();
        assert!(!ted.cursor_blink);
        for _ in 0..15 {
            ted.advance(&mut bus, 57 * 312);
        }
        assert!(!ted.cursor_blink);
        ted.advance(&mut bus, 57 * 312);
        assert!(ted.cursor_blink);
    }

    #[test]
    fn test_cursor_draws_solid_cell() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x1F, 0x0F); // blink counter about to toggle
        ted.write(&mut bus, 0x0D, 0x00); // cursor at cell 0
        bus.ram[0x0000] = 0x26;
        ted.advance(&mut bus, 57 * 312); // toggles blink on at the wrap
        ted.advance(&mut bus, 57 * 312); // frame rendered with cursor visible

        let row = ted.frame().row(8).unwrap();
        assert_eq!(&row[8..16], &[0x26; 8]);
    }

    #[test]
    fn test_display_write_catches_up_mid_frame() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x15, 0x11);
        // all char data zero: every window pixel shows the background
        ted.advance(&mut bus, 57 * 100); // raster line 100, bitmap line 60
        ted.write(&mut bus, 0x15, 0x22);
        ted.advance(&mut bus, 57 * 212);

        let frame = ted.frame();
        assert_eq!(frame.row(20).unwrap()[100], 0x11);
        assert_eq!(frame.row(100).unwrap()[100], 0x22);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (mut ted, mut bus) = pal_ted();
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x19, 0x6E);
        ted.write(&mut bus, 0x00, 50);
        ted.write(&mut bus, 0x01, 0);
        ted.advance(&mut bus, 57 * 10 + 7);

        let saved = ted.save_state().expect("save");
        let mut restored = Ted::new(Standard::Pal);
        restored.load_state(&saved).expect("load");

        assert_eq!(restored.rasterline, ted.rasterline);
        assert_eq!(restored.regs, ted.regs);
        assert_eq!(restored.timers, ted.timers);
        assert_eq!(restored.peek(0x1D), ted.peek(0x1D));
    }

    #[test]
    fn test_load_rejects_wrong_version() {
        let mut ted = Ted::new(Standard::Pal);
        let saved = ted.save_state().expect("save");
        let mut tampered = saved.clone();
        tampered["version"] = serde_json::json!(99);
        assert!(ted.load_state(&tampered).is_err());
    }
}
