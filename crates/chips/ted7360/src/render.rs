//! Scanline catch-up renderer for the TED character window and borders.
//!
//! Lines are drawn in character-row chunks: each chunk fetches the
//! character pointer and attribute for every visible cell over the bus,
//! dispatches on the display mode, then paints the side borders over
//! the cell edges. Per-cell colors are derived from the registers on
//! the fly, so a register write between two catch-up calls only affects
//! the lines rendered after it.

use crate::ted::{Ted, TedBus, BORDER, FRAME_HEIGHT, FRAME_WIDTH, RASTER_TOP};

impl Ted {
    /// Render every raster line from the last rendered one up to
    /// (excluding) `last`.
    pub(crate) fn draw_lines<B: TedBus>(&mut self, bus: &mut B, last: u32) {
        let first = self.lastline;
        self.lastline = last;

        let mut first = first as i32 - RASTER_TOP;
        let last = last as i32 - RASTER_TOP;
        if first >= last || last <= 0 {
            return;
        }
        if first < 0 {
            first = 0;
        }

        if !self.screen_on() {
            for line in first..last.min(FRAME_HEIGHT as i32) {
                self.fill_span(line, 0, FRAME_WIDTH as i32, 0);
            }
            return;
        }

        let frame_color = self.frame_color();
        let (border_left, border_right) = if self.columns_40() {
            (BORDER, BORDER + 320)
        } else {
            (BORDER + 7, BORDER + 7 + 304)
        };
        let (y_begin, y_end) = if self.lines_25() { (0, 200) } else { (4, 196) };
        let x_begin = if self.columns_40() {
            0
        } else {
            self.horizontal_pos()
        };
        let x_end = x_begin + 320;

        // top border
        let mut line = first;
        let end = last.min(y_begin + BORDER);
        while line < end {
            self.fill_span(line, 0, FRAME_WIDTH as i32, frame_color);
            line += 1;
        }

        let mut vline = if self.lines_25() {
            line - y_begin - BORDER
        } else {
            line - y_begin - BORDER + 8 - self.vertical_pos()
        };

        let end = last.min(y_end + BORDER);
        while line < end {
            let offs_base = (vline >> 3) * 40;
            let ybegin = vline & 7;
            let yoff = line - ybegin;
            let yend = if yoff + 7 < end { 7 } else { end - yoff - 1 };

            let mut offs = offs_base;
            let mut xoff = x_begin + BORDER;
            while xoff < x_end + BORDER {
                self.draw_cell(bus, offs, ybegin, yend, yoff, xoff);
                xoff += 8;
                offs += 1;
            }

            for y in ybegin..=yend {
                self.fill_span(yoff + y, 0, border_left, frame_color);
                self.fill_span(yoff + y, border_right, FRAME_WIDTH as i32, frame_color);
            }

            vline = (vline + 8) & !7;
            line = line + 1 + yend - ybegin;
        }

        // bottom border
        let end = last.min(FRAME_HEIGHT as i32);
        while line < end {
            self.fill_span(line, 0, FRAME_WIDTH as i32, frame_color);
            line += 1;
        }
    }

    fn draw_cell<B: TedBus>(
        &mut self,
        bus: &mut B,
        offs: i32,
        ybegin: i32,
        yend: i32,
        yoff: i32,
        xoff: i32,
    ) {
        let ch = self.fetch_video(bus, 0x400 + offs);
        let attr = self.fetch_video(bus, offs);
        let background = self.background_color();

        if self.hires_on() {
            let c1 = ((((ch as u16) >> 4) & 0x0F) | ((attr as u16) << 4)) as u8 & 0x7F;
            let c2 = (ch & 0x0F) | (attr & 0x70);
            if self.multicolor_on() {
                let colors = [background, c1, c2, self.color1()];
                self.draw_bitmap_multi(bus, ybegin, yend, offs, yoff, xoff, colors);
            } else {
                self.draw_bitmap(bus, ybegin, yend, offs, yoff, xoff, [c2, c1]);
            }
            return;
        }

        // the hardware cursor is only wired up in plain text mode
        if self.ecm_on() {
            let off_color = match ch >> 6 {
                0 => background,
                1 => self.color1(),
                2 => self.color2(),
                _ => self.color3(),
            };
            let colors = [off_color, attr & 0x7F];
            self.draw_character(bus, ybegin, yend, (ch & 0x3F) as i32, yoff, xoff, colors);
        } else if self.multicolor_on() {
            if attr & 0x08 != 0 {
                let colors = [background, self.color1(), self.color2(), attr & 0x77];
                self.draw_character_multi(bus, ybegin, yend, ch as i32, yoff, xoff, colors);
            } else {
                let colors = [background, attr & 0x7F];
                self.draw_character(bus, ybegin, yend, ch as i32, yoff, xoff, colors);
            }
        } else if self.cursor_blink && offs == self.cursor_pos() as i32 {
            self.draw_solid(ybegin, yend, yoff, xoff, attr & 0x7F);
        } else if self.reverse_on() && ch & 0x80 != 0 {
            let colors = [attr & 0x7F, background];
            if self.cursor_blink && attr & 0x80 != 0 {
                self.draw_solid(ybegin, yend, yoff, xoff, colors[0]);
            } else {
                self.draw_character(bus, ybegin, yend, (ch & 0x7F) as i32, yoff, xoff, colors);
            }
        } else {
            let colors = [background, attr & 0x7F];
            if self.cursor_blink && attr & 0x80 != 0 {
                self.draw_solid(ybegin, yend, yoff, xoff, colors[0]);
            } else {
                self.draw_character(bus, ybegin, yend, ch as i32, yoff, xoff, colors);
            }
        }
    }

    fn fetch_video<B: TedBus>(&self, bus: &mut B, offs: i32) -> u8 {
        let addr = self.video_addr().wrapping_add(offs as u32) & 0xFFFF;
        bus.dma_read(addr as u16)
    }

    fn fetch_chargen<B: TedBus>(&self, bus: &mut B, ch: i32, y: i32) -> u8 {
        let addr = self.chargen_addr().wrapping_add((ch * 8 + y) as u32) & 0xFFFF;
        if self.in_rom() {
            bus.dma_read_rom(addr as u16)
        } else {
            bus.dma_read(addr as u16)
        }
    }

    fn fetch_bitmap<B: TedBus>(&self, bus: &mut B, offs: i32, y: i32) -> u8 {
        let addr = self.bitmap_addr().wrapping_add((offs * 8 + y) as u32) & 0xFFFF;
        bus.dma_read(addr as u16)
    }

    fn draw_character<B: TedBus>(
        &mut self,
        bus: &mut B,
        ybegin: i32,
        yend: i32,
        ch: i32,
        yoff: i32,
        xoff: i32,
        colors: [u8; 2],
    ) {
        for y in ybegin..=yend {
            let code = self.fetch_chargen(bus, ch, y);
            for bit in 0..8 {
                self.plot(yoff + y, xoff + bit, colors[((code >> (7 - bit)) & 1) as usize]);
            }
        }
    }

    fn draw_character_multi<B: TedBus>(
        &mut self,
        bus: &mut B,
        ybegin: i32,
        yend: i32,
        ch: i32,
        yoff: i32,
        xoff: i32,
        colors: [u8; 4],
    ) {
        for y in ybegin..=yend {
            let code = self.fetch_chargen(bus, ch, y);
            for pair in 0..4 {
                let color = colors[((code >> (6 - 2 * pair)) & 3) as usize];
                self.plot(yoff + y, xoff + 2 * pair, color);
                self.plot(yoff + y, xoff + 2 * pair + 1, color);
            }
        }
    }

    fn draw_bitmap<B: TedBus>(
        &mut self,
        bus: &mut B,
        ybegin: i32,
        yend: i32,
        offs: i32,
        yoff: i32,
        xoff: i32,
        colors: [u8; 2],
    ) {
        for y in ybegin..=yend {
            let code = self.fetch_bitmap(bus, offs, y);
            for bit in 0..8 {
                self.plot(yoff + y, xoff + bit, colors[((code >> (7 - bit)) & 1) as usize]);
            }
        }
    }

    fn draw_bitmap_multi<B: TedBus>(
        &mut self,
        bus: &mut B,
        ybegin: i32,
        yend: i32,
        offs: i32,
        yoff: i32,
        xoff: i32,
        colors: [u8; 4],
    ) {
        for y in ybegin..=yend {
            let code = self.fetch_bitmap(bus, offs, y);
            for pair in 0..4 {
                let color = colors[((code >> (6 - 2 * pair)) & 3) as usize];
                self.plot(yoff + y, xoff + 2 * pair, color);
                self.plot(yoff + y, xoff + 2 * pair + 1, color);
            }
        }
    }

    fn draw_solid(&mut self, ybegin: i32, yend: i32, yoff: i32, xoff: i32, color: u8) {
        for y in ybegin..=yend {
            self.fill_span(yoff + y, xoff, xoff + 8, color);
        }
    }

    fn fill_span(&mut self, y: i32, x0: i32, x1: i32, color: u8) {
        if y < 0 {
            return;
        }
        if let Some(row) = self.frames.back_mut().row_mut(y as u32) {
            let x0 = x0.clamp(0, row.len() as i32) as usize;
            let x1 = x1.clamp(0, row.len() as i32) as usize;
            for pixel in &mut row[x0..x1] {
                *pixel = color;
            }
        }
    }

    fn plot(&mut self, y: i32, x: i32, color: u8) {
        if y < 0 || x < 0 {
            return;
        }
        if let Some(row) = self.frames.back_mut().row_mut(y as u32) {
            if let Some(pixel) = row.get_mut(x as usize) {
                *pixel = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ted::{Standard, Ted, TedBus};

    struct FlatBus {
        ram: Vec<u8>,
        rom: Vec<u8>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
                rom: vec![0; 0x10000],
            }
        }
    }

    impl TedBus for FlatBus {
        fn dma_read(&mut self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn dma_read_rom(&mut self, addr: u16) -> u8 {
            self.rom[addr as usize]
        }

        fn keyboard_row(&mut self, _select: u8) -> u8 {
            0xFF
        }
    }

    fn full_frame(ted: &mut Ted, bus: &mut FlatBus) {
        ted.advance(bus, 57 * 312);
    }

    #[test]
    fn test_chargen_fetches_from_rom_when_banked() {
        let (mut ted, mut bus) = (Ted::new(Standard::Pal), FlatBus::new());
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x12, 0x04); // character fetches go to ROM
        bus.ram[0x0400] = 1;
        bus.ram[0x0000] = 0x33;
        bus.ram[8] = 0xFF; // must be ignored
        bus.rom[8] = 0x80;
        full_frame(&mut ted, &mut bus);

        let row = ted.frame().row(8).unwrap();
        assert_eq!(row[8], 0x33);
        assert_eq!(row[9], ted.peek(0x15) & 0x7F);
    }

    #[test]
    fn test_38_column_mode_narrows_borders() {
        let (mut ted, mut bus) = (Ted::new(Standard::Pal), FlatBus::new());
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x00); // 38 columns
        ted.write(&mut bus, 0x15, 0x21);
        ted.write(&mut bus, 0x19, 0x6E);
        full_frame(&mut ted, &mut bus);

        let row = ted.frame().row(20).unwrap();
        assert_eq!(row[14], 0x6E);
        assert_eq!(row[15], 0x21);
        assert_eq!(row[318], 0x21);
        assert_eq!(row[319], 0x6E);
    }

    #[test]
    fn test_24_line_mode_extends_vertical_border() {
        let (mut ted, mut bus) = (Ted::new(Standard::Pal), FlatBus::new());
        ted.write(&mut bus, 0x06, 0x10); // screen on, 24 lines
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x15, 0x21);
        ted.write(&mut bus, 0x19, 0x6E);
        full_frame(&mut ted, &mut bus);

        let frame = ted.frame();
        // 24-line window spans bitmap lines 12..204 instead of 8..208
        assert_eq!(frame.row(10).unwrap()[100], 0x6E);
        assert_eq!(frame.row(12).unwrap()[100], 0x21);
        assert_eq!(frame.row(203).unwrap()[100], 0x21);
        assert_eq!(frame.row(204).unwrap()[100], 0x6E);
    }

    #[test]
    fn test_video_matrix_base_moves_with_reg_14() {
        let (mut ted, mut bus) = (Ted::new(Standard::Pal), FlatBus::new());
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        ted.write(&mut bus, 0x14, 0x08); // video matrix at 0x0800
        bus.ram[0x0C00] = 1; // pointers at base | 0x400
        bus.ram[0x0800] = 0x44;
        bus.ram[8] = 0xFF;
        full_frame(&mut ted, &mut bus);

        assert_eq!(ted.frame().row(8).unwrap()[8], 0x44);
    }

    #[test]
    fn test_second_character_row_uses_next_forty_cells() {
        let (mut ted, mut bus) = (Ted::new(Standard::Pal), FlatBus::new());
        ted.write(&mut bus, 0x06, 0x18);
        ted.write(&mut bus, 0x07, 0x08);
        bus.ram[0x0400 + 40] = 1; // row 1, cell 0
        bus.ram[40] = 0x55;
        bus.ram[8] = 0xFF;
        full_frame(&mut ted, &mut bus);

        let frame = ted.frame();
        assert_eq!(frame.row(8).unwrap()[8], ted.peek(0x15) & 0x7F);
        assert_eq!(frame.row(16).unwrap()[8], 0x55);
    }

    #[test]
    fn test_partial_catch_up_splits_inside_character_row() {
        // rendering in two halves of a character row must match a
        // single full-frame pass
        let mut reference = Ted::new(Standard::Pal);
        let mut split = Ted::new(Standard::Pal);
        let mut bus = FlatBus::new();
        for cell in 0..40 {
            bus.ram[0x0400 + cell] = (cell & 0x3F) as u8;
            bus.ram[cell] = (0x10 + cell) as u8 & 0x7F;
            bus.ram[cell * 8] = 0xA5;
            bus.ram[cell * 8 + 4] = 0x5A;
        }
        for ted in [&mut reference, &mut split] {
            ted.write(&mut bus, 0x06, 0x18);
            ted.write(&mut bus, 0x07, 0x08);
            ted.write(&mut bus, 0x15, 0x31);
        }

        reference.advance(&mut bus, 57 * 312);
        // raster 52 is mid character row; the register read forces the
        // catch-up there
        split.advance(&mut bus, 57 * 52);
        split.read(&mut bus, 0x1D);
        split.advance(&mut bus, 57 * 260);

        assert_eq!(reference.frame().pixels, split.frame().pixels);
    }
}
