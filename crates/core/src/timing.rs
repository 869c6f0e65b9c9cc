//! Raster timing: converting a CPU cycle count into a beam position.
//!
//! Video chips here never run on their own clock. They carry a cycle
//! counter advanced in lockstep with the CPU and recompute the beam
//! position from it on demand, so rendering can be deferred until a
//! register access actually needs the screen contents to be current.

use serde::{Deserialize, Serialize};

/// Geometry of one video standard's raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterTiming {
    /// CPU cycles per scanline.
    pub cycles_per_line: u64,
    /// Horizontal pixels produced per CPU cycle.
    pub pixels_per_cycle: i32,
    /// Pixels of horizontal blank preceding x = 0. The beam x for a
    /// line starts at `-hblank_bias`.
    pub hblank_bias: i32,
    /// Total scanlines per frame, blanking included.
    pub lines: u32,
}

impl RasterTiming {
    pub fn pixels_per_line(&self) -> i32 {
        self.cycles_per_line as i32 * self.pixels_per_cycle
    }
}

/// Beam position derived from a cycle counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamPos {
    /// Horizontal pixel, `-hblank_bias ..= pixels_per_line - hblank_bias - 1`.
    pub x: i32,
    /// Scanline since the start of the frame. Not wrapped: the caller
    /// decides when a frame ends.
    pub y: u32,
}

/// Tracks total elapsed cycles and the cycle at which the current frame
/// began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamClock {
    timing: RasterTiming,
    total_cycles: u64,
    frame_start_cycles: u64,
}

impl BeamClock {
    pub fn new(timing: RasterTiming) -> Self {
        Self {
            timing,
            total_cycles: 0,
            frame_start_cycles: 0,
        }
    }

    pub fn timing(&self) -> &RasterTiming {
        &self.timing
    }

    pub fn advance(&mut self, cycles: u64) {
        self.total_cycles += cycles;
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Cycles elapsed since the start of the current frame.
    pub fn frame_cycles(&self) -> u64 {
        self.total_cycles - self.frame_start_cycles
    }

    /// Cycles elapsed on the current scanline.
    pub fn line_cycles(&self) -> u64 {
        self.frame_cycles() % self.timing.cycles_per_line
    }

    /// Current beam position.
    pub fn beam(&self) -> BeamPos {
        let elapsed = self.frame_cycles();
        let x = (elapsed % self.timing.cycles_per_line) as i32 * self.timing.pixels_per_cycle
            - self.timing.hblank_bias;
        let y = (elapsed / self.timing.cycles_per_line) as u32;
        BeamPos { x, y }
    }

    /// Begin a new frame at scanline `lines_consumed` worth of cycles past
    /// the previous frame start. Fractional-line remainders stay on the
    /// clock, so a mid-line sync keeps its horizontal phase.
    pub fn rebase_frame(&mut self, lines_consumed: u32) {
        self.frame_start_cycles += lines_consumed as u64 * self.timing.cycles_per_line;
    }
}
