//! Shared primitives for cycle-accurate raster video chips.
//!
//! A chip core here follows the catch-up model: it keeps a CPU cycle
//! counter (advanced in lockstep with the host CPU), and every register
//! access first renders the span of screen the beam covered since the
//! last access, using the register values that were live during that
//! span. The rest of the machine never calls into the renderer directly.

pub mod frame;
pub mod logging;
pub mod state;
pub mod timing;

pub use frame::{BufferSelect, FrameBuffers, IndexedFrame};
pub use state::StateError;
pub use timing::{BeamClock, BeamPos, RasterTiming};

use serde_json::Value;

/// A memory-mapped raster video chip driven by a CPU cycle counter.
///
/// `write` and `read` may mutate latches and trigger catch-up rendering;
/// `peek` must not, so debuggers and save-state code can inspect the
/// register file without disturbing emulation.
pub trait VideoChip {
    /// Reset to initial power-on state.
    fn reset(&mut self);

    /// Advance the chip's cycle counter. Rendering is deferred; nothing
    /// is drawn until a register access forces a catch-up.
    fn advance(&mut self, cpu_cycles: u64);

    /// Write a register. Catches the renderer up to the current beam
    /// position before the new value takes effect.
    fn write(&mut self, offset: u16, value: u8);

    /// Read a register, with any read side effects the chip defines.
    fn read(&mut self, offset: u16) -> u8;

    /// Side-effect-free register read.
    fn peek(&self, offset: u16) -> u8;

    /// CPU cycles the chip is currently holding the CPU for (write
    /// stalls such as a wait-for-horizontal-sync strobe). Returns 0 when
    /// none is pending and clears the request.
    fn take_stall(&mut self) -> u64 {
        0
    }

    /// The most recently completed frame of palette indices.
    fn frame(&self) -> &IndexedFrame;

    /// Decode a palette index to 0x00RRGGBB.
    fn palette_rgb(&self, index: u8) -> u32;

    /// JSON-serializable save state. Excludes anything reconstructible
    /// from mounted media.
    fn save_state(&self) -> Result<Value, StateError>;

    /// Load a save state produced by the same chip and version.
    fn load_state(&mut self, value: &Value) -> Result<(), StateError>;
}
