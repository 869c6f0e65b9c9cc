//! Indexed-color frame buffers.
//!
//! Chip cores render palette indices, not RGB: one byte per pixel,
//! decoded by the presentation layer through the chip's palette table.
//! Each chip owns a pair of buffers — one being drawn into, one
//! presented — swapped on the chip's vertical-sync event.

use serde::{Deserialize, Serialize};

/// A fixed-size 2D buffer of palette indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl IndexedFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    /// A full row of pixels, or `None` when `y` is outside the buffer.
    ///
    /// Out-of-range rows are a normal condition (guest software can run
    /// the beam past the allocated height); callers skip them.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        Some(&mut self.pixels[start..start + self.width as usize])
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        Some(&self.pixels[start..start + self.width as usize])
    }

    pub fn fill(&mut self, index: u8) {
        self.pixels.fill(index);
    }
}

/// Which buffer of a [`FrameBuffers`] pair is being drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferSelect {
    First,
    Second,
}

impl BufferSelect {
    fn other(self) -> Self {
        match self {
            BufferSelect::First => BufferSelect::Second,
            BufferSelect::Second => BufferSelect::First,
        }
    }
}

/// Double-buffered frame pair.
///
/// The *back* buffer is the one the chip is currently rendering into; the
/// *front* buffer is the most recently completed frame, handed to the
/// presentation collaborator. `swap` is the only way the roles change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameBuffers {
    buffers: [IndexedFrame; 2],
    active: BufferSelect,
}

impl FrameBuffers {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffers: [
                IndexedFrame::new(width, height),
                IndexedFrame::new(width, height),
            ],
            active: BufferSelect::First,
        }
    }

    fn index(select: BufferSelect) -> usize {
        match select {
            BufferSelect::First => 0,
            BufferSelect::Second => 1,
        }
    }

    /// The buffer being drawn into.
    pub fn back(&self) -> &IndexedFrame {
        &self.buffers[Self::index(self.active)]
    }

    pub fn back_mut(&mut self) -> &mut IndexedFrame {
        &mut self.buffers[Self::index(self.active)]
    }

    /// The most recently completed frame.
    pub fn front(&self) -> &IndexedFrame {
        &self.buffers[Self::index(self.active.other())]
    }

    /// Flip the roles of the two buffers (vertical-sync event).
    pub fn swap(&mut self) {
        self.active = self.active.other();
    }

    pub fn active(&self) -> BufferSelect {
        self.active
    }
}
