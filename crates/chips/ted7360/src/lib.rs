//! TED 7360 emulation core (Commodore 16 / Plus4).

pub mod palette;
pub mod render;
pub mod ted;

pub use ted::{Standard, Ted, TedBus};
