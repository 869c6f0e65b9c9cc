//! Atari 2600 TIA video chip, cycle-accurate via catch-up rendering.

pub mod collision;
pub mod palette;
pub mod registers;
pub mod renderer;
pub mod tia;

pub use tia::{Standard, Tia};
