//! SDL2 renderer for the shared CHIP-8 framebuffer.

pub use crate::display::{Display, DisplayError};

mod display;
