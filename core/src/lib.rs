//! Machine state and interpreter engine for the CHIP-8 virtual machine.
//!
//! The crate is frontend-agnostic: [`Interpreter`] executes instructions
//! against the machine state one [`step`](Interpreter::step) at a time,
//! while rendering, input and timer decay happen in external collaborators
//! that attach through the shared [`Screen`], [`Keypad`] and [`Timers`]
//! handles. Errors are fatal to interpretation and propagate to the
//! driving frontend.

pub use crate::error::Error;
pub use crate::interpreter::Interpreter;
pub use crate::keypad::Keypad;
pub use crate::screen::{FrameBuffer, Screen};
pub use crate::timers::Timers;

pub mod constants;
mod error;
mod instruction;
mod interpreter;
mod keypad;
mod opcode;
mod operations;
mod screen;
mod state;
mod timers;
