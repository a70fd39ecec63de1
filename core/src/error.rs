use thiserror::Error;

/// Fatal interpreter conditions.
///
/// None of these are recoverable at the engine's level; the driving
/// frontend decides how to unwind. Register arithmetic never produces an
/// error — 8-bit overflow wraps modulo 256 by design.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The decoder found no handler for this opcode within its family.
    #[error("unknown instruction in family {family:#03X} (opcode {opcode:#06X})")]
    UnknownInstruction { opcode: u16, family: u8 },

    /// A load or memory-indexed access falls outside addressable memory.
    #[error("{len} byte(s) at {addr:#05X} exceed addressable memory")]
    OutOfBounds { addr: u16, len: usize },

    /// A subroutine call would exceed the fixed stack depth.
    #[error("call stack overflow at depth {depth}")]
    StackOverflow { depth: usize },

    /// A return executed with no caller on the stack.
    #[error("return with empty call stack")]
    StackUnderflow,

    /// The pending key wait was cancelled by shutdown. Drivers treat this
    /// as a clean exit rather than a failure.
    #[error("key wait interrupted by shutdown")]
    Interrupted,
}
