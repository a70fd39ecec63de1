use std::sync::Arc;

use log::trace;

use crate::error::Error;
use crate::instruction;
use crate::keypad::Keypad;
use crate::screen::Screen;
use crate::state::State;
use crate::timers::Timers;

/// The fetch-decode-dispatch engine.
///
/// One call to [`Interpreter::step`] executes exactly one instruction
/// against the machine state. The engine is synchronous and single
/// threaded; the only suspension point is the key-wait instruction, which
/// parks the calling thread until the frontend hands over a press (or a
/// shutdown, surfacing as [`Error::Interrupted`]).
///
/// Frontend collaborators attach through the shared handles returned by
/// [`screen`](Interpreter::screen), [`keypad`](Interpreter::keypad) and
/// [`timers`](Interpreter::timers): the renderer polls the screen, the
/// input source writes key state, and a real-time driver ticks the timers
/// at 60 Hz. The engine itself never decrements a timer.
pub struct Interpreter {
    state: State,
}

impl Interpreter {
    /// A machine with zeroed registers, the font in low memory and the
    /// program counter at 0x200.
    pub fn new() -> Self {
        Interpreter { state: State::new() }
    }

    /// Load a program image into memory at 0x200.
    ///
    /// Fails with [`Error::OutOfBounds`] when the image does not fit the
    /// program space; nothing is written in that case.
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.state.load_program(bytes)?;
        log::debug!("loaded {} byte program at {:#05X}", bytes.len(), crate::constants::PROGRAM_START);
        Ok(())
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<(), Error> {
        let op = self.fetch()?;
        trace!(
            "{:04X} pc={:04X} i={:04X} sp={} v={:02X?}",
            op,
            self.state.pc,
            self.state.i,
            self.state.stack.depth(),
            self.state.v
        );
        let run = instruction::decode(op)?;
        run(op, &mut self.state)
    }

    /// Read the two-byte opcode at the program counter.
    fn fetch(&self) -> Result<u16, Error> {
        let word = self.state.mem_slice(self.state.pc, 2)?;
        Ok(u16::from(word[0]) << 8 | u16::from(word[1]))
    }

    /// Handle for the rendering collaborator.
    pub fn screen(&self) -> Arc<Screen> {
        Arc::clone(&self.state.screen)
    }

    /// Handle for the input collaborator.
    pub fn keypad(&self) -> Arc<Keypad> {
        Arc::clone(&self.state.keypad)
    }

    /// Handle for the 60 Hz timer driver and the audio collaborator.
    pub fn timers(&self) -> Arc<Timers> {
        Arc::clone(&self.state.timers)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
