use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;

/// Message handed to a blocked key-read through the rendezvous channel.
#[derive(Debug, Clone, Copy)]
pub(crate) enum KeyEvent {
    Pressed(u8),
    Shutdown,
}

/// Shared state of the 16-key hexadecimal pad.
///
/// An input collaborator writes presses and releases; the engine reads the
/// flags from the skip instructions and receives presses through a
/// zero-capacity rendezvous channel while blocked in the key-wait
/// instruction.
pub struct Keypad {
    keys: [AtomicBool; 16],
    tx: SyncSender<KeyEvent>,
}

impl Keypad {
    pub(crate) fn new(tx: SyncSender<KeyEvent>) -> Self {
        Keypad {
            keys: std::array::from_fn(|_| AtomicBool::new(false)),
            tx,
        }
    }

    /// Record `key` as held down.
    ///
    /// Returns `true` when a blocked key-read consumed the press; the
    /// handoff only succeeds while the engine is parked in the wait.
    pub fn press(&self, key: u8) -> bool {
        let key = key & 0xF;
        self.keys[key as usize].store(true, Ordering::Relaxed);
        self.tx.try_send(KeyEvent::Pressed(key)).is_ok()
    }

    /// Record `key` as released.
    pub fn release(&self, key: u8) {
        self.keys[(key & 0xF) as usize].store(false, Ordering::Relaxed);
    }

    /// Current state of a key; only the low nibble selects a key.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize].load(Ordering::Relaxed)
    }

    /// Offer a shutdown message to a blocked key-read.
    ///
    /// Returns `true` when a parked key-wait accepted the message; a
    /// no-op otherwise, so drivers call this repeatedly until the engine
    /// thread exits.
    pub fn close(&self) -> bool {
        self.tx.try_send(KeyEvent::Shutdown).is_ok()
    }
}
