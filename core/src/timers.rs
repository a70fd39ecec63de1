use std::sync::atomic::{AtomicU8, Ordering};

/// The delay and sound counters.
///
/// The engine writes and reads them mid-instruction while an external
/// real-time driver decrements them at 60 Hz from another thread, so both
/// live behind atomics. A counter parks at zero; it never wraps.
pub struct Timers {
    delay: AtomicU8,
    sound: AtomicU8,
}

impl Timers {
    pub(crate) fn new() -> Self {
        Timers {
            delay: AtomicU8::new(0),
            sound: AtomicU8::new(0),
        }
    }

    pub fn delay(&self) -> u8 {
        self.delay.load(Ordering::Relaxed)
    }

    pub fn sound(&self) -> u8 {
        self.sound.load(Ordering::Relaxed)
    }

    /// Whether an audio collaborator should currently emit a tone.
    pub fn sound_active(&self) -> bool {
        self.sound() > 0
    }

    pub(crate) fn set_delay(&self, value: u8) {
        self.delay.store(value, Ordering::Relaxed);
    }

    pub(crate) fn set_sound(&self, value: u8) {
        self.sound.store(value, Ordering::Relaxed);
    }

    /// One 60 Hz driver tick: each nonzero counter goes down by one.
    pub fn tick(&self) {
        Self::decrement(&self.delay);
        Self::decrement(&self.sound);
    }

    fn decrement(counter: &AtomicU8) {
        let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }
}
