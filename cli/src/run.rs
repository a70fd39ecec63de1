use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure, Context, Result};
use log::info;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use oxid8_core::constants::TIMER_HZ;
use oxid8_core::{Error as VmError, Interpreter};
use oxid8_display::Display;

use crate::keymap::keymap;
use crate::Args;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Wire the machine to its collaborators and run until quit or a fatal
/// engine error.
///
/// Three control flows share the machine's handles:
/// - an engine thread stepping the interpreter at `--clock` Hz;
/// - a timer thread ticking the delay/sound counters at 60 Hz;
/// - the main thread pumping SDL events into the keypad and rendering
///   the framebuffer whenever it changes.
pub(crate) fn run(args: &Args) -> Result<()> {
    ensure!(args.clock > 0, "clock rate must be positive");
    ensure!(args.scale > 0, "scale factor must be positive");

    let rom = fs::read(&args.rom)
        .with_context(|| format!("could not read ROM file {}", args.rom.display()))?;

    let mut vm = Interpreter::new();
    vm.load_program(&rom)
        .with_context(|| format!("could not load {}", args.rom.display()))?;
    info!("running {} ({} bytes)", args.rom.display(), rom.len());

    let screen = vm.screen();
    let keypad = vm.keypad();
    let timers = vm.timers();
    let running = Arc::new(AtomicBool::new(true));

    // 60Hz timer decay, independent of the instruction rate
    let timer_driver = {
        let running = Arc::clone(&running);
        let tick = Duration::from_nanos(NANOS_PER_SEC / u64::from(TIMER_HZ));
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                timers.tick();
                thread::sleep(tick);
            }
        })
    };

    // paced fetch-decode-dispatch loop; owns the machine
    let engine = {
        let running = Arc::clone(&running);
        let cycle = Duration::from_nanos(NANOS_PER_SEC / u64::from(args.clock));
        thread::spawn(move || -> Result<(), VmError> {
            let mut last = Instant::now();
            while running.load(Ordering::Relaxed) {
                if let Err(e) = vm.step() {
                    running.store(false, Ordering::Relaxed);
                    return Err(e);
                }
                let elapsed = last.elapsed();
                if cycle > elapsed {
                    thread::sleep(cycle - elapsed);
                }
                last = Instant::now();
            }
            Ok(())
        })
    };

    // event pump and renderer stay on the main thread
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, args.scale)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    let mut render_failure = None;
    while running.load(Ordering::Relaxed) {
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => {
                    running.store(false, Ordering::Relaxed);
                }
                Event::KeyDown { keycode: Some(key), .. } => {
                    if let Some(k) = keymap(key) {
                        keypad.press(k);
                    }
                }
                Event::KeyUp { keycode: Some(key), .. } => {
                    if let Some(k) = keymap(key) {
                        keypad.release(k);
                    }
                }
                _ => {}
            }
        }

        if let Some(frame) = screen.take_frame() {
            if let Err(e) = display.render(&frame) {
                render_failure = Some(e);
                running.store(false, Ordering::Relaxed);
            }
        }

        thread::sleep(FRAME_INTERVAL);
    }

    // a step parked in the key-wait rendezvous only wakes for a message,
    // so keep offering shutdown until the engine thread is gone
    while !engine.is_finished() {
        keypad.close();
        thread::sleep(Duration::from_millis(1));
    }

    if timer_driver.join().is_err() {
        bail!("timer thread panicked");
    }
    match engine.join() {
        Ok(Ok(())) | Ok(Err(VmError::Interrupted)) => {}
        Ok(Err(e)) => return Err(e).context("interpretation aborted"),
        Err(_) => bail!("engine thread panicked"),
    }

    match render_failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
