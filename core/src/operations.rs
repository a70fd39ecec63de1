//! Semantic handlers, one per instruction.
//!
//! Every handler fully owns its control flow: straight-line instructions
//! advance `pc` by 2 themselves, jumps and skips set it explicitly. The
//! decoder in [`crate::instruction`] picks which handler runs.

use crate::error::Error;
use crate::keypad::KeyEvent;
use crate::opcode::Opcode;
use crate::state::State;

/// Value plus the flag it produces.
///
/// The flag-producing instructions report both halves through this pair
/// and the handler writes `V[0xF]` and the destination register(s)
/// explicitly, keeping the dual role of VF visible at the write site.
struct Flagged {
    value: u8,
    flag: u8,
}

/// VF = Vy & 1, result = Vy >> 1.
fn shifted_right(y: u8) -> Flagged {
    Flagged { value: y >> 1, flag: y & 0x01 }
}

/// VF = Vy & 0x8, result = Vy << 1.
///
/// The flag samples bit 3 of the source, not the shifted-out bit 7; the
/// value stored in VF is the raw mask result (0 or 8). ROMs targeting
/// this machine depend on both quirks.
fn shifted_left(y: u8) -> Flagged {
    Flagged { value: y << 1, flag: y & 0x08 }
}

/// VF = (Vy > Vx), result = Vy - Vx wrapping.
fn reverse_sub(x: u8, y: u8) -> Flagged {
    Flagged { value: y.wrapping_sub(x), flag: u8::from(y > x) }
}

/// Shared tail of the conditional-skip instructions: a skip jumps over
/// one two-byte instruction.
fn branch(s: &mut State, skip: bool) {
    s.pc += if skip { 0x4 } else { 0x2 };
}

/// 00E0: clear the display.
pub(crate) fn cls(_op: u16, s: &mut State) -> Result<(), Error> {
    s.screen.clear();
    s.pc += 0x2;
    Ok(())
}

/// 00EE: return from subroutine. The stack holds the address of the call
/// instruction, so execution resumes one instruction past it.
pub(crate) fn ret(_op: u16, s: &mut State) -> Result<(), Error> {
    s.pc = s.stack.pop()? + 0x2;
    Ok(())
}

/// 1nnn: unconditional absolute jump.
pub(crate) fn jp(op: u16, s: &mut State) -> Result<(), Error> {
    s.pc = op.nnn();
    Ok(())
}

/// 2nnn: call subroutine, pushing the current pc.
pub(crate) fn call(op: u16, s: &mut State) -> Result<(), Error> {
    s.stack.push(s.pc)?;
    s.pc = op.nnn();
    Ok(())
}

/// 3xnn: skip if Vx == nn.
pub(crate) fn se_nn(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = s.v[op.x()] == op.nn();
    branch(s, skip);
    Ok(())
}

/// 4xnn: skip if Vx != nn.
pub(crate) fn sne_nn(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = s.v[op.x()] != op.nn();
    branch(s, skip);
    Ok(())
}

/// 5xy0: skip if Vx == Vy.
pub(crate) fn se_reg(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = s.v[op.x()] == s.v[op.y()];
    branch(s, skip);
    Ok(())
}

/// 6xnn: Vx = nn.
pub(crate) fn ld_nn(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = op.nn();
    s.pc += 0x2;
    Ok(())
}

/// 7xnn: Vx += nn, wrapping. No flag.
pub(crate) fn add_nn(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = s.v[op.x()].wrapping_add(op.nn());
    s.pc += 0x2;
    Ok(())
}

/// 8xy0: Vx = Vy.
pub(crate) fn ld_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = s.v[op.y()];
    s.pc += 0x2;
    Ok(())
}

/// 8xy1: Vx |= Vy.
pub(crate) fn or_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] |= s.v[op.y()];
    s.pc += 0x2;
    Ok(())
}

/// 8xy2: Vx &= Vy.
pub(crate) fn and_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] &= s.v[op.y()];
    s.pc += 0x2;
    Ok(())
}

/// 8xy3: Vx ^= Vy.
pub(crate) fn xor_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] ^= s.v[op.y()];
    s.pc += 0x2;
    Ok(())
}

/// 8xy4: Vx += Vy, wrapping. VF is untouched on this machine.
pub(crate) fn add_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = s.v[op.x()].wrapping_add(s.v[op.y()]);
    s.pc += 0x2;
    Ok(())
}

/// 8xy5: Vx -= Vy, wrapping. VF is untouched on this machine.
pub(crate) fn sub_reg(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = s.v[op.x()].wrapping_sub(s.v[op.y()]);
    s.pc += 0x2;
    Ok(())
}

/// 8xy6: VF = Vy & 1; Vx = Vy = Vy >> 1.
///
/// Both registers receive the shifted value. The flag is written first,
/// so when x or y names VF the shifted value wins.
pub(crate) fn shr_reg(op: u16, s: &mut State) -> Result<(), Error> {
    let r = shifted_right(s.v[op.y()]);
    s.v[0xF] = r.flag;
    s.v[op.x()] = r.value;
    s.v[op.y()] = r.value;
    s.pc += 0x2;
    Ok(())
}

/// 8xy7: VF = (Vy > Vx); Vx = Vy - Vx, wrapping.
pub(crate) fn subn_reg(op: u16, s: &mut State) -> Result<(), Error> {
    let r = reverse_sub(s.v[op.x()], s.v[op.y()]);
    s.v[0xF] = r.flag;
    s.v[op.x()] = r.value;
    s.pc += 0x2;
    Ok(())
}

/// 8xyE: VF = Vy & 0x8; Vx = Vy = Vy << 1. See [`shifted_left`].
pub(crate) fn shl_reg(op: u16, s: &mut State) -> Result<(), Error> {
    let r = shifted_left(s.v[op.y()]);
    s.v[0xF] = r.flag;
    s.v[op.x()] = r.value;
    s.v[op.y()] = r.value;
    s.pc += 0x2;
    Ok(())
}

/// 9xy0: skip if Vx != Vy.
pub(crate) fn sne_reg(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = s.v[op.x()] != s.v[op.y()];
    branch(s, skip);
    Ok(())
}

/// Annn: I = nnn.
pub(crate) fn ld_i(op: u16, s: &mut State) -> Result<(), Error> {
    s.i = op.nnn();
    s.pc += 0x2;
    Ok(())
}

/// Bnnn: PC = nnn + V0.
pub(crate) fn jp_v0(op: u16, s: &mut State) -> Result<(), Error> {
    s.pc = op.nnn() + u16::from(s.v[0x0]);
    Ok(())
}

/// Cxnn: Vx = random byte AND nn.
pub(crate) fn rnd(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = rand::random::<u8>() & op.nn();
    s.pc += 0x2;
    Ok(())
}

/// Dxyn: XOR-blit the n-byte sprite at MEM[I..] to (Vx, Vy), wrapping at
/// both screen edges. No collision flag on this machine.
pub(crate) fn drw(op: u16, s: &mut State) -> Result<(), Error> {
    let rows = s.mem_slice(s.i, op.n() as usize)?;
    s.screen
        .draw_sprite(s.v[op.x()] as usize, s.v[op.y()] as usize, rows);
    s.pc += 0x2;
    Ok(())
}

/// Ex9E: skip if key[Vx] is pressed.
pub(crate) fn skp(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = s.keypad.is_pressed(s.v[op.x()]);
    branch(s, skip);
    Ok(())
}

/// ExA1: skip if key[Vx] is not pressed.
pub(crate) fn sknp(op: u16, s: &mut State) -> Result<(), Error> {
    let skip = !s.keypad.is_pressed(s.v[op.x()]);
    branch(s, skip);
    Ok(())
}

/// Fx07: Vx = delay timer.
pub(crate) fn ld_dt_into(op: u16, s: &mut State) -> Result<(), Error> {
    s.v[op.x()] = s.timers.delay();
    s.pc += 0x2;
    Ok(())
}

/// Fx0A: park in the key rendezvous until a press arrives, then Vx = key.
///
/// The cycle suspends here; no other instruction executes while the
/// request is outstanding. A shutdown message cancels the wait with
/// [`Error::Interrupted`], as does a disconnected frontend.
pub(crate) fn ld_key(op: u16, s: &mut State) -> Result<(), Error> {
    match s.key_rx.recv() {
        Ok(KeyEvent::Pressed(key)) => {
            s.v[op.x()] = key;
            s.pc += 0x2;
            Ok(())
        }
        Ok(KeyEvent::Shutdown) | Err(_) => Err(Error::Interrupted),
    }
}

/// Fx15: delay timer = Vx.
pub(crate) fn ld_dt(op: u16, s: &mut State) -> Result<(), Error> {
    s.timers.set_delay(s.v[op.x()]);
    s.pc += 0x2;
    Ok(())
}

/// Fx18: sound timer = Vx.
pub(crate) fn ld_st(op: u16, s: &mut State) -> Result<(), Error> {
    s.timers.set_sound(s.v[op.x()]);
    s.pc += 0x2;
    Ok(())
}

/// Fx1E: I += Vx, wrapping.
pub(crate) fn add_i(op: u16, s: &mut State) -> Result<(), Error> {
    s.i = s.i.wrapping_add(u16::from(s.v[op.x()]));
    s.pc += 0x2;
    Ok(())
}

/// Fx29: I = address of the font glyph for digit Vx.
pub(crate) fn ld_glyph(op: u16, s: &mut State) -> Result<(), Error> {
    s.i = crate::constants::GLYPH_SIZE * u16::from(s.v[op.x()]);
    s.pc += 0x2;
    Ok(())
}

/// Fx33: MEM[I..I+3] = hundreds, tens, ones of Vx.
pub(crate) fn bcd(op: u16, s: &mut State) -> Result<(), Error> {
    let value = s.v[op.x()];
    let digits = [value / 100 % 10, value / 10 % 10, value % 10];
    s.mem_slice_mut(s.i, 3)?.copy_from_slice(&digits);
    s.pc += 0x2;
    Ok(())
}

/// Fx55: MEM[I..=I+x] = V0..Vx, inclusive of Vx.
pub(crate) fn store_regs(op: u16, s: &mut State) -> Result<(), Error> {
    let count = op.x() + 1;
    let registers = s.v;
    s.mem_slice_mut(s.i, count)?.copy_from_slice(&registers[..count]);
    s.pc += 0x2;
    Ok(())
}

/// Fx65: V0..Vx = MEM[I..=I+x], inclusive of Vx.
pub(crate) fn load_regs(op: u16, s: &mut State) -> Result<(), Error> {
    let count = op.x() + 1;
    let mut values = [0u8; 16];
    values[..count].copy_from_slice(s.mem_slice(s.i, count)?);
    s.v[..count].copy_from_slice(&values[..count]);
    s.pc += 0x2;
    Ok(())
}
