use crate::error::Error;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// A decoded instruction: the semantic handler the opcode dispatches to.
pub(crate) type Operation = fn(op: u16, s: &mut State) -> Result<(), Error>;

/// Resolve an opcode to its handler.
///
/// The top nibble selects the family; some families split further on the
/// trailing nibble or byte. An opcode with no matching sub-case is a
/// decode failure, never a silent no-op.
pub(crate) fn decode(op: u16) -> Result<Operation, Error> {
    match op.nibbles() {
        (0x0, 0x0, 0xE, 0x0) => Ok(cls),
        (0x0, 0x0, 0xE, 0xE) => Ok(ret),
        (0x1, ..) => Ok(jp),
        (0x2, ..) => Ok(call),
        (0x3, ..) => Ok(se_nn),
        (0x4, ..) => Ok(sne_nn),
        (0x5, .., 0x0) => Ok(se_reg),
        (0x6, ..) => Ok(ld_nn),
        (0x7, ..) => Ok(add_nn),
        (0x8, .., 0x0) => Ok(ld_reg),
        (0x8, .., 0x1) => Ok(or_reg),
        (0x8, .., 0x2) => Ok(and_reg),
        (0x8, .., 0x3) => Ok(xor_reg),
        (0x8, .., 0x4) => Ok(add_reg),
        (0x8, .., 0x5) => Ok(sub_reg),
        (0x8, .., 0x6) => Ok(shr_reg),
        (0x8, .., 0x7) => Ok(subn_reg),
        (0x8, .., 0xE) => Ok(shl_reg),
        (0x9, .., 0x0) => Ok(sne_reg),
        (0xA, ..) => Ok(ld_i),
        (0xB, ..) => Ok(jp_v0),
        (0xC, ..) => Ok(rnd),
        (0xD, ..) => Ok(drw),
        (0xE, .., 0x9, 0xE) => Ok(skp),
        (0xE, .., 0xA, 0x1) => Ok(sknp),
        (0xF, .., 0x0, 0x7) => Ok(ld_dt_into),
        (0xF, .., 0x0, 0xA) => Ok(ld_key),
        (0xF, .., 0x1, 0x5) => Ok(ld_dt),
        (0xF, .., 0x1, 0x8) => Ok(ld_st),
        (0xF, .., 0x1, 0xE) => Ok(add_i),
        (0xF, .., 0x2, 0x9) => Ok(ld_glyph),
        (0xF, .., 0x3, 0x3) => Ok(bcd),
        (0xF, .., 0x5, 0x5) => Ok(store_regs),
        (0xF, .., 0x6, 0x5) => Ok(load_regs),
        _ => Err(Error::UnknownInstruction { opcode: op, family: op.family() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, PROGRAM_START};

    fn exec(state: &mut State, op: u16) {
        decode(op).unwrap()(op, state).unwrap()
    }

    fn exec_err(state: &mut State, op: u16) -> Error {
        match decode(op).and_then(|run| run(op, state)) {
            Ok(()) => panic!("opcode {op:#06X} unexpectedly succeeded"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_00e0_cls_clears_every_pixel() {
        let mut state = State::new();
        for x in 0..DISPLAY_WIDTH {
            for y in 0..DISPLAY_HEIGHT {
                state.screen.set_pixel(x, y, true);
            }
        }
        exec(&mut state, 0x00E0);
        let frame = state.screen.take_frame().unwrap();
        assert!(frame.iter().flatten().all(|&px| !px));
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_1nnn_jp_sets_pc_exactly() {
        let mut state = State::new();
        exec(&mut state, 0x1456);
        assert_eq!(state.pc, 0x456);
    }

    #[test]
    fn test_2nnn_call_pushes_current_pc() {
        let mut state = State::new();
        exec(&mut state, 0x2345);
        assert_eq!(state.pc, 0x345);
        assert_eq!(state.stack.depth(), 1);
    }

    #[test]
    fn test_call_then_ret_resumes_after_the_call() {
        let mut state = State::new();
        exec(&mut state, 0x2600);
        exec(&mut state, 0x00EE);
        assert_eq!(state.pc, PROGRAM_START + 0x2);
        assert_eq!(state.stack.depth(), 0);
    }

    #[test]
    fn test_00ee_ret_on_empty_stack_fails() {
        let mut state = State::new();
        assert_eq!(exec_err(&mut state, 0x00EE), Error::StackUnderflow);
    }

    #[test]
    fn test_3xnn_se_skips_on_equal() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        exec(&mut state, 0x3111);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_3xnn_se_advances_on_unequal() {
        let mut state = State::new();
        exec(&mut state, 0x3111);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_4xnn_sne_skips_on_unequal() {
        let mut state = State::new();
        exec(&mut state, 0x4111);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_4xnn_sne_advances_on_equal() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        exec(&mut state, 0x4111);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_5xy0_se_skips_on_equal_registers() {
        let mut state = State::new();
        state.v[0x1] = 0x42;
        state.v[0x2] = 0x42;
        exec(&mut state, 0x5120);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_5xy0_se_advances_on_unequal_registers() {
        let mut state = State::new();
        state.v[0x1] = 0x42;
        exec(&mut state, 0x5120);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_6xnn_ld() {
        let mut state = State::new();
        exec(&mut state, 0x61AB);
        assert_eq!(state.v[0x1], 0xAB);
    }

    #[test]
    fn test_7xnn_add_wraps_modulo_256() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        exec(&mut state, 0x7122);
        assert_eq!(state.v[0x1], 0x21);
    }

    #[test]
    fn test_8xy0_ld() {
        let mut state = State::new();
        state.v[0x2] = 0x7;
        exec(&mut state, 0x8120);
        assert_eq!(state.v[0x1], 0x7);
    }

    #[test]
    fn test_8xy1_or() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        exec(&mut state, 0x8121);
        assert_eq!(state.v[0x1], 0x7);
    }

    #[test]
    fn test_8xy2_and() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        exec(&mut state, 0x8122);
        assert_eq!(state.v[0x1], 0x2);
    }

    #[test]
    fn test_8xy3_xor() {
        let mut state = State::new();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        exec(&mut state, 0x8123);
        assert_eq!(state.v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_wraps_and_leaves_vf_alone() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        state.v[0x2] = 0x11;
        state.v[0xF] = 0x5;
        exec(&mut state, 0x8124);
        assert_eq!(state.v[0x1], 0x10);
        assert_eq!(state.v[0xF], 0x5);
    }

    #[test]
    fn test_8xy5_sub_wraps_and_leaves_vf_alone() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x12;
        state.v[0xF] = 0x5;
        exec(&mut state, 0x8125);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x5);
    }

    #[test]
    fn test_8xy6_shr_writes_both_registers_from_vy() {
        let mut state = State::new();
        state.v[0x1] = 0xAA;
        state.v[0x2] = 0x05;
        exec(&mut state, 0x8126);
        assert_eq!(state.v[0x1], 0x02);
        assert_eq!(state.v[0x2], 0x02);
        assert_eq!(state.v[0xF], 0x01);
    }

    #[test]
    fn test_8xy6_shr_flag_clear_for_even_source() {
        let mut state = State::new();
        state.v[0x2] = 0x04;
        exec(&mut state, 0x8126);
        assert_eq!(state.v[0x1], 0x02);
        assert_eq!(state.v[0xF], 0x00);
    }

    #[test]
    fn test_8xy7_subn_borrow_flag() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x33;
        exec(&mut state, 0x8127);
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_wraps_without_borrow() {
        let mut state = State::new();
        state.v[0x1] = 0x12;
        state.v[0x2] = 0x11;
        exec(&mut state, 0x8127);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_writes_both_registers_from_vy() {
        let mut state = State::new();
        state.v[0x1] = 0x00;
        state.v[0x2] = 0xFF;
        exec(&mut state, 0x812E);
        assert_eq!(state.v[0x1], 0xFE);
        assert_eq!(state.v[0x2], 0xFE);
    }

    // The left-shift flag samples bit 3 of Vy, and VF receives the raw
    // mask (0 or 8) rather than a normalised 0/1.
    #[test]
    fn test_8xye_shl_flag_is_raw_bit_3() {
        let mut state = State::new();
        state.v[0x2] = 0xFF;
        exec(&mut state, 0x812E);
        assert_eq!(state.v[0xF], 0x08);

        state.v[0x2] = 0xF7;
        exec(&mut state, 0x812E);
        assert_eq!(state.v[0xF], 0x00);
    }

    #[test]
    fn test_9xy0_sne_skips_on_unequal_registers() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        exec(&mut state, 0x9120);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_9xy0_sne_advances_on_equal_registers() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        exec(&mut state, 0x9120);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_annn_ld_i() {
        let mut state = State::new();
        exec(&mut state, 0xAABC);
        assert_eq!(state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp_offset_by_v0() {
        let mut state = State::new();
        state.v[0x0] = 0x2;
        exec(&mut state, 0xBABC);
        assert_eq!(state.pc, 0xABE);
    }

    #[test]
    fn test_cxnn_masks_random_byte() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        // nn = 0 forces the result regardless of the random draw
        exec(&mut state, 0xC100);
        assert_eq!(state.v[0x1], 0x00);
    }

    #[test]
    fn test_dxyn_draw_sets_then_erases() {
        let mut state = State::new();
        state.memory[0x300] = 0xFF;
        state.i = 0x300;
        exec(&mut state, 0xD011);
        assert!((0..8).all(|x| state.screen.pixel(x, 0)));
        assert!(!state.screen.pixel(8, 0));

        // identical second draw XORs the same pixels back off
        exec(&mut state, 0xD011);
        assert!((0..8).all(|x| !state.screen.pixel(x, 0)));
    }

    #[test]
    fn test_dxyn_draw_leaves_vf_alone_even_when_erasing() {
        let mut state = State::new();
        state.memory[0x300] = 0xFF;
        state.i = 0x300;
        state.v[0xF] = 0x5;
        exec(&mut state, 0xD011);
        exec(&mut state, 0xD011);
        assert_eq!(state.v[0xF], 0x5);
    }

    #[test]
    fn test_dxyn_draw_wraps_horizontally() {
        let mut state = State::new();
        state.memory[0x300] = 0xFF;
        state.i = 0x300;
        state.v[0x1] = 60;
        exec(&mut state, 0xD101);
        for x in [60, 61, 62, 63, 0, 1, 2, 3] {
            assert!(state.screen.pixel(x, 0));
        }
        assert!(!state.screen.pixel(4, 0));
    }

    #[test]
    fn test_dxyn_draw_out_of_memory_fails() {
        let mut state = State::new();
        state.i = 0xFFE;
        assert_eq!(
            exec_err(&mut state, 0xD014),
            Error::OutOfBounds { addr: 0xFFE, len: 4 }
        );
    }

    #[test]
    fn test_ex9e_skp_skips_when_pressed() {
        let mut state = State::new();
        state.v[0x1] = 0xE;
        state.keypad.press(0xE);
        exec(&mut state, 0xE19E);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_ex9e_skp_advances_when_not_pressed() {
        let mut state = State::new();
        state.v[0x1] = 0xE;
        exec(&mut state, 0xE19E);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_exa1_sknp_skips_when_not_pressed() {
        let mut state = State::new();
        state.v[0x1] = 0xE;
        exec(&mut state, 0xE1A1);
        assert_eq!(state.pc, 0x204);
    }

    #[test]
    fn test_exa1_sknp_advances_when_pressed() {
        let mut state = State::new();
        state.v[0x1] = 0xE;
        state.keypad.press(0xE);
        exec(&mut state, 0xE1A1);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_fx07_reads_delay_timer() {
        let mut state = State::new();
        state.timers.set_delay(0xF);
        exec(&mut state, 0xF107);
        assert_eq!(state.v[0x1], 0xF);
    }

    #[test]
    fn test_fx15_sets_delay_timer() {
        let mut state = State::new();
        state.v[0x1] = 0xF;
        exec(&mut state, 0xF115);
        assert_eq!(state.timers.delay(), 0xF);
    }

    #[test]
    fn test_fx18_sets_sound_timer() {
        let mut state = State::new();
        state.v[0x1] = 0xF;
        exec(&mut state, 0xF118);
        assert_eq!(state.timers.sound(), 0xF);
    }

    #[test]
    fn test_fx1e_add_i() {
        let mut state = State::new();
        state.i = 0x1;
        state.v[0x1] = 0x1;
        exec(&mut state, 0xF11E);
        assert_eq!(state.i, 0x2);
    }

    #[test]
    fn test_fx29_points_i_at_glyph() {
        let mut state = State::new();
        state.v[0x1] = 0x2;
        exec(&mut state, 0xF129);
        assert_eq!(state.i, 0xA);
    }

    #[test]
    fn test_fx33_bcd_157() {
        let mut state = State::new();
        state.v[0x1] = 157;
        state.i = 0x400;
        exec(&mut state, 0xF133);
        assert_eq!(state.memory[0x400..0x403], [1, 5, 7]);
    }

    #[test]
    fn test_fx55_store_is_inclusive_of_vx() {
        let mut state = State::new();
        state.i = 0x400;
        state.v[0x0..0x3].copy_from_slice(&[0x1, 0x2, 0x3]);
        state.memory[0x403] = 0xEE;
        exec(&mut state, 0xF255);
        assert_eq!(state.memory[0x400..0x403], [0x1, 0x2, 0x3]);
        // one past Vx is untouched
        assert_eq!(state.memory[0x403], 0xEE);
    }

    #[test]
    fn test_fx65_load_is_inclusive_of_vx() {
        let mut state = State::new();
        state.i = 0x400;
        state.memory[0x400..0x403].copy_from_slice(&[0x1, 0x2, 0x3]);
        state.v[0x3] = 0xEE;
        exec(&mut state, 0xF265);
        assert_eq!(state.v[0x0..0x4], [0x1, 0x2, 0x3, 0xEE]);
    }

    #[test]
    fn test_fx55_fx65_round_trip() {
        let mut state = State::new();
        state.i = 0x500;
        let values = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];
        state.v[0x0..0x5].copy_from_slice(&values);
        exec(&mut state, 0xF455);
        state.v = [0; 16];
        exec(&mut state, 0xF465);
        assert_eq!(state.v[0x0..0x5], values);
    }

    #[test]
    fn test_unmatched_subcases_are_decode_failures() {
        for op in [0x0123, 0x5121, 0x8128, 0x9121, 0xE100, 0xF1FF] {
            match decode(op) {
                Err(Error::UnknownInstruction { opcode, family }) => {
                    assert_eq!(opcode, op);
                    assert_eq!(family, op.family());
                }
                other => panic!("expected decode failure for {op:#06X}, got {other:?}"),
            }
        }
    }
}
