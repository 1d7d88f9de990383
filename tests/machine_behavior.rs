//! End-to-end tests driving `Machine` the way a host would: load a ROM image,
//! run whole frames, and observe the documented effects (register state,
//! border changes, keyboard matrix reads) rather than reaching into private
//! CPU/ULA state directly.
use zxcore::clock::timing_for;
use zxcore::io::keyboard::Key;
use zxcore::machine::Machine;
use zxcore::memory::Model;
use zxcore::video::VideoOut;
use zxcore_core::audio::AudioSink;
use zxcore_core::memory::ZxMemory;

struct NullVideo;
impl VideoOut for NullVideo {
    fn set_palette(&mut self, _pal: &[u8; 3 * 16]) {}
    fn pixel(&mut self, _x: u16, _y: u16, _color_index: u8) {}
    fn rect(&mut self, _x0: u16, _y0: u16, _x1: u16, _y1: u16, _color_index: u8) {}
    fn end_field(&mut self) {}
}

struct NullAudio;
impl AudioSink for NullAudio {
    type Err = std::convert::Infallible;
    fn write(&mut self, _frame: &[u8]) -> Result<(), Self::Err> {
        Ok(())
    }
}

fn blank_rom() -> Vec<u8> {
    vec![0u8; Model::Zx48.rom_banks() * 0x4000]
}

#[test]
fn power_on_reset_matches_documented_state() {
    let m = Machine::new(Model::Zx48, &blank_rom(), 448).unwrap();
    let r = m.registers();
    assert_eq!(r.pc, 0);
    assert_eq!(r.sp, 0xFFFF);
    assert_eq!(r.i, 0);
    assert_eq!(r.r, 0);
    assert!(!r.iff1);
    assert!(!r.halted);
}

/// A ROM that loops entirely within itself (16381 NOPs then `JP 0x0000`)
/// never touches the contended RAM bank at 0x4000, so every instruction's
/// T-state cost is one of exactly two known constants. That makes the
/// number of instructions executed — and so R's low 7 bits — recoverable
/// from the cumulative T-state count alone.
const LOOP_NOPS: u64 = 16381;
const LOOP_TSTATES: u64 = LOOP_NOPS * 4 + 10; // NOPs (4T each) + JP nn (10T)
const LOOP_INSTRUCTIONS: u64 = LOOP_NOPS + 1;

fn looping_rom() -> Vec<u8> {
    let mut rom = vec![0u8; Model::Zx48.rom_banks() * 0x4000];
    rom[LOOP_NOPS as usize..LOOP_NOPS as usize + 3].copy_from_slice(&[0xC3, 0x00, 0x00]); // JP 0x0000
    rom
}

#[test]
fn r_register_tracks_instructions_executed_across_many_frames() {
    let mut m = Machine::new(Model::Zx48, &looping_rom(), 448).unwrap();
    let mut video = NullVideo;
    let mut audio = NullAudio;
    let mut total_tstates: u64 = 0;
    while total_tstates < 1_000_000 {
        let result = m.run_frame(&mut video, &mut audio).unwrap();
        total_tstates += result.tstates_spent as u64;
    }
    let complete_laps = total_tstates / LOOP_TSTATES;
    let remainder = total_tstates % LOOP_TSTATES;
    assert_eq!(remainder % 4, 0, "a partial lap can only ever stop after a whole NOP, never mid-instruction");
    let instructions = complete_laps * LOOP_INSTRUCTIONS + remainder / 4;
    let expected_r = (instructions % 128) as u8;
    assert_eq!(m.registers().r, expected_r);
}

/// An empty ROM socket floats the data bus to 0xFF on every ROM fetch, which
/// decodes as `RST 38h`. Since address 0x0038 is itself inside the same
/// floating ROM bank, the very first restart parks execution there forever:
/// every subsequent fetch is another `RST 38h` to the same address.
#[test]
fn open_bus_rom_settles_into_the_rst38_restart_loop() {
    let rom = vec![0xFFu8; Model::Zx48.rom_banks() * 0x4000];
    let mut m = Machine::new(Model::Zx48, &rom, 448).unwrap();
    let mut video = NullVideo;
    let mut audio = NullAudio;
    m.run_frame(&mut video, &mut audio).unwrap();
    assert_eq!(m.registers().pc, 0x0038);
    m.run_frame(&mut video, &mut audio).unwrap();
    assert_eq!(m.registers().pc, 0x0038, "the restart loop is a fixed point: it never leaves 0x0038");
}

/// A tiny program that walks the border through every one of the 8 possible
/// colors in a loop; `run_frame` must surface each change as a `BorderEvent`.
#[test]
fn border_writes_across_a_frame_are_reported_as_events() {
    let mut rom = vec![0u8; Model::Zx48.rom_banks() * 0x4000];
    rom[0x0000..0x0008].copy_from_slice(&[
        0x3E, 0x00, // LD A, 0        ; A starts at color 0
        0xD3, 0xFE, // OUT (0xFE), A  <- loop:
        0x3C, //       INC A
        0xE6, 0x07, // AND 7
        0xC3, //       JP loop
    ]);
    rom[0x0008..0x000A].copy_from_slice(&[0x02, 0x00]); // operand for the JP above

    let mut m = Machine::new(Model::Zx48, &rom, 448).unwrap();
    let mut video = NullVideo;
    let mut audio = NullAudio;
    let result = m.run_frame(&mut video, &mut audio).unwrap();

    assert!(!result.border_events.is_empty());
    let seen: Vec<u8> = result.border_events.iter().map(|e| e.color.index()).collect();
    for color in 0u8..=7 {
        assert!(seen.contains(&color), "border color {} never appeared in {:?}", color, seen);
    }
    let tstates: Vec<u32> = result.border_events.iter().map(|e| e.tstate).collect();
    assert!(tstates.windows(2).all(|w| w[0] <= w[1]), "border events must be reported in T-state order");
}

/// Reads port 0xFE with the row mask selecting a key, via a tiny program
/// that loads the row byte into `A`, issues `IN A,(0xFE)`, and parks the
/// result in RAM at 0x8000 so the test can inspect it after the frame.
fn read_keyboard_row(model: Model, row_select: u8, keys: &[(Key, bool)]) -> u8 {
    let mut rom = vec![0u8; model.rom_banks() * 0x4000];
    rom[0x0000..0x0007].copy_from_slice(&[
        0x3E, row_select, // LD A, row_select
        0xDB, 0xFE, //       IN A,(0xFE)
        0x32, 0x00, 0x80, // LD (0x8000), A
    ]);
    rom[0x0007] = 0x76; // HALT, so the rest of the frame is a no-op

    let mut m = Machine::new(model, &rom, 448).unwrap();
    for (key, pressed) in keys {
        m.key_event(*key, *pressed);
    }
    let mut video = NullVideo;
    let mut audio = NullAudio;
    m.run_frame(&mut video, &mut audio).unwrap();
    m.memory().read(0x8000)
}

#[test]
fn pressing_caps_shift_and_zero_clears_both_matrix_bits() {
    let keys = [(Key::CapsShift, true), (Key::N0, true)];
    // Row 0xEF holds 6,7,8,9,0 at bits 4..0; bit 0 is '0'.
    let row_with_zero = read_keyboard_row(Model::Zx48, 0xEF, &keys);
    assert_eq!(row_with_zero & 0x01, 0, "the '0' key bit must read low while pressed");
    // Row 0xFE holds V,C,X,Z,CapsShift at bits 4..0; bit 0 is Caps Shift.
    let row_with_caps_shift = read_keyboard_row(Model::Zx48, 0xFE, &keys);
    assert_eq!(row_with_caps_shift & 0x01, 0, "the Caps Shift bit must read low while pressed");
}

/// `Backspace` is a single composite scancode standing for both Caps Shift
/// and `0`; one `key_event` call must clear both matrix bits at once, the
/// same rows the two-key chord above checks.
#[test]
fn backspace_is_a_single_scancode_that_clears_both_matrix_bits() {
    let keys = [(Key::Backspace, true)];
    let row_with_zero = read_keyboard_row(Model::Zx48, 0xEF, &keys);
    assert_eq!(row_with_zero & 0x01, 0, "the '0' key bit must read low while Backspace is pressed");
    let row_with_caps_shift = read_keyboard_row(Model::Zx48, 0xFE, &keys);
    assert_eq!(row_with_caps_shift & 0x01, 0, "the Caps Shift bit must read low while Backspace is pressed");

    let released = read_keyboard_row(Model::Zx48, 0xEF, &[(Key::Backspace, true), (Key::Backspace, false)]);
    assert_eq!(released & 0x01, 0x01, "releasing Backspace must restore the '0' bit");
}

#[test]
fn releasing_a_key_restores_its_matrix_bit() {
    let pressed = read_keyboard_row(Model::Zx48, 0xEF, &[(Key::N0, true)]);
    assert_eq!(pressed & 0x01, 0);
    let released = read_keyboard_row(Model::Zx48, 0xEF, &[(Key::N0, true), (Key::N0, false)]);
    assert_eq!(released & 0x01, 0x01);
}

/// `LDIR` from ROM into RAM across a full 0x100-byte block: exercises the same
/// "keeps re-executing the ED prefix until BC==0" path the CPU-level tests
/// cover, but end-to-end through `Machine`'s memory banking.
#[test]
fn ldir_copies_a_block_from_rom_into_ram() {
    let mut rom = vec![0u8; Model::Zx48.rom_banks() * 0x4000];
    for (i, b) in rom[0x4000 - 0x100..0x4000].iter_mut().enumerate() {
        *b = i as u8;
    }
    // LD HL,0x3F00; LD DE,0x5B00; LD BC,0x0100; LDIR; HALT
    rom[0x0000..0x0009].copy_from_slice(&[0x21, 0x00, 0x3F, 0x11, 0x00, 0x5B, 0x01, 0x00, 0x01]);
    rom[0x0009..0x000B].copy_from_slice(&[0xED, 0xB0]);
    rom[0x000B] = 0x76;

    let mut m = Machine::new(Model::Zx48, &rom, 448).unwrap();
    let mut video = NullVideo;
    let mut audio = NullAudio;
    m.run_frame(&mut video, &mut audio).unwrap();

    assert_eq!(m.registers().bc(), 0);
    for i in 0..0x100u16 {
        assert_eq!(m.memory().read(0x5B00 + i), (i & 0xFF) as u8);
    }
}

#[test]
fn frame_timing_is_the_documented_48k_tstate_count() {
    assert_eq!(timing_for(Model::Zx48).tstates_per_frame(), 69888);
}

/// Saving a `.sna` right after loading one must reproduce the original file
/// byte-for-byte: `Machine::save_sna` is just `save_sna_from` fed the state
/// `Machine::load_sna` just installed, and the format crate's own tests
/// already establish that round-trip is exact.
#[cfg(feature = "formats")]
#[test]
fn loading_then_saving_a_48k_sna_reproduces_the_file() {
    let mut m = Machine::new(Model::Zx48, &blank_rom(), 448).unwrap();
    let mut sna = vec![0u8; 27 + 3 * 0x4000];
    sna[23] = 0x00; // SP low
    sna[24] = 0x80; // SP high -> 0x8000, leaving room for load_sna to recover a PC from the stack
    for (i, b) in sna[27..27 + 3 * 0x4000].iter_mut().enumerate() {
        *b = i as u8; // vary the RAM contents so a bank mix-up would show up as a mismatch
    }
    m.load_sna(&sna).unwrap();

    let saved = m.save_sna().unwrap();
    assert_eq!(saved, sna);
}
