//! The fetch-decode-execute cycle.
//!
//! [`step`] executes exactly one instruction against a [`Machine`] and
//! reports what happened as a [`Step`] value. It never blocks, performs no
//! I/O and never touches the timers; the driver paces calls, decrements
//! timers at 60 Hz and reacts to the returned status.

use super::basics::{
    pixel_index, Address, Register, Value, FONT_OFFSET, GLYPH_SIZE, MEMORY_SIZE,
};
use super::machine::Machine;
use super::program::Instruction;
use log::trace;

/// Outcome of a single interpreter step.
///
/// The fault variants are fatal: the machine is left exactly as it was
/// after the program counter advanced past the offending instruction, and
/// the interpreter never recovers on its own. The driver decides how to
/// report them and stops stepping.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Step {
    /// Instruction executed, nothing for the driver to do.
    Ok,
    /// The display buffer changed and should be composited to the screen.
    Redraw,
    /// Execution is suspended until the driver delivers a key press.
    WaitingForKey,
    /// The instruction at the configured breakpoint address executed.
    Breakpoint(Address),
    UnknownOpcode { addr: Address, opcode: u16 },
    StackOverflow { addr: Address, opcode: u16 },
    StackUnderflow { addr: Address, opcode: u16 },
    PcOutOfBounds { pc: Address },
}

impl Step {
    pub fn is_fatal(&self) -> bool {
        match self {
            Step::Ok | Step::Redraw | Step::WaitingForKey | Step::Breakpoint(_) => false,
            Step::UnknownOpcode { .. }
            | Step::StackOverflow { .. }
            | Step::StackUnderflow { .. }
            | Step::PcOutOfBounds { .. } => true,
        }
    }
}

/// Performs one fetch-decode-execute cycle.
///
/// While a key-wait is pending the machine is frozen: nothing is fetched
/// and PC does not move until the driver resolves a key via
/// [`Machine::key_event`]. When `breakpoint` matches the address an
/// instruction was fetched from, the instruction still executes but the
/// reported status becomes [`Step::Breakpoint`] carrying that address.
pub fn step(m: &mut Machine, breakpoint: Option<Address>) -> Step {
    if m.key_waiting && m.last_key.is_none() {
        return Step::WaitingForKey;
    }

    let at = m.program_counter;
    if at.0 as usize + 1 >= MEMORY_SIZE {
        return Step::PcOutOfBounds { pc: at };
    }

    let hi = m.memory[at.0 as usize];
    let lo = m.memory[at.0 as usize + 1];
    let opcode = u16::from_be_bytes([hi, lo]);

    // PC points at the next instruction during execution, so jumps and
    // calls are not undone by the advance.
    m.program_counter = Address(at.0 + 2);

    trace!(
        "PC={:#05X} SP={:02} opcode={:#06X}",
        at.0,
        m.stack.len(),
        opcode
    );

    let status = match Instruction::from_bytes(hi, lo) {
        Some(instruction) => execute(m, instruction, at, opcode),
        None => Step::UnknownOpcode { addr: at, opcode },
    };

    if breakpoint == Some(at) {
        return Step::Breakpoint(at);
    }
    status
}

fn reg(m: &Machine, r: Register) -> u8 {
    m.registers[r.index()].0
}

fn set_reg(m: &mut Machine, r: Register, value: u8) {
    m.registers[r.index()] = Value(value);
}

/// Sets the VF flag output. VF is an ordinary register: instructions with
/// x = 0xF observe the flag write in the same order the architecture
/// documents, which is why the arithmetic handlers below re-read their
/// operands after writing the flag.
fn set_vf(m: &mut Machine, flag: u8) {
    m.registers[0xF] = Value(flag);
}

fn skip_next(m: &mut Machine) {
    m.program_counter.0 += 2;
}

fn execute(m: &mut Machine, instruction: Instruction, at: Address, opcode: u16) -> Step {
    match instruction {
        Instruction::ClearDisplay => {
            for pixel in m.display.iter_mut() {
                *pixel = 0;
            }
            return Step::Redraw;
        }
        Instruction::ReturnSubroutine => match m.stack.pop() {
            Some(addr) => m.program_counter = addr,
            None => return Step::StackUnderflow { addr: at, opcode },
        },
        Instruction::Jump(addr) => m.program_counter = addr,
        Instruction::CallSubroutine(addr) => {
            if m.stack.is_full() {
                return Step::StackOverflow { addr: at, opcode };
            }
            m.stack.push(m.program_counter);
            m.program_counter = addr;
        }

        Instruction::SkipEqualConst(vx, kk) => {
            if reg(m, vx) == kk.0 {
                skip_next(m);
            }
        }
        Instruction::SkipNotEqualConst(vx, kk) => {
            if reg(m, vx) != kk.0 {
                skip_next(m);
            }
        }
        Instruction::SkipEqual(vx, vy) => {
            if reg(m, vx) == reg(m, vy) {
                skip_next(m);
            }
        }
        Instruction::SkipNotEqual(vx, vy) => {
            if reg(m, vx) != reg(m, vy) {
                skip_next(m);
            }
        }

        Instruction::SetConst(vx, kk) => set_reg(m, vx, kk.0),
        Instruction::AddConst(vx, kk) => {
            // No flag effect, unlike the register-register add.
            let sum = reg(m, vx).wrapping_add(kk.0);
            set_reg(m, vx, sum);
        }
        Instruction::Set(vx, vy) => {
            let value = reg(m, vy);
            set_reg(m, vx, value);
        }
        Instruction::Or(vx, vy) => {
            let value = reg(m, vx) | reg(m, vy);
            set_reg(m, vx, value);
        }
        Instruction::And(vx, vy) => {
            let value = reg(m, vx) & reg(m, vy);
            set_reg(m, vx, value);
        }
        Instruction::Xor(vx, vy) => {
            let value = reg(m, vx) ^ reg(m, vy);
            set_reg(m, vx, value);
        }
        Instruction::Add(vx, vy) => {
            let sum = reg(m, vx) as u16 + reg(m, vy) as u16;
            set_vf(m, (sum > 0xFF) as u8);
            set_reg(m, vx, sum as u8);
        }
        Instruction::Sub(vx, vy) => {
            let flag = (reg(m, vx) > reg(m, vy)) as u8;
            set_vf(m, flag);
            let diff = reg(m, vx).wrapping_sub(reg(m, vy));
            set_reg(m, vx, diff);
        }
        Instruction::RightShift(vx) => {
            let flag = reg(m, vx) & 0x01;
            set_vf(m, flag);
            let value = reg(m, vx) >> 1;
            set_reg(m, vx, value);
        }
        Instruction::NegSub(vx, vy) => {
            let flag = (reg(m, vx) < reg(m, vy)) as u8;
            set_vf(m, flag);
            let diff = reg(m, vy).wrapping_sub(reg(m, vx));
            set_reg(m, vx, diff);
        }
        Instruction::LeftShift(vx) => {
            let flag = (reg(m, vx) & 0x80) >> 7;
            set_vf(m, flag);
            let value = reg(m, vx) << 1;
            set_reg(m, vx, value);
        }

        Instruction::SetI(addr) => m.register_i = addr,
        Instruction::JumpAdd(addr) => {
            m.program_counter = Address(addr.0 + m.registers[0].0 as u16);
        }
        Instruction::Rand(vx, kk) => {
            let value = m.random_byte() & kk.0;
            set_reg(m, vx, value);
        }
        Instruction::Draw(vx, vy, n) => return draw_sprite(m, vx, vy, n),

        Instruction::SkipKey(vx) => {
            if m.key_pressed(reg(m, vx)) {
                skip_next(m);
            }
        }
        Instruction::SkipNotKey(vx) => {
            if !m.key_pressed(reg(m, vx)) {
                skip_next(m);
            }
        }
        Instruction::WaitKey(vx) => match m.last_key.take() {
            Some(key) => {
                set_reg(m, vx, key);
                m.key_waiting = false;
            }
            None => {
                // Rewind so the same instruction is fetched again once the
                // driver has delivered a key press.
                m.key_waiting = true;
                m.program_counter = at;
                return Step::WaitingForKey;
            }
        },

        Instruction::GetDelayTimer(vx) => {
            let value = m.delay_timer.0;
            set_reg(m, vx, value);
        }
        Instruction::SetDelayTimer(vx) => m.delay_timer = Value(reg(m, vx)),
        Instruction::SetSoundTimer(vx) => m.sound_timer = Value(reg(m, vx)),

        Instruction::AddToI(vx) => {
            // I is not masked to 12 bits; the flag observes the overshoot.
            // Undocumented on the original hardware, relied upon anyway.
            m.register_i.0 = m.register_i.0.wrapping_add(reg(m, vx) as u16);
            set_vf(m, (m.register_i.0 > 0xFFF) as u8);
        }
        Instruction::SpriteAddr(vx) => {
            m.register_i = Address(FONT_OFFSET + reg(m, vx) as u16 * GLYPH_SIZE);
        }
        Instruction::Decimal(vx) => {
            let value = reg(m, vx);
            let i = m.register_i.0;
            m.memory[Address(i).index()] = value / 100;
            m.memory[Address(i.wrapping_add(1)).index()] = value / 10 % 10;
            m.memory[Address(i.wrapping_add(2)).index()] = value % 10;
        }
        // Both bulk copies leave I unchanged afterwards (the other
        // historical variant advances it by x+1).
        Instruction::StoreRegisters(vx) => {
            let i = m.register_i.0;
            for offset in 0..=vx.0 as u16 {
                let addr = Address(i.wrapping_add(offset));
                m.memory[addr.index()] = m.registers[offset as usize].0;
            }
        }
        Instruction::LoadRegisters(vx) => {
            let i = m.register_i.0;
            for offset in 0..=vx.0 as u16 {
                let addr = Address(i.wrapping_add(offset));
                m.registers[offset as usize] = Value(m.memory[addr.index()]);
            }
        }
    }
    Step::Ok
}

/// Dxyn: XORs an n-row sprite read from memory at I onto the display at
/// (Vx, Vy). Coordinates wrap on both axes independently. VF reports
/// whether any set pixel was cleared by the XOR.
fn draw_sprite(m: &mut Machine, vx: Register, vy: Register, n: Value) -> Step {
    let x0 = reg(m, vx) as usize;
    let y0 = reg(m, vy) as usize;
    let mut collision = false;
    for row in 0..n.0 as usize {
        let sprite_byte = m.memory[Address(m.register_i.0.wrapping_add(row as u16)).index()];
        for col in 0..8 {
            let sprite_bit = (sprite_byte >> (7 - col)) & 0x1;
            if sprite_bit == 0 {
                continue;
            }
            let pixel = &mut m.display[pixel_index(x0 + col, y0 + row)];
            if *pixel == 1 {
                collision = true;
            }
            *pixel ^= 1;
        }
    }
    set_vf(m, collision as u8);
    Step::Redraw
}
