//! Architectural constants and the small newtypes shared by the rest of
//! the emulator.

pub const MEMORY_SIZE: usize = 4096;
pub const RESERVED_MEM: usize = 512;
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - RESERVED_MEM;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const DISPLAY_SIZE: usize = SCREEN_WIDTH * SCREEN_HEIGHT;
pub const STACK_DEPTH: usize = 16;
pub const FONT_OFFSET: u16 = 0;
pub const GLYPH_SIZE: u16 = 5;
pub const PROGRAM_START: u16 = 0x200;

/// Built-in font. Digits 0-F, 5 bytes per glyph, resident below 0x200.
pub const FONT_SPRITES: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// A 16-bit address into emulated memory (also the width of PC and I).
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Address(pub u16);

impl Address {
    /// Index into a memory-sized array, wrapping modulo 4096.
    pub fn index(self) -> usize {
        self.0 as usize % MEMORY_SIZE
    }
}

/// One of the sixteen general-purpose registers V0..VF.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Register(pub u8);

impl Register {
    pub fn index(self) -> usize {
        debug_assert!(self.0 < 16);
        self.0 as usize
    }
}

/// An 8-bit register or memory value.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Value(pub u8);

/// Row-major index into the display buffer. Both axes wrap (toroidal
/// display), each independently of the other.
pub fn pixel_index(col: usize, row: usize) -> usize {
    (row % SCREEN_HEIGHT) * SCREEN_WIDTH + (col % SCREEN_WIDTH)
}
