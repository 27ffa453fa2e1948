use super::basics::{Address, Register, Value};

/// One decoded instruction of the base 35-opcode set.
///
/// Operands follow the conventional encoding fields: `x`/`y` are register
/// indices, `kk` an 8-bit immediate, `nnn` a 12-bit address and `n` a
/// 4-bit nibble.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Instruction {
    ClearDisplay,
    ReturnSubroutine,
    Jump(Address),
    CallSubroutine(Address),
    SkipEqualConst(Register, Value),
    SkipNotEqualConst(Register, Value),
    SkipEqual(Register, Register),
    SetConst(Register, Value),
    AddConst(Register, Value),
    Set(Register, Register),
    Or(Register, Register),
    And(Register, Register),
    Xor(Register, Register),
    Add(Register, Register),
    Sub(Register, Register),
    RightShift(Register),
    NegSub(Register, Register),
    LeftShift(Register),
    SkipNotEqual(Register, Register),
    SetI(Address),
    JumpAdd(Address),
    Rand(Register, Value),
    Draw(Register, Register, Value),
    SkipKey(Register),
    SkipNotKey(Register),
    GetDelayTimer(Register),
    WaitKey(Register),
    SetDelayTimer(Register),
    SetSoundTimer(Register),
    AddToI(Register),
    SpriteAddr(Register),
    Decimal(Register),
    StoreRegisters(Register),
    LoadRegisters(Register),
}

macro_rules! NNN {
    ($x:expr) => {
        Address((($x.1 as u16) << 8) | (($x.2 as u16) << 4) | ($x.3 as u16))
    };
}

macro_rules! KK {
    ($x:expr) => {
        Value(($x.2 << 4) | $x.3)
    };
}

macro_rules! N {
    ($x:expr) => {
        Value($x.3)
    };
}

macro_rules! X {
    ($x:expr) => {
        Register($x.1)
    };
}

macro_rules! Y {
    ($x:expr) => {
        Register($x.2)
    };
}

impl Instruction {
    /// Decodes the two big-endian bytes of an opcode.
    ///
    /// Returns `None` for every bit pattern outside the enumerated set,
    /// including `0000` and the `0nnn` machine-code routines of the host
    /// hardware, which this machine does not implement.
    pub fn from_bytes(hi: u8, lo: u8) -> Option<Instruction> {
        let nibbles = (hi >> 4, hi & 0xF, lo >> 4, lo & 0xF);
        let instruction = match nibbles {
            (0x0, 0x0, 0xE, 0x0) => Instruction::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Instruction::ReturnSubroutine,
            (0x1, _, _, _) => Instruction::Jump(NNN!(nibbles)),
            (0x2, _, _, _) => Instruction::CallSubroutine(NNN!(nibbles)),
            (0x3, _, _, _) => Instruction::SkipEqualConst(X!(nibbles), KK!(nibbles)),
            (0x4, _, _, _) => Instruction::SkipNotEqualConst(X!(nibbles), KK!(nibbles)),
            (0x5, _, _, 0x0) => Instruction::SkipEqual(X!(nibbles), Y!(nibbles)),
            (0x6, _, _, _) => Instruction::SetConst(X!(nibbles), KK!(nibbles)),
            (0x7, _, _, _) => Instruction::AddConst(X!(nibbles), KK!(nibbles)),
            (0x8, _, _, 0x0) => Instruction::Set(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x1) => Instruction::Or(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x2) => Instruction::And(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x3) => Instruction::Xor(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x4) => Instruction::Add(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x5) => Instruction::Sub(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0x6) => Instruction::RightShift(X!(nibbles)),
            (0x8, _, _, 0x7) => Instruction::NegSub(X!(nibbles), Y!(nibbles)),
            (0x8, _, _, 0xE) => Instruction::LeftShift(X!(nibbles)),
            (0x9, _, _, 0x0) => Instruction::SkipNotEqual(X!(nibbles), Y!(nibbles)),
            (0xA, _, _, _) => Instruction::SetI(NNN!(nibbles)),
            (0xB, _, _, _) => Instruction::JumpAdd(NNN!(nibbles)),
            (0xC, _, _, _) => Instruction::Rand(X!(nibbles), KK!(nibbles)),
            (0xD, _, _, _) => Instruction::Draw(X!(nibbles), Y!(nibbles), N!(nibbles)),
            (0xE, _, 0x9, 0xE) => Instruction::SkipKey(X!(nibbles)),
            (0xE, _, 0xA, 0x1) => Instruction::SkipNotKey(X!(nibbles)),
            (0xF, _, 0x0, 0x7) => Instruction::GetDelayTimer(X!(nibbles)),
            (0xF, _, 0x0, 0xA) => Instruction::WaitKey(X!(nibbles)),
            (0xF, _, 0x1, 0x5) => Instruction::SetDelayTimer(X!(nibbles)),
            (0xF, _, 0x1, 0x8) => Instruction::SetSoundTimer(X!(nibbles)),
            (0xF, _, 0x1, 0xE) => Instruction::AddToI(X!(nibbles)),
            (0xF, _, 0x2, 0x9) => Instruction::SpriteAddr(X!(nibbles)),
            (0xF, _, 0x3, 0x3) => Instruction::Decimal(X!(nibbles)),
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegisters(X!(nibbles)),
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegisters(X!(nibbles)),
            _ => return None,
        };
        Some(instruction)
    }
}
