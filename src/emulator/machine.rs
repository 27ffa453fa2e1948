use super::basics::{
    Address, Value, DISPLAY_SIZE, FONT_OFFSET, FONT_SPRITES, MAX_PROGRAM_SIZE, MEMORY_SIZE,
    PROGRAM_START, SCREEN_HEIGHT, SCREEN_WIDTH, STACK_DEPTH,
};
use arrayvec::ArrayVec;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use thiserror::Error;

/// Reported when a program cannot be placed into machine memory.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
pub enum LoadError {
    #[error("program too large ({size} bytes, max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
    /// Reserved for the driver: reading the program bytes from wherever
    /// they live is its concern, but the failure belongs to this taxonomy.
    #[error("program source could not be read")]
    IoUnavailable,
}

/// The complete architectural state of one emulated machine.
///
/// Pure data: the interpreter owns all invariant checks, so every
/// architectural field is public. VF (`registers[0xF]`) is an ordinary
/// register that several instructions also use as a flag output; a program
/// reading VF right after such an instruction sees the flag, not its old
/// contents.
pub struct Machine {
    pub memory: [u8; MEMORY_SIZE],
    /// One byte per pixel (0 or 1), row-major, 64x32.
    pub display: [u8; DISPLAY_SIZE],
    pub registers: [Value; 16],
    /// Return addresses; `len()` is the stack pointer (next free slot).
    pub stack: ArrayVec<[Address; STACK_DEPTH]>,
    pub program_counter: Address,
    pub register_i: Address,
    pub delay_timer: Value,
    pub sound_timer: Value,
    /// Bitmap of held keys, one bit per keypad key 0x0-0xF.
    pub keypad: u16,
    /// Set while an Fx0A is suspended waiting for a key press.
    pub key_waiting: bool,
    /// The key that will resolve a pending Fx0A, once the driver saw one.
    pub last_key: Option<u8>,
    rng: StdRng,
}

impl Machine {
    /// Creates a machine with zeroed state, the font copied into low
    /// memory and PC at the conventional program start.
    pub fn new() -> Machine {
        Machine::with_rng(StdRng::from_entropy())
    }

    /// Like [`Machine::new`], but with a deterministic random source so
    /// `Cxkk` becomes reproducible.
    pub fn with_seed(seed: u64) -> Machine {
        Machine::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Machine {
        let mut memory = [0; MEMORY_SIZE];
        let font_start = FONT_OFFSET as usize;
        memory[font_start..font_start + FONT_SPRITES.len()].copy_from_slice(&FONT_SPRITES);

        Machine {
            memory,
            display: [0; DISPLAY_SIZE],
            registers: [Value(0); 16],
            stack: ArrayVec::new(),
            program_counter: Address(PROGRAM_START),
            register_i: Address(0),
            delay_timer: Value(0),
            sound_timer: Value(0),
            keypad: 0,
            key_waiting: false,
            last_key: None,
            rng,
        }
    }

    /// Copies a program image to 0x200. All other state is untouched, so
    /// loading over an already-loaded program simply replaces it.
    pub fn load_program(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
        info!("loaded program: {} bytes", bytes.len());
        Ok(())
    }

    /// Decrements both timers toward zero. The driver calls this at 60 Hz;
    /// the interpreter never touches the timers on its own.
    pub fn tick_timers(&mut self) {
        self.delay_timer.0 = self.delay_timer.0.saturating_sub(1);
        self.sound_timer.0 = self.sound_timer.0.saturating_sub(1);
    }

    /// Records a physical key transition on the 16-key keypad.
    ///
    /// A press while an Fx0A is suspended also becomes the key that
    /// resolves the wait.
    pub fn key_event(&mut self, key: u8, pressed: bool) {
        let key = key & 0xF;
        if pressed {
            self.keypad |= 1 << key;
            if self.key_waiting {
                self.last_key = Some(key);
            }
        } else {
            self.keypad &= !(1 << key);
        }
    }

    /// Tests whether a keypad key is currently held.
    pub fn key_pressed(&self, key: u8) -> bool {
        self.keypad & (1 << (key & 0xF)) != 0
    }

    pub fn random_byte(&mut self) -> u8 {
        self.rng.gen()
    }

    /// Captures the register file, timers and call stack for diagnostics.
    pub fn snapshot(&self) -> Snapshot {
        let mut stack = [Address(0); STACK_DEPTH];
        for (slot, addr) in stack.iter_mut().zip(self.stack.iter()) {
            *slot = *addr;
        }
        Snapshot {
            pc: self.program_counter,
            i: self.register_i,
            dt: self.delay_timer,
            st: self.sound_timer,
            v: self.registers,
            sp: self.stack.len(),
            stack,
        }
    }

    /// Renders the display buffer as 32 lines of `@` and spaces.
    pub fn display_ascii(&self) -> String {
        let mut out = String::with_capacity((SCREEN_WIDTH + 1) * SCREEN_HEIGHT);
        for row in self.display.chunks(SCREEN_WIDTH) {
            for &pixel in row {
                out.push(if pixel == 1 { '@' } else { ' ' });
            }
            out.push('\n');
        }
        out
    }
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

/// A point-in-time copy of the diagnostic-relevant machine state.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Snapshot {
    pub pc: Address,
    pub i: Address,
    pub dt: Value,
    pub st: Value,
    pub v: [Value; 16],
    pub sp: usize,
    pub stack: [Address; STACK_DEPTH],
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PC: {:#05X}", self.pc.0)?;
        writeln!(f, "ST: {:#04X}", self.st.0)?;
        writeln!(f, "DT: {:#04X}", self.dt.0)?;
        writeln!(f, "I: {:#05X}", self.i.0)?;
        writeln!(f)?;
        for (i, v) in self.v.iter().enumerate() {
            writeln!(f, "V{:X}: {:#04X}", i, v.0)?;
        }
        writeln!(f)?;
        writeln!(f, "SP: {:#04X}", self.sp)?;
        for (i, addr) in self.stack.iter().enumerate() {
            writeln!(f, "stack[{:X}]: {:#06X}", i, addr.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_machine_new() {
        let m = Machine::new();
        assert_eq!(m.program_counter, Address(0x200));
        assert!(m.stack.is_empty());
        for r in m.registers.iter() {
            assert_eq!(*r, Value(0));
        }
        assert_eq!(m.register_i, Address(0));
        assert_eq!(m.delay_timer, Value(0));
        assert_eq!(m.sound_timer, Value(0));
        assert_eq!(m.keypad, 0);
        assert!(!m.key_waiting);
        assert_eq!(m.last_key, None);
        // Font sits at the bottom of memory, nothing above it.
        assert_eq!(&m.memory[..80], &FONT_SPRITES[..]);
        assert!(m.memory[80..].iter().all(|&b| b == 0));
        assert!(m.display.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_load_program_bounds() {
        let mut m = Machine::new();
        let exact = vec![0xAB; MAX_PROGRAM_SIZE];
        assert_eq!(m.load_program(&exact), Ok(()));
        assert_eq!(m.memory[0x200], 0xAB);
        assert_eq!(m.memory[MEMORY_SIZE - 1], 0xAB);

        let too_big = vec![0; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            m.load_program(&too_big),
            Err(LoadError::TooLarge {
                size: MAX_PROGRAM_SIZE + 1,
                max: MAX_PROGRAM_SIZE,
            })
        );
        // The failed load must not have clobbered anything.
        assert_eq!(m.memory[0x200], 0xAB);
    }

    #[test]
    fn test_load_program_replaces_previous() {
        let mut m = Machine::new();
        m.load_program(&[1, 2, 3, 4]).unwrap();
        m.load_program(&[9, 8]).unwrap();
        assert_eq!(&m.memory[0x200..0x204], &[9, 8, 3, 4]);
        assert_eq!(m.program_counter, Address(0x200));
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::TooLarge { size: 4000, max: 3584 };
        assert_eq!(
            err.to_string(),
            "program too large (4000 bytes, max: 3584 bytes)"
        );
    }

    #[test]
    fn test_tick_timers_floor_at_zero() {
        let mut m = Machine::new();
        m.delay_timer = Value(2);
        m.sound_timer = Value(1);
        m.tick_timers();
        assert_eq!(m.delay_timer, Value(1));
        assert_eq!(m.sound_timer, Value(0));
        for _ in 0..10 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer, Value(0));
        assert_eq!(m.sound_timer, Value(0));
    }

    #[test]
    fn test_key_events_set_and_clear_latch() {
        let mut m = Machine::new();
        m.key_event(0x4, true);
        m.key_event(0xF, true);
        assert!(m.key_pressed(0x4));
        assert!(m.key_pressed(0xF));
        assert!(!m.key_pressed(0x0));
        m.key_event(0x4, false);
        assert!(!m.key_pressed(0x4));
        // Releasing an unpressed key is a no-op, not a toggle.
        m.key_event(0x4, false);
        assert!(!m.key_pressed(0x4));
    }

    #[test]
    fn test_key_press_resolves_pending_wait() {
        let mut m = Machine::new();
        m.key_event(0x2, true);
        assert_eq!(m.last_key, None);
        m.key_waiting = true;
        m.key_event(0x7, true);
        assert_eq!(m.last_key, Some(0x7));
        // Releases never resolve a wait.
        m.last_key = None;
        m.key_event(0x7, false);
        assert_eq!(m.last_key, None);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut m = Machine::new();
        m.registers[3] = Value(0x42);
        m.register_i = Address(0x300);
        m.delay_timer = Value(7);
        m.stack.push(Address(0x204));
        m.stack.push(Address(0x20A));
        let snap = m.snapshot();
        assert_eq!(snap.pc, Address(0x200));
        assert_eq!(snap.i, Address(0x300));
        assert_eq!(snap.dt, Value(7));
        assert_eq!(snap.v[3], Value(0x42));
        assert_eq!(snap.sp, 2);
        assert_eq!(snap.stack[0], Address(0x204));
        assert_eq!(snap.stack[1], Address(0x20A));
        assert_eq!(snap.stack[2], Address(0));

        let text = snap.to_string();
        assert!(text.contains("PC: 0x200"));
        assert!(text.contains("V3: 0x42"));
        assert!(text.contains("SP: 0x02"));
        assert!(text.contains("stack[1]: 0x020A"));
    }

    #[test]
    fn test_display_ascii_shape() {
        let mut m = Machine::new();
        m.display[0] = 1;
        m.display[DISPLAY_SIZE - 1] = 1;
        let text = m.display_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), SCREEN_HEIGHT);
        assert!(lines.iter().all(|l| l.len() == SCREEN_WIDTH));
        assert!(lines[0].starts_with('@'));
        assert!(lines[31].ends_with('@'));
    }
}
