//! A display-independent CHIP-8 execution core.
//!
//! The crate owns the machine state ([`Machine`]) and the one-step
//! fetch-decode-execute interpreter ([`step`]); everything real-time lives
//! in the embedding driver. A typical driver loop:
//!
//! ```no_run
//! use chip8_core::{step, Machine, Step};
//!
//! let mut machine = Machine::new();
//! machine.load_program(&[0x00, 0xE0]).unwrap();
//! loop {
//!     // ...poll input, feed machine.key_event(key, pressed)...
//!     match step(&mut machine, None) {
//!         Step::Ok | Step::WaitingForKey => {}
//!         Step::Redraw => { /* composite machine.display */ }
//!         Step::Breakpoint(addr) => {
//!             println!("break at {:#05X}\n{}", addr.0, machine.snapshot());
//!             break;
//!         }
//!         fault => {
//!             eprintln!("fault: {:?}\n{}", fault, machine.snapshot());
//!             break;
//!         }
//!     }
//!     machine.tick_timers(); // at 60 Hz, decoupled from the step rate
//! }
//! ```

pub mod emulator;

pub use emulator::basics::{Address, Register, Value};
pub use emulator::interpreter::{step, Step};
pub use emulator::machine::{LoadError, Machine, Snapshot};
pub use emulator::program::Instruction;
