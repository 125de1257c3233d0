//! Cycle-level emulator core for the Epson E0C6S46 4-bit microcontroller
//! (E0C6200 CPU core) found in 1990s virtual-pet toys.
//!
//! The crate models the CPU, its memory-mapped peripherals (clock timer,
//! stopwatch, programmable timer, serial interface, buzzer, I/O ports) and
//! the interrupt controller. Rendering, audio output and persistence are
//! left to the host; see [`PetMachine`] and [`SharedPetMachine`] for the
//! surfaces they consume.

pub mod cpu;
pub mod machine;

pub use cpu::{Flags, Registers};
pub use machine::{
    BuzzerEvent, BuzzerListener, Diagnostics, DisplayFrame, InterruptSource, MachineConfig,
    OpcodeAlignment, PetMachine, Port, SharedPetMachine, Snapshot, SnapshotValue,
};

/// OSC1 crystal frequency; the root clock of every peripheral.
pub const OSC1_HZ: u32 = 32_768;

/// Default CPU clock (OSC3 ceramic oscillator).
pub const DEFAULT_CPU_CLOCK_HZ: u32 = 1_060_000;

/// Number of nibbles in the combined VRAM banks.
pub const VRAM_SIZE: usize = 160;

/// Display frame length: VRAM followed by P0..P3 and R0..R3.
pub const DISPLAY_FRAME_SIZE: usize = VRAM_SIZE + 8;

/// Number of general-purpose RAM nibbles.
pub const RAM_SIZE: usize = 0x300;
