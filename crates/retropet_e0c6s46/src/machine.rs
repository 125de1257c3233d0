mod bus;
mod buzzer;
mod clock;
mod config;
mod diagnostics;
mod display;
mod interrupt;
mod pet;
mod ports;
mod serial;
mod shared;
mod snapshot;
mod timer;

pub(crate) use bus::PetBus;
pub use buzzer::{BuzzerEvent, BuzzerListener, BUZZER_FREQUENCIES_HZ};
pub use clock::OscillatorClock;
pub use config::{MachineConfig, OpcodeAlignment};
pub use diagnostics::Diagnostics;
pub use display::{DisplayFrame, LcdControl};
pub use interrupt::InterruptSource;
pub use pet::{PetMachine, FAST_FORWARD_TICK_CAP};
pub use ports::Port;
pub use shared::SharedPetMachine;
pub use snapshot::{Snapshot, SnapshotValue, SNAPSHOT_VERSION};
