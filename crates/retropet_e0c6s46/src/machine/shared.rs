use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::buzzer::BuzzerEvent;
use super::diagnostics::Diagnostics;
use super::display::DisplayFrame;
use super::pet::PetMachine;
use super::ports::Port;
use super::snapshot::Snapshot;

/// Cloneable handle to a [`PetMachine`] shared between the emulation
/// thread and host threads (UI, audio, persistence).
///
/// Every operation takes the lock for its whole duration, so a batch of
/// steps, a snapshot or a pin change are each atomic with respect to the
/// others. The display generation is mirrored in an atomic so pollers can
/// skip the lock when nothing has changed.
#[derive(Clone)]
pub struct SharedPetMachine {
    machine: Arc<Mutex<PetMachine>>,
    generation: Arc<AtomicU64>,
}

impl SharedPetMachine {
    pub fn new(machine: PetMachine) -> Self {
        let generation = Arc::new(AtomicU64::new(machine.display_generation()));
        Self {
            machine: Arc::new(Mutex::new(machine)),
            generation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PetMachine> {
        // Poisoning is ignored: state is always instruction-consistent.
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the machine.
    pub fn with<R>(&self, f: impl FnOnce(&mut PetMachine) -> R) -> R {
        let mut machine = self.lock();
        let result = f(&mut machine);
        self.generation
            .store(machine.display_generation(), Ordering::Release);
        result
    }

    /// Step until at least `cycles` have run; returns the cycles actually
    /// run.
    pub fn run_batch(&self, cycles: f64) -> f64 {
        self.with(|machine| machine.run_for_cycles(cycles))
    }

    pub fn fast_forward_oscillator(&self, ticks: u64) -> u64 {
        self.with(|machine| machine.fast_forward_oscillator(ticks))
    }

    /// Lock-free read of the display generation.
    pub fn display_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn display_frame(&self) -> DisplayFrame {
        self.with(|machine| machine.display_frame())
    }

    /// The current frame if the generation moved past `last_seen`. Only
    /// locks when it did.
    pub fn display_if_changed(&self, last_seen: u64) -> Option<DisplayFrame> {
        if self.display_generation() == last_seen {
            return None;
        }
        self.with(|machine| machine.display_if_changed(last_seen))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.with(|machine| machine.snapshot())
    }

    pub fn restore(&self, snapshot: &Snapshot) {
        self.with(|machine| machine.restore(snapshot))
    }

    pub fn reset(&self) {
        self.with(|machine| machine.reset())
    }

    pub fn set_reset_line(&self, held: bool) {
        self.with(|machine| machine.set_reset_line(held))
    }

    pub fn set_pin(&self, port: Port, pin: u8, high: bool) {
        self.with(|machine| machine.set_pin(port, pin, high))
    }

    pub fn release_pin(&self, port: Port, pin: u8) {
        self.with(|machine| machine.release_pin(port, pin))
    }

    pub fn inject_serial_byte(&self, value: u8) {
        self.with(|machine| machine.inject_serial_byte(value))
    }

    pub fn drain_serial_output(&self) -> Vec<u8> {
        self.with(|machine| machine.drain_serial_output())
    }

    pub fn set_linked_port_drive(&self, port: Port, drive: Option<u8>) {
        self.with(|machine| machine.set_linked_port_drive(port, drive))
    }

    /// Register the buzzer callback. It runs on whichever thread is
    /// stepping the machine, with the lock held.
    pub fn set_buzzer_listener<F>(&self, listener: F)
    where
        F: FnMut(BuzzerEvent) + Send + 'static,
    {
        self.with(|machine| machine.set_buzzer_listener(listener))
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.with(|machine| machine.diagnostics())
    }
}
