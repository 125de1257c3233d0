mod state;

use super::buzzer::{BuzzerEvent, BuzzerListener};
use super::clock::OscillatorClock;
use super::config::MachineConfig;
use super::diagnostics::Diagnostics;
use super::display::DisplayFrame;
use super::ports::Port;
use super::PetBus;
use crate::cpu::{Cpu, Registers};
use crate::OSC1_HZ;

/// Upper bound for one `fast_forward_oscillator` call: ten minutes of
/// OSC1 ticks.
pub const FAST_FORWARD_TICK_CAP: u64 = 10 * 60 * OSC1_HZ as u64;

/// A complete E0C6S46 system: CPU, bus and the oscillator that clocks
/// the peripherals.
///
/// Every method runs to completion at instruction granularity; wrap the
/// machine in [`super::SharedPetMachine`] to drive it from several
/// threads.
pub struct PetMachine {
    cpu: Cpu,
    pub(super) bus: PetBus,
    clock: OscillatorClock,
    config: MachineConfig,
    buzzer_listener: Option<BuzzerListener>,
}

impl PetMachine {
    pub fn new(rom: impl Into<Vec<u8>>, config: MachineConfig) -> Self {
        let rom = rom.into();
        if rom.is_empty() {
            log::warn!("E0C6S46: empty ROM image, every fetch will read 0");
        }
        log::info!(
            "E0C6S46: {} byte ROM, cpu clock {} Hz, {:?}",
            rom.len(),
            config.clock_hz,
            config.opcode_alignment
        );
        let bus = PetBus::new(rom, &config);
        Self {
            cpu: Cpu::new(),
            bus,
            clock: OscillatorClock::new(config.clock_hz),
            config,
            buzzer_listener: None,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn rom_len(&self) -> usize {
        self.bus.rom_len()
    }

    pub fn clock(&self) -> &OscillatorClock {
        &self.clock
    }

    /// Execute one instruction (or one idle slice) and return the CPU
    /// cycles it took, including interrupt entry.
    ///
    /// - Reset line held: nothing advances; one tick worth of cycles is
    ///   reported so pacing loops keep moving.
    /// - Halted: idle exactly until the next OSC1 tick.
    pub fn step(&mut self) -> f64 {
        if self.cpu.in_reset {
            return self.clock.cycles_per_tick();
        }

        let mut cycles = if self.cpu.halted {
            let idle = self.clock.residual();
            self.bus.diagnostics.halted_cycles += idle;
            idle
        } else {
            self.cpu.step(&mut self.bus) as f64
        };
        self.advance_clock(cycles);

        if let Some(extra) = self.cpu.handle_interrupts(&mut self.bus) {
            self.bus.diagnostics.interrupts += 1;
            self.bus.diagnostics.last_interrupt_vector =
                self.bus.last_acknowledged.map(|source| source.vector());
            cycles += extra as f64;
            self.advance_clock(extra as f64);
        }

        self.flush_buzzer();
        cycles
    }

    /// Step until at least `target_cycles` have elapsed; returns the cycles
    /// actually run.
    pub fn run_for_cycles(&mut self, target_cycles: f64) -> f64 {
        let mut total = 0.0;
        while total < target_cycles {
            total += self.step();
        }
        total
    }

    /// Advance only the OSC1-driven peripherals, without executing
    /// instructions. Capped at [`FAST_FORWARD_TICK_CAP`]; returns the ticks
    /// applied.
    pub fn fast_forward_oscillator(&mut self, ticks: u64) -> u64 {
        let applied = ticks.min(FAST_FORWARD_TICK_CAP);
        if applied < ticks {
            log::debug!(
                "E0C6S46 fast-forward capped: {} of {} ticks",
                applied,
                ticks
            );
        }
        for _ in 0..applied {
            self.bus.tick_oscillator();
        }
        self.flush_buzzer();
        applied
    }

    fn advance_clock(&mut self, cycles: f64) {
        let ticks = self.clock.consume(cycles);
        for _ in 0..ticks {
            self.bus.tick_oscillator();
        }
    }

    /// Full reset: every mutable state except ROM and configuration.
    pub fn reset(&mut self) {
        log::info!("E0C6S46 reset");
        self.cpu.reset();
        self.bus.reset();
        self.clock.reset();
        self.flush_buzzer();
    }

    /// Hold or release the reset line. Asserting it resets the machine;
    /// while held, `step` does nothing.
    pub fn set_reset_line(&mut self, held: bool) {
        if held && !self.cpu.in_reset {
            self.reset();
            self.cpu.in_reset = true;
        } else if !held {
            self.cpu.in_reset = false;
        }
    }

    pub fn in_reset(&self) -> bool {
        self.cpu.in_reset
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.halted
    }

    /// Drive a pin (0..=3) high or low from outside the chip. Other pin
    /// numbers are ignored.
    pub fn set_pin(&mut self, port: Port, pin: u8, high: bool) {
        self.bus.set_pin(port, pin, Some(high));
    }

    /// Stop driving a pin; it returns to its pull-up level.
    pub fn release_pin(&mut self, port: Port, pin: u8) {
        self.bus.set_pin(port, pin, None);
    }

    /// Latch a byte received from a peer and raise the serial interrupt.
    pub fn inject_serial_byte(&mut self, value: u8) {
        self.bus.inject_serial_byte(value);
    }

    /// Bytes transmitted by the firmware since the last call.
    pub fn drain_serial_output(&mut self) -> Vec<u8> {
        self.bus.serial.drain()
    }

    /// Model a linked machine driving P`n` while it is configured as an
    /// input. `None` releases the port.
    pub fn set_linked_port_drive(&mut self, port: Port, drive: Option<u8>) {
        self.bus.set_linked_port_drive(port, drive);
    }

    pub fn display_frame(&self) -> DisplayFrame {
        self.bus.display_frame()
    }

    pub fn display_generation(&self) -> u64 {
        self.bus.display_generation()
    }

    /// The current frame, unless the generation still equals `last_seen`.
    pub fn display_if_changed(&self, last_seen: u64) -> Option<DisplayFrame> {
        if self.bus.display_generation() == last_seen {
            None
        } else {
            Some(self.bus.display_frame())
        }
    }

    pub fn set_buzzer_listener<F>(&mut self, listener: F)
    where
        F: FnMut(BuzzerEvent) + Send + 'static,
    {
        self.buzzer_listener = Some(Box::new(listener));
    }

    pub fn clear_buzzer_listener(&mut self) {
        self.buzzer_listener = None;
    }

    pub fn buzzer_output(&self) -> BuzzerEvent {
        self.bus.buzzer.output()
    }

    fn flush_buzzer(&mut self) {
        if let Some(event) = self.bus.buzzer.take_change() {
            if let Some(listener) = self.buzzer_listener.as_mut() {
                listener(event);
            }
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let mut diagnostics = self.bus.diagnostics.clone();
        diagnostics.instructions = self.cpu.instructions();
        diagnostics.undefined_opcodes = self.cpu.undefined_opcodes();
        diagnostics.interrupt_triggers = self.bus.irq.trigger_counts;
        diagnostics
    }

    pub fn registers(&self) -> Registers {
        self.cpu.regs
    }

    /// Debug peek at a data-bus nibble. Unlike a CPU read this never
    /// acknowledges interrupt factors.
    pub fn read_nibble(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Whether any interrupt source is latched and waiting for the CPU.
    pub fn interrupt_pending(&self) -> bool {
        self.bus.irq.any_triggered()
    }
}
