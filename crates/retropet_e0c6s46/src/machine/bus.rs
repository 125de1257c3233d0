use super::buzzer::Buzzer;
use super::config::{MachineConfig, OpcodeAlignment};
use super::diagnostics::Diagnostics;
use super::display::{DisplayFrame, LcdControl};
use super::interrupt::{InterruptController, InterruptSource};
use super::ports::{Port, Ports};
use super::serial::Serial;
use super::timer::{ClockTimer, ProgTimer, Stopwatch};
use crate::cpu::Bus;
use crate::{DISPLAY_FRAME_SIZE, RAM_SIZE, VRAM_SIZE};

mod io;

/// Nibble address ranges of the data bus.
pub(crate) const RAM_END: u16 = 0x2FF;
pub(crate) const VRAM1_START: u16 = 0xE00;
pub(crate) const VRAM1_END: u16 = 0xE4F;
pub(crate) const VRAM2_START: u16 = 0xE80;
pub(crate) const VRAM2_END: u16 = 0xECF;
pub(crate) const IO_START: u16 = 0xF00;
pub(crate) const IO_END: u16 = 0xF7F;

/// Nibbles per VRAM bank.
const VRAM_BANK_SIZE: usize = VRAM_SIZE / 2;

/// Reset value of R4: R43 high keeps the buzzer off.
const R4_RESET: u8 = 0xF;

/// The E0C6S46 data bus: ROM, RAM, VRAM and every memory-mapped
/// peripheral.
pub(crate) struct PetBus {
    rom: Vec<u8>,
    alignment: OpcodeAlignment,
    pub(crate) ram: [u8; RAM_SIZE],
    pub(crate) vram: [u8; VRAM_SIZE],
    pub(crate) irq: InterruptController,
    pub(crate) clock_timer: ClockTimer,
    pub(crate) stopwatch: Stopwatch,
    pub(crate) prog_timer: ProgTimer,
    pub(crate) serial: Serial,
    pub(crate) ports: Ports,
    pub(crate) buzzer: Buzzer,
    /// R0..R3 output latches (F50..F53).
    pub(crate) outputs: [u8; 4],
    /// R4 output latch (F54).
    pub(crate) r4: u8,
    pub(crate) lcd: LcdControl,
    pub(crate) contrast: u8,
    pub(crate) svd: u8,
    pub(crate) osc_control: u8,
    pub(crate) heavy_load: u8,
    /// Tick counters; the machine fills in the CPU-side fields.
    pub(crate) diagnostics: Diagnostics,
    /// Source accepted by the most recent `acknowledge_interrupt`.
    pub(crate) last_acknowledged: Option<InterruptSource>,
    display_generation: u64,
}

impl PetBus {
    pub(crate) fn new(rom: Vec<u8>, config: &MachineConfig) -> Self {
        Self {
            rom,
            alignment: config.opcode_alignment,
            ram: [0; RAM_SIZE],
            vram: [0; VRAM_SIZE],
            irq: InterruptController::new(),
            clock_timer: ClockTimer::new(),
            stopwatch: Stopwatch::new(),
            prog_timer: ProgTimer::new(),
            serial: Serial::new(),
            ports: Ports::new(config.k0_pullup, config.k1_pullup, config.port3_dedicated),
            buzzer: Buzzer::new(),
            outputs: [0; 4],
            r4: R4_RESET,
            lcd: LcdControl::ALOFF,
            contrast: 0,
            svd: 0,
            osc_control: 0,
            heavy_load: 0,
            diagnostics: Diagnostics::default(),
            last_acknowledged: None,
            display_generation: 0,
        }
    }

    pub(crate) fn rom_len(&self) -> usize {
        self.rom.len()
    }

    /// Zero all mutable state except ROM and configuration. The display
    /// generation survives and only moves if the frame changed.
    pub(crate) fn reset(&mut self) {
        let before = self.frame_nibbles();
        self.clear();
        self.bump_display_if_changed(before);
    }

    /// `reset` without touching the display generation.
    pub(crate) fn clear(&mut self) {
        self.ram = [0; RAM_SIZE];
        self.vram = [0; VRAM_SIZE];
        self.irq = InterruptController::new();
        self.clock_timer = ClockTimer::new();
        self.stopwatch = Stopwatch::new();
        self.prog_timer = ProgTimer::new();
        self.serial = Serial::new();
        self.ports.reset();
        self.buzzer.reset();
        self.outputs = [0; 4];
        self.r4 = R4_RESET;
        self.lcd = LcdControl::ALOFF;
        self.contrast = 0;
        self.svd = 0;
        self.osc_control = 0;
        self.heavy_load = 0;
        self.diagnostics = Diagnostics::default();
        self.last_acknowledged = None;
    }

    /// Side-effect-free read used by debuggers and snapshots.
    pub(crate) fn peek(&self, addr: u16) -> u8 {
        let addr = addr & 0xFFF;
        match addr {
            0..=RAM_END => self.ram[addr as usize],
            VRAM1_START..=VRAM1_END | VRAM2_START..=VRAM2_END => self.vram[vram_index(addr)],
            IO_START..=IO_END => self.io_value(addr),
            _ => 0,
        }
    }

    /// Advance every OSC1-driven peripheral by one tick.
    pub(crate) fn tick_oscillator(&mut self) {
        self.diagnostics.oscillator_ticks += 1;
        if self.clock_timer.tick(&mut self.irq) {
            self.diagnostics.clock_timer_ticks += 1;
        }
        if self.stopwatch.tick(&mut self.irq) {
            self.diagnostics.stopwatch_ticks += 1;
        }
        if self.prog_timer.tick(&mut self.irq) {
            self.diagnostics.prog_timer_ticks += 1;
        }
        self.buzzer.tick();
    }

    /// Force (`Some(level)`) or release (`None`) a pin.
    pub(crate) fn set_pin(&mut self, port: Port, pin: u8, level: Option<bool>) {
        let change = self.ports.set_pin(port, pin, level, &mut self.irq);
        if port == Port::K1
            && change.falling & 0x8 != 0
            && self.prog_timer.external_edge(&mut self.irq)
        {
            self.diagnostics.prog_timer_ticks += 1;
        }
        if change.p_changed {
            self.bump_display();
        }
    }

    pub(crate) fn set_linked_port_drive(&mut self, port: Port, drive: Option<u8>) {
        match port.p_index() {
            Some(index) => {
                if self.ports.set_linked_drive(index, drive) {
                    self.bump_display();
                }
            }
            None => log::debug!("E0C6S46: linked drive ignored on input port {:?}", port),
        }
    }

    pub(crate) fn inject_serial_byte(&mut self, value: u8) {
        self.serial.receive(value, &mut self.irq);
    }

    pub(crate) fn display_generation(&self) -> u64 {
        self.display_generation
    }

    #[inline]
    pub(crate) fn bump_display(&mut self) {
        self.display_generation += 1;
    }

    pub(crate) fn bump_display_if_changed(&mut self, before: [u8; DISPLAY_FRAME_SIZE]) {
        if self.frame_nibbles() != before {
            self.bump_display();
        }
    }

    pub(crate) fn display_frame(&self) -> DisplayFrame {
        DisplayFrame::compose(
            self.display_generation,
            self.lcd,
            &self.vram,
            self.ports.p_values(),
            self.outputs,
        )
    }

    pub(crate) fn frame_nibbles(&self) -> [u8; DISPLAY_FRAME_SIZE] {
        self.display_frame().nibbles
    }

    fn write_vram(&mut self, addr: u16, value: u8) {
        let index = vram_index(addr);
        if self.vram[index] != value {
            self.vram[index] = value;
            self.bump_display();
        }
    }
}

/// Logical VRAM index of a bank 1 or bank 2 address.
#[inline]
fn vram_index(addr: u16) -> usize {
    if addr >= VRAM2_START {
        VRAM_BANK_SIZE + (addr - VRAM2_START) as usize
    } else {
        (addr - VRAM1_START) as usize
    }
}

impl Bus for PetBus {
    fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0xFFF;
        match addr {
            0..=RAM_END => self.ram[addr as usize],
            VRAM1_START..=VRAM1_END | VRAM2_START..=VRAM2_END => self.vram[vram_index(addr)],
            IO_START..=IO_END => self.read_io(addr),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0xFFF;
        let value = value & 0xF;
        match addr {
            0..=RAM_END => self.ram[addr as usize] = value,
            VRAM1_START..=VRAM1_END | VRAM2_START..=VRAM2_END => self.write_vram(addr, value),
            IO_START..=IO_END => self.write_io(addr, value),
            _ => {}
        }
    }

    /// Big-endian 16-bit word at byte `2 * pc`, wrapped by the ROM length
    /// so short images mirror.
    fn fetch(&mut self, pc: u16) -> u16 {
        let len = self.rom.len();
        if len == 0 {
            return 0;
        }
        let offset = (2 * pc as usize) % len;
        let word = u16::from_be_bytes([self.rom[offset], self.rom[(offset + 1) % len]]);
        self.alignment.extract(word)
    }

    fn acknowledge_interrupt(&mut self) -> Option<u8> {
        let source = self.irq.acknowledge()?;
        self.last_acknowledged = Some(source);
        Some(source.vector())
    }
}
