//! I/O register window (F00..F7F).
use super::PetBus;
use crate::machine::display::LcdControl;
use crate::machine::interrupt::InterruptSource;

// Interrupt factor and mask registers: base + InterruptSource::index().
const IO_FACTOR_BASE: u16 = 0xF00;
const IO_FACTOR_LAST: u16 = 0xF05;
const IO_MASK_BASE: u16 = 0xF10;
const IO_MASK_LAST: u16 = 0xF15;

const IO_TM_LOW: u16 = 0xF20;
const IO_TM_HIGH: u16 = 0xF21;
const IO_SWL: u16 = 0xF22;
const IO_SWH: u16 = 0xF23;
const IO_PD_LOW: u16 = 0xF24;
const IO_PD_HIGH: u16 = 0xF25;
const IO_RD_LOW: u16 = 0xF26;
const IO_RD_HIGH: u16 = 0xF27;
const IO_SD_LOW: u16 = 0xF30;
const IO_SD_HIGH: u16 = 0xF31;
const IO_K0: u16 = 0xF40;
const IO_DFK0: u16 = 0xF41;
const IO_K1: u16 = 0xF42;
const IO_R0: u16 = 0xF50;
const IO_R3: u16 = 0xF53;
const IO_R4: u16 = 0xF54;
const IO_P0: u16 = 0xF60;
const IO_P3: u16 = 0xF63;
const IO_OSC: u16 = 0xF70;
const IO_LCD: u16 = 0xF71;
const IO_CONTRAST: u16 = 0xF72;
const IO_SVD: u16 = 0xF73;
const IO_BUZZER_FREQ: u16 = 0xF74;
const IO_BUZZER_CTRL: u16 = 0xF75;
const IO_TIMER_CTRL: u16 = 0xF76;
const IO_STOPWATCH_CTRL: u16 = 0xF77;
const IO_PTIMER_CTRL: u16 = 0xF78;
const IO_PTIMER_CLOCK: u16 = 0xF79;
const IO_SERIAL_CTRL: u16 = 0xF7A;
const IO_HEAVY_LOAD: u16 = 0xF7B;
const IO_PORT_DIR: u16 = 0xF7D;
const IO_PULLUP: u16 = 0xF7E;

// Control bits shared by F76/F77/F78.
const CTRL_RUN: u8 = 0b01;
const CTRL_RESET: u8 = 0b10;

/// SVDDT reads 0: supply voltage is always fine.
const SVD_WRITABLE: u8 = 0b0111;

impl PetBus {
    /// Register value without read side effects.
    pub(super) fn io_value(&self, addr: u16) -> u8 {
        match addr {
            IO_FACTOR_BASE..=IO_FACTOR_LAST => source_at(addr - IO_FACTOR_BASE)
                .map(|source| self.irq.factor(source))
                .unwrap_or(0),
            IO_MASK_BASE..=IO_MASK_LAST => source_at(addr - IO_MASK_BASE)
                .map(|source| self.irq.mask(source))
                .unwrap_or(0),
            IO_TM_LOW => self.clock_timer.low(),
            IO_TM_HIGH => self.clock_timer.high(),
            IO_SWL => self.stopwatch.swl,
            IO_SWH => self.stopwatch.swh,
            IO_PD_LOW => self.prog_timer.data & 0xF,
            IO_PD_HIGH => self.prog_timer.data >> 4,
            IO_RD_LOW => self.prog_timer.reload & 0xF,
            IO_RD_HIGH => self.prog_timer.reload >> 4,
            IO_SD_LOW => self.serial.low(),
            IO_SD_HIGH => self.serial.high(),
            IO_K0 => self.ports.k0.value(),
            IO_DFK0 => self.ports.dfk0,
            IO_K1 => self.ports.k1.value(),
            IO_R0..=IO_R3 => self.outputs[(addr - IO_R0) as usize],
            IO_R4 => self.r4,
            IO_P0..=IO_P3 => self.ports.p[(addr - IO_P0) as usize].value,
            IO_OSC => self.osc_control,
            IO_LCD => self.lcd.bits(),
            IO_CONTRAST => self.contrast,
            IO_SVD => self.svd & SVD_WRITABLE,
            IO_BUZZER_FREQ => self.buzzer.frequency_select,
            IO_BUZZER_CTRL => self.buzzer.control_value(),
            IO_TIMER_CTRL => 0,
            IO_STOPWATCH_CTRL => self.stopwatch.running as u8,
            IO_PTIMER_CTRL => self.prog_timer.running as u8,
            IO_PTIMER_CLOCK => self.prog_timer.clock_select,
            IO_SERIAL_CTRL => self.serial.control,
            IO_HEAVY_LOAD => self.heavy_load,
            IO_PORT_DIR => self.ports.direction,
            IO_PULLUP => self.ports.pullup,
            _ => 0,
        }
    }

    pub(super) fn read_io(&mut self, addr: u16) -> u8 {
        match addr {
            // Reading a factor register acknowledges it.
            IO_FACTOR_BASE..=IO_FACTOR_LAST => source_at(addr - IO_FACTOR_BASE)
                .map(|source| self.irq.take_factor(source))
                .unwrap_or(0),
            _ => self.io_value(addr),
        }
    }

    pub(super) fn write_io(&mut self, addr: u16, value: u8) {
        match addr {
            IO_MASK_BASE..=IO_MASK_LAST => {
                if let Some(source) = source_at(addr - IO_MASK_BASE) {
                    self.irq.set_mask(source, value);
                }
            }
            IO_RD_LOW => self.prog_timer.set_reload_nibble(false, value),
            IO_RD_HIGH => self.prog_timer.set_reload_nibble(true, value),
            IO_SD_LOW => self.serial.write_nibble(false, value, &mut self.irq),
            IO_SD_HIGH => self.serial.write_nibble(true, value, &mut self.irq),
            IO_DFK0 => self.ports.dfk0 = value,
            IO_R0..=IO_R3 => {
                let index = (addr - IO_R0) as usize;
                if self.outputs[index] != value {
                    self.outputs[index] = value;
                    self.bump_display();
                }
            }
            IO_R4 => {
                self.r4 = value;
                self.buzzer.set_r4(value);
            }
            IO_P0..=IO_P3 => {
                if self.ports.write_latch((addr - IO_P0) as usize, value) {
                    self.bump_display();
                }
            }
            IO_OSC => self.osc_control = value,
            IO_LCD => {
                let lcd = LcdControl::from_bits_truncate(value);
                if lcd != self.lcd {
                    self.lcd = lcd;
                    self.bump_display();
                }
            }
            IO_CONTRAST => self.contrast = value,
            IO_SVD => self.svd = value & SVD_WRITABLE,
            IO_BUZZER_FREQ => self.buzzer.set_frequency(value),
            IO_BUZZER_CTRL => self.buzzer.set_control(value),
            IO_TIMER_CTRL => {
                // WDRST is accepted but there is no watchdog to clear.
                if value & CTRL_RESET != 0 {
                    self.clock_timer.reset_counter();
                }
            }
            IO_STOPWATCH_CTRL => {
                if value & CTRL_RESET != 0 {
                    self.stopwatch.reset_count();
                }
                self.stopwatch.running = value & CTRL_RUN != 0;
            }
            IO_PTIMER_CTRL => {
                if value & CTRL_RESET != 0 {
                    self.prog_timer.restart();
                }
                self.prog_timer.running = value & CTRL_RUN != 0;
            }
            IO_PTIMER_CLOCK => self.prog_timer.clock_select = value & 0x7,
            IO_SERIAL_CTRL => self.serial.control = value,
            IO_HEAVY_LOAD => self.heavy_load = value,
            IO_PORT_DIR => {
                if self.ports.write_direction(value) {
                    self.bump_display();
                }
            }
            IO_PULLUP => {
                if self.ports.write_pullup(value) {
                    self.bump_display();
                }
            }
            // Factor, counter and input registers are read-only.
            _ => {}
        }
    }
}

#[inline]
fn source_at(offset: u16) -> Option<InterruptSource> {
    InterruptSource::from_index(offset as usize)
}
