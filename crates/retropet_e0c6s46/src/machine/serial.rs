use std::collections::VecDeque;

use super::interrupt::{InterruptController, InterruptSource};

const LOW_WRITTEN: u8 = 0b01;
const HIGH_WRITTEN: u8 = 0b10;

/// Transmitted bytes kept for the host; older ones are dropped once a
/// host stops draining.
pub(crate) const OUTPUT_QUEUE_LIMIT: usize = 4096;

/// Serial interface data register (SD0..SD7, F30/F31).
///
/// The firmware transmits by writing both halves of the data register;
/// once both nibbles have been written since the last emission the byte
/// is queued for the host and the shift-complete factor (ISIO) is raised.
#[derive(Clone, Debug, Default)]
pub(crate) struct Serial {
    pub(crate) data: u8,
    /// Bit 0: low nibble written, bit 1: high nibble written.
    pub(crate) write_mask: u8,
    pub(crate) control: u8,
    pub(crate) output: VecDeque<u8>,
    /// Set once the queue drops a byte; cleared by a drain.
    overflowed: bool,
}

impl Serial {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn low(&self) -> u8 {
        self.data & 0xF
    }

    #[inline]
    pub(crate) fn high(&self) -> u8 {
        self.data >> 4
    }

    pub(crate) fn write_nibble(&mut self, high: bool, value: u8, irq: &mut InterruptController) {
        let value = value & 0xF;
        if high {
            self.data = (self.data & 0x0F) | (value << 4);
            self.write_mask |= HIGH_WRITTEN;
        } else {
            self.data = (self.data & 0xF0) | value;
            self.write_mask |= LOW_WRITTEN;
        }

        if self.write_mask == LOW_WRITTEN | HIGH_WRITTEN {
            self.write_mask = 0;
            log::trace!("E0C6S46 serial out: 0x{:02X}", self.data);
            if self.output.len() >= OUTPUT_QUEUE_LIMIT {
                self.output.pop_front();
                if !self.overflowed {
                    log::warn!(
                        "E0C6S46 serial output not drained, dropping oldest bytes past {}",
                        OUTPUT_QUEUE_LIMIT
                    );
                }
                self.overflowed = true;
            }
            self.output.push_back(self.data);
            irq.raise(InterruptSource::Serial, 0x1);
        }
    }

    /// Latch a byte received from the peer.
    pub(crate) fn receive(&mut self, byte: u8, irq: &mut InterruptController) {
        log::trace!("E0C6S46 serial in: 0x{:02X}", byte);
        self.data = byte;
        irq.raise(InterruptSource::Serial, 0x1);
    }

    pub(crate) fn drain(&mut self) -> Vec<u8> {
        self.overflowed = false;
        self.output.drain(..).collect()
    }
}
