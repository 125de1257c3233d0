use super::interrupt::{InterruptController, InterruptSource};

/// Externally visible port of the chip.
///
/// K0 and K1 are input-only button ports; P0..P3 are bidirectional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    K0,
    K1,
    P0,
    P1,
    P2,
    P3,
}

impl Port {
    /// Index of a bidirectional port (P0..P3).
    pub(crate) fn p_index(self) -> Option<usize> {
        match self {
            Port::P0 => Some(0),
            Port::P1 => Some(1),
            Port::P2 => Some(2),
            Port::P3 => Some(3),
            Port::K0 | Port::K1 => None,
        }
    }
}

/// Pins per port.
const PIN_COUNT: u8 = 4;

/// Externally forced pin levels. `driven` selects which pins are forced,
/// `levels` holds their levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PinOverrides {
    pub(crate) driven: u8,
    pub(crate) levels: u8,
}

impl PinOverrides {
    fn set(&mut self, pin: u8, high: bool) {
        let bit = 1 << pin;
        self.driven |= bit;
        if high {
            self.levels |= bit;
        } else {
            self.levels &= !bit;
        }
    }

    fn release(&mut self, pin: u8) {
        let bit = 1 << pin;
        self.driven &= !bit;
        self.levels &= !bit;
    }

    /// Overlay forced pins on an undriven value.
    #[inline]
    fn apply(&self, undriven: u8) -> u8 {
        ((undriven & !self.driven) | (self.levels & self.driven)) & 0xF
    }
}

/// Input port K0x/K1x with a fixed pull-up configuration.
#[derive(Clone, Debug, Default)]
pub(crate) struct InputPort {
    pub(crate) pullup: u8,
    pub(crate) pins: PinOverrides,
}

impl InputPort {
    fn new(pullup: u8) -> Self {
        Self {
            pullup: pullup & 0xF,
            pins: PinOverrides::default(),
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> u8 {
        self.pins.apply(self.pullup)
    }
}

/// Bidirectional port Px.
#[derive(Clone, Debug, Default)]
pub(crate) struct IoPort {
    /// Output latch written by the CPU.
    pub(crate) latch: u8,
    pub(crate) pins: PinOverrides,
    /// Value driven by a linked peer machine while this port is an input.
    pub(crate) linked_drive: Option<u8>,
    /// Resolved pin value as read back by the CPU.
    pub(crate) value: u8,
}

impl IoPort {
    fn resolve(&self, output: bool, pulled_up: bool) -> u8 {
        if output {
            return self.latch & 0xF;
        }
        let undriven = match self.linked_drive {
            Some(level) => level & 0xF,
            None if pulled_up => 0xF,
            None => 0x0,
        };
        self.pins.apply(undriven)
    }
}

/// K0, K1, P0..P3 plus the direction (IOC, F7D) and pull-up (PUP, F7E)
/// control registers.
#[derive(Clone, Debug)]
pub(crate) struct Ports {
    pub(crate) k0: InputPort,
    pub(crate) k1: InputPort,
    /// DFK0 input comparison register (F41). Stored for read-back only;
    /// K0 factors are always raised on falling edges.
    pub(crate) dfk0: u8,
    pub(crate) p: [IoPort; 4],
    pub(crate) direction: u8,
    pub(crate) pullup: u8,
    port3_dedicated: bool,
}

impl Ports {
    pub(crate) const PULLUP_RESET: u8 = 0xF;

    pub(crate) fn new(k0_pullup: u8, k1_pullup: u8, port3_dedicated: bool) -> Self {
        let mut ports = Self {
            k0: InputPort::new(k0_pullup),
            k1: InputPort::new(k1_pullup),
            dfk0: 0xF,
            p: Default::default(),
            direction: 0,
            pullup: Self::PULLUP_RESET,
            port3_dedicated,
        };
        ports.relatch();
        ports
    }

    /// Reset to power-on state, keeping the pull-up configuration.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.k0.pullup, self.k1.pullup, self.port3_dedicated);
    }

    #[inline]
    fn is_output(&self, index: usize) -> bool {
        (index == 3 && self.port3_dedicated) || self.direction & (1 << index) != 0
    }

    /// Recompute every P port value from latch, direction, pull-up and
    /// external drive. Returns true if any value changed.
    pub(crate) fn relatch(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.p.len() {
            let output = self.is_output(index);
            let pulled_up = self.pullup & (1 << index) != 0;
            let value = self.p[index].resolve(output, pulled_up);
            if value != self.p[index].value {
                self.p[index].value = value;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn p_values(&self) -> [u8; 4] {
        [self.p[0].value, self.p[1].value, self.p[2].value, self.p[3].value]
    }

    pub(crate) fn write_latch(&mut self, index: usize, value: u8) -> bool {
        self.p[index].latch = value & 0xF;
        self.relatch()
    }

    pub(crate) fn write_direction(&mut self, value: u8) -> bool {
        self.direction = value & 0xF;
        self.relatch()
    }

    pub(crate) fn write_pullup(&mut self, value: u8) -> bool {
        self.pullup = value & 0xF;
        self.relatch()
    }

    /// Force a pin level. For K ports, returns the falling-edge bits so the
    /// caller can feed K13 to the programmable timer.
    pub(crate) fn set_pin(
        &mut self,
        port: Port,
        pin: u8,
        level: Option<bool>,
        irq: &mut InterruptController,
    ) -> PinChange {
        if pin >= PIN_COUNT {
            log::debug!("E0C6S46: pin {} ignored on port {:?}", pin, port);
            return PinChange::default();
        }
        let (input, source) = match port {
            Port::K0 => (&mut self.k0, InterruptSource::K0),
            Port::K1 => (&mut self.k1, InterruptSource::K1),
            _ => {
                if let Some(index) = port.p_index() {
                    match level {
                        Some(high) => self.p[index].pins.set(pin, high),
                        None => self.p[index].pins.release(pin),
                    }
                }
                return PinChange {
                    falling: 0,
                    p_changed: self.relatch(),
                };
            }
        };

        let before = input.value();
        match level {
            Some(high) => input.pins.set(pin, high),
            None => input.pins.release(pin),
        }
        let falling = before & !input.value();
        irq.raise(source, falling);
        PinChange {
            falling,
            p_changed: false,
        }
    }

    pub(crate) fn set_linked_drive(&mut self, index: usize, drive: Option<u8>) -> bool {
        self.p[index].linked_drive = drive.map(|value| value & 0xF);
        self.relatch()
    }
}

/// Outcome of a pin update.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PinChange {
    /// K-port bits that went from high to low.
    pub(crate) falling: u8,
    /// Whether any P-port value changed.
    pub(crate) p_changed: bool,
}
