use bitflags::bitflags;

/// Buzzer frequencies for BZFQ = 0..7, in Hz.
pub const BUZZER_FREQUENCIES_HZ: [f32; 8] = [
    4096.0, 3276.8, 2730.7, 2340.6, 2048.0, 1638.4, 1365.3, 1170.3,
];

/// One-shot pulse widths in OSC1 ticks (31.25 ms and 125 ms).
const ONE_SHOT_SHORT_TICKS: u32 = 1024;
pub(crate) const ONE_SHOT_LONG_TICKS: u32 = 4096;

/// Envelope cycle lengths in OSC1 ticks (0.5 s and 1 s).
const ENVELOPE_SHORT_TICKS: u32 = 16_384;
const ENVELOPE_LONG_TICKS: u32 = 32_768;

/// Envelope loudness steps above silence.
const ENVELOPE_LEVELS: u8 = 7;

bitflags! {
    /// Buzzer control register (F75).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BuzzerControl: u8 {
        /// Envelope enabled.
        const ENVON = 0b0001;
        /// Envelope cycle select: 0 = 0.5 s, 1 = 1 s.
        const ENVRT = 0b0010;
        /// One-shot width select: 0 = 31.25 ms, 1 = 125 ms.
        const SHTPW = 0b0100;
        /// One-shot trigger on write, busy on read.
        const BZSHOT = 0b1000;
    }
}

/// Logical buzzer output, delivered to the audio collaborator on change.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuzzerEvent {
    pub on: bool,
    pub frequency_hz: f32,
    /// Loudness in `0.0..=1.0`.
    pub gain: f32,
}

impl BuzzerEvent {
    pub const SILENT: BuzzerEvent = BuzzerEvent {
        on: false,
        frequency_hz: BUZZER_FREQUENCIES_HZ[0],
        gain: 0.0,
    };
}

impl Default for BuzzerEvent {
    fn default() -> Self {
        Self::SILENT
    }
}

/// Push-style callback receiving buzzer changes.
pub type BuzzerListener = Box<dyn FnMut(BuzzerEvent) + Send>;

/// Piezo buzzer driver: frequency divider, one-shot pulse and envelope.
#[derive(Clone, Debug)]
pub(crate) struct Buzzer {
    /// BZFQ (F74).
    pub(crate) frequency_select: u8,
    /// ENVON/ENVRT/SHTPW; BZSHOT is never stored.
    pub(crate) control: BuzzerControl,
    /// R43 level; the buzzer sounds while it is low.
    pub(crate) r43_high: bool,
    pub(crate) one_shot_remaining: u32,
    pub(crate) envelope_level: u8,
    pub(crate) envelope_counter: u32,
    /// Tone state seen by the last update, for off->on detection.
    pub(crate) sounding: bool,
    output: BuzzerEvent,
    changed: bool,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub(crate) fn new() -> Self {
        Self {
            frequency_select: 0,
            control: BuzzerControl::empty(),
            r43_high: true,
            one_shot_remaining: 0,
            envelope_level: ENVELOPE_LEVELS,
            envelope_counter: 0,
            sounding: false,
            output: BuzzerEvent::SILENT,
            changed: false,
        }
    }

    /// Return to power-on state. A change is reported if the buzzer was
    /// sounding.
    pub(crate) fn reset(&mut self) {
        let output = self.output;
        *self = Self::new();
        self.output = output;
        self.update();
    }

    #[inline]
    fn tone_on(&self) -> bool {
        !self.r43_high || self.one_shot_remaining > 0
    }

    #[inline]
    pub(crate) fn envelope_step_ticks(&self) -> u32 {
        let cycle = if self.control.contains(BuzzerControl::ENVRT) {
            ENVELOPE_LONG_TICKS
        } else {
            ENVELOPE_SHORT_TICKS
        };
        cycle / ENVELOPE_LEVELS as u32
    }

    pub(crate) fn frequency_hz(&self) -> f32 {
        BUZZER_FREQUENCIES_HZ[(self.frequency_select & 0x7) as usize]
    }

    pub(crate) fn set_frequency(&mut self, value: u8) {
        self.frequency_select = value & 0x7;
        self.update();
    }

    /// F75 read-back: stored bits plus BZSHOT while a pulse is running.
    pub(crate) fn control_value(&self) -> u8 {
        let mut value = self.control;
        value.set(BuzzerControl::BZSHOT, self.one_shot_remaining > 0);
        value.bits()
    }

    pub(crate) fn set_control(&mut self, value: u8) {
        let value = BuzzerControl::from_bits_truncate(value);
        self.control = value - BuzzerControl::BZSHOT;
        if value.contains(BuzzerControl::BZSHOT) && self.one_shot_remaining == 0 {
            self.one_shot_remaining = if value.contains(BuzzerControl::SHTPW) {
                ONE_SHOT_LONG_TICKS
            } else {
                ONE_SHOT_SHORT_TICKS
            };
        }
        self.update();
    }

    /// R4 output register; bit 3 is R43.
    pub(crate) fn set_r4(&mut self, value: u8) {
        self.r43_high = value & 0x8 != 0;
        self.update();
    }

    /// Advance by one OSC1 tick.
    pub(crate) fn tick(&mut self) {
        if self.one_shot_remaining > 0 {
            self.one_shot_remaining -= 1;
            if self.one_shot_remaining == 0 {
                self.update();
            }
        }

        if self.sounding
            && self.control.contains(BuzzerControl::ENVON)
            && self.envelope_level > 0
        {
            self.envelope_counter += 1;
            if self.envelope_counter >= self.envelope_step_ticks() {
                self.envelope_counter = 0;
                self.envelope_level -= 1;
                self.update();
            }
        }
    }

    /// Recompute the output event; restarts the envelope on an off->on
    /// transition of the tone.
    pub(crate) fn update(&mut self) {
        let on = self.tone_on();
        if on && !self.sounding {
            self.envelope_level = ENVELOPE_LEVELS;
            self.envelope_counter = 0;
        }
        self.sounding = on;

        let gain = if self.control.contains(BuzzerControl::ENVON) {
            self.envelope_level as f32 / ENVELOPE_LEVELS as f32
        } else {
            1.0
        };
        let audible = on && gain > 0.0;
        let event = BuzzerEvent {
            on: audible,
            frequency_hz: self.frequency_hz(),
            gain: if audible { gain } else { 0.0 },
        };
        if event != self.output {
            self.output = event;
            self.changed = true;
        }
    }

    #[inline]
    pub(crate) fn output(&self) -> BuzzerEvent {
        self.output
    }

    /// Return the output if it changed since the last call.
    pub(crate) fn take_change(&mut self) -> Option<BuzzerEvent> {
        if self.changed {
            self.changed = false;
            Some(self.output)
        } else {
            None
        }
    }
}
