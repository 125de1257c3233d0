//! Snapshot capture and restore for [`PetMachine`].
use std::fmt::Display;

use super::PetMachine;
use crate::cpu::Flags;
use crate::machine::buzzer::{BuzzerControl, ONE_SHOT_LONG_TICKS};
use crate::machine::display::LcdControl;
use crate::machine::interrupt::InterruptSource;
use crate::machine::snapshot::{pack_nibbles, unpack_nibbles, Snapshot, SNAPSHOT_VERSION};
use crate::machine::timer::CLOCK_TIMER_PRESCALE;
use crate::{OSC1_HZ, RAM_SIZE, VRAM_SIZE};

const P_PORT_KEYS: [&str; 4] = ["ports.p0", "ports.p1", "ports.p2", "ports.p3"];
const R_KEYS: [&str; 4] = ["io.r0", "io.r1", "io.r2", "io.r3"];

fn key(prefix: &str, field: &str) -> String {
    format!("{}.{}", prefix, field)
}

/// Fill `out` from a packed blob, rejecting blobs of the wrong size.
fn restore_nibbles(snapshot: &Snapshot, name: &str, out: &mut [u8]) {
    if let Some(packed) = snapshot.bytes(name) {
        if packed.len() == out.len().div_ceil(2) {
            unpack_nibbles(packed, out);
        } else {
            log::warn!(
                "snapshot key '{}': {} bytes, expected {}; keeping default",
                name,
                packed.len(),
                out.len().div_ceil(2)
            );
        }
    }
}

fn restore_array<const N: usize>(snapshot: &Snapshot, name: &str, out: &mut [u8; N]) {
    if let Some(bytes) = snapshot.bytes(name) {
        if bytes.len() == N {
            for (slot, byte) in out.iter_mut().zip(bytes) {
                *slot = byte & 0xF;
            }
        } else {
            log::warn!(
                "snapshot key '{}': {} bytes, expected {}; keeping default",
                name,
                bytes.len(),
                N
            );
        }
    }
}

/// Take a counter from the snapshot only if it is below `limit`, the
/// value at which the peripheral would have wrapped it.
fn restore_counter<T>(value: Option<T>, name: &str, limit: T, out: &mut T)
where
    T: PartialOrd + Display + Copy,
{
    match value {
        Some(v) if v < limit => *out = v,
        Some(v) => log::warn!(
            "snapshot key '{}': {} out of range (limit {}); keeping default",
            name,
            v,
            limit
        ),
        None => {}
    }
}

impl PetMachine {
    /// Capture every piece of mutable machine state.
    ///
    /// RAM and VRAM are stored two nibbles per byte. The display
    /// generation and the queued serial output are host-side bookkeeping
    /// and are not part of the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let mut s = Snapshot::new();
        s.put_u32(Snapshot::VERSION_KEY, SNAPSHOT_VERSION);

        let regs = &self.cpu.regs;
        s.put_u8("cpu.a", regs.a);
        s.put_u8("cpu.b", regs.b);
        s.put_u16("cpu.x", regs.x);
        s.put_u16("cpu.y", regs.y);
        s.put_u8("cpu.sp", regs.sp);
        s.put_u16("cpu.pc", regs.pc);
        s.put_u8("cpu.np", regs.np);
        s.put_u8("cpu.flags", regs.flags.bits());
        s.put_bool("cpu.halted", self.cpu.halted);
        s.put_bool("cpu.in_reset", self.cpu.in_reset);
        s.put_bool("cpu.interrupt_hold", self.cpu.interrupt_hold);
        s.put_f64("clock.residual", self.clock.residual());

        let bus = &self.bus;
        s.put_bytes("ram", pack_nibbles(&bus.ram));
        s.put_bytes("vram", pack_nibbles(&bus.vram));

        s.put_bytes("irq.factors", bus.irq.factors.to_vec());
        s.put_bytes("irq.masks", bus.irq.masks.to_vec());
        let triggered = bus
            .irq
            .triggered
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &t)| acc | ((t as u8) << i));
        s.put_u8("irq.triggered", triggered);

        s.put_u16("timer.prescaler", bus.clock_timer.prescaler);
        s.put_u8("timer.counter", bus.clock_timer.counter);

        s.put_bool("stopwatch.running", bus.stopwatch.running);
        s.put_u32("stopwatch.accumulator", bus.stopwatch.accumulator);
        s.put_u8("stopwatch.swl", bus.stopwatch.swl);
        s.put_u8("stopwatch.swh", bus.stopwatch.swh);

        s.put_bool("ptimer.running", bus.prog_timer.running);
        s.put_u8("ptimer.data", bus.prog_timer.data);
        s.put_u8("ptimer.reload", bus.prog_timer.reload);
        s.put_u8("ptimer.clock_select", bus.prog_timer.clock_select);
        s.put_u32("ptimer.prescaler", bus.prog_timer.prescaler);

        s.put_u8("serial.data", bus.serial.data);
        s.put_u8("serial.write_mask", bus.serial.write_mask);
        s.put_u8("serial.control", bus.serial.control);

        let ports = &bus.ports;
        s.put_u8("ports.k0.driven", ports.k0.pins.driven);
        s.put_u8("ports.k0.levels", ports.k0.pins.levels);
        s.put_u8("ports.k1.driven", ports.k1.pins.driven);
        s.put_u8("ports.k1.levels", ports.k1.pins.levels);
        s.put_u8("ports.dfk0", ports.dfk0);
        s.put_u8("ports.direction", ports.direction);
        s.put_u8("ports.pullup", ports.pullup);
        for (prefix, port) in P_PORT_KEYS.iter().zip(ports.p.iter()) {
            s.put_u8(&key(prefix, "latch"), port.latch);
            s.put_u8(&key(prefix, "driven"), port.pins.driven);
            s.put_u8(&key(prefix, "levels"), port.pins.levels);
            if let Some(drive) = port.linked_drive {
                s.put_u8(&key(prefix, "linked"), drive);
            }
        }

        for (name, value) in R_KEYS.iter().zip(bus.outputs) {
            s.put_u8(name, value);
        }
        s.put_u8("io.r4", bus.r4);
        s.put_u8("io.osc", bus.osc_control);
        s.put_u8("io.lcd", bus.lcd.bits());
        s.put_u8("io.contrast", bus.contrast);
        s.put_u8("io.svd", bus.svd);
        s.put_u8("io.heavy_load", bus.heavy_load);

        let buzzer = &bus.buzzer;
        s.put_u8("buzzer.frequency", buzzer.frequency_select);
        s.put_u8("buzzer.control", buzzer.control.bits());
        s.put_u32("buzzer.one_shot", buzzer.one_shot_remaining);
        s.put_u8("buzzer.envelope_level", buzzer.envelope_level);
        s.put_u32("buzzer.envelope_counter", buzzer.envelope_counter);
        s.put_bool("buzzer.sounding", buzzer.sounding);

        let diag = self.diagnostics();
        s.put_u64("diag.instructions", diag.instructions);
        s.put_u64("diag.undefined_opcodes", diag.undefined_opcodes);
        s.put_u64("diag.interrupts", diag.interrupts);
        if let Some(vector) = diag.last_interrupt_vector {
            s.put_u8("diag.last_vector", vector);
        }
        for source in InterruptSource::ALL {
            s.put_u64(
                &format!("diag.triggers.{}", source.index()),
                diag.triggers(source),
            );
        }
        s.put_u64("diag.oscillator_ticks", diag.oscillator_ticks);
        s.put_u64("diag.clock_timer_ticks", diag.clock_timer_ticks);
        s.put_u64("diag.stopwatch_ticks", diag.stopwatch_ticks);
        s.put_u64("diag.prog_timer_ticks", diag.prog_timer_ticks);
        s.put_f64("diag.halted_cycles", diag.halted_cycles);

        s
    }

    /// Reset, then apply every key present in `snapshot`.
    ///
    /// Missing keys keep their reset value and mistyped ones are logged and
    /// skipped. Port values and buzzer output are recomputed afterwards;
    /// the display generation moves only if the frame differs from the one
    /// shown before the restore.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        match snapshot.version() {
            Some(version) if version > SNAPSHOT_VERSION => log::warn!(
                "restoring snapshot version {} with a version {} core; unknown keys are ignored",
                version,
                SNAPSHOT_VERSION
            ),
            None => log::warn!("restoring snapshot without a version key"),
            _ => {}
        }

        let before = self.bus.frame_nibbles();
        self.cpu.reset();
        self.bus.clear();
        self.clock.reset();

        self.restore_cpu(snapshot);
        self.restore_bus(snapshot);
        self.restore_diagnostics(snapshot);

        self.bus.ports.relatch();
        self.bus.buzzer.update();
        self.bus.bump_display_if_changed(before);
        self.flush_buzzer();
        log::info!("E0C6S46 state restored ({} keys)", snapshot.len());
    }

    fn restore_cpu(&mut self, s: &Snapshot) {
        let regs = &mut self.cpu.regs;
        if let Some(v) = s.u8("cpu.a") {
            regs.a = v & 0xF;
        }
        if let Some(v) = s.u8("cpu.b") {
            regs.b = v & 0xF;
        }
        if let Some(v) = s.u16("cpu.x") {
            regs.x = v & crate::cpu::INDEX_MASK;
        }
        if let Some(v) = s.u16("cpu.y") {
            regs.y = v & crate::cpu::INDEX_MASK;
        }
        if let Some(v) = s.u8("cpu.sp") {
            regs.sp = v;
        }
        if let Some(v) = s.u16("cpu.pc") {
            regs.pc = v & crate::cpu::PC_MASK;
        }
        if let Some(v) = s.u8("cpu.np") {
            regs.np = v & 0x1F;
        }
        if let Some(v) = s.u8("cpu.flags") {
            regs.flags = Flags::from_bits_truncate(v);
        }
        if let Some(v) = s.bool("cpu.halted") {
            self.cpu.halted = v;
        }
        if let Some(v) = s.bool("cpu.in_reset") {
            self.cpu.in_reset = v;
        }
        if let Some(v) = s.bool("cpu.interrupt_hold") {
            self.cpu.interrupt_hold = v;
        }
        if let Some(v) = s.f64("clock.residual") {
            self.clock.set_residual(v);
        }
    }

    fn restore_bus(&mut self, s: &Snapshot) {
        let bus = &mut self.bus;
        let mut ram = [0u8; RAM_SIZE];
        restore_nibbles(s, "ram", &mut ram);
        bus.ram = ram;
        let mut vram = [0u8; VRAM_SIZE];
        restore_nibbles(s, "vram", &mut vram);
        bus.vram = vram;

        restore_array(s, "irq.factors", &mut bus.irq.factors);
        restore_array(s, "irq.masks", &mut bus.irq.masks);
        if let Some(bits) = s.u8("irq.triggered") {
            for (i, slot) in bus.irq.triggered.iter_mut().enumerate() {
                *slot = bits & (1 << i) != 0;
            }
        }

        restore_counter(
            s.u16("timer.prescaler"),
            "timer.prescaler",
            CLOCK_TIMER_PRESCALE,
            &mut bus.clock_timer.prescaler,
        );
        if let Some(v) = s.u8("timer.counter") {
            bus.clock_timer.counter = v;
        }

        if let Some(v) = s.bool("stopwatch.running") {
            bus.stopwatch.running = v;
        }
        restore_counter(
            s.u32("stopwatch.accumulator"),
            "stopwatch.accumulator",
            OSC1_HZ,
            &mut bus.stopwatch.accumulator,
        );
        if let Some(v) = s.u8("stopwatch.swl") {
            bus.stopwatch.swl = v & 0xF;
        }
        if let Some(v) = s.u8("stopwatch.swh") {
            bus.stopwatch.swh = v & 0xF;
        }

        if let Some(v) = s.bool("ptimer.running") {
            bus.prog_timer.running = v;
        }
        if let Some(v) = s.u8("ptimer.data") {
            bus.prog_timer.data = v;
        }
        if let Some(v) = s.u8("ptimer.reload") {
            bus.prog_timer.reload = v;
        }
        if let Some(v) = s.u8("ptimer.clock_select") {
            bus.prog_timer.clock_select = v & 0x7;
        }
        // Only zero is valid while the external K13 clock is selected.
        let divider = bus.prog_timer.divider().max(1);
        restore_counter(
            s.u32("ptimer.prescaler"),
            "ptimer.prescaler",
            divider,
            &mut bus.prog_timer.prescaler,
        );

        if let Some(v) = s.u8("serial.data") {
            bus.serial.data = v;
        }
        if let Some(v) = s.u8("serial.write_mask") {
            bus.serial.write_mask = v & 0x3;
        }
        if let Some(v) = s.u8("serial.control") {
            bus.serial.control = v & 0xF;
        }

        let ports = &mut bus.ports;
        if let Some(v) = s.u8("ports.k0.driven") {
            ports.k0.pins.driven = v & 0xF;
        }
        if let Some(v) = s.u8("ports.k0.levels") {
            ports.k0.pins.levels = v & 0xF;
        }
        if let Some(v) = s.u8("ports.k1.driven") {
            ports.k1.pins.driven = v & 0xF;
        }
        if let Some(v) = s.u8("ports.k1.levels") {
            ports.k1.pins.levels = v & 0xF;
        }
        if let Some(v) = s.u8("ports.dfk0") {
            ports.dfk0 = v & 0xF;
        }
        if let Some(v) = s.u8("ports.direction") {
            ports.direction = v & 0xF;
        }
        if let Some(v) = s.u8("ports.pullup") {
            ports.pullup = v & 0xF;
        }
        for (prefix, port) in P_PORT_KEYS.iter().zip(ports.p.iter_mut()) {
            if let Some(v) = s.u8(&key(prefix, "latch")) {
                port.latch = v & 0xF;
            }
            if let Some(v) = s.u8(&key(prefix, "driven")) {
                port.pins.driven = v & 0xF;
            }
            if let Some(v) = s.u8(&key(prefix, "levels")) {
                port.pins.levels = v & 0xF;
            }
            if let Some(v) = s.u8(&key(prefix, "linked")) {
                port.linked_drive = Some(v & 0xF);
            }
        }

        for (name, slot) in R_KEYS.iter().zip(bus.outputs.iter_mut()) {
            if let Some(v) = s.u8(name) {
                *slot = v & 0xF;
            }
        }
        if let Some(v) = s.u8("io.r4") {
            bus.r4 = v & 0xF;
            bus.buzzer.r43_high = v & 0x8 != 0;
        }
        if let Some(v) = s.u8("io.osc") {
            bus.osc_control = v & 0xF;
        }
        if let Some(v) = s.u8("io.lcd") {
            bus.lcd = LcdControl::from_bits_truncate(v);
        }
        if let Some(v) = s.u8("io.contrast") {
            bus.contrast = v & 0xF;
        }
        if let Some(v) = s.u8("io.svd") {
            bus.svd = v & 0x7;
        }
        if let Some(v) = s.u8("io.heavy_load") {
            bus.heavy_load = v & 0xF;
        }

        let buzzer = &mut bus.buzzer;
        if let Some(v) = s.u8("buzzer.frequency") {
            buzzer.frequency_select = v & 0x7;
        }
        if let Some(v) = s.u8("buzzer.control") {
            buzzer.control = BuzzerControl::from_bits_truncate(v) - BuzzerControl::BZSHOT;
        }
        restore_counter(
            s.u32("buzzer.one_shot"),
            "buzzer.one_shot",
            ONE_SHOT_LONG_TICKS + 1,
            &mut buzzer.one_shot_remaining,
        );
        if let Some(v) = s.u8("buzzer.envelope_level") {
            buzzer.envelope_level = v.min(7);
        }
        let step = buzzer.envelope_step_ticks();
        restore_counter(
            s.u32("buzzer.envelope_counter"),
            "buzzer.envelope_counter",
            step,
            &mut buzzer.envelope_counter,
        );
        if let Some(v) = s.bool("buzzer.sounding") {
            buzzer.sounding = v;
        }
    }

    fn restore_diagnostics(&mut self, s: &Snapshot) {
        if let Some(v) = s.u64("diag.instructions") {
            self.cpu.instructions = v;
        }
        if let Some(v) = s.u64("diag.undefined_opcodes") {
            self.cpu.undefined_opcodes = v;
        }
        for source in InterruptSource::ALL {
            if let Some(v) = s.u64(&format!("diag.triggers.{}", source.index())) {
                self.bus.irq.trigger_counts[source.index()] = v;
            }
        }

        let diag = &mut self.bus.diagnostics;
        if let Some(v) = s.u64("diag.interrupts") {
            diag.interrupts = v;
        }
        if let Some(v) = s.u8("diag.last_vector") {
            diag.last_interrupt_vector = Some(v);
        }
        if let Some(v) = s.u64("diag.oscillator_ticks") {
            diag.oscillator_ticks = v;
        }
        if let Some(v) = s.u64("diag.clock_timer_ticks") {
            diag.clock_timer_ticks = v;
        }
        if let Some(v) = s.u64("diag.stopwatch_ticks") {
            diag.stopwatch_ticks = v;
        }
        if let Some(v) = s.u64("diag.prog_timer_ticks") {
            diag.prog_timer_ticks = v;
        }
        if let Some(v) = s.f64("diag.halted_cycles") {
            diag.halted_cycles = v;
        }
    }
}
