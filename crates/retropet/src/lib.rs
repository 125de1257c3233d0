use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

use retropet_e0c6s46::{BuzzerEvent, Flags, MachineConfig, PetMachine, SharedPetMachine};

/// Host-side settings for a headless run.
#[derive(Clone, Debug, TypedBuilder)]
pub struct RunnerConfig {
    #[builder(default)]
    pub machine: MachineConfig,
    /// Stop after this much emulated wall time; run forever when `None`.
    #[builder(default, setter(strip_option))]
    pub seconds: Option<f64>,
    /// Length of one emulation batch.
    #[builder(default = Duration::from_millis(10))]
    pub batch: Duration,
    /// Lag beyond which the pacing loop stops executing instructions and
    /// fast-forwards the oscillator instead.
    #[builder(default = Duration::from_millis(250))]
    pub max_lag: Duration,
    /// How often the display poller looks for a new frame.
    #[builder(default = Duration::from_millis(16))]
    pub display_poll: Duration,
}

/// Run `rom` headless: a pacing thread executes the core in real time, a
/// buzzer thread receives tone changes and a display thread picks up new
/// frames. Everything is reported through `log`.
pub fn run(config: RunnerConfig, rom: &[u8]) -> Result<()> {
    let machine = PetMachine::new(rom.to_vec(), config.machine.clone());
    let shared = SharedPetMachine::new(machine);
    let stop = Arc::new(AtomicBool::new(false));

    let (sender, receiver) = mpsc::channel::<BuzzerEvent>();
    shared.set_buzzer_listener(move |event| {
        // The buzzer thread only goes away on shutdown.
        let _ = sender.send(event);
    });
    let buzzer = spawn("retropet_buzzer", move || buzzer_loop(receiver))?;

    let display = {
        let shared = shared.clone();
        let stop = stop.clone();
        let poll = config.display_poll;
        spawn("retropet_display", move || display_loop(shared, stop, poll))?
    };

    let pacer = {
        let shared = shared.clone();
        let stop = stop.clone();
        let config = config.clone();
        spawn("retropet_cpu", move || pacing_loop(shared, stop, config))?
    };

    join(pacer, "retropet_cpu")?;
    stop.store(true, Ordering::Release);
    join(display, "retropet_display")?;

    // Dropping the listener closes the channel and ends the buzzer thread.
    shared.with(|machine| machine.clear_buzzer_listener());
    join(buzzer, "retropet_buzzer")?;

    let diagnostics = shared.diagnostics();
    info!(
        "Finished: {} instructions, {} interrupts, {} OSC1 ticks, {} undefined opcodes",
        diagnostics.instructions,
        diagnostics.interrupts,
        diagnostics.oscillator_ticks,
        diagnostics.undefined_opcodes
    );
    Ok(())
}

fn spawn<F>(name: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(body)
        .with_context(|| format!("Failed to spawn {} thread", name))
}

fn join(handle: JoinHandle<()>, name: &str) -> Result<()> {
    handle
        .join()
        .map_err(|_| anyhow!("{} thread panicked", name))
}

/// Keeps emulated time in step with the host clock.
fn pacing_loop(shared: SharedPetMachine, stop: Arc<AtomicBool>, config: RunnerConfig) {
    let clock_hz = config.machine.clock_hz as f64;
    let cycles_per_tick = shared.with(|machine| machine.clock().cycles_per_tick());
    let batch_cycles = clock_hz * config.batch.as_secs_f64();
    let max_lag_cycles = clock_hz * config.max_lag.as_secs_f64();
    let total_cycles = config.seconds.map(|seconds| seconds * clock_hz);

    let start = Instant::now();
    let mut emulated = 0.0;
    let mut watchdog = StuckPcWatch::default();
    let mut last_watch = Instant::now();

    while !stop.load(Ordering::Acquire) {
        if total_cycles.is_some_and(|total| emulated >= total) {
            break;
        }

        let due = start.elapsed().as_secs_f64() * clock_hz;
        let lag = due - emulated;
        if lag > max_lag_cycles {
            let ticks = (lag / cycles_per_tick) as u64;
            let applied = shared.fast_forward_oscillator(ticks);
            emulated += applied as f64 * cycles_per_tick;
            warn!(
                "Running {:.0} ms behind, fast-forwarded {} OSC1 ticks",
                lag / clock_hz * 1000.0,
                applied
            );
            continue;
        }

        emulated += shared.run_batch(batch_cycles);

        let serial = shared.drain_serial_output();
        if !serial.is_empty() {
            trace!("Serial out: {:02X?}", serial);
        }

        if last_watch.elapsed() >= Duration::from_secs(1) {
            last_watch = Instant::now();
            shared.with(|machine| watchdog.check(machine));
        }

        let ahead = (emulated - start.elapsed().as_secs_f64() * clock_hz) / clock_hz;
        if ahead > 0.0 {
            thread::sleep(Duration::from_secs_f64(ahead));
        }
    }
}

/// Warns when the PC stops moving while the core is awake and no
/// interrupt arrives to move it.
#[derive(Default)]
struct StuckPcWatch {
    pc: Option<u16>,
    interrupts: u64,
}

impl StuckPcWatch {
    fn check(&mut self, machine: &PetMachine) {
        let pc = machine.registers().pc;
        let interrupts = machine.diagnostics().interrupts;
        if self.pc == Some(pc) && self.interrupts == interrupts && !machine.is_halted() {
            warn!(
                "PC stuck at 0x{:04X} for a second with no interrupts (I={})",
                pc,
                machine.registers().flag(Flags::I)
            );
        }
        self.pc = Some(pc);
        self.interrupts = interrupts;
    }
}

fn buzzer_loop(receiver: Receiver<BuzzerEvent>) {
    for event in receiver {
        if event.on {
            info!(
                "Buzzer on: {:.1} Hz, gain {:.2}",
                event.frequency_hz, event.gain
            );
        } else {
            info!("Buzzer off");
        }
    }
}

fn display_loop(shared: SharedPetMachine, stop: Arc<AtomicBool>, poll: Duration) {
    let mut last_seen = shared.display_generation();
    while !stop.load(Ordering::Acquire) {
        if let Some(frame) = shared.display_if_changed(last_seen) {
            last_seen = frame.generation;
            let lit = frame.vram().iter().map(|n| n.count_ones()).sum::<u32>();
            debug!(
                "Frame {}: {} segments lit, P/R {:X?}",
                frame.generation,
                lit,
                frame.trailing()
            );
        }
        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests;
