use super::*;

/// NOP5 everywhere: the reset page just runs straight through.
fn nop_rom() -> Vec<u8> {
    [0xFF, 0xB0].repeat(0x2000)
}

#[test]
fn headless_run_stops_after_requested_time() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = RunnerConfig::builder().seconds(0.05).build();
    let start = Instant::now();
    run(config, &nop_rom()).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn stuck_pc_watch_tracks_last_position() {
    let machine = PetMachine::new(nop_rom(), MachineConfig::default());
    let mut watch = StuckPcWatch::default();
    watch.check(&machine);
    assert_eq!(watch.pc, Some(0x100));
    assert_eq!(watch.interrupts, 0);
}
