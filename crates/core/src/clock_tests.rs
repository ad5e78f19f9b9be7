use super::*;

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new();
    let start = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_millis(500));

    assert_eq!(clock.now(), start + Duration::from_millis(500));
    assert_eq!(clock.epoch_ms(), start_ms + 500);
}

#[test]
fn fake_clock_set_overrides_instant() {
    let clock = FakeClock::new();
    let target = Instant::now() + Duration::from_secs(60);
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn system_clock_epoch_ms_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}
