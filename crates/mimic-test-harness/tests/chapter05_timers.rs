//! Real and fake timers, the fake sleep pattern and a ticking counter.

use mimic_clock::{Clock, Timers};
use mimic_common_config::MimicConfig;
use mimic_test_harness::fixtures::{sleep, Counter};
use mimic_test_harness::TestContext;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counting_callback() -> (Arc<AtomicU32>, mimic_clock::TimerCallback) {
    let count = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&count);
    (
        count,
        Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

#[tokio::test(start_paused = true)]
async fn test_real_timer_fires_after_delay() {
    let timers = Timers::default();
    let (count, callback) = counting_callback();
    timers.schedule_once(callback, Duration::from_secs(1)).unwrap();

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_one_hour_passes_instantly() {
    let cx = TestContext::new();
    cx.timers().use_fake_timers();
    let (count, callback) = counting_callback();
    cx.clock()
        .schedule_repeating(callback, Duration::from_secs(1))
        .unwrap();

    let fired = cx
        .timers()
        .advance_timers_by_time(Duration::from_secs(60 * 60))
        .unwrap();
    assert_eq!(fired, 3600);
    assert_eq!(count.load(Ordering::SeqCst), 3600);
    assert_eq!(cx.clock().now_ms(), 3_600_000);
}

#[tokio::test]
async fn test_fake_sleep() {
    let cx = TestContext::new();
    cx.timers().use_fake_timers();

    let nap = sleep(&*cx.clock(), Duration::from_secs(5)).unwrap();
    assert_eq!(cx.timers().timer_count(), 1);

    cx.timers()
        .advance_timers_by_time(Duration::from_secs(5))
        .unwrap();
    nap.await;
    assert_eq!(cx.timers().timer_count(), 0);
}

#[test]
fn test_counter_ticks_through_spy() {
    let cx = TestContext::new();
    cx.timers().use_fake_timers();
    let counter = Counter::new(cx.clock());
    let tick = cx.track(counter.tick.spy());

    counter.start().unwrap();
    cx.timers()
        .advance_timers_by_time(Duration::from_secs(60 * 60))
        .unwrap();

    assert_eq!(tick.call_count(), 3600);
    assert_eq!(counter.count(), 3600);

    counter.stop();
    assert_eq!(counter.count(), 0);
    cx.timers()
        .advance_timers_by_time(Duration::from_secs(10))
        .unwrap();
    assert_eq!(tick.call_count(), 3600);
}

#[test]
fn test_mocked_tick_stops_counting() {
    let cx = TestContext::new();
    cx.timers().use_fake_timers();
    let counter = Counter::new(cx.clock());
    let tick = cx.track(counter.tick.mock_inert());

    counter.start().unwrap();
    cx.timers()
        .advance_timers_by_time(Duration::from_secs(30))
        .unwrap();
    assert_eq!(tick.call_count(), 30);
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_run_all_and_only_pending() {
    let mut config = MimicConfig::default();
    config.timers.fake_by_default = true;
    let cx = TestContext::with_config(config).unwrap();
    let clock = cx.clock();

    let (count, callback) = counting_callback();
    clock.schedule_once(callback, Duration::from_secs(3)).unwrap();
    let (_, callback) = counting_callback();
    clock
        .schedule_repeating(callback, Duration::from_millis(500))
        .unwrap();

    assert_eq!(cx.timers().run_only_pending_timers(), Ok(2));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(cx.timers().timer_count(), 1);

    cx.timers().clear_all_timers().unwrap();
    assert_eq!(cx.timers().run_all_timers(), Ok(0));
}

proptest! {
    #[test]
    fn prop_counter_counts_whole_seconds(steps in proptest::collection::vec(0u64..5_000, 1..8)) {
        let cx = TestContext::new();
        cx.timers().use_fake_timers();
        let counter = Counter::new(cx.clock());
        counter.start().unwrap();

        let mut elapsed = 0;
        for step in steps {
            cx.timers().advance_timers_by_time(Duration::from_millis(step)).unwrap();
            elapsed += step;
            prop_assert_eq!(counter.count(), elapsed / 1000);
        }
    }
}
