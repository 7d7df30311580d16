use mimic_clock::{Clock, RealClock, Timers, VirtualClock};
use mimic_common_config::TimerConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Polls once a second and remembers when it last ran.
struct Poller {
    clock: Arc<dyn Clock>,
    polls: Arc<AtomicU64>,
    last_poll_ms: Arc<AtomicU64>,
}

impl Poller {
    fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            polls: Arc::new(AtomicU64::new(0)),
            last_poll_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn start(&self) -> mimic_common_core::Result<mimic_clock::TimerId> {
        let clock = Arc::clone(&self.clock);
        let polls = Arc::clone(&self.polls);
        let last = Arc::clone(&self.last_poll_ms);
        self.clock.schedule_repeating(
            Box::new(move || {
                polls.fetch_add(1, Ordering::SeqCst);
                last.store(clock.now_ms(), Ordering::SeqCst);
            }),
            Duration::from_secs(1),
        )
    }

    fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[test]
fn test_poller_against_virtual_clock() {
    let clock = VirtualClock::new(10_000);
    let poller = Poller::new(Arc::new(clock.clone()));
    poller.start().unwrap();

    clock.advance_by(Duration::from_millis(2_500));
    assert_eq!(poller.polls(), 2);
    assert_eq!(poller.last_poll_ms.load(Ordering::SeqCst), 12_000);
    assert_eq!(clock.now_ms(), 12_500);
}

#[test]
fn test_poller_against_switchable_timers() {
    let timers = Arc::new(Timers::new(TimerConfig {
        fake_by_default: true,
        ..TimerConfig::default()
    }));
    let poller = Poller::new(timers.clone());
    let id = poller.start().unwrap();

    timers.advance_timers_by_time(Duration::from_secs(3600)).unwrap();
    assert_eq!(poller.polls(), 3600);

    assert!(timers.cancel(id));
    timers.advance_timers_by_time(Duration::from_secs(3600)).unwrap();
    assert_eq!(poller.polls(), 3600);
}

#[tokio::test(start_paused = true)]
async fn test_poller_against_real_clock() {
    let clock = RealClock::new();
    let poller = Poller::new(Arc::new(clock.clone()));
    let id = poller.start().unwrap();

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(poller.polls(), 3);

    clock.cancel(id);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(poller.polls(), 3);
}

#[test]
fn test_switching_modes_keeps_callers_working() {
    let timers = Arc::new(Timers::default());
    timers.use_fake_timers();
    let poller = Poller::new(timers.clone());
    poller.start().unwrap();

    timers.use_real_timers();
    timers.use_fake_timers();
    timers.advance_timers_by_time(Duration::from_secs(5)).unwrap();
    assert_eq!(poller.polls(), 0);
    assert_eq!(timers.timer_count(), 0);
}
