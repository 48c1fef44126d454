use std::time::{Duration, Instant};

/// Monotonic time source for the acquisition loop.
pub trait Clock: Send {
    fn now(&self) -> Instant;

    /// Blocks until `deadline`. Returns immediately if it already passed.
    fn sleep_until(&self, deadline: Instant);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) {
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Paces frame acquisition at a fixed rate against a monotonic clock.
///
/// Each call to [`CapturePacer::wait`] blocks until the next due instant.
/// When the caller falls behind by more than one interval, the missed slots
/// are dropped and the schedule restarts from the current time, so a slow
/// read is never followed by a burst of back-to-back reads.
pub struct CapturePacer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl CapturePacer {
    /// A rate with no representable interval (zero, negative, NaN, or so
    /// small the interval overflows) falls back to 1 fps.
    pub fn new(rate_fps: f64) -> Self {
        let interval = Some(rate_fps)
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f64(1.0 / fps).ok())
            .unwrap_or(Duration::from_secs(1));
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next slot and returns the instant it was due.
    pub fn wait(&mut self, clock: &dyn Clock) -> Instant {
        let now = clock.now();
        let due = match self.next_due {
            None => now,
            Some(due) if now > due + self.interval => now,
            Some(due) => due,
        };
        clock.sleep_until(due);
        self.next_due = Some(due + self.interval);
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    /// Manual clock: `sleep_until` jumps forward instead of blocking.
    struct FakeClock {
        now: Cell<Instant>,
        sleeps: Cell<usize>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Cell::new(Instant::now()),
                sleeps: Cell::new(0),
            }
        }

        fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.now.get()
        }

        fn sleep_until(&self, deadline: Instant) {
            if deadline > self.now.get() {
                self.sleeps.set(self.sleeps.get() + 1);
                self.now.set(deadline);
            }
        }
    }

    #[test]
    fn test_first_wait_is_immediate() {
        let clock = FakeClock::new();
        let start = clock.now();
        let mut pacer = CapturePacer::new(10.0);
        assert_eq!(pacer.wait(&clock), start);
        assert_eq!(clock.sleeps.get(), 0);
    }

    #[test]
    fn test_waits_one_interval_between_slots() {
        let clock = FakeClock::new();
        let start = clock.now();
        let mut pacer = CapturePacer::new(10.0);
        pacer.wait(&clock);
        let second = pacer.wait(&clock);
        let third = pacer.wait(&clock);
        assert_eq!(second - start, Duration::from_millis(100));
        assert_eq!(third - start, Duration::from_millis(200));
        assert_eq!(clock.sleeps.get(), 2);
    }

    #[test]
    fn test_slight_lateness_keeps_schedule() {
        let clock = FakeClock::new();
        let start = clock.now();
        let mut pacer = CapturePacer::new(10.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_millis(150));
        // Due at +100ms, now +150ms: still within one interval, no sleep.
        let due = pacer.wait(&clock);
        assert_eq!(due - start, Duration::from_millis(100));
        let next = pacer.wait(&clock);
        assert_eq!(next - start, Duration::from_millis(200));
    }

    #[test]
    fn test_falling_behind_drops_missed_slots() {
        let clock = FakeClock::new();
        let start = clock.now();
        let mut pacer = CapturePacer::new(10.0);
        pacer.wait(&clock);
        clock.advance(Duration::from_millis(550));
        let due = pacer.wait(&clock);
        assert_eq!(due - start, Duration::from_millis(550));
        let next = pacer.wait(&clock);
        assert_eq!(next - start, Duration::from_millis(650));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(1e-30)]
    #[case(f64::MIN_POSITIVE)]
    fn test_invalid_rate_falls_back_to_one_fps(#[case] fps: f64) {
        assert_eq!(CapturePacer::new(fps).interval(), Duration::from_secs(1));
    }
}
