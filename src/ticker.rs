use std::thread;
use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;

/// Recurring tick deadline generator. The session thread arms it, then
/// blocks on `wait()` once per tick; because the same thread also runs the
/// tick handler, ticks can never overlap.
pub struct Ticker {
    interval: Duration,
    high_precision: bool,
    next_deadline: Option<Instant>,
    sleeper: SpinSleeper,
}

impl Ticker {
    pub fn new() -> Self {
        Ticker {
            interval: Duration::from_millis(0),
            high_precision: true,
            next_deadline: None,
            sleeper: SpinSleeper::default(),
        }
    }

    pub fn arm(&mut self, interval_ms: u64, high_precision: bool) {
        self.interval = Duration::from_millis(interval_ms);
        self.high_precision = high_precision;
        self.next_deadline = Some(Instant::now() + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_deadline = None;
    }

    pub fn armed(&self) -> bool {
        self.next_deadline.is_some()
    }

    /// sleep until the next tick is due; returns false when disarmed
    pub fn wait(&mut self) -> bool {
        let deadline = match self.next_deadline {
            Some(d) => d,
            None => return false,
        };
        let now = Instant::now();
        if deadline > now {
            if self.high_precision {
                self.sleeper.sleep(deadline - now);
            } else {
                thread::sleep(deadline - now);
            }
        }
        // a late tick reschedules from now; the pacing loop absorbs the slip
        let now = Instant::now();
        let mut next = deadline + self.interval;
        if next < now {
            next = now + self.interval;
        }
        self.next_deadline = Some(next);
        true
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}
