use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic now-in-milliseconds. Production uses the std implementation
/// over `Instant`; tests drive pacing deterministically through a manually
/// advanced fake.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

pub struct StdTimeSource {
    origin: Instant,
}

impl StdTimeSource {
    pub fn new() -> Self {
        StdTimeSource {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StdTimeSource {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// fake time source for testing pacing without sleeping. `auto_advance_ms`
/// moves time forward on every query, which is what lets a test run the
/// full-speed catch-up loop to its wall-clock ceiling
pub struct FakeTimeSource {
    now: Cell<u64>,
    auto_advance_ms: Cell<u64>,
}

impl FakeTimeSource {
    pub fn new() -> Rc<Self> {
        Rc::new(FakeTimeSource {
            now: Cell::new(0),
            auto_advance_ms: Cell::new(0),
        })
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set_auto_advance(&self, ms: u64) {
        self.auto_advance_ms.set(ms);
    }
}

impl TimeSource for FakeTimeSource {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.auto_advance_ms.get());
        now
    }
}

/// Elapsed wall time since the last `start()`. Invalid until started and
/// after `invalidate()`; callers must check `valid()` first, reading an
/// invalid clock is a bug in the caller.
pub struct WallClock {
    source: Rc<dyn TimeSource>,
    started_at_ms: Option<u64>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::with_source(Rc::new(StdTimeSource::new()))
    }

    pub fn with_source(source: Rc<dyn TimeSource>) -> Self {
        WallClock {
            source,
            started_at_ms: None,
        }
    }

    pub fn valid(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn start(&mut self) {
        self.started_at_ms = Some(self.source.now_ms());
    }

    pub fn invalidate(&mut self) {
        self.started_at_ms = None;
    }

    pub fn elapsed_ms(&self) -> u64 {
        let started_at = self
            .started_at_ms
            .expect("WallClock must be valid before reading elapsed time");
        self.source.now_ms() - started_at
    }
}
