// NB. cycles are u64 throughout; at ~1MHz that is several hundred thousand
//     years of emulated time before wrapping is a concern

/// Tracks cumulative emulated cycles and converts them to emulated
/// milliseconds via the configured clock frequency. This is the emulated
/// side of the pacing comparison; the wall clock is the other side.
pub struct CycleClock {
    cumulative_cycles: u64,
    clock_frequency_hz: f64,
}

impl CycleClock {
    pub fn new(clock_frequency_hz: f64) -> Self {
        debug_assert!(clock_frequency_hz > 0.0);
        CycleClock {
            cumulative_cycles: 0,
            clock_frequency_hz,
        }
    }

    /// record cycles the engine actually executed
    pub fn add_cycles(&mut self, cycles: u64) {
        self.cumulative_cycles += cycles;
    }

    pub fn cumulative_cycles(&self) -> u64 {
        self.cumulative_cycles
    }

    pub fn clock_frequency_hz(&self) -> f64 {
        self.clock_frequency_hz
    }

    /// how much emulated time has passed, in whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        (self.cumulative_cycles as f64 / self.clock_frequency_hz * 1000.0) as u64
    }

    /// cycle budget equivalent to `ms` of emulated time
    pub fn cycles_for_ms(&self, ms: u64) -> u64 {
        (self.clock_frequency_hz * ms as f64 / 1000.0) as u64
    }
}

/// Counts cycles within the current video frame, wrapping at the frame
/// length so `cycles_this_frame` always stays in `[0, cycles_per_frame)`.
pub struct FrameCounter {
    cycles_this_frame: u64,
    cycles_per_frame: u64,
}

impl FrameCounter {
    pub fn new(cycles_per_frame: u64) -> Self {
        debug_assert!(cycles_per_frame > 0);
        FrameCounter {
            cycles_this_frame: 0,
            cycles_per_frame,
        }
    }

    /// advance by an executed-cycle count; a burst may cover more than one
    /// frame, the modulo handles that too
    pub fn advance(&mut self, cycles_executed: u64) {
        self.cycles_this_frame = (self.cycles_this_frame + cycles_executed) % self.cycles_per_frame;
    }

    pub fn cycles_this_frame(&self) -> u64 {
        self.cycles_this_frame
    }

    pub fn cycles_per_frame(&self) -> u64 {
        self.cycles_per_frame
    }
}
