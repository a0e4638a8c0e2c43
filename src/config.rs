use crate::error::{Error, Result};

// NTSC: 262 scan lines of 65 cycles; PAL: 312 lines
const NTSC_CLOCK_HZ: f64 = 1_020_484.45;
const NTSC_CYCLES_PER_FRAME: u64 = 17_030;
const PAL_CLOCK_HZ: f64 = 1_015_625.0;
const PAL_CYCLES_PER_FRAME: u64 = 20_280;

/// which video standard the emulated machine is built for; the CPU clock
/// and the frame length both derive from it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MachineVariant {
    Ntsc,
    Pal,
}

impl MachineVariant {
    pub fn clock_frequency_hz(&self) -> f64 {
        match self {
            MachineVariant::Ntsc => NTSC_CLOCK_HZ,
            MachineVariant::Pal => PAL_CLOCK_HZ,
        }
    }

    pub fn cycles_per_frame(&self) -> u64 {
        match self {
            MachineVariant::Ntsc => NTSC_CYCLES_PER_FRAME,
            MachineVariant::Pal => PAL_CYCLES_PER_FRAME,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub pacing: PacingConfig,
    pub machine: MachineConfig,
}

/// fixed for the duration of a session; changing it means reloading the
/// session, which also resets the wall clock
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// tick period, and how far ahead of the wall clock each tick aims
    pub tick_interval_ms: u64,
    /// how long a full-speed catch-up may hold on to the tick handler
    pub full_speed_window_ms: u64,
    /// spin-sleep to the tick deadline instead of a coarse thread sleep
    pub high_precision: bool,
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    pub clock_frequency_hz: f64,
    pub cycles_per_frame: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            machine: MachineConfig::default(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            full_speed_window_ms: 200,
            high_precision: true,
        }
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::from_variant(MachineVariant::Ntsc)
    }
}

impl MachineConfig {
    pub fn from_variant(variant: MachineVariant) -> Self {
        Self {
            clock_frequency_hz: variant.clock_frequency_hz(),
            cycles_per_frame: variant.cycles_per_frame(),
        }
    }
}

impl Config {
    /// reject configurations the pacing loop cannot run with. This is the
    /// only place pacing parameters are checked; past here they are trusted.
    pub fn validate(&self) -> Result<()> {
        if self.pacing.tick_interval_ms == 0 {
            return Err(Error::Config("tick interval must be non-zero".into()));
        }
        if self.pacing.full_speed_window_ms == 0 {
            return Err(Error::Config("full-speed window must be non-zero".into()));
        }
        if !self.machine.clock_frequency_hz.is_finite() || self.machine.clock_frequency_hz <= 0.0 {
            return Err(Error::Config(format!(
                "clock frequency must be positive, got {}",
                self.machine.clock_frequency_hz
            )));
        }
        if self.machine.cycles_per_frame == 0 {
            return Err(Error::Config("cycles per frame must be non-zero".into()));
        }
        Ok(())
    }
}
