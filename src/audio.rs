use std::time::{Duration, Instant};

use beep::beep;

use crate::error::{Error, Result};

/// Audio output fed from the tick handler. Writes must never block: if the
/// device cannot accept data right now, the write is simply deferred to a
/// later tick.
pub trait AudioSink {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;

    /// non-blocking flush of whatever is pending
    fn write_audio(&mut self);

    /// how much queued audio the device is sitting on
    fn occupancy_ms(&self) -> u64 {
        0
    }
}

const TONE_PITCH: u16 = 2093; // C

/// one `write_audio` books this much tone ahead of the device
const WRITE_CHUNK: Duration = Duration::from_millis(20);
/// the modelled device queue never holds more than this
const QUEUE_DEPTH: Duration = Duration::from_millis(80);

/// single-tone PC-speaker-style output via the `beep` crate. The tone line
/// has no sample buffer, so the queue is modelled: each write books one
/// chunk ahead of the device, capped at a fixed depth, and the booking
/// drains in real time; `occupancy_ms` reports how far ahead the tick
/// handler has fed it
pub struct ToneAudio {
    running: bool,
    buffered_until: Option<Instant>,
}

impl ToneAudio {
    pub fn new() -> Self {
        ToneAudio {
            running: false,
            buffered_until: None,
        }
    }
}

impl Default for ToneAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for ToneAudio {
    fn start(&mut self) -> Result<()> {
        beep(TONE_PITCH).map_err(|e| Error::Audio(e.to_string()))?;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.buffered_until = None;
        beep(0).map_err(|e| Error::Audio(e.to_string()))?;
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn write_audio(&mut self) {
        let now = Instant::now();
        let head = match self.buffered_until {
            Some(t) if t > now => t,
            _ => now,
        };
        self.buffered_until = Some((head + WRITE_CHUNK).min(now + QUEUE_DEPTH));
    }

    fn occupancy_ms(&self) -> u64 {
        let now = Instant::now();
        match self.buffered_until {
            Some(t) if t > now => (t - now).as_millis() as u64,
            _ => 0,
        }
    }
}

/// silent sink for tests and machines without a speaker
pub struct Mute {
    running: bool,
}

impl Mute {
    pub fn new() -> Self {
        Mute { running: false }
    }
}

impl Default for Mute {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for Mute {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn write_audio(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_occupancy_tracks_writes_up_to_queue_depth() {
        let mut t = ToneAudio::new();
        assert_eq!(t.occupancy_ms(), 0);

        t.write_audio();
        let after_one = t.occupancy_ms();
        assert!(after_one > 0);
        assert!(after_one <= 20);

        // the booking saturates at the queue depth, not one chunk per write
        for _ in 0..10 {
            t.write_audio();
        }
        assert!(t.occupancy_ms() <= 80);
    }

    #[test]
    fn test_tone_stop_discards_queued_audio() {
        let mut t = ToneAudio::new();
        t.write_audio();
        assert!(t.occupancy_ms() > 0);
        // the device may be absent here; the queue clears regardless
        let _ = t.stop();
        assert_eq!(t.occupancy_ms(), 0);
    }

    #[test]
    fn test_mute_tracks_running_state() -> Result<()> {
        let mut m = Mute::new();
        assert!(!m.is_running());
        m.start()?;
        assert!(m.is_running());
        m.write_audio();
        m.stop()?;
        assert!(!m.is_running());
        Ok(())
    }
}
