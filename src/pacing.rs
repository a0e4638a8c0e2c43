use std::rc::Rc;

use log::debug;

use crate::audio::AudioSink;
use crate::clock::{CycleClock, FrameCounter};
use crate::config::{MachineConfig, PacingConfig};
use crate::display::{PacingStatus, StatusDisplay};
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::peripheral::Peripheral;
use crate::wallclock::{StdTimeSource, TimeSource, WallClock};

/// cap on catch-up, in ticks; just to avoid crazy times (e.g. after sitting
/// in a debugger or a system sleep)
const MAX_CATCHUP_TICKS: u64 = 10;

/// what one tick did, for logging and the status panel
#[derive(Debug, Copy, Clone)]
pub struct TickOutcome {
    pub bursts: u32,
    pub cycles_executed: u64,
    pub ran_ahead: bool,
}

/// The tick handler. Once per timer tick it compares emulated time against
/// the wall clock, runs the engine for a bounded window, feeds peripherals
/// and audio, and resets its time references at mode boundaries.
///
/// Owns the emulated-side and wall-side clocks exclusively; lifecycle code
/// may only touch them while the tick source is disarmed.
pub struct PacingController {
    config: PacingConfig,
    clock: CycleClock,
    frame: FrameCounter,
    wall: WallClock,
    /// emulated elapsed ms at the moment the wall clock was last anchored
    cpu_time_reference_ms: u64,
}

impl PacingController {
    pub fn new(pacing: &PacingConfig, machine: &MachineConfig) -> Self {
        Self::with_time_source(pacing, machine, Rc::new(StdTimeSource::new()))
    }

    pub fn with_time_source(
        pacing: &PacingConfig,
        machine: &MachineConfig,
        source: Rc<dyn TimeSource>,
    ) -> Self {
        PacingController {
            config: pacing.clone(),
            clock: CycleClock::new(machine.clock_frequency_hz),
            frame: FrameCounter::new(machine.cycles_per_frame),
            wall: WallClock::with_source(source),
            cpu_time_reference_ms: 0,
        }
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn frame(&self) -> &FrameCounter {
        &self.frame
    }

    pub fn wall_valid(&self) -> bool {
        self.wall.valid()
    }

    /// stop audio and invalidate the wall clock, so the next tick re-anchors
    /// both against the current emulated time
    pub fn reset_time_references(&mut self, audio: &mut dyn AudioSink) -> Result<()> {
        audio.stop()?;
        self.wall.invalidate();
        Ok(())
    }

    /// one timer tick: never blocks, always returns within the full-speed
    /// window of the tick's target
    pub fn on_tick(
        &mut self,
        engine: &mut dyn ExecutionEngine,
        peripherals: &mut [Box<dyn Peripheral>],
        audio: &mut dyn AudioSink,
        display: &mut dyn StatusDisplay,
    ) -> Result<TickOutcome> {
        if !audio.is_running() {
            audio.start()?;
        }

        if !self.wall.valid() {
            self.wall.start();
            self.cpu_time_reference_ms = self.clock.elapsed_ms();
        }

        // target is where emulated time should be when the next tick fires
        let target = self.wall.elapsed_ms() + self.config.tick_interval_ms;
        let current = self.clock.elapsed_ms() - self.cpu_time_reference_ms;
        if current > target {
            // we got ahead of the timer; just drain audio and wait for the
            // wall clock to catch up
            audio.write_audio();
            return Ok(TickOutcome {
                bursts: 0,
                cycles_executed: 0,
                ran_ahead: true,
            });
        }

        let max_to_run = MAX_CATCHUP_TICKS * self.config.tick_interval_ms;
        let to_run_ms = (target - current).min(max_to_run);
        let budget = self.clock.cycles_for_ms(to_run_ms);

        let mut bursts = 0u32;
        let mut cycles_executed = 0u64;
        loop {
            let executed = engine.execute(budget, true);
            assert!(executed <= budget, "engine overshot its cycle budget");
            self.clock.add_cycles(executed);
            self.frame.advance(executed);
            for card in peripherals.iter_mut() {
                card.periodic_update(executed);
            }
            cycles_executed += executed;
            bursts += 1;

            // keep bursting only while a card demands full speed and the
            // wall-clock ceiling for this tick has not been hit
            let full_speed = peripherals
                .iter()
                .any(|card| card.is_full_speed_condition_active());
            if !full_speed
                || self.wall.elapsed_ms() >= target + self.config.full_speed_window_ms
            {
                break;
            }
        }

        // repaint every tick; the loop may have produced frames worth showing
        let status = PacingStatus {
            cumulative_cycles: self.clock.cumulative_cycles(),
            emulated_ms: self.clock.elapsed_ms(),
            bursts_last_tick: bursts,
            cycles_last_tick: cycles_executed,
            full_speed: bursts > 1,
            audio_occupancy_ms: audio.occupancy_ms(),
        };
        display.refresh(&status)?;

        if bursts > 1 {
            // a full-speed catch-up ran; re-anchor time on the next tick
            debug!(
                "full-speed catch-up: {} bursts, {} cycles",
                bursts, cycles_executed
            );
            self.reset_time_references(audio)?;
        } else {
            audio.write_audio();
        }

        Ok(TickOutcome {
            bursts,
            cycles_executed,
            ran_ahead: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripheral::SoundCard;
    use crate::wallclock::FakeTimeSource;
    use std::io;

    /// engine that consumes its whole budget and records every request
    struct ScriptedEngine {
        requests: Vec<u64>,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            ScriptedEngine { requests: Vec::new() }
        }
    }

    impl ExecutionEngine for ScriptedEngine {
        fn execute(&mut self, cycle_budget: u64, _update_video: bool) -> u64 {
            self.requests.push(cycle_budget);
            cycle_budget
        }
    }

    /// engine that stops half way through every budget
    struct ShortfallEngine {
        requests: Vec<u64>,
    }

    impl ExecutionEngine for ShortfallEngine {
        fn execute(&mut self, cycle_budget: u64, _update_video: bool) -> u64 {
            self.requests.push(cycle_budget);
            cycle_budget / 2
        }
    }

    /// engine that lies about its cycle count
    struct OvershootEngine;

    impl ExecutionEngine for OvershootEngine {
        fn execute(&mut self, cycle_budget: u64, _update_video: bool) -> u64 {
            cycle_budget + 1
        }
    }

    struct TestAudio {
        running: bool,
        starts: u32,
        stops: u32,
        writes: u32,
    }

    impl TestAudio {
        fn new() -> Self {
            TestAudio {
                running: false,
                starts: 0,
                stops: 0,
                writes: 0,
            }
        }
    }

    impl AudioSink for TestAudio {
        fn start(&mut self) -> Result<()> {
            self.running = true;
            self.starts += 1;
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            self.running = false;
            self.stops += 1;
            Ok(())
        }
        fn is_running(&self) -> bool {
            self.running
        }
        fn write_audio(&mut self) {
            self.writes += 1;
        }
    }

    struct FullSpeedCard {
        active: bool,
    }

    impl Peripheral for FullSpeedCard {
        fn name(&self) -> &'static str {
            "full-speed"
        }
        fn periodic_update(&mut self, _cycles_executed: u64) {}
        fn is_full_speed_condition_active(&self) -> bool {
            self.active
        }
    }

    struct CountingDisplay {
        refreshes: u32,
    }

    impl StatusDisplay for CountingDisplay {
        fn refresh(&mut self, _status: &PacingStatus) -> io::Result<()> {
            self.refreshes += 1;
            Ok(())
        }
    }

    // 20ms ticks at 1,020,484Hz: one tick's budget is 20,409 cycles
    fn fixture() -> (PacingController, Rc<FakeTimeSource>) {
        let pacing = PacingConfig {
            tick_interval_ms: 20,
            full_speed_window_ms: 200,
            high_precision: true,
        };
        let machine = MachineConfig {
            clock_frequency_hz: 1_020_484.0,
            cycles_per_frame: 17_030,
        };
        let fake = FakeTimeSource::new();
        let pacer = PacingController::with_time_source(&pacing, &machine, fake.clone());
        (pacer, fake)
    }

    #[test]
    fn test_normal_speed_tick_is_one_burst() -> Result<()> {
        let (mut pacer, _fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![Box::new(SoundCard::new())];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        let outcome = pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        assert_eq!(outcome.bursts, 1);
        assert!(!outcome.ran_ahead);
        assert_eq!(engine.requests, vec![20_409]);
        assert_eq!(pacer.clock().cumulative_cycles(), 20_409);
        // one normal-speed burst does not reset the time references
        assert!(pacer.wall_valid());
        assert_eq!(audio.starts, 1);
        assert_eq!(audio.writes, 1);
        assert_eq!(audio.stops, 0);
        assert_eq!(display.refreshes, 1);
        Ok(())
    }

    #[test]
    fn test_tick_feeds_peripherals_and_frame_counter() -> Result<()> {
        let (mut pacer, _fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![Box::new(SoundCard::new())];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        let cycles = pacer.clock().cumulative_cycles();
        assert_eq!(pacer.frame().cycles_this_frame(), cycles % 17_030);
        assert!(pacer.frame().cycles_this_frame() < pacer.frame().cycles_per_frame());
        Ok(())
    }

    #[test]
    fn test_ahead_tick_executes_nothing() -> Result<()> {
        let (mut pacer, _fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        // anchor at zero, then put the emulation 100ms ahead of the wall clock
        pacer.wall.start();
        pacer.cpu_time_reference_ms = 0;
        let ahead = pacer.clock.cycles_for_ms(100);
        pacer.clock.add_cycles(ahead);

        let outcome = pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        assert!(outcome.ran_ahead);
        assert_eq!(outcome.bursts, 0);
        assert!(engine.requests.is_empty());
        // a no-op tick leaves the cycle counter untouched
        assert_eq!(pacer.clock().cumulative_cycles(), ahead);
        assert_eq!(audio.writes, 1);
        assert_eq!(display.refreshes, 0);
        Ok(())
    }

    #[test]
    fn test_full_speed_burst_is_bounded_and_resets_references() -> Result<()> {
        let (mut pacer, fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> =
            vec![Box::new(FullSpeedCard { active: true })];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        // wall time moves 7ms per query, so the loop must hit its ceiling
        fake.set_auto_advance(7);
        let outcome = pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        assert!(outcome.bursts > 1);
        assert!(outcome.bursts < 100);
        // multi-burst tick forces a re-anchor: audio stopped, wall invalid
        assert!(!pacer.wall_valid());
        assert!(!audio.is_running());
        assert_eq!(audio.stops, 1);
        assert_eq!(audio.writes, 0);
        assert_eq!(display.refreshes, 1);
        // the loop stopped within the full-speed window of the target
        // (target = first elapsed query + 20ms; one 7ms step of slack)
        fake.set_auto_advance(0);
        assert!(fake.now_ms() <= 20 + 7 + 200 + 2 * 7);
        Ok(())
    }

    #[test]
    fn test_execution_shortfall_recomputed_next_tick() -> Result<()> {
        let (mut pacer, _fake) = fixture();
        let mut engine = ShortfallEngine { requests: Vec::new() };
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;
        assert_eq!(pacer.clock().cumulative_cycles(), 20_409 / 2);
        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        // first tick asked for 20ms; second only for the ~11ms still owed
        assert_eq!(engine.requests[0], 20_409);
        assert_eq!(engine.requests[1], 11_225);
        Ok(())
    }

    #[test]
    fn test_catch_up_capped_after_stall() -> Result<()> {
        let (mut pacer, fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;
        // a 10s stall (debugger, system sleep) must not trigger 10s of catch-up
        fake.advance(10_000);
        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        // capped at 10 ticks' worth: 200ms at ~1.02MHz
        assert_eq!(engine.requests[1], 204_096);
        Ok(())
    }

    #[test]
    fn test_reanchor_after_pause_skips_paused_interval() -> Result<()> {
        let (mut pacer, fake) = fixture();
        let mut engine = ScriptedEngine::new();
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };

        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;
        // pause: final flush then park the time references
        audio.write_audio();
        pacer.reset_time_references(&mut audio)?;
        fake.advance(500);

        pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display)?;

        // no retroactive catch-up for the paused 500ms
        assert_eq!(engine.requests, vec![20_409, 20_409]);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "overshot")]
    fn test_engine_overshoot_is_a_bug() {
        let (mut pacer, _fake) = fixture();
        let mut engine = OvershootEngine;
        let mut peripherals: Vec<Box<dyn Peripheral>> = vec![];
        let mut audio = TestAudio::new();
        let mut display = CountingDisplay { refreshes: 0 };
        let _ = pacer.on_tick(&mut engine, &mut peripherals, &mut audio, &mut display);
    }
}
