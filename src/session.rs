use std::path::Path;
use std::rc::Rc;

use log::{info, warn};

use crate::audio::AudioSink;
use crate::config::Config;
use crate::display::StatusDisplay;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::pacing::{PacingController, TickOutcome};
use crate::peripheral::Peripheral;
use crate::ticker::Ticker;
use crate::wallclock::{StdTimeSource, TimeSource};

/// where the session is in its lifecycle
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Paused,
    Running,
}

/// everything the pacing loop drives; torn down and rebuilt wholesale on
/// reboot
pub struct Machine {
    pub engine: Box<dyn ExecutionEngine>,
    pub peripherals: Vec<Box<dyn Peripheral>>,
    pub audio: Box<dyn AudioSink>,
    pub display: Box<dyn StatusDisplay>,
}

/// builds a machine from configuration; called at load and again at reboot
pub type MachineBuilder = Box<dyn FnMut(&Config) -> Result<Machine>>;

/// Orchestrates session start/stop/reboot/pause around the pacing
/// controller. Only touches the pacing clocks while the tick source is
/// disarmed, so it never races the tick handler.
pub struct Session {
    config: Config,
    builder: MachineBuilder,
    state: SessionState,
    machine: Option<Machine>,
    pacer: Option<PacingController>,
    ticker: Ticker,
    time_source: Rc<dyn TimeSource>,
}

impl Session {
    /// validate configuration, build the machine and leave the session
    /// paused; a builder failure here leaves nothing running
    pub fn new(config: Config, builder: MachineBuilder) -> Result<Self> {
        Self::with_time_source(config, builder, Rc::new(StdTimeSource::new()))
    }

    pub fn with_time_source(
        config: Config,
        builder: MachineBuilder,
        source: Rc<dyn TimeSource>,
    ) -> Result<Self> {
        config.validate()?;
        let mut session = Session {
            config,
            builder,
            state: SessionState::Unloaded,
            machine: None,
            pacer: None,
            ticker: Ticker::new(),
            time_source: source,
        };
        session.load()?;
        Ok(session)
    }

    fn load(&mut self) -> Result<()> {
        let machine = (self.builder)(&self.config)?;
        self.pacer = Some(PacingController::with_time_source(
            &self.config.pacing,
            &self.config.machine,
            Rc::clone(&self.time_source),
        ));
        self.machine = Some(machine);
        self.state = SessionState::Paused;
        info!("session loaded");
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(machine) = &mut self.machine {
            if let Err(e) = machine.audio.stop() {
                warn!("audio stop failed during unload: {}", e);
            }
        }
        self.machine = None;
        self.pacer = None;
        self.state = SessionState::Unloaded;
        info!("session unloaded");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cumulative_cycles(&self) -> u64 {
        self.pacer
            .as_ref()
            .map(|p| p.clock().cumulative_cycles())
            .unwrap_or(0)
    }

    pub fn wall_valid(&self) -> bool {
        self.pacer.as_ref().map(|p| p.wall_valid()).unwrap_or(false)
    }

    /// arm the tick source and let the next tick re-anchor the clocks;
    /// no-op unless the session is loaded and paused
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Ok(());
        }
        // always restart with the same tick interval that was last used
        self.ticker.arm(
            self.config.pacing.tick_interval_ms,
            self.config.pacing.high_precision,
        );
        if let (Some(pacer), Some(machine)) = (&mut self.pacer, &mut self.machine) {
            pacer.reset_time_references(machine.audio.as_mut())?;
        }
        self.state = SessionState::Running;
        info!("session started");
        Ok(())
    }

    /// disarm the tick source; settles audio like one final non-burst tick,
    /// then parks the time references. No-op unless running
    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Running {
            return Ok(());
        }
        self.ticker.disarm();
        if let (Some(pacer), Some(machine)) = (&mut self.pacer, &mut self.machine) {
            machine.audio.write_audio();
            pacer.reset_time_references(machine.audio.as_mut())?;
        }
        self.state = SessionState::Paused;
        info!("session paused");
        Ok(())
    }

    /// tear the machine down and rebuild it from the current configuration,
    /// then start; the tick interval survives the reboot
    pub fn reboot(&mut self) -> Result<()> {
        if self.state == SessionState::Unloaded {
            return Ok(());
        }
        self.pause()?;
        self.unload();
        self.load()?;
        self.start()?;
        info!("session rebooted");
        Ok(())
    }

    /// block until the next tick is due; returns false if the tick source
    /// is disarmed
    pub fn wait_tick(&mut self) -> bool {
        self.ticker.wait()
    }

    /// deliver one tick to the pacing controller; quiet no-op when not
    /// running
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state == SessionState::Running {
            if let (Some(pacer), Some(machine)) = (&mut self.pacer, &mut self.machine) {
                return pacer.on_tick(
                    machine.engine.as_mut(),
                    &mut machine.peripherals,
                    machine.audio.as_mut(),
                    machine.display.as_mut(),
                );
            }
        }
        Ok(TickOutcome {
            bursts: 0,
            cycles_executed: 0,
            ran_ahead: false,
        })
    }

    /// run `body` with the session paused, resuming on exit (on every exit
    /// path) only if it was running on entry
    pub fn with_paused<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let was_running = self.state == SessionState::Running;
        self.pause()?;
        let result = body(self);
        let resumed = if was_running { self.start() } else { Ok(()) };
        result.and(resumed)
    }

    /// snapshot the machine state now; no pause needed, the tick handler is
    /// not running while we are
    pub fn save_state(&mut self, path: &Path) -> Result<()> {
        match &mut self.machine {
            Some(machine) => match machine.engine.snapshot() {
                Some(snapshot) => snapshot.save(path),
                None => {
                    warn!("engine has no snapshot support, save ignored");
                    Ok(())
                }
            },
            None => Ok(()),
        }
    }

    /// replace the machine state from a snapshot file, paused around the
    /// mutation so no cycles execute against half-replaced state
    pub fn load_state(&mut self, path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        self.with_paused(|session| match &mut session.machine {
            Some(machine) => match machine.engine.snapshot() {
                Some(snapshot) => snapshot.load(&path),
                None => {
                    warn!("engine has no snapshot support, load ignored");
                    Ok(())
                }
            },
            None => Ok(()),
        })
    }

    /// swap removable media in the card at `slot`, if that card has any;
    /// paused around the mutation like `load_state`
    pub fn swap_media(&mut self, slot: usize) -> Result<()> {
        self.with_paused(|session| {
            if let Some(machine) = &mut session.machine {
                match machine.peripherals.get_mut(slot) {
                    Some(card) => {
                        let name = card.name();
                        match card.media_swap() {
                            Some(swap) => swap.swap_media(),
                            None => warn!("card '{}' has no removable media", name),
                        }
                    }
                    None => warn!("no card in slot {}", slot),
                }
            }
            Ok(())
        })
    }
}
