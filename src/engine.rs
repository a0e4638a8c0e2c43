use std::fs;
use std::io;
use std::path::Path;

use crate::error::Result;

/// The instruction execution engine driven by the pacing loop. Decoding and
/// executing instructions is its business alone; the loop only hands it a
/// cycle budget and trusts the count it reports back.
pub trait ExecutionEngine {
    /// run up to `cycle_budget` cycles and report how many actually ran.
    /// Engines may stop short (e.g. at an internal frame boundary) but must
    /// never overshoot the budget; the tick handler asserts this in every
    /// build profile, since an inflated count would corrupt the cycle clock
    fn execute(&mut self, cycle_budget: u64, update_video: bool) -> u64;

    /// save/load-state capability; engines that cannot snapshot return None
    fn snapshot(&mut self) -> Option<&mut dyn Snapshot> {
        None
    }
}

/// persistent machine-state serialization; the on-disk format is the
/// engine's own business
pub trait Snapshot {
    fn save(&self, path: &Path) -> Result<()>;
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// demo engine that consumes exactly the budget it is given; useful for
/// exercising the pacing loop without a real CPU core behind it
pub struct FreeRunner {
    cycles_done: u64,
}

impl FreeRunner {
    pub fn new() -> Self {
        FreeRunner { cycles_done: 0 }
    }

    pub fn cycles_done(&self) -> u64 {
        self.cycles_done
    }
}

impl Default for FreeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine for FreeRunner {
    fn execute(&mut self, cycle_budget: u64, _update_video: bool) -> u64 {
        self.cycles_done += cycle_budget;
        cycle_budget
    }

    fn snapshot(&mut self) -> Option<&mut dyn Snapshot> {
        Some(self)
    }
}

impl Snapshot for FreeRunner {
    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.cycles_done.to_string())?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.cycles_done = text
            .trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(())
    }
}
