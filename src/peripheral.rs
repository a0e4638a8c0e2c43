/// Peripheral cards receive the executed-cycle count after every burst, and
/// a card doing time-critical work (disk I/O, mostly) can demand that the
/// emulation run at full speed for a bounded window. Capabilities a card may
/// or may not have (removable media) are queried through `media_swap`, not
/// by downcasting to a concrete card type.
pub trait Peripheral {
    fn name(&self) -> &'static str;

    /// called once per burst with the cycle count the engine actually ran
    fn periodic_update(&mut self, cycles_executed: u64);

    /// true while this card demands maximum throughput
    fn is_full_speed_condition_active(&self) -> bool {
        false
    }

    /// media-swap capability; cards with no removable media return None
    fn media_swap(&mut self) -> Option<&mut dyn MediaSwap> {
        None
    }
}

/// swap the removable media between the card's two drives
pub trait MediaSwap {
    fn swap_media(&mut self);
}

/// demo disk controller: I/O queued via `begin_io` keeps the motor busy for
/// that many cycles, and the card demands full speed until the backlog drains
pub struct DiskDrive {
    media: [String; 2],
    busy_cycles: u64,
}

impl DiskDrive {
    pub fn new(drive1: &str, drive2: &str) -> Self {
        DiskDrive {
            media: [drive1.to_string(), drive2.to_string()],
            busy_cycles: 0,
        }
    }

    pub fn begin_io(&mut self, cycles: u64) {
        self.busy_cycles += cycles;
    }

    pub fn media(&self) -> (&str, &str) {
        (&self.media[0], &self.media[1])
    }
}

impl Peripheral for DiskDrive {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn periodic_update(&mut self, cycles_executed: u64) {
        self.busy_cycles = self.busy_cycles.saturating_sub(cycles_executed);
    }

    fn is_full_speed_condition_active(&self) -> bool {
        self.busy_cycles > 0
    }

    fn media_swap(&mut self) -> Option<&mut dyn MediaSwap> {
        Some(self)
    }
}

impl MediaSwap for DiskDrive {
    fn swap_media(&mut self) {
        self.media.swap(0, 1);
    }
}

/// demo sound card; it only counts the cycles it has seen
pub struct SoundCard {
    cycles_seen: u64,
}

impl SoundCard {
    pub fn new() -> Self {
        SoundCard { cycles_seen: 0 }
    }

    pub fn cycles_seen(&self) -> u64 {
        self.cycles_seen
    }
}

impl Default for SoundCard {
    fn default() -> Self {
        Self::new()
    }
}

impl Peripheral for SoundCard {
    fn name(&self) -> &'static str {
        "sound"
    }

    fn periodic_update(&mut self, cycles_executed: u64) {
        self.cycles_seen += cycles_executed;
    }
}

/// inert card, useful for testing slots without behaviour
pub struct DummyCard;

impl Peripheral for DummyCard {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn periodic_update(&mut self, _cycles_executed: u64) {}
}
