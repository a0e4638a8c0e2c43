///
/// ## Design
///
/// * pace a cycle-accurate emulation so emulated time tracks wall time,
///   without starving the audio device or racing ahead of it
/// * one recurring tick is the only scheduling unit; it must never block
///   and never overlap with itself
/// * emulated time is cycles / clock frequency; wall time is a monotonic
///   elapsed timer that can be invalidated and re-anchored at mode
///   boundaries (start, pause, reboot, full-speed exit)
/// * the execution engine, peripheral cards, audio sink and presentation
///   are collaborators behind traits, so the loop can be driven against
///   scripted stand-ins in tests
///
/// Model
///
/// Session
///  |-- machine (engine, peripherals, audio, display) from a builder
///  |-- ticker(interval)
///  |-- pacing controller(cycle clock, wall clock, frame counter)
///  |    `-- on_tick
///  |         |-- start audio / re-anchor wall clock if invalid
///  |         |-- target = wall elapsed + tick interval
///  |         |-- current = emulated elapsed since anchor
///  |         |-- ahead of target? flush audio, done
///  |         |-- burst the engine for min(owed, 10 ticks), feeding
///  |         |   the frame counter and every card after each burst
///  |         |-- keep bursting while a card demands full speed, up to
///  |         |   a wall-clock ceiling past the target
///  |         `-- multi-burst tick? reset time references : flush audio
///  `-- lifecycle: start / pause / reboot / with_paused guard around
///      state mutation (load state, swap media)
pub mod audio;
pub mod clock;
pub mod config;
pub mod control;
pub mod display;
pub mod engine;
pub mod error;
pub mod pacing;
pub mod peripheral;
pub mod session;
pub mod ticker;
pub mod wallclock;
