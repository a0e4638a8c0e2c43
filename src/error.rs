use std::io;
use thiserror::Error;

/// Errors that can escape the pacing core. Everything here is fatal at
/// session-load or reboot time; steady-state conditions (execution
/// shortfall, audio backpressure, timing anomalies) are absorbed by the
/// tick algorithm and never surface as errors.
#[derive(Error, Debug)]
pub enum Error {
    /// bad configuration, refused before the session can start
    #[error("configuration error: {0}")]
    Config(String),

    /// the audio device could not be started or stopped
    #[error("audio device error: {0}")]
    Audio(String),

    /// I/O error from snapshot files or the terminal backend
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
