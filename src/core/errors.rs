use std::io;

use thiserror::Error;

use crate::core::lifecycle::LifecycleState;

/// A read against the metrics source failed for one tick.
///
/// These are transient: the sampler that hit one skips the tick and tries
/// again on its next interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The source could not produce the named metric right now.
    #[error("metric unavailable: {0}")]
    Unavailable(&'static str),

    /// A process exited between enumeration and inspection.
    #[error("process {0} vanished during enumeration")]
    ProcessVanished(u32),

    /// No filesystem is mounted at `/` and no fallback disk was listed.
    #[error("no root volume found")]
    NoRootVolume,
}

/// Unified error type for sysmon.
#[derive(Debug, Error)]
pub enum SysmonError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

pub type Result<T> = std::result::Result<T, SysmonError>;
