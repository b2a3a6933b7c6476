//! A live host resource monitor: independent sampler threads feed a
//! single-threaded terminal dashboard through a drained command queue.

pub mod app;
pub mod config;
pub mod core;
pub mod event;
pub mod logger;
pub mod ui;

pub use crate::core::errors::{Result, SourceError, SysmonError};
