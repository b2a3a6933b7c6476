//! Sampling and UI-safe dispatch engine.

pub mod collector;
pub mod command;
pub mod dispatch;
pub mod errors;
pub mod format;
pub mod history;
pub mod lifecycle;
pub mod sampler;
pub mod types;
