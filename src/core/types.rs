use std::fmt;

use chrono::{DateTime, Local};

/// The metric families sampled by independent loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Cpu,
    Ram,
    Disk,
    Network,
    ProcessList,
    ThreadCount,
    ProcessCount,
}

impl MetricKind {
    /// Every family, in the order samplers are started.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Cpu,
        MetricKind::Ram,
        MetricKind::Disk,
        MetricKind::Network,
        MetricKind::ProcessList,
        MetricKind::ThreadCount,
        MetricKind::ProcessCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Ram => "ram",
            MetricKind::Disk => "disk",
            MetricKind::Network => "network",
            MetricKind::ProcessList => "process-list",
            MetricKind::ThreadCount => "thread-count",
            MetricKind::ProcessCount => "process-count",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cumulative network byte counters, summed over all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounters {
    pub sent: u64,
    pub received: u64,
}

/// Bytes moved between two counter readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetDelta {
    pub sent: u64,
    pub received: u64,
    /// Set when either counter went backwards and was clamped to zero.
    pub regressed: bool,
}

/// Snapshot of a single process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub rss_bytes: u64,
}

/// The payload of one reading.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Percent(f64),
    Counters(NetCounters),
    Processes(Vec<ProcessInfo>),
    Count(usize),
}

/// A reading at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: MetricKind,
    pub value: SampleValue,
    pub timestamp: DateTime<Local>,
}

impl Sample {
    pub fn now(metric: MetricKind, value: SampleValue) -> Self {
        Self {
            metric,
            value,
            timestamp: Local::now(),
        }
    }
}
