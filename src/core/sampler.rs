//! Independent polling loops, one per metric family.

use std::fmt::Write as _;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::collector::MetricsSource;
use crate::core::command::{ChartId, Command, LabelId};
use crate::core::dispatch::DispatchQueue;
use crate::core::errors::SourceError;
use crate::core::format::{counter_delta, format_bytes};
use crate::core::history::HistoryBuffer;
use crate::core::lifecycle::RunningFlag;
use crate::core::types::{MetricKind, NetCounters, ProcessInfo, Sample, SampleValue};

const TIME_AXIS: &str = "Time (s)";
const USAGE_AXIS: &str = "Usage (%)";

/// Upper bound on one sleep slice, so shutdown is noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Sleeps between sampler iterations while watching the running flag.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    running: RunningFlag,
}

impl Ticker {
    pub fn new(interval: Duration, running: RunningFlag) -> Self {
        Self { interval, running }
    }

    /// Sleep for one interval. Returns whether the loop should continue.
    pub fn wait(&self) -> bool {
        self.wait_for(self.interval)
    }

    /// Sleep for `duration`, returning early with `false` once stopped.
    pub fn wait_for(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if !self.running.is_running() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(WAIT_SLICE));
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// One metric family's read-and-render step.
pub trait Sampler: Send {
    fn kind(&self) -> MetricKind;

    /// Perform one read and build the commands it produces.
    ///
    /// A failed read leaves owned state untouched.
    fn sample(&mut self, source: &dyn MetricsSource) -> Result<Vec<Command>, SourceError>;
}

/// Drive `sampler` until the flag clears.
///
/// Read failures are logged and the tick is skipped; they never end the loop.
pub fn run_sampler(
    mut sampler: Box<dyn Sampler>,
    source: &dyn MetricsSource,
    queue: &DispatchQueue,
    ticker: &Ticker,
    start_offset: Duration,
) {
    let kind = sampler.kind();
    if !ticker.wait_for(start_offset) {
        return;
    }
    let interval_ms = ticker.interval().as_millis() as u64;
    tracing::debug!(metric = %kind, interval_ms, "sampler started");

    loop {
        match sampler.sample(source) {
            Ok(commands) => {
                for command in commands {
                    queue.enqueue(command);
                }
            }
            Err(err) => {
                tracing::debug!(metric = %kind, error = %err, "skipping tick");
            }
        }
        if !ticker.wait() {
            break;
        }
    }
    tracing::debug!(metric = %kind, "sampler stopped");
}

fn record(sample: &Sample) {
    tracing::trace!(
        metric = %sample.metric,
        value = ?sample.value,
        at = %sample.timestamp.format("%H:%M:%S%.3f"),
        "sample"
    );
}

/// CPU, RAM or disk: a percentage with a history chart.
pub struct ScalarSampler {
    kind: MetricKind,
    history: HistoryBuffer,
}

impl ScalarSampler {
    pub fn new(kind: MetricKind, capacity: usize) -> Self {
        debug_assert!(matches!(
            kind,
            MetricKind::Cpu | MetricKind::Ram | MetricKind::Disk
        ));
        Self {
            kind,
            history: HistoryBuffer::new(capacity),
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    fn read(&self, source: &dyn MetricsSource) -> Result<f64, SourceError> {
        match self.kind {
            MetricKind::Cpu => source.cpu_percent(),
            MetricKind::Ram => source.memory_percent(),
            _ => source.disk_percent(),
        }
    }

    fn targets(&self) -> (LabelId, ChartId, &'static str, &'static str) {
        match self.kind {
            MetricKind::Cpu => (LabelId::Cpu, ChartId::Cpu, "CPU", "CPU Usage"),
            MetricKind::Ram => (LabelId::Ram, ChartId::Ram, "RAM", "RAM Usage"),
            _ => (LabelId::Disk, ChartId::Disk, "Disk", "Disk Usage"),
        }
    }
}

impl Sampler for ScalarSampler {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn sample(&mut self, source: &dyn MetricsSource) -> Result<Vec<Command>, SourceError> {
        let usage = self.read(source)?;
        record(&Sample::now(self.kind, SampleValue::Percent(usage)));

        self.history.append(usage);
        let (label, chart, prefix, title) = self.targets();
        Ok(vec![
            Command::label(label, format!("{prefix}: {usage:.1}%")),
            Command::chart(chart, title, TIME_AXIS, USAGE_AXIS, self.history.snapshot()),
        ])
    }
}

/// Throughput since the previous tick.
///
/// The first successful read only establishes the baseline.
#[derive(Default)]
pub struct NetworkSampler {
    baseline: Option<NetCounters>,
}

impl NetworkSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sampler for NetworkSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Network
    }

    fn sample(&mut self, source: &dyn MetricsSource) -> Result<Vec<Command>, SourceError> {
        let current = source.net_counters()?;
        record(&Sample::now(MetricKind::Network, SampleValue::Counters(current)));

        let Some(previous) = self.baseline.replace(current) else {
            return Ok(Vec::new());
        };
        let delta = counter_delta(previous, current);
        if delta.regressed {
            tracing::warn!(
                old_sent = previous.sent,
                new_sent = current.sent,
                old_received = previous.received,
                new_received = current.received,
                "network counters went backwards, clamping to zero"
            );
        }
        Ok(vec![Command::label(
            LabelId::Network,
            format!(
                "Net: Sent {}, Received {}",
                format_bytes(delta.sent),
                format_bytes(delta.received)
            ),
        )])
    }
}

/// Full process table, rendered as one text block.
#[derive(Default)]
pub struct ProcessListSampler;

impl ProcessListSampler {
    pub fn new() -> Self {
        Self
    }

    /// The readable part of the process table.
    fn read(source: &dyn MetricsSource) -> Result<Vec<ProcessInfo>, SourceError> {
        // Processes that exit mid-enumeration are expected; drop them.
        Ok(source.processes()?.into_iter().flatten().collect())
    }
}

impl Sampler for ProcessListSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::ProcessList
    }

    fn sample(&mut self, source: &dyn MetricsSource) -> Result<Vec<Command>, SourceError> {
        let processes = Self::read(source)?;
        let mut text = String::new();
        for info in &processes {
            let _ = writeln!(
                text,
                "{} (PID: {}) - RAM: {}",
                info.name,
                info.pid,
                format_bytes(info.rss_bytes)
            );
        }
        record(&Sample::now(
            MetricKind::ProcessList,
            SampleValue::Processes(processes),
        ));
        Ok(vec![Command::replace_text(text)])
    }
}

/// Thread or process count.
pub struct CountSampler {
    kind: MetricKind,
}

impl CountSampler {
    pub fn threads() -> Self {
        Self {
            kind: MetricKind::ThreadCount,
        }
    }

    pub fn processes() -> Self {
        Self {
            kind: MetricKind::ProcessCount,
        }
    }
}

impl Sampler for CountSampler {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn sample(&mut self, source: &dyn MetricsSource) -> Result<Vec<Command>, SourceError> {
        let command = if self.kind == MetricKind::ThreadCount {
            let count = source.thread_count()?;
            record(&Sample::now(self.kind, SampleValue::Count(count)));
            Command::label(LabelId::Threads, format!("Threads: {count}"))
        } else {
            let count = source.process_count()?;
            record(&Sample::now(self.kind, SampleValue::Count(count)));
            Command::label(LabelId::Processes, format!("Processes: {count}"))
        };
        Ok(vec![command])
    }
}

/// Build the sampler for a metric family.
pub fn sampler_for(kind: MetricKind, history_capacity: usize) -> Box<dyn Sampler> {
    match kind {
        MetricKind::Cpu | MetricKind::Ram | MetricKind::Disk => {
            Box::new(ScalarSampler::new(kind, history_capacity))
        }
        MetricKind::Network => Box::new(NetworkSampler::new()),
        MetricKind::ProcessList => Box::new(ProcessListSampler::new()),
        MetricKind::ThreadCount => Box::new(CountSampler::threads()),
        MetricKind::ProcessCount => Box::new(CountSampler::processes()),
    }
}
