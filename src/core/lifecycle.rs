//! Startup and shutdown of the sampler threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::collector::MetricsSource;
use crate::core::command::RenderSink;
use crate::core::dispatch::{self, DispatchQueue, Dispatcher};
use crate::core::errors::{Result, SysmonError};
use crate::core::sampler::{run_sampler, Sampler, Ticker};
use crate::core::types::MetricKind;

/// Cooperative cancellation signal shared by every sampler.
///
/// Samplers only read it. Only [`LifecycleController`] flips it, once in each
/// direction. Readers may see the old value for up to one sleep slice.
#[derive(Debug, Clone, Default)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(crate) fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sampling schedule. Fixed for the life of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay between consecutive sampler starts.
    pub stagger: Duration,
    /// CPU, RAM, disk and network.
    pub fast_interval: Duration,
    /// Process list and counts.
    pub slow_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            stagger: Duration::from_millis(200),
            fast_interval: Duration::from_secs(1),
            slow_interval: Duration::from_secs(5),
        }
    }
}

impl Timing {
    pub fn interval_for(&self, kind: MetricKind) -> Duration {
        match kind {
            MetricKind::Cpu | MetricKind::Ram | MetricKind::Disk | MetricKind::Network => {
                self.fast_interval
            }
            MetricKind::ProcessList | MetricKind::ThreadCount | MetricKind::ProcessCount => {
                self.slow_interval
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initialized,
    Running,
    Stopping,
    Stopped,
}

/// Owns the running flag, the sampler threads, the dispatcher and the
/// rendering sink.
pub struct LifecycleController<S: RenderSink> {
    state: LifecycleState,
    running: RunningFlag,
    timing: Timing,
    source: Arc<dyn MetricsSource>,
    queue: DispatchQueue,
    dispatcher: Dispatcher,
    sink: Option<S>,
    samplers: Vec<Box<dyn Sampler>>,
    handles: Vec<JoinHandle<()>>,
}

impl<S: RenderSink> LifecycleController<S> {
    /// Controller with the given samplers, started in order.
    pub fn new(
        source: Arc<dyn MetricsSource>,
        sink: S,
        timing: Timing,
        samplers: Vec<Box<dyn Sampler>>,
    ) -> Self {
        let (queue, dispatcher) = dispatch::channel();
        Self {
            state: LifecycleState::Initialized,
            running: RunningFlag::new(),
            timing,
            source,
            queue,
            dispatcher,
            sink: Some(sink),
            samplers,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Read handle on the running flag.
    pub fn running(&self) -> RunningFlag {
        self.running.clone()
    }

    /// Producer handle on the dispatch queue.
    pub fn queue(&self) -> DispatchQueue {
        self.queue.clone()
    }

    /// Spawn every sampler, the i-th one delayed by `i * stagger`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != LifecycleState::Initialized {
            return Err(SysmonError::InvalidTransition {
                from: self.state,
                to: LifecycleState::Running,
            });
        }
        self.running.set_running();
        self.state = LifecycleState::Running;

        let samplers = std::mem::take(&mut self.samplers);
        for (index, sampler) in samplers.into_iter().enumerate() {
            let kind = sampler.kind();
            let ticker = Ticker::new(self.timing.interval_for(kind), self.running.clone());
            let offset = self.timing.stagger * index as u32;
            let source = Arc::clone(&self.source);
            let queue = self.queue.clone();

            let spawned = thread::Builder::new()
                .name(format!("sampler-{kind}"))
                .spawn(move || run_sampler(sampler, source.as_ref(), &queue, &ticker, offset));
            match spawned {
                Ok(handle) => self.handles.push(handle),
                Err(err) => {
                    tracing::error!(metric = %kind, error = %err, "failed to spawn sampler");
                    self.shutdown();
                    return Err(err.into());
                }
            }
        }
        tracing::info!(samplers = self.handles.len(), "monitoring started");
        Ok(())
    }

    /// Run one dispatcher tick against the sink. Returns commands executed.
    pub fn tick(&mut self) -> usize {
        match self.sink.as_mut() {
            Some(sink) => self.dispatcher.tick(sink),
            None => 0,
        }
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> Option<&mut S> {
        self.sink.as_mut()
    }

    /// Total commands executed so far.
    pub fn executed(&self) -> u64 {
        self.dispatcher.executed()
    }

    /// Clear the running flag, stop dispatching and release the sink.
    ///
    /// Sampler threads are detached rather than joined; each one exits
    /// within a sleep slice of seeing the flag. Returns `None` if the sink
    /// was already released.
    pub fn shutdown(&mut self) -> Option<S> {
        if self.state == LifecycleState::Stopped {
            return None;
        }
        self.state = LifecycleState::Stopping;
        self.running.stop();
        self.dispatcher.stop();

        let detached = self.handles.drain(..).filter(|h| !h.is_finished()).count();
        self.state = LifecycleState::Stopped;
        tracing::info!(detached, "monitoring stopped");
        self.sink.take()
    }
}

impl<S: RenderSink> Drop for LifecycleController<S> {
    fn drop(&mut self) {
        self.running.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Instant;

    use parking_lot::Mutex;

    use crate::core::command::{ChartFrame, ChartId, LabelId};
    use crate::core::errors::SourceError;
    use crate::core::history::HISTORY_CAPACITY;
    use crate::core::sampler::sampler_for;
    use crate::core::types::{NetCounters, ProcessInfo};

    struct Offline;

    impl MetricsSource for Offline {
        fn cpu_percent(&self) -> std::result::Result<f64, SourceError> {
            Err(SourceError::Unavailable("cpu"))
        }
        fn memory_percent(&self) -> std::result::Result<f64, SourceError> {
            Err(SourceError::Unavailable("memory"))
        }
        fn disk_percent(&self) -> std::result::Result<f64, SourceError> {
            Err(SourceError::NoRootVolume)
        }
        fn net_counters(&self) -> std::result::Result<NetCounters, SourceError> {
            Err(SourceError::Unavailable("network"))
        }
        fn processes(
            &self,
        ) -> std::result::Result<Vec<std::result::Result<ProcessInfo, SourceError>>, SourceError>
        {
            Err(SourceError::Unavailable("processes"))
        }
        fn thread_count(&self) -> std::result::Result<usize, SourceError> {
            Err(SourceError::Unavailable("threads"))
        }
        fn process_count(&self) -> std::result::Result<usize, SourceError> {
            Err(SourceError::Unavailable("processes"))
        }
    }

    #[derive(Default)]
    struct NullSink;

    impl RenderSink for NullSink {
        fn set_label(&mut self, _label: LabelId, _text: String) {}
        fn replace_text(&mut self, _text: String) {}
        fn redraw_chart(&mut self, _chart: ChartId, _frame: ChartFrame) {}
    }

    /// Remembers when each metric was first read. Every read fails.
    #[derive(Default)]
    struct FirstReads(Mutex<HashMap<MetricKind, Instant>>);

    impl FirstReads {
        fn stamp<T>(&self, kind: MetricKind) -> std::result::Result<T, SourceError> {
            self.0.lock().entry(kind).or_insert_with(Instant::now);
            Err(SourceError::Unavailable(kind.name()))
        }

        fn snapshot(&self) -> HashMap<MetricKind, Instant> {
            self.0.lock().clone()
        }
    }

    impl MetricsSource for FirstReads {
        fn cpu_percent(&self) -> std::result::Result<f64, SourceError> {
            self.stamp(MetricKind::Cpu)
        }
        fn memory_percent(&self) -> std::result::Result<f64, SourceError> {
            self.stamp(MetricKind::Ram)
        }
        fn disk_percent(&self) -> std::result::Result<f64, SourceError> {
            self.stamp(MetricKind::Disk)
        }
        fn net_counters(&self) -> std::result::Result<NetCounters, SourceError> {
            self.stamp(MetricKind::Network)
        }
        fn processes(
            &self,
        ) -> std::result::Result<Vec<std::result::Result<ProcessInfo, SourceError>>, SourceError>
        {
            self.stamp(MetricKind::ProcessList)
        }
        fn thread_count(&self) -> std::result::Result<usize, SourceError> {
            self.stamp(MetricKind::ThreadCount)
        }
        fn process_count(&self) -> std::result::Result<usize, SourceError> {
            self.stamp(MetricKind::ProcessCount)
        }
    }

    fn all_samplers() -> Vec<Box<dyn Sampler>> {
        MetricKind::ALL
            .into_iter()
            .map(|kind| sampler_for(kind, HISTORY_CAPACITY))
            .collect()
    }

    fn controller() -> LifecycleController<NullSink> {
        let timing = Timing {
            stagger: Duration::from_millis(1),
            fast_interval: Duration::from_millis(5),
            slow_interval: Duration::from_millis(10),
        };
        LifecycleController::new(Arc::new(Offline), NullSink, timing, all_samplers())
    }

    #[test]
    fn default_timing_matches_schedule() {
        let timing = Timing::default();
        assert_eq!(timing.interval_for(MetricKind::Cpu), Duration::from_secs(1));
        assert_eq!(timing.interval_for(MetricKind::Network), Duration::from_secs(1));
        assert_eq!(
            timing.interval_for(MetricKind::ProcessList),
            Duration::from_secs(5)
        );
        assert_eq!(timing.stagger, Duration::from_millis(200));
    }

    #[test]
    fn walks_through_states() {
        let mut controller = controller();
        assert_eq!(controller.state(), LifecycleState::Initialized);
        assert!(!controller.running().is_running());

        controller.start().unwrap();
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(controller.running().is_running());

        let sink = controller.shutdown();
        assert!(sink.is_some());
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert!(!controller.running().is_running());
        assert!(controller.sink().is_none());
        assert!(controller.shutdown().is_none());
    }

    #[test]
    fn cannot_start_twice_or_after_stop() {
        let mut controller = controller();
        controller.start().unwrap();
        assert!(matches!(
            controller.start(),
            Err(SysmonError::InvalidTransition {
                from: LifecycleState::Running,
                to: LifecycleState::Running
            })
        ));
        controller.shutdown();
        assert!(controller.start().is_err());
    }

    #[test]
    fn failing_source_produces_no_commands() {
        let mut controller = controller();
        controller.start().unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(controller.tick(), 0);
        controller.shutdown();
    }

    #[test]
    fn samplers_start_staggered_in_order() {
        let stagger = Duration::from_millis(40);
        let timing = Timing {
            stagger,
            fast_interval: Duration::from_secs(1),
            slow_interval: Duration::from_secs(1),
        };
        let source = Arc::new(FirstReads::default());
        let mut controller = LifecycleController::new(
            Arc::clone(&source) as Arc<dyn MetricsSource>,
            NullSink,
            timing,
            all_samplers(),
        );

        let started = Instant::now();
        controller.start().unwrap();
        let deadline = started + Duration::from_secs(5);
        while source.snapshot().len() < MetricKind::ALL.len() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        controller.shutdown();

        let first = source.snapshot();
        let times: Vec<Instant> = MetricKind::ALL
            .iter()
            .map(|kind| *first.get(kind).unwrap_or_else(|| panic!("{kind} never read")))
            .collect();
        for (index, at) in times.iter().enumerate() {
            assert!(
                *at >= started + stagger * index as u32,
                "{} read {:?} after start",
                MetricKind::ALL[index],
                at.duration_since(started)
            );
        }
        for pair in times.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
