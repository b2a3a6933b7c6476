//! Multi-producer handoff between samplers and the rendering thread.

use std::time::Duration;

use crate::core::command::{Command, RenderSink};

/// How often the dispatcher drains the queue.
pub const DISPATCH_TICK: Duration = Duration::from_millis(100);

/// Create a connected queue and dispatcher.
pub fn channel() -> (DispatchQueue, Dispatcher) {
    let (tx, rx) = flume::unbounded();
    (
        DispatchQueue { tx },
        Dispatcher {
            rx,
            stopped: false,
            executed: 0,
        },
    )
}

/// Producer side. Cheap to clone, one per sampler.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: flume::Sender<Command>,
}

impl DispatchQueue {
    /// Queue a command. Never blocks.
    ///
    /// Once the dispatcher is gone the command is silently dropped; this only
    /// happens during shutdown.
    pub fn enqueue(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::trace!("dispatcher gone, dropping command");
        }
    }
}

/// Consumer side. Lives on the rendering thread.
#[derive(Debug)]
pub struct Dispatcher {
    rx: flume::Receiver<Command>,
    stopped: bool,
    executed: u64,
}

impl Dispatcher {
    /// Remove and return everything queued so far, oldest first.
    pub fn drain_all(&mut self) -> Vec<Command> {
        self.rx.drain().collect()
    }

    /// One dispatcher tick: drain the queue and execute every command in
    /// order. Returns how many commands ran. Does nothing once stopped.
    pub fn tick(&mut self, sink: &mut dyn RenderSink) -> usize {
        if self.stopped {
            return 0;
        }
        let commands = self.drain_all();
        let count = commands.len();
        for command in commands {
            command.execute(sink);
        }
        self.executed += count as u64;
        count
    }

    /// Stop executing commands. Anything queued afterwards is never run.
    pub fn stop(&mut self) {
        if !self.stopped {
            tracing::debug!(
                executed = self.executed,
                pending = self.rx.len(),
                "dispatcher stopped"
            );
        }
        self.stopped = true;
    }

    /// Total commands executed since creation.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{ChartFrame, ChartId, LabelId};
    use std::thread;

    #[derive(Default)]
    struct Labels(Vec<String>);

    impl RenderSink for Labels {
        fn set_label(&mut self, _label: LabelId, text: String) {
            self.0.push(text);
        }

        fn replace_text(&mut self, _text: String) {}

        fn redraw_chart(&mut self, _chart: ChartId, _frame: ChartFrame) {}
    }

    #[test]
    fn drain_on_empty_queue_is_empty() {
        let (_queue, mut dispatcher) = channel();
        assert!(dispatcher.drain_all().is_empty());
    }

    #[test]
    fn tick_executes_in_enqueue_order() {
        let (queue, mut dispatcher) = channel();
        for text in ["a", "b", "c"] {
            queue.enqueue(Command::label(LabelId::Cpu, text));
        }
        let mut sink = Labels::default();
        assert_eq!(dispatcher.tick(&mut sink), 3);
        assert_eq!(sink.0, vec!["a", "b", "c"]);
        assert!(dispatcher.drain_all().is_empty());
        assert_eq!(dispatcher.executed(), 3);
    }

    #[test]
    fn stopped_dispatcher_executes_nothing() {
        let (queue, mut dispatcher) = channel();
        dispatcher.stop();
        queue.enqueue(Command::label(LabelId::Ram, "late"));
        let mut sink = Labels::default();
        assert_eq!(dispatcher.tick(&mut sink), 0);
        assert!(sink.0.is_empty());
        assert_eq!(dispatcher.executed(), 0);
    }

    #[test]
    fn enqueue_after_dispatcher_dropped_is_silent() {
        let (queue, dispatcher) = channel();
        drop(dispatcher);
        queue.enqueue(Command::replace_text("lost"));
    }

    #[test]
    fn concurrent_producers_each_delivered_once_in_order() {
        const PRODUCERS: usize = 6;
        const PER_PRODUCER: usize = 500;

        let (queue, mut dispatcher) = channel();
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue(Command::label(LabelId::Threads, format!("{p}:{i}")));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while seen.len() < PRODUCERS * PER_PRODUCER {
            seen.extend(dispatcher.drain_all());
            thread::yield_now();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        seen.extend(dispatcher.drain_all());
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);

        let mut next = vec![0usize; PRODUCERS];
        for command in seen {
            let Command::SetLabel { text, .. } = command else {
                panic!("unexpected command");
            };
            let (p, i) = text.split_once(':').unwrap();
            let (p, i): (usize, usize) = (p.parse().unwrap(), i.parse().unwrap());
            assert_eq!(i, next[p], "producer {p} out of order");
            next[p] += 1;
        }
        assert!(next.iter().all(|&n| n == PER_PRODUCER));
    }
}
