//! Units of rendering work handed from samplers to the UI thread.

/// Named text labels on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelId {
    Cpu,
    Ram,
    Disk,
    Network,
    Threads,
    Processes,
}

/// Line charts on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartId {
    Cpu,
    Ram,
    Disk,
}

/// Everything needed to redraw one chart. Title and axis labels are
/// reapplied on every redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub values: Vec<f64>,
}

/// A self-contained update for one UI element.
///
/// Commands own their data. A chart redraw carries a copy of the history
/// taken when the command was built, never a reference to the live buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetLabel { label: LabelId, text: String },
    ReplaceText { text: String },
    RedrawChart { chart: ChartId, frame: ChartFrame },
}

impl Command {
    pub fn label(label: LabelId, text: impl Into<String>) -> Self {
        Command::SetLabel {
            label,
            text: text.into(),
        }
    }

    pub fn replace_text(text: impl Into<String>) -> Self {
        Command::ReplaceText { text: text.into() }
    }

    pub fn chart(
        chart: ChartId,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        Command::RedrawChart {
            chart,
            frame: ChartFrame {
                title: title.into(),
                x_label: x_label.into(),
                y_label: y_label.into(),
                values,
            },
        }
    }

    /// Apply this command to the sink. Must only run on the rendering thread.
    pub fn execute(self, sink: &mut dyn RenderSink) {
        match self {
            Command::SetLabel { label, text } => sink.set_label(label, text),
            Command::ReplaceText { text } => sink.replace_text(text),
            Command::RedrawChart { chart, frame } => sink.redraw_chart(chart, frame),
        }
    }
}

/// The presentation layer. Implementations are not thread safe and are only
/// ever driven from the dispatcher.
pub trait RenderSink {
    fn set_label(&mut self, label: LabelId, text: String);

    /// Replace the whole contents of the scrollable text area.
    fn replace_text(&mut self, text: String);

    fn redraw_chart(&mut self, chart: ChartId, frame: ChartFrame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl RenderSink for Recorder {
        fn set_label(&mut self, label: LabelId, text: String) {
            self.calls.push(format!("{label:?}={text}"));
        }

        fn replace_text(&mut self, text: String) {
            self.calls.push(format!("text={text}"));
        }

        fn redraw_chart(&mut self, chart: ChartId, frame: ChartFrame) {
            self.calls
                .push(format!("{chart:?}:{}:{:?}", frame.title, frame.values));
        }
    }

    #[test]
    fn execute_routes_to_matching_sink_call() {
        let mut sink = Recorder::default();
        Command::label(LabelId::Cpu, "CPU: 5.0%").execute(&mut sink);
        Command::replace_text("init (PID: 1)").execute(&mut sink);
        Command::chart(ChartId::Ram, "RAM Usage", "Time (s)", "Usage (%)", vec![1.0])
            .execute(&mut sink);
        assert_eq!(
            sink.calls,
            vec![
                "Cpu=CPU: 5.0%".to_string(),
                "text=init (PID: 1)".to_string(),
                "Ram:RAM Usage:[1.0]".to_string(),
            ]
        );
    }
}
