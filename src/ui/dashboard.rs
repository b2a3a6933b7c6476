use std::collections::HashMap;

use crate::core::command::{ChartFrame, ChartId, LabelId, RenderSink};

/// Widget state for the terminal dashboard.
///
/// Only mutated by the dispatcher and key handling, both on the UI thread.
#[derive(Debug, Clone)]
pub struct Dashboard {
    labels: HashMap<LabelId, String>,
    charts: HashMap<ChartId, ChartFrame>,
    process_text: String,
    scroll: u16,
}

impl Default for Dashboard {
    fn default() -> Self {
        let labels = [
            (LabelId::Cpu, "CPU: 0%"),
            (LabelId::Ram, "RAM: 0%"),
            (LabelId::Disk, "Disk: 0%"),
            (LabelId::Network, "Net: Sent 0 B, Received 0 B"),
            (LabelId::Threads, "Threads: 0"),
            (LabelId::Processes, "Processes: 0"),
        ]
        .into_iter()
        .map(|(id, text)| (id, text.to_string()))
        .collect();

        Self {
            labels,
            charts: HashMap::new(),
            process_text: String::new(),
            scroll: 0,
        }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self, label: LabelId) -> &str {
        self.labels.get(&label).map(String::as_str).unwrap_or_default()
    }

    /// Last frame drawn for a chart, if any sample has arrived yet.
    pub fn chart(&self, chart: ChartId) -> Option<&ChartFrame> {
        self.charts.get(&chart)
    }

    pub fn process_text(&self) -> &str {
        &self.process_text
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    fn max_scroll(&self) -> u16 {
        let lines = self.process_text.lines().count();
        u16::try_from(lines.saturating_sub(1)).unwrap_or(u16::MAX)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }
}

impl RenderSink for Dashboard {
    fn set_label(&mut self, label: LabelId, text: String) {
        self.labels.insert(label, text);
    }

    fn replace_text(&mut self, text: String) {
        self.process_text = text;
        // Keep the viewport where the user left it unless the list shrank.
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn redraw_chart(&mut self, chart: ChartId, frame: ChartFrame) {
        self.charts.insert(chart, frame);
    }
}
