//! Terminal rendering of the dashboard.

mod dashboard;

pub use dashboard::Dashboard;

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::core::command::{ChartId, LabelId};
use crate::core::history::HISTORY_CAPACITY;

const CHARTS: [(ChartId, &str, Color); 3] = [
    (ChartId::Cpu, "CPU Usage", Color::Cyan),
    (ChartId::Ram, "RAM Usage", Color::Green),
    (ChartId::Disk, "Disk Usage", Color::Yellow),
];

/// Draw the whole dashboard into `f`.
pub fn render(f: &mut Frame, dashboard: &Dashboard) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Resource labels
            Constraint::Length(3), // System info
            Constraint::Min(8),    // Processes + charts
            Constraint::Length(1), // Key hints
        ])
        .split(f.area());

    render_resources(f, rows[0], dashboard);
    render_system_info(f, rows[1], dashboard);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[2]);
    render_processes(f, body[0], dashboard);
    render_charts(f, body[1], dashboard);

    let hints = Paragraph::new("q/Esc quit  ↑/↓ PgUp/PgDn Home scroll processes")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hints, rows[3]);
}

fn render_resources(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let line = Line::from(vec![
        Span::styled(dashboard.label(LabelId::Cpu), Style::default().fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(dashboard.label(LabelId::Ram), Style::default().fg(Color::Green)),
        Span::raw("   "),
        Span::styled(dashboard.label(LabelId::Disk), Style::default().fg(Color::Yellow)),
        Span::raw("   "),
        Span::raw(dashboard.label(LabelId::Network)),
    ]);
    let widget = Paragraph::new(line).block(
        Block::default()
            .title(" System Monitor ")
            .borders(Borders::ALL),
    );
    f.render_widget(widget, area);
}

fn render_system_info(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let line = Line::from(vec![
        Span::raw(dashboard.label(LabelId::Threads)),
        Span::raw("   "),
        Span::raw(dashboard.label(LabelId::Processes)),
        Span::raw("   "),
        Span::styled(
            Local::now().format("%H:%M:%S").to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(widget, area);
}

fn render_processes(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let widget = Paragraph::new(dashboard.process_text())
        .scroll((dashboard.scroll(), 0))
        .block(Block::default().title(" Processes ").borders(Borders::ALL));
    f.render_widget(widget, area);
}

fn render_charts(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    for ((chart, placeholder, color), slot) in CHARTS.into_iter().zip(slots.iter()) {
        let Some(frame) = dashboard.chart(chart) else {
            let waiting = Paragraph::new("Waiting for data...").block(
                Block::default()
                    .title(format!(" {placeholder} "))
                    .borders(Borders::ALL),
            );
            f.render_widget(waiting, *slot);
            continue;
        };

        let points: Vec<(f64, f64)> = frame
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points);

        let widget = Chart::new(vec![dataset])
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" {} ", frame.title),
                        Style::default().add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL),
            )
            .x_axis(
                Axis::default()
                    .title(frame.x_label.as_str())
                    .bounds([0.0, (HISTORY_CAPACITY - 1) as f64])
                    .labels(vec![
                        Span::raw("0"),
                        Span::raw(format!("{}", HISTORY_CAPACITY - 1)),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title(frame.y_label.as_str())
                    .bounds([0.0, 100.0])
                    .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")]),
            );
        f.render_widget(widget, *slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{Command, RenderSink};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(dashboard: &Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, dashboard)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_labels_and_placeholders() {
        let mut dashboard = Dashboard::new();
        dashboard.set_label(LabelId::Cpu, "CPU: 12.5%".into());
        let text = screen(&dashboard);
        assert!(text.contains("CPU: 12.5%"));
        assert!(text.contains("Threads: 0"));
        assert!(text.contains("Waiting for data..."));
    }

    #[test]
    fn renders_chart_and_process_list() {
        let mut dashboard = Dashboard::new();
        Command::chart(
            ChartId::Cpu,
            "CPU Usage",
            "Time (s)",
            "Usage (%)",
            vec![10.0, 20.0, 30.0],
        )
        .execute(&mut dashboard);
        Command::replace_text("init (PID: 1) - RAM: 2.00 KiB\n").execute(&mut dashboard);
        let text = screen(&dashboard);
        assert!(text.contains("CPU Usage"));
        assert!(text.contains("init (PID: 1) - RAM: 2.00 KiB"));
    }
}
