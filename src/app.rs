//! Terminal host: owns the screen and runs the dispatcher on its thread.

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::MonitorConfig;
use crate::core::collector::MetricsSource;
use crate::core::errors::Result;
use crate::core::lifecycle::LifecycleController;
use crate::core::sampler::{sampler_for, Sampler};
use crate::core::types::MetricKind;
use crate::event::{AppEvent, EventHandler};
use crate::ui::{self, Dashboard};

const PAGE_SCROLL: u16 = 10;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ScrollUp(u16),
    ScrollDown(u16),
    ScrollTop,
    None,
}

pub fn key_action(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => KeyAction::ScrollUp(1),
        KeyCode::Down | KeyCode::Char('j') => KeyAction::ScrollDown(1),
        KeyCode::PageUp => KeyAction::ScrollUp(PAGE_SCROLL),
        KeyCode::PageDown => KeyAction::ScrollDown(PAGE_SCROLL),
        KeyCode::Home => KeyAction::ScrollTop,
        _ => KeyAction::None,
    }
}

/// The seven samplers in start order.
pub fn default_samplers(history_capacity: usize) -> Vec<Box<dyn Sampler>> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| sampler_for(kind, history_capacity))
        .collect()
}

pub struct App {
    config: MonitorConfig,
    controller: LifecycleController<Dashboard>,
}

impl App {
    pub fn new(config: MonitorConfig, source: Arc<dyn MetricsSource>) -> Self {
        let controller = LifecycleController::new(
            source,
            Dashboard::new(),
            config.timing,
            default_samplers(config.history_capacity),
        );
        Self { config, controller }
    }

    /// Take over the terminal, run until the user closes the dashboard,
    /// then restore the terminal.
    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Release the sink before handing the terminal back.
        drop(self.controller.shutdown());
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.controller.start()?;
        let mut events = EventHandler::new(self.config.tick_rate);

        loop {
            if let Some(dashboard) = self.controller.sink() {
                terminal.draw(|f| ui::render(f, dashboard))?;
            }

            match events.next_event()? {
                AppEvent::Tick => {
                    let executed = self.controller.tick();
                    if executed > 0 {
                        tracing::trace!(executed, "dispatched commands");
                    }
                }
                AppEvent::Input(key) => {
                    let Some(dashboard) = self.controller.sink_mut() else {
                        return Ok(());
                    };
                    match key_action(key) {
                        KeyAction::Quit => {
                            tracing::info!("close requested");
                            return Ok(());
                        }
                        KeyAction::ScrollUp(n) => dashboard.scroll_up(n),
                        KeyAction::ScrollDown(n) => dashboard.scroll_down(n),
                        KeyAction::ScrollTop => dashboard.scroll_to_top(),
                        KeyAction::None => {}
                    }
                }
            }
        }
    }
}
