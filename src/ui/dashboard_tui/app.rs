use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::fleet::{DashboardRuntime, DashboardSnapshot, RowView, UiCommand};

use super::event_handler::DashboardEvent;
use super::render::render_ui;

/// How long to wait for a key before checking for a new snapshot.
const INPUT_POLL: Duration = Duration::from_millis(200);

/// Dashboard application state
pub struct DashboardApp {
    pub snapshot: Arc<DashboardSnapshot>,
    pub selected: usize,
    /// Devices whose detail line is open, by id
    pub expanded: HashSet<String>,
    pub show_help: bool,
    pub should_quit: bool,
    pub agent_id: String,
}

impl DashboardApp {
    pub fn new(agent_id: impl Into<String>, snapshot: Arc<DashboardSnapshot>) -> Self {
        let mut app = Self {
            snapshot: Arc::new(DashboardSnapshot::default()),
            selected: 0,
            expanded: HashSet::new(),
            show_help: false,
            should_quit: false,
            agent_id: agent_id.into(),
        };
        app.set_snapshot(snapshot);
        app
    }

    /// Take a new snapshot, keeping the cursor on the same device when it
    /// is still listed.
    pub fn set_snapshot(&mut self, snapshot: Arc<DashboardSnapshot>) {
        let selected_id = self.selected_row().map(|row| row.device.id.clone());
        self.snapshot = snapshot;

        let rows = &self.snapshot.rows;
        self.expanded
            .retain(|id| rows.iter().any(|row| &row.device.id == id));

        self.selected = selected_id
            .and_then(|id| rows.iter().position(|row| row.device.id == id))
            .unwrap_or(self.selected)
            .min(rows.len().saturating_sub(1));
    }

    pub fn selected_row(&self) -> Option<&RowView> {
        self.snapshot.rows.get(self.selected)
    }

    /// Apply an input event; returns a command for the runtime when the
    /// event asks for one.
    pub fn handle_event(&mut self, event: DashboardEvent) -> Option<UiCommand> {
        if self.show_help && event != DashboardEvent::None {
            self.show_help = false;
            return None;
        }

        match event {
            DashboardEvent::Quit => self.should_quit = true,
            DashboardEvent::ToggleHelp => self.show_help = true,
            DashboardEvent::Up => self.selected = self.selected.saturating_sub(1),
            DashboardEvent::Down => {
                let max_index = self.snapshot.rows.len().saturating_sub(1);
                if self.selected < max_index {
                    self.selected += 1;
                }
            }
            DashboardEvent::ToggleDetails => {
                if let Some(id) = self.selected_row().map(|row| row.device.id.clone()) {
                    if !self.expanded.remove(&id) {
                        self.expanded.insert(id);
                    }
                }
            }
            DashboardEvent::ResetService => {
                let row = self.selected_row()?;
                if row.pending {
                    return None;
                }
                return Some(UiCommand::ResetService(row.device.id.clone()));
            }
            DashboardEvent::None => {}
        }
        None
    }
}

/// Run the dashboard TUI until the user quits.
///
/// Redraws only when a new snapshot arrives or a key is pressed.
pub fn run_dashboard_app(runtime: &mut DashboardRuntime, agent_id: &str) -> Result<()> {
    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let outcome = event_loop(&mut terminal, runtime, agent_id);

    // Restore terminal even when the loop failed
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    outcome
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut DashboardRuntime,
    agent_id: &str,
) -> Result<()> {
    let initial = runtime.snapshot_rx.borrow_and_update().clone();
    let mut app = DashboardApp::new(agent_id, initial);
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            let now = chrono::Utc::now();
            terminal.draw(|frame| render_ui(frame, &app, now))?;
            needs_redraw = false;
        }

        if event::poll(INPUT_POLL).context("Event poll failed")? {
            match event::read().context("Event read failed")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(command) = app.handle_event(DashboardEvent::from_key(key.code)) {
                        runtime.send(command);
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }

        match runtime.snapshot_rx.has_changed() {
            Ok(true) => {
                let snapshot = runtime.snapshot_rx.borrow_and_update().clone();
                app.set_snapshot(snapshot);
                needs_redraw = true;
            }
            Ok(false) => {}
            Err(_) => {
                log::warn!("dashboard runtime stopped");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fleet::{Device, DisplayValues};

    fn row(id: &str, pending: bool) -> RowView {
        RowView {
            device: Device::new(id, id.to_uppercase()),
            values: DisplayValues::default(),
            pending,
        }
    }

    fn snapshot(rows: Vec<RowView>) -> Arc<DashboardSnapshot> {
        Arc::new(DashboardSnapshot {
            config_loading: false,
            rows: Arc::new(rows),
            revision: 1,
            refresh_seq: 0,
        })
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut app = DashboardApp::new("hub", snapshot(vec![row("a", false), row("b", false)]));
        app.handle_event(DashboardEvent::Down);
        app.handle_event(DashboardEvent::Down);
        assert_eq!(app.selected, 1);
        app.handle_event(DashboardEvent::Up);
        app.handle_event(DashboardEvent::Up);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_cursor_follows_device_across_reorder() {
        let mut app = DashboardApp::new("hub", snapshot(vec![row("a", false), row("b", false)]));
        app.handle_event(DashboardEvent::Down);
        app.set_snapshot(snapshot(vec![row("b", false), row("a", false)]));
        assert_eq!(app.selected_row().unwrap().device.id, "b");
    }

    #[test]
    fn test_reset_skipped_while_pending() {
        let mut app = DashboardApp::new("hub", snapshot(vec![row("a", true), row("b", false)]));
        assert_eq!(app.handle_event(DashboardEvent::ResetService), None);
        app.handle_event(DashboardEvent::Down);
        assert_eq!(
            app.handle_event(DashboardEvent::ResetService),
            Some(UiCommand::ResetService("b".to_string()))
        );
    }

    #[test]
    fn test_details_toggle_and_prune() {
        let mut app = DashboardApp::new("hub", snapshot(vec![row("a", false)]));
        app.handle_event(DashboardEvent::ToggleDetails);
        assert!(app.expanded.contains("a"));
        app.set_snapshot(snapshot(vec![row("b", false)]));
        assert!(app.expanded.is_empty());
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = DashboardApp::new("hub", snapshot(vec![row("a", false)]));
        app.handle_event(DashboardEvent::ToggleHelp);
        assert!(app.show_help);
        app.handle_event(DashboardEvent::Quit);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_empty_snapshot() {
        let mut app = DashboardApp::new("hub", snapshot(vec![]));
        assert!(app.selected_row().is_none());
        assert_eq!(app.handle_event(DashboardEvent::ResetService), None);
        app.handle_event(DashboardEvent::Down);
        assert_eq!(app.selected, 0);
    }
}
