use crossterm::event::KeyCode;

/// Events that can occur in the dashboard TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardEvent {
    Quit,
    ToggleHelp,
    /// Move the row cursor up
    Up,
    /// Move the row cursor down
    Down,
    /// Show or hide the detail line of the selected device
    ToggleDetails,
    /// Ask the selected device to reset its service counters
    ResetService,
    None,
}

impl DashboardEvent {
    pub fn from_key(code: KeyCode) -> Self {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => DashboardEvent::Quit,
            KeyCode::Char('?') => DashboardEvent::ToggleHelp,
            KeyCode::Up | KeyCode::Char('k') => DashboardEvent::Up,
            KeyCode::Down | KeyCode::Char('j') => DashboardEvent::Down,
            KeyCode::Enter => DashboardEvent::ToggleDetails,
            KeyCode::Char('s') | KeyCode::Char(' ') => DashboardEvent::ResetService,
            _ => DashboardEvent::None,
        }
    }
}
