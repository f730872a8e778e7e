use chrono::{DateTime, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

use super::app::DashboardApp;
use crate::core::fleet::RowView;
use crate::ui::formatters::{
    format_absolute, format_relative, format_rounded, is_past, LOADING, MISSING,
};

/// Below this width the hours and kms columns are hidden.
const NARROW_WIDTH: u16 = 80;

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &DashboardApp, now: DateTime<Utc>) {
    let area = frame.area();

    let detail_height = if app.expanded.is_empty() {
        0
    } else {
        (app.expanded.len().min(6) * 2 + 2) as u16
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Min(3),                // Device table
            Constraint::Length(detail_height), // Details of expanded rows
            Constraint::Length(1),             // Footer
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_table(frame, chunks[1], app, now);
    if detail_height > 0 {
        render_details(frame, chunks[2], app, now);
    }
    render_footer(frame, chunks[3]);

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &DashboardApp) {
    let snapshot = &app.snapshot;
    let status = if snapshot.config_loading {
        "loading".to_string()
    } else {
        let pending = snapshot.rows.iter().filter(|row| row.pending).count();
        if pending > 0 {
            format!("{} devices │ {} resetting", snapshot.rows.len(), pending)
        } else {
            format!("{} devices", snapshot.rows.len())
        }
    };

    let title = format!(" Fleet maintenance │ agent {} │ {} ", app.agent_id, status);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(block, area);
}

fn render_table(frame: &mut Frame, area: Rect, app: &DashboardApp, now: DateTime<Utc>) {
    let block = Block::default().title(" Devices ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.snapshot.config_loading {
        let para = Paragraph::new("Loading devices...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(para, inner);
        return;
    }

    let narrow = area.width < NARROW_WIDTH;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut header_cells = vec![Cell::from("Device"), Cell::from("Next Service Due")];
    if !narrow {
        header_cells.push(Cell::from("Hours Till Service"));
        header_cells.push(Cell::from("Kms Till Service"));
    }
    header_cells.push(Cell::from("Action"));
    let header = Row::new(header_cells).style(bold).height(1);

    let widths: Vec<Constraint> = if narrow {
        vec![
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Length(9),
        ]
    } else {
        vec![
            Constraint::Percentage(28),
            Constraint::Percentage(24),
            Constraint::Length(19),
            Constraint::Length(17),
            Constraint::Length(9),
        ]
    };

    let rows: Vec<Row> = if app.snapshot.rows.is_empty() {
        vec![Row::new(vec![Cell::from("No devices configured")])
            .style(Style::default().fg(Color::DarkGray))]
    } else {
        app.snapshot
            .rows
            .iter()
            .map(|row| device_row(row, narrow, now))
            .collect()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !app.snapshot.rows.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, inner, &mut state);
}

fn device_row(row: &RowView, narrow: bool, now: DateTime<Utc>) -> Row<'static> {
    let values = &row.values;
    let mut cells = vec![Cell::from(row.device.name.clone())];

    if values.is_loading {
        cells.push(Cell::from(LOADING).style(Style::default().fg(Color::DarkGray)));
        if !narrow {
            cells.push(Cell::from(LOADING).style(Style::default().fg(Color::DarkGray)));
            cells.push(Cell::from(LOADING).style(Style::default().fg(Color::DarkGray)));
        }
    } else {
        cells.push(due_cell(values.next_service_est, now));
        if !narrow {
            cells.push(Cell::from(format_rounded(values.hours_till_next_service)));
            cells.push(Cell::from(format_rounded(values.kms_till_next_service)));
        }
    }

    cells.push(if row.pending {
        Cell::from("...").style(Style::default().fg(Color::DarkGray))
    } else {
        Cell::from("Service").style(Style::default().fg(Color::Green))
    });

    Row::new(cells)
}

/// Relative due date; overdue dates are shown in red.
fn due_cell(timestamp_ms: Option<f64>, now: DateTime<Utc>) -> Cell<'static> {
    match timestamp_ms {
        Some(ts) => {
            let style = if is_past(ts, now) {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Cell::from(format_relative(ts, now)).style(style)
        }
        None => Cell::from(MISSING),
    }
}

fn render_details(frame: &mut Frame, area: Rect, app: &DashboardApp, now: DateTime<Utc>) {
    let block = Block::default()
        .title(" Details [Enter:toggle] ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for row in app
        .snapshot
        .rows
        .iter()
        .filter(|row| app.expanded.contains(&row.device.id))
        .take(6)
    {
        lines.extend(detail_lines(row, now));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn detail_lines(row: &RowView, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let values = &row.values;
    let label = Style::default().fg(Color::DarkGray);

    let last_service = match values.last_service_date {
        Some(ts) => format!("{} ({})", format_relative(ts, now), format_absolute(ts)),
        None => MISSING.to_string(),
    };

    vec![
        Line::from(vec![
            Span::styled(row.device.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  /agent/{}", row.device.id), label),
        ]),
        Line::from(vec![
            Span::styled("  hours ", label),
            Span::raw(format_rounded(values.hours_till_next_service)),
            Span::styled("  kms ", label),
            Span::raw(format_rounded(values.kms_till_next_service)),
            Span::styled("  last service ", label),
            Span::raw(last_service),
        ]),
    ]
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let help = " q: Quit │ ?: Help │ ↑↓: Select │ Enter: Details │ s: Service ";
    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_text = r#"
    Fleet Maintenance - Help

    Keyboard Shortcuts:
    ─────────────────────────────────────
    q / Esc       Quit
    ↑ / k         Previous device
    ↓ / j         Next device
    Enter         Show or hide device details
    s / Space     Reset service counters
    ?             Toggle this help screen

    Press any key to close this help
    "#;

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::DarkGray));

    let paragraph = Paragraph::new(help_text).block(block).alignment(Alignment::Left);

    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);

    center
}
