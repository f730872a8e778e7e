// Plain-text rendering of a dashboard snapshot for non-interactive output

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::core::fleet::{DashboardSnapshot, RowView};
use crate::ui::formatters::{format_relative, format_rounded, is_past, LOADING, MISSING};

const HEADERS: [&str; 4] = ["Device", "Next Service Due", "Hours Till Service", "Kms Till Service"];

/// Text of each column for one row, before colouring.
pub fn row_cells(row: &RowView, now: DateTime<Utc>) -> [String; 4] {
    let values = &row.values;
    if values.is_loading {
        return [
            row.device.name.clone(),
            LOADING.to_string(),
            LOADING.to_string(),
            LOADING.to_string(),
        ];
    }
    [
        row.device.name.clone(),
        values
            .next_service_est
            .map(|ts| format_relative(ts, now))
            .unwrap_or_else(|| MISSING.to_string()),
        format_rounded(values.hours_till_next_service),
        format_rounded(values.kms_till_next_service),
    ]
}

/// Render the snapshot as an aligned table.
pub fn render_snapshot(snapshot: &DashboardSnapshot, now: DateTime<Utc>) -> String {
    if snapshot.config_loading {
        return "Loading devices...".dimmed().to_string();
    }
    if snapshot.rows.is_empty() {
        return "No devices configured".dimmed().to_string();
    }

    let cells: Vec<[String; 4]> = snapshot.rows.iter().map(|row| row_cells(row, now)).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    out.push_str(&header.join("  ").bold().to_string());
    out.push('\n');

    for (row, texts) in snapshot.rows.iter().zip(cells.iter()) {
        let overdue = row
            .values
            .next_service_est
            .is_some_and(|ts| !row.values.is_loading && is_past(ts, now));

        let line: Vec<String> = texts
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (text, w))| {
                let padded = format!("{:<w$}", text, w = *w);
                if i == 1 && overdue {
                    padded.red().bold().to_string()
                } else if row.values.is_loading && i > 0 {
                    padded.dimmed().to_string()
                } else {
                    padded
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        if row.pending {
            out.push_str(&format!("  {}", "(resetting)".dimmed()));
        }
        out.push('\n');
    }

    out
}
