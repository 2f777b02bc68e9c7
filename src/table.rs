// Plain-text table for task listings

use crate::models::{Status, Task, timestamp};
use colored::Colorize;

const HEADERS: [&str; 5] = ["ID", "Description", "Status", "CreatedAt", "UpdatedAt"];

/// Render tasks as a bordered table, one row per task.
///
/// With `color` set, the status column is highlighted.
pub fn render(tasks: &[Task], color: bool) -> String {
    let rows: Vec<[String; 5]> = tasks
        .iter()
        .map(|task| {
            [
                task.id.clone(),
                task.description.clone(),
                task.status.to_string(),
                timestamp::format(&task.created_at),
                timestamp::format(&task.updated_at),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = "-".repeat(widths.iter().sum::<usize>() + 3 * widths.len() + 1);
    let mut out = String::new();

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&line(&HEADERS.map(String::from), &widths, |_, cell| cell));
    out.push_str(&rule);
    out.push('\n');
    for (task, row) in tasks.iter().zip(&rows) {
        out.push_str(&line(row, &widths, |column, cell| {
            if color && column == 2 {
                paint(task.status, &cell)
            } else {
                cell
            }
        }));
    }
    out.push_str(&rule);
    out.push('\n');

    out
}

fn line(cells: &[String; 5], widths: &[usize; 5], style: impl Fn(usize, String) -> String) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(column, (cell, width))| style(column, pad(cell, *width)))
        .collect();
    format!("| {} |\n", padded.join(" | "))
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.chars().count());
    format!("{}{}", cell, " ".repeat(fill))
}

fn paint(status: Status, cell: &str) -> String {
    match status {
        Status::Todo => cell.yellow().to_string(),
        Status::InProgress => cell.cyan().to_string(),
        Status::Done => cell.green().to_string(),
    }
}
