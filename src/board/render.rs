// Text rendering of a board: one section per stage, cards in display order

use chrono::{Local, TimeZone};
use serde::Serialize;
use crate::board::order::BoardOrder;
use crate::board::snapshot::BoardSnapshot;
use crate::models::Task;

pub const EMPTY_BOARD_MESSAGE: &str = "No stages created yet. Create a stage to get started.";
pub const EMPTY_STAGE_MESSAGE: &str = "No tasks";

/// Short card date, e.g. "Oct 16"
pub fn format_card_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%b %-d").to_string(),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn render_card(task: &Task, highlighted: bool, width: usize) -> Vec<String> {
    let marker = if highlighted { ">>" } else { "  " };
    let status = if task.done { "[x]" } else { "[ ]" };
    let date = format_card_date(task.created_ts);
    let prefix = format!("{} {} {:>4} ", marker, status, task.id);
    let title_width = width
        .saturating_sub(prefix.chars().count() + date.chars().count() + 1)
        .max(8);

    let mut lines = vec![format!(
        "{}{:<title_width$} {}",
        prefix,
        truncate(&task.title, title_width),
        date,
        title_width = title_width
    )];
    if let Some(description) = &task.description {
        let indent = " ".repeat(prefix.chars().count());
        lines.push(format!("{}{}", indent, truncate(description, title_width)));
    }
    lines
}

/// Render the board in `order`, taking card content from `snapshot`.
/// `highlighted` marks the card being dragged.
pub fn render_board(
    snapshot: &BoardSnapshot,
    order: &BoardOrder,
    highlighted: Option<i64>,
    width: usize,
) -> String {
    if snapshot.stages().is_empty() {
        return format!("{}\n", EMPTY_BOARD_MESSAGE);
    }

    let mut out = String::new();
    for stage in snapshot.stages() {
        let tasks: Vec<&Task> = order
            .column(stage.id)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| snapshot.task(*id))
            .collect();

        out.push_str(&format!("{} ({})\n", stage.name, tasks.len()));
        out.push_str(&format!("{}\n", "-".repeat(width.min(60))));
        if tasks.is_empty() {
            out.push_str(&format!("   {}\n", EMPTY_STAGE_MESSAGE));
        }
        for task in tasks {
            for line in render_card(task, highlighted == Some(task.id), width) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
pub struct StageView<'a> {
    pub id: i64,
    pub name: &'a str,
    pub position: i64,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Serialize)]
pub struct BoardView<'a> {
    pub project_id: i64,
    pub stages: Vec<StageView<'a>>,
}

/// Serializable view of the board in `order`
pub fn board_view<'a>(project_id: i64, snapshot: &'a BoardSnapshot, order: &BoardOrder) -> BoardView<'a> {
    let stages = snapshot
        .stages()
        .iter()
        .map(|stage| StageView {
            id: stage.id,
            name: &stage.name,
            position: stage.position,
            tasks: order
                .column(stage.id)
                .unwrap_or(&[])
                .iter()
                .filter_map(|id| snapshot.task(*id))
                .collect(),
        })
        .collect();
    BoardView { project_id, stages }
}
