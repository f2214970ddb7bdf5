// Output formatting utilities

use crate::models::{Attachment, BoardStats, ProjectSummary, Stage, Task};
use crate::utils::format_bytes;
use chrono::{Local, TimeZone};
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 { // Sanity check
                return width;
            }
        }
    }

    100
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Format date for display (date only, no time)
pub fn format_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "-".to_string(),
    }
}

fn header(columns: &str, width: usize) -> String {
    format!("{}\n{}\n", bold_if_tty(columns, is_tty()), "-".repeat(width))
}

/// Projects table
pub fn format_projects_table(projects: &[ProjectSummary]) -> String {
    if projects.is_empty() {
        return "No projects found.\n".to_string();
    }
    let mut out = header(
        &format!(
            "{:<6} {:<36} {:>6} {:>6} {:>6} {:<14}",
            "ID", "Title", "Stages", "Open", "Done", "Created"
        ),
        79,
    );
    for summary in projects {
        let project = &summary.project;
        out.push_str(&format!(
            "{:<6} {:<36} {:>6} {:>6} {:>6} {:<14}\n",
            project.id,
            project.title,
            summary.stage_count,
            summary.open_tasks,
            summary.done_tasks,
            format_date(project.created_ts)
        ));
    }
    out
}

/// Totals across all projects
pub fn format_stats(stats: &BoardStats) -> String {
    format!(
        "Projects:      {}\nTotal tasks:   {}\nPending tasks: {}\nDone tasks:    {}\n",
        stats.projects, stats.total_tasks, stats.pending_tasks, stats.done_tasks
    )
}

/// Stages table for one project
pub fn format_stages_table(stages: &[Stage], task_counts: &[(i64, i64)]) -> String {
    if stages.is_empty() {
        return "No stages found.\n".to_string();
    }
    let mut out = header(&format!("{:<6} {:<28} {:>8} {:>6}", "ID", "Name", "Position", "Tasks"), 51);
    for stage in stages {
        let count = task_counts
            .iter()
            .find(|(id, _)| *id == stage.id)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        out.push_str(&format!(
            "{:<6} {:<28} {:>8} {:>6}\n",
            stage.id, stage.name, stage.position, count
        ));
    }
    out
}

/// Detailed view of one task
pub fn format_task_detail(task: &Task, stage: Option<&Stage>, attachments: &[Attachment]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", bold_if_tty(&format!("Task {}: {}", task.id, task.title), is_tty())));
    out.push_str(&format!("  UUID:        {}\n", task.uuid));
    out.push_str(&format!(
        "  Stage:       {} (position {})\n",
        stage.map(|s| s.name.as_str()).unwrap_or("-"),
        task.position
    ));
    out.push_str(&format!("  Status:      {}\n", if task.done { "Done" } else { "To Do" }));
    out.push_str(&format!(
        "  Description: {}\n",
        task.description.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("  Created:     {}\n", format_timestamp(task.created_ts)));
    if !attachments.is_empty() {
        out.push_str("  Attachments:\n");
        for attachment in attachments {
            out.push_str(&format!(
                "    [{}] {} ({})\n",
                attachment.id,
                attachment.file_name,
                format_bytes(attachment.size_bytes)
            ));
        }
    }
    out
}

/// Attachments table for one task
pub fn format_attachments_table(attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return "No attachments\n".to_string();
    }
    let mut out = header(&format!("{:<6} {:<32} {:>10} {:<6}", "ID", "Name", "Size", "Kind"), 57);
    for attachment in attachments {
        out.push_str(&format!(
            "{:<6} {:<32} {:>10} {:<6}\n",
            attachment.id,
            attachment.file_name,
            format_bytes(attachment.size_bytes),
            if attachment.is_image() { "image" } else { "file" }
        ));
    }
    out
}
