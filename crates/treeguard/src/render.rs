//! Text rendering of reports. Color is a capability: [`NoPaint`] unless the
//! user wants color and stdout is a terminal.

use chrono::{DateTime, Local};
use colored::Colorize;
use std::io::IsTerminal;
use treeguard_core::report::human_size;
use treeguard_core::{ChangeKind, Report, ReportEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Info,
    Added,
    Deleted,
    Modified,
    Moved,
}

pub trait Paint: Send + Sync {
    fn paint(&self, text: &str, tone: Tone) -> String;
}

pub struct NoPaint;

impl Paint for NoPaint {
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}

pub struct AnsiPaint;

impl Paint for AnsiPaint {
    fn paint(&self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Ok | Tone::Added => text.green().to_string(),
            Tone::Info => text.cyan().to_string(),
            Tone::Deleted => text.red().to_string(),
            Tone::Modified => text.yellow().to_string(),
            Tone::Moved => text.blue().to_string(),
        }
    }
}

pub fn select_paint(color: bool) -> Box<dyn Paint> {
    if color && std::io::stdout().is_terminal() {
        Box::new(AnsiPaint)
    } else {
        Box::new(NoPaint)
    }
}

pub fn format_time(epoch_secs: f64) -> String {
    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1e9) as u32;
    match DateTime::from_timestamp(secs as i64, nanos) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("{epoch_secs}"),
    }
}

pub fn render_report(report: &Report, paint: &dyn Paint, show_size: bool) -> String {
    let summary = match report {
        Report::NoChanges => return paint.paint("✔ No changes detected.", Tone::Ok),
        Report::Changes(summary) => summary,
    };

    let groups = [
        (ChangeKind::Moved, "Moved files", Tone::Moved, summary.counts.moved),
        (ChangeKind::Added, "Added files", Tone::Added, summary.counts.added),
        (ChangeKind::Deleted, "Deleted files", Tone::Deleted, summary.counts.deleted),
        (ChangeKind::Modified, "Modified files", Tone::Modified, summary.counts.modified),
    ];

    let mut lines = Vec::with_capacity(summary.entries.len() + groups.len() * 2);
    for (kind, title, tone, count) in groups {
        if count == 0 {
            continue;
        }
        lines.push(String::new());
        lines.push(paint.paint(&format!("{title} ({count}):"), tone));
        for entry in summary.entries_of(kind) {
            lines.push(render_entry(entry, show_size));
        }
    }
    // drop the leading blank separator
    lines.remove(0);
    lines.join("\n")
}

fn render_entry(entry: &ReportEntry, show_size: bool) -> String {
    let size = match (show_size, entry.size) {
        (true, Some(bytes)) => format!(" [{}]", human_size(bytes)),
        _ => String::new(),
    };
    let mtime = entry
        .mtime
        .map(|t| format!(" (mtime: {})", format_time(t)))
        .unwrap_or_default();
    match entry.kind {
        ChangeKind::Moved => format!(
            "  {} → {}{size}",
            entry.moved_from.as_deref().unwrap_or("?"),
            entry.path
        ),
        ChangeKind::Added => format!("  + {}{size}{mtime}", entry.path),
        ChangeKind::Deleted => format!("  - {}", entry.path),
        ChangeKind::Modified => format!("  * {}{size}{mtime}", entry.path),
    }
}
