//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::types::{Partition, PartitionReport};

/// Format a PartitionReport for human-readable terminal output.
///
/// Uses ANSI colors and Unicode box drawing. Complete runs get a check mark;
/// runs that left residue get a warning symbol and list the unplaced events.
pub fn format_report(report: &PartitionReport) -> String {
    let mut output = String::new();

    let header = if report.is_complete() {
        format!("{} {}", "\u{2713}".green().bold(), "ALL EVENTS PLACED".green().bold())
    } else {
        format!(
            "{} {}",
            "\u{26A0}".yellow().bold(),
            "UNRESOLVED EVENTS".red().bold()
        )
    };

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&header));
    output.push_str(&format_box_separator());

    let stats = &report.stats;
    output.push_str(&format_box_line(&format!(
        "Partitions: {} ({} events, largest {})",
        report.partitions.len(),
        report.placed_events(),
        report.largest_partition()
    )));
    output.push_str(&format_box_line(&format!(
        "Rounds: {} ({} stagnated, {} shrinks)",
        stats.rounds, stats.stagnated_rounds, stats.shrinks
    )));
    output.push_str(&format_box_line(&format!(
        "Oracle calls: {} ({} accepted)",
        stats.oracle_calls, stats.accepted_calls
    )));
    output.push_str(&format_box_line(&format!(
        "Runtime: {:.1}s",
        stats.elapsed.as_secs_f64()
    )));

    if !report.partitions.is_empty() {
        output.push_str(&format_box_separator());
        for (i, partition) in report.partitions.iter().enumerate() {
            for line in format_partition(i, partition) {
                output.push_str(&format_box_line(&line));
            }
        }
    }

    if !report.residue.is_empty() {
        output.push_str(&format_box_separator());
        output.push_str(&format_box_line(&"Residue:".red().bold().to_string()));
        for event in &report.residue {
            output.push_str(&format_box_line(&format!("  {}", event.name().red())));
        }
    }

    output.push_str(&format_box_bottom());

    if !report.residue.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            "Residue events were rejected even as single-event groups."
                .dimmed()
                .italic()
        ));
    }

    output
}

/// One partition, wrapped to fit the box.
fn format_partition(index: usize, partition: &Partition) -> Vec<String> {
    let label = format!("#{:<3}", index);
    let mut lines = Vec::new();
    let mut current = format!("{} ", label.bold());
    let mut visible = label.len() + 1;

    for (i, event) in partition.events().iter().enumerate() {
        let piece = if i + 1 < partition.len() {
            format!("{}, ", event)
        } else {
            event.to_string()
        };
        if visible + piece.len() > BOX_WIDTH - 2 && visible > label.len() + 1 {
            lines.push(current);
            current = " ".repeat(label.len() + 1);
            visible = label.len() + 1;
        }
        visible += piece.len();
        current.push_str(&piece);
    }
    lines.push(current);
    lines
}

// Box drawing helpers

const BOX_WIDTH: usize = 60;

fn format_box_top() -> String {
    format!("\u{250C}{}\u{2510}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_bottom() -> String {
    format!("\u{2514}{}\u{2518}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_separator() -> String {
    format!("\u{251C}{}\u{2524}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_line(content: &str) -> String {
    let visible_len = strip_ansi_codes(content).chars().count();
    let padding = (BOX_WIDTH - 2).saturating_sub(visible_len);
    format!("\u{2502} {}{} \u{2502}\n", content, " ".repeat(padding))
}

/// Strip ANSI escape codes for accurate length calculation.
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // skip to the 'm' that ends the sequence
            while let Some(&next) = chars.peek() {
                chars.next();
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
