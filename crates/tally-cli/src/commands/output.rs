//! Terminal and JSON renderings for one-shot commands.

use colored::Colorize;
use serde_json::{Value, json};
use tally_core::ranking::{SessionSummary, rank, total_votes};
use tally_core::session::Session;

const BAR_WIDTH: usize = 20;

/// A fixed-width bar for `percent` (0–100).
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn summary_line(summary: &SessionSummary) -> String {
    let leading = match &summary.leading {
        Some((emoji, title)) => format!("{emoji} {title}"),
        None => "no votes yet".dimmed().to_string(),
    };
    format!(
        "{}  {}  {} votes · {} choices · {}",
        short_id(&summary.id).dimmed(),
        summary.name.bold(),
        summary.total_votes,
        summary.choice_count,
        leading
    )
}

pub fn session_lines(session: &Session) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        session.name.bold(),
        format!("({} total votes)", total_votes(session)).dimmed()
    )];

    for entry in rank(&session.choices).entries {
        let choice = entry.choice;
        let bar = bar(entry.percent, BAR_WIDTH);
        let bar = if entry.is_leader {
            bar.yellow().to_string()
        } else {
            bar.cyan().to_string()
        };
        let badge = if entry.is_leader {
            format!(" {}", "LEADER".yellow().bold())
        } else {
            String::new()
        };
        lines.push(format!(
            "{:>2}. {} {}{}  {}  {}  {}",
            entry.rank + 1,
            choice.display_emoji(),
            choice.title,
            badge,
            bar,
            choice.votes,
            short_id(&choice.id).dimmed()
        ));
        if let Some(notes) = choice.notes() {
            lines.push(format!("      {}", notes.dimmed()));
        }
    }
    lines
}

pub fn summaries_json(summaries: &[SessionSummary]) -> Value {
    Value::Array(
        summaries
            .iter()
            .map(|summary| {
                json!({
                    "id": summary.id,
                    "name": summary.name,
                    "total_votes": summary.total_votes,
                    "choice_count": summary.choice_count,
                    "leading": summary.leading.as_ref().map(|(emoji, title)| {
                        json!({ "emoji": emoji, "title": title })
                    }),
                })
            })
            .collect(),
    )
}

/// The stored session plus its ranking.
pub fn session_json(session: &Session) -> Value {
    let ranking = rank(&session.choices);
    json!({
        "session": session,
        "total_votes": total_votes(session),
        "ranking": ranking
            .entries
            .iter()
            .map(|entry| json!({
                "id": entry.choice.id,
                "rank": entry.rank + 1,
                "percent": entry.percent,
                "leader": entry.is_leader,
            }))
            .collect::<Vec<_>>(),
    })
}
