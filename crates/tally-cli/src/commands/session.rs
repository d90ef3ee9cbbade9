use anyhow::{Context, Result, bail};
use colored::Colorize;
use tally_application::SessionStore;
use tally_core::ranking::SessionSummary;
use tally_core::session::{ChoiceDraft, MIN_CHOICES};

use super::{output, select};

pub fn list(store: &SessionStore, json: bool) -> Result<()> {
    let summaries = store.summaries();
    if json {
        println!("{}", serde_json::to_string_pretty(&output::summaries_json(&summaries))?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No sessions yet. Create one with `tally new <name> --choice A --choice B`.");
        return Ok(());
    }
    for summary in &summaries {
        println!("{}", output::summary_line(summary));
    }
    Ok(())
}

pub async fn new(store: &SessionStore, name: &str, drafts: &[ChoiceDraft], json: bool) -> Result<()> {
    if name.trim().is_empty() {
        bail!("session name must not be empty");
    }
    let titled = drafts.iter().filter(|d| !d.is_blank()).count();
    if titled < MIN_CHOICES {
        bail!("a session needs at least {MIN_CHOICES} choices, got {titled}");
    }

    let session = store
        .create_session(name, drafts)
        .await
        .context("failed to store the new session (see log for details)")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output::session_json(&session))?);
    } else {
        println!(
            "{} {}",
            "Created".green().bold(),
            output::summary_line(&SessionSummary::of(&session))
        );
    }
    Ok(())
}

pub fn show(store: &SessionStore, selector: &str, json: bool) -> Result<()> {
    let sessions = store.sessions();
    let session = select::session(&sessions, selector)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output::session_json(session))?);
    } else {
        for line in output::session_lines(session) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn delete(store: &SessionStore, selector: &str) -> Result<()> {
    let sessions = store.sessions();
    let session = select::session(&sessions, selector)?;

    store.remove_session(&session.id).await;
    println!("{} {}", "Deleted".red().bold(), session.name);
    Ok(())
}
