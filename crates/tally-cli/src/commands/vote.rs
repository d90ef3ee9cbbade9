use anyhow::{Result, bail};
use colored::Colorize;
use tally_application::SessionStore;
use tally_core::session::{ChoiceDraft, VoteDelta};

use super::select;

pub fn vote(store: &SessionStore, session: &str, choice: &str, down: bool) -> Result<()> {
    let sessions = store.sessions();
    let session = select::session(&sessions, session)?;
    let choice = select::choice(session, choice)?;
    let delta = if down { VoteDelta::Down } else { VoteDelta::Up };

    let Some(votes) = store.apply_vote(&session.id, &choice.id, delta) else {
        bail!("choice '{}' disappeared", choice.title);
    };
    let sign = if down { "-1".red() } else { "+1".green() };
    println!(
        "{} {} {} → {} votes",
        sign.bold(),
        choice.display_emoji(),
        choice.title,
        votes
    );
    Ok(())
}

pub fn add_choice(store: &SessionStore, session: &str, draft: &ChoiceDraft) -> Result<()> {
    let sessions = store.sessions();
    let session = select::session(&sessions, session)?;

    if draft.is_blank() {
        bail!("choice title must not be empty");
    }
    let Some(choice_id) = store.add_choice(&session.id, draft) else {
        bail!("session '{}' disappeared", session.name);
    };
    let draft = draft.normalized();
    println!(
        "{} {} {} to {} ({})",
        "Added".green().bold(),
        draft.emoji,
        draft.title,
        session.name,
        choice_id
    );
    Ok(())
}

/// Removes a choice, keeping at least one in the session.
pub fn remove_choice(store: &SessionStore, session: &str, choice: &str) -> Result<()> {
    let sessions = store.sessions();
    let session = select::session(&sessions, session)?;
    let choice = select::choice(session, choice)?;

    if session.choices.len() <= 1 {
        bail!("'{}' is the last choice of '{}'", choice.title, session.name);
    }
    store.remove_choice(&session.id, &choice.id);
    println!("{} {}", "Removed".red().bold(), choice.title);
    Ok(())
}
