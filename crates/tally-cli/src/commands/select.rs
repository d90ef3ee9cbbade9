//! Resolves user-typed session and choice selectors.
//!
//! A selector matches, in order: an exact id, an exact name (case-insensitive),
//! then a unique id prefix.

use anyhow::{Result, bail};
use tally_core::session::{Choice, Session};

pub fn session<'a>(sessions: &'a [Session], selector: &str) -> Result<&'a Session> {
    resolve(sessions, selector, "session", |s| s.id.as_str(), |s| s.name.as_str())
}

pub fn choice<'a>(session: &'a Session, selector: &str) -> Result<&'a Choice> {
    resolve(&session.choices, selector, "choice", |c| c.id.as_str(), |c| c.title.as_str())
}

fn resolve<'a, T>(
    items: &'a [T],
    selector: &str,
    kind: &str,
    id: impl Fn(&T) -> &str,
    name: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    let selector = selector.trim();
    if selector.is_empty() {
        bail!("empty {kind} selector");
    }

    if let Some(item) = items.iter().find(|item| id(*item) == selector) {
        return Ok(item);
    }

    let named: Vec<&T> = items
        .iter()
        .filter(|item| name(*item).trim().eq_ignore_ascii_case(selector))
        .collect();
    match named.as_slice() {
        [item] => return Ok(*item),
        [] => {}
        _ => bail!("{} {kind}s are named '{selector}'; use an id", named.len()),
    }

    let prefixed: Vec<&T> = items
        .iter()
        .filter(|item| id(*item).starts_with(selector))
        .collect();
    match prefixed.as_slice() {
        [item] => Ok(*item),
        [] => bail!("no {kind} matches '{selector}'"),
        _ => bail!("'{selector}' matches {} {kind}s; use a longer id prefix", prefixed.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, name: &str) -> Session {
        Session {
            id: id.to_string(),
            name: name.to_string(),
            created_at: 0,
            choices: Vec::new(),
        }
    }

    #[test]
    fn test_session_by_id_name_and_prefix() {
        let sessions = vec![session("abc123", "Lunch"), session("abd456", "Movies")];

        assert_eq!(super::session(&sessions, "abd456").unwrap().name, "Movies");
        assert_eq!(super::session(&sessions, "lunch").unwrap().id, "abc123");
        assert_eq!(super::session(&sessions, "abc").unwrap().id, "abc123");
    }

    #[test]
    fn test_ambiguous_and_missing() {
        let sessions = vec![
            session("abc123", "Lunch"),
            session("abd456", "lunch"),
            session("xyz", "Other"),
        ];

        let err = super::session(&sessions, "ab").unwrap_err().to_string();
        assert!(err.contains("matches 2 sessions"));
        let err = super::session(&sessions, "LUNCH").unwrap_err().to_string();
        assert!(err.contains("2 sessions are named"));
        assert!(super::session(&sessions, "nope").is_err());
        assert!(super::session(&sessions, " ").is_err());
    }

    #[test]
    fn test_choice_by_title() {
        let mut s = session("s", "Lunch");
        s.choices.push(Choice {
            id: "c-1".to_string(),
            title: "Pizza".to_string(),
            emoji: String::new(),
            notes: String::new(),
            votes: 0,
        });

        assert_eq!(choice(&s, "PIZZA").unwrap().id, "c-1");
        assert_eq!(choice(&s, "c-").unwrap().title, "Pizza");
    }
}
