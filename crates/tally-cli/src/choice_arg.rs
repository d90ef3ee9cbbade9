//! Parser for the `[EMOJI:]TITLE[::NOTES]` choice syntax shared by the
//! `--choice` flag and the TUI prompts.

use tally_core::session::ChoiceDraft;

/// Parses one choice.
///
/// The emoji prefix is only recognised when it contains no letters, digits or
/// whitespace, so `Plan B: cheap` stays a plain title.
pub fn parse(raw: &str) -> Result<ChoiceDraft, String> {
    let (head, notes) = match raw.split_once("::") {
        Some((head, notes)) => (head, notes),
        None => (raw, ""),
    };

    let (emoji, title) = match head.split_once(':') {
        Some((prefix, rest)) if is_symbol(prefix.trim()) => (prefix.trim(), rest),
        _ => ("", head),
    };

    let draft = ChoiceDraft::new(title)
        .with_emoji(emoji)
        .with_notes(notes)
        .normalized();
    if draft.title.is_empty() {
        return Err(format!("choice '{raw}' has no title"));
    }
    Ok(draft)
}

fn is_symbol(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::session::DEFAULT_DRAFT_EMOJI;

    #[test]
    fn test_plain_title() {
        let draft = parse("  Pizza ").unwrap();
        assert_eq!(draft.title, "Pizza");
        assert_eq!(draft.emoji, DEFAULT_DRAFT_EMOJI);
        assert_eq!(draft.notes, "");
    }

    #[test]
    fn test_emoji_and_notes() {
        let draft = parse("🌮: Tacos :: extra salsa").unwrap();
        assert_eq!(draft.emoji, "🌮");
        assert_eq!(draft.title, "Tacos");
        assert_eq!(draft.notes, "extra salsa");
    }

    #[test]
    fn test_colon_in_title_is_not_an_emoji() {
        let draft = parse("Plan B: cheap").unwrap();
        assert_eq!(draft.title, "Plan B: cheap");
        assert_eq!(draft.emoji, DEFAULT_DRAFT_EMOJI);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert!(parse("").is_err());
        assert!(parse("🍕:   ").is_err());
        assert!(parse("::only notes").is_err());
    }
}
