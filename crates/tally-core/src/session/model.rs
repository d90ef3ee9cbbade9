//! Session domain model.
//!
//! A [`Session`] is one poll: a name plus an ordered list of [`Choice`]s, each
//! carrying its own vote tally.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emoji given to a freshly drafted choice when the user picked none.
pub const DEFAULT_DRAFT_EMOJI: &str = "🆕";

/// Emoji shown for a stored choice whose emoji is empty.
pub const FALLBACK_EMOJI: &str = "😀";

/// Minimum number of titled choices a new session needs.
pub const MIN_CHOICES: usize = 2;

/// Direction of a single vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDelta {
    Up,
    Down,
}

impl VoteDelta {
    /// Applies the delta, clamping at zero.
    pub fn apply(self, votes: u32) -> u32 {
        match self {
            Self::Up => votes.saturating_add(1),
            Self::Down => votes.saturating_sub(1),
        }
    }

    pub fn step(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// A choice as typed by the user, before it has an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDraft {
    pub title: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub notes: String,
}

impl ChoiceDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Trims every field and fills in the default emoji.
    pub fn normalized(&self) -> Self {
        let emoji = self.emoji.trim();
        Self {
            title: self.title.trim().to_string(),
            emoji: if emoji.is_empty() {
                DEFAULT_DRAFT_EMOJI.to_string()
            } else {
                emoji.to_string()
            },
            notes: self.notes.trim().to_string(),
        }
    }

    /// True when the title is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// One votable option within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Unique within the owning session (UUID format)
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub emoji: String,
    /// Free-form notes, empty when the user left none
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub votes: u32,
}

impl Choice {
    /// Assigns a fresh identity to a draft. The new choice starts at zero votes.
    pub fn from_draft(draft: &ChoiceDraft) -> Self {
        let draft = draft.normalized();
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            emoji: draft.emoji,
            notes: draft.notes,
            votes: 0,
        }
    }

    /// Emoji to display; falls back to [`FALLBACK_EMOJI`] when none is stored.
    pub fn display_emoji(&self) -> &str {
        let emoji = self.emoji.trim();
        if emoji.is_empty() {
            FALLBACK_EMOJI
        } else {
            emoji
        }
    }

    pub fn notes(&self) -> Option<&str> {
        if self.notes.is_empty() {
            None
        } else {
            Some(&self.notes)
        }
    }
}

/// One voting poll.
///
/// Owned by the session store while loaded; the persistence adapter owns the
/// durable copy. `choices` keeps insertion order, which is also the tie-break
/// order of the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Session {
    /// Builds a new session from user input, stamped with the current time.
    ///
    /// Returns `None` when the trimmed name is empty or fewer than
    /// [`MIN_CHOICES`] drafts have a title. Blank drafts are dropped.
    pub fn create(name: &str, drafts: &[ChoiceDraft]) -> Option<Self> {
        Self::create_at(name, drafts, chrono::Utc::now().timestamp_millis())
    }

    pub fn create_at(name: &str, drafts: &[ChoiceDraft], created_at: i64) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let choices: Vec<Choice> = drafts
            .iter()
            .filter(|draft| !draft.is_blank())
            .map(Choice::from_draft)
            .collect();
        if choices.len() < MIN_CHOICES {
            return None;
        }

        Some(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at,
            choices,
        })
    }

    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    pub fn choice_mut(&mut self, choice_id: &str) -> Option<&mut Choice> {
        self.choices.iter_mut().find(|c| c.id == choice_id)
    }

    /// Applies a clamped vote to the matching choice, returning its new tally.
    pub fn apply_vote(&mut self, choice_id: &str, delta: VoteDelta) -> Option<u32> {
        let choice = self.choice_mut(choice_id)?;
        choice.votes = delta.apply(choice.votes);
        Some(choice.votes)
    }

    /// Appends a choice unless its id is already present.
    pub fn push_choice(&mut self, choice: Choice) -> bool {
        if self.choice(&choice.id).is_some() {
            return false;
        }
        self.choices.push(choice);
        true
    }

    pub fn remove_choice(&mut self, choice_id: &str) -> bool {
        let before = self.choices.len();
        self.choices.retain(|c| c.id != choice_id);
        self.choices.len() != before
    }
}
