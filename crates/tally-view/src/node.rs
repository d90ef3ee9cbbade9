//! Visual node content for one choice row.

use std::fmt;
use std::sync::Arc;
use tally_core::ranking::RankedChoice;
use tally_core::session::VoteDelta;

/// Receives `(choice_id, delta)` when a row's vote control fires.
pub type VoteCallback = Arc<dyn Fn(&str, VoteDelta) + Send + Sync>;

/// Vote controls bound to one choice id when its node is created.
///
/// The binding never changes afterwards; content updates do not rewire it.
#[derive(Clone)]
pub struct VoteHooks {
    choice_id: String,
    callback: VoteCallback,
}

impl VoteHooks {
    pub fn bind(choice_id: impl Into<String>, callback: VoteCallback) -> Self {
        Self {
            choice_id: choice_id.into(),
            callback,
        }
    }

    pub fn choice_id(&self) -> &str {
        &self.choice_id
    }

    pub fn fire(&self, delta: VoteDelta) {
        (self.callback)(&self.choice_id, delta);
    }

    pub fn increment(&self) {
        self.fire(VoteDelta::Up);
    }

    pub fn decrement(&self) {
        self.fire(VoteDelta::Down);
    }
}

impl fmt::Debug for VoteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteHooks")
            .field("choice_id", &self.choice_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// Made by the latest render; its enter transition is still running
    Created,
    Live,
    /// Removed from the ranking, waiting for its exit transition
    Exiting,
}

/// Everything a row displays, refreshed in place on every render.
#[derive(Debug, Clone)]
pub struct ChoiceNode {
    key: String,
    hooks: VoteHooks,
    pub title: String,
    pub emoji: String,
    pub notes: Option<String>,
    pub votes: u32,
    pub votes_text: String,
    /// The decrement control is disabled at zero votes
    pub can_decrement: bool,
    pub leader: bool,
    /// Target bar width, 0–100
    pub percent: f64,
    pub phase: NodePhase,
}

impl ChoiceNode {
    pub fn new(key: impl Into<String>, hooks: VoteHooks) -> Self {
        Self {
            key: key.into(),
            hooks,
            title: String::new(),
            emoji: String::new(),
            notes: None,
            votes: 0,
            votes_text: "0".to_string(),
            can_decrement: false,
            leader: false,
            percent: 0.0,
            phase: NodePhase::Created,
        }
    }

    /// The choice id this node renders.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn hooks(&self) -> &VoteHooks {
        &self.hooks
    }

    /// Copies the displayed fields from a ranking entry.
    pub fn update(&mut self, entry: &RankedChoice<'_>) {
        let choice = entry.choice;
        self.title.clone_from(&choice.title);
        self.emoji = choice.display_emoji().to_string();
        self.notes = choice.notes().map(str::to_string);
        self.votes = choice.votes;
        self.votes_text = choice.votes.to_string();
        self.can_decrement = choice.votes > 0;
        self.leader = entry.is_leader;
        self.percent = entry.percent;
    }

    pub fn is_exiting(&self) -> bool {
        self.phase == NodePhase::Exiting
    }
}
