//! Ranking engine.
//!
//! Derives the vote-ordered view of a session's choices. Nothing here is
//! stored; the view is recomputed after every state change.

use crate::session::{Choice, Session};

/// One entry of a [`RankingView`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedChoice<'a> {
    pub choice: &'a Choice,
    /// Zero-based position in the ranking
    pub rank: usize,
    /// `votes / max_votes * 100`
    pub percent: f64,
    pub is_leader: bool,
}

/// Vote-ordered projection of a session's choices.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingView<'a> {
    pub entries: Vec<RankedChoice<'a>>,
    /// Highest tally, floored at 1 so percentages never divide by zero
    pub max_votes: u32,
}

impl<'a> RankingView<'a> {
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().map(|entry| entry.choice.id.as_str())
    }

    pub fn leaders(&self) -> impl Iterator<Item = &RankedChoice<'a>> {
        self.entries.iter().filter(|entry| entry.is_leader)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ranks choices by votes, highest first.
///
/// `sort_by` is stable, so tied choices keep their input order and a freshly
/// added zero-vote choice lands behind the existing zero-vote ones.
pub fn rank(choices: &[Choice]) -> RankingView<'_> {
    let max_votes = choices.iter().map(|c| c.votes).max().unwrap_or(0).max(1);

    let mut sorted: Vec<&Choice> = choices.iter().collect();
    sorted.sort_by(|a, b| b.votes.cmp(&a.votes));

    let entries = sorted
        .into_iter()
        .enumerate()
        .map(|(rank, choice)| RankedChoice {
            choice,
            rank,
            percent: f64::from(choice.votes) / f64::from(max_votes) * 100.0,
            is_leader: choice.votes == max_votes && choice.votes > 0,
        })
        .collect();

    RankingView { entries, max_votes }
}

pub fn total_votes(session: &Session) -> u64 {
    session.choices.iter().map(|c| u64::from(c.votes)).sum()
}

/// The top-ranked choice, or `None` while nobody has voted.
pub fn leading_choice(session: &Session) -> Option<&Choice> {
    if total_votes(session) == 0 {
        return None;
    }
    rank(&session.choices).entries.first().map(|entry| entry.choice)
}

/// Dashboard card data for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub total_votes: u64,
    pub choice_count: usize,
    /// `(emoji, title)` of the leading choice
    pub leading: Option<(String, String)>,
}

impl SessionSummary {
    pub fn of(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            total_votes: total_votes(session),
            choice_count: session.choices.len(),
            leading: leading_choice(session)
                .map(|c| (c.display_emoji().to_string(), c.title.clone())),
        }
    }
}
