//! Keyed reconciler for the ranking list.
//!
//! `ChoiceList` keeps one node per choice id for as long as the session is on
//! screen. Each render updates nodes in place, re-appends them in ranked order
//! and hands the resulting position changes to the motion driver, so rows
//! slide instead of jumping.

use crate::arena::{NodeArena, NodeHandle};
use crate::motion::{MotionDriver, NodeStyle};
use crate::node::{ChoiceNode, NodePhase, VoteCallback, VoteHooks};
use crate::surface::{ListSurface, Position, Surface};
use std::collections::HashMap;
use std::time::Duration;
use tally_core::config::MotionConfig;
use tally_core::ranking::rank;
use tally_core::session::{Session, VoteDelta};

/// What one render pass did, by choice id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Ids whose nodes started exiting during this pass
    pub exiting: Vec<String>,
    /// Ids whose nodes changed position
    pub moved: Vec<String>,
}

/// Called after every render pass.
pub type RenderObserver = Box<dyn FnMut(&RenderReport) + Send>;

/// A row as it should be drawn right now.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub handle: NodeHandle,
    pub node: &'a ChoiceNode,
    /// Resting position on the surface
    pub position: Position,
    pub style: NodeStyle,
}

pub struct ChoiceList<S: Surface = ListSurface> {
    surface: S,
    nodes: NodeArena<ChoiceNode>,
    /// Live nodes only; exiting nodes are no longer tracked
    tracked: HashMap<String, NodeHandle>,
    motion: MotionDriver,
    on_vote: VoteCallback,
    observer: Option<RenderObserver>,
    session_id: Option<String>,
}

impl<S: Surface> ChoiceList<S> {
    pub fn new(surface: S, motion: MotionConfig, on_vote: VoteCallback) -> Self {
        Self {
            surface,
            nodes: NodeArena::new(),
            tracked: HashMap::new(),
            motion: MotionDriver::new(motion),
            on_vote,
            observer: None,
            session_id: None,
        }
    }

    pub fn set_observer(&mut self, observer: impl FnMut(&RenderReport) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Switches to `session_id`, dropping every node of the previous session.
    pub fn show_session(&mut self, session_id: &str) {
        if self.session_id.as_deref() != Some(session_id) {
            self.clear();
            self.session_id = Some(session_id.to_string());
        }
    }

    /// Releases all nodes and cancels all motion.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.nodes.clear();
        self.tracked.clear();
        self.motion.clear();
        self.session_id = None;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Syncs the nodes with the current ranking of `session`.
    pub fn render(&mut self, session: &Session) -> RenderReport {
        self.show_session(&session.id);
        let mut report = RenderReport::default();

        let before = self.live_positions();

        let ranking = rank(&session.choices);
        for entry in &ranking.entries {
            let id = entry.choice.id.as_str();
            let handle = match self.tracked.get(id) {
                Some(handle) => {
                    report.updated.push(id.to_string());
                    *handle
                }
                None => {
                    let hooks = VoteHooks::bind(id, self.on_vote.clone());
                    let handle = self.nodes.insert(ChoiceNode::new(id, hooks));
                    self.tracked.insert(id.to_string(), handle);
                    report.created.push(id.to_string());
                    handle
                }
            };

            if let Some(node) = self.nodes.get_mut(handle) {
                node.update(entry);
            }
            self.motion.play_magnitude(handle, entry.percent as f32);
            self.surface.append(handle);
        }

        let stale: Vec<String> = self
            .tracked
            .keys()
            .filter(|id| session.choice(id).is_none())
            .cloned()
            .collect();
        for id in stale {
            if self.remove(&id) {
                report.exiting.push(id);
            }
        }

        let after = self.live_positions();
        for (id, new_position) in &after {
            let Some(old_position) = before.get(id) else {
                continue;
            };
            let Some(handle) = self.tracked.get(id).copied() else {
                continue;
            };
            if self.motion.play_position(handle, *old_position - *new_position) {
                report.moved.push(id.clone());
            }
        }
        report.moved.sort_by_key(|id| after.get(id).map(|p| p.y as i64));

        for id in &report.created {
            if let Some(handle) = self.tracked.get(id).copied() {
                self.motion.play_enter(handle);
            }
        }

        tracing::trace!(
            created = report.created.len(),
            updated = report.updated.len(),
            exiting = report.exiting.len(),
            moved = report.moved.len(),
            "Rendered ranking"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(&report);
        }
        report
    }

    /// Starts the exit of the node for `choice_id`.
    ///
    /// Returns `false` if the id is not tracked, including when its node is
    /// already exiting.
    pub fn remove(&mut self, choice_id: &str) -> bool {
        let Some(handle) = self.tracked.remove(choice_id) else {
            return false;
        };
        if let Some(node) = self.nodes.get_mut(handle) {
            node.phase = NodePhase::Exiting;
        }
        self.motion.play_exit(handle);
        true
    }

    /// Advances every transition by `dt`.
    ///
    /// Nodes whose exit finished are detached and released; the rows after
    /// them slide up. Returns the ids of the released nodes.
    pub fn advance(&mut self, dt: Duration) -> Vec<String> {
        let finished = self.motion.advance(dt);

        let created: Vec<NodeHandle> = self
            .tracked
            .values()
            .copied()
            .filter(|handle| !self.motion.is_entering(*handle))
            .collect();
        for handle in created {
            if let Some(node) = self.nodes.get_mut(handle) {
                if node.phase == NodePhase::Created {
                    node.phase = NodePhase::Live;
                }
            }
        }

        if finished.is_empty() {
            return Vec::new();
        }

        let before = self.live_positions();
        let mut released = Vec::with_capacity(finished.len());
        for handle in finished {
            self.surface.detach(handle);
            if let Some(node) = self.nodes.remove(handle) {
                released.push(node.key().to_string());
            }
        }

        for (id, new_position) in self.live_positions() {
            if let (Some(old_position), Some(handle)) = (before.get(&id), self.tracked.get(&id)) {
                self.motion
                    .play_position(*handle, *old_position - new_position);
            }
        }

        tracing::trace!(released = released.len(), "Released exited nodes");
        released
    }

    /// Rows in surface order, exiting rows included.
    pub fn rows(&self) -> Vec<RowView<'_>> {
        self.surface
            .order()
            .iter()
            .filter_map(|handle| {
                let node = self.nodes.get(*handle)?;
                Some(RowView {
                    handle: *handle,
                    node,
                    position: self.surface.position(*handle)?,
                    style: self.motion.style(*handle),
                })
            })
            .collect()
    }

    /// Ids of live rows in ranked order.
    pub fn live_ids(&self) -> Vec<&str> {
        self.rows()
            .into_iter()
            .filter(|row| !row.node.is_exiting())
            .map(|row| row.node.key())
            .collect()
    }

    pub fn handle_of(&self, choice_id: &str) -> Option<NodeHandle> {
        self.tracked.get(choice_id).copied()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&ChoiceNode> {
        self.nodes.get(handle)
    }

    pub fn is_tracked(&self, choice_id: &str) -> bool {
        self.tracked.contains_key(choice_id)
    }

    /// Fires the vote hooks of a live row. Disabled decrements do nothing.
    pub fn vote(&self, choice_id: &str, delta: VoteDelta) -> bool {
        let Some(node) = self.handle_of(choice_id).and_then(|h| self.nodes.get(h)) else {
            return false;
        };
        if delta == VoteDelta::Down && !node.can_decrement {
            return false;
        }
        node.hooks().fire(delta);
        true
    }

    /// True while any transition is running.
    pub fn is_animating(&self) -> bool {
        !self.motion.is_idle()
    }

    pub fn motion_config(&self) -> &MotionConfig {
        self.motion.config()
    }

    /// Running transitions keep their timing; new ones use `config`.
    pub fn set_motion_config(&mut self, config: MotionConfig) {
        self.motion.set_config(config);
    }

    fn live_positions(&self) -> HashMap<String, Position> {
        self.tracked
            .iter()
            .filter_map(|(id, handle)| Some((id.clone(), self.surface.position(*handle)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tally_core::session::Choice;

    type Votes = Arc<Mutex<Vec<(String, VoteDelta)>>>;

    fn list() -> (ChoiceList, Votes) {
        let votes: Votes = Arc::new(Mutex::new(Vec::new()));
        let sink = votes.clone();
        let list = ChoiceList::new(
            ListSurface::new(1.0),
            MotionConfig::default(),
            Arc::new(move |id: &str, delta: VoteDelta| {
                sink.lock().unwrap().push((id.to_string(), delta));
            }),
        );
        (list, votes)
    }

    fn session(choices: &[(&str, u32)]) -> Session {
        Session {
            id: "s1".to_string(),
            name: "Lunch".to_string(),
            created_at: 0,
            choices: choices
                .iter()
                .map(|(id, votes)| Choice {
                    id: id.to_string(),
                    title: id.to_uppercase(),
                    emoji: String::new(),
                    notes: String::new(),
                    votes: *votes,
                })
                .collect(),
        }
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_first_render_creates_and_enters() {
        let (mut list, _) = list();

        let report = list.render(&session(&[("a", 1), ("b", 3)]));

        assert_eq!(report.created, ["b", "a"]);
        assert!(report.updated.is_empty());
        assert_eq!(list.live_ids(), ["b", "a"]);
        let rows = list.rows();
        assert_eq!(rows[0].style.opacity, 0.0);
        assert_eq!(rows[0].node.phase, NodePhase::Created);
        assert!(rows[0].node.leader);

        list.advance(ms(500));
        assert_eq!(list.rows()[0].node.phase, NodePhase::Live);
        assert_eq!(list.rows()[0].style.bar, 100.0);
        assert!(!list.is_animating());
    }

    #[test]
    fn test_replaced_choice_exits_before_release() {
        let (mut list, _) = list();
        list.render(&session(&[("x", 0), ("y", 0)]));
        list.advance(ms(500));
        let y = list.handle_of("y").unwrap();

        let report = list.render(&session(&[("y", 0), ("z", 0)]));

        assert_eq!(report.created, ["z"]);
        assert_eq!(report.updated, ["y"]);
        assert_eq!(report.exiting, ["x"]);
        assert!(list.is_tracked("y") && list.is_tracked("z"));
        assert!(!list.is_tracked("x"));
        assert_eq!(list.handle_of("y"), Some(y));

        // x stays attached until its exit finishes.
        assert_eq!(list.rows().len(), 3);
        assert_eq!(list.live_ids(), ["y", "z"]);

        assert_eq!(list.advance(ms(180)), ["x"]);
        assert_eq!(list.rows().len(), 2);
        assert!(list.is_animating());
    }

    #[test]
    fn test_vote_reorders_rows_with_slide() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 3), ("b", 3), ("c", 5)]));
        list.advance(ms(500));
        assert_eq!(list.live_ids(), ["c", "a", "b"]);

        let report = list.render(&session(&[("a", 6), ("b", 3), ("c", 5)]));

        assert_eq!(list.live_ids(), ["a", "c", "b"]);
        assert_eq!(report.moved, ["a", "c"]);
        assert!(report.created.is_empty());
        let rows = list.rows();
        // a moved up one row: it starts one row lower and slides up.
        assert_eq!(rows[0].style.offset, Position::new(0.0, 1.0));
        assert_eq!(rows[1].style.offset, Position::new(0.0, -1.0));
        assert_eq!(rows[2].style.offset, Position::ZERO);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 0), ("b", 0)]));

        assert!(list.remove("a"));
        assert!(!list.remove("a"));
        assert!(!list.remove("never-seen"));

        let report = list.render(&session(&[("b", 0)]));
        assert!(report.exiting.is_empty());
        assert_eq!(list.advance(ms(180)), ["a"]);
        assert!(list.advance(ms(180)).is_empty());
    }

    #[test]
    fn test_rapid_renders_during_exit() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 0), ("b", 0), ("c", 0)]));
        list.render(&session(&[("a", 0)]));
        list.advance(ms(50));
        list.render(&session(&[("a", 1)]));
        let report = list.render(&session(&[("a", 2)]));

        assert!(report.exiting.is_empty());
        let mut released = list.advance(ms(200));
        released.sort();
        assert_eq!(released, ["b", "c"]);
        assert_eq!(list.live_ids(), ["a"]);
    }

    #[test]
    fn test_reappearing_id_gets_fresh_node() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 0), ("b", 0)]));
        let old = list.handle_of("b").unwrap();

        list.render(&session(&[("a", 0)]));
        let report = list.render(&session(&[("a", 0), ("b", 0)]));

        assert_eq!(report.created, ["b"]);
        let new = list.handle_of("b").unwrap();
        assert_ne!(old, new);
        // The old node finishes its exit independently.
        assert_eq!(list.rows().len(), 3);
        list.advance(ms(180));
        assert_eq!(list.rows().len(), 2);
        assert_eq!(list.handle_of("b"), Some(new));
    }

    #[test]
    fn test_switching_session_clears_nodes() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 0), ("b", 0)]));
        list.remove("a");

        let mut other = session(&[("c", 0), ("d", 0)]);
        other.id = "s2".to_string();
        let report = list.render(&other);

        assert_eq!(report.created, ["c", "d"]);
        assert_eq!(list.rows().len(), 2);
        assert!(list.advance(ms(500)).is_empty());
        assert_eq!(list.session_id(), Some("s2"));
    }

    #[test]
    fn test_vote_hooks_fire_with_bound_id() {
        let (mut list, votes) = list();
        list.render(&session(&[("a", 0), ("b", 1)]));

        assert!(list.vote("b", VoteDelta::Down));
        assert!(list.vote("a", VoteDelta::Up));
        // Decrement is disabled at zero votes.
        assert!(!list.vote("a", VoteDelta::Down));
        assert!(!list.vote("missing", VoteDelta::Up));

        assert_eq!(
            *votes.lock().unwrap(),
            [
                ("b".to_string(), VoteDelta::Down),
                ("a".to_string(), VoteDelta::Up)
            ]
        );
    }

    #[test]
    fn test_single_choice_and_observer() {
        let (mut list, _) = list();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        list.set_observer(move |report| sink.lock().unwrap().push(report.clone()));

        list.render(&session(&[("only", 4)]));

        assert_eq!(list.live_ids(), ["only"]);
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].created, ["only"]);
    }

    #[test]
    fn test_switching_to_reduced_motion() {
        let (mut list, _) = list();
        list.render(&session(&[("a", 0)]));
        assert!(list.is_animating());

        list.set_motion_config(MotionConfig::instant());
        assert!(list.motion_config().reduced_motion);

        // The running enter keeps its timing.
        list.advance(ms(10));
        assert!(list.is_animating());
        list.advance(ms(500));

        list.render(&session(&[("a", 0), ("b", 2)]));
        list.advance(Duration::ZERO);
        assert!(!list.is_animating());
        assert_eq!(list.live_ids(), ["b", "a"]);
    }
}
