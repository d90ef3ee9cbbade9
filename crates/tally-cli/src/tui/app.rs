use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tally_application::SessionStore;
use tally_core::config::MotionConfig;
use tally_core::ranking::SessionSummary;
use tally_core::session::{Session, VoteDelta};
use tally_core::view::{Screen, ViewAction, ViewState};
use tally_view::{ChoiceList, ListSurface, VoteCallback};

use super::prompt::{ChoiceForm, FormStep, NewSessionForm, Prompt};

/// Terminal rows per choice: title line, bar, notes.
pub const ROW_HEIGHT: u16 = 3;

pub struct App {
    store: Arc<SessionStore>,
    pub view: ViewState,
    pub list: ChoiceList,
    pub dashboard_index: usize,
    pub row_index: usize,
    pub prompt: Option<Prompt>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: Arc<SessionStore>, motion: MotionConfig, on_vote: VoteCallback) -> Self {
        let mut list = ChoiceList::new(ListSurface::new(f32::from(ROW_HEIGHT)), motion, on_vote);
        list.set_observer(|report| {
            if !report.created.is_empty() || !report.exiting.is_empty() {
                tracing::debug!(
                    created = ?report.created,
                    exiting = ?report.exiting,
                    "Choice rows changed"
                );
            }
        });

        Self {
            store,
            view: ViewState::loading(),
            list,
            dashboard_index: 0,
            row_index: 0,
            prompt: None,
            status: None,
            should_quit: false,
        }
    }

    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.store.summaries()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.current(&self.view)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Pulls the latest store state into the view and the choice rows.
    pub fn sync(&mut self) {
        if self.view.is_loading() && !self.store.is_loading() {
            self.view = self.view.clone().reduce(ViewAction::Loaded);
        }
        let store = self.store.clone();
        self.view = self.view.clone().resolve(|id| store.contains(id));

        match self.current_session() {
            Some(session) => {
                self.list.render(&session);
                let live = self.list.live_ids().len();
                self.row_index = self.row_index.min(live.saturating_sub(1));
            }
            None => self.list.clear(),
        }

        let sessions = self.store.summaries().len();
        self.dashboard_index = self.dashboard_index.min(sessions.saturating_sub(1));
    }

    pub fn advance(&mut self, dt: Duration) {
        self.list.advance(dt);
    }

    pub fn is_animating(&self) -> bool {
        self.list.is_animating()
    }

    /// Called with votes fired by row hooks.
    pub fn apply_vote(&mut self, choice_id: &str, delta: VoteDelta) {
        if let Some(session_id) = self.view.session_id() {
            self.store.apply_vote(session_id, choice_id, delta);
        }
        self.sync();
    }

    /// 1-based rank of a live row. Exiting rows have none.
    pub fn display_rank(&self, choice_id: &str) -> Option<usize> {
        self.list
            .live_ids()
            .iter()
            .position(|id| *id == choice_id)
            .map(|index| index + 1)
    }

    /// Flips reduced motion for transitions started from now on.
    pub fn toggle_motion(&mut self) {
        let mut config = self.list.motion_config().clone();
        config.reduced_motion = !config.reduced_motion;
        let message = if config.reduced_motion {
            "Motion off"
        } else {
            "Motion on"
        };
        self.list.set_motion_config(config);
        self.set_status(message);
    }

    pub fn selected_choice_id(&self) -> Option<String> {
        self.list
            .live_ids()
            .get(self.row_index)
            .map(|id| id.to_string())
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key).await;
            return;
        }
        self.status = None;

        match self.view.screen.clone() {
            Screen::Loading => {
                if key.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Session { session_id } => self.handle_session_key(key, session_id),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        let summaries = self.store.summaries();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.dashboard_index = self.dashboard_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.dashboard_index + 1 < summaries.len() {
                    self.dashboard_index += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(summary) = summaries.get(self.dashboard_index) {
                    self.view = self
                        .view
                        .clone()
                        .reduce(ViewAction::OpenSession(summary.id.clone()));
                    self.row_index = 0;
                    self.sync();
                }
            }
            KeyCode::Char('n') => self.open_create(),
            KeyCode::Char('m') => self.toggle_motion(),
            KeyCode::Char('D') => {
                if let Some(summary) = summaries.get(self.dashboard_index) {
                    self.prompt = Some(Prompt::ConfirmDelete {
                        session_id: summary.id.clone(),
                        name: summary.name.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_session_key(&mut self, key: KeyEvent, session_id: String) {
        let live = self.list.live_ids().len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.view = self.view.clone().reduce(ViewAction::ShowDashboard);
                self.sync();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.row_index = self.row_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.row_index + 1 < live {
                    self.row_index += 1;
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.vote_selected(VoteDelta::Up),
            KeyCode::Char('-') | KeyCode::Char('_') => self.vote_selected(VoteDelta::Down),
            KeyCode::Char('a') => {
                self.view = self.view.clone().reduce(ViewAction::OpenSettings);
                self.prompt = Some(Prompt::AddChoice(ChoiceForm::default()));
            }
            KeyCode::Char('x') => self.remove_selected(&session_id),
            KeyCode::Char('n') => self.open_create(),
            KeyCode::Char('m') => self.toggle_motion(),
            KeyCode::Char('D') => {
                if let Some(session) = self.current_session() {
                    self.prompt = Some(Prompt::ConfirmDelete {
                        session_id: session.id,
                        name: session.name,
                    });
                }
            }
            _ => {}
        }
    }

    fn vote_selected(&mut self, delta: VoteDelta) {
        if let Some(choice_id) = self.selected_choice_id() {
            self.list.vote(&choice_id, delta);
        }
    }

    fn remove_selected(&mut self, session_id: &str) {
        let Some(choice_id) = self.selected_choice_id() else {
            return;
        };
        if self.list.live_ids().len() <= 1 {
            self.set_status("A session keeps at least one choice");
            return;
        }
        let title = self
            .list
            .handle_of(&choice_id)
            .and_then(|h| self.list.node(h))
            .map(|node| node.title.clone())
            .unwrap_or_default();
        if self.store.remove_choice(session_id, &choice_id) {
            self.set_status(format!("Removed {title}"));
        }
    }

    fn open_create(&mut self) {
        self.view = self.view.clone().reduce(ViewAction::OpenCreate);
        self.prompt = Some(Prompt::NewSession(NewSessionForm::default()));
    }

    fn close_prompt(&mut self) {
        let action = match self.prompt.take() {
            Some(Prompt::NewSession(_)) => ViewAction::CloseCreate,
            Some(Prompt::AddChoice(_)) => ViewAction::CloseSettings,
            _ => ViewAction::Dismiss,
        };
        self.view = self.view.clone().reduce(action);
    }

    async fn handle_prompt_key(&mut self, key: KeyEvent) {
        if let Some(Prompt::ConfirmDelete { session_id, name }) = &self.prompt {
            let (session_id, name) = (session_id.clone(), name.clone());
            self.close_prompt();
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.store.remove_session(&session_id).await;
                self.view = self
                    .view
                    .clone()
                    .reduce(ViewAction::SessionDeleted(session_id));
                self.sync();
                self.set_status(format!("Deleted {name}"));
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.close_prompt(),
            KeyCode::Backspace => {
                if let Some(input) = self.prompt.as_mut().and_then(Prompt::input_mut) {
                    input.backspace();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.prompt.as_mut().and_then(Prompt::input_mut) {
                    input.insert(c);
                }
            }
            KeyCode::Enter => self.submit_prompt().await,
            _ => {}
        }
    }

    async fn submit_prompt(&mut self) {
        match self.prompt.as_mut() {
            Some(Prompt::NewSession(form)) => match form.submit() {
                FormStep::Continue | FormStep::Invalid(_) => {}
                FormStep::Done { name, choices } => {
                    self.close_prompt();
                    match self.store.create_session(&name, &choices).await {
                        Some(session) => {
                            self.view = self
                                .view
                                .clone()
                                .reduce(ViewAction::SessionCreated(session.id));
                            self.row_index = 0;
                            self.sync();
                        }
                        None => self.set_status("Could not create the session; see the log"),
                    }
                }
            },
            Some(Prompt::AddChoice(form)) => {
                if let Ok(draft) = form.submit() {
                    self.close_prompt();
                    if let Some(session_id) = self.view.session_id().map(str::to_string) {
                        if self.store.add_choice(&session_id, &draft).is_some() {
                            self.set_status(format!("Added {}", draft.title));
                        }
                    }
                }
            }
            Some(Prompt::ConfirmDelete { .. }) | None => {}
        }
    }
}
