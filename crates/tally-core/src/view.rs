//! View state.
//!
//! Which screen is showing and which overlays are open. `ViewState` is an
//! immutable value: transitions go through [`ViewState::reduce`] and return a
//! new state instead of mutating shared flags.

/// The main screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    /// Sessions are still being read from storage
    #[default]
    Loading,
    /// Session list
    Dashboard,
    /// One session's live ranking
    Session { session_id: String },
}

/// Transitions accepted by [`ViewState::reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Initial load finished
    Loaded,
    OpenSession(String),
    ShowDashboard,
    OpenCreate,
    CloseCreate,
    OpenSettings,
    CloseSettings,
    /// Closes the topmost overlay
    Dismiss,
    /// A session was created and should be shown
    SessionCreated(String),
    SessionDeleted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub screen: Screen,
    pub create_open: bool,
    pub settings_open: bool,
}

impl ViewState {
    pub fn loading() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.screen == Screen::Loading
    }

    /// Id of the open session, if a session screen is showing.
    pub fn session_id(&self) -> Option<&str> {
        match &self.screen {
            Screen::Session { session_id } => Some(session_id),
            _ => None,
        }
    }

    pub fn reduce(self, action: ViewAction) -> Self {
        match action {
            ViewAction::Loaded => match self.screen {
                Screen::Loading => Self {
                    screen: Screen::Dashboard,
                    ..self
                },
                _ => self,
            },
            ViewAction::OpenSession(session_id) => Self {
                screen: Screen::Session { session_id },
                create_open: false,
                settings_open: false,
            },
            ViewAction::ShowDashboard => Self {
                screen: Screen::Dashboard,
                settings_open: false,
                ..self
            },
            ViewAction::OpenCreate => Self {
                create_open: true,
                ..self
            },
            ViewAction::CloseCreate => Self {
                create_open: false,
                ..self
            },
            // Settings belong to a session screen.
            ViewAction::OpenSettings => Self {
                settings_open: self.session_id().is_some(),
                ..self
            },
            ViewAction::CloseSettings => Self {
                settings_open: false,
                ..self
            },
            ViewAction::Dismiss => {
                if self.settings_open {
                    Self {
                        settings_open: false,
                        ..self
                    }
                } else if self.create_open {
                    Self {
                        create_open: false,
                        ..self
                    }
                } else {
                    self
                }
            }
            ViewAction::SessionCreated(session_id) => Self {
                screen: Screen::Session { session_id },
                create_open: false,
                settings_open: false,
            },
            ViewAction::SessionDeleted(session_id) => {
                if self.session_id() == Some(session_id.as_str()) {
                    Self {
                        screen: Screen::Dashboard,
                        settings_open: false,
                        ..self
                    }
                } else {
                    self
                }
            }
        }
    }

    /// Falls back to the dashboard when the open session no longer exists.
    pub fn resolve(self, exists: impl Fn(&str) -> bool) -> Self {
        match self.session_id() {
            Some(id) if !exists(id) => self.reduce(ViewAction::ShowDashboard),
            _ => self,
        }
    }
}
