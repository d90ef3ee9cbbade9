//! Interactive terminal UI.
//!
//! One task drives everything: terminal events, votes fired by row hooks,
//! store revisions and animation frames are multiplexed with `select!`, so
//! the session writers spawned by the store keep running between frames.

mod app;
mod draw;
mod prompt;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tally_application::SessionStore;
use tally_core::config::MotionConfig;
use tally_core::session::VoteDelta;
use tally_view::VoteCallback;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use app::App;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

enum Wake {
    Key(KeyEvent),
    Vote(String, VoteDelta),
    Revision,
    Frame,
    Redraw,
    InputClosed,
}

pub async fn run(store: Arc<SessionStore>, motion: MotionConfig) -> Result<()> {
    let mut terminal = TerminalSession::new()?;

    let (vote_tx, mut vote_rx) = mpsc::unbounded_channel::<(String, VoteDelta)>();
    let on_vote: VoteCallback = Arc::new(move |choice_id: &str, delta: VoteDelta| {
        let _ = vote_tx.send((choice_id.to_string(), delta));
    });
    let mut app = App::new(store.clone(), motion, on_vote);
    let mut revisions = store.subscribe();

    terminal.draw(|frame| draw::draw(frame, &app))?;
    if let Err(e) = store.load_all().await {
        tracing::error!("Failed to load sessions: {:#}", e);
        app.set_status(format!("Could not load sessions: {e}"));
    }
    app.sync();

    let mut events = EventStream::new();
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_frame = Instant::now();

    while !app.should_quit {
        terminal.draw(|frame| draw::draw(frame, &app))?;

        let animating = app.is_animating();
        let wake = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Wake::Key(key),
                Some(Ok(_)) => Wake::Redraw,
                Some(Err(e)) => {
                    tracing::warn!("Terminal event error: {}", e);
                    Wake::Redraw
                }
                None => Wake::InputClosed,
            },
            Some((choice_id, delta)) = vote_rx.recv() => Wake::Vote(choice_id, delta),
            Ok(()) = revisions.changed() => Wake::Revision,
            _ = frames.tick(), if animating => Wake::Frame,
        };

        let now = Instant::now();
        app.advance(now - last_frame);
        last_frame = now;

        match wake {
            Wake::Key(key) => app.handle_key(key).await,
            Wake::Vote(choice_id, delta) => app.apply_vote(&choice_id, delta),
            Wake::Revision => app.sync(),
            Wake::Frame | Wake::Redraw => {}
            Wake::InputClosed => break,
        }
    }

    drop(terminal);
    store.flush().await;
    tracing::info!("Interactive session closed");
    Ok(())
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).inspect_err(|_| teardown_terminal())?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).inspect_err(|_| teardown_terminal())?;
        terminal.clear().inspect_err(|_| teardown_terminal())?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}
