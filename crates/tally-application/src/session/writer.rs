//! Per-session single-writer queue for durable mutations.
//!
//! Every session id gets one unbounded channel drained by one spawned task. An
//! operation runs its whole read-modify-write before the next one for the same
//! session starts; different sessions never wait on each other.

use super::updater::SessionUpdater;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tally_core::session::{Choice, SessionRepository, VoteDelta};
use tokio::sync::{mpsc, oneshot};

/// A queued durable mutation for one session.
#[derive(Debug)]
pub enum DurableOp {
    Vote { choice_id: String, delta: VoteDelta },
    AddChoice(Choice),
    RemoveChoice { choice_id: String },
    /// Deletes the record; acknowledged once done.
    Delete(oneshot::Sender<()>),
    /// Acknowledged once every earlier operation has finished.
    Flush(oneshot::Sender<()>),
}

impl DurableOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Vote { .. } => "vote",
            Self::AddChoice(_) => "add_choice",
            Self::RemoveChoice { .. } => "remove_choice",
            Self::Delete(_) => "delete",
            Self::Flush(_) => "flush",
        }
    }
}

type Queues = HashMap<String, mpsc::UnboundedSender<DurableOp>>;

/// Serializes durable writes per session id.
pub struct SessionWriter {
    repository: Arc<dyn SessionRepository>,
    queues: Mutex<Queues>,
}

impl SessionWriter {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Queues `op` behind the pending writes of `session_id`. Fire-and-forget.
    ///
    /// Must be called from within a tokio runtime; outside one the operation is
    /// dropped with a warning.
    pub fn enqueue(&self, session_id: &str, op: DurableOp) {
        let mut queues = self.queues();
        let op = match queues.get(session_id) {
            Some(sender) => match sender.send(op) {
                Ok(()) => return,
                // Worker gone; fall through and start a new one.
                Err(mpsc::error::SendError(op)) => op,
            },
            None => op,
        };

        if let Some(sender) = self.spawn_worker(session_id) {
            let name = op.name();
            if sender.send(op).is_err() {
                tracing::warn!(session_id, op = name, "Session writer closed before send");
            }
            queues.insert(session_id.to_string(), sender);
        } else {
            tracing::warn!(session_id, op = op.name(), "No runtime for durable write, dropped");
        }
    }

    /// Deletes the durable record once the session's pending writes are done.
    ///
    /// The session's queue is retired with the delete, so a write already in
    /// the queue cannot recreate the record afterwards.
    pub async fn delete(&self, session_id: &str) {
        let (ack, done) = oneshot::channel();
        let sender = self.queues().remove(session_id);

        let sender = match sender {
            Some(sender) => sender,
            None => match self.spawn_worker(session_id) {
                Some(sender) => sender,
                None => {
                    tracing::warn!(session_id, "No runtime for durable delete, dropped");
                    return;
                }
            },
        };

        if sender.send(DurableOp::Delete(ack)).is_err() {
            tracing::warn!(session_id, "Session writer closed before delete");
            return;
        }
        drop(sender);
        let _ = done.await;
    }

    /// Waits until every operation queued so far has completed.
    pub async fn flush(&self) {
        let pending: Vec<_> = self
            .queues()
            .values()
            .filter_map(|sender| {
                let (ack, done) = oneshot::channel();
                sender.send(DurableOp::Flush(ack)).ok().map(|()| done)
            })
            .collect();

        join_all(pending).await;
    }

    /// Number of sessions with a live queue.
    pub fn queue_count(&self) -> usize {
        self.queues().len()
    }

    fn queues(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_worker(&self, session_id: &str) -> Option<mpsc::UnboundedSender<DurableOp>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let updater = SessionUpdater::new(self.repository.clone());
        handle.spawn(run_queue(
            session_id.to_string(),
            self.repository.clone(),
            updater,
            receiver,
        ));
        tracing::debug!(session_id, "Started session writer");
        Some(sender)
    }
}

async fn run_queue(
    session_id: String,
    repository: Arc<dyn SessionRepository>,
    updater: SessionUpdater,
    mut receiver: mpsc::UnboundedReceiver<DurableOp>,
) {
    while let Some(op) = receiver.recv().await {
        let name = op.name();
        let result = match op {
            DurableOp::Vote { choice_id, delta } => {
                updater
                    .update(&session_id, |session| {
                        session.apply_vote(&choice_id, delta).is_some()
                    })
                    .await
            }
            DurableOp::AddChoice(choice) => {
                updater
                    .update(&session_id, |session| session.push_choice(choice))
                    .await
            }
            DurableOp::RemoveChoice { choice_id } => {
                updater
                    .update(&session_id, |session| session.remove_choice(&choice_id))
                    .await
            }
            DurableOp::Delete(ack) => {
                let result = repository.delete(&session_id).await.map(|()| true);
                let _ = ack.send(());
                result
            }
            DurableOp::Flush(ack) => {
                let _ = ack.send(());
                Ok(true)
            }
        };

        if let Err(e) = result {
            tracing::warn!(
                session_id = %session_id,
                op = name,
                error = %e,
                "Durable write failed; memory and storage have diverged"
            );
        }
    }
    tracing::debug!(session_id = %session_id, "Session writer stopped");
}
