//! Session event loop
//!
//! One [`Session`] serves one open model. Inbound actions are read from a
//! bounded channel and dispatched one at a time, each running to completion
//! before the next is taken. The only work leaving the loop is the
//! persistence write, which runs on the blocking pool while edits continue.
//! Its outcome is applied back on the loop and reported as a response.

use notagraph_core::errors::{ExError, ExErrorKind};
use notagraph_core::persistence::ModelPersistence;
use notagraph_core::{log_op_end, log_op_error, log_op_start};
use notagraph_core_types::{RequestContext, SessionId};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::actions::{Action, Severity};
use crate::config::EngineConfig;
use crate::dispatch::ActionDispatcher;
use crate::errors::{session_closed, Result};
use crate::state::{ModelStateManager, SaveOutcome};

#[derive(Debug)]
enum SessionMessage {
    Action(Action),
    Shutdown,
}

/// Client side of the inbound channel
#[derive(Debug, Clone)]
pub struct ActionSender {
    sender: mpsc::Sender<SessionMessage>,
}

impl ActionSender {
    /// Send an action, waiting for room in the inbound queue
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` once the session has stopped.
    pub async fn send(&self, action: Action) -> Result<()> {
        self.sender
            .send(SessionMessage::Action(action))
            .await
            .map_err(|_| session_closed())
    }

    /// Send an action without waiting
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` when the queue is full or the session stopped.
    pub fn try_send(&self, action: Action) -> Result<()> {
        self.sender
            .try_send(SessionMessage::Action(action))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => ExError::new(ExErrorKind::IllegalState)
                    .with_op("send_action")
                    .with_message("inbound queue is full"),
                mpsc::error::TrySendError::Closed(_) => session_closed(),
            })
    }

    /// Ask the session to stop after the actions already queued
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` when the session already stopped.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SessionMessage::Shutdown)
            .await
            .map_err(|_| session_closed())
    }
}

/// Responses produced by the session, in production order
pub type ResponseReceiver = mpsc::UnboundedReceiver<Action>;

pub struct Session {
    id: SessionId,
    state: ModelStateManager,
    dispatcher: ActionDispatcher,
    inbound: mpsc::Receiver<SessionMessage>,
    responses: mpsc::UnboundedSender<Action>,
    /// Start time and history position of the save in flight
    save_started: Option<(Instant, usize)>,
}

impl Session {
    pub fn new(
        state: ModelStateManager,
        dispatcher: ActionDispatcher,
        capacity: usize,
    ) -> (Self, ActionSender, ResponseReceiver) {
        let (sender, inbound) = mpsc::channel(capacity.max(1));
        let (responses, response_rx) = mpsc::unbounded_channel();
        let session = Self {
            id: SessionId::new(),
            state,
            dispatcher,
            inbound,
            responses,
            save_started: None,
        };
        (session, ActionSender { sender }, response_rx)
    }

    /// Open the stored model and wire the stock handlers
    ///
    /// # Errors
    ///
    /// Returns the load error of [`ModelStateManager::open`] or a handler
    /// registration error.
    pub fn from_config(
        persistence: Arc<dyn ModelPersistence>,
        config: &EngineConfig,
    ) -> Result<(Self, ActionSender, ResponseReceiver)> {
        let mut state = ModelStateManager::open(persistence)?;
        if let Some(limit) = config.history_limit {
            state = state.with_history_limit(limit);
        }
        let dispatcher = ActionDispatcher::with_default_handlers(config.dispatcher_config())?;
        Ok(Self::new(state, dispatcher, config.inbound_capacity))
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Access the state before the loop starts, e.g. to subscribe listeners
    pub fn state_mut(&mut self) -> &mut ModelStateManager {
        &mut self.state
    }

    /// Run until the inbound channel closes or a shutdown arrives
    ///
    /// Queued and in-flight saves are completed before returning, so no
    /// write is abandoned. Returns the final state.
    pub async fn run(mut self) -> ModelStateManager {
        tracing::info!(session_id = %self.id, "session started");
        let mut saves: JoinSet<SaveOutcome> = JoinSet::new();
        let mut accepting = true;

        loop {
            if saves.is_empty() {
                if let Some(pending) = self.state.take_pending_save() {
                    log_op_start!("save_model", revision = pending.revision());
                    self.save_started = Some((Instant::now(), pending.truncations_seen()));
                    saves.spawn_blocking(move || pending.write());
                }
            }
            if !accepting && saves.is_empty() {
                break;
            }

            tokio::select! {
                message = self.inbound.recv(), if accepting => match message {
                    Some(SessionMessage::Action(action)) => self.handle(action),
                    Some(SessionMessage::Shutdown) | None => {
                        tracing::debug!(session_id = %self.id, "session draining");
                        accepting = false;
                    }
                },
                Some(joined) = saves.join_next(), if !saves.is_empty() => self.finish_save(joined),
                else => break,
            }
        }

        tracing::info!(
            session_id = %self.id,
            revision = self.state.revision(),
            dirty = self.state.dirty(),
            "session stopped"
        );
        self.state
    }

    fn handle(&mut self, action: Action) {
        let ctx = RequestContext::new().with_session_id(self.id.clone());
        let span = tracing::info_span!(
            "dispatch",
            request_id = %ctx.request_id,
            session_id = %self.id,
            action_kind = action.kind().as_str()
        );
        let _guard = span.enter();

        if let Some(response) = self.dispatcher.dispatch(&action, &mut self.state) {
            self.respond(response);
        }
    }

    fn finish_save(&mut self, joined: std::result::Result<SaveOutcome, JoinError>) {
        let started = self.save_started.take();
        let duration_ms = started
            .map(|(start, _)| start.elapsed().as_millis() as u64)
            .unwrap_or_default();

        let result = match joined {
            Ok(outcome) => self.state.complete_save(outcome),
            Err(join_err) => {
                if let Some((_, truncations_seen)) = started {
                    self.state.abandon_save(truncations_seen);
                }
                Err(ExError::new(ExErrorKind::Internal)
                    .with_op("save_model")
                    .with_message(format!("save task failed: {}", join_err)))
            }
        };

        match result {
            Ok(()) => {
                log_op_end!(
                    "save_model",
                    duration_ms = duration_ms,
                    dirty = self.state.dirty()
                );
                self.respond(Action::SetDirtyState {
                    dirty: self.state.dirty(),
                    reason: "save".to_string(),
                });
            }
            Err(err) => {
                log_op_error!("save_model", err.clone(), duration_ms = duration_ms);
                self.respond(Action::ServerStatus {
                    severity: Severity::Error,
                    message: err.to_string(),
                });
            }
        }
    }

    fn respond(&self, response: Action) {
        if self.responses.send(response).is_err() {
            tracing::debug!(session_id = %self.id, "response receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatcherConfig;
    use notagraph_core::model::NotationModel;
    use notagraph_store::MemoryStore;

    fn session(store: Arc<MemoryStore>) -> (Session, ActionSender, ResponseReceiver) {
        let state = ModelStateManager::new(NotationModel::new(), store);
        let dispatcher =
            ActionDispatcher::with_default_handlers(DispatcherConfig::default()).unwrap();
        Session::new(state, dispatcher, 4)
    }

    #[tokio::test]
    async fn test_request_model_is_answered() {
        let (session, sender, mut responses) = session(Arc::new(MemoryStore::new()));
        let handle = tokio::spawn(session.run());

        sender.send(Action::RequestModel).await.unwrap();
        drop(sender);

        let response = responses.recv().await.unwrap();
        assert!(matches!(response, Action::UpdateModel { .. }));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_save() {
        let store = Arc::new(MemoryStore::new());
        let (session, sender, mut responses) = session(store.clone());
        let handle = tokio::spawn(session.run());

        sender.send(Action::SaveModel).await.unwrap();
        sender.shutdown().await.unwrap();

        let state = handle.await.unwrap();
        assert_eq!(store.save_count(), 1);
        assert!(!state.dirty());
        assert_eq!(
            responses.recv().await,
            Some(Action::SetDirtyState {
                dirty: false,
                reason: "save".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_send_after_stop_fails() {
        let (session, sender, _responses) = session(Arc::new(MemoryStore::new()));
        sender.shutdown().await.unwrap();
        session.run().await;

        let err = sender.send(Action::Undo).await.unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::IllegalState);
    }
}
