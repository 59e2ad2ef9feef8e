use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use shared::{
    domain::{Deal, DealId, Stage},
    protocol::{DealCreate, DealUpdate},
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{
    board::{BoardSlot, BoardSnapshot, StageBoard},
    error::{BoardError, StoreError},
    notification::{Notification, DEFAULT_NOTIFICATION_TTL},
    store::{MoveCommand, RemoteDealStore},
};

const LOAD_FAILED: &str = "Failed to load deals";
const MOVE_FAILED: &str = "Failed to move deal";
const CREATE_FAILED: &str = "Failed to create deal";
const UPDATE_FAILED: &str = "Failed to update deal";
const DELETE_FAILED: &str = "Failed to delete deal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(pub u64);

impl fmt::Display for GestureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOrigin {
    Drag,
    /// "Move to stage" menu entry: a drop at the front of the target stage.
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Dropped,
    Persisting,
    Committed,
    RolledBack,
}

/// A completed drag gesture as reported by the board view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropEvent {
    pub deal_id: DealId,
    pub from: BoardSlot,
    pub to: BoardSlot,
}

impl DropEvent {
    pub fn new(deal_id: DealId, from: BoardSlot, to: BoardSlot) -> Self {
        Self { deal_id, from, to }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureOutcome {
    pub gesture: GestureId,
    pub origin: GestureOrigin,
    pub command: MoveCommand,
    pub phase: GesturePhase,
    pub error: Option<String>,
    /// Set when a rollback could not re-fetch the board; the optimistic
    /// state is still on screen.
    pub reload_failed: bool,
}

#[derive(Debug, Clone)]
pub enum BoardEvent {
    Reloaded,
    MoveApplied {
        gesture: GestureId,
        command: MoveCommand,
    },
    MoveCommitted {
        gesture: GestureId,
        command: MoveCommand,
    },
    MoveRolledBack {
        gesture: GestureId,
        command: MoveCommand,
    },
    Notify(Notification),
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub notification_ttl: Duration,
    pub event_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            event_capacity: 256,
        }
    }
}

struct PendingMove {
    origin: GestureOrigin,
    command: MoveCommand,
    phase: GesturePhase,
}

struct PersistCompletion {
    gesture: GestureId,
    result: Result<Deal, StoreError>,
}

pub struct DragReorderController {
    board: StageBoard,
    store: Arc<dyn RemoteDealStore>,
    options: ControllerOptions,
    pending: HashMap<GestureId, PendingMove>,
    next_gesture: u64,
    completions_tx: mpsc::UnboundedSender<PersistCompletion>,
    completions_rx: mpsc::UnboundedReceiver<PersistCompletion>,
    events: broadcast::Sender<BoardEvent>,
}

impl DragReorderController {
    pub fn new(store: Arc<dyn RemoteDealStore>) -> Self {
        Self::with_options(store, ControllerOptions::default())
    }

    pub fn with_options(store: Arc<dyn RemoteDealStore>, options: ControllerOptions) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            board: StageBoard::new(),
            store,
            options,
            pending: HashMap::new(),
            next_gesture: 1,
            completions_tx,
            completions_rx,
            events,
        }
    }

    pub fn board(&self) -> &StageBoard {
        &self.board
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Phase of a gesture still awaiting its store response.
    pub fn phase(&self, gesture: GestureId) -> Option<GesturePhase> {
        self.pending.get(&gesture).map(|pending| pending.phase)
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Replaces the board with the store's current listing.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        match self.store.list().await {
            Ok(deals) => {
                self.board.load(deals);
                info!(deals = self.board.len(), "board reloaded");
                self.emit(BoardEvent::Reloaded);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to reload board");
                self.notify_store_error(&err, LOAD_FAILED);
                Err(err)
            }
        }
    }

    /// Applies a drop optimistically and starts persisting it. Must be called
    /// from within a Tokio runtime. A rejected drop leaves the board as it
    /// was and sends nothing to the store.
    pub fn on_drop(&mut self, event: DropEvent) -> Result<GestureId, BoardError> {
        self.begin(event, GestureOrigin::Drag)
    }

    /// Moves a deal to the front of `stage` without a drag.
    pub fn move_to_stage(&mut self, deal_id: DealId, stage: Stage) -> Result<GestureId, BoardError> {
        let from = self
            .board
            .locate(deal_id)
            .ok_or(BoardError::UnknownDeal(deal_id))?;
        self.begin(
            DropEvent::new(deal_id, from, BoardSlot::new(stage, 0)),
            GestureOrigin::Menu,
        )
    }

    /// Waits for the next store response and reconciles it. Returns `None`
    /// when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<GestureOutcome> {
        while !self.pending.is_empty() {
            let completion = self.completions_rx.recv().await?;
            if let Some(outcome) = self.reconcile(completion).await {
                return Some(outcome);
            }
        }
        None
    }

    /// Reconciles every response that has already arrived, without waiting.
    pub async fn drain_ready(&mut self) -> Vec<GestureOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Some(outcome) = self.reconcile(completion).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Waits until every in-flight gesture has reached a terminal phase.
    pub async fn settle(&mut self) -> Vec<GestureOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn create_deal(&mut self, payload: DealCreate) -> Result<Deal, StoreError> {
        let result = match payload.validate() {
            Ok(()) => self.store.create(payload).await,
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(deal) => {
                info!(deal_id = %deal.id, stage = %deal.stage, "deal created");
                self.notify_info("Deal created");
                let _ = self.reload().await;
                Ok(deal)
            }
            Err(err) => {
                warn!(error = %err, "failed to create deal");
                self.notify_store_error(&err, CREATE_FAILED);
                Err(err)
            }
        }
    }

    pub async fn update_deal(&mut self, id: DealId, patch: DealUpdate) -> Result<Deal, StoreError> {
        let result = match patch.validate() {
            Ok(()) => self.store.update(id, patch).await,
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(deal) => {
                info!(deal_id = %id, "deal updated");
                self.notify_info("Deal updated");
                let _ = self.reload().await;
                Ok(deal)
            }
            Err(err) => {
                warn!(deal_id = %id, error = %err, "failed to update deal");
                self.notify_store_error(&err, UPDATE_FAILED);
                Err(err)
            }
        }
    }

    pub async fn delete_deal(&mut self, id: DealId) -> Result<(), StoreError> {
        match self.store.delete(id).await {
            Ok(()) => {
                info!(deal_id = %id, "deal deleted");
                self.notify_info("Deal deleted");
                let _ = self.reload().await;
                Ok(())
            }
            Err(err) => {
                warn!(deal_id = %id, error = %err, "failed to delete deal");
                self.notify_store_error(&err, DELETE_FAILED);
                Err(err)
            }
        }
    }

    fn begin(&mut self, event: DropEvent, origin: GestureOrigin) -> Result<GestureId, BoardError> {
        if self.board.deal_at(event.from) != Some(event.deal_id) {
            return Err(BoardError::StaleDrop {
                deal_id: event.deal_id,
                stage: event.from.stage,
                index: event.from.index,
            });
        }
        self.board.relocate(event.from, event.to)?;

        let gesture = GestureId(self.next_gesture);
        self.next_gesture += 1;
        let command = MoveCommand::new(event.deal_id, event.to.stage, event.to.index);
        debug!(
            %gesture,
            deal_id = %event.deal_id,
            from_stage = %event.from.stage,
            from_index = event.from.index,
            to_stage = %event.to.stage,
            to_index = event.to.index,
            "drop applied"
        );
        self.pending.insert(
            gesture,
            PendingMove {
                origin,
                command,
                phase: GesturePhase::Dropped,
            },
        );
        self.emit(BoardEvent::MoveApplied { gesture, command });

        self.persist(gesture, command);
        Ok(gesture)
    }

    fn persist(&mut self, gesture: GestureId, command: MoveCommand) {
        let store = Arc::clone(&self.store);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let call = tokio::spawn(async move { store.move_deal(&command).await });
            let result = match call.await {
                Ok(result) => result,
                Err(err) => Err(StoreError::TaskFailed(err.to_string())),
            };
            let _ = completions.send(PersistCompletion { gesture, result });
        });

        if let Some(pending) = self.pending.get_mut(&gesture) {
            pending.phase = GesturePhase::Persisting;
        }
        debug!(%gesture, "move persisting");
    }

    async fn reconcile(&mut self, completion: PersistCompletion) -> Option<GestureOutcome> {
        let PersistCompletion { gesture, result } = completion;
        let pending = self.pending.remove(&gesture)?;
        let command = pending.command;

        match result {
            Ok(deal) => {
                info!(
                    %gesture,
                    deal_id = %deal.id,
                    stage = %deal.stage,
                    position = deal.position,
                    "move committed"
                );
                self.emit(BoardEvent::MoveCommitted { gesture, command });
                if pending.origin == GestureOrigin::Menu {
                    self.notify_info(format!(
                        "Deal moved to \"{}\"",
                        command.target_stage.label()
                    ));
                }
                Some(GestureOutcome {
                    gesture,
                    origin: pending.origin,
                    command,
                    phase: GesturePhase::Committed,
                    error: None,
                    reload_failed: false,
                })
            }
            Err(err) => {
                warn!(
                    %gesture,
                    deal_id = %command.deal_id,
                    error = %err,
                    "move failed; reloading board"
                );
                self.notify_store_error(&err, MOVE_FAILED);
                let reload_failed = self.reload().await.is_err();
                self.emit(BoardEvent::MoveRolledBack { gesture, command });
                Some(GestureOutcome {
                    gesture,
                    origin: pending.origin,
                    command,
                    phase: GesturePhase::RolledBack,
                    error: Some(err.to_string()),
                    reload_failed,
                })
            }
        }
    }

    fn notify_info(&self, message: impl Into<String>) {
        self.emit(BoardEvent::Notify(Notification::info(
            message,
            self.options.notification_ttl,
        )));
    }

    fn notify_store_error(&self, err: &StoreError, fallback: &str) {
        let message = err.user_message().unwrap_or(fallback).to_string();
        self.emit(BoardEvent::Notify(Notification::error(
            message,
            self.options.notification_ttl,
        )));
    }

    fn emit(&self, event: BoardEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
