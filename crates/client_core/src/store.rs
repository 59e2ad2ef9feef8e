use async_trait::async_trait;
use shared::{
    domain::{Deal, DealId, Stage},
    protocol::{DealCreate, DealMoveRequest, DealUpdate},
};

use crate::error::StoreError;

/// Unit of persistence for a drop: where the deal came to rest on screen.
///
/// `target_position` is the zero-based slot in the destination stage as
/// displayed at drop time; the store re-derives canonical positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommand {
    pub deal_id: DealId,
    pub target_stage: Stage,
    pub target_position: usize,
}

impl MoveCommand {
    pub fn new(deal_id: DealId, target_stage: Stage, target_position: usize) -> Self {
        Self {
            deal_id,
            target_stage,
            target_position,
        }
    }

    pub fn request(&self) -> DealMoveRequest {
        DealMoveRequest {
            column: self.target_stage,
            position: self.target_position,
        }
    }
}

/// Authoritative deal storage. `list` returns deals in display order: stage
/// by stage, position ascending within a stage.
#[async_trait]
pub trait RemoteDealStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Deal>, StoreError>;
    async fn get(&self, id: DealId) -> Result<Deal, StoreError>;
    async fn create(&self, payload: DealCreate) -> Result<Deal, StoreError>;
    async fn update(&self, id: DealId, patch: DealUpdate) -> Result<Deal, StoreError>;
    async fn move_deal(&self, command: &MoveCommand) -> Result<Deal, StoreError>;
    async fn delete(&self, id: DealId) -> Result<(), StoreError>;
}
