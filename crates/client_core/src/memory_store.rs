use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{Deal, DealId, Stage},
    error::ApiError,
    protocol::{DealCreate, DealUpdate},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::StoreError,
    store::{MoveCommand, RemoteDealStore},
};

#[derive(Default)]
pub struct MemoryDealStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    deals: HashMap<DealId, Deal>,
    lanes: [Vec<DealId>; Stage::COUNT],
}

impl MemoryDealStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store. Deals are ordered by stage, then position, newest
    /// first on ties, and renumbered. A repeated id keeps its last occurrence.
    pub fn from_deals(deals: Vec<Deal>) -> Self {
        let mut seen = HashSet::new();
        let mut deals: Vec<Deal> = deals
            .into_iter()
            .rev()
            .filter(|deal| seen.insert(deal.id))
            .collect();
        deals.reverse();
        deals.sort_by_key(|deal| (deal.stage, deal.position, Reverse(deal.created_at)));

        let mut state = MemoryState::default();
        for deal in deals {
            state.lanes[deal.stage.index()].push(deal.id);
            state.deals.insert(deal.id, deal);
        }
        for stage in Stage::ALL {
            state.renumber(stage);
        }

        Self {
            inner: Mutex::new(state),
        }
    }

    /// All deals in list order.
    pub async fn export(&self) -> Vec<Deal> {
        self.inner.lock().await.ordered()
    }
}

impl MemoryState {
    fn ordered(&self) -> Vec<Deal> {
        self.lanes
            .iter()
            .flatten()
            .filter_map(|id| self.deals.get(id).cloned())
            .collect()
    }

    fn renumber(&mut self, stage: Stage) {
        for (position, id) in self.lanes[stage.index()].iter().enumerate() {
            if let Some(deal) = self.deals.get_mut(id) {
                deal.position = position as i64;
            }
        }
    }

    fn stage_of(&self, id: DealId) -> Result<Stage, StoreError> {
        self.deals
            .get(&id)
            .map(|deal| deal.stage)
            .ok_or_else(|| not_found(id))
    }

    fn place(&mut self, id: DealId, stage: Stage, position: usize) {
        let lane = &mut self.lanes[stage.index()];
        let at = position.min(lane.len());
        lane.insert(at, id);
    }

    fn snapshot_of(&self, id: DealId) -> Result<Deal, StoreError> {
        self.deals.get(&id).cloned().ok_or_else(|| not_found(id))
    }
}

#[async_trait]
impl RemoteDealStore for MemoryDealStore {
    async fn list(&self) -> Result<Vec<Deal>, StoreError> {
        Ok(self.inner.lock().await.ordered())
    }

    async fn get(&self, id: DealId) -> Result<Deal, StoreError> {
        self.inner.lock().await.snapshot_of(id)
    }

    async fn create(&self, payload: DealCreate) -> Result<Deal, StoreError> {
        payload.validate()?;
        let now = Utc::now();
        let deal = Deal {
            id: DealId::new(),
            company: payload.company,
            sector: payload.sector,
            funding_stage: payload.funding_stage,
            founders: payload.founders,
            stage: payload.stage,
            notes: payload.notes,
            next_step: payload.next_step,
            internal_owner: payload.internal_owner,
            position: 0,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.inner.lock().await;
        let id = deal.id;
        let stage = deal.stage;
        state.deals.insert(id, deal);
        state.place(id, stage, 0);
        state.renumber(stage);
        debug!(deal_id = %id, %stage, "memory store created deal");
        state.snapshot_of(id)
    }

    async fn update(&self, id: DealId, patch: DealUpdate) -> Result<Deal, StoreError> {
        patch.validate()?;
        let mut state = self.inner.lock().await;
        let previous_stage = state.stage_of(id)?;

        if let Some(deal) = state.deals.get_mut(&id) {
            patch.apply_to(deal);
            deal.updated_at = Utc::now();
        }

        let stage = state.stage_of(id)?;
        if stage != previous_stage {
            state.lanes[previous_stage.index()].retain(|existing| *existing != id);
            state.place(id, stage, 0);
            state.renumber(previous_stage);
            state.renumber(stage);
        }
        state.snapshot_of(id)
    }

    async fn move_deal(&self, command: &MoveCommand) -> Result<Deal, StoreError> {
        let id = command.deal_id;
        let mut state = self.inner.lock().await;
        let previous_stage = state.stage_of(id)?;

        state.lanes[previous_stage.index()].retain(|existing| *existing != id);
        state.place(id, command.target_stage, command.target_position);
        if let Some(deal) = state.deals.get_mut(&id) {
            deal.stage = command.target_stage;
            deal.updated_at = Utc::now();
        }
        state.renumber(previous_stage);
        if command.target_stage != previous_stage {
            state.renumber(command.target_stage);
        }

        debug!(
            deal_id = %id,
            stage = %command.target_stage,
            position = command.target_position,
            "memory store moved deal"
        );
        state.snapshot_of(id)
    }

    async fn delete(&self, id: DealId) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        let stage = state.stage_of(id)?;
        state.deals.remove(&id);
        state.lanes[stage.index()].retain(|existing| *existing != id);
        state.renumber(stage);
        Ok(())
    }
}

fn not_found(id: DealId) -> StoreError {
    StoreError::Api(ApiError::not_found(format!("Deal with id {id} not found")))
}

#[cfg(test)]
#[path = "tests/memory_store_tests.rs"]
mod tests;
