use std::collections::HashMap;

use shared::domain::{Deal, DealId, Stage};

use crate::error::BoardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardSlot {
    pub stage: Stage,
    pub index: usize,
}

impl BoardSlot {
    pub fn new(stage: Stage, index: usize) -> Self {
        Self { stage, index }
    }
}

/// Owned copy of the board, one ordered list of deals per stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    lanes: [Vec<Deal>; Stage::COUNT],
}

impl BoardSnapshot {
    pub fn lane(&self, stage: Stage) -> &[Deal] {
        &self.lanes[stage.index()]
    }

    pub fn ids(&self, stage: Stage) -> Vec<DealId> {
        self.lane(stage).iter().map(|deal| deal.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[Deal])> {
        Stage::ALL
            .into_iter()
            .map(move |stage| (stage, self.lane(stage)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBoard {
    deals: HashMap<DealId, Deal>,
    lanes: [Vec<DealId>; Stage::COUNT],
}

impl StageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_deals<I>(deals: I) -> Self
    where
        I: IntoIterator<Item = Deal>,
    {
        let mut board = Self::new();
        board.load(deals);
        board
    }

    /// Replaces the whole board. Input order is kept within each stage; a
    /// repeated id keeps only its last occurrence.
    pub fn load<I>(&mut self, deals: I)
    where
        I: IntoIterator<Item = Deal>,
    {
        self.deals.clear();
        for lane in &mut self.lanes {
            lane.clear();
        }

        for deal in deals {
            let id = deal.id;
            let stage = deal.stage;
            if let Some(previous) = self.deals.insert(id, deal) {
                self.lanes[previous.stage.index()].retain(|existing| *existing != id);
            }
            self.lanes[stage.index()].push(id);
        }
    }

    pub fn lane(&self, stage: Stage) -> &[DealId] {
        &self.lanes[stage.index()]
    }

    pub fn deals(&self, stage: Stage) -> impl Iterator<Item = &Deal> + '_ {
        self.lanes[stage.index()]
            .iter()
            .filter_map(move |id| self.deals.get(id))
    }

    pub fn deal(&self, id: DealId) -> Option<&Deal> {
        self.deals.get(&id)
    }

    pub fn deal_at(&self, slot: BoardSlot) -> Option<DealId> {
        self.lanes[slot.stage.index()].get(slot.index).copied()
    }

    pub fn locate(&self, id: DealId) -> Option<BoardSlot> {
        let stage = self.deals.get(&id)?.stage;
        let index = self.lanes[stage.index()]
            .iter()
            .position(|existing| *existing == id)?;
        Some(BoardSlot::new(stage, index))
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            lanes: std::array::from_fn(|index| {
                self.deals(Stage::ALL[index]).cloned().collect()
            }),
        }
    }

    /// Array move: remove at `from_index`, insert at `to_index`. Both indices
    /// must address an existing element.
    pub fn move_within_stage(
        &mut self,
        stage: Stage,
        from_index: usize,
        to_index: usize,
    ) -> Result<(), BoardError> {
        let lane = &mut self.lanes[stage.index()];
        check_index(stage, from_index, lane.len())?;
        check_index(stage, to_index, lane.len())?;
        if from_index == to_index {
            return Ok(());
        }

        let id = lane.remove(from_index);
        lane.insert(to_index, id);
        Ok(())
    }

    /// Moves the deal at `from_index` of `from_stage` into `to_stage` at
    /// `to_index` (which may equal the destination length) and retags it.
    /// Validation happens before any mutation.
    pub fn transfer_between_stages(
        &mut self,
        from_stage: Stage,
        to_stage: Stage,
        from_index: usize,
        to_index: usize,
    ) -> Result<DealId, BoardError> {
        if from_stage == to_stage {
            return Err(BoardError::SameStage(from_stage));
        }
        check_index(from_stage, from_index, self.lanes[from_stage.index()].len())?;
        let dest_len = self.lanes[to_stage.index()].len();
        if to_index > dest_len {
            return Err(BoardError::IndexOutOfRange {
                stage: to_stage,
                index: to_index,
                len: dest_len,
            });
        }

        let id = self.lanes[from_stage.index()].remove(from_index);
        self.lanes[to_stage.index()].insert(to_index, id);
        if let Some(deal) = self.deals.get_mut(&id) {
            deal.stage = to_stage;
        }
        Ok(id)
    }

    /// Dispatches to a within-stage move or a transfer depending on the slots.
    pub fn relocate(&mut self, from: BoardSlot, to: BoardSlot) -> Result<(), BoardError> {
        if from.stage == to.stage {
            self.move_within_stage(from.stage, from.index, to.index)
        } else {
            self.transfer_between_stages(from.stage, to.stage, from.index, to.index)
                .map(|_| ())
        }
    }
}

fn check_index(stage: Stage, index: usize, len: usize) -> Result<(), BoardError> {
    if index < len {
        Ok(())
    } else {
        Err(BoardError::IndexOutOfRange { stage, index, len })
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
