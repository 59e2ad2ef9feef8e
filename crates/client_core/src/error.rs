use shared::{
    domain::{DealId, Stage},
    error::ApiError,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("index {index} is out of range for stage {stage} holding {len} deals")]
    IndexOutOfRange {
        stage: Stage,
        index: usize,
        len: usize,
    },
    #[error("source and destination are both stage {0}; use a within-stage move")]
    SameStage(Stage),
    #[error("deal {deal_id} is not at {stage}[{index}]")]
    StaleDrop {
        deal_id: DealId,
        stage: Stage,
        index: usize,
    },
    #[error("deal {0} is not on the board")]
    UnknownDeal(DealId),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered and refused the request.
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("deal store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid deal store url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The task running the store call panicked or was cancelled.
    #[error("deal store call did not complete: {0}")]
    TaskFailed(String),
}

impl StoreError {
    /// Message supplied by the store, suitable for showing to the user.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            StoreError::Api(err) if !err.message.trim().is_empty() => Some(err.message.as_str()),
            _ => None,
        }
    }
}
