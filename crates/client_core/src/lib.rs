pub mod board;
pub mod controller;
pub mod error;
pub mod http_store;
pub mod memory_store;
pub mod notification;
pub mod store;

pub use board::{BoardSlot, BoardSnapshot, StageBoard};
pub use controller::{
    BoardEvent, ControllerOptions, DragReorderController, DropEvent, GestureId, GestureOrigin,
    GestureOutcome, GesturePhase,
};
pub use error::{BoardError, StoreError};
pub use http_store::HttpDealStore;
pub use memory_store::MemoryDealStore;
pub use notification::{Notification, NotificationLevel};
pub use store::{MoveCommand, RemoteDealStore};
