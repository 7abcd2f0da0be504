pub mod board;
pub mod error;
pub mod fields;
pub mod ordering;

pub use board::{Attachment, Board, Card, Column};
pub use error::KanbanError;
pub use fields::HexColor;
pub use ordering::{PositionChange, Positioned, Slot};
