pub mod boards;
pub mod cards;

pub use boards::{
    BoardDetail, ColumnWithCards, CreateBoardRequest, CreateColumnRequest, MoveColumnRequest,
    UpdateBoardRequest, UpdateColumnRequest,
};
pub use cards::{
    CardResponse, CreateCardRequest, MoveCardRequest, MoveCardResponse, UpdateCardRequest,
};
