pub mod attachment_service;
pub mod board_service;
pub mod card_service;
pub mod column_service;
pub mod demo_board;
pub mod positions;

pub use attachment_service::AttachmentService;
pub use board_service::{Access, BoardService};
pub use card_service::CardService;
pub use column_service::ColumnService;
