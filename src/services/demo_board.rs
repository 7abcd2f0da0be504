use sqlx::SqlitePool;

use crate::api::dto::{CreateBoardRequest, CreateCardRequest, CreateColumnRequest};
use crate::domain::{Board, KanbanError};
use crate::services::{BoardService, CardService, ColumnService};

struct DemoCard {
    title: &'static str,
    progress: i64,
    tags: &'static [&'static str],
    avatars: &'static [&'static str],
}

struct DemoColumn {
    title: &'static str,
    color: &'static str,
    cards: &'static [DemoCard],
}

const DEMO_COLUMNS: &[DemoColumn] = &[
    DemoColumn {
        title: "To Do",
        color: "#3B82F6",
        cards: &[
            DemoCard {
                title: "UI/UX Design in the age of AI",
                progress: 0,
                tags: &["Important"],
                avatars: &["https://i.pravatar.cc/32?img=1", "https://i.pravatar.cc/32?img=2"],
            },
            DemoCard {
                title: "Responsive Website Design",
                progress: 0,
                tags: &["Meh"],
                avatars: &["https://i.pravatar.cc/32?img=3"],
            },
        ],
    },
    DemoColumn {
        title: "In Progress",
        color: "#F59E0B",
        cards: &[DemoCard {
            title: "Machine Learning Progress",
            progress: 52,
            tags: &["Important"],
            avatars: &["https://i.pravatar.cc/32?img=1", "https://i.pravatar.cc/32?img=2"],
        }],
    },
    DemoColumn {
        title: "Completed",
        color: "#10B981",
        cards: &[DemoCard {
            title: "User flow confirmation for fintech App",
            progress: 100,
            tags: &["Important"],
            avatars: &["https://i.pravatar.cc/32?img=1", "https://i.pravatar.cc/32?img=2"],
        }],
    },
];

/// Gives a new account a sample board to play with.
pub async fn seed_demo_board(pool: &SqlitePool, user_id: &str) -> Result<Board, KanbanError> {
    let board = BoardService::create_board(
        pool,
        user_id,
        CreateBoardRequest {
            title: "My first board".into(),
            description: Some("Drag cards between columns to get started".into()),
            background_color: None,
            is_public: Some(false),
        },
    )
    .await?;

    for demo_column in DEMO_COLUMNS {
        let column = ColumnService::add_column(
            pool,
            user_id,
            &board.id,
            CreateColumnRequest {
                title: demo_column.title.into(),
                color: Some(demo_column.color.into()),
            },
        )
        .await?;

        for demo_card in demo_column.cards {
            CardService::add_card(
                pool,
                user_id,
                &column.id,
                CreateCardRequest {
                    title: demo_card.title.into(),
                    description: None,
                    progress: Some(demo_card.progress),
                    tags: Some(demo_card.tags.iter().map(|t| t.to_string()).collect()),
                    avatars: Some(demo_card.avatars.iter().map(|a| a.to_string()).collect()),
                    due_date: None,
                    index: None,
                },
            )
            .await?;
        }
    }

    tracing::debug!(board_id = %board.id, user_id, "Demo board seeded");
    Ok(board)
}
