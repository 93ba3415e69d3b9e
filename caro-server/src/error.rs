//! 房间与对局错误

use thiserror::Error;

use protocol::{ErrorCode, RoomId, MAX_CHAT_LEN};

/// 房间/对局操作被拒绝的原因
///
/// 所有变体都不修改状态，只回复给请求方。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    #[error("Room {0} is full")]
    RoomFull(RoomId),

    #[error("Not in a room")]
    NotInRoom,

    #[error("Already in room {0}")]
    AlreadyInRoom(RoomId),

    #[error("No opponent in the room")]
    NoOpponent,

    #[error("Chat text is empty or longer than {} characters", MAX_CHAT_LEN)]
    InvalidChat,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid move: ({x}, {y}) is off the board")]
    InvalidMove { x: i64, y: i64 },

    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },

    #[error("Match is already finished")]
    MatchFinished,

    #[error("Match has not started")]
    MatchNotStarted,

    #[error("Match is still in progress")]
    MatchInProgress,

    #[error("No pending draw offer from the opponent")]
    NoPendingDraw,
}

impl RoomError {
    /// 对应的线上错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            RoomError::RoomFull(_) => ErrorCode::RoomFull,
            RoomError::NotInRoom => ErrorCode::NotInRoom,
            RoomError::AlreadyInRoom(_) => ErrorCode::AlreadyInRoom,
            RoomError::NoOpponent => ErrorCode::NoOpponent,
            RoomError::InvalidChat => ErrorCode::InvalidChat,
            RoomError::NotYourTurn => ErrorCode::NotYourTurn,
            RoomError::InvalidMove { .. } => ErrorCode::InvalidMove,
            RoomError::CellOccupied { .. } => ErrorCode::CellOccupied,
            RoomError::MatchFinished => ErrorCode::MatchFinished,
            RoomError::MatchNotStarted => ErrorCode::MatchNotStarted,
            RoomError::MatchInProgress => ErrorCode::MatchInProgress,
            RoomError::NoPendingDraw => ErrorCode::NoPendingDraw,
        }
    }
}
