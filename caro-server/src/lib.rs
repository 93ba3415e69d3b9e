//! 五子棋（Caro）对战服务端
//!
//! 包含:
//! - 房间目录与配对
//! - 对局状态机（落子、胜负、和棋、再来一局）
//! - 每个连接的会话循环
//! - 配置加载

pub mod config;
pub mod directory;
pub mod error;
pub mod game;
pub mod player;
pub mod room;
pub mod server;

pub use config::{ConfigSource, ServerConfig};
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use game::{MatchResult, MatchState};
pub use player::{Outbox, Player, PlayerIdGenerator};
pub use room::{Departure, Room, RoomState};
pub use server::{MessageHandler, Server, ServerState};
