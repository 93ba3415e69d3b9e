//! 五子棋（Caro）共享协议库
//!
//! 包含:
//! - 棋盘与落子判定（五连判胜、满盘判和）
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码

mod board;
mod constants;
mod error;
mod message;
mod transport;

pub use board::{Board, MoveOutcome, Symbol};
pub use constants::*;
pub use error::{DecodeError, GameError, ProtocolError, Result};
pub use message::{ClientMessage, Envelope, ErrorCode, PlayerId, RoomId, ServerMessage};
pub use transport::{
    Connection, Connector, Listener,
    TcpConnection, TcpConnector, TcpListener,
    NetworkConfig,
    FrameReader, FrameWriter,
};
