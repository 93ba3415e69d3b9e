//! 消息类型定义
//!
//! 线上格式为信封 `{"code": "...", "payload": {...}}`，
//! 入站/出站消息都是按 `code` 标记的封闭枚举。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::board::{MoveOutcome, Symbol};
use crate::error::DecodeError;

/// 玩家 ID（每个连接一个，不复用）
pub type PlayerId = u64;

/// 房间 ID（短字符串房间号）
pub type RoomId = String;

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    // === 房间操作 ===
    /// 创建房间
    CreateRoom,
    /// 加入房间
    JoinRoom { room_id: RoomId },
    /// 获取等待中的房间列表
    ListRooms,
    /// 离开房间
    LeaveRoom,

    // === 对局操作 ===
    /// 聊天
    Chat { text: String },
    /// 落子（坐标可能越界，由服务端校验；超出 i64 的整数按负载错误处理）
    Move { x: i64, y: i64 },
    /// 再来一局投票
    RematchVote { agree: bool },
    /// 提和
    DrawOffer,
    /// 同意和棋
    DrawAccept,
    /// 拒绝和棋
    DrawReject,

    // === 心跳 ===
    /// 心跳请求
    Ping,
}

impl ClientMessage {
    /// 所有入站消息码
    pub const CODES: &'static [&'static str] = &[
        "create-room",
        "join-room",
        "list-rooms",
        "leave-room",
        "chat",
        "move",
        "rematch-vote",
        "draw-offer",
        "draw-accept",
        "draw-reject",
        "ping",
    ];

    /// 消息码
    pub fn code(&self) -> &'static str {
        match self {
            ClientMessage::CreateRoom => "create-room",
            ClientMessage::JoinRoom { .. } => "join-room",
            ClientMessage::ListRooms => "list-rooms",
            ClientMessage::LeaveRoom => "leave-room",
            ClientMessage::Chat { .. } => "chat",
            ClientMessage::Move { .. } => "move",
            ClientMessage::RematchVote { .. } => "rematch-vote",
            ClientMessage::DrawOffer => "draw-offer",
            ClientMessage::DrawAccept => "draw-accept",
            ClientMessage::DrawReject => "draw-reject",
            ClientMessage::Ping => "ping",
        }
    }

    /// 从一帧 JSON 解码
    ///
    /// 只有不是 JSON 的帧返回致命错误；信封形状、未知消息码与负载错误都可以恢复。
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Body)?;
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| DecodeError::Envelope(e.to_string()))?;

        if !Self::CODES.contains(&envelope.code.as_str()) {
            return Err(DecodeError::UnknownCode(envelope.code));
        }

        let code = envelope.code.clone();
        serde_json::from_value(envelope.into_value()).map_err(|e| DecodeError::MalformedPayload {
            code,
            reason: e.to_string(),
        })
    }
}

/// 消息信封
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub code: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// 转回 JSON 对象，`null` 与空对象负载视为缺省
    fn into_value(self) -> Value {
        let empty = match &self.payload {
            Value::Null => true,
            Value::Object(fields) => fields.is_empty(),
            _ => false,
        };
        let mut map = Map::new();
        map.insert("code".to_string(), Value::String(self.code));
        if !empty {
            map.insert("payload".to_string(), self.payload);
        }
        Value::Object(map)
    }
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    // === 连接 ===
    /// 连接建立，分配玩家 ID
    Welcome { player_id: PlayerId },

    // === 房间事件 ===
    /// 房间创建成功
    RoomCreated { room_id: RoomId },
    /// 加入房间成功
    RoomJoined { room_id: RoomId },
    /// 等待中的房间列表
    RoomList { rooms: Vec<RoomId> },
    /// 已离开房间
    RoomLeft,
    /// 对手离开（对局作废）
    OpponentLeft { player_id: PlayerId },

    // === 对局事件 ===
    /// 对局开始
    MatchStarted {
        you: PlayerId,
        opponent: PlayerId,
        symbol: Symbol,
        first_turn: PlayerId,
    },
    /// 落子完成
    MoveApplied {
        x: usize,
        y: usize,
        symbol: Symbol,
        by: PlayerId,
        terminal: MoveOutcome,
    },
    /// 双方同意，新一局开始
    MatchRestarted { first_turn: PlayerId },
    /// 对手请求再来一局
    RematchRequested { from: PlayerId },
    /// 对手提和
    DrawRequested { from: PlayerId },
    /// 和棋成立
    DrawAccepted,
    /// 提和被拒绝
    DrawRejected { from: PlayerId },

    // === 聊天 ===
    /// 聊天消息
    Chat { from: PlayerId, text: String },

    // === 心跳 ===
    /// 心跳响应
    Pong,

    // === 错误 ===
    /// 错误消息（只发给请求方）
    Error { kind: ErrorCode, detail: String },
}

impl ServerMessage {
    /// 构造错误回复
    pub fn error(kind: ErrorCode, detail: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind,
            detail: detail.into(),
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // === 协议相关 (1xx) ===
    /// 未知消息码
    UnknownCode = 100,
    /// 负载格式错误
    MalformedPayload = 101,

    // === 房间相关 (2xx) ===
    /// 房间不存在
    RoomNotFound = 200,
    /// 房间已满
    RoomFull = 201,
    /// 不在房间中
    NotInRoom = 202,
    /// 已在房间中
    AlreadyInRoom = 203,
    /// 房间内没有对手
    NoOpponent = 204,
    /// 聊天内容无效
    InvalidChat = 205,

    // === 对局相关 (3xx) ===
    /// 不是你的回合
    NotYourTurn = 300,
    /// 无效落子（越界）
    InvalidMove = 301,
    /// 目标格已有棋子
    CellOccupied = 302,
    /// 对局已结束
    MatchFinished = 303,
    /// 对局未开始
    MatchNotStarted = 304,
    /// 对局进行中
    MatchInProgress = 305,
    /// 没有待回应的提和
    NoPendingDraw = 306,

    // === 系统相关 (5xx) ===
    /// 内部错误
    InternalError = 500,
}

impl ErrorCode {
    /// 数字错误码
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
