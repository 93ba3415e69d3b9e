//! 错误类型定义

use thiserror::Error;

/// 棋盘规则错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// 坐标越界
    #[error("Position out of bounds: ({x}, {y})")]
    OutOfBounds { x: usize, y: usize },

    /// 目标格已有棋子
    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: usize, y: usize },
}

/// 入站消息解码错误
#[derive(Error, Debug)]
pub enum DecodeError {
    /// 帧内容不是 JSON，后续数据不可信
    #[error("Frame body is not JSON: {0}")]
    Body(#[source] serde_json::Error),

    /// 合法 JSON，但不是 `{code, payload}` 信封
    #[error("Malformed envelope: {0}")]
    Envelope(String),

    /// 未知的消息码
    #[error("Unknown message code: {0}")]
    UnknownCode(String),

    /// 消息码已知但负载格式错误
    #[error("Malformed payload for '{code}': {reason}")]
    MalformedPayload { code: String, reason: String },
}

impl DecodeError {
    /// 是否必须关闭连接
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::Body(_))
    }
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
