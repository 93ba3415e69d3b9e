//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（N×N）
pub const BOARD_SIZE: usize = 10;

/// 连成一线获胜所需棋子数
pub const WIN_COUNT: usize = 5;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 聊天消息最大长度（字符）
pub const MAX_CHAT_LEN: usize = 500;

/// 房间号长度
pub const ROOM_ID_LEN: usize = 6;

/// 房间号字符集（去掉易混淆的 0/O/1/I）
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 每个连接的发送队列容量
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// 客户端心跳间隔（秒）
pub const HEARTBEAT_INTERVAL_SECS: u64 = 10;

/// 服务端心跳超时（秒）- 超过此时间无消息则断开
pub const HEARTBEAT_TIMEOUT_SECS: u64 = 30;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 心跳间隔 Duration
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(HEARTBEAT_INTERVAL_SECS);

/// 心跳超时 Duration
pub const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(HEARTBEAT_TIMEOUT_SECS);

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
