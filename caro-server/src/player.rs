//! 玩家连接句柄与消息投递

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tracing::{debug, warn};

use protocol::{PlayerId, ServerMessage};

/// 玩家 ID 生成器（进程内单调递增，不复用）
#[derive(Debug)]
pub struct PlayerIdGenerator {
    next_id: AtomicU64,
}

impl PlayerIdGenerator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成新的玩家 ID
    pub fn next(&self) -> PlayerId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for PlayerIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 玩家连接句柄
///
/// 持有该连接发送队列的一端。房间只引用句柄，连接生命周期归会话循环所有。
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    sender: mpsc::Sender<ServerMessage>,
    kick: Arc<Notify>,
}

impl Player {
    /// 创建句柄及其发送队列的接收端
    pub fn channel(id: PlayerId, capacity: usize) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let player = Self {
            id,
            sender,
            kick: Arc::new(Notify::new()),
        };
        (player, receiver)
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// 把消息放入发送队列，不等待
    ///
    /// 队列满说明客户端读得太慢，标记为踢出，由会话循环按断线处理。
    pub fn post(&self, msg: ServerMessage) -> bool {
        match self.sender.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("玩家 {} 发送队列已满，断开连接", self.id);
                self.kick.notify_one();
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("玩家 {} 已断开，丢弃消息", self.id);
                false
            }
        }
    }

    /// 等待被踢出
    pub async fn kicked(&self) {
        self.kick.notified().await;
    }
}

/// 待发送的消息
///
/// 状态转换先把通知写进这里，再由持锁方一次性投递，
/// 保证同一房间的两次转换的通知不会交错。
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<(Player, ServerMessage)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发给单个玩家
    pub fn send(&mut self, to: &Player, msg: ServerMessage) {
        self.deliveries.push((to.clone(), msg));
    }

    /// 发给多个玩家
    pub fn broadcast<'a>(&mut self, to: impl IntoIterator<Item = &'a Player>, msg: ServerMessage) {
        for player in to {
            self.send(player, msg.clone());
        }
    }

    /// 投递到各玩家的发送队列
    pub fn post(self) {
        for (player, msg) in self.deliveries {
            player.post(msg);
        }
    }

    /// 某个玩家会收到的消息
    pub fn messages_for(&self, id: PlayerId) -> Vec<&ServerMessage> {
        self.deliveries
            .iter()
            .filter(|(p, _)| p.id == id)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }
}
