//! 房间目录
//!
//! 进程内的房间注册表：房间号 -> 房间，玩家 -> 所在房间号。
//! 加锁顺序固定为先目录后房间，不会反向获取。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tracing::info;

use protocol::{PlayerId, RoomId, ServerMessage, ROOM_ID_ALPHABET, ROOM_ID_LEN};

use crate::error::RoomError;
use crate::player::{Outbox, Player};
use crate::room::{Departure, Room};

/// 共享房间
pub type SharedRoom = Arc<Mutex<Room>>;

#[derive(Default)]
struct Registry {
    rooms: HashMap<RoomId, SharedRoom>,
    /// 玩家 -> 所在房间（反向索引）
    seats: HashMap<PlayerId, RoomId>,
}

/// 房间目录
#[derive(Default)]
pub struct RoomDirectory {
    inner: Mutex<Registry>,
}

/// 锁中毒时继续使用内部数据：状态转换都在临界区内一次性完成
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 生成随机房间号
pub fn generate_room_id<R: Rng + ?Sized>(rng: &mut R) -> RoomId {
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建房间，创建者入座并收到 RoomCreated
    pub fn create_room(&self, player: &Player) -> Result<RoomId, RoomError> {
        let mut registry = lock(&self.inner);
        if let Some(room_id) = registry.seats.get(&player.id()) {
            return Err(RoomError::AlreadyInRoom(room_id.clone()));
        }

        // 冲突时重新生成
        let mut rng = rand::thread_rng();
        let room_id = loop {
            let candidate = generate_room_id(&mut rng);
            if !registry.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::new(room_id.clone(), player.clone());
        registry.rooms.insert(room_id.clone(), Arc::new(Mutex::new(room)));
        registry.seats.insert(player.id(), room_id.clone());
        player.post(ServerMessage::RoomCreated {
            room_id: room_id.clone(),
        });

        info!("玩家 {} 创建房间 {}", player.id(), room_id);
        Ok(room_id)
    }

    /// 加入房间
    ///
    /// 目录锁与房间锁同时持有，并发加入同一房间最多一人成功。
    pub fn join_room(&self, player: &Player, room_id: &str) -> Result<(), RoomError> {
        let mut registry = lock(&self.inner);
        if let Some(current) = registry.seats.get(&player.id()) {
            return Err(RoomError::AlreadyInRoom(current.clone()));
        }
        let shared = registry
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let mut room = lock(&shared);
        let outbox = room.join(player.clone(), &mut rand::thread_rng())?;
        registry.seats.insert(player.id(), room.id.clone());
        outbox.post();

        info!("玩家 {} 加入房间 {}", player.id(), room_id);
        Ok(())
    }

    /// 等待对手的房间（恰好一人）快照
    pub fn list_waiting(&self) -> Vec<RoomId> {
        let registry = lock(&self.inner);
        let mut waiting: Vec<RoomId> = registry
            .rooms
            .iter()
            .filter(|(_, room)| lock(room).is_waiting())
            .map(|(id, _)| id.clone())
            .collect();
        waiting.sort();
        waiting
    }

    /// 离开房间（主动或断线），空房间随即删除
    pub fn leave(&self, player_id: PlayerId, departure: Departure) -> Result<RoomId, RoomError> {
        let mut registry = lock(&self.inner);
        let room_id = registry.seats.remove(&player_id).ok_or(RoomError::NotInRoom)?;
        let Some(shared) = registry.rooms.get(&room_id).cloned() else {
            return Err(RoomError::NotInRoom);
        };

        let mut room = lock(&shared);
        let outbox = room.leave(player_id, departure)?;
        if room.is_empty() {
            registry.rooms.remove(&room_id);
            info!("房间 {} 已清空，删除", room_id);
        }
        outbox.post();
        Ok(room_id)
    }

    /// 删除空房间，返回是否删除
    pub fn remove_if_empty(&self, room_id: &str) -> bool {
        let mut registry = lock(&self.inner);
        let empty = registry
            .rooms
            .get(room_id)
            .map(|room| lock(room).is_empty())
            .unwrap_or(false);
        if empty {
            registry.rooms.remove(room_id);
        }
        empty
    }

    /// 在玩家所在房间内执行操作，通知在房间锁内投递
    ///
    /// 目录锁只用于查找，取到房间后即释放。
    pub fn with_room<F>(&self, player_id: PlayerId, op: F) -> Result<(), RoomError>
    where
        F: FnOnce(&mut Room) -> Result<Outbox, RoomError>,
    {
        let shared = {
            let registry = lock(&self.inner);
            let room_id = registry.seats.get(&player_id).ok_or(RoomError::NotInRoom)?;
            registry.rooms.get(room_id).cloned().ok_or(RoomError::NotInRoom)?
        };

        let mut room = lock(&shared);
        // 已不在该房间的旧会话不能再操作
        if !room.has_player(player_id) {
            return Err(RoomError::NotInRoom);
        }
        let outbox = op(&mut *room)?;
        outbox.post();
        Ok(())
    }

    /// 玩家所在房间号
    pub fn room_of(&self, player_id: PlayerId) -> Option<RoomId> {
        lock(&self.inner).seats.get(&player_id).cloned()
    }

    /// 读取房间
    pub fn get(&self, room_id: &str) -> Option<SharedRoom> {
        lock(&self.inner).rooms.get(room_id).cloned()
    }

    /// 获取房间数量
    pub fn count(&self) -> usize {
        lock(&self.inner).rooms.len()
    }
}
