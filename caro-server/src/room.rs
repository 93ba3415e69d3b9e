//! 房间系统
//!
//! 房间是隔离与加锁的单位：最多两名玩家、一局对局状态。
//! 每个操作要么返回待发送的通知，要么返回错误且不改动任何状态。

use rand::Rng;
use tracing::{debug, info};

use protocol::{PlayerId, RoomId, ServerMessage, MAX_CHAT_LEN};

use crate::error::RoomError;
use crate::game::{MatchResult, MatchState};
use crate::player::{Outbox, Player};

/// 房间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// 等待对手加入
    WaitingForOpponent,
    /// 对局进行中
    InProgress,
    /// 对局结束
    Finished,
    /// 对局结束，已有一方同意再来一局
    RestartPending,
    /// 所有人已离开，房间即将从目录删除
    Terminated,
}

/// 离开房间的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// 主动离开，回复 RoomLeft
    Left,
    /// 连接断开，不回复
    Disconnected,
}

/// 房间
pub struct Room {
    pub id: RoomId,
    /// 入座顺序，最多两人
    occupants: Vec<Player>,
    /// 两人到齐后创建
    game: Option<MatchState>,
}

impl Room {
    /// 创建房间，创建者自动入座
    pub fn new(id: RoomId, creator: Player) -> Self {
        Self {
            id,
            occupants: vec![creator],
            game: None,
        }
    }

    /// 当前状态
    pub fn state(&self) -> RoomState {
        match &self.game {
            _ if self.occupants.is_empty() => RoomState::Terminated,
            _ if self.occupants.len() < 2 => RoomState::WaitingForOpponent,
            Some(game) if !game.is_finished() => RoomState::InProgress,
            Some(game) if !game.restart_votes().is_empty() => RoomState::RestartPending,
            Some(_) => RoomState::Finished,
            None => RoomState::WaitingForOpponent,
        }
    }

    pub fn game(&self) -> Option<&MatchState> {
        self.game.as_ref()
    }

    /// 检查房间是否已满
    pub fn is_full(&self) -> bool {
        self.occupants.len() >= 2
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// 是否只有一人在等待
    pub fn is_waiting(&self) -> bool {
        self.occupants.len() == 1
    }

    /// 检查玩家是否在房间中
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.occupants.iter().any(|p| p.id() == player_id)
    }

    /// 在座玩家 ID（入座顺序）
    pub fn occupant_ids(&self) -> Vec<PlayerId> {
        self.occupants.iter().map(Player::id).collect()
    }

    fn occupant(&self, player_id: PlayerId) -> Result<&Player, RoomError> {
        self.occupants
            .iter()
            .find(|p| p.id() == player_id)
            .ok_or(RoomError::NotInRoom)
    }

    /// 获取对手
    fn opponent(&self, player_id: PlayerId) -> Option<&Player> {
        self.occupants.iter().find(|p| p.id() != player_id)
    }

    /// 需要对手在场的操作
    fn require_opponent(&self, player_id: PlayerId) -> Result<&Player, RoomError> {
        self.occupant(player_id)?;
        self.opponent(player_id).ok_or(RoomError::NoOpponent)
    }

    /// 进行中（或已结束）的对局
    fn game_mut(&mut self) -> Result<&mut MatchState, RoomError> {
        self.game.as_mut().ok_or(RoomError::MatchNotStarted)
    }

    /// 加入房间，两人到齐后开局
    pub fn join<R: Rng + ?Sized>(&mut self, player: Player, rng: &mut R) -> Result<Outbox, RoomError> {
        if self.has_player(player.id()) {
            return Err(RoomError::AlreadyInRoom(self.id.clone()));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        let mut outbox = Outbox::new();
        outbox.send(
            &player,
            ServerMessage::RoomJoined {
                room_id: self.id.clone(),
            },
        );
        self.occupants.push(player);

        if self.is_full() {
            self.start_match(rng, &mut outbox);
        }
        Ok(outbox)
    }

    /// 开局：随机分配符号与先手，分别通知双方
    fn start_match<R: Rng + ?Sized>(&mut self, rng: &mut R, outbox: &mut Outbox) {
        let (a, b) = (self.occupants[0].id(), self.occupants[1].id());
        let game = MatchState::random(a, b, rng);
        let first_turn = game.turn_owner().unwrap_or(a);

        for player in &self.occupants {
            let (Some(symbol), Some(opponent)) = (game.symbol_of(player.id()), game.opponent_of(player.id())) else {
                continue;
            };
            outbox.send(
                player,
                ServerMessage::MatchStarted {
                    you: player.id(),
                    opponent,
                    symbol,
                    first_turn,
                },
            );
        }

        info!("房间 {} 开局: {} vs {}，{} 先手", self.id, a, b, first_turn);
        self.game = Some(game);
    }

    /// 离开房间
    ///
    /// 对局未结束时作废，留下的玩家收到 OpponentLeft。
    pub fn leave(&mut self, player_id: PlayerId, departure: Departure) -> Result<Outbox, RoomError> {
        let index = self
            .occupants
            .iter()
            .position(|p| p.id() == player_id)
            .ok_or(RoomError::NotInRoom)?;
        let leaver = self.occupants.remove(index);

        if let Some(game) = self.game.as_mut() {
            game.abandon();
        }

        let mut outbox = Outbox::new();
        if departure == Departure::Left {
            outbox.send(&leaver, ServerMessage::RoomLeft);
        }
        outbox.broadcast(&self.occupants, ServerMessage::OpponentLeft { player_id });

        info!("玩家 {} 离开房间 {} ({:?})", player_id, self.id, departure);
        Ok(outbox)
    }

    /// 执行落子，广播给双方（包括落子方）
    pub fn make_move(&mut self, player_id: PlayerId, x: i64, y: i64) -> Result<Outbox, RoomError> {
        self.occupant(player_id)?;
        let (symbol, terminal) = self.game_mut()?.apply_move(player_id, x, y)?;

        let mut outbox = Outbox::new();
        outbox.broadcast(
            &self.occupants,
            ServerMessage::MoveApplied {
                x: x as usize,
                y: y as usize,
                symbol,
                by: player_id,
                terminal,
            },
        );

        if terminal.is_terminal() {
            info!("房间 {} 对局结束: {:?}", self.id, terminal);
        } else {
            debug!("房间 {} 玩家 {} 落子 ({}, {})", self.id, player_id, x, y);
        }
        Ok(outbox)
    }

    /// 聊天，转发给对手
    pub fn chat(&self, player_id: PlayerId, text: String) -> Result<Outbox, RoomError> {
        let opponent = self.require_opponent(player_id)?;
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_CHAT_LEN {
            return Err(RoomError::InvalidChat);
        }

        let mut outbox = Outbox::new();
        outbox.send(
            opponent,
            ServerMessage::Chat {
                from: player_id,
                text: trimmed.to_string(),
            },
        );
        Ok(outbox)
    }

    /// 再来一局投票
    ///
    /// 单方同意只通知对手；双方同意则重开；反对清空投票，不通知。
    pub fn rematch_vote<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        agree: bool,
        rng: &mut R,
    ) -> Result<Outbox, RoomError> {
        self.occupant(player_id)?;
        if self.game.is_none() {
            return Err(RoomError::MatchNotStarted);
        }
        let opponent = self.opponent(player_id).cloned().ok_or(RoomError::NoOpponent)?;

        let game = self.game_mut()?;
        if !game.is_finished() {
            return Err(RoomError::MatchInProgress);
        }

        let mut outbox = Outbox::new();
        if !game.vote_restart(player_id, agree) {
            if agree {
                outbox.send(&opponent, ServerMessage::RematchRequested { from: player_id });
            } else {
                debug!("房间 {} 玩家 {} 拒绝再来一局", self.id, player_id);
            }
            return Ok(outbox);
        }

        let next = game.rematch(rng);
        let first_turn = next.turn_owner().unwrap_or(player_id);
        self.game = Some(next);
        outbox.broadcast(&self.occupants, ServerMessage::MatchRestarted { first_turn });

        info!("房间 {} 再来一局，{} 先手", self.id, first_turn);
        Ok(outbox)
    }

    /// 提和，转发给对手
    pub fn offer_draw(&mut self, player_id: PlayerId) -> Result<Outbox, RoomError> {
        let opponent = self.in_progress_opponent(player_id)?;
        self.game_mut()?.offer_draw(player_id);

        let mut outbox = Outbox::new();
        outbox.send(&opponent, ServerMessage::DrawRequested { from: player_id });
        Ok(outbox)
    }

    /// 同意和棋，双方收到 DrawAccepted
    pub fn accept_draw(&mut self, player_id: PlayerId) -> Result<Outbox, RoomError> {
        self.in_progress_opponent(player_id)?;
        let game = self.game_mut()?;
        game.take_draw_offer(player_id)?;
        game.finish(MatchResult::Draw);

        let mut outbox = Outbox::new();
        outbox.broadcast(&self.occupants, ServerMessage::DrawAccepted);

        info!("房间 {} 协议和棋", self.id);
        Ok(outbox)
    }

    /// 拒绝和棋，只通知提和方
    pub fn reject_draw(&mut self, player_id: PlayerId) -> Result<Outbox, RoomError> {
        let opponent = self.in_progress_opponent(player_id)?;
        self.game_mut()?.take_draw_offer(player_id)?;

        let mut outbox = Outbox::new();
        outbox.send(&opponent, ServerMessage::DrawRejected { from: player_id });
        Ok(outbox)
    }

    /// 提和相关操作的前置检查，返回对手句柄
    fn in_progress_opponent(&self, player_id: PlayerId) -> Result<Player, RoomError> {
        self.occupant(player_id)?;
        let game = self.game.as_ref().ok_or(RoomError::MatchNotStarted)?;
        if game.is_finished() {
            return Err(RoomError::MatchFinished);
        }
        self.opponent(player_id).cloned().ok_or(RoomError::NoOpponent)
    }
}
