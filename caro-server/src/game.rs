//! 对局状态
//!
//! 一局棋的全部可变状态：棋盘、轮次、符号分配、终局结果、再来一局投票与提和。
//! 只在所属房间的锁内修改。

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use protocol::{Board, MoveOutcome, PlayerId, Symbol};

use crate::error::RoomError;

/// 对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// 某方连成五子
    Win(PlayerId),
    /// 满盘或双方同意的和棋
    Draw,
}

/// 对局状态
#[derive(Debug, Clone)]
pub struct MatchState {
    board: Board,
    /// 双方及其符号，按入座顺序
    seats: [(PlayerId, Symbol); 2],
    turn_owner: Option<PlayerId>,
    finished: bool,
    result: Option<MatchResult>,
    restart_votes: HashSet<PlayerId>,
    draw_offered_by: Option<PlayerId>,
}

impl MatchState {
    /// 指定符号与先手创建对局
    pub fn new(seats: [(PlayerId, Symbol); 2], first_turn: PlayerId) -> Self {
        Self {
            board: Board::default(),
            seats,
            turn_owner: Some(first_turn),
            finished: false,
            result: None,
            restart_votes: HashSet::new(),
            draw_offered_by: None,
        }
    }

    /// 随机分配符号与先手，与入座顺序无关
    pub fn random<R: Rng + ?Sized>(a: PlayerId, b: PlayerId, rng: &mut R) -> Self {
        let mut symbols = Symbol::ALL;
        symbols.shuffle(rng);
        let first_turn = if rng.gen_bool(0.5) { a } else { b };
        Self::new([(a, symbols[0]), (b, symbols[1])], first_turn)
    }

    /// 再来一局：保留符号，先手重新随机
    pub fn rematch<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let first_turn = if rng.gen_bool(0.5) {
            self.seats[0].0
        } else {
            self.seats[1].0
        };
        Self::new(self.seats, first_turn)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn_owner(&self) -> Option<PlayerId> {
        self.turn_owner
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn draw_offered_by(&self) -> Option<PlayerId> {
        self.draw_offered_by
    }

    pub fn restart_votes(&self) -> &HashSet<PlayerId> {
        &self.restart_votes
    }

    /// 玩家的符号
    pub fn symbol_of(&self, player: PlayerId) -> Option<Symbol> {
        self.seats.iter().find(|(id, _)| *id == player).map(|(_, s)| *s)
    }

    /// 对手 ID
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        match self.seats {
            [(a, _), (b, _)] if a == player => Some(b),
            [(a, _), (b, _)] if b == player => Some(a),
            _ => None,
        }
    }

    /// 落子
    ///
    /// 任何拒绝都不修改状态。接受后轮次交给对手；终局时记录结果并关闭轮次。
    pub fn apply_move(&mut self, player: PlayerId, x: i64, y: i64) -> Result<(Symbol, MoveOutcome), RoomError> {
        if self.finished {
            return Err(RoomError::MatchFinished);
        }
        if self.turn_owner != Some(player) {
            return Err(RoomError::NotYourTurn);
        }
        let symbol = self.symbol_of(player).ok_or(RoomError::NotYourTurn)?;

        let (cx, cy) = match (usize::try_from(x), usize::try_from(y)) {
            (Ok(cx), Ok(cy)) if self.board.in_bounds(cx, cy) => (cx, cy),
            _ => return Err(RoomError::InvalidMove { x, y }),
        };
        if self.board.get(cx, cy).is_some() {
            return Err(RoomError::CellOccupied { x: cx, y: cy });
        }

        let outcome = self
            .board
            .apply_move(cx, cy, symbol)
            .map_err(|_| RoomError::CellOccupied { x: cx, y: cy })?;

        self.turn_owner = self.opponent_of(player);
        self.draw_offered_by = None;

        match outcome {
            MoveOutcome::Win => self.finish(MatchResult::Win(player)),
            MoveOutcome::Draw => self.finish(MatchResult::Draw),
            MoveOutcome::Continue => {}
        }

        Ok((symbol, outcome))
    }

    /// 结束对局
    pub fn finish(&mut self, result: MatchResult) {
        self.finished = true;
        self.result = Some(result);
        self.turn_owner = None;
        self.draw_offered_by = None;
        self.restart_votes.clear();
    }

    /// 对手离开，对局作废（无胜负结果）
    pub fn abandon(&mut self) {
        self.finished = true;
        self.turn_owner = None;
        self.draw_offered_by = None;
        self.restart_votes.clear();
    }

    /// 记录再来一局投票，返回是否双方都已同意
    ///
    /// 反对票清空所有票。
    pub fn vote_restart(&mut self, player: PlayerId, agree: bool) -> bool {
        if !agree {
            self.restart_votes.clear();
            return false;
        }
        self.restart_votes.insert(player);
        self.seats.iter().all(|(id, _)| self.restart_votes.contains(id))
    }

    /// 记录提和
    pub fn offer_draw(&mut self, player: PlayerId) {
        self.draw_offered_by = Some(player);
    }

    /// 取走对手发起的提和，没有则报错
    pub fn take_draw_offer(&mut self, responder: PlayerId) -> Result<PlayerId, RoomError> {
        match self.draw_offered_by {
            Some(offerer) if offerer != responder => {
                self.draw_offered_by = None;
                Ok(offerer)
            }
            _ => Err(RoomError::NoPendingDraw),
        }
    }
}
