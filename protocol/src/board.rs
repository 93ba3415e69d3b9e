//! 棋盘与落子判定
//!
//! 纯函数式的规则引擎：落子合法性、五子连线判胜、满盘判和。
//! 不做任何 I/O，只修改传入的棋盘。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, WIN_COUNT};
use crate::error::GameError;

/// 棋子符号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// 两种符号
    pub const ALL: [Symbol; 2] = [Symbol::X, Symbol::O];

    /// 获取对方符号
    pub fn opponent(&self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// 落子结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveOutcome {
    /// 对局继续
    #[serde(rename = "none")]
    Continue,
    /// 落子方获胜
    Win,
    /// 满盘和棋
    Draw,
}

impl MoveOutcome {
    /// 是否终局
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MoveOutcome::Continue)
    }
}

/// 四个判胜方向：横、竖、主对角线、副对角线
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    /// 索引为 y * size + x
    cells: Vec<Option<Symbol>>,
}

impl Board {
    /// 创建指定边长的空棋盘
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// 棋盘边长
    pub fn size(&self) -> usize {
        self.size
    }

    /// 坐标是否在棋盘内
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// 获取指定格子
    pub fn get(&self, x: usize, y: usize) -> Option<Symbol> {
        if self.in_bounds(x, y) {
            self.cells[y * self.size + x]
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, cell: Option<Symbol>) {
        if self.in_bounds(x, y) {
            self.cells[y * self.size + x] = cell;
        }
    }

    /// 已落子数
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// 是否满盘
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// 是否为空盘
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// 落子并判定结果
    ///
    /// 越界或目标格非空时返回错误，棋盘保持不变。
    pub fn apply_move(&mut self, x: usize, y: usize, symbol: Symbol) -> Result<MoveOutcome, GameError> {
        if !self.in_bounds(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        if self.get(x, y).is_some() {
            return Err(GameError::CellOccupied { x, y });
        }

        self.set(x, y, Some(symbol));

        if self.is_winning_move(x, y, symbol) {
            Ok(MoveOutcome::Win)
        } else if self.is_full() {
            Ok(MoveOutcome::Draw)
        } else {
            Ok(MoveOutcome::Continue)
        }
    }

    /// 以 (x, y) 为中心检查四个方向的连子数
    fn is_winning_move(&self, x: usize, y: usize, symbol: Symbol) -> bool {
        DIRECTIONS.iter().any(|&(dx, dy)| {
            let run = 1 + self.count_run(x, y, dx, dy, symbol) + self.count_run(x, y, -dx, -dy, symbol);
            run >= WIN_COUNT
        })
    }

    /// 沿一个方向数连续同色棋子（不含起点）
    fn count_run(&self, x: usize, y: usize, dx: isize, dy: isize, symbol: Symbol) -> usize {
        let mut count = 0;
        let (mut cx, mut cy) = (x as isize, y as isize);
        loop {
            cx += dx;
            cy += dy;
            if cx < 0 || cy < 0 {
                break;
            }
            if self.get(cx as usize, cy as usize) != Some(symbol) {
                break;
            }
            count += 1;
        }
        count
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 放置一条从 (x, y) 出发、方向为 (dx, dy) 的连线
    fn place_line(board: &mut Board, x: usize, y: usize, dx: isize, dy: isize, len: usize, symbol: Symbol) {
        for i in 0..len as isize {
            board.set((x as isize + dx * i) as usize, (y as isize + dy * i) as usize, Some(symbol));
        }
    }

    /// 无五连的满盘图案：横向两两成对，纵向交替
    fn no_win_pattern(x: usize, y: usize) -> Symbol {
        if (x / 2 + y) % 2 == 0 {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    #[test]
    fn test_empty_board() {
        let board = Board::default();
        assert_eq!(board.size(), BOARD_SIZE);
        assert!(board.is_empty());
        assert_eq!(board.occupied(), 0);
    }

    #[test]
    fn test_simple_move() {
        let mut board = Board::default();
        assert_eq!(board.apply_move(3, 4, Symbol::X), Ok(MoveOutcome::Continue));
        assert_eq!(board.get(3, 4), Some(Symbol::X));
        assert_eq!(board.occupied(), 1);
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut board = Board::default();
        board.apply_move(5, 5, Symbol::X).unwrap();
        let before = board.clone();

        assert_eq!(
            board.apply_move(5, 5, Symbol::O),
            Err(GameError::CellOccupied { x: 5, y: 5 })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut board = Board::default();
        let before = board.clone();

        assert!(matches!(
            board.apply_move(BOARD_SIZE, 0, Symbol::X),
            Err(GameError::OutOfBounds { .. })
        ));
        assert!(matches!(
            board.apply_move(0, BOARD_SIZE + 3, Symbol::X),
            Err(GameError::OutOfBounds { .. })
        ));
        assert_eq!(board, before);
    }

    #[test]
    fn test_win_in_every_direction() {
        // 每个方向：先摆 WIN_COUNT-1 子，再在线上最后一格落子
        let cases: [(usize, usize, isize, isize); 4] = [
            (0, 0, 1, 0),
            (2, 1, 0, 1),
            (1, 1, 1, 1),
            (1, 8, 1, -1),
        ];
        for (x, y, dx, dy) in cases {
            let mut board = Board::default();
            place_line(&mut board, x, y, dx, dy, WIN_COUNT - 1, Symbol::O);
            let lx = (x as isize + dx * (WIN_COUNT as isize - 1)) as usize;
            let ly = (y as isize + dy * (WIN_COUNT as isize - 1)) as usize;
            assert_eq!(
                board.apply_move(lx, ly, Symbol::O),
                Ok(MoveOutcome::Win),
                "direction ({}, {})",
                dx,
                dy
            );
        }
    }

    #[test]
    fn test_win_when_filling_middle_gap() {
        let mut board = Board::default();
        place_line(&mut board, 0, 3, 1, 0, 2, Symbol::X);
        place_line(&mut board, 3, 3, 1, 0, 2, Symbol::X);
        assert_eq!(board.apply_move(2, 3, Symbol::X), Ok(MoveOutcome::Win));
    }

    #[test]
    fn test_short_run_does_not_win() {
        let mut board = Board::default();
        place_line(&mut board, 0, 0, 1, 0, WIN_COUNT - 2, Symbol::X);
        let outcome = board.apply_move(WIN_COUNT - 2, 0, Symbol::X).unwrap();
        assert_eq!(outcome, MoveOutcome::Continue);
    }

    #[test]
    fn test_overline_still_wins() {
        // WIN_COUNT + 1 连子同样判胜
        let mut board = Board::default();
        place_line(&mut board, 0, 0, 1, 1, 3, Symbol::X);
        place_line(&mut board, 4, 4, 1, 1, 2, Symbol::X);
        assert_eq!(board.apply_move(3, 3, Symbol::X), Ok(MoveOutcome::Win));
    }

    #[test]
    fn test_opponent_symbol_breaks_run() {
        let mut board = Board::default();
        place_line(&mut board, 0, 0, 0, 1, 2, Symbol::X);
        board.set(0, 2, Some(Symbol::O));
        place_line(&mut board, 0, 3, 0, 1, 2, Symbol::X);
        assert_eq!(board.apply_move(0, 5, Symbol::X), Ok(MoveOutcome::Continue));
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        let mut board = Board::default();
        let last = (BOARD_SIZE - 1, BOARD_SIZE - 1);
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                if (x, y) != last {
                    board.set(x, y, Some(no_win_pattern(x, y)));
                }
            }
        }
        assert!(!board.is_full());

        let symbol = no_win_pattern(last.0, last.1);
        assert_eq!(board.apply_move(last.0, last.1, symbol), Ok(MoveOutcome::Draw));
        assert!(board.is_full());
    }

    #[test]
    fn test_win_on_last_cell_is_win_not_draw() {
        let mut board = Board::new(WIN_COUNT);
        for y in 0..WIN_COUNT {
            for x in 0..WIN_COUNT {
                board.set(x, y, Some(no_win_pattern(x, y)));
            }
        }
        // 第一列改为全 X，只留最后一格
        for y in 0..WIN_COUNT - 1 {
            board.set(0, y, Some(Symbol::X));
        }
        board.set(0, WIN_COUNT - 1, None);
        assert_eq!(board.apply_move(0, WIN_COUNT - 1, Symbol::X), Ok(MoveOutcome::Win));
    }

    #[test]
    fn test_symbol_opponent() {
        assert_eq!(Symbol::X.opponent(), Symbol::O);
        assert_eq!(Symbol::O.opponent(), Symbol::X);
    }
}
