use serde::{Deserialize, Serialize};

use super::config::TIC_TAC_TOE_SIZE;
use super::grid::Grid;
use super::lines::evaluate_placement;
use super::rules::{ensure_in_range, EngineError, GridGame};
use super::state::{GameEvent, GameStatus, IgnoreReason, IntegrityError, Mark, Player};

pub type Board = Grid<Option<Mark>>;

const CELLS: usize = TIC_TAC_TOE_SIZE * TIC_TAC_TOE_SIZE;

/// 井字棋会话，附带可回退的历史记录。
///
/// `history[0]` 始终是空棋盘，`history[k]` 是第 k 步之后的棋盘。
/// 回退只移动 `step`，不会截断历史；回退后再落子才丢弃 `step` 之后的记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicTacToe {
    board: Board,
    history: Vec<Board>,
    step: usize,
    status: GameStatus,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        let empty = Board::new(TIC_TAC_TOE_SIZE, TIC_TAC_TOE_SIZE);
        Self {
            board: empty.clone(),
            history: vec![empty],
            step: 0,
            status: GameStatus::Ongoing,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[Board] {
        &self.history
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn next_player(&self) -> Player {
        Player::after_moves(self.step)
    }

    pub fn next_mark(&self) -> Mark {
        self.next_player().into()
    }

    /// 跳到第 `step` 步的快照，下一位玩家由步数奇偶决定。
    pub fn jump_to(&mut self, step: usize) -> Result<Vec<GameEvent>, EngineError> {
        ensure_in_range(step, self.history.len())?;

        self.step = step;
        self.board = self.history[step].clone();
        self.status = evaluate_placement(&self.board, TIC_TAC_TOE_SIZE);

        Ok(vec![GameEvent::HistoryJumped {
            step,
            next_player: self.next_player(),
        }])
    }

    /// 检查反序列化得到的会话，并按棋盘重新计算终局状态。
    pub fn validated(mut self) -> Result<Self, IntegrityError> {
        self.integrity_check()?;
        self.status = evaluate_placement(&self.board, TIC_TAC_TOE_SIZE);
        Ok(self)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        for board in self.history.iter().chain(std::iter::once(&self.board)) {
            if board.rows() != TIC_TAC_TOE_SIZE || board.cols() != TIC_TAC_TOE_SIZE {
                return Err(IntegrityError::GridShape {
                    expected_rows: TIC_TAC_TOE_SIZE,
                    expected_cols: TIC_TAC_TOE_SIZE,
                    rows: board.rows(),
                    cols: board.cols(),
                });
            }
        }

        if self.history.is_empty() {
            return Err(IntegrityError::EmptyHistory);
        }
        if self.step >= self.history.len() {
            return Err(IntegrityError::StepOutOfRange {
                step: self.step,
                len: self.history.len(),
            });
        }
        if self.history[self.step] != self.board {
            return Err(IntegrityError::HistoryMismatch { step: self.step });
        }

        if self.history[0].occupied() != 0 {
            return Err(IntegrityError::UnreachableBoard { step: 0 });
        }
        for (index, pair) in self.history.windows(2).enumerate() {
            if !follows(&pair[0], &pair[1], index) {
                return Err(IntegrityError::UnreachableBoard { step: index + 1 });
            }
        }

        Ok(())
    }
}

/// `next` 是否正好是在 `previous`（第 `moves` 步之后的棋盘）上落下一子得到的。
///
/// 已经分出胜负的棋盘之后不能再有快照。
fn follows(previous: &Board, next: &Board, moves: usize) -> bool {
    if evaluate_placement(previous, TIC_TAC_TOE_SIZE).is_terminal() {
        return false;
    }
    let expected = Some(Mark::from(Player::after_moves(moves)));
    let mut changed = previous
        .cells()
        .iter()
        .zip(next.cells())
        .filter(|(before, after)| before != after);
    matches!(
        (changed.next(), changed.next()),
        (Some((None, after)), None) if *after == expected
    )
}

impl GridGame for TicTacToe {
    /// 行优先的格子下标 0..9。
    type Input = usize;
    type Cell = Option<Mark>;

    fn apply_input(&mut self, index: usize) -> Result<Vec<GameEvent>, EngineError> {
        ensure_in_range(index, CELLS)?;

        if self.status.is_terminal() {
            return Ok(GameEvent::ignored(IgnoreReason::GameOver));
        }

        let Some(pos) = self.board.position_of(index) else {
            return Err(EngineError::InputOutOfRange {
                input: index,
                limit: CELLS,
            });
        };
        if self.board.get(pos).flatten().is_some() {
            return Ok(GameEvent::ignored(IgnoreReason::CellOccupied));
        }

        let player = self.next_player();
        let mark = Mark::from(player);
        let next = self.board.with(pos, Some(mark));

        self.history.truncate(self.step + 1);
        self.history.push(next.clone());
        self.step += 1;
        self.board = next;
        self.status = evaluate_placement(&self.board, TIC_TAC_TOE_SIZE);

        let mut events = vec![GameEvent::MarkPlaced {
            player,
            mark,
            index,
        }];
        events.extend(self.status.terminal_event());
        Ok(events)
    }

    fn status(&self) -> &GameStatus {
        &self.status
    }

    fn grid(&self) -> Board {
        self.board.clone()
    }

    fn moves(&self) -> u32 {
        self.step as u32
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
