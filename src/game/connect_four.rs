use serde::{Deserialize, Serialize};

use super::config::ConnectFourConfig;
use super::grid::{Grid, Position};
use super::lines::evaluate_placement;
use super::rules::{ensure_in_range, EngineError, GridGame};
use super::state::{Disc, GameEvent, GameStatus, IgnoreReason, IntegrityError, Player};

pub type Board = Grid<Option<Disc>>;

/// 四子棋会话。圆片落在所选列最低的空位，红方先手。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectFour {
    config: ConnectFourConfig,
    board: Board,
    current: Player,
    moves: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_drop: Option<Position>,
    status: GameStatus,
}

impl Default for ConnectFour {
    fn default() -> Self {
        Self::new(ConnectFourConfig::default())
    }
}

impl ConnectFour {
    /// 配置需事先通过 [`ConnectFourConfig::validate`]。
    fn new(config: ConnectFourConfig) -> Self {
        let board = Board::new(config.rows, config.cols);
        Self {
            config,
            board,
            current: Player::First,
            moves: 0,
            last_drop: None,
            status: GameStatus::Ongoing,
        }
    }

    pub fn with_config(config: ConnectFourConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &ConnectFourConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn current_disc(&self) -> Disc {
        self.current.into()
    }

    pub fn last_drop(&self) -> Option<Position> {
        self.last_drop
    }

    pub fn column_has_room(&self, column: usize) -> bool {
        self.board.lowest_empty_row(column).is_some()
    }

    pub fn validated(mut self) -> Result<Self, IntegrityError> {
        self.integrity_check()?;
        self.status = evaluate_placement(&self.board, self.config.run);
        Ok(self)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.board.rows() != self.config.rows || self.board.cols() != self.config.cols {
            return Err(IntegrityError::GridShape {
                expected_rows: self.config.rows,
                expected_cols: self.config.cols,
                rows: self.board.rows(),
                cols: self.board.cols(),
            });
        }

        // 悬空的圆片说明棋盘不是逐步落子得到的。
        for pos in self.board.positions() {
            let below = Position::new(pos.row + 1, pos.col);
            if self.board.get(pos).flatten().is_some()
                && self.board.contains(below)
                && self.board.get(below).flatten().is_none()
            {
                return Err(IntegrityError::UnreachableBoard {
                    step: self.moves as usize,
                });
            }
        }

        let moves = self.moves as usize;
        if self.board.occupied() != moves {
            return Err(IntegrityError::UnreachableBoard { step: moves });
        }

        // 终局后不再换手，轮到的仍是最后落子的一方。
        let last_mover = moves.checked_sub(1).map(Player::after_moves);
        let expected = match last_mover {
            Some(player) if evaluate_placement(&self.board, self.config.run).is_terminal() => {
                player
            }
            _ => Player::after_moves(moves),
        };
        if self.current != expected {
            return Err(IntegrityError::TurnMismatch {
                expected,
                found: self.current,
            });
        }

        if !self.last_drop_matches(last_mover) {
            return Err(IntegrityError::LastDropMismatch {
                position: self.last_drop,
            });
        }

        Ok(())
    }

    /// 最近一次落子必须是所在列最上面的圆片，且颜色属于最后落子的一方。
    fn last_drop_matches(&self, last_mover: Option<Player>) -> bool {
        match (self.last_drop, last_mover) {
            (None, None) => true,
            (Some(pos), Some(player)) => {
                let on_top = pos.row == 0
                    || self.board.get(Position::new(pos.row - 1, pos.col)) == Some(None);
                on_top && self.board.get(pos) == Some(Some(Disc::from(player)))
            }
            _ => false,
        }
    }
}

impl GridGame for ConnectFour {
    /// 列下标 0..cols。
    type Input = usize;
    type Cell = Option<Disc>;

    fn apply_input(&mut self, column: usize) -> Result<Vec<GameEvent>, EngineError> {
        ensure_in_range(column, self.config.cols)?;

        if self.status.is_terminal() {
            return Ok(GameEvent::ignored(IgnoreReason::GameOver));
        }

        let Some(row) = self.board.lowest_empty_row(column) else {
            return Ok(GameEvent::ignored(IgnoreReason::ColumnFull));
        };

        let player = self.current;
        let disc = Disc::from(player);
        let position = Position::new(row, column);

        self.board = self.board.with(position, Some(disc));
        self.moves += 1;
        self.last_drop = Some(position);
        self.status = evaluate_placement(&self.board, self.config.run);

        if !self.status.is_terminal() {
            self.current = player.other();
        }

        let mut events = vec![GameEvent::DiscDropped {
            player,
            disc,
            position,
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
        self.moves
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
