use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::grid::{Direction, Position};
use super::rules::EngineError;
use super::snake::check_layout;

pub const TIC_TAC_TOE_SIZE: usize = 3;

const DEFAULT_CONNECT_FOUR_ROWS: usize = 6;
const DEFAULT_CONNECT_FOUR_COLS: usize = 7;
const DEFAULT_CONNECT_FOUR_RUN: usize = 4;

const DEFAULT_SNAKE_GRID: usize = 20;
const DEFAULT_TICK_INTERVAL_MS: u32 = 150;

const DEFAULT_WALKER_GRID: usize = 10;

/// 外壳可以挂载的演示。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DemoKind {
    TicTacToe,
    ConnectFour,
    Snake,
    Walker,
}

impl DemoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DemoKind::TicTacToe => "tic-tac-toe",
            DemoKind::ConnectFour => "connect-four",
            DemoKind::Snake => "snake",
            DemoKind::Walker => "walker",
        }
    }
}

impl FromStr for DemoKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "tictactoe" => Ok(DemoKind::TicTacToe),
            "connectfour" | "connect4" => Ok(DemoKind::ConnectFour),
            "snake" => Ok(DemoKind::Snake),
            "walker" | "roguelike" => Ok(DemoKind::Walker),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectFourConfig {
    pub rows: usize,
    pub cols: usize,
    pub run: usize,
}

impl Default for ConnectFourConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_CONNECT_FOUR_ROWS,
            cols: DEFAULT_CONNECT_FOUR_COLS,
            run: DEFAULT_CONNECT_FOUR_RUN,
        }
    }
}

impl ConnectFourConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "board must have at least one row and one column".into(),
            });
        }
        if self.run < 2 || self.run > self.rows.max(self.cols) {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "run length {} does not fit a {}x{} board",
                    self.run, self.rows, self.cols
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SnakeConfig {
    pub rows: usize,
    pub cols: usize,
    pub tick_interval_ms: u32,
    /// 蛇身，蛇头在前。
    pub initial_body: Vec<Position>,
    pub initial_heading: Direction,
    pub initial_food: Position,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_SNAKE_GRID,
            cols: DEFAULT_SNAKE_GRID,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            initial_body: vec![
                Position::new(10, 10),
                Position::new(10, 9),
                Position::new(10, 8),
            ],
            initial_heading: Direction::Right,
            initial_food: Position::new(15, 15),
        }
    }
}

impl SnakeConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "arena must have at least one row and one column".into(),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(EngineError::InvalidConfig {
                reason: "tick interval must be positive".into(),
            });
        }
        check_layout(self.rows, self.cols, &self.initial_body, self.initial_food)
            .map_err(|error| EngineError::IntegrityViolation { error })?;

        // 初始方向不能直接指向第二节蛇身。
        if let [head, neck, ..] = self.initial_body.as_slice() {
            if head.step_within(self.initial_heading, self.rows, self.cols) == Some(*neck) {
                return Err(EngineError::InvalidConfig {
                    reason: format!(
                        "initial heading {:?} runs into the second segment",
                        self.initial_heading
                    ),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalkerConfig {
    pub rows: usize,
    pub cols: usize,
    pub start: Position,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_WALKER_GRID,
            cols: DEFAULT_WALKER_GRID,
            start: Position::new(0, 0),
        }
    }
}

impl WalkerConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start.row >= self.rows || self.start.col >= self.cols {
            return Err(EngineError::InvalidConfig {
                reason: format!(
                    "start ({}, {}) lies outside a {}x{} grid",
                    self.start.row, self.start.col, self.rows, self.cols
                ),
            });
        }
        Ok(())
    }
}
