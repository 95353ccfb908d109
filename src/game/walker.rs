use serde::{Deserialize, Serialize};

use super::config::WalkerConfig;
use super::grid::{Direction, Grid, Position};
use super::rules::{EngineError, GridGame};
use super::state::{GameEvent, GameStatus, IgnoreReason};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalkerCell {
    #[default]
    Empty,
    Walker,
}

/// 在网格里走动的小玩具：撞墙即停，没有终局。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Walker {
    config: WalkerConfig,
    position: Position,
    steps: u32,
    #[serde(skip)]
    status: GameStatus,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(WalkerConfig::default())
    }
}

impl Walker {
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            position: config.start,
            steps: 0,
            status: GameStatus::Ongoing,
            config,
        }
    }

    pub fn with_config(config: WalkerConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl GridGame for Walker {
    type Input = Direction;
    type Cell = WalkerCell;

    fn apply_input(&mut self, direction: Direction) -> Result<Vec<GameEvent>, EngineError> {
        let Some(next) = self
            .position
            .step_within(direction, self.config.rows, self.config.cols)
        else {
            return Ok(GameEvent::ignored(IgnoreReason::Blocked));
        };

        self.position = next;
        self.steps += 1;
        Ok(vec![GameEvent::Walked { to: next }])
    }

    fn status(&self) -> &GameStatus {
        &self.status
    }

    fn grid(&self) -> Grid<WalkerCell> {
        Grid::new(self.config.rows, self.config.cols).with(self.position, WalkerCell::Walker)
    }

    fn moves(&self) -> u32 {
        self.steps
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}
