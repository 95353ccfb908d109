use serde::{Deserialize, Serialize};
use std::fmt;

use super::grid::Grid;
use super::state::{GameEvent, GameStatus, IntegrityError};

/// 宿主层的编程错误。语义上无效但在范围内的输入不会走到这里，
/// 而是以 [`GameEvent::InputIgnored`] 的形式被吸收。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EngineError {
    InputOutOfRange { input: usize, limit: usize },
    NothingMounted,
    InvalidConfig { reason: String },
    IntegrityViolation { error: IntegrityError },
    UnknownDirection { value: String },
    UnknownDemo { value: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InputOutOfRange { input, limit } => {
                write!(f, "input {input} is out of range (limit {limit})")
            }
            EngineError::NothingMounted => write!(f, "no demo is mounted"),
            EngineError::InvalidConfig { reason } => write!(f, "invalid config: {reason}"),
            EngineError::IntegrityViolation { error } => {
                write!(f, "integrity violation: {error:?}")
            }
            EngineError::UnknownDirection { value } => write!(f, "unknown direction `{value}`"),
            EngineError::UnknownDemo { value } => write!(f, "unknown demo `{value}`"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<IntegrityError> for EngineError {
    fn from(error: IntegrityError) -> Self {
        EngineError::IntegrityViolation { error }
    }
}

/// 网格模拟引擎：一个网格、一套输入映射、一个状态转移函数和一个终局判定。
///
/// 每次被接受的输入之后都会重新判定终局；进入终局后所有输入都被忽略，
/// 直到调用 [`GridGame::reset`]。
pub trait GridGame {
    type Input;
    type Cell;

    fn apply_input(&mut self, input: Self::Input) -> Result<Vec<GameEvent>, EngineError>;

    fn status(&self) -> &GameStatus;

    /// 当前网格的完整快照，供宿主渲染。
    fn grid(&self) -> Grid<Self::Cell>;

    fn moves(&self) -> u32;

    fn reset(&mut self);

    fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }
}

/// 越界输入视为宿主错误。
pub(crate) fn ensure_in_range(input: usize, limit: usize) -> Result<(), EngineError> {
    if input >= limit {
        return Err(EngineError::InputOutOfRange { input, limit });
    }
    Ok(())
}
