use serde::{Deserialize, Serialize};

use super::config::DemoKind;
use super::grid::{Direction, Position};

/// 对局中的座次，先手为 `First`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// 第 `moves` 步之后轮到的玩家（偶数步为先手）。
    pub fn after_moves(moves: usize) -> Self {
        if moves % 2 == 0 {
            Player::First
        } else {
            Player::Second
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Player::First
    }
}

/// 井字棋的棋子。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl From<Player> for Mark {
    fn from(player: Player) -> Self {
        match player {
            Player::First => Mark::X,
            Player::Second => Mark::O,
        }
    }
}

impl From<Mark> for Player {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Player::First,
            Mark::O => Player::Second,
        }
    }
}

/// 四子棋的圆片颜色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Disc {
    Red,
    Yellow,
}

impl From<Player> for Disc {
    fn from(player: Player) -> Self {
        match player {
            Player::First => Disc::Red,
            Player::Second => Disc::Yellow,
        }
    }
}

impl From<Disc> for Player {
    fn from(disc: Disc) -> Self {
        match disc {
            Disc::Red => Player::First,
            Disc::Yellow => Player::Second,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    Wall,
    SelfCollision,
}

/// 终局状态；任意时刻只有一个成立。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameStatus {
    Ongoing,
    Won {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<Player>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        line: Vec<Position>,
    },
    Drawn,
    Lost {
        cause: LossCause,
    },
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::Ongoing
    }
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            GameStatus::Won { winner, .. } => *winner,
            _ => None,
        }
    }

    /// 进入终局时对应的事件。
    pub fn terminal_event(&self) -> Option<GameEvent> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Won { winner, line } => Some(GameEvent::GameWon {
                winner: *winner,
                line: line.clone(),
            }),
            GameStatus::Drawn => Some(GameEvent::GameDrawn),
            GameStatus::Lost { cause } => Some(GameEvent::GameLost { cause: *cause }),
        }
    }
}

/// 输入被忽略的原因。被忽略的输入不会修改会话。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    GameOver,
    CellOccupied,
    ColumnFull,
    Reversal,
    Paused,
    Blocked,
    WrongGame,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MarkPlaced {
        player: Player,
        mark: Mark,
        index: usize,
    },
    DiscDropped {
        player: Player,
        disc: Disc,
        position: Position,
    },
    HistoryJumped {
        step: usize,
        next_player: Player,
    },
    Steered {
        direction: Direction,
    },
    SnakeMoved {
        head: Position,
    },
    FoodEaten {
        at: Position,
        score: u32,
    },
    FoodSpawned {
        at: Position,
    },
    Walked {
        to: Position,
    },
    Paused,
    Resumed,
    SessionReset,
    DemoMounted {
        kind: DemoKind,
    },
    DemoUnmounted {
        kind: DemoKind,
    },
    GameWon {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<Player>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        line: Vec<Position>,
    },
    GameDrawn,
    GameLost {
        cause: LossCause,
    },
    InputIgnored {
        reason: IgnoreReason,
    },
}

impl GameEvent {
    pub fn ignored(reason: IgnoreReason) -> Vec<GameEvent> {
        vec![GameEvent::InputIgnored { reason }]
    }

    pub fn is_ignored(events: &[GameEvent]) -> bool {
        matches!(events, [GameEvent::InputIgnored { .. }])
    }
}

/// 从 JSON 恢复或手工拼装的会话未通过一致性检查。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    GridShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    EmptyHistory,
    StepOutOfRange {
        step: usize,
        len: usize,
    },
    HistoryMismatch {
        step: usize,
    },
    UnreachableBoard {
        step: usize,
    },
    TurnMismatch {
        expected: Player,
        found: Player,
    },
    LastDropMismatch {
        position: Option<Position>,
    },
    ReversedPending {
        heading: Direction,
        pending: Direction,
    },
    BodyTooShort {
        len: usize,
    },
    OutOfBounds {
        position: Position,
    },
    OverlappingBody {
        position: Position,
    },
    DetachedBody {
        index: usize,
    },
    FoodOnBody {
        position: Position,
    },
}

/// 一次操作的结果：更新后的状态、产生的事件和当前终局状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution<S> {
    pub state: S,
    pub events: Vec<GameEvent>,
    pub status: GameStatus,
}

impl<S> Resolution<S> {
    pub fn new(state: S, events: Vec<GameEvent>, status: GameStatus) -> Self {
        Self {
            state,
            events,
            status,
        }
    }
}
