//! 网格模拟引擎（网格、终局判定、各个游戏会话与外壳）。

pub mod config;
pub mod connect_four;
pub mod grid;
pub mod lines;
pub mod rules;
pub mod shell;
pub mod snake;
pub mod state;
pub mod tictactoe;
pub mod walker;

pub use config::{ConnectFourConfig, DemoKind, SnakeConfig, WalkerConfig};
pub use connect_four::ConnectFour;
pub use grid::{Direction, Grid, Position};
pub use lines::{evaluate_placement, winning_lines};
pub use rules::{EngineError, GridGame};
pub use shell::{ActiveGame, Shell, ShellInput};
pub use snake::{Snake, SnakeCell};
pub use state::{
    Disc,
    GameEvent,
    GameStatus,
    IgnoreReason,
    IntegrityError,
    LossCause,
    Mark,
    Player,
    Resolution,
};
pub use tictactoe::TicTacToe;
pub use walker::{Walker, WalkerCell};
