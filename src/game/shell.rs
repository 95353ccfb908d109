//! 单页外壳：同一时刻只挂载一个演示会话，按需切换。

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::config::DemoKind;
use super::connect_four::ConnectFour;
use super::grid::Direction;
use super::rules::{EngineError, GridGame};
use super::snake::Snake;
use super::state::{GameEvent, GameStatus, IgnoreReason};
use super::tictactoe::TicTacToe;
use super::walker::Walker;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActiveGame {
    TicTacToe(TicTacToe),
    ConnectFour(ConnectFour),
    Snake(Snake),
    Walker(Walker),
}

impl ActiveGame {
    pub fn fresh(kind: DemoKind) -> Self {
        match kind {
            DemoKind::TicTacToe => ActiveGame::TicTacToe(TicTacToe::new()),
            DemoKind::ConnectFour => ActiveGame::ConnectFour(ConnectFour::default()),
            DemoKind::Snake => ActiveGame::Snake(Snake::default()),
            DemoKind::Walker => ActiveGame::Walker(Walker::default()),
        }
    }

    pub fn kind(&self) -> DemoKind {
        match self {
            ActiveGame::TicTacToe(_) => DemoKind::TicTacToe,
            ActiveGame::ConnectFour(_) => DemoKind::ConnectFour,
            ActiveGame::Snake(_) => DemoKind::Snake,
            ActiveGame::Walker(_) => DemoKind::Walker,
        }
    }

    pub fn status(&self) -> &GameStatus {
        match self {
            ActiveGame::TicTacToe(game) => game.status(),
            ActiveGame::ConnectFour(game) => game.status(),
            ActiveGame::Snake(game) => game.status(),
            ActiveGame::Walker(game) => game.status(),
        }
    }

    pub fn moves(&self) -> u32 {
        match self {
            ActiveGame::TicTacToe(game) => game.moves(),
            ActiveGame::ConnectFour(game) => game.moves(),
            ActiveGame::Snake(game) => game.moves(),
            ActiveGame::Walker(game) => game.moves(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            ActiveGame::TicTacToe(game) => game.reset(),
            ActiveGame::ConnectFour(game) => game.reset(),
            ActiveGame::Snake(game) => game.reset(),
            ActiveGame::Walker(game) => game.reset(),
        }
    }
}

/// 宿主交给外壳的输入，词汇表是封闭的。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellInput {
    Place { index: usize },
    Drop { column: usize },
    JumpTo { step: usize },
    Steer { direction: Direction },
    Tick,
    TogglePause,
    Walk { direction: Direction },
    Reset,
}

pub struct Shell {
    active: Option<ActiveGame>,
    rng: SmallRng,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            active: None,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            active: None,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn active(&self) -> Option<&ActiveGame> {
        self.active.as_ref()
    }

    pub fn active_kind(&self) -> Option<DemoKind> {
        self.active.as_ref().map(ActiveGame::kind)
    }

    /// 丢弃当前会话并挂载一个全新的会话。
    pub fn mount(&mut self, kind: DemoKind) -> Vec<GameEvent> {
        self.mount_game(ActiveGame::fresh(kind))
    }

    pub fn mount_game(&mut self, game: ActiveGame) -> Vec<GameEvent> {
        let mut events = self.unmount();
        events.push(GameEvent::DemoMounted { kind: game.kind() });
        self.active = Some(game);
        events
    }

    pub fn unmount(&mut self) -> Vec<GameEvent> {
        self.active
            .take()
            .map(|game| GameEvent::DemoUnmounted { kind: game.kind() })
            .into_iter()
            .collect()
    }

    pub fn status(&self) -> GameStatus {
        self.active
            .as_ref()
            .map(|game| game.status().clone())
            .unwrap_or_default()
    }

    pub fn dispatch(&mut self, input: ShellInput) -> Result<Vec<GameEvent>, EngineError> {
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NothingMounted);
        };

        match (active, input) {
            (ActiveGame::TicTacToe(game), ShellInput::Place { index }) => game.apply_input(index),
            (ActiveGame::TicTacToe(game), ShellInput::JumpTo { step }) => game.jump_to(step),
            (ActiveGame::ConnectFour(game), ShellInput::Drop { column }) => {
                game.apply_input(column)
            }
            (ActiveGame::Snake(game), ShellInput::Steer { direction }) => {
                game.apply_input(direction)
            }
            (ActiveGame::Snake(game), ShellInput::Tick) => Ok(game.tick(&mut self.rng)),
            (ActiveGame::Snake(game), ShellInput::TogglePause) => Ok(game.toggle_pause()),
            (ActiveGame::Walker(game), ShellInput::Walk { direction }) => {
                game.apply_input(direction)
            }
            (game, ShellInput::Reset) => {
                game.reset();
                Ok(vec![GameEvent::SessionReset])
            }
            _ => Ok(GameEvent::ignored(IgnoreReason::WrongGame)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_without_mount_is_an_error() {
        let mut shell = Shell::with_seed(1);
        assert_eq!(
            shell.dispatch(ShellInput::Tick),
            Err(EngineError::NothingMounted)
        );
    }

    #[test]
    fn mounting_swaps_the_active_demo() {
        let mut shell = Shell::with_seed(1);
        assert_eq!(
            shell.mount(DemoKind::TicTacToe),
            vec![GameEvent::DemoMounted {
                kind: DemoKind::TicTacToe
            }]
        );
        shell
            .dispatch(ShellInput::Place { index: 4 })
            .expect("index is in range");

        let events = shell.mount(DemoKind::Snake);

        assert_eq!(
            events,
            vec![
                GameEvent::DemoUnmounted {
                    kind: DemoKind::TicTacToe
                },
                GameEvent::DemoMounted {
                    kind: DemoKind::Snake
                },
            ]
        );
        assert_eq!(shell.active_kind(), Some(DemoKind::Snake));
        assert_eq!(shell.active().map(ActiveGame::moves), Some(0));
    }

    #[test]
    fn input_for_another_game_is_ignored() {
        let mut shell = Shell::with_seed(1);
        shell.mount(DemoKind::ConnectFour);
        let events = shell
            .dispatch(ShellInput::Steer {
                direction: Direction::Up,
            })
            .expect("mismatched input is not an error");
        assert_eq!(
            events,
            vec![GameEvent::InputIgnored {
                reason: IgnoreReason::WrongGame
            }]
        );
        assert_eq!(shell.active(), Some(&ActiveGame::fresh(DemoKind::ConnectFour)));
    }

    #[test]
    fn ticks_and_resets_the_snake() {
        let mut shell = Shell::with_seed(9);
        shell.mount(DemoKind::Snake);
        shell.dispatch(ShellInput::Tick).expect("snake is mounted");
        shell.dispatch(ShellInput::Tick).expect("snake is mounted");
        assert_eq!(shell.active().map(ActiveGame::moves), Some(2));

        let events = shell.dispatch(ShellInput::Reset).expect("snake is mounted");

        assert_eq!(events, vec![GameEvent::SessionReset]);
        assert_eq!(shell.active(), Some(&ActiveGame::fresh(DemoKind::Snake)));
    }

    #[test]
    fn unmount_leaves_nothing_active() {
        let mut shell = Shell::with_seed(1);
        shell.mount(DemoKind::Walker);
        assert_eq!(
            shell.unmount(),
            vec![GameEvent::DemoUnmounted {
                kind: DemoKind::Walker
            }]
        );
        assert!(shell.unmount().is_empty());
        assert_eq!(shell.status(), GameStatus::Ongoing);
    }

    #[test]
    fn active_game_round_trips_through_json() {
        let mut shell = Shell::with_seed(3);
        shell.mount(DemoKind::TicTacToe);
        shell
            .dispatch(ShellInput::Place { index: 0 })
            .expect("index is in range");
        let active = shell.active().expect("tic-tac-toe is mounted");
        let json = serde_json::to_string(active).expect("serializes");
        assert!(json.contains(r#""kind":"tic-tac-toe""#));
        let back: ActiveGame = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(&back, active);
    }
}
