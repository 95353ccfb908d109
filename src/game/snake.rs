use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::config::SnakeConfig;
use super::grid::{Direction, Grid, Position};
use super::rules::{EngineError, GridGame};
use super::state::{GameEvent, GameStatus, IgnoreReason, IntegrityError, LossCause};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnakeCell {
    #[default]
    Empty,
    Head,
    Body,
    Food,
}

/// 贪吃蛇会话。
///
/// 转向只记录待生效的方向，真正的移动发生在 [`Snake::tick`]。
/// 反向判断以蛇上一次实际移动的方向为准，因此在两次 tick 之间
/// 连按两次方向键也无法让蛇掉头撞上自己的第二节。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snake {
    config: SnakeConfig,
    body: VecDeque<Position>,
    heading: Direction,
    pending: Direction,
    #[serde(default)]
    food: Option<Position>,
    score: u32,
    ticks: u32,
    #[serde(default)]
    paused: bool,
    status: GameStatus,
}

impl Default for Snake {
    fn default() -> Self {
        Self::new(SnakeConfig::default())
    }
}

impl Snake {
    /// 配置需事先通过 [`SnakeConfig::validate`]。
    fn new(config: SnakeConfig) -> Self {
        Self {
            body: config.initial_body.iter().copied().collect(),
            heading: config.initial_heading,
            pending: config.initial_heading,
            food: Some(config.initial_food),
            score: 0,
            ticks: 0,
            paused: false,
            status: GameStatus::Ongoing,
            config,
        }
    }

    pub fn with_config(config: SnakeConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// 直接拼装一个进行中的会话，常用于恢复现场。
    pub fn from_parts(
        config: SnakeConfig,
        body: Vec<Position>,
        heading: Direction,
        food: Position,
        score: u32,
    ) -> Result<Self, EngineError> {
        check_layout(config.rows, config.cols, &body, food)?;
        Ok(Self {
            body: body.into(),
            heading,
            pending: heading,
            food: Some(food),
            score,
            ticks: 0,
            paused: false,
            status: GameStatus::Ongoing,
            config,
        })
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn cell_count(&self) -> usize {
        self.config.rows * self.config.cols
    }

    fn arena(&self) -> Grid<SnakeCell> {
        Grid::new(self.config.rows, self.config.cols)
    }

    /// 推进一格。暂停或终局时什么也不做。
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<GameEvent> {
        if self.status.is_terminal() {
            return GameEvent::ignored(IgnoreReason::GameOver);
        }
        if self.paused {
            return GameEvent::ignored(IgnoreReason::Paused);
        }

        let direction = self.pending;
        let Some(next) = self
            .head()
            .step_within(direction, self.config.rows, self.config.cols)
        else {
            return self.lose(LossCause::Wall);
        };

        let ate = self.food == Some(next);
        if collides(&self.body, next, ate) {
            return self.lose(LossCause::SelfCollision);
        }

        self.body.push_front(next);
        if !ate {
            self.body.pop_back();
        }
        self.heading = direction;
        self.ticks += 1;

        let mut events = vec![GameEvent::SnakeMoved { head: next }];
        if !ate {
            return events;
        }

        self.score += 1;
        events.push(GameEvent::FoodEaten {
            at: next,
            score: self.score,
        });

        if self.body.len() >= self.cell_count() {
            // 蛇身铺满整个场地，没有地方再放食物。
            self.food = None;
            self.status = GameStatus::Won {
                winner: None,
                line: Vec::new(),
            };
            events.extend(self.status.terminal_event());
            return events;
        }

        let food = self.place_food(rng);
        self.food = Some(food);
        events.push(GameEvent::FoodSpawned { at: food });
        events
    }

    /// 在蛇身以外均匀随机地挑一个格子（拒绝采样）。
    ///
    /// 调用方保证蛇身没有占满场地。
    fn place_food<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        loop {
            let candidate = Position::new(
                rng.gen_range(0..self.config.rows),
                rng.gen_range(0..self.config.cols),
            );
            if !self.body.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn lose(&mut self, cause: LossCause) -> Vec<GameEvent> {
        self.status = GameStatus::Lost { cause };
        self.status.terminal_event().into_iter().collect()
    }

    pub fn pause(&mut self) -> Vec<GameEvent> {
        if self.status.is_terminal() {
            return GameEvent::ignored(IgnoreReason::GameOver);
        }
        if self.paused {
            return Vec::new();
        }
        self.paused = true;
        vec![GameEvent::Paused]
    }

    pub fn resume(&mut self) -> Vec<GameEvent> {
        if self.status.is_terminal() {
            return GameEvent::ignored(IgnoreReason::GameOver);
        }
        if !self.paused {
            return Vec::new();
        }
        self.paused = false;
        vec![GameEvent::Resumed]
    }

    pub fn toggle_pause(&mut self) -> Vec<GameEvent> {
        if self.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// 检查恢复得到的会话；蛇身铺满场地时状态一律改为获胜。
    pub fn validated(mut self) -> Result<Self, IntegrityError> {
        self.integrity_check()?;
        if self.body.len() >= self.cell_count() {
            self.food = None;
            self.status = GameStatus::Won {
                winner: None,
                line: Vec::new(),
            };
        } else if matches!(self.status, GameStatus::Won { .. }) {
            return Err(IntegrityError::BodyTooShort {
                len: self.body.len(),
            });
        }
        Ok(self)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        check_body(self.config.rows, self.config.cols, self.body.iter())?;
        if self.pending == self.heading.opposite() {
            return Err(IntegrityError::ReversedPending {
                heading: self.heading,
                pending: self.pending,
            });
        }
        match self.food {
            Some(food) => check_food(self.config.rows, self.config.cols, &self.body, food),
            None if self.body.len() >= self.cell_count() => Ok(()),
            None => Err(IntegrityError::BodyTooShort {
                len: self.body.len(),
            }),
        }
    }
}

impl GridGame for Snake {
    type Input = Direction;
    type Cell = SnakeCell;

    /// 转向；正好反向的输入被忽略。
    fn apply_input(&mut self, direction: Direction) -> Result<Vec<GameEvent>, EngineError> {
        if self.status.is_terminal() {
            return Ok(GameEvent::ignored(IgnoreReason::GameOver));
        }
        if self.paused {
            return Ok(GameEvent::ignored(IgnoreReason::Paused));
        }
        if direction == self.heading.opposite() {
            return Ok(GameEvent::ignored(IgnoreReason::Reversal));
        }

        self.pending = direction;
        Ok(vec![GameEvent::Steered { direction }])
    }

    fn status(&self) -> &GameStatus {
        &self.status
    }

    fn grid(&self) -> Grid<SnakeCell> {
        let mut grid = self.arena();
        if let Some(food) = self.food {
            grid.set(food, SnakeCell::Food);
        }
        for (idx, segment) in self.body.iter().enumerate() {
            let cell = if idx == 0 {
                SnakeCell::Head
            } else {
                SnakeCell::Body
            };
            grid.set(*segment, cell);
        }
        grid
    }

    fn moves(&self) -> u32 {
        self.ticks
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

/// 新蛇头是否撞上自己。
///
/// 不吃食物时尾巴这一拍会让出来，所以尾巴不算障碍。
pub fn collides(body: &VecDeque<Position>, next: Position, ate: bool) -> bool {
    let blocking = if ate {
        body.len()
    } else {
        body.len().saturating_sub(1)
    };
    body.iter().take(blocking).any(|segment| *segment == next)
}

/// 校验初始蛇身与食物的摆放。
pub fn check_layout(
    rows: usize,
    cols: usize,
    body: &[Position],
    food: Position,
) -> Result<(), IntegrityError> {
    check_body(rows, cols, body.iter())?;
    check_food(rows, cols, body, food)
}

fn check_body<'a>(
    rows: usize,
    cols: usize,
    body: impl IntoIterator<Item = &'a Position>,
) -> Result<(), IntegrityError> {
    let mut seen = HashSet::new();
    let mut previous: Option<Position> = None;

    for (index, segment) in body.into_iter().enumerate() {
        if segment.row >= rows || segment.col >= cols {
            return Err(IntegrityError::OutOfBounds { position: *segment });
        }
        if !seen.insert(*segment) {
            return Err(IntegrityError::OverlappingBody { position: *segment });
        }
        if let Some(prev) = previous {
            if !prev.is_adjacent(segment) {
                return Err(IntegrityError::DetachedBody { index });
            }
        }
        previous = Some(*segment);
    }

    if seen.is_empty() {
        return Err(IntegrityError::BodyTooShort { len: 0 });
    }
    Ok(())
}

fn check_food<'a>(
    rows: usize,
    cols: usize,
    body: impl IntoIterator<Item = &'a Position>,
    food: Position,
) -> Result<(), IntegrityError> {
    if food.row >= rows || food.col >= cols {
        return Err(IntegrityError::OutOfBounds { position: food });
    }
    if body.into_iter().any(|segment| *segment == food) {
        return Err(IntegrityError::FoodOnBody { position: food });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    fn snake(body: &[(usize, usize)], heading: Direction, food: (usize, usize)) -> Snake {
        Snake::from_parts(
            SnakeConfig::default(),
            body.iter().map(|&(r, c)| Position::new(r, c)).collect(),
            heading,
            Position::new(food.0, food.1),
            0,
        )
        .expect("layout should be valid")
    }

    fn small_config(rows: usize, cols: usize) -> SnakeConfig {
        SnakeConfig {
            rows,
            cols,
            initial_body: vec![Position::new(0, 1), Position::new(0, 0)],
            initial_heading: Direction::Right,
            initial_food: Position::new(0, 2),
            ..SnakeConfig::default()
        }
    }

    #[test]
    fn default_session_moves_right() {
        let mut game = Snake::default();
        let events = game.tick(&mut rng());
        assert_eq!(
            events,
            vec![GameEvent::SnakeMoved {
                head: Position::new(10, 11)
            }]
        );
        assert_eq!(game.len(), 3);
        assert_eq!(game.body().back(), Some(&Position::new(10, 9)));
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn eating_scores_and_grows_by_one() {
        let mut game = snake(&[(10, 10), (10, 9), (10, 8)], Direction::Right, (10, 11));
        let events = game.tick(&mut rng());

        assert_eq!(game.score(), 1);
        assert_eq!(game.len(), 4);
        assert_eq!(game.head(), Position::new(10, 11));
        let food = game.food().expect("new food should be placed");
        assert!(!game.body().contains(&food), "food must not spawn on the body");
        assert!(events.contains(&GameEvent::FoodEaten {
            at: Position::new(10, 11),
            score: 1
        }));
        assert!(events.contains(&GameEvent::FoodSpawned { at: food }));
    }

    #[test]
    fn running_into_second_segment_is_fatal() {
        let mut game = snake(&[(5, 5), (5, 6), (5, 7)], Direction::Right, (0, 0));
        let events = game.tick(&mut rng());
        assert_eq!(
            game.status(),
            &GameStatus::Lost {
                cause: LossCause::SelfCollision
            }
        );
        assert_eq!(
            events,
            vec![GameEvent::GameLost {
                cause: LossCause::SelfCollision
            }]
        );
    }

    #[test]
    fn leaving_the_arena_is_fatal() {
        let mut game = snake(&[(10, 19), (10, 18), (10, 17)], Direction::Right, (0, 0));
        game.tick(&mut rng());
        assert_eq!(
            game.status(),
            &GameStatus::Lost {
                cause: LossCause::Wall
            }
        );

        let frozen = game.clone();
        assert!(GameEvent::is_ignored(&game.tick(&mut rng())));
        assert!(GameEvent::is_ignored(
            &game.apply_input(Direction::Up).expect("steering never errors")
        ));
        assert_eq!(game, frozen);
    }

    #[test]
    fn moving_into_the_vacating_tail_is_allowed() {
        let mut game = snake(&[(5, 5), (5, 6), (6, 6), (6, 5)], Direction::Left, (0, 0));
        game.apply_input(Direction::Down).expect("steering never errors");
        game.tick(&mut rng());

        assert_eq!(game.status(), &GameStatus::Ongoing);
        assert_eq!(
            game.body().iter().copied().collect::<Vec<_>>(),
            vec![
                Position::new(6, 5),
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(6, 6),
            ]
        );
    }

    #[test]
    fn reversal_is_ignored() {
        let mut game = Snake::default();
        let events = game.apply_input(Direction::Left).expect("steering never errors");
        assert_eq!(
            events,
            vec![GameEvent::InputIgnored {
                reason: IgnoreReason::Reversal
            }]
        );
        game.tick(&mut rng());
        assert_eq!(game.head(), Position::new(10, 11));
    }

    #[test]
    fn two_quick_turns_cannot_reverse_between_ticks() {
        let mut game = Snake::default();
        game.apply_input(Direction::Up).expect("steering never errors");
        let events = game.apply_input(Direction::Left).expect("steering never errors");

        assert!(GameEvent::is_ignored(&events));
        assert_eq!(game.pending_direction(), Direction::Up);

        game.tick(&mut rng());
        assert_eq!(game.status(), &GameStatus::Ongoing);
        assert_eq!(game.head(), Position::new(9, 10));
        assert_eq!(game.heading(), Direction::Up);
    }

    #[test]
    fn pause_suspends_ticks_and_resume_continues() {
        let mut game = Snake::default();
        game.tick(&mut rng());
        assert_eq!(game.pause(), vec![GameEvent::Paused]);
        let paused = game.clone();

        assert!(GameEvent::is_ignored(&game.tick(&mut rng())));
        assert!(GameEvent::is_ignored(
            &game.apply_input(Direction::Down).expect("steering never errors")
        ));
        assert_eq!(game, paused);

        assert_eq!(game.toggle_pause(), vec![GameEvent::Resumed]);
        game.tick(&mut rng());
        assert_eq!(game.head(), Position::new(10, 12));
        assert_eq!(game.moves(), 2);
    }

    #[test]
    fn last_free_cell_receives_the_food() {
        let config = small_config(1, 4);
        let mut game = Snake::with_config(config).expect("config is valid");
        game.tick(&mut rng());
        assert_eq!(game.food(), Some(Position::new(0, 3)));
        assert_eq!(game.len(), 3);
    }

    #[test]
    fn filling_the_arena_wins() {
        let config = small_config(1, 3);
        let mut game = Snake::with_config(config).expect("config is valid");
        let events = game.tick(&mut rng());

        assert_eq!(game.len(), 3);
        assert_eq!(game.food(), None);
        assert_eq!(
            game.status(),
            &GameStatus::Won {
                winner: None,
                line: Vec::new()
            }
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::GameWon { .. })));
        assert!(GameEvent::is_ignored(&game.tick(&mut rng())));
    }

    #[test]
    fn grid_marks_head_body_and_food() {
        let game = Snake::default();
        let grid = game.grid();
        assert_eq!(grid.get(Position::new(10, 10)), Some(SnakeCell::Head));
        assert_eq!(grid.get(Position::new(10, 8)), Some(SnakeCell::Body));
        assert_eq!(grid.get(Position::new(15, 15)), Some(SnakeCell::Food));
        let bodies = grid
            .cells()
            .iter()
            .filter(|cell| **cell == SnakeCell::Body)
            .count();
        assert_eq!(bodies, 2);
    }

    #[test]
    fn reset_matches_fresh_session() {
        let mut game = snake(&[(10, 10), (10, 9), (10, 8)], Direction::Right, (10, 11));
        let mut rng = rng();
        game.tick(&mut rng);
        game.apply_input(Direction::Down).expect("steering never errors");
        game.tick(&mut rng);
        game.pause();

        game.reset();

        assert_eq!(game, Snake::default());
    }

    #[test]
    fn detached_body_is_rejected() {
        let result = Snake::from_parts(
            SnakeConfig::default(),
            vec![Position::new(1, 1), Position::new(1, 3)],
            Direction::Left,
            Position::new(0, 0),
            0,
        );
        assert_eq!(
            result,
            Err(EngineError::IntegrityViolation {
                error: IntegrityError::DetachedBody { index: 1 }
            })
        );
    }

    #[test]
    fn restored_reverse_turn_is_rejected() {
        let mut json = serde_json::to_value(Snake::default()).expect("serializes");
        json["pending"] = serde_json::json!("left");
        let tampered: Snake = serde_json::from_value(json).expect("deserializes");

        assert_eq!(
            tampered.validated(),
            Err(IntegrityError::ReversedPending {
                heading: Direction::Right,
                pending: Direction::Left,
            })
        );
    }

    #[test]
    fn restored_full_arena_is_won() {
        let config = small_config(1, 3);
        let mut game = Snake::with_config(config).expect("config is valid");
        game.tick(&mut rng());
        let won = game.clone();

        let mut reopened = game;
        reopened.status = GameStatus::Ongoing;
        let restored = reopened.validated().expect("full arena is consistent");

        assert_eq!(restored, won);
        assert!(GameEvent::is_ignored(&restored.clone().tick(&mut rng())));
    }

    #[test]
    fn restored_win_needs_a_full_arena() {
        let mut game = Snake::default();
        game.status = GameStatus::Won {
            winner: None,
            line: Vec::new(),
        };
        assert_eq!(
            game.validated(),
            Err(IntegrityError::BodyTooShort { len: 3 })
        );
    }

    #[test]
    fn empty_body_never_builds_a_session() {
        let config = SnakeConfig {
            initial_body: Vec::new(),
            ..SnakeConfig::default()
        };
        assert_eq!(
            Snake::with_config(config),
            Err(EngineError::IntegrityViolation {
                error: IntegrityError::BodyTooShort { len: 0 }
            })
        );
    }
}
