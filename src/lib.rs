pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use game::{
    evaluate_placement, winning_lines, ActiveGame, ConnectFour, ConnectFourConfig, DemoKind,
    Direction, Disc, EngineError, GameEvent, GameStatus, Grid, GridGame, IgnoreReason,
    IntegrityError, LossCause, Mark, Player, Position, Resolution, Shell, ShellInput, Snake,
    SnakeCell, SnakeConfig, TicTacToe, Walker, WalkerCell, WalkerConfig,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: EngineError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn integrity_to_js_error(error: IntegrityError) -> JsValue {
    to_js_error(EngineError::IntegrityViolation { error })
}

fn make_resolution_json<S: Serialize>(
    state: &S,
    events: Vec<GameEvent>,
    status: &GameStatus,
) -> Result<String, JsValue> {
    let resolution = Resolution::new(state, events, status.clone());
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_config<C>(config_json: Option<String>) -> Result<C, JsValue>
where
    C: Default + serde::de::DeserializeOwned,
{
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error),
        None => Ok(C::default()),
    }
}

fn parse_direction(value: &str) -> Result<Direction, JsValue> {
    Direction::from_str(value).map_err(|_| {
        to_js_error(EngineError::UnknownDirection {
            value: value.to_string(),
        })
    })
}

fn make_rng(seed: Option<u32>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(u64::from(seed)),
        None => SmallRng::from_entropy(),
    }
}

/// 把值得宿主注意的事件写到控制台。
fn report(label: &str, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::InputIgnored { reason } => {
                utils::warn(&format!("{label}: input ignored ({reason:?})"))
            }
            GameEvent::GameWon { winner, .. } => match winner {
                Some(player) => utils::log(&format!("{label}: {player:?} player wins")),
                None => utils::log(&format!("{label}: board cleared")),
            },
            GameEvent::GameDrawn => utils::log(&format!("{label}: draw")),
            GameEvent::GameLost { cause } => utils::log(&format!("{label}: game over ({cause:?})")),
            GameEvent::DemoMounted { kind } => {
                utils::log(&format!("{label}: mounted {}", kind.as_str()))
            }
            GameEvent::DemoUnmounted { kind } => {
                utils::log(&format!("{label}: unmounted {}", kind.as_str()))
            }
            _ => {}
        }
    }
}

fn apply_and_resolve<G>(label: &str, game: &mut G, input: G::Input) -> Result<String, JsValue>
where
    G: GridGame + Serialize,
{
    let events = game.apply_input(input).map_err(to_js_error)?;
    report(label, &events);
    make_resolution_json(&*game, events, game.status())
}

fn reset_and_resolve<G>(game: &mut G) -> Result<String, JsValue>
where
    G: GridGame + Serialize,
{
    game.reset();
    make_resolution_json(&*game, vec![GameEvent::SessionReset], game.status())
}

#[wasm_bindgen]
pub struct TicTacToeEngine {
    session: TicTacToe,
}

#[wasm_bindgen]
impl TicTacToeEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TicTacToeEngine {
        TicTacToeEngine {
            session: TicTacToe::new(),
        }
    }

    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        apply_and_resolve("tic-tac-toe", &mut self.session, index)
    }

    pub fn jump_to(&mut self, step: usize) -> Result<String, JsValue> {
        let events = self.session.jump_to(step).map_err(to_js_error)?;
        make_resolution_json(&self.session, events, self.session.status())
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        reset_and_resolve(&mut self.session)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let session: TicTacToe = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session = session.validated().map_err(integrity_to_js_error)?;
        Ok(())
    }
}

impl Default for TicTacToeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub struct ConnectFourEngine {
    session: ConnectFour,
}

#[wasm_bindgen]
impl ConnectFourEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ConnectFourEngine, JsValue> {
        let config: ConnectFourConfig = parse_config(config_json)?;
        let session = ConnectFour::with_config(config).map_err(to_js_error)?;
        Ok(ConnectFourEngine { session })
    }

    pub fn drop_disc(&mut self, column: usize) -> Result<String, JsValue> {
        apply_and_resolve("connect-four", &mut self.session, column)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        reset_and_resolve(&mut self.session)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let session: ConnectFour = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session = session.validated().map_err(integrity_to_js_error)?;
        Ok(())
    }
}

#[wasm_bindgen]
pub struct SnakeEngine {
    session: Snake,
    rng: SmallRng,
}

#[wasm_bindgen]
impl SnakeEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, seed: Option<u32>) -> Result<SnakeEngine, JsValue> {
        let config: SnakeConfig = parse_config(config_json)?;
        let session = Snake::with_config(config).map_err(to_js_error)?;
        Ok(SnakeEngine {
            session,
            rng: make_rng(seed),
        })
    }

    pub fn steer(&mut self, direction: &str) -> Result<String, JsValue> {
        let direction = parse_direction(direction)?;
        apply_and_resolve("snake", &mut self.session, direction)
    }

    pub fn tick(&mut self) -> Result<String, JsValue> {
        let events = self.session.tick(&mut self.rng);
        report("snake", &events);
        make_resolution_json(&self.session, events, self.session.status())
    }

    pub fn pause(&mut self) -> Result<String, JsValue> {
        let events = self.session.pause();
        make_resolution_json(&self.session, events, self.session.status())
    }

    pub fn resume(&mut self) -> Result<String, JsValue> {
        let events = self.session.resume();
        make_resolution_json(&self.session, events, self.session.status())
    }

    pub fn toggle_pause(&mut self) -> Result<String, JsValue> {
        let events = self.session.toggle_pause();
        make_resolution_json(&self.session, events, self.session.status())
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        reset_and_resolve(&mut self.session)
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.session.config().tick_interval_ms
    }

    /// 等待一个 tick 间隔后兑现的 Promise。宿主在兑现时调用 `tick()`，
    /// 错过的间隔不会排队补帧。
    pub fn wait_tick(&self) -> Promise {
        let delay = self.tick_interval_ms();
        future_to_promise(async move {
            TimeoutFuture::new(delay).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let session: Snake = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session = session.validated().map_err(integrity_to_js_error)?;
        Ok(())
    }
}

#[wasm_bindgen]
pub struct WalkerEngine {
    session: Walker,
}

#[wasm_bindgen]
impl WalkerEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WalkerEngine, JsValue> {
        let config: WalkerConfig = parse_config(config_json)?;
        let session = Walker::with_config(config).map_err(to_js_error)?;
        Ok(WalkerEngine { session })
    }

    pub fn walk(&mut self, direction: &str) -> Result<String, JsValue> {
        let direction = parse_direction(direction)?;
        apply_and_resolve("walker", &mut self.session, direction)
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        reset_and_resolve(&mut self.session)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }
}

/// 单页外壳：一次只挂载一个演示。
#[wasm_bindgen]
pub struct Arcade {
    shell: Shell,
}

#[wasm_bindgen]
impl Arcade {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u32>) -> Arcade {
        let shell = match seed {
            Some(seed) => Shell::with_seed(u64::from(seed)),
            None => Shell::new(),
        };
        Arcade { shell }
    }

    pub fn mount(&mut self, kind: &str) -> Result<String, JsValue> {
        let kind = DemoKind::from_str(kind).map_err(|_| {
            to_js_error(EngineError::UnknownDemo {
                value: kind.to_string(),
            })
        })?;
        let events = self.shell.mount(kind);
        report("arcade", &events);
        self.snapshot_with(events)
    }

    pub fn unmount(&mut self) -> Result<String, JsValue> {
        let events = self.shell.unmount();
        report("arcade", &events);
        self.snapshot_with(events)
    }

    pub fn active(&self) -> Option<String> {
        self.shell.active_kind().map(|kind| kind.as_str().to_string())
    }

    pub fn dispatch_json(&mut self, input_json: &str) -> Result<String, JsValue> {
        let input: ShellInput = serde_json::from_str(input_json).map_err(serde_to_js_error)?;
        let events = self.shell.dispatch(input).map_err(to_js_error)?;
        report("arcade", &events);
        self.snapshot_with(events)
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.snapshot_with(Vec::new())
    }

    /// 当前挂载贪吃蛇时返回其 tick 间隔。
    pub fn tick_interval_ms(&self) -> Option<u32> {
        match self.shell.active() {
            Some(ActiveGame::Snake(snake)) => Some(snake.config().tick_interval_ms),
            _ => None,
        }
    }

    fn snapshot_with(&self, events: Vec<GameEvent>) -> Result<String, JsValue> {
        make_resolution_json(&self.shell.active(), events, &self.shell.status())
    }
}

/// 判定一个 3×3 井字棋棋盘（行优先、9 个元素，空格为 null）。
#[wasm_bindgen(js_name = "evaluateTicTacToe")]
pub fn evaluate_tic_tac_toe(board: JsValue) -> Result<JsValue, JsValue> {
    let cells: Vec<Option<Mark>> = from_value(board).map_err(JsValue::from)?;
    let len = cells.len();
    let grid = Grid::from_cells(3, 3, cells).ok_or_else(|| {
        integrity_to_js_error(IntegrityError::GridShape {
            expected_rows: 3,
            expected_cols: 3,
            rows: len / 3,
            cols: 3,
        })
    })?;
    to_value(&evaluate_placement(&grid, 3)).map_err(JsValue::from)
}

/// 判定一个按行给出的四子棋棋盘。
#[wasm_bindgen(js_name = "evaluateConnectFour")]
pub fn evaluate_connect_four(rows: JsValue, run: usize) -> Result<JsValue, JsValue> {
    let rows: Vec<Vec<Option<Disc>>> = from_value(rows).map_err(JsValue::from)?;
    let height = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(ragged) = rows.iter().find(|row| row.len() != width) {
        return Err(integrity_to_js_error(IntegrityError::GridShape {
            expected_rows: height,
            expected_cols: width,
            rows: height,
            cols: ragged.len(),
        }));
    }
    ConnectFourConfig {
        rows: height,
        cols: width,
        run,
    }
    .validate()
    .map_err(to_js_error)?;
    let cells = rows.into_iter().flatten().collect();
    let grid = Grid::from_cells(height, width, cells).ok_or_else(|| {
        integrity_to_js_error(IntegrityError::GridShape {
            expected_rows: height,
            expected_cols: width,
            rows: height,
            cols: width,
        })
    })?;
    to_value(&evaluate_placement(&grid, run)).map_err(JsValue::from)
}
