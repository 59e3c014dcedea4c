pub mod game;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use game::{
    count_sequences, hand_size_for, Board, Card, Cell, CellTag, ClickResolution, ConfigError,
    Deck, GameConfig, GameEvent, GameOutcome, GameOverReason, GamePhase, GameState, Hand,
    IllegalMoveReason, IntegrityError, LayoutError, MoveOutcome, PlaceError, Player, PlayerId,
    Rank, RemoveError, RuleEngine, RuleError, Snapshot, Suit, Team, BOARD_SIZE, DEFAULT_LAYOUT,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

/// 前端加载 wasm 后的握手检查。
#[wasm_bindgen(js_name = "engineInfo")]
pub fn engine_info() -> String {
    let message = format!("sequence_core {} 已就绪。", env!("CARGO_PKG_VERSION"));
    web_sys::console::log_1(&message.clone().into());
    message
}

fn to_js_error<E: Serialize>(error: &E) -> JsValue {
    to_value(error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config: GameConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => GameConfig::default(),
        };
        let state = GameState::new(&config).map_err(|error| to_js_error(&error))?;
        Ok(GameEngine { state })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.snapshot()).map_err(serde_to_js_error)
    }

    /// 外部输入层把点击换算成格子坐标后调用这里。
    pub fn apply_click(&mut self, row: u32, col: u32) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let resolution = engine
            .apply_click(&mut self.state, row as usize, col as usize)
            .map_err(|error| to_js_error(&error))?;
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }
}

/// 按配置创建一局新游戏的状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state(config: JsValue) -> Result<JsValue, JsValue> {
    let config: GameConfig = if config.is_undefined() || config.is_null() {
        GameConfig::default()
    } else {
        from_value(config).map_err(JsValue::from)?
    };
    let state = GameState::new(&config).map_err(|error| to_js_error(&error))?;
    to_value(&state).map_err(JsValue::from)
}

/// 返回一个示例游戏状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "sampleGameState")]
pub fn sample_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyClick")]
pub fn apply_click(state: JsValue, row: u32, col: u32) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.apply_click(&mut state, row as usize, col as usize) {
        Ok(resolution) => to_value(&resolution).map_err(JsValue::from),
        Err(error) => Err(to_js_error(&error)),
    }
}

#[wasm_bindgen(js_name = "stateSnapshot")]
pub fn state_snapshot(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    to_value(&state.snapshot()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "countSequences")]
pub fn count_sequences_for(state: JsValue, team: JsValue) -> Result<u32, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let team: Team = from_value(team).map_err(JsValue::from)?;
    Ok(count_sequences(&state.board, team))
}

/// 校验外部提供的棋盘布局文本（10×10，已知卡牌记号或 W）。
#[wasm_bindgen(js_name = "parseBoardLayout")]
pub fn parse_board_layout(layout: &str) -> Result<JsValue, JsValue> {
    match Board::parse(layout) {
        Ok(board) => to_value(&board).map_err(JsValue::from),
        Err(error) => Err(to_js_error(&error)),
    }
}

#[wasm_bindgen(js_name = "defaultBoardLayout")]
pub fn default_board_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(&RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
