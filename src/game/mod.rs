//! 游戏核心逻辑模块（棋盘、序列检测、回合规则）。

pub mod board;
pub mod rules;
pub mod sequence;
pub mod state;

pub use board::{
    Board,
    Cell,
    CellTag,
    LayoutError,
    PlaceError,
    RemoveError,
    RevertError,
    BOARD_SIZE,
    DEFAULT_LAYOUT,
};
pub use rules::{ClickResolution, IllegalMoveReason, MoveOutcome, RuleEngine, RuleError};
pub use sequence::count_sequences;
pub use state::{
    hand_size_for,
    Card,
    ConfigError,
    Deck,
    GameConfig,
    GameEvent,
    GameOutcome,
    GameOverReason,
    GamePhase,
    GameState,
    Hand,
    HandError,
    IntegrityError,
    ParseCardError,
    Player,
    PlayerId,
    Rank,
    Snapshot,
    Suit,
    Team,
    WILD_PLACE_JACKS,
    WILD_REMOVE_JACKS,
};
