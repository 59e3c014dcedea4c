use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::board::{Board, CellTag, LayoutError, BOARD_SIZE};
use super::sequence;

/// 玩家标识。
pub type PlayerId = u8;

/// 卡牌点数（无大小王）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// 卡牌花色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Suit {
    Hearts,
    Diamonds,
    Spades,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Spades, Suit::Clubs];

    pub fn token(self) -> char {
        match self {
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Spades => 'S',
            Suit::Clubs => 'C',
        }
    }

    fn from_token(token: char) -> Option<Suit> {
        match token {
            'H' => Some(Suit::Hearts),
            'D' => Some(Suit::Diamonds),
            'S' => Some(Suit::Spades),
            'C' => Some(Suit::Clubs),
            _ => None,
        }
    }
}

/// 卡牌，序列化为 `"5H"`、`"10D"` 这样的记号。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

/// 双眼 J：可落在任意未占用的非角格。
pub const WILD_PLACE_JACKS: [Card; 2] = [
    Card {
        rank: Rank::Jack,
        suit: Suit::Diamonds,
    },
    Card {
        rank: Rank::Jack,
        suit: Suit::Clubs,
    },
];

/// 单眼 J：可移除对方棋子。
pub const WILD_REMOVE_JACKS: [Card; 2] = [
    Card {
        rank: Rank::Jack,
        suit: Suit::Hearts,
    },
    Card {
        rank: Rank::Jack,
        suit: Suit::Spades,
    },
];

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn token(self) -> String {
        format!("{}{}", self.rank.token(), self.suit.token())
    }

    pub fn is_wild_place_jack(self) -> bool {
        WILD_PLACE_JACKS.contains(&self)
    }

    pub fn is_wild_remove_jack(self) -> bool {
        WILD_REMOVE_JACKS.contains(&self)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.token(), self.suit.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError {
    pub token: String,
}

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized card token `{}`", self.token)
    }
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Card, ParseCardError> {
        let err = || ParseCardError {
            token: s.to_string(),
        };
        let suit_ch = s.chars().last().ok_or_else(err)?;
        let suit = Suit::from_token(suit_ch).ok_or_else(err)?;
        let rank_str = &s[..s.len() - suit_ch.len_utf8()];
        let rank = Rank::ALL
            .iter()
            .copied()
            .find(|rank| rank.token() == rank_str)
            .ok_or_else(err)?;
        Ok(Card { rank, suit })
    }
}

impl From<Card> for String {
    fn from(card: Card) -> String {
        card.token()
    }
}

impl TryFrom<String> for Card {
    type Error = ParseCardError;

    fn try_from(value: String) -> Result<Card, ParseCardError> {
        value.parse()
    }
}

/// 队伍颜色，仅作规则值使用，渲染层自行映射成显示颜色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Team {
    Red,
    Blue,
    Green,
}

impl Team {
    pub const ALL: [Team; 3] = [Team::Red, Team::Blue, Team::Green];

    pub fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
            Team::Green => 2,
        }
    }
}

/// 牌库：52 张牌各两份（共 104 张），开局洗一次。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard(rng: &mut SmallRng) -> Deck {
        let mut cards = Vec::with_capacity(2 * Rank::ALL.len() * Suit::ALL.len());
        for _ in 0..2 {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    cards.push(Card { rank, suit });
                }
            }
        }
        cards.shuffle(rng);
        Deck { cards }
    }

    pub fn from_cards(cards: Vec<Card>) -> Deck {
        Deck { cards }
    }

    pub fn draw_top(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum HandError {
    CardNotInHand { card: Card },
}

/// 手牌，顺序即展示顺序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new(cards: Vec<Card>) -> Hand {
        Hand { cards }
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn first_held(&self, candidates: &[Card]) -> Option<Card> {
        candidates.iter().copied().find(|card| self.contains(*card))
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// 在原位置用牌库顶牌替换 `old`；牌库抽空时手牌缩短一张。
    pub fn replace(&mut self, old: Card, deck: &mut Deck) -> Result<Option<Card>, HandError> {
        let idx = self
            .cards
            .iter()
            .position(|card| *card == old)
            .ok_or(HandError::CardNotInHand { card: old })?;
        self.cards.remove(idx);
        match deck.draw_top() {
            Some(drawn) => {
                self.cards.insert(idx, drawn);
                Ok(Some(drawn))
            }
            None => Ok(None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub team: Team,
    pub hand: Hand,
}

/// 游戏阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingReveal,
    AwaitingMove,
    Finished,
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::AwaitingReveal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOverReason {
    SequencesCompleted { team: Team, count: u32 },
    HandExhausted { player: PlayerId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Option<Team>,
    pub reason: GameOverReason,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    HandRevealed {
        player: PlayerId,
    },
    ChipPlaced {
        player: PlayerId,
        team: Team,
        row: usize,
        col: usize,
        card: Card,
    },
    ChipRemoved {
        player: PlayerId,
        team: Team,
        row: usize,
        col: usize,
        card: Card,
        displaced: Team,
    },
    CardReplaced {
        player: PlayerId,
        discarded: Card,
        #[serde(skip_serializing_if = "Option::is_none")]
        drawn: Option<Card>,
    },
    TurnEnded {
        player: PlayerId,
        turn: u32,
    },
    GameWon {
        team: Team,
        count: u32,
    },
    GameTied {
        player: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    NoPlayers,
    InvalidTeamCount { num_teams: u8 },
    TeamOutOfRange { player: PlayerId },
    MalformedBoard,
    CornerNotWild { row: usize, col: usize },
    WildCellOccupied { row: usize, col: usize },
    CardOverCommitted { card: Card, copies: usize },
    SequenceCountsLength { expected: usize, actual: usize },
    SequenceCountDrift { team: Team, recorded: u32, actual: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ConfigError {
    InvalidPlayerCount { num_players: u8, num_teams: u8 },
    InvalidLayout { error: LayoutError },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub num_players: u8,
    pub num_teams: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: 2,
            num_teams: 2,
            seed: None,
            layout: None,
        }
    }
}

pub fn hand_size_for(num_players: u8) -> usize {
    match num_players {
        0..=2 => 7,
        3..=4 => 6,
        5..=6 => 5,
        7..=9 => 4,
        _ => 3,
    }
}

/// 渲染层使用的只读快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub occupancy: Vec<Vec<Option<Team>>>,
    pub sequence_counts: Vec<u32>,
    pub turn_number: u32,
    pub phase: GamePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub deck: Deck,
    pub players: Vec<Player>,
    pub num_teams: u8,
    pub turn_number: u32,
    pub phase: GamePhase,
    pub sequence_counts: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Result<GameState, ConfigError> {
        if !matches!(config.num_teams, 2 | 3)
            || config.num_players == 0
            || config.num_players % config.num_teams != 0
        {
            return Err(ConfigError::InvalidPlayerCount {
                num_players: config.num_players,
                num_teams: config.num_teams,
            });
        }

        let board = match &config.layout {
            Some(text) => {
                Board::parse(text).map_err(|error| ConfigError::InvalidLayout { error })?
            }
            None => Board::default_board().clone(),
        };

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut deck = Deck::standard(&mut rng);

        let mut players: Vec<Player> = (0..config.num_players)
            .map(|id| Player {
                id,
                team: Team::ALL[(id % config.num_teams) as usize],
                hand: Hand::new(Vec::new()),
            })
            .collect();

        // 轮流发牌，保持原始抽牌顺序
        for _ in 0..hand_size_for(config.num_players) {
            for player in &mut players {
                if let Some(card) = deck.draw_top() {
                    player.hand.push(card);
                }
            }
        }

        Ok(GameState {
            board,
            deck,
            players,
            num_teams: config.num_teams,
            turn_number: 0,
            phase: GamePhase::AwaitingReveal,
            sequence_counts: vec![0; config.num_teams as usize],
            event_log: Vec::new(),
            outcome: None,
        })
    }

    pub fn teams(&self) -> &'static [Team] {
        &Team::ALL[..self.num_teams as usize]
    }

    pub fn acting_player_index(&self) -> usize {
        self.turn_number as usize % self.players.len()
    }

    pub fn acting_player(&self) -> &Player {
        &self.players[self.acting_player_index()]
    }

    pub fn acting_team(&self) -> Team {
        self.acting_player().team
    }

    pub fn win_threshold(&self) -> u32 {
        if self.num_teams == 3 {
            2
        } else {
            3
        }
    }

    pub fn sequence_count(&self, team: Team) -> u32 {
        self.sequence_counts[team.index()]
    }

    pub fn recompute_sequence_counts(&mut self) {
        for idx in 0..self.num_teams as usize {
            self.sequence_counts[idx] = sequence::count_sequences(&self.board, Team::ALL[idx]);
        }
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            occupancy: self.board.occupancy(),
            sequence_counts: self.sequence_counts.clone(),
            turn_number: self.turn_number,
            phase: self.phase,
            outcome: self.outcome.clone(),
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.players.is_empty() {
            return Err(IntegrityError::NoPlayers);
        }
        if !matches!(self.num_teams, 2 | 3) {
            return Err(IntegrityError::InvalidTeamCount {
                num_teams: self.num_teams,
            });
        }
        for player in &self.players {
            if player.team.index() >= self.num_teams as usize {
                return Err(IntegrityError::TeamOutOfRange { player: player.id });
            }
        }
        if !self.board.well_formed() {
            return Err(IntegrityError::MalformedBoard);
        }
        for (row, col) in [
            (0, 0),
            (0, BOARD_SIZE - 1),
            (BOARD_SIZE - 1, 0),
            (BOARD_SIZE - 1, BOARD_SIZE - 1),
        ] {
            if !matches!(self.board.cell(row, col).tag, CellTag::Wild) {
                return Err(IntegrityError::CornerNotWild { row, col });
            }
        }
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let cell = self.board.cell(row, col);
                if matches!(cell.tag, CellTag::Wild) && cell.occupant.is_some() {
                    return Err(IntegrityError::WildCellOccupied { row, col });
                }
            }
        }

        let mut copies: HashMap<Card, usize> = HashMap::new();
        for card in self
            .deck
            .cards()
            .iter()
            .chain(self.players.iter().flat_map(|p| p.hand.cards()))
        {
            let seen = copies.entry(*card).or_insert(0);
            *seen += 1;
            if *seen > 2 {
                return Err(IntegrityError::CardOverCommitted {
                    card: *card,
                    copies: *seen,
                });
            }
        }

        if self.sequence_counts.len() != self.num_teams as usize {
            return Err(IntegrityError::SequenceCountsLength {
                expected: self.num_teams as usize,
                actual: self.sequence_counts.len(),
            });
        }
        for idx in 0..self.num_teams as usize {
            let team = Team::ALL[idx];
            let actual = sequence::count_sequences(&self.board, team);
            if actual != self.sequence_counts[idx] {
                return Err(IntegrityError::SequenceCountDrift {
                    team,
                    recorded: self.sequence_counts[idx],
                    actual,
                });
            }
        }

        Ok(())
    }

    /// 返回一个示例中盘状态，方便前端调试或初始化。
    pub fn sample() -> Self {
        let config = GameConfig {
            seed: Some(42),
            ..GameConfig::default()
        };
        let mut state = GameState::new(&config).expect("default sample config is valid");

        for (player, team, row, col) in [
            (0, Team::Red, 1, 1),
            (1, Team::Blue, 5, 5),
            (0, Team::Red, 2, 2),
            (1, Team::Blue, 5, 6),
            (0, Team::Red, 3, 3),
        ] {
            state.board.set_occupant(row, col, Some(team));
            if let CellTag::Card { card } = state.board.cell(row, col).tag {
                state.record_event(GameEvent::ChipPlaced {
                    player,
                    team,
                    row,
                    col,
                    card,
                });
            }
        }
        state.recompute_sequence_counts();
        state.turn_number = 5;
        state
    }
}
