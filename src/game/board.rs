use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::state::{Card, Hand, Team, WILD_PLACE_JACKS, WILD_REMOVE_JACKS};

pub const BOARD_SIZE: usize = 10;

/// 标准棋盘：除四个角外，48 张非 J 卡牌各出现两次。
pub const DEFAULT_LAYOUT: &str = "\
W 2S 3S 4S 5S 6S 7S 8S 9S W
6C 5C 4C 3C 2C AH KH QH 10H 10S
7C AS 2D 3D 4D 5D 6D 7D 9H QS
8C KS 6C 5C 4C 3C 2C 8D 8H KS
9C QS 7C 6H 5H 4H AH 9D 7H AS
10C 10S 8C 7H 2H 3H KH 10D 6H 2D
QC 9S 9C 8H 9H 10H QH QD 5H 3D
KC 8S 10C QC KC AC AD KD 4H 4D
AC 7S 6S 5S 4S 3S 2S 2H 3H 5D
W AD KD QD 10D 9D 8D 7D 6D W
";

static DEFAULT_BOARD: Lazy<Board> =
    Lazy::new(|| Board::parse(DEFAULT_LAYOUT).expect("embedded default layout is valid"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum CellTag {
    Wild,
    Card { card: Card },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cell {
    pub tag: CellTag,
    pub occupant: Option<Team>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum LayoutError {
    WrongRowCount { actual: usize },
    WrongColumnCount { row: usize, actual: usize },
    UnknownToken { row: usize, col: usize, token: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum PlaceError {
    CellWild,
    CellOccupied { by: Team },
    CardUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RemoveError {
    CellWild,
    CellUnoccupied,
    OwnChip,
    NoRemoveJack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RevertError {
    NothingToRevert { row: usize, col: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct PendingRemoval {
    row: usize,
    col: usize,
    team: Team,
}

/// 10×10 棋盘：固定的卡牌标签格子加可变的占用状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_revert: Option<PendingRemoval>,
}

impl Board {
    pub fn parse(text: &str) -> Result<Board, LayoutError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() != BOARD_SIZE {
            return Err(LayoutError::WrongRowCount {
                actual: lines.len(),
            });
        }

        let mut cells = Vec::with_capacity(BOARD_SIZE);
        for (row, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != BOARD_SIZE {
                return Err(LayoutError::WrongColumnCount {
                    row,
                    actual: tokens.len(),
                });
            }
            let mut cell_row = Vec::with_capacity(BOARD_SIZE);
            for (col, token) in tokens.iter().enumerate() {
                let tag = if *token == "W" {
                    CellTag::Wild
                } else {
                    let card: Card = token.parse().map_err(|_| LayoutError::UnknownToken {
                        row,
                        col,
                        token: (*token).to_string(),
                    })?;
                    CellTag::Card { card }
                };
                cell_row.push(Cell {
                    tag,
                    occupant: None,
                });
            }
            cells.push(cell_row);
        }

        Ok(Board {
            cells,
            pending_revert: None,
        })
    }

    pub fn default_board() -> &'static Board {
        &DEFAULT_BOARD
    }

    pub fn in_bounds(row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row][col]
    }

    pub fn well_formed(&self) -> bool {
        self.cells.len() == BOARD_SIZE && self.cells.iter().all(|row| row.len() == BOARD_SIZE)
    }

    pub fn occupancy(&self) -> Vec<Vec<Option<Team>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.occupant).collect())
            .collect()
    }

    pub(crate) fn set_occupant(&mut self, row: usize, col: usize, occupant: Option<Team>) {
        self.cells[row][col].occupant = occupant;
    }

    /// 落子：格子必须未占用且非角格，手牌需持有标签牌或双眼 J，返回被消耗的牌。
    pub fn try_place(
        &mut self,
        row: usize,
        col: usize,
        team: Team,
        hand: &Hand,
    ) -> Result<Card, PlaceError> {
        let cell = &self.cells[row][col];
        let tag = match cell.tag {
            CellTag::Wild => return Err(PlaceError::CellWild),
            CellTag::Card { card } => card,
        };
        if let Some(by) = cell.occupant {
            return Err(PlaceError::CellOccupied { by });
        }
        let card = placement_card(tag, hand).ok_or(PlaceError::CardUnavailable)?;
        self.cells[row][col].occupant = Some(team);
        Ok(card)
    }

    /// 移除对方棋子：清空占用并记入待回退槽，返回被移走的队伍与消耗的单眼 J。
    pub fn try_remove(
        &mut self,
        row: usize,
        col: usize,
        acting_team: Team,
        hand: &Hand,
    ) -> Result<(Team, Card), RemoveError> {
        let cell = &self.cells[row][col];
        if matches!(cell.tag, CellTag::Wild) {
            return Err(RemoveError::CellWild);
        }
        let displaced = cell.occupant.ok_or(RemoveError::CellUnoccupied)?;
        if displaced == acting_team {
            return Err(RemoveError::OwnChip);
        }
        let jack = hand
            .first_held(&WILD_REMOVE_JACKS)
            .ok_or(RemoveError::NoRemoveJack)?;

        self.pending_revert = Some(PendingRemoval {
            row,
            col,
            team: displaced,
        });
        self.cells[row][col].occupant = None;
        Ok((displaced, jack))
    }

    // 移除被采纳后清空回退槽，之后的 revert 调用按契约违规处理
    pub(crate) fn clear_pending(&mut self) {
        self.pending_revert = None;
    }

    /// 回退最近一次 `try_remove`；没有匹配的待回退记录属于调用方契约违规。
    pub fn revert(&mut self, row: usize, col: usize) -> Result<(), RevertError> {
        match self.pending_revert {
            Some(pending) if pending.row == row && pending.col == col => {
                self.cells[row][col].occupant = Some(pending.team);
                self.pending_revert = None;
                Ok(())
            }
            _ => Err(RevertError::NothingToRevert { row, col }),
        }
    }

    /// 事后推断这一步消耗的是哪张牌：已占用按落子推断，空格按移除推断。
    pub fn card_played(&self, row: usize, col: usize, hand: &Hand) -> Option<Card> {
        let cell = &self.cells[row][col];
        match cell.tag {
            CellTag::Wild => None,
            CellTag::Card { card: tag } => {
                if cell.occupant.is_some() {
                    placement_card(tag, hand)
                } else {
                    hand.first_held(&WILD_REMOVE_JACKS)
                }
            }
        }
    }
}

// 落子消耗的牌：优先格子自己的标签牌，其次按固定顺序的双眼 J
fn placement_card(tag: Card, hand: &Hand) -> Option<Card> {
    if hand.contains(tag) {
        Some(tag)
    } else {
        hand.first_held(&WILD_PLACE_JACKS)
    }
}
