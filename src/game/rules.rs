use serde::{Deserialize, Serialize};

use super::board::{Board, PlaceError};
use super::sequence::count_sequences;
use super::state::{
    Card, GameEvent, GameOutcome, GameOverReason, GamePhase, GameState, HandError, IntegrityError,
    PlayerId, Team,
};

/// 契约或配置层面的硬错误；普通的非法点击不会走到这里。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    CardNotInHand { card: Card },
    NothingToRevert { row: usize, col: usize },
    IntegrityViolation { error: IntegrityError },
}

/// 被静默拒绝的点击原因，作为返回值而非错误传播。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IllegalMoveReason {
    GameFinished,
    OutOfBounds { row: usize, col: usize },
    CellWild,
    CellOccupied { by: Team },
    CardUnavailable,
    WouldBreakSequence { team: Team },
}

impl From<PlaceError> for IllegalMoveReason {
    fn from(error: PlaceError) -> Self {
        match error {
            PlaceError::CellWild => IllegalMoveReason::CellWild,
            PlaceError::CellOccupied { by } => IllegalMoveReason::CellOccupied { by },
            PlaceError::CardUnavailable => IllegalMoveReason::CardUnavailable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum MoveOutcome {
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
    Rejected {
        reason: IllegalMoveReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickResolution {
    pub state: GameState,
    pub outcome: MoveOutcome,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<GameOutcome>,
}

impl ClickResolution {
    fn new(state: &GameState, outcome: MoveOutcome, events: Vec<GameEvent>) -> Self {
        Self {
            state: state.clone(),
            outcome,
            events,
            game_over: state.outcome.clone(),
        }
    }
}

#[derive(Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        RuleEngine
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn reject(state: &GameState, reason: IllegalMoveReason) -> ClickResolution {
        ClickResolution::new(state, MoveOutcome::Rejected { reason }, Vec::new())
    }

    /// 驱动状态机的唯一入口：一次点击要么被接受，要么是静默空操作。
    pub fn apply_click(
        &mut self,
        state: &mut GameState,
        row: usize,
        col: usize,
    ) -> Result<ClickResolution, RuleError> {
        Self::ensure_integrity(state)?;

        if state.is_finished() || state.phase == GamePhase::Finished {
            return Ok(Self::reject(state, IllegalMoveReason::GameFinished));
        }

        match state.phase {
            GamePhase::AwaitingReveal => {
                let player = state.acting_player().id;
                state.phase = GamePhase::AwaitingMove;
                let event = GameEvent::HandRevealed { player };
                state.record_event(event.clone());
                Ok(ClickResolution::new(
                    state,
                    MoveOutcome::HandRevealed { player },
                    vec![event],
                ))
            }
            GamePhase::AwaitingMove => self.resolve_move(state, row, col),
            GamePhase::Finished => Ok(Self::reject(state, IllegalMoveReason::GameFinished)),
        }
    }

    fn resolve_move(
        &mut self,
        state: &mut GameState,
        row: usize,
        col: usize,
    ) -> Result<ClickResolution, RuleError> {
        if !Board::in_bounds(row, col) {
            return Ok(Self::reject(
                state,
                IllegalMoveReason::OutOfBounds { row, col },
            ));
        }

        let player_idx = state.acting_player_index();
        let player = state.players[player_idx].id;
        let team = state.players[player_idx].team;

        match state
            .board
            .try_place(row, col, team, &state.players[player_idx].hand)
        {
            Ok(card) => {
                let mut events = vec![GameEvent::ChipPlaced {
                    player,
                    team,
                    row,
                    col,
                    card,
                }];
                let outcome = MoveOutcome::ChipPlaced {
                    player,
                    team,
                    row,
                    col,
                    card,
                };
                self.finish_accepted(state, player_idx, card, &mut events)?;
                Ok(ClickResolution::new(state, outcome, events))
            }
            Err(PlaceError::CellOccupied { by }) if by != team => {
                // 无法落子时才解释为移除尝试
                let recorded = state.sequence_count(by);
                match state
                    .board
                    .try_remove(row, col, team, &state.players[player_idx].hand)
                {
                    Ok((displaced, jack)) => {
                        // 先试清除再重算；打破对方已完成的序列则回退
                        let recomputed = count_sequences(&state.board, displaced);
                        if recomputed < recorded {
                            state
                                .board
                                .revert(row, col)
                                .map_err(|_| RuleError::NothingToRevert { row, col })?;
                            Ok(Self::reject(
                                state,
                                IllegalMoveReason::WouldBreakSequence { team: displaced },
                            ))
                        } else {
                            state.board.clear_pending();
                            let mut events = vec![GameEvent::ChipRemoved {
                                player,
                                team,
                                row,
                                col,
                                card: jack,
                                displaced,
                            }];
                            let outcome = MoveOutcome::ChipRemoved {
                                player,
                                team,
                                row,
                                col,
                                card: jack,
                                displaced,
                            };
                            self.finish_accepted(state, player_idx, jack, &mut events)?;
                            Ok(ClickResolution::new(state, outcome, events))
                        }
                    }
                    Err(_) => Ok(Self::reject(state, IllegalMoveReason::CellOccupied { by })),
                }
            }
            Err(error) => Ok(Self::reject(state, error.into())),
        }
    }

    /// 合法性确认之后才动手牌和回合数。
    fn finish_accepted(
        &mut self,
        state: &mut GameState,
        player_idx: usize,
        played: Card,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), RuleError> {
        let player = state.players[player_idx].id;
        let drawn = state.players[player_idx]
            .hand
            .replace(played, &mut state.deck)
            .map_err(|error| match error {
                HandError::CardNotInHand { card } => RuleError::CardNotInHand { card },
            })?;
        events.push(GameEvent::CardReplaced {
            player,
            discarded: played,
            drawn,
        });

        state.recompute_sequence_counts();
        events.push(GameEvent::TurnEnded {
            player,
            turn: state.turn_number,
        });
        state.turn_number += 1;
        state.phase = GamePhase::AwaitingReveal;

        let threshold = state.win_threshold();
        if let Some(idx) =
            (0..state.num_teams as usize).find(|i| state.sequence_counts[*i] >= threshold)
        {
            let winning = Team::ALL[idx];
            let count = state.sequence_counts[idx];
            events.push(GameEvent::GameWon {
                team: winning,
                count,
            });
            state.phase = GamePhase::Finished;
            state.outcome = Some(GameOutcome {
                winner: Some(winning),
                reason: GameOverReason::SequencesCompleted {
                    team: winning,
                    count,
                },
            });
        } else {
            let next_idx = state.acting_player_index();
            if state.players[next_idx].hand.is_empty() {
                let next = state.players[next_idx].id;
                events.push(GameEvent::GameTied { player: next });
                state.phase = GamePhase::Finished;
                state.outcome = Some(GameOutcome {
                    winner: None,
                    reason: GameOverReason::HandExhausted { player: next },
                });
            }
        }

        for event in events.iter() {
            state.record_event(event.clone());
        }
        Ok(())
    }
}
