//! 序列检测：对整盘做一次全扫描，统计完成的五连。

use super::board::{Board, Cell, CellTag, BOARD_SIZE};
use super::state::Team;

// 四个前向方向：右、下、右下、左下；反向由别的起点覆盖
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 统计 `team` 已完成的序列数。
///
/// 从每个格子沿四个方向只向前走，连续匹配（角格或该队棋子）的长度
/// 恰好为 5 或恰好为 10 时计 1；长度 10 的连线会在两个不同起点各计一次。
pub fn count_sequences(board: &Board, team: Team) -> u32 {
    let mut total = 0;
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            for (d_row, d_col) in DIRECTIONS {
                let run = run_length(board, row, col, d_row, d_col, team);
                if run == 5 || run == 10 {
                    total += 1;
                }
            }
        }
    }
    total
}

fn run_length(
    board: &Board,
    row: usize,
    col: usize,
    d_row: isize,
    d_col: isize,
    team: Team,
) -> u32 {
    let mut length = 0;
    let mut row = row as isize;
    let mut col = col as isize;
    while row >= 0
        && row < BOARD_SIZE as isize
        && col >= 0
        && col < BOARD_SIZE as isize
        && cell_matches(board.cell(row as usize, col as usize), team)
    {
        length += 1;
        row += d_row;
        col += d_col;
    }
    length
}

fn cell_matches(cell: &Cell, team: Team) -> bool {
    matches!(cell.tag, CellTag::Wild) || cell.occupant == Some(team)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupy(board: &mut Board, team: Team, cells: &[(usize, usize)]) {
        for (row, col) in cells {
            board.set_occupant(*row, *col, Some(team));
        }
    }

    #[test]
    fn empty_board_has_no_sequences_despite_wild_corners() {
        let board = Board::default_board().clone();
        assert_eq!(count_sequences(&board, Team::Red), 0);
        assert_eq!(count_sequences(&board, Team::Blue), 0);
        assert_eq!(count_sequences(&board, Team::Green), 0);
    }

    #[test]
    fn horizontal_run_of_five_counts_once() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Red,
            &[(5, 2), (5, 3), (5, 4), (5, 5), (5, 6)],
        );
        assert_eq!(count_sequences(&board, Team::Red), 1);
        assert_eq!(count_sequences(&board, Team::Blue), 0);
    }

    #[test]
    fn run_lengths_follow_the_exact_five_or_ten_rule() {
        // 中段一行放 n 连（不碰角格），长度 5..=9 计 1，恰好 10 计 2
        for (run, expected) in [(5, 1), (6, 1), (7, 1), (8, 1), (9, 1), (10, 2)] {
            let mut board = Board::default_board().clone();
            let cells: Vec<(usize, usize)> = (0..run).map(|col| (5, col)).collect();
            occupy(&mut board, Team::Red, &cells);
            assert_eq!(
                count_sequences(&board, Team::Red),
                expected,
                "run length {run}"
            );
        }
    }

    #[test]
    fn maximal_start_of_a_six_run_contributes_nothing() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Red,
            &[(5, 1), (5, 2), (5, 3), (5, 4), (5, 5), (5, 6)],
        );
        // 从 (5,1) 向右长度为 6，不计；唯一的一次来自 (5,2) 的后缀
        assert_eq!(count_sequences(&board, Team::Red), 1);
    }

    #[test]
    fn vertical_and_both_diagonals_are_scanned() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Blue,
            &[(2, 2), (3, 2), (4, 2), (5, 2), (6, 2)],
        );
        assert_eq!(count_sequences(&board, Team::Blue), 1);

        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Blue,
            &[(2, 2), (3, 3), (4, 4), (5, 5), (6, 6)],
        );
        assert_eq!(count_sequences(&board, Team::Blue), 1);

        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Blue,
            &[(2, 6), (3, 5), (4, 4), (5, 3), (6, 2)],
        );
        assert_eq!(count_sequences(&board, Team::Blue), 1);
    }

    #[test]
    fn wild_corner_completes_a_four_chip_run_for_any_team() {
        let mut board = Board::default_board().clone();
        occupy(&mut board, Team::Red, &[(0, 5), (0, 6), (0, 7), (0, 8)]);
        occupy(&mut board, Team::Blue, &[(9, 1), (9, 2), (9, 3), (9, 4)]);

        // 角格 (0,9) 与 (9,0) 分别补全各自的五连
        assert_eq!(count_sequences(&board, Team::Red), 1);
        assert_eq!(count_sequences(&board, Team::Blue), 1);
    }

    #[test]
    fn opposing_chip_breaks_a_run() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Red,
            &[(5, 2), (5, 3), (5, 5), (5, 6), (5, 7)],
        );
        occupy(&mut board, Team::Blue, &[(5, 4)]);
        assert_eq!(count_sequences(&board, Team::Red), 0);
        assert_eq!(count_sequences(&board, Team::Blue), 0);
    }

    #[test]
    fn teams_are_counted_independently() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Red,
            &[(2, 1), (2, 2), (2, 3), (2, 4), (2, 5)],
        );
        occupy(
            &mut board,
            Team::Blue,
            &[(7, 1), (7, 2), (7, 3), (7, 4), (7, 5)],
        );
        assert_eq!(count_sequences(&board, Team::Red), 1);
        assert_eq!(count_sequences(&board, Team::Blue), 1);
        assert_eq!(count_sequences(&board, Team::Green), 0);
    }

    #[test]
    fn repeated_scans_are_deterministic() {
        let mut board = Board::default_board().clone();
        occupy(
            &mut board,
            Team::Red,
            &[(5, 0), (5, 1), (5, 2), (5, 3), (5, 4), (5, 5)],
        );
        let first = count_sequences(&board, Team::Red);
        assert_eq!(count_sequences(&board, Team::Red), first);
    }
}
