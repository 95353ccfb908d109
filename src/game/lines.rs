//! 落子类游戏的胜负判定。

use once_cell::sync::Lazy;
use std::borrow::Cow;

use super::grid::{Grid, Position};
use super::state::{GameStatus, Player};

pub type Line = Vec<Position>;

/// 横、竖、主对角线、副对角线。
const ORIENTATIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

static TIC_TAC_TOE_LINES: Lazy<Vec<Line>> = Lazy::new(|| winning_lines(3, 3, 3));
static CONNECT_FOUR_LINES: Lazy<Vec<Line>> = Lazy::new(|| winning_lines(6, 7, 4));

/// 枚举 `rows × cols` 网格内所有长度为 `run` 的直线。
pub fn winning_lines(rows: usize, cols: usize, run: usize) -> Vec<Line> {
    let mut lines = Vec::new();
    if run == 0 {
        return lines;
    }
    let span = run as isize - 1;

    for (dr, dc) in ORIENTATIONS {
        for row in 0..rows as isize {
            for col in 0..cols as isize {
                let end_row = row + dr * span;
                let end_col = col + dc * span;
                if end_row < 0 || end_row >= rows as isize || end_col < 0 || end_col >= cols as isize
                {
                    continue;
                }
                let line = (0..run as isize)
                    .map(|k| Position::new((row + dr * k) as usize, (col + dc * k) as usize))
                    .collect();
                lines.push(line);
            }
        }
    }

    lines
}

/// 标准尺寸直接复用缓存，其余尺寸现算。
pub fn lines_for(rows: usize, cols: usize, run: usize) -> Cow<'static, [Line]> {
    match (rows, cols, run) {
        (3, 3, 3) => Cow::Borrowed(TIC_TAC_TOE_LINES.as_slice()),
        (6, 7, 4) => Cow::Borrowed(CONNECT_FOUR_LINES.as_slice()),
        _ => Cow::Owned(winning_lines(rows, cols, run)),
    }
}

/// 纯函数：只看网格本身。
///
/// 任一直线上的格子全部非空且相同即获胜；没有获胜线且网格已满为平局；
/// 否则对局继续。
pub fn evaluate_placement<T>(grid: &Grid<Option<T>>, run: usize) -> GameStatus
where
    T: Copy + Eq + Into<Player>,
{
    for line in lines_for(grid.rows(), grid.cols(), run).iter() {
        if let Some(winner) = line_owner(grid, line) {
            return GameStatus::Won {
                winner: Some(winner.into()),
                line: line.clone(),
            };
        }
    }

    if grid.is_full() {
        GameStatus::Drawn
    } else {
        GameStatus::Ongoing
    }
}

fn line_owner<T: Copy + Eq>(grid: &Grid<Option<T>>, line: &[Position]) -> Option<T> {
    let (first, rest) = line.split_first()?;
    let owner = grid.get(*first).flatten()?;
    rest.iter()
        .all(|pos| grid.get(*pos).flatten() == Some(owner))
        .then_some(owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Disc, Mark};

    #[test]
    fn standard_shapes_have_expected_line_counts() {
        assert_eq!(lines_for(3, 3, 3).len(), 8);
        // 24 横 + 21 竖 + 12 + 12 斜
        assert_eq!(lines_for(6, 7, 4).len(), 69);
        assert!(lines_for(2, 2, 3).is_empty());
    }

    #[test]
    fn full_board_with_a_line_is_a_win_not_a_draw() {
        use Mark::{O, X};
        let cells = vec![
            Some(X), Some(X), Some(X),
            Some(O), Some(O), Some(X),
            Some(X), Some(O), Some(O),
        ];
        let grid = Grid::from_cells(3, 3, cells).expect("nine cells");
        let status = evaluate_placement(&grid, 3);
        assert_eq!(
            status,
            GameStatus::Won {
                winner: Some(Player::First),
                line: vec![Position::new(0, 0), Position::new(0, 1), Position::new(0, 2)],
            }
        );
    }

    #[test]
    fn full_board_without_line_is_draw() {
        use Mark::{O, X};
        let cells = vec![
            Some(X), Some(O), Some(X),
            Some(X), Some(O), Some(O),
            Some(O), Some(X), Some(X),
        ];
        let grid = Grid::from_cells(3, 3, cells).expect("nine cells");
        assert_eq!(evaluate_placement(&grid, 3), GameStatus::Drawn);
    }

    #[test]
    fn detects_both_diagonal_orientations() {
        let rising = Grid::new(6, 7)
            .with(Position::new(5, 0), Some(Disc::Yellow))
            .with(Position::new(4, 1), Some(Disc::Yellow))
            .with(Position::new(3, 2), Some(Disc::Yellow))
            .with(Position::new(2, 3), Some(Disc::Yellow));
        assert_eq!(evaluate_placement(&rising, 4).winner(), Some(Player::Second));

        let falling = Grid::new(6, 7)
            .with(Position::new(2, 3), Some(Disc::Red))
            .with(Position::new(3, 4), Some(Disc::Red))
            .with(Position::new(4, 5), Some(Disc::Red))
            .with(Position::new(5, 6), Some(Disc::Red));
        assert_eq!(evaluate_placement(&falling, 4).winner(), Some(Player::First));
    }

    #[test]
    fn mixed_line_does_not_win() {
        let grid = Grid::new(6, 7)
            .with(Position::new(5, 0), Some(Disc::Red))
            .with(Position::new(5, 1), Some(Disc::Red))
            .with(Position::new(5, 2), Some(Disc::Yellow))
            .with(Position::new(5, 3), Some(Disc::Red));
        assert_eq!(evaluate_placement(&grid, 4), GameStatus::Ongoing);
    }
}
