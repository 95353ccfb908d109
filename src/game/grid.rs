use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 网格坐标，第 0 行位于顶部。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }

    /// 在 `rows × cols` 范围内沿方向移动一步；越界时返回 `None`。
    pub fn step_within(self, direction: Direction, rows: usize, cols: usize) -> Option<Position> {
        let (dr, dc) = direction.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < rows && col < cols).then_some(Position::new(row, col))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "arrowup" | "w" => Ok(Direction::Up),
            "down" | "arrowdown" | "s" => Ok(Direction::Down),
            "left" | "arrowleft" | "a" => Ok(Direction::Left),
            "right" | "arrowright" | "d" => Ok(Direction::Right),
            _ => Err(()),
        }
    }
}

/// 固定尺寸的二维网格，按行优先存储。
///
/// 创建后尺寸不再变化；提交一步棋时通过 [`Grid::with`] 生成新的网格，
/// 旧快照因此可以原样保留在历史记录中。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![T::default(); rows * cols],
        }
    }
}

impl<T: Copy> Grid<T> {
    /// 从行优先的单元格序列构建网格；长度不匹配时返回 `None`。
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<T>) -> Option<Self> {
        if cells.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn index_of(&self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    pub fn position_of(&self, index: usize) -> Option<Position> {
        (index < self.cells.len()).then(|| Position::new(index / self.cols, index % self.cols))
    }

    pub fn get(&self, pos: Position) -> Option<T> {
        self.index_of(pos).map(|idx| self.cells[idx])
    }

    pub fn set(&mut self, pos: Position, value: T) -> bool {
        match self.index_of(pos) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// 返回写入一个单元格后的新网格，原网格保持不变。
    pub fn with(&self, pos: Position, value: T) -> Self {
        let mut next = self.clone();
        next.set(pos, value);
        next
    }

    pub fn step(&self, from: Position, direction: Direction) -> Option<Position> {
        from.step_within(direction, self.rows, self.cols)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }
}

impl<T: Copy> Grid<Option<T>> {
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// 某列自底向上第一个空位所在的行。
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        (0..self.rows)
            .rev()
            .find(|&row| self.cells[row * self.cols + col].is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stops_at_edges() {
        let grid: Grid<Option<u8>> = Grid::new(3, 4);
        assert_eq!(grid.step(Position::new(0, 0), Direction::Up), None);
        assert_eq!(grid.step(Position::new(0, 0), Direction::Left), None);
        assert_eq!(grid.step(Position::new(2, 3), Direction::Down), None);
        assert_eq!(grid.step(Position::new(2, 3), Direction::Right), None);
        assert_eq!(
            grid.step(Position::new(1, 1), Direction::Right),
            Some(Position::new(1, 2))
        );
    }

    #[test]
    fn with_leaves_original_untouched() {
        let empty: Grid<Option<u8>> = Grid::new(3, 3);
        let next = empty.with(Position::new(1, 1), Some(7));
        assert_eq!(empty.occupied(), 0, "snapshot should not change");
        assert_eq!(next.get(Position::new(1, 1)), Some(Some(7)));
        assert_eq!(next.rows(), 3);
        assert_eq!(next.cols(), 3);
    }

    #[test]
    fn lowest_empty_row_fills_bottom_up() {
        let mut grid: Grid<Option<u8>> = Grid::new(2, 2);
        assert_eq!(grid.lowest_empty_row(0), Some(1));
        grid.set(Position::new(1, 0), Some(1));
        assert_eq!(grid.lowest_empty_row(0), Some(0));
        grid.set(Position::new(0, 0), Some(1));
        assert_eq!(grid.lowest_empty_row(0), None);
        assert_eq!(grid.lowest_empty_row(5), None);
    }

    #[test]
    fn direction_parses_key_names() {
        assert_eq!("ArrowUp".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("LEFT".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("d".parse::<Direction>(), Ok(Direction::Right));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
