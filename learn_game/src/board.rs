use crate::error::MoveError;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::Serialize;
use std::{fmt, str::FromStr};

pub const SIZE: usize = 3;

/// `(row, column)`, both in `0..SIZE`.
pub type Position = (usize, usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Cross,
    Nought,
}

/// The two marks. `Cross` always makes the first move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    Cross,
    Nought,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Symbol),
    Draw,
    InProgress,
}

/// Row-major flattening of the nine cells, e.g. `"XO--X---O"`.
///
/// Boards are not reduced by symmetry: a rotated position has its own key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BoardKey(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Array2<Cell>,
    active: Symbol,
}

impl Cell {
    /// Signed value used by the line sums: `+1` for a cross, `-1` for a nought.
    fn value(self) -> i32 {
        match self {
            Self::Empty => 0,
            Self::Cross => 1,
            Self::Nought => -1,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Empty => '-',
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Empty),
            'X' => Some(Self::Cross),
            'O' => Some(Self::Nought),
            _ => None,
        }
    }
    fn token(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Cross => 'x',
            Self::Nought => 'o',
        }
    }
}

impl Symbol {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Self::Nought,
            Self::Nought => Self::Cross,
        }
    }
    pub fn cell(self) -> Cell {
        match self {
            Self::Cross => Cell::Cross,
            Self::Nought => Cell::Nought,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.cell().as_char())
    }
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl BoardKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BoardKey {
    type Err = crate::error::PolicyLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().count() == SIZE * SIZE && s.chars().all(|c| Cell::from_char(c).is_some()) {
            Ok(BoardKey(s.to_owned()))
        } else {
            Err(crate::error::PolicyLoadError::InvalidKey(s.to_owned()))
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            cells: Array2::from_elem((SIZE, SIZE), Cell::Empty),
            active: Symbol::Cross,
        }
    }

    /// Builds a board from explicit rows. The side to move is derived from
    /// the piece counts: cross when both sides have placed equally often.
    pub fn from_cells(rows: [[Cell; SIZE]; SIZE]) -> Self {
        let cells = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| rows[r][c]);
        let crosses = cells.iter().filter(|&&c| c == Cell::Cross).count();
        let noughts = cells.iter().filter(|&&c| c == Cell::Nought).count();
        let active = if crosses > noughts {
            Symbol::Nought
        } else {
            Symbol::Cross
        };
        Board { cells, active }
    }

    pub fn cell(&self, (row, col): Position) -> Option<Cell> {
        self.cells.get([row, col]).copied()
    }

    /// The symbol that the next `apply_move` will place.
    pub fn active_symbol(&self) -> Symbol {
        self.active
    }

    /// Empty cells in row-major order.
    pub fn available_positions(&self) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|(_index, &cell)| cell == Cell::Empty)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Cell::Empty)
    }

    /// Places the active symbol at `position` and hands the turn over.
    pub fn apply_move(&mut self, (row, col): Position) -> Result<(), MoveError> {
        match self.cells.get_mut([row, col]) {
            None => Err(MoveError::OutOfRange((row, col))),
            Some(cell) if *cell != Cell::Empty => Err(MoveError::Occupied((row, col))),
            Some(cell) => {
                *cell = self.active.cell();
                self.active = self.active.other();
                Ok(())
            }
        }
    }

    pub fn key(&self) -> BoardKey {
        BoardKey(self.cells.iter().map(|cell| cell.as_char()).collect())
    }

    /// Key of the board that would result from placing `symbol` at
    /// `position`. The board itself is left untouched.
    pub fn key_after(&self, position: Position, symbol: Symbol) -> BoardKey {
        BoardKey(
            self.cells
                .indexed_iter()
                .map(|(index, &cell)| {
                    if index == position {
                        symbol.cell().as_char()
                    } else {
                        cell.as_char()
                    }
                })
                .collect(),
        )
    }

    pub fn evaluate_outcome(&self) -> Outcome {
        let full_line = SIZE as i32;
        let values = self.cells.mapv(Cell::value);

        let rows = values.sum_axis(Axis(1));
        let columns = values.sum_axis(Axis(0));
        for &sum in rows.iter().chain(columns.iter()) {
            if sum == full_line {
                return Outcome::Win(Symbol::Cross);
            }
            if sum == -full_line {
                return Outcome::Win(Symbol::Nought);
            }
        }

        let main = values.diag().sum();
        let anti = values.slice(s![.., ..;-1]).diag().sum();
        if main.abs().max(anti.abs()) == full_line {
            return if main == full_line || anti == full_line {
                Outcome::Win(Symbol::Cross)
            } else {
                Outcome::Win(Symbol::Nought)
            };
        }

        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    pub fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
        self.active = Symbol::Cross;
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const RULE: &str = "-------------";
        for row in self.cells.rows() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "| {} |", row.iter().map(|cell| cell.token()).join(" | "))?;
        }
        write!(f, "{RULE}")
    }
}
