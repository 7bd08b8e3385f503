//! Cell coordinates and ranges in A1 notation.
//!
//! # Responsibility
//! - Parse and render `A1`-style references and `A1:B3`-style ranges.
//! - Expand ranges into their constituent coordinates.
//!
//! # Invariants
//! - Rows and columns are 1-based; `A` is column 1.
//! - Ranges are stored normalized: `start` is the top-left corner.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CELL_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{1,3})([0-9]{1,7})$").expect("valid cell ref regex"));

/// Largest range a formula may reference. The reference grammar admits
/// rectangles far beyond anything a sheet holds (`A1:ZZZ9999999` covers
/// ~10^11 cells); expanding one into a dependency set would exhaust memory,
/// so ranges above this cap are rejected at parse time.
pub const MAX_RANGE_CELLS: u64 = 65_536;

/// One cell position, 1-based in both axes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses an `A1`-style reference, case-insensitive.
    pub fn parse(text: &str) -> Result<Self, CoordParseError> {
        let captures = CELL_REF_RE
            .captures(text.trim())
            .ok_or_else(|| CoordParseError::InvalidReference(text.to_string()))?;
        let letters = captures.get(1).expect("letters group").as_str();
        let digits = captures.get(2).expect("digits group").as_str();

        let col = letters
            .chars()
            .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1));
        let row: u32 = digits
            .parse()
            .map_err(|_| CoordParseError::InvalidReference(text.to_string()))?;
        if row == 0 {
            return Err(CoordParseError::InvalidReference(text.to_string()));
        }
        Ok(Self { row, col })
    }

    /// Renders the column letters for a 1-based column index.
    pub fn col_letters(col: u32) -> String {
        let mut col = col;
        let mut letters = String::new();
        while col > 0 {
            col -= 1;
            letters.push(((col % 26) as u8 + b'A') as char);
            col /= 26;
        }
        letters.chars().rev().collect()
    }
}

impl Display for CellCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::col_letters(self.col), self.row)
    }
}

/// A rectangular, normalized cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// Creates a range, normalizing corner order.
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        Self {
            start: CellCoord::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellCoord::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parses an `A1:B3`-style range.
    pub fn parse(text: &str) -> Result<Self, CoordParseError> {
        let (left, right) = text
            .split_once(':')
            .ok_or_else(|| CoordParseError::InvalidRange(text.to_string()))?;
        Ok(Self::new(CellCoord::parse(left)?, CellCoord::parse(right)?))
    }

    /// Number of cells covered by the range.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.end.row - self.start.row + 1) * u64::from(self.end.col - self.start.col + 1)
    }

    /// Iterates all coordinates row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let cols = self.start.col..=self.end.col;
        (self.start.row..=self.end.row)
            .flat_map(move |row| cols.clone().map(move |col| CellCoord::new(row, col)))
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Reference parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    InvalidReference(String),
    InvalidRange(String),
}

impl Display for CoordParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference(value) => write!(f, "invalid cell reference: `{value}`"),
            Self::InvalidRange(value) => write!(f, "invalid cell range: `{value}`"),
        }
    }
}

impl Error for CoordParseError {}
