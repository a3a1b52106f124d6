//! Core data types for the spreadsheet engine.
//!
//! This module defines the dynamically typed [`Value`] produced by formula
//! evaluation, the per-cell record stored in the grid, and the [`Grid`]
//! itself: a fixed-size row-major array of cells that is only ever replaced
//! wholesale by a resize.

use super::errors::EngineError;

/// Tolerance used for numeric equality and for the boolean coercion of
/// numbers. Division also refuses divisors below this magnitude.
pub const EPSILON: f64 = 1e-10;

/// The result of evaluating a (sub)expression.
///
/// Booleans are first-class until an operator coerces them: arithmetic
/// coerces `true` to 1 and `false` to 0, logic treats any number within
/// [`EPSILON`] of zero as false.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
}

impl Value {
    /// Total coercion to a number.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
        }
    }

    /// Total coercion to a boolean.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Number(n) => n.abs() >= EPSILON,
            Value::Boolean(b) => *b,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
        }
    }
}

/// One slot of the grid.
///
/// A cell is identified by its position; it is created blank and never
/// destroyed individually. `value` is the cached result of the most recent
/// successful evaluation and is absent while the cell is errored, blank, or
/// invalidated by a later edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    /// The raw expression text as the user entered it.
    pub expression: String,
    /// What the grid shows for this cell: a value rendering or an error
    /// marker.
    pub display: String,
    /// The failure that produced the current display, if any.
    pub error: Option<EngineError>,
    /// Cached computed value, present only after a successful evaluation.
    pub value: Option<Value>,
}

impl Cell {
    /// The synthetic cell handed out for out-of-range lookups.
    pub fn reference_error() -> Self {
        Cell {
            display: super::engine::REF_MARKER.to_string(),
            error: Some(EngineError::eval("reference out of range")),
            ..Cell::default()
        }
    }

    /// Whether the cell holds any expression text at all.
    pub fn is_blank(&self) -> bool {
        self.expression.trim().is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The stored failure rendered as text, or the empty string.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

/// A rectangular array of cells, at least 1x1, stored row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    rows: usize,
    cols: usize,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Grid {
            cells: vec![Cell::default(); rows * cols],
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.contains(row, col)
            .then(|| &self.cells[row * self.cols + col])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.contains(row, col)
            .then(|| &mut self.cells[row * self.cols + col])
    }

    /// Replaces the grid with one of the new dimensions, carrying over the
    /// full state of every cell in the overlapping top-left rectangle.
    /// Cells outside the overlap are fresh blanks.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) {
        let new_rows = new_rows.max(1);
        let new_cols = new_cols.max(1);
        let mut next = Grid::new(new_rows, new_cols);

        let copy_rows = self.rows.min(new_rows);
        let copy_cols = self.cols.min(new_cols);
        for row in 0..copy_rows {
            for col in 0..copy_cols {
                next.cells[row * new_cols + col] = self.cells[row * self.cols + col].clone();
            }
        }

        *self = next;
    }

    /// Formats a zero-based position as an "A1"-style reference.
    pub fn cell_reference(row: usize, col: usize) -> String {
        format!("{}{}", Self::column_label(col), row + 1)
    }

    /// Converts a zero-based column index to its letter code (A, B, .., Z,
    /// AA, AB, ..).
    pub fn column_label(col: usize) -> String {
        let mut label = String::new();
        let mut c = col;
        loop {
            label.insert(0, char::from(b'A' + (c % 26) as u8));
            if c < 26 {
                break;
            }
            c = c / 26 - 1;
        }
        label
    }

    /// Parses an "A1"-style reference into a zero-based (row, col) pair.
    ///
    /// The column letters form a base-26 code with A=1; the digits are a
    /// 1-based row number. Case-insensitive. Returns `None` for anything
    /// that is not letters followed by digits, for row 0, or for a column
    /// or row number too large for `usize`.
    pub fn parse_cell_reference(reference: &str) -> Option<(usize, usize)> {
        if reference.is_empty() {
            return None;
        }

        let mut chars = reference.chars().peekable();
        let mut col_code: usize = 0;
        let mut saw_letter = false;

        while let Some(&ch) = chars.peek() {
            if !ch.is_ascii_alphabetic() {
                break;
            }
            let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
            col_code = col_code.checked_mul(26)?.checked_add(digit)?;
            saw_letter = true;
            chars.next();
        }

        if !saw_letter {
            return None;
        }

        let row_digits: String = chars.collect();
        if row_digits.is_empty() || !row_digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let row = row_digits.parse::<usize>().ok()?.checked_sub(1)?;
        Some((row, col_code - 1))
    }
}
