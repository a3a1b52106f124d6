//! Whole-grid recalculation engine.
//!
//! The engine owns the grid and re-evaluates every cell, in row-major
//! order, after any single edit. There is no dependency graph: the cost of
//! an edit is always O(rows x cols), which keeps the semantics trivially
//! predictable and is exactly what the tests assert on. Cycles are caught
//! during resolution with a guard set of the references currently on the
//! evaluation stack.
//!
//! # Examples
//!
//! ```
//! use etab::domain::Engine;
//!
//! let mut engine = Engine::new(10, 10);
//! engine.set_cell_expression(0, 0, "10");
//! engine.set_cell_expression(0, 1, "5");
//! engine.set_cell_expression(0, 2, "A1 > B1");
//!
//! assert_eq!(engine.cell(0, 2).display, "True");
//!
//! engine.set_cell_expression(0, 1, "20");
//! assert_eq!(engine.cell(0, 2).display, "False");
//! ```

use std::collections::HashSet;

use super::errors::{EngineError, EngineResult};
use super::models::{Cell, Grid, Value};
use super::parser::Parser;

/// Display marker for any non-cycle evaluation failure.
pub const ERROR_MARKER: &str = "#ERROR";
/// Display marker for a detected cyclic reference.
pub const CYCLE_MARKER: &str = "#CYCLE!";
/// Display marker on the synthetic cell returned for out-of-range lookups.
pub const REF_MARKER: &str = "#REF!";

/// The spreadsheet engine: grid storage plus full recalculation.
#[derive(Debug, Clone)]
pub struct Engine {
    grid: Grid,
}

impl Engine {
    /// Creates an engine with an all-blank grid. Dimensions are clamped to
    /// at least 1x1.
    pub fn new(rows: usize, cols: usize) -> Self {
        Engine {
            grid: Grid::new(rows, cols),
        }
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    /// Returns a snapshot of the cell at the given position.
    ///
    /// Out-of-range positions yield a synthetic `#REF!` error cell rather
    /// than a failure, so display code never has to bounds-check.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        match self.grid.get(row, col) {
            Some(cell) => cell.clone(),
            None => Cell::reference_error(),
        }
    }

    /// Stores an expression and recomputes the whole grid.
    ///
    /// Out-of-range positions are a silent no-op. Every cached value is
    /// invalidated and every cell re-evaluated, whether or not it depends
    /// on the edited one. Error flags are left in place until each cell's
    /// own evaluation runs, so an errored dependency still shades its
    /// dependents during the pass.
    pub fn set_cell_expression(&mut self, row: usize, col: usize, expression: &str) {
        let Some(cell) = self.grid.get_mut(row, col) else {
            return;
        };
        cell.expression = expression.to_string();

        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                self.grid.get_mut(row, col).unwrap().value = None;
            }
        }

        self.recompute();
    }

    /// Reshapes the grid, keeping the top-left overlap, then re-evaluates
    /// every non-blank cell in row-major order.
    ///
    /// Unlike an edit, the resize does not invalidate carried-over caches
    /// first, so references between surviving cells resolve against their
    /// existing values. References that now point outside the grid fail.
    pub fn resize(&mut self, new_rows: usize, new_cols: usize) {
        self.grid.resize(new_rows, new_cols);

        let mut guard = HashSet::new();
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                if !self.grid.get(row, col).unwrap().is_blank() {
                    self.evaluate_cell(row, col, &mut guard);
                }
            }
        }
        debug_assert!(guard.is_empty());
    }

    /// One full row-major evaluation pass over every cell.
    fn recompute(&mut self) {
        let mut guard = HashSet::new();
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                self.evaluate_cell(row, col, &mut guard);
            }
        }
        // The guard must drain with the stack; anything left over would
        // poison cycle detection on a later pass.
        debug_assert!(guard.is_empty());
    }

    /// Evaluates one cell and records the outcome on it.
    ///
    /// The cell's own reference sits in `guard` for the duration of the
    /// parse; re-entering a guarded cell through `cell_value` is how a
    /// cycle surfaces.
    fn evaluate_cell(&mut self, row: usize, col: usize, guard: &mut HashSet<String>) {
        let reference = Grid::cell_reference(row, col);
        let expression = self.grid.get(row, col).unwrap().expression.clone();

        if expression.trim().is_empty() {
            let cell = self.grid.get_mut(row, col).unwrap();
            cell.display = String::new();
            cell.error = None;
            cell.value = None;
            return;
        }

        if guard.contains(&reference) {
            self.record_outcome(row, col, Err(EngineError::Cycle));
            return;
        }

        guard.insert(reference.clone());
        let result = Parser::evaluate(&expression, self, guard);
        guard.remove(&reference);

        self.record_outcome(row, col, result);
    }

    fn record_outcome(&mut self, row: usize, col: usize, result: EngineResult<Value>) {
        let cell = self.grid.get_mut(row, col).unwrap();
        match result {
            Ok(value) => {
                cell.display = value.to_string();
                cell.value = Some(value);
                cell.error = None;
            }
            Err(error) => {
                cell.display = if error.is_cycle() {
                    CYCLE_MARKER.to_string()
                } else {
                    ERROR_MARKER.to_string()
                };
                cell.error = Some(error);
                cell.value = None;
            }
        }
    }

    /// Resolves a referenced cell to its effective value.
    ///
    /// Called by the parser for every cell-reference token. A stored error
    /// propagates to the referencing cell (cycles keep their kind, anything
    /// else is wrapped); an uncached non-blank cell is evaluated on demand
    /// under the same guard; a blank cell reads as zero.
    pub(crate) fn cell_value(
        &mut self,
        row: usize,
        col: usize,
        guard: &mut HashSet<String>,
    ) -> EngineResult<Value> {
        if !self.grid.contains(row, col) {
            return Err(EngineError::eval("reference out of range"));
        }

        if let Some(error) = self.stored_error(row, col) {
            return Err(error);
        }

        let needs_evaluation = {
            let cell = self.grid.get(row, col).unwrap();
            cell.value.is_none() && !cell.is_blank()
        };
        if needs_evaluation {
            self.evaluate_cell(row, col, guard);
            if let Some(error) = self.stored_error(row, col) {
                return Err(error);
            }
        }

        let cell = self.grid.get(row, col).unwrap();
        Ok(cell.value.clone().unwrap_or(Value::Number(0.0)))
    }

    /// The error to propagate for a cell in an error state, if any.
    fn stored_error(&self, row: usize, col: usize) -> Option<EngineError> {
        let cell = self.grid.get(row, col)?;
        let error = cell.error.as_ref()?;
        Some(if error.is_cycle() {
            EngineError::Cycle
        } else {
            EngineError::eval(format!(
                "cell {} contains an error: {}",
                Grid::cell_reference(row, col),
                error
            ))
        })
    }
}
