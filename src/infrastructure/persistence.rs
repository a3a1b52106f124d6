//! JSON persistence for spreadsheet documents.
//!
//! The saved form is deliberately small: the table name, the grid
//! dimensions, and one `(row, col, expression)` record per non-blank cell.
//! Loading replays each expression through the engine in file order, so the
//! computed state is rebuilt rather than stored.

use std::fs;

use serde::{Deserialize, Serialize};

use crate::domain::Engine;

/// One persisted cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    pub expression: String,
}

/// The persisted form of a whole sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDocument {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<CellRecord>,
}

impl SheetDocument {
    /// Captures every non-blank cell of the engine, row-major.
    pub fn from_engine(engine: &Engine, name: &str) -> Self {
        let mut cells = Vec::new();
        for row in 0..engine.rows() {
            for col in 0..engine.cols() {
                let cell = engine.cell(row, col);
                if !cell.is_blank() {
                    cells.push(CellRecord {
                        row,
                        col,
                        expression: cell.expression,
                    });
                }
            }
        }

        SheetDocument {
            name: name.to_string(),
            rows: engine.rows(),
            cols: engine.cols(),
            cells,
        }
    }

    /// Rebuilds an engine by replaying every record in order.
    pub fn into_engine(self) -> (Engine, String) {
        let mut engine = Engine::new(self.rows, self.cols);
        for record in &self.cells {
            engine.set_cell_expression(record.row, record.col, &record.expression);
        }
        (engine, self.name)
    }
}

pub struct FileRepository;

impl FileRepository {
    /// Serializes the sheet to pretty JSON at `filename`.
    pub fn save(engine: &Engine, name: &str, filename: &str) -> Result<String, String> {
        let document = SheetDocument::from_engine(engine, name);
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| format!("Serialization failed: {}", e))?;
        fs::write(filename, json).map_err(|e| e.to_string())?;
        Ok(filename.to_string())
    }

    /// Reads a sheet document and rebuilds its engine.
    pub fn load(filename: &str) -> Result<(Engine, String, String), String> {
        let content = fs::read_to_string(filename).map_err(|e| e.to_string())?;
        let document: SheetDocument = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid file format - {}", e))?;
        let (engine, name) = document.into_engine();
        Ok((engine, name, filename.to_string()))
    }
}
