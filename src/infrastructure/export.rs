//! CSV export and import.
//!
//! Export writes the computed display values, so the CSV is a snapshot of
//! what the grid shows (formulas are not preserved). Import goes the other
//! way: every non-empty field becomes a cell expression in a fresh engine.

use crate::domain::Engine;

pub struct CsvExporter;

impl CsvExporter {
    /// Writes the whole grid's display values to `filename`.
    pub fn export(engine: &Engine, filename: &str) -> Result<String, String> {
        let mut writer = csv::Writer::from_path(filename).map_err(|e| e.to_string())?;

        for row in 0..engine.rows() {
            let record: Vec<String> = (0..engine.cols())
                .map(|col| engine.cell(row, col).display)
                .collect();
            writer.write_record(&record).map_err(|e| e.to_string())?;
        }

        writer.flush().map_err(|e| e.to_string())?;
        Ok(filename.to_string())
    }

    /// Builds an engine from a CSV file, treating each field as an
    /// expression. The grid is sized to fit the widest row.
    pub fn import(filename: &str) -> Result<Engine, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(filename)
            .map_err(|e| e.to_string())?;

        let mut records = Vec::new();
        for result in reader.records() {
            records.push(result.map_err(|e| e.to_string())?);
        }

        if records.is_empty() {
            return Err("CSV file is empty".to_string());
        }

        let rows = records.len();
        let cols = records.iter().map(|r| r.len()).max().unwrap_or(1).max(1);

        let mut engine = Engine::new(rows, cols);
        for (row, record) in records.iter().enumerate() {
            for (col, field) in record.iter().enumerate() {
                if !field.trim().is_empty() {
                    engine.set_cell_expression(row, col, field);
                }
            }
        }

        Ok(engine)
    }
}
