//! Application state management for the terminal spreadsheet.
//!
//! This module contains the main application state and mode management for
//! the terminal user interface. All formula work is delegated to the
//! [`Engine`]; the state here is selection, scrolling, dialogs, and input
//! buffers.

use crate::domain::Engine;

/// Represents the current mode of the application.
///
/// The mode determines how key presses are interpreted and which prompt the
/// status bar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Normal navigation mode.
    Normal,
    /// The user is typing an expression into the selected cell.
    Editing,
    /// Help popup is open.
    Help,
    /// Save dialog is open.
    SaveAs,
    /// Load dialog is open.
    LoadFile,
    /// CSV export dialog is open.
    ExportCsv,
    /// CSV import dialog is open.
    ImportCsv,
    /// The user is renaming the table.
    RenameTable,
}

/// Main application state: the engine plus everything the UI needs.
#[derive(Debug)]
pub struct App {
    /// The spreadsheet engine holding the grid.
    pub engine: Engine,
    /// Document name, persisted alongside the cells.
    pub table_name: String,
    /// Currently selected row (zero-based).
    pub selected_row: usize,
    /// Currently selected column (zero-based).
    pub selected_col: usize,
    /// Top-most row visible in the viewport.
    pub scroll_row: usize,
    /// Left-most column visible in the viewport.
    pub scroll_col: usize,
    /// Current application mode.
    pub mode: AppMode,
    /// Input buffer for cell editing.
    pub input: String,
    /// Cursor position within the active input buffer.
    pub cursor_position: usize,
    /// Current filename, once saved or loaded.
    pub filename: Option<String>,
    /// Input buffer for the filename and rename dialogs.
    pub filename_input: String,
    /// Temporary status message shown in the status bar.
    pub status_message: Option<String>,
    /// When true cells show computed values, otherwise raw expressions.
    pub show_values: bool,
    /// Scroll position inside the help popup.
    pub help_scroll: usize,
    /// Viewport height in grid rows, updated by the renderer.
    pub viewport_rows: usize,
    /// Viewport width in grid columns, updated by the renderer.
    pub viewport_cols: usize,
}

impl Default for App {
    fn default() -> Self {
        Self {
            engine: Engine::new(10, 10),
            table_name: "New table".to_string(),
            selected_row: 0,
            selected_col: 0,
            scroll_row: 0,
            scroll_col: 0,
            mode: AppMode::Normal,
            input: String::new(),
            cursor_position: 0,
            filename: None,
            filename_input: String::new(),
            status_message: None,
            show_values: true,
            help_scroll: 0,
            viewport_rows: 20,
            viewport_cols: 8,
        }
    }
}

impl App {
    /// Switches to editing mode for the selected cell, loading its raw
    /// expression into the input buffer.
    pub fn start_editing(&mut self) {
        self.mode = AppMode::Editing;
        self.input = self.engine.cell(self.selected_row, self.selected_col).expression;
        // The cursor counts characters, not bytes, so a multibyte
        // expression starts editable at its end.
        self.cursor_position = self.input.chars().count();
        self.status_message = None;
    }

    /// Commits the input buffer as the selected cell's expression and
    /// triggers the full recompute, then moves the selection down one row.
    pub fn finish_editing(&mut self) {
        self.engine
            .set_cell_expression(self.selected_row, self.selected_col, &self.input);

        let edited = self.engine.cell(self.selected_row, self.selected_col);
        if edited.has_error() {
            self.status_message = Some(edited.error_message());
        }

        if self.selected_row + 1 < self.engine.rows() {
            self.selected_row += 1;
        }

        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Abandons the edit and returns to normal mode.
    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Clears the selected cell's expression.
    pub fn clear_selected_cell(&mut self) {
        self.engine
            .set_cell_expression(self.selected_row, self.selected_col, "");
    }

    /// Flips between showing computed values and raw expressions.
    pub fn toggle_display_mode(&mut self) {
        self.show_values = !self.show_values;
        self.status_message = Some(
            if self.show_values {
                "Showing values".to_string()
            } else {
                "Showing expressions".to_string()
            },
        );
    }

    pub fn add_row(&mut self) {
        self.engine.resize(self.engine.rows() + 1, self.engine.cols());
    }

    pub fn remove_row(&mut self) {
        if self.engine.rows() > 1 {
            self.engine.resize(self.engine.rows() - 1, self.engine.cols());
            self.selected_row = self.selected_row.min(self.engine.rows() - 1);
            self.scroll_row = self.scroll_row.min(self.selected_row);
        }
    }

    pub fn add_column(&mut self) {
        self.engine.resize(self.engine.rows(), self.engine.cols() + 1);
    }

    pub fn remove_column(&mut self) {
        if self.engine.cols() > 1 {
            self.engine.resize(self.engine.rows(), self.engine.cols() - 1);
            self.selected_col = self.selected_col.min(self.engine.cols() - 1);
            self.scroll_col = self.scroll_col.min(self.selected_col);
        }
    }

    /// Replaces the sheet with a blank one of the same dimensions.
    pub fn clear_sheet(&mut self) {
        self.engine = Engine::new(self.engine.rows(), self.engine.cols());
        self.status_message = Some("Sheet cleared".to_string());
    }

    /// Opens the save dialog with the current filename pre-filled.
    pub fn start_save_as(&mut self) {
        self.mode = AppMode::SaveAs;
        self.filename_input = self
            .filename
            .clone()
            .unwrap_or_else(|| "sheet.etab".to_string());
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Opens the load dialog with the current filename pre-filled.
    pub fn start_load_file(&mut self) {
        self.mode = AppMode::LoadFile;
        self.filename_input = self
            .filename
            .clone()
            .unwrap_or_else(|| "sheet.etab".to_string());
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Opens the rename dialog with the current table name pre-filled.
    pub fn start_rename(&mut self) {
        self.mode = AppMode::RenameTable;
        self.filename_input = self.table_name.clone();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Commits the rename dialog.
    pub fn finish_rename(&mut self) {
        if !self.filename_input.trim().is_empty() {
            self.table_name = self.filename_input.trim().to_string();
        }
        self.cancel_prompt();
    }

    /// Closes any dialog without applying it.
    pub fn cancel_prompt(&mut self) {
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn get_save_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "sheet.etab".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn get_load_filename(&self) -> String {
        self.get_save_filename()
    }

    /// Applies the result of a save operation and returns to normal mode.
    pub fn set_save_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(filename) => {
                self.filename = Some(filename.clone());
                self.status_message = Some(format!("Saved to {}", filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Save failed: {}", error));
            }
        }
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Applies the result of a load operation, replacing the engine and
    /// table name on success.
    pub fn set_load_result(&mut self, result: Result<(Engine, String, String), String>) {
        match result {
            Ok((engine, name, filename)) => {
                self.engine = engine;
                self.table_name = name;
                self.filename = Some(filename.clone());
                self.selected_row = 0;
                self.selected_col = 0;
                self.scroll_row = 0;
                self.scroll_col = 0;
                self.status_message = Some(format!("Loaded from {}", filename));
            }
            Err(error) => {
                self.status_message = Some(format!("Load failed: {}", error));
            }
        }
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Opens the CSV export dialog.
    pub fn start_csv_export(&mut self) {
        self.mode = AppMode::ExportCsv;
        self.filename_input = self
            .filename
            .as_ref()
            .map(|f| f.replace(".etab", ".csv"))
            .unwrap_or_else(|| "sheet.csv".to_string());
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    /// Opens the CSV import dialog.
    pub fn start_csv_import(&mut self) {
        self.mode = AppMode::ImportCsv;
        self.filename_input = "data.csv".to_string();
        self.cursor_position = self.filename_input.chars().count();
        self.status_message = None;
    }

    pub fn get_csv_filename(&self) -> String {
        if self.filename_input.is_empty() {
            "sheet.csv".to_string()
        } else {
            self.filename_input.clone()
        }
    }

    pub fn set_csv_export_result(&mut self, result: Result<String, String>) {
        self.status_message = Some(match result {
            Ok(filename) => format!("Exported to {}", filename),
            Err(error) => format!("Export failed: {}", error),
        });
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    pub fn set_csv_import_result(&mut self, result: Result<Engine, String>) {
        match result {
            Ok(engine) => {
                self.engine = engine;
                self.selected_row = 0;
                self.selected_col = 0;
                self.scroll_row = 0;
                self.scroll_col = 0;
                self.status_message = Some("CSV imported".to_string());
            }
            Err(error) => {
                self.status_message = Some(format!("Import failed: {}", error));
            }
        }
        self.mode = AppMode::Normal;
        self.filename_input.clear();
        self.cursor_position = 0;
    }

    /// Keeps the selection inside the visible viewport by adjusting the
    /// scroll offsets.
    pub fn ensure_cursor_visible(&mut self) {
        if self.selected_row < self.scroll_row {
            self.scroll_row = self.selected_row;
        }
        if self.selected_row >= self.scroll_row + self.viewport_rows {
            self.scroll_row = self.selected_row + 1 - self.viewport_rows;
        }
        if self.selected_col < self.scroll_col {
            self.scroll_col = self.selected_col;
        }
        if self.selected_col >= self.scroll_col + self.viewport_cols {
            self.scroll_col = self.selected_col + 1 - self.viewport_cols;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let app = App::default();
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.selected_col, 0);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.engine.rows(), 10);
        assert_eq!(app.engine.cols(), 10);
        assert!(app.show_values);
    }

    #[test]
    fn test_editing_round_trip() {
        let mut app = App::default();
        app.start_editing();
        assert_eq!(app.mode, AppMode::Editing);
        app.input = "2+3".to_string();
        app.finish_editing();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.engine.cell(0, 0).display, "5");
        // The selection moved down one row.
        assert_eq!(app.selected_row, 1);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_editing_loads_expression_not_display() {
        let mut app = App::default();
        app.engine.set_cell_expression(0, 0, "2+3");
        app.start_editing();
        assert_eq!(app.input, "2+3");
        app.cancel_editing();
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_finish_editing_reports_errors() {
        let mut app = App::default();
        app.start_editing();
        app.input = "1/0".to_string();
        app.finish_editing();
        assert_eq!(app.status_message.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_row_and_column_resizing() {
        let mut app = App::default();
        app.add_row();
        app.add_column();
        assert_eq!(app.engine.rows(), 11);
        assert_eq!(app.engine.cols(), 11);

        app.remove_row();
        app.remove_column();
        assert_eq!(app.engine.rows(), 10);
        assert_eq!(app.engine.cols(), 10);
    }

    #[test]
    fn test_remove_row_clamps_selection() {
        let mut app = App::default();
        app.selected_row = 9;
        app.remove_row();
        assert_eq!(app.selected_row, 8);
    }

    #[test]
    fn test_remove_never_drops_below_one() {
        let mut app = App::default();
        for _ in 0..20 {
            app.remove_row();
            app.remove_column();
        }
        assert_eq!(app.engine.rows(), 1);
        assert_eq!(app.engine.cols(), 1);
    }

    #[test]
    fn test_clear_sheet_keeps_dimensions() {
        let mut app = App::default();
        app.engine.set_cell_expression(0, 0, "7");
        app.clear_sheet();
        assert!(app.engine.cell(0, 0).is_blank());
        assert_eq!(app.engine.rows(), 10);
    }

    #[test]
    fn test_rename_dialog() {
        let mut app = App::default();
        app.start_rename();
        assert_eq!(app.mode, AppMode::RenameTable);
        assert_eq!(app.filename_input, "New table");

        app.filename_input = "Budget".to_string();
        app.finish_rename();
        assert_eq!(app.table_name, "Budget");
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_rename_rejects_blank() {
        let mut app = App::default();
        app.start_rename();
        app.filename_input = "   ".to_string();
        app.finish_rename();
        assert_eq!(app.table_name, "New table");
    }

    #[test]
    fn test_save_dialog_filenames() {
        let mut app = App::default();
        app.start_save_as();
        assert_eq!(app.mode, AppMode::SaveAs);
        assert_eq!(app.get_save_filename(), "sheet.etab");

        app.filename_input = "budget.etab".to_string();
        assert_eq!(app.get_save_filename(), "budget.etab");

        app.set_save_result(Ok("budget.etab".to_string()));
        assert_eq!(app.filename.as_deref(), Some("budget.etab"));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.status_message.as_deref(), Some("Saved to budget.etab"));
    }

    #[test]
    fn test_load_failure_keeps_engine() {
        let mut app = App::default();
        app.engine.set_cell_expression(0, 0, "1");
        app.start_load_file();
        app.set_load_result(Err("no such file".to_string()));

        assert_eq!(app.engine.cell(0, 0).display, "1");
        assert_eq!(app.status_message.as_deref(), Some("Load failed: no such file"));
    }

    #[test]
    fn test_csv_export_dialog_derives_filename() {
        let mut app = App::default();
        app.filename = Some("budget.etab".to_string());
        app.start_csv_export();
        assert_eq!(app.filename_input, "budget.csv");
    }

    #[test]
    fn test_ensure_cursor_visible_scrolls() {
        let mut app = App::default();
        app.viewport_rows = 5;
        app.viewport_cols = 3;

        app.selected_row = 7;
        app.selected_col = 4;
        app.ensure_cursor_visible();
        assert_eq!(app.scroll_row, 3);
        assert_eq!(app.scroll_col, 2);

        app.selected_row = 0;
        app.selected_col = 0;
        app.ensure_cursor_visible();
        assert_eq!(app.scroll_row, 0);
        assert_eq!(app.scroll_col, 0);
    }
}
