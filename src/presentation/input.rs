//! Keyboard input handling.

use crate::application::{App, AppMode};
use crate::infrastructure::{CsvExporter, FileRepository};
use crossterm::event::{KeyCode, KeyModifiers};

/// Byte offset of the `cursor`-th character, or the end of the string.
///
/// The cursor is a character index, so multibyte input stays editable.
fn byte_index(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map_or(text.len(), |(index, _)| index)
}

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_editing_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::SaveAs
            | AppMode::LoadFile
            | AppMode::ExportCsv
            | AppMode::ImportCsv
            | AppMode::RenameTable => Self::handle_prompt_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('s') => app.start_save_as(),
                KeyCode::Char('o') => app.start_load_file(),
                KeyCode::Char('e') => app.start_csv_export(),
                KeyCode::Char('i') => app.start_csv_import(),
                _ => {}
            }
            return;
        }

        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => {
                if app.selected_row > 0 {
                    app.selected_row -= 1;
                    app.ensure_cursor_visible();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if app.selected_row + 1 < app.engine.rows() {
                    app.selected_row += 1;
                    app.ensure_cursor_visible();
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if app.selected_col > 0 {
                    app.selected_col -= 1;
                    app.ensure_cursor_visible();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if app.selected_col + 1 < app.engine.cols() {
                    app.selected_col += 1;
                    app.ensure_cursor_visible();
                }
            }
            KeyCode::Home => {
                app.selected_row = 0;
                app.selected_col = 0;
                app.ensure_cursor_visible();
            }
            KeyCode::Enter | KeyCode::F(2) => app.start_editing(),
            KeyCode::Delete | KeyCode::Backspace => app.clear_selected_cell(),
            KeyCode::Char('v') => app.toggle_display_mode(),
            KeyCode::Char('r') => app.add_row(),
            KeyCode::Char('R') => app.remove_row(),
            KeyCode::Char('c') => app.add_column(),
            KeyCode::Char('C') => app.remove_column(),
            KeyCode::Char('n') => app.start_rename(),
            KeyCode::Char('x') => app.clear_sheet(),
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_editing(),
            KeyCode::Esc => app.cancel_editing(),
            KeyCode::Backspace => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                    let index = byte_index(&app.input, app.cursor_position);
                    app.input.remove(index);
                }
            }
            KeyCode::Delete => {
                if app.cursor_position < app.input.chars().count() {
                    let index = byte_index(&app.input, app.cursor_position);
                    app.input.remove(index);
                }
            }
            KeyCode::Left => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if app.cursor_position < app.input.chars().count() {
                    app.cursor_position += 1;
                }
            }
            KeyCode::Home => app.cursor_position = 0,
            KeyCode::End => app.cursor_position = app.input.chars().count(),
            KeyCode::Char(c) => {
                let index = byte_index(&app.input, app.cursor_position);
                app.input.insert(index, c);
                app.cursor_position += 1;
            }
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => app.help_scroll += 1,
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(5),
            KeyCode::PageDown => app.help_scroll += 5,
            KeyCode::Home => app.help_scroll = 0,
            _ => {}
        }
    }

    fn handle_prompt_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => match app.mode {
                AppMode::SaveAs => {
                    let filename = app.get_save_filename();
                    let result = FileRepository::save(&app.engine, &app.table_name, &filename);
                    app.set_save_result(result);
                }
                AppMode::LoadFile => {
                    let filename = app.get_load_filename();
                    let result = FileRepository::load(&filename);
                    app.set_load_result(result);
                }
                AppMode::ExportCsv => {
                    let filename = app.get_csv_filename();
                    let result = CsvExporter::export(&app.engine, &filename);
                    app.set_csv_export_result(result);
                }
                AppMode::ImportCsv => {
                    let filename = app.get_csv_filename();
                    let result = CsvExporter::import(&filename);
                    app.set_csv_import_result(result);
                }
                AppMode::RenameTable => app.finish_rename(),
                _ => {}
            },
            KeyCode::Esc => app.cancel_prompt(),
            KeyCode::Backspace => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                    let index = byte_index(&app.filename_input, app.cursor_position);
                    app.filename_input.remove(index);
                }
            }
            KeyCode::Delete => {
                if app.cursor_position < app.filename_input.chars().count() {
                    let index = byte_index(&app.filename_input, app.cursor_position);
                    app.filename_input.remove(index);
                }
            }
            KeyCode::Left => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if app.cursor_position < app.filename_input.chars().count() {
                    app.cursor_position += 1;
                }
            }
            KeyCode::Home => app.cursor_position = 0,
            KeyCode::End => app.cursor_position = app.filename_input.chars().count(),
            KeyCode::Char(c) => {
                let index = byte_index(&app.filename_input, app.cursor_position);
                app.filename_input.insert(index, c);
                app.cursor_position += 1;
            }
            _ => {}
        }
    }
}
