//! Terminal UI rendering with ratatui.

use crate::application::{App, AppMode};
use crate::domain::Grid;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

const CELL_WIDTH: u16 = 10;

pub fn render_ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_grid(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if app.mode == AppMode::Help {
        render_help_popup(f, app.help_scroll);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let cell = app.engine.cell(app.selected_row, app.selected_col);
    let header = Paragraph::new(format!(
        "etab - {} | {}: {}",
        app.table_name,
        Grid::cell_reference(app.selected_row, app.selected_col),
        cell.expression
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_grid(f: &mut Frame, app: &mut App, area: Rect) {
    // Tell the input layer how much fits, so scrolling keeps the selection
    // visible.
    let visible_rows = (area.height.saturating_sub(3) as usize).max(1);
    let available = area.width.saturating_sub(6) as usize;
    let visible_cols = (available / (CELL_WIDTH as usize + 1))
        .max(1)
        .min(app.engine.cols());
    app.viewport_rows = visible_rows;
    app.viewport_cols = visible_cols;

    let last_row = (app.scroll_row + visible_rows).min(app.engine.rows());
    let last_col = (app.scroll_col + visible_cols).min(app.engine.cols());

    let mut headers = vec![Cell::from("")];
    for col in app.scroll_col..last_col {
        let style = if col == app.selected_col {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        headers.push(Cell::from(Grid::column_label(col)).style(style));
    }

    let mut rows = vec![Row::new(headers).height(1)];

    for row in app.scroll_row..last_row {
        let number_style = if row == app.selected_row {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut cells = vec![Cell::from(format!("{}", row + 1)).style(number_style)];

        for col in app.scroll_col..last_col {
            let cell = app.engine.cell(row, col);
            let text = if app.show_values {
                cell.display.clone()
            } else {
                cell.expression.clone()
            };
            let text = if text.is_empty() { " ".to_string() } else { text };

            let style = if row == app.selected_row && col == app.selected_col {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else if cell.has_error() {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            cells.push(Cell::from(text).style(style));
        }

        rows.push(Row::new(cells).height(1));
    }

    let mut widths = vec![Constraint::Length(4)];
    widths.extend((app.scroll_col..last_col).map(|_| Constraint::Length(CELL_WIDTH)));

    let table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title("Sheet"))
        .column_spacing(1);

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                let cell = app.engine.cell(app.selected_row, app.selected_col);
                if cell.has_error() {
                    cell.error_message()
                } else {
                    let filename = app.filename.as_deref().unwrap_or("unsaved");
                    format!(
                        "File: {} | Enter: edit | v: values/expressions | Ctrl+S/O: save/load | F1: help | q: quit",
                        filename
                    )
                }
            }
        }
        AppMode::Editing => format!("Editing: {} (Enter to apply, Esc to cancel)", app.input),
        AppMode::Help => "Up/Down: scroll | Esc/q: close help".to_string(),
        AppMode::SaveAs => format!("Save as: {} (Enter to save, Esc to cancel)", app.filename_input),
        AppMode::LoadFile => format!("Load file: {} (Enter to load, Esc to cancel)", app.filename_input),
        AppMode::ExportCsv => format!("Export CSV as: {} (Enter to export, Esc to cancel)", app.filename_input),
        AppMode::ImportCsv => format!("Import CSV from: {} (Enter to import, Esc to cancel)", app.filename_input),
        AppMode::RenameTable => format!("Table name: {} (Enter to apply, Esc to cancel)", app.filename_input),
    };

    let style = match app.mode {
        AppMode::Normal => Style::default(),
        AppMode::Editing => Style::default().fg(Color::Green),
        AppMode::Help => Style::default().fg(Color::Cyan),
        AppMode::RenameTable => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::Yellow),
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end = (start + visible_height).min(help_lines.len());
    let visible = help_lines[start..end].join("\n");

    let widget = Paragraph::new(visible)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("etab Expression Language Help")
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(widget, popup_area);
}

fn get_help_text() -> String {
    r#"ETAB EXPRESSION LANGUAGE REFERENCE

=== BASIC CONCEPTS ===
- A cell holds one expression; the grid shows its computed value
- Cell references are column letters + row number (A1, B2, BC12)
- Number literals are whole numbers (42, 1000); use unary minus for
  negatives (-5); division produces fractions (1/4)
- Keywords and references are case insensitive

=== ARITHMETIC OPERATORS ===
+       Addition                    5+3, A1+B1
-       Subtraction (also unary)    10-3, -A1
*       Multiplication              4*3
/       Division                    15/3 (dividing by zero is an error)

=== COMPARISON OPERATORS ===
=       Equal                       A1 = B1
<>      Not equal                   A1 <> 0
<  >    Less / greater              A1 < 10
<= >=   Less/greater or equal       A1 >= B1

Comparisons produce True or False and cannot be chained:
a < b < c is a syntax error.

=== BOOLEAN LOGIC ===
and     Both sides true             A1 > 5 and B1 < 10
or      Either side true            A1 = 0 or B1 = 0
not     Negation                    not (A1 > B1)
true    Boolean literal
false   Boolean literal

In arithmetic, True counts as 1 and False as 0. In logic, any number
other than zero counts as True. Blank cells read as 0.

=== FUNCTIONS ===
max(a, b, ...)   Largest argument, at least two required
min(a, b, ...)   Smallest argument, at least two required

=== ERRORS ===
#ERROR  The expression is malformed or failed to evaluate; the status
        bar shows the reason when the cell is selected
#CYCLE! The cell takes part in a cyclic chain of references
#REF!   A lookup outside the grid

=== KEYS ===
Arrows/hjkl     Move selection
Enter or F2     Edit the selected cell
Delete          Clear the selected cell
v               Toggle values / expressions display
r / R           Add / remove a row
c / C           Add / remove a column
n               Rename the table
x               Clear the whole sheet
Ctrl+S / Ctrl+O Save / load (JSON)
Ctrl+E / Ctrl+I Export / import CSV
F1 or ?         This help
q               Quit"#
        .to_string()
}
