use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use regdash_core::summary::normalize_gender;
use regdash_core::utils::{format_age, format_count, format_optional};

use crate::app::App;
use crate::ui::styles;

/// Render the Registrants tab - one row per fetched record
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let placeholder = "-";

    let header = Row::new(vec!["Id", "Name", "Affiliation", "Age", "Gender"])
        .style(styles::header_style())
        .height(1);

    let rows: Vec<Row> = app
        .records
        .iter()
        .map(|record| {
            let gender = record.gender.as_deref().and_then(normalize_gender);
            Row::new(vec![
                Cell::from(record.id_display()),
                Cell::from(record.display_name().to_string()),
                Cell::from(format_optional(record.affiliation_name(), placeholder)),
                Cell::from(format!("{:>4}", format_age(record.age_years()))),
                Cell::from(gender.unwrap_or_else(|| placeholder.to_string())),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(30),
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Length(10),
    ];

    let title = format!(
        " Registrants ({}) - [j/k] move [g/G] first/last ",
        format_count(app.records.len())
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.records.is_empty() {
        state.select(Some(app.registrant_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
