use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use regdash_core::utils::{format_count, format_percent, truncate_string};

use crate::app::App;
use crate::ui::styles;

/// Render the Affiliations tab - ranked table beside a chart of the largest groups
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_top_chart(frame, app, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.summary.total_registrants;

    let header = Row::new(vec!["#", "Affiliation", "Count", "Share"])
        .style(styles::header_style())
        .height(1);

    let rows: Vec<Row> = app
        .summary
        .affiliations
        .iter()
        .enumerate()
        .map(|(i, group)| {
            Row::new(vec![
                Cell::from(format!("{:>3}", i + 1)),
                Cell::from(group.label.clone()),
                Cell::from(format!("{:>7}", format_count(group.value))),
                Cell::from(format!("{:>6}", format_percent(group.value, total))),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(7),
    ];

    let title = format!(
        " Affiliations ({}) ",
        format_count(app.summary.distinct_affiliations)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.summary.affiliations.is_empty() {
        state.select(Some(app.affiliation_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_top_chart(frame: &mut Frame, app: &App, area: Rect) {
    let top = app.summary.top_affiliations(app.config.top_affiliations);
    // Leave room for the count drawn after each bar
    let label_width = (area.width as usize / 3).max(8);

    let bars: Vec<Bar> = top
        .iter()
        .map(|group| {
            Bar::default()
                .value(group.value as u64)
                .text_value(format_count(group.value))
                .label(Line::from(truncate_string(&group.label, label_width)))
                .style(styles::bar_style())
                .value_style(styles::bar_value_style())
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(format!(" Top {} ", top.len()))
                .title_style(styles::title_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        )
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(1)
        .label_style(styles::muted_style());

    frame.render_widget(chart, area);
}
