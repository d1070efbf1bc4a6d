//! Tally tab - a pre-aggregated snapshot shown as a ranked table and chart.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use regdash_core::snapshot::Tally;
use regdash_core::utils::{format_amount, format_share, truncate_string};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(tally) = &app.tally else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_table(frame, app, tally, chunks[0]);
    render_chart(frame, app, tally, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, tally: &Tally, area: Rect) {
    let total = tally.grand_total();

    let header = Row::new(vec![
        "#".to_string(),
        tally.key_column.clone(),
        tally.value_column.clone(),
        "Share".to_string(),
    ])
    .style(styles::header_style())
    .height(1);

    let rows: Vec<Row> = tally
        .totals
        .iter()
        .enumerate()
        .map(|(i, group)| {
            Row::new(vec![
                Cell::from(format!("{:>3}", i + 1)),
                Cell::from(group.label.clone()),
                Cell::from(format!("{:>9}", format_amount(group.value))),
                Cell::from(format!("{:>6}", format_share(group.value, total))),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(7),
    ];

    let title = format!(
        " {} by {} (total {}) ",
        tally.value_column,
        tally.key_column,
        format_amount(total)
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
    if !tally.is_empty() {
        state.select(Some(app.tally_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_chart(frame: &mut Frame, app: &App, tally: &Tally, area: Rect) {
    let shown = &tally.totals[..app.config.top_affiliations.min(tally.totals.len())];
    let label_width = (area.width as usize / 3).max(8);

    let bars: Vec<Bar> = shown
        .iter()
        .map(|group| {
            Bar::default()
                // Bars need whole, non-negative heights
                .value(group.value.max(0.0).round() as u64)
                .text_value(format_amount(group.value))
                .label(Line::from(truncate_string(&group.label, label_width)))
                .style(styles::bar_style())
                .value_style(styles::bar_value_style())
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(format!(" Top {} ", shown.len()))
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
