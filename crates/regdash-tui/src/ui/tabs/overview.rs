//! Overview tab - headline numbers plus the age and gender tables.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use regdash_core::utils::{format_age, format_count, format_percent};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_totals(frame, app, chunks[0]);

    let tables = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(4)])
        .split(chunks[1]);

    render_age_table(frame, app, tables[0]);
    render_gender_table(frame, app, tables[1]);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<24}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

fn render_totals(frame: &mut Frame, app: &App, area: Rect) {
    let summary = &app.summary;
    let missing_age = summary.total_registrants - summary.with_valid_age;

    let mut lines = vec![
        Line::from(""),
        stat_line("Total registrants", format_count(summary.total_registrants)),
        stat_line("Affiliations", format_count(summary.distinct_affiliations)),
        stat_line("Average age", format_age(summary.average_age)),
        stat_line("With a valid age", format_count(summary.with_valid_age)),
    ];
    if missing_age > 0 {
        lines.push(Line::from(Span::styled(
            format!("  {} without a usable age are left out of age groups", format_count(missing_age)),
            styles::muted_style(),
        )));
    }

    if let Some(top) = summary.affiliations.first() {
        lines.push(Line::from(""));
        lines.push(stat_line("Largest affiliation", top.label.clone()));
        lines.push(stat_line("  registrants", format_count(top.value)));
    }

    let block = Block::default()
        .title(" Summary ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn count_row(label: String, count: usize, total: usize) -> Row<'static> {
    Row::new(vec![
        Cell::from(label),
        Cell::from(format_count(count)),
        Cell::from(format_percent(count, total)),
    ])
}

fn header(first: &'static str) -> Row<'static> {
    Row::new(vec![first, "Count", "Share"]).style(styles::header_style())
}

fn render_age_table(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.summary.banded_total();
    let rows: Vec<Row> = app
        .summary
        .age_groups
        .iter()
        .map(|(band, count)| count_row(band.label().to_string(), *count, total))
        .collect();

    let block = Block::default()
        .title(" Age Groups ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let table = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(10), Constraint::Length(8)],
    )
    .header(header("Age Group"))
    .block(block);

    frame.render_widget(table, area);
}

fn render_gender_table(frame: &mut Frame, app: &App, area: Rect) {
    let total: usize = app.summary.genders.iter().map(|g| g.value).sum();
    let rows: Vec<Row> = app
        .summary
        .genders
        .iter()
        .map(|g| count_row(g.label.clone(), g.value, total))
        .collect();

    let block = Block::default()
        .title(" Gender ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let table = Table::new(
        rows,
        [Constraint::Min(12), Constraint::Length(10), Constraint::Length(8)],
    )
    .header(header("Gender"))
    .block(block);

    frame.render_widget(table, area);
}
