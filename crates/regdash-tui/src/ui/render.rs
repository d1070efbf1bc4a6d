use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use regdash_core::utils::truncate_string;

use crate::app::{App, AppState, DataSource, LoadState, Tab};

use super::styles;
use super::tabs::{affiliations, charts, overview, registrants, tally};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Registrations Dashboard";
    let help_hint = "[?] Help";
    let source_width = (area.width as usize)
        .saturating_sub(title.len() + help_hint.len() + 8)
        .max(4);
    let source = format!("  {}", truncate_string(&app.source_label(), source_width));
    let used = title.len() + source.chars().count() + help_hint.len() + 4;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(source, styles::muted_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in app.tabs().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match &app.load_state {
        LoadState::Loading if app.records.is_empty() => {
            render_notice(frame, area, "Fetching data from database...", styles::muted_style());
        }
        LoadState::Failed(message) => {
            render_notice(frame, area, message, styles::error_style());
        }
        LoadState::Empty => {
            let message = match app.source {
                DataSource::Api { .. } => "No data found from the API.",
                DataSource::Snapshot(_) | DataSource::Tally { .. } => "No data found in the snapshot.",
            };
            render_notice(frame, area, message, styles::highlight_style());
        }
        _ => match app.current_tab {
            Tab::Overview => overview::render(frame, app, area),
            Tab::AgeGroups => charts::render_age_groups(frame, app, area),
            Tab::Gender => charts::render_gender(frame, app, area),
            Tab::Affiliations => affiliations::render(frame, app, area),
            Tab::Registrants => registrants::render(frame, app, area),
            Tab::Tally => tally::render(frame, app, area),
        },
    }
}

/// Centered message in place of the tab content
fn render_notice(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let top_pad = inner.height.saturating_sub(1) / 2;
    let text_area = Rect::new(inner.x, inner.y + top_pad, inner.width, inner.height - top_pad);
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, text_area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[r]efresh | [q]uit";

    let left_text = if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if let Some(ref updated) = app.last_updated {
        format!(" Updated {} ", updated)
    } else if matches!(app.source, DataSource::Snapshot(_) | DataSource::Tally { .. }) {
        " Loaded from snapshot ".to_string()
    } else {
        " Not loaded ".to_string()
    };
    let left_style = match app.load_state {
        LoadState::Failed(_) => styles::error_style(),
        LoadState::Loaded => styles::success_style(),
        _ => styles::muted_style(),
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 18, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(k, styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  regdash", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("  1-5       ", "Switch tabs"),
        key("  ←/→ Tab   ", "Prev/next tab"),
        key("  ↑/↓ j/k   ", "Move selection"),
        key("  PgUp/PgDn ", "Scroll a page"),
        key("  g/G       ", "First/last row"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("  r         ", "Clear cache and refetch"),
        key("  q         ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
