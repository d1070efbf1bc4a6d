//! Bar charts for the age-group and gender tabs.

use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use regdash_core::utils::{format_count, truncate_string};

use crate::app::App;
use crate::ui::styles;

/// Width of one bar, wide enough for labels like "30-above"
const BAR_WIDTH: u16 = 9;

const BAR_GAP: u16 = 2;

fn bars(data: &[(String, usize)]) -> Vec<Bar<'static>> {
    data.iter()
        .map(|(label, count)| {
            Bar::default()
                .value(*count as u64)
                .text_value(format_count(*count))
                .label(Line::from(truncate_string(label, BAR_WIDTH as usize)))
                .style(styles::bar_style())
                .value_style(styles::bar_value_style())
        })
        .collect()
}

fn render_chart(frame: &mut Frame, area: Rect, title: String, data: &[(String, usize)]) {
    let bars = bars(data);
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .label_style(styles::muted_style());

    frame.render_widget(chart, area);
}

pub fn render_age_groups(frame: &mut Frame, app: &App, area: Rect) {
    let data: Vec<(String, usize)> = app
        .summary
        .age_groups
        .iter()
        .map(|(band, count)| (band.label().to_string(), *count))
        .collect();

    let title = format!(
        " Registrants by Age Group ({} of {} with a usable age) ",
        format_count(app.summary.banded_total()),
        format_count(app.summary.total_registrants)
    );
    render_chart(frame, area, title, &data);
}

pub fn render_gender(frame: &mut Frame, app: &App, area: Rect) {
    let data: Vec<(String, usize)> = app
        .summary
        .genders
        .iter()
        .map(|g| (g.label.clone(), g.value))
        .collect();

    render_chart(frame, area, " Registrants by Gender ".to_string(), &data);
}
