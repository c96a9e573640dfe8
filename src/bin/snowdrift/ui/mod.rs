//! TUI module for snowdrift
//!
//! Snow covers the whole terminal; the status bar, scope and help line are
//! drawn over its bottom rows.

pub mod snow;
mod status;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Clear, Paragraph},
    Frame,
};
use snowdrift::Snowfield;

pub use status::{AudioStats, StatusLine};

use snow::render_snow;
use status::render_status;
use waveform::render_waveform;

/// Panels stacked along the bottom edge: status, scope, help.
fn panels(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Open sky
            Constraint::Length(3), // Status bar
            Constraint::Length(7), // Scope
            Constraint::Length(1), // Help bar
        ])
        .split(area);
    [chunks[1], chunks[2], chunks[3]]
}

/// Where the snow canvas lands in a terminal of size `area`: all of it.
pub fn snow_area(area: Rect) -> Rect {
    area
}

pub fn render(frame: &mut Frame, snow: &Snowfield, status: &StatusLine<'_>, scope: &[f32]) {
    let area = frame.area();
    render_snow(frame, snow_area(area), snow);

    let [status_chunk, scope_chunk, help_chunk] = panels(area);
    for chunk in [status_chunk, scope_chunk, help_chunk] {
        frame.render_widget(Clear, chunk);
    }
    render_status(frame, status_chunk, status);
    render_waveform(frame, scope_chunk, scope);

    let help = Paragraph::new(" [Space] Toggle ambient  [+/-] Volume  [Q] Quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, help_chunk);
}
