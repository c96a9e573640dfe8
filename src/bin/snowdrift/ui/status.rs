//! Status bar widget - toggle label, volume, context state and audio stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use snowdrift::io::ContextState;

/// Level of the recent scope window.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self::default();
        }
        let (peak, energy) = buffer
            .iter()
            .fold((0.0f32, 0.0f32), |(peak, energy), &x| (peak.max(x.abs()), energy + x * x));
        Self {
            peak,
            rms: (energy / buffer.len() as f32).sqrt(),
        }
    }
}

/// Level in dBFS, floored at -99 for silence.
fn dbfs(level: f32) -> f32 {
    (20.0 * level.max(1e-5).log10()).max(-99.0)
}

pub struct StatusLine<'a> {
    pub label: &'static str,
    pub volume: f32,
    /// `None` until the first toggle opens the device
    pub state: Option<ContextState>,
    pub chimes: usize,
    pub stats: AudioStats,
    pub error: Option<&'a str>,
}

pub fn render_status(frame: &mut Frame, area: Rect, status: &StatusLine<'_>) {
    let block = Block::default().title(" snowdrift ").borders(Borders::ALL);

    let (state, state_color) = match status.state {
        Some(ContextState::Running) => ("running".to_string(), Color::Green),
        Some(state) => (state.to_string(), Color::Yellow),
        None => ("no audio yet".to_string(), Color::DarkGray),
    };

    let mut spans = vec![
        Span::styled(
            format!(" [{}]  ", status.label),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Vol: {:>3.0}%  ", status.volume * 100.0),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("{state}  "), Style::default().fg(state_color)),
        Span::styled(
            format!("Chimes: {}  ", status.chimes),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(
                "Peak: {:>5.1} dB  RMS: {:>5.1} dB",
                dbfs(status.stats.peak),
                dbfs(status.stats.rms)
            ),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if let Some(error) = status.error {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
