//! Scope widget: the recent mono mix as a min/max envelope

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders,
    },
    Frame,
};

/// Vertical zoom; the soundscape rarely gets near full scale.
const SCOPE_GAIN: f32 = 4.0;

/// Split `scope` into `columns` buckets and return each bucket's (min, max),
/// zoomed and clipped to -1..1.
fn envelope(scope: &[f32], columns: usize) -> Vec<(f32, f32)> {
    if scope.is_empty() || columns == 0 {
        return Vec::new();
    }
    let bucket = scope.len().div_ceil(columns);
    scope
        .chunks(bucket)
        .map(|chunk| {
            let (lo, hi) = chunk
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &x| (lo.min(x), hi.max(x)));
            (
                (lo * SCOPE_GAIN).clamp(-1.0, 1.0),
                (hi * SCOPE_GAIN).clamp(-1.0, 1.0),
            )
        })
        .collect()
}

pub fn render_waveform(frame: &mut Frame, area: Rect, scope: &[f32]) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);
    // Two Braille dots per cell horizontally
    let columns = envelope(scope, block.inner(area).width as usize * 2);
    let width = columns.len().max(1) as f64;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (x, &(lo, hi)) in columns.iter().enumerate() {
                ctx.draw(&CanvasLine {
                    x1: x as f64,
                    y1: lo as f64,
                    x2: x as f64,
                    y2: hi as f64,
                    color: Color::Cyan,
                });
            }
        });

    frame.render_widget(canvas, area);
}
