//! Snow canvas widget

use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Points},
    Frame,
};
use snowdrift::Snowfield;

/// Virtual pixels per terminal cell, roughly a cell's size on screen.
const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 16.0;

/// Snowfield dimensions for a canvas covering `area`.
pub fn field_size(area: Rect) -> (f32, f32) {
    (
        area.width as f32 * CELL_WIDTH,
        area.height as f32 * CELL_HEIGHT,
    )
}

/// Flakes sorted into brightness bands by opacity.
fn bands(snow: &Snowfield) -> [Vec<(f64, f64)>; 3] {
    let height = snow.height() as f64;
    let mut bands: [Vec<(f64, f64)>; 3] = Default::default();

    for flake in snow.flakes() {
        let band = match flake.opacity {
            o if o >= 0.8 => 0,
            o if o >= 0.6 => 1,
            _ => 2,
        };
        // Canvas y grows upwards
        bands[band].push((flake.x as f64, height - flake.y as f64));
    }
    bands
}

pub fn render_snow(frame: &mut Frame, area: Rect, snow: &Snowfield) {
    let [bright, mid, faint] = bands(snow);

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, snow.width() as f64])
        .y_bounds([0.0, snow.height() as f64])
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &faint,
                color: Color::DarkGray,
            });
            ctx.draw(&Points {
                coords: &mid,
                color: Color::Gray,
            });
            ctx.draw(&Points {
                coords: &bright,
                color: Color::White,
            });
        });

    frame.render_widget(canvas, area);
}
