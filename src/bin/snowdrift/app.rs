//! Terminal front end: snow on a full-screen canvas, the ambient engine on
//! the default output device.

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{layout::Rect, DefaultTerminal};
use rtrb::{Consumer, RingBuffer};
use snowdrift::{io::CpalDevice, AmbientConfig, AmbientEngine, Snowfield};
use tracing::{error, info};

use crate::ui::{self, AudioStats, StatusLine};

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;
/// Ring capacity between the audio callback and the scope
const SCOPE_RING: usize = 16_384;
const FRAME: Duration = Duration::from_millis(16);
const VOLUME_STEP: f32 = 0.05;

pub struct App {
    engine: AmbientEngine<CpalDevice>,
    snow: Snowfield,
    /// Terminal area the snowfield was sized for
    snow_area: Rect,
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    /// Last toggle failure, shown until the next successful toggle
    error: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AmbientConfig) -> Self {
        let (scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING);
        let seed = config.seed;
        let engine = AmbientEngine::new(CpalDevice::new().with_tap(scope_tx), config);
        let snow = match seed {
            Some(seed) => Snowfield::with_seed(0.0, 0.0, seed),
            None => Snowfield::new(0.0, 0.0),
        };

        Self {
            engine,
            snow,
            snow_area: Rect::default(),
            scope_rx,
            scope: vec![0.0; VIS_BUFFER_SIZE],
            error: None,
            should_quit: false,
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.engine.poll();
            self.poll_scope();

            let size = terminal.size()?;
            self.fit_snow(ui::snow_area(Rect::new(0, 0, size.width, size.height)));
            self.snow.tick();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(FRAME)? {
                // Resize events need no handling: the next frame refits.
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.engine.shutdown();
        Ok(())
    }

    /// Re-scatter the snow whenever the canvas changes size.
    fn fit_snow(&mut self, area: Rect) {
        if area == self.snow_area {
            return;
        }
        self.snow_area = area;
        let (width, height) = ui::snow::field_size(area);
        self.snow.resize(width, height);
    }

    fn poll_scope(&mut self) {
        let mut received = 0;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            received += 1;
        }
        if received > 0 && self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => self.nudge_volume(VOLUME_STEP),
            KeyCode::Char('-') | KeyCode::Down => self.nudge_volume(-VOLUME_STEP),
            _ => {}
        }
    }

    fn toggle(&mut self) {
        match self.engine.toggle() {
            Ok(()) => self.error = None,
            Err(err) => {
                error!(%err, "ambient toggle failed");
                self.error = Some(format!("audio unavailable: {err}"));
            }
        }
    }

    /// Step the volume on a 0.05 grid, clamped to 0..1.
    fn nudge_volume(&mut self, delta: f32) {
        let steps = ((self.engine.volume() + delta) / VOLUME_STEP).round();
        let volume = (steps * VOLUME_STEP).clamp(0.0, 1.0);
        self.engine.set_volume(volume);
        info!(volume, "volume changed");
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        let status = StatusLine {
            label: self.engine.label(),
            volume: self.engine.volume(),
            state: self.engine.context_state(),
            chimes: self.engine.chimes_spawned(),
            stats: AudioStats::from_buffer(&self.scope),
            error: self.error.as_deref(),
        };
        ui::render(frame, &self.snow, &status, &self.scope);
    }
}
