//! snowdrift - falling snow in the terminal, with an ambient soundscape
//!
//! Run with: cargo run -- [--volume 0.4] [--seed 7] [--config ambient.toml]
//! Offline:  cargo run -- --bounce out.wav --seconds 60

mod app;
mod bounce;
mod ui;

use std::{fs::File, path::PathBuf, sync::Mutex};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use snowdrift::AmbientConfig;
use tracing_subscriber::EnvFilter;

use app::App;

#[derive(Parser, Debug)]
#[command(name = "snowdrift")]
#[command(version, about = "Falling snow and a generative ambient soundscape")]
struct Args {
    /// Master volume, 0.0 to 1.0
    #[arg(long)]
    volume: Option<f32>,

    /// Seed for a reproducible soundscape
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding the default sound settings
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Render offline to a WAV file instead of opening the TUI
    #[arg(long, value_name = "WAV")]
    bounce: Option<PathBuf>,

    /// Length of the bounce
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,

    /// Sample rate of the bounce
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Write logs here (the TUI owns the terminal, so it logs nowhere else)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    init_logging(&args)?;
    let config = load_config(&args)?;

    match &args.bounce {
        Some(path) => bounce::render(config, path, args.seconds, args.sample_rate),
        None => {
            let mut terminal = ratatui::init();
            let result = App::new(config).run(&mut terminal);
            ratatui::restore();
            result
        }
    }
}

fn load_config(args: &Args) -> EyreResult<AmbientConfig> {
    let mut config = match &args.config {
        Some(path) => AmbientConfig::load(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None => AmbientConfig::default(),
    };
    if let Some(volume) = args.volume {
        config.volume = volume.clamp(0.0, 1.0);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

/// `RUST_LOG` filters, defaulting to `info`. A bounce logs to stderr; the TUI
/// only logs when given a file.
fn init_logging(args: &Args) -> EyreResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
        subscriber
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.bounce.is_some() {
        subscriber.with_writer(std::io::stderr).init();
    }
    Ok(())
}
