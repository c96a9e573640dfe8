//! Offline render of a session to a WAV file.

use std::path::Path;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use snowdrift::{io::OfflineDevice, AmbientConfig, AmbientEngine};
use tracing::info;

pub fn render(config: AmbientConfig, path: &Path, seconds: f64, sample_rate: u32) -> EyreResult<()> {
    if seconds.is_nan() || seconds <= 0.0 {
        return Err(eyre!("bounce length must be positive, got {seconds}"));
    }
    if sample_rate == 0 {
        return Err(eyre!("sample rate must be positive"));
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    let mut engine = AmbientEngine::new(OfflineDevice::new(sample_rate as f32), config);
    engine.toggle().wrap_err("failed to start the ambient session")?;

    let mut peak = 0.0f32;
    let mut write_result = Ok(());
    engine.run_for(seconds, |block| {
        if write_result.is_err() {
            return;
        }
        for &sample in block {
            peak = peak.max(sample.abs());
            if let Err(err) = writer.write_sample(sample) {
                write_result = Err(err);
                return;
            }
        }
    });
    write_result.wrap_err("failed to write samples")?;

    info!(chimes = engine.chimes_spawned(), peak, "bounce rendered");
    engine.shutdown();
    writer.finalize().wrap_err("failed to finalize WAV")?;

    eprintln!(
        "wrote {seconds:.1}s to {} ({} chimes, peak {peak:.2})",
        path.display(),
        engine.chimes_spawned()
    );
    Ok(())
}
