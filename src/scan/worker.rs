use anyhow::Result;
use image::RgbImage;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::color::average_color;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Decodes single frames of a title at arbitrary times.
pub trait FrameSampler: Send + 'static {
    fn duration_secs(&self) -> f64;

    fn sample(&mut self, time_secs: f64) -> Result<RgbImage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSample {
    pub time_secs: f64,
    pub rgb: [u8; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub samples: Vec<ColorSample>,
    pub finished: bool,
}

/// Sample `samples` frames at the midpoints of equal slices of the title.
pub async fn scan_loop<S: FrameSampler>(
    mut sampler: S,
    samples: usize,
    progress_tx: watch::Sender<ScanProgress>,
    cancel_token: CancellationToken,
) {
    let duration = sampler.duration_secs();
    let mut progress = ScanProgress {
        total: samples,
        ..ScanProgress::default()
    };

    for index in 0..samples {
        if cancel_token.is_cancelled() {
            log_info!("color scan cancelled after {} samples", progress.completed);
            return;
        }

        let time_secs = duration * (index as f64 + 0.5) / samples as f64;
        let job = tokio::task::spawn_blocking(move || {
            let frame = sampler.sample(time_secs);
            (sampler, frame)
        });

        let (returned, frame) = tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("color scan cancelled while sampling {:.1}s", time_secs);
                return;
            }
            joined = job => match joined {
                Ok(result) => result,
                Err(err) => {
                    log_warn!("color scan sampler panicked: {err}");
                    return;
                }
            },
        };
        sampler = returned;

        match frame.map(|frame| average_color(&frame)) {
            Ok(Some(rgb)) => progress.samples.push(ColorSample { time_secs, rgb }),
            Ok(None) => progress.failed += 1,
            Err(err) => {
                log_warn!("color scan sample at {:.1}s failed: {err:#}", time_secs);
                progress.failed += 1;
            }
        }
        progress.completed += 1;
        progress_tx.send_replace(progress.clone());
    }

    progress.finished = true;
    progress_tx.send_replace(progress);
    log_info!("color scan finished");
}
