use anyhow::{bail, Context, Result};
use log::info;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::worker::{scan_loop, FrameSampler, ScanProgress};

pub struct ColorScanController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    progress_rx: Option<watch::Receiver<ScanProgress>>,
}

impl Default for ColorScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorScanController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            progress_rx: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start<S: FrameSampler>(
        &mut self,
        sampler: S,
        samples: usize,
    ) -> Result<watch::Receiver<ScanProgress>> {
        if self.is_running() {
            bail!("color scan already active");
        }
        if samples == 0 {
            bail!("color scan needs at least one sample");
        }

        let cancel_token = CancellationToken::new();
        let (progress_tx, progress_rx) = watch::channel(ScanProgress {
            total: samples,
            ..ScanProgress::default()
        });

        info!("Starting color scan with {samples} samples");
        let handle = tokio::spawn(scan_loop(sampler, samples, progress_tx, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.progress_rx = Some(progress_rx.clone());
        Ok(progress_rx)
    }

    /// Latest progress of the current or last scan.
    pub fn progress(&self) -> Option<ScanProgress> {
        self.progress_rx.as_ref().map(|rx| rx.borrow().clone())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("color scan task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
