use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::models::ActivityLog;

use super::{
    commands::{CommandOutcome, PlayerCommand},
    session::{PlayerSession, SessionSnapshot},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

/// Drives a session's playback and countdown ticks on the tokio runtime and
/// publishes a snapshot after every tick or command.
pub struct PlaybackDriver {
    session: Arc<Mutex<PlayerSession>>,
    snapshot_tx: Arc<watch::Sender<SessionSnapshot>>,
    ticker: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    playback_tick: Duration,
    countdown_tick: Duration,
}

impl PlaybackDriver {
    pub fn new(session: PlayerSession) -> Self {
        let (snapshot_tx, _) = watch::channel(session.snapshot());
        let playback_tick = session.settings().playback_tick();
        let countdown_tick = session.settings().countdown_tick();

        Self {
            session: Arc::new(Mutex::new(session)),
            snapshot_tx: Arc::new(snapshot_tx),
            ticker: None,
            cancel_token: None,
            playback_tick,
            countdown_tick,
        }
    }

    pub fn session(&self) -> Arc<Mutex<PlayerSession>> {
        Arc::clone(&self.session)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.ticker.is_some() {
            bail!("playback driver already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(
            Arc::clone(&self.session),
            Arc::clone(&self.snapshot_tx),
            self.playback_tick,
            self.countdown_tick,
            cancel_token.clone(),
        ));

        self.ticker = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.ticker.take() {
            handle.await.context("playback ticker failed to join")?;
        }
        Ok(())
    }

    pub async fn dispatch(&self, command: PlayerCommand) -> CommandOutcome {
        let (outcome, snapshot) = {
            let mut session = self.session.lock().await;
            let outcome = session.dispatch(command, std::time::Instant::now());
            (outcome, session.snapshot())
        };
        self.snapshot_tx.send_replace(snapshot);
        outcome
    }

    /// Stop ticking and close the session.
    pub async fn shutdown(mut self) -> Result<Option<ActivityLog>> {
        self.stop().await?;
        let (log, snapshot) = {
            let mut session = self.session.lock().await;
            (session.close(), session.snapshot())
        };
        self.snapshot_tx.send_replace(snapshot);
        Ok(log)
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

async fn tick_loop(
    session: Arc<Mutex<PlayerSession>>,
    snapshot_tx: Arc<watch::Sender<SessionSnapshot>>,
    playback_every: Duration,
    countdown_every: Duration,
    cancel_token: CancellationToken,
) {
    let mut playback = time::interval(playback_every);
    playback.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut countdown = time::interval(countdown_every);
    countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first countdown step happens one full period after start.
    countdown.reset();

    loop {
        let snapshot = tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("playback driver shutting down");
                break;
            }
            _ = playback.tick() => {
                let mut guard = session.lock().await;
                guard.on_playback_tick(std::time::Instant::now());
                guard.snapshot()
            }
            _ = countdown.tick() => {
                let mut guard = session.lock().await;
                if let Some(outcome) = guard.on_countdown_tick() {
                    log_debug!("countdown committed {}", outcome.segment.id);
                }
                guard.snapshot()
            }
        };
        snapshot_tx.send_replace(snapshot);
    }
}
