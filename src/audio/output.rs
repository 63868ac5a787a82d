use std::{
    sync::mpsc::{self, Sender},
    thread,
    time::Duration,
};

use rodio::{OutputStream, Sink};

use crate::error::AttachError;

use super::source::RoutedSource;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const START_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the processed signal ends up.
pub trait AudioOutput: Send {
    /// Begin playing `source`, replacing anything already playing.
    fn start(&mut self, source: RoutedSource) -> Result<(), AttachError>;

    fn stop(&mut self);
}

enum OutputCommand {
    Start {
        source: RoutedSource,
        reply: Sender<Result<(), String>>,
    },
    Stop,
}

/// Plays the routed signal through the default device on a dedicated thread that
/// owns the non-`Send` rodio stream.
pub struct RodioOutput {
    tx: Option<Sender<OutputCommand>>,
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioOutput {
    pub fn new() -> Self {
        Self { tx: None }
    }

    fn ensure_thread(&mut self) -> Result<Sender<OutputCommand>, AttachError> {
        if let Some(tx) = self.tx.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<OutputCommand>();

        thread::Builder::new()
            .name("cinereview-audio".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                while let Ok(command) = rx.recv() {
                    match command {
                        OutputCommand::Start { source, reply } => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;

                            let opened = OutputStream::try_default()
                                .map_err(|e| format!("failed to open output stream: {e}"))
                                .and_then(|(stream, handle)| {
                                    let new_sink = Sink::try_new(&handle)
                                        .map_err(|e| format!("failed to create sink: {e}"))?;
                                    Ok((stream, new_sink))
                                });

                            let result = match opened {
                                Ok((stream, new_sink)) => {
                                    new_sink.append(source);
                                    new_sink.play();
                                    _stream = Some(stream);
                                    sink = Some(new_sink);
                                    Ok(())
                                }
                                Err(err) => Err(err),
                            };
                            let _ = reply.send(result);
                        }
                        OutputCommand::Stop => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            _stream = None;
                        }
                    }
                }
                log_info!("audio output thread exiting");
            })
            .map_err(|e| AttachError::ContextUnavailable(e.to_string()))?;

        self.tx = Some(tx.clone());
        Ok(tx)
    }
}

impl AudioOutput for RodioOutput {
    fn start(&mut self, source: RoutedSource) -> Result<(), AttachError> {
        let tx = self.ensure_thread()?;
        let (reply_tx, reply_rx) = mpsc::channel();

        tx.send(OutputCommand::Start {
            source,
            reply: reply_tx,
        })
        .map_err(|e| AttachError::ContextUnavailable(e.to_string()))?;

        match reply_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => {
                log_error!("audio output failed to start: {reason}");
                Err(AttachError::ContextUnavailable(reason))
            }
            Err(_) => Err(AttachError::ContextUnavailable(
                "audio thread did not answer".into(),
            )),
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.tx.as_ref() {
            let _ = tx.send(OutputCommand::Stop);
        }
    }
}
