//! Control messages sent to the worker by its clients.

use std::sync::Arc;

use shellcache_core::Error;
use tokio::task::JoinHandle;

use crate::generation::WorkerControl;
use crate::offline::{MaterializeReport, OfflineMaterializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `skipWaiting`: promote a waiting generation now.
    SkipWaiting,
    /// `downloadOffline`: fetch every manifest resource not yet cached.
    DownloadOffline,
}

impl Command {
    /// Exact, case-sensitive match of the message payload.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "skipWaiting" => Some(Command::SkipWaiting),
            "downloadOffline" => Some(Command::DownloadOffline),
            _ => None,
        }
    }
}

/// What a recognized command set in motion.
#[derive(Debug)]
pub enum Dispatch {
    SkipWaiting,
    /// The background materialization; awaiting it is optional.
    Materializing(JoinHandle<Result<MaterializeReport, Error>>),
}

#[derive(Clone)]
pub struct CommandHandler {
    control: Arc<dyn WorkerControl>,
    materializer: OfflineMaterializer,
}

impl CommandHandler {
    pub fn new(control: Arc<dyn WorkerControl>, materializer: OfflineMaterializer) -> Self {
        Self { control, materializer }
    }

    /// Dispatch one message. Unrecognized messages are ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&self, data: &str) -> Option<Dispatch> {
        let Some(command) = Command::parse(data) else {
            tracing::debug!(message = %data, "ignoring unrecognized message");
            return None;
        };

        match command {
            Command::SkipWaiting => {
                self.control.skip_waiting();
                Some(Dispatch::SkipWaiting)
            }
            Command::DownloadOffline => {
                let materializer = self.materializer.clone();
                let task = tokio::spawn(async move {
                    let result = materializer.materialize().await;
                    if let Err(e) = &result {
                        tracing::warn!(error = %e, "offline download failed");
                    }
                    result
                });
                Some(Dispatch::Materializing(task))
            }
        }
    }
}
