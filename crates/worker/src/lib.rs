//! The caching agent: lifecycle, fetch routing and control messages.
//!
//! A [`ServiceWorker`] is one generation of the agent, built from one build
//! manifest. Its collaborators are injected through [`WorkerContext`], so the
//! same code runs against SQLite and the live origin in the host binary and
//! against in-memory fakes in tests.
//!
//! Control flow:
//! - install, then activate, once per generation
//! - fetch routing per request, concurrently with everything else
//! - commands on demand

pub mod commands;
pub mod generation;
pub mod keys;
pub mod lifecycle;
pub mod offline;
pub mod router;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use shellcache_core::{BuildManifest, Error, Namespaces, Network, Origin, Request};

pub use commands::{Command, CommandHandler, Dispatch};
pub use generation::{Generation, GenerationStatus, WorkerControl, WorkerState};
pub use lifecycle::{ActivationOutcome, InstallReport, Lifecycle, MigrationReport};
pub use offline::{MaterializeReport, OfflineMaterializer};
pub use router::{FetchOutcome, FetchRouter, Routed, Source, Strategy};

/// Everything a generation's components share.
pub struct WorkerContext {
    pub manifest: Arc<BuildManifest>,
    pub origin: Origin,
    pub namespaces: Namespaces,
    pub network: Arc<dyn Network>,
}

/// One worker generation.
pub struct ServiceWorker {
    ctx: Arc<WorkerContext>,
    generation: Arc<Generation>,
    lifecycle: Lifecycle,
    router: FetchRouter,
    commands: CommandHandler,
}

impl ServiceWorker {
    pub fn new(ctx: WorkerContext) -> Self {
        let ctx = Arc::new(ctx);
        let generation = Arc::new(Generation::new());
        let control: Arc<dyn WorkerControl> = generation.clone();

        Self {
            lifecycle: Lifecycle::new(Arc::clone(&ctx), Arc::clone(&control)),
            router: FetchRouter::new(Arc::clone(&ctx)),
            commands: CommandHandler::new(control, OfflineMaterializer::new(Arc::clone(&ctx))),
            generation,
            ctx,
        }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn status(&self) -> GenerationStatus {
        self.generation.status()
    }

    /// Run the install phase. A failed install makes the generation redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.generation
            .transition(&[WorkerState::Parsed, WorkerState::Installed], WorkerState::Installing)
            .map_err(|current| Error::InvalidState(format!("cannot install from {current:?}")))?;

        match self.lifecycle.install().await {
            Ok(report) => {
                self.generation.set_state(WorkerState::Installed);
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.generation.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    /// Run the activate phase on an installed generation that may skip waiting.
    ///
    /// Migration failures are contained in the outcome; `Err` only reports
    /// that the generation was not ready to activate.
    pub async fn activate(&self) -> Result<ActivationOutcome, Error> {
        if !self.generation.skip_waiting_requested() {
            return Err(Error::InvalidState("generation is waiting for open clients to close".into()));
        }
        self.generation
            .transition(&[WorkerState::Installed], WorkerState::Activating)
            .map_err(|current| Error::InvalidState(format!("cannot activate from {current:?}")))?;

        let outcome = self.lifecycle.activate().await;
        self.generation.set_state(WorkerState::Activated);
        Ok(outcome)
    }

    /// Route one request. Until activation nothing is intercepted.
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if self.generation.state() != WorkerState::Activated {
            return Ok(FetchOutcome::Passthrough);
        }
        self.router.route(request).await
    }

    pub fn message(&self, data: &str) -> Option<Dispatch> {
        self.commands.handle(data)
    }
}
