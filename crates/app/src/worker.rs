//! The single task that owns the [`CommandRouter`].
//!
//! Inbound bus messages and poll ticks are queued as [`Job`]s and executed
//! one at a time, so the settings, tokens and registry never need a lock.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use millbridge_domain::message::Envelope;

use crate::ports::{BusPublisher, CloudApi, LogLevelControl, StateStore};
use crate::router::{CommandRouter, DispatchOutcome};

/// A unit of work for the worker.
#[derive(Debug)]
pub enum Job {
    /// One message received from the bus.
    Inbound(Envelope),
    /// One poll cycle.
    Poll,
    /// Stop after the jobs queued so far.
    Shutdown,
}

/// Serializes every job through one [`CommandRouter`].
pub struct Worker<C, B, S, L> {
    router: CommandRouter<C, B, S, L>,
    jobs: mpsc::Receiver<Job>,
}

impl<C, B, S, L> Worker<C, B, S, L>
where
    C: CloudApi + Send + Sync + 'static,
    B: BusPublisher + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
    L: LogLevelControl + Send + Sync + 'static,
{
    /// Create a worker and the sender used to feed it.
    #[must_use]
    pub fn new(router: CommandRouter<C, B, S, L>, capacity: usize) -> (Self, mpsc::Sender<Job>) {
        let (sender, jobs) = mpsc::channel(capacity);
        (Self { router, jobs }, sender)
    }

    /// Spawn [`run`](Self::run) on the runtime.
    pub fn start(self) -> JoinHandle<CommandRouter<C, B, S, L>> {
        tokio::spawn(self.run())
    }

    /// Execute jobs until [`Job::Shutdown`] is received or every sender is
    /// dropped, then hand the router back.
    pub async fn run(mut self) -> CommandRouter<C, B, S, L> {
        tracing::info!("worker started");
        while let Some(job) = self.jobs.recv().await {
            match job {
                Job::Inbound(envelope) => {
                    let outcome = self.router.handle(envelope).await;
                    match outcome.dispatch {
                        DispatchOutcome::Handled => {}
                        DispatchOutcome::Ignored => tracing::debug!("message ignored"),
                        DispatchOutcome::Failed(err) => {
                            tracing::debug!(error = %err, "message failed");
                        }
                    }
                }
                Job::Poll => {
                    self.router.poll().await;
                }
                Job::Shutdown => break,
            }
        }
        tracing::info!("worker stopped");
        self.router
    }
}
