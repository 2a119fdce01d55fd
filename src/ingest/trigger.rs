//! Asynchronous run trigger
//!
//! Firing returns immediately with a ticket; the run itself happens on a spawned task.
//! Runs are serialized behind a mutex, so a trigger fired while another run is in
//! progress waits for it to finish before starting.

use crate::ingest::coordinator::{Ingestor, RunSummary};
use crate::storage::JobStore;
use crate::{HarvestError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Handle to a fired run
#[derive(Debug)]
pub struct RunTicket {
    sequence: u64,
    handle: JoinHandle<Result<RunSummary>>,
}

impl RunTicket {
    /// Position of this run among everything fired by the same trigger, starting at 1
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns true once the run has finished, successfully or not
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the run to finish and returns its outcome
    pub async fn wait(self) -> Result<RunSummary> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(HarvestError::RunAborted(e.to_string())),
        }
    }
}

/// Fires ingestion runs in the background
pub struct Trigger<S: JobStore + Send + 'static> {
    ingestor: Arc<Mutex<Ingestor<S>>>,
    fired: AtomicU64,
}

impl<S: JobStore + Send + 'static> Trigger<S> {
    pub fn new(ingestor: Ingestor<S>) -> Self {
        Self {
            ingestor: Arc::new(Mutex::new(ingestor)),
            fired: AtomicU64::new(0),
        }
    }

    /// Starts a run and returns without waiting for it
    ///
    /// Must be called from within a tokio runtime.
    pub fn fire(&self) -> RunTicket {
        let sequence = self.fired.fetch_add(1, Ordering::SeqCst) + 1;
        let ingestor = Arc::clone(&self.ingestor);

        tracing::debug!("Run #{} triggered", sequence);
        let handle = tokio::spawn(async move {
            let mut ingestor = ingestor.lock().await;
            ingestor.run().await
        });

        RunTicket { sequence, handle }
    }

    /// Returns true while a run holds the ingestor
    pub fn is_running(&self) -> bool {
        self.ingestor.try_lock().is_err()
    }

    /// Number of runs fired so far
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Runs `f` against the store once no run is in progress
    pub async fn inspect<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let ingestor = self.ingestor.lock().await;
        f(ingestor.store())
    }
}
