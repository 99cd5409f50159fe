//! Background persistence worker
//!
//! Freshly fetched metadata is mirrored into the database off the caller's
//! path. Posts go through a bounded queue drained by a single task, so the
//! writes of one channel never interleave. Failures are logged and dropped:
//! the in-memory registry stays authoritative.

use crate::database::{Documents, MetaDatabase};
use crate::error::{StoreError, StoreResult};
use crate::tables::MetaTable;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

enum WorkerMessage {
    Store {
        table: MetaTable,
        documents: Documents,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the persistence worker. Cloning shares the same queue; the
/// worker exits once every handle is dropped.
#[derive(Clone)]
pub struct WorkerChannel {
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerChannel {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(database: Arc<dyn MetaDatabase>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(drain(database, rx));
        (Self { tx }, handle)
    }

    /// Queue documents for persistence without waiting. A full queue drops
    /// the batch.
    pub fn post(&self, table: MetaTable, documents: Documents) {
        if documents.is_empty() {
            return;
        }
        let count = documents.len();
        match self.tx.try_send(WorkerMessage::Store { table, documents }) {
            Ok(()) => debug!("Posted {} {} documents to persistence worker", count, table),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Persistence queue full, dropping {} {} documents", count, table);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Persistence worker stopped, dropping {} {} documents", count, table);
            }
        }
    }

    /// Wait until everything posted before this call has been processed
    pub async fn flush(&self) -> StoreResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(WorkerMessage::Flush(done_tx))
            .await
            .map_err(|_| StoreError::WorkerStopped)?;
        done_rx.await.map_err(|_| StoreError::WorkerStopped)
    }
}

async fn drain(database: Arc<dyn MetaDatabase>, mut rx: mpsc::Receiver<WorkerMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            WorkerMessage::Store { table, documents } => {
                match database.put_many(table, documents).await {
                    Ok(ids) => debug!("Persisted {} {} documents", ids.len(), table),
                    Err(e) => error!("Failed to persist {} documents: {}", table, e),
                }
            }
            WorkerMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Persistence worker stopped");
}
