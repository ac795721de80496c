//! Compression service - spawns one-shot workers and correlates replies

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use flume::Receiver;

use super::request::{CompressionJob, EngineReply, JobId, Quality};
use super::worker::compression_worker;
use crate::error::{Error, Result};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Start a compression job on a freshly spawned worker.
///
/// Takes an independent copy of `bytes` before the handoff — the worker side
/// owns what it receives, so the caller's buffer stays valid for every other
/// consumer. The returned handle is the only way to observe the outcome.
#[must_use]
pub fn compress(bytes: &[u8], quality: Quality) -> CompressionHandle {
    let id = JobId::new(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed));
    let job = CompressionJob {
        id,
        input: bytes.to_vec(),
        quality,
    };

    let (reply_tx, reply_rx) = flume::bounded(1);
    let worker = std::thread::spawn(move || compression_worker(job, reply_tx));
    log::info!("spawned compression worker for job {id:?} (quality {quality})");

    CompressionHandle {
        id,
        replies: reply_rx,
        worker: Some(worker),
    }
}

/// Handle to one in-flight compression job.
///
/// Exactly one job is in flight per worker; the worker is torn down after
/// its single reply is consumed. Dropping the handle without consuming the
/// reply abandons the job: the engine run proceeds to completion in the
/// detached worker and its reply is discarded.
pub struct CompressionHandle {
    id: JobId,
    replies: Receiver<EngineReply>,
    worker: Option<JoinHandle<()>>,
}

impl CompressionHandle {
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Block until the job's reply arrives, then tear the worker down.
    ///
    /// Replies carrying a different job id are stale leftovers from a
    /// superseded job and are ignored. A worker that dies without replying
    /// surfaces as `CompressionFailed`.
    pub fn wait(mut self) -> Result<Vec<u8>> {
        loop {
            match self.replies.recv() {
                Ok(reply) if reply.id() != self.id => {
                    log::warn!(
                        "ignoring stale compression reply {:?} (waiting for {:?})",
                        reply.id(),
                        self.id
                    );
                }
                Ok(EngineReply::Done { output, .. }) => {
                    self.teardown();
                    return Ok(output);
                }
                Ok(EngineReply::Failed { fault, .. }) => {
                    self.teardown();
                    return Err(Error::Compression(fault.to_string()));
                }
                Err(_) => {
                    self.teardown();
                    return Err(Error::Compression(
                        "worker terminated without replying".into(),
                    ));
                }
            }
        }
    }

    /// Non-blocking check for the job's reply.
    ///
    /// Returns `None` while the job is still running (stale replies are
    /// swallowed), `Some(result)` once the job finished or the worker died.
    pub fn try_poll(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            match self.replies.try_recv() {
                Ok(reply) if reply.id() != self.id => {
                    log::warn!(
                        "ignoring stale compression reply {:?} (waiting for {:?})",
                        reply.id(),
                        self.id
                    );
                }
                Ok(EngineReply::Done { output, .. }) => {
                    self.teardown();
                    return Some(Ok(output));
                }
                Ok(EngineReply::Failed { fault, .. }) => {
                    self.teardown();
                    return Some(Err(Error::Compression(fault.to_string())));
                }
                Err(flume::TryRecvError::Empty) => return None,
                Err(flume::TryRecvError::Disconnected) => {
                    self.teardown();
                    return Some(Err(Error::Compression(
                        "worker terminated without replying".into(),
                    )));
                }
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(worker) = self.worker.take() {
            // the worker has already sent (or failed to send) its one reply,
            // so this join returns promptly
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for CompressionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionHandle")
            .field("id", &self.id)
            .field("worker_alive", &self.worker.is_some())
            .finish()
    }
}
