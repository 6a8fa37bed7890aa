//! Single-consumer request queue around [`Background`].
//!
//! Every request goes through one mpsc channel drained by one task, so each
//! read-modify-write of the cache finishes before the next one starts.
//! Concurrent senders cannot overwrite each other's batches.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{CacheError, Result};
use crate::messages::{Background, Request, Response};

const QUEUE_DEPTH: usize = 64;

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Result<Response>>,
}

/// Cloneable sender side of the queue
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Envelope>,
}

impl ServiceHandle {
    /// Queue a request and wait for its reply
    pub async fn request(&self, request: Request) -> Result<Response> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| CacheError::ServiceClosed)?;
        rx.await.map_err(|_| CacheError::ServiceClosed)?
    }
}

/// The running dispatcher task
pub struct CacheService {
    handle: ServiceHandle,
    task: JoinHandle<Background>,
}

impl CacheService {
    /// Start draining requests on the blocking pool of the current tokio runtime
    pub fn spawn(mut background: Background) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);

        // Storage does blocking file I/O, so the consumer gets its own thread
        let task = tokio::task::spawn_blocking(move || {
            while let Some(Envelope { request, reply }) = rx.blocking_recv() {
                let response = background.dispatch(request);
                if reply.send(response).is_err() {
                    log::debug!("Requester went away before the reply");
                }
            }
            log::debug!("Cache service queue closed");
            background
        });

        Self {
            handle: ServiceHandle { tx },
            task,
        }
    }

    /// A new sender for this service
    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Close the queue and wait for the dispatcher to finish.
    ///
    /// Completes once every outstanding [`ServiceHandle`] has been dropped and
    /// the queued requests are answered.
    pub async fn shutdown(self) -> Result<Background> {
        drop(self.handle);
        self.task
            .await
            .map_err(|e| CacheError::Storage(format!("cache service task failed: {}", e)))
    }
}
