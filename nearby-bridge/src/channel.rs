//! Core actor: one task owns `NearbyCore` and applies requests in arrival order.
//!
//! Platform callbacks can come from several tasks; funnelling them through a bounded queue keeps
//! roster updates serialized without a lock around the core.

use nearby_core::{NearbyCore, PlatformEvent};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::sink::{JsonLinesSink, SinkError};

#[derive(Debug)]
pub enum Request {
    Event(PlatformEvent),
    Bind,
    Unbind,
}

#[derive(Debug, thiserror::Error)]
#[error("core task has stopped")]
pub struct CoreStopped;

/// Cloneable sender side of the core actor.
#[derive(Clone)]
pub struct CoreHandle {
    tx: mpsc::Sender<Request>,
}

impl CoreHandle {
    pub async fn event(&self, event: PlatformEvent) -> Result<(), CoreStopped> {
        self.request(Request::Event(event)).await
    }

    pub async fn bind(&self) -> Result<(), CoreStopped> {
        self.request(Request::Bind).await
    }

    pub async fn unbind(&self) -> Result<(), CoreStopped> {
        self.request(Request::Unbind).await
    }

    async fn request(&self, req: Request) -> Result<(), CoreStopped> {
        self.tx.send(req).await.map_err(|_| CoreStopped)
    }
}

/// Queue with room for `capacity` pending requests (at least 1).
pub fn channel(capacity: usize) -> (CoreHandle, mpsc::Receiver<Request>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CoreHandle { tx }, rx)
}

/// Run until every `CoreHandle` is dropped. Returns the core for inspection.
/// An encode failure drops that batch with a warning; a write failure ends the task.
pub async fn run_core<W: AsyncWrite + Unpin>(
    mut core: NearbyCore,
    mut rx: mpsc::Receiver<Request>,
    mut sink: JsonLinesSink<W>,
) -> Result<NearbyCore, SinkError> {
    while let Some(req) = rx.recv().await {
        let actions = match req {
            Request::Event(ev) => core.handle(ev),
            Request::Bind => core.bind(),
            Request::Unbind => core.unbind(),
        };
        debug!(count = actions.len(), "core produced actions");
        match sink.send_all(&actions).await {
            Ok(()) => {}
            Err(SinkError::Encode(e)) => warn!(error = %e, "dropping actions that failed to encode"),
            Err(e) => return Err(e),
        }
    }
    Ok(core)
}
