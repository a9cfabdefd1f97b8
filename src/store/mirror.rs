//! Local mirror of one remote collection.
//!
//! Each mutable collection (items, entities, events) is mirrored in
//! memory. The mirror starts `Uninitialized`, then either attaches to a
//! remote snapshot subscription (`Subscribed`) or adopts a local seed as
//! ground truth (`Demo`). In both cases mutations update the mirror
//! optimistically first; in `Subscribed`, a concurrently arriving
//! snapshot push overwrites local state unconditionally because it is the
//! server's authoritative view.

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    Uninitialized,
    Subscribed,
    Demo,
}

pub struct CollectionMirror<T> {
    name: &'static str,
    state: MirrorState,
    data: Arc<RwLock<Vec<T>>>,
    listener: Option<JoinHandle<()>>,
}

impl<T> CollectionMirror<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: MirrorState::Uninitialized,
            data: Arc::new(RwLock::new(Vec::new())),
            listener: None,
        }
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    /// `Uninitialized -> Subscribed`: adopt an initial snapshot and keep
    /// applying pushed ones. Pushes replace the whole collection; there is
    /// no client-side merge.
    pub async fn subscribe(&mut self, initial: Vec<T>, mut rx: broadcast::Receiver<Vec<T>>) {
        *self.data.write().await = initial;
        let data = Arc::clone(&self.data);
        let name = self.name;
        self.listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(snapshot) => {
                        *data.write().await = snapshot;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // snapshots are full replacements, the next one
                        // catches us up
                        warn!(collection = name, missed, "snapshot listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(collection = name, "snapshot channel closed");
                        break;
                    }
                }
            }
        }));
        self.state = MirrorState::Subscribed;
    }

    /// `Uninitialized -> Demo`: local state is the sole source of truth.
    pub async fn begin_demo(&mut self, seed: Vec<T>) {
        *self.data.write().await = seed;
        self.state = MirrorState::Demo;
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.data.read().await.clone()
    }

    /// Applies an optimistic local mutation ahead of the remote write.
    pub async fn apply_local<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        let mut data = self.data.write().await;
        mutate(&mut data);
    }
}

impl<T> Drop for CollectionMirror<T> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
