use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, warn};

use islet_persist::{PersistError, SaveBackend, SaveDocument};

#[derive(Debug)]
pub struct SaveCompletion {
    pub id: u64,
    pub result: Result<(), PersistError>,
    pub elapsed: Duration,
}

/// Runs saves off the tick thread. At most one request is in flight; newer snapshots
/// replace the single pending slot and go out when the in-flight one finishes.
pub struct SaveQueue {
    backend: Arc<dyn SaveBackend>,
    pool: ThreadPool,
    completed_tx: Sender<SaveCompletion>,
    completed_rx: Receiver<SaveCompletion>,
    in_flight: Option<u64>,
    pending: Option<SaveDocument>,
    next_id: u64,
    superseded: u64,
}

impl SaveQueue {
    pub fn new(backend: Arc<dyn SaveBackend>) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|index| format!("save-worker-{index}"))
            .build()?;
        let (completed_tx, completed_rx) = mpsc::channel();
        Ok(Self {
            backend,
            pool,
            completed_tx,
            completed_rx,
            in_flight: None,
            pending: None,
            next_id: 0,
            superseded: 0,
        })
    }

    pub fn backend(&self) -> &Arc<dyn SaveBackend> {
        &self.backend
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_none()
    }

    /// Snapshots replaced before they were sent.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }

    pub fn request(&mut self, doc: SaveDocument) {
        if self.in_flight.is_none() {
            self.dispatch(doc);
            return;
        }
        if self.pending.replace(doc).is_some() {
            self.superseded += 1;
            debug!("Pending save replaced by a newer snapshot");
        }
    }

    fn dispatch(&mut self, doc: SaveDocument) {
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight = Some(id);

        let backend = Arc::clone(&self.backend);
        let completed_tx = self.completed_tx.clone();
        self.pool.spawn(move || {
            let started = Instant::now();
            let result = backend.save(&doc);
            let _ = completed_tx.send(SaveCompletion {
                id,
                result,
                elapsed: started.elapsed(),
            });
        });
    }

    fn finish(&mut self, completion: SaveCompletion) -> SaveCompletion {
        if self.in_flight == Some(completion.id) {
            self.in_flight = None;
        }
        match &completion.result {
            Ok(()) => debug!(
                "Save #{} finished in {:.0?}",
                completion.id, completion.elapsed
            ),
            Err(err) if err.is_transient() => {
                warn!("Save #{} failed, will retry on next autosave: {err}", completion.id)
            }
            Err(err) => warn!("Save #{} rejected: {err}", completion.id),
        }
        if let Some(doc) = self.pending.take() {
            self.dispatch(doc);
        }
        completion
    }

    /// Collects finished saves without blocking.
    pub fn poll(&mut self) -> Vec<SaveCompletion> {
        let mut completed = Vec::new();
        while let Ok(completion) = self.completed_rx.try_recv() {
            completed.push(self.finish(completion));
        }
        completed
    }

    /// Blocks until every queued save has finished or `timeout` elapses.
    pub fn flush(&mut self, timeout: Duration) -> Vec<SaveCompletion> {
        let deadline = Instant::now() + timeout;
        let mut completed = self.poll();
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completed_rx.recv_timeout(remaining) {
                Ok(completion) => completed.push(self.finish(completion)),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Gave up waiting for saves after {:?}", timeout);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use islet_persist::{LoadResponse, MemoryBackend, PersistError, SaveBackend, SaveDocument};

    use super::SaveQueue;

    /// Holds every save until the test releases it, recording seeds in arrival order.
    struct GatedBackend {
        gate: Mutex<Receiver<()>>,
        seen: Mutex<Vec<Option<u64>>>,
    }

    impl GatedBackend {
        fn new() -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = mpsc::channel();
            (
                Arc::new(Self {
                    gate: Mutex::new(rx),
                    seen: Mutex::new(Vec::new()),
                }),
                tx,
            )
        }
    }

    impl SaveBackend for GatedBackend {
        fn load(&self) -> Result<LoadResponse, PersistError> {
            Ok(LoadResponse::FirstTime)
        }

        fn save(&self, doc: &SaveDocument) -> Result<(), PersistError> {
            self.gate
                .lock()
                .expect("gate lock")
                .recv()
                .map_err(|_| PersistError::Transport("gate closed".into()))?;
            self.seen.lock().expect("seen lock").push(doc.world_seed);
            Ok(())
        }

        fn describe(&self) -> String {
            "gated".into()
        }
    }

    fn doc(seed: u64) -> SaveDocument {
        SaveDocument {
            version: 2,
            world_seed: Some(seed),
            ..SaveDocument::default()
        }
    }

    #[test]
    fn later_snapshots_replace_the_pending_one() {
        let (backend, gate) = GatedBackend::new();
        let mut queue = SaveQueue::new(backend.clone()).expect("pool");

        queue.request(doc(1));
        queue.request(doc(2));
        queue.request(doc(3));
        assert_eq!(queue.superseded(), 1);
        assert!(!queue.is_idle());

        gate.send(()).expect("release first");
        gate.send(()).expect("release second");
        let completed = queue.flush(Duration::from_secs(5));

        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|c| c.result.is_ok()));
        assert!(queue.is_idle());
        assert_eq!(*backend.seen.lock().expect("seen lock"), vec![Some(1), Some(3)]);
    }

    #[test]
    fn flush_gives_up_after_timeout() {
        let (backend, gate) = GatedBackend::new();
        let mut queue = SaveQueue::new(backend).expect("pool");
        queue.request(doc(1));

        let completed = queue.flush(Duration::from_millis(50));
        assert!(completed.is_empty());
        assert!(!queue.is_idle());

        gate.send(()).expect("release");
        let completed = queue.flush(Duration::from_secs(5));
        assert_eq!(completed.len(), 1);
    }

    #[test]
    fn completed_saves_reach_the_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let mut queue = SaveQueue::new(backend.clone()).expect("pool");
        queue.request(doc(7));
        let completed = queue.flush(Duration::from_secs(5));
        assert_eq!(completed.len(), 1);
        assert_eq!(backend.stored().and_then(|d| d.world_seed), Some(7));
    }
}
