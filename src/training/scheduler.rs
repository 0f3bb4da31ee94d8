use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

/// What a frame callback wants after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Work run once per animation frame.
pub type FrameCallback = Box<dyn FnMut() -> TickControl + Send + 'static>;

/// Source of animation frames for the training loop.
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` once per frame until it returns [`TickControl::Stop`]
    /// or the returned handle is cancelled.
    fn schedule(&self, callback: FrameCallback) -> FrameHandle;
}

/// Cancellation handle for a scheduled callback.
///
/// Dropping the handle cancels the callback as well.
#[derive(Debug)]
pub struct FrameHandle {
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FrameHandle {
    fn new(cancelled: Arc<AtomicBool>, worker: Option<JoinHandle<()>>) -> Self {
        Self { cancelled, worker }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Stop future frames and wait for a frame thread to exit.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            worker.thread().unpark();
            if worker.join().is_err() {
                tracing::warn!("Frame thread panicked");
            }
        }
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drives frames from a dedicated thread at a fixed interval.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    interval: Duration,
}

impl ThreadScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for ThreadScheduler {
    fn schedule(&self, mut callback: FrameCallback) -> FrameHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("training-frames".to_string())
            .spawn(move || {
                loop {
                    thread::park_timeout(interval);
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    if callback() == TickControl::Stop {
                        break;
                    }
                }
            });
        match spawned {
            Ok(worker) => FrameHandle::new(cancelled, Some(worker)),
            Err(err) => {
                tracing::error!("Failed to spawn frame thread: {err}");
                cancelled.store(true, Ordering::SeqCst);
                FrameHandle::new(cancelled, None)
            }
        }
    }
}

struct PendingFrame {
    cancelled: Arc<AtomicBool>,
    callback: FrameCallback,
}

/// Frames delivered by the host, one per [`HostScheduler::run_frame`] call.
///
/// Suited to UI event loops that already repaint every frame, and to tests.
#[derive(Default)]
pub struct HostScheduler {
    pending: Mutex<Vec<PendingFrame>>,
}

impl HostScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live callback once; returns how many ran.
    pub fn run_frame(&self) -> usize {
        let frames = {
            let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());
            std::mem::take(&mut *pending)
        };
        let mut ran = 0;
        let mut survivors = Vec::with_capacity(frames.len());
        for mut frame in frames {
            if frame.cancelled.load(Ordering::SeqCst) {
                continue;
            }
            ran += 1;
            if (frame.callback)() == TickControl::Continue {
                survivors.push(frame);
            }
        }
        let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());
        survivors.append(&mut pending);
        *pending = survivors;
        ran
    }

    /// Callbacks still waiting for frames.
    pub fn pending(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());
        pending
            .iter()
            .filter(|frame| !frame.cancelled.load(Ordering::SeqCst))
            .count()
    }
}

impl FrameScheduler for HostScheduler {
    fn schedule(&self, callback: FrameCallback) -> FrameHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut pending = self.pending.lock().unwrap_or_else(|err| err.into_inner());
        pending.push(PendingFrame {
            cancelled: cancelled.clone(),
            callback,
        });
        FrameHandle::new(cancelled, None)
    }
}
