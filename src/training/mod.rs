//! Frame-paced training loop for the numeric engine.
//!
//! Each frame locks the engine, checks that its generation is still current
//! and runs a batch of gradient descent steps. Pausing bumps the generation
//! under the same lock, so once [`TrainingLoop::pause`] returns no frame from
//! the previous run can touch the model again.

mod scheduler;

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU64, Ordering},
};

use crate::config::Cadence;
use crate::engine::NumericEngine;

pub use scheduler::{
    FrameCallback, FrameHandle, FrameScheduler, HostScheduler, ThreadScheduler, TickControl,
};

/// Numeric engine shared between the controller and frame callbacks.
pub type SharedEngine = Arc<Mutex<NumericEngine>>;

/// Lock the shared engine, recovering from a poisoned lock.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, NumericEngine> {
    engine.lock().unwrap_or_else(|err| err.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Idle,
    Running,
}

/// Starts and stops frame callbacks that advance the shared engine.
pub struct TrainingLoop {
    engine: SharedEngine,
    scheduler: Arc<dyn FrameScheduler>,
    cadence: Cadence,
    generation: Arc<AtomicU64>,
    handle: Option<FrameHandle>,
}

impl TrainingLoop {
    pub fn new(engine: SharedEngine, scheduler: Arc<dyn FrameScheduler>, cadence: Cadence) -> Self {
        Self {
            engine,
            scheduler,
            cadence,
            generation: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn state(&self) -> TrainingState {
        if self.handle.is_some() {
            TrainingState::Running
        } else {
            TrainingState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TrainingState::Running
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Replace the pacing; a running loop restarts with the new cadence.
    pub fn set_cadence(&mut self, cadence: Cadence) {
        if self.cadence == cadence {
            return;
        }
        self.cadence = cadence;
        if self.is_running() {
            self.pause();
            self.start();
        }
    }

    /// Begin scheduling frames. Returns `false` when already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let generation = {
            let _engine = lock_engine(&self.engine);
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        let current = self.generation.clone();
        let engine = self.engine.clone();
        let cadence = self.cadence;
        let callback: FrameCallback = Box::new(move || {
            let mut engine = lock_engine(&engine);
            if current.load(Ordering::SeqCst) != generation {
                return TickControl::Stop;
            }
            let steps = cadence.steps_per_frame(engine.dataset().len());
            engine.train_steps(steps);
            TickControl::Continue
        });
        self.handle = Some(self.scheduler.schedule(callback));
        tracing::debug!("Training started (generation {generation})");
        true
    }

    /// Stop scheduling frames. Returns `false` when already idle.
    ///
    /// A frame already holding the engine lock finishes first; no later frame
    /// of this run applies.
    pub fn pause(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        {
            let _engine = lock_engine(&self.engine);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        handle.cancel();
        tracing::debug!("Training paused");
        true
    }

    pub fn toggle(&mut self) -> TrainingState {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
        self.state()
    }
}

impl Drop for TrainingLoop {
    fn drop(&mut self) {
        self.pause();
    }
}
