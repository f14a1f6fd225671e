//! The stage pipeline.
//!
//! A query runs as a chain of stages: one [`InitialStage`], one
//! [`PatternStage`](super::pattern_stage::PatternStage) per pattern block and
//! an optional [`ConstraintStage`](super::constraint_stage::ConstraintStage).
//! Each stage runs on its own worker, reading domains from the pipe its
//! predecessor fills and writing into the pipe its successor reads.
//!
//! # Lifecycle
//!
//! not connected → connected (`connect_from`) → delivering (`deliver`) →
//! closed. Stages are single-use: `deliver` consumes the stage.
//!
//! # Termination
//!
//! A worker closes its output pipe normally once its input is exhausted or
//! the stage has been cancelled, and with the error otherwise. Errors never
//! cross workers any other way.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::domain::Domain;
use super::error::QueryError;
use super::pipe::{PipeReceiver, PipeSender, pipe};
use super::worker::WorkerPool;

/// Observable state of one stage.
///
/// `open` is the cooperative cancellation flag: workers check it and stop
/// early once it is cleared. `closed` is set when the worker has exited.
pub struct StageState {
    label: String,
    open: AtomicBool,
    closed: AtomicBool,
}

impl StageState {
    /// Create the state for a new stage.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            open: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        })
    }

    /// The stage's label, e.g. `pattern[0]`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True until the stage is cancelled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// True once the stage's worker has exited.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Ask the stage to stop.
    pub fn cancel(&self) {
        self.open.store(false, Ordering::Release);
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageState")
            .field("label", &self.label)
            .field("open", &self.is_open())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Marks a stage closed when its worker exits, including by panic.
struct ClosedGuard(Arc<StageState>);

impl Drop for ClosedGuard {
    fn drop(&mut self) {
        self.0.mark_closed();
    }
}

/// Where and how stages start their workers.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pool: &'a WorkerPool,
    capacity: usize,
}

impl<'a> StageContext<'a> {
    /// Create a context spawning on `pool` with pipes of `capacity`.
    #[must_use]
    pub fn new(pool: &'a WorkerPool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: capacity.max(1),
        }
    }

    /// Create a fresh pipe of the configured capacity.
    #[must_use]
    pub fn pipe(&self) -> (PipeSender, PipeReceiver) {
        pipe(self.capacity)
    }

    /// Run a stage body on a worker.
    ///
    /// The body gets the output pipe and returns when its work is done.
    /// `Ok` closes the pipe normally; an error closes it with that error,
    /// except `PipeClosed`, which only means the consumer went away.
    pub fn spawn<F>(&self, state: Arc<StageState>, sink: PipeSender, body: F)
    where
        F: FnOnce(&PipeSender) -> Result<(), QueryError> + Send + 'static,
    {
        self.pool.spawn(move || {
            let _closed = ClosedGuard(Arc::clone(&state));
            debug!(stage = state.label(), "Stage started");
            match body(&sink) {
                Ok(()) => {
                    debug!(stage = state.label(), "Stage finished");
                    sink.close();
                }
                Err(QueryError::PipeClosed) => {
                    debug!(stage = state.label(), "Stage output closed by consumer");
                }
                Err(error) => {
                    warn!(stage = state.label(), %error, "Stage failed");
                    sink.close_with(error);
                }
            }
        });
    }
}

/// One unit of the pipeline.
pub trait Stage: Send {
    /// This stage's observable state.
    fn state(&self) -> Arc<StageState>;

    /// Start producing into `sink`.
    ///
    /// Delivers the previous stage into a fresh pipe, then spawns this
    /// stage's worker. Returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `StageNotConnected` if the stage needs a predecessor and has
    /// none.
    fn deliver(self: Box<Self>, sink: PipeSender, context: &StageContext<'_>)
    -> Result<(), QueryError>;
}

/// The predecessor link shared by non-initial stages.
#[derive(Default)]
pub struct Upstream {
    previous: Option<Box<dyn Stage>>,
}

impl Upstream {
    /// Wire the predecessor.
    pub fn connect(&mut self, previous: Box<dyn Stage>) {
        self.previous = Some(previous);
    }

    /// True once a predecessor is wired.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.previous.is_some()
    }

    /// Deliver the predecessor into a fresh pipe and return its reading end.
    ///
    /// # Errors
    ///
    /// Returns `StageNotConnected(kind)` if no predecessor is wired.
    pub fn deliver(
        self,
        kind: &'static str,
        context: &StageContext<'_>,
    ) -> Result<PipeReceiver, QueryError> {
        let previous = self.previous.ok_or(QueryError::StageNotConnected(kind))?;
        let (tx, rx) = context.pipe();
        previous.deliver(tx, context)?;
        Ok(rx)
    }
}

impl fmt::Debug for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upstream")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Seeds the pipeline with one all-unset domain.
#[derive(Debug)]
pub struct InitialStage {
    width: usize,
    state: Arc<StageState>,
}

impl InitialStage {
    /// Create a stage emitting one domain of `width` slots.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            state: StageState::new("initial"),
        }
    }
}

impl Stage for InitialStage {
    fn state(&self) -> Arc<StageState> {
        Arc::clone(&self.state)
    }

    fn deliver(
        self: Box<Self>,
        sink: PipeSender,
        context: &StageContext<'_>,
    ) -> Result<(), QueryError> {
        let width = self.width;
        let state = Arc::clone(&self.state);
        context.spawn(self.state, sink, move |sink| {
            if state.is_open() {
                sink.put(Domain::new(width))?;
            }
            Ok(())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_initial_stage_emits_one_empty_domain() {
        let pool = WorkerPool::new(&EngineConfig::default()).expect("pool");
        let context = StageContext::new(&pool, 5);
        let stage = Box::new(InitialStage::new(3));
        let state = stage.state();

        let (tx, rx) = context.pipe();
        stage.deliver(tx, &context).expect("deliver");
        let results: Vec<Domain> = rx.collect::<Result<_, _>>().expect("results");

        assert_eq!(results, vec![Domain::new(3)]);
        assert_eq!(state.label(), "initial");
    }

    #[test]
    fn test_cancelled_initial_stage_emits_nothing() {
        let pool = WorkerPool::new(&EngineConfig::default()).expect("pool");
        let context = StageContext::new(&pool, 5);
        let stage = Box::new(InitialStage::new(1));
        stage.state().cancel();

        let (tx, rx) = context.pipe();
        stage.deliver(tx, &context).expect("deliver");
        assert_eq!(rx.count(), 0);
    }

    #[test]
    fn test_unconnected_upstream() {
        let pool = WorkerPool::new(&EngineConfig::default()).expect("pool");
        let context = StageContext::new(&pool, 5);
        let result = Upstream::default().deliver("pattern", &context);
        assert_eq!(result.err(), Some(QueryError::StageNotConnected("pattern")));
    }

    #[test]
    fn test_state_flags() {
        let state = StageState::new("pattern[0]");
        assert!(state.is_open());
        assert!(!state.is_closed());
        state.cancel();
        assert!(!state.is_open());
        drop(ClosedGuard(Arc::clone(&state)));
        assert!(state.is_closed());
    }
}
