//! Payment confirmation polling.
//!
//! After checkout, the backend learns about the payment out of band. Until
//! then the subscription lookup answers 404. The poller runs a lookup right
//! away and then on a fixed interval until it succeeds, fails with anything
//! other than 404, or the session is cancelled.
//!
//! ```text
//! WAITING ──ok──────────► CONFIRMED   (on_confirmed fires)
//!    │ └──404──► WAITING
//!    ├───────other err──► ERRORED     (on_error fires)
//!    └──cancel / drop───► CANCELLED   (nothing fires)
//! ```
//!
//! Ticks never overlap. A lookup that outlives the interval causes the ticks
//! it overlapped to be skipped; the next one lands on the following multiple
//! of the interval.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use gifmint_core::SubscriptionDetail;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::GifApi;
use crate::context::DEFAULT_POLL_INTERVAL;
use crate::error::ApiError;

/// Shortest interval the poller accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Poll Operation
// ============================================================================

/// The lookup a poll session repeats.
#[async_trait]
pub trait PollOperation: Send + Sync + 'static {
    /// Value delivered on confirmation.
    type Output: Send + 'static;

    /// Runs one lookup.
    async fn run(&self) -> Result<Self::Output, ApiError>;

    /// Returns true if `err` means "not yet" rather than failure.
    fn is_pending(&self, err: &ApiError) -> bool {
        err.is_not_found()
    }
}

/// Polls the caller's subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionLookup {
    api: GifApi,
}

impl SubscriptionLookup {
    /// Creates a lookup over the given client.
    pub fn new(api: GifApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PollOperation for SubscriptionLookup {
    type Output = SubscriptionDetail;

    async fn run(&self) -> Result<SubscriptionDetail, ApiError> {
        self.api.fetch_subscription().await
    }
}

// ============================================================================
// Poll State
// ============================================================================

/// Where a poll session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollState {
    /// Still polling.
    Waiting,
    /// The lookup succeeded.
    Confirmed,
    /// The lookup failed with a non-pending error.
    Errored,
    /// The session was cancelled before a result.
    Cancelled,
}

impl PollState {
    /// Returns true for every state except [`PollState::Waiting`].
    pub fn is_terminal(self) -> bool {
        self != Self::Waiting
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Errored => write!(f, "ERRORED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// State shared between a session handle and its task.
///
/// Every transition leaves `Waiting` under the lock, so exactly one of
/// "deliver a result" and "cancel" can win.
#[derive(Debug)]
struct SharedState {
    state: Mutex<PollState>,
    tx: watch::Sender<PollState>,
}

impl SharedState {
    fn new() -> (Arc<Self>, watch::Receiver<PollState>) {
        let (tx, rx) = watch::channel(PollState::Waiting);
        let shared = Arc::new(Self {
            state: Mutex::new(PollState::Waiting),
            tx,
        });
        (shared, rx)
    }

    fn current(&self) -> PollState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, to: PollState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != PollState::Waiting {
            return false;
        }
        *state = to;
        self.tx.send_replace(to);
        true
    }
}

// ============================================================================
// Callbacks
// ============================================================================

type ConfirmedFn<T> = Box<dyn FnOnce(T) + Send>;
type ErrorFn = Box<dyn FnOnce(ApiError) + Send>;

/// What to call when a session reaches a terminal state.
pub struct PollCallbacks<T> {
    on_confirmed: ConfirmedFn<T>,
    on_error: Option<ErrorFn>,
}

impl<T> PollCallbacks<T> {
    /// Calls `f` with the result on confirmation.
    pub fn on_confirmed(f: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            on_confirmed: Box::new(f),
            on_error: None,
        }
    }

    /// Also calls `f` with the error when the session errors.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(ApiError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl<T> std::fmt::Debug for PollCallbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCallbacks")
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Confirmation Poller
// ============================================================================

/// Starts poll sessions at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPoller {
    interval: Duration,
}

impl ConfirmationPoller {
    /// Creates a poller. Intervals below 10ms are raised to 10ms.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Returns the tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts a session repeating `operation`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<O: PollOperation>(
        &self,
        operation: O,
        callbacks: PollCallbacks<O::Output>,
    ) -> PollSession {
        let (shared, rx) = SharedState::new();
        let cancel = CancellationToken::new();
        let ticks = Arc::new(AtomicU32::new(0));

        debug!(interval_ms = self.interval.as_millis(), "Starting poll session");

        let handle = tokio::spawn(run_session(
            operation,
            self.interval,
            callbacks,
            SessionHandles {
                shared: shared.clone(),
                cancel: cancel.clone(),
                ticks: ticks.clone(),
            },
        ));

        PollSession {
            shared,
            rx,
            cancel,
            ticks,
            handle,
        }
    }

    /// Starts a session polling the caller's subscription.
    pub fn watch_subscription(
        &self,
        api: GifApi,
        callbacks: PollCallbacks<SubscriptionDetail>,
    ) -> PollSession {
        self.start(SubscriptionLookup::new(api), callbacks)
    }
}

impl Default for ConfirmationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

struct SessionHandles {
    shared: Arc<SharedState>,
    cancel: CancellationToken,
    ticks: Arc<AtomicU32>,
}

async fn run_session<O: PollOperation>(
    operation: O,
    interval: Duration,
    callbacks: PollCallbacks<O::Output>,
    handles: SessionHandles,
) {
    let SessionHandles {
        shared,
        cancel,
        ticks,
    } = handles;
    let mut next_tick = Instant::now();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = sleep_until(next_tick) => {}
        }

        let tick = ticks.fetch_add(1, Ordering::SeqCst) + 1;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(tick, "Poll session cancelled with a lookup in flight");
                return;
            }
            result = operation.run() => result,
        };

        match result {
            Ok(output) => {
                if shared.finish(PollState::Confirmed) {
                    info!(tick, "Confirmation observed");
                    (callbacks.on_confirmed)(output);
                }
                return;
            }
            Err(err) if operation.is_pending(&err) => {
                debug!(tick, "Not confirmed yet");
            }
            Err(err) => {
                if shared.finish(PollState::Errored) {
                    warn!(tick, error = %err, "Confirmation lookup failed");
                    if let Some(on_error) = callbacks.on_error {
                        on_error(err);
                    }
                }
                return;
            }
        }

        next_tick += interval;
        let now = Instant::now();
        if next_tick < now {
            let behind = (now - next_tick).as_nanos();
            let skipped = behind.div_ceil(interval.as_nanos());
            next_tick += interval.saturating_mul(u32::try_from(skipped).unwrap_or(u32::MAX));
            debug!(tick, skipped, "Skipped ticks overlapped by a slow lookup");
        }
    }
}

// ============================================================================
// Poll Session
// ============================================================================

/// Handle to a running poll session.
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct PollSession {
    shared: Arc<SharedState>,
    rx: watch::Receiver<PollState>,
    cancel: CancellationToken,
    ticks: Arc<AtomicU32>,
    handle: JoinHandle<()>,
}

impl PollSession {
    /// Returns the current state.
    pub fn state(&self) -> PollState {
        self.shared.current()
    }

    /// Returns how many lookups have been started.
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Returns a receiver that observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.rx.clone()
    }

    /// Cancels the session.
    ///
    /// Returns true if the session was still waiting. Once this returns, no
    /// callback will fire, even if a lookup was in flight.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.finish(PollState::Cancelled);
        self.cancel.cancel();
        if cancelled {
            debug!(ticks = self.ticks(), "Poll session cancelled");
        }
        cancelled
    }

    /// Waits for a terminal state and returns it.
    pub async fn finished(&mut self) -> PollState {
        match self.rx.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.shared.current(),
        }
    }

    /// Returns true once the background task has exited.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    const INTERVAL: Duration = Duration::from_secs(3);

    /// Replays scripted results, then reports "pending" forever.
    struct Scripted {
        script: Mutex<VecDeque<Result<u32, ApiError>>>,
        calls: Arc<AtomicUsize>,
        latency: Duration,
    }

    impl Scripted {
        fn new(script: Vec<Result<u32, ApiError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let op = Self {
                script: Mutex::new(script.into()),
                calls: calls.clone(),
                latency: Duration::ZERO,
            };
            (op, calls)
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }
    }

    #[async_trait]
    impl PollOperation for Scripted {
        type Output = u32;

        async fn run(&self) -> Result<u32, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(not_found()))
        }
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    fn not_found() -> ApiError {
        ApiError::http(404, Some(serde_json::json!({"detail": "Not found."})))
    }

    struct Recorder {
        confirmed: Arc<Mutex<Vec<u32>>>,
        errors: Arc<Mutex<Vec<ApiError>>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                confirmed: Arc::new(Mutex::new(Vec::new())),
                errors: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn callbacks(&self) -> PollCallbacks<u32> {
            let confirmed = self.confirmed.clone();
            let errors = self.errors.clone();
            PollCallbacks::on_confirmed(move |v| confirmed.lock().unwrap().push(v))
                .on_error(move |e| errors.lock().unwrap().push(e))
        }

        fn confirmed(&self) -> Vec<u32> {
            self.confirmed.lock().unwrap().clone()
        }

        fn error_count(&self) -> usize {
            self.errors.lock().unwrap().len()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_two_pending_ticks() {
        let (op, calls) = Scripted::new(vec![Err(not_found()), Err(not_found()), Ok(42)]);
        let recorder = Recorder::new();

        let start = Instant::now();
        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        assert_eq!(session.finished().await, PollState::Confirmed);
        assert_elapsed(start, INTERVAL * 2);

        // Nothing else is scheduled
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.ticks(), 3);
        assert_eq!(recorder.confirmed(), vec![42]);
        assert_eq!(recorder.error_count(), 0);
        assert!(session.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (op, calls) = Scripted::new(vec![Ok(1)]);
        let recorder = Recorder::new();

        let start = Instant::now();
        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        assert_eq!(session.finished().await, PollState::Confirmed);
        assert_elapsed(start, Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_pending_error_is_terminal() {
        let (op, calls) = Scripted::new(vec![Err(not_found()), Err(ApiError::http(500, None))]);
        let recorder = Recorder::new();

        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        assert_eq!(session.finished().await, PollState::Errored);
        tokio::time::sleep(INTERVAL * 5).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.error_count(), 1);
        assert_eq!(recorder.errors.lock().unwrap()[0].status, Some(500));
        assert!(recorder.confirmed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_is_terminal() {
        let (op, _calls) = Scripted::new(vec![Err(ApiError::network("connection reset"))]);
        let mut session =
            ConfirmationPoller::new(INTERVAL).start(op, PollCallbacks::on_confirmed(|_| {}));

        assert_eq!(session.finished().await, PollState::Errored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_between_ticks() {
        let (op, calls) = Scripted::new(vec![]);
        let recorder = Recorder::new();
        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(session.state(), PollState::Waiting);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(session.cancel());
        assert_eq!(session.finished().await, PollState::Cancelled);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(recorder.confirmed().is_empty());
        assert_eq!(recorder.error_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_with_lookup_in_flight() {
        let (op, calls) = Scripted::new(vec![Ok(7)]);
        let op = op.with_latency(Duration::from_secs(10));
        let recorder = Recorder::new();
        let session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), PollState::Waiting);

        assert!(session.cancel());

        // The in-flight lookup would have succeeded at t=10s
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.state(), PollState::Cancelled);
        assert!(recorder.confirmed().is_empty());
        assert!(session.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_terminal_is_noop() {
        let (op, _calls) = Scripted::new(vec![Ok(1)]);
        let recorder = Recorder::new();
        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        assert_eq!(session.finished().await, PollState::Confirmed);
        assert!(!session.cancel());
        assert_eq!(session.state(), PollState::Confirmed);
        assert_eq!(recorder.confirmed(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_cancels() {
        let (op, calls) = Scripted::new(vec![]);
        let recorder = Recorder::new();
        let session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());
        let mut states = session.subscribe();

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(session);

        states.changed().await.unwrap();
        assert_eq!(*states.borrow(), PollState::Cancelled);

        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_skips_overlapped_ticks() {
        // First lookup takes 5s, overlapping the tick at 3s; the next tick
        // lands at 6s rather than firing late at 5s.
        let (op, calls) = Scripted::new(vec![Err(not_found()), Ok(9)]);
        let op = SlowFirst {
            inner: op,
            first_latency: Duration::from_secs(5),
        };
        let recorder = Recorder::new();

        let start = Instant::now();
        let mut session = ConfirmationPoller::new(INTERVAL).start(op, recorder.callbacks());

        assert_eq!(session.finished().await, PollState::Confirmed);
        assert_elapsed(start, Duration::from_secs(6));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(recorder.confirmed(), vec![9]);
    }

    struct SlowFirst {
        inner: Scripted,
        first_latency: Duration,
    }

    #[async_trait]
    impl PollOperation for SlowFirst {
        type Output = u32;

        async fn run(&self) -> Result<u32, ApiError> {
            if self.inner.calls.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(self.first_latency).await;
            }
            self.inner.run().await
        }
    }

    #[test]
    fn test_interval_floor() {
        assert_eq!(ConfirmationPoller::new(Duration::ZERO).interval(), MIN_INTERVAL);
        assert_eq!(ConfirmationPoller::default().interval(), Duration::from_millis(3000));
    }
}
