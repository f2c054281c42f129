//! Startup database connector with bounded exponential backoff.
//!
//! The connector opens a connection, verifies it with a liveness probe and
//! hands it to the caller. Every failure, whether opening or probing, costs
//! one attempt and is followed by a backoff wait that doubles each time.
//! Once the attempt budget is spent the last failure is returned.
//!
//! ```text
//! Idle -> Attempting -> Probing -> Connected
//!            ^  |          |
//!            +--+----------+   (failure, attempts remain)
//! Attempting / Probing -> Exhausted   (budget spent)
//! ```
//!
//! Backoff waits can be interrupted with [`Connector::connect_until`], which
//! races every attempt and wait against a shutdown future.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DbErr;

use super::error::{AttemptError, AttemptStage, ConnectError};
use super::params::ConnectionParameters;
use crate::config::{
    RetryConfig, BACKOFF_MULTIPLIER, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_CONNECT_ATTEMPTS,
};

/// Something the connector can open, probe and release connections against.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Live handle returned to the caller
    type Handle: Send + Sync;

    /// Open a new connection.
    async fn open(&self, params: &ConnectionParameters) -> Result<Self::Handle, DbErr>;

    /// Round-trip check on an opened connection.
    async fn probe(&self, handle: &Self::Handle) -> Result<(), DbErr>;

    /// Release a connection that failed its probe.
    async fn release(&self, handle: Self::Handle);
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CONNECT_ATTEMPTS,
            Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        )
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
        )
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait that follows failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Total time spent waiting when every attempt fails.
    pub fn worst_case_wait(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.backoff_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Connector lifecycle, reported in debug logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Idle,
    Attempting,
    Probing,
    Connected,
    Exhausted,
    Cancelled,
}

impl std::fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectorState::Idle => "idle",
            ConnectorState::Attempting => "attempting",
            ConnectorState::Probing => "probing",
            ConnectorState::Connected => "connected",
            ConnectorState::Exhausted => "exhausted",
            ConnectorState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Connected,
    Failed { stage: AttemptStage, cause: String },
}

/// One log record per attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt ordinal
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    /// Wait before the next attempt (failures only)
    pub backoff: Option<Duration>,
}

impl AttemptRecord {
    fn connected(attempt: u32) -> Self {
        Self {
            attempt,
            outcome: AttemptOutcome::Connected,
            backoff: None,
        }
    }

    fn failed(attempt: u32, error: &AttemptError, backoff: Duration) -> Self {
        Self {
            attempt,
            outcome: AttemptOutcome::Failed {
                stage: error.stage(),
                cause: error.cause().to_string(),
            },
            backoff: Some(backoff),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Connected)
    }
}

/// Sink for attempt records, injected into the connector.
pub trait AttemptLog: Send + Sync {
    fn record(&self, record: &AttemptRecord);
}

impl<T: AttemptLog + ?Sized> AttemptLog for Arc<T> {
    fn record(&self, record: &AttemptRecord) {
        (**self).record(record)
    }
}

/// Emits attempt records as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAttemptLog;

impl AttemptLog for TracingAttemptLog {
    fn record(&self, record: &AttemptRecord) {
        match &record.outcome {
            AttemptOutcome::Connected => {
                tracing::info!(
                    attempt = record.attempt,
                    outcome = "connected",
                    "Connect database success"
                );
            }
            AttemptOutcome::Failed { stage, cause } => {
                tracing::warn!(
                    attempt = record.attempt,
                    outcome = "failed",
                    stage = %stage,
                    error = %cause,
                    backoff_ms = record.backoff.map(|b| b.as_millis() as u64),
                    "Failed to connect to database"
                );
            }
        }
    }
}

/// Startup connector. Holds no handle between calls.
pub struct Connector<D, L = TracingAttemptLog> {
    datastore: D,
    policy: RetryPolicy,
    log: L,
}

impl<D: Datastore> Connector<D> {
    pub fn new(datastore: D) -> Self {
        Self {
            datastore,
            policy: RetryPolicy::default(),
            log: TracingAttemptLog,
        }
    }
}

impl<D: Datastore, L: AttemptLog> Connector<D, L> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_log<L2: AttemptLog>(self, log: L2) -> Connector<D, L2> {
        Connector {
            datastore: self.datastore,
            policy: self.policy,
            log,
        }
    }

    /// Obtain a verified handle, waiting out the full backoff schedule if needed.
    ///
    /// # Errors
    /// Returns [`ConnectError::Exhausted`] with the last failure once every
    /// attempt has failed.
    pub async fn connect(&self, params: &ConnectionParameters) -> Result<D::Handle, ConnectError> {
        self.connect_until(params, std::future::pending()).await
    }

    /// Like [`connect`](Self::connect), but gives up as soon as `shutdown` resolves.
    ///
    /// # Errors
    /// Returns [`ConnectError::Cancelled`] when `shutdown` completes first,
    /// otherwise the same errors as `connect`.
    pub async fn connect_until<S>(
        &self,
        params: &ConnectionParameters,
        shutdown: S,
    ) -> Result<D::Handle, ConnectError>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut attempt: u32 = 1;
        let mut backoff = self.policy.initial_backoff;
        transition(ConnectorState::Idle, ConnectorState::Attempting, attempt);
        tracing::debug!(
            params = %params.descriptor(),
            max_attempts = self.policy.max_attempts(),
            worst_case_wait_ms = self.policy.worst_case_wait().as_millis() as u64,
            "Connecting to database"
        );

        loop {
            let result = tokio::select! {
                biased;
                _ = &mut shutdown => return Err(self.cancelled(attempt)),
                result = self.attempt(params, attempt) => result,
            };

            let error = match result {
                Ok(handle) => {
                    self.log.record(&AttemptRecord::connected(attempt));
                    transition(ConnectorState::Probing, ConnectorState::Connected, attempt);
                    return Ok(handle);
                }
                Err(error) => error,
            };

            self.log.record(&AttemptRecord::failed(attempt, &error, backoff));

            tokio::select! {
                biased;
                _ = &mut shutdown => return Err(self.cancelled(attempt)),
                _ = tokio::time::sleep(backoff) => {}
            }

            if attempt >= self.policy.max_attempts {
                transition(ConnectorState::Attempting, ConnectorState::Exhausted, attempt);
                return Err(ConnectError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            attempt += 1;
            backoff = backoff.saturating_mul(BACKOFF_MULTIPLIER);
            transition(ConnectorState::Attempting, ConnectorState::Attempting, attempt);
        }
    }

    async fn attempt(
        &self,
        params: &ConnectionParameters,
        attempt: u32,
    ) -> Result<D::Handle, AttemptError> {
        let handle = self
            .datastore
            .open(params)
            .await
            .map_err(AttemptError::Open)?;

        transition(ConnectorState::Attempting, ConnectorState::Probing, attempt);

        match self.datastore.probe(&handle).await {
            Ok(()) => Ok(handle),
            Err(e) => {
                self.datastore.release(handle).await;
                Err(AttemptError::Probe(e))
            }
        }
    }

    fn cancelled(&self, attempt: u32) -> ConnectError {
        transition(ConnectorState::Attempting, ConnectorState::Cancelled, attempt);
        tracing::warn!(attempt, "Database connection cancelled by shutdown signal");
        ConnectError::Cancelled { attempt }
    }
}

fn transition(from: ConnectorState, to: ConnectorState, attempt: u32) {
    tracing::debug!(%from, %to, attempt, "Connector state change");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;
    use tokio_test::{assert_err, assert_ok};

    use crate::infra::db::params::SslMode;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        OpenFails,
        ProbeFails,
        Healthy,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct FakeHandle {
        id: u32,
        healthy: bool,
    }

    /// Datastore that follows a script, then stays healthy.
    #[derive(Default)]
    struct ScriptedDatastore {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
        released: Mutex<Vec<u32>>,
    }

    impl ScriptedDatastore {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: Mutex::new(steps.into_iter().collect()),
                ..Default::default()
            }
        }

        fn never_reachable() -> Self {
            Self::new(std::iter::repeat(Step::OpenFails).take(100))
        }

        fn opens(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn released(&self) -> Vec<u32> {
            self.released.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Datastore for Arc<ScriptedDatastore> {
        type Handle = FakeHandle;

        async fn open(&self, _params: &ConnectionParameters) -> Result<FakeHandle, DbErr> {
            let id = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Healthy);
            match step {
                Step::OpenFails => Err(DbErr::Custom(format!("attempt {id}: connection refused"))),
                Step::ProbeFails => Ok(FakeHandle { id, healthy: false }),
                Step::Healthy => Ok(FakeHandle { id, healthy: true }),
            }
        }

        async fn probe(&self, handle: &FakeHandle) -> Result<(), DbErr> {
            if handle.healthy {
                Ok(())
            } else {
                Err(DbErr::Custom(format!("attempt {}: ping timed out", handle.id)))
            }
        }

        async fn release(&self, handle: FakeHandle) {
            self.released.lock().unwrap().push(handle.id);
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        records: Mutex<Vec<AttemptRecord>>,
    }

    impl RecordingLog {
        fn records(&self) -> Vec<AttemptRecord> {
            self.records.lock().unwrap().clone()
        }

        fn failures(&self) -> usize {
            self.records().iter().filter(|r| !r.is_success()).count()
        }

        fn successes(&self) -> usize {
            self.records().iter().filter(|r| r.is_success()).count()
        }
    }

    impl AttemptLog for RecordingLog {
        fn record(&self, record: &AttemptRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    fn params() -> ConnectionParameters {
        ConnectionParameters::new("localhost", 5432, "author", "authors_db", "secret", SslMode::Disable)
    }

    fn connector(
        store: &Arc<ScriptedDatastore>,
        log: &Arc<RecordingLog>,
    ) -> Connector<Arc<ScriptedDatastore>, Arc<RecordingLog>> {
        Connector::new(store.clone()).with_log(log.clone())
    }

    #[test]
    fn default_policy_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.backoff_for(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(5), Duration::from_secs(16));
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(31));
    }

    #[test]
    fn policy_always_allows_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_datastore_connects_on_first_attempt() {
        let store = Arc::new(ScriptedDatastore::default());
        let log = Arc::new(RecordingLog::default());
        let start = Instant::now();

        let handle = assert_ok!(connector(&store, &log).connect(&params()).await);

        assert_eq!(handle, FakeHandle { id: 1, healthy: true });
        assert_eq!(store.opens(), 1);
        assert_eq!(log.records(), vec![AttemptRecord::connected(1)]);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_fourth_attempt_after_seven_seconds() {
        let store = Arc::new(ScriptedDatastore::new([
            Step::OpenFails,
            Step::OpenFails,
            Step::OpenFails,
        ]));
        let log = Arc::new(RecordingLog::default());
        let start = Instant::now();

        let handle = assert_ok!(connector(&store, &log).connect(&params()).await);

        assert_eq!(handle.id, 4);
        assert_eq!(store.opens(), 4);
        assert_eq!(log.failures(), 3);
        assert_eq!(log.successes(), 1);
        assert!(log.records().last().unwrap().is_success());
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_grow_with_each_failure() {
        let store = Arc::new(ScriptedDatastore::new([Step::OpenFails, Step::OpenFails]));
        let log = Arc::new(RecordingLog::default());

        assert_ok!(connector(&store, &log).connect(&params()).await);

        let backoffs: Vec<_> = log.records().iter().map(|r| r.backoff).collect();
        assert_eq!(
            backoffs,
            vec![
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                None
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn never_reachable_exhausts_after_five_attempts() {
        let store = Arc::new(ScriptedDatastore::never_reachable());
        let log = Arc::new(RecordingLog::default());
        let start = Instant::now();

        let err = assert_err!(connector(&store, &log).connect(&params()).await);

        assert_eq!(store.opens(), 5);
        assert_eq!(log.failures(), 5);
        assert_eq!(log.successes(), 0);
        assert_eq!(start.elapsed(), Duration::from_secs(31));
        match err {
            ConnectError::Exhausted { attempts, source } => {
                assert_eq!(attempts, 5);
                assert_eq!(source.stage(), AttemptStage::Open);
                assert!(source.to_string().contains("attempt 5"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_probe_counts_like_failing_open() {
        let store = Arc::new(ScriptedDatastore::new(
            std::iter::repeat(Step::ProbeFails).take(10),
        ));
        let log = Arc::new(RecordingLog::default());

        let err = assert_err!(connector(&store, &log).connect(&params()).await);

        assert_eq!(store.opens(), 5);
        assert_eq!(store.released(), vec![1, 2, 3, 4, 5]);
        let last = err.last_attempt_error().unwrap();
        assert_eq!(last.stage(), AttemptStage::Probe);
        assert!(last.to_string().contains("attempt 5"));
        assert!(log.records().iter().all(|r| matches!(
            r.outcome,
            AttemptOutcome::Failed { stage: AttemptStage::Probe, .. }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_then_recovery_releases_only_the_bad_handle() {
        let store = Arc::new(ScriptedDatastore::new([Step::ProbeFails]));
        let log = Arc::new(RecordingLog::default());

        let handle = assert_ok!(connector(&store, &log).connect(&params()).await);

        assert_eq!(handle.id, 2);
        assert_eq!(store.released(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_calls_produce_independent_handles() {
        let store = Arc::new(ScriptedDatastore::default());
        let log = Arc::new(RecordingLog::default());
        let connector = connector(&store, &log);

        let first = assert_ok!(connector.connect(&params()).await);
        let second = assert_ok!(connector.connect(&params()).await);

        assert_ne!(first.id, second.id);
        assert_eq!(log.successes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_policy_limits_attempts() {
        let store = Arc::new(ScriptedDatastore::never_reachable());
        let log = Arc::new(RecordingLog::default());
        let start = Instant::now();

        let err = assert_err!(
            connector(&store, &log)
                .with_policy(RetryPolicy::new(2, Duration::from_millis(100)))
                .connect(&params())
                .await
        );

        assert!(matches!(err, ConnectError::Exhausted { attempts: 2, .. }));
        assert_eq!(store.opens(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_backoff() {
        let store = Arc::new(ScriptedDatastore::never_reachable());
        let log = Arc::new(RecordingLog::default());
        let start = Instant::now();

        let err = assert_err!(
            connector(&store, &log)
                .connect_until(&params(), tokio::time::sleep(Duration::from_millis(1_500)))
                .await
        );

        assert!(matches!(err, ConnectError::Cancelled { attempt: 2 }));
        assert_eq!(store.opens(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(1_500));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_already_signalled_makes_no_attempt() {
        let store = Arc::new(ScriptedDatastore::default());
        let log = Arc::new(RecordingLog::default());

        let err = assert_err!(
            connector(&store, &log)
                .connect_until(&params(), std::future::ready(()))
                .await
        );

        assert!(matches!(err, ConnectError::Cancelled { attempt: 1 }));
        assert_eq!(store.opens(), 0);
        assert!(log.records().is_empty());
    }

    /// In-memory writer for capturing formatted events.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn emitted_fields(records: &[AttemptRecord]) -> Vec<serde_json::Value> {
        let buffer = Captured::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            for record in records {
                TracingAttemptLog.record(record);
            }
        });

        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["fields"].clone())
            .collect()
    }

    #[test]
    fn tracing_log_emits_attempt_outcome_and_error_fields() {
        let error = AttemptError::Open(DbErr::Custom("connection refused".into()));
        let fields = emitted_fields(&[
            AttemptRecord::failed(1, &error, Duration::from_secs(1)),
            AttemptRecord::connected(2),
        ]);

        assert_eq!(fields.len(), 2);

        assert_eq!(fields[0]["attempt"], 1);
        assert_eq!(fields[0]["outcome"], "failed");
        assert_eq!(fields[0]["stage"], "open");
        assert!(fields[0]["error"].as_str().unwrap().contains("connection refused"));
        assert_eq!(fields[0]["backoff_ms"], 1000);

        assert_eq!(fields[1]["attempt"], 2);
        assert_eq!(fields[1]["outcome"], "connected");
        assert!(fields[1].get("error").is_none());
    }
}
