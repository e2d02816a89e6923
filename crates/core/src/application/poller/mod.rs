// Task Poller - wait-until-terminal loop

mod cancel;
pub mod constants;

pub use cancel::{cancel_channel, CancelHandle, CancelToken};

use crate::application::tasks::TaskService;
use crate::domain::{Task, TaskId, TaskRef};
use crate::error::{MeiliError, Result};
use crate::port::Transport;
use constants::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Polling cadence for one wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Hard upper bound on wall-clock wait
    pub timeout: Duration,
    /// Pause between two status fetches
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MeiliError::InvalidArgument(
                "polling interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on status fetches for one wait: `ceil(timeout / interval) + 1`
    pub fn max_fetches(&self) -> u64 {
        let timeout = self.timeout.as_nanos();
        let interval = self.interval.as_nanos().max(1);
        (timeout.div_ceil(interval) + 1) as u64
    }
}

/// Task poller
///
/// Each call to [`TaskPoller::wait_for`] owns its timer and fetch cycle; the
/// poller itself holds nothing mutable, so it can be cloned and shared freely
/// between concurrent waits.
#[derive(Clone)]
pub struct TaskPoller {
    tasks: TaskService,
    defaults: PollOptions,
}

impl TaskPoller {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_defaults(transport, PollOptions::default())
    }

    pub fn with_defaults(transport: Arc<dyn Transport>, defaults: PollOptions) -> Self {
        Self {
            tasks: TaskService::new(transport),
            defaults,
        }
    }

    pub fn defaults(&self) -> PollOptions {
        self.defaults
    }

    /// Wait until the task is `processed` or `failed`.
    ///
    /// Returns the terminal snapshot (a failed task is still `Ok`), or
    /// `PollTimeout` carrying the last observation. Transport errors during a
    /// fetch are returned immediately, without retry.
    ///
    /// # Example
    /// ```text
    /// let task = index.add_documents(&movies, None).await?;
    /// let done = poller.wait_for("movies", task.id, None).await?;
    /// assert!(done.is_terminal());
    /// ```
    pub async fn wait_for(
        &self,
        index_uid: &str,
        task_id: TaskId,
        options: Option<PollOptions>,
    ) -> Result<Task> {
        self.poll(index_uid, task_id, options, None).await
    }

    /// Like [`TaskPoller::wait_for`], but a `failed` task becomes `TaskFailed`
    pub async fn wait_for_success(
        &self,
        index_uid: &str,
        task_id: TaskId,
        options: Option<PollOptions>,
    ) -> Result<Task> {
        self.wait_for(index_uid, task_id, options)
            .await?
            .into_result()
    }

    /// Like [`TaskPoller::wait_for`], but gives up with `Cancelled` as soon as
    /// `cancel` fires. A fetch already in flight is allowed to finish.
    pub async fn wait_with_cancel(
        &self,
        index_uid: &str,
        task_id: TaskId,
        options: Option<PollOptions>,
        cancel: CancelToken,
    ) -> Result<Task> {
        self.poll(index_uid, task_id, options, Some(cancel)).await
    }

    /// Wait for several tasks concurrently; each wait is independent.
    ///
    /// Fails with the first error observed.
    pub async fn wait_all(&self, tasks: &[TaskRef], options: Option<PollOptions>) -> Result<Vec<Task>> {
        futures::future::try_join_all(
            tasks
                .iter()
                .map(|t| self.wait_for(&t.index_uid, t.task_id, options)),
        )
        .await
    }

    async fn poll(
        &self,
        index_uid: &str,
        task_id: TaskId,
        options: Option<PollOptions>,
        mut cancel: Option<CancelToken>,
    ) -> Result<Task> {
        let options = options.unwrap_or(self.defaults);
        options.validate()?;

        let started = Instant::now();
        let mut previous: Option<Task> = None;
        let mut fetches: u64 = 0;

        loop {
            let task = self.tasks.get_task(index_uid, task_id).await?;
            fetches += 1;

            if let Some(prev) = &previous {
                prev.check_transition(&task)?;
            }

            debug!(
                index_uid = %index_uid,
                task_id = %task_id,
                status = %task.status,
                fetches = %fetches,
                "Observed task"
            );

            if task.is_terminal() {
                info!(
                    index_uid = %index_uid,
                    task_id = %task_id,
                    status = %task.status,
                    fetches = %fetches,
                    elapsed_ms = %started.elapsed().as_millis(),
                    "Task resolved"
                );
                return Ok(task);
            }

            let elapsed = started.elapsed();
            if elapsed >= options.timeout {
                warn!(
                    index_uid = %index_uid,
                    task_id = %task_id,
                    status = %task.status,
                    fetches = %fetches,
                    timeout_ms = %options.timeout.as_millis(),
                    "Timed out waiting for task"
                );
                return Err(MeiliError::PollTimeout {
                    task: Box::new(task),
                    timeout: options.timeout,
                });
            }

            // Clamp so the last observation lands on the deadline
            let pause = options.interval.min(options.timeout - elapsed);
            match cancel.as_mut() {
                Some(token) => {
                    tokio::select! {
                        _ = sleep(pause) => {},
                        _ = token.cancelled() => {
                            info!(index_uid = %index_uid, task_id = %task_id, "Polling cancelled");
                            return Err(MeiliError::Cancelled { last_seen: Box::new(task) });
                        }
                    }
                }
                None => sleep(pause).await,
            }

            previous = Some(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, TaskStatus};
    use crate::port::mocks::ScriptedTransport;
    use crate::port::{ApiError, HttpMethod, TransportError};
    use serde_json::json;

    const TASK_PATH: &str = "/indexes/movies/tasks/1";

    fn task_body(status: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "indexUid": "movies",
            "type": "documentAddition",
            "status": status,
            "enqueuedAt": "2021-08-10T14:29:17Z"
        })
    }

    fn failed_body() -> serde_json::Value {
        let mut body = task_body("failed");
        body["error"] = json!({ "message": "document id is missing", "code": "missing_document_id" });
        body
    }

    fn scripted(statuses: &[&str]) -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        for status in statuses {
            transport.push_json(HttpMethod::Get, TASK_PATH, 200, task_body(status));
        }
        transport
    }

    fn opts(timeout_ms: u64, interval_ms: u64) -> Option<PollOptions> {
        Some(PollOptions::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        ))
    }

    #[test]
    fn test_max_fetches_bound() {
        assert_eq!(opts(1000, 300).unwrap().max_fetches(), 5);
        assert_eq!(opts(1000, 250).unwrap().max_fetches(), 5);
        assert_eq!(opts(0, 100).unwrap().max_fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_on_first_fetch_returns_without_waiting() {
        let transport = scripted(&["processed"]);
        let poller = TaskPoller::new(transport.clone());

        let started = Instant::now();
        let task = poller.wait_for("movies", 1, opts(1000, 100)).await.unwrap();

        assert_eq!(task.status, TaskStatus::Processed);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_lifecycle_until_processed() {
        let transport = scripted(&["enqueued", "processing", "processing", "processed"]);
        let poller = TaskPoller::new(transport.clone());

        let task = poller.wait_for("movies", 1, opts(5000, 100)).await.unwrap();

        assert_eq!(task.status, TaskStatus::Processed);
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task_is_returned_not_raised() {
        let transport = scripted(&["processing"]);
        transport.push_json(HttpMethod::Get, TASK_PATH, 200, failed_body());
        let poller = TaskPoller::new(transport.clone());

        let task = poller.wait_for("movies", 1, opts(5000, 100)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.failure_message(), "document id is missing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_success_raises_task_failed() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(HttpMethod::Get, TASK_PATH, 200, failed_body());
        let poller = TaskPoller::new(transport);

        let err = poller
            .wait_for_success("movies", 1, opts(5000, 100))
            .await
            .unwrap_err();
        match err {
            MeiliError::TaskFailed { task } => {
                assert_eq!(
                    task.error.and_then(|e| e.code).as_deref(),
                    Some("missing_document_id")
                );
            }
            other => panic!("expected TaskFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_carries_last_processing_snapshot() {
        let transport = scripted(&["enqueued", "processing"]);
        let poller = TaskPoller::new(transport.clone());
        let options = opts(1000, 300);

        let started = Instant::now();
        let err = poller.wait_for("movies", 1, options).await.unwrap_err();

        match err {
            MeiliError::PollTimeout { task, timeout } => {
                assert_eq!(task.status, TaskStatus::Processing);
                assert_eq!(timeout, Duration::from_millis(1000));
            }
            other => panic!("expected PollTimeout, got {other:?}"),
        }
        let calls = transport.call_count() as u64;
        assert!(calls >= 4, "expected repeated polling, got {calls}");
        assert!(calls <= options.unwrap().max_fetches());
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() < Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_bound_holds_for_many_cadences() {
        for (timeout_ms, interval_ms) in [(100, 100), (100, 30), (1000, 7), (50, 200), (0, 10)] {
            let transport = scripted(&["processing"]);
            let poller = TaskPoller::new(transport.clone());
            let options = opts(timeout_ms, interval_ms);

            let result = poller.wait_for("movies", 1, options).await;
            assert!(matches!(result, Err(MeiliError::PollTimeout { .. })));
            assert!(
                transport.call_count() as u64 <= options.unwrap().max_fetches(),
                "timeout={timeout_ms} interval={interval_ms} fetches={}",
                transport.call_count()
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_fetch_at_deadline_is_honored() {
        // Second fetch starts before the deadline and completes after it
        let transport = Arc::new(ScriptedTransport::new().with_latency(Duration::from_millis(500)));
        transport.push_json(HttpMethod::Get, TASK_PATH, 200, task_body("processing"));
        transport.push_json(HttpMethod::Get, TASK_PATH, 200, task_body("processed"));
        let poller = TaskPoller::new(transport.clone());

        let started = Instant::now();
        let task = poller.wait_for("movies", 1, opts(1000, 400)).await.unwrap();

        assert_eq!(task.status, TaskStatus::Processed);
        assert_eq!(transport.call_count(), 2);
        assert!(started.elapsed() > Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_propagates_without_retry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(HttpMethod::Get, TASK_PATH, 200, task_body("processing"));
        transport.push_error(
            HttpMethod::Get,
            TASK_PATH,
            TransportError::from_status(ApiError::new(503, "overloaded")),
        );
        let poller = TaskPoller::new(transport.clone());

        let err = poller.wait_for("movies", 1, opts(5000, 100)).await.unwrap_err();

        assert!(matches!(
            err,
            MeiliError::Transport(TransportError::Server(_))
        ));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_task_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        let poller = TaskPoller::new(transport.clone());

        let err = poller.wait_for("movies", 1, None).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_regression_is_rejected() {
        let transport = scripted(&["processing", "enqueued"]);
        let poller = TaskPoller::new(transport);

        let err = poller.wait_for("movies", 1, opts(5000, 100)).await.unwrap_err();
        assert!(matches!(
            err,
            MeiliError::Domain(DomainError::StatusRegression { task_id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let transport = scripted(&["processing"]);
        let poller = TaskPoller::new(transport.clone());

        let err = poller.wait_for("movies", 1, opts(100, 0)).await.unwrap_err();
        assert!(matches!(err, MeiliError::InvalidArgument(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_defaults_apply_when_no_options_given() {
        let transport = scripted(&["processing"]);
        let poller = TaskPoller::with_defaults(
            transport.clone(),
            PollOptions::new(Duration::from_millis(200), Duration::from_millis(100)),
        );

        let err = poller.wait_for("movies", 1, None).await.unwrap_err();
        assert!(matches!(err, MeiliError::PollTimeout { .. }));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let transport = scripted(&["processing"]);
        let poller = TaskPoller::new(transport.clone());
        let (handle, token) = cancel_channel();

        let waiter = {
            let poller = poller.clone();
            tokio::spawn(async move {
                poller
                    .wait_with_cancel("movies", 1, opts(60_000, 100), token)
                    .await
            })
        };

        sleep(Duration::from_millis(250)).await;
        handle.cancel();
        let err = waiter.await.unwrap().unwrap_err();

        match err {
            MeiliError::Cancelled { last_seen } => {
                assert_eq!(last_seen.status, TaskStatus::Processing)
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
        let calls = transport.call_count();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.call_count(), calls, "no fetch after cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_all_polls_independently() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(HttpMethod::Get, "/indexes/a/tasks/0", 200, json!({ "id": 0, "status": "processed" }));
        for status in ["enqueued", "processing", "processed"] {
            transport.push_json(HttpMethod::Get, "/indexes/b/tasks/0", 200, json!({ "id": 0, "status": status }));
        }
        let poller = TaskPoller::new(transport.clone());

        let tasks = poller
            .wait_all(&[TaskRef::new("a", 0), TaskRef::new("b", 0)], opts(5000, 100))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].index_uid.as_deref(), Some("a"));
        assert_eq!(tasks[1].index_uid.as_deref(), Some("b"));
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Processed));
        assert_eq!(transport.calls_to(HttpMethod::Get, "/indexes/a/tasks/0"), 1);
        assert_eq!(transport.calls_to(HttpMethod::Get, "/indexes/b/tasks/0"), 3);
    }
}
