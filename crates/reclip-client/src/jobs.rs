//! Submit-then-poll client for server-side jobs.
//!
//! A job is created with a POST returning `{jobId}`, then polled at
//! `GET /api/jobs/{jobId}/progress` until it reports `completed` or `failed`.
//! Polls are serialised: the next one is scheduled only after the previous
//! one resolved. Transient poll failures are retried up to a bound.

use reclip_models::{Job, JobId, JobProgress, JobTicket};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::config::PollConfig;
use crate::envelope::ApiResponse;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::metrics::record_poll;
use crate::progress::{ProgressCallback, ProgressReporter};

/// What a job call hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome<T> {
    /// The job finished and this is its result.
    Completed(T),
    /// Submitted but not awaited (no progress callback was supplied).
    Pending(JobId),
}

impl<T> JobOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            JobOutcome::Completed(result) => Some(result),
            JobOutcome::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, JobOutcome::Pending(_))
    }
}

/// Handle to a job polled on a background task.
///
/// Dropping the handle cancels polling; use [`JobHandle::detach`] to let it
/// run unobserved.
pub struct JobHandle<T> {
    job_id: JobId,
    guard: DropGuard,
    token: CancellationToken,
    task: JoinHandle<ClientResult<T>>,
}

impl<T> JobHandle<T> {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Stop polling at the next suspension point.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the job's result.
    pub async fn wait(self) -> ClientResult<T> {
        let JobHandle { guard, task, .. } = self;
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ClientError::TaskFailed(e.to_string())),
        };
        drop(guard);
        result
    }

    /// Keep polling without a handle; the task stops on its own once the job
    /// is terminal or the failure budget runs out.
    pub fn detach(self) -> JoinHandle<ClientResult<T>> {
        let JobHandle { guard, task, .. } = self;
        guard.disarm();
        task
    }
}

/// Submits jobs and polls them to completion.
#[derive(Debug, Clone)]
pub struct JobPoller {
    http: ApiClient,
    config: PollConfig,
}

impl JobPoller {
    pub fn new(http: ApiClient, config: PollConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Create a job. An error envelope is returned unchanged.
    pub async fn submit<B>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse<JobTicket>>
    where
        B: Serialize + ?Sized,
    {
        self.http.post_json(operation, path, body).await
    }

    /// Submit a job and, depending on the await policy, poll it to the end.
    ///
    /// `Err` is returned only when the submission itself could not reach the
    /// server. Everything after a successful submission lands in the envelope.
    pub async fn run<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
        target: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<JobOutcome<T>>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let wait = self.config.await_completion.should_wait(on_progress.is_some());
        self.run_inner(operation, path, body, target, on_progress, wait)
            .await
    }

    /// Like [`JobPoller::run`] but always waits for the result.
    pub async fn run_to_completion<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
        target: &str,
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = self
            .run_inner(operation, path, body, target, on_progress, true)
            .await?;
        Ok(match outcome {
            ApiResponse::Data(JobOutcome::Completed(result)) => ApiResponse::Data(result),
            ApiResponse::Data(JobOutcome::Pending(job_id)) => {
                ApiResponse::Error(format!("Job {job_id} did not complete"))
            }
            ApiResponse::Error(msg) => ApiResponse::Error(msg),
        })
    }

    async fn run_inner<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
        target: &str,
        on_progress: Option<ProgressCallback>,
        wait: bool,
    ) -> ClientResult<ApiResponse<JobOutcome<T>>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let ticket = match self.submit(operation, path, body).await? {
            ApiResponse::Data(ticket) => ticket,
            ApiResponse::Error(msg) => return Ok(ApiResponse::Error(msg)),
        };
        info!(job_id = %ticket.job_id, operation, target, "Job submitted");

        if !wait {
            debug!(job_id = %ticket.job_id, "No progress observer, not awaiting completion");
            return Ok(ApiResponse::Data(JobOutcome::Pending(ticket.job_id)));
        }

        let reporter = ProgressReporter::new(on_progress);
        let result = self
            .poll(ticket.job_id, target, &reporter, &CancellationToken::new())
            .await;
        Ok(ApiResponse::from_result(result.map(JobOutcome::Completed)))
    }

    /// Poll an already submitted job on a background task.
    pub fn spawn<T>(
        &self,
        job_id: JobId,
        target: impl Into<String>,
        on_progress: Option<ProgressCallback>,
    ) -> JobHandle<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let token = CancellationToken::new();
        let poller = self.clone();
        let target = target.into();
        let task_token = token.clone();
        let task_job_id = job_id.clone();

        let task = tokio::spawn(async move {
            let reporter = ProgressReporter::new(on_progress);
            poller
                .poll(task_job_id, &target, &reporter, &task_token)
                .await
        });

        JobHandle {
            job_id,
            guard: token.clone().drop_guard(),
            token,
            task,
        }
    }

    /// Poll until the job is terminal, the failure budget is spent, or
    /// `cancel` fires.
    pub async fn poll<T: DeserializeOwned>(
        &self,
        job_id: JobId,
        target: &str,
        reporter: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> ClientResult<T> {
        let progress_path = format!("/api/jobs/{}/progress", job_id);
        let mut job = Job::submitted(job_id, target);
        let mut consecutive_failures: u32 = 0;
        let mut polls: u32 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Self::cancelled(&mut job)),
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            if let Some(max) = self.config.max_polls {
                if polls >= max {
                    job.abort(format!("no result after {polls} polls"));
                    warn!(job_id = %job.id, polls, "Giving up on job");
                    return Err(ClientError::PollLimitExceeded {
                        job_id: job.id,
                        attempts: polls,
                    });
                }
            }
            polls += 1;

            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(Self::cancelled(&mut job)),
                response = self.http.get::<JobProgress<T>>("poll_job", &progress_path) => response,
            };

            let payload = match response {
                Ok(ApiResponse::Data(payload)) => payload,
                Ok(ApiResponse::Error(msg)) => {
                    consecutive_failures += 1;
                    self.note_poll_failure(&mut job, consecutive_failures, ClientError::Server(msg))?;
                    continue;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    self.note_poll_failure(&mut job, consecutive_failures, e)?;
                    continue;
                }
            };
            consecutive_failures = 0;

            if payload.is_failed() {
                let reason = payload
                    .error
                    .clone()
                    .unwrap_or_else(|| "Job failed".to_string());
                job.fail(reason.clone());
                record_poll("failed");
                error!(job_id = %job.id, reason = %reason, "Job failed");
                return Err(ClientError::JobFailed {
                    job_id: job.id,
                    reason,
                });
            }

            if let Some(progress) = job.observe(payload.percent(), payload.completed) {
                reporter.report(progress);
            }

            if !job.completed {
                record_poll("progress");
                debug!(job_id = %job.id, progress = job.progress, "Job progress");
                continue;
            }

            record_poll("completed");
            info!(job_id = %job.id, polls, "Job completed");
            return match payload.result {
                Some(result) => Ok(result),
                None => self.fetch_result(&mut job).await,
            };
        }
    }

    /// One fetch of `/api/jobs/{jobId}/result`.
    async fn fetch_result<T: DeserializeOwned>(&self, job: &mut Job) -> ClientResult<T> {
        let path = format!("/api/jobs/{}/result", job.id);
        match self.http.get::<T>("job_result", &path).await {
            Ok(ApiResponse::Data(result)) => Ok(result),
            Ok(ApiResponse::Error(msg)) => {
                job.abort(msg.clone());
                Err(ClientError::Server(msg))
            }
            Err(e) => {
                job.abort(e.to_string());
                Err(e)
            }
        }
    }

    /// Count a failed poll. Transient failures are retried until the budget
    /// is spent; anything else ends polling immediately.
    pub(crate) fn note_poll_failure(
        &self,
        job: &mut Job,
        failures: u32,
        err: ClientError,
    ) -> ClientResult<()> {
        if !err.is_transient() {
            record_poll("error");
            error!(job_id = %job.id, "Job poll failed: {}", err);
            job.abort(err.to_string());
            return Err(err);
        }

        record_poll("transient_error");
        warn!(
            job_id = %job.id,
            failures,
            max = self.config.max_consecutive_failures,
            "Job poll failed, will retry: {}",
            err
        );

        if failures >= self.config.max_consecutive_failures {
            job.abort(err.to_string());
            return Err(ClientError::PollLimitExceeded {
                job_id: job.id.clone(),
                attempts: failures,
            });
        }
        Ok(())
    }

    fn cancelled(job: &mut Job) -> ClientError {
        job.cancel();
        info!(job_id = %job.id, "Job polling cancelled");
        ClientError::Cancelled(job.id.clone())
    }
}
