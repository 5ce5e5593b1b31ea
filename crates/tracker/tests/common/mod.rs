//! Scripted fake backend for tracker tests.
//!
//! Each operation id gets a queue of [`Step`]s; the last step repeats
//! once the queue is down to one entry. Every status request is logged
//! with the paused-clock instant at which it was issued.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use studio_client::messages::{
    AbGenerateRequest, DownloadCreated, DownloadRequest, DownloadStatusResponse, GenerateRequest,
    GenerateVariationsRequest, JobBatchCreated, JobCreated, JobStatusResponse,
    RenderFromBeatsRequest,
};
use studio_client::{ApiError, OperationBackend};
use studio_core::operation::OperationKind;
use tokio::sync::broadcast;
use tokio::time::Instant;

use studio_tracker::TrackerEvent;

/// One scripted status response.
#[derive(Debug, Clone)]
pub enum Step {
    Status {
        status: &'static str,
        progress: i64,
        logs: Vec<&'static str>,
        result_ref: Option<&'static str>,
    },
    /// Answer with a 503.
    Fail,
    /// Never answer.
    Hang,
    /// Answer with the inner step after a delay.
    Delayed(Duration, Box<Step>),
}

impl Step {
    pub fn running(progress: i64) -> Self {
        Step::Status {
            status: "running",
            progress,
            logs: vec![],
            result_ref: None,
        }
    }

    pub fn done(result_ref: &'static str) -> Self {
        Step::Status {
            status: "done",
            progress: 100,
            logs: vec!["finished"],
            result_ref: Some(result_ref),
        }
    }

    pub fn error(log: &'static str) -> Self {
        Step::Status {
            status: "error",
            progress: 0,
            logs: vec![log],
            result_ref: None,
        }
    }

    pub fn delayed(delay: Duration, step: Step) -> Self {
        Step::Delayed(delay, Box::new(step))
    }
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub kind: OperationKind,
    pub id: String,
    pub at: Instant,
}

pub struct FakeBackend {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    polls: Mutex<Vec<Poll>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            polls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script the responses for `id`. Unscripted ids report `running (50%)`.
    pub fn script(&self, id: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), steps.into_iter().collect());
    }

    pub fn polls(&self) -> Vec<Poll> {
        self.polls.lock().unwrap().clone()
    }

    pub fn polls_for(&self, id: &str) -> Vec<Poll> {
        self.polls().into_iter().filter(|p| p.id == id).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, id: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Step::running(50)),
            None => Step::running(50),
        }
    }

    async fn respond(
        &self,
        kind: OperationKind,
        id: &str,
    ) -> Result<(&'static str, i64, Vec<String>, Option<String>), ApiError> {
        self.polls.lock().unwrap().push(Poll {
            kind,
            id: id.to_string(),
            at: Instant::now(),
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let mut step = self.next_step(id);
        let result = loop {
            match step {
                Step::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    step = *inner;
                }
                Step::Hang => break std::future::pending().await,
                Step::Fail => {
                    break Err(ApiError::Status {
                        status: 503,
                        message: "backend unavailable".into(),
                    })
                }
                Step::Status {
                    status,
                    progress,
                    logs,
                    result_ref,
                } => {
                    break Ok((
                        status,
                        progress,
                        logs.into_iter().map(String::from).collect(),
                        result_ref.map(String::from),
                    ))
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl OperationBackend for FakeBackend {
    async fn create_job(&self, _request: &GenerateRequest) -> Result<JobCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        let (status, progress, logs, result_ref) =
            self.respond(OperationKind::GenerationJob, job_id).await?;
        Ok(JobStatusResponse {
            status: status.to_string(),
            progress,
            logs,
            output_video_url: result_ref,
            preview_video_url: None,
            thumbnail_url: None,
        })
    }

    async fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn render_from_beats(
        &self,
        _job_id: &str,
        _request: &RenderFromBeatsRequest,
    ) -> Result<JobCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn generate_variations(
        &self,
        _request: &GenerateVariationsRequest,
    ) -> Result<JobBatchCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn ab_generate(&self, _request: &AbGenerateRequest) -> Result<JobBatchCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn create_download(
        &self,
        _request: &DownloadRequest,
    ) -> Result<DownloadCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn download_recommended(&self, _model_id: &str) -> Result<DownloadCreated, ApiError> {
        unimplemented!("not used by tracker tests")
    }

    async fn download_status(
        &self,
        download_id: &str,
    ) -> Result<DownloadStatusResponse, ApiError> {
        let (status, progress, logs, result_ref) =
            self.respond(OperationKind::ModelDownload, download_id).await?;
        Ok(DownloadStatusResponse {
            status: status.to_string(),
            progress,
            downloaded_bytes: 0,
            total_bytes: 0,
            logs,
            output_dir: result_ref,
        })
    }
}

/// Receive events until one matches `pred`, returning everything seen.
pub async fn events_until(
    rx: &mut broadcast::Receiver<TrackerEvent>,
    pred: impl Fn(&TrackerEvent) -> bool,
) -> Vec<TrackerEvent> {
    let mut seen = Vec::new();
    loop {
        let event = rx.recv().await.unwrap();
        let done = pred(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}
