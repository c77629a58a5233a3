//! Feedback submission to the remote endpoint
//!
//! One POST per submission with body `{"rating": n, "feedback": "..."}` and
//! cookies included. The UI never waits on it: [`InFlight::spawn`] launches
//! the request and only logs the outcome.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::rating::Rating;
use crate::config::FeedbackConfig;

/// Body sent to the feedback endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    pub rating: Rating,
    pub feedback: String,
}

impl FeedbackPayload {
    pub fn new(rating: Rating, feedback: impl Into<String>) -> Self {
        Self {
            rating,
            feedback: feedback.into(),
        }
    }
}

/// Errors from a submission attempt
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Failed to submit feedback: {status} {message}")]
    Status { status: u16, message: String },

    #[error("Error submitting feedback: {0}")]
    Network(#[from] reqwest::Error),
}

/// Remote collaborator receiving feedback
#[async_trait]
pub trait FeedbackSubmitter: Send + Sync {
    async fn submit(&self, payload: &FeedbackPayload) -> Result<(), SubmitError>;
}

/// Submits over HTTP with reqwest
pub struct HttpSubmitter {
    api_url: String,
    http: Client,
}

impl HttpSubmitter {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let http = Client::builder().timeout(timeout).cookie_store(true).build()?;
        Ok(Self {
            api_url: api_url.into(),
            http,
        })
    }

    /// Use a preconfigured client
    pub fn with_client(api_url: impl Into<String>, http: Client) -> Self {
        Self {
            api_url: api_url.into(),
            http,
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Result<Self, SubmitError> {
        debug!(api_url = %config.api_url, "HttpSubmitter::from_config: called");
        Self::new(config.api_url.clone(), config.timeout())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl FeedbackSubmitter for HttpSubmitter {
    async fn submit(&self, payload: &FeedbackPayload) -> Result<(), SubmitError> {
        debug!(rating = %payload.rating, feedback_len = payload.feedback.len(), "HttpSubmitter::submit: posting");
        let response = self.http.post(&self.api_url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        debug!(status = status.as_u16(), "HttpSubmitter::submit: accepted");
        Ok(())
    }
}

async fn submit_logged(submitter: Arc<dyn FeedbackSubmitter>, payload: FeedbackPayload) -> bool {
    match submitter.submit(&payload).await {
        Ok(()) => true,
        Err(e @ SubmitError::Status { .. }) => {
            warn!(error = %e, rating = %payload.rating, "Feedback rejected by endpoint");
            false
        }
        Err(e) => {
            error!(error = %e, rating = %payload.rating, "Feedback submission failed");
            false
        }
    }
}

/// Submissions launched but not yet finished
///
/// Shared by every frame document of a session, so a submission outlives the
/// document that started it.
#[derive(Clone, Default)]
pub struct InFlight {
    tasks: Arc<Mutex<JoinSet<bool>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<bool>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Launch a submission without waiting for it
    pub fn spawn(&self, submitter: Arc<dyn FeedbackSubmitter>, payload: FeedbackPayload) {
        let mut tasks = self.tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(submit_logged(submitter, payload));
    }

    /// Submissions not yet reaped, finished or not
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every pending submission
    ///
    /// Returns how many the endpoint accepted. Anything spawned while draining
    /// is left for the next call.
    pub async fn drain(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks());
        let mut accepted = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => accepted += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Submission task failed"),
            }
        }
        accepted
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Submitter that records payloads and can be told to fail or stall
    #[derive(Default)]
    pub struct RecordingSubmitter {
        pub payloads: Mutex<Vec<FeedbackPayload>>,
        pub fail: bool,
        pub delay: Duration,
    }

    #[async_trait]
    impl FeedbackSubmitter for RecordingSubmitter {
        async fn submit(&self, payload: &FeedbackPayload) -> Result<(), SubmitError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.payloads.lock().unwrap().push(payload.clone());
            if self.fail {
                return Err(SubmitError::Status {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
            Ok(())
        }
    }
}
