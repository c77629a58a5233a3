//! Shared fixtures for session tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keystore::{LocalStorage, MemoryStorage};
use npswidget::app::{FeedbackPayload, FeedbackSubmitter, Navigator, Prompter, SubmitError};
use npswidget::config::{Config, FeedbackConfig, HostConfig};
use npswidget::session::Services;

pub const WIDGET_URL: &str = "https://widget.example.com/nps";
pub const WIDGET_ORIGIN: &str = "https://widget.example.com";
pub const PAGE_URL: &str = "https://shop.example.com/checkout";
pub const PAGE_ORIGIN: &str = "https://shop.example.com";
pub const REVIEW_URL: &str = "https://reviews.example.com/write";

#[derive(Default)]
pub struct RecordingSubmitter {
    pub payloads: Mutex<Vec<FeedbackPayload>>,
    /// Time each request takes before it is recorded
    pub delay: Duration,
}

#[async_trait]
impl FeedbackSubmitter for RecordingSubmitter {
    async fn submit(&self, payload: &FeedbackPayload) -> Result<(), SubmitError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub opened: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn open_new_context(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

#[derive(Default)]
pub struct RecordingPrompter {
    pub alerts: Mutex<Vec<String>>,
}

impl Prompter for RecordingPrompter {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

/// Recording collaborators plus the storage they share
pub struct Recorder {
    pub storage: Arc<MemoryStorage>,
    pub submitter: Arc<RecordingSubmitter>,
    pub navigator: Arc<RecordingNavigator>,
    pub prompter: Arc<RecordingPrompter>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        Self {
            storage,
            submitter: Arc::default(),
            navigator: Arc::default(),
            prompter: Arc::default(),
        }
    }

    /// Recorder whose submissions take `delay` to complete
    pub fn with_submit_delay(delay: Duration) -> Self {
        Self {
            submitter: Arc::new(RecordingSubmitter {
                delay,
                ..Default::default()
            }),
            ..Self::new()
        }
    }

    pub fn services(&self) -> Services {
        let storage: Arc<dyn LocalStorage> = self.storage.clone();
        Services {
            storage,
            submitter: self.submitter.clone(),
            navigator: self.navigator.clone(),
            prompter: self.prompter.clone(),
        }
    }

    pub fn payloads(&self) -> Vec<FeedbackPayload> {
        self.submitter.payloads.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.navigator.opened.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.prompter.alerts.lock().unwrap().clone()
    }
}

pub fn config(widget_url: &str) -> Config {
    Config {
        host: HostConfig {
            widget_url: Some(widget_url.to_string()),
            page_url: PAGE_URL.to_string(),
            ..Default::default()
        },
        feedback: FeedbackConfig {
            review_url: REVIEW_URL.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Let every actor drain its inbox
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
