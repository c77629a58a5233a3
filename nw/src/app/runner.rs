//! Feedback app event loop
//!
//! One runner per loaded frame document. It owns the [`FeedbackApp`], carries
//! out the effects its transitions request, and holds the thank-you deadline
//! and the pending close-signal timers. Dropping the runner (frame reload)
//! aborts those timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::rating::{Mood, Rating};
use super::state::{AppView, Effect, FeedbackApp, FeedbackSettings};
use super::submit::{FeedbackSubmitter, InFlight};
use super::surface::{Navigator, Prompter};
use crate::config::FeedbackConfig;
use crate::protocol::{Envelope, MessageTarget, TrustedOrigin, WILDCARD, WidgetMessage};

/// Events delivered to the embedded document
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ScoreSelected(Rating),
    /// Pointer over the rating bar at `x` of `width`
    Hover { x: f64, width: f64 },
    Focus(Rating),
    PointerLeft,
    FeedbackChanged(String),
    SubmitClicked,
    /// A message arrived on the frame window
    Message(Envelope),
    Shutdown,
}

/// What the embedded document currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSnapshot {
    pub view: AppView,
    /// Mood class on the frame body
    pub mood: Option<Mood>,
    /// Increments every time the frame loads a fresh document
    pub generation: u64,
}

/// Collaborators outside the frame document
#[derive(Clone)]
pub struct AppServices {
    pub submitter: Arc<dyn FeedbackSubmitter>,
    pub navigator: Arc<dyn Navigator>,
    pub prompter: Arc<dyn Prompter>,
    pub submissions: InFlight,
}

pub struct AppRunner {
    app: FeedbackApp,
    parent: Arc<dyn MessageTarget>,
    services: AppServices,
    review_url: String,
    close_signal_delay: Duration,
    thank_you: Duration,
    close_timers: JoinSet<()>,
    thank_you_at: Option<Instant>,
    mood: Option<Mood>,
    generation: u64,
}

impl AppRunner {
    /// `parent_origin` is trusted for RESET unless `parent-url` is configured
    pub fn new(
        config: &FeedbackConfig,
        services: AppServices,
        parent: Arc<dyn MessageTarget>,
        parent_origin: &str,
        generation: u64,
    ) -> Self {
        let trusted = TrustedOrigin::from_endpoint(config.parent_url.as_deref().unwrap_or(parent_origin));
        Self {
            app: FeedbackApp::new(FeedbackSettings::from(config), trusted),
            parent,
            services,
            review_url: config.review_url.clone(),
            close_signal_delay: config.close_signal_delay(),
            thank_you: config.thank_you_duration(),
            close_timers: JoinSet::new(),
            thank_you_at: None,
            mood: None,
            generation,
        }
    }

    /// Run until shutdown or until the inbox closes
    ///
    /// The last published snapshot has no mood: unmounting clears it.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<AppEvent>, view: Arc<watch::Sender<AppSnapshot>>) {
        info!(generation = self.generation, "Feedback app mounted");
        view.send_replace(self.snapshot());

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(self.thank_you_at.unwrap_or_else(Instant::now)), if self.thank_you_at.is_some() => {
                    self.thank_you_at = None;
                    let effects = self.app.expire_thank_you();
                    self.apply(effects);
                }
                Some(joined) = self.close_timers.join_next(), if !self.close_timers.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Close timer task failed");
                    }
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        debug!("app run: inbox closed");
                        break;
                    };
                    debug!(?event, "app run: event");
                    if !self.handle(event) {
                        break;
                    }
                }
            }
            view.send_replace(self.snapshot());
        }

        self.close_timers.abort_all();
        self.mood = None;
        view.send_replace(self.snapshot());
        info!(generation = self.generation, "Feedback app unmounted");
    }

    /// Returns false on shutdown
    fn handle(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::ScoreSelected(rating) => {
                let effects = self.app.select_score(rating);
                self.apply(effects);
            }
            AppEvent::Hover { x, width } => self.app.hover(x, width),
            AppEvent::Focus(rating) => self.app.focus(rating),
            AppEvent::PointerLeft => self.app.leave(),
            AppEvent::FeedbackChanged(text) => self.app.update_feedback_text(text),
            AppEvent::SubmitClicked => match self.app.submit_feedback() {
                Ok(effects) => self.apply(effects),
                Err(e) => {
                    debug!(error = %e, "handle: submit rejected");
                    if let Some(message) = e.user_message() {
                        self.services.prompter.alert(message);
                    }
                }
            },
            AppEvent::Message(envelope) => {
                let effects = self.app.handle_message(&envelope.origin, &envelope.data);
                self.apply(effects);
            }
            AppEvent::Shutdown => return false,
        }
        true
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!(?effect, "apply: effect");
            match effect {
                Effect::Submit(payload) => self.services.submissions.spawn(self.services.submitter.clone(), payload),
                Effect::OpenReview => self.services.navigator.open_new_context(&self.review_url),
                Effect::SignalClose => self.schedule_close_signal(),
                Effect::StartThankYouTimer => self.thank_you_at = Some(Instant::now() + self.thank_you),
                Effect::CancelThankYouTimer => self.thank_you_at = None,
                Effect::ApplyMood(mood) => self.mood = mood,
            }
        }
    }

    fn schedule_close_signal(&mut self) {
        let parent = self.parent.clone();
        let delay = self.close_signal_delay;
        self.close_timers.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = parent.post(WidgetMessage::Close, WILDCARD) {
                error!(error = %e, "Failed to send close message");
            }
        });
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            view: self.app.view(),
            mood: self.mood,
            generation: self.generation,
        }
    }
}
