//! FeedbackApp - the rating form state machine
//!
//! Pure state: every operation returns the [`Effect`]s the caller must carry
//! out (network, navigation, timers, body classes). The runner in
//! [`super::runner`] executes them.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::rating::{Emoji, Mood, Rating, hover_rating};
use super::submit::FeedbackPayload;
use crate::config::FeedbackConfig;
use crate::protocol::{Signal, TrustedOrigin, classify};

/// Prompt shown when the follow-up form is submitted empty
pub const EMPTY_FEEDBACK_PROMPT: &str = "Please share a quick note so we can help.";

/// Score thresholds that route the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackSettings {
    /// Scores at or above this go to the review page
    pub positive_threshold: u8,
    /// Scores at or below this show the follow-up form
    pub follow_up_threshold: u8,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            positive_threshold: 4,
            follow_up_threshold: 3,
        }
    }
}

impl From<&FeedbackConfig> for FeedbackSettings {
    fn from(config: &FeedbackConfig) -> Self {
        Self {
            positive_threshold: config.positive_threshold,
            follow_up_threshold: config.follow_up_threshold,
        }
    }
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the payload, fire-and-forget
    Submit(FeedbackPayload),
    /// Open the review page in a new browsing context
    OpenReview,
    /// Post CLOSE to the parent after the close-signal delay
    SignalClose,
    StartThankYouTimer,
    CancelThankYouTimer,
    /// Replace the mood body class; `None` clears it
    ApplyMood(Option<Mood>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("Feedback text is empty")]
    EmptyFeedback,

    #[error("No follow-up form is showing")]
    NoFollowUp,
}

impl FeedbackError {
    /// Message to show the user, if any
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            FeedbackError::EmptyFeedback => Some(EMPTY_FEEDBACK_PROMPT),
            FeedbackError::NoFollowUp => None,
        }
    }
}

/// Where the flow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Scored between the follow-up and positive thresholds
    Rated,
    /// High score; review page opened
    Redirected,
    /// Low score; follow-up form showing
    NegativeFlow,
    ThankYou,
}

/// What the form renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppView {
    Rating(RatingView),
    ThankYou,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingView {
    pub score: Option<Rating>,
    pub hovered: Option<Rating>,
    /// Number of filled stars
    pub highlighted: u8,
    pub emoji: Option<Emoji>,
    pub show_follow_up: bool,
    pub feedback: String,
    pub shake: bool,
    pub celebrate: bool,
}

impl Default for AppView {
    fn default() -> Self {
        AppView::Rating(RatingView {
            score: None,
            hovered: None,
            highlighted: 0,
            emoji: None,
            show_follow_up: false,
            feedback: String::new(),
            shake: false,
            celebrate: false,
        })
    }
}

pub struct FeedbackApp {
    settings: FeedbackSettings,
    trusted: TrustedOrigin,
    score: Option<Rating>,
    hovered: Option<Rating>,
    feedback: String,
    thank_you: bool,
}

impl FeedbackApp {
    /// `trusted` is the origin RESET is accepted from
    pub fn new(settings: FeedbackSettings, trusted: TrustedOrigin) -> Self {
        Self {
            settings,
            trusted,
            score: None,
            hovered: None,
            feedback: String::new(),
            thank_you: false,
        }
    }

    /// A star was clicked
    pub fn select_score(&mut self, rating: Rating) -> Vec<Effect> {
        if self.thank_you {
            debug!(%rating, "select_score: thank-you showing, ignoring");
            return Vec::new();
        }
        debug!(%rating, "select_score: called");

        let mut effects = Vec::new();
        if self.score != Some(rating) {
            effects.push(Effect::ApplyMood(Mood::for_rating(Some(rating))));
        }
        self.score = Some(rating);

        if rating.value() >= self.settings.positive_threshold {
            effects.push(Effect::Submit(FeedbackPayload::new(rating, "")));
            effects.push(Effect::OpenReview);
            effects.push(Effect::SignalClose);
        }
        effects
    }

    /// Follow-up text edited; kept verbatim
    pub fn update_feedback_text(&mut self, text: impl Into<String>) {
        self.feedback = text.into();
    }

    /// Submit the follow-up form
    ///
    /// Rejected without any change when the text is blank or no form is showing.
    pub fn submit_feedback(&mut self) -> Result<Vec<Effect>, FeedbackError> {
        let Some(rating) = self.score.filter(|_| self.shows_follow_up()) else {
            debug!("submit_feedback: no follow-up form");
            return Err(FeedbackError::NoFollowUp);
        };
        if self.feedback.trim().is_empty() {
            debug!("submit_feedback: empty feedback");
            return Err(FeedbackError::EmptyFeedback);
        }

        let payload = FeedbackPayload::new(rating, std::mem::take(&mut self.feedback));
        debug!(%rating, "submit_feedback: accepted");
        self.score = None;
        self.hovered = None;
        self.thank_you = true;

        Ok(vec![
            Effect::Submit(payload),
            Effect::ApplyMood(None),
            Effect::StartThankYouTimer,
        ])
    }

    /// The thank-you timer fired
    pub fn expire_thank_you(&mut self) -> Vec<Effect> {
        if !self.thank_you {
            return Vec::new();
        }
        debug!("expire_thank_you: back to idle");
        self.thank_you = false;
        vec![Effect::SignalClose]
    }

    /// A message arrived from the parent window
    pub fn handle_message(&mut self, origin: &str, payload: &Value) -> Vec<Effect> {
        match classify(&self.trusted, origin, payload) {
            Signal::Reset => self.reset(),
            signal => {
                debug!(%origin, ?signal, "handle_message: ignoring");
                Vec::new()
            }
        }
    }

    fn reset(&mut self) -> Vec<Effect> {
        debug!("reset: clearing form");
        self.score = None;
        self.hovered = None;
        self.feedback.clear();
        self.thank_you = false;
        vec![Effect::CancelThankYouTimer, Effect::ApplyMood(None)]
    }

    /// Pointer moved over the rating bar
    pub fn hover(&mut self, relative_x: f64, width: f64) {
        if let Some(rating) = hover_rating(relative_x, width) {
            self.hovered = Some(rating);
        }
    }

    /// Keyboard focus landed on a star
    pub fn focus(&mut self, rating: Rating) {
        self.hovered = Some(rating);
    }

    /// Pointer left the bar or focus left a star
    pub fn leave(&mut self) {
        self.hovered = None;
    }

    fn shows_follow_up(&self) -> bool {
        self.score
            .is_some_and(|r| r.value() <= self.settings.follow_up_threshold)
    }

    pub fn phase(&self) -> Phase {
        if self.thank_you {
            return Phase::ThankYou;
        }
        match self.score {
            None => Phase::Idle,
            Some(r) if r.value() >= self.settings.positive_threshold => Phase::Redirected,
            Some(r) if r.value() <= self.settings.follow_up_threshold => Phase::NegativeFlow,
            Some(_) => Phase::Rated,
        }
    }

    pub fn score(&self) -> Option<Rating> {
        self.score
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn mood(&self) -> Option<Mood> {
        Mood::for_rating(self.score)
    }

    pub fn view(&self) -> AppView {
        if self.thank_you {
            return AppView::ThankYou;
        }
        let highlighted = self.hovered.or(self.score).map_or(0, Rating::value);
        AppView::Rating(RatingView {
            score: self.score,
            hovered: self.hovered,
            highlighted,
            emoji: self.score.map(Rating::emoji),
            show_follow_up: self.shows_follow_up(),
            feedback: self.feedback.clone(),
            shake: self.score.is_some_and(|r| r.value() <= 2),
            celebrate: self.score.is_some_and(|r| r.value() == 5),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PARENT: &str = "https://shop.example";

    fn app() -> FeedbackApp {
        FeedbackApp::new(
            FeedbackSettings::default(),
            TrustedOrigin::Exact(PARENT.to_string()),
        )
    }

    fn r(value: u8) -> Rating {
        Rating::new(value).unwrap()
    }

    fn count(effects: &[Effect], wanted: &Effect) -> usize {
        effects.iter().filter(|e| *e == wanted).count()
    }

    #[test]
    fn test_high_scores_redirect_exactly_once() {
        for value in [4, 5] {
            let mut app = app();
            let effects = app.select_score(r(value));

            assert_eq!(count(&effects, &Effect::OpenReview), 1);
            assert_eq!(count(&effects, &Effect::SignalClose), 1);
            assert!(effects.contains(&Effect::Submit(FeedbackPayload::new(r(value), ""))));
            assert_eq!(app.phase(), Phase::Redirected);
        }
    }

    #[test]
    fn test_low_scores_never_redirect() {
        for value in 1..=3 {
            let mut app = app();
            let effects = app.select_score(r(value));

            assert!(!effects.contains(&Effect::OpenReview));
            assert!(!effects.iter().any(|e| matches!(e, Effect::Submit(_))));
            assert_eq!(app.phase(), Phase::NegativeFlow);
            let AppView::Rating(view) = app.view() else {
                panic!("expected rating view");
            };
            assert!(view.show_follow_up);
        }
    }

    #[test]
    fn test_select_applies_mood_once_per_change() {
        let mut app = app();
        assert_eq!(app.select_score(r(2)), vec![Effect::ApplyMood(Some(Mood::Low))]);
        assert!(app.select_score(r(2)).is_empty());
        assert_eq!(app.select_score(r(3)), vec![Effect::ApplyMood(Some(Mood::Neutral))]);
    }

    #[test]
    fn test_empty_feedback_rejected_without_change() {
        let mut app = app();
        app.select_score(r(2));
        app.update_feedback_text("   \n\t");

        let err = app.submit_feedback().unwrap_err();

        assert_eq!(err, FeedbackError::EmptyFeedback);
        assert_eq!(err.user_message(), Some(EMPTY_FEEDBACK_PROMPT));
        assert_eq!(app.score(), Some(r(2)));
        assert_eq!(app.feedback(), "   \n\t");
        assert_eq!(app.phase(), Phase::NegativeFlow);
    }

    #[test]
    fn test_submit_without_form_rejected_silently() {
        let mut app = app();
        app.update_feedback_text("hello");
        let err = app.submit_feedback().unwrap_err();
        assert_eq!(err, FeedbackError::NoFollowUp);
        assert_eq!(err.user_message(), None);

        app.select_score(r(4));
        assert_eq!(app.submit_feedback(), Err(FeedbackError::NoFollowUp));
    }

    #[test]
    fn test_submit_sends_verbatim_and_enters_thank_you() {
        let mut app = app();
        app.select_score(r(2));
        app.update_feedback_text("  too slow ");

        let effects = app.submit_feedback().unwrap();

        assert_eq!(
            effects,
            vec![
                Effect::Submit(FeedbackPayload::new(r(2), "  too slow ")),
                Effect::ApplyMood(None),
                Effect::StartThankYouTimer,
            ]
        );
        assert_eq!(app.score(), None);
        assert_eq!(app.feedback(), "");
        assert_eq!(app.view(), AppView::ThankYou);
    }

    #[test]
    fn test_select_ignored_during_thank_you() {
        let mut app = app();
        app.select_score(r(1));
        app.update_feedback_text("bad");
        app.submit_feedback().unwrap();

        assert!(app.select_score(r(5)).is_empty());
        assert_eq!(app.phase(), Phase::ThankYou);
    }

    #[test]
    fn test_thank_you_expiry_signals_close_once() {
        let mut app = app();
        app.select_score(r(3));
        app.update_feedback_text("meh");
        app.submit_feedback().unwrap();

        assert_eq!(app.expire_thank_you(), vec![Effect::SignalClose]);
        assert!(app.expire_thank_you().is_empty());
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn test_trusted_reset_clears_everything() {
        let mut app = app();
        app.select_score(r(2));
        app.update_feedback_text("x");
        app.submit_feedback().unwrap();
        app.focus(r(4));

        let effects = app.handle_message(PARENT, &json!({"type": "NPS_WIDGET_RESET"}));

        assert_eq!(effects, vec![Effect::CancelThankYouTimer, Effect::ApplyMood(None)]);
        assert_eq!(app.phase(), Phase::Idle);
        assert_eq!(app.view(), AppView::default());
    }

    #[test]
    fn test_untrusted_reset_ignored() {
        let mut app = app();
        app.select_score(r(2));
        app.update_feedback_text("keep me");

        let effects = app.handle_message("https://evil.example", &json!({"type": "NPS_WIDGET_RESET"}));

        assert!(effects.is_empty());
        assert_eq!(app.score(), Some(r(2)));
        assert_eq!(app.feedback(), "keep me");
    }

    #[test]
    fn test_close_message_ignored_by_app() {
        let mut app = app();
        app.select_score(r(1));
        assert!(app.handle_message(PARENT, &json!({"type": "NPS_WIDGET_CLOSE"})).is_empty());
        assert_eq!(app.score(), Some(r(1)));
    }

    #[test]
    fn test_hover_overrides_highlight() {
        let mut app = app();
        app.select_score(r(2));
        app.hover(190.0, 200.0);

        let AppView::Rating(view) = app.view() else {
            panic!("expected rating view");
        };
        assert_eq!(view.highlighted, 5);
        assert_eq!(view.emoji.unwrap().label, "Slightly Satisfied");
        assert!(view.shake);
        assert!(!view.celebrate);

        app.leave();
        let AppView::Rating(view) = app.view() else {
            panic!("expected rating view");
        };
        assert_eq!(view.highlighted, 2);
    }

    #[test]
    fn test_celebrate_only_on_five() {
        let mut app = app();
        app.select_score(r(5));
        let AppView::Rating(view) = app.view() else {
            panic!("expected rating view");
        };
        assert!(view.celebrate);
        assert_eq!(app.mood(), Some(Mood::Wow));
    }
}
