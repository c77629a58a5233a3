//! Feedback Application - the rating form inside the embedded frame
//!
//! [`FeedbackApp`] is the pure state machine; [`AppRunner`] drives one
//! instance per loaded frame document and executes the effects it requests.

pub mod rating;
mod runner;
mod state;
pub mod submit;
pub mod surface;

pub use rating::{Emoji, MAX_RATING, MIN_RATING, Mood, Rating, RatingError, hover_rating};
pub use runner::{AppEvent, AppRunner, AppServices, AppSnapshot};
pub use state::{AppView, EMPTY_FEEDBACK_PROMPT, Effect, FeedbackApp, FeedbackError, FeedbackSettings, Phase, RatingView};
pub use submit::{FeedbackPayload, FeedbackSubmitter, HttpSubmitter, InFlight, SubmitError};
pub use surface::{Navigator, Prompter};
