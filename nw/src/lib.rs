//! NPS Widget - embeddable customer-satisfaction feedback widget
//!
//! A launcher on the host page opens an overlay holding an embedded feedback
//! form. The two sides only talk through a small cross-origin messaging
//! protocol: the host posts RESET into the frame, the frame posts CLOSE back.
//!
//! # Modules
//!
//! - [`protocol`] - lifecycle messages, origin trust and delivery
//! - [`host`] - launcher, overlay and dismissed flag on the host page
//! - [`app`] - rating form state machine, submission and its runner
//! - [`session`] - host and frame actors wired together
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod app;
pub mod cli;
pub mod config;
pub mod console;
pub mod host;
pub mod protocol;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use app::{AppEvent, AppSnapshot, AppView, FeedbackApp, FeedbackPayload, FeedbackSubmitter, HttpSubmitter, Rating};
pub use config::{Config, FeedbackConfig, HostConfig, StorageConfig};
pub use host::{HostController, HostEvent, HostSnapshot, ReadyState};
pub use protocol::{Envelope, Signal, TrustedOrigin, WidgetMessage};
pub use session::{Services, Session};
