//! Messaging protocol between the host page and the embedded app
//!
//! Two messages cross the boundary, one in each direction:
//!
//! ```text
//!   Host Controller                         Feedback Application
//!  ┌───────────────┐  {"type":"NPS_WIDGET_RESET"}  ┌───────────────┐
//!  │  host page    │ ────────────────────────────► │  frame        │
//!  │               │ ◄──────────────────────────── │               │
//!  └───────────────┘  {"type":"NPS_WIDGET_CLOSE"}  └───────────────┘
//! ```
//!
//! Receivers validate the sender origin against a [`TrustedOrigin`] derived
//! once from configuration, then act on the [`Signal`] returned by
//! [`classify`].

pub mod channel;
pub mod messages;
pub mod origin;

pub use channel::{ChannelError, MessageTarget, Port};
pub use messages::{CLOSE_TYPE, Envelope, RESET_TYPE, WidgetMessage};
pub use origin::{InvalidUrl, Signal, TrustedOrigin, WILDCARD, classify, origin_of};
