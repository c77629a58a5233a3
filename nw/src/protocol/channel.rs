//! Cross-boundary message delivery
//!
//! A [`Port`] is one side's handle for posting into the other side's inbox.
//! Delivery follows the browser rule: a post whose target origin is neither
//! `*` nor the recipient document's origin is dropped and reported to the
//! sender as [`ChannelError::OriginMismatch`].

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use super::messages::{Envelope, WidgetMessage};
use super::origin::WILDCARD;

/// Errors from posting a message across the boundary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Target origin {target} does not match recipient origin {recipient}")]
    OriginMismatch { target: String, recipient: String },

    #[error("Recipient is gone")]
    Closed,
}

/// Anything a lifecycle message can be posted to
pub trait MessageTarget: Send + Sync {
    fn post(&self, message: WidgetMessage, target_origin: &str) -> Result<(), ChannelError>;
}

/// Posting handle into another document's inbox
///
/// `wrap` adapts the delivered [`Envelope`] to the recipient's event type.
pub struct Port<T> {
    tx: mpsc::UnboundedSender<T>,
    sender_origin: String,
    recipient_origin: String,
    wrap: fn(Envelope) -> T,
}

impl<T> Port<T> {
    pub fn new(
        tx: mpsc::UnboundedSender<T>,
        sender_origin: impl Into<String>,
        recipient_origin: impl Into<String>,
        wrap: fn(Envelope) -> T,
    ) -> Self {
        Self {
            tx,
            sender_origin: sender_origin.into(),
            recipient_origin: recipient_origin.into(),
            wrap,
        }
    }
}

impl<T> Clone for Port<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            sender_origin: self.sender_origin.clone(),
            recipient_origin: self.recipient_origin.clone(),
            wrap: self.wrap,
        }
    }
}

impl<T: Send> MessageTarget for Port<T> {
    fn post(&self, message: WidgetMessage, target_origin: &str) -> Result<(), ChannelError> {
        if target_origin != WILDCARD && target_origin != self.recipient_origin {
            debug!(
                message = message.type_name(),
                %target_origin,
                recipient = %self.recipient_origin,
                "Port::post: target origin mismatch, not delivered"
            );
            return Err(ChannelError::OriginMismatch {
                target: target_origin.to_string(),
                recipient: self.recipient_origin.clone(),
            });
        }

        let envelope = Envelope::new(self.sender_origin.clone(), message.to_value());
        debug!(message = message.type_name(), from = %self.sender_origin, "Port::post: delivering");
        self.tx.send((self.wrap)(envelope)).map_err(|_| ChannelError::Closed)
    }
}
