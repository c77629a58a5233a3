//! Host event loop
//!
//! Drives a [`HostController`] from an inbox of page events, owns the
//! auto-open timer, and publishes a [`HostSnapshot`] after every event.

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

use super::controller::{HostController, HostSnapshot};
use crate::protocol::Envelope;

/// Events delivered to the host page
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Run (or re-run) widget initialization
    Initialize,
    /// The document finished loading
    DocumentReady,
    /// Launcher tab clicked
    LauncherClicked,
    /// Close button clicked
    CloseClicked,
    /// Click on the overlay; `on_backdrop` is false when it landed on the panel
    OverlayClicked { on_backdrop: bool },
    /// A message arrived on the host window
    Message(Envelope),
    /// Stop the loop
    Shutdown,
}

/// Run the host loop until shutdown or until every sender is dropped
pub async fn run(
    mut controller: HostController,
    mut rx: mpsc::UnboundedReceiver<HostEvent>,
    view: watch::Sender<HostSnapshot>,
) {
    let mut auto_open_at: Option<Instant> = None;
    info!("Host loop started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(auto_open_at.unwrap_or_else(Instant::now)), if auto_open_at.is_some() => {
                auto_open_at = None;
                controller.auto_open_elapsed();
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    debug!("host run: inbox closed");
                    break;
                };
                debug!(?event, "host run: event");
                match event {
                    HostEvent::Initialize => {
                        controller.initialize();
                    }
                    HostEvent::DocumentReady => controller.document_ready(),
                    HostEvent::LauncherClicked => controller.launcher_clicked(),
                    HostEvent::CloseClicked => controller.close_clicked(),
                    HostEvent::OverlayClicked { on_backdrop } => controller.overlay_clicked(on_backdrop),
                    HostEvent::Message(envelope) => {
                        controller.handle_incoming_signal(&envelope.origin, &envelope.data);
                    }
                    HostEvent::Shutdown => break,
                }
                if let Some(delay) = controller.arm_auto_open() {
                    auto_open_at = Some(Instant::now() + delay);
                }
            }
        }
        view.send_replace(controller.snapshot());
    }

    info!("Host loop stopped");
}
