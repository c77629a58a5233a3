//! Session - wires a host page and its embedded frame together
//!
//! Two actors run on the current runtime:
//!
//! - the host loop ([`host::runtime::run`]) owning the [`HostController`]
//! - the frame supervisor, which mounts a fresh [`AppRunner`] on every frame
//!   load and unmounts the previous one
//!
//! Messages between them travel through [`Port`]s, so the target-origin rule
//! applies exactly as it would between two windows.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result, eyre};
use keystore::LocalStorage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{AppEvent, AppRunner, AppServices, AppSnapshot, FeedbackSubmitter, InFlight, Navigator, Prompter};
use crate::config::{Config, FeedbackConfig};
use crate::host::{self, EmbeddedFrame, HostController, HostEvent, HostSnapshot, Page, ReadyState};
use crate::protocol::{ChannelError, Envelope, MessageTarget, Port, WidgetMessage, origin_of};

/// Origin of a document whose URL has no usable origin
const OPAQUE_ORIGIN: &str = "null";

/// Collaborators a session needs from its environment
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn LocalStorage>,
    pub submitter: Arc<dyn FeedbackSubmitter>,
    pub navigator: Arc<dyn Navigator>,
    pub prompter: Arc<dyn Prompter>,
}

impl Services {
    fn app(&self, submissions: InFlight) -> AppServices {
        AppServices {
            submitter: self.submitter.clone(),
            navigator: self.navigator.clone(),
            prompter: self.prompter.clone(),
            submissions,
        }
    }
}

/// Commands for the frame supervisor
#[derive(Debug)]
enum FrameCommand {
    Load { src: String },
    Deliver(Envelope),
    User(AppEvent),
    Shutdown,
}

fn frame_origin(src: &str) -> String {
    origin_of(src).unwrap_or_else(|e| {
        debug!(error = %e, "frame_origin: opaque");
        OPAQUE_ORIGIN.to_string()
    })
}

/// The frame element as the host controller sees it
struct FrameHandle {
    tx: mpsc::UnboundedSender<FrameCommand>,
    page_origin: String,
    port: Port<FrameCommand>,
}

impl FrameHandle {
    fn new(tx: mpsc::UnboundedSender<FrameCommand>, page_origin: String) -> Self {
        let port = Port::new(tx.clone(), page_origin.clone(), OPAQUE_ORIGIN, FrameCommand::Deliver);
        Self { tx, page_origin, port }
    }
}

impl EmbeddedFrame for FrameHandle {
    fn post_message(&self, message: WidgetMessage, target_origin: &str) -> Result<(), ChannelError> {
        self.port.post(message, target_origin)
    }

    fn load(&mut self, src: &str) {
        self.port = Port::new(
            self.tx.clone(),
            self.page_origin.clone(),
            frame_origin(src),
            FrameCommand::Deliver,
        );
        if self.tx.send(FrameCommand::Load { src: src.to_string() }).is_err() {
            debug!("FrameHandle::load: supervisor gone");
        }
    }
}

struct Mounted {
    tx: mpsc::UnboundedSender<AppEvent>,
    task: JoinHandle<()>,
}

impl Mounted {
    async fn unmount(self) {
        // Already-exited runners just drop the event
        let _ = self.tx.send(AppEvent::Shutdown);
        if let Err(e) = self.task.await {
            debug!(error = %e, "unmount: runner task failed");
        }
    }
}

struct FrameSupervisor {
    config: FeedbackConfig,
    services: AppServices,
    host_tx: mpsc::UnboundedSender<HostEvent>,
    page_origin: String,
    view: Arc<watch::Sender<AppSnapshot>>,
    generation: u64,
}

impl FrameSupervisor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<FrameCommand>) {
        let mut mounted: Option<Mounted> = None;

        while let Some(command) = rx.recv().await {
            match command {
                FrameCommand::Load { src } => {
                    if let Some(previous) = mounted.take() {
                        previous.unmount().await;
                    }
                    mounted = Some(self.mount(&src));
                }
                FrameCommand::Deliver(envelope) => Self::forward(mounted.as_ref(), AppEvent::Message(envelope)),
                FrameCommand::User(event) => Self::forward(mounted.as_ref(), event),
                FrameCommand::Shutdown => break,
            }
        }

        if let Some(current) = mounted.take() {
            current.unmount().await;
        }
        debug!("FrameSupervisor::run: stopped");
    }

    fn mount(&mut self, src: &str) -> Mounted {
        self.generation += 1;
        let origin = frame_origin(src);
        debug!(%src, %origin, generation = self.generation, "mount: loading frame document");

        let parent: Arc<dyn MessageTarget> = Arc::new(Port::new(
            self.host_tx.clone(),
            origin,
            self.page_origin.clone(),
            HostEvent::Message,
        ));
        let runner = AppRunner::new(
            &self.config,
            self.services.clone(),
            parent,
            &self.page_origin,
            self.generation,
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(runner.run(rx, self.view.clone()));
        Mounted { tx, task }
    }

    fn forward(mounted: Option<&Mounted>, event: AppEvent) {
        match mounted {
            Some(current) => {
                if current.tx.send(event).is_err() {
                    debug!("forward: frame document gone");
                }
            }
            None => debug!(?event, "forward: no frame document loaded, dropping"),
        }
    }
}

/// A running host page with its widget
pub struct Session {
    host_tx: mpsc::UnboundedSender<HostEvent>,
    frame_tx: mpsc::UnboundedSender<FrameCommand>,
    host_view: watch::Receiver<HostSnapshot>,
    app_view: watch::Receiver<AppSnapshot>,
    host_task: JoinHandle<()>,
    frame_task: JoinHandle<()>,
    submissions: InFlight,
    submit_timeout: Duration,
}

impl Session {
    /// Start both actors and initialize the widget
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config, services: Services, ready: ReadyState) -> Result<Self> {
        let page_origin = origin_of(&config.host.page_url).context("Invalid host page URL")?;
        info!(%page_origin, widget_url = %config.host.effective_widget_url(), "Starting session");

        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (host_view_tx, host_view) = watch::channel(HostSnapshot::default());
        let (app_view_tx, app_view) = watch::channel(AppSnapshot::default());
        let submissions = InFlight::new();

        let supervisor = FrameSupervisor {
            config: config.feedback.clone(),
            services: services.app(submissions.clone()),
            host_tx: host_tx.clone(),
            page_origin: page_origin.clone(),
            view: Arc::new(app_view_tx),
            generation: 0,
        };
        let frame_task = tokio::spawn(supervisor.run(frame_rx));

        let controller = HostController::new(
            config.host.clone(),
            Page::new(ready),
            services.storage,
            Box::new(FrameHandle::new(frame_tx.clone(), page_origin)),
        );
        let host_task = tokio::spawn(host::runtime::run(controller, host_rx, host_view_tx));

        let session = Self {
            host_tx,
            frame_tx,
            host_view,
            app_view,
            host_task,
            frame_task,
            submissions,
            submit_timeout: config.feedback.timeout(),
        };
        session.host(HostEvent::Initialize)?;
        Ok(session)
    }

    /// Deliver an event to the host page
    pub fn host(&self, event: HostEvent) -> Result<()> {
        self.host_tx
            .send(event)
            .map_err(|_| eyre!("Host page is no longer running"))
    }

    /// Deliver an event to the embedded document
    pub fn app(&self, event: AppEvent) -> Result<()> {
        self.frame_tx
            .send(FrameCommand::User(event))
            .map_err(|_| eyre!("Embedded frame is no longer running"))
    }

    pub fn host_view(&self) -> HostSnapshot {
        self.host_view.borrow().clone()
    }

    pub fn app_view(&self) -> AppSnapshot {
        self.app_view.borrow().clone()
    }

    pub fn subscribe_host(&self) -> watch::Receiver<HostSnapshot> {
        self.host_view.clone()
    }

    /// Stop both actors and wait for them
    ///
    /// Submissions still in flight get up to the submission timeout to finish.
    pub async fn shutdown(self) -> Result<()> {
        debug!("Session::shutdown: called");
        let _ = self.host_tx.send(HostEvent::Shutdown);
        self.host_task.await.context("Host loop panicked")?;
        let _ = self.frame_tx.send(FrameCommand::Shutdown);
        self.frame_task.await.context("Frame supervisor panicked")?;

        let pending = self.submissions.len();
        if pending > 0 {
            info!(pending, "Waiting for feedback submissions");
            match tokio::time::timeout(self.submit_timeout, self.submissions.drain()).await {
                Ok(accepted) => debug!(pending, accepted, "Session::shutdown: submissions drained"),
                Err(_) => warn!(pending, "Feedback submissions still in flight at shutdown, abandoning"),
            }
        }
        info!("Session stopped");
        Ok(())
    }
}
