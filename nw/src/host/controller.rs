//! HostController - owns the launcher, overlay and embedded frame on the host page
//!
//! All state lives on one controller instance built at startup. Storage and
//! cross-boundary failures are logged and swallowed: the widget keeps working
//! without either.

use std::sync::Arc;
use std::time::Duration;

use keystore::LocalStorage;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::page::{self, ACTIVE_CLASS, BODY_LOCK_CLASS, FRAME_CLASS, OVERLAY_CLASS, Page, ReadyState};
use crate::config::HostConfig;
use crate::protocol::{ChannelError, Signal, TrustedOrigin, WidgetMessage, classify};

/// Storage key holding the dismissed flag
pub const STORAGE_KEY: &str = "nps-widget-closed";

/// Value stored under [`STORAGE_KEY`] once dismissed
pub const DISMISSED_VALUE: &str = "true";

/// The embedded frame as seen from the host
pub trait EmbeddedFrame: Send {
    /// Post a message into the frame's document
    fn post_message(&self, message: WidgetMessage, target_origin: &str) -> Result<(), ChannelError>;

    /// Navigate the frame to `src`, discarding whatever document it held
    fn load(&mut self, src: &str);
}

/// Point-in-time view of the host state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSnapshot {
    pub initialized: bool,
    pub visible: bool,
    pub scroll_locked: bool,
    pub dismissed: bool,
    pub frame_src: Option<String>,
    /// Number of times the frame has been (re)loaded
    pub frame_loads: u64,
}

pub struct HostController {
    config: HostConfig,
    storage: Arc<dyn LocalStorage>,
    frame: Box<dyn EmbeddedFrame>,
    page: Page,
    trusted: Option<TrustedOrigin>,
    widget_url: String,
    initialized: bool,
    visible: bool,
    auto_open_armed: bool,
    frame_loads: u64,
}

impl HostController {
    pub fn new(
        config: HostConfig,
        page: Page,
        storage: Arc<dyn LocalStorage>,
        frame: Box<dyn EmbeddedFrame>,
    ) -> Self {
        let widget_url = config.effective_widget_url().to_string();
        Self {
            config,
            storage,
            frame,
            page,
            trusted: None,
            widget_url,
            initialized: false,
            visible: false,
            auto_open_armed: false,
            frame_loads: 0,
        }
    }

    /// Insert the widget into the page
    ///
    /// Runs once; later calls (e.g. the script included twice) return `false`
    /// and change nothing.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            debug!("initialize: already initialized, skipping");
            return false;
        }
        self.initialized = true;

        let trusted = TrustedOrigin::from_endpoint(&self.widget_url);
        info!(widget_url = %self.widget_url, trusted = %trusted, "Initializing NPS widget");
        self.trusted = Some(trusted);

        self.page.append_head(page::style_block());
        self.page.append_body(page::launcher());
        self.page.append_body(page::overlay(&self.widget_url));
        self.load_frame();

        true
    }

    /// Show the overlay
    pub fn open(&mut self) {
        if !self.initialized {
            debug!("open: not initialized, ignoring");
            return;
        }
        debug!("open: showing overlay");
        self.visible = true;
        if let Some(overlay) = self.page.find_mut(OVERLAY_CLASS) {
            overlay.classes.insert(ACTIVE_CLASS.to_string());
        }
        if self.config.scroll_lock {
            self.page.add_body_class(BODY_LOCK_CLASS);
        }
    }

    /// Hide the overlay, restart the embedded app and remember the dismissal
    pub fn close(&mut self) {
        if !self.initialized {
            debug!("close: not initialized, ignoring");
            return;
        }
        debug!("close: hiding overlay");

        let target = self.trusted_origin().as_target().to_string();
        if let Err(e) = self.frame.post_message(WidgetMessage::Reset, &target) {
            debug!(error = %e, "close: could not post reset into frame");
        }

        self.visible = false;
        if let Some(overlay) = self.page.find_mut(OVERLAY_CLASS) {
            overlay.classes.remove(ACTIVE_CLASS);
        }
        self.page.remove_body_class(BODY_LOCK_CLASS);

        self.load_frame();
        self.remember_dismissed();
    }

    /// Route a message received on the host window
    ///
    /// Only CLOSE from the trusted origin has an effect. Returns the decision.
    pub fn handle_incoming_signal(&mut self, origin: &str, payload: &Value) -> Signal {
        let Some(trusted) = self.trusted.as_ref() else {
            debug!("handle_incoming_signal: not initialized, ignoring");
            return Signal::Ignore;
        };

        let signal = classify(trusted, origin, payload);
        debug!(%origin, ?signal, "handle_incoming_signal: classified");
        if signal == Signal::Close {
            self.close();
        }
        signal
    }

    /// Launcher tab clicked
    pub fn launcher_clicked(&mut self) {
        self.open();
    }

    /// Close button in the panel clicked
    pub fn close_clicked(&mut self) {
        self.close();
    }

    /// Click landed on the overlay; only the backdrop itself closes it
    pub fn overlay_clicked(&mut self, on_backdrop: bool) {
        if on_backdrop {
            self.close();
        }
    }

    /// Mark the document interactive
    pub fn document_ready(&mut self) {
        if self.page.ready_state() == ReadyState::Loading {
            self.page.set_ready_state(ReadyState::Interactive);
        }
    }

    /// Arm the one-shot auto-open timer
    ///
    /// Returns the delay to wait, or `None` when auto-open does not apply: not
    /// initialized, document still loading, already armed this session, or
    /// previously dismissed.
    pub fn arm_auto_open(&mut self) -> Option<Duration> {
        if !self.initialized || self.auto_open_armed || self.page.ready_state() == ReadyState::Loading {
            return None;
        }
        self.auto_open_armed = true;

        if self.has_been_dismissed() {
            info!("Widget dismissed earlier, not auto-opening");
            return None;
        }
        let delay = self.config.auto_open_delay();
        debug!(?delay, "arm_auto_open: scheduling auto-open");
        Some(delay)
    }

    /// The auto-open timer fired
    ///
    /// A dismissal that happened while the timer was pending still wins.
    pub fn auto_open_elapsed(&mut self) {
        if self.visible || self.has_been_dismissed() {
            debug!(visible = self.visible, "auto_open_elapsed: skipping");
            return;
        }
        info!("Auto-opening widget");
        self.open();
    }

    /// Whether the user dismissed the widget in an earlier visit
    ///
    /// Unreadable storage counts as not dismissed.
    pub fn has_been_dismissed(&self) -> bool {
        match self.storage.get_item(STORAGE_KEY) {
            Ok(value) => value.as_deref() == Some(DISMISSED_VALUE),
            Err(e) => {
                debug!(error = %e, "has_been_dismissed: storage unavailable");
                false
            }
        }
    }

    fn remember_dismissed(&self) {
        if let Err(e) = self.storage.set_item(STORAGE_KEY, DISMISSED_VALUE) {
            warn!(error = %e, "Could not persist dismissed flag");
        }
    }

    fn load_frame(&mut self) {
        if let Some(frame) = self.page.find_mut(FRAME_CLASS) {
            frame.set_attr("src", self.widget_url.clone());
        }
        self.frame.load(&self.widget_url);
        self.frame_loads += 1;
        debug!(frame_loads = self.frame_loads, "load_frame: frame loaded");
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Trusted origin; wildcard before initialization
    pub fn trusted_origin(&self) -> &TrustedOrigin {
        self.trusted.as_ref().unwrap_or(&TrustedOrigin::Any)
    }

    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            initialized: self.initialized,
            visible: self.visible,
            scroll_locked: self.page.has_body_class(BODY_LOCK_CLASS),
            dismissed: self.has_been_dismissed(),
            frame_src: self
                .page
                .find(FRAME_CLASS)
                .and_then(|f| f.get_attr("src"))
                .map(str::to_string),
            frame_loads: self.frame_loads,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock::RecordingFrame;
    use super::*;
    use keystore::{MemoryStorage, UnavailableStorage};
    use serde_json::json;

    const WIDGET: &str = "https://widget.example.com/nps";
    const WIDGET_ORIGIN: &str = "https://widget.example.com";

    fn host_config(url: &str) -> HostConfig {
        HostConfig {
            widget_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    fn controller_with(
        url: &str,
        storage: Arc<dyn LocalStorage>,
        ready: ReadyState,
    ) -> (HostController, RecordingFrame) {
        let frame = RecordingFrame::default();
        let controller = HostController::new(host_config(url), Page::new(ready), storage, Box::new(frame.clone()));
        (controller, frame)
    }

    fn controller() -> (HostController, RecordingFrame) {
        controller_with(WIDGET, Arc::new(MemoryStorage::new()), ReadyState::Complete)
    }

    #[test]
    fn test_initialize_inserts_widget_once() {
        let (mut host, frame) = controller();

        assert!(host.initialize());
        assert!(!host.initialize());

        assert_eq!(host.page().head().len(), 1);
        assert_eq!(host.page().count(page::LAUNCHER_CLASS), 1);
        assert_eq!(host.page().count(OVERLAY_CLASS), 1);
        assert_eq!(frame.loads.lock().unwrap().as_slice(), [WIDGET.to_string()]);
        assert_eq!(
            host.trusted_origin(),
            &TrustedOrigin::Exact(WIDGET_ORIGIN.to_string())
        );
    }

    #[test]
    fn test_initialize_with_malformed_url_trusts_any() {
        let (mut host, _) = controller_with("not a url", Arc::new(MemoryStorage::new()), ReadyState::Complete);
        host.initialize();

        assert_eq!(host.trusted_origin(), &TrustedOrigin::Any);
        let signal = host.handle_incoming_signal("https://anyone.example", &json!({"type": "NPS_WIDGET_CLOSE"}));
        assert_eq!(signal, Signal::Close);
    }

    #[test]
    fn test_open_sets_visibility_and_scroll_lock() {
        let (mut host, _) = controller();
        host.initialize();
        host.launcher_clicked();

        assert!(host.is_visible());
        assert!(host.page().find(OVERLAY_CLASS).unwrap().has_class(ACTIVE_CLASS));
        assert!(host.page().has_body_class(BODY_LOCK_CLASS));
    }

    #[test]
    fn test_open_without_scroll_lock_variant() {
        let frame = RecordingFrame::default();
        let config = HostConfig {
            scroll_lock: false,
            ..host_config(WIDGET)
        };
        let mut host = HostController::new(
            config,
            Page::new(ReadyState::Complete),
            Arc::new(MemoryStorage::new()),
            Box::new(frame),
        );
        host.initialize();
        host.open();

        assert!(host.is_visible());
        assert!(!host.page().has_body_class(BODY_LOCK_CLASS));
    }

    #[test]
    fn test_open_before_initialize_is_ignored() {
        let (mut host, _) = controller();
        host.open();
        assert!(!host.is_visible());
    }

    #[test]
    fn test_close_resets_reloads_and_persists() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut host, frame) = controller_with(WIDGET, storage.clone(), ReadyState::Complete);
        host.initialize();
        host.open();
        host.close_clicked();

        assert!(!host.is_visible());
        assert!(!host.page().find(OVERLAY_CLASS).unwrap().has_class(ACTIVE_CLASS));
        assert!(!host.page().has_body_class(BODY_LOCK_CLASS));
        assert_eq!(
            frame.posts.lock().unwrap().as_slice(),
            [(WidgetMessage::Reset, WIDGET_ORIGIN.to_string())]
        );
        assert_eq!(frame.loads.lock().unwrap().len(), 2);
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap(), Some("true".to_string()));
        assert!(host.snapshot().dismissed);
    }

    #[test]
    fn test_close_survives_blocked_post_and_missing_storage() {
        let frame = RecordingFrame {
            reject_posts: true,
            ..Default::default()
        };
        let mut host = HostController::new(
            host_config(WIDGET),
            Page::new(ReadyState::Complete),
            Arc::new(UnavailableStorage::default()),
            Box::new(frame.clone()),
        );
        host.initialize();
        host.open();
        host.close();

        assert!(!host.is_visible());
        assert_eq!(frame.loads.lock().unwrap().len(), 2);
        assert!(!host.has_been_dismissed());
    }

    #[test]
    fn test_backdrop_click_only_closes_on_backdrop() {
        let (mut host, _) = controller();
        host.initialize();
        host.open();

        host.overlay_clicked(false);
        assert!(host.is_visible());

        host.overlay_clicked(true);
        assert!(!host.is_visible());
    }

    #[test]
    fn test_close_signal_from_trusted_origin_closes() {
        let (mut host, _) = controller();
        host.initialize();
        host.open();

        let signal = host.handle_incoming_signal(WIDGET_ORIGIN, &json!({"type": "NPS_WIDGET_CLOSE"}));

        assert_eq!(signal, Signal::Close);
        assert!(!host.is_visible());
    }

    #[test]
    fn test_close_signal_from_untrusted_origin_ignored() {
        let (mut host, frame) = controller();
        host.initialize();
        host.open();

        let signal = host.handle_incoming_signal("https://evil.example", &json!({"type": "NPS_WIDGET_CLOSE"}));

        assert_eq!(signal, Signal::Ignore);
        assert!(host.is_visible());
        assert_eq!(frame.loads.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_other_messages_ignored() {
        let (mut host, _) = controller();
        host.initialize();
        host.open();

        host.handle_incoming_signal(WIDGET_ORIGIN, &json!({"type": "NPS_WIDGET_RESET"}));
        host.handle_incoming_signal(WIDGET_ORIGIN, &json!("hello"));
        host.handle_incoming_signal(WIDGET_ORIGIN, &json!({"kind": "NPS_WIDGET_CLOSE"}));

        assert!(host.is_visible());
    }

    #[test]
    fn test_signal_before_initialize_ignored() {
        let (mut host, _) = controller();
        let signal = host.handle_incoming_signal(WIDGET_ORIGIN, &json!({"type": "NPS_WIDGET_CLOSE"}));
        assert_eq!(signal, Signal::Ignore);
    }

    #[test]
    fn test_auto_open_armed_once() {
        let (mut host, _) = controller();
        host.initialize();

        assert_eq!(host.arm_auto_open(), Some(Duration::from_secs(1)));
        assert_eq!(host.arm_auto_open(), None);
    }

    #[test]
    fn test_auto_open_waits_for_document() {
        let (mut host, _) = controller_with(WIDGET, Arc::new(MemoryStorage::new()), ReadyState::Loading);
        host.initialize();

        assert_eq!(host.arm_auto_open(), None);
        host.document_ready();
        assert_eq!(host.arm_auto_open(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_auto_open_suppressed_after_dismissal() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());

        let (mut first, _) = controller_with(WIDGET, storage.clone(), ReadyState::Complete);
        first.initialize();
        assert!(first.arm_auto_open().is_some());
        first.auto_open_elapsed();
        first.close();

        // Later visits sharing the same storage never auto-open
        for _ in 0..3 {
            let (mut next, _) = controller_with(WIDGET, storage.clone(), ReadyState::Complete);
            next.initialize();
            assert_eq!(next.arm_auto_open(), None);
        }

        // Until the flag is cleared externally
        storage.remove_item(STORAGE_KEY).unwrap();
        let (mut cleared, _) = controller_with(WIDGET, storage, ReadyState::Complete);
        cleared.initialize();
        assert!(cleared.arm_auto_open().is_some());
    }

    #[test]
    fn test_non_true_flag_is_not_dismissed() {
        let storage = Arc::new(MemoryStorage::with_items([(STORAGE_KEY, "yes")]));
        let (mut host, _) = controller_with(WIDGET, storage, ReadyState::Complete);
        host.initialize();
        assert!(host.arm_auto_open().is_some());
    }

    #[test]
    fn test_auto_open_with_unavailable_storage_still_opens() {
        let (mut host, _) = controller_with(WIDGET, Arc::new(UnavailableStorage::default()), ReadyState::Complete);
        host.initialize();

        assert!(host.arm_auto_open().is_some());
        host.auto_open_elapsed();
        assert!(host.is_visible());
    }

    #[test]
    fn test_dismissal_while_timer_pending_wins() {
        let (mut host, _) = controller();
        host.initialize();
        assert!(host.arm_auto_open().is_some());

        host.open();
        host.close();
        host.auto_open_elapsed();

        assert!(!host.is_visible());
    }
}
