//! Host Controller - launcher, overlay and embedded frame on the host page
//!
//! The controller owns overlay visibility and the dismissed flag, and talks to
//! the embedded app only through [`EmbeddedFrame`]. [`runtime::run`] drives it
//! from page events.

mod controller;
pub mod page;
pub mod runtime;

pub use controller::{DISMISSED_VALUE, EmbeddedFrame, HostController, HostSnapshot, STORAGE_KEY};
pub use page::{Element, Page, ReadyState};
pub use runtime::HostEvent;
