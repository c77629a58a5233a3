//! Host page model
//!
//! A minimal document tree: the elements the launcher inserts, their classes
//! and attributes, and the body class list used for the scroll lock.

use std::collections::{BTreeMap, BTreeSet};

/// Stylesheet inserted into the host page's head
pub const STYLE_SHEET: &str = include_str!("widget.css");

pub const LAUNCHER_CLASS: &str = "nps-launcher-btn";
pub const LAUNCHER_TEXT_CLASS: &str = "nps-launcher-btn-text";
pub const LAUNCHER_ICON_CLASS: &str = "nps-launcher-btn-icon";
pub const OVERLAY_CLASS: &str = "nps-widget-overlay";
pub const PANEL_CLASS: &str = "nps-widget-panel";
pub const FRAME_CLASS: &str = "nps-widget-frame";
pub const CLOSE_CLASS: &str = "nps-widget-close";
pub const ACTIVE_CLASS: &str = "active";
pub const BODY_LOCK_CLASS: &str = "nps-modal-body-lock";

/// Loading state of the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// One element in the page tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: BTreeSet::new(),
            attributes: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    fn find(&self, class: &str) -> Option<&Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(class))
    }

    fn find_mut(&mut self, class: &str) -> Option<&mut Element> {
        if self.has_class(class) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(class))
    }

    fn count(&self, class: &str) -> usize {
        usize::from(self.has_class(class)) + self.children.iter().map(|c| c.count(class)).sum::<usize>()
    }
}

/// The host document
#[derive(Debug, Clone)]
pub struct Page {
    ready_state: ReadyState,
    head: Vec<Element>,
    body: Vec<Element>,
    body_classes: BTreeSet<String>,
}

impl Page {
    pub fn new(ready_state: ReadyState) -> Self {
        Self {
            ready_state,
            head: Vec::new(),
            body: Vec::new(),
            body_classes: BTreeSet::new(),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn append_head(&mut self, element: Element) {
        self.head.push(element);
    }

    pub fn append_body(&mut self, element: Element) {
        self.body.push(element);
    }

    pub fn head(&self) -> &[Element] {
        &self.head
    }

    pub fn add_body_class(&mut self, class: &str) {
        self.body_classes.insert(class.to_string());
    }

    pub fn remove_body_class(&mut self, class: &str) {
        self.body_classes.remove(class);
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    /// First element in the body carrying `class`, depth first
    pub fn find(&self, class: &str) -> Option<&Element> {
        self.body.iter().find_map(|e| e.find(class))
    }

    pub fn find_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.body.iter_mut().find_map(|e| e.find_mut(class))
    }

    /// Number of body elements carrying `class`
    pub fn count(&self, class: &str) -> usize {
        self.body.iter().map(|e| e.count(class)).sum()
    }
}

/// `<style>` block with the widget stylesheet
pub fn style_block() -> Element {
    Element::new("style").text(STYLE_SHEET)
}

/// The vertical "Review US" launcher tab
pub fn launcher() -> Element {
    Element::new("button")
        .class(LAUNCHER_CLASS)
        .attr("aria-label", "Open feedback survey")
        .child(Element::new("span").class(LAUNCHER_TEXT_CLASS).text("Review US"))
        .child(
            Element::new("svg")
                .class(LAUNCHER_ICON_CLASS)
                .attr("viewBox", "0 0 24 24")
                .attr("aria-hidden", "true"),
        )
}

/// Overlay holding the close button and the embedded frame
pub fn overlay(frame_src: &str) -> Element {
    let close = Element::new("button")
        .class(CLOSE_CLASS)
        .attr("aria-label", "Close survey")
        .text("×");
    let frame = Element::new("iframe")
        .class(FRAME_CLASS)
        .attr("src", frame_src)
        .attr("title", "Experience survey")
        .attr("loading", "lazy");

    Element::new("div")
        .class(OVERLAY_CLASS)
        .child(Element::new("div").class(PANEL_CLASS).child(close).child(frame))
}
