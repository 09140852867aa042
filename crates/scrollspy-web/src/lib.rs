#![forbid(unsafe_code)]

//! `scrollspy-web` provides a host-driven backend for the navigation
//! controller.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding page (JS) pushes visibility batches and
//!   drains the commands the controller issued (`replaceState`,
//!   `scrollIntoView`, observer subscriptions).
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. It provides the backend
//! building blocks a JS glue layer wraps, plus [`viewport::ViewportSim`] and
//! [`session_record`] for exercising the controller without a browser.

pub mod session_record;
pub mod viewport;

use core::time::Duration;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use scrollspy_backend::{
    HostClock, LocationBar, NavBackend, ObserverOptions, Scroller, VisibilityObserver,
};
use scrollspy_core::element::parse_element_dom_id;
use scrollspy_core::{ItemId, ScrollBehavior, strip_hash};

/// Web backend error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebBackendError {
    /// Observer call made before `connect` or after `disconnect`.
    NotConnected,
    /// Generic unsupported operation.
    Unsupported(&'static str),
}

impl core::fmt::Display for WebBackendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "observer is not connected"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for WebBackendError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl HostClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Handle to a rendered item root, identified by its DOM id
/// (e.g. `section-64f0c1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef(String);

impl ElementRef {
    #[must_use]
    pub fn new(dom_id: impl Into<String>) -> Self {
        Self(dom_id.into())
    }

    #[must_use]
    pub fn dom_id(&self) -> &str {
        &self.0
    }

    /// Item id encoded in the DOM id, if it has the `<prefix>-<id>` shape.
    #[must_use]
    pub fn item_id(&self) -> Option<ItemId> {
        parse_element_dom_id(&self.0)
    }
}

impl core::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One side effect the controller asked the page to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// `history.replaceState(null, "", "#" + fragment)`.
    ReplaceFragment { fragment: String },
    /// `element.scrollIntoView({ behavior })`.
    ScrollIntoView {
        element: ElementRef,
        behavior: ScrollBehavior,
    },
    /// `new IntersectionObserver(cb, { rootMargin, threshold })`.
    Connect { root_margin: String, threshold: f64 },
    /// `observer.observe(element)`.
    Observe { id: ItemId, element: ElementRef },
    /// `observer.unobserve(element)`.
    Unobserve { id: ItemId, element: ElementRef },
    /// `observer.disconnect()`.
    Disconnect,
}

/// Ordered command log shared by the capabilities of one backend.
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<HostCommand>>>,
}

impl CommandLog {
    fn push(&self, command: HostCommand) {
        self.commands.borrow_mut().push(command);
    }

    /// Commands issued since the last drain.
    #[must_use]
    pub fn pending(&self) -> Vec<HostCommand> {
        self.commands.borrow().clone()
    }

    /// Take all pending commands.
    pub fn drain(&self) -> Vec<HostCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}

/// Location bar mirror. The host seeds the fragment at load and replays
/// `ReplaceFragment` commands onto `window.history`.
#[derive(Debug)]
pub struct WebLocation {
    fragment: Option<String>,
    log: CommandLog,
}

impl WebLocation {
    fn new(initial: Option<&str>, log: CommandLog) -> Self {
        Self {
            fragment: initial.and_then(strip_hash).map(str::to_owned),
            log,
        }
    }

    /// Fragment changed outside the controller (e.g. the user edited the
    /// address bar).
    pub fn set_from_host(&mut self, raw: &str) {
        self.fragment = strip_hash(raw).map(str::to_owned);
    }

    /// Current `location.hash`, with the leading `#`.
    #[must_use]
    pub fn hash(&self) -> String {
        self.fragment
            .as_deref()
            .map_or_else(String::new, |fragment| format!("#{fragment}"))
    }
}

impl LocationBar for WebLocation {
    type Error = WebBackendError;

    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, fragment: &str) -> Result<(), Self::Error> {
        self.fragment = strip_hash(fragment).map(str::to_owned);
        self.log.push(HostCommand::ReplaceFragment {
            fragment: fragment.to_owned(),
        });
        Ok(())
    }
}

/// Scroller that forwards requests to the host.
#[derive(Debug)]
pub struct WebScroller {
    last_target: Option<ElementRef>,
    log: CommandLog,
}

impl WebScroller {
    /// Element of the most recent scroll request.
    #[must_use]
    pub fn last_target(&self) -> Option<&ElementRef> {
        self.last_target.as_ref()
    }
}

impl Scroller for WebScroller {
    type Element = ElementRef;
    type Error = WebBackendError;

    fn scroll_into_view(
        &mut self,
        element: &ElementRef,
        behavior: ScrollBehavior,
    ) -> Result<(), Self::Error> {
        self.last_target = Some(element.clone());
        self.log.push(HostCommand::ScrollIntoView {
            element: element.clone(),
            behavior,
        });
        Ok(())
    }
}

/// Observer mirror: tracks what the page's `IntersectionObserver` watches.
#[derive(Debug)]
pub struct WebObserver {
    options: Option<ObserverOptions>,
    observed: BTreeMap<ItemId, ElementRef>,
    log: CommandLog,
}

impl WebObserver {
    /// Options of the live observer, if connected.
    #[must_use]
    pub fn options(&self) -> Option<&ObserverOptions> {
        self.options.as_ref()
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.options.is_some()
    }

    /// Currently observed item ids, sorted.
    pub fn observed_ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        self.observed.keys()
    }

    #[must_use]
    pub fn is_observing(&self, id: &ItemId) -> bool {
        self.observed.contains_key(id)
    }
}

impl VisibilityObserver for WebObserver {
    type Element = ElementRef;
    type Error = WebBackendError;

    fn connect(&mut self, options: &ObserverOptions) -> Result<(), Self::Error> {
        self.options = Some(options.clone());
        self.log.push(HostCommand::Connect {
            root_margin: options.root_margin.clone(),
            threshold: options.threshold,
        });
        Ok(())
    }

    fn observe(&mut self, id: &ItemId, element: &ElementRef) -> Result<(), Self::Error> {
        if self.options.is_none() {
            return Err(WebBackendError::NotConnected);
        }
        self.observed.insert(id.clone(), element.clone());
        self.log.push(HostCommand::Observe {
            id: id.clone(),
            element: element.clone(),
        });
        Ok(())
    }

    fn unobserve(&mut self, id: &ItemId, element: &ElementRef) -> Result<(), Self::Error> {
        if self.options.is_none() {
            return Err(WebBackendError::NotConnected);
        }
        self.observed.remove(id);
        self.log.push(HostCommand::Unobserve {
            id: id.clone(),
            element: element.clone(),
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        if self.options.take().is_none() {
            return Err(WebBackendError::NotConnected);
        }
        self.observed.clear();
        self.log.push(HostCommand::Disconnect);
        Ok(())
    }
}

/// A minimal, host-driven web backend.
///
/// This backend is intended to be driven by a JS host:
/// - advance time via [`Self::clock_mut`]
/// - seed or change the fragment via [`Self::location_mut`]
/// - replay issued side effects via [`Self::drain_commands`]
#[derive(Debug)]
pub struct WebBackend {
    clock: DeterministicClock,
    location: WebLocation,
    scroller: WebScroller,
    observer: WebObserver,
    log: CommandLog,
}

impl WebBackend {
    /// Create a backend whose location carries `initial_fragment`
    /// (with or without the leading `#`).
    #[must_use]
    pub fn new(initial_fragment: Option<&str>) -> Self {
        let log = CommandLog::default();
        Self {
            clock: DeterministicClock::new(),
            location: WebLocation::new(initial_fragment, log.clone()),
            scroller: WebScroller {
                last_target: None,
                log: log.clone(),
            },
            observer: WebObserver {
                options: None,
                observed: BTreeMap::new(),
                log: log.clone(),
            },
            log,
        }
    }

    /// Mutably access the clock.
    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    /// Access the location mirror.
    #[must_use]
    pub const fn location_ref(&self) -> &WebLocation {
        &self.location
    }

    /// Mutably access the location mirror.
    pub fn location_mut(&mut self) -> &mut WebLocation {
        &mut self.location
    }

    /// Access the scroller.
    #[must_use]
    pub const fn scroller_ref(&self) -> &WebScroller {
        &self.scroller
    }

    /// Access the observer mirror.
    #[must_use]
    pub const fn observer_ref(&self) -> &WebObserver {
        &self.observer
    }

    /// Commands issued since the last drain, without draining.
    #[must_use]
    pub fn pending_commands(&self) -> Vec<HostCommand> {
        self.log.pending()
    }

    /// Take every command issued since the last drain, in issue order.
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        self.log.drain()
    }
}

impl Default for WebBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl NavBackend for WebBackend {
    type Error = WebBackendError;
    type Element = ElementRef;

    type Clock = DeterministicClock;
    type Location = WebLocation;
    type Scroller = WebScroller;
    type Observer = WebObserver;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn location(&mut self) -> &mut Self::Location {
        &mut self.location
    }

    fn scroller(&mut self) -> &mut Self::Scroller {
        &mut self.scroller
    }

    fn observer(&mut self) -> &mut Self::Observer {
        &mut self.observer
    }
}
