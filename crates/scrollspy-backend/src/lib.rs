#![forbid(unsafe_code)]
#![doc = "Host capability traits for scrollspy: the boundary between the navigation"]
#![doc = "controller and the page it runs in."]
#![doc = ""]
#![doc = "The controller never touches `window.location`, `scrollIntoView` or"]
#![doc = "`IntersectionObserver` directly. Everything flows through these traits so"]
#![doc = "the host can be a browser binding (`scrollspy-web`) or a test double."]

use core::fmt;
use core::time::Duration;

use scrollspy_core::{ActiveBand, ItemId, ScrollBehavior};

/// Monotonic clock abstraction.
///
/// Browser hosts use `performance.now()`; deterministic hosts advance time
/// explicitly. The controller never calls `Instant::now()` itself.
pub trait HostClock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Wall-backed monotonic clock for hosts that do not drive time explicitly.
///
/// Uses `web_time::Instant`, which maps to `performance.now()` on
/// `wasm32-unknown-unknown` and to `std::time::Instant` elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: web_time::Instant,
}

impl MonotonicClock {
    /// Start a clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// The browser location bar, reduced to its fragment.
///
/// The controller is the sole writer while mounted and only ever replaces the
/// current history entry, so back/forward navigation is never polluted by
/// scroll-driven updates.
pub trait LocationBar {
    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Current fragment without the leading `#`, or `None` if absent/empty.
    fn fragment(&self) -> Option<String>;

    /// Replace the fragment without pushing a history entry
    /// (`history.replaceState`).
    fn replace_fragment(&mut self, fragment: &str) -> Result<(), Self::Error>;
}

/// Scroll-into-view capability.
///
/// Fire-and-forget: completion is never awaited.
pub trait Scroller {
    /// Element handle type.
    type Element;
    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Scroll `element` to the top of the viewport.
    fn scroll_into_view(
        &mut self,
        element: &Self::Element,
        behavior: ScrollBehavior,
    ) -> Result<(), Self::Error>;
}

/// Options handed to the host when the observer connects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// CSS `rootMargin` string, e.g. `"-100px 0px -60% 0px"`.
    pub root_margin: String,
    /// Minimum intersection ratio.
    pub threshold: f64,
}

impl From<&ActiveBand> for ObserverOptions {
    fn from(band: &ActiveBand) -> Self {
        Self {
            root_margin: band.root_margin(),
            threshold: band.threshold,
        }
    }
}

/// Visibility observation capability (`IntersectionObserver`).
///
/// The host delivers batches back to the controller asynchronously; this
/// trait only covers the subscription side. The observed set changes
/// incrementally: `observe`/`unobserve` never require re-subscribing
/// unrelated elements.
pub trait VisibilityObserver {
    /// Element handle type.
    type Element;
    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Create the underlying observer with the given band.
    fn connect(&mut self, options: &ObserverOptions) -> Result<(), Self::Error>;

    /// Start watching `element`, reporting it as `id`.
    fn observe(&mut self, id: &ItemId, element: &Self::Element) -> Result<(), Self::Error>;

    /// Stop watching `element`.
    fn unobserve(&mut self, id: &ItemId, element: &Self::Element) -> Result<(), Self::Error>;

    /// Stop watching everything and drop the underlying observer.
    fn disconnect(&mut self) -> Result<(), Self::Error>;
}

/// Unified host combining clock, location bar, scroller and observer.
///
/// `NavController` is generic over this trait. Concrete implementations:
/// - `scrollspy-web`: host-driven deterministic backend for WASM and tests.
pub trait NavBackend {
    /// Platform-specific error type shared across capabilities.
    type Error: fmt::Debug + fmt::Display;

    /// Element handle type shared by scroller and observer.
    type Element: Clone + PartialEq;

    /// Clock implementation.
    type Clock: HostClock;

    /// Location bar implementation.
    type Location: LocationBar<Error = Self::Error>;

    /// Scroller implementation.
    type Scroller: Scroller<Element = Self::Element, Error = Self::Error>;

    /// Observer implementation.
    type Observer: VisibilityObserver<Element = Self::Element, Error = Self::Error>;

    /// Access the monotonic clock.
    fn clock(&self) -> &Self::Clock;

    /// Access the location bar.
    fn location(&mut self) -> &mut Self::Location;

    /// Access the scroller.
    fn scroller(&mut self) -> &mut Self::Scroller;

    /// Access the visibility observer.
    fn observer(&mut self) -> &mut Self::Observer;
}
