//! Recording host used by the runtime integration tests.

#![allow(dead_code)]

use core::fmt;
use core::time::Duration;

use scrollspy_backend::{
    HostClock, LocationBar, NavBackend, ObserverOptions, Scroller, VisibilityObserver,
};
use scrollspy_core::{Item, ItemId, NavConfig, ScrollBehavior};
use scrollspy_runtime::{ElementSetter, NavController};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub &'static str);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock failure: {}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct MockClock {
    pub now: Duration,
}

impl HostClock for MockClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

#[derive(Debug, Default)]
pub struct MockLocation {
    pub hash: Option<String>,
    pub writes: Vec<String>,
    pub fail: bool,
}

impl LocationBar for MockLocation {
    type Error = MockError;

    fn fragment(&self) -> Option<String> {
        self.hash.clone()
    }

    fn replace_fragment(&mut self, fragment: &str) -> Result<(), MockError> {
        if self.fail {
            return Err(MockError("replaceState"));
        }
        self.hash = Some(fragment.to_owned());
        self.writes.push(fragment.to_owned());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockScroller {
    pub calls: Vec<(u32, ScrollBehavior)>,
}

impl Scroller for MockScroller {
    type Element = u32;
    type Error = MockError;

    fn scroll_into_view(&mut self, element: &u32, behavior: ScrollBehavior) -> Result<(), MockError> {
        self.calls.push((*element, behavior));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverCall {
    Connect(String),
    Observe(String, u32),
    Unobserve(String, u32),
    Disconnect,
}

#[derive(Debug, Default)]
pub struct MockObserver {
    pub calls: Vec<ObserverCall>,
    pub connected: bool,
}

impl VisibilityObserver for MockObserver {
    type Element = u32;
    type Error = MockError;

    fn connect(&mut self, options: &ObserverOptions) -> Result<(), MockError> {
        self.connected = true;
        self.calls.push(ObserverCall::Connect(options.root_margin.clone()));
        Ok(())
    }

    fn observe(&mut self, id: &ItemId, element: &u32) -> Result<(), MockError> {
        self.calls.push(ObserverCall::Observe(id.to_string(), *element));
        Ok(())
    }

    fn unobserve(&mut self, id: &ItemId, element: &u32) -> Result<(), MockError> {
        self.calls.push(ObserverCall::Unobserve(id.to_string(), *element));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), MockError> {
        self.connected = false;
        self.calls.push(ObserverCall::Disconnect);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub clock: MockClock,
    pub location: MockLocation,
    pub scroller: MockScroller,
    pub observer: MockObserver,
}

impl NavBackend for MockBackend {
    type Error = MockError;
    type Element = u32;
    type Clock = MockClock;
    type Location = MockLocation;
    type Scroller = MockScroller;
    type Observer = MockObserver;

    fn clock(&self) -> &MockClock {
        &self.clock
    }

    fn location(&mut self) -> &mut MockLocation {
        &mut self.location
    }

    fn scroller(&mut self) -> &mut MockScroller {
        &mut self.scroller
    }

    fn observer(&mut self) -> &mut MockObserver {
        &mut self.observer
    }
}

pub type Controller = NavController<MockBackend, Item>;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

/// Alpha / Beta / Gamma.
pub fn abc() -> Vec<Item> {
    vec![
        Item::new("a", "Alpha"),
        Item::new("b", "Beta"),
        Item::new("c", "Gamma"),
    ]
}

pub fn controller(hash: Option<&str>) -> Controller {
    controller_with(hash, NavConfig::default())
}

pub fn controller_with(hash: Option<&str>, config: NavConfig) -> Controller {
    let mut backend = MockBackend::default();
    backend.location.hash = hash.map(str::to_owned);
    NavController::new(backend, config)
}

/// Mount `a`→1, `b`→2, `c`→3 and flush.
pub fn mount_abc(ctl: &mut Controller) -> Vec<ElementSetter<u32>> {
    let setters: Vec<_> = [("a", 1), ("b", 2), ("c", 3)]
        .into_iter()
        .map(|(item, element)| {
            let setter = ctl.register_element(item);
            setter.set(Some(element));
            setter
        })
        .collect();
    ctl.flush_registrations();
    setters
}

pub fn advance_to(ctl: &mut Controller, at: Duration) {
    ctl.backend_mut().clock.now = at;
}
