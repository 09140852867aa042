#![forbid(unsafe_code)]

//! Runtime: the navigation controller and its supporting pieces.
//!
//! # Role in scrollspy
//! `scrollspy-runtime` decides which item is active. It is single-threaded
//! and host-driven: the host delivers item lists, element mounts, nav clicks
//! and visibility batches, and polls timers; the controller answers through
//! the capabilities of a [`scrollspy_backend::NavBackend`].
//!
//! # Modules
//! - [`registry`]: identifier → element map with reusable setters.
//! - [`timer`]: settle and cooldown timers on the host clock.
//! - [`controller`]: the `Unresolved` / `Idle` / `Suppressed` state machine.
//! - [`view`]: side list, tab strip, drawer and page-state view models.

pub mod controller;
pub mod registry;
pub mod timer;
pub mod view;

pub use controller::{JumpOrigin, NavController, NavIgnoredReason, NavOutcome, NavPhase, NavStats};
pub use registry::{ElementSetter, ItemRegistry};
pub use timer::{FiredTimer, TimerKind, TimerQueue};
pub use view::{LoadState, NavDrawer, NavEntry, PageView, nav_entries, tab_index, tab_target};
