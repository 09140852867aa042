//! Viewport-synchronized navigation controller.
//!
//! [`NavController`] owns the "active item" and keeps three signals
//! consistent: what the visibility observer reports while the user
//! free-scrolls, programmatic jumps issued from nav clicks, and the deep link
//! present in the location fragment at load.
//!
//! # States
//!
//! | phase        | meaning                                               |
//! |--------------|-------------------------------------------------------|
//! | `Unresolved` | no items loaded yet (or the list became empty)        |
//! | `Idle`       | observer reports drive the active item                |
//! | `Suppressed` | a jump is pending or its cooldown has not elapsed     |
//! | `TornDown`   | controller unmounted; every operation is a no-op      |
//!
//! A jump arms a cooldown timer. Visibility batches that arrive before it
//! fires are discarded, so the jump's own smooth scroll is never read as the
//! user scrolling past other items. Re-jumping moves the deadline.
//!
//! # Time
//!
//! The controller never reads wall-clock time. Every entry point first fires
//! the timers that are due according to the host clock; hosts should also
//! call [`NavController::poll_timers`] at [`NavController::next_deadline`]
//! so suppression decays without further events. The settle timer resolves
//! the deep link whenever it is polled after its deadline; the cooldown of
//! every jump starts when the scroll is issued, so a late poll never
//! shortens the window that absorbs the jump's own scroll.

use core::time::Duration;

use ahash::AHashMap;
use scrollspy_backend::{
    HostClock, LocationBar, NavBackend, ObserverOptions, Scroller, VisibilityObserver,
};
use scrollspy_core::item::position_of;
use scrollspy_core::{
    IntersectionEntry, ItemId, NavConfig, NavItem, TieBreak, resolve_fragment, strip_hash,
};

use crate::registry::{ElementSetter, ItemRegistry};
use crate::timer::{TimerKind, TimerQueue};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPhase {
    Unresolved,
    Idle,
    Suppressed,
    TornDown,
}

impl NavPhase {
    /// Stable name used in logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Idle => "idle",
            Self::Suppressed => "suppressed",
            Self::TornDown => "torn_down",
        }
    }
}

/// Why an operation had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIgnoredReason {
    /// The controller was torn down.
    TornDown,
    /// No items are loaded.
    NoItems,
    /// The target has no mounted element.
    NotMounted,
    /// The target is not in the loaded item list.
    UnknownItem,
    /// A jump is in flight; visibility reports are discarded.
    Suppressed,
    /// The batch held no intersecting entry for a mounted item.
    NoIntersection,
}

/// Result of one controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// State changed immediately.
    Applied,
    /// A deferred action was scheduled (deep-link settle).
    Scheduled,
    /// Nothing changed.
    Ignored(NavIgnoredReason),
}

impl NavOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub const fn is_ignored(self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

/// Who asked for a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOrigin {
    User,
    DeepLink,
}

impl JumpOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::DeepLink => "deep_link",
        }
    }
}

/// Counters for host instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavStats {
    pub jumps_issued: u64,
    pub jumps_ignored: u64,
    pub reports_applied: u64,
    pub reports_discarded: u64,
    pub fragment_writes: u64,
    pub host_errors: u64,
}

/// The navigation state machine, generic over the host and the item model.
pub struct NavController<B: NavBackend, I: NavItem> {
    backend: B,
    config: NavConfig,
    items: Vec<I>,
    registry: ItemRegistry<B::Element>,
    observed: AHashMap<ItemId, B::Element>,
    observer_connected: bool,
    timers: TimerQueue,
    phase: NavPhase,
    active: Option<ItemId>,
    pending_deep_link: Option<ItemId>,
    stats: NavStats,
}

impl<B: NavBackend, I: NavItem> NavController<B, I> {
    /// Create a controller in the `Unresolved` phase.
    pub fn new(backend: B, config: NavConfig) -> Self {
        Self {
            backend,
            config,
            items: Vec::new(),
            registry: ItemRegistry::new(),
            observed: AHashMap::new(),
            observer_connected: false,
            timers: TimerQueue::new(),
            phase: NavPhase::Unresolved,
            active: None,
            pending_deep_link: None,
            stats: NavStats::default(),
        }
    }

    /// Currently active item id.
    #[must_use]
    pub fn active_id(&self) -> Option<&ItemId> {
        self.active.as_ref()
    }

    /// Currently active item.
    #[must_use]
    pub fn active_item(&self) -> Option<&I> {
        let active = self.active.as_ref()?;
        self.items.iter().find(|item| item.id() == active)
    }

    /// Current phase as of the last processed event.
    #[must_use]
    pub const fn phase(&self) -> NavPhase {
        self.phase
    }

    /// Whether visibility reports would be discarded right now.
    ///
    /// Evaluated against the host clock, so an expired cooldown reads as
    /// not suppressed even before the host polls timers.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        if self.phase == NavPhase::TornDown {
            return false;
        }
        let now = self.now();
        self.timers.is_armed(TimerKind::Settle)
            || self
                .timers
                .deadline(TimerKind::Cooldown)
                .is_some_and(|deadline| deadline > now)
    }

    /// Whether the host observer is connected.
    #[must_use]
    pub const fn is_observing(&self) -> bool {
        self.observer_connected
    }

    /// Loaded items, in caller order.
    #[must_use]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    #[must_use]
    pub const fn config(&self) -> &NavConfig {
        &self.config
    }

    #[must_use]
    pub const fn stats(&self) -> NavStats {
        self.stats
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Registry of mounted elements.
    #[must_use]
    pub const fn registry(&self) -> &ItemRegistry<B::Element> {
        &self.registry
    }

    /// Earliest armed timer deadline, for the host to schedule a wake-up.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Element setter for `id`, to attach to the item's root view.
    pub fn register_element(&self, id: impl Into<ItemId>) -> ElementSetter<B::Element> {
        self.registry.setter(id)
    }

    /// Supply (or replace) the item list.
    ///
    /// The first non-empty list resolves the initial target: a fragment that
    /// names a loaded item schedules a jump after the settle delay, anything
    /// else selects the first item without scrolling. Later lists keep the
    /// active item when it is still present. An empty list clears the active
    /// item, cancels timers and detaches the observer.
    pub fn set_items(&mut self, items: Vec<I>) -> NavOutcome {
        if self.phase == NavPhase::TornDown {
            return NavOutcome::Ignored(NavIgnoredReason::TornDown);
        }
        self.sync();

        if items.is_empty() {
            self.items.clear();
            self.active = None;
            self.pending_deep_link = None;
            self.timers.cancel_all();
            self.disconnect_observer();
            self.set_phase(NavPhase::Unresolved);
            return NavOutcome::Applied;
        }

        let first_load = self.phase == NavPhase::Unresolved;
        self.items = items;
        tracing::debug!(items = self.items.len(), first_load, "item list updated");

        let outcome = if first_load {
            self.resolve_initial()
        } else {
            self.retain_active();
            NavOutcome::Applied
        };
        self.flush_registrations();
        outcome
    }

    /// Jump to `id`: select it, scroll it into view, rewrite the fragment
    /// and suppress visibility reports for the cooldown.
    ///
    /// Unmounted or unknown targets are ignored. A successful jump supersedes
    /// a deep link that has not resolved yet.
    pub fn jump_to(&mut self, id: &ItemId) -> NavOutcome {
        if self.phase == NavPhase::TornDown {
            return NavOutcome::Ignored(NavIgnoredReason::TornDown);
        }
        self.sync();
        let outcome = self.perform_jump(id, JumpOrigin::User);
        if outcome.is_applied() && self.pending_deep_link.take().is_some() {
            self.timers.cancel(TimerKind::Settle);
            tracing::debug!(target_id = %id, "pending deep link superseded by user jump");
        }
        outcome
    }

    /// Process one visibility batch from the host observer.
    ///
    /// Discarded while suppressed. Otherwise intersecting entries for mounted
    /// items are applied according to [`TieBreak`]; with the default policy
    /// every entry is applied in delivery order and the last one wins.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> NavOutcome {
        if self.phase == NavPhase::TornDown {
            return NavOutcome::Ignored(NavIgnoredReason::TornDown);
        }
        self.sync();
        if self.items.is_empty() {
            return NavOutcome::Ignored(NavIgnoredReason::NoItems);
        }
        if self.phase == NavPhase::Suppressed {
            let discarded = entries.iter().filter(|e| e.is_intersecting).count() as u64;
            self.stats.reports_discarded += discarded;
            tracing::trace!(entries = entries.len(), discarded, "visibility batch discarded");
            return NavOutcome::Ignored(NavIgnoredReason::Suppressed);
        }

        let candidates: Vec<&ItemId> = entries
            .iter()
            .filter(|entry| entry.is_intersecting && self.registry.contains(&entry.id))
            .map(|entry| &entry.id)
            .collect();

        let applied = match self.config.tie_break {
            TieBreak::LastDelivered => {
                for id in &candidates {
                    self.apply_report(id);
                }
                candidates.len()
            }
            TieBreak::DocumentOrder => {
                // Mounted but unlisted ids rank after every listed item.
                let topmost = candidates
                    .iter()
                    .enumerate()
                    .min_by_key(|(delivered, id)| {
                        (position_of(&self.items, id).unwrap_or(usize::MAX), *delivered)
                    })
                    .map(|(_, id)| *id);
                match topmost {
                    Some(id) => {
                        self.apply_report(id);
                        1
                    }
                    None => 0,
                }
            }
        };

        if applied == 0 {
            NavOutcome::Ignored(NavIgnoredReason::NoIntersection)
        } else {
            NavOutcome::Applied
        }
    }

    /// Fire due timers. Returns how many fired.
    pub fn poll_timers(&mut self) -> usize {
        if self.phase == NavPhase::TornDown {
            return 0;
        }
        self.flush_registrations();
        self.fire_due_timers()
    }

    /// Reconcile the host observer with registry changes since the last call.
    ///
    /// Called by every entry point; hosts may also call it after committing
    /// a render so new elements are watched without waiting for an event.
    pub fn flush_registrations(&mut self) {
        if self.phase == NavPhase::TornDown {
            return;
        }
        // An unmounted active item stays selected, matching the fragment
        // already in the location bar, until a report or jump replaces it.
        let dirty = self.registry.take_dirty();

        if self.observer_connected {
            for id in dirty {
                self.reconcile_observed(id);
            }
        } else if !self.items.is_empty() && !self.registry.is_empty() {
            self.connect_observer();
        }
    }

    /// Stop observing, cancel all timers and disable every setter.
    ///
    /// Idempotent; also runs on drop.
    pub fn teardown(&mut self) {
        if self.phase == NavPhase::TornDown {
            return;
        }
        self.timers.cancel_all();
        self.pending_deep_link = None;
        self.disconnect_observer();
        self.registry.close();
        self.items.clear();
        self.active = None;
        self.set_phase(NavPhase::TornDown);
    }

    fn now(&self) -> Duration {
        self.backend.clock().now_mono()
    }

    fn sync(&mut self) {
        self.flush_registrations();
        self.fire_due_timers();
    }

    fn resolve_initial(&mut self) -> NavOutcome {
        let fragment = self.backend.location().fragment();
        let target = fragment
            .as_deref()
            .and_then(strip_hash)
            .and_then(|fragment| resolve_fragment(&self.items, fragment))
            .map(|item| item.id().clone());

        match target {
            Some(id) => {
                let deadline = self.now().saturating_add(self.config.settle_delay());
                tracing::debug!(target_id = %id, ?deadline, "deep link resolved, jump scheduled");
                self.timers.schedule(TimerKind::Settle, deadline);
                self.pending_deep_link = Some(id);
                self.set_phase(NavPhase::Suppressed);
                NavOutcome::Scheduled
            }
            None => {
                if let Some(fragment) = fragment.as_deref().and_then(strip_hash) {
                    tracing::debug!(fragment, "fragment matches no item, selecting first");
                }
                self.active = self.items.first().map(|item| item.id().clone());
                self.set_phase(NavPhase::Idle);
                NavOutcome::Applied
            }
        }
    }

    fn retain_active(&mut self) {
        let still_loaded = self
            .active
            .as_ref()
            .is_some_and(|active| position_of(&self.items, active).is_some());
        if still_loaded || self.pending_deep_link.is_some() {
            return;
        }
        self.active = self.items.first().map(|item| item.id().clone());
    }

    fn perform_jump(&mut self, id: &ItemId, origin: JumpOrigin) -> NavOutcome {
        let span = tracing::debug_span!("nav.jump", target_id = %id, origin = origin.as_str());
        let _enter = span.enter();

        let Some(element) = self.registry.lookup(id) else {
            self.stats.jumps_ignored += 1;
            tracing::debug!(reason = "not_mounted", "jump ignored");
            return NavOutcome::Ignored(NavIgnoredReason::NotMounted);
        };
        let Some(fragment) = self
            .items
            .iter()
            .find(|item| item.id() == id)
            .map(|item| item.fragment())
        else {
            self.stats.jumps_ignored += 1;
            tracing::debug!(reason = "unknown_item", "jump ignored");
            return NavOutcome::Ignored(NavIgnoredReason::UnknownItem);
        };

        self.active = Some(id.clone());
        let behavior = self.config.scroll_behavior;
        if let Err(err) = self.backend.scroller().scroll_into_view(&element, behavior) {
            self.host_error("scroll_into_view", &err);
        }
        self.write_fragment(&fragment);

        let deadline = self.now().saturating_add(self.config.cooldown());
        self.timers.schedule(TimerKind::Cooldown, deadline);
        self.stats.jumps_issued += 1;
        self.set_phase(NavPhase::Suppressed);
        NavOutcome::Applied
    }

    fn apply_report(&mut self, id: &ItemId) {
        self.active = Some(id.clone());
        self.stats.reports_applied += 1;
        let fragment = self
            .items
            .iter()
            .find(|item| item.id() == id)
            .map(|item| item.fragment());
        if let Some(fragment) = fragment {
            self.write_fragment(&fragment);
        }
    }

    fn resolve_deep_link(&mut self) {
        let Some(target) = self.pending_deep_link.take() else {
            return;
        };
        if self.perform_jump(&target, JumpOrigin::DeepLink).is_ignored() {
            self.active = self.items.first().map(|item| item.id().clone());
            tracing::debug!(target_id = %target, "deep link target unavailable, selecting first");
        }
    }

    fn fire_due_timers(&mut self) -> usize {
        let now = self.now();
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now) {
            fired += 1;
            tracing::debug!(timer = timer.kind.as_str(), deadline = ?timer.deadline, "timer fired");
            match timer.kind {
                TimerKind::Settle => self.resolve_deep_link(),
                TimerKind::Cooldown => {}
            }
        }
        if fired > 0 {
            self.refresh_phase();
        }
        fired
    }

    fn refresh_phase(&mut self) {
        let next = if self.items.is_empty() {
            NavPhase::Unresolved
        } else if self.timers.is_armed(TimerKind::Settle) || self.timers.is_armed(TimerKind::Cooldown)
        {
            NavPhase::Suppressed
        } else {
            NavPhase::Idle
        };
        self.set_phase(next);
    }

    fn set_phase(&mut self, next: NavPhase) {
        if self.phase != next {
            tracing::debug!(from = self.phase.as_str(), to = next.as_str(), "nav phase transition");
            self.phase = next;
        }
    }

    fn write_fragment(&mut self, fragment: &str) {
        match self.backend.location().replace_fragment(fragment) {
            Ok(()) => self.stats.fragment_writes += 1,
            Err(err) => self.host_error("replace_fragment", &err),
        }
    }

    fn connect_observer(&mut self) {
        let options = ObserverOptions::from(&self.config.band);
        if let Err(err) = self.backend.observer().connect(&options) {
            self.host_error("observer_connect", &err);
            return;
        }
        self.observer_connected = true;
        tracing::debug!(root_margin = %options.root_margin, "observer connected");
        for (id, element) in self.registry.snapshot() {
            self.observe(id, element);
        }
    }

    fn disconnect_observer(&mut self) {
        if !self.observer_connected {
            return;
        }
        if let Err(err) = self.backend.observer().disconnect() {
            self.host_error("observer_disconnect", &err);
        }
        self.observer_connected = false;
        self.observed.clear();
        tracing::debug!("observer disconnected");
    }

    fn reconcile_observed(&mut self, id: ItemId) {
        let current = self.registry.lookup(&id);
        let previous = self.observed.get(&id).cloned();
        match (current, previous) {
            (Some(current), Some(previous)) if current == previous => {}
            (current, previous) => {
                if let Some(previous) = previous {
                    self.unobserve(&id, &previous);
                }
                if let Some(current) = current {
                    self.observe(id, current);
                }
            }
        }
    }

    fn observe(&mut self, id: ItemId, element: B::Element) {
        match self.backend.observer().observe(&id, &element) {
            Ok(()) => {
                self.observed.insert(id, element);
            }
            Err(err) => self.host_error("observe", &err),
        }
    }

    fn unobserve(&mut self, id: &ItemId, element: &B::Element) {
        if let Err(err) = self.backend.observer().unobserve(id, element) {
            self.host_error("unobserve", &err);
        }
        self.observed.remove(id);
    }

    fn host_error(&mut self, op: &'static str, err: &B::Error) {
        self.stats.host_errors += 1;
        tracing::warn!(op, error = %err, "host capability failed");
    }
}

impl<B: NavBackend, I: NavItem> Drop for NavController<B, I> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<B: NavBackend, I: NavItem> core::fmt::Debug for NavController<B, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavController")
            .field("phase", &self.phase)
            .field("active", &self.active)
            .field("items", &self.items.len())
            .field("registry", &self.registry)
            .field("observer_connected", &self.observer_connected)
            .field("timers", &self.timers)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
