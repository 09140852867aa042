//! State-machine tests for the navigation controller.
//!
//! Covers initial resolution (default selection, deep link, unknown
//! fragment), jumps and their cooldown, visibility batches, incremental
//! observer reconciliation, empty lists and teardown.
//!
//! Run:
//!   cargo test -p scrollspy-runtime --test controller_state_machine

mod common;

use common::*;
use pretty_assertions::assert_eq;
use scrollspy_core::{IntersectionEntry, NavConfig, ScrollBehavior, TieBreak};
use scrollspy_runtime::{NavIgnoredReason, NavOutcome, NavPhase};

// ── Initial resolution ──────────────────────────────────────────────────

#[test]
fn first_item_selected_without_fragment() {
    let mut ctl = controller(None);
    assert_eq!(ctl.phase(), NavPhase::Unresolved);
    assert_eq!(ctl.set_items(abc()), NavOutcome::Applied);
    mount_abc(&mut ctl);

    assert_eq!(ctl.active_id(), Some(&id("a")));
    assert_eq!(ctl.phase(), NavPhase::Idle);
    assert!(ctl.backend().scroller.calls.is_empty());
    assert!(ctl.backend().location.writes.is_empty());
}

#[test]
fn deep_link_jumps_once_after_settle_delay() {
    let mut ctl = controller(Some("beta"));
    assert_eq!(ctl.set_items(abc()), NavOutcome::Scheduled);
    assert_eq!(ctl.phase(), NavPhase::Suppressed);
    assert_eq!(ctl.active_id(), None);
    mount_abc(&mut ctl);

    advance_to(&mut ctl, ms(99));
    assert_eq!(ctl.poll_timers(), 0);
    assert!(ctl.backend().scroller.calls.is_empty());

    advance_to(&mut ctl, ms(100));
    assert_eq!(ctl.poll_timers(), 1);
    assert_eq!(ctl.backend().scroller.calls, vec![(2, ScrollBehavior::Smooth)]);
    assert_eq!(ctl.active_id(), Some(&id("b")));
    assert_eq!(ctl.backend().location.hash.as_deref(), Some("beta"));

    advance_to(&mut ctl, ms(5_000));
    ctl.poll_timers();
    assert_eq!(ctl.backend().scroller.calls.len(), 1);
    assert_eq!(ctl.phase(), NavPhase::Idle);
}

#[test]
fn fragment_with_hash_prefix_still_resolves() {
    let mut ctl = controller(Some("#gamma"));
    assert_eq!(ctl.set_items(abc()), NavOutcome::Scheduled);
}

#[test]
fn unknown_fragment_falls_back_to_first_item() {
    let mut ctl = controller(Some("nope"));
    assert_eq!(ctl.set_items(abc()), NavOutcome::Applied);
    assert_eq!(ctl.active_id(), Some(&id("a")));
    assert_eq!(ctl.phase(), NavPhase::Idle);
    assert!(ctl.backend().location.writes.is_empty());
}

#[test]
fn deep_link_target_unmounted_at_settle_selects_first() {
    let mut ctl = controller(Some("gamma"));
    ctl.set_items(abc());
    ctl.register_element("a").set(Some(1));

    advance_to(&mut ctl, ms(100));
    ctl.poll_timers();

    assert_eq!(ctl.active_id(), Some(&id("a")));
    assert!(ctl.backend().scroller.calls.is_empty());
    assert_eq!(ctl.phase(), NavPhase::Idle);
}

#[test]
fn late_settle_poll_still_suppresses_the_deep_link_scroll() {
    let mut ctl = controller(Some("gamma"));
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    // The host wakes up long after the settle deadline; the batch that
    // woke it must not override the jump it triggers.
    advance_to(&mut ctl, ms(1_200));
    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::entered("a")]),
        NavOutcome::Ignored(NavIgnoredReason::Suppressed)
    );
    assert_eq!(ctl.backend().scroller.calls, vec![(3, ScrollBehavior::Smooth)]);
    assert_eq!(ctl.active_id(), Some(&id("c")));
    assert_eq!(ctl.backend().location.hash.as_deref(), Some("gamma"));
    assert_eq!(ctl.next_deadline(), Some(ms(2_200)));

    advance_to(&mut ctl, ms(2_199));
    assert!(ctl.is_suppressed());
    advance_to(&mut ctl, ms(2_200));
    ctl.poll_timers();
    assert_eq!(ctl.phase(), NavPhase::Idle);
}

#[test]
fn user_jump_supersedes_pending_deep_link() {
    let mut ctl = controller(Some("gamma"));
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    advance_to(&mut ctl, ms(50));
    assert_eq!(ctl.jump_to(&id("a")), NavOutcome::Applied);

    advance_to(&mut ctl, ms(150));
    ctl.poll_timers();
    assert_eq!(ctl.backend().scroller.calls, vec![(1, ScrollBehavior::Smooth)]);
    assert_eq!(ctl.active_id(), Some(&id("a")));
}

#[test]
fn later_lists_keep_active_item_when_present() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.jump_to(&id("c"));

    let mut reordered = abc();
    reordered.reverse();
    ctl.set_items(reordered);
    assert_eq!(ctl.active_id(), Some(&id("c")));

    ctl.set_items(abc().into_iter().take(2).collect());
    assert_eq!(ctl.active_id(), Some(&id("a")));
}

// ── Jumps ───────────────────────────────────────────────────────────────

#[test]
fn jump_selects_scrolls_rewrites_and_suppresses() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    assert_eq!(ctl.jump_to(&id("b")), NavOutcome::Applied);
    assert_eq!(ctl.active_id(), Some(&id("b")));
    assert_eq!(ctl.backend().scroller.calls, vec![(2, ScrollBehavior::Smooth)]);
    assert_eq!(ctl.backend().location.writes, vec!["beta".to_owned()]);
    assert_eq!(ctl.phase(), NavPhase::Suppressed);
    assert_eq!(ctl.next_deadline(), Some(ms(1_000)));
}

#[test]
fn jump_to_active_item_still_scrolls_and_rearms() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    assert_eq!(ctl.active_id(), Some(&id("a")));

    advance_to(&mut ctl, ms(2_000));
    assert_eq!(ctl.jump_to(&id("a")), NavOutcome::Applied);
    assert_eq!(ctl.active_id(), Some(&id("a")));
    assert_eq!(ctl.backend().scroller.calls.len(), 1);
    assert!(ctl.is_suppressed());
    assert_eq!(ctl.next_deadline(), Some(ms(3_000)));
}

#[test]
fn configured_scroll_behavior_reaches_the_scroller() {
    let config = NavConfig {
        scroll_behavior: ScrollBehavior::Instant,
        ..NavConfig::default()
    };
    let mut ctl = controller_with(Some("beta"), config);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    advance_to(&mut ctl, ms(100));
    ctl.poll_timers();
    advance_to(&mut ctl, ms(1_500));
    ctl.jump_to(&id("c"));
    assert_eq!(
        ctl.backend().scroller.calls,
        vec![(2, ScrollBehavior::Instant), (3, ScrollBehavior::Instant)]
    );
}

#[test]
fn rejump_restarts_cooldown_instead_of_stacking() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    ctl.jump_to(&id("b"));
    advance_to(&mut ctl, ms(600));
    ctl.jump_to(&id("c"));

    advance_to(&mut ctl, ms(1_200));
    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::entered("a")]),
        NavOutcome::Ignored(NavIgnoredReason::Suppressed)
    );
    assert_eq!(ctl.active_id(), Some(&id("c")));

    advance_to(&mut ctl, ms(1_601));
    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::entered("a")]),
        NavOutcome::Applied
    );
    assert_eq!(ctl.active_id(), Some(&id("a")));
}

#[test]
fn unmounted_target_is_a_noop() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    let setters = mount_abc(&mut ctl);
    setters[1].set(None);

    assert_eq!(
        ctl.jump_to(&id("b")),
        NavOutcome::Ignored(NavIgnoredReason::NotMounted)
    );
    assert!(ctl.backend().scroller.calls.is_empty());
    assert_eq!(ctl.phase(), NavPhase::Idle);
    assert_eq!(ctl.active_id(), Some(&id("a")));
    assert_eq!(ctl.stats().jumps_ignored, 1);
}

#[test]
fn mounted_but_unlisted_target_is_ignored() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    ctl.register_element("stale").set(Some(9));
    assert_eq!(
        ctl.jump_to(&id("stale")),
        NavOutcome::Ignored(NavIgnoredReason::UnknownItem)
    );
}

#[test]
fn host_failures_are_swallowed() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.backend_mut().location.fail = true;

    assert_eq!(ctl.jump_to(&id("c")), NavOutcome::Applied);
    assert_eq!(ctl.active_id(), Some(&id("c")));
    assert_eq!(ctl.stats().host_errors, 1);
    assert_eq!(ctl.stats().fragment_writes, 0);
}

// ── Visibility batches ──────────────────────────────────────────────────

#[test]
fn reports_within_cooldown_are_discarded() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.jump_to(&id("c"));

    for at in [1, 10, 500, 999] {
        advance_to(&mut ctl, ms(at));
        let outcome = ctl.on_intersections(&[
            IntersectionEntry::entered("a"),
            IntersectionEntry::entered("b"),
        ]);
        assert_eq!(outcome, NavOutcome::Ignored(NavIgnoredReason::Suppressed));
    }
    assert_eq!(ctl.active_id(), Some(&id("c")));
    assert_eq!(ctl.stats().reports_discarded, 8);
    assert_eq!(ctl.backend().location.writes, vec!["gamma".to_owned()]);
}

#[test]
fn reports_after_cooldown_update_active_and_fragment() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.jump_to(&id("c"));

    advance_to(&mut ctl, ms(1_001));
    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::entered("b")]),
        NavOutcome::Applied
    );
    assert_eq!(ctl.active_id(), Some(&id("b")));
    assert_eq!(ctl.backend().location.hash.as_deref(), Some("beta"));
    assert_eq!(ctl.phase(), NavPhase::Idle);
}

#[test]
fn suppression_decays_on_the_clock_without_events() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.jump_to(&id("b"));

    advance_to(&mut ctl, ms(1_000));
    assert!(!ctl.is_suppressed());
    assert_eq!(ctl.phase(), NavPhase::Suppressed);
    assert_eq!(ctl.poll_timers(), 1);
    assert_eq!(ctl.phase(), NavPhase::Idle);
    assert_eq!(ctl.active_id(), Some(&id("b")));
}

#[test]
fn last_intersecting_entry_of_a_batch_wins() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    let outcome = ctl.on_intersections(&[
        IntersectionEntry::entered("a"),
        IntersectionEntry::left("b"),
        IntersectionEntry::entered("c"),
    ]);
    assert_eq!(outcome, NavOutcome::Applied);
    assert_eq!(ctl.active_id(), Some(&id("c")));
    assert_eq!(
        ctl.backend().location.writes,
        vec!["alpha".to_owned(), "gamma".to_owned()]
    );
}

#[test]
fn document_order_tie_break_picks_earliest_item() {
    let config = NavConfig::default().with_tie_break(TieBreak::DocumentOrder);
    let mut ctl = controller_with(None, config);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    ctl.on_intersections(&[
        IntersectionEntry::entered("c"),
        IntersectionEntry::entered("b"),
    ]);
    assert_eq!(ctl.active_id(), Some(&id("b")));
    assert_eq!(ctl.backend().location.writes, vec!["beta".to_owned()]);
}

#[test]
fn unlisted_reports_are_candidates_under_both_policies() {
    for tie_break in [TieBreak::LastDelivered, TieBreak::DocumentOrder] {
        let mut ctl = controller_with(None, NavConfig::default().with_tie_break(tie_break));
        ctl.set_items(abc());
        mount_abc(&mut ctl);
        ctl.register_element("stale").set(Some(9));

        assert_eq!(
            ctl.on_intersections(&[IntersectionEntry::entered("stale")]),
            NavOutcome::Applied,
            "{tie_break:?}"
        );
        assert_eq!(ctl.active_id(), Some(&id("stale")), "{tie_break:?}");
        assert!(ctl.backend().location.writes.is_empty(), "{tie_break:?}");
    }

    // Listed items rank ahead of unlisted ones in document order.
    let config = NavConfig::default().with_tie_break(TieBreak::DocumentOrder);
    let mut ctl = controller_with(None, config);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.register_element("stale").set(Some(9));
    ctl.on_intersections(&[
        IntersectionEntry::entered("stale"),
        IntersectionEntry::entered("c"),
    ]);
    assert_eq!(ctl.active_id(), Some(&id("c")));
}

#[test]
fn batches_without_mounted_intersections_change_nothing() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);

    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::left("b"), IntersectionEntry::entered("zz")]),
        NavOutcome::Ignored(NavIgnoredReason::NoIntersection)
    );
    assert_eq!(ctl.on_intersections(&[]), NavOutcome::Ignored(NavIgnoredReason::NoIntersection));
    assert_eq!(ctl.active_id(), Some(&id("a")));
}

// ── Observer reconciliation ─────────────────────────────────────────────

#[test]
fn observer_follows_registry_incrementally() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    let a = ctl.register_element("a");
    let b = ctl.register_element("b");
    a.set(Some(1));
    b.set(Some(2));
    ctl.flush_registrations();
    assert!(ctl.is_observing());

    let mut initial = ctl.backend().observer.calls.clone();
    initial[1..].sort_by_key(|call| format!("{call:?}"));
    assert_eq!(
        initial,
        vec![
            ObserverCall::Connect("-100px 0px -60% 0px".to_owned()),
            ObserverCall::Observe("a".to_owned(), 1),
            ObserverCall::Observe("b".to_owned(), 2),
        ]
    );

    ctl.backend_mut().observer.calls.clear();
    ctl.register_element("c").set(Some(3));
    ctl.flush_registrations();
    assert_eq!(
        ctl.backend().observer.calls,
        vec![ObserverCall::Observe("c".to_owned(), 3)]
    );

    ctl.backend_mut().observer.calls.clear();
    a.set(None);
    b.set(Some(5));
    ctl.flush_registrations();
    let mut calls = ctl.backend().observer.calls.clone();
    calls.sort_by_key(|call| format!("{call:?}"));
    assert_eq!(
        calls,
        vec![
            ObserverCall::Observe("b".to_owned(), 5),
            ObserverCall::Unobserve("a".to_owned(), 1),
            ObserverCall::Unobserve("b".to_owned(), 2),
        ]
    );
}

#[test]
fn remount_with_same_element_is_not_reobserved() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.backend_mut().observer.calls.clear();

    let a = ctl.register_element("a");
    a.set(None);
    a.set(Some(1));
    ctl.flush_registrations();
    assert!(ctl.backend().observer.calls.is_empty());
}

#[test]
fn unmounting_active_item_keeps_selection_and_fragment() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    let setters = mount_abc(&mut ctl);
    ctl.jump_to(&id("c"));

    setters[2].set(None);
    ctl.flush_registrations();
    assert_eq!(ctl.active_id(), Some(&id("c")));
    assert_eq!(ctl.backend().location.hash.as_deref(), Some("gamma"));
    assert_eq!(ctl.backend().location.writes, vec!["gamma".to_owned()]);

    // Idle as well: the next report, not the unmount, moves the selection.
    advance_to(&mut ctl, ms(1_000));
    ctl.poll_timers();
    setters[2].set(Some(3));
    ctl.flush_registrations();
    setters[2].set(None);
    ctl.flush_registrations();
    assert_eq!(ctl.active_id(), Some(&id("c")));
    ctl.on_intersections(&[IntersectionEntry::entered("b")]);
    assert_eq!(ctl.active_id(), Some(&id("b")));
    assert_eq!(ctl.backend().location.hash.as_deref(), Some("beta"));
}

// ── Empty lists and teardown ────────────────────────────────────────────

#[test]
fn empty_list_leaves_everything_unset() {
    let mut ctl = controller(Some("alpha"));
    assert_eq!(ctl.set_items(Vec::new()), NavOutcome::Applied);
    ctl.register_element("a").set(Some(1));
    ctl.flush_registrations();

    assert_eq!(ctl.active_id(), None);
    assert!(!ctl.is_observing());
    assert!(ctl.backend().observer.calls.is_empty());
    assert_eq!(
        ctl.jump_to(&id("a")),
        NavOutcome::Ignored(NavIgnoredReason::UnknownItem)
    );
    assert_eq!(
        ctl.on_intersections(&[IntersectionEntry::entered("a")]),
        NavOutcome::Ignored(NavIgnoredReason::NoItems)
    );
    assert_eq!(ctl.phase(), NavPhase::Unresolved);
}

#[test]
fn list_becoming_empty_resets_and_detaches() {
    let mut ctl = controller(None);
    ctl.set_items(abc());
    mount_abc(&mut ctl);
    ctl.jump_to(&id("b"));
    let writes = ctl.backend().location.writes.len();

    ctl.set_items(Vec::new());
    assert_eq!(ctl.active_id(), None);
    assert!(!ctl.is_observing());
    assert_eq!(ctl.next_deadline(), None);
    assert_eq!(ctl.phase(), NavPhase::Unresolved);
    assert_eq!(ctl.backend().location.writes.len(), writes);
    assert_eq!(ctl.backend().observer.calls.last(), Some(&ObserverCall::Disconnect));

    // The next non-empty list resolves from the fragment again.
    assert_eq!(ctl.set_items(abc()), NavOutcome::Scheduled);
}

#[test]
fn teardown_cancels_timers_and_disables_setters() {
    let mut ctl = controller(Some("gamma"));
    ctl.set_items(abc());
    let setters = mount_abc(&mut ctl);
    assert!(ctl.next_deadline().is_some());

    ctl.teardown();
    assert_eq!(ctl.phase(), NavPhase::TornDown);
    assert_eq!(ctl.next_deadline(), None);
    assert!(!ctl.backend().observer.connected);
    assert!(setters.iter().all(|setter| !setter.is_live()));

    advance_to(&mut ctl, ms(10_000));
    assert_eq!(ctl.poll_timers(), 0);
    assert!(ctl.backend().scroller.calls.is_empty());
    assert_eq!(
        ctl.jump_to(&id("a")),
        NavOutcome::Ignored(NavIgnoredReason::TornDown)
    );
    assert_eq!(
        ctl.set_items(abc()),
        NavOutcome::Ignored(NavIgnoredReason::TornDown)
    );
    setters[0].set(Some(7));
    assert!(ctl.registry().is_empty());

    // Idempotent.
    ctl.teardown();
    assert_eq!(ctl.backend().observer.calls.iter().filter(|c| **c == ObserverCall::Disconnect).count(), 1);
}

#[test]
fn dropping_controller_leaves_setters_inert() {
    let ctl = controller(None);
    let setter = ctl.register_element("a");
    drop(ctl);
    setter.set(Some(1));
    assert!(!setter.is_live());
}
