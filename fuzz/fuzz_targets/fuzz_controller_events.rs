#![no_main]

use core::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scrollspy_core::{IntersectionEntry, Item, ItemId, NavConfig, TieBreak};
use scrollspy_runtime::{NavController, NavIgnoredReason, NavOutcome, NavPhase};
use scrollspy_web::{ElementRef, WebBackend};

const IDS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Arbitrary)]
enum Op {
    Load(u8),
    Mount(u8),
    Unmount(u8),
    Jump(u8),
    Report(Vec<(u8, bool)>),
    Advance(u16),
    Teardown,
}

#[derive(Debug, Arbitrary)]
struct Input {
    fragment: Option<u8>,
    document_order: bool,
    ops: Vec<Op>,
}

fn id(index: u8) -> &'static str {
    IDS[usize::from(index) % IDS.len()]
}

fuzz_target!(|input: Input| {
    let mut config = NavConfig::default();
    if input.document_order {
        config = config.with_tie_break(TieBreak::DocumentOrder);
    }
    let fragment = input.fragment.map(|index| format!("#{}", id(index)));
    let mut ctl: NavController<WebBackend, Item> =
        NavController::new(WebBackend::new(fragment.as_deref()), config);
    let setters: Vec<_> = IDS.iter().map(|&i| ctl.register_element(i)).collect();
    let mut now = Duration::ZERO;

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Load(mask) => {
                let items = IDS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, &i)| Item::new(i, i))
                    .collect();
                ctl.set_items(items);
            }
            Op::Mount(index) => {
                let slot = usize::from(index) % IDS.len();
                setters[slot].set(Some(ElementRef::new(format!("item-{}", IDS[slot]))));
            }
            Op::Unmount(index) => setters[usize::from(index) % IDS.len()].set(None),
            Op::Jump(index) => {
                ctl.jump_to(&ItemId::from(id(index)));
            }
            Op::Report(batch) => {
                let entries: Vec<IntersectionEntry> = batch
                    .into_iter()
                    .take(16)
                    .map(|(index, hit)| IntersectionEntry {
                        id: ItemId::from(id(index)),
                        is_intersecting: hit,
                    })
                    .collect();
                // Settle due timers first so the suppression read is exact.
                ctl.poll_timers();
                let suppressed = ctl.is_suppressed();
                let before = ctl.active_id().cloned();
                let outcome = ctl.on_intersections(&entries);
                if suppressed && !ctl.items().is_empty() {
                    assert_eq!(outcome, NavOutcome::Ignored(NavIgnoredReason::Suppressed));
                    assert_eq!(ctl.active_id().cloned(), before);
                }
            }
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(ms));
                ctl.backend_mut().clock_mut().set(now);
                ctl.poll_timers();
            }
            Op::Teardown => ctl.teardown(),
        }

        // Invariants that hold after every step.
        if ctl.phase() == NavPhase::TornDown {
            assert!(ctl.active_id().is_none());
            assert!(ctl.next_deadline().is_none());
        }
        if ctl.items().is_empty() {
            assert!(ctl.active_id().is_none());
        }
    }
});
