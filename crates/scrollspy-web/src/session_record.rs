#![forbid(unsafe_code)]

//! Deterministic session recording and replay.
//!
//! Provides [`SessionRecorder`] for recording every host input of a
//! navigation session (item loads, mounts, jumps, visibility batches, time
//! steps) and [`replay`] for re-running the inputs on a fresh controller to
//! verify that the state checksums match exactly.
//!
//! # Trace layout
//!
//! - **Header**: schema version and the fragment present at load.
//! - **Inputs**: `ItemsLoaded`, `Mount`, `Unmount`, `Jump`, `Intersections`,
//!   `AdvanceTime`, each stamped with the host time in milliseconds.
//! - **Checkpoint**: after every input, the active item, fragment and phase
//!   folded into an FNV-1a checksum, chained with the previous checkpoint.
//! - **Summary**: total checkpoints and the final checksum chain.
//!
//! With the `trace-json` feature a trace round-trips through JSON lines, one
//! record per line.
//!
//! # Determinism contract
//!
//! Given identical recorded inputs and the same [`NavConfig`], replay
//! **must** produce identical checksums. Time only advances through
//! `AdvanceTime` records and the controller never reads a wall clock.

use core::time::Duration;
use std::collections::BTreeMap;

#[cfg(feature = "trace-json")]
use serde::{Deserialize, Serialize};

use scrollspy_backend::LocationBar;
use scrollspy_core::{IntersectionEntry, Item, ItemId, NavConfig};
use scrollspy_runtime::{ElementSetter, NavController, NavOutcome};

use crate::{ElementRef, WebBackend};

/// Schema version for session traces.
pub const SCHEMA_VERSION: &str = "scrollspy-trace-v1";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a64_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a64_pair(prev: u64, next: u64) -> u64 {
    let hash = fnv1a64_bytes(FNV_OFFSET_BASIS, &prev.to_le_bytes());
    fnv1a64_bytes(hash, &next.to_le_bytes())
}

/// Item as stored in a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "trace-json", derive(Serialize, Deserialize))]
pub struct TraceItem {
    pub id: ItemId,
    pub label: String,
    #[cfg_attr(feature = "trace-json", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fragment: Option<String>,
}

impl From<&Item> for TraceItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            label: item.label.clone(),
            fragment: item.fragment.clone(),
        }
    }
}

impl From<&TraceItem> for Item {
    fn from(item: &TraceItem) -> Self {
        Self {
            id: item.id.clone(),
            label: item.label.clone(),
            fragment: item.fragment.clone(),
        }
    }
}

/// A single record in a session trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "trace-json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "trace-json", serde(tag = "event", rename_all = "snake_case"))]
pub enum TraceRecord {
    /// Session header (must be first).
    Header {
        schema: String,
        initial_fragment: Option<String>,
    },
    /// The item list was supplied or replaced.
    ItemsLoaded { ts_ms: u64, items: Vec<TraceItem> },
    /// An item root was rendered with `dom_id`.
    Mount {
        ts_ms: u64,
        id: ItemId,
        dom_id: String,
    },
    /// An item root was removed.
    Unmount { ts_ms: u64, id: ItemId },
    /// A nav surface requested a jump.
    Jump { ts_ms: u64, id: ItemId },
    /// The observer delivered a batch.
    Intersections {
        ts_ms: u64,
        entries: Vec<IntersectionEntry>,
    },
    /// Host time moved forward; due timers fire.
    AdvanceTime { ts_ms: u64 },
    /// State checkpoint after an input.
    Checkpoint {
        step: u64,
        ts_ms: u64,
        active: Option<ItemId>,
        checksum: u64,
        checksum_chain: u64,
    },
    /// Trace summary (must be last).
    Summary {
        total_steps: u64,
        final_checksum_chain: u64,
    },
}

impl TraceRecord {
    fn is_input(&self) -> bool {
        !matches!(
            self,
            Self::Header { .. } | Self::Checkpoint { .. } | Self::Summary { .. }
        )
    }
}

/// A complete recorded session trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTrace {
    pub records: Vec<TraceRecord>,
}

impl SessionTrace {
    /// Number of checkpoints in the trace.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Checkpoint { .. }))
            .count() as u64
    }

    /// Extract the final checksum chain from the summary record.
    #[must_use]
    pub fn final_checksum_chain(&self) -> Option<u64> {
        self.records.iter().rev().find_map(|r| match r {
            TraceRecord::Summary {
                final_checksum_chain,
                ..
            } => Some(*final_checksum_chain),
            _ => None,
        })
    }
}

/// Controller plus the element setters the page would hold.
struct SessionDriver {
    controller: NavController<WebBackend, Item>,
    setters: BTreeMap<ItemId, ElementSetter<ElementRef>>,
}

impl SessionDriver {
    fn new(config: NavConfig, initial_fragment: Option<&str>) -> Self {
        Self {
            controller: NavController::new(WebBackend::new(initial_fragment), config),
            setters: BTreeMap::new(),
        }
    }

    fn setter(&mut self, id: &ItemId) -> &ElementSetter<ElementRef> {
        let controller = &self.controller;
        self.setters
            .entry(id.clone())
            .or_insert_with(|| controller.register_element(id.clone()))
    }

    fn apply(&mut self, record: &TraceRecord) -> Option<NavOutcome> {
        match record {
            TraceRecord::ItemsLoaded { items, .. } => {
                Some(self.controller.set_items(items.iter().map(Item::from).collect()))
            }
            TraceRecord::Mount { id, dom_id, .. } => {
                self.setter(id).set(Some(ElementRef::new(dom_id.clone())));
                self.controller.flush_registrations();
                None
            }
            TraceRecord::Unmount { id, .. } => {
                self.setter(id).set(None);
                self.controller.flush_registrations();
                None
            }
            TraceRecord::Jump { id, .. } => Some(self.controller.jump_to(id)),
            TraceRecord::Intersections { entries, .. } => {
                Some(self.controller.on_intersections(entries))
            }
            TraceRecord::AdvanceTime { ts_ms } => {
                self.controller
                    .backend_mut()
                    .clock_mut()
                    .set(Duration::from_millis(*ts_ms));
                self.controller.poll_timers();
                None
            }
            TraceRecord::Header { .. }
            | TraceRecord::Checkpoint { .. }
            | TraceRecord::Summary { .. } => None,
        }
    }

    fn checksum(&self) -> u64 {
        let active = self.controller.active_id().map(ItemId::as_str);
        let phase = self.controller.phase().as_str();
        let fragment = self.controller.backend().location_ref().fragment();

        let mut hash = FNV_OFFSET_BASIS;
        hash = match active {
            Some(active) => fnv1a64_bytes(fnv1a64_bytes(hash, &[1]), active.as_bytes()),
            None => fnv1a64_bytes(hash, &[0]),
        };
        hash = fnv1a64_bytes(hash, &[0xff]);
        hash = match fragment.as_deref() {
            Some(fragment) => fnv1a64_bytes(fnv1a64_bytes(hash, &[1]), fragment.as_bytes()),
            None => fnv1a64_bytes(hash, &[0]),
        };
        hash = fnv1a64_bytes(hash, &[0xff]);
        fnv1a64_bytes(hash, phase.as_bytes())
    }
}

/// Records a navigation session for deterministic replay.
///
/// Owns a [`NavController`] on a [`WebBackend`] and intercepts every host
/// input, recording it as a [`TraceRecord`] followed by a checkpoint.
pub struct SessionRecorder {
    driver: SessionDriver,
    records: Vec<TraceRecord>,
    checksum_chain: u64,
    step: u64,
    now_ms: u64,
}

impl SessionRecorder {
    /// Start a session whose location carries `initial_fragment` at load.
    #[must_use]
    pub fn new(config: NavConfig, initial_fragment: Option<&str>) -> Self {
        let driver = SessionDriver::new(config, initial_fragment);
        let initial_fragment = driver.controller.backend().location_ref().fragment();
        Self {
            driver,
            records: vec![TraceRecord::Header {
                schema: SCHEMA_VERSION.to_owned(),
                initial_fragment,
            }],
            checksum_chain: 0,
            step: 0,
            now_ms: 0,
        }
    }

    /// Supply the item list.
    pub fn load_items(&mut self, items: &[Item]) -> NavOutcome {
        let record = TraceRecord::ItemsLoaded {
            ts_ms: self.now_ms,
            items: items.iter().map(TraceItem::from).collect(),
        };
        self.record(record).unwrap_or(NavOutcome::Applied)
    }

    /// Render the root of `id` with DOM id `dom_id`.
    pub fn mount(&mut self, id: impl Into<ItemId>, dom_id: &str) {
        let record = TraceRecord::Mount {
            ts_ms: self.now_ms,
            id: id.into(),
            dom_id: dom_id.to_owned(),
        };
        self.record(record);
    }

    /// Remove the root of `id`.
    pub fn unmount(&mut self, id: impl Into<ItemId>) {
        let record = TraceRecord::Unmount {
            ts_ms: self.now_ms,
            id: id.into(),
        };
        self.record(record);
    }

    /// Request a jump to `id`.
    pub fn jump(&mut self, id: impl Into<ItemId>) -> NavOutcome {
        let record = TraceRecord::Jump {
            ts_ms: self.now_ms,
            id: id.into(),
        };
        self.record(record).unwrap_or(NavOutcome::Applied)
    }

    /// Deliver an observer batch.
    pub fn intersections(&mut self, entries: Vec<IntersectionEntry>) -> NavOutcome {
        let record = TraceRecord::Intersections {
            ts_ms: self.now_ms,
            entries,
        };
        self.record(record).unwrap_or(NavOutcome::Applied)
    }

    /// Move host time to `ts_ms` (never backwards) and fire due timers.
    pub fn advance_to(&mut self, ts_ms: u64) {
        self.now_ms = self.now_ms.max(ts_ms);
        let record = TraceRecord::AdvanceTime {
            ts_ms: self.now_ms,
        };
        self.record(record);
    }

    /// Finish recording and return the completed trace.
    #[must_use]
    pub fn finish(mut self) -> SessionTrace {
        self.records.push(TraceRecord::Summary {
            total_steps: self.step,
            final_checksum_chain: self.checksum_chain,
        });
        SessionTrace {
            records: self.records,
        }
    }

    /// Access the recorded controller.
    #[must_use]
    pub fn controller(&self) -> &NavController<WebBackend, Item> {
        &self.driver.controller
    }

    /// Mutably access the recorded controller. Calls made through this
    /// handle are not recorded.
    pub fn controller_mut(&mut self) -> &mut NavController<WebBackend, Item> {
        &mut self.driver.controller
    }

    fn record(&mut self, record: TraceRecord) -> Option<NavOutcome> {
        let outcome = self.driver.apply(&record);
        self.records.push(record);

        let checksum = self.driver.checksum();
        let chain = fnv1a64_pair(self.checksum_chain, checksum);
        self.records.push(TraceRecord::Checkpoint {
            step: self.step,
            ts_ms: self.now_ms,
            active: self.driver.controller.active_id().cloned(),
            checksum,
            checksum_chain: chain,
        });
        self.checksum_chain = chain;
        self.step += 1;
        outcome
    }
}

/// Result of replaying a session trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Total checkpoints replayed.
    pub total_steps: u64,
    /// Final checksum chain from replay.
    pub final_checksum_chain: u64,
    /// First checkpoint where the state diverged, if any.
    pub first_mismatch: Option<ReplayMismatch>,
}

impl ReplayResult {
    /// Whether the replay reproduced every checkpoint.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Description of a divergence during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    /// Checkpoint index where the divergence occurred.
    pub step: u64,
    /// Expected checksum from the trace.
    pub expected: u64,
    /// Actual checksum from replay.
    pub actual: u64,
    /// Active item recorded in the trace.
    pub expected_active: Option<ItemId>,
    /// Active item after replay.
    pub actual_active: Option<ItemId>,
}

/// Errors that can occur during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The trace is missing a header record.
    MissingHeader,
    /// The header names a schema this build does not understand.
    UnsupportedSchema(String),
}

impl core::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "trace missing header record"),
            Self::UnsupportedSchema(schema) => write!(f, "unsupported trace schema: {schema}"),
        }
    }
}

impl std::error::Error for ReplayError {}

/// Replay a recorded session trace on a fresh controller built with
/// `config`.
///
/// Feeds every input record through a new controller and compares the
/// state checksum at each checkpoint against the recorded value.
pub fn replay(config: NavConfig, trace: &SessionTrace) -> Result<ReplayResult, ReplayError> {
    let initial_fragment = match trace.records.first() {
        Some(TraceRecord::Header {
            schema,
            initial_fragment,
        }) => {
            if schema != SCHEMA_VERSION {
                return Err(ReplayError::UnsupportedSchema(schema.clone()));
            }
            initial_fragment.clone()
        }
        _ => return Err(ReplayError::MissingHeader),
    };

    let mut driver = SessionDriver::new(config, initial_fragment.as_deref());
    let mut total_steps: u64 = 0;
    let mut checksum_chain: u64 = 0;
    let mut first_mismatch: Option<ReplayMismatch> = None;

    for record in &trace.records {
        if record.is_input() {
            driver.apply(record);
            continue;
        }
        let TraceRecord::Checkpoint {
            step,
            active,
            checksum: expected,
            ..
        } = record
        else {
            continue;
        };
        let actual = driver.checksum();
        checksum_chain = fnv1a64_pair(checksum_chain, actual);
        if actual != *expected && first_mismatch.is_none() {
            let actual_active = driver.controller.active_id().cloned();
            tracing::debug!(
                step,
                expected = ?active.as_ref().map(ItemId::as_str),
                actual = ?actual_active.as_ref().map(ItemId::as_str),
                "replay diverged"
            );
            first_mismatch = Some(ReplayMismatch {
                step: *step,
                expected: *expected,
                actual,
                expected_active: active.clone(),
                actual_active,
            });
        }
        total_steps += 1;
    }

    Ok(ReplayResult {
        total_steps,
        final_checksum_chain: checksum_chain,
        first_mismatch,
    })
}

/// Failure to parse one line of a JSON-lines trace.
#[cfg(feature = "trace-json")]
#[derive(Debug)]
pub struct TraceParseError {
    /// 1-based line number.
    pub line: usize,
    pub source: serde_json::Error,
}

#[cfg(feature = "trace-json")]
impl core::fmt::Display for TraceParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "trace line {}: {}", self.line, self.source)
    }
}

#[cfg(feature = "trace-json")]
impl std::error::Error for TraceParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(feature = "trace-json")]
impl SessionTrace {
    /// Serialize as JSON lines, one record per line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse JSON lines produced by [`Self::to_jsonl`]. Blank lines are
    /// skipped.
    pub fn from_jsonl(input: &str) -> Result<Self, TraceParseError> {
        let records = input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| TraceParseError {
                    line: index + 1,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }
}
