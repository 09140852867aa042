#![forbid(unsafe_code)]

//! Core: items, fragments, active-band geometry and configuration.
//!
//! # Role in scrollspy
//! `scrollspy-core` is the vocabulary layer. It owns the item model the
//! navigation controller arbitrates over, the fragment codec that makes an
//! item bookmarkable, the geometry of the "active band" and the tunables of
//! the controller.
//!
//! # Primary responsibilities
//! - **NavItem / ItemId**: identity and labels of navigable items.
//! - **Fragment codec**: label → URL-safe slug and fragment → item lookup.
//! - **ActiveBand**: viewport margins that decide what counts as "viewed".
//! - **NavConfig**: cooldown, settle delay and tie-break policy.
//!
//! # How it fits in the system
//! `scrollspy-backend` defines the host capabilities in terms of these types,
//! `scrollspy-runtime` drives the state machine, and `scrollspy-web` binds
//! everything to a host-driven browser environment.

pub mod band;
pub mod catalog;
pub mod config;
pub mod element;
pub mod event;
pub mod fragment;
pub mod item;

pub use band::ActiveBand;
pub use config::{ConfigError, NavConfig, TieBreak};
pub use event::{IntersectionEntry, ScrollBehavior};
pub use fragment::{resolve_fragment, slugify, strip_hash};
pub use item::{Item, ItemId, NavItem};
