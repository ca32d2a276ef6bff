// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Lifetimes: keyed lifetime diffing for push streams.
//!
//! Many UI integrations observe "what exists right now" as a series of
//! snapshots: the children of a container, the open dialogs, the attachments
//! of a message. Consumers usually do not care about snapshots; they care
//! about each item's *lifetime*: when it appears, and when it goes away.
//!
//! This crate turns a [`Source`] of snapshots into a source of
//! [`LifetimeEvent`]s. Each event carries the item and a one-shot
//! [`RemovalSignal`] that fires exactly once, when the item's identity is no
//! longer present.
//!
//! - **Keys** ([`KeyFn`], [`Identity`], [`ByKey`], [`TryByKey`]): how items are
//!   matched across snapshots. By default an item is its own key.
//! - **Registry** ([`LifetimeRegistry`]): the insertion-ordered map of live
//!   identities owned by each subscription.
//! - **Diff** ([`diff`], [`SnapshotDiff`]): which live keys vanished and which
//!   items are new.
//! - **Combinator** ([`Lifetimes`], [`SourceExt`]): removals first, then
//!   additions, one snapshot at a time; teardown on end or cancellation.
//! - **Sources** ([`Subject`], [`Property`]): ready-made push sources for
//!   embedders and tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_lifetimes::{LifetimeEvent, Notification, Property, Source, SourceExt};
//!
//! // A property replays its current snapshot to each new subscriber.
//! let children = Property::<Vec<&str>, ()>::with_value(vec!["a", "b"]);
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = log.clone();
//! let lifetimes = children.clone().lifetimes();
//! let subscription = lifetimes.subscribe(move |n: Notification<LifetimeEvent<&'static str>, ()>| {
//!     if let Notification::Value(event) = n {
//!         sink.borrow_mut().push(("add", event.element));
//!         let sink = sink.clone();
//!         let element = event.element;
//!         event.removal.on_fire(move || sink.borrow_mut().push(("remove", element)));
//!     }
//! });
//!
//! children.set(vec!["a", "c"]).unwrap();
//!
//! // Cancelling removes everything still alive, in the order it appeared.
//! subscription.unsubscribe();
//!
//! assert_eq!(
//!     *log.borrow(),
//!     [
//!         ("add", "a"),
//!         ("add", "b"),
//!         ("remove", "b"),
//!         ("add", "c"),
//!         ("remove", "a"),
//!         ("remove", "c"),
//!     ]
//! );
//! ```
//!
//! ## Ordering
//!
//! For each snapshot, every removal is signalled before any addition is
//! emitted. Removals follow the order in which the identities first appeared;
//! additions follow snapshot order. A snapshot is fully processed before the
//! next one starts, even when a callback pushes a new snapshot re-entrantly.
//!
//! An item's element is captured when its identity first appears. Later
//! snapshots that carry a different value under the same key do not update
//! it and emit nothing. A key that disappears and later comes back is a new
//! identity with a new removal signal.
//!
//! ## Errors
//!
//! Source errors are forwarded downstream as they arrive and never touch the
//! registry. With [`TryByKey`], an item whose key cannot be extracted is left
//! out of its snapshot and the error is forwarded before that snapshot's
//! removals. Within one snapshot, duplicate keys keep the first occurrence.
//!
//! ## Logging
//!
//! Diff passes, teardown, and dropped notifications are reported through
//! [`tracing`](https://docs.rs/tracing). No subscriber is installed.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature (on by default)
//! only enables `std` support in `tracing`.

#![no_std]

extern crate alloc;

mod diff;
mod error;
mod event;
mod key;
mod lifetimes;
mod notification;
mod registry;
pub mod signal;
mod source;
mod subject;

pub use diff::{SnapshotDiff, diff};
pub use error::{KeyOccupied, SourceEnded};
pub use event::LifetimeEvent;
pub use key::{ByKey, Identity, KeyFn, TryByKey};
pub use lifetimes::Lifetimes;
pub use notification::{Notification, Observer};
pub use registry::{LifetimeEntry, LifetimeRegistry};
pub use signal::{ListenerId, RemovalSignal, RemovalTrigger, removal_signal};
pub use source::{Source, SourceExt, Subscription};
pub use subject::{Property, Subject};
