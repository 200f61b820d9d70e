// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! List-watch resource synchronization.

pub mod backoff;
pub mod event;
pub mod source;
pub mod store;
pub mod synchronizer;

pub use event::{ChannelHandler, Event, EventHandler};
pub use source::{ListPage, ListWatch, RawEvent, WatchStream};
pub use store::{ObjectKey, Store};
pub use synchronizer::{SyncHandle, SyncObject, Synchronizer};
