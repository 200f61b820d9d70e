// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Collaborator interface the synchronizer lists and watches through.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use kube::api::DynamicObject;
use std::sync::Arc;

/// Full enumeration of the collection
#[derive(Debug, Clone)]
pub struct ListPage {
    pub items: Vec<DynamicObject>,
    /// Collection version the watch continues from
    pub resource_version: String,
}

/// A single change as received from the watch, before decoding
#[derive(Debug, Clone)]
pub enum RawEvent {
    Added(DynamicObject),
    Modified(DynamicObject),
    Deleted(DynamicObject),
    /// Progress marker that only advances the cursor
    Bookmark(String),
}

impl RawEvent {
    /// Cursor position after this event
    pub fn resource_version(&self) -> Option<&str> {
        match self {
            RawEvent::Added(obj) | RawEvent::Modified(obj) | RawEvent::Deleted(obj) => {
                obj.metadata.resource_version.as_deref()
            }
            RawEvent::Bookmark(rv) => Some(rv),
        }
    }
}

/// Stream of watch events. Ends when the server closes the connection,
/// yields `ResourceVersionExpired` when the cursor fell out of history.
pub type WatchStream = BoxStream<'static, Result<RawEvent>>;

/// List and watch operations over one resource collection
#[async_trait]
pub trait ListWatch: Send + Sync + 'static {
    async fn list(&self) -> Result<ListPage>;

    async fn watch(&self, resource_version: &str) -> Result<WatchStream>;
}

#[async_trait]
impl<T: ListWatch + ?Sized> ListWatch for Arc<T> {
    async fn list(&self) -> Result<ListPage> {
        (**self).list().await
    }

    async fn watch(&self, resource_version: &str) -> Result<WatchStream> {
        (**self).watch(resource_version).await
    }
}
