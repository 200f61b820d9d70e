// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! List and watch of a resource collection through the Kubernetes API

use crate::config::SyncConfig;
use crate::error::{InformerError, Result};
use crate::sync::{ListPage, ListWatch, RawEvent, WatchStream};
use async_trait::async_trait;
use futures::StreamExt;
use kube::{
    api::{ApiResource, DynamicObject, ListParams, WatchEvent, WatchParams},
    Api, Client, Resource,
};
use tracing::{debug, instrument};

/// [`ListWatch`] backed by an apiserver.
///
/// Objects are fetched untyped so that a single malformed object surfaces
/// as a decode error in the synchronizer instead of breaking the stream.
pub struct ApiSource {
    api: Api<DynamicObject>,
    list_params: ListParams,
    watch_params: WatchParams,
}

impl ApiSource {
    pub fn new<K: Resource<DynamicType = ()>>(client: Client, config: &SyncConfig) -> Self {
        let resource = ApiResource::erase::<K>(&());
        let api = match &config.namespace {
            Some(namespace) => Api::namespaced_with(client, namespace, &resource),
            None => Api::all_with(client, &resource),
        };

        let mut list_params = ListParams::default();
        let mut watch_params = WatchParams::default().timeout(config.watch_timeout_secs);
        if let Some(labels) = &config.label_selector {
            list_params = list_params.labels(labels);
            watch_params = watch_params.labels(labels);
        }
        if let Some(fields) = &config.field_selector {
            list_params = list_params.fields(fields);
            watch_params = watch_params.fields(fields);
        }

        Self {
            api,
            list_params,
            watch_params,
        }
    }
}

#[async_trait]
impl ListWatch for ApiSource {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<ListPage> {
        let list = self
            .api
            .list(&self.list_params)
            .await
            .map_err(InformerError::from_kube)?;

        let resource_version = list
            .metadata
            .resource_version
            .filter(|rv| !rv.is_empty())
            .ok_or(InformerError::MissingResourceVersion)?;

        debug!(
            "Listed {} objects at resource version {}",
            list.items.len(),
            resource_version
        );
        Ok(ListPage {
            items: list.items,
            resource_version,
        })
    }

    #[instrument(skip(self))]
    async fn watch(&self, resource_version: &str) -> Result<WatchStream> {
        let stream = self
            .api
            .watch(&self.watch_params, resource_version)
            .await
            .map_err(InformerError::from_kube)?;

        Ok(stream.map(convert_event).boxed())
    }
}

fn convert_event(event: kube::Result<WatchEvent<DynamicObject>>) -> Result<RawEvent> {
    match event {
        Ok(WatchEvent::Added(obj)) => Ok(RawEvent::Added(obj)),
        Ok(WatchEvent::Modified(obj)) => Ok(RawEvent::Modified(obj)),
        Ok(WatchEvent::Deleted(obj)) => Ok(RawEvent::Deleted(obj)),
        Ok(WatchEvent::Bookmark(bookmark)) => {
            Ok(RawEvent::Bookmark(bookmark.metadata.resource_version))
        }
        // HTTP GONE: the cursor fell out of the watch history
        Ok(WatchEvent::Error(err)) if err.code == 410 => {
            Err(InformerError::ResourceVersionExpired(err.message))
        }
        Ok(WatchEvent::Error(err)) => Err(InformerError::WatchFailed(format!(
            "{} ({})",
            err.message, err.code
        ))),
        Err(e) => Err(InformerError::from_kube(e)),
    }
}
