// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! List-then-watch synchronizer with periodic resync.

use crate::config::SyncConfig;
use crate::error::{InformerError, Result};
use crate::sync::backoff::Backoff;
use crate::sync::event::EventHandler;
use crate::sync::source::{ListPage, ListWatch, RawEvent};
use crate::sync::store::{ObjectKey, Store};
use futures::StreamExt;
use kube::api::DynamicObject;
use kube::Resource;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Objects the synchronizer can decode and cache
pub trait SyncObject: Resource + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

impl<T> SyncObject for T where T: Resource + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

/// Cache and handler, only ever touched together under one lock
struct State<K> {
    store: Store<K>,
    handler: Box<dyn EventHandler<K>>,
    stopped: bool,
}

struct Shared<K> {
    state: Mutex<State<K>>,
}

impl<K: SyncObject> Shared<K> {
    /// Diff a full list into the cache, returns the number of delivered events
    async fn apply_list(&self, page: ListPage) -> usize {
        let mut items = Vec::with_capacity(page.items.len());
        let mut failures = Vec::new();
        for obj in page.items {
            match decode::<K>(obj) {
                Ok(obj) => items.push(obj),
                Err(e) => failures.push(e),
            }
        }

        let mut state = self.state.lock().await;
        if state.stopped {
            return 0;
        }

        for e in &failures {
            warn!("Skipping listed object: {}", e);
            state.handler.on_error(e);
        }

        let events = state.store.replace(items, Some(page.resource_version.as_str()));
        let delivered = events.len();
        for event in events {
            state.handler.on_event(event);
        }
        delivered
    }

    async fn apply_watch_event(&self, event: RawEvent) {
        let (obj, deleted) = match event {
            RawEvent::Bookmark(_) => return,
            RawEvent::Added(obj) | RawEvent::Modified(obj) => (obj, false),
            RawEvent::Deleted(obj) => (obj, true),
        };
        let decoded = decode::<K>(obj);

        let mut state = self.state.lock().await;
        if state.stopped {
            return;
        }

        let obj = match decoded {
            Ok(obj) => obj,
            Err(e) => {
                warn!("Skipping watched object: {}", e);
                state.handler.on_error(&e);
                return;
            }
        };

        let change = if deleted {
            state.store.apply_delete(obj)
        } else {
            state.store.apply_upsert(obj)
        };
        if let Some(event) = change {
            debug!(
                "Delivering {} event for {}",
                event.kind(),
                ObjectKey::from_obj(event.object())
            );
            state.handler.on_event(event);
        }
    }

    async fn report(&self, error: &InformerError) {
        let mut state = self.state.lock().await;
        if !state.stopped {
            state.handler.on_error(error);
        }
    }
}

fn decode<K: SyncObject>(obj: DynamicObject) -> Result<K> {
    let object = ObjectKey::new(
        obj.metadata.namespace.as_deref(),
        obj.metadata.name.as_deref().unwrap_or("<unnamed>"),
    )
    .to_string();

    obj.try_parse::<K>()
        .map_err(|e| InformerError::DecodeError {
            object,
            message: e.to_string(),
        })
}

/// Keeps a local cache of a remote collection in sync and reports every
/// change to an [`EventHandler`].
pub struct Synchronizer<K, S> {
    source: Arc<S>,
    config: SyncConfig,
    _marker: PhantomData<fn() -> K>,
}

impl<K: SyncObject, S: ListWatch> Synchronizer<K, S> {
    pub fn new(source: S, config: SyncConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
            _marker: PhantomData,
        }
    }

    /// Perform the initial list, deliver `Added` for every object, then keep
    /// watching and resyncing in the background.
    ///
    /// Fails only when the initial list cannot be retrieved within
    /// `max_list_attempts` attempts.
    #[instrument(skip_all)]
    pub async fn start<H: EventHandler<K>>(self, handler: H) -> Result<SyncHandle<K>> {
        let page = self.initial_list().await?;
        let resource_version = page.resource_version.clone();

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                store: Store::new(),
                handler: Box::new(handler),
                stopped: false,
            }),
        });
        let added = shared.apply_list(page).await;
        info!(
            "Initial list synced {} objects at resource version {}",
            added, resource_version
        );

        let token = CancellationToken::new();
        let worker = Arc::new(Worker {
            source: self.source,
            config: self.config,
            shared: shared.clone(),
            token: token.clone(),
        });

        let mut tasks = vec![tokio::spawn(worker.clone().watch_loop(resource_version))];
        if worker.config.resync_period.is_zero() {
            debug!("Periodic resync disabled");
        } else {
            tasks.push(tokio::spawn(worker.resync_loop()));
        }

        Ok(SyncHandle {
            shared,
            token,
            tasks,
        })
    }

    async fn initial_list(&self) -> Result<ListPage> {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let max_attempts = self.config.max_list_attempts.max(1);

        loop {
            match self.source.list().await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    let delay = backoff.next_delay();
                    if backoff.attempts() >= max_attempts {
                        error!("Initial list failed {} times: {}", backoff.attempts(), e);
                        return Err(InformerError::InitialListFailed {
                            attempts: backoff.attempts(),
                            source: Box::new(e),
                        });
                    }
                    warn!("Initial list failed: {}, retrying in {:?}", e, delay);
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Background activities sharing one cache
struct Worker<K, S> {
    source: Arc<S>,
    config: SyncConfig,
    shared: Arc<Shared<K>>,
    token: CancellationToken,
}

impl<K: SyncObject, S: ListWatch> Worker<K, S> {
    async fn watch_loop(self: Arc<Self>, mut resource_version: String) {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);

        loop {
            let opened = tokio::select! {
                _ = self.token.cancelled() => return,
                opened = self.source.watch(&resource_version) => opened,
            };

            let mut stream = match opened {
                Ok(stream) => stream,
                Err(e) => match self.recover(e, &mut backoff).await {
                    Some(rv) => {
                        resource_version = rv;
                        continue;
                    }
                    None => return,
                },
            };
            debug!("Watching from resource version {}", resource_version);

            let mut received = false;
            let failure = loop {
                let next = tokio::select! {
                    biased;
                    _ = self.token.cancelled() => return,
                    next = stream.next() => next,
                };
                match next {
                    Some(Ok(event)) => {
                        received = true;
                        backoff.reset();
                        if let Some(rv) = event.resource_version() {
                            resource_version = rv.to_string();
                        }
                        self.shared.apply_watch_event(event).await;
                    }
                    Some(Err(e)) => break Some(e),
                    None => break None,
                }
            };
            drop(stream);

            match failure {
                None if received => debug!("Watch closed by server, reopening"),
                None => {
                    let delay = backoff.next_delay();
                    debug!("Watch closed without events, reopening in {:?}", delay);
                    if !self.pause(delay).await {
                        return;
                    }
                }
                Some(e) => match self.recover(e, &mut backoff).await {
                    Some(rv) => resource_version = rv,
                    None => return,
                },
            }
        }
    }

    /// Fall back to a full re-list after a watch failure, returns the new
    /// cursor or `None` once cancelled
    async fn recover(&self, error: InformerError, backoff: &mut Backoff) -> Option<String> {
        match &error {
            InformerError::ResourceVersionExpired(msg) => {
                info!("Watch cursor expired ({}), re-listing", msg);
            }
            _ => {
                let delay = backoff.next_delay();
                warn!("Watch failed: {}, re-listing in {:?}", error, delay);
                if !self.pause(delay).await {
                    return None;
                }
            }
        }
        self.relist(backoff).await
    }

    async fn relist(&self, backoff: &mut Backoff) -> Option<String> {
        let max_attempts = self.config.max_list_attempts.max(1);
        let mut failures = 0;

        loop {
            let listed = tokio::select! {
                _ = self.token.cancelled() => return None,
                listed = self.source.list() => listed,
            };

            match listed {
                Ok(page) => {
                    backoff.reset();
                    let resource_version = page.resource_version.clone();
                    let changes = self.shared.apply_list(page).await;
                    info!(
                        "Re-listed at resource version {} with {} changes",
                        resource_version, changes
                    );
                    return Some(resource_version);
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff.next_delay();
                    if failures % max_attempts == 0 {
                        error!(
                            "Re-list failed {} times in a row, serving stale cache: {}",
                            failures, e
                        );
                        self.shared.report(&e).await;
                    } else {
                        warn!("Re-list failed: {}, retrying in {:?}", e, delay);
                    }
                    if !self.pause(delay).await {
                        return None;
                    }
                }
            }
        }
    }

    async fn resync_loop(self: Arc<Self>) {
        let period = self.config.resync_period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let listed = tokio::select! {
                _ = self.token.cancelled() => return,
                listed = self.source.list() => listed,
            };

            match listed {
                Ok(page) => {
                    let changes = self.shared.apply_list(page).await;
                    if changes > 0 {
                        info!("Resync repaired {} missed changes", changes);
                    } else {
                        debug!("Resync found no changes");
                    }
                }
                Err(e) => {
                    warn!("Resync list failed: {}", e);
                    self.shared.report(&e).await;
                }
            }
        }
    }

    /// Sleep unless cancelled first, returns false on cancellation
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}

/// Handle to a running synchronizer
pub struct SyncHandle<K> {
    shared: Arc<Shared<K>>,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<K: SyncObject> SyncHandle<K> {
    /// Cancel watching and resyncing. Once this returns the handler is never
    /// invoked again. Calling it more than once is harmless.
    pub async fn stop(&mut self) {
        self.token.cancel();
        self.shared.state.lock().await.stopped = true;

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Synchronizer task panicked: {}", e);
                }
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Snapshot of the cache in key order
    pub async fn state(&self) -> Vec<K> {
        self.shared.state.lock().await.store.state()
    }

    pub async fn get(&self, key: &ObjectKey) -> Option<K> {
        self.shared.state.lock().await.store.get(key).cloned()
    }
}

impl<K> Drop for SyncHandle<K> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
