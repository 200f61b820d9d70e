// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Local cache of last-known objects and the diffing applied on re-list.

use crate::sync::event::Event;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of an object within the collection
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn from_obj<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Whether `candidate` supersedes `current`.
///
/// Numeric versions compare numerically, anything else only by equality.
/// A missing version on either side always counts as a change.
pub fn is_newer(candidate: Option<&str>, current: Option<&str>) -> bool {
    match (candidate, current) {
        (Some(candidate), Some(current)) => {
            match (candidate.parse::<u64>(), current.parse::<u64>()) {
                (Ok(c), Ok(o)) => c > o,
                _ => candidate != current,
            }
        }
        _ => true,
    }
}

/// Mapping from object identity to the last delivered state
#[derive(Debug, Clone)]
pub struct Store<K> {
    objects: BTreeMap<ObjectKey, K>,
    /// Versions at which the watch deleted objects, kept until a list
    /// taken after the deletion has been applied
    tombstones: BTreeMap<ObjectKey, Option<String>>,
}

impl<K> Default for Store<K> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            tombstones: BTreeMap::new(),
        }
    }
}

impl<K: Resource + Clone> Store<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&K> {
        self.objects.get(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Cached objects in key order
    pub fn state(&self) -> Vec<K> {
        self.objects.values().cloned().collect()
    }

    /// Apply an added or modified object seen on the watch
    pub fn apply_upsert(&mut self, obj: K) -> Option<Event<K>> {
        let key = ObjectKey::from_obj(&obj);
        self.tombstones.remove(&key);
        match self.objects.get(&key) {
            None => {
                self.objects.insert(key, obj.clone());
                Some(Event::Added(obj))
            }
            Some(old) => {
                if !is_newer(
                    obj.meta().resource_version.as_deref(),
                    old.meta().resource_version.as_deref(),
                ) {
                    return None;
                }
                let old = self.objects.insert(key, obj.clone())?;
                Some(Event::Updated(old, obj))
            }
        }
    }

    /// Apply a deletion seen on the watch, unknown objects are ignored
    pub fn apply_delete(&mut self, obj: K) -> Option<Event<K>> {
        let key = ObjectKey::from_obj(&obj);
        self.tombstones
            .insert(key.clone(), obj.meta().resource_version.clone());
        self.objects.remove(&key).map(|_| Event::Deleted(obj))
    }

    /// Rebuild the cache from a full list and return the implied events.
    ///
    /// Deletions come first in key order, then additions and updates in list
    /// order. A cached object missing from the list survives when its version
    /// is newer than `list_version`, as the watch saw it after the snapshot.
    /// Likewise a listed object the watch deleted after the snapshot stays
    /// deleted unless the list carries a newer version of it.
    pub fn replace(&mut self, items: Vec<K>, list_version: Option<&str>) -> Vec<Event<K>> {
        let mut previous = std::mem::take(&mut self.objects);
        let mut incoming = BTreeMap::new();
        let mut changes = Vec::new();

        for obj in items {
            let key = ObjectKey::from_obj(&obj);
            if let Some(deleted_at) = self.tombstones.get(&key) {
                if !is_newer(obj.meta().resource_version.as_deref(), deleted_at.as_deref()) {
                    continue;
                }
                self.tombstones.remove(&key);
            }
            match previous.remove(&key) {
                None => {
                    changes.push(Event::Added(obj.clone()));
                    incoming.insert(key, obj);
                }
                Some(old) => {
                    if is_newer(
                        obj.meta().resource_version.as_deref(),
                        old.meta().resource_version.as_deref(),
                    ) {
                        changes.push(Event::Updated(old, obj.clone()));
                        incoming.insert(key, obj);
                    } else {
                        incoming.insert(key, old);
                    }
                }
            }
        }

        let mut events = Vec::new();
        for (key, old) in previous {
            if observed_after(old.meta().resource_version.as_deref(), list_version) {
                incoming.insert(key, old);
            } else {
                events.push(Event::Deleted(old));
            }
        }
        events.extend(changes);

        self.tombstones
            .retain(|_, deleted_at| observed_after(deleted_at.as_deref(), list_version));
        self.objects = incoming;
        events
    }
}

fn observed_after(version: Option<&str>, list_version: Option<&str>) -> bool {
    match (
        version.and_then(|v| v.parse::<u64>().ok()),
        list_version.and_then(|v| v.parse::<u64>().ok()),
    ) {
        (Some(v), Some(l)) => v > l,
        _ => false,
    }
}
