// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock apiserver for the kube client and a scripted
//! in-memory list-watch source.

use crate::error::{InformerError, Result};
use crate::sync::{ListPage, ListWatch, RawEvent, WatchStream};
use crate::types::Example;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use http::{Request, Response};
use kube::api::{ApiResource, DynamicObject};
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("GET", path, status, body)
    }

    /// Add a response for watch requests (GET with `watch=true`) on the path
    pub fn on_watch(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("WATCH", path, status, body)
    }

    fn respond(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let is_watch = req
            .uri()
            .query()
            .is_some_and(|q| q.split('&').any(|pair| pair == "watch=true"));
        let method = if is_watch {
            "WATCH".to_string()
        } else {
            req.method().to_string()
        };
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("path", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Wire representation of an Example
pub fn example_json(namespace: &str, name: &str, rv: &str, foo: &str, bar: bool) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "wfarr.systems/v1",
        "kind": "Example",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": rv,
            "uid": format!("uid-{}", name)
        },
        "spec": { "foo": foo, "bar": bar }
    })
}

/// Wire representation of an ExampleList
pub fn list_json(items: Vec<serde_json::Value>, rv: &str) -> String {
    serde_json::json!({
        "apiVersion": "wfarr.systems/v1",
        "kind": "ExampleList",
        "metadata": { "resourceVersion": rv },
        "items": items
    })
    .to_string()
}

/// Newline-delimited watch response body
pub fn watch_lines(events: &[serde_json::Value]) -> String {
    events.iter().map(|e| format!("{}\n", e)).collect()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// An apiserver error as the kube client reports it
pub fn api_error(code: u16, reason: &str) -> InformerError {
    InformerError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("simulated {}", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// Untyped Example in namespace `default`, as a source yields it
pub fn example_object(name: &str, rv: &str, foo: &str) -> DynamicObject {
    let mut obj = DynamicObject::new(name, &ApiResource::erase::<Example>(&()))
        .within("default")
        .data(serde_json::json!({ "spec": { "foo": foo, "bar": true } }));
    obj.metadata.resource_version = Some(rv.to_string());
    obj
}

/// Untyped object in namespace `default` whose spec does not decode
pub fn broken_object(name: &str, rv: &str) -> DynamicObject {
    let mut obj = DynamicObject::new(name, &ApiResource::erase::<Example>(&()))
        .within("default")
        .data(serde_json::json!({ "spec": { "foo": 7, "bar": "yes" } }));
    obj.metadata.resource_version = Some(rv.to_string());
    obj
}

/// Typed counterpart of [`example_object`]
pub fn example(name: &str, rv: &str, foo: &str) -> Example {
    example_object(name, rv, foo)
        .try_parse()
        .expect("example fixture decodes")
}

enum WatchScript {
    /// Deliver events, then keep the connection open
    Hang(Vec<RawEvent>),
    /// Deliver events, then end the stream
    Close(Vec<RawEvent>),
    /// Deliver events, then fail
    Fail(Vec<RawEvent>, InformerError),
    /// Modified events for one object with ever increasing versions
    Endless(DynamicObject),
}

/// Scripted [`ListWatch`].
///
/// Lists are answered in order; once the script runs out the last
/// successful page is repeated. Watches are answered in order; once the
/// script runs out the stream stays open without events.
#[derive(Default)]
pub struct FakeSource {
    lists: Mutex<VecDeque<Result<ListPage>>>,
    last_page: Mutex<Option<ListPage>>,
    watches: Mutex<VecDeque<WatchScript>>,
    list_calls: AtomicUsize,
    watched_versions: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_ok(self, items: Vec<DynamicObject>, rv: &str) -> Self {
        self.lists.lock().unwrap().push_back(Ok(ListPage {
            items,
            resource_version: rv.to_string(),
        }));
        self
    }

    pub fn list_err(self, error: InformerError) -> Self {
        self.lists.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn watch_then_hang(self, events: Vec<RawEvent>) -> Self {
        self.push_watch(WatchScript::Hang(events))
    }

    pub fn watch_then_close(self, events: Vec<RawEvent>) -> Self {
        self.push_watch(WatchScript::Close(events))
    }

    pub fn watch_then_fail(self, events: Vec<RawEvent>, error: InformerError) -> Self {
        self.push_watch(WatchScript::Fail(events, error))
    }

    pub fn watch_endless(self, obj: DynamicObject) -> Self {
        self.push_watch(WatchScript::Endless(obj))
    }

    fn push_watch(self, script: WatchScript) -> Self {
        self.watches.lock().unwrap().push_back(script);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Cursors the watches were opened at, in order
    pub fn watched_versions(&self) -> Vec<String> {
        self.watched_versions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListWatch for FakeSource {
    async fn list(&self) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.lists.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(page)) => {
                *self.last_page.lock().unwrap() = Some(page.clone());
                Ok(page)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last_page
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| InformerError::WatchFailed("no list scripted".to_string())),
        }
    }

    async fn watch(&self, resource_version: &str) -> Result<WatchStream> {
        self.watched_versions
            .lock()
            .unwrap()
            .push(resource_version.to_string());

        let script = self.watches.lock().unwrap().pop_front();
        let stream: WatchStream = match script {
            Some(WatchScript::Hang(events)) => stream::iter(events.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
            Some(WatchScript::Close(events)) => stream::iter(events.into_iter().map(Ok)).boxed(),
            Some(WatchScript::Fail(events, error)) => stream::iter(events.into_iter().map(Ok))
                .chain(stream::once(async move { Err(error) }))
                .boxed(),
            Some(WatchScript::Endless(obj)) => stream::iter((2u64..).map(move |rv| {
                let mut obj = obj.clone();
                obj.metadata.resource_version = Some(rv.to_string());
                Ok(RawEvent::Modified(obj))
            }))
            .boxed(),
            None => stream::pending().boxed(),
        };
        Ok(stream)
    }
}
