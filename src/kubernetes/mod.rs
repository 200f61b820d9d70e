// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, CRD discovery, fetching and watching.

pub mod client;
pub mod crd;
pub mod examples;
pub mod source;

pub use client::create_client;
pub use crd::wait_for_crd;
pub use examples::{get_example, list_examples};
pub use source::ApiSource;
