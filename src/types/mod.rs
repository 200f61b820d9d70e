// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed custom resources.

pub mod example;

pub use example::{Example, ExampleSpec};
