// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "wfarr.systems", version = "v1", kind = "Example")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
pub struct ExampleSpec {
    pub foo: String,
    pub bar: bool,
}

impl Example {
    /// Check if both spec fields carry non-default values
    pub fn is_populated(&self) -> bool {
        !self.spec.foo.is_empty() && self.spec.bar
    }

    /// `namespace/name` of this object
    pub fn qualified_name(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}", ns, self.name_any()),
            None => self.name_any(),
        }
    }
}
