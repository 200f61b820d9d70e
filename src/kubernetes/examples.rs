// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-shot REST fetches of Example resources

use crate::error::Result;
use crate::types::Example;
use kube::{api::ListParams, Api, Client};
use tracing::{debug, instrument};

/// List Examples across all namespaces
#[instrument(skip(client))]
pub async fn list_examples(client: &Client) -> Result<Vec<Example>> {
    let examples: Api<Example> = Api::all(client.clone());
    let example_list = examples.list(&ListParams::default()).await?;

    debug!(
        "Listed {} examples at resource version {:?}",
        example_list.items.len(),
        example_list.metadata.resource_version
    );
    Ok(example_list.items)
}

/// Fetch a single Example by namespace and name
#[instrument(skip(client))]
pub async fn get_example(client: &Client, namespace: &str, name: &str) -> Result<Example> {
    let examples: Api<Example> = Api::namespaced(client.clone(), namespace);
    Ok(examples.get(name).await?)
}
