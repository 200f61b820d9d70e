// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client, Resource};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the CRD backing `K` to be served by the apiserver.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_crd<K: Resource<DynamicType = ()>>(client: &Client) -> Result<()> {
    let (group, version, kind) = (K::group(&()), K::version(&()), K::kind(&()));
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_crd_exists(client, &group, &version, &kind).await {
            Ok(true) => {
                info!("{} CRD ({}/{}) is available", kind, group, version);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "{} CRD ({}/{}) not yet available, waiting {} seconds...",
                    kind, group, version, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for {} CRD: {}, retrying in {} seconds...",
                    kind, e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if a kind is served in the given group and version
async fn check_crd_exists(client: &Client, group: &str, version: &str, kind: &str) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[group])
        .run()
        .await?;

    for api_group in discovery.groups() {
        if api_group.name() == group {
            for (ar, _) in api_group.recommended_resources() {
                if ar.kind == kind && ar.version == version {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}
