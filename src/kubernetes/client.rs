// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation from a kubeconfig file or the in-cluster environment

use crate::config::Config;
use crate::error::{InformerError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{info, instrument};

/// Create a Kubernetes client.
///
/// An explicit kubeconfig path wins; without one the in-cluster service
/// account configuration is used.
#[instrument(skip(config))]
pub async fn create_client(config: &Config) -> Result<Client> {
    match &config.kubeconfig {
        Some(path) => {
            info!("Loading kubeconfig from {}", path.display());
            let kubeconfig = tokio::fs::read_to_string(path).await.map_err(|e| {
                InformerError::KubeconfigError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            create_client_from_kubeconfig(&kubeconfig).await
        }
        None => {
            info!("No kubeconfig given, using in-cluster configuration");
            let client_config = KConfig::incluster().map_err(|e| {
                InformerError::KubeconfigError(format!("Failed to load in-cluster config: {}", e))
            })?;
            Client::try_from(client_config).map_err(|e| {
                InformerError::KubeconfigError(format!("Failed to create client: {}", e))
            })
        }
    }
}

/// Create a Kubernetes client from a kubeconfig string
pub async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    use kube::config::Kubeconfig;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| InformerError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        KConfig::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                InformerError::KubeconfigError(format!("Failed to create config: {}", e))
            })?;

    Client::try_from(client_config)
        .map_err(|e| InformerError::KubeconfigError(format!("Failed to create client: {}", e)))
}
