// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InformerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("List response carried no resource version")]
    MissingResourceVersion,

    #[error("Watch cursor expired: {0}")]
    ResourceVersionExpired(String),

    #[error("Watch failed: {0}")]
    WatchFailed(String),

    #[error("Failed to decode {object}: {message}")]
    DecodeError { object: String, message: String },

    #[error("Initial list failed after {attempts} attempts: {source}")]
    InitialListFailed {
        attempts: u32,
        #[source]
        source: Box<InformerError>,
    },
}

impl InformerError {
    /// Maps HTTP 410 Gone from the apiserver onto an expired cursor
    pub fn from_kube(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 410 => {
                InformerError::ResourceVersionExpired(resp.message)
            }
            other => InformerError::KubeError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, InformerError>;
