// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use example_informer::config::Config;
use example_informer::kubernetes::{
    create_client, get_example, list_examples, wait_for_crd, ApiSource,
};
use example_informer::sync::{ChannelHandler, Event, Synchronizer};
use example_informer::types::Example;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting example informer");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: namespace={}, resync_period={:?}",
        config.sync.namespace.as_deref().unwrap_or("<all>"),
        config.sync.resync_period
    );

    let client = create_client(&config).await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for Example CRD to become available...");
    wait_for_crd::<Example>(&client).await?;

    let examples = list_examples(&client)
        .await
        .context("Failed to list examples")?;
    info!("Found {} examples", examples.len());
    for example in &examples {
        info!("{}: {:?}", example.qualified_name(), example.spec);
    }

    let example = get_example(&client, &config.example_namespace, &config.example_name)
        .await
        .with_context(|| {
            format!(
                "Failed to get example {}/{}",
                config.example_namespace, config.example_name
            )
        })?;
    info!("Fetched {}: {:?}", example.qualified_name(), example.spec);
    if !example.is_populated() {
        warn!("Example {} has default spec values", example.qualified_name());
    }

    let source = ApiSource::new::<Example>(client, &config.sync);
    let (handler, mut events) = ChannelHandler::new();
    let mut handle = Synchronizer::<Example, _>::new(source, config.sync.clone())
        .start(handler)
        .await?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    shutdown_signal().await;
    info!("Shutdown requested, stopping synchronizer");
    handle.stop().await;

    // Dropping the handle releases the sender side and ends the printer
    drop(handle);
    printer.await?;

    info!("Stopped");
    Ok(())
}

fn log_event(event: &Event<Example>) {
    match event {
        Event::Added(obj) => info!("Added {}: {:?}", obj.qualified_name(), obj.spec),
        Event::Updated(old, new) => info!(
            "Updated {}: {:?} -> {:?}",
            new.qualified_name(),
            old.spec,
            new.spec
        ),
        Event::Deleted(obj) => info!("Deleted {}", obj.qualified_name()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
