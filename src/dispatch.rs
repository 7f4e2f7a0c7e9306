//! Event dispatch
//!
//! Each inbound event runs as its own task. Tasks share nothing mutable: the
//! controller is read-only and every step only touches the message it targets.

use crate::controller::BranchController;
use crate::platform::{SelectionEvent, TriggerEvent};
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

/// Inbound events from the chat platform
#[derive(Debug, Clone)]
pub enum LoomEvent {
    Trigger(TriggerEvent),
    Selection(SelectionEvent),
}

/// Runs controller steps concurrently, one task per event
pub struct Dispatcher {
    controller: Arc<BranchController>,
}

impl Dispatcher {
    pub fn new(controller: Arc<BranchController>) -> Self {
        Self { controller }
    }

    /// Handle one event to completion
    pub async fn handle(controller: &BranchController, event: LoomEvent) -> Result<()> {
        match event {
            LoomEvent::Trigger(trigger) => controller.on_trigger(trigger).await.map(|_| ()),
            LoomEvent::Selection(selection) => controller.on_selection(selection).await.map(|_| ()),
        }
    }

    /// Consume events until the channel closes, then wait for in-flight steps.
    ///
    /// Returns the number of steps that failed.
    pub async fn run(&self, mut events: mpsc::Receiver<LoomEvent>) -> usize {
        let mut tasks = JoinSet::new();
        let mut failures = 0;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let controller = self.controller.clone();
                        tasks.spawn(async move { Self::handle(&controller, event).await });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    failures += record(joined);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            failures += record(joined);
        }

        info!("Event channel closed ({} failed steps)", failures);
        failures
    }
}

fn record(joined: std::result::Result<Result<()>, JoinError>) -> usize {
    match joined {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error!("Loom step failed: {}", e);
            1
        }
        Err(e) => {
            error!("Loom task panicked: {}", e);
            1
        }
    }
}
