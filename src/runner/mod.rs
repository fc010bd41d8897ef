//! Run orchestration
//!
//! The runner owns the lifecycle of a siege: it spawns one session slot per
//! requested connection plus the result aggregator, wires them together
//! through a single bounded outcome channel, and waits for every task to
//! reach its terminal state before returning.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::config::SiegeConfig;
use crate::report::{Aggregator, RunTotals};
use crate::session::SessionSlot;
use crate::transport::Transport;

/// Orchestrates a siege run
pub struct SiegeRunner<T: Transport> {
    transport: Arc<T>,
    config: SiegeConfig,
}

impl<T: Transport + 'static> SiegeRunner<T> {
    /// Create a runner for the given transport and configuration
    pub fn new(transport: T, config: SiegeConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }

    /// Launch all session slots and the aggregator, then wait for them
    ///
    /// Returns once the aggregator has observed the configured number of
    /// successes and every slot has finished holding its session. Transient
    /// connection failures never surface here; they are absorbed by the
    /// aggregator as data points.
    pub async fn run(&self) -> Result<RunTotals> {
        tracing::info!(
            connections = self.config.connections,
            destination = %self.config.destination,
            transport = self.transport.name(),
            hold_secs = self.config.hold.as_secs(),
            "starting siege"
        );

        // Capacity 1 keeps the hand-off effectively synchronous: a burst of
        // failures parks the senders instead of flooding the aggregator.
        let (outcome_tx, outcome_rx) = mpsc::channel(1);

        let aggregator = Aggregator::new(
            outcome_rx,
            self.config.connections as u64,
            self.config.report_interval,
        );
        let aggregator_handle =
            tokio::spawn(aggregator.run(|report| tracing::info!("{}", report)));

        let mut slots = Vec::with_capacity(self.config.connections);
        for slot_id in 0..self.config.connections {
            let slot = SessionSlot::new(
                slot_id,
                Arc::clone(&self.transport),
                self.config.clone(),
                outcome_tx.clone(),
            );
            slots.push(tokio::spawn(slot.run()));
        }
        drop(outcome_tx);

        // Wait for all slots to finish holding, then for the aggregator.
        for slot in slots {
            let _ = slot.await;
        }
        let totals = aggregator_handle
            .await
            .context("result aggregator task failed")?;

        tracing::info!(
            sessions = totals.successes,
            failed_attempts = totals.failures,
            "siege complete"
        );

        Ok(totals)
    }
}
