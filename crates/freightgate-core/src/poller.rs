//! Shipment status polling
//!
//! Walks every non-terminal order on a fixed interval, asks the order's
//! carrier for tracking history, and persists the mapped status when it
//! changed. One bad order never aborts a cycle; it is counted and the batch
//! continues. Orders inside a cycle run on a bounded worker pool and every
//! carrier call goes through the per-carrier rate limiter.
//!
//! `run_cycle` is public so behavior is testable without wall-clock waits;
//! `spawn` owns the interval loop and runs the first cycle immediately.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::correlate::extract_correlation_keys;
use crate::error::Error;
use crate::gateway::CarrierGateway;
use crate::ratelimit::CarrierRateLimiter;
use crate::status::map_history_response;
use crate::store::OrderStore;
use crate::types::ShipmentOrder;

/// Outcome counts for one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Orders whose status changed and was persisted.
    pub updated: usize,
    /// Orders polled whose status came back the same; nothing written.
    pub unchanged: usize,
    /// Orders not polled at all: no correlation keys yet, or no stored
    /// carrier token.
    pub skipped: usize,
    /// Orders whose carrier call or store write failed.
    pub errored: usize,
    /// Orders examined.
    pub total: usize,
}

enum OrderOutcome {
    Updated,
    Unchanged,
    Skipped,
    Errored,
}

/// Periodic status poller.
pub struct StatusPoller {
    store: Arc<dyn OrderStore>,
    gateway: CarrierGateway,
    limiter: Arc<CarrierRateLimiter>,
    interval: Duration,
    workers: usize,
}

/// Handle to a spawned poller; dropping it does not stop the loop.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal shutdown and wait for the loop to finish its current cycle.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl StatusPoller {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: CarrierGateway,
        limiter: Arc<CarrierRateLimiter>,
        interval: Duration,
        workers: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            limiter,
            interval,
            workers: workers.max(1),
        }
    }

    /// Run one full poll cycle and report what happened.
    pub async fn run_cycle(&self) -> CycleSummary {
        let orders = match self.store.find_pollable().await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "failed to load pollable orders");
                return CycleSummary::default();
            }
        };

        let total = orders.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for order in orders {
            let permit = semaphore.clone();
            let store = self.store.clone();
            let gateway = self.gateway.clone();
            let limiter = self.limiter.clone();
            tasks.spawn(async move {
                // Closing the semaphore is not possible here; acquire cannot fail.
                let _permit = permit.acquire_owned().await.expect("semaphore open");
                poll_order(store, gateway, limiter, order).await
            });
        }

        let mut summary = CycleSummary {
            total,
            ..CycleSummary::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(OrderOutcome::Updated) => summary.updated += 1,
                Ok(OrderOutcome::Unchanged) => summary.unchanged += 1,
                Ok(OrderOutcome::Skipped) => summary.skipped += 1,
                Ok(OrderOutcome::Errored) | Err(_) => summary.errored += 1,
            }
        }

        tracing::info!(
            updated = summary.updated,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            errored = summary.errored,
            total = summary.total,
            "status poll cycle finished"
        );
        summary
    }

    /// Start the polling loop: one cycle immediately, then one per interval
    /// tick until shutdown.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // First tick fires immediately, giving the startup cycle.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cycle().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("status poller shutting down");
                        return;
                    }
                }
            }
        });
        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

async fn poll_order(
    store: Arc<dyn OrderStore>,
    gateway: CarrierGateway,
    limiter: Arc<CarrierRateLimiter>,
    order: ShipmentOrder,
) -> OrderOutcome {
    let keys = extract_correlation_keys(&order);
    if keys.is_empty() {
        tracing::debug!(order_id = order.id, "no correlation keys yet, skipping");
        return OrderOutcome::Skipped;
    }

    let carrier = order.carrier().to_string();
    let token = match store.token_for(&carrier).await {
        Ok(Some(token)) => token,
        Ok(None) => {
            tracing::warn!(order_id = order.id, carrier, "no stored token, skipping");
            return OrderOutcome::Skipped;
        }
        Err(e) => {
            tracing::warn!(order_id = order.id, error = %e, "token lookup failed");
            return OrderOutcome::Errored;
        }
    };

    limiter.wait_for_permit(&carrier).await;

    let response = match gateway
        .get_shipment_history(&carrier, Some(&token), &keys.to_params())
        .await
    {
        Ok(response) => response,
        // None of this order's keys matched what the endpoint declares.
        Err(Error::Validation { .. }) => {
            tracing::debug!(order_id = order.id, carrier, "no usable tracking keys, skipping");
            return OrderOutcome::Skipped;
        }
        Err(e) => {
            tracing::warn!(order_id = order.id, carrier, error = %e, "history lookup failed");
            return OrderOutcome::Errored;
        }
    };

    let next = map_history_response(&response);
    if next == order.status {
        return OrderOutcome::Unchanged;
    }

    match store.update_status(order.id, next.clone()).await {
        Ok(()) => {
            tracing::info!(order_id = order.id, status = %next, "shipment status updated");
            OrderOutcome::Updated
        }
        Err(e) => {
            tracing::warn!(order_id = order.id, error = %e, "status write failed");
            OrderOutcome::Errored
        }
    }
}
