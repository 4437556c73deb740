//! Order store boundary
//!
//! The core does not define how orders or carrier tokens are persisted; it
//! asks for this interface and nothing more. `MemoryOrderStore` is the
//! reference implementation used by tests and small deployments.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::status::ShipmentStatus;
use crate::types::{CarrierToken, ShipmentOrder};

/// Persistence boundary required by the gateway and poller.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders whose status is not yet terminal.
    async fn find_pollable(&self) -> Result<Vec<ShipmentOrder>>;

    /// Persist a status change for one order.
    async fn update_status(&self, id: i64, status: ShipmentStatus) -> Result<()>;

    /// Stored bearer token for a carrier, if any. Carrier matching is
    /// case-insensitive.
    async fn token_for(&self, carrier: &str) -> Result<Option<String>>;

    /// Upsert the carrier token: at most one row per carrier, last writer
    /// wins. Re-authenticating twice is harmless.
    async fn put_token(&self, carrier: &str, token: &str) -> Result<()>;
}

/// In-memory reference store.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<BTreeMap<i64, ShipmentOrder>>,
    tokens: RwLock<HashMap<String, CarrierToken>>,
    status_writes: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: ShipmentOrder) {
        self.orders.write().await.insert(order.id, order);
    }

    pub async fn get_order(&self, id: i64) -> Option<ShipmentOrder> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Number of status writes that actually hit storage. Lets callers and
    /// tests observe poller idempotence.
    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_pollable(&self) -> Result<Vec<ShipmentOrder>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: i64, status: ShipmentStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("order {id} not found")))?;
        if order.status.is_terminal() {
            // Delivered never reverts.
            tracing::debug!(order_id = id, "ignoring status write for delivered order");
            return Ok(());
        }
        order.status = status;
        order.updated_at = Utc::now();
        self.status_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn token_for(&self, carrier: &str) -> Result<Option<String>> {
        Ok(self
            .tokens
            .read()
            .await
            .get(&carrier.to_ascii_lowercase())
            .map(|t| t.token.clone()))
    }

    async fn put_token(&self, carrier: &str, token: &str) -> Result<()> {
        let key = carrier.to_ascii_lowercase();
        self.tokens.write().await.insert(
            key.clone(),
            CarrierToken {
                carrier_name: key,
                token: token.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(id: i64, status: ShipmentStatus) -> ShipmentOrder {
        ShipmentOrder {
            id,
            sku: format!("SKU-{id}"),
            marketplace_ref: format!("WM-{id}"),
            orders_meta: json!({}),
            rate_quote_result: json!({}),
            bol_result: json!({}),
            pickup_result: json!({}),
            status,
            uploads: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_pollable_excludes_delivered() {
        let store = MemoryOrderStore::new();
        store.insert_order(order(1, ShipmentStatus::Pending)).await;
        store.insert_order(order(2, ShipmentStatus::Delivered)).await;
        store.insert_order(order(3, ShipmentStatus::InTransit)).await;

        let pollable = store.find_pollable().await.unwrap();
        let ids: Vec<i64> = pollable.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_update_status_unknown_order_is_not_found() {
        let store = MemoryOrderStore::new();
        let err = store
            .update_status(99, ShipmentStatus::InTransit)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_delivered_never_reverts() {
        let store = MemoryOrderStore::new();
        store.insert_order(order(1, ShipmentStatus::Delivered)).await;
        store
            .update_status(1, ShipmentStatus::InTransit)
            .await
            .unwrap();
        assert_eq!(
            store.get_order(1).await.unwrap().status,
            ShipmentStatus::Delivered
        );
        assert_eq!(store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_token_upsert_is_last_writer_wins_case_insensitive() {
        let store = MemoryOrderStore::new();
        store.put_token("Estes", "first").await.unwrap();
        store.put_token("ESTES", "second").await.unwrap();
        assert_eq!(
            store.token_for("estes").await.unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(store.token_for("xpo").await.unwrap(), None);
    }
}
