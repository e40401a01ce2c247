//! Entity state store
//!
//! Tracks the orders this harness created, which client each belongs to,
//! which item codes were added, and whether it was closed. Later workloads
//! resolve their order/item parameters from here.
//!
//! Every effective mutation rewrites the full snapshot on disk while the
//! store lock is held, so concurrent writers never interleave. The snapshot
//! is split across one JSON file per mapping:
//!
//! | file | content |
//! |---|---|
//! | `orders.json` | order ids |
//! | `order_items.json` | order id → item codes |
//! | `order_clients.json` | order id → client id |
//! | `order_created.json` | order id → creation time |
//! | `closed_orders.json` | closed order ids |

use crate::error::{StateError, StateResult};
use crate::{ClientId, OrderId};
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const ORDERS_FILE: &str = "orders.json";
const ORDER_ITEMS_FILE: &str = "order_items.json";
const ORDER_CLIENTS_FILE: &str = "order_clients.json";
const ORDER_CREATED_FILE: &str = "order_created.json";
const CLOSED_ORDERS_FILE: &str = "closed_orders.json";

/// One order created by the harness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub client_id: ClientId,
    pub items: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub closed: bool,
}

impl OrderRecord {
    fn new(order_id: OrderId, client_id: ClientId) -> Self {
        Self {
            order_id,
            client_id,
            items: BTreeSet::new(),
            created_at: Utc::now(),
            closed: false,
        }
    }
}

/// Persisted form of the store, one field per file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub orders: Vec<OrderId>,
    pub order_items: BTreeMap<OrderId, Vec<String>>,
    pub order_clients: BTreeMap<OrderId, ClientId>,
    pub order_created: BTreeMap<OrderId, DateTime<Utc>>,
    pub closed_orders: Vec<OrderId>,
}

impl StateSnapshot {
    fn from_records(records: &BTreeMap<OrderId, OrderRecord>) -> Self {
        let mut snapshot = StateSnapshot::default();
        for (id, record) in records {
            snapshot.orders.push(*id);
            snapshot
                .order_items
                .insert(*id, record.items.iter().cloned().collect());
            snapshot.order_clients.insert(*id, record.client_id);
            snapshot.order_created.insert(*id, record.created_at);
            if record.closed {
                snapshot.closed_orders.push(*id);
            }
        }
        snapshot
    }

    /// Rebuild records. The order list is authoritative: map entries for
    /// unknown orders are dropped, and an order without a known client is
    /// dropped too since nothing can be resolved for it.
    fn into_records(self) -> BTreeMap<OrderId, OrderRecord> {
        let closed: BTreeSet<OrderId> = self.closed_orders.into_iter().collect();
        let mut records = BTreeMap::new();

        for id in self.orders {
            let Some(client_id) = self.order_clients.get(&id).copied() else {
                warn!(order_id = id, "Dropping persisted order without client");
                continue;
            };
            let items = self
                .order_items
                .get(&id)
                .map(|codes| codes.iter().cloned().collect())
                .unwrap_or_default();
            let created_at = self.order_created.get(&id).copied().unwrap_or_else(Utc::now);

            records.insert(
                id,
                OrderRecord {
                    order_id: id,
                    client_id,
                    items,
                    created_at,
                    closed: closed.contains(&id),
                },
            );
        }
        records
    }
}

/// Concurrency-safe store of created orders, optionally backed by a directory
#[derive(Debug)]
pub struct EntityStateStore {
    records: Mutex<BTreeMap<OrderId, OrderRecord>>,
    dir: Option<PathBuf>,
}

impl EntityStateStore {
    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            dir: None,
        }
    }

    /// Open the store persisted in `dir`.
    ///
    /// Never fails: a missing snapshot starts empty, an unreadable or
    /// corrupt one is reported and replaced by empty state.
    pub async fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let records = match load_snapshot(&dir).await {
            Ok(Some(snapshot)) => {
                let records = snapshot.into_records();
                info!(
                    "Loaded {} orders from state directory {}",
                    records.len(),
                    dir.display()
                );
                records
            }
            Ok(None) => {
                info!("No saved state in {}, starting empty", dir.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("{}; starting with empty state", e);
                BTreeMap::new()
            }
        };

        Self {
            records: Mutex::new(records),
            dir: Some(dir),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Insert a new order. Returns false, without touching the stored
    /// client, if the order is already known.
    pub async fn record_order_created(
        &self,
        order_id: OrderId,
        client_id: ClientId,
    ) -> StateResult<bool> {
        let mut records = self.records.lock().await;
        if records.contains_key(&order_id) {
            return Ok(false);
        }
        records.insert(order_id, OrderRecord::new(order_id, client_id));
        debug!(order_id, client_id, "Order recorded");
        self.persist(&records).await?;
        Ok(true)
    }

    /// Add `code` to the order's items. Returns false when the order is
    /// unknown or already holds the code.
    pub async fn record_item_added(&self, order_id: OrderId, code: &str) -> StateResult<bool> {
        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(&order_id) else {
            return Ok(false);
        };
        if !record.items.insert(code.to_string()) {
            return Ok(false);
        }
        self.persist(&records).await?;
        Ok(true)
    }

    /// Remove `code` from the order's items. Returns false if it was absent.
    pub async fn record_item_removed(&self, order_id: OrderId, code: &str) -> StateResult<bool> {
        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(&order_id) else {
            return Ok(false);
        };
        if !record.items.remove(code) {
            return Ok(false);
        }
        self.persist(&records).await?;
        Ok(true)
    }

    /// Mark an order closed. Returns false if unknown or already closed.
    pub async fn record_order_closed(&self, order_id: OrderId) -> StateResult<bool> {
        let mut records = self.records.lock().await;
        let Some(record) = records.get_mut(&order_id) else {
            return Ok(false);
        };
        if record.closed {
            return Ok(false);
        }
        record.closed = true;
        self.persist(&records).await?;
        Ok(true)
    }

    /// Any known order
    pub async fn pick_random_order(&self) -> Option<OrderId> {
        let records = self.records.lock().await;
        let ids: Vec<OrderId> = records.keys().copied().collect();
        choose(&ids).copied()
    }

    /// An order that has not been closed, with its client
    pub async fn pick_random_open_order(&self) -> Option<(OrderId, ClientId)> {
        let records = self.records.lock().await;
        let open: Vec<(OrderId, ClientId)> = records
            .values()
            .filter(|r| !r.closed)
            .map(|r| (r.order_id, r.client_id))
            .collect();
        choose(&open).copied()
    }

    /// One item code of `order_id`
    pub async fn pick_random_item(&self, order_id: OrderId) -> Option<String> {
        let records = self.records.lock().await;
        let items: Vec<&String> = records.get(&order_id)?.items.iter().collect();
        choose(&items).map(|code| (*code).clone())
    }

    /// An open order holding at least one item, with one of its item codes
    pub async fn pick_random_order_with_item(&self) -> Option<(OrderId, String)> {
        let records = self.records.lock().await;
        let candidates: Vec<&OrderRecord> = records
            .values()
            .filter(|r| !r.closed && !r.items.is_empty())
            .collect();
        let record = choose(&candidates)?;
        let items: Vec<&String> = record.items.iter().collect();
        choose(&items).map(|code| (record.order_id, (*code).clone()))
    }

    pub async fn client_of(&self, order_id: OrderId) -> Option<ClientId> {
        self.records.lock().await.get(&order_id).map(|r| r.client_id)
    }

    pub async fn get(&self, order_id: OrderId) -> Option<OrderRecord> {
        self.records.lock().await.get(&order_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::from_records(&*self.records.lock().await)
    }

    /// Forget every order, in memory and on disk
    pub async fn reset(&self) -> StateResult<()> {
        let mut records = self.records.lock().await;
        records.clear();
        self.persist(&records).await
    }

    /// Write the full snapshot. Caller holds the lock.
    ///
    /// Every file is staged before any rename; `orders.json` is renamed last
    /// so an interrupted write never lists an order whose maps are missing.
    async fn persist(&self, records: &BTreeMap<OrderId, OrderRecord>) -> StateResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let snapshot = StateSnapshot::from_records(records);

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StateError::Persist {
                path: dir.clone(),
                source,
            })?;

        let mut staged = Vec::with_capacity(5);
        let staging = async {
            staged.push(stage_json(&dir.join(ORDER_ITEMS_FILE), &snapshot.order_items).await?);
            staged.push(stage_json(&dir.join(ORDER_CLIENTS_FILE), &snapshot.order_clients).await?);
            staged.push(stage_json(&dir.join(ORDER_CREATED_FILE), &snapshot.order_created).await?);
            staged.push(stage_json(&dir.join(CLOSED_ORDERS_FILE), &snapshot.closed_orders).await?);
            staged.push(stage_json(&dir.join(ORDERS_FILE), &snapshot.orders).await?);
            StateResult::Ok(())
        }
        .await;

        if let Err(e) = staging {
            for (tmp, _) in &staged {
                let _ = tokio::fs::remove_file(tmp).await;
            }
            return Err(e);
        }

        for (tmp, path) in staged {
            tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|source| StateError::Persist { path, source })?;
        }
        Ok(())
    }
}

/// Read the snapshot in `dir`. `Ok(None)` when no order list exists yet;
/// the other files are optional.
pub async fn load_snapshot(dir: &Path) -> StateResult<Option<StateSnapshot>> {
    let Some(orders) = read_json(&dir.join(ORDERS_FILE)).await? else {
        return Ok(None);
    };

    Ok(Some(StateSnapshot {
        orders,
        order_items: read_json(&dir.join(ORDER_ITEMS_FILE)).await?.unwrap_or_default(),
        order_clients: read_json(&dir.join(ORDER_CLIENTS_FILE)).await?.unwrap_or_default(),
        order_created: read_json(&dir.join(ORDER_CREATED_FILE)).await?.unwrap_or_default(),
        closed_orders: read_json(&dir.join(CLOSED_ORDERS_FILE)).await?.unwrap_or_default(),
    }))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StateResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StateError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` next to `path` as a temporary file. Returns the temporary
/// and final paths; the caller renames.
async fn stage_json<T: Serialize>(path: &Path, value: &T) -> StateResult<(PathBuf, PathBuf)> {
    let content = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");

    tokio::fs::write(&tmp, content)
        .await
        .map_err(|source| StateError::Persist {
            path: tmp.clone(),
            source,
        })?;
    Ok((tmp, path.to_path_buf()))
}

fn choose<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::rng())
}
