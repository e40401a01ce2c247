//! Request dispatch
//!
//! One call in, one `(outcome, elapsed)` pair out. Failures of any kind end
//! up in the outcome; nothing here can interrupt a run.

use crate::catalog::{ResolvedRequest, Resolver, Workload};
use crate::classify::{classify, Classification, SoftRejection};
use crate::error::StateError;
use crate::outcome::{DispatchError, WorkloadOutcome};
use crate::results::ResultsAggregator;
use crate::state::EntityStateStore;
use crate::{ClientId, OrderId};
use orderload_config::CascadeConfig;
use orderload_http::{ApiResponse, ApiTransport, HttpError, HttpMethod};
use rand::Rng;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Response fields that may carry the number of a created order
const ORDER_ID_FIELDS: [&str; 4] = ["pedidoNumero", "nroPedido", "NroPedido", "numero"];
const CLIENT_ID_FIELDS: [&str; 2] = ["CodCliente", "codCliente"];

/// Fail requests whose method the harness does not drive
pub fn ensure_dispatchable(method: HttpMethod) -> Result<(), DispatchError> {
    match method {
        HttpMethod::Get | HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete => Ok(()),
        other => Err(DispatchError::Validation(other.to_string())),
    }
}

struct Exchange {
    outcome: WorkloadOutcome,
    elapsed: Duration,
    created_order: Option<(OrderId, ClientId)>,
}

pub struct Dispatcher {
    transport: Arc<dyn ApiTransport>,
    store: Arc<EntityStateStore>,
    results: Arc<ResultsAggregator>,
    resolver: Arc<Resolver>,
    cascade: CascadeConfig,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<EntityStateStore>,
        results: Arc<ResultsAggregator>,
        resolver: Arc<Resolver>,
        cascade: CascadeConfig,
    ) -> Self {
        Self {
            transport,
            store,
            results,
            resolver,
            cascade,
        }
    }

    /// Execute one resolved request.
    ///
    /// A successful order creation is followed, before returning, by the
    /// add-item cascade for the new order. The returned pair describes the
    /// triggering request only; every cascade call is recorded on its own.
    pub async fn dispatch(&self, resolved: ResolvedRequest) -> (WorkloadOutcome, Duration) {
        let exchange = self.execute(&resolved).await;

        if let Some((order_id, client_id)) = exchange.created_order {
            self.run_cascade(order_id, client_id).await;
        }

        (exchange.outcome, exchange.elapsed)
    }

    async fn execute(&self, resolved: &ResolvedRequest) -> Exchange {
        let request = &resolved.request;
        let started = Instant::now();

        let sent = match ensure_dispatchable(request.method) {
            Ok(()) => self
                .transport
                .send(request)
                .await
                .map_err(transport_error),
            Err(e) => Err(e),
        };
        let elapsed = started.elapsed();

        let (outcome, status, created_order) = match sent {
            Ok(response) => {
                let (outcome, created) = self.apply(resolved, &response).await;
                (outcome, Some(response.status), created)
            }
            Err(e) => (WorkloadOutcome::HardFailure(e), None, None),
        };

        self.results
            .record(resolved.workload, request, &outcome, status, elapsed);
        narrate(resolved, &outcome, elapsed);

        Exchange {
            outcome,
            elapsed,
            created_order,
        }
    }

    /// Classify the response and apply its state effects
    async fn apply(
        &self,
        resolved: &ResolvedRequest,
        response: &ApiResponse,
    ) -> (WorkloadOutcome, Option<(OrderId, ClientId)>) {
        let target = &resolved.target;

        match classify(resolved.workload, response.status, &response.body) {
            Classification::Success => self.apply_success(resolved, response).await,

            Classification::Soft(rejection) => {
                if rejection == SoftRejection::ItemNotFound {
                    // The server says the item is gone; stop offering it
                    if let (Some(order_id), Some(code)) = (target.order_id, &target.item_code) {
                        self.update_state(self.store.record_item_removed(order_id, code).await);
                    }
                }
                let reason = match target.describe() {
                    Some(context) => format!("{} ({})", rejection.reason(), context),
                    None => rejection.reason().to_string(),
                };
                (WorkloadOutcome::SoftFailure { reason }, None)
            }

            Classification::Unexpected => (
                WorkloadOutcome::HardFailure(DispatchError::Protocol {
                    status: response.status,
                    body: response.body.text(),
                }),
                None,
            ),
        }
    }

    async fn apply_success(
        &self,
        resolved: &ResolvedRequest,
        response: &ApiResponse,
    ) -> (WorkloadOutcome, Option<(OrderId, ClientId)>) {
        let target = &resolved.target;
        let mut created = None;

        let message = match (resolved.workload, target.order_id, &target.item_code) {
            (Workload::CreateOrder, _, _) => {
                let body = response.body.json();
                let order_id = body.and_then(|json| parse_id(json, &ORDER_ID_FIELDS));
                let client_id = body
                    .and_then(|json| parse_id(json, &CLIENT_ID_FIELDS))
                    .or(target.client_id);

                match (order_id, client_id) {
                    (Some(order_id), Some(client_id)) => {
                        self.update_state(
                            self.store.record_order_created(order_id, client_id).await,
                        );
                        created = Some((order_id, client_id));
                        format!("order {} created for client {}", order_id, client_id)
                    }
                    _ => "order created, no order number in response".to_string(),
                }
            }

            (Workload::AddItem, Some(order_id), Some(code)) => {
                match self.store.record_item_added(order_id, code).await {
                    Ok(false) => format!("item {} already in order {}", code, order_id),
                    result => {
                        self.update_state(result);
                        format!("item {} added to order {}", code, order_id)
                    }
                }
            }

            (Workload::RemoveItem, Some(order_id), Some(code)) => {
                self.update_state(self.store.record_item_removed(order_id, code).await);
                format!("item {} removed from order {}", code, order_id)
            }

            (Workload::CloseOrder, Some(order_id), _) => {
                self.update_state(self.store.record_order_closed(order_id).await);
                format!("order {} closed", order_id)
            }

            _ => format!(
                "{} {} -> {}",
                resolved.request.method, resolved.request.path, response.status
            ),
        };

        (WorkloadOutcome::Success { message }, created)
    }

    async fn run_cascade(&self, order_id: OrderId, client_id: ClientId) {
        let count = self.cascade_size();
        debug!(order_id, client_id, count, "Starting add-item cascade");

        let mut added = 0;
        for _ in 0..count {
            let request = self.resolver.add_item_request(order_id, client_id);
            if self.execute(&request).await.outcome.counts_as_success() {
                added += 1;
            }
        }

        info!(
            "Cascade for order {}: {}/{} add-item requests succeeded",
            order_id, added, count
        );
    }

    fn cascade_size(&self) -> usize {
        rand::rng().random_range(self.cascade.min_items..=self.cascade.max_items)
    }

    /// State persistence failures never stop a run; the in-memory change stands
    fn update_state(&self, result: Result<bool, StateError>) {
        match result {
            Err(e) if e.is_recoverable() => warn!("State store update not persisted: {}", e),
            Err(e) => error!("State store update failed: {}", e),
            Ok(_) => {}
        }
    }
}

fn transport_error(error: HttpError) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Transport(format!("timeout: {}", error))
    } else {
        DispatchError::Transport(error.to_string())
    }
}

/// Read an integer id from the first present field, accepting numbers and
/// numeric strings. A bare numeric body is taken as the id itself.
fn parse_id(json: &JsonValue, fields: &[&str]) -> Option<i64> {
    if let Some(id) = json.as_i64() {
        return Some(id);
    }
    fields
        .iter()
        .filter_map(|field| json.get(field))
        .find_map(|value| match value {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

fn narrate(resolved: &ResolvedRequest, outcome: &WorkloadOutcome, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    match outcome {
        WorkloadOutcome::Success { message } => {
            info!("{} succeeded in {:.2} seconds: {}", resolved.workload, secs, message)
        }
        WorkloadOutcome::SoftFailure { reason } => {
            info!("{} soft failure in {:.2} seconds: {}", resolved.workload, secs, reason)
        }
        WorkloadOutcome::HardFailure(error) => warn!(
            "{} failed on {} {} after {:.2} seconds: {}",
            resolved.workload, resolved.request.method, resolved.request.path, secs, error
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_dispatchable() {
        assert!(ensure_dispatchable(HttpMethod::Get).is_ok());
        assert!(ensure_dispatchable(HttpMethod::Delete).is_ok());
        assert_eq!(
            ensure_dispatchable(HttpMethod::Patch),
            Err(DispatchError::Validation("PATCH".to_string()))
        );
        assert!(ensure_dispatchable(HttpMethod::Options).is_err());
    }

    #[test]
    fn test_parse_id_variants() {
        assert_eq!(parse_id(&json!({"pedidoNumero": 77}), &ORDER_ID_FIELDS), Some(77));
        assert_eq!(parse_id(&json!({"nroPedido": " 12 "}), &ORDER_ID_FIELDS), Some(12));
        assert_eq!(parse_id(&json!(501), &ORDER_ID_FIELDS), Some(501));
        assert_eq!(parse_id(&json!({"pedidoNumero": null}), &ORDER_ID_FIELDS), None);
        assert_eq!(parse_id(&json!({"pedidoNumero": "abc"}), &ORDER_ID_FIELDS), None);
        assert_eq!(parse_id(&json!({"CodCliente": 5}), &CLIENT_ID_FIELDS), Some(5));
    }
}
