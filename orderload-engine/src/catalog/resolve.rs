//! Parameter resolution

use super::{render_path, StaticPools, Workload};
use crate::payload::PayloadFiller;
use crate::state::EntityStateStore;
use crate::{ClientId, OrderId};
use orderload_http::ApiRequest;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Business entities a request refers to, for state updates and messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestTarget {
    pub order_id: Option<OrderId>,
    pub client_id: Option<ClientId>,
    pub item_code: Option<String>,
}

impl RequestTarget {
    pub fn order(order_id: OrderId) -> Self {
        Self {
            order_id: Some(order_id),
            ..Self::default()
        }
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_item(mut self, code: impl Into<String>) -> Self {
        self.item_code = Some(code.into());
        self
    }

    /// Short context suffix such as `order 77, item P-1`
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(order_id) = self.order_id {
            parts.push(format!("order {}", order_id));
        }
        if let Some(code) = &self.item_code {
            parts.push(format!("item {}", code));
        }
        if let Some(client_id) = self.client_id {
            parts.push(format!("client {}", client_id));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// A workload instance ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub workload: Workload,
    pub request: ApiRequest,
    pub target: RequestTarget,
}

/// Result of resolving one workload instance
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ready(ResolvedRequest),
    /// No eligible entity in the store; not an error, nothing is dispatched
    Skip {
        workload: Workload,
        reason: &'static str,
    },
}

/// Turns workloads into concrete requests
#[derive(Debug, Clone)]
pub struct Resolver {
    pools: StaticPools,
    store: Arc<EntityStateStore>,
    filler: PayloadFiller,
    static_order_fallback: bool,
}

impl Resolver {
    pub fn new(pools: StaticPools, store: Arc<EntityStateStore>) -> Self {
        Self {
            pools,
            store,
            filler: PayloadFiller::default(),
            static_order_fallback: false,
        }
    }

    /// Let read-only workloads use pre-existing orders on the target when
    /// the store has none
    pub fn with_static_order_fallback(mut self, enabled: bool) -> Self {
        self.static_order_fallback = enabled;
        self
    }

    pub fn pools(&self) -> &StaticPools {
        &self.pools
    }

    pub async fn resolve(&self, workload: Workload) -> Resolution {
        let resolved = match workload {
            Workload::CreateOrder => {
                let client_id = self.pools.random_client();
                let body = json!({
                    "CodRepresentante": self.pools.random_representative(),
                    "CodCliente": client_id,
                    "CodCondPagamento": self.pools.random_payment_condition(),
                    "CodTransportadora": self.pools.random_carrier(),
                    "DtPrevEntrega": self.filler.delivery_date(),
                });
                self.build(workload, &[], Some(body), RequestTarget::default().with_client(client_id))
            }

            Workload::ListOpenOrders => {
                let representative = self.pools.random_representative();
                self.build(
                    workload,
                    &[("codRepresentante", representative.to_string())],
                    None,
                    RequestTarget::default(),
                )
            }

            Workload::OrderTotal => {
                let Some(order_id) = self.order_or_known().await else {
                    return skip(workload, "no order in state store");
                };
                self.build(
                    workload,
                    &[("nroPedido", order_id.to_string())],
                    None,
                    RequestTarget::order(order_id),
                )
            }

            Workload::PrintOrder | Workload::PrintRegistrationForm => {
                let Some(order_id) = self.order_or_known().await else {
                    return skip(workload, "no order in state store");
                };
                let mut resolved = self.build(workload, &[], None, RequestTarget::order(order_id));
                resolved.request = resolved.request.with_query("nropedido", order_id);
                resolved
            }

            Workload::ProductLookup => {
                let Some(order_id) = self.order_or_known().await else {
                    return skip(workload, "no order in state store");
                };
                let code = self.pools.random_product_code();
                let body = json!({
                    "codigo": code,
                    "tabelaPreco": 1,
                    "nroPedido": order_id,
                });
                self.build(workload, &[], Some(body), RequestTarget::order(order_id).with_item(code))
            }

            Workload::AddItem => match self.store.pick_random_open_order().await {
                Some((order_id, client_id)) => self.add_item_request(order_id, client_id),
                None => return skip(workload, "no open order in state store"),
            },

            Workload::RemoveItem => match self.store.pick_random_order_with_item().await {
                Some((order_id, code)) => self.build(
                    workload,
                    &[("nroPedido", order_id.to_string()), ("codigo", code.clone())],
                    None,
                    RequestTarget::order(order_id).with_item(code),
                ),
                None => return skip(workload, "no order with items in state store"),
            },

            Workload::ChangeQuantity => match self.store.pick_random_order_with_item().await {
                Some((order_id, code)) => {
                    let body = json!({
                        "nroPedido": order_id,
                        "codigo": code,
                        "quantidade": self.filler.quantity(),
                    });
                    self.build(
                        workload,
                        &[],
                        Some(body),
                        RequestTarget::order(order_id).with_item(code),
                    )
                }
                None => return skip(workload, "no order with items in state store"),
            },

            Workload::CloseOrder => match self.store.pick_random_open_order().await {
                Some((order_id, client_id)) => {
                    let body = json!({
                        "nroPedido": order_id,
                        "CodCliente": client_id,
                    });
                    self.build(
                        workload,
                        &[("nroPedido", order_id.to_string())],
                        Some(body),
                        RequestTarget::order(order_id).with_client(client_id),
                    )
                }
                None => return skip(workload, "no open order in state store"),
            },

            Workload::RecoverObservation => match self.store.pick_random_order().await {
                Some(order_id) => self.build(
                    workload,
                    &[("nroPedido", order_id.to_string())],
                    None,
                    RequestTarget::order(order_id),
                ),
                None => return skip(workload, "no order in state store"),
            },
        };

        Resolution::Ready(resolved)
    }

    /// Add-item request for a known order; also used by the post-creation cascade
    pub fn add_item_request(&self, order_id: OrderId, client_id: ClientId) -> ResolvedRequest {
        let code = self.pools.random_product_code();
        let body = json!({
            "nroPedido": order_id,
            "codigo": code,
            "quantidade": self.filler.quantity(),
            "tabelaPreco": 1,
            "CodCliente": client_id,
        });
        self.build(
            Workload::AddItem,
            &[],
            Some(body),
            RequestTarget::order(order_id)
                .with_client(client_id)
                .with_item(code),
        )
    }

    /// Read-only workloads accept any stored order. Known target orders are
    /// used only when the fallback is enabled.
    async fn order_or_known(&self) -> Option<OrderId> {
        match self.store.pick_random_order().await {
            Some(order_id) => Some(order_id),
            None if self.static_order_fallback => Some(self.pools.random_known_order()),
            None => None,
        }
    }

    fn build(
        &self,
        workload: Workload,
        placeholders: &[(&str, String)],
        body: Option<serde_json::Value>,
        target: RequestTarget,
    ) -> ResolvedRequest {
        let path = render_path(workload.path_template(), placeholders);
        let mut request = ApiRequest::new(workload.method(), path);
        request.body = body;
        ResolvedRequest {
            workload,
            request,
            target,
        }
    }
}

fn skip(workload: Workload, reason: &'static str) -> Resolution {
    Resolution::Skip { workload, reason }
}
