//! Workload catalog
//!
//! [`Workload`] is the closed set of endpoint templates the harness drives.
//! Each variant knows its method, its path template and where its
//! parameters come from; [`Resolver`] turns a variant into a concrete
//! request or a skip.

mod pools;
mod resolve;

pub use pools::StaticPools;
pub use resolve::{RequestTarget, Resolution, ResolvedRequest, Resolver};

use crate::error::CatalogError;
use orderload_http::HttpMethod;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workload {
    CreateOrder,
    ListOpenOrders,
    OrderTotal,
    PrintOrder,
    PrintRegistrationForm,
    ProductLookup,
    AddItem,
    RemoveItem,
    ChangeQuantity,
    CloseOrder,
    RecoverObservation,
}

impl Workload {
    pub const ALL: [Workload; 11] = [
        Workload::CreateOrder,
        Workload::ListOpenOrders,
        Workload::OrderTotal,
        Workload::PrintOrder,
        Workload::PrintRegistrationForm,
        Workload::ProductLookup,
        Workload::AddItem,
        Workload::RemoveItem,
        Workload::ChangeQuantity,
        Workload::CloseOrder,
        Workload::RecoverObservation,
    ];

    /// Name used in configuration and in the results snapshot
    pub fn name(&self) -> &'static str {
        match self {
            Workload::CreateOrder => "create_order",
            Workload::ListOpenOrders => "list_open_orders",
            Workload::OrderTotal => "order_total",
            Workload::PrintOrder => "print_order",
            Workload::PrintRegistrationForm => "print_registration_form",
            Workload::ProductLookup => "product_lookup",
            Workload::AddItem => "add_item",
            Workload::RemoveItem => "remove_item",
            Workload::ChangeQuantity => "change_quantity",
            Workload::CloseOrder => "close_order",
            Workload::RecoverObservation => "recover_observation",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Workload::ListOpenOrders | Workload::OrderTotal | Workload::RecoverObservation => {
                HttpMethod::Get
            }
            Workload::CreateOrder
            | Workload::PrintOrder
            | Workload::PrintRegistrationForm
            | Workload::ProductLookup
            | Workload::AddItem
            | Workload::CloseOrder => HttpMethod::Post,
            Workload::ChangeQuantity => HttpMethod::Put,
            Workload::RemoveItem => HttpMethod::Delete,
        }
    }

    pub fn path_template(&self) -> &'static str {
        match self {
            Workload::CreateOrder => "/Pedido/Criar",
            Workload::ListOpenOrders => "/Pedido/listarPedidosAbertos/{codRepresentante}",
            Workload::OrderTotal => "/Pedido/totalPedido/{nroPedido}",
            Workload::PrintOrder => "/Pedido/imprime",
            Workload::PrintRegistrationForm => "/Pedido/imprimeFichaCadastral",
            Workload::ProductLookup => "/Produto/busca",
            Workload::AddItem => "/Pedido/adicionarItem",
            Workload::RemoveItem => "/Pedido/excluirItem/{nroPedido}/{codigo}",
            Workload::ChangeQuantity => "/Pedido/alterarQuantidade",
            Workload::CloseOrder => "/Pedido/fecharPedido/{nroPedido}",
            Workload::RecoverObservation => "/Pedido/recuperarObservacao/{nroPedido}",
        }
    }

    /// Workloads that need an order from the store; with none eligible they
    /// are skipped
    pub fn requires_stored_order(&self) -> bool {
        !matches!(self, Workload::CreateOrder | Workload::ListOpenOrders)
    }

    /// Read-only workloads that may fall back to pre-existing target orders
    /// when `load.static_order_fallback` is on
    pub fn accepts_static_order(&self) -> bool {
        matches!(
            self,
            Workload::OrderTotal
                | Workload::PrintOrder
                | Workload::PrintRegistrationForm
                | Workload::ProductLookup
        )
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Workload {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Workload::ALL
            .into_iter()
            .find(|w| w.name() == wanted)
            .ok_or_else(|| CatalogError::UnknownWorkload(s.to_string()))
    }
}

/// Substitute `{placeholder}` segments of a path template
pub fn render_path(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |path, (key, value)| {
        path.replace(&format!("{{{}}}", key), value)
    })
}

/// The workload mix sampled by the scheduler
#[derive(Debug, Clone)]
pub struct WorkloadCatalog {
    workloads: Vec<Workload>,
}

impl WorkloadCatalog {
    /// Every workload
    pub fn all() -> Self {
        Self {
            workloads: Workload::ALL.to_vec(),
        }
    }

    /// Build the mix from configured names; an empty list means every workload
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Ok(Self::all());
        }
        let workloads = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Workload>, _>>()?;
        Self::new(workloads)
    }

    pub fn new(workloads: Vec<Workload>) -> Result<Self, CatalogError> {
        if workloads.is_empty() {
            return Err(CatalogError::EmptyWorkloadMix);
        }
        Ok(Self { workloads })
    }

    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    /// Draw `count` independent workloads, uniformly and with replacement
    pub fn sample(&self, count: usize) -> Vec<Workload> {
        let mut rng = rand::rng();
        (0..count)
            .filter_map(|_| self.workloads.choose(&mut rng).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_names_round_trip() {
        for workload in Workload::ALL {
            assert_eq!(workload.name().parse::<Workload>().unwrap(), workload);
        }
        assert_eq!("Create-Order".parse::<Workload>().unwrap(), Workload::CreateOrder);
        assert!("drop_table".parse::<Workload>().is_err());
    }

    #[test]
    fn test_dispatchable_methods_only() {
        for workload in Workload::ALL {
            assert!(matches!(
                workload.method(),
                HttpMethod::Get | HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete
            ));
        }
    }

    #[test]
    fn test_render_path() {
        let path = render_path(
            Workload::RemoveItem.path_template(),
            &[("nroPedido", "77".to_string()), ("codigo", "P-1".to_string())],
        );
        assert_eq!(path, "/Pedido/excluirItem/77/P-1");
    }

    #[test]
    fn test_catalog_from_names() {
        let catalog = WorkloadCatalog::from_names(&["add_item", "close_order"]).unwrap();
        assert_eq!(catalog.workloads(), &[Workload::AddItem, Workload::CloseOrder]);

        let empty: [&str; 0] = [];
        assert_eq!(WorkloadCatalog::from_names(&empty).unwrap().workloads().len(), 11);

        assert!(matches!(
            WorkloadCatalog::from_names(&["nope"]),
            Err(CatalogError::UnknownWorkload(_))
        ));
        assert!(matches!(
            WorkloadCatalog::new(Vec::new()),
            Err(CatalogError::EmptyWorkloadMix)
        ));
    }

    #[test]
    fn test_sample_draws_from_mix() {
        let catalog = WorkloadCatalog::new(vec![Workload::OrderTotal]).unwrap();
        let sample = catalog.sample(5);
        assert_eq!(sample, vec![Workload::OrderTotal; 5]);
    }
}
