use orderload_config::CascadeConfig;
use orderload_engine::{
    DispatchError, Dispatcher, EntityStateStore, OutcomeKind, RequestTarget, Resolution,
    ResolvedRequest, Resolver, ResultsAggregator, StaticPools, Workload, WorkloadOutcome,
};
use orderload_http::{ApiRequest, ApiTransport, HttpMethod, MockTransport};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    mock: Arc<MockTransport>,
    store: Arc<EntityStateStore>,
    results: Arc<ResultsAggregator>,
    resolver: Arc<Resolver>,
    dispatcher: Dispatcher,
}

fn harness(mock: MockTransport, min_items: usize, max_items: usize) -> Harness {
    harness_with(mock, EntityStateStore::in_memory(), false, min_items, max_items)
}

fn harness_with(
    mock: MockTransport,
    store: EntityStateStore,
    static_order_fallback: bool,
    min_items: usize,
    max_items: usize,
) -> Harness {
    let mock = Arc::new(mock);
    let store = Arc::new(store);
    let results = Arc::new(ResultsAggregator::new());
    let pools = StaticPools::with_product_codes(vec!["P-1".to_string()]).unwrap();
    let resolver = Arc::new(
        Resolver::new(pools, Arc::clone(&store)).with_static_order_fallback(static_order_fallback),
    );
    let dispatcher = Dispatcher::new(
        Arc::clone(&mock) as Arc<dyn ApiTransport>,
        Arc::clone(&store),
        Arc::clone(&results),
        Arc::clone(&resolver),
        CascadeConfig {
            min_items,
            max_items,
        },
    );
    Harness {
        mock,
        store,
        results,
        resolver,
        dispatcher,
    }
}

async fn ready(resolver: &Resolver, workload: Workload) -> ResolvedRequest {
    match resolver.resolve(workload).await {
        Resolution::Ready(request) => request,
        Resolution::Skip { reason, .. } => panic!("{} skipped: {}", workload, reason),
    }
}

#[tokio::test]
async fn test_empty_store_skips_store_only_workloads() {
    let h = harness(MockTransport::new(), 1, 1);

    for workload in Workload::ALL {
        let resolution = h.resolver.resolve(workload).await;
        if workload.requires_stored_order() {
            assert!(
                matches!(resolution, Resolution::Skip { .. }),
                "{} should skip on an empty store",
                workload
            );
        } else {
            assert!(matches!(resolution, Resolution::Ready(_)));
        }
    }

    assert_eq!(h.mock.request_count(), 0);
    assert_eq!(h.results.report().total_requests, 0);
}

#[tokio::test]
async fn test_static_order_fallback_only_covers_read_only_workloads() {
    let h = harness_with(MockTransport::new(), EntityStateStore::in_memory(), true, 1, 1);

    for workload in Workload::ALL {
        let resolution = h.resolver.resolve(workload).await;
        let ready = matches!(resolution, Resolution::Ready(_));
        let expected = !workload.requires_stored_order() || workload.accepts_static_order();
        assert_eq!(ready, expected, "{}", workload);
    }
}

#[tokio::test]
async fn test_unpersisted_state_does_not_fail_the_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("state");
    std::fs::write(&blocked, "not a directory").unwrap();

    let mock = MockTransport::new();
    mock.respond_json(
        HttpMethod::Post,
        "/Pedido/Criar",
        201,
        json!({"pedidoNumero": 88, "CodCliente": 6}),
    );
    mock.respond_json(HttpMethod::Post, "/Pedido/adicionarItem", 200, json!({}));
    let h = harness_with(mock, EntityStateStore::open(&blocked).await, false, 1, 1);

    let request = ready(&h.resolver, Workload::CreateOrder).await;
    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    let record = h.store.get(88).await.unwrap();
    assert_eq!(record.client_id, 6);
    assert!(record.items.contains("P-1"));
    assert_eq!(h.results.report().errors, 0);
    assert!(blocked.is_file());
}

#[tokio::test]
async fn test_created_order_triggers_add_item_cascade() {
    let mock = MockTransport::new();
    mock.respond_json(
        HttpMethod::Post,
        "/Pedido/Criar",
        201,
        json!({"pedidoNumero": 77, "CodCliente": 5}),
    );
    mock.respond_json(HttpMethod::Post, "/Pedido/adicionarItem", 200, json!({}));
    let h = harness(mock, 2, 4);

    let request = ready(&h.resolver, Workload::CreateOrder).await;
    let (outcome, _elapsed) = h.dispatcher.dispatch(request).await;

    assert_eq!(
        outcome,
        WorkloadOutcome::Success {
            message: "order 77 created for client 5".to_string()
        }
    );

    let record = h.store.get(77).await.unwrap();
    assert_eq!(record.client_id, 5);
    assert!(record.items.contains("P-1"));

    let cascade = h.mock.requests_to("/Pedido/adicionarItem");
    assert!((2..=4).contains(&cascade.len()), "cascade of {}", cascade.len());
    for request in &cascade {
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["nroPedido"], 77);
        assert_eq!(body["CodCliente"], 5);
        assert_eq!(body["codigo"], "P-1");
    }

    let report = h.results.report();
    assert_eq!(report.total_requests, 1 + cascade.len() as u64);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn test_create_without_order_number_records_nothing() {
    let mock = MockTransport::new();
    mock.respond_json(HttpMethod::Post, "/Pedido/Criar", 200, json!({"status": "ok"}));
    let h = harness(mock, 1, 1);

    let request = ready(&h.resolver, Workload::CreateOrder).await;
    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert!(h.store.is_empty().await);
    assert_eq!(h.mock.request_count(), 1);
}

#[tokio::test]
async fn test_missing_item_on_delete_is_soft_and_reconciles() {
    let mock = MockTransport::new();
    mock.respond_json(
        HttpMethod::Delete,
        "/Pedido/excluirItem",
        404,
        json!({"message": "Item not found"}),
    );
    let h = harness(mock, 1, 1);
    h.store.record_order_created(77, 5).await.unwrap();
    h.store.record_item_added(77, "P-1").await.unwrap();

    let request = ready(&h.resolver, Workload::RemoveItem).await;
    assert_eq!(request.request.path, "/Pedido/excluirItem/77/P-1");

    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert!(outcome.counts_as_success());
    assert_eq!(outcome.kind(), OutcomeKind::SoftFailure);
    let message = outcome.message();
    assert!(message.contains("77"), "{}", message);
    assert!(message.contains("P-1"), "{}", message);

    assert!(h.store.get(77).await.unwrap().items.is_empty());
    assert_eq!(h.results.report().success_rate_display(), "100.00%");
}

#[tokio::test]
async fn test_close_rejected_for_client_change_keeps_order_open() {
    let mock = MockTransport::new();
    mock.respond_json(
        HttpMethod::Post,
        "/Pedido/fecharPedido",
        400,
        json!({"message": "Client changed, order cannot be closed"}),
    );
    let h = harness(mock, 1, 1);
    h.store.record_order_created(77, 5).await.unwrap();

    let request = ready(&h.resolver, Workload::CloseOrder).await;
    assert_eq!(request.request.body.as_ref().unwrap()["CodCliente"], 5);

    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(outcome.kind(), OutcomeKind::SoftFailure);
    assert!(!h.store.get(77).await.unwrap().closed);
    assert_eq!(h.store.pick_random_open_order().await, Some((77, 5)));
}

#[tokio::test]
async fn test_closed_order_leaves_the_open_pool() {
    let mock = MockTransport::new();
    mock.respond_json(HttpMethod::Post, "/Pedido/fecharPedido", 200, json!({}));
    let h = harness(mock, 1, 1);
    h.store.record_order_created(77, 5).await.unwrap();

    let request = ready(&h.resolver, Workload::CloseOrder).await;
    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(outcome.kind(), OutcomeKind::Success);
    assert!(h.store.get(77).await.unwrap().closed);
    assert!(matches!(
        h.resolver.resolve(Workload::AddItem).await,
        Resolution::Skip { .. }
    ));
}

#[tokio::test]
async fn test_unsupported_method_is_never_sent() {
    let h = harness(MockTransport::new(), 1, 1);
    let request = ResolvedRequest {
        workload: Workload::OrderTotal,
        request: ApiRequest::new(HttpMethod::Patch, "/Pedido/totalPedido/1"),
        target: RequestTarget::order(1),
    };

    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(
        outcome,
        WorkloadOutcome::HardFailure(DispatchError::Validation("PATCH".to_string()))
    );
    assert_eq!(h.mock.request_count(), 0);
    assert_eq!(h.results.report().errors, 1);
}

#[tokio::test]
async fn test_transport_failure_is_a_hard_failure() {
    let mock = MockTransport::new();
    mock.fail(HttpMethod::Get, "/Pedido/totalPedido", "connection refused");
    let h = harness(mock, 1, 1);
    h.store.record_order_created(1, 1).await.unwrap();

    let request = ready(&h.resolver, Workload::OrderTotal).await;
    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(outcome.kind(), OutcomeKind::TransportError);
    assert!(outcome.message().contains("connection refused"));

    let snapshot = h.results.snapshot();
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.outcomes[0].status, None);
}

#[tokio::test]
async fn test_unexpected_status_keeps_the_body() {
    let mock = MockTransport::new();
    mock.respond_text(HttpMethod::Get, "/Pedido/totalPedido", 500, "boom");
    let h = harness(mock, 1, 1);
    h.store.record_order_created(1, 1).await.unwrap();

    let request = ready(&h.resolver, Workload::OrderTotal).await;
    let (outcome, _) = h.dispatcher.dispatch(request).await;

    assert_eq!(
        outcome,
        WorkloadOutcome::HardFailure(DispatchError::Protocol {
            status: 500,
            body: "boom".to_string()
        })
    );
    assert_eq!(h.results.snapshot().outcomes[0].status, Some(500));
}
