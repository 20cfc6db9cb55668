//! Integration tests for the order lifecycle.
//!
//! These tests drive cart checkout, stock decrements and status changes
//! against the in-memory store.

use std::time::Duration;

use common::{ClientId, Money, OrderStatus};
use domain::{
    Cart, DomainError, InventoryLedger, OrderQueries, OrderService, OrderWorkflow, PlaceOrder,
    RetryPolicy, StockOutcome, StockPolicy, TransitionOrder,
};
use store::{InMemoryStore, InventoryItem, InventoryItemPatch, NewInventoryItem, OrderStoreExt};

fn new_item(name: &str, cents: i64, quantity: i64) -> NewInventoryItem {
    NewInventoryItem {
        name: name.to_string(),
        description: format!("{name} for testing"),
        category: "Office".to_string(),
        quantity,
        price: Money::from_cents(cents),
        minimum_stock_threshold: 2,
    }
}

fn service(store: &InMemoryStore) -> OrderService<InMemoryStore> {
    OrderService::new(store.clone()).with_retry(RetryPolicy::new(3, Duration::ZERO))
}

async fn seed(store: &InMemoryStore, name: &str, cents: i64, quantity: i64) -> InventoryItem {
    InventoryLedger::new(store.clone())
        .create(new_item(name, cents, quantity))
        .await
        .unwrap()
}

mod placing_orders {
    use super::*;

    #[tokio::test]
    async fn two_line_cart_becomes_pending_order() {
        let store = InMemoryStore::new();
        let a = seed(&store, "A", 1000, 10).await;
        let b = seed(&store, "B", 550, 10).await;

        let mut cart = Cart::new();
        cart.add(a.clone(), 2);
        cart.add(b.clone(), 1);
        cart.set_shipping_address("123 Main St");

        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart))
            .await
            .unwrap();

        assert_eq!(placed.order.total_amount, Money::from_cents(2550));
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert!(placed.fully_stocked());

        let lines = store.lines_for_order(placed.order_id()).await.unwrap();
        let mut prices: Vec<_> = lines.iter().map(|l| l.unit_price.cents()).collect();
        prices.sort();
        assert_eq!(prices, vec![550, 1000]);

        let ledger = InventoryLedger::new(store.clone());
        assert_eq!(ledger.get(a.id).await.unwrap().quantity, 8);
        assert_eq!(ledger.get(b.id).await.unwrap().quantity, 9);
    }

    #[tokio::test]
    async fn total_survives_later_price_changes() {
        let store = InMemoryStore::new();
        let a = seed(&store, "A", 1000, 10).await;

        let mut cart = Cart::new();
        cart.add(a.clone(), 3);
        cart.set_shipping_address("123 Main St");
        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart))
            .await
            .unwrap();

        InventoryLedger::new(store.clone())
            .update(
                a.id,
                InventoryItemPatch {
                    price: Some(Money::from_cents(5000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let lines = store.lines_for_order(placed.order_id()).await.unwrap();
        let line_sum: Money = lines.iter().map(|l| l.line_total()).sum();
        assert_eq!(line_sum, Money::from_cents(3000));
        assert_eq!(placed.order.total_amount, line_sum);
    }

    #[tokio::test]
    async fn strict_policy_flags_oversold_lines() {
        let store = InMemoryStore::new();
        let scarce = seed(&store, "Scarce", 100, 1).await;

        let mut cart = Cart::new();
        cart.add(scarce.clone(), 3);
        cart.set_shipping_address("5 Oak Ave");

        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart))
            .await
            .unwrap();

        assert!(!placed.fully_stocked());
        assert_eq!(
            placed.stock,
            vec![StockOutcome::Oversold {
                item_id: scarce.id,
                requested: 3,
                available: 1
            }]
        );
        assert_eq!(
            InventoryLedger::new(store.clone())
                .get(scarce.id)
                .await
                .unwrap()
                .quantity,
            1
        );
    }

    #[tokio::test]
    async fn clamp_policy_floors_stock_at_zero() {
        let store = InMemoryStore::new();
        let scarce = seed(&store, "Scarce", 100, 1).await;

        let mut cart = Cart::new();
        cart.add(scarce.clone(), 3);
        cart.set_shipping_address("5 Oak Ave");

        let placed = service(&store)
            .with_stock_policy(StockPolicy::Clamp)
            .place_order(PlaceOrder::new(ClientId::new(), cart))
            .await
            .unwrap();

        assert!(placed.fully_stocked());
        assert_eq!(
            placed.stock,
            vec![StockOutcome::Applied {
                item_id: scarce.id,
                remaining: 0
            }]
        );
    }

    #[tokio::test]
    async fn item_deleted_after_selection_is_reported_missing() {
        let store = InMemoryStore::new();
        let gone = seed(&store, "Gone", 100, 5).await;

        let mut cart = Cart::new();
        cart.add(gone.clone(), 1);
        cart.set_shipping_address("5 Oak Ave");
        InventoryLedger::new(store.clone())
            .delete(gone.id)
            .await
            .unwrap();

        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart))
            .await
            .unwrap();
        assert_eq!(placed.stock, vec![StockOutcome::Missing { item_id: gone.id }]);
    }
}

mod failure_modes {
    use super::*;

    fn cart_for(item: InventoryItem) -> Cart {
        let mut cart = Cart::new();
        cart.add(item, 1);
        cart.set_shipping_address("77 Bay St");
        cart
    }

    #[tokio::test]
    async fn header_failure_is_retryable_and_writes_nothing() {
        let store = InMemoryStore::non_transactional();
        let item = seed(&store, "Pen", 150, 4).await;
        store.set_fail_order_headers(true).await;

        let err = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart_for(item.clone())))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Persistence(_)));
        assert!(err.is_retryable());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(
            InventoryLedger::new(store.clone())
                .get(item.id)
                .await
                .unwrap()
                .quantity,
            4
        );
    }

    #[tokio::test]
    async fn line_failure_leaves_partial_order_for_reconciliation() {
        let store = InMemoryStore::non_transactional();
        let item = seed(&store, "Pen", 150, 4).await;
        store.set_fail_order_lines(true).await;

        let service = service(&store);
        let err = service
            .place_order(PlaceOrder::new(ClientId::new(), cart_for(item)))
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        let DomainError::PartialOrder { order_id, .. } = err else {
            panic!("expected a partial order, got {err:?}");
        };

        let partial = service.partial_orders().await.unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].id, order_id);
    }

    #[tokio::test]
    async fn transactional_store_never_leaves_partial_orders() {
        let store = InMemoryStore::new();
        let item = seed(&store, "Pen", 150, 4).await;
        store.set_fail_order_lines(true).await;

        let service = service(&store);
        let err = service
            .place_order(PlaceOrder::new(ClientId::new(), cart_for(item)))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Persistence(_)));
        assert!(service.partial_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transient_decrement_failures_are_retried() {
        let store = InMemoryStore::new();
        let item = seed(&store, "Pen", 150, 4).await;
        store.fail_next_decrements(2).await;

        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart_for(item.clone())))
            .await
            .unwrap();

        assert_eq!(
            placed.stock,
            vec![StockOutcome::Applied {
                item_id: item.id,
                remaining: 3
            }]
        );
    }

    #[tokio::test]
    async fn exhausted_retries_keep_the_order() {
        let store = InMemoryStore::new();
        let item = seed(&store, "Pen", 150, 4).await;
        store.fail_next_decrements(10).await;

        let placed = service(&store)
            .place_order(PlaceOrder::new(ClientId::new(), cart_for(item)))
            .await
            .unwrap();

        assert!(matches!(placed.stock[0], StockOutcome::Failed { .. }));
        assert_eq!(store.order_count().await, 1);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn placed_order_moves_through_workflow_and_shows_in_views() {
        let store = InMemoryStore::new();
        let item = seed(&store, "Stapler", 899, 6).await;
        let client = ClientId::new();

        let mut cart = Cart::new();
        cart.add(item, 2);
        cart.set_shipping_address("12 Canal St");
        let placed = service(&store)
            .place_order(PlaceOrder::new(client, cart))
            .await
            .unwrap();

        let workflow = OrderWorkflow::new(store.clone());
        workflow
            .transition(TransitionOrder::new(placed.order_id(), OrderStatus::Confirmed))
            .await
            .unwrap();
        workflow
            .transition(TransitionOrder::cancel(placed.order_id()))
            .await
            .unwrap();

        let err = workflow
            .transition(TransitionOrder::new(placed.order_id(), OrderStatus::Shipped))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Shipped
            }
        ));

        let views = OrderQueries::new(store.clone())
            .orders_for_client(client)
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].order.status, OrderStatus::Cancelled);
        assert_eq!(views[0].items[0].item_name, "Stapler");
        assert_eq!(views[0].items[0].line.quantity, 2);
    }

    #[tokio::test]
    async fn concurrent_checkouts_never_oversell() {
        let store = InMemoryStore::new();
        let item = seed(&store, "Lamp", 2500, 3).await;

        let mut handles = Vec::new();
        for _ in 0..5 {
            let service = service(&store);
            let item = item.clone();
            handles.push(tokio::spawn(async move {
                let mut cart = Cart::new();
                cart.add(item, 1);
                cart.set_shipping_address("1 Market St");
                service
                    .place_order(PlaceOrder::new(ClientId::new(), cart))
                    .await
                    .unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().fully_stocked() {
                applied += 1;
            }
        }

        assert_eq!(applied, 3);
        let remaining = InventoryLedger::new(store.clone())
            .get(item.id)
            .await
            .unwrap()
            .quantity;
        assert_eq!(remaining, 0);
    }
}
