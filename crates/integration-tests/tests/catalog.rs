//! Catalog fetch and debounced search.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use qkart_client::{ClientError, StorefrontEvent};
use qkart_core::ProductId;
use qkart_integration_tests::TestServer;

#[tokio::test]
async fn test_catalog_and_single_product() {
    let server = TestServer::spawn().await;
    let shop = server.storefront();

    let catalog = shop.load_catalog().await.unwrap();
    assert_eq!(catalog.len(), 12);
    assert_eq!(shop.products().await, catalog);

    let product = shop
        .api()
        .product(&ProductId::new("TwMM4OAhmK0VQ93S"))
        .await
        .unwrap();
    assert_eq!(product.category, "Fashion");

    let err = shop
        .api()
        .product(&ProductId::new("does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn test_search_without_match_is_empty() {
    let server = TestServer::spawn().await;
    let shop = server.storefront();

    assert!(shop.api().search("zzzz-nothing").await.unwrap().is_empty());
    let sports = shop.api().search("sports").await.unwrap();
    assert!(!sports.is_empty());
    assert!(sports.iter().all(|p| p.category == "Sports"));
}

#[tokio::test]
async fn test_debounced_search_sends_once_for_a_burst() {
    let server = TestServer::spawn().await;
    let shop = server.storefront();
    shop.load_catalog().await.unwrap();
    let mut events = shop.subscribe();

    for prefix in ["y", "yo", "yon", "yone", "yonex"] {
        shop.search_input(prefix).await;
    }
    assert!(shop.search_pending().await);

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        StorefrontEvent::SearchApplied {
            query: "yonex".to_owned(),
            results: 1,
        }
    );
    assert_eq!(shop.products().await.len(), 1);

    // Nothing else was sent.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_blank_search_restores_catalog() {
    let server = TestServer::spawn().await;
    let shop = server.storefront();
    shop.load_catalog().await.unwrap();

    assert!(shop.search_now("nivia").await.unwrap());
    assert!(shop.products().await.len() < 12);

    shop.search_input("   ").await;
    assert!(!shop.search_pending().await);
    assert_eq!(shop.products().await.len(), 12);
}
