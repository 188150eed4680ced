//! Cart, address book and checkout, end to end.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use qkart_client::{ClientError, LoginForm, RegisterForm};
use qkart_core::{Money, ProductId, ValidationFailure};
use qkart_integration_tests::{TEST_PASSWORD, TestServer, logged_in};

const SHOES: &str = "TwMM4OAhmK0VQ93S";
const IPAD: &str = "v4sLtEcMpzabRyf";
const ADDRESS: &str = "221B Baker Street, London NW1 6XE";

fn money(units: i64) -> Money {
    Money::from_major(units).unwrap()
}

#[tokio::test]
async fn test_cart_reconciles_against_catalog() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;

    shop.add_to_cart(&SHOES.into(), 2).await.unwrap();
    let items = shop.line_items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].qty, 2);
    assert_eq!(items[0].cost, money(50));

    let totals = shop.totals().await;
    assert_eq!(totals.subtotal, money(100));
    assert_eq!(totals.total, money(100));
    assert_eq!(totals.item_count, 2);

    let err = shop.add_to_cart(&SHOES.into(), 1).await.unwrap_err();
    assert!(matches!(err, ClientError::AlreadyInCart));

    shop.set_quantity(&SHOES.into(), 0).await.unwrap();
    assert!(shop.load_cart().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;

    let err = shop
        .add_to_cart(&ProductId::new("not-a-product"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Product doesn't exist");
}

#[tokio::test]
async fn test_address_book_round_trip() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;

    let err = shop.add_address("too short").await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 400, .. }));

    let book = shop.add_address(ADDRESS).await.unwrap();
    let id = book.all()[0].id.clone();
    assert!(shop.select_address(&id).await);

    let book = shop.delete_address(&id).await.unwrap();
    assert!(book.is_empty());
    assert!(book.selected().is_none());

    let err = shop.delete_address(&id).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn test_checkout_debits_balance_and_clears_cart() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;

    shop.add_to_cart(&SHOES.into(), 2).await.unwrap();
    let book = shop.add_address(ADDRESS).await.unwrap();
    shop.select_address(&book.all()[0].id).await;

    let confirmation = shop.checkout().await.unwrap();
    assert_eq!(confirmation.total, money(100));
    assert_eq!(confirmation.balance, money(4900));

    assert!(shop.cart().await.is_empty());
    assert!(shop.load_cart().await.unwrap().is_empty());
    assert_eq!(shop.session().await.unwrap().balance(), money(4900));
}

#[tokio::test]
async fn test_checkout_checks_balance_before_addresses() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;

    // 10 iPads cost far more than the starting wallet, and no address is saved.
    shop.add_to_cart(&IPAD.into(), 10).await.unwrap();
    let err = shop.checkout().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationFailure::InsufficientBalance)
    ));
    assert_eq!(
        err.user_message(),
        "You do not have enough balance in your wallet for this purchase"
    );

    // Nothing changed.
    assert_eq!(shop.load_cart().await.unwrap().len(), 1);
    assert_eq!(shop.session().await.unwrap().balance(), money(5000));
}

#[tokio::test]
async fn test_checkout_requires_a_selected_address() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;
    shop.add_to_cart(&SHOES.into(), 1).await.unwrap();

    let err = shop.checkout().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationFailure::NoAddressOnFile)
    ));

    shop.add_address(ADDRESS).await.unwrap();
    let err = shop.checkout().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationFailure::NoAddressSelected)
    ));
}

#[tokio::test]
async fn test_server_revalidates_checkout() {
    let server = TestServer::spawn().await;
    let shop = logged_in(&server, "crio.do").await;
    let session = shop.session().await.unwrap();

    // Bypass local validation: the service must still refuse an empty cart.
    let book = shop.add_address(ADDRESS).await.unwrap();
    let err = shop
        .api()
        .checkout(&session, &book.all()[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 400, .. }));
    assert_eq!(err.user_message(), "Cart is empty");
}

#[tokio::test]
async fn test_checkout_without_loaded_catalog_places_order() {
    let server = TestServer::spawn().await;
    let shop = server.storefront();
    shop.register(&RegisterForm {
        username: "crio.do".to_owned(),
        password: TEST_PASSWORD.to_owned(),
        confirm_password: TEST_PASSWORD.to_owned(),
    })
    .await
    .unwrap();
    shop.login(&LoginForm {
        username: "crio.do".to_owned(),
        password: TEST_PASSWORD.to_owned(),
    })
    .await
    .unwrap();

    shop.add_to_cart(&SHOES.into(), 1).await.unwrap();
    let book = shop.add_address(ADDRESS).await.unwrap();
    shop.select_address(&book.all()[0].id).await;
    assert!(shop.catalog().await.is_empty());

    let confirmation = shop.checkout().await.unwrap();
    assert_eq!(confirmation.total, money(50));
    assert_eq!(confirmation.balance, money(4950));
    assert!(shop.cart().await.is_empty());
    assert!(!shop.catalog().await.is_empty());
}
