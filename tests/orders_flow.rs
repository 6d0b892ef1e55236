mod common;

use cafe_orders_api::{
    dto::orders::{CreateOrderRequest, OrderItemInput},
    error::AppError,
    models::{OrderStatus, Role},
    routes::params::OrderListQuery,
    services::{credential_store, order_service, user_service},
};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

fn latte_order(customer_name: &str, phone_number: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        table_number: Some(4),
        items: vec![OrderItemInput {
            item_id: "m1".into(),
            name: "Latte".into(),
            price: Decimal::from(140),
            quantity: 2,
        }],
        total_amount: Some(Decimal::from(280)),
        customer_name: customer_name.into(),
        phone_number: phone_number.into(),
    }
}

/// Keeps `createdAt` strictly increasing between inserts.
fn pause() {
    std::thread::sleep(std::time::Duration::from_millis(5));
}

#[tokio::test]
async fn anonymous_order_is_pending_and_unattributed() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let resp = order_service::create_order(&state, None, latte_order("Ravi", "+919876543210")).await?;
    let order = resp.data.expect("order");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, None);
    assert_eq!(order.total_amount, Decimal::from(280));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].item_id, "m1");

    let json = serde_json::to_value(&order)?;
    assert!(json.get("userId").is_none());
    assert_eq!(json["status"], "pending");
    assert_eq!(json["tableNumber"], 4);

    let fetched = order_service::get_order(&state, order.id).await?.data.expect("order");
    assert_eq!(fetched.items, order.items);
    Ok(())
}

#[tokio::test]
async fn invalid_token_leaves_the_order_unattributed() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let owner = state.guard.identify(Some("definitely.not.valid")).await;
    assert!(owner.is_none());

    let order = order_service::create_order(
        &state,
        owner.map(|user| user.id),
        latte_order("Ravi", "+919876543210"),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(order.user_id, None);
    Ok(())
}

#[tokio::test]
async fn token_holder_owns_the_order_and_sees_it_in_history() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (customer, token) = common::verified_customer(&state, "+919999999999", "Asha").await?;

    let owner = state.guard.identify(Some(&token)).await.map(|user| user.id);
    assert_eq!(owner, Some(customer.id));

    let first = order_service::create_order(&state, owner, latte_order("Asha", "+919999999999"))
        .await?
        .data
        .expect("order");
    pause();
    let second = order_service::create_order(&state, owner, latte_order("Asha", "+919999999999"))
        .await?
        .data
        .expect("order");
    assert_eq!(first.user_id, Some(customer.id));

    let history = credential_store::order_history(&state.orm, customer.id).await?;
    assert_eq!(history, vec![first.id, second.id]);

    let mine = order_service::list_for_user(&state, customer.id)
        .await?
        .data
        .expect("orders")
        .0;
    let ids: Vec<Uuid> = mine.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let profile = user_service::profile(&state, &common::as_auth_user(&customer))
        .await?
        .data
        .expect("profile");
    assert_eq!(profile.profile.id, customer.id);
    let ids: Vec<Uuid> = profile.orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    Ok(())
}

#[tokio::test]
async fn fractional_prices_are_kept_exactly() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let payload = CreateOrderRequest {
        table_number: Some(2),
        items: vec![OrderItemInput {
            item_id: "m1".into(),
            name: "Espresso".into(),
            price: Decimal::new(35, 1),
            quantity: 2,
        }],
        total_amount: Some(Decimal::new(70, 1)),
        customer_name: "Meera".into(),
        phone_number: "+919123456789".into(),
    };

    let order = order_service::create_order(&state, None, payload).await?.data.expect("order");
    assert_eq!(order.total_amount, Decimal::from(7));
    assert_eq!(order.items[0].price, Decimal::new(35, 1));

    let fetched = order_service::get_order(&state, order.id).await?.data.expect("order");
    assert_eq!(fetched.total_amount, Decimal::new(70, 1));
    assert_eq!(fetched.items[0].price, Decimal::new(35, 1));

    let json = serde_json::to_value(&fetched)?;
    assert_eq!(json["totalAmount"].as_f64(), Some(7.0));
    assert_eq!(json["items"][0]["price"].as_f64(), Some(3.5));
    Ok(())
}

#[tokio::test]
async fn history_write_failure_keeps_the_attributed_order() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (customer, _) = common::verified_customer(&state, "+919999999999", "Asha").await?;

    // Every history append fails from here on.
    state.orm.execute_unprepared("DROP TABLE user_orders").await?;
    assert!(credential_store::append_order(&state.orm, customer.id, Uuid::new_v4()).await.is_err());

    let order = order_service::create_order(
        &state,
        Some(customer.id),
        latte_order("Asha", "+919999999999"),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(order.user_id, Some(customer.id));

    let stored = order_service::get_order(&state, order.id).await?.data.expect("order");
    assert_eq!(stored.user_id, Some(customer.id));
    assert_eq!(stored.items, order.items);

    let mine = order_service::list_for_user(&state, customer.id)
        .await?
        .data
        .expect("orders")
        .0;
    assert_eq!(mine.len(), 1);
    Ok(())
}

#[tokio::test]
async fn total_mismatch_is_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let mut payload = latte_order("Ravi", "+919876543210");
    payload.total_amount = Some(Decimal::from(999));

    let err = order_service::create_order(&state, None, payload).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let all = order_service::list_all(&state, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert!(all.0.is_empty());
    Ok(())
}

#[tokio::test]
async fn completing_twice_is_idempotent() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (staff, _) = common::staff_member(&state, Role::Staff, "barista", "beans").await?;
    let staff = common::as_auth_user(&staff);

    let order = order_service::create_order(&state, None, latte_order("Ravi", "+919876543210"))
        .await?
        .data
        .expect("order");

    let once = order_service::complete_order(&state, &staff, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(once.status, OrderStatus::Completed);

    let twice = order_service::complete_order(&state, &staff, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(twice.status, OrderStatus::Completed);
    assert_eq!(twice.updated_at, once.updated_at);
    assert_eq!(twice.items, once.items);
    Ok(())
}

#[tokio::test]
async fn completing_a_missing_order_is_not_found() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (staff, _) = common::staff_member(&state, Role::Admin, "boss", "secret").await?;

    let err = order_service::complete_order(&state, &common::as_auth_user(&staff), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first_and_filterable() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let (staff, _) = common::staff_member(&state, Role::Staff, "barista", "beans").await?;

    let mut placed = Vec::new();
    for (name, phone) in [
        ("Ravi", "+919876543210"),
        ("Meera", "+919123456789"),
        ("Kiran", "+919876500000"),
    ] {
        let order = order_service::create_order(&state, None, latte_order(name, phone))
            .await?
            .data
            .expect("order");
        placed.push(order.id);
        pause();
    }
    order_service::complete_order(&state, &common::as_auth_user(&staff), placed[1]).await?;

    let all = order_service::list_all(&state, OrderListQuery::default()).await?;
    assert_eq!(all.meta.as_ref().and_then(|m| m.total), Some(3));
    let ids: Vec<Uuid> = all.data.expect("orders").0.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![placed[2], placed[1], placed[0]]);

    let pending = order_service::list_all(
        &state,
        OrderListQuery {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    let ids: Vec<Uuid> = pending.0.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![placed[2], placed[0]]);

    let by_phone = order_service::list_all(
        &state,
        OrderListQuery {
            phone: Some("98765".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(by_phone.0.len(), 2);

    let page = order_service::list_all(
        &state,
        OrderListQuery {
            page: Some(2),
            per_page: Some(2),
            ..Default::default()
        },
    )
    .await?;
    let meta = page.meta.expect("meta");
    assert_eq!((meta.page, meta.per_page, meta.total), (Some(2), Some(2), Some(3)));
    let ids: Vec<Uuid> = page.data.expect("orders").0.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![placed[0]]);
    Ok(())
}
