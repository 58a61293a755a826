use axum_food_delivery_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, CustomerInfo, OrderItemInput},
    },
    models::OrderStatus,
    services::{auth_service, cart_service, order_service},
};
use uuid::Uuid;

#[test]
fn forward_flow_reaches_delivered_and_stops() {
    let mut status = OrderStatus::Processing;
    let mut steps = Vec::new();
    while let Some(next) = status.next() {
        status = next;
        steps.push(status);
    }

    assert_eq!(
        steps,
        vec![
            OrderStatus::Preparing,
            OrderStatus::Enroute,
            OrderStatus::Delivered
        ]
    );
    assert!(status.is_terminal());
    assert_eq!(status.next(), None);
}

#[test]
fn cancelled_is_terminal() {
    assert!(OrderStatus::Cancelled.is_terminal());
    assert_eq!(OrderStatus::Cancelled.next(), None);
}

#[test]
fn status_parses_from_wire_strings() {
    for status in [
        OrderStatus::Processing,
        OrderStatus::Preparing,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
    }

    assert!("bogus".parse::<OrderStatus>().is_err());
    assert!("Processing".parse::<OrderStatus>().is_err());
    assert!("".parse::<OrderStatus>().is_err());
}

#[test]
fn add_item_validation_reports_every_violation() {
    let payload = AddToCartRequest {
        meal_id: None,
        name: "  ".to_string(),
        price: Some(-5),
        image: String::new(),
        quantity: Some(0),
        seller_id: None,
    };

    let errors = cart_service::validate_add_item(&payload).unwrap_err();
    assert_eq!(errors.len(), 5, "expected all violations, got {errors:?}");
    assert!(errors.iter().any(|e| e.contains("Meal ID")));
    assert!(errors.iter().any(|e| e.contains("Meal name")));
    assert!(errors.iter().any(|e| e.contains("Price")));
    assert!(errors.iter().any(|e| e.contains("Image")));
    assert!(errors.iter().any(|e| e.contains("Quantity")));
}

#[test]
fn add_item_validation_accepts_a_full_payload() {
    let payload = AddToCartRequest {
        meal_id: Some(Uuid::new_v4()),
        name: " Koshari ".to_string(),
        price: Some(0),
        image: "/images/meals/koshari.jpg".to_string(),
        quantity: Some(1),
        seller_id: Some(Uuid::new_v4()),
    };

    let line = cart_service::validate_add_item(&payload).unwrap();
    assert_eq!(line.name, "Koshari");
    assert_eq!(line.price, 0);
    assert_eq!(line.quantity, 1);
}

#[test]
fn order_validation_collects_all_errors() {
    let payload = CreateOrderRequest {
        customer: CustomerInfo {
            name: String::new(),
            phone: "  ".to_string(),
            address: String::new(),
            notes: None,
        },
        items: Vec::new(),
        payment_method: String::new(),
    };

    let errors = order_service::validate_order(&payload);
    assert_eq!(errors.len(), 5, "expected all violations, got {errors:?}");
    assert!(errors.iter().any(|e| e.contains("Customer name")));
    assert!(errors.iter().any(|e| e.contains("Customer phone")));
    assert!(errors.iter().any(|e| e.contains("Delivery address")));
    assert!(errors.iter().any(|e| e.contains("at least one item")));
    assert!(errors.iter().any(|e| e.contains("Payment method")));
}

#[test]
fn order_validation_accepts_a_cart_snapshot() {
    let payload = CreateOrderRequest {
        customer: CustomerInfo {
            name: "A".to_string(),
            phone: "123".to_string(),
            address: "X".to_string(),
            notes: Some("ring twice".to_string()),
        },
        items: vec![OrderItemInput {
            meal_id: Uuid::new_v4(),
            name: "Koshari".to_string(),
            price: 100,
            quantity: 3,
            seller_id: None,
        }],
        payment_method: "cash".to_string(),
    };

    assert!(order_service::validate_order(&payload).is_empty());
}

#[test]
fn order_validation_rejects_bad_lines() {
    let payload = CreateOrderRequest {
        customer: CustomerInfo {
            name: "A".to_string(),
            phone: "123".to_string(),
            address: "X".to_string(),
            notes: None,
        },
        items: vec![OrderItemInput {
            meal_id: Uuid::new_v4(),
            name: "Koshari".to_string(),
            price: -1,
            quantity: 0,
            seller_id: None,
        }],
        payment_method: "cash".to_string(),
    };

    let errors = order_service::validate_order(&payload);
    assert!(errors.iter().any(|e| e.contains("quantity")));
    assert!(errors.iter().any(|e| e.contains("price")));
}

#[test]
fn email_shape_check() {
    assert!(auth_service::looks_like_email("a@b.co"));
    assert!(auth_service::looks_like_email("first.last@kitchen.example.org"));

    assert!(!auth_service::looks_like_email("plainaddress"));
    assert!(!auth_service::looks_like_email("@nodomain.com"));
    assert!(!auth_service::looks_like_email("user@nodot"));
    assert!(!auth_service::looks_like_email("user@domain."));
    assert!(!auth_service::looks_like_email("user name@domain.com"));
    assert!(!auth_service::looks_like_email("a@b@c.com"));
}
