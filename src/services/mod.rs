pub mod auth_service;
pub mod cart_service;
pub mod meal_service;
pub mod order_service;
pub mod status_service;
