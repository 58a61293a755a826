pub mod audit_logs;
pub mod cart_items;
pub mod meals;
pub mod order_items;
pub mod orders;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use meals::Entity as Meals;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use users::Entity as Users;
